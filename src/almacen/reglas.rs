// src/almacen/reglas.rs

use serde_json::{Map, Value};

use super::almacen_structs::{Coleccion, Credencial};

/// Usuario al que se asignan los pedidos hechos sin sesión.
pub const USUARIO_INVITADO: &str = "invitado";

/// Regla de acceso de una operación sobre una colección.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regla {
    Publica,
    SoloAdmin,
    /// El campo indicado (o el id del registro, con `"id"`) debe ser el usuario de la sesión.
    PropietarioOAdmin(&'static str),
    /// Como `PropietarioOAdmin`, pero sin sesión se acepta el usuario invitado.
    PropietarioOInvitado(&'static str),
}

/// Reglas por operación, más los campos que solo un administrador puede cambiar.
#[derive(Debug, Clone, Copy)]
pub struct ReglasColeccion {
    pub listar: Regla,
    pub ver: Regla,
    pub crear: Regla,
    pub actualizar: Regla,
    pub eliminar: Regla,
    pub campos_admin: &'static [&'static str],
}

pub fn reglas_de(coleccion: Coleccion) -> ReglasColeccion {
    match coleccion {
        Coleccion::Productos | Coleccion::Categorias => ReglasColeccion {
            listar: Regla::Publica,
            ver: Regla::Publica,
            crear: Regla::SoloAdmin,
            actualizar: Regla::SoloAdmin,
            eliminar: Regla::SoloAdmin,
            campos_admin: &[],
        },
        Coleccion::Pedidos => ReglasColeccion {
            listar: Regla::PropietarioOAdmin("usuario"),
            ver: Regla::PropietarioOAdmin("usuario"),
            crear: Regla::PropietarioOInvitado("usuario"),
            actualizar: Regla::SoloAdmin,
            eliminar: Regla::SoloAdmin,
            campos_admin: &[],
        },
        Coleccion::Users => ReglasColeccion {
            listar: Regla::SoloAdmin,
            ver: Regla::PropietarioOAdmin("id"),
            crear: Regla::Publica,
            actualizar: Regla::PropietarioOAdmin("id"),
            eliminar: Regla::SoloAdmin,
            campos_admin: &["rol", "activo"],
        },
    }
}

fn propietario<'a>(campo: &str, id: &'a str, datos: &'a Map<String, Value>) -> Option<&'a str> {
    if campo == "id" {
        Some(id)
    } else {
        datos.get(campo).and_then(Value::as_str)
    }
}

impl Regla {
    /// Evalúa la regla para un registro concreto (`id` + `datos`).
    pub fn permite(&self, credencial: &Credencial, id: &str, datos: &Map<String, Value>) -> bool {
        if credencial.es_admin() {
            return true;
        }

        match self {
            Regla::Publica => true,
            Regla::SoloAdmin => false,
            Regla::PropietarioOAdmin(campo) => match credencial.usuario_id() {
                Some(usuario_id) => propietario(campo, id, datos) == Some(usuario_id),
                None => false,
            },
            Regla::PropietarioOInvitado(campo) => match credencial.usuario_id() {
                Some(usuario_id) => propietario(campo, id, datos) == Some(usuario_id),
                None => propietario(campo, id, datos) == Some(USUARIO_INVITADO),
            },
        }
    }
}
