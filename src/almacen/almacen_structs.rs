// src/almacen/almacen_structs.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use super::almacen_error::ErrorAlmacen;

/// Colecciones del almacén de registros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coleccion {
    Productos,
    Categorias,
    Pedidos,
    Users,
}

impl Coleccion {
    pub fn nombre(&self) -> &'static str {
        match self {
            Coleccion::Productos => "productos",
            Coleccion::Categorias => "categorias",
            Coleccion::Pedidos => "pedidos",
            Coleccion::Users => "users",
        }
    }
}

impl fmt::Display for Coleccion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nombre())
    }
}

/// Un registro genérico: metadatos del sistema más los campos de la colección.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registro {
    pub id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(flatten)]
    pub datos: Map<String, Value>,
}

impl Registro {
    pub fn nuevo(id: String, datos: Map<String, Value>) -> Self {
        let ahora = Utc::now();
        Self { id, created: ahora, updated: ahora, datos }
    }

    pub fn texto(&self, campo: &str) -> Option<&str> {
        self.datos.get(campo).and_then(Value::as_str)
    }

    /// Convierte el registro (id, fechas y campos) en un tipo concreto.
    pub fn a_tipo<T: DeserializeOwned>(&self) -> Result<T, ErrorAlmacen> {
        let valor = serde_json::to_value(self)
            .map_err(|e| ErrorAlmacen::interno(format!("Registro {} no serializable: {}", self.id, e)))?;
        serde_json::from_value(valor)
            .map_err(|e| ErrorAlmacen::interno(format!("Registro {} con formato inesperado: {}", self.id, e)))
    }
}

/// Convierte cualquier estructura serializable en el mapa de campos de un registro.
pub fn a_campos<T: Serialize>(valor: &T) -> Result<Map<String, Value>, ErrorAlmacen> {
    match serde_json::to_value(valor) {
        Ok(Value::Object(campos)) => Ok(campos),
        Ok(_) => Err(ErrorAlmacen::interno("Se esperaba un objeto JSON")),
        Err(e) => Err(ErrorAlmacen::interno(format!("Datos no serializables: {}", e))),
    }
}

/// Filtros de `get_full_list`: igualdad por campo, pertenencia por id y orden.
#[derive(Debug, Clone, Default)]
pub struct ConsultaLista {
    pub igual: Vec<(String, Value)>,
    pub ids: Option<Vec<String>>,
    pub recientes_primero: bool,
}

impl ConsultaLista {
    pub fn nueva() -> Self {
        Self::default()
    }

    pub fn donde(mut self, campo: &str, valor: impl Into<Value>) -> Self {
        self.igual.push((campo.to_string(), valor.into()));
        self
    }

    pub fn con_ids(mut self, ids: Vec<String>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn recientes_primero(mut self) -> Self {
        self.recientes_primero = true;
        self
    }

    pub fn coincide(&self, registro: &Registro) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.iter().any(|id| *id == registro.id) {
                return false;
            }
        }
        self.igual.iter().all(|(campo, valor)| {
            if campo == "id" {
                valor.as_str() == Some(registro.id.as_str())
            } else {
                registro.datos.get(campo) == Some(valor)
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rol {
    Cliente,
    Admin,
}

/// Sesión validada de un usuario de la colección `users`.
#[derive(Debug, Clone)]
pub struct Sesion {
    pub token: String,
    pub usuario_id: String,
    pub email: String,
    pub rol: Rol,
    pub registro: Registro,
}

/// Con qué identidad se ejecuta una operación contra el almacén.
#[derive(Debug, Clone)]
pub enum Credencial {
    Anonima,
    Usuario(Sesion),
    /// Tareas internas (ajustes de inventario, semilla); no pasa por las reglas.
    Sistema,
}

impl Credencial {
    pub fn usuario_id(&self) -> Option<&str> {
        match self {
            Credencial::Usuario(sesion) => Some(sesion.usuario_id.as_str()),
            _ => None,
        }
    }

    pub fn sesion(&self) -> Option<&Sesion> {
        match self {
            Credencial::Usuario(sesion) => Some(sesion),
            _ => None,
        }
    }

    pub fn es_admin(&self) -> bool {
        match self {
            Credencial::Sistema => true,
            Credencial::Usuario(sesion) => sesion.rol == Rol::Admin,
            Credencial::Anonima => false,
        }
    }

    pub fn autenticada(&self) -> bool {
        !matches!(self, Credencial::Anonima)
    }
}

/// Resultado de `auth_with_password` / `auth_refresh`.
#[derive(Debug, Clone)]
pub struct AuthData {
    pub token: String,
    pub registro: Registro,
}

/// Resultado de una actualización en dos fases: qué se guardó y qué campos se
/// tuvieron que omitir para que el almacén la aceptara.
#[derive(Debug, Clone)]
pub struct ActualizacionDegradada {
    pub registro: Registro,
    pub campos_omitidos: Vec<String>,
}
