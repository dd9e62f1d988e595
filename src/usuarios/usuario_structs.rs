// src/usuarios/usuario_structs.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::almacen::{ErrorAlmacen, Registro, Rol};

fn activo_por_defecto() -> bool {
    true
}

fn rol_por_defecto() -> Rol {
    Rol::Cliente
}

/// Usuario tal como lo guarda la colección `users` (sin el hash, que nunca sale del almacén).
#[derive(Debug, Deserialize)]
pub struct UsuarioRecord {
    pub id: String,
    pub created: DateTime<Utc>,
    pub email: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub ciudad: Option<String>,
    pub region: Option<String>,
    pub codigo_postal: Option<String>,
    #[serde(default = "rol_por_defecto")]
    pub rol: Rol,
    #[serde(default = "activo_por_defecto")]
    pub activo: bool,
}

/// Usuario de la API.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Usuario {
    pub id: String,
    pub email: String,
    pub nombre: String,
    pub apellido: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ciudad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo_postal: Option<String>,
    pub rol: Rol,
    pub activo: bool,
    pub fecha_registro: DateTime<Utc>,
}

fn no_vacio(valor: Option<String>) -> Option<String> {
    valor.filter(|v| !v.trim().is_empty())
}

impl From<UsuarioRecord> for Usuario {
    fn from(record: UsuarioRecord) -> Self {
        Usuario {
            id: record.id,
            email: record.email,
            nombre: record.nombre,
            apellido: record.apellido,
            telefono: no_vacio(record.telefono),
            direccion: no_vacio(record.direccion),
            ciudad: no_vacio(record.ciudad),
            region: no_vacio(record.region),
            codigo_postal: no_vacio(record.codigo_postal),
            rol: record.rol,
            activo: record.activo,
            fecha_registro: record.created,
        }
    }
}

impl TryFrom<&Registro> for Usuario {
    type Error = ErrorAlmacen;

    fn try_from(registro: &Registro) -> Result<Self, Self::Error> {
        Ok(registro.a_tipo::<UsuarioRecord>()?.into())
    }
}

/// Respuesta de los endpoints de autenticación: `{usuario}`.
#[derive(Serialize, Deserialize)]
pub struct UsuarioResponse {
    pub usuario: Usuario,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Registro público. Todos los campos son obligatorios salvo `rol`.
#[derive(Deserialize, Serialize)]
pub struct RegistroRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "passwordConfirm")]
    pub password_confirm: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rol: Option<Rol>,
}

/// Alta de usuario desde el panel de administración. Se deserializa en camelCase
/// y se serializa con los nombres de campo de la colección `users`.
#[derive(Deserialize, Serialize)]
pub struct NuevoUsuario {
    pub email: String,
    pub password: String,
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ciudad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(rename(deserialize = "codigoPostal"), skip_serializing_if = "Option::is_none")]
    pub codigo_postal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rol: Option<Rol>,
}

/// Actualización parcial de un usuario.
#[derive(Deserialize, Serialize, Default)]
pub struct ActualizacionUsuario {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apellido: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ciudad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(rename(deserialize = "codigoPostal"), skip_serializing_if = "Option::is_none")]
    pub codigo_postal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rol: Option<Rol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "passwordConfirm", skip_serializing_if = "Option::is_none")]
    pub password_confirm: Option<String>,
}

/// Resultado de una actualización con los campos que el almacén no aceptó.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsuarioActualizado {
    pub usuario: Usuario,
    pub campos_omitidos: Vec<String>,
}

/// Quita los espacios de un teléfono (`+56 9 1234 5678` -> `+56912345678`).
pub fn limpiar_telefono(telefono: &str) -> String {
    telefono.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nuevo_usuario_pasa_a_nombres_de_coleccion() {
        let nuevo: NuevoUsuario = serde_json::from_value(json!({
            "email": "ana@huertohogar.cl", "password": "secreto1", "passwordConfirm": "secreto1",
            "nombre": "Ana", "codigoPostal": "8320000"
        }))
        .unwrap();
        let campos = serde_json::to_value(&nuevo).unwrap();
        assert_eq!(campos["codigo_postal"], "8320000");
        assert_eq!(campos["passwordConfirm"], "secreto1");
        assert!(campos.get("rol").is_none());
    }

    #[test]
    fn limpia_espacios_del_telefono() {
        assert_eq!(limpiar_telefono("+56 9 1234 5678"), "+56912345678");
    }
}
