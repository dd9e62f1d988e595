// src/almacen/almacen_error.rs

use serde_json::{json, Map, Value};
use thiserror::Error;

/// Error devuelto por el almacén de registros: `{status, message, data}`.
///
/// `data` contiene los errores por campo (`{campo: {code, message}}`) cuando el
/// rechazo se debe a un campo concreto; si no, es un objeto vacío.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct ErrorAlmacen {
    pub status: u16,
    pub message: String,
    pub data: Value,
}

impl ErrorAlmacen {
    pub fn new(status: u16, message: impl Into<String>, data: Value) -> Self {
        Self { status, message: message.into(), data }
    }

    pub fn no_encontrado() -> Self {
        Self::new(404, "The requested resource wasn't found.", json!({}))
    }

    pub fn no_autenticado(message: impl Into<String>) -> Self {
        Self::new(401, message, json!({}))
    }

    pub fn prohibido(message: impl Into<String>) -> Self {
        Self::new(403, message, json!({}))
    }

    /// Rechazo de autorización a nivel de campo: el resto del registro podría
    /// guardarse si se omite `campo`.
    pub fn prohibido_en_campo(campo: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut data = Map::new();
        data.insert(campo.to_string(), json!({ "code": "forbidden_field", "message": message.clone() }));
        Self::new(403, message, Value::Object(data))
    }

    pub fn validacion(message: impl Into<String>, campos: Map<String, Value>) -> Self {
        Self::new(400, message, Value::Object(campos))
    }

    pub fn interno(message: impl Into<String>) -> Self {
        Self::new(500, message, json!({}))
    }

    pub fn es_no_encontrado(&self) -> bool {
        self.status == 404
    }

    pub fn es_prohibido(&self) -> bool {
        self.status == 403
    }

    /// Campos nombrados en `data` como causa del rechazo.
    pub fn campos_rechazados(&self) -> Vec<String> {
        match &self.data {
            Value::Object(campos) => campos.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Código del primer campo con error, si lo hay (`validation_not_unique`, ...).
    pub fn primer_error_de_campo(&self) -> Option<(String, String, String)> {
        let campos = self.data.as_object()?;
        let (campo, detalle) = campos.iter().next()?;
        let code = detalle.get("code").and_then(Value::as_str).unwrap_or_default();
        let message = detalle.get("message").and_then(Value::as_str).unwrap_or_default();
        Some((campo.clone(), code.to_string(), message.to_string()))
    }
}
