// src/shared/shared_structs.rs

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

/// Cuerpo de todas las respuestas de error de la API: `{error, details?}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")] // No serializa 'details' si es None
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

/// Respuesta simple para operaciones sin cuerpo (eliminar, cerrar sesión).
#[derive(Debug, Serialize, ToSchema)]
pub struct MensajeResponse {
    pub mensaje: String,
}

impl MensajeResponse {
    pub fn new(mensaje: impl Into<String>) -> Self {
        Self { mensaje: mensaje.into() }
    }
}
