// src/shared/errores.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::Value;
use thiserror::Error;

use super::shared_structs::ErrorResponse;
use crate::almacen::ErrorAlmacen;

/// Error en el borde HTTP. Cada variante decide el código de estado y se
/// serializa como `{error, details?}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{mensaje}")]
    Validacion { mensaje: String, detalles: Option<Value> },
    #[error("{0}")]
    NoAutenticado(String),
    #[error("{mensaje}")]
    Prohibido { mensaje: String, detalles: Option<Value> },
    #[error("{0}")]
    NoEncontrado(String),
    #[error("{0}")]
    PagoRechazado(String),
    /// Error del almacén de registros; el estado HTTP refleja el del almacén.
    #[error("{mensaje}")]
    Almacen {
        mensaje: String,
        #[source]
        error: ErrorAlmacen,
    },
    #[error("{0}")]
    Interno(String),
}

impl ApiError {
    pub fn validacion(mensaje: impl Into<String>) -> Self {
        ApiError::Validacion { mensaje: mensaje.into(), detalles: None }
    }

    pub fn validacion_con_detalles(mensaje: impl Into<String>, detalles: Value) -> Self {
        ApiError::Validacion { mensaje: mensaje.into(), detalles: Some(detalles) }
    }

    pub fn prohibido(mensaje: impl Into<String>) -> Self {
        ApiError::Prohibido { mensaje: mensaje.into(), detalles: None }
    }

    pub fn prohibido_con_detalles(mensaje: impl Into<String>, detalles: Value) -> Self {
        ApiError::Prohibido { mensaje: mensaje.into(), detalles: Some(detalles) }
    }

    /// Envuelve un error del almacén con un mensaje propio para el usuario.
    pub fn almacen(mensaje: impl Into<String>, error: ErrorAlmacen) -> Self {
        ApiError::Almacen { mensaje: mensaje.into(), error }
    }

    fn detalles(&self) -> Option<Value> {
        match self {
            ApiError::Validacion { detalles, .. } | ApiError::Prohibido { detalles, .. } => detalles.clone(),
            ApiError::Almacen { error, .. } => match &error.data {
                Value::Null => None,
                Value::Object(mapa) if mapa.is_empty() => None,
                data => Some(data.clone()),
            },
            _ => None,
        }
    }
}

impl From<ErrorAlmacen> for ApiError {
    fn from(error: ErrorAlmacen) -> Self {
        ApiError::Almacen { mensaje: error.message.clone(), error }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validacion { .. } => StatusCode::BAD_REQUEST,
            ApiError::NoAutenticado(_) => StatusCode::UNAUTHORIZED,
            ApiError::Prohibido { .. } => StatusCode::FORBIDDEN,
            ApiError::NoEncontrado(_) => StatusCode::NOT_FOUND,
            ApiError::PagoRechazado(_) => StatusCode::PAYMENT_REQUIRED,
            ApiError::Almacen { error, .. } => match error.status {
                400 => StatusCode::BAD_REQUEST,
                401 => StatusCode::UNAUTHORIZED,
                403 => StatusCode::FORBIDDEN,
                404 => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Interno(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Error interno al atender la solicitud");
        }
        HttpResponse::build(status).json(ErrorResponse {
            error: self.to_string(),
            details: self.detalles(),
        })
    }
}
