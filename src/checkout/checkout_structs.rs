// src/checkout/checkout_structs.rs

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::pago::ErrorPago;
use crate::almacen::ErrorAlmacen;
use crate::shared::ApiError;

/// Formulario de checkout: contacto y envío.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DatosCheckout {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub telefono: String,
    pub direccion: String,
    pub ciudad: String,
    pub region: String,
    pub codigo_postal: String,
    pub metodo_pago: String,
    pub notas: Option<String>,
}

#[derive(Debug, Error)]
pub enum ErrorCheckout {
    #[error("{0}")]
    DatosInvalidos(String),
    #[error("El carrito está vacío")]
    CarritoVacio,
    #[error("Solo quedan {disponible} unidades de {nombre}")]
    StockInsuficiente { nombre: String, disponible: i64 },
    #[error("El producto {0} ya no está disponible")]
    ProductoNoDisponible(String),
    #[error(transparent)]
    Pago(#[from] ErrorPago),
    #[error("No se pudo crear la orden: {0}")]
    Almacen(#[from] ErrorAlmacen),
}

impl From<ErrorCheckout> for ApiError {
    fn from(error: ErrorCheckout) -> Self {
        match error {
            ErrorCheckout::Pago(ErrorPago::Rechazado { .. }) => ApiError::PagoRechazado(error.to_string()),
            ErrorCheckout::Pago(_) => ApiError::Interno(error.to_string()),
            ErrorCheckout::Almacen(e) => {
                let mensaje = format!("No se pudo crear la orden: {}", e.message);
                ApiError::almacen(mensaje, e)
            }
            otro => ApiError::validacion(otro.to_string()),
        }
    }
}

/// Resumen de una pasada del reconciliador de inventario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResumenReconciliacion {
    pub ordenes_revisadas: usize,
    /// Órdenes que otro proceso tenía reclamadas durante la pasada.
    pub ordenes_omitidas: usize,
    pub lineas_aplicadas: usize,
    pub lineas_fallidas: usize,
}
