// src/shared/mod.rs

// Estructuras de respuesta compartidas por todas las rutas
pub mod shared_structs;
// Error del borde HTTP (ResponseError)
pub mod errores;
// Formato de precios, validaciones y generación de ids
pub mod utilidades;
// BigDecimal <-> número JSON
pub mod decimal_json;
// Documento OpenAPI de la API
pub mod openapi;

pub use errores::ApiError;
