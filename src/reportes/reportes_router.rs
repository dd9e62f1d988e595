// src/reportes/reportes_router.rs

use actix_web::{get, web, HttpResponse};

use super::reportes_structs::calcular_reporte;
use crate::almacen::ConsultaLista;
use crate::ordenes::ordenes_api::obtener_ordenes;
use crate::productos::productos_api::obtener_productos;
use crate::productos::productos_structs::FiltroProductos;
use crate::shared::shared_structs::ErrorResponse;
use crate::shared::ApiError;
use crate::usuarios::auth_middleware::ContextoSolicitud;
use crate::AppState;

/// Ruta del reporte de ventas e inventario (solo administradores).
#[utoipa::path(
    get,
    path = "/api/reportes",
    tag = "reportes",
    responses(
        (status = 200, description = "Ventas, pedidos por estado y productos con poco stock"),
        (status = 403, description = "Solo administradores", body = ErrorResponse)
    )
)]
#[get("/api/reportes")]
pub async fn obtener_reporte(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
) -> Result<HttpResponse, ApiError> {
    contexto.exigir_admin()?;
    let filtro = FiltroProductos::default();
    let (ordenes, productos) = futures::try_join!(
        obtener_ordenes(&data.almacen, &contexto.credencial, ConsultaLista::nueva()),
        obtener_productos(&data.almacen, &contexto.credencial, &filtro),
    )?;
    Ok(HttpResponse::Ok().json(calcular_reporte(&ordenes, &productos)))
}
