// src/checkout/checkout_router.rs

use actix_web::{get, post, web, HttpResponse};
use tracing::info;

use super::checkout_servicio::{procesar_checkout, ServiciosCheckout};
use super::checkout_structs::{DatosCheckout, ResumenReconciliacion};
use super::inventario::{ordenes_con_ajustes_pendientes, reconciliar};
use crate::carrito::carrito_router::abrir_carrito;
use crate::shared::utilidades::REGIONES_CHILE;
use crate::shared::shared_structs::ErrorResponse;
use crate::shared::ApiError;
use crate::usuarios::auth_middleware::ContextoSolicitud;
use crate::AppState;

/// Ruta del checkout. Responde 201 con la orden; los ajustes de stock que no se
/// pudieron aplicar no afectan la respuesta.
#[utoipa::path(
    post,
    path = "/api/checkout",
    tag = "checkout",
    request_body = DatosCheckout,
    responses(
        (status = 201, description = "Orden creada"),
        (status = 400, description = "Datos inválidos, carrito vacío o stock insuficiente", body = ErrorResponse),
        (status = 402, description = "Pago rechazado", body = ErrorResponse)
    )
)]
#[post("/api/checkout")]
pub async fn checkout(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    datos: web::Json<DatosCheckout>,
) -> Result<HttpResponse, ApiError> {
    let (mut sesion_carrito, cookie) = abrir_carrito(&data, &contexto).await;
    let servicios = ServiciosCheckout {
        almacen: &data.almacen,
        pasarela: data.pasarela.as_ref(),
        costo_envio: &data.config.costo_envio,
    };

    let mut orden = procesar_checkout(servicios, &contexto.credencial, &mut sesion_carrito, datos.into_inner()).await?;
    orden.ajuste_inventario = None;

    let mut respuesta = HttpResponse::Created();
    if let Some(cookie) = cookie {
        respuesta.cookie(cookie);
    }
    Ok(respuesta.json(orden))
}

/// Regiones disponibles para la dirección de envío.
#[utoipa::path(
    get,
    path = "/api/checkout/regiones",
    tag = "checkout",
    responses(
        (status = 200, description = "Regiones de Chile", body = Vec<String>)
    )
)]
#[get("/api/checkout/regiones")]
pub async fn buscar_regiones() -> HttpResponse {
    HttpResponse::Ok().json(REGIONES_CHILE)
}

/// Ruta para revisar las órdenes con ajustes de inventario sin resolver.
#[utoipa::path(
    get,
    path = "/api/admin/ajustes-inventario",
    tag = "inventario",
    responses(
        (status = 200, description = "Órdenes con ajustes de inventario pendientes"),
        (status = 403, description = "Solo administradores", body = ErrorResponse)
    )
)]
#[get("/api/admin/ajustes-inventario")]
pub async fn buscar_ajustes_pendientes(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
) -> Result<HttpResponse, ApiError> {
    contexto.exigir_admin()?;
    let ordenes = ordenes_con_ajustes_pendientes(&data.almacen).await?;
    Ok(HttpResponse::Ok().json(ordenes))
}

/// Ruta para ejecutar una pasada de reconciliación en el momento.
#[utoipa::path(
    post,
    path = "/api/admin/ajustes-inventario/reconciliar",
    tag = "inventario",
    responses(
        (status = 200, description = "Resumen de la pasada", body = ResumenReconciliacion),
        (status = 403, description = "Solo administradores", body = ErrorResponse)
    )
)]
#[post("/api/admin/ajustes-inventario/reconciliar")]
pub async fn reconciliar_ajustes(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
) -> Result<HttpResponse, ApiError> {
    let sesion = contexto.exigir_admin()?;
    let resumen = reconciliar(&data.almacen).await?;
    info!(admin = %sesion.email, ?resumen, "Reconciliación manual de inventario");
    Ok(HttpResponse::Ok().json(resumen))
}
