// src/ordenes/ordenes_router.rs

use actix_web::{delete, get, post, put, web, HttpResponse};
use bigdecimal::BigDecimal;
use tracing::{error, info};

use super::ordenes_api::{obtener_orden, obtener_ordenes};
use super::ordenes_structs::{ActualizacionEstado, EstadoOrden, NuevaOrden, Orden, PedidoRecord};
use crate::almacen::{a_campos, Coleccion, ConsultaLista, ErrorAlmacen, USUARIO_INVITADO};
use crate::shared::shared_structs::{ErrorResponse, MensajeResponse};
use crate::shared::ApiError;
use crate::usuarios::auth_middleware::ContextoSolicitud;
use crate::AppState;

/// El marcador de inventario solo lo ve un administrador.
fn visible_para(mut orden: Orden, contexto: &ContextoSolicitud) -> Orden {
    if !contexto.credencial.es_admin() {
        orden.ajuste_inventario = None;
    }
    orden
}

fn error_orden(e: ErrorAlmacen) -> ApiError {
    if e.es_no_encontrado() {
        ApiError::NoEncontrado("Orden no encontrada".to_string())
    } else {
        e.into()
    }
}

/// Ruta para listar órdenes. El administrador ve todas; el resto, las suyas.
#[utoipa::path(
    get,
    path = "/api/ordenes",
    tag = "ordenes",
    responses(
        (status = 200, description = "Órdenes visibles para la sesión"),
        (status = 401, description = "Sin sesión", body = ErrorResponse)
    )
)]
#[get("/api/ordenes")]
pub async fn buscar_ordenes(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
) -> Result<HttpResponse, ApiError> {
    let ordenes = obtener_ordenes(&data.almacen, &contexto.credencial, ConsultaLista::nueva())
        .await
        .map_err(|e| {
            error!(error = %e, "Error al obtener órdenes");
            ApiError::almacen("No se pudieron cargar las órdenes", e)
        })?;
    info!(admin = contexto.credencial.es_admin(), total = ordenes.len(), "Órdenes listadas");
    let ordenes: Vec<Orden> = ordenes.into_iter().map(|o| visible_para(o, &contexto)).collect();
    Ok(HttpResponse::Ok().json(ordenes))
}

/// Ruta para registrar una orden directamente, sin pasar por el checkout.
#[utoipa::path(
    post,
    path = "/api/ordenes",
    tag = "ordenes",
    responses(
        (status = 201, description = "Orden creada"),
        (status = 400, description = "Datos inválidos", body = ErrorResponse)
    )
)]
#[post("/api/ordenes")]
pub async fn crear_orden(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    nueva: web::Json<NuevaOrden>,
) -> Result<HttpResponse, ApiError> {
    let nueva = nueva.into_inner();
    if nueva.items.is_empty() {
        return Err(ApiError::validacion("La orden debe tener al menos un producto"));
    }

    let usuario = nueva
        .usuario_id
        .filter(|id| !id.is_empty())
        .or_else(|| contexto.credencial.usuario_id().map(str::to_string))
        .unwrap_or_else(|| USUARIO_INVITADO.to_string());
    let subtotal = nueva
        .subtotal
        .unwrap_or_else(|| nueva.items.iter().map(|item| item.subtotal()).sum());
    let envio = nueva.envio.unwrap_or_else(|| BigDecimal::from(0));
    let total = nueva.total.unwrap_or_else(|| &subtotal + &envio);

    let pedido = PedidoRecord {
        usuario,
        productos: nueva.items,
        subtotal,
        envio,
        total,
        estado: EstadoOrden::Pendiente,
        direccion_envio: nueva.direccion_envio,
        pago: nueva.metodo_pago,
        referencia_pago: None,
        notas: nueva.notas.unwrap_or_default(),
        ajuste_inventario: None,
    };

    let registro = data
        .almacen
        .create(&contexto.credencial, Coleccion::Pedidos, a_campos(&pedido)?)
        .await
        .map_err(|e| {
            error!(status = e.status, data = %e.data, "Error al crear orden");
            ApiError::almacen(format!("No se pudo crear la orden: {}", e.message), e)
        })?;

    info!(orden_id = %registro.id, "Orden creada");
    Ok(HttpResponse::Created().json(Orden::try_from(&registro)?))
}

#[utoipa::path(
    get,
    path = "/api/ordenes/{id}",
    tag = "ordenes",
    params(("id" = String, Path, description = "Id del registro")),
    responses(
        (status = 200, description = "Orden"),
        (status = 404, description = "No encontrada", body = ErrorResponse)
    )
)]
#[get("/api/ordenes/{id}")]
pub async fn buscar_orden_por_id(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let orden = obtener_orden(&data.almacen, &contexto.credencial, &id)
        .await
        .map_err(error_orden)?;
    Ok(HttpResponse::Ok().json(visible_para(orden, &contexto)))
}

/// Ruta para cambiar el estado de una orden (solo administradores).
#[utoipa::path(
    put,
    path = "/api/ordenes/{id}",
    tag = "ordenes",
    params(("id" = String, Path, description = "Id del registro")),
    responses(
        (status = 200, description = "Orden actualizada"),
        (status = 400, description = "Estado inválido", body = ErrorResponse),
        (status = 403, description = "Solo administradores", body = ErrorResponse)
    )
)]
#[put("/api/ordenes/{id}")]
pub async fn actualizar_estado_orden(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
    cambio: web::Json<ActualizacionEstado>,
) -> Result<HttpResponse, ApiError> {
    contexto.exigir_admin()?;
    let id = path.into_inner();

    let registro = data
        .almacen
        .update(&contexto.credencial, Coleccion::Pedidos, &id, a_campos(&cambio.into_inner())?)
        .await
        .map_err(error_orden)?;

    let orden = Orden::try_from(&registro)?;
    info!(orden_id = %id, estado = orden.estado.como_str(), "Estado de orden actualizado");
    Ok(HttpResponse::Ok().json(orden))
}

#[utoipa::path(
    delete,
    path = "/api/ordenes/{id}",
    tag = "ordenes",
    params(("id" = String, Path, description = "Id del registro")),
    responses(
        (status = 200, description = "Orden eliminada", body = MensajeResponse),
        (status = 403, description = "Solo administradores", body = ErrorResponse),
        (status = 404, description = "No encontrada", body = ErrorResponse)
    )
)]
#[delete("/api/ordenes/{id}")]
pub async fn eliminar_orden(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    contexto.exigir_admin()?;
    let id = path.into_inner();

    data.almacen
        .delete(&contexto.credencial, Coleccion::Pedidos, &id)
        .await
        .map_err(error_orden)?;

    info!(orden_id = %id, "Orden eliminada");
    Ok(HttpResponse::Ok().json(MensajeResponse::new("Orden eliminada correctamente")))
}

/// Ruta para las órdenes de un usuario: el propio usuario o un administrador.
#[utoipa::path(
    get,
    path = "/api/ordenes/usuario/{usuario_id}",
    tag = "ordenes",
    params(("usuario_id" = String, Path, description = "Id del usuario")),
    responses(
        (status = 200, description = "Órdenes del usuario"),
        (status = 403, description = "Sin permiso", body = ErrorResponse)
    )
)]
#[get("/api/ordenes/usuario/{usuario_id}")]
pub async fn buscar_ordenes_de_usuario(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let sesion = contexto.exigir_sesion()?;
    let usuario_id = path.into_inner();
    if sesion.usuario_id != usuario_id && !contexto.credencial.es_admin() {
        return Err(ApiError::prohibido("No puedes ver las órdenes de otro usuario"));
    }

    let ordenes = obtener_ordenes(
        &data.almacen,
        &contexto.credencial,
        ConsultaLista::nueva().donde("usuario", usuario_id.as_str()),
    )
    .await?;
    let ordenes: Vec<Orden> = ordenes.into_iter().map(|o| visible_para(o, &contexto)).collect();
    Ok(HttpResponse::Ok().json(ordenes))
}
