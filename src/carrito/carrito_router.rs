// src/carrito/carrito_router.rs

use actix_web::{cookie::Cookie, delete, get, post, put, web, HttpResponse, HttpResponseBuilder};
use tracing::info;
use uuid::Uuid;

use super::almacen_carrito::{clave_carrito, SesionCarrito};
use super::carrito_structs::{ActualizarCantidadRequest, AgregarItemRequest, CarritoResponse};
use crate::productos::productos_api::obtener_producto;
use crate::shared::shared_structs::ErrorResponse;
use crate::shared::ApiError;
use crate::usuarios::auth_middleware::{cookie_invitado, ContextoSolicitud};
use crate::AppState;

/// Carrito de la identidad de la solicitud. Un invitado sin cookie recibe un id
/// nuevo, que se devuelve como cookie.
pub async fn abrir_carrito(data: &AppState, contexto: &ContextoSolicitud) -> (SesionCarrito, Option<Cookie<'static>>) {
    let usuario_id = contexto.credencial.usuario_id();
    let (invitado_id, cookie) = match (&contexto.invitado_id, usuario_id) {
        (Some(id), _) => (Some(id.clone()), None),
        (None, Some(_)) => (None, None),
        (None, None) => {
            let id = Uuid::new_v4().to_string();
            let cookie = cookie_invitado(&id);
            (Some(id), Some(cookie))
        }
    };

    let clave = clave_carrito(usuario_id, invitado_id.as_deref());
    (SesionCarrito::abrir(data.carritos.clone(), clave).await, cookie)
}

fn responder(mut respuesta: HttpResponseBuilder, cookie: Option<Cookie<'static>>, cuerpo: CarritoResponse) -> HttpResponse {
    if let Some(cookie) = cookie {
        respuesta.cookie(cookie);
    }
    respuesta.json(cuerpo)
}

#[utoipa::path(
    get,
    path = "/api/carrito",
    tag = "carrito",
    responses(
        (status = 200, description = "Carrito de la identidad actual")
    )
)]
#[get("/api/carrito")]
pub async fn ver_carrito(data: web::Data<AppState>, contexto: ContextoSolicitud) -> HttpResponse {
    let (sesion, cookie) = abrir_carrito(&data, &contexto).await;
    responder(HttpResponse::Ok(), cookie, sesion.carrito().into())
}

/// Ruta para agregar un producto. La cantidad se recorta al stock actual y la
/// respuesta indica si hubo recorte.
#[utoipa::path(
    post,
    path = "/api/carrito/items",
    tag = "carrito",
    responses(
        (status = 200, description = "Carrito actualizado; indica si la cantidad se recortó"),
        (status = 400, description = "Producto o cantidad inválidos", body = ErrorResponse)
    )
)]
#[post("/api/carrito/items")]
pub async fn agregar_item(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    item: web::Json<AgregarItemRequest>,
) -> Result<HttpResponse, ApiError> {
    if item.cantidad <= 0 {
        return Err(ApiError::validacion("La cantidad debe ser mayor a 0"));
    }
    let producto = obtener_producto(&data.almacen, &contexto.credencial, &item.producto_id)
        .await
        .map_err(|e| {
            if e.es_no_encontrado() {
                ApiError::NoEncontrado("Producto no encontrado".to_string())
            } else {
                e.into()
            }
        })?;
    if !producto.activo {
        return Err(ApiError::validacion(format!("{} no está disponible", producto.nombre)));
    }

    let (mut sesion, cookie) = abrir_carrito(&data, &contexto).await;
    let resultado = sesion.modificar(|carrito| carrito.agregar_item(&producto, item.cantidad)).await;
    if resultado.truncado {
        info!(
            producto_id = %producto.id,
            pedida = item.cantidad,
            cantidad_final = resultado.cantidad_final,
            "Cantidad recortada al stock disponible"
        );
    }

    let mut cuerpo = CarritoResponse::from(sesion.carrito());
    cuerpo.cantidad_final = Some(resultado.cantidad_final);
    cuerpo.truncado = Some(resultado.truncado);
    Ok(responder(HttpResponse::Ok(), cookie, cuerpo))
}

#[utoipa::path(
    put,
    path = "/api/carrito/items/{producto_id}",
    tag = "carrito",
    params(("producto_id" = String, Path, description = "Id del producto")),
    responses(
        (status = 200, description = "Carrito actualizado"),
        (status = 400, description = "Cantidad inválida", body = ErrorResponse)
    )
)]
#[put("/api/carrito/items/{producto_id}")]
pub async fn actualizar_item(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
    cambio: web::Json<ActualizarCantidadRequest>,
) -> HttpResponse {
    let producto_id = path.into_inner();
    let (mut sesion, cookie) = abrir_carrito(&data, &contexto).await;
    sesion.modificar(|carrito| carrito.actualizar_cantidad(&producto_id, cambio.cantidad)).await;
    responder(HttpResponse::Ok(), cookie, sesion.carrito().into())
}

#[utoipa::path(
    delete,
    path = "/api/carrito/items/{producto_id}",
    tag = "carrito",
    params(("producto_id" = String, Path, description = "Id del producto")),
    responses(
        (status = 200, description = "Carrito actualizado")
    )
)]
#[delete("/api/carrito/items/{producto_id}")]
pub async fn eliminar_item(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
) -> HttpResponse {
    let producto_id = path.into_inner();
    let (mut sesion, cookie) = abrir_carrito(&data, &contexto).await;
    sesion.modificar(|carrito| carrito.eliminar_item(&producto_id)).await;
    responder(HttpResponse::Ok(), cookie, sesion.carrito().into())
}

#[utoipa::path(
    delete,
    path = "/api/carrito",
    tag = "carrito",
    responses(
        (status = 200, description = "Carrito vacío")
    )
)]
#[delete("/api/carrito")]
pub async fn vaciar_carrito(data: web::Data<AppState>, contexto: ContextoSolicitud) -> HttpResponse {
    let (mut sesion, cookie) = abrir_carrito(&data, &contexto).await;
    sesion.limpiar().await;
    responder(HttpResponse::Ok(), cookie, sesion.carrito().into())
}
