// src/productos/productos_router.rs

use actix_web::{delete, get, post, put, web, HttpResponse};
use bigdecimal::BigDecimal;
use serde_json::json;
use tracing::{error, info, warn};

use super::productos_api::{categoria_legible, obtener_producto, obtener_productos};
use super::productos_structs::{ActualizacionProducto, FiltroProductos, NuevoProducto, Producto, ProductoActualizado};
use crate::almacen::{a_campos, Coleccion, ErrorAlmacen};
use crate::shared::shared_structs::{ErrorResponse, MensajeResponse};
use crate::shared::ApiError;
use crate::usuarios::auth_middleware::ContextoSolicitud;
use crate::AppState;

const STOCK_MAXIMO: i64 = 10_000;

fn validar_precio_y_stock(precio: Option<&BigDecimal>, stock: Option<i64>) -> Result<(), ApiError> {
    if let Some(precio) = precio {
        if *precio <= BigDecimal::from(0) {
            return Err(ApiError::validacion("El precio debe ser mayor a 0"));
        }
    }
    if let Some(stock) = stock {
        if !(0..=STOCK_MAXIMO).contains(&stock) {
            return Err(ApiError::validacion(format!("El stock debe estar entre 0 y {}", STOCK_MAXIMO)));
        }
    }
    Ok(())
}

fn permiso_denegado(regla: &str, e: ErrorAlmacen) -> ApiError {
    warn!(regla, error = %e, "Permiso denegado en productos");
    ApiError::prohibido_con_detalles(
        format!("Permiso denegado. Revisa la regla '{}' en la colección 'productos'.", regla),
        json!({ "status": e.status, "message": e.message, "data": e.data }),
    )
}

fn no_encontrado_o(e: ErrorAlmacen) -> ApiError {
    if e.es_no_encontrado() {
        ApiError::NoEncontrado("Producto no encontrado".to_string())
    } else {
        e.into()
    }
}

/// Ruta para buscar el catálogo con filtros y orden opcionales.
#[utoipa::path(
    get,
    path = "/api/productos",
    tag = "productos",
    responses(
        (status = 200, description = "Productos filtrados y ordenados")
    )
)]
#[get("/api/productos")]
pub async fn buscar_productos(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    filtro: web::Query<FiltroProductos>,
) -> Result<HttpResponse, ApiError> {
    let productos = obtener_productos(&data.almacen, &contexto.credencial, &filtro)
        .await
        .map_err(|e| {
            error!(error = %e, "Error al obtener productos");
            ApiError::from(e)
        })?;
    Ok(HttpResponse::Ok().json(productos))
}

/// Ruta para registrar un nuevo producto (solo administradores).
#[utoipa::path(
    post,
    path = "/api/productos",
    tag = "productos",
    responses(
        (status = 201, description = "Producto creado"),
        (status = 400, description = "Datos inválidos", body = ErrorResponse),
        (status = 403, description = "Solo administradores", body = ErrorResponse)
    )
)]
#[post("/api/productos")]
pub async fn crear_producto(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    item: web::Json<NuevoProducto>,
) -> Result<HttpResponse, ApiError> {
    contexto.exigir_admin()?;
    let mut item = item.into_inner();
    item.nombre = item.nombre.trim().to_string();
    item.descripcion = item.descripcion.trim().to_string();
    item.categoria = item.categoria.trim().to_string();

    if item.nombre.is_empty() || item.descripcion.is_empty() || item.precio.is_none() || item.categoria.is_empty() {
        return Err(ApiError::validacion("Campos requeridos: nombre, descripcion, precio, categoria"));
    }
    validar_precio_y_stock(item.precio.as_ref(), item.stock)?;

    match categoria_legible(&data.almacen, &contexto.credencial, &item.categoria).await {
        Ok(true) => {}
        Ok(false) => {
            return Err(ApiError::prohibido_con_detalles(
                "Error de Permisos en Categorías",
                json!({
                    "categoria": item.categoria,
                    "message": "No se pudo leer la categoría. Revisa la regla 'View' de la colección 'categorias'."
                }),
            ))
        }
        Err(e) => return Err(e.into()),
    }

    let registro = data
        .almacen
        .create(&contexto.credencial, Coleccion::Productos, a_campos(&item)?)
        .await
        .map_err(|e| if e.es_prohibido() { permiso_denegado("Create", e) } else { e.into() })?;

    info!(producto_id = %registro.id, nombre = %item.nombre, "Producto creado");
    Ok(HttpResponse::Created().json(Producto::try_from(&registro)?))
}

#[utoipa::path(
    get,
    path = "/api/productos/{id}",
    tag = "productos",
    params(("id" = String, Path, description = "Id del registro")),
    responses(
        (status = 200, description = "Producto"),
        (status = 404, description = "No encontrado", body = ErrorResponse)
    )
)]
#[get("/api/productos/{id}")]
pub async fn buscar_producto_por_id(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let producto = obtener_producto(&data.almacen, &contexto.credencial, &id)
        .await
        .map_err(|e| {
            if e.es_prohibido() {
                ApiError::prohibido_con_detalles("Acceso denegado", json!({ "message": e.message }))
            } else {
                no_encontrado_o(e)
            }
        })?;
    Ok(HttpResponse::Ok().json(producto))
}

/// Ruta para actualizar un producto. Si la categoría es rechazada por el
/// almacén, el resto de cambios se guarda y se informa en `camposOmitidos`.
#[utoipa::path(
    put,
    path = "/api/productos/{id}",
    tag = "productos",
    params(("id" = String, Path, description = "Id del registro")),
    responses(
        (status = 200, description = "Producto actualizado, con camposOmitidos"),
        (status = 400, description = "Datos o categoría inválidos", body = ErrorResponse),
        (status = 403, description = "Solo administradores", body = ErrorResponse),
        (status = 404, description = "No encontrado", body = ErrorResponse)
    )
)]
#[put("/api/productos/{id}")]
pub async fn actualizar_producto(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
    item: web::Json<ActualizacionProducto>,
) -> Result<HttpResponse, ApiError> {
    contexto.exigir_admin()?;
    let id = path.into_inner();
    let mut cambios = item.into_inner();

    if let Some(nombre) = &cambios.nombre {
        if nombre.trim().is_empty() {
            return Err(ApiError::validacion("El nombre del producto es obligatorio"));
        }
    }
    validar_precio_y_stock(cambios.precio.as_ref(), cambios.stock)?;

    let actual = obtener_producto(&data.almacen, &contexto.credencial, &id)
        .await
        .map_err(no_encontrado_o)?;

    // La categoría solo se vuelve a validar si cambia; se guarda ya recortada.
    if let Some(categoria) = cambios.categoria.take() {
        let categoria = categoria.trim().to_string();
        if !categoria.is_empty() && categoria != actual.categoria {
            if !categoria_legible(&data.almacen, &contexto.credencial, &categoria).await? {
                return Err(ApiError::validacion_con_detalles(
                    "La categoría seleccionada no es válida o no existe.",
                    json!({ "categoria": { "message": format!("No se encontró la categoría {}", categoria) } }),
                ));
            }
            cambios.categoria = Some(categoria);
        }
    }

    let resultado = data
        .almacen
        .actualizar_con_degradacion(&contexto.credencial, Coleccion::Productos, &id, a_campos(&cambios)?, &["categoria"])
        .await
        .map_err(|e| {
            if e.es_prohibido() {
                ApiError::almacen("No tienes permiso para actualizar productos.", e)
            } else {
                no_encontrado_o(e)
            }
        })?;

    if !resultado.campos_omitidos.is_empty() {
        warn!(producto_id = %id, campos = ?resultado.campos_omitidos, "Producto actualizado sin algunos campos");
    }
    Ok(HttpResponse::Ok().json(ProductoActualizado {
        producto: Producto::try_from(&resultado.registro)?,
        campos_omitidos: resultado.campos_omitidos,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/productos/{id}",
    tag = "productos",
    params(("id" = String, Path, description = "Id del registro")),
    responses(
        (status = 200, description = "Producto eliminado", body = MensajeResponse),
        (status = 403, description = "Solo administradores", body = ErrorResponse),
        (status = 404, description = "No encontrado", body = ErrorResponse)
    )
)]
#[delete("/api/productos/{id}")]
pub async fn eliminar_producto(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    contexto.exigir_admin()?;
    let id = path.into_inner();

    data.almacen
        .delete(&contexto.credencial, Coleccion::Productos, &id)
        .await
        .map_err(|e| if e.es_prohibido() { permiso_denegado("Delete", e) } else { no_encontrado_o(e) })?;

    info!(producto_id = %id, "Producto eliminado");
    Ok(HttpResponse::Ok().json(MensajeResponse::new("Producto eliminado exitosamente")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn rechaza_precio_cero_y_stock_fuera_de_rango() {
        assert!(validar_precio_y_stock(Some(&BigDecimal::from(0)), None).is_err());
        assert!(validar_precio_y_stock(None, Some(-1)).is_err());
        assert!(validar_precio_y_stock(None, Some(10_001)).is_err());
        assert!(validar_precio_y_stock(Some(&BigDecimal::from(990)), Some(10_000)).is_ok());
    }

    #[test]
    fn permiso_denegado_nombra_la_regla() {
        let error = permiso_denegado("Create", ErrorAlmacen::prohibido("Sin permiso"));
        assert_eq!(error.status_code(), actix_web::http::StatusCode::FORBIDDEN);
        assert_eq!(error.to_string(), "Permiso denegado. Revisa la regla 'Create' en la colección 'productos'.");
    }
}
