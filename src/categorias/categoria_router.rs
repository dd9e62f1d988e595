// src/categorias/categoria_router.rs

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;
use tracing::{info, warn};

use super::categoria_structs::{ActualizacionCategoria, Categoria, FiltroCategorias, NuevaCategoria};
use crate::almacen::{a_campos, Coleccion, ConsultaLista, ErrorAlmacen};
use crate::shared::shared_structs::{ErrorResponse, MensajeResponse};
use crate::shared::ApiError;
use crate::usuarios::auth_middleware::ContextoSolicitud;
use crate::AppState;

/// 403 y 404 con mensajes propios; el resto conserva el estado del almacén.
fn error_categoria(e: ErrorAlmacen, regla: &str) -> ApiError {
    if e.es_prohibido() {
        warn!(regla, error = %e, "Permiso denegado en categorias");
        return ApiError::prohibido_con_detalles(
            format!("Permiso denegado. Revisa la regla '{}' en la colección 'categorias'.", regla),
            json!("Debes permitir que los usuarios autenticados (o admins) modifiquen registros."),
        );
    }
    if e.es_no_encontrado() {
        return ApiError::NoEncontrado("Categoría no encontrada".to_string());
    }
    e.into()
}

/// Ruta para buscar todas las categorías, más recientes primero.
#[utoipa::path(
    get,
    path = "/api/categorias",
    tag = "categorias",
    responses(
        (status = 200, description = "Categorías")
    )
)]
#[get("/api/categorias")]
pub async fn buscar_categorias(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    filtro: web::Query<FiltroCategorias>,
) -> Result<HttpResponse, ApiError> {
    let mut consulta = ConsultaLista::nueva().recientes_primero();
    if let Some(activa) = filtro.activa {
        consulta = consulta.donde("activa", activa);
    }

    let registros = data
        .almacen
        .get_full_list(&contexto.credencial, Coleccion::Categorias, &consulta)
        .await
        .map_err(|e| error_categoria(e, "List"))?;

    let categorias = registros.iter().map(|r| Categoria::try_from(r)).collect::<Result<Vec<_>, _>>()?;
    Ok(HttpResponse::Ok().json(categorias))
}

/// Ruta para registrar una nueva categoría.
#[utoipa::path(
    post,
    path = "/api/categorias",
    tag = "categorias",
    responses(
        (status = 201, description = "Categoría creada"),
        (status = 400, description = "Datos inválidos", body = ErrorResponse),
        (status = 403, description = "Solo administradores", body = ErrorResponse)
    )
)]
#[post("/api/categorias")]
pub async fn crear_categoria(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    item: web::Json<NuevaCategoria>,
) -> Result<HttpResponse, ApiError> {
    let mut item = item.into_inner();
    item.nombre = item.nombre.trim().to_string();
    if item.nombre.is_empty() {
        return Err(ApiError::validacion("El nombre de la categoría es obligatorio"));
    }

    let registro = data
        .almacen
        .create(&contexto.credencial, Coleccion::Categorias, a_campos(&item)?)
        .await
        .map_err(|e| error_categoria(e, "Create"))?;

    info!(categoria_id = %registro.id, "Categoría creada");
    Ok(HttpResponse::Created().json(Categoria::try_from(&registro)?))
}

#[utoipa::path(
    get,
    path = "/api/categorias/{id}",
    tag = "categorias",
    params(("id" = String, Path, description = "Id del registro")),
    responses(
        (status = 200, description = "Categoría"),
        (status = 404, description = "No encontrada", body = ErrorResponse)
    )
)]
#[get("/api/categorias/{id}")]
pub async fn buscar_categoria_por_id(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let registro = data
        .almacen
        .get_one(&contexto.credencial, Coleccion::Categorias, &id)
        .await
        .map_err(|e| error_categoria(e, "View"))?;

    Ok(HttpResponse::Ok().json(Categoria::try_from(&registro)?))
}

#[utoipa::path(
    put,
    path = "/api/categorias/{id}",
    tag = "categorias",
    params(("id" = String, Path, description = "Id del registro")),
    responses(
        (status = 200, description = "Categoría actualizada"),
        (status = 403, description = "Solo administradores", body = ErrorResponse),
        (status = 404, description = "No encontrada", body = ErrorResponse)
    )
)]
#[put("/api/categorias/{id}")]
pub async fn actualizar_categoria(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
    item: web::Json<ActualizacionCategoria>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let mut item = item.into_inner();
    if let Some(nombre) = &item.nombre {
        if nombre.trim().is_empty() {
            return Err(ApiError::validacion("El nombre de la categoría es obligatorio"));
        }
        item.nombre = Some(nombre.trim().to_string());
    }

    let registro = data
        .almacen
        .update(&contexto.credencial, Coleccion::Categorias, &id, a_campos(&item)?)
        .await
        .map_err(|e| error_categoria(e, "Update"))?;

    Ok(HttpResponse::Ok().json(Categoria::try_from(&registro)?))
}

#[utoipa::path(
    delete,
    path = "/api/categorias/{id}",
    tag = "categorias",
    params(("id" = String, Path, description = "Id del registro")),
    responses(
        (status = 200, description = "Categoría eliminada", body = MensajeResponse),
        (status = 403, description = "Solo administradores", body = ErrorResponse),
        (status = 404, description = "No encontrada", body = ErrorResponse)
    )
)]
#[delete("/api/categorias/{id}")]
pub async fn eliminar_categoria(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    data.almacen
        .delete(&contexto.credencial, Coleccion::Categorias, &id)
        .await
        .map_err(|e| error_categoria(e, "Delete"))?;

    info!(categoria_id = %id, "Categoría eliminada");
    Ok(HttpResponse::Ok().json(MensajeResponse::new("Categoría eliminada correctamente")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, ResponseError};

    #[test]
    fn permiso_denegado_nombra_la_regla() {
        let error = error_categoria(ErrorAlmacen::prohibido("Only admins can perform this action."), "Create");
        assert_eq!(error.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(error.to_string(), "Permiso denegado. Revisa la regla 'Create' en la colección 'categorias'.");
    }

    #[test]
    fn no_encontrada_y_otros_errores() {
        let error = error_categoria(ErrorAlmacen::no_encontrado(), "View");
        assert_eq!(error.to_string(), "Categoría no encontrada");

        let error = error_categoria(ErrorAlmacen::interno("caída"), "List");
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
