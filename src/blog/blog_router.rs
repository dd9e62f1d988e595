// src/blog/blog_router.rs

use actix_web::{delete, get, post, put, web, HttpResponse};
use tracing::info;

use super::blog_structs::{Articulo, Comentario, DatosArticulo, NuevoComentario};
use crate::shared::shared_structs::{ErrorResponse, MensajeResponse};
use crate::shared::ApiError;
use crate::usuarios::auth_middleware::ContextoSolicitud;
use crate::AppState;

fn articulo_no_encontrado() -> ApiError {
    ApiError::NoEncontrado("Artículo no encontrado".to_string())
}

#[utoipa::path(
    get,
    path = "/api/blog",
    tag = "blog",
    responses(
        (status = 200, description = "Artículos publicados", body = Vec<Articulo>)
    )
)]
#[get("/api/blog")]
pub async fn buscar_articulos(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.blog.articulos())
}

#[utoipa::path(
    get,
    path = "/api/blog/{id}",
    tag = "blog",
    params(("id" = String, Path, description = "Id del registro")),
    responses(
        (status = 200, description = "Artículo", body = Articulo),
        (status = 404, description = "No encontrado", body = ErrorResponse)
    )
)]
#[get("/api/blog/{id}")]
pub async fn buscar_articulo_por_id(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let articulo = data.blog.articulo(&path.into_inner()).ok_or_else(articulo_no_encontrado)?;
    Ok(HttpResponse::Ok().json(articulo))
}

#[utoipa::path(
    get,
    path = "/api/blog/{id}/comentarios",
    tag = "blog",
    params(("id" = String, Path, description = "Id del registro")),
    responses(
        (status = 200, description = "Comentarios, el más reciente primero", body = Vec<Comentario>),
        (status = 404, description = "Artículo no encontrado", body = ErrorResponse)
    )
)]
#[get("/api/blog/{id}/comentarios")]
pub async fn buscar_comentarios(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    data.blog.articulo(&id).ok_or_else(articulo_no_encontrado)?;
    Ok(HttpResponse::Ok().json(data.blog.comentarios(&id)))
}

/// Ruta para comentar un artículo. Nombre y comentario son obligatorios.
#[utoipa::path(
    post,
    path = "/api/blog/{id}/comentarios",
    tag = "blog",
    params(("id" = String, Path, description = "Id del registro")),
    request_body = NuevoComentario,
    responses(
        (status = 201, description = "Comentario publicado", body = Comentario),
        (status = 400, description = "Nombre o comentario vacío", body = ErrorResponse),
        (status = 404, description = "Artículo no encontrado", body = ErrorResponse)
    )
)]
#[post("/api/blog/{id}/comentarios")]
pub async fn crear_comentario(
    data: web::Data<AppState>,
    path: web::Path<String>,
    item: web::Json<NuevoComentario>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    data.blog.articulo(&id).ok_or_else(articulo_no_encontrado)?;

    let nombre = item.nombre.trim();
    let comentario = item.comentario.trim();
    if nombre.is_empty() || comentario.is_empty() {
        return Err(ApiError::validacion("Por favor completa todos los campos"));
    }

    let nuevo = data.blog.agregar_comentario(&id, nombre, comentario);
    info!(articulo_id = %id, comentario_id = %nuevo.id, "Comentario publicado");
    Ok(HttpResponse::Created().json(nuevo))
}

/// Listado del panel: incluye los artículos inactivos.
#[utoipa::path(
    get,
    path = "/api/admin/blog",
    tag = "blog",
    responses(
        (status = 200, description = "Todos los artículos, también los inactivos", body = Vec<Articulo>),
        (status = 403, description = "Solo administradores", body = ErrorResponse)
    )
)]
#[get("/api/admin/blog")]
pub async fn buscar_todos_los_articulos(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
) -> Result<HttpResponse, ApiError> {
    contexto.exigir_admin()?;
    Ok(HttpResponse::Ok().json(data.blog.todos()))
}

/// Ruta para publicar un artículo (solo administradores). Título, extracto y
/// contenido son obligatorios.
#[utoipa::path(
    post,
    path = "/api/blog",
    tag = "blog",
    request_body = DatosArticulo,
    responses(
        (status = 201, description = "Artículo creado", body = Articulo),
        (status = 400, description = "Falta título, extracto o contenido", body = ErrorResponse),
        (status = 403, description = "Solo administradores", body = ErrorResponse)
    )
)]
#[post("/api/blog")]
pub async fn crear_articulo(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    item: web::Json<DatosArticulo>,
) -> Result<HttpResponse, ApiError> {
    contexto.exigir_admin()?;
    let item = item.into_inner();
    if let Some(mensaje) = item.campo_en_blanco(true) {
        return Err(ApiError::validacion(mensaje));
    }

    let nuevo = data.blog.crear_articulo(item);
    info!(articulo_id = %nuevo.id, titulo = %nuevo.titulo, "Artículo creado");
    Ok(HttpResponse::Created().json(nuevo))
}

/// Edición parcial; `activo` publica u oculta el artículo.
#[utoipa::path(
    put,
    path = "/api/blog/{id}",
    tag = "blog",
    params(("id" = String, Path, description = "Id del registro")),
    request_body = DatosArticulo,
    responses(
        (status = 200, description = "Artículo actualizado", body = Articulo),
        (status = 400, description = "Campo obligatorio en blanco", body = ErrorResponse),
        (status = 404, description = "No encontrado", body = ErrorResponse)
    )
)]
#[put("/api/blog/{id}")]
pub async fn actualizar_articulo(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
    item: web::Json<DatosArticulo>,
) -> Result<HttpResponse, ApiError> {
    contexto.exigir_admin()?;
    let id = path.into_inner();
    let item = item.into_inner();
    if let Some(mensaje) = item.campo_en_blanco(false) {
        return Err(ApiError::validacion(mensaje));
    }

    let articulo = data.blog.actualizar_articulo(&id, item).ok_or_else(articulo_no_encontrado)?;
    info!(articulo_id = %id, activo = articulo.activo, "Artículo actualizado");
    Ok(HttpResponse::Ok().json(articulo))
}

#[utoipa::path(
    delete,
    path = "/api/blog/{id}",
    tag = "blog",
    params(("id" = String, Path, description = "Id del registro")),
    responses(
        (status = 200, description = "Artículo eliminado", body = MensajeResponse),
        (status = 403, description = "Solo administradores", body = ErrorResponse),
        (status = 404, description = "No encontrado", body = ErrorResponse)
    )
)]
#[delete("/api/blog/{id}")]
pub async fn eliminar_articulo(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    contexto.exigir_admin()?;
    let id = path.into_inner();
    if !data.blog.eliminar_articulo(&id) {
        return Err(articulo_no_encontrado());
    }
    info!(articulo_id = %id, "Artículo eliminado");
    Ok(HttpResponse::Ok().json(MensajeResponse::new("Artículo eliminado exitosamente")))
}
