// src/usuarios/usuario_router.rs

use actix_web::{delete, get, post, put, web, HttpResponse};
use tracing::{error, info};

use super::auth_middleware::ContextoSolicitud;
use super::usuario_structs::{limpiar_telefono, ActualizacionUsuario, NuevoUsuario, Usuario, UsuarioActualizado};
use crate::almacen::{a_campos, Coleccion, ConsultaLista, ErrorAlmacen};
use crate::shared::shared_structs::{ErrorResponse, MensajeResponse};
use crate::shared::utilidades::{validar_email, validar_password};
use crate::shared::ApiError;
use crate::AppState;

/// Traduce el primer error por campo del almacén a `Error en {campo}: {detalle}`.
pub fn error_de_usuario(e: ErrorAlmacen) -> ApiError {
    if e.status != 400 {
        return e.into();
    }
    match e.primer_error_de_campo() {
        Some((campo, code, message)) => {
            let detalle = match code.as_str() {
                "validation_not_unique" => "Ya existe un usuario con este valor.".to_string(),
                "validation_required" => "Este campo es obligatorio.".to_string(),
                "validation_is_email" => "Debe ser un correo válido.".to_string(),
                _ => message,
            };
            ApiError::almacen(format!("Error en {}: {}", campo, detalle), e)
        }
        None => e.into(),
    }
}

fn no_encontrado_o(e: ErrorAlmacen) -> ApiError {
    if e.es_no_encontrado() {
        ApiError::NoEncontrado("Usuario no encontrado".to_string())
    } else {
        e.into()
    }
}

/// Ruta para listar usuarios (solo administradores), más recientes primero.
#[utoipa::path(
    get,
    path = "/api/usuarios",
    tag = "usuarios",
    responses(
        (status = 200, description = "Usuarios"),
        (status = 403, description = "Solo administradores", body = ErrorResponse)
    )
)]
#[get("/api/usuarios")]
pub async fn buscar_usuarios(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
) -> Result<HttpResponse, ApiError> {
    let registros = data
        .almacen
        .get_full_list(&contexto.credencial, Coleccion::Users, &ConsultaLista::nueva().recientes_primero())
        .await
        .map_err(|e| {
            if e.es_prohibido() {
                ApiError::almacen("No tienes permisos de administrador", e)
            } else {
                e.into()
            }
        })?;

    let usuarios = registros.iter().map(|r| Usuario::try_from(r)).collect::<Result<Vec<_>, _>>()?;
    Ok(HttpResponse::Ok().json(usuarios))
}

/// Ruta para crear un usuario desde el panel de administración.
#[utoipa::path(
    post,
    path = "/api/usuarios",
    tag = "usuarios",
    responses(
        (status = 201, description = "Usuario creado"),
        (status = 400, description = "Datos inválidos", body = ErrorResponse),
        (status = 403, description = "Solo administradores", body = ErrorResponse)
    )
)]
#[post("/api/usuarios")]
pub async fn crear_usuario(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    nuevo_usuario: web::Json<NuevoUsuario>,
) -> Result<HttpResponse, ApiError> {
    contexto.exigir_admin()?;
    let mut nuevo = nuevo_usuario.into_inner();

    if !validar_email(&nuevo.email) {
        return Err(ApiError::validacion("El email no es válido"));
    }
    if !validar_password(&nuevo.password) {
        return Err(ApiError::validacion("La contraseña debe tener al menos 6 caracteres"));
    }
    if nuevo.password != nuevo.password_confirm {
        return Err(ApiError::validacion("Las contraseñas no coinciden"));
    }
    nuevo.telefono = nuevo.telefono.as_deref().map(limpiar_telefono);

    let registro = data
        .almacen
        .create(&contexto.credencial, Coleccion::Users, a_campos(&nuevo)?)
        .await
        .map_err(|e| {
            error!(status = e.status, data = %e.data, "Error creando usuario");
            error_de_usuario(e)
        })?;

    let usuario = Usuario::try_from(&registro)?;
    info!(usuario_id = %usuario.id, "Usuario creado desde administración");
    Ok(HttpResponse::Created().json(usuario))
}

#[utoipa::path(
    get,
    path = "/api/usuarios/{id}",
    tag = "usuarios",
    params(("id" = String, Path, description = "Id del registro")),
    responses(
        (status = 200, description = "Usuario"),
        (status = 404, description = "No encontrado", body = ErrorResponse)
    )
)]
#[get("/api/usuarios/{id}")]
pub async fn buscar_usuario_por_id(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let registro = data
        .almacen
        .get_one(&contexto.credencial, Coleccion::Users, &id)
        .await
        .map_err(no_encontrado_o)?;

    Ok(HttpResponse::Ok().json(Usuario::try_from(&registro)?))
}

/// Ruta para actualizar un usuario. Si quien actualiza no puede cambiar el rol,
/// el resto de cambios se guarda y la respuesta informa `camposOmitidos`.
#[utoipa::path(
    put,
    path = "/api/usuarios/{id}",
    tag = "usuarios",
    params(("id" = String, Path, description = "Id del registro")),
    responses(
        (status = 200, description = "Usuario actualizado, con camposOmitidos"),
        (status = 400, description = "Datos inválidos", body = ErrorResponse),
        (status = 403, description = "Sin permiso", body = ErrorResponse)
    )
)]
#[put("/api/usuarios/{id}")]
pub async fn actualizar_usuario(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
    cambios: web::Json<ActualizacionUsuario>,
) -> Result<HttpResponse, ApiError> {
    contexto.exigir_sesion()?;
    let id = path.into_inner();
    let mut cambios = cambios.into_inner();

    if let Some(email) = &cambios.email {
        if !validar_email(email) {
            return Err(ApiError::validacion("El email no es válido"));
        }
    }
    cambios.telefono = cambios.telefono.as_deref().map(limpiar_telefono);

    let resultado = data
        .almacen
        .actualizar_con_degradacion(&contexto.credencial, Coleccion::Users, &id, a_campos(&cambios)?, &["rol"])
        .await
        .map_err(|e| if e.es_no_encontrado() { no_encontrado_o(e) } else { error_de_usuario(e) })?;

    Ok(HttpResponse::Ok().json(UsuarioActualizado {
        usuario: Usuario::try_from(&resultado.registro)?,
        campos_omitidos: resultado.campos_omitidos,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/usuarios/{id}",
    tag = "usuarios",
    params(("id" = String, Path, description = "Id del registro")),
    responses(
        (status = 200, description = "Usuario eliminado", body = MensajeResponse),
        (status = 403, description = "Sin permiso", body = ErrorResponse),
        (status = 404, description = "No encontrado", body = ErrorResponse)
    )
)]
#[delete("/api/usuarios/{id}")]
pub async fn eliminar_usuario(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    contexto.exigir_admin()?;
    let id = path.into_inner();

    data.almacen
        .delete(&contexto.credencial, Coleccion::Users, &id)
        .await
        .map_err(no_encontrado_o)?;

    info!(usuario_id = %id, "Usuario eliminado");
    Ok(HttpResponse::Ok().json(MensajeResponse::new("Usuario eliminado correctamente")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[test]
    fn traduce_errores_de_campo() {
        let mut campos = Map::new();
        campos.insert("email".into(), json!({ "code": "validation_not_unique", "message": "Value must be unique." }));
        let error = error_de_usuario(ErrorAlmacen::validacion("Failed to create record.", campos));
        assert_eq!(error.to_string(), "Error en email: Ya existe un usuario con este valor.");
    }

    #[test]
    fn errores_sin_campo_conservan_el_mensaje() {
        let error = error_de_usuario(ErrorAlmacen::prohibido("Sin permiso"));
        assert_eq!(error.to_string(), "Sin permiso");
    }
}
