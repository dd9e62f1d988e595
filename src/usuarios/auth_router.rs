// src/usuarios/auth_router.rs

use actix_web::{get, post, web, HttpResponse};
use tracing::{info, warn};

use super::auth_middleware::{cookie_sesion, cookie_sesion_expirada, ContextoSolicitud};
use super::usuario_router::error_de_usuario;
use super::usuario_structs::{LoginRequest, RegistroRequest, Usuario, UsuarioResponse};
use crate::almacen::{a_campos, Coleccion};
use crate::shared::shared_structs::{ErrorResponse, MensajeResponse};
use crate::shared::utilidades::{validar_email, validar_password};
use crate::shared::ApiError;
use crate::AppState;

/// Ruta para iniciar sesión. Deja el token en la cookie `pb_auth`.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    responses(
        (status = 200, description = "Sesión iniciada; cookie pb_auth"),
        (status = 400, description = "Credenciales inválidas", body = ErrorResponse)
    )
)]
#[post("/api/auth/login")]
pub async fn iniciar_sesion(
    data: web::Data<AppState>,
    login_request: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    if login_request.email.trim().is_empty() || login_request.password.is_empty() {
        return Err(ApiError::validacion("Email y contraseña son requeridos"));
    }

    let auth = data
        .almacen
        .auth_with_password(&login_request.email, &login_request.password)
        .await
        .map_err(|e| {
            if e.status >= 500 {
                return ApiError::from(e);
            }
            warn!(email = %login_request.email, "Intento de inicio de sesión fallido");
            ApiError::NoAutenticado("Email o contraseña incorrectos".to_string())
        })?;

    let usuario = Usuario::try_from(&auth.registro)?;
    info!(usuario_id = %usuario.id, "Inicio de sesión");

    Ok(HttpResponse::Ok().cookie(cookie_sesion(&auth.token)).json(UsuarioResponse { usuario }))
}

/// Ruta para registrar un usuario y abrir su sesión.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    responses(
        (status = 201, description = "Usuario registrado y sesión abierta"),
        (status = 400, description = "Datos inválidos o email en uso", body = ErrorResponse)
    )
)]
#[post("/api/auth/register")]
pub async fn registrar(
    data: web::Data<AppState>,
    contexto: ContextoSolicitud,
    registro: web::Json<RegistroRequest>,
) -> Result<HttpResponse, ApiError> {
    let registro = registro.into_inner();

    let obligatorios = [
        &registro.email,
        &registro.password,
        &registro.password_confirm,
        &registro.nombre,
        &registro.apellido,
    ];
    if obligatorios.iter().any(|campo| campo.trim().is_empty()) {
        return Err(ApiError::validacion(
            "Todos los campos son requeridos: email, password, passwordConfirm, nombre, apellido",
        ));
    }
    if registro.password != registro.password_confirm {
        return Err(ApiError::validacion("Las contraseñas no coinciden"));
    }
    if !validar_password(&registro.password) {
        return Err(ApiError::validacion("La contraseña debe tener al menos 6 caracteres"));
    }
    if !validar_email(&registro.email) {
        return Err(ApiError::validacion("El email no es válido"));
    }

    data.almacen
        .create(&contexto.credencial, Coleccion::Users, a_campos(&registro)?)
        .await
        .map_err(|e| {
            if e.es_prohibido() {
                ApiError::almacen(
                    "No se pudo registrar. Verifica que la regla 'Create' en la colección 'users' esté vacía (pública).",
                    e,
                )
            } else {
                error_de_usuario(e)
            }
        })?;

    let auth = data.almacen.auth_with_password(&registro.email, &registro.password).await?;
    let usuario = Usuario::try_from(&auth.registro)?;
    info!(usuario_id = %usuario.id, "Usuario registrado");

    Ok(HttpResponse::Created().cookie(cookie_sesion(&auth.token)).json(UsuarioResponse { usuario }))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Sesión cerrada", body = MensajeResponse)
    )
)]
#[post("/api/auth/logout")]
pub async fn cerrar_sesion() -> HttpResponse {
    HttpResponse::Ok()
        .cookie(cookie_sesion_expirada())
        .json(MensajeResponse::new("Sesión cerrada correctamente"))
}

/// Usuario de la sesión actual. Renueva la cookie con el token refrescado.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Usuario de la sesión"),
        (status = 401, description = "Sin sesión", body = ErrorResponse)
    )
)]
#[get("/api/auth/me")]
pub async fn usuario_actual(contexto: ContextoSolicitud) -> Result<HttpResponse, ApiError> {
    let sesion = contexto.exigir_sesion()?;
    let usuario = Usuario::try_from(&sesion.registro)?;

    Ok(HttpResponse::Ok().cookie(cookie_sesion(&sesion.token)).json(UsuarioResponse { usuario }))
}
