// src/usuarios/auth_middleware.rs

use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    dev::Payload,
    error::ErrorInternalServerError,
    http::header,
    web, FromRequest, HttpRequest,
};
use futures::future::LocalBoxFuture;
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use tracing::debug;

use crate::almacen::auth::DURACION_SESION_DIAS;
use crate::almacen::{Credencial, Sesion};
use crate::shared::ApiError;
use crate::AppState;

/// Cookie con el token de sesión (URL-encoded).
pub const COOKIE_SESION: &str = "pb_auth";
/// Cookie con el identificador del navegador para el carrito de invitado.
pub const COOKIE_INVITADO: &str = "huerto_invitado";

/// Contexto de una solicitud: la credencial validada con la que se habla con el
/// almacén durante esta solicitud, y nada más. Se construye una vez por solicitud.
#[derive(Debug, Clone)]
pub struct ContextoSolicitud {
    pub credencial: Credencial,
    pub invitado_id: Option<String>,
}

impl ContextoSolicitud {
    pub fn sesion(&self) -> Option<&Sesion> {
        self.credencial.sesion()
    }

    pub fn exigir_sesion(&self) -> Result<&Sesion, ApiError> {
        self.sesion().ok_or_else(|| ApiError::NoAutenticado("Usuario no autenticado".to_string()))
    }

    pub fn exigir_admin(&self) -> Result<&Sesion, ApiError> {
        let sesion = self.exigir_sesion()?;
        if !self.credencial.es_admin() {
            return Err(ApiError::prohibido("No tienes permisos de administrador"));
        }
        Ok(sesion)
    }
}

/// Token de la cookie `pb_auth` o, si no hay cookie, del encabezado `Authorization: Bearer`.
fn token_de_solicitud(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(COOKIE_SESION) {
        let token = percent_decode_str(cookie.value()).decode_utf8_lossy().trim().to_string();
        if !token.is_empty() {
            return Some(token);
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|valor| valor.to_str().ok())
        .and_then(|valor| valor.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Extractor del contexto. Un token ausente, inválido o expirado deja la
/// solicitud como anónima; las reglas del almacén deciden después.
impl FromRequest for ContextoSolicitud {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let app_state = req.app_data::<web::Data<AppState>>().cloned();
        let token = token_de_solicitud(req);
        let invitado_id = req
            .cookie(COOKIE_INVITADO)
            .map(|cookie| cookie.value().to_string())
            .filter(|id| !id.is_empty());

        Box::pin(async move {
            let app_state = app_state.ok_or_else(|| {
                tracing::error!("AppState no disponible en el extractor de contexto");
                ErrorInternalServerError("Error de configuración del servidor.")
            })?;

            let credencial = match token {
                Some(token) => match app_state.almacen.auth_refresh(&token).await {
                    Ok(auth) => Credencial::Usuario(auth.en_sesion()),
                    Err(e) => {
                        debug!(error = %e, "Token de sesión descartado");
                        Credencial::Anonima
                    }
                },
                None => Credencial::Anonima,
            };

            Ok(ContextoSolicitud { credencial, invitado_id })
        })
    }
}

pub fn cookie_sesion(token: &str) -> Cookie<'static> {
    Cookie::build(COOKIE_SESION, utf8_percent_encode(token, NON_ALPHANUMERIC).to_string())
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(Duration::days(DURACION_SESION_DIAS))
        .finish()
}

pub fn cookie_sesion_expirada() -> Cookie<'static> {
    let mut cookie = Cookie::build(COOKIE_SESION, "").path("/").same_site(SameSite::Lax).finish();
    cookie.make_removal();
    cookie
}

pub fn cookie_invitado(id: &str) -> Cookie<'static> {
    Cookie::build(COOKIE_INVITADO, id.to_string())
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(Duration::days(30))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn cookie_tiene_prioridad_y_se_decodifica() {
        let req = TestRequest::default()
            .cookie(Cookie::new(COOKIE_SESION, "abc%2Edef"))
            .insert_header((header::AUTHORIZATION, "Bearer otro"))
            .to_http_request();
        assert_eq!(token_de_solicitud(&req).as_deref(), Some("abc.def"));
    }

    #[test]
    fn acepta_bearer_sin_cookie() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer xyz"))
            .to_http_request();
        assert_eq!(token_de_solicitud(&req).as_deref(), Some("xyz"));

        let sin_nada = TestRequest::default().to_http_request();
        assert!(token_de_solicitud(&sin_nada).is_none());
    }

    #[test]
    fn cookie_de_sesion_codifica_el_token() {
        let cookie = cookie_sesion("a.b");
        assert_eq!(cookie.value(), "a%2Eb");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    }
}
