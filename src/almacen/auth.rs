// src/almacen/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::almacen_error::ErrorAlmacen;
use super::almacen_structs::Rol;

/// Vigencia del token de sesión (y de la cookie `pb_auth`).
pub const DURACION_SESION_DIAS: i64 = 7;

/// Payload del JWT de sesión.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Id del usuario
    pub email: String,
    pub rol: Rol,
    pub iat: i64, // Issued at
    pub exp: i64, // Expiration time (timestamp Unix)
}

pub fn emitir_token(secreto: &str, usuario_id: &str, email: &str, rol: Rol) -> Result<String, ErrorAlmacen> {
    let ahora = Utc::now();
    let claims = Claims {
        sub: usuario_id.to_string(),
        email: email.to_string(),
        rol,
        iat: ahora.timestamp(),
        exp: (ahora + Duration::days(DURACION_SESION_DIAS)).timestamp(),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secreto.as_bytes())).map_err(|e| {
        tracing::error!(error = ?e, "Error al firmar el token de sesión");
        ErrorAlmacen::interno("No se pudo emitir el token de sesión")
    })
}

/// Decodifica y valida firma y expiración.
pub fn validar_token(secreto: &str, token: &str) -> Result<Claims, ErrorAlmacen> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &DecodingKey::from_secret(secreto.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            let mensaje = match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => "Token expirado.",
                jsonwebtoken::errors::ErrorKind::InvalidSignature => "Firma del token inválida.",
                jsonwebtoken::errors::ErrorKind::InvalidToken => "Token malformado.",
                _ => "Token de autenticación inválido.",
            };
            ErrorAlmacen::no_autenticado(mensaje)
        })
}

pub fn hash_password(password: &str, costo: u32) -> Result<String, ErrorAlmacen> {
    hash(password, costo).map_err(|e| {
        tracing::error!(error = ?e, "Error al hacer hash de la contraseña");
        ErrorAlmacen::interno("Error interno al procesar la contraseña")
    })
}

/// `false` también cuando el hash guardado no es un hash bcrypt válido.
pub fn verificar_password(password: &str, password_hash: &str) -> bool {
    match verify(password, password_hash) {
        Ok(coincide) => coincide,
        Err(e) => {
            tracing::warn!(error = ?e, "Hash de contraseña ilegible");
            false
        }
    }
}
