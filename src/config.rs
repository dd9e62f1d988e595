// src/config.rs

use std::env;

use bigdecimal::BigDecimal;
use thiserror::Error;

const SECRETO_DESARROLLO: &str = "huerto_hogar_secreto_solo_para_desarrollo";

/// Configuración de la aplicación, leída de variables de entorno (y de `.env`).
#[derive(Clone, Debug)]
pub struct Configuracion {
    pub direccion: String,
    /// Sin URL se usa el almacén en memoria con datos de demostración.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Costo fijo de envío en pesos.
    pub costo_envio: BigDecimal,
    pub tasa_aprobacion_pago: f64,
    /// 0 desactiva el reconciliador de inventario.
    pub intervalo_reconciliacion_segs: u64,
    pub costo_bcrypt: u32,
}

#[derive(Debug, Error, PartialEq)]
pub enum ErrorConfiguracion {
    #[error("Valor inválido para {variable}: '{valor}'")]
    ValorInvalido { variable: &'static str, valor: String },
    #[error("JWT_SECRET es obligatorio cuando se configura DATABASE_URL")]
    FaltaSecreto,
}

impl Configuracion {
    pub fn desde_entorno() -> Result<Self, ErrorConfiguracion> {
        Self::desde_variables(|variable| env::var(variable).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda de variables.
    pub fn desde_variables<F>(leer: F) -> Result<Self, ErrorConfiguracion>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = leer("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let jwt_secret = match (leer("JWT_SECRET"), &database_url) {
            (Some(secreto), _) if !secreto.is_empty() => secreto,
            (_, Some(_)) => return Err(ErrorConfiguracion::FaltaSecreto),
            (_, None) => SECRETO_DESARROLLO.to_string(),
        };

        let tasa_aprobacion_pago: f64 = parsear(&leer, "TASA_APROBACION_PAGO", "0.8")?;
        if !(0.0..=1.0).contains(&tasa_aprobacion_pago) {
            return Err(ErrorConfiguracion::ValorInvalido {
                variable: "TASA_APROBACION_PAGO",
                valor: tasa_aprobacion_pago.to_string(),
            });
        }

        Ok(Configuracion {
            direccion: leer("HUERTO_DIRECCION").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            database_url,
            jwt_secret,
            costo_envio: parsear(&leer, "COSTO_ENVIO", "2990")?,
            tasa_aprobacion_pago,
            intervalo_reconciliacion_segs: parsear(&leer, "INTERVALO_RECONCILIACION_SEGS", "60")?,
            costo_bcrypt: parsear(&leer, "COSTO_BCRYPT", &bcrypt::DEFAULT_COST.to_string())?,
        })
    }
}

fn parsear<T, F>(leer: &F, variable: &'static str, por_defecto: &str) -> Result<T, ErrorConfiguracion>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let valor = leer(variable).unwrap_or_else(|| por_defecto.to_string());
    valor
        .trim()
        .parse()
        .map_err(|_| ErrorConfiguracion::ValorInvalido { variable, valor })
}
