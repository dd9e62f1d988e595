// src/checkout/pago.rs

use std::fmt;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Estados de un cobro: `Pendiente -> Autorizado -> Capturado -> Liquidado`.
/// `Rechazado` es terminal y solo se alcanza antes de capturar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstadoPago {
    Pendiente,
    Autorizado,
    Capturado,
    Liquidado,
    Rechazado,
}

impl EstadoPago {
    pub fn puede_pasar_a(self, siguiente: EstadoPago) -> bool {
        use EstadoPago::*;
        matches!(
            (self, siguiente),
            (Pendiente, Autorizado)
                | (Autorizado, Capturado)
                | (Capturado, Liquidado)
                | (Pendiente, Rechazado)
                | (Autorizado, Rechazado)
        )
    }

    pub fn es_terminal(self) -> bool {
        matches!(self, EstadoPago::Liquidado | EstadoPago::Rechazado)
    }
}

impl fmt::Display for EstadoPago {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nombre = match self {
            EstadoPago::Pendiente => "pendiente",
            EstadoPago::Autorizado => "autorizado",
            EstadoPago::Capturado => "capturado",
            EstadoPago::Liquidado => "liquidado",
            EstadoPago::Rechazado => "rechazado",
        };
        f.write_str(nombre)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ErrorPago {
    #[error("El pago fue rechazado: {motivo}")]
    Rechazado { motivo: String },
    #[error("Transición de pago inválida: {desde} -> {hacia}")]
    TransicionInvalida { desde: EstadoPago, hacia: EstadoPago },
    #[error("La pasarela de pago no respondió: {0}")]
    Pasarela(String),
}

/// Un cobro y su estado actual.
#[derive(Debug, Clone)]
pub struct TransaccionPago {
    pub referencia: String,
    pub monto: BigDecimal,
    pub metodo: String,
    pub estado: EstadoPago,
}

impl TransaccionPago {
    pub fn nueva(monto: BigDecimal, metodo: &str) -> Self {
        Self {
            referencia: format!("pago-{}", Uuid::new_v4().simple()),
            monto,
            metodo: metodo.to_string(),
            estado: EstadoPago::Pendiente,
        }
    }

    pub fn transicionar(&mut self, siguiente: EstadoPago) -> Result<(), ErrorPago> {
        if !self.estado.puede_pasar_a(siguiente) {
            return Err(ErrorPago::TransicionInvalida { desde: self.estado, hacia: siguiente });
        }
        debug!(referencia = %self.referencia, desde = %self.estado, hacia = %siguiente, "Transición de pago");
        self.estado = siguiente;
        Ok(())
    }
}

#[async_trait]
pub trait PasarelaPago: Send + Sync {
    /// Reserva el monto. Un rechazo deja la transacción en `Rechazado`.
    async fn autorizar(&self, transaccion: &mut TransaccionPago) -> Result<(), ErrorPago>;
    async fn capturar(&self, transaccion: &mut TransaccionPago) -> Result<(), ErrorPago>;
    async fn liquidar(&self, transaccion: &mut TransaccionPago) -> Result<(), ErrorPago>;
}

/// Recorre autorizar, capturar y liquidar. Devuelve la transacción liquidada.
pub async fn cobrar(pasarela: &dyn PasarelaPago, monto: BigDecimal, metodo: &str) -> Result<TransaccionPago, ErrorPago> {
    let mut transaccion = TransaccionPago::nueva(monto, metodo);
    pasarela.autorizar(&mut transaccion).await?;
    pasarela.capturar(&mut transaccion).await?;
    pasarela.liquidar(&mut transaccion).await?;
    info!(referencia = %transaccion.referencia, monto = %transaccion.monto, "Pago liquidado");
    Ok(transaccion)
}

/// Pasarela de pruebas: aprueba con probabilidad `tasa_aprobacion`.
#[derive(Debug, Clone)]
pub struct PasarelaSimulada {
    pub tasa_aprobacion: f64,
}

impl PasarelaSimulada {
    pub fn new(tasa_aprobacion: f64) -> Self {
        Self { tasa_aprobacion: tasa_aprobacion.clamp(0.0, 1.0) }
    }

    pub fn siempre_aprueba() -> Self {
        Self::new(1.0)
    }

    pub fn siempre_rechaza() -> Self {
        Self::new(0.0)
    }
}

#[async_trait]
impl PasarelaPago for PasarelaSimulada {
    async fn autorizar(&self, transaccion: &mut TransaccionPago) -> Result<(), ErrorPago> {
        let aprobado = rand::thread_rng().gen_bool(self.tasa_aprobacion);
        if aprobado {
            transaccion.transicionar(EstadoPago::Autorizado)
        } else {
            transaccion.transicionar(EstadoPago::Rechazado)?;
            Err(ErrorPago::Rechazado { motivo: "fondos insuficientes o tarjeta no autorizada".to_string() })
        }
    }

    async fn capturar(&self, transaccion: &mut TransaccionPago) -> Result<(), ErrorPago> {
        transaccion.transicionar(EstadoPago::Capturado)
    }

    async fn liquidar(&self, transaccion: &mut TransaccionPago) -> Result<(), ErrorPago> {
        transaccion.transicionar(EstadoPago::Liquidado)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solo_permite_transiciones_en_orden() {
        let mut transaccion = TransaccionPago::nueva(BigDecimal::from(2400), "tarjeta");
        assert!(transaccion.transicionar(EstadoPago::Capturado).is_err());
        transaccion.transicionar(EstadoPago::Autorizado).unwrap();
        transaccion.transicionar(EstadoPago::Capturado).unwrap();
        assert_eq!(
            transaccion.transicionar(EstadoPago::Rechazado),
            Err(ErrorPago::TransicionInvalida { desde: EstadoPago::Capturado, hacia: EstadoPago::Rechazado })
        );
        transaccion.transicionar(EstadoPago::Liquidado).unwrap();
        assert!(transaccion.estado.es_terminal());
    }

    #[actix_web::test]
    async fn pasarela_que_aprueba_liquida() {
        let transaccion = cobrar(&PasarelaSimulada::siempre_aprueba(), BigDecimal::from(5390), "tarjeta")
            .await
            .unwrap();
        assert_eq!(transaccion.estado, EstadoPago::Liquidado);
        assert!(transaccion.referencia.starts_with("pago-"));
    }

    #[actix_web::test]
    async fn rechazo_es_terminal() {
        let pasarela = PasarelaSimulada::siempre_rechaza();
        let mut transaccion = TransaccionPago::nueva(BigDecimal::from(5390), "tarjeta");
        let error = pasarela.autorizar(&mut transaccion).await.unwrap_err();

        assert!(matches!(error, ErrorPago::Rechazado { .. }));
        assert_eq!(transaccion.estado, EstadoPago::Rechazado);
        assert!(pasarela.capturar(&mut transaccion).await.is_err());
    }
}
