// src/carrito/almacen_carrito.rs

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use super::carrito_structs::Carrito;

/// Prefijo de la clave de los carritos sin sesión.
pub const PREFIJO_INVITADO: &str = "invitado";

/// Medio donde vive el carrito de cada identidad. No es durable ni autoritativo:
/// el pedido se valida siempre contra el catálogo actual.
#[async_trait]
pub trait AlmacenCarritos: Send + Sync {
    async fn leer(&self, clave: &str) -> Option<Carrito>;
    async fn guardar(&self, clave: &str, carrito: &Carrito);
    async fn borrar(&self, clave: &str);
}

#[derive(Default)]
pub struct AlmacenCarritosMemoria {
    carritos: RwLock<HashMap<String, Carrito>>,
}

impl AlmacenCarritosMemoria {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlmacenCarritos for AlmacenCarritosMemoria {
    async fn leer(&self, clave: &str) -> Option<Carrito> {
        let carritos = self.carritos.read().unwrap_or_else(|envenenado| envenenado.into_inner());
        carritos.get(clave).cloned()
    }

    async fn guardar(&self, clave: &str, carrito: &Carrito) {
        let mut carritos = self.carritos.write().unwrap_or_else(|envenenado| envenenado.into_inner());
        carritos.insert(clave.to_string(), carrito.clone());
    }

    async fn borrar(&self, clave: &str) {
        let mut carritos = self.carritos.write().unwrap_or_else(|envenenado| envenenado.into_inner());
        carritos.remove(clave);
    }
}

/// Clave del carrito: el id del usuario o `invitado-<id del navegador>`.
pub fn clave_carrito(usuario_id: Option<&str>, invitado_id: Option<&str>) -> String {
    match (usuario_id, invitado_id) {
        (Some(usuario_id), _) => usuario_id.to_string(),
        (None, Some(invitado_id)) => format!("{}-{}", PREFIJO_INVITADO, invitado_id),
        (None, None) => PREFIJO_INVITADO.to_string(),
    }
}

/// Carrito de la identidad activa. Se recarga al cambiar de identidad y se
/// persiste después de cada cambio.
pub struct SesionCarrito {
    almacen: Arc<dyn AlmacenCarritos>,
    clave: String,
    carrito: Carrito,
}

impl SesionCarrito {
    pub async fn abrir(almacen: Arc<dyn AlmacenCarritos>, clave: String) -> Self {
        let carrito = almacen.leer(&clave).await.unwrap_or_default();
        Self { almacen, clave, carrito }
    }

    pub fn clave(&self) -> &str {
        &self.clave
    }

    pub fn carrito(&self) -> &Carrito {
        &self.carrito
    }

    /// Cambia de identidad (inicio o cierre de sesión) y carga su carrito.
    pub async fn cambiar_identidad(&mut self, clave: String) {
        if clave == self.clave {
            return;
        }
        debug!(anterior = %self.clave, nueva = %clave, "Cambio de identidad del carrito");
        self.carrito = self.almacen.leer(&clave).await.unwrap_or_default();
        self.clave = clave;
    }

    /// Aplica un cambio en memoria y luego lo persiste.
    pub async fn modificar<T>(&mut self, cambio: impl FnOnce(&mut Carrito) -> T) -> T {
        let resultado = cambio(&mut self.carrito);
        self.almacen.guardar(&self.clave, &self.carrito).await;
        resultado
    }

    /// Vacía el carrito y borra lo persistido para esta identidad.
    pub async fn limpiar(&mut self) {
        self.carrito.limpiar();
        self.almacen.borrar(&self.clave).await;
    }
}
