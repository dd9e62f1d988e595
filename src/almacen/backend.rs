// src/almacen/backend.rs

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::almacen_error::ErrorAlmacen;
use super::almacen_structs::{Coleccion, Registro};

/// Persistencia cruda de registros por colección. No aplica reglas ni esquema:
/// eso lo hace `AlmacenRegistros` por encima.
#[async_trait]
pub trait BackendRegistros: Send + Sync {
    async fn insertar(&self, coleccion: Coleccion, registro: Registro) -> Result<(), ErrorAlmacen>;

    /// Sustituye un registro existente; 404 si no existe.
    async fn reemplazar(&self, coleccion: Coleccion, registro: Registro) -> Result<(), ErrorAlmacen>;

    /// Elimina un registro; 404 si no existe.
    async fn eliminar(&self, coleccion: Coleccion, id: &str) -> Result<(), ErrorAlmacen>;

    async fn obtener(&self, coleccion: Coleccion, id: &str) -> Result<Option<Registro>, ErrorAlmacen>;

    /// Todos los registros de la colección, del más antiguo al más reciente.
    async fn listar(&self, coleccion: Coleccion) -> Result<Vec<Registro>, ErrorAlmacen>;
}

/// Backend en memoria. Es el backend por defecto sin `DATABASE_URL` y el que
/// usan las pruebas.
#[derive(Default)]
pub struct BackendMemoria {
    // RwLock permite múltiples lectores o un único escritor.
    colecciones: RwLock<HashMap<Coleccion, Vec<Registro>>>,
}

impl BackendMemoria {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_envenenado() -> ErrorAlmacen {
    ErrorAlmacen::interno("El almacén en memoria quedó inconsistente")
}

#[async_trait]
impl BackendRegistros for BackendMemoria {
    async fn insertar(&self, coleccion: Coleccion, registro: Registro) -> Result<(), ErrorAlmacen> {
        let mut colecciones = self.colecciones.write().map_err(|_| lock_envenenado())?;
        let registros = colecciones.entry(coleccion).or_default();
        if registros.iter().any(|r| r.id == registro.id) {
            let mut campos = serde_json::Map::new();
            campos.insert(
                "id".into(),
                serde_json::json!({ "code": "validation_not_unique", "message": "Value must be unique." }),
            );
            return Err(ErrorAlmacen::validacion("Failed to create record.", campos));
        }
        registros.push(registro);
        Ok(())
    }

    async fn reemplazar(&self, coleccion: Coleccion, registro: Registro) -> Result<(), ErrorAlmacen> {
        let mut colecciones = self.colecciones.write().map_err(|_| lock_envenenado())?;
        let existente = colecciones
            .get_mut(&coleccion)
            .and_then(|registros| registros.iter_mut().find(|r| r.id == registro.id))
            .ok_or_else(ErrorAlmacen::no_encontrado)?;
        *existente = registro;
        Ok(())
    }

    async fn eliminar(&self, coleccion: Coleccion, id: &str) -> Result<(), ErrorAlmacen> {
        let mut colecciones = self.colecciones.write().map_err(|_| lock_envenenado())?;
        let registros = colecciones.get_mut(&coleccion).ok_or_else(ErrorAlmacen::no_encontrado)?;
        let antes = registros.len();
        registros.retain(|r| r.id != id);
        if registros.len() == antes {
            return Err(ErrorAlmacen::no_encontrado());
        }
        Ok(())
    }

    async fn obtener(&self, coleccion: Coleccion, id: &str) -> Result<Option<Registro>, ErrorAlmacen> {
        let colecciones = self.colecciones.read().map_err(|_| lock_envenenado())?;
        Ok(colecciones
            .get(&coleccion)
            .and_then(|registros| registros.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn listar(&self, coleccion: Coleccion) -> Result<Vec<Registro>, ErrorAlmacen> {
        let colecciones = self.colecciones.read().map_err(|_| lock_envenenado())?;
        Ok(colecciones.get(&coleccion).cloned().unwrap_or_default())
    }
}
