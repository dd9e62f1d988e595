// src/almacen/mod.rs

// Almacén de registros: colecciones con reglas de acceso, esquema y autenticación.
pub mod almacen_error;
pub mod almacen_structs;
pub mod auth;
pub mod backend;
pub mod cliente;
pub mod esquema;
pub mod postgres;
pub mod reglas;
pub mod semilla;

pub use almacen_error::ErrorAlmacen;
pub use almacen_structs::{a_campos, Coleccion, ConsultaLista, Credencial, Registro, Rol, Sesion};
pub use backend::{BackendMemoria, BackendRegistros};
pub use cliente::AlmacenRegistros;
pub use postgres::BackendPostgres;
pub use reglas::USUARIO_INVITADO;
