// src/productos/mod.rs

pub mod productos_api;
pub mod productos_router;
pub mod productos_structs;
