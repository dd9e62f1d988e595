// src/ordenes/mod.rs

pub mod ordenes_api;
pub mod ordenes_router;
pub mod ordenes_structs;
