// src/carrito/mod.rs

pub mod almacen_carrito;
pub mod carrito_router;
pub mod carrito_structs;
