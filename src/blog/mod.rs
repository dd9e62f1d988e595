// src/blog/mod.rs

pub mod blog_almacen;
pub mod blog_router;
pub mod blog_structs;
