// src/usuarios/mod.rs

// Declara el submódulo con las structs de usuarios
pub mod usuario_structs;
// Declara el submódulo con las rutas CRUD de usuarios
pub mod usuario_router;
// Declara el submódulo con las rutas de sesión (login, registro, logout, me)
pub mod auth_router;
// Declara el submódulo del extractor de contexto de la solicitud
pub mod auth_middleware;
