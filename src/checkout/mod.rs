// src/checkout/mod.rs

// Carrito -> orden: validación, pago, creación y ajuste de inventario.
pub mod checkout_router;
pub mod checkout_servicio;
pub mod checkout_structs;
pub mod inventario;
pub mod pago;
