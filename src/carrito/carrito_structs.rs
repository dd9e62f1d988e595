// src/carrito/carrito_structs.rs

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::productos::productos_structs::Producto;
use crate::shared::decimal_json;

/// Una línea del carrito. El precio se fija al agregar el producto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCarrito {
    pub producto_id: String,
    pub cantidad: i64,
    #[serde(serialize_with = "decimal_json::serializar", deserialize_with = "decimal_json::deserializar")]
    pub precio: BigDecimal,
}

impl ItemCarrito {
    pub fn subtotal(&self) -> BigDecimal {
        &self.precio * BigDecimal::from(self.cantidad)
    }
}

/// Resultado de `agregar_item`: la cantidad que quedó en la línea y si hubo
/// que recortarla al stock disponible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultadoAgregar {
    pub cantidad_final: i64,
    pub truncado: bool,
}

/// Carrito en orden de inserción, una línea por producto.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Carrito {
    pub items: Vec<ItemCarrito>,
}

impl Carrito {
    /// Suma de `cantidad * precio`; siempre se calcula a partir de las líneas.
    pub fn total(&self) -> BigDecimal {
        self.items.iter().map(ItemCarrito::subtotal).sum()
    }

    pub fn cantidad_total(&self) -> i64 {
        self.items.iter().map(|item| item.cantidad).sum()
    }

    pub fn esta_vacio(&self) -> bool {
        self.items.is_empty()
    }

    /// Agrega `cantidad` unidades, sin superar el stock actual del producto.
    pub fn agregar_item(&mut self, producto: &Producto, cantidad: i64) -> ResultadoAgregar {
        let stock = producto.stock.max(0);

        if let Some(item) = self.items.iter_mut().find(|i| i.producto_id == producto.id) {
            if cantidad <= 0 {
                return ResultadoAgregar { cantidad_final: item.cantidad, truncado: false };
            }
            let pedida = item.cantidad.saturating_add(cantidad);
            // Una línea que ya superaba el stock no se reduce al agregar.
            let cantidad_final = pedida.min(stock).max(item.cantidad);
            item.cantidad = cantidad_final;
            return ResultadoAgregar { cantidad_final, truncado: cantidad_final < pedida };
        }

        if cantidad <= 0 || stock == 0 {
            return ResultadoAgregar { cantidad_final: 0, truncado: cantidad > 0 };
        }
        let cantidad_final = cantidad.min(stock);
        self.items.push(ItemCarrito {
            producto_id: producto.id.clone(),
            cantidad: cantidad_final,
            precio: producto.precio_final(),
        });
        ResultadoAgregar { cantidad_final, truncado: cantidad_final < cantidad }
    }

    pub fn eliminar_item(&mut self, producto_id: &str) {
        self.items.retain(|item| item.producto_id != producto_id);
    }

    /// Fija la cantidad de una línea; `cantidad <= 0` la elimina. No revisa stock.
    pub fn actualizar_cantidad(&mut self, producto_id: &str, cantidad: i64) {
        if cantidad <= 0 {
            self.eliminar_item(producto_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.producto_id == producto_id) {
            item.cantidad = cantidad;
        }
    }

    pub fn limpiar(&mut self) {
        self.items.clear();
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgregarItemRequest {
    pub producto_id: String,
    #[serde(default = "una_unidad")]
    pub cantidad: i64,
}

fn una_unidad() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct ActualizarCantidadRequest {
    pub cantidad: i64,
}

/// `{items, total}`; al agregar se incluye también el resultado del recorte.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarritoResponse {
    pub items: Vec<ItemCarrito>,
    #[serde(serialize_with = "decimal_json::serializar")]
    pub total: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cantidad_final: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncado: Option<bool>,
}

impl From<&Carrito> for CarritoResponse {
    fn from(carrito: &Carrito) -> Self {
        CarritoResponse { items: carrito.items.clone(), total: carrito.total(), cantidad_final: None, truncado: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn producto(id: &str, precio: i64, oferta: Option<i64>, stock: i64) -> Producto {
        Producto {
            id: id.into(),
            nombre: format!("Producto {}", id),
            descripcion: String::new(),
            precio: BigDecimal::from(precio),
            precio_oferta: oferta.map(BigDecimal::from),
            stock,
            categoria: "c1".into(),
            imagen: String::new(),
            unidad: "kg".into(),
            destacado: false,
            en_oferta: oferta.map_or(false, |o| o < precio),
            descuento: None,
            activo: true,
        }
    }

    #[test]
    fn agregar_dos_veces_suma_en_una_linea() {
        let tomates = producto("p1", 1590, None, 10);
        let mut carrito = Carrito::default();

        carrito.agregar_item(&tomates, 2);
        let resultado = carrito.agregar_item(&tomates, 3);

        assert_eq!(carrito.items.len(), 1);
        assert_eq!(carrito.items[0].cantidad, 5);
        assert_eq!(resultado, ResultadoAgregar { cantidad_final: 5, truncado: false });
    }

    #[test]
    fn nunca_supera_el_stock() {
        let albahaca = producto("p1", 1490, None, 5);
        let mut carrito = Carrito::default();

        let primero = carrito.agregar_item(&albahaca, 8);
        assert_eq!(primero, ResultadoAgregar { cantidad_final: 5, truncado: true });

        let segundo = carrito.agregar_item(&albahaca, 1);
        assert_eq!(segundo, ResultadoAgregar { cantidad_final: 5, truncado: true });
        assert_eq!(carrito.items[0].cantidad, 5);

        let agotado = producto("p2", 990, None, 0);
        assert_eq!(carrito.agregar_item(&agotado, 1).cantidad_final, 0);
        assert_eq!(carrito.items.len(), 1);
    }

    #[test]
    fn usa_el_precio_de_oferta_si_es_menor() {
        let mut carrito = Carrito::default();
        carrito.agregar_item(&producto("p1", 1590, Some(1290), 10), 1);
        carrito.agregar_item(&producto("p2", 1000, Some(1200), 10), 1);

        assert_eq!(carrito.items[0].precio, BigDecimal::from(1290));
        assert_eq!(carrito.items[1].precio, BigDecimal::from(1000));
    }

    #[test]
    fn el_total_sigue_a_las_lineas() {
        let mut carrito = Carrito::default();
        let a = producto("a", 800, None, 10);
        let b = producto("b", 1990, None, 10);

        carrito.agregar_item(&a, 3);
        carrito.agregar_item(&b, 2);
        assert_eq!(carrito.total(), BigDecimal::from(3 * 800 + 2 * 1990));

        carrito.actualizar_cantidad("a", 1);
        assert_eq!(carrito.total(), BigDecimal::from(800 + 2 * 1990));

        carrito.actualizar_cantidad("b", 0);
        assert_eq!(carrito.items.len(), 1);
        assert_eq!(carrito.total(), BigDecimal::from(800));

        carrito.eliminar_item("a");
        carrito.eliminar_item("no-existe");
        assert_eq!(carrito.total(), BigDecimal::from(0));
        assert!(carrito.esta_vacio());
    }

    #[test]
    fn actualizar_cantidad_no_revisa_stock() {
        let mut carrito = Carrito::default();
        carrito.agregar_item(&producto("a", 800, None, 2), 2);
        carrito.actualizar_cantidad("a", 7);
        assert_eq!(carrito.items[0].cantidad, 7);
    }
}
