// src/reportes/reportes_structs.rs

use std::collections::{BTreeMap, HashSet};

use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::ordenes::ordenes_structs::Orden;
use crate::productos::productos_structs::Producto;
use crate::shared::decimal_json;

/// Bajo este stock un producto aparece en el reporte.
pub const UMBRAL_STOCK_BAJO: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductoMasVendido {
    pub nombre: String,
    pub cantidad: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductoStockBajo {
    pub id: String,
    pub nombre: String,
    pub stock: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reporte {
    #[serde(serialize_with = "decimal_json::serializar")]
    pub ventas_totales: BigDecimal,
    pub cantidad_ordenes: usize,
    #[serde(serialize_with = "decimal_json::serializar")]
    pub promedio_orden: BigDecimal,
    pub productos_vendidos: i64,
    pub clientes_activos: usize,
    pub producto_mas_vendido: ProductoMasVendido,
    pub productos_stock_bajo: Vec<ProductoStockBajo>,
}

pub fn calcular_reporte(ordenes: &[Orden], productos: &[Producto]) -> Reporte {
    let ventas_totales: BigDecimal = ordenes.iter().map(|o| o.total.clone()).sum();
    let promedio_orden = if ordenes.is_empty() {
        BigDecimal::from(0)
    } else {
        (&ventas_totales / BigDecimal::from(ordenes.len() as i64)).round(0)
    };

    let mut vendidos: BTreeMap<&str, i64> = BTreeMap::new();
    let mut nombres: BTreeMap<&str, &str> = BTreeMap::new();
    for item in ordenes.iter().flat_map(|o| &o.items) {
        *vendidos.entry(item.producto_id.as_str()).or_default() += item.cantidad;
        if !item.nombre_producto.is_empty() {
            nombres.entry(item.producto_id.as_str()).or_insert(item.nombre_producto.as_str());
        }
    }

    let mut producto_mas_vendido = ProductoMasVendido { nombre: "N/A".to_string(), cantidad: 0 };
    for (producto_id, cantidad) in &vendidos {
        if *cantidad <= producto_mas_vendido.cantidad {
            continue;
        }
        let nombre = productos
            .iter()
            .find(|p| p.id == *producto_id)
            .map(|p| p.nombre.as_str())
            .or_else(|| nombres.get(producto_id).copied());
        if let Some(nombre) = nombre {
            producto_mas_vendido = ProductoMasVendido { nombre: nombre.to_string(), cantidad: *cantidad };
        }
    }

    let clientes: HashSet<&str> = ordenes.iter().map(|o| o.usuario_id.as_str()).collect();

    Reporte {
        ventas_totales,
        cantidad_ordenes: ordenes.len(),
        promedio_orden,
        productos_vendidos: vendidos.values().sum(),
        clientes_activos: clientes.len(),
        producto_mas_vendido,
        productos_stock_bajo: productos
            .iter()
            .filter(|p| p.stock < UMBRAL_STOCK_BAJO)
            .map(|p| ProductoStockBajo { id: p.id.clone(), nombre: p.nombre.clone(), stock: p.stock })
            .collect(),
    }
}
