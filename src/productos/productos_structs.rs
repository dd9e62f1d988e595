// src/productos/productos_structs.rs

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::almacen::{ErrorAlmacen, Registro};
use crate::shared::decimal_json;
use crate::shared::utilidades::calcular_descuento;

fn verdadero() -> bool {
    true
}

/// Producto tal como está en la colección `productos`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductoRecord {
    pub id: String,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(deserialize_with = "decimal_json::deserializar")]
    pub precio: BigDecimal,
    #[serde(default, deserialize_with = "decimal_json::opcional::deserializar")]
    pub precio_oferta: Option<BigDecimal>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub categoria: String,
    #[serde(default)]
    pub imagen: String,
    #[serde(default)]
    pub unidad: String,
    #[serde(default)]
    pub destacado: bool,
    #[serde(default = "verdadero")]
    pub activo: bool,
}

/// Producto de la API. `enOferta` se deriva del precio de oferta.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Producto {
    pub id: String,
    pub nombre: String,
    pub descripcion: String,
    #[serde(serialize_with = "decimal_json::serializar", deserialize_with = "decimal_json::deserializar")]
    pub precio: BigDecimal,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "decimal_json::opcional::serializar",
        deserialize_with = "decimal_json::opcional::deserializar"
    )]
    pub precio_oferta: Option<BigDecimal>,
    pub stock: i64,
    pub categoria: String,
    pub imagen: String,
    pub unidad: String,
    pub destacado: bool,
    pub en_oferta: bool,
    /// Porcentaje de descuento de la oferta vigente.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descuento: Option<i64>,
    pub activo: bool,
}

impl Producto {
    /// Precio que paga el cliente: el de oferta si existe y es menor que el normal.
    pub fn precio_final(&self) -> BigDecimal {
        match &self.precio_oferta {
            Some(oferta) if *oferta < self.precio => oferta.clone(),
            _ => self.precio.clone(),
        }
    }
}

impl From<ProductoRecord> for Producto {
    fn from(record: ProductoRecord) -> Self {
        let descuento = match &record.precio_oferta {
            Some(oferta) if *oferta < record.precio => Some(calcular_descuento(&record.precio, oferta)),
            _ => None,
        };
        Producto {
            id: record.id,
            nombre: record.nombre,
            descripcion: record.descripcion,
            precio: record.precio,
            precio_oferta: record.precio_oferta,
            stock: record.stock.max(0),
            categoria: record.categoria,
            imagen: record.imagen,
            unidad: record.unidad,
            destacado: record.destacado,
            en_oferta: descuento.is_some(),
            descuento,
            activo: record.activo,
        }
    }
}

impl TryFrom<&Registro> for Producto {
    type Error = ErrorAlmacen;

    fn try_from(registro: &Registro) -> Result<Self, Self::Error> {
        Ok(registro.a_tipo::<ProductoRecord>()?.into())
    }
}

/// Alta de producto. Entra en camelCase y sale con los nombres de la colección.
#[derive(Debug, Deserialize, Serialize)]
pub struct NuevoProducto {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "decimal_json::opcional::serializar",
        deserialize_with = "decimal_json::opcional::deserializar"
    )]
    pub precio: Option<BigDecimal>,
    #[serde(
        default,
        rename(deserialize = "precioOferta"),
        skip_serializing_if = "Option::is_none",
        serialize_with = "decimal_json::opcional::serializar",
        deserialize_with = "decimal_json::opcional::deserializar"
    )]
    pub precio_oferta: Option<BigDecimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(default)]
    pub categoria: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unidad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destacado: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activo: Option<bool>,
}

/// Actualización parcial de un producto.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ActualizacionProducto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "decimal_json::opcional::serializar",
        deserialize_with = "decimal_json::opcional::deserializar"
    )]
    pub precio: Option<BigDecimal>,
    #[serde(
        default,
        rename(deserialize = "precioOferta"),
        skip_serializing_if = "Option::is_none",
        serialize_with = "decimal_json::opcional::serializar",
        deserialize_with = "decimal_json::opcional::deserializar"
    )]
    pub precio_oferta: Option<BigDecimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unidad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destacado: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activo: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum OrdenProductos {
    #[serde(rename = "precio-asc")]
    PrecioAsc,
    #[serde(rename = "precio-desc")]
    PrecioDesc,
    #[serde(rename = "nombre")]
    Nombre,
}

/// Filtros del catálogo (`GET /api/productos?...`).
#[derive(Debug, Default, Deserialize)]
pub struct FiltroProductos {
    pub categoria: Option<String>,
    pub activo: Option<bool>,
    pub busqueda: Option<String>,
    pub oferta: Option<bool>,
    pub orden: Option<OrdenProductos>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductoActualizado {
    pub producto: Producto,
    pub campos_omitidos: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn producto(precio: i64, oferta: Option<i64>) -> Producto {
        ProductoRecord {
            id: "p1".into(),
            nombre: "Tomates".into(),
            descripcion: String::new(),
            precio: BigDecimal::from(precio),
            precio_oferta: oferta.map(BigDecimal::from),
            stock: 10,
            categoria: "c1".into(),
            imagen: String::new(),
            unidad: "kg".into(),
            destacado: false,
            activo: true,
        }
        .into()
    }

    #[test]
    fn oferta_solo_si_es_menor() {
        let con_oferta = producto(1590, Some(1290));
        assert!(con_oferta.en_oferta);
        assert_eq!(con_oferta.precio_final(), BigDecimal::from(1290));

        let oferta_cara = producto(1000, Some(1200));
        assert!(!oferta_cara.en_oferta);
        assert_eq!(oferta_cara.descuento, None);
        assert_eq!(oferta_cara.precio_final(), BigDecimal::from(1000));
    }

    #[test]
    fn serializa_en_camel_case_con_precios_numericos() {
        let valor = serde_json::to_value(producto(1590, Some(1290))).unwrap();
        assert_eq!(valor["precio"], json!(1590));
        assert_eq!(valor["precioOferta"], json!(1290));
        assert_eq!(valor["enOferta"], json!(true));
        assert_eq!(valor["descuento"], json!(19));
    }

    #[test]
    fn nuevo_producto_usa_nombres_de_coleccion() {
        let nuevo: NuevoProducto = serde_json::from_value(json!({
            "nombre": "Peras", "descripcion": "Dulces", "precio": "1200", "precioOferta": 990, "categoria": "c1"
        }))
        .unwrap();
        let campos = serde_json::to_value(&nuevo).unwrap();
        assert_eq!(campos["precio"], json!(1200));
        assert_eq!(campos["precio_oferta"], json!(990));
        assert!(campos.get("stock").is_none());
    }
}
