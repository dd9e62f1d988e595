// src/ordenes/ordenes_api.rs

use bigdecimal::BigDecimal;
use tracing::{debug, warn};

use super::ordenes_structs::{ItemOrden, Orden, IMAGEN_PLACEHOLDER, NOMBRE_PRODUCTO_FALTANTE};
use crate::almacen::{AlmacenRegistros, Coleccion, ConsultaLista, Credencial, ErrorAlmacen};
use crate::productos::productos_api::obtener_productos_por_ids;
use crate::productos::productos_structs::Producto;

/// Completa las líneas sin nombre o imagen con los datos actuales del producto.
/// Las de productos que ya no existen quedan con el texto e imagen de reemplazo.
pub fn completar_items(items: Vec<ItemOrden>, productos: &[Producto]) -> Vec<ItemOrden> {
    items
        .into_iter()
        .map(|mut item| {
            if !item.necesita_hidratar() {
                return item;
            }
            match productos.iter().find(|p| p.id == item.producto_id) {
                Some(producto) => {
                    item.nombre_producto = producto.nombre.clone();
                    item.imagen_producto = producto.imagen.clone();
                    item.unidad_producto = producto.unidad.clone();
                    if item.precio == BigDecimal::from(0) {
                        item.precio = producto.precio.clone();
                    }
                }
                None => {
                    if item.nombre_producto.is_empty() {
                        item.nombre_producto = NOMBRE_PRODUCTO_FALTANTE.to_string();
                    }
                    if item.imagen_producto.is_empty() {
                        item.imagen_producto = IMAGEN_PLACEHOLDER.to_string();
                    }
                }
            }
            item
        })
        .collect()
}

/// Hidratación de una orden. Si el catálogo no responde, la orden se devuelve
/// tal cual.
pub async fn hidratar_orden(almacen: &AlmacenRegistros, credencial: &Credencial, mut orden: Orden) -> Orden {
    let ids: Vec<String> = orden
        .items
        .iter()
        .filter(|item| item.necesita_hidratar() && !item.producto_id.is_empty())
        .map(|item| item.producto_id.clone())
        .collect();
    if ids.is_empty() {
        return orden;
    }

    match obtener_productos_por_ids(almacen, credencial, &ids).await {
        Ok(productos) => {
            debug!(orden_id = %orden.id, faltantes = ids.len(), encontrados = productos.len(), "Hidratando orden");
            orden.items = completar_items(std::mem::take(&mut orden.items), &productos);
        }
        Err(e) => warn!(orden_id = %orden.id, error = %e, "No se pudo hidratar la orden"),
    }
    orden
}

/// Órdenes visibles para la credencial, más recientes primero.
pub async fn obtener_ordenes(
    almacen: &AlmacenRegistros,
    credencial: &Credencial,
    consulta: ConsultaLista,
) -> Result<Vec<Orden>, ErrorAlmacen> {
    let registros = almacen
        .get_full_list(credencial, Coleccion::Pedidos, &consulta.recientes_primero())
        .await?;
    registros.iter().map(|r| Orden::try_from(r)).collect()
}

pub async fn obtener_orden(almacen: &AlmacenRegistros, credencial: &Credencial, id: &str) -> Result<Orden, ErrorAlmacen> {
    let registro = almacen.get_one(credencial, Coleccion::Pedidos, id).await?;
    let orden = Orden::try_from(&registro)?;
    Ok(hidratar_orden(almacen, credencial, orden).await)
}
