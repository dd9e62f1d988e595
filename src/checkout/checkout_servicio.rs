// src/checkout/checkout_servicio.rs

use bigdecimal::BigDecimal;
use tracing::{error, info, warn};

use super::checkout_structs::{DatosCheckout, ErrorCheckout};
use super::inventario::aplicar_ajustes_pendientes;
use super::pago::{cobrar, PasarelaPago};
use crate::almacen::{a_campos, AlmacenRegistros, Coleccion, Credencial, USUARIO_INVITADO};
use crate::carrito::almacen_carrito::SesionCarrito;
use crate::carrito::carrito_structs::Carrito;
use crate::ordenes::ordenes_structs::{
    AjusteInventario, DireccionEnvio, EstadoOrden, ItemOrden, Orden, PedidoRecord, ReclamoAjuste,
};
use crate::productos::productos_api::obtener_productos_por_ids;
use crate::productos::productos_structs::Producto;
use crate::shared::utilidades::{formatear_precio, formatear_telefono_chileno, validar_email, validar_telefono_chileno};

/// Lo que necesita el checkout, además del carrito y el formulario.
pub struct ServiciosCheckout<'a> {
    pub almacen: &'a AlmacenRegistros,
    pub pasarela: &'a dyn PasarelaPago,
    pub costo_envio: &'a BigDecimal,
}

pub fn validar_datos(datos: &DatosCheckout) -> Result<(), ErrorCheckout> {
    let obligatorios = [
        (&datos.nombre, "nombre"),
        (&datos.direccion, "dirección"),
        (&datos.ciudad, "ciudad"),
    ];
    if let Some((_, campo)) = obligatorios.iter().find(|(valor, _)| valor.trim().is_empty()) {
        return Err(ErrorCheckout::DatosInvalidos(format!("El campo {} es obligatorio", campo)));
    }
    if !validar_email(datos.email.trim()) {
        return Err(ErrorCheckout::DatosInvalidos("Por favor ingresa un email válido".to_string()));
    }
    if !validar_telefono_chileno(&datos.telefono) {
        return Err(ErrorCheckout::DatosInvalidos(
            "Por favor ingresa un teléfono válido (+56 9 XXXX XXXX)".to_string(),
        ));
    }
    if datos.region.trim().is_empty() {
        return Err(ErrorCheckout::DatosInvalidos("Por favor selecciona una región".to_string()));
    }
    Ok(())
}

/// Compara cada línea con el stock actual. Falla en la primera línea que no se
/// puede cubrir.
pub fn validar_stock(carrito: &Carrito, productos: &[Producto]) -> Result<(), ErrorCheckout> {
    for item in &carrito.items {
        let producto = productos
            .iter()
            .find(|p| p.id == item.producto_id)
            .filter(|p| p.activo)
            .ok_or_else(|| ErrorCheckout::ProductoNoDisponible(item.producto_id.clone()))?;
        if item.cantidad > producto.stock {
            return Err(ErrorCheckout::StockInsuficiente { nombre: producto.nombre.clone(), disponible: producto.stock });
        }
    }
    Ok(())
}

/// Líneas de la orden con la foto actual de cada producto y el precio del carrito.
pub fn items_de_orden(carrito: &Carrito, productos: &[Producto]) -> Vec<ItemOrden> {
    carrito
        .items
        .iter()
        .filter_map(|item| {
            let producto = productos.iter().find(|p| p.id == item.producto_id)?;
            Some(ItemOrden {
                producto_id: item.producto_id.clone(),
                cantidad: item.cantidad,
                precio: item.precio.clone(),
                nombre_producto: producto.nombre.clone(),
                imagen_producto: producto.imagen.clone(),
                unidad_producto: producto.unidad.clone(),
            })
        })
        .collect()
}

/// Convierte el carrito en una orden: valida, cobra, crea la orden con su
/// marcador de inventario, descuenta stock y vacía el carrito.
pub async fn procesar_checkout(
    servicios: ServiciosCheckout<'_>,
    credencial: &Credencial,
    sesion_carrito: &mut SesionCarrito,
    datos: DatosCheckout,
) -> Result<Orden, ErrorCheckout> {
    validar_datos(&datos)?;
    let carrito = sesion_carrito.carrito().clone();
    if carrito.esta_vacio() {
        return Err(ErrorCheckout::CarritoVacio);
    }

    let ids: Vec<String> = carrito.items.iter().map(|item| item.producto_id.clone()).collect();
    let productos = obtener_productos_por_ids(servicios.almacen, credencial, &ids).await?;
    validar_stock(&carrito, &productos)?;

    let subtotal = carrito.total();
    let envio = servicios.costo_envio.clone();
    let total = &subtotal + &envio;

    let transaccion = match cobrar(servicios.pasarela, total.clone(), &datos.metodo_pago).await {
        Ok(transaccion) => transaccion,
        Err(e) => {
            warn!(error = %e, total = %formatear_precio(&total), "Pago no completado; el carrito se conserva");
            return Err(e.into());
        }
    };

    let items = items_de_orden(&carrito, &productos);
    // El marcador nace reclamado: el reconciliador no lo toca mientras el checkout lo aplica.
    let reclamo = ReclamoAjuste::nuevo();
    let pedido = PedidoRecord {
        usuario: credencial.usuario_id().unwrap_or(USUARIO_INVITADO).to_string(),
        ajuste_inventario: Some(AjusteInventario { reclamo: Some(reclamo.clone()), ..AjusteInventario::para_items(&items) }),
        productos: items,
        subtotal,
        envio,
        total,
        estado: EstadoOrden::Pendiente,
        direccion_envio: DireccionEnvio {
            nombre: datos.nombre.trim().to_string(),
            apellido: datos.apellido.trim().to_string(),
            email: datos.email.trim().to_string(),
            direccion: datos.direccion.trim().to_string(),
            ciudad: datos.ciudad.trim().to_string(),
            region: datos.region.trim().to_string(),
            codigo_postal: datos.codigo_postal.trim().to_string(),
            telefono: formatear_telefono_chileno(&datos.telefono),
        },
        pago: datos.metodo_pago.clone(),
        referencia_pago: Some(transaccion.referencia.clone()),
        notas: datos.notas.unwrap_or_default(),
    };

    let registro = servicios
        .almacen
        .create(credencial, Coleccion::Pedidos, a_campos(&pedido)?)
        .await
        .map_err(|e| {
            error!(referencia_pago = %transaccion.referencia, error = %e, "Pago liquidado pero la orden no se pudo crear");
            e
        })?;
    let mut orden = Orden::try_from(&registro)?;
    info!(orden_id = %orden.id, usuario = %orden.usuario_id, total = %formatear_precio(&orden.total), "Orden creada desde el checkout");

    let ajuste = aplicar_ajustes_pendientes(servicios.almacen, &orden.id, Some(&reclamo.token)).await;
    if ajuste.fallidas > 0 || ajuste.omitida {
        warn!(orden_id = %orden.id, fallidas = ajuste.fallidas, "Ajustes de inventario pendientes de reconciliar");
    }
    if !ajuste.omitida {
        orden.ajuste_inventario = Some(ajuste.ajuste).filter(|a| !a.resuelto());
    }

    sesion_carrito.limpiar().await;
    Ok(orden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrito::carrito_structs::ItemCarrito;

    fn datos_validos() -> DatosCheckout {
        DatosCheckout {
            nombre: "Ana".into(),
            apellido: "Pérez".into(),
            email: "ana@gmail.com".into(),
            telefono: "912345678".into(),
            direccion: "Av. Siempre Viva 123".into(),
            ciudad: "Santiago".into(),
            region: "Metropolitana".into(),
            codigo_postal: "8320000".into(),
            metodo_pago: "tarjeta".into(),
            notas: None,
        }
    }

    fn producto(id: &str, stock: i64) -> Producto {
        Producto {
            id: id.into(),
            nombre: "Tomates".into(),
            descripcion: String::new(),
            precio: BigDecimal::from(800),
            precio_oferta: None,
            stock,
            categoria: "c1".into(),
            imagen: "/tomates.jpg".into(),
            unidad: "kg".into(),
            destacado: false,
            en_oferta: false,
            descuento: None,
            activo: true,
        }
    }

    fn carrito(cantidad: i64) -> Carrito {
        Carrito { items: vec![ItemCarrito { producto_id: "p1".into(), cantidad, precio: BigDecimal::from(800) }] }
    }

    #[test]
    fn valida_contacto_y_envio() {
        assert!(validar_datos(&datos_validos()).is_ok());

        let mut sin_region = datos_validos();
        sin_region.region = " ".into();
        assert!(matches!(validar_datos(&sin_region), Err(ErrorCheckout::DatosInvalidos(_))));

        let mut telefono_sin_mas = datos_validos();
        telefono_sin_mas.telefono = "56912345678".into();
        assert!(validar_datos(&telefono_sin_mas).is_err());

        let mut email_malo = datos_validos();
        email_malo.email = "ana@gmail".into();
        assert!(validar_datos(&email_malo).is_err());
    }

    #[test]
    fn rechaza_cantidades_sobre_el_stock_actual() {
        let error = validar_stock(&carrito(5), &[producto("p1", 3)]).unwrap_err();
        assert_eq!(error.to_string(), "Solo quedan 3 unidades de Tomates");

        assert!(validar_stock(&carrito(3), &[producto("p1", 10)]).is_ok());
        assert!(matches!(validar_stock(&carrito(1), &[]), Err(ErrorCheckout::ProductoNoDisponible(_))));
    }

    #[test]
    fn items_copian_la_foto_del_producto() {
        let items = items_de_orden(&carrito(3), &[producto("p1", 10)]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].nombre_producto, "Tomates");
        assert_eq!(items[0].imagen_producto, "/tomates.jpg");
        assert_eq!(items[0].unidad_producto, "kg");
        assert_eq!(items[0].subtotal(), BigDecimal::from(2400));
    }
}
