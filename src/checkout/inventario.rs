// src/checkout/inventario.rs

use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use super::checkout_structs::ResumenReconciliacion;
use crate::almacen::{AlmacenRegistros, Coleccion, ConsultaLista, Credencial, ErrorAlmacen};
use crate::ordenes::ordenes_structs::{AjusteInventario, LineaAjuste, Orden, ReclamoAjuste};

/// Resultado de aplicar el marcador de una orden.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultadoAjuste {
    pub aplicadas: usize,
    pub fallidas: usize,
    /// No se tocó el marcador: otro proceso lo tiene reclamado o no se pudo leer.
    pub omitida: bool,
    /// Marcador tal como quedó (sin pendientes si todo se aplicó).
    pub ajuste: AjusteInventario,
}

impl ResultadoAjuste {
    fn sin_aplicar(ajuste: AjusteInventario) -> Self {
        ResultadoAjuste { omitida: true, ajuste, ..Default::default() }
    }
}

/// Descuenta el stock de una línea: `max(0, stock - cantidad)`.
async fn descontar_stock(almacen: &AlmacenRegistros, linea: &LineaAjuste) -> Result<(), ErrorAlmacen> {
    let sistema = Credencial::Sistema;
    let producto = almacen.get_one(&sistema, Coleccion::Productos, &linea.producto_id).await?;
    let stock = producto.datos.get("stock").and_then(Value::as_i64).unwrap_or(0);
    let nuevo_stock = (stock - linea.cantidad).max(0);

    let mut cambios = Map::new();
    cambios.insert("stock".into(), Value::from(nuevo_stock));
    almacen.update(&sistema, Coleccion::Productos, &linea.producto_id, cambios).await?;

    debug!(producto_id = %linea.producto_id, stock, nuevo_stock, "Stock descontado");
    Ok(())
}

/// Guarda el marcador en el pedido; resuelto se guarda como nulo.
async fn guardar_marcador(almacen: &AlmacenRegistros, orden_id: &str, ajuste: &AjusteInventario) -> Result<(), ErrorAlmacen> {
    let marcador = if ajuste.resuelto() {
        Value::Null
    } else {
        serde_json::to_value(ajuste)
            .map_err(|e| ErrorAlmacen::interno(format!("Marcador de inventario no serializable: {}", e)))?
    };
    let mut cambios = Map::new();
    cambios.insert("ajuste_inventario".into(), marcador);
    almacen.update(&Credencial::Sistema, Coleccion::Pedidos, orden_id, cambios).await?;
    Ok(())
}

/// Aplica las líneas pendientes de una orden y guarda el marcador actualizado
/// en el pedido. Los fallos se registran y quedan pendientes; nunca se propagan.
///
/// Todo ocurre bajo `cerrojo_ajustes` y sobre el pedido recién leído, así que
/// cada línea se descuenta una sola vez aunque el checkout y el reconciliador
/// (o dos pasadas del reconciliador) lleguen a la vez. Un marcador reclamado
/// por otro `token` y todavía vigente se deja tal cual.
pub async fn aplicar_ajustes_pendientes(
    almacen: &AlmacenRegistros,
    orden_id: &str,
    token: Option<&str>,
) -> ResultadoAjuste {
    let _cerrojo = almacen.cerrojo_ajustes().await;

    let orden = match almacen
        .get_one(&Credencial::Sistema, Coleccion::Pedidos, orden_id)
        .await
        .and_then(|registro| Orden::try_from(&registro))
    {
        Ok(orden) => orden,
        Err(e) => {
            warn!(orden_id, error = %e, "No se pudo leer el pedido para ajustar el inventario");
            return ResultadoAjuste::sin_aplicar(AjusteInventario::default());
        }
    };
    let Some(ajuste) = orden.ajuste_inventario.filter(|a| !a.resuelto()) else {
        return ResultadoAjuste::default();
    };
    if ajuste.reclamado_por_otro(token, Utc::now()) {
        debug!(orden_id, "Marcador de inventario reclamado por otro proceso; se omite");
        return ResultadoAjuste::sin_aplicar(ajuste);
    }

    // El reclamo queda escrito antes del primer descuento.
    let reclamo = ReclamoAjuste {
        token: token.map(str::to_string).unwrap_or_else(|| ReclamoAjuste::nuevo().token),
        desde: Utc::now(),
    };
    let reclamado = AjusteInventario { pendientes: ajuste.pendientes.clone(), reclamo: Some(reclamo) };
    if let Err(e) = guardar_marcador(almacen, orden_id, &reclamado).await {
        warn!(orden_id, error = %e, "No se pudo reclamar el marcador de inventario");
        return ResultadoAjuste::sin_aplicar(ajuste);
    }

    let mut resultado = ResultadoAjuste::default();
    for mut linea in ajuste.pendientes.into_iter() {
        match descontar_stock(almacen, &linea).await {
            Ok(()) => resultado.aplicadas += 1,
            Err(e) if e.es_no_encontrado() => {
                warn!(orden_id, producto_id = %linea.producto_id, "El producto ya no existe; se descarta el ajuste");
                resultado.aplicadas += 1;
            }
            Err(e) => {
                warn!(
                    orden_id,
                    producto_id = %linea.producto_id,
                    cantidad = linea.cantidad,
                    error = %e,
                    "No se pudo descontar el stock; el ajuste queda pendiente"
                );
                linea.intentos += 1;
                linea.ultimo_error = Some(e.message);
                resultado.fallidas += 1;
                resultado.ajuste.pendientes.push(linea);
            }
        }
    }

    if let Err(e) = guardar_marcador(almacen, orden_id, &resultado.ajuste).await {
        // El reclamo vence y las líneas ya aplicadas se volverían a aplicar.
        error!(orden_id, error = %e, "No se pudo guardar el marcador de ajuste de inventario");
    }

    resultado
}

/// Órdenes cuyo ajuste de inventario sigue sin resolverse.
pub async fn ordenes_con_ajustes_pendientes(almacen: &AlmacenRegistros) -> Result<Vec<Orden>, ErrorAlmacen> {
    let registros = almacen
        .get_full_list(&Credencial::Sistema, Coleccion::Pedidos, &ConsultaLista::nueva().recientes_primero())
        .await?;
    let mut pendientes = Vec::new();
    for registro in &registros {
        let orden = Orden::try_from(registro)?;
        if orden.ajuste_pendiente() {
            pendientes.push(orden);
        }
    }
    Ok(pendientes)
}

/// Una pasada de reconciliación sobre todas las órdenes con ajustes pendientes.
pub async fn reconciliar(almacen: &AlmacenRegistros) -> Result<ResumenReconciliacion, ErrorAlmacen> {
    let ordenes = ordenes_con_ajustes_pendientes(almacen).await?;
    let mut resumen = ResumenReconciliacion { ordenes_revisadas: ordenes.len(), ..Default::default() };

    for orden in &ordenes {
        let resultado = aplicar_ajustes_pendientes(almacen, &orden.id, None).await;
        if resultado.omitida {
            resumen.ordenes_omitidas += 1;
        }
        resumen.lineas_aplicadas += resultado.aplicadas;
        resumen.lineas_fallidas += resultado.fallidas;
    }

    if resumen.ordenes_revisadas > 0 {
        info!(
            ordenes = resumen.ordenes_revisadas,
            omitidas = resumen.ordenes_omitidas,
            aplicadas = resumen.lineas_aplicadas,
            fallidas = resumen.lineas_fallidas,
            "Reconciliación de inventario"
        );
    }
    Ok(resumen)
}

/// Lanza el reconciliador periódico en el runtime de actix.
pub fn iniciar_reconciliador(almacen: AlmacenRegistros, intervalo: Duration) {
    actix_web::rt::spawn(async move {
        let mut reloj = actix_web::rt::time::interval(intervalo);
        // El primer tick es inmediato.
        reloj.tick().await;
        loop {
            reloj.tick().await;
            if let Err(e) = reconciliar(&almacen).await {
                error!(error = %e, "Falló la reconciliación de inventario");
            }
        }
    });
    info!(segundos = intervalo.as_secs(), "Reconciliador de inventario iniciado");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Duration as DuracionChrono;
    use serde_json::json;

    use crate::almacen::{BackendMemoria, BackendRegistros, Registro};
    use crate::ordenes::ordenes_structs::VIGENCIA_RECLAMO_SEGS;

    /// Cede el turno una vez en cada operación, para que dos tareas unidas con
    /// `join!` se intercalen en cualquier punto.
    struct BackendQueCede {
        interno: BackendMemoria,
    }

    #[async_trait]
    impl BackendRegistros for BackendQueCede {
        async fn insertar(&self, coleccion: Coleccion, registro: Registro) -> Result<(), ErrorAlmacen> {
            actix_web::rt::task::yield_now().await;
            self.interno.insertar(coleccion, registro).await
        }

        async fn reemplazar(&self, coleccion: Coleccion, registro: Registro) -> Result<(), ErrorAlmacen> {
            actix_web::rt::task::yield_now().await;
            self.interno.reemplazar(coleccion, registro).await
        }

        async fn eliminar(&self, coleccion: Coleccion, id: &str) -> Result<(), ErrorAlmacen> {
            actix_web::rt::task::yield_now().await;
            self.interno.eliminar(coleccion, id).await
        }

        async fn obtener(&self, coleccion: Coleccion, id: &str) -> Result<Option<Registro>, ErrorAlmacen> {
            actix_web::rt::task::yield_now().await;
            self.interno.obtener(coleccion, id).await
        }

        async fn listar(&self, coleccion: Coleccion) -> Result<Vec<Registro>, ErrorAlmacen> {
            actix_web::rt::task::yield_now().await;
            self.interno.listar(coleccion).await
        }
    }

    fn almacen() -> AlmacenRegistros {
        AlmacenRegistros::new(Arc::new(BackendQueCede { interno: BackendMemoria::new() }), "secreto-de-pruebas", 4)
    }

    fn campos(valor: Value) -> Map<String, Value> {
        valor.as_object().cloned().unwrap_or_default()
    }

    async fn crear_producto(almacen: &AlmacenRegistros, stock: i64) -> String {
        let categoria = almacen
            .create(&Credencial::Sistema, Coleccion::Categorias, campos(json!({ "nombre": "Verduras" })))
            .await
            .unwrap();
        almacen
            .create(
                &Credencial::Sistema,
                Coleccion::Productos,
                campos(json!({ "nombre": "Lechuga", "precio": 900, "stock": stock, "categoria": categoria.id })),
            )
            .await
            .unwrap()
            .id
    }

    async fn crear_pedido(almacen: &AlmacenRegistros, ajuste: &AjusteInventario) -> String {
        almacen
            .create(
                &Credencial::Sistema,
                Coleccion::Pedidos,
                campos(json!({
                    "usuario": "invitado",
                    "productos": [],
                    "total": 2700,
                    "ajuste_inventario": serde_json::to_value(ajuste).unwrap(),
                })),
            )
            .await
            .unwrap()
            .id
    }

    fn ajuste(producto_id: &str, cantidad: i64, reclamo: Option<ReclamoAjuste>) -> AjusteInventario {
        AjusteInventario {
            pendientes: vec![LineaAjuste { producto_id: producto_id.into(), cantidad, intentos: 0, ultimo_error: None }],
            reclamo,
        }
    }

    async fn stock(almacen: &AlmacenRegistros, producto_id: &str) -> i64 {
        let producto = almacen.get_one(&Credencial::Sistema, Coleccion::Productos, producto_id).await.unwrap();
        producto.datos["stock"].as_i64().unwrap()
    }

    async fn marcador(almacen: &AlmacenRegistros, orden_id: &str) -> Option<AjusteInventario> {
        let registro = almacen.get_one(&Credencial::Sistema, Coleccion::Pedidos, orden_id).await.unwrap();
        Orden::try_from(&registro).unwrap().ajuste_inventario
    }

    async fn reconciliar_tras(almacen: &AlmacenRegistros, retraso: usize) -> ResumenReconciliacion {
        for _ in 0..retraso {
            actix_web::rt::task::yield_now().await;
        }
        reconciliar(almacen).await.unwrap()
    }

    #[actix_web::test]
    async fn pasadas_simultaneas_descuentan_una_sola_vez() {
        for retraso in 0..=6 {
            let almacen = almacen();
            let producto = crear_producto(&almacen, 10).await;
            let orden = crear_pedido(&almacen, &ajuste(&producto, 3, None)).await;

            let (a, b) = futures::join!(reconciliar_tras(&almacen, 0), reconciliar_tras(&almacen, retraso));

            assert_eq!(stock(&almacen, &producto).await, 7, "retraso {}", retraso);
            assert_eq!(a.lineas_aplicadas + b.lineas_aplicadas, 1, "retraso {}", retraso);
            assert_eq!(marcador(&almacen, &orden).await, None);
        }
    }

    #[actix_web::test]
    async fn el_checkout_y_el_reconciliador_no_se_pisan() {
        let almacen = almacen();
        let producto = crear_producto(&almacen, 10).await;
        let reclamo = ReclamoAjuste::nuevo();
        let orden = crear_pedido(&almacen, &ajuste(&producto, 4, Some(reclamo.clone()))).await;

        let (checkout, pasada) = futures::join!(
            aplicar_ajustes_pendientes(&almacen, &orden, Some(&reclamo.token)),
            reconciliar_tras(&almacen, 1)
        );

        assert_eq!(checkout.aplicadas, 1);
        assert!(!checkout.omitida);
        assert_eq!(pasada.lineas_aplicadas, 0);
        assert_eq!(stock(&almacen, &producto).await, 6);
        assert_eq!(marcador(&almacen, &orden).await, None);
    }

    #[actix_web::test]
    async fn reclamo_vigente_se_respeta_y_el_vencido_se_retoma() {
        let almacen = almacen();
        let producto = crear_producto(&almacen, 10).await;
        let vigente = crear_pedido(&almacen, &ajuste(&producto, 2, Some(ReclamoAjuste::nuevo()))).await;

        let resumen = reconciliar(&almacen).await.unwrap();
        assert_eq!(resumen.ordenes_revisadas, 1);
        assert_eq!(resumen.ordenes_omitidas, 1);
        assert_eq!(resumen.lineas_aplicadas, 0);
        assert_eq!(stock(&almacen, &producto).await, 10);
        assert!(marcador(&almacen, &vigente).await.is_some());

        let abandonado = ReclamoAjuste {
            token: "caido".into(),
            desde: Utc::now() - DuracionChrono::seconds(VIGENCIA_RECLAMO_SEGS + 1),
        };
        let mut pendiente = marcador(&almacen, &vigente).await.unwrap();
        pendiente.reclamo = Some(abandonado);
        guardar_marcador(&almacen, &vigente, &pendiente).await.unwrap();

        let resumen = reconciliar(&almacen).await.unwrap();
        assert_eq!(resumen.ordenes_omitidas, 0);
        assert_eq!(resumen.lineas_aplicadas, 1);
        assert_eq!(stock(&almacen, &producto).await, 8);
    }

    #[actix_web::test]
    async fn producto_borrado_se_descarta_y_pedido_ausente_se_omite() {
        let almacen = almacen();
        let orden = crear_pedido(&almacen, &ajuste("noexisteproduct", 1, None)).await;
        let resultado = aplicar_ajustes_pendientes(&almacen, &orden, None).await;
        assert_eq!(resultado.aplicadas, 1);
        assert_eq!(marcador(&almacen, &orden).await, None);

        let sin_pedido = aplicar_ajustes_pendientes(&almacen, "noexistepedido1", None).await;
        assert!(sin_pedido.omitida);
    }
}
