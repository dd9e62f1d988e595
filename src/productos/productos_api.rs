// src/productos/productos_api.rs

use tracing::{debug, warn};

use super::productos_structs::{FiltroProductos, OrdenProductos, Producto};
use crate::almacen::{AlmacenRegistros, Coleccion, ConsultaLista, Credencial, ErrorAlmacen};

/// Aplica los filtros de membresía y el orden pedido. Sin orden, se respeta el
/// orden de entrada.
pub fn aplicar_filtro(productos: Vec<Producto>, filtro: &FiltroProductos) -> Vec<Producto> {
    let busqueda = filtro
        .busqueda
        .as_deref()
        .map(|b| b.trim().to_lowercase())
        .filter(|b| !b.is_empty());

    let mut productos: Vec<Producto> = productos
        .into_iter()
        .filter(|p| filtro.categoria.as_deref().map_or(true, |c| p.categoria == c))
        .filter(|p| filtro.activo.map_or(true, |a| p.activo == a))
        .filter(|p| filtro.oferta.map_or(true, |o| p.en_oferta == o))
        .filter(|p| busqueda.as_deref().map_or(true, |b| p.nombre.to_lowercase().contains(b)))
        .collect();

    match filtro.orden {
        Some(OrdenProductos::PrecioAsc) => productos.sort_by_key(|p| p.precio_final()),
        Some(OrdenProductos::PrecioDesc) => productos.sort_by(|a, b| b.precio_final().cmp(&a.precio_final())),
        Some(OrdenProductos::Nombre) => productos.sort_by_key(|p| p.nombre.to_lowercase()),
        None => {}
    }
    productos
}

pub async fn obtener_productos(
    almacen: &AlmacenRegistros,
    credencial: &Credencial,
    filtro: &FiltroProductos,
) -> Result<Vec<Producto>, ErrorAlmacen> {
    let registros = almacen
        .get_full_list(credencial, Coleccion::Productos, &ConsultaLista::nueva().recientes_primero())
        .await?;
    let productos = registros.iter().map(|r| Producto::try_from(r)).collect::<Result<Vec<_>, _>>()?;
    Ok(aplicar_filtro(productos, filtro))
}

pub async fn obtener_producto(
    almacen: &AlmacenRegistros,
    credencial: &Credencial,
    id: &str,
) -> Result<Producto, ErrorAlmacen> {
    let registro = almacen.get_one(credencial, Coleccion::Productos, id).await?;
    Producto::try_from(&registro)
}

/// Productos actuales de una lista de ids. Los ids que ya no existen simplemente
/// no aparecen en el resultado.
pub async fn obtener_productos_por_ids(
    almacen: &AlmacenRegistros,
    credencial: &Credencial,
    ids: &[String],
) -> Result<Vec<Producto>, ErrorAlmacen> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let registros = almacen
        .get_full_list(credencial, Coleccion::Productos, &ConsultaLista::nueva().con_ids(ids.to_vec()))
        .await?;
    registros.iter().map(|r| Producto::try_from(r)).collect()
}

/// Comprueba que la categoría existe y es legible con esta credencial. Si la
/// lectura directa falla, se busca en el listado completo antes de rendirse.
pub async fn categoria_legible(
    almacen: &AlmacenRegistros,
    credencial: &Credencial,
    categoria_id: &str,
) -> Result<bool, ErrorAlmacen> {
    match almacen.get_one(credencial, Coleccion::Categorias, categoria_id).await {
        Ok(_) => return Ok(true),
        Err(e) if e.status >= 500 => return Err(e),
        Err(e) => {
            warn!(categoria_id, error = %e, "Falló getOne de la categoría; se intenta con el listado completo");
        }
    }

    match almacen.get_full_list(credencial, Coleccion::Categorias, &ConsultaLista::nueva()).await {
        Ok(categorias) => {
            let encontrada = categorias.iter().any(|c| c.id == categoria_id);
            debug!(categoria_id, encontrada, "Resultado del listado de categorías");
            Ok(encontrada)
        }
        Err(e) if e.status >= 500 => Err(e),
        Err(e) => {
            warn!(categoria_id, error = %e, "El listado de categorías también falló");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use bigdecimal::BigDecimal;
    use serde_json::{json, Map, Value};

    use crate::almacen::{BackendMemoria, BackendRegistros, Registro};

    /// La lectura directa de categorías falla con `al_obtener`; el listado,
    /// con `al_listar` si se indica.
    struct BackendCategoriasInestable {
        interno: BackendMemoria,
        al_obtener: u16,
        al_listar: Option<u16>,
    }

    fn fallo(status: u16) -> ErrorAlmacen {
        ErrorAlmacen::new(status, "Something went wrong while processing your request.", json!({}))
    }

    #[async_trait]
    impl BackendRegistros for BackendCategoriasInestable {
        async fn insertar(&self, coleccion: Coleccion, registro: Registro) -> Result<(), ErrorAlmacen> {
            self.interno.insertar(coleccion, registro).await
        }

        async fn reemplazar(&self, coleccion: Coleccion, registro: Registro) -> Result<(), ErrorAlmacen> {
            self.interno.reemplazar(coleccion, registro).await
        }

        async fn eliminar(&self, coleccion: Coleccion, id: &str) -> Result<(), ErrorAlmacen> {
            self.interno.eliminar(coleccion, id).await
        }

        async fn obtener(&self, coleccion: Coleccion, id: &str) -> Result<Option<Registro>, ErrorAlmacen> {
            if coleccion == Coleccion::Categorias {
                return Err(fallo(self.al_obtener));
            }
            self.interno.obtener(coleccion, id).await
        }

        async fn listar(&self, coleccion: Coleccion) -> Result<Vec<Registro>, ErrorAlmacen> {
            match self.al_listar {
                Some(status) if coleccion == Coleccion::Categorias => Err(fallo(status)),
                _ => self.interno.listar(coleccion).await,
            }
        }
    }

    async fn almacen_con_categoria(al_obtener: u16, al_listar: Option<u16>) -> (AlmacenRegistros, String) {
        let backend = BackendCategoriasInestable { interno: BackendMemoria::new(), al_obtener, al_listar };
        let almacen = AlmacenRegistros::new(Arc::new(backend), "secreto-de-pruebas", 4);
        let campos: Map<String, Value> = json!({ "nombre": "Frutas" }).as_object().cloned().unwrap();
        let categoria = almacen.create(&Credencial::Sistema, Coleccion::Categorias, campos).await.unwrap();
        (almacen, categoria.id)
    }

    fn producto(id: &str, nombre: &str, precio: i64, oferta: Option<i64>, categoria: &str, activo: bool) -> Producto {
        let en_oferta = oferta.map_or(false, |o| o < precio);
        Producto {
            id: id.into(),
            nombre: nombre.into(),
            descripcion: String::new(),
            precio: BigDecimal::from(precio),
            precio_oferta: oferta.map(BigDecimal::from),
            stock: 10,
            categoria: categoria.into(),
            imagen: String::new(),
            unidad: "kg".into(),
            destacado: false,
            en_oferta,
            descuento: None,
            activo,
        }
    }

    fn catalogo() -> Vec<Producto> {
        vec![
            producto("1", "Manzanas Rojas", 1990, None, "frutas", true),
            producto("2", "Tomates", 1590, Some(1290), "verduras", true),
            producto("3", "Mangos", 3490, Some(2990), "exoticas", true),
            producto("4", "Lechugas", 890, None, "verduras", false),
        ]
    }

    fn ids(productos: &[Producto]) -> Vec<&str> {
        productos.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn filtra_por_categoria_activo_y_busqueda() {
        let filtro = FiltroProductos { categoria: Some("verduras".into()), activo: Some(true), ..Default::default() };
        assert_eq!(ids(&aplicar_filtro(catalogo(), &filtro)), vec!["2"]);

        let filtro = FiltroProductos { busqueda: Some("  MAN ".into()), ..Default::default() };
        assert_eq!(ids(&aplicar_filtro(catalogo(), &filtro)), vec!["1"]);
    }

    #[test]
    fn filtra_ofertas_y_ordena_por_precio_final() {
        let filtro = FiltroProductos { oferta: Some(true), orden: Some(OrdenProductos::PrecioDesc), ..Default::default() };
        assert_eq!(ids(&aplicar_filtro(catalogo(), &filtro)), vec!["3", "2"]);

        let filtro = FiltroProductos { orden: Some(OrdenProductos::PrecioAsc), ..Default::default() };
        assert_eq!(ids(&aplicar_filtro(catalogo(), &filtro)), vec!["4", "2", "1", "3"]);

        let filtro = FiltroProductos { orden: Some(OrdenProductos::Nombre), ..Default::default() };
        assert_eq!(ids(&aplicar_filtro(catalogo(), &filtro)), vec!["4", "3", "1", "2"]);
    }

    #[actix_web::test]
    async fn categoria_se_busca_en_el_listado_si_la_lectura_directa_falla() {
        let (almacen, categoria) = almacen_con_categoria(400, None).await;
        assert!(categoria_legible(&almacen, &Credencial::Anonima, &categoria).await.unwrap());
        assert!(!categoria_legible(&almacen, &Credencial::Anonima, "noexisteestacat").await.unwrap());
    }

    #[actix_web::test]
    async fn categoria_ilegible_si_tambien_falla_el_listado() {
        let (almacen, categoria) = almacen_con_categoria(403, Some(403)).await;
        assert!(!categoria_legible(&almacen, &Credencial::Anonima, &categoria).await.unwrap());

        let (almacen, categoria) = almacen_con_categoria(400, Some(503)).await;
        assert_eq!(categoria_legible(&almacen, &Credencial::Anonima, &categoria).await.unwrap_err().status, 503);

        let (almacen, categoria) = almacen_con_categoria(500, None).await;
        assert_eq!(categoria_legible(&almacen, &Credencial::Anonima, &categoria).await.unwrap_err().status, 500);
    }
}
