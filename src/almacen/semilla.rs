// src/almacen/semilla.rs

use serde_json::{json, Value};
use tracing::info;

use super::almacen_error::ErrorAlmacen;
use super::almacen_structs::{Coleccion, ConsultaLista, Credencial};
use super::cliente::AlmacenRegistros;

pub const EMAIL_ADMIN_DEMO: &str = "admin@huertohogar.cl";
pub const PASSWORD_ADMIN_DEMO: &str = "admin123";
pub const EMAIL_CLIENTE_DEMO: &str = "cliente@gmail.cl";
pub const PASSWORD_CLIENTE_DEMO: &str = "cliente123";

// (nombre, descripcion, imagen)
const CATEGORIAS: [(&str, &str, &str); 4] = [
    ("Frutas Frescas", "Frutas frescas de temporada", "/frutas-frescas-naturales.jpg"),
    ("Verduras", "Verduras y hortalizas del día", "/verduras-frescas.jpg"),
    ("Frutas Exóticas", "Frutas importadas y exóticas", "/frutas-exoticas.jpg"),
    ("Hierbas y Especias", "Hierbas aromáticas y especias", "/hierbas-aromaticas.jpg"),
];

fn productos() -> Vec<(usize, Value)> {
    vec![
        (0, json!({ "nombre": "Manzanas Rojas", "descripcion": "Manzanas rojas frescas y crujientes", "precio": 1990, "stock": 50, "imagen": "/manzanas-rojas-frescas.jpg", "unidad": "kg", "destacado": true })),
        (1, json!({ "nombre": "Tomates", "descripcion": "Tomates frescos de invernadero", "precio": 1590, "precio_oferta": 1290, "stock": 80, "imagen": "/tomates-frescos.jpg", "unidad": "kg", "destacado": true })),
        (0, json!({ "nombre": "Plátanos", "descripcion": "Plátanos maduros ideales para consumo", "precio": 1490, "stock": 100, "imagen": "/platanos-maduros.jpg", "unidad": "kg", "destacado": true })),
        (1, json!({ "nombre": "Lechugas", "descripcion": "Lechugas verdes frescas", "precio": 890, "stock": 60, "imagen": "/lechugas-verdes.jpg", "unidad": "unidad", "destacado": false })),
        (0, json!({ "nombre": "Paltas", "descripcion": "Paltas Hass premium", "precio": 2990, "stock": 40, "imagen": "/paltas-hass.jpg", "unidad": "kg", "destacado": true })),
        (1, json!({ "nombre": "Zanahorias", "descripcion": "Zanahorias frescas y dulces", "precio": 790, "stock": 70, "imagen": "/zanahorias-frescas.jpg", "unidad": "kg", "destacado": false })),
        (2, json!({ "nombre": "Mangos", "descripcion": "Mangos tropicales dulces", "precio": 3490, "precio_oferta": 2990, "stock": 30, "imagen": "/mangos-tropicales.jpg", "unidad": "kg", "destacado": true })),
        (1, json!({ "nombre": "Papas", "descripcion": "Papas blancas para cocinar", "precio": 1290, "stock": 120, "imagen": "/papas-blancas.jpg", "unidad": "kg", "destacado": false })),
        (3, json!({ "nombre": "Albahaca", "descripcion": "Albahaca fresca aromática", "precio": 1490, "stock": 5, "imagen": "/albahaca-fresca.jpg", "unidad": "manojo", "destacado": false })),
        (0, json!({ "nombre": "Fresas", "descripcion": "Fresas frescas y dulces", "precio": 2490, "stock": 45, "imagen": "/fresas-frescas.jpg", "unidad": "kg", "destacado": true })),
    ]
}

fn usuarios() -> [Value; 2] {
    [
        json!({
            "email": EMAIL_ADMIN_DEMO, "password": PASSWORD_ADMIN_DEMO, "passwordConfirm": PASSWORD_ADMIN_DEMO,
            "nombre": "Admin", "apellido": "Huerto Hogar", "telefono": "+56987654321",
            "direccion": "Calle Admin 100", "ciudad": "Santiago", "region": "Metropolitana",
            "codigo_postal": "8320000", "rol": "admin"
        }),
        json!({
            "email": EMAIL_CLIENTE_DEMO, "password": PASSWORD_CLIENTE_DEMO, "passwordConfirm": PASSWORD_CLIENTE_DEMO,
            "nombre": "Cliente", "apellido": "Demo", "telefono": "+56912345678",
            "direccion": "Av. Libertador Bernardo O'Higgins 1234", "ciudad": "Santiago", "region": "Metropolitana",
            "codigo_postal": "8320000", "rol": "cliente"
        }),
    ]
}

fn como_mapa(valor: Value) -> serde_json::Map<String, Value> {
    match valor {
        Value::Object(campos) => campos,
        _ => serde_json::Map::new(),
    }
}

/// Carga el catálogo de demostración y las cuentas demo. No hace nada si ya hay
/// categorías.
pub async fn sembrar_datos_demo(almacen: &AlmacenRegistros) -> Result<(), ErrorAlmacen> {
    let sistema = Credencial::Sistema;
    let existentes = almacen.get_full_list(&sistema, Coleccion::Categorias, &ConsultaLista::nueva()).await?;
    if !existentes.is_empty() {
        return Ok(());
    }

    let mut ids_categoria = Vec::with_capacity(CATEGORIAS.len());
    for (nombre, descripcion, imagen) in CATEGORIAS {
        let categoria = almacen
            .create(
                &sistema,
                Coleccion::Categorias,
                como_mapa(json!({ "nombre": nombre, "descripcion": descripcion, "imagen": imagen })),
            )
            .await?;
        ids_categoria.push(categoria.id);
    }

    let total_productos = productos().len();
    for (indice_categoria, producto) in productos() {
        let mut campos = como_mapa(producto);
        campos.insert("categoria".into(), Value::String(ids_categoria[indice_categoria].clone()));
        almacen.create(&sistema, Coleccion::Productos, campos).await?;
    }

    for usuario in usuarios() {
        almacen.create(&sistema, Coleccion::Users, como_mapa(usuario)).await?;
    }

    info!(
        categorias = ids_categoria.len(),
        productos = total_productos,
        admin = EMAIL_ADMIN_DEMO,
        "Datos de demostración cargados"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::almacen::BackendMemoria;
    use std::sync::Arc;

    #[actix_web::test]
    async fn siembra_una_sola_vez() {
        let almacen = AlmacenRegistros::new(Arc::new(BackendMemoria::new()), "secreto", 4);
        sembrar_datos_demo(&almacen).await.unwrap();
        sembrar_datos_demo(&almacen).await.unwrap();

        let productos = almacen
            .get_full_list(&Credencial::Anonima, Coleccion::Productos, &ConsultaLista::nueva())
            .await
            .unwrap();
        assert_eq!(productos.len(), 10);

        let admin = almacen.auth_with_password(EMAIL_ADMIN_DEMO, PASSWORD_ADMIN_DEMO).await.unwrap().en_sesion();
        assert!(Credencial::Usuario(admin).es_admin());
    }
}
