// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// Módulos de la aplicación
//
// Cada recurso vive en su carpeta con `*_structs.rs` (tipos serde) y
// `*_router.rs` (rutas de actix).
mod almacen; // Almacén de registros: colecciones, reglas, esquema y autenticación
mod blog; // Blog (datos locales, fuera del almacén)
mod carrito; // Carrito por identidad
mod categorias; // Módulo de categorías
mod checkout; // Checkout, pago e inventario
mod config; // Configuración desde el entorno
mod ordenes; // Módulo de órdenes
mod productos; // Módulo de productos
mod reportes; // Reportes del panel de administración
mod shared; // Módulo shared
mod usuarios; // Módulo de usuarios y autenticación


use almacen::{AlmacenRegistros, BackendMemoria, BackendPostgres, BackendRegistros};
use blog::blog_almacen::BlogMemoria;
use carrito::almacen_carrito::{AlmacenCarritos, AlmacenCarritosMemoria};
use checkout::pago::{PasarelaPago, PasarelaSimulada};
use config::Configuracion;

/// Estado compartido entre todas las rutas. No guarda credenciales: cada
/// solicitud trae la suya en `ContextoSolicitud`.
pub struct AppState {
    pub almacen: AlmacenRegistros,
    pub carritos: Arc<dyn AlmacenCarritos>,
    pub pasarela: Arc<dyn PasarelaPago>,
    pub blog: BlogMemoria,
    pub config: Configuracion,
}

/// Registra todas las rutas de la API.
pub fn configurar_rutas(cfg: &mut web::ServiceConfig) {
    cfg
        // Autenticación
        .service(usuarios::auth_router::iniciar_sesion)
        .service(usuarios::auth_router::registrar)
        .service(usuarios::auth_router::cerrar_sesion)
        .service(usuarios::auth_router::usuario_actual)
        // Módulo de Usuarios
        .service(usuarios::usuario_router::buscar_usuarios)
        .service(usuarios::usuario_router::crear_usuario)
        .service(usuarios::usuario_router::buscar_usuario_por_id)
        .service(usuarios::usuario_router::actualizar_usuario)
        .service(usuarios::usuario_router::eliminar_usuario)
        // Módulo de Categorías
        .service(categorias::categoria_router::buscar_categorias)
        .service(categorias::categoria_router::crear_categoria)
        .service(categorias::categoria_router::buscar_categoria_por_id)
        .service(categorias::categoria_router::actualizar_categoria)
        .service(categorias::categoria_router::eliminar_categoria)
        // Módulo de Productos
        .service(productos::productos_router::buscar_productos)
        .service(productos::productos_router::crear_producto)
        .service(productos::productos_router::buscar_producto_por_id)
        .service(productos::productos_router::actualizar_producto)
        .service(productos::productos_router::eliminar_producto)
        // Carrito
        .service(carrito::carrito_router::ver_carrito)
        .service(carrito::carrito_router::agregar_item)
        .service(carrito::carrito_router::actualizar_item)
        .service(carrito::carrito_router::eliminar_item)
        .service(carrito::carrito_router::vaciar_carrito)
        // Checkout e inventario
        .service(checkout::checkout_router::checkout)
        .service(checkout::checkout_router::buscar_regiones)
        .service(checkout::checkout_router::buscar_ajustes_pendientes)
        .service(checkout::checkout_router::reconciliar_ajustes)
        // Módulo de Órdenes (la ruta por usuario va antes que la de id)
        .service(ordenes::ordenes_router::buscar_ordenes_de_usuario)
        .service(ordenes::ordenes_router::buscar_ordenes)
        .service(ordenes::ordenes_router::crear_orden)
        .service(ordenes::ordenes_router::buscar_orden_por_id)
        .service(ordenes::ordenes_router::actualizar_estado_orden)
        .service(ordenes::ordenes_router::eliminar_orden)
        // Reportes
        .service(reportes::reportes_router::obtener_reporte)
        // Blog
        .service(blog::blog_router::buscar_articulos)
        .service(blog::blog_router::crear_articulo)
        .service(blog::blog_router::buscar_articulo_por_id)
        .service(blog::blog_router::actualizar_articulo)
        .service(blog::blog_router::eliminar_articulo)
        .service(blog::blog_router::buscar_comentarios)
        .service(blog::blog_router::crear_comentario)
        .service(blog::blog_router::buscar_todos_los_articulos)
        // Documentación OpenAPI
        .service(shared::openapi::documento_openapi);
}

/// Backend Postgres si hay `DATABASE_URL`; si no, memoria con datos de demostración.
async fn crear_almacen(config: &Configuracion) -> Result<AlmacenRegistros, almacen::ErrorAlmacen> {
    let backend: Arc<dyn BackendRegistros> = match &config.database_url {
        Some(url) => Arc::new(BackendPostgres::conectar(url).await?),
        None => Arc::new(BackendMemoria::new()),
    };
    let almacen = AlmacenRegistros::new(backend, &config.jwt_secret, config.costo_bcrypt);

    if config.database_url.is_none() {
        warn!("DATABASE_URL no configurada: se usa el almacén en memoria con datos de demostración");
        almacen::semilla::sembrar_datos_demo(&almacen).await?;
    }
    Ok(almacen)
}

// Función principal de la aplicación Actix Web.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Lee `.env` si existe; las variables del entorno tienen prioridad.
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Configuracion::desde_entorno().map_err(|e| {
        error!(error = %e, "Configuración inválida");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let almacen = crear_almacen(&config).await.map_err(|e| {
        error!(error = %e, "No se pudo inicializar el almacén de registros");
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    if config.intervalo_reconciliacion_segs > 0 {
        checkout::inventario::iniciar_reconciliador(
            almacen.clone(),
            Duration::from_secs(config.intervalo_reconciliacion_segs),
        );
    }

    let direccion = config.direccion.clone();

    // web::Data comparte el estado (detrás de un Arc) entre los workers.
    let app_state = web::Data::new(AppState {
        almacen,
        carritos: Arc::new(AlmacenCarritosMemoria::new()),
        pasarela: Arc::new(PasarelaSimulada::new(config.tasa_aprobacion_pago)),
        blog: BlogMemoria::new(),
        config,
    });

    info!(%direccion, "Iniciando API Huerto Hogar");

    // Configura e inicia el servidor HTTP.
    HttpServer::new(move || {
        App::new()
            // .clone() es necesario porque la closure se ejecuta una vez por worker.
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configurar_rutas)
    })
    // Vincula el servidor a la dirección configurada. El '?' propaga errores.
    .bind(direccion)?
    .run()
    .await
}
