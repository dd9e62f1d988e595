// src/shared/openapi.rs

use actix_web::{get, HttpResponse};
use utoipa::OpenApi;

use crate::blog::blog_structs::{Articulo, Comentario, DatosArticulo, NuevoComentario};
use crate::checkout::checkout_structs::{DatosCheckout, ResumenReconciliacion};
use crate::shared::shared_structs::{ErrorResponse, MensajeResponse};

/// Documento OpenAPI de todas las rutas registradas en `configurar_rutas`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Huerto Hogar API",
        version = "0.1.0",
        description = "Catálogo, carrito, checkout y panel de administración de Huerto Hogar.\n\nLa sesión viaja en la cookie `pb_auth`; los invitados se identifican con `huerto_invitado`."
    ),
    tags(
        (name = "auth", description = "Inicio y cierre de sesión"),
        (name = "usuarios", description = "Usuarios y perfiles"),
        (name = "categorias", description = "Categorías del catálogo"),
        (name = "productos", description = "Productos del catálogo"),
        (name = "carrito", description = "Carrito por usuario o invitado"),
        (name = "checkout", description = "Pago y creación de órdenes"),
        (name = "inventario", description = "Ajustes de inventario pendientes"),
        (name = "ordenes", description = "Órdenes de compra"),
        (name = "reportes", description = "Reportes del panel"),
        (name = "blog", description = "Artículos y comentarios")
    ),
    paths(
        // Autenticación
        crate::usuarios::auth_router::iniciar_sesion,
        crate::usuarios::auth_router::registrar,
        crate::usuarios::auth_router::cerrar_sesion,
        crate::usuarios::auth_router::usuario_actual,
        // Usuarios
        crate::usuarios::usuario_router::buscar_usuarios,
        crate::usuarios::usuario_router::crear_usuario,
        crate::usuarios::usuario_router::buscar_usuario_por_id,
        crate::usuarios::usuario_router::actualizar_usuario,
        crate::usuarios::usuario_router::eliminar_usuario,
        // Categorías
        crate::categorias::categoria_router::buscar_categorias,
        crate::categorias::categoria_router::crear_categoria,
        crate::categorias::categoria_router::buscar_categoria_por_id,
        crate::categorias::categoria_router::actualizar_categoria,
        crate::categorias::categoria_router::eliminar_categoria,
        // Productos
        crate::productos::productos_router::buscar_productos,
        crate::productos::productos_router::crear_producto,
        crate::productos::productos_router::buscar_producto_por_id,
        crate::productos::productos_router::actualizar_producto,
        crate::productos::productos_router::eliminar_producto,
        // Carrito
        crate::carrito::carrito_router::ver_carrito,
        crate::carrito::carrito_router::agregar_item,
        crate::carrito::carrito_router::actualizar_item,
        crate::carrito::carrito_router::eliminar_item,
        crate::carrito::carrito_router::vaciar_carrito,
        // Checkout e inventario
        crate::checkout::checkout_router::checkout,
        crate::checkout::checkout_router::buscar_regiones,
        crate::checkout::checkout_router::buscar_ajustes_pendientes,
        crate::checkout::checkout_router::reconciliar_ajustes,
        // Órdenes
        crate::ordenes::ordenes_router::buscar_ordenes_de_usuario,
        crate::ordenes::ordenes_router::buscar_ordenes,
        crate::ordenes::ordenes_router::crear_orden,
        crate::ordenes::ordenes_router::buscar_orden_por_id,
        crate::ordenes::ordenes_router::actualizar_estado_orden,
        crate::ordenes::ordenes_router::eliminar_orden,
        // Reportes
        crate::reportes::reportes_router::obtener_reporte,
        // Blog
        crate::blog::blog_router::buscar_articulos,
        crate::blog::blog_router::crear_articulo,
        crate::blog::blog_router::buscar_articulo_por_id,
        crate::blog::blog_router::actualizar_articulo,
        crate::blog::blog_router::eliminar_articulo,
        crate::blog::blog_router::buscar_comentarios,
        crate::blog::blog_router::crear_comentario,
        crate::blog::blog_router::buscar_todos_los_articulos,
    ),
    components(schemas(
        ErrorResponse,
        MensajeResponse,
        DatosCheckout,
        ResumenReconciliacion,
        Articulo,
        Comentario,
        DatosArticulo,
        NuevoComentario,
    ))
)]
pub struct ApiDoc;

#[get("/api/docs/openapi.json")]
pub async fn documento_openapi() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
