// src/blog/blog_almacen.rs

use std::sync::RwLock;

use chrono::{DateTime, Datelike, Utc};
use tracing::debug;
use uuid::Uuid;

use super::blog_structs::{parrafos, Articulo, Comentario, DatosArticulo};

const AUTOR: &str = "Equipo Huerto Hogar";
const IMAGEN_POR_DEFECTO: &str = "/blog-article.jpg";

const MESES: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre", "octubre", "noviembre",
    "diciembre",
];

/// `19 de octubre de 2026`.
fn fecha_larga(fecha: DateTime<Utc>) -> String {
    format!("{} de {} de {}", fecha.day(), MESES[fecha.month0() as usize], fecha.year())
}

fn o_por_defecto(valor: &str, por_defecto: &str) -> String {
    let valor = valor.trim();
    let elegido = if valor.is_empty() { por_defecto } else { valor };
    elegido.to_string()
}

fn articulos_iniciales() -> Vec<Articulo> {
    vec![
        Articulo {
            id: "1".into(),
            titulo: "Beneficios de las Frutas de Temporada".into(),
            extracto: "Descubre por qué es importante consumir frutas de temporada y cómo benefician tu salud y el medio ambiente.".into(),
            imagen: "/frutas-frescas-naturales.jpg".into(),
            fecha: "15 de Enero, 2025".into(),
            autor: AUTOR.into(),
            contenido: vec![
                "Las frutas de temporada se cosechan en su momento óptimo de maduración. Consumirlas es bueno para tu salud, para el medio ambiente y para la economía local.".into(),
                "Tienen un sabor más intenso porque maduran naturalmente en la planta, y conservan más vitaminas, minerales y antioxidantes.".into(),
                "Suelen ser más económicas por su mayor disponibilidad, y requieren menos transporte y almacenamiento.".into(),
                "Al elegir fruta local de temporada reduces la huella de carbono de tus alimentos y apoyas a los agricultores de tu región.".into(),
                "En Huerto Hogar te ofrecemos siempre las mejores frutas de temporada, frescas y de la más alta calidad.".into(),
            ],
            activo: true,
        },
        Articulo {
            id: "2".into(),
            titulo: "Cómo Conservar tus Verduras Frescas por Más Tiempo".into(),
            extracto: "Aprende técnicas profesionales para mantener tus verduras frescas y crujientes durante más tiempo en casa.".into(),
            imagen: "/verduras-frescas.jpg".into(),
            fecha: "10 de Enero, 2025".into(),
            autor: AUTOR.into(),
            contenido: vec![
                "Con los métodos adecuados puedes prolongar la vida útil de tus verduras y mantener su calidad nutricional.".into(),
                "La temperatura es clave: la mayoría se conserva mejor refrigerada entre 1 y 4 °C, aunque tomates, cebollas y papas prefieren temperatura ambiente.".into(),
                "Las hojas verdes necesitan humedad; guárdalas en bolsas perforadas o en el cajón de verduras. Zanahorias y apio se mantienen crujientes en agua.".into(),
                "No laves las verduras antes de guardarlas: la humedad excesiva acelera su deterioro.".into(),
                "Separa las verduras que producen etileno, como tomates y pimientos, de las sensibles a él, como lechugas y brócoli.".into(),
                "En Huerto Hogar te ofrecemos verduras ultra frescas que durarán más en tu hogar.".into(),
            ],
            activo: true,
        },
    ]
}

/// Artículos y comentarios del blog, en memoria. No pasan por el almacén de
/// registros.
pub struct BlogMemoria {
    articulos: RwLock<Vec<Articulo>>,
    // Comentarios en orden de llegada.
    comentarios: RwLock<Vec<Comentario>>,
}

impl Default for BlogMemoria {
    fn default() -> Self {
        Self::new()
    }
}

impl BlogMemoria {
    pub fn new() -> Self {
        Self { articulos: RwLock::new(articulos_iniciales()), comentarios: RwLock::new(Vec::new()) }
    }

    /// Artículos publicados.
    pub fn articulos(&self) -> Vec<Articulo> {
        self.todos().into_iter().filter(|a| a.activo).collect()
    }

    /// Todos los artículos, también los inactivos.
    pub fn todos(&self) -> Vec<Articulo> {
        self.articulos.read().unwrap_or_else(|envenenado| envenenado.into_inner()).clone()
    }

    pub fn articulo(&self, id: &str) -> Option<Articulo> {
        self.articulos
            .read()
            .unwrap_or_else(|envenenado| envenenado.into_inner())
            .iter()
            .find(|a| a.id == id && a.activo)
            .cloned()
    }

    /// Alta con los obligatorios ya validados. Imagen y autor en blanco toman
    /// sus valores por defecto.
    pub fn crear_articulo(&self, datos: DatosArticulo) -> Articulo {
        let nuevo = Articulo {
            id: Uuid::new_v4().simple().to_string(),
            titulo: datos.titulo.unwrap_or_default().trim().to_string(),
            extracto: datos.extracto.unwrap_or_default().trim().to_string(),
            imagen: o_por_defecto(datos.imagen.as_deref().unwrap_or_default(), IMAGEN_POR_DEFECTO),
            fecha: fecha_larga(Utc::now()),
            autor: o_por_defecto(datos.autor.as_deref().unwrap_or_default(), AUTOR),
            contenido: parrafos(datos.contenido.as_deref().unwrap_or_default()),
            activo: datos.activo.unwrap_or(true),
        };
        let mut articulos = self.articulos.write().unwrap_or_else(|envenenado| envenenado.into_inner());
        articulos.push(nuevo.clone());
        nuevo
    }

    /// Aplica solo los campos presentes. `None` si el artículo no existe.
    pub fn actualizar_articulo(&self, id: &str, datos: DatosArticulo) -> Option<Articulo> {
        let mut articulos = self.articulos.write().unwrap_or_else(|envenenado| envenenado.into_inner());
        let articulo = articulos.iter_mut().find(|a| a.id == id)?;

        if let Some(titulo) = datos.titulo {
            articulo.titulo = titulo.trim().to_string();
        }
        if let Some(extracto) = datos.extracto {
            articulo.extracto = extracto.trim().to_string();
        }
        if let Some(imagen) = datos.imagen {
            articulo.imagen = o_por_defecto(&imagen, IMAGEN_POR_DEFECTO);
        }
        if let Some(autor) = datos.autor {
            articulo.autor = o_por_defecto(&autor, AUTOR);
        }
        if let Some(contenido) = datos.contenido {
            articulo.contenido = parrafos(&contenido);
        }
        if let Some(activo) = datos.activo {
            articulo.activo = activo;
        }
        Some(articulo.clone())
    }

    /// Elimina el artículo y sus comentarios. `false` si no existía.
    pub fn eliminar_articulo(&self, id: &str) -> bool {
        let mut articulos = self.articulos.write().unwrap_or_else(|envenenado| envenenado.into_inner());
        let antes = articulos.len();
        articulos.retain(|a| a.id != id);
        if articulos.len() == antes {
            return false;
        }
        drop(articulos);

        let mut comentarios = self.comentarios.write().unwrap_or_else(|envenenado| envenenado.into_inner());
        comentarios.retain(|c| c.articulo_id != id);
        debug!(articulo_id = id, "Artículo eliminado con sus comentarios");
        true
    }

    /// Comentarios de un artículo, el más reciente primero.
    pub fn comentarios(&self, articulo_id: &str) -> Vec<Comentario> {
        let comentarios = self.comentarios.read().unwrap_or_else(|envenenado| envenenado.into_inner());
        let mut del_articulo: Vec<Comentario> =
            comentarios.iter().rev().filter(|c| c.articulo_id == articulo_id).cloned().collect();
        del_articulo.sort_by(|a, b| b.fecha_creacion.cmp(&a.fecha_creacion));
        del_articulo
    }

    pub fn agregar_comentario(&self, articulo_id: &str, nombre: &str, comentario: &str) -> Comentario {
        let nuevo = Comentario {
            id: Uuid::new_v4().to_string(),
            articulo_id: articulo_id.to_string(),
            nombre: nombre.to_string(),
            comentario: comentario.to_string(),
            fecha_creacion: Utc::now(),
        };
        let mut comentarios = self.comentarios.write().unwrap_or_else(|envenenado| envenenado.into_inner());
        comentarios.push(nuevo.clone());
        nuevo
    }
}
