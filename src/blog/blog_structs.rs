// src/blog/blog_structs.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Articulo {
    pub id: String,
    pub titulo: String,
    pub extracto: String,
    pub imagen: String,
    pub fecha: String,
    pub autor: String,
    pub contenido: Vec<String>,
    pub activo: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comentario {
    pub id: String,
    pub articulo_id: String,
    pub nombre: String,
    pub comentario: String,
    pub fecha_creacion: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NuevoComentario {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub comentario: String,
}

/// Alta y edición de artículos. En la edición, lo que no viene se conserva.
/// `contenido` separa los párrafos con una línea en blanco.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct DatosArticulo {
    pub titulo: Option<String>,
    pub extracto: Option<String>,
    pub imagen: Option<String>,
    pub autor: Option<String>,
    pub contenido: Option<String>,
    pub activo: Option<bool>,
}

impl DatosArticulo {
    /// Primer campo obligatorio que viene en blanco. En un alta, ausente cuenta
    /// como en blanco.
    pub fn campo_en_blanco(&self, alta: bool) -> Option<&'static str> {
        let obligatorios = [
            (&self.titulo, "El título es obligatorio"),
            (&self.extracto, "El extracto es obligatorio"),
            (&self.contenido, "El contenido es obligatorio"),
        ];
        obligatorios.iter().find_map(|(valor, mensaje)| match valor {
            Some(valor) if valor.trim().is_empty() => Some(*mensaje),
            None if alta => Some(*mensaje),
            _ => None,
        })
    }
}

pub fn parrafos(contenido: &str) -> Vec<String> {
    contenido
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
