// src/categorias/categoria_structs.rs

use serde::{Deserialize, Serialize};

use crate::almacen::{ErrorAlmacen, Registro};

fn verdadero() -> bool {
    true
}

/// Estructura que representa una categoría del catálogo.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Categoria {
    pub id: String,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub imagen: String,
    #[serde(default = "verdadero")]
    pub activa: bool,
}

impl TryFrom<&Registro> for Categoria {
    type Error = ErrorAlmacen;

    fn try_from(registro: &Registro) -> Result<Self, Self::Error> {
        registro.a_tipo()
    }
}

/// Estructura para recibir los datos de una nueva categoría en el POST.
#[derive(Deserialize, Serialize)]
pub struct NuevaCategoria {
    #[serde(default)]
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activa: Option<bool>,
}

/// Actualización parcial (PUT): solo se envían al almacén los campos presentes.
#[derive(Deserialize, Serialize, Default)]
pub struct ActualizacionCategoria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activa: Option<bool>,
}

/// Filtro del listado: `?activa=true|false`.
#[derive(Deserialize)]
pub struct FiltroCategorias {
    pub activa: Option<bool>,
}
