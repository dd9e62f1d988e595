// src/ordenes/ordenes_structs.rs

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::almacen::{ErrorAlmacen, Registro};
use crate::shared::decimal_json;
use crate::shared::utilidades::LARGO_ID;

pub const NOMBRE_PRODUCTO_FALTANTE: &str = "Producto no encontrado";
pub const IMAGEN_PLACEHOLDER: &str = "/placeholder.svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstadoOrden {
    #[default]
    Pendiente,
    Procesando,
    Enviado,
    Entregado,
    Cancelado,
}

impl EstadoOrden {
    pub fn como_str(&self) -> &'static str {
        match self {
            EstadoOrden::Pendiente => "pendiente",
            EstadoOrden::Procesando => "procesando",
            EstadoOrden::Enviado => "enviado",
            EstadoOrden::Entregado => "entregado",
            EstadoOrden::Cancelado => "cancelado",
        }
    }
}

/// Línea de una orden, con la foto del producto al momento de la compra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOrden {
    pub producto_id: String,
    #[serde(default = "una_unidad")]
    pub cantidad: i64,
    #[serde(
        default = "cero",
        serialize_with = "decimal_json::serializar",
        deserialize_with = "decimal_json::deserializar"
    )]
    pub precio: BigDecimal,
    #[serde(default)]
    pub nombre_producto: String,
    #[serde(default)]
    pub imagen_producto: String,
    #[serde(default)]
    pub unidad_producto: String,
}

fn una_unidad() -> i64 {
    1
}

fn cero() -> BigDecimal {
    BigDecimal::from(0)
}

impl ItemOrden {
    /// Solo el id: así quedan algunos pedidos antiguos.
    pub fn solo_id(producto_id: &str) -> Self {
        ItemOrden {
            producto_id: producto_id.to_string(),
            cantidad: 1,
            precio: cero(),
            nombre_producto: String::new(),
            imagen_producto: String::new(),
            unidad_producto: String::new(),
        }
    }

    pub fn necesita_hidratar(&self) -> bool {
        self.nombre_producto.is_empty()
            || self.imagen_producto.is_empty()
            || self.nombre_producto == NOMBRE_PRODUCTO_FALTANTE
    }

    pub fn subtotal(&self) -> BigDecimal {
        &self.precio * BigDecimal::from(self.cantidad)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DireccionEnvio {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub direccion: String,
    pub ciudad: String,
    pub region: String,
    pub codigo_postal: String,
    pub telefono: String,
}

/// Una línea de stock por descontar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineaAjuste {
    pub producto_id: String,
    pub cantidad: i64,
    #[serde(default)]
    pub intentos: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ultimo_error: Option<String>,
}

/// Quién está aplicando un marcador y desde cuándo. Pasado `VIGENCIA_RECLAMO_SEGS`
/// el reclamo se considera abandonado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReclamoAjuste {
    pub token: String,
    pub desde: DateTime<Utc>,
}

pub const VIGENCIA_RECLAMO_SEGS: i64 = 300;

impl ReclamoAjuste {
    pub fn nuevo() -> Self {
        Self { token: Uuid::new_v4().simple().to_string(), desde: Utc::now() }
    }

    pub fn vigente(&self, ahora: DateTime<Utc>) -> bool {
        ahora - self.desde < Duration::seconds(VIGENCIA_RECLAMO_SEGS)
    }
}

/// Marcador de ajuste de inventario que viaja dentro del pedido. Mientras tenga
/// líneas, el stock de esas líneas no se ha descontado.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AjusteInventario {
    pub pendientes: Vec<LineaAjuste>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reclamo: Option<ReclamoAjuste>,
}

impl AjusteInventario {
    pub fn para_items(items: &[ItemOrden]) -> Self {
        let pendientes = items
            .iter()
            .filter(|item| item.cantidad > 0)
            .map(|item| LineaAjuste {
                producto_id: item.producto_id.clone(),
                cantidad: item.cantidad,
                intentos: 0,
                ultimo_error: None,
            })
            .collect();
        AjusteInventario { pendientes, reclamo: None }
    }

    pub fn resuelto(&self) -> bool {
        self.pendientes.is_empty()
    }

    /// Reclamado por otro proceso y todavía vigente.
    pub fn reclamado_por_otro(&self, token: Option<&str>, ahora: DateTime<Utc>) -> bool {
        match &self.reclamo {
            Some(reclamo) => Some(reclamo.token.as_str()) != token && reclamo.vigente(ahora),
            None => false,
        }
    }

    /// Lee el campo `ajuste_inventario` de un pedido. Nulo o ilegible cuenta
    /// como sin ajuste.
    pub fn desde_valor(valor: Option<&Value>) -> Option<Self> {
        match valor {
            None | Some(Value::Null) => None,
            Some(valor) => match serde_json::from_value::<AjusteInventario>(valor.clone()) {
                Ok(ajuste) => Some(ajuste),
                Err(e) => {
                    warn!(error = %e, "Marcador de ajuste de inventario ilegible");
                    None
                }
            },
        }
    }
}

/// Orden tal como la entrega la API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Orden {
    pub id: String,
    pub usuario_id: String,
    pub items: Vec<ItemOrden>,
    #[serde(serialize_with = "decimal_json::serializar")]
    pub subtotal: BigDecimal,
    #[serde(serialize_with = "decimal_json::serializar")]
    pub envio: BigDecimal,
    #[serde(serialize_with = "decimal_json::serializar")]
    pub total: BigDecimal,
    pub estado: EstadoOrden,
    pub direccion_envio: DireccionEnvio,
    pub metodo_pago: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub referencia_pago: String,
    pub notas: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ajuste_inventario: Option<AjusteInventario>,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
}

impl Orden {
    pub fn ajuste_pendiente(&self) -> bool {
        self.ajuste_inventario.as_ref().map_or(false, |a| !a.resuelto())
    }
}

/// Lee las líneas guardadas en `productos`: texto JSON, arreglo, objeto suelto o
/// un id de producto sin más.
pub fn parsear_items(valor: Option<&Value>) -> Vec<ItemOrden> {
    let elementos: Vec<Value> = match valor {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(texto)) => match serde_json::from_str::<Value>(texto) {
            Ok(Value::Array(elementos)) => elementos,
            Ok(Value::Object(objeto)) => vec![Value::Object(objeto)],
            Ok(_) => Vec::new(),
            Err(_) if texto.len() == LARGO_ID => vec![Value::String(texto.clone())],
            Err(_) => Vec::new(),
        },
        Some(Value::Array(elementos)) => elementos.clone(),
        Some(objeto @ Value::Object(_)) => vec![objeto.clone()],
        Some(_) => Vec::new(),
    };

    elementos
        .into_iter()
        .filter_map(|elemento| match elemento {
            Value::String(id) => Some(ItemOrden::solo_id(&id)),
            objeto @ Value::Object(_) => match serde_json::from_value::<ItemOrden>(objeto) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(error = %e, "Línea de pedido ilegible, se omite");
                    None
                }
            },
            _ => None,
        })
        .collect()
}

/// `direccion_envio` puede venir como objeto o como texto JSON.
pub fn parsear_direccion(valor: Option<&Value>) -> DireccionEnvio {
    let objeto = match valor {
        Some(Value::String(texto)) => serde_json::from_str::<Value>(texto).unwrap_or(Value::Null),
        Some(valor) => valor.clone(),
        None => Value::Null,
    };
    match objeto {
        Value::Object(_) => serde_json::from_value(objeto).unwrap_or_else(|e| {
            warn!(error = %e, "Dirección de envío ilegible");
            DireccionEnvio::default()
        }),
        _ => DireccionEnvio::default(),
    }
}

fn decimal(registro: &Registro, campo: &str) -> Option<BigDecimal> {
    registro.datos.get(campo).and_then(decimal_json::desde_valor)
}

impl TryFrom<&Registro> for Orden {
    type Error = ErrorAlmacen;

    fn try_from(registro: &Registro) -> Result<Self, Self::Error> {
        let total = decimal(registro, "total").unwrap_or_else(cero);
        let estado = match registro.datos.get("estado") {
            Some(Value::String(estado)) if !estado.is_empty() => serde_json::from_value(Value::String(estado.clone()))
                .map_err(|_| ErrorAlmacen::interno(format!("Pedido {} con estado desconocido: {}", registro.id, estado)))?,
            _ => EstadoOrden::Pendiente,
        };

        Ok(Orden {
            id: registro.id.clone(),
            usuario_id: registro.texto("usuario").unwrap_or_default().to_string(),
            items: parsear_items(registro.datos.get("productos")),
            subtotal: decimal(registro, "subtotal").unwrap_or_else(|| total.clone()),
            envio: decimal(registro, "envio").unwrap_or_else(cero),
            total,
            estado,
            direccion_envio: parsear_direccion(registro.datos.get("direccion_envio")),
            metodo_pago: registro.texto("pago").unwrap_or_default().to_string(),
            referencia_pago: registro.texto("referencia_pago").unwrap_or_default().to_string(),
            notas: registro.texto("notas").unwrap_or_default().to_string(),
            ajuste_inventario: AjusteInventario::desde_valor(registro.datos.get("ajuste_inventario")),
            fecha_creacion: registro.created,
            fecha_actualizacion: registro.updated,
        })
    }
}

/// Campos de un pedido nuevo, con los nombres de la colección `pedidos`.
#[derive(Debug, Serialize)]
pub struct PedidoRecord {
    pub usuario: String,
    pub productos: Vec<ItemOrden>,
    #[serde(serialize_with = "decimal_json::serializar")]
    pub subtotal: BigDecimal,
    #[serde(serialize_with = "decimal_json::serializar")]
    pub envio: BigDecimal,
    #[serde(serialize_with = "decimal_json::serializar")]
    pub total: BigDecimal,
    pub estado: EstadoOrden,
    pub direccion_envio: DireccionEnvio,
    pub pago: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referencia_pago: Option<String>,
    pub notas: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ajuste_inventario: Option<AjusteInventario>,
}

/// `POST /api/ordenes`: alta directa, sin pago ni ajuste de inventario.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NuevaOrden {
    #[serde(default)]
    pub usuario_id: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemOrden>,
    #[serde(default, deserialize_with = "decimal_json::opcional::deserializar")]
    pub subtotal: Option<BigDecimal>,
    #[serde(default, deserialize_with = "decimal_json::opcional::deserializar")]
    pub envio: Option<BigDecimal>,
    #[serde(default, deserialize_with = "decimal_json::opcional::deserializar")]
    pub total: Option<BigDecimal>,
    #[serde(default)]
    pub direccion_envio: DireccionEnvio,
    #[serde(default)]
    pub metodo_pago: String,
    #[serde(default)]
    pub notas: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ActualizacionEstado {
    pub estado: EstadoOrden,
}
