// src/almacen/esquema.rs

use bigdecimal::BigDecimal;
use serde_json::{json, Map, Value};

use super::almacen_structs::Coleccion;
use crate::shared::decimal_json::desde_valor;
use crate::shared::utilidades::validar_email;

pub const ESTADOS_PEDIDO: &[&str] = &["pendiente", "procesando", "enviado", "entregado", "cancelado"];
pub const ROLES: &[&str] = &["cliente", "admin"];

#[derive(Debug, Clone, Copy)]
pub enum TipoCampo {
    Texto,
    Email,
    Numero { min: Option<i64>, max: Option<i64>, entero: bool },
    Booleano,
    Seleccion(&'static [&'static str]),
    /// Id de un registro de otra colección; la existencia la comprueba el almacén.
    Relacion(Coleccion),
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct Campo {
    pub nombre: &'static str,
    pub tipo: TipoCampo,
    pub requerido: bool,
}

const fn campo(nombre: &'static str, tipo: TipoCampo, requerido: bool) -> Campo {
    Campo { nombre, tipo, requerido }
}

const DECIMAL_POSITIVO: TipoCampo = TipoCampo::Numero { min: Some(0), max: None, entero: false };

#[derive(Debug, Clone, Copy)]
pub struct Esquema {
    pub campos: &'static [Campo],
    pub unicos: &'static [&'static str],
    /// Campos que se guardan pero nunca salen del almacén.
    pub ocultos: &'static [&'static str],
}

static CAMPOS_PRODUCTOS: [Campo; 10] = [
    campo("nombre", TipoCampo::Texto, true),
    campo("descripcion", TipoCampo::Texto, false),
    campo("precio", DECIMAL_POSITIVO, true),
    campo("precio_oferta", DECIMAL_POSITIVO, false),
    campo("stock", TipoCampo::Numero { min: Some(0), max: None, entero: true }, false),
    campo("categoria", TipoCampo::Relacion(Coleccion::Categorias), true),
    campo("imagen", TipoCampo::Texto, false),
    campo("unidad", TipoCampo::Texto, false),
    campo("destacado", TipoCampo::Booleano, false),
    campo("activo", TipoCampo::Booleano, false),
];

static CAMPOS_CATEGORIAS: [Campo; 4] = [
    campo("nombre", TipoCampo::Texto, true),
    campo("descripcion", TipoCampo::Texto, false),
    campo("imagen", TipoCampo::Texto, false),
    campo("activa", TipoCampo::Booleano, false),
];

static CAMPOS_PEDIDOS: [Campo; 11] = [
    campo("usuario", TipoCampo::Texto, true),
    campo("productos", TipoCampo::Json, true),
    campo("subtotal", DECIMAL_POSITIVO, false),
    campo("envio", DECIMAL_POSITIVO, false),
    campo("total", DECIMAL_POSITIVO, true),
    campo("estado", TipoCampo::Seleccion(ESTADOS_PEDIDO), false),
    campo("direccion_envio", TipoCampo::Json, false),
    campo("pago", TipoCampo::Texto, false),
    campo("referencia_pago", TipoCampo::Texto, false),
    campo("notas", TipoCampo::Texto, false),
    campo("ajuste_inventario", TipoCampo::Json, false),
];

static CAMPOS_USERS: [Campo; 11] = [
    campo("email", TipoCampo::Email, true),
    campo("nombre", TipoCampo::Texto, true),
    campo("apellido", TipoCampo::Texto, false),
    campo("telefono", TipoCampo::Texto, false),
    campo("direccion", TipoCampo::Texto, false),
    campo("ciudad", TipoCampo::Texto, false),
    campo("region", TipoCampo::Texto, false),
    campo("codigo_postal", TipoCampo::Texto, false),
    campo("rol", TipoCampo::Seleccion(ROLES), false),
    campo("activo", TipoCampo::Booleano, false),
    campo("password_hash", TipoCampo::Texto, true),
];

pub fn esquema_de(coleccion: Coleccion) -> Esquema {
    match coleccion {
        Coleccion::Productos => Esquema { campos: &CAMPOS_PRODUCTOS, unicos: &[], ocultos: &[] },
        Coleccion::Categorias => Esquema { campos: &CAMPOS_CATEGORIAS, unicos: &[], ocultos: &[] },
        Coleccion::Pedidos => Esquema { campos: &CAMPOS_PEDIDOS, unicos: &[], ocultos: &[] },
        Coleccion::Users => Esquema { campos: &CAMPOS_USERS, unicos: &["email"], ocultos: &["password_hash"] },
    }
}

/// Valores que toma un registro nuevo cuando el campo no viene informado.
pub fn valores_por_defecto(coleccion: Coleccion) -> Map<String, Value> {
    let valores = match coleccion {
        Coleccion::Productos => json!({ "stock": 0, "unidad": "kg", "destacado": false, "activo": true }),
        Coleccion::Categorias => json!({ "activa": true }),
        Coleccion::Pedidos => json!({ "estado": "pendiente", "notas": "" }),
        Coleccion::Users => json!({ "rol": "cliente", "activo": true }),
    };
    valores.as_object().cloned().unwrap_or_default()
}

impl Esquema {
    pub fn campo(&self, nombre: &str) -> Option<&Campo> {
        self.campos.iter().find(|c| c.nombre == nombre)
    }

    /// Descarta los campos que la colección no define.
    pub fn filtrar(&self, datos: Map<String, Value>) -> Map<String, Value> {
        datos.into_iter().filter(|(nombre, _)| self.campo(nombre).is_some()).collect()
    }

    /// Quita los campos ocultos antes de devolver un registro.
    pub fn ocultar(&self, datos: &mut Map<String, Value>) {
        for oculto in self.ocultos {
            datos.remove(*oculto);
        }
    }

    /// Valida tipos, obligatorios y rangos. Devuelve los errores por campo.
    pub fn validar(&self, datos: &Map<String, Value>) -> Map<String, Value> {
        let mut errores = Map::new();

        for campo in self.campos {
            let valor = match datos.get(campo.nombre) {
                None | Some(Value::Null) => {
                    if campo.requerido {
                        errores.insert(campo.nombre.into(), error_campo("validation_required", "Cannot be blank."));
                    }
                    continue;
                }
                Some(valor) => valor,
            };

            if let Some(error) = validar_valor(campo, valor) {
                errores.insert(campo.nombre.into(), error);
            }
        }

        errores
    }
}

pub fn error_campo(code: &str, message: &str) -> Value {
    json!({ "code": code, "message": message })
}

fn validar_valor(campo: &Campo, valor: &Value) -> Option<Value> {
    match campo.tipo {
        TipoCampo::Texto | TipoCampo::Relacion(_) => match valor.as_str() {
            None => Some(error_campo("validation_invalid_text", "Must be a string.")),
            Some(texto) if campo.requerido && texto.trim().is_empty() => {
                Some(error_campo("validation_required", "Cannot be blank."))
            }
            Some(_) => None,
        },
        TipoCampo::Email => match valor.as_str() {
            Some(texto) if validar_email(texto) => None,
            _ => Some(error_campo("validation_is_email", "Must be a valid email address.")),
        },
        TipoCampo::Numero { min, max, entero } => {
            let numero = match desde_valor(valor) {
                Some(numero) => numero,
                None => return Some(error_campo("validation_invalid_number", "Must be a number.")),
            };
            if entero && numero.with_scale(0) != numero {
                return Some(error_campo("validation_only_int_constraint", "Must be an integer."));
            }
            if let Some(min) = min {
                if numero < BigDecimal::from(min) {
                    return Some(error_campo("validation_min_number_constraint", &format!("Must be larger than {}.", min)));
                }
            }
            if let Some(max) = max {
                if numero > BigDecimal::from(max) {
                    return Some(error_campo("validation_max_number_constraint", &format!("Must be less than {}.", max)));
                }
            }
            None
        }
        TipoCampo::Booleano => {
            if valor.is_boolean() {
                None
            } else {
                Some(error_campo("validation_invalid_bool", "Must be a boolean."))
            }
        }
        TipoCampo::Seleccion(opciones) => match valor.as_str() {
            Some(texto) if opciones.contains(&texto) => None,
            _ => Some(error_campo("validation_invalid_value", "Invalid value.")),
        },
        TipoCampo::Json => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datos(valor: Value) -> Map<String, Value> {
        valor.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn producto_valido_no_tiene_errores() {
        let esquema = esquema_de(Coleccion::Productos);
        let producto = datos(json!({
            "nombre": "Tomates", "precio": "1590", "stock": 80, "categoria": "abc", "activo": true
        }));
        assert!(esquema.validar(&producto).is_empty());
    }

    #[test]
    fn detecta_obligatorios_rangos_y_tipos() {
        let esquema = esquema_de(Coleccion::Productos);
        let producto = datos(json!({ "nombre": " ", "precio": -1, "stock": 1.5, "activo": "si" }));
        let errores = esquema.validar(&producto);

        assert_eq!(errores["nombre"]["code"], "validation_required");
        assert_eq!(errores["precio"]["code"], "validation_min_number_constraint");
        assert_eq!(errores["stock"]["code"], "validation_only_int_constraint");
        assert_eq!(errores["activo"]["code"], "validation_invalid_bool");
        assert_eq!(errores["categoria"]["code"], "validation_required");
    }

    #[test]
    fn estado_de_pedido_debe_ser_conocido() {
        let esquema = esquema_de(Coleccion::Pedidos);
        let pedido = datos(json!({ "usuario": "u1", "productos": [], "total": 100, "estado": "perdido" }));
        assert_eq!(esquema.validar(&pedido)["estado"]["code"], "validation_invalid_value");
    }

    #[test]
    fn filtra_campos_desconocidos_y_oculta_hash() {
        let esquema = esquema_de(Coleccion::Users);
        let mut usuario = esquema.filtrar(datos(json!({
            "email": "a@b.cl", "nombre": "Ana", "password_hash": "x", "inventado": 1
        })));
        assert!(!usuario.contains_key("inventado"));
        esquema.ocultar(&mut usuario);
        assert!(!usuario.contains_key("password_hash"));
    }
}
