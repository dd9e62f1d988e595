// src/shared/decimal_json.rs

//! `BigDecimal` como número JSON. Por defecto `bigdecimal` serializa como texto;
//! la API y el almacén usan números.

use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

pub fn a_valor(valor: &BigDecimal) -> Value {
    if valor.is_integer() {
        if let Some(entero) = valor.to_i64() {
            return Value::Number(entero.into());
        }
    }
    valor
        .to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(valor.to_string()))
}

pub fn desde_valor(valor: &Value) -> Option<BigDecimal> {
    match valor {
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

pub fn serializar<S: Serializer>(valor: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
    a_valor(valor).serialize(serializer)
}

pub fn deserializar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigDecimal, D::Error> {
    let valor = Value::deserialize(deserializer)?;
    desde_valor(&valor).ok_or_else(|| D::Error::custom(format!("número inválido: {}", valor)))
}

pub mod opcional {
    use super::*;

    pub fn serializar<S: Serializer>(valor: &Option<BigDecimal>, serializer: S) -> Result<S::Ok, S::Error> {
        match valor {
            Some(valor) => serializer.serialize_some(&a_valor(valor)),
            None => serializer.serialize_none(),
        }
    }

    /// `null`, ausente, `0` o `""` cuentan como sin valor (así llegan los
    /// precios de oferta vacíos desde el formulario y desde el almacén).
    pub fn deserializar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<BigDecimal>, D::Error> {
        let valor = Option::<Value>::deserialize(deserializer)?;
        match valor {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(valor) => {
                let numero = desde_valor(&valor)
                    .ok_or_else(|| D::Error::custom(format!("número inválido: {}", valor)))?;
                Ok(if numero == BigDecimal::from(0) { None } else { Some(numero) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize, Deserialize)]
    struct Precio {
        #[serde(serialize_with = "serializar", deserialize_with = "deserializar")]
        precio: BigDecimal,
        #[serde(
            default,
            serialize_with = "opcional::serializar",
            deserialize_with = "opcional::deserializar"
        )]
        oferta: Option<BigDecimal>,
    }

    #[test]
    fn enteros_salen_como_enteros() {
        let precio: Precio = serde_json::from_value(json!({ "precio": "1990" })).unwrap();
        assert_eq!(serde_json::to_value(&precio).unwrap(), json!({ "precio": 1990, "oferta": null }));
    }

    #[test]
    fn oferta_cero_es_sin_oferta() {
        let precio: Precio = serde_json::from_value(json!({ "precio": 800.5, "oferta": 0 })).unwrap();
        assert!(precio.oferta.is_none());
        assert_eq!(precio.precio, BigDecimal::from_str("800.5").unwrap());
    }
}
