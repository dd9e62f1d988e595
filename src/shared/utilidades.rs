// src/shared/utilidades.rs

use bigdecimal::{BigDecimal, ToPrimitive};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

static REGEX_EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

// Móviles chilenos: +569XXXXXXXX (con código de país) o 9XXXXXXXX (sin código)
static REGEX_TELEFONO_CON_CODIGO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+569\d{8}$").unwrap());
static REGEX_TELEFONO_SIN_CODIGO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^9\d{8}$").unwrap());

/// Alfabeto de los ids de registro (15 caracteres, `[a-z0-9]`).
const ALFABETO_ID: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
pub const LARGO_ID: usize = 15;

pub const REGIONES_CHILE: [&str; 16] = [
    "Arica y Parinacota",
    "Tarapacá",
    "Antofagasta",
    "Atacama",
    "Coquimbo",
    "Valparaíso",
    "Metropolitana de Santiago",
    "Libertador General Bernardo O'Higgins",
    "Maule",
    "Ñuble",
    "Biobío",
    "La Araucanía",
    "Los Ríos",
    "Los Lagos",
    "Aysén del General Carlos Ibáñez del Campo",
    "Magallanes y de la Antártica Chilena",
];

/// Redondea al entero más cercano; los empates van hacia +infinito.
fn redondear_entero(valor: &BigDecimal) -> i64 {
    let desplazado = valor.clone() + BigDecimal::new(5.into(), 1);
    let truncado = desplazado.with_scale(0);
    // with_scale trunca hacia cero, así que los negativos necesitan un ajuste para obtener el piso
    let piso = if truncado > desplazado {
        truncado - BigDecimal::from(1)
    } else {
        truncado
    };
    piso.to_i64().unwrap_or_default()
}

/// Formatea un precio en pesos chilenos: `$1.000`, `$1.234,5`, `$0`, `$-500`.
/// Hasta tres decimales, sin ceros a la derecha.
pub fn formatear_precio(precio: &BigDecimal) -> String {
    let milesimas = (precio.abs() * BigDecimal::from(1000) + BigDecimal::new(5.into(), 1))
        .with_scale(0)
        .to_u64()
        .unwrap_or_default();
    let digitos = (milesimas / 1000).to_string();

    let mut agrupado = String::with_capacity(digitos.len() + digitos.len() / 3);
    for (i, c) in digitos.chars().enumerate() {
        if i > 0 && (digitos.len() - i) % 3 == 0 {
            agrupado.push('.');
        }
        agrupado.push(c);
    }

    let fraccion = milesimas % 1000;
    if fraccion > 0 {
        agrupado.push(',');
        agrupado.push_str(format!("{:03}", fraccion).trim_end_matches('0'));
    }

    let signo = if *precio < BigDecimal::from(0) && milesimas > 0 { "-" } else { "" };
    format!("${}{}", signo, agrupado)
}

/// Porcentaje de descuento entre el precio normal y el de oferta, redondeado.
/// Es negativo cuando la "oferta" es más cara que el precio original.
pub fn calcular_descuento(precio: &BigDecimal, precio_oferta: &BigDecimal) -> i64 {
    if *precio == BigDecimal::from(0) {
        return 0;
    }
    let porcentaje = (precio - precio_oferta) * BigDecimal::from(100) / precio;
    redondear_entero(&porcentaje)
}

pub fn validar_email(email: &str) -> bool {
    REGEX_EMAIL.is_match(email)
}

pub fn validar_password(password: &str) -> bool {
    password.chars().count() >= 6
}

fn limpiar_telefono(telefono: &str) -> String {
    telefono.chars().filter(|c| !c.is_whitespace() && *c != '-').collect()
}

pub fn validar_telefono_chileno(telefono: &str) -> bool {
    let limpio = limpiar_telefono(telefono);
    REGEX_TELEFONO_CON_CODIGO.is_match(&limpio) || REGEX_TELEFONO_SIN_CODIGO.is_match(&limpio)
}

/// Normaliza un móvil chileno a `+56 9 1234 5678`. Si no se reconoce el formato
/// se devuelve tal cual.
pub fn formatear_telefono_chileno(telefono: &str) -> String {
    let numeros: String = telefono.chars().filter(|c| c.is_ascii_digit()).collect();

    if numeros.len() == 11 && numeros.starts_with("56") {
        return format!("+56 {} {} {}", &numeros[2..3], &numeros[3..7], &numeros[7..]);
    }

    if numeros.len() == 9 && numeros.starts_with('9') {
        return format!("+56 {} {} {}", &numeros[0..1], &numeros[1..5], &numeros[5..]);
    }

    telefono.to_string()
}

/// Genera un id de registro de 15 caracteres alfanuméricos en minúscula.
pub fn generar_id() -> String {
    let mut rng = rand::thread_rng();
    (0..LARGO_ID)
        .map(|_| ALFABETO_ID[rng.gen_range(0..ALFABETO_ID.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(valor: i64) -> BigDecimal {
        BigDecimal::from(valor)
    }

    #[test]
    fn formatea_precios_con_separador_de_miles() {
        assert_eq!(formatear_precio(&dec(1000)), "$1.000");
        assert_eq!(formatear_precio(&dec(10000)), "$10.000");
        assert_eq!(formatear_precio(&dec(1234567)), "$1.234.567");
        assert_eq!(formatear_precio(&dec(999)), "$999");
    }

    #[test]
    fn formatea_cero_y_negativos() {
        assert_eq!(formatear_precio(&dec(0)), "$0");
        assert_eq!(formatear_precio(&dec(-500)), "$-500");
        assert_eq!(formatear_precio(&dec(-1500)), "$-1.500");
    }

    #[test]
    fn conserva_hasta_tres_decimales() {
        let precio = |texto: &str| BigDecimal::from_str(texto).unwrap();
        assert_eq!(formatear_precio(&precio("1234.5")), "$1.234,5");
        assert_eq!(formatear_precio(&precio("10.10")), "$10,1");
        assert_eq!(formatear_precio(&precio("0.125")), "$0,125");
        assert_eq!(formatear_precio(&precio("1234.5678")), "$1.234,568");
        assert_eq!(formatear_precio(&precio("-2500.25")), "$-2.500,25");
        assert_eq!(formatear_precio(&precio("999.9999")), "$1.000");
    }

    #[test]
    fn calcula_descuentos_redondeados() {
        assert_eq!(calcular_descuento(&dec(1000), &dec(800)), 20);
        assert_eq!(calcular_descuento(&dec(2000), &dec(1000)), 50);
        assert_eq!(calcular_descuento(&dec(1000), &dec(1000)), 0);
        assert_eq!(calcular_descuento(&dec(1000), &dec(667)), 33);
    }

    #[test]
    fn descuento_negativo_cuando_la_oferta_es_mas_cara() {
        assert_eq!(calcular_descuento(&dec(1000), &dec(1200)), -20);
        assert_eq!(calcular_descuento(&dec(0), &dec(100)), 0);
    }

    #[test]
    fn valida_telefonos_moviles_chilenos() {
        assert!(validar_telefono_chileno("912345678"));
        assert!(validar_telefono_chileno("+56912345678"));
        assert!(validar_telefono_chileno("+56 9 1234 5678"));
        assert!(validar_telefono_chileno("9-1234-5678"));

        assert!(!validar_telefono_chileno("56912345678"));
        assert!(!validar_telefono_chileno("812345678"));
        assert!(!validar_telefono_chileno("91234567"));
        assert!(!validar_telefono_chileno("+5691234567a"));
    }

    #[test]
    fn formatea_telefonos() {
        assert_eq!(formatear_telefono_chileno("912345678"), "+56 9 1234 5678");
        assert_eq!(formatear_telefono_chileno("+56912345678"), "+56 9 1234 5678");
        assert_eq!(formatear_telefono_chileno("12345"), "12345");
    }

    #[test]
    fn valida_email_y_password() {
        assert!(validar_email("cliente@gmail.cl"));
        assert!(!validar_email("cliente@gmail"));
        assert!(!validar_email("cliente gmail.cl"));
        assert!(validar_password("secreto"));
        assert!(!validar_password("corta"));
    }

    #[test]
    fn genera_ids_unicos_con_formato_de_registro() {
        let id1 = generar_id();
        let id2 = generar_id();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), LARGO_ID);
        assert!(id1.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
