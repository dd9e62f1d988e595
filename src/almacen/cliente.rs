// src/almacen/cliente.rs

use std::sync::Arc;

use chrono::Utc;
use futures::lock::{Mutex, MutexGuard};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::almacen_error::ErrorAlmacen;
use super::almacen_structs::{ActualizacionDegradada, AuthData, Coleccion, ConsultaLista, Credencial, Registro, Rol, Sesion};
use super::auth::{emitir_token, hash_password, validar_token, verificar_password};
use super::backend::BackendRegistros;
use super::esquema::{error_campo, esquema_de, valores_por_defecto, TipoCampo};
use super::reglas::{reglas_de, Regla};
use crate::shared::utilidades::{generar_id, validar_password, LARGO_ID};

/// Campos que gestiona el propio almacén y que nunca se aceptan desde fuera.
const CAMPOS_SISTEMA: [&str; 4] = ["id", "created", "updated", "password_hash"];

/// Cliente del almacén de registros: colecciones con reglas de acceso, esquema y
/// autenticación por contraseña, sobre un `BackendRegistros` intercambiable.
///
/// Es barato de clonar; cada solicitud lo usa con su propia `Credencial`.
#[derive(Clone)]
pub struct AlmacenRegistros {
    backend: Arc<dyn BackendRegistros>,
    secreto_jwt: Arc<str>,
    costo_bcrypt: u32,
    // Compartido entre clones: una sola aplicación de ajustes de inventario a la vez.
    cerrojo_ajustes: Arc<Mutex<()>>,
}

impl AlmacenRegistros {
    pub fn new(backend: Arc<dyn BackendRegistros>, secreto_jwt: &str, costo_bcrypt: u32) -> Self {
        Self {
            backend,
            secreto_jwt: Arc::from(secreto_jwt),
            costo_bcrypt,
            cerrojo_ajustes: Arc::new(Mutex::new(())),
        }
    }

    /// Sección crítica para leer y aplicar marcadores de ajuste de inventario.
    pub async fn cerrojo_ajustes(&self) -> MutexGuard<'_, ()> {
        self.cerrojo_ajustes.lock().await
    }

    fn publicar(&self, coleccion: Coleccion, mut registro: Registro) -> Registro {
        esquema_de(coleccion).ocultar(&mut registro.datos);
        registro
    }

    /// Lista completa, aplicando la regla de listado registro a registro.
    pub async fn get_full_list(
        &self,
        credencial: &Credencial,
        coleccion: Coleccion,
        consulta: &ConsultaLista,
    ) -> Result<Vec<Registro>, ErrorAlmacen> {
        let reglas = reglas_de(coleccion);
        if reglas.listar == Regla::SoloAdmin && !credencial.es_admin() {
            return Err(ErrorAlmacen::prohibido("Only admins can perform this action."));
        }

        let mut registros: Vec<Registro> = self
            .backend
            .listar(coleccion)
            .await?
            .into_iter()
            .filter(|r| reglas.listar.permite(credencial, &r.id, &r.datos))
            .filter(|r| consulta.coincide(r))
            .collect();

        if consulta.recientes_primero {
            registros.sort_by(|a, b| b.created.cmp(&a.created));
        }

        debug!(coleccion = %coleccion, total = registros.len(), "getFullList");
        Ok(registros.into_iter().map(|r| self.publicar(coleccion, r)).collect())
    }

    pub async fn get_one(&self, credencial: &Credencial, coleccion: Coleccion, id: &str) -> Result<Registro, ErrorAlmacen> {
        let registro = self.backend.obtener(coleccion, id).await?.ok_or_else(ErrorAlmacen::no_encontrado)?;

        if !reglas_de(coleccion).ver.permite(credencial, &registro.id, &registro.datos) {
            return Err(ErrorAlmacen::prohibido("You are not allowed to perform this request."));
        }
        Ok(self.publicar(coleccion, registro))
    }

    pub async fn create(
        &self,
        credencial: &Credencial,
        coleccion: Coleccion,
        mut datos: Map<String, Value>,
    ) -> Result<Registro, ErrorAlmacen> {
        let id = match datos.remove("id") {
            Some(Value::String(id)) if es_id_valido(&id) => id,
            _ => generar_id(),
        };
        for campo in CAMPOS_SISTEMA {
            datos.remove(campo);
        }
        if coleccion == Coleccion::Users {
            normalizar_email(&mut datos);
            self.preparar_password(&mut datos, true)?;
        }

        let esquema = esquema_de(coleccion);
        let mut completos = valores_por_defecto(coleccion);
        completos.extend(esquema.filtrar(datos));

        if !reglas_de(coleccion).crear.permite(credencial, &id, &completos) {
            return Err(ErrorAlmacen::prohibido(format!(
                "No tienes permiso para crear registros en '{}'.",
                coleccion
            )));
        }
        comprobar_campos_admin(credencial, coleccion, None, &completos)?;
        self.validar(coleccion, &id, &completos, None, "Failed to create record.").await?;

        let registro = Registro::nuevo(id, completos);
        self.backend.insertar(coleccion, registro.clone()).await?;
        debug!(coleccion = %coleccion, id = %registro.id, "create");
        Ok(self.publicar(coleccion, registro))
    }

    /// Actualización parcial: los campos de `cambios` se mezclan sobre el registro.
    pub async fn update(
        &self,
        credencial: &Credencial,
        coleccion: Coleccion,
        id: &str,
        mut cambios: Map<String, Value>,
    ) -> Result<Registro, ErrorAlmacen> {
        let existente = self.backend.obtener(coleccion, id).await?.ok_or_else(ErrorAlmacen::no_encontrado)?;

        if !reglas_de(coleccion).actualizar.permite(credencial, &existente.id, &existente.datos) {
            return Err(ErrorAlmacen::prohibido(format!(
                "No tienes permiso para actualizar registros en '{}'.",
                coleccion
            )));
        }

        for campo in CAMPOS_SISTEMA {
            cambios.remove(campo);
        }
        if coleccion == Coleccion::Users {
            normalizar_email(&mut cambios);
            self.preparar_password(&mut cambios, false)?;
        }
        let cambios = esquema_de(coleccion).filtrar(cambios);
        comprobar_campos_admin(credencial, coleccion, Some(&existente.datos), &cambios)?;

        let mut datos = existente.datos.clone();
        datos.extend(cambios.clone());
        self.validar(coleccion, id, &datos, Some(&cambios), "Failed to update record.").await?;

        let registro = Registro { id: existente.id, created: existente.created, updated: Utc::now(), datos };
        self.backend.reemplazar(coleccion, registro.clone()).await?;
        debug!(coleccion = %coleccion, id = %registro.id, "update");
        Ok(self.publicar(coleccion, registro))
    }

    pub async fn delete(&self, credencial: &Credencial, coleccion: Coleccion, id: &str) -> Result<(), ErrorAlmacen> {
        let existente = self.backend.obtener(coleccion, id).await?.ok_or_else(ErrorAlmacen::no_encontrado)?;

        if !reglas_de(coleccion).eliminar.permite(credencial, &existente.id, &existente.datos) {
            return Err(ErrorAlmacen::prohibido(format!(
                "No tienes permiso para eliminar registros en '{}'.",
                coleccion
            )));
        }
        self.backend.eliminar(coleccion, id).await?;
        debug!(coleccion = %coleccion, id, "delete");
        Ok(())
    }

    /// Actualización en dos fases. Si el almacén rechaza la actualización completa
    /// por campos concretos (400/403 con `data` por campo) y todos ellos están en
    /// `degradables`, se reintenta sin esos campos y se informa cuáles se omitieron.
    pub async fn actualizar_con_degradacion(
        &self,
        credencial: &Credencial,
        coleccion: Coleccion,
        id: &str,
        cambios: Map<String, Value>,
        degradables: &[&str],
    ) -> Result<ActualizacionDegradada, ErrorAlmacen> {
        let error = match self.update(credencial, coleccion, id, cambios.clone()).await {
            Ok(registro) => return Ok(ActualizacionDegradada { registro, campos_omitidos: Vec::new() }),
            Err(error) => error,
        };

        if !matches!(error.status, 400 | 403) {
            return Err(error);
        }
        let rechazados = error.campos_rechazados();
        let degradable = !rechazados.is_empty()
            && rechazados.iter().all(|c| degradables.contains(&c.as_str()) && cambios.contains_key(c));
        if !degradable {
            return Err(error);
        }

        let mut reducidos = cambios;
        for campo in &rechazados {
            reducidos.remove(campo);
        }
        if reducidos.is_empty() {
            return Err(error);
        }

        warn!(
            coleccion = %coleccion,
            id,
            campos = ?rechazados,
            motivo = %error,
            "Actualización rechazada por campo; se reintenta sin esos campos"
        );
        match self.update(credencial, coleccion, id, reducidos).await {
            Ok(registro) => Ok(ActualizacionDegradada { registro, campos_omitidos: rechazados }),
            Err(reintento) => {
                warn!(coleccion = %coleccion, id, error = %reintento, "El reintento sin campos degradables también falló");
                Err(error)
            }
        }
    }

    /// Autenticación por email y contraseña contra la colección `users`.
    pub async fn auth_with_password(&self, email: &str, password: &str) -> Result<AuthData, ErrorAlmacen> {
        let fallo = || ErrorAlmacen::new(400, "Failed to authenticate.", json!({}));
        let email = email.trim().to_lowercase();

        let registro = self
            .backend
            .listar(Coleccion::Users)
            .await?
            .into_iter()
            .find(|r| r.texto("email") == Some(email.as_str()))
            .ok_or_else(fallo)?;

        if !verificar_password(password, registro.texto("password_hash").unwrap_or_default()) {
            return Err(fallo());
        }
        if registro.datos.get("activo") == Some(&Value::Bool(false)) {
            return Err(fallo());
        }
        self.emitir_auth(registro)
    }

    /// Valida un token y emite uno nuevo con los datos actuales del usuario.
    pub async fn auth_refresh(&self, token: &str) -> Result<AuthData, ErrorAlmacen> {
        let claims = validar_token(&self.secreto_jwt, token)?;
        let registro = self
            .backend
            .obtener(Coleccion::Users, &claims.sub)
            .await?
            .ok_or_else(|| ErrorAlmacen::no_autenticado("El usuario de la sesión ya no existe."))?;

        if registro.datos.get("activo") == Some(&Value::Bool(false)) {
            return Err(ErrorAlmacen::no_autenticado("La cuenta está desactivada."));
        }
        self.emitir_auth(registro)
    }

    fn emitir_auth(&self, registro: Registro) -> Result<AuthData, ErrorAlmacen> {
        let token = emitir_token(&self.secreto_jwt, &registro.id, registro.texto("email").unwrap_or_default(), rol_de(&registro))?;
        Ok(AuthData { token, registro: self.publicar(Coleccion::Users, registro) })
    }

    fn preparar_password(&self, datos: &mut Map<String, Value>, obligatoria: bool) -> Result<(), ErrorAlmacen> {
        let password = datos.remove("password");
        let confirmacion = datos.remove("passwordConfirm");

        let password = match password {
            Some(Value::String(password)) => password,
            None | Some(Value::Null) if !obligatoria => return Ok(()),
            _ => return Err(error_de_campo("password", "validation_required", "Cannot be blank.")),
        };
        if !validar_password(&password) {
            return Err(error_de_campo("password", "validation_length_out_of_range", "Must be at least 6 characters."));
        }
        if confirmacion.as_ref().and_then(Value::as_str) != Some(password.as_str()) {
            return Err(error_de_campo("passwordConfirm", "validation_values_mismatch", "Values don't match."));
        }

        datos.insert("password_hash".into(), Value::String(hash_password(&password, self.costo_bcrypt)?));
        Ok(())
    }

    /// Esquema, relaciones y unicidad. En una actualización solo se comprueban las
    /// relaciones de los campos que cambian.
    async fn validar(
        &self,
        coleccion: Coleccion,
        id: &str,
        datos: &Map<String, Value>,
        cambios: Option<&Map<String, Value>>,
        mensaje: &str,
    ) -> Result<(), ErrorAlmacen> {
        let esquema = esquema_de(coleccion);
        let mut errores = esquema.validar(datos);

        for campo in esquema.campos {
            let TipoCampo::Relacion(destino) = campo.tipo else { continue };
            if errores.contains_key(campo.nombre) || cambios.map_or(false, |c| !c.contains_key(campo.nombre)) {
                continue;
            }
            if let Some(referencia) = datos.get(campo.nombre).and_then(Value::as_str) {
                if self.backend.obtener(destino, referencia).await?.is_none() {
                    errores.insert(
                        campo.nombre.into(),
                        error_campo(
                            "validation_missing_rel_records",
                            "Failed to find all relation records with the provided ids.",
                        ),
                    );
                }
            }
        }

        for unico in esquema.unicos {
            if let Some(valor) = datos.get(*unico) {
                let existentes = self.backend.listar(coleccion).await?;
                if existentes.iter().any(|r| r.id != id && r.datos.get(*unico) == Some(valor)) {
                    errores.insert((*unico).into(), error_campo("validation_not_unique", "Value must be unique."));
                }
            }
        }

        if errores.is_empty() {
            Ok(())
        } else {
            Err(ErrorAlmacen::validacion(mensaje, errores))
        }
    }
}

impl AuthData {
    pub fn en_sesion(self) -> Sesion {
        let rol = rol_de(&self.registro);
        Sesion {
            usuario_id: self.registro.id.clone(),
            email: self.registro.texto("email").unwrap_or_default().to_string(),
            rol,
            token: self.token,
            registro: self.registro,
        }
    }
}

fn rol_de(registro: &Registro) -> Rol {
    match registro.texto("rol") {
        Some("admin") => Rol::Admin,
        _ => Rol::Cliente,
    }
}

fn es_id_valido(id: &str) -> bool {
    id.len() == LARGO_ID && id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

fn normalizar_email(datos: &mut Map<String, Value>) {
    if let Some(Value::String(email)) = datos.get_mut("email") {
        *email = email.trim().to_lowercase();
    }
}

fn error_de_campo(campo: &str, code: &str, message: &str) -> ErrorAlmacen {
    let mut campos = Map::new();
    campos.insert(campo.into(), error_campo(code, message));
    ErrorAlmacen::validacion("Failed to save record.", campos)
}

/// Un no administrador no puede fijar ni cambiar los campos reservados.
fn comprobar_campos_admin(
    credencial: &Credencial,
    coleccion: Coleccion,
    anterior: Option<&Map<String, Value>>,
    nuevos: &Map<String, Value>,
) -> Result<(), ErrorAlmacen> {
    if credencial.es_admin() {
        return Ok(());
    }
    let defectos = valores_por_defecto(coleccion);
    for campo in reglas_de(coleccion).campos_admin {
        let referencia = match anterior {
            Some(anterior) => anterior.get(*campo),
            None => defectos.get(*campo),
        };
        if let Some(valor) = nuevos.get(*campo) {
            if Some(valor) != referencia {
                return Err(ErrorAlmacen::prohibido_en_campo(
                    campo,
                    "Solo un administrador puede modificar este campo.",
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::almacen::backend::BackendMemoria;

    fn almacen() -> AlmacenRegistros {
        AlmacenRegistros::new(Arc::new(BackendMemoria::new()), "secreto-de-pruebas", 4)
    }

    fn campos(valor: Value) -> Map<String, Value> {
        valor.as_object().cloned().unwrap_or_default()
    }

    async fn crear_categoria(almacen: &AlmacenRegistros, nombre: &str) -> Registro {
        almacen
            .create(&Credencial::Sistema, Coleccion::Categorias, campos(json!({ "nombre": nombre })))
            .await
            .unwrap()
    }

    async fn crear_cliente(almacen: &AlmacenRegistros, email: &str) -> Sesion {
        almacen
            .create(
                &Credencial::Anonima,
                Coleccion::Users,
                campos(json!({ "email": email, "nombre": "Ana", "password": "secreto1", "passwordConfirm": "secreto1" })),
            )
            .await
            .unwrap();
        almacen.auth_with_password(email, "secreto1").await.unwrap().en_sesion()
    }

    #[actix_web::test]
    async fn crea_con_valores_por_defecto_y_valida_relaciones() {
        let almacen = almacen();
        let categoria = crear_categoria(&almacen, "Frutas").await;

        let producto = almacen
            .create(
                &Credencial::Sistema,
                Coleccion::Productos,
                campos(json!({ "nombre": "Manzanas", "precio": 1990, "categoria": categoria.id, "extra": 1 })),
            )
            .await
            .unwrap();
        assert_eq!(producto.datos["activo"], json!(true));
        assert_eq!(producto.datos["stock"], json!(0));
        assert!(!producto.datos.contains_key("extra"));

        let error = almacen
            .create(
                &Credencial::Sistema,
                Coleccion::Productos,
                campos(json!({ "nombre": "Peras", "precio": 1990, "categoria": "noexiste" })),
            )
            .await
            .unwrap_err();
        assert_eq!(error.status, 400);
        assert_eq!(error.campos_rechazados(), vec!["categoria".to_string()]);
    }

    #[actix_web::test]
    async fn aplica_reglas_de_acceso() {
        let almacen = almacen();
        let categoria = crear_categoria(&almacen, "Verduras").await;

        let anonimo = almacen
            .create(&Credencial::Anonima, Coleccion::Categorias, campos(json!({ "nombre": "X" })))
            .await
            .unwrap_err();
        assert!(anonimo.es_prohibido());

        let visible = almacen.get_one(&Credencial::Anonima, Coleccion::Categorias, &categoria.id).await;
        assert!(visible.is_ok());

        let lista_usuarios = almacen
            .get_full_list(&Credencial::Anonima, Coleccion::Users, &ConsultaLista::nueva())
            .await
            .unwrap_err();
        assert!(lista_usuarios.es_prohibido());

        let inexistente = almacen.get_one(&Credencial::Anonima, Coleccion::Productos, "nada").await.unwrap_err();
        assert!(inexistente.es_no_encontrado());
    }

    #[actix_web::test]
    async fn lista_de_pedidos_filtrada_por_propietario() {
        let almacen = almacen();
        let ana = crear_cliente(&almacen, "ana@huertohogar.cl").await;
        let beto = crear_cliente(&almacen, "beto@huertohogar.cl").await;

        for sesion in [&ana, &beto] {
            almacen
                .create(
                    &Credencial::Usuario(sesion.clone()),
                    Coleccion::Pedidos,
                    campos(json!({ "usuario": sesion.usuario_id, "productos": [], "total": 2990 })),
                )
                .await
                .unwrap();
        }

        let de_ana = almacen
            .get_full_list(&Credencial::Usuario(ana.clone()), Coleccion::Pedidos, &ConsultaLista::nueva())
            .await
            .unwrap();
        assert_eq!(de_ana.len(), 1);
        assert_eq!(de_ana[0].texto("usuario"), Some(ana.usuario_id.as_str()));

        let todos = almacen
            .get_full_list(&Credencial::Sistema, Coleccion::Pedidos, &ConsultaLista::nueva())
            .await
            .unwrap();
        assert_eq!(todos.len(), 2);
    }

    #[actix_web::test]
    async fn autentica_y_refresca_sin_exponer_el_hash() {
        let almacen = almacen();
        let sesion = crear_cliente(&almacen, "Ana@HuertoHogar.cl").await;
        assert_eq!(sesion.email, "ana@huertohogar.cl");
        assert_eq!(sesion.rol, Rol::Cliente);
        assert!(!sesion.registro.datos.contains_key("password_hash"));

        let refrescada = almacen.auth_refresh(&sesion.token).await.unwrap();
        assert_eq!(refrescada.registro.id, sesion.usuario_id);

        let mala = almacen.auth_with_password("ana@huertohogar.cl", "incorrecta").await.unwrap_err();
        assert_eq!(mala.status, 400);
    }

    #[actix_web::test]
    async fn email_duplicado_y_passwords_distintas() {
        let almacen = almacen();
        crear_cliente(&almacen, "ana@huertohogar.cl").await;

        let duplicado = almacen
            .create(
                &Credencial::Anonima,
                Coleccion::Users,
                campos(json!({ "email": "ana@huertohogar.cl", "nombre": "Otra", "password": "secreto1", "passwordConfirm": "secreto1" })),
            )
            .await
            .unwrap_err();
        assert_eq!(duplicado.primer_error_de_campo().unwrap().1, "validation_not_unique");

        let distintas = almacen
            .create(
                &Credencial::Anonima,
                Coleccion::Users,
                campos(json!({ "email": "beto@huertohogar.cl", "nombre": "Beto", "password": "secreto1", "passwordConfirm": "otra123" })),
            )
            .await
            .unwrap_err();
        assert_eq!(distintas.campos_rechazados(), vec!["passwordConfirm".to_string()]);
    }

    #[actix_web::test]
    async fn cliente_no_puede_darse_rol_admin() {
        let almacen = almacen();
        let registro_admin = almacen
            .create(
                &Credencial::Anonima,
                Coleccion::Users,
                campos(json!({ "email": "x@huertohogar.cl", "nombre": "X", "rol": "admin", "password": "secreto1", "passwordConfirm": "secreto1" })),
            )
            .await
            .unwrap_err();
        assert!(registro_admin.es_prohibido());
        assert_eq!(registro_admin.campos_rechazados(), vec!["rol".to_string()]);
    }

    #[actix_web::test]
    async fn degradacion_omite_el_campo_rechazado_y_lo_informa() {
        let almacen = almacen();
        let ana = crear_cliente(&almacen, "ana@huertohogar.cl").await;
        let credencial = Credencial::Usuario(ana.clone());

        let resultado = almacen
            .actualizar_con_degradacion(
                &credencial,
                Coleccion::Users,
                &ana.usuario_id,
                campos(json!({ "ciudad": "Valdivia", "rol": "admin" })),
                &["rol"],
            )
            .await
            .unwrap();

        assert_eq!(resultado.campos_omitidos, vec!["rol".to_string()]);
        assert_eq!(resultado.registro.texto("ciudad"), Some("Valdivia"));
        assert_eq!(resultado.registro.texto("rol"), Some("cliente"));
    }

    #[actix_web::test]
    async fn degradacion_no_oculta_rechazos_no_declarados() {
        let almacen = almacen();
        let ana = crear_cliente(&almacen, "ana@huertohogar.cl").await;
        let credencial = Credencial::Usuario(ana.clone());

        let error = almacen
            .actualizar_con_degradacion(
                &credencial,
                Coleccion::Users,
                &ana.usuario_id,
                campos(json!({ "ciudad": "Valdivia", "rol": "admin" })),
                &[],
            )
            .await
            .unwrap_err();
        assert!(error.es_prohibido());

        let intacto = almacen.get_one(&credencial, Coleccion::Users, &ana.usuario_id).await.unwrap();
        assert_eq!(intacto.texto("ciudad"), None);
    }
}
