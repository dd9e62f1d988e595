// src/almacen/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{query, query_as, FromRow, Pool, Postgres};

use super::almacen_error::ErrorAlmacen;
use super::almacen_structs::{Coleccion, Registro};
use super::backend::BackendRegistros;

/// Backend PostgreSQL: una sola tabla `registros` con los campos en JSONB.
pub struct BackendPostgres {
    db_pool: Pool<Postgres>,
}

/// Fila de la tabla `registros`.
/// Deriva FromRow para mapeo directo de los resultados de la query.
#[derive(FromRow)]
struct FilaRegistro {
    id: String,
    datos: Json<Map<String, Value>>,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

impl From<FilaRegistro> for Registro {
    fn from(fila: FilaRegistro) -> Self {
        Registro { id: fila.id, created: fila.created, updated: fila.updated, datos: fila.datos.0 }
    }
}

fn error_sql(operacion: &str, e: sqlx::Error) -> ErrorAlmacen {
    tracing::error!(error = ?e, operacion, "Error de PostgreSQL");
    if let sqlx::Error::Database(db) = &e {
        // 23505: unique_violation
        if db.code().as_deref() == Some("23505") {
            let mut campos = Map::new();
            campos.insert(
                "id".into(),
                serde_json::json!({ "code": "validation_not_unique", "message": "Value must be unique." }),
            );
            return ErrorAlmacen::validacion("Failed to create record.", campos);
        }
    }
    ErrorAlmacen::interno(format!("Error de base de datos al {}", operacion))
}

impl BackendPostgres {
    /// Conecta al pool y crea la tabla si todavía no existe.
    pub async fn conectar(database_url: &str) -> Result<Self, ErrorAlmacen> {
        let db_pool = Pool::<Postgres>::connect(database_url)
            .await
            .map_err(|e| error_sql("conectar", e))?;

        query(
            "CREATE TABLE IF NOT EXISTS registros (
                coleccion TEXT NOT NULL,
                id TEXT NOT NULL,
                datos JSONB NOT NULL,
                created TIMESTAMPTZ NOT NULL,
                updated TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (coleccion, id)
            )",
        )
        .execute(&db_pool)
        .await
        .map_err(|e| error_sql("crear la tabla registros", e))?;

        Ok(Self { db_pool })
    }
}

#[async_trait]
impl BackendRegistros for BackendPostgres {
    async fn insertar(&self, coleccion: Coleccion, registro: Registro) -> Result<(), ErrorAlmacen> {
        query("INSERT INTO registros (coleccion, id, datos, created, updated) VALUES ($1, $2, $3, $4, $5)")
            .bind(coleccion.nombre())
            .bind(&registro.id)
            .bind(Json(&registro.datos))
            .bind(registro.created)
            .bind(registro.updated)
            .execute(&self.db_pool)
            .await
            .map_err(|e| error_sql("insertar", e))?;
        Ok(())
    }

    async fn reemplazar(&self, coleccion: Coleccion, registro: Registro) -> Result<(), ErrorAlmacen> {
        let resultado = query("UPDATE registros SET datos = $1, updated = $2 WHERE coleccion = $3 AND id = $4")
            .bind(Json(&registro.datos))
            .bind(registro.updated)
            .bind(coleccion.nombre())
            .bind(&registro.id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| error_sql("actualizar", e))?;

        if resultado.rows_affected() == 0 {
            return Err(ErrorAlmacen::no_encontrado());
        }
        Ok(())
    }

    async fn eliminar(&self, coleccion: Coleccion, id: &str) -> Result<(), ErrorAlmacen> {
        let resultado = query("DELETE FROM registros WHERE coleccion = $1 AND id = $2")
            .bind(coleccion.nombre())
            .bind(id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| error_sql("eliminar", e))?;

        if resultado.rows_affected() == 0 {
            return Err(ErrorAlmacen::no_encontrado());
        }
        Ok(())
    }

    async fn obtener(&self, coleccion: Coleccion, id: &str) -> Result<Option<Registro>, ErrorAlmacen> {
        let fila = query_as::<_, FilaRegistro>(
            "SELECT id, datos, created, updated FROM registros WHERE coleccion = $1 AND id = $2",
        )
        .bind(coleccion.nombre())
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| error_sql("buscar", e))?;

        Ok(fila.map(Registro::from))
    }

    async fn listar(&self, coleccion: Coleccion) -> Result<Vec<Registro>, ErrorAlmacen> {
        let filas = query_as::<_, FilaRegistro>(
            "SELECT id, datos, created, updated FROM registros WHERE coleccion = $1 ORDER BY created",
        )
        .bind(coleccion.nombre())
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| error_sql("listar", e))?;

        Ok(filas.into_iter().map(Registro::from).collect())
    }
}
