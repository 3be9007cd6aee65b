//! SDK-owned tables. `_sys_sequences` lives in the schema from `CAMPUS_SCHEMA` (default `campus`).

use crate::error::AppError;
use crate::sql::counter::SEQUENCE_TABLE;
use crate::sql::{qualified_table, quoted, validate_identifier};
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Create the schema and the counter table if missing. One row per sequence scope.
pub async fn ensure_sequence_table(pool: &PgPool, schema: &str) -> Result<(), AppError> {
    validate_identifier(schema)?;
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;
    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            scope TEXT PRIMARY KEY,
            value BIGINT NOT NULL CHECK (value > 0),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        qualified_table(schema, SEQUENCE_TABLE)
    );
    tracing::debug!(sql = %ddl, "ddl");
    sqlx::query(&ddl).execute(pool).await?;
    Ok(())
}

/// Current counter value for a scope key, without allocating. None before the first allocation.
pub async fn peek_sequence(pool: &PgPool, schema: &str, scope_key: &str) -> Result<Option<i64>, AppError> {
    let sql = format!(
        "SELECT value FROM {} WHERE scope = $1",
        qualified_table(schema, SEQUENCE_TABLE)
    );
    Ok(sqlx::query_scalar(&sql).bind(scope_key).fetch_optional(pool).await?)
}

/// Create the target database if it does not exist (connects to `postgres` on the same server).
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::Fatal(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::Fatal("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}
