//! Demo consumer: serves catalog entities as paginated lists and allocates bill numbers.
//!
//! Run from repo root: `cargo run -p demo-consumer`
//! Needs `DATABASE_URL`; `CATALOG_PATH` defaults to `demo_consumer/catalog.json`.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use campus_sdk::sql::row::row_to_json;
use campus_sdk::{
    ensure_database_exists, ensure_sequence_table, load_from_path, resolve, success_one,
    AppError, ListOutcome, ListParams, ListQueryEngine, PgCounterStore, ResolvedModel, SequenceAllocator, SequenceValue,
    Settings,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
struct AppState {
    pool: PgPool,
    model: Arc<ResolvedModel>,
    engine: ListQueryEngine,
    allocator: SequenceAllocator<PgCounterStore>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("campus_sdk=info,demo_consumer=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/campus".into());
    ensure_database_exists(&database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    ensure_sequence_table(&pool, &settings.schema).await?;
    sqlx::raw_sql(include_str!("../schema.sql")).execute(&pool).await?;

    let catalog_path = std::env::var("CATALOG_PATH").unwrap_or_else(|_| "demo_consumer/catalog.json".into());
    let model = resolve(&load_from_path(&catalog_path).await?)?;
    tracing::info!(entities = model.entities.len(), catalog = %catalog_path, "catalog loaded");

    let state = AppState {
        pool: pool.clone(),
        model: Arc::new(model),
        engine: ListQueryEngine::new(settings.list),
        allocator: SequenceAllocator::new(PgCounterStore::new(pool, settings.schema.clone()), settings.retry),
    };

    let api = Router::new()
        .route("/:path_segment", get(list_entity).post(create_bill))
        .route("/:path_segment/sequence", post(allocate));
    let app = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("demo consumer listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/v1/:path_segment?page=&limit=&q=&sort=&orderby=&field_name=&field_value=&is_pagination=
async fn list_entity(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    ListParams(request): ListParams,
) -> Result<ListOutcome<Value>, AppError> {
    let entity = state
        .model
        .entity_by_path(&path_segment)
        .ok_or_else(|| AppError::NotFound(path_segment.clone()))?;
    let mut outcome = state.engine.list(&state.pool, &entity.base, &request, &entity.list).await?;
    if let Some(seq) = &entity.sequence {
        seq.code.render_all(outcome.rows_mut())?;
    }
    Ok(outcome)
}

/// POST /api/v1/:path_segment/sequence: reserve the next value without inserting a row.
/// Only the raw value is returned; the display code needs the consuming row's `created_at`.
async fn allocate(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let seq = state
        .model
        .entity_by_path(&path_segment)
        .and_then(|e| e.sequence.as_ref())
        .ok_or_else(|| AppError::NotFound(format!("sequence for {}", path_segment)))?;
    let value = state.allocator.next_value(&seq.scope).await?;
    Ok(success_one(allocation_body(value)))
}

fn allocation_body(value: SequenceValue) -> Value {
    json!({ "value": value.get() })
}

#[derive(Deserialize)]
struct NewBill {
    student_name: String,
    amount: f64,
}

/// POST /api/v1/bills: number and insert a bill in one transaction.
async fn create_bill(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Json(body): Json<NewBill>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let entity = state
        .model
        .entity_by_path(&path_segment)
        .filter(|e| e.id == "bills")
        .ok_or_else(|| AppError::NotFound(path_segment.clone()))?;
    let seq = entity
        .sequence
        .as_ref()
        .ok_or_else(|| AppError::Fatal("bills has no sequence".into()))?;

    let mut tx = state.pool.begin().await?;
    let bill_no = state.allocator.next_value_in(&mut tx, &seq.scope).await?;
    let bill_no = i64::try_from(bill_no.get()).map_err(|e| AppError::Fatal(e.to_string()))?;
    let row = sqlx::query(
        "INSERT INTO finance.bills (bill_no, student_name, amount) VALUES ($1, $2, $3::numeric) \
         RETURNING id, bill_no, student_name, status, amount::text AS amount, created_at",
    )
    .bind(bill_no)
    .bind(&body.student_name)
    .bind(body.amount)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    let mut bill = row_to_json(&row);
    seq.code.render(&mut bill)?;
    tracing::info!(bill_no, "bill created");
    Ok(success_one(bill))
}
