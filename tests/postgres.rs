//! End-to-end tests against a real PostgreSQL.
//!
//! Ignored by default. Run with:
//! `DATABASE_URL=postgres://localhost/campus_test cargo test --test postgres -- --ignored`
//!
//! Each test works in its own freshly created schema so tests can run in parallel.

use campus_sdk::list::ListSpec;
use campus_sdk::sql::BaseQuery;
use campus_sdk::{
    ensure_sequence_table, peek_sequence, AppError, ColumnKind, ColumnRef, CountStrategy, ListOutcome,
    ListQueryEngine, ListSettings, PgCounterStore, QueryRequest, RetryPolicy, SequenceAllocator, SequenceScope,
    SortOrder,
};
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

static SCHEMA_SEQ: AtomicU32 = AtomicU32::new(0);

async fn pool() -> PgPool {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("campus_sdk=debug")),
        )
        .with_test_writer()
        .try_init();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for postgres tests");
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(20)
        .connect(&url)
        .await
        .expect("connect")
}

/// Fresh schema with a `bills` table of `n` rows; `student_name` cycles through three names.
async fn seed_bills(pool: &PgPool, n: i64) -> String {
    let schema = format!(
        "t_{}_{}",
        std::process::id(),
        SCHEMA_SEQ.fetch_add(1, Ordering::SeqCst)
    );
    sqlx::raw_sql(&format!(
        r#"
        DROP SCHEMA IF EXISTS {s} CASCADE;
        CREATE SCHEMA {s};
        CREATE TABLE {s}.bills (
            id BIGSERIAL PRIMARY KEY,
            bill_no BIGINT NOT NULL UNIQUE,
            student_name TEXT NOT NULL,
            status TEXT NOT NULL,
            amount NUMERIC(12, 2) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT TIMESTAMPTZ '2025-01-15 09:00:00+00'
        );
        "#,
        s = schema
    ))
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(&format!(
        r#"
        INSERT INTO {}.bills (bill_no, student_name, status, amount)
        SELECT g,
               (ARRAY['Ada Lovelace', 'Alan Turing', 'Grace 100% Hopper'])[1 + g % 3],
               CASE WHEN g % 2 = 0 THEN 'paid' ELSE 'unpaid' END,
               g * 10
        FROM generate_series(1, $1) AS g
        "#,
        schema
    ))
    .bind(n)
    .execute(pool)
    .await
    .unwrap();
    schema
}

fn bills_base(schema: &str) -> BaseQuery {
    BaseQuery::new(format!(
        "SELECT id, bill_no, student_name, status, amount::text AS amount, created_at FROM {}.bills",
        schema
    ))
    .unwrap()
}

fn bills_spec() -> ListSpec {
    let col = |n: &str, k| ColumnRef::new(n, k).unwrap();
    // Every row shares created_at, so ordering relies on the primary-key tie-break.
    ListSpec::new(col("id", ColumnKind::Integer), col("created_at", ColumnKind::Timestamp))
        .searchable([col("student_name", ColumnKind::Text), col("status", ColumnKind::Text)])
        .sortable([col("amount", ColumnKind::Numeric)])
        .filterable([col("status", ColumnKind::Text), col("bill_no", ColumnKind::Integer)])
}

fn engine(strategy: CountStrategy) -> ListQueryEngine {
    ListQueryEngine::new(ListSettings {
        count_strategy: strategy,
        ..ListSettings::default()
    })
}

fn ids(rows: &[Value]) -> Vec<i64> {
    rows.iter().filter_map(|r| r["id"].as_i64()).collect()
}

async fn traverse(strategy: CountStrategy) {
    let pool = pool().await;
    let schema = seed_bills(&pool, 23).await;
    let engine = engine(strategy);
    let mut seen = Vec::new();
    let mut page = 1;
    loop {
        let req = QueryRequest {
            page,
            limit: Some(5),
            ..Default::default()
        };
        let out = engine.paginate(&pool, &bills_base(&schema), &req, &bills_spec()).await.unwrap();
        assert_eq!(out.pagination.total_record, 23);
        assert_eq!(out.pagination.total_page, 5);
        assert!(out.data.iter().all(|r| r.get("__total_record").is_none()));
        seen.extend(ids(&out.data));
        match out.pagination.next_page {
            Some(next) => page = next as u32,
            None => break,
        }
    }
    assert_eq!(seen.len(), 23);
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 23);
}

#[tokio::test]
#[ignore]
async fn traversal_visits_every_row_once_with_separate_count() {
    traverse(CountStrategy::Separate).await;
}

#[tokio::test]
#[ignore]
async fn traversal_visits_every_row_once_with_window_count() {
    traverse(CountStrategy::Window).await;
}

#[tokio::test]
#[ignore]
async fn page_past_the_end_is_empty_with_true_total() {
    let pool = pool().await;
    let schema = seed_bills(&pool, 7).await;
    for strategy in [CountStrategy::Separate, CountStrategy::Window] {
        let req = QueryRequest {
            page: 9,
            limit: Some(5),
            ..Default::default()
        };
        let out = engine(strategy)
            .paginate(&pool, &bills_base(&schema), &req, &bills_spec())
            .await
            .unwrap();
        assert!(out.data.is_empty());
        assert_eq!(out.pagination.total_record, 7);
        assert_eq!(out.pagination.next_page, None);
        assert_eq!(out.pagination.prev_page, Some(8));
    }
}

#[tokio::test]
#[ignore]
async fn search_is_case_insensitive_and_literal() {
    let pool = pool().await;
    let schema = seed_bills(&pool, 30).await;
    let engine = engine(CountStrategy::Separate);

    let req = QueryRequest {
        q: Some("aDa".into()),
        limit: Some(100),
        ..Default::default()
    };
    let out = engine.paginate(&pool, &bills_base(&schema), &req, &bills_spec()).await.unwrap();
    assert_eq!(out.pagination.total_record, 10);
    assert!(out.data.iter().all(|r| r["student_name"] == "Ada Lovelace"));

    // `%` matches itself, not everything.
    let req = QueryRequest {
        q: Some("100%".into()),
        limit: Some(100),
        ..Default::default()
    };
    let out = engine.paginate(&pool, &bills_base(&schema), &req, &bills_spec()).await.unwrap();
    assert_eq!(out.pagination.total_record, 10);

    let req = QueryRequest {
        q: Some("nobody".into()),
        ..Default::default()
    };
    let out = engine.paginate(&pool, &bills_base(&schema), &req, &bills_spec()).await.unwrap();
    assert!(out.data.is_empty());
    assert_eq!(out.pagination.total_record, 0);
    assert_eq!(out.pagination.total_page, 0);
}

#[tokio::test]
#[ignore]
async fn filter_and_sort_apply_together() {
    let pool = pool().await;
    let schema = seed_bills(&pool, 20).await;
    let engine = engine(CountStrategy::Separate);

    let req = QueryRequest {
        filter: Some(("status".into(), "paid".into())),
        sort: Some("amount".into()),
        order: SortOrder::Asc,
        limit: Some(100),
        ..Default::default()
    };
    let out = engine.paginate(&pool, &bills_base(&schema), &req, &bills_spec()).await.unwrap();
    assert_eq!(out.pagination.total_record, 10);
    assert!(out.data.iter().all(|r| r["status"] == "paid"));
    let bill_nos: Vec<i64> = out.data.iter().filter_map(|r| r["bill_no"].as_i64()).collect();
    assert_eq!(bill_nos, (1..=10).map(|g| g * 2).collect::<Vec<_>>());

    // Undeclared filter columns are ignored, undeclared sorts fall back to the default.
    let req = QueryRequest {
        filter: Some(("amount; DROP TABLE bills".into(), "x".into())),
        sort: Some("nope".into()),
        limit: Some(100),
        ..Default::default()
    };
    let out = engine.paginate(&pool, &bills_base(&schema), &req, &bills_spec()).await.unwrap();
    assert_eq!(out.pagination.total_record, 20);
    // created_at ties everywhere; id ascending breaks them.
    assert_eq!(ids(&out.data), (1..=20).collect::<Vec<_>>());

    let req = QueryRequest {
        filter: Some(("bill_no".into(), "seven".into())),
        ..Default::default()
    };
    let err = engine.paginate(&pool, &bills_base(&schema), &req, &bills_spec()).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidQueryParameter { .. }));
}

#[tokio::test]
#[ignore]
async fn search_and_filter_must_both_match() {
    let pool = pool().await;
    let schema = seed_bills(&pool, 30).await;
    for strategy in [CountStrategy::Separate, CountStrategy::Window] {
        let req = QueryRequest {
            q: Some("ada".into()),
            filter: Some(("status".into(), "paid".into())),
            limit: Some(100),
            ..Default::default()
        };
        let out = engine(strategy)
            .paginate(&pool, &bills_base(&schema), &req, &bills_spec())
            .await
            .unwrap();
        // Ada is every third bill, paid every second: multiples of six.
        assert_eq!(out.pagination.total_record, 5);
        assert!(out
            .data
            .iter()
            .all(|r| r["student_name"] == "Ada Lovelace" && r["status"] == "paid"));
        let mut bill_nos: Vec<i64> = out.data.iter().filter_map(|r| r["bill_no"].as_i64()).collect();
        bill_nos.sort_unstable();
        assert_eq!(bill_nos, vec![6, 12, 18, 24, 30]);
    }
}

#[tokio::test]
#[ignore]
async fn numeric_and_timestamp_filters_are_checked_before_the_query() {
    let pool = pool().await;
    let schema = seed_bills(&pool, 20).await;
    let engine = engine(CountStrategy::Separate);

    for (column, raw) in [("amount", "abc"), ("created_at", "yesterday-ish")] {
        let req = QueryRequest {
            filter: Some((column.into(), raw.into())),
            ..Default::default()
        };
        let err = engine.paginate(&pool, &bills_base(&schema), &req, &bills_spec()).await.unwrap_err();
        assert!(
            matches!(err, AppError::InvalidQueryParameter { name: "field_value", .. }),
            "{}={} gave {:?}",
            column,
            raw,
            err
        );
    }

    let req = QueryRequest {
        filter: Some(("amount".into(), "40".into())),
        ..Default::default()
    };
    let out = engine.paginate(&pool, &bills_base(&schema), &req, &bills_spec()).await.unwrap();
    assert_eq!(out.pagination.total_record, 1);
    assert_eq!(out.data[0]["bill_no"], 4);

    let req = QueryRequest {
        filter: Some(("created_at".into(), "2025-01-15T09:00:00Z".into())),
        ..Default::default()
    };
    let out = engine.paginate(&pool, &bills_base(&schema), &req, &bills_spec()).await.unwrap();
    assert_eq!(out.pagination.total_record, 20);
}

#[tokio::test]
#[ignore]
async fn enum_columns_are_searchable_and_filterable() {
    let pool = pool().await;
    let schema = seed_bills(&pool, 10).await;
    sqlx::raw_sql(&format!(
        r#"
        CREATE TYPE {s}.bill_status AS ENUM ('paid', 'unpaid');
        ALTER TABLE {s}.bills ALTER COLUMN status TYPE {s}.bill_status USING status::{s}.bill_status;
        "#,
        s = schema
    ))
    .execute(&pool)
    .await
    .unwrap();

    // The base selects the enum as-is, as a hand-written source query would.
    let base = BaseQuery::new(format!("SELECT id, status, created_at FROM {}.bills", schema)).unwrap();
    let status = ColumnRef::new("status", ColumnKind::from_pg_type(&format!("{}.bill_status", schema))).unwrap();
    let spec = ListSpec::new(
        ColumnRef::new("id", ColumnKind::Integer).unwrap(),
        ColumnRef::new("created_at", ColumnKind::Timestamp).unwrap(),
    )
    .searchable([status]);

    let req = QueryRequest {
        q: Some("unp".into()),
        filter: Some(("status".into(), "unpaid".into())),
        ..Default::default()
    };
    let out = engine(CountStrategy::Separate).paginate(&pool, &base, &req, &spec).await.unwrap();
    assert_eq!(out.pagination.total_record, 5);
    assert_eq!(ids(&out.data), vec![1, 3, 5, 7, 9]);
}

#[tokio::test]
#[ignore]
async fn unpaged_listing_returns_bare_rows() {
    let pool = pool().await;
    let schema = seed_bills(&pool, 12).await;
    let req = QueryRequest {
        paginate: Some(false),
        filter: Some(("status".into(), "unpaid".into())),
        ..Default::default()
    };
    let out = engine(CountStrategy::Separate)
        .list(&pool, &bills_base(&schema), &req, &bills_spec())
        .await
        .unwrap();
    match out {
        ListOutcome::Raw(rows) => assert_eq!(rows.len(), 6),
        ListOutcome::Paginated(_) => panic!("expected bare rows"),
    }
}

fn scope(schema: &str) -> SequenceScope {
    SequenceScope::new(
        schema,
        "bills",
        ColumnRef::new("bill_no", ColumnKind::Integer).unwrap(),
        ColumnRef::new("created_at", ColumnKind::Timestamp).unwrap(),
    )
    .unwrap()
}

async fn allocator(pool: &PgPool, schema: &str) -> SequenceAllocator<PgCounterStore> {
    ensure_sequence_table(pool, schema).await.unwrap();
    let retry = RetryPolicy {
        max_attempts: 10,
        ..RetryPolicy::default()
    };
    SequenceAllocator::new(PgCounterStore::new(pool.clone(), schema), retry)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore]
async fn concurrent_allocations_are_distinct_and_seeded_from_existing_rows() {
    let pool = pool().await;
    let schema = seed_bills(&pool, 5).await;
    let allocator = Arc::new(allocator(&pool, &schema).await);
    let scope = Arc::new(scope(&schema));

    let tasks: Vec<_> = (0..128)
        .map(|_| {
            let allocator = allocator.clone();
            let scope = scope.clone();
            tokio::spawn(async move { allocator.next_value(&scope).await })
        })
        .collect();
    let mut values = Vec::new();
    for t in tasks {
        values.push(t.await.unwrap().unwrap().get());
    }

    let distinct: HashSet<_> = values.iter().collect();
    assert_eq!(distinct.len(), 128);
    assert_eq!(values.iter().min(), Some(&6));
    assert_eq!(values.iter().max(), Some(&133));
    assert_eq!(
        peek_sequence(&pool, &schema, &scope.key()).await.unwrap(),
        Some(133)
    );
}

#[tokio::test]
#[ignore]
async fn rolled_back_transaction_releases_its_value() {
    let pool = pool().await;
    let schema = seed_bills(&pool, 0).await;
    let allocator = allocator(&pool, &schema).await;
    let scope = scope(&schema);

    let mut tx = pool.begin().await.unwrap();
    let first = allocator.next_value_in(&mut tx, &scope).await.unwrap();
    tx.commit().await.unwrap();
    assert_eq!(first.get(), 1);

    let mut tx = pool.begin().await.unwrap();
    let second = allocator.next_value_in(&mut tx, &scope).await.unwrap();
    assert_eq!(second.get(), 2);
    tx.rollback().await.unwrap();

    let third = allocator.next_value(&scope).await.unwrap();
    assert_eq!(third.get(), 2);
    assert_eq!(peek_sequence(&pool, &schema, &scope.key()).await.unwrap(), Some(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore]
async fn concurrent_allocate_and_insert_in_one_transaction() {
    let pool = pool().await;
    let schema = seed_bills(&pool, 3).await;
    let allocator = Arc::new(allocator(&pool, &schema).await);
    let scope = Arc::new(scope(&schema));
    let insert = Arc::new(format!(
        "INSERT INTO {}.bills (bill_no, student_name, status, amount) VALUES ($1, 'Concurrent', 'unpaid', 1) RETURNING bill_no",
        schema
    ));

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let (pool, allocator, scope, insert) = (pool.clone(), allocator.clone(), scope.clone(), insert.clone());
            tokio::spawn(async move {
                let mut tx = pool.begin().await?;
                let value = allocator.next_value_in(&mut tx, &scope).await?;
                let bill_no = i64::try_from(value.get()).map_err(|e| AppError::Fatal(e.to_string()))?;
                let stored: i64 = sqlx::query_scalar(insert.as_str()).bind(bill_no).fetch_one(&mut *tx).await?;
                tx.commit().await?;
                Ok::<_, AppError>(stored)
            })
        })
        .collect();
    let mut bill_nos = Vec::new();
    for t in tasks {
        bill_nos.push(t.await.unwrap().unwrap());
    }

    let distinct: HashSet<_> = bill_nos.iter().collect();
    assert_eq!(distinct.len(), 32);
    assert_eq!(bill_nos.iter().min(), Some(&4));
    assert_eq!(bill_nos.iter().max(), Some(&35));

    let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}.bills", schema))
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 35);
    assert_eq!(peek_sequence(&pool, &schema, &scope.key()).await.unwrap(), Some(35));
}
