//! Counter-table SQL for the sequence allocator.

use crate::sequence::SequenceScope;
use crate::sql::{qualified_table, quoted, PgBindValue, QueryBuf};

pub const SEQUENCE_TABLE: &str = "_sys_sequences";

/// Single-statement atomic increment of the scope's counter row.
///
/// The first call seeds the row from `MAX(id_column)` of the entity table; later
/// calls take the row lock through `ON CONFLICT DO UPDATE`, so concurrent callers
/// serialize on that row and each sees a distinct value. `GREATEST` keeps the
/// counter above ids written around the allocator.
pub fn upsert_increment(schema: &str, scope: &SequenceScope) -> QueryBuf {
    let counters = qualified_table(schema, SEQUENCE_TABLE);
    let sql = format!(
        "INSERT INTO {counters} AS c (\"scope\", \"value\", \"updated_at\") \
         VALUES ($1, COALESCE((SELECT MAX({id}) FROM {table}), 0) + 1, NOW()) \
         ON CONFLICT (\"scope\") DO UPDATE \
         SET \"value\" = GREATEST(c.\"value\", EXCLUDED.\"value\" - 1) + 1, \"updated_at\" = NOW() \
         RETURNING c.\"value\"",
        counters = counters,
        id = quoted(scope.id_column().name()),
        table = scope.qualified_table(),
    );
    QueryBuf {
        sql,
        params: vec![PgBindValue::String(scope.key())],
    }
}
