//! Load the entity catalog from JSON and resolve it into runtime descriptors.

use crate::config::resolved::{ResolvedEntity, ResolvedModel, ResolvedSequence};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use crate::list::ListSpec;
use crate::sequence::{BusinessCodeSpec, SequenceScope};
use crate::sql::{BaseQuery, ColumnKind, ColumnRef, SelectColumn};
use std::collections::HashMap;
use std::path::Path;

pub fn load_from_str(json: &str) -> Result<CatalogConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(format!("catalog: {}", e)))
}

pub async fn load_from_path(path: impl AsRef<Path>) -> Result<CatalogConfig, ConfigError> {
    let path = path.as_ref();
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    load_from_str(&json)
}

/// Build the resolved model (validates first).
pub fn resolve(config: &CatalogConfig) -> Result<ResolvedModel, ConfigError> {
    validate(config)?;
    let mut model = ResolvedModel::default();
    for e in &config.entities {
        let entity = resolve_entity(e)?;
        model.by_path.insert(entity.path_segment.clone(), model.entities.len());
        model.entities.push(entity);
    }
    tracing::debug!(entities = model.entities.len(), "catalog resolved");
    Ok(model)
}

fn resolve_entity(e: &EntityConfig) -> Result<ResolvedEntity, ConfigError> {
    let columns: HashMap<&str, ColumnRef> = e
        .columns
        .iter()
        .map(|c| Ok((c.name.as_str(), ColumnRef::new(&c.name, ColumnKind::from_pg_type(&c.type_))?)))
        .collect::<Result<_, ConfigError>>()?;
    let col = |name: &str| {
        columns.get(name).cloned().ok_or_else(|| ConfigError::MissingReference {
            kind: "column",
            id: format!("{}.{}", e.id, name),
        })
    };
    let cols = |names: &[String]| names.iter().map(|n| col(n)).collect::<Result<Vec<_>, _>>();

    let primary_key = col(&e.primary_key)?;
    let default_sort = match &e.list.default_sort {
        Some(name) => col(name)?,
        None => col("created_at").or_else(|_| col(&e.primary_key))?,
    };
    let mut list = ListSpec::new(primary_key, default_sort)
        .searchable(cols(&e.list.searchable)?)
        .sortable(cols(&e.list.sortable)?)
        .filterable(cols(&e.list.filterable)?)
        .paginate_by_default(e.list.paginate_by_default);
    if let Some(limit) = e.list.default_limit {
        list = list.default_limit(limit);
    }

    let base = match &e.source_sql {
        Some(sql) => BaseQuery::new(sql.clone())?,
        None => {
            let select: Vec<SelectColumn> = e
                .columns
                .iter()
                .map(|c| SelectColumn {
                    name: c.name.clone(),
                    pg_type: Some(c.type_.clone()),
                })
                .collect();
            BaseQuery::table(&e.schema, &e.table, &select)?
        }
    };

    let sequence = match &e.sequence {
        Some(s) => Some(ResolvedSequence {
            scope: SequenceScope::new(&e.schema, &e.table, col(&s.id_column)?, col(&s.created_at_column)?)?,
            code: BusinessCodeSpec {
                prefix: s.prefix.clone(),
                value_field: s.id_column.clone(),
                created_at_field: s.created_at_column.clone(),
                code_field: s.code_field.clone(),
            },
        }),
        None => None,
    };

    Ok(ResolvedEntity {
        id: e.id.clone(),
        path_segment: e.path_segment.clone(),
        base,
        list,
        sequence,
    })
}
