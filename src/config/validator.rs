//! Catalog validation: identifiers, references, and uniqueness.

use crate::config::{CatalogConfig, EntityConfig};
use crate::error::ConfigError;
use crate::sql::{validate_identifier, ColumnKind};
use regex::Regex;
use std::collections::{HashMap, HashSet};

const PREFIX_PATTERN: &str = "^[A-Z]{1,8}$";

pub fn validate(config: &CatalogConfig) -> Result<(), ConfigError> {
    let mut ids = HashSet::new();
    let mut paths = HashSet::new();
    let mut tables = HashSet::new();
    for e in &config.entities {
        if !ids.insert(e.id.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "entity id",
                id: e.id.clone(),
            });
        }
        if !paths.insert(e.path_segment.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "path segment",
                id: e.path_segment.clone(),
            });
        }
        validate_entity(e)?;
        if e.sequence.is_some() && !tables.insert((e.schema.as_str(), e.table.as_str())) {
            return Err(ConfigError::Duplicate {
                kind: "sequence table",
                id: format!("{}.{}", e.schema, e.table),
            });
        }
    }
    Ok(())
}

fn validate_entity(e: &EntityConfig) -> Result<(), ConfigError> {
    if e.path_segment.is_empty() || e.path_segment.contains('/') {
        return Err(ConfigError::Validation(format!("{}: invalid path segment '{}'", e.id, e.path_segment)));
    }
    validate_identifier(&e.schema)?;
    validate_identifier(&e.table)?;

    let mut kinds: HashMap<&str, ColumnKind> = HashMap::new();
    for c in &e.columns {
        validate_identifier(&c.name)?;
        if kinds.insert(c.name.as_str(), ColumnKind::from_pg_type(&c.type_)).is_some() {
            return Err(ConfigError::Duplicate {
                kind: "column",
                id: format!("{}.{}", e.id, c.name),
            });
        }
    }
    let declared = |name: &str| -> Result<ColumnKind, ConfigError> {
        kinds.get(name).copied().ok_or_else(|| ConfigError::MissingReference {
            kind: "column",
            id: format!("{}.{}", e.id, name),
        })
    };

    declared(&e.primary_key)?;
    if let Some(sort) = &e.list.default_sort {
        declared(sort)?;
    }
    for name in e.list.searchable.iter().chain(&e.list.sortable).chain(&e.list.filterable) {
        declared(name)?;
    }
    if e.list.default_limit == Some(0) {
        return Err(ConfigError::Validation(format!("{}: default_limit must be at least 1", e.id)));
    }

    if let Some(seq) = &e.sequence {
        let re = Regex::new(PREFIX_PATTERN).map_err(|err| ConfigError::Validation(err.to_string()))?;
        if !re.is_match(&seq.prefix) {
            return Err(ConfigError::Validation(format!(
                "{}: sequence prefix '{}' must be 1-8 uppercase letters",
                e.id, seq.prefix
            )));
        }
        if !declared(&seq.id_column)?.is_integer() {
            return Err(ConfigError::Validation(format!(
                "{}: sequence id_column '{}' must be an integer column",
                e.id, seq.id_column
            )));
        }
        match declared(&seq.created_at_column)? {
            ColumnKind::Timestamp | ColumnKind::Date => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "{}: created_at_column '{}' must be a timestamp or date",
                    e.id, seq.created_at_column
                )))
            }
        }
        if seq.code_field.is_empty() || kinds.contains_key(seq.code_field.as_str()) {
            return Err(ConfigError::Validation(format!(
                "{}: code_field '{}' must be a new field name",
                e.id, seq.code_field
            )));
        }
    }
    Ok(())
}
