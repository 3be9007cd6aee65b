//! Resolved entity model: catalog validated and turned into typed descriptors.

use crate::list::ListSpec;
use crate::sequence::{BusinessCodeSpec, SequenceScope};
use crate::sql::BaseQuery;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct ResolvedSequence {
    pub scope: SequenceScope,
    pub code: BusinessCodeSpec,
}

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    pub id: String,
    pub path_segment: String,
    /// Unfiltered base query; list requests wrap it.
    pub base: BaseQuery,
    pub list: ListSpec,
    pub sequence: Option<ResolvedSequence>,
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedModel {
    pub entities: Vec<ResolvedEntity>,
    pub(crate) by_path: HashMap<String, usize>,
}

impl ResolvedModel {
    pub fn entity_by_path(&self, path: &str) -> Option<&ResolvedEntity> {
        self.by_path.get(path).and_then(|&i| self.entities.get(i))
    }
}
