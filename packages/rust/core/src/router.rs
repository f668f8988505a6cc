//! Index routing: identifier-keyed queries go to the specific index,
//! everything else to the general one.

use std::fmt;
use std::sync::Arc;

use brickmapper_shared::Retriever;

use crate::grammar;

/// Which retrieval index a query should hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Fine-grained, identifier-keyed content.
    Specific,
    /// Broad descriptive content.
    General,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Specific => "specific",
            Self::General => "general",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the index for `query`.
///
/// Any identifier-looking substring routes to [`IndexKind::Specific`], whether
/// or not that Brick exists. A retrieval miss is handled downstream.
pub fn select_index(query: &str) -> IndexKind {
    if grammar::contains_identifier(query) {
        IndexKind::Specific
    } else {
        IndexKind::General
    }
}

/// The two retrieval index handles, created once before any row is processed.
#[derive(Clone)]
pub struct IndexSet {
    specific: Arc<dyn Retriever>,
    general: Arc<dyn Retriever>,
}

impl IndexSet {
    pub fn new(specific: Arc<dyn Retriever>, general: Arc<dyn Retriever>) -> Self {
        Self { specific, general }
    }

    pub fn get(&self, kind: IndexKind) -> &dyn Retriever {
        match kind {
            IndexKind::Specific => self.specific.as_ref(),
            IndexKind::General => self.general.as_ref(),
        }
    }

    /// Route `query` and return the chosen index together with its handle.
    pub fn select(&self, query: &str) -> (IndexKind, &dyn Retriever) {
        let kind = select_index(query);
        (kind, self.get(kind))
    }
}

impl fmt::Debug for IndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexSet").finish_non_exhaustive()
    }
}
