//! Which source answers reads.
//!
//! ```text
//! Legacy(snapshot) ──retire_legacy()──▶ Live
//! ```
//!
//! There is no path back: once retired, a legacy snapshot is gone for the
//! lifetime of the facade.

use std::sync::Arc;

use crate::store::LegacySnapshot;

/// Kind of the authoritative source, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Legacy,
    Live,
}

#[derive(Debug)]
pub enum Authority {
    Legacy(Arc<LegacySnapshot>),
    Live,
}

impl Authority {
    /// Initial authority after loading.
    pub fn initial(legacy: Option<LegacySnapshot>) -> Self {
        match legacy {
            Some(snapshot) => Authority::Legacy(Arc::new(snapshot)),
            None => Authority::Live,
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Authority::Legacy(_) => SourceKind::Legacy,
            Authority::Live => SourceKind::Live,
        }
    }

    /// Promote the live source, returning the retired snapshot if any.
    pub fn retire_legacy(&mut self) -> Option<Arc<LegacySnapshot>> {
        match std::mem::replace(self, Authority::Live) {
            Authority::Legacy(snapshot) => Some(snapshot),
            Authority::Live => None,
        }
    }
}
