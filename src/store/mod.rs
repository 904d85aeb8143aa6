//! Preference sources and derived caches.
//!
//! - `legacy`: one-shot snapshot written by older producers on external storage.
//! - `live`: reloadable store in the module's private data directory.
//! - `xml`: parser for the live store's on-disk format.
//! - `list_cache`: precomputed token lists for space-delimited keys.

pub mod legacy;
pub mod list_cache;
pub mod live;
pub mod xml;

pub use legacy::{LegacyError, LegacySnapshot};
pub use list_cache::{split_list, StringListCache};
pub use live::{LiveError, LiveStore};
