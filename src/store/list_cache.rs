//! Precomputed token lists for space-delimited preference values.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::value::{FromConfigValue, PrefsMap};

/// Split a raw value on single spaces, dropping empty tokens.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(' ')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Cache of parsed lists for a fixed set of list-valued keys.
///
/// A key only has an entry while its source value is a string; an absent
/// key (or one holding another type) has no entry, so readers fall back to
/// their own default.
#[derive(Debug)]
pub struct StringListCache {
    keys: Vec<String>,
    lists: RwLock<HashMap<String, Vec<String>>>,
}

impl StringListCache {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            lists: RwLock::new(HashMap::new()),
        }
    }

    /// Recompute every list from `source` and swap the result in.
    pub fn rebuild(&self, source: &PrefsMap) {
        let lists: HashMap<String, Vec<String>> = self
            .keys
            .iter()
            .filter_map(|key| {
                let raw = source.get(key).and_then(String::from_value)?;
                Some((key.clone(), split_list(&raw)))
            })
            .collect();

        tracing::trace!(cached = lists.len(), keys = self.keys.len(), "String lists rebuilt");
        *self.lists.write() = lists;
    }

    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        self.lists.read().get(key).cloned()
    }
}
