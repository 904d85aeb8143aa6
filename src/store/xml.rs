//! Parser for the producer's shared-preferences XML.
//!
//! ```text
//! <map>
//!     <string name="greeting">hello</string>
//!     <int name="count" value="5" />
//!     <long name="stamp" value="1700000000000" />
//!     <float name="ratio" value="0.5" />
//!     <boolean name="enabled" value="true" />
//!     <set name="tags"><string>a</string><string>b</string></set>
//!     <null name="cleared" />
//! </map>
//! ```
//!
//! Entries whose value cannot be parsed are skipped. A document that is not
//! well-formed fails as a whole.

use std::collections::BTreeSet;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use thiserror::Error;

use crate::value::{ConfigValue, PrefsMap};

#[derive(Debug, Error)]
#[error("Malformed preferences XML at byte {position}: {message}")]
pub struct XmlError {
    pub position: u64,
    pub message: String,
}

/// Element currently collecting character data.
enum Pending {
    Str {
        name: String,
        text: String,
    },
    Set {
        name: String,
        items: BTreeSet<String>,
        current: Option<String>,
    },
}

/// Parse a preferences document into a key/value map.
///
/// Blank input is an empty map.
pub fn parse_prefs(content: &str) -> Result<PrefsMap, XmlError> {
    let mut map = PrefsMap::new();
    if content.trim().is_empty() {
        return Ok(map);
    }

    let mut reader = Reader::from_str(content);
    let mut pending: Option<Pending> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let fail = |message: String| XmlError { position, message };

        match reader.read_event().map_err(|e| fail(e.to_string()))? {
            Event::Start(e) => match e.name().as_ref() {
                b"string" => match pending.as_mut() {
                    Some(Pending::Set { current, .. }) => *current = Some(String::new()),
                    _ => {
                        if let Some(name) = entry_name(&e).map_err(fail)? {
                            pending = Some(Pending::Str {
                                name,
                                text: String::new(),
                            });
                        }
                    }
                },
                b"set" => {
                    if let Some(name) = entry_name(&e).map_err(fail)? {
                        pending = Some(Pending::Set {
                            name,
                            items: BTreeSet::new(),
                            current: None,
                        });
                    }
                }
                _ => insert_scalar(&mut map, &e).map_err(fail)?,
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"string" => match pending.as_mut() {
                    Some(Pending::Set { items, .. }) => {
                        items.insert(String::new());
                    }
                    _ => {
                        if let Some(name) = entry_name(&e).map_err(fail)? {
                            map.insert(name, ConfigValue::String(String::new()));
                        }
                    }
                },
                b"set" => {
                    if let Some(name) = entry_name(&e).map_err(fail)? {
                        map.insert(name, ConfigValue::StringSet(BTreeSet::new()));
                    }
                }
                _ => insert_scalar(&mut map, &e).map_err(fail)?,
            },
            Event::Text(t) => {
                if let Some(buf) = text_target(&mut pending) {
                    buf.push_str(&t.unescape().map_err(|e| fail(e.to_string()))?);
                }
            }
            Event::CData(c) => {
                if let Some(buf) = text_target(&mut pending) {
                    buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"string" => match pending.take() {
                    Some(Pending::Str { name, text }) => {
                        map.insert(name, ConfigValue::String(text));
                    }
                    Some(Pending::Set {
                        name,
                        mut items,
                        current,
                    }) => {
                        if let Some(item) = current {
                            items.insert(item);
                        }
                        pending = Some(Pending::Set {
                            name,
                            items,
                            current: None,
                        });
                    }
                    None => {}
                },
                b"set" => {
                    if let Some(Pending::Set { name, items, .. }) = pending.take() {
                        map.insert(name, ConfigValue::StringSet(items));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(map)
}

fn text_target(pending: &mut Option<Pending>) -> Option<&mut String> {
    match pending.as_mut()? {
        Pending::Str { text, .. } => Some(text),
        Pending::Set { current, .. } => current.as_mut(),
    }
}

/// Value of the `name` attribute, or `None` when the element has none.
fn entry_name(e: &BytesStart<'_>) -> Result<Option<String>, String> {
    attribute(e, "name")
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>, String> {
    match e.try_get_attribute(key).map_err(|err| err.to_string())? {
        Some(attr) => attr
            .unescape_value()
            .map(|v| Some(v.into_owned()))
            .map_err(|err| err.to_string()),
        None => Ok(None),
    }
}

/// Insert a `value="…"` element (`int`, `long`, `float`, `boolean`).
///
/// Unknown tags, `null` entries and unparsable values are skipped.
fn insert_scalar(map: &mut PrefsMap, e: &BytesStart<'_>) -> Result<(), String> {
    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    if !matches!(tag.as_str(), "int" | "long" | "float" | "boolean") {
        return Ok(());
    }

    let (Some(name), Some(raw)) = (entry_name(e)?, attribute(e, "value")?) else {
        tracing::debug!(tag = %tag, "Skipping preference entry without name or value");
        return Ok(());
    };

    let value = match tag.as_str() {
        "int" => raw.parse().ok().map(ConfigValue::Int),
        "long" => raw.parse().ok().map(ConfigValue::Long),
        "float" => raw.parse().ok().map(ConfigValue::Float),
        _ => raw.parse().ok().map(ConfigValue::Bool),
    };

    match value {
        Some(value) => {
            map.insert(name, value);
        }
        None => {
            tracing::debug!(key = %name, tag = %tag, value = %raw, "Skipping unparsable preference value");
        }
    }
    Ok(())
}
