use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Loosely typed attribute value supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Map(BTreeMap<String, FactValue>),
}

impl FactValue {
    /// Numeric coercion used by the continuous normalization methods.
    ///
    /// Returns `NaN` when the value cannot be read as a finite number so
    /// callers can score it as unusable data.
    pub fn as_number(&self) -> f64 {
        match self {
            FactValue::Number(value) => *value,
            FactValue::Bool(true) => 1.0,
            FactValue::Bool(false) => 0.0,
            FactValue::Text(raw) => {
                let trimmed = raw.trim();
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .unwrap_or(f64::NAN)
            }
            FactValue::Null | FactValue::Map(_) => f64::NAN,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            FactValue::Null => false,
            FactValue::Bool(value) => *value,
            FactValue::Number(value) => *value != 0.0 && !value.is_nan(),
            FactValue::Text(raw) => !matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "" | "false" | "no" | "n" | "0"
            ),
            FactValue::Map(_) => true,
        }
    }

    /// Label form used for ordinal lookups.
    pub fn as_label(&self) -> Option<String> {
        match self {
            FactValue::Text(raw) => Some(raw.clone()),
            FactValue::Bool(value) => Some(value.to_string()),
            FactValue::Number(value) => Some(value.to_string()),
            FactValue::Null | FactValue::Map(_) => None,
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Null => write!(f, "null"),
            FactValue::Bool(value) => write!(f, "{value}"),
            FactValue::Number(value) => write!(f, "{value}"),
            FactValue::Text(value) => write!(f, "{value}"),
            FactValue::Map(entries) => write!(f, "{{{} fields}}", entries.len()),
        }
    }
}

impl From<f64> for FactValue {
    fn from(value: f64) -> Self {
        FactValue::Number(value)
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        FactValue::Bool(value)
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::Text(value.to_string())
    }
}

/// Outcome of a dot-path traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldLookup<'a> {
    Found(&'a FactValue),
    Absent,
}

impl<'a> FieldLookup<'a> {
    pub fn found(self) -> Option<&'a FactValue> {
        match self {
            FieldLookup::Found(value) => Some(value),
            FieldLookup::Absent => None,
        }
    }
}

/// Raw attributes of one product, keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductFacts(BTreeMap<String, FactValue>);

impl ProductFacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a dot-separated path such as `specs.battery.runtime_min`.
    ///
    /// A `Null` leaf is reported as absent so the missing-data strategy applies.
    pub fn lookup(&self, path: &str) -> FieldLookup<'_> {
        let mut segments = path.split('.');
        let Some(first) = segments.next() else {
            return FieldLookup::Absent;
        };
        if first.is_empty() {
            return FieldLookup::Absent;
        }

        let mut current = match self.0.get(first) {
            Some(value) => value,
            None => return FieldLookup::Absent,
        };

        for segment in segments {
            if segment.is_empty() {
                return FieldLookup::Absent;
            }
            current = match current {
                FactValue::Map(entries) => match entries.get(segment) {
                    Some(value) => value,
                    None => return FieldLookup::Absent,
                },
                _ => return FieldLookup::Absent,
            };
        }

        match current {
            FactValue::Null => FieldLookup::Absent,
            value => FieldLookup::Found(value),
        }
    }

    /// Insert a value at a dot-separated path, creating intermediate maps.
    ///
    /// A non-map value sitting on the path is replaced by a map.
    pub fn insert_path(&mut self, path: &str, value: FactValue) {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        insert_segments(&mut self.0, &segments, value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn insert_segments(map: &mut BTreeMap<String, FactValue>, segments: &[&str], value: FactValue) {
    match segments {
        [] => {}
        [last] => {
            map.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let entry = map
                .entry((*head).to_string())
                .or_insert_with(|| FactValue::Map(BTreeMap::new()));
            if !matches!(entry, FactValue::Map(_)) {
                *entry = FactValue::Map(BTreeMap::new());
            }
            if let FactValue::Map(inner) = entry {
                insert_segments(inner, rest, value);
            }
        }
    }
}

impl From<BTreeMap<String, FactValue>> for ProductFacts {
    fn from(value: BTreeMap<String, FactValue>) -> Self {
        Self(value)
    }
}
