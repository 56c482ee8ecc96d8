//! Read-only knowledge bases: general school facts and the conclave event
//! roster. Both are loaded once at startup, either from bundled data or from
//! JSON files in a user-supplied directory. Iteration order always follows
//! the order entries appear in the JSON source.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, warn};

pub const SCHOOL_DATA_FILE: &str = "school_data.json";
pub const CONCLAVE_DATA_FILE: &str = "conclave_data.json";

const BUNDLED_SCHOOL: &str = include_str!("../data/school_data.json");
const BUNDLED_CONCLAVE: &str = include_str!("../data/conclave_data.json");

/// A school-facts field. Staff entries mix plain strings, string lists
/// (volunteers, contact lines) and small nested maps (the developer record).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
    Nested(BTreeMap<String, String>),
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn nested(&self, key: &str) -> Option<&str> {
        match self {
            FieldValue::Nested(map) => map.get(key).map(String::as_str),
            _ => None,
        }
    }
}

/// General facts about the school: named sections scanned in order, the
/// mission/vision block, and the staff directory.
#[derive(Debug, Clone, Default)]
pub struct SchoolData {
    pub locations: Vec<(String, String)>,
    pub infrastructure: Vec<(String, String)>,
    pub co_curricular: Vec<(String, String)>,
    pub mission: Option<String>,
    pub vision: Option<String>,
    pub core_values: Vec<String>,
    staff: Vec<(String, FieldValue)>,
}

impl SchoolData {
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).context("school data is not valid JSON")?;
        let Some(root) = value.as_object() else {
            bail!("school data must be a JSON object");
        };

        let mut data = SchoolData {
            locations: string_section(root, "locations"),
            infrastructure: string_section(root, "infrastructure"),
            co_curricular: string_section(root, "co_curricular"),
            ..SchoolData::default()
        };

        if let Some(mv) = root.get("mission_vision").and_then(Value::as_object) {
            data.mission = mv.get("mission").and_then(Value::as_str).map(str::to_string);
            data.vision = mv.get("vision").and_then(Value::as_str).map(str::to_string);
            data.core_values = mv
                .get("core_values")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
        }

        if let Some(staff) = root.get("staff").and_then(Value::as_object) {
            for (name, field) in staff {
                match serde_json::from_value::<FieldValue>(field.clone()) {
                    Ok(value) => data.staff.push((name.clone(), value)),
                    Err(e) => warn!(field = %name, error = %e, "skipping malformed staff entry"),
                }
            }
        }

        Ok(data)
    }

    /// Look up a staff directory field by its exact source key.
    pub fn staff_field(&self, name: &str) -> Option<&FieldValue> {
        self.staff
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Read one object-of-strings section, skipping entries whose value is not
/// a string.
fn string_section(root: &serde_json::Map<String, Value>, name: &str) -> Vec<(String, String)> {
    let Some(section) = root.get(name).and_then(Value::as_object) else {
        return Vec::new();
    };
    section
        .iter()
        .filter_map(|(key, value)| match value.as_str() {
            Some(text) => Some((key.clone(), text.to_string())),
            None => {
                warn!(section = name, entry = %key, "skipping non-string section entry");
                None
            }
        })
        .collect()
}

/// One conclave event. Every descriptive field is optional; answers degrade
/// per facet when a field is absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventRecord {
    pub event_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub timing: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub hall: Option<String>,
    #[serde(default)]
    pub class_range: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default)]
    pub prizes: Vec<String>,
    #[serde(default)]
    pub registration_deadline: Option<String>,
}

impl EventRecord {
    /// The event venue under any of its aliases, in priority order:
    /// `venue`, `location`, `place`, `hall`.
    pub fn venue(&self) -> Option<&str> {
        self.venue
            .as_deref()
            .or(self.location.as_deref())
            .or(self.place.as_deref())
            .or(self.hall.as_deref())
    }
}

/// An event together with the topic key it is stored under.
#[derive(Debug, Clone)]
pub struct EventEntry {
    pub key: String,
    pub record: EventRecord,
}

/// The conclave roster in source order.
#[derive(Debug, Clone, Default)]
pub struct EventBase {
    entries: Vec<EventEntry>,
}

impl EventBase {
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).context("conclave data is not valid JSON")?;
        let Some(root) = value.as_object() else {
            bail!("conclave data must be a JSON object keyed by event topic");
        };

        let mut entries = Vec::with_capacity(root.len());
        for (key, record) in root {
            if key.trim().is_empty() {
                warn!("skipping conclave entry with an empty topic key");
                continue;
            }
            match serde_json::from_value::<EventRecord>(record.clone()) {
                Ok(record) if record.event_name.trim().is_empty() => {
                    warn!(key = %key, "skipping conclave entry without an event name");
                }
                Ok(record) => entries.push(EventEntry {
                    key: key.clone(),
                    record,
                }),
                Err(e) => warn!(key = %key, error = %e, "skipping malformed conclave entry"),
            }
        }

        Ok(EventBase { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventEntry> {
        self.entries.iter()
    }

    pub fn get(&self, key: &str) -> Option<&EventEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Both knowledge bases, loaded together at startup.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBases {
    pub school: SchoolData,
    pub events: EventBase,
}

impl KnowledgeBases {
    /// Load both bases from `data_dir`, or from the bundled data when no
    /// directory is given. A base that cannot be read or parsed is replaced
    /// by an empty one, so the resolver keeps running and defers those
    /// queries to the AI fallback.
    pub fn load(data_dir: Option<&Path>) -> Self {
        KnowledgeBases {
            school: load_base(data_dir, SCHOOL_DATA_FILE, BUNDLED_SCHOOL, SchoolData::from_json),
            events: load_base(data_dir, CONCLAVE_DATA_FILE, BUNDLED_CONCLAVE, EventBase::from_json),
        }
    }
}

fn load_base<T: Default>(
    dir: Option<&Path>,
    file: &str,
    bundled: &str,
    parse: impl Fn(&str) -> Result<T>,
) -> T {
    let text = match dir {
        Some(dir) => match fs::read_to_string(dir.join(file)) {
            Ok(text) => text,
            Err(e) => {
                error!(file, error = %e, "failed to read knowledge base, continuing with an empty one");
                return T::default();
            }
        },
        None => bundled.to_string(),
    };
    match parse(&text) {
        Ok(base) => base,
        Err(e) => {
            error!(file, error = %e, "failed to parse knowledge base, continuing with an empty one");
            T::default()
        }
    }
}
