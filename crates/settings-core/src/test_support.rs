//! Fixtures shared by the unit tests.

use std::io::{Read, Write};

use crate::error::{Result, SettingsError};
use crate::format::{FormatAdapter, PersistedMapping};
use crate::marker::SaveLoad;
use crate::member::{MemberTable, Reflect};
use crate::value::Value;

/// Stores the mapping as a JSON array of externally tagged values.
pub(crate) struct SerdeFormat;

impl FormatAdapter for SerdeFormat {
    fn name(&self) -> &'static str {
        "serde-test"
    }

    fn encode(&self, mapping: &PersistedMapping, writer: &mut dyn Write) -> Result<()> {
        let entries: Vec<(&str, &Value)> = mapping.iter().collect();
        serde_json::to_writer(writer, &entries).map_err(|e| SettingsError::Encode {
            format: self.name(),
            source: Box::new(e),
        })
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<Option<PersistedMapping>> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| SettingsError::Decode {
                format: self.name(),
                source: Box::new(e),
            })?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<Vec<(String, Value)>>(&text) {
            Ok(entries) => Ok(Some(entries.into_iter().collect())),
            Err(err) => {
                tracing::warn!(error = %err, "Test settings input does not parse");
                Ok(None)
            }
        }
    }
}

/// Encode a mapping the way [`SerdeFormat`] would.
pub(crate) fn encoded(entries: &[(&str, Value)]) -> Vec<u8> {
    let mapping: PersistedMapping = entries.iter().cloned().collect();
    let mut bytes = Vec::new();
    SerdeFormat.encode(&mapping, &mut bytes).unwrap();
    bytes
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Counter {
    pub label: String,
    pub count: u32,
    pub ratio: Option<f64>,
    pub scratch: i64,
}

impl Counter {
    fn doubled(&self) -> u32 {
        self.count * 2
    }

    fn set_doubled(&mut self, value: u32) {
        self.count = value / 2;
    }
}

impl Reflect for Counter {
    fn type_name() -> &'static str {
        "Counter"
    }

    fn members(table: &mut MemberTable<Self>) {
        table
            .field("label", |c| &c.label, |c| &mut c.label)
            .public()
            .marked::<SaveLoad>();
        table
            .field("count", |c| &c.count, |c| &mut c.count)
            .marked::<SaveLoad>();
        table
            .field("ratio", |c| &c.ratio, |c| &mut c.ratio)
            .marked::<SaveLoad>();
        table.field("scratch", |c| &c.scratch, |c| &mut c.scratch);
        table
            .property("doubled", Counter::doubled, Counter::set_doubled)
            .marked::<SaveLoad>();
    }
}

/// A type with nothing registered.
#[derive(Debug, Default)]
pub(crate) struct Opaque;

impl Reflect for Opaque {
    fn members(_table: &mut MemberTable<Self>) {}
}

/// A type whose members carry no marker.
#[derive(Debug, Default)]
pub(crate) struct Unmarked {
    pub width: u16,
}

impl Reflect for Unmarked {
    fn members(table: &mut MemberTable<Self>) {
        table.field("width", |u| &u.width, |u| &mut u.width);
    }
}
