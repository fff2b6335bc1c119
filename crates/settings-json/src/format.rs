//! The JSON format adapter.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use settings_core::{FormatAdapter, PersistedMapping, Result, SettingsError};

use crate::envelope::{DecodedMapping, Envelope};

const FORMAT_NAME: &str = "json";

/// Stores settings as a JSON object of tagged entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonFormat {
    pretty: bool,
}

impl JsonFormat {
    /// Two-space indentation and a trailing newline.
    pub const fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Everything on one line.
    pub const fn compact() -> Self {
        Self { pretty: false }
    }

    #[inline]
    pub fn is_pretty(&self) -> bool {
        self.pretty
    }
}

impl Default for JsonFormat {
    fn default() -> Self {
        Self::pretty()
    }
}

fn encode_error(source: impl std::error::Error + Send + Sync + 'static) -> SettingsError {
    SettingsError::Encode {
        format: FORMAT_NAME,
        source: Box::new(source),
    }
}

fn decode_error(source: impl std::error::Error + Send + Sync + 'static) -> SettingsError {
    SettingsError::Decode {
        format: FORMAT_NAME,
        source: Box::new(source),
    }
}

fn parse(text: &str) -> serde_json::Result<Option<DecodedMapping>> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let decoded = Option::<DecodedMapping>::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(decoded)
}

impl FormatAdapter for JsonFormat {
    fn name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn encode(&self, mapping: &PersistedMapping, writer: &mut dyn Write) -> Result<()> {
        let envelope = Envelope(mapping);
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &envelope).map_err(encode_error)?;
            writer.write_all(b"\n").map_err(encode_error)?;
        } else {
            serde_json::to_writer(&mut *writer, &envelope).map_err(encode_error)?;
        }
        Ok(())
    }

    /// Blank input, a top-level `null` and input that does not parse as an
    /// envelope all decode to `None`. Only a failed read is an error.
    fn decode(&self, reader: &mut dyn Read) -> Result<Option<PersistedMapping>> {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(decode_error)?;
        if text.trim().is_empty() {
            tracing::debug!("Settings input is blank");
            return Ok(None);
        }

        match parse(&text) {
            Ok(decoded) => Ok(decoded.map(|DecodedMapping(mapping)| mapping)),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "Settings input is not a JSON envelope, treating it as empty"
                );
                Ok(None)
            }
        }
    }

    /// Appends `.json` to paths without an extension.
    fn realize_path(&self, path: &Path) -> PathBuf {
        if path.extension().is_some() {
            path.to_path_buf()
        } else {
            path.with_extension(FORMAT_NAME)
        }
    }
}
