//! Settings error types.
//!
//! Every fatal decision point of a save or load has its own variant, so a
//! caller matching on the error can tell exactly which hook gave up. The
//! engine never translates these: whatever a handler returns is what the
//! caller sees.

use std::path::PathBuf;
use thiserror::Error;

use crate::value::ValueType;

/// Settings operation error.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// No descriptor is attached to the type being saved or loaded.
    #[error("No settings descriptor attached to {type_name}")]
    NoDescriptors { type_name: &'static str },

    /// The decision handler was already linked to another descriptor.
    #[error("Decision handler is already linked to descriptor #{linked_to}")]
    HandlerAlreadyLinked { linked_to: u64 },

    /// The type exposes no members that pass the descriptor's filter.
    #[error("No members found on {type_name}")]
    NoMembersFound { type_name: &'static str },

    /// Members exist but none carries the descriptor's marker.
    #[error("No members of {type_name} carry the {marker} marker")]
    NoMarkedMembersFound {
        type_name: &'static str,
        marker: &'static str,
    },

    /// The settings file does not exist.
    #[error("No settings file found: {path}")]
    NoFileFound { path: PathBuf },

    /// The settings file decoded to nothing.
    #[error("No members read from settings file: {path}")]
    EmptyLoadFile { path: PathBuf },

    /// A persisted entry names a member the type does not have.
    #[error("No member named '{name}' on {type_name}")]
    NoTargetMember {
        name: String,
        type_name: &'static str,
    },

    /// A persisted null was headed for a non-nullable member.
    #[error("Null found for non-nullable member '{member}' ({expected})")]
    NonNullableNull { member: String, expected: ValueType },

    /// A persisted value does not fit the member's declared type.
    #[error("Type mismatch for member '{member}': expected {expected}, found {found}")]
    TypeMismatch {
        member: String,
        expected: ValueType,
        found: &'static str,
    },

    /// A value accepted for writing could not be stored in the member.
    #[error("Value of type {found} cannot be stored in member '{member}' ({expected})")]
    Coercion {
        member: String,
        expected: ValueType,
        found: &'static str,
    },

    /// File I/O error.
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The format adapter could not encode the mapping.
    #[error("Failed to encode settings as {format}")]
    Encode {
        format: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The format adapter could not decode the stream.
    #[error("Failed to decode {format} settings")]
    Decode {
        format: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A custom decision handler refused to continue.
    #[error("{0}")]
    Handler(String),
}

impl SettingsError {
    /// Build an I/O error for the given operation and path.
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoDescriptors { type_name } => {
                format!("{type_name} has no settings file configured.")
            }
            Self::HandlerAlreadyLinked { .. } => {
                "A decision handler can only serve one settings descriptor.".to_string()
            }
            Self::NoMembersFound { type_name } => {
                format!("{type_name} has no members that can be saved or loaded.")
            }
            Self::NoMarkedMembersFound { type_name, marker } => {
                format!("None of the members of {type_name} are marked with {marker}.")
            }
            Self::NoFileFound { path } => {
                format!("The settings file {} does not exist.", path.display())
            }
            Self::EmptyLoadFile { path } => {
                format!("The settings file {} contains no settings.", path.display())
            }
            Self::NoTargetMember { name, .. } => {
                format!("The settings file contains '{name}', which is not a known setting.")
            }
            Self::NonNullableNull { member, .. } => {
                format!("The setting '{member}' is empty but a value is required.")
            }
            Self::TypeMismatch {
                member,
                expected,
                found,
            }
            | Self::Coercion {
                member,
                expected,
                found,
            } => {
                format!("The setting '{member}' should be {expected} but the file holds {found}.")
            }
            Self::Io {
                operation, path, ..
            } => {
                format!("Could not {} the file at {}", operation, path.display())
            }
            Self::Encode { format, .. } => {
                format!("An error occurred while writing the {format} settings.")
            }
            Self::Decode { format, .. } => {
                format!("The {format} settings file could not be read. It may be corrupted.")
            }
            Self::Handler(message) => message.clone(),
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NoDescriptors { .. } => {
                Some("Attach a settings descriptor to the type before saving or loading.".into())
            }
            Self::HandlerAlreadyLinked { .. } => {
                Some("Create a separate handler instance for each descriptor.".into())
            }
            Self::NoMarkedMembersFound { .. } => {
                Some("Mark the members that should be persisted with the descriptor's marker.".into())
            }
            Self::NoFileFound { .. } => {
                Some("Save the settings once, or use a handler that creates defaults.".into())
            }
            Self::Io { operation, .. } => {
                if *operation == "read" || *operation == "open" {
                    Some("Check that the file exists and you have permission to read it.".into())
                } else {
                    Some("Check that you have permission to write to this location.".into())
                }
            }
            Self::Decode { .. } | Self::EmptyLoadFile { .. } => {
                Some("Delete the settings file to start again from defaults.".into())
            }
            Self::TypeMismatch { .. } | Self::NonNullableNull { .. } | Self::Coercion { .. } => {
                Some("Correct the value in the settings file or remove the entry.".into())
            }
            Self::NoMembersFound { .. }
            | Self::NoTargetMember { .. }
            | Self::Encode { .. }
            | Self::Handler(_) => None,
        }
    }
}

/// Result type alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TypeTag;

    #[test]
    fn test_type_mismatch_message() {
        let err = SettingsError::TypeMismatch {
            member: "width".to_string(),
            expected: ValueType::new(TypeTag::I32),
            found: "string",
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch for member 'width': expected i32, found string"
        );
        assert!(err.user_message().contains("'width'"));
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_io_suggestion_depends_on_operation() {
        let read = SettingsError::io("open", "a.json", std::io::Error::other("x"));
        let write = SettingsError::io("create", "a.json", std::io::Error::other("x"));
        assert!(read.suggestion().unwrap().contains("read"));
        assert!(write.suggestion().unwrap().contains("write"));
    }
}
