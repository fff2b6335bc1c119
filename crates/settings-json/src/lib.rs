//! JSON format adapter for `settings-core`.
//!
//! Each settings file is one JSON object. Keys are member names in save
//! order; every value is wrapped with its type tag so a load can check it
//! against the member's declared type:
//!
//! ```text
//! {
//!   "width": { "type": "u32", "value": 1280 },
//!   "title": { "type": "string", "value": "Main" }
//! }
//! ```
//!
//! Hand-edited files may also use bare scalars (`"width": 1280`). Those are
//! read by their JSON shape, so integers come back as `i64` or `u64` and need
//! a coercing handler such as `PolicyHandler::coerce_mismatches`.
//!
//! # Example
//!
//! ```ignore
//! use settings_core::SettingsDescriptor;
//! use settings_json::JsonFormat;
//!
//! let descriptor = SettingsDescriptor::<Window>::builder("window", JsonFormat::pretty())
//!     .build()?;
//! assert_eq!(descriptor.path(), Path::new("window.json"));
//! ```

mod envelope;
mod format;

pub use format::JsonFormat;
