//! Marker-driven persistence of object settings.
//!
//! A type registers its members once through [`Reflect`]. Members carrying a
//! marker (by default [`SaveLoad`]) are written to and read from a file by a
//! [`SettingsDescriptor`], which delegates the bytes to a [`FormatAdapter`]
//! and every questionable step to a [`DecisionHandler`].
//!
//! # Example
//!
//! ```ignore
//! use settings_core::{MemberTable, PolicyHandler, Reflect, SaveLoad, SettingsDescriptor};
//! use settings_json::JsonFormat;
//!
//! #[derive(Default)]
//! struct Window {
//!     width: u32,
//!     title: String,
//! }
//!
//! impl Reflect for Window {
//!     fn members(table: &mut MemberTable<Self>) {
//!         table.field("width", |w| &w.width, |w| &mut w.width).marked::<SaveLoad>();
//!         table.field("title", |w| &w.title, |w| &mut w.title).marked::<SaveLoad>();
//!     }
//! }
//!
//! let descriptor = SettingsDescriptor::<Window>::builder("window", JsonFormat::pretty())
//!     .handler(PolicyHandler::lenient())
//!     .build()?;
//!
//! let mut window = Window::default();
//! descriptor.load(&mut window)?;
//! window.width = 1280;
//! descriptor.save(&window)?;
//! ```
//!
//! # Architecture
//!
//! - `member.rs` - registration-based introspection
//! - `discovery.rs` - filtering members by visibility, origin and marker
//! - `descriptor/` - save and load of one persistence channel
//! - `handler/` - decision hooks and the provided handlers
//! - `registry.rs` - per-type attachment and caller-facing save/load
//! - `format.rs` - the adapter contract and the persisted mapping
//! - `value.rs` - tagged values and type coercion
//! - `error.rs` - error types with user-friendly messages

mod descriptor;
mod discovery;
mod error;
mod filter;
mod format;
mod handler;
mod marker;
mod member;
mod registry;
mod value;

#[cfg(test)]
mod test_support;

pub use descriptor::{
    DescriptorBuilder, DescriptorConfig, DescriptorId, SettingsDescriptor, WriteMode,
};
pub use discovery::{Discovery, MemberRecord, discover};
pub use error::{Result, SettingsError};
pub use filter::{MemberFilter, MemberOrigin, Visibility};
pub use format::{FormatAdapter, PersistedMapping};
pub use handler::{
    CreateDefaultsHandler, DecisionHandler, FatalHandler, HandlerLink, HookContext,
    NoTargetMemberOutcome, PayloadOutcome, PolicyHandler,
};
pub use marker::{Marker, MarkerLink, SaveLoad};
pub use member::{Member, MemberBuilder, MemberKind, MemberTable, Reflect};
pub use registry::{SettingsExt, SettingsRegistry};
pub use value::{SettingValue, TypeTag, Value, ValueType};
