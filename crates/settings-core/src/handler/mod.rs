//! Decision handlers.
//!
//! Every point where a save or load cannot simply carry on is forwarded to
//! the descriptor's [`DecisionHandler`]. Each hook defaults to a fatal
//! [`SettingsError`]; handlers override the hooks they want to relax.
//!
//! Provided handlers:
//!
//! - [`FatalHandler`] - every hook fails
//! - [`PolicyHandler`] - one optional closure per hook
//! - [`CreateDefaultsHandler`] - writes the target's current values when the
//!   file is missing

mod defaults;
mod fatal;
mod policy;

use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

pub use defaults::CreateDefaultsHandler;
pub use fatal::FatalHandler;
pub use policy::PolicyHandler;

use crate::descriptor::{DescriptorId, SettingsDescriptor};
use crate::error::{Result, SettingsError};
use crate::marker::MarkerLink;
use crate::member::{Member, Reflect};
use crate::value::Value;

/// What to do with a persisted entry that names no member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoTargetMemberOutcome {
    /// Skip the entry and go on with the next one.
    Continue,
    /// Stop the load. Entries already applied stay applied.
    Break,
}

/// What to do with a value that does not fit its member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadOutcome {
    /// Leave the member untouched and go on.
    Skip,
    /// Write the (possibly replaced) value into the member.
    ExplicitSet,
    /// Stop the load. Entries already applied stay applied.
    Break,
}

/// One-shot link between a handler and the descriptor it serves.
#[derive(Debug, Default)]
pub struct HandlerLink {
    descriptor: OnceLock<DescriptorId>,
}

impl HandlerLink {
    pub const fn new() -> Self {
        Self {
            descriptor: OnceLock::new(),
        }
    }

    /// Link to `descriptor`. Returns `false` if already linked.
    pub fn link(&self, descriptor: DescriptorId) -> bool {
        self.descriptor.set(descriptor).is_ok()
    }

    pub fn linked_to(&self) -> Option<DescriptorId> {
        self.descriptor.get().copied()
    }
}

/// What a hook knows about the call it was invoked from.
pub struct HookContext<'a, T: Reflect> {
    descriptor: &'a SettingsDescriptor<T>,
}

impl<'a, T: Reflect> HookContext<'a, T> {
    pub(crate) fn new(descriptor: &'a SettingsDescriptor<T>) -> Self {
        Self { descriptor }
    }

    /// The descriptor whose save or load is running.
    pub fn descriptor(&self) -> &'a SettingsDescriptor<T> {
        self.descriptor
    }

    pub fn path(&self) -> &'a Path {
        self.descriptor.path()
    }

    pub fn marker(&self) -> MarkerLink {
        self.descriptor.marker()
    }

    pub fn type_name(&self) -> &'static str {
        T::type_name()
    }
}

/// Policy consulted at each failure or ambiguity during save and load.
///
/// Hooks run synchronously inside the call that triggered them. A hook that
/// returns an error ends the save or load with exactly that error.
pub trait DecisionHandler<T: Reflect>: Send + Sync {
    /// Link slot checked when a descriptor is built.
    fn link_slot(&self) -> &HandlerLink;

    /// A persisted entry names no member of the target.
    fn on_no_target_member_found(
        &self,
        cx: &HookContext<'_, T>,
        _caller: &mut T,
        name: &str,
        _value: &Value,
    ) -> Result<NoTargetMemberOutcome> {
        Err(SettingsError::NoTargetMember {
            name: name.to_string(),
            type_name: cx.type_name(),
        })
    }

    /// A persisted null is headed for a non-nullable member.
    ///
    /// The hook may replace `value` before answering
    /// [`PayloadOutcome::ExplicitSet`].
    fn on_non_nullable_null(
        &self,
        _cx: &HookContext<'_, T>,
        _caller: &mut T,
        member: &Member<T>,
        _value: &mut Value,
    ) -> Result<PayloadOutcome> {
        Err(SettingsError::NonNullableNull {
            member: member.name().to_string(),
            expected: member.declared_type(),
        })
    }

    /// A persisted value's type does not match the member.
    ///
    /// The hook may replace `value` before answering
    /// [`PayloadOutcome::ExplicitSet`].
    fn on_type_mismatch(
        &self,
        _cx: &HookContext<'_, T>,
        _caller: &mut T,
        member: &Member<T>,
        value: &mut Value,
    ) -> Result<PayloadOutcome> {
        Err(SettingsError::TypeMismatch {
            member: member.name().to_string(),
            expected: member.declared_type(),
            found: value.type_name(),
        })
    }

    /// The settings file does not exist.
    ///
    /// Return a stream to decode in its place, or `None` to end the load
    /// quietly.
    fn on_no_file_found(
        &self,
        cx: &HookContext<'_, T>,
        _caller: &mut T,
    ) -> Result<Option<Box<dyn Read>>> {
        Err(SettingsError::NoFileFound {
            path: cx.path().to_path_buf(),
        })
    }

    /// The file decoded to nothing. The load ends either way.
    fn on_empty_load_file(&self, cx: &HookContext<'_, T>, _caller: &mut T) -> Result<()> {
        Err(SettingsError::EmptyLoadFile {
            path: cx.path().to_path_buf(),
        })
    }

    /// No member passed the descriptor's filter.
    fn on_no_members_found(&self, cx: &HookContext<'_, T>, _caller: &T) -> Result<()> {
        Err(SettingsError::NoMembersFound {
            type_name: cx.type_name(),
        })
    }

    /// Members exist but none carries the descriptor's marker.
    fn on_no_marked_members_found(&self, cx: &HookContext<'_, T>, _caller: &T) -> Result<()> {
        Err(SettingsError::NoMarkedMembersFound {
            type_name: cx.type_name(),
            marker: cx.marker().name(),
        })
    }
}
