//! Closure-based handler.

use std::fmt;
use std::io::Read;

use super::{
    DecisionHandler, FatalHandler, HandlerLink, HookContext, NoTargetMemberOutcome,
    PayloadOutcome,
};
use crate::error::Result;
use crate::member::{Member, Reflect};
use crate::value::Value;

type NoTargetFn<T> = Box<
    dyn Fn(&HookContext<'_, T>, &mut T, &str, &Value) -> Result<NoTargetMemberOutcome>
        + Send
        + Sync,
>;
type PayloadFn<T> = Box<
    dyn Fn(&HookContext<'_, T>, &mut T, &Member<T>, &mut Value) -> Result<PayloadOutcome>
        + Send
        + Sync,
>;
type NoFileFn<T> =
    Box<dyn Fn(&HookContext<'_, T>, &mut T) -> Result<Option<Box<dyn Read>>> + Send + Sync>;
type EmptyFileFn<T> = Box<dyn Fn(&HookContext<'_, T>, &mut T) -> Result<()> + Send + Sync>;
type NoticeFn<T> = Box<dyn Fn(&HookContext<'_, T>, &T) -> Result<()> + Send + Sync>;

/// A handler assembled from one optional closure per hook.
///
/// Hooks without a closure behave like [`FatalHandler`].
///
/// ```ignore
/// let handler = PolicyHandler::new()
///     .with_type_mismatch(|_, _, _, _| Ok(PayloadOutcome::Skip))
///     .with_no_file_found(|_, _| Ok(None));
/// ```
pub struct PolicyHandler<T: Reflect> {
    link: HandlerLink,
    fatal: FatalHandler,
    no_target_member: Option<NoTargetFn<T>>,
    non_nullable_null: Option<PayloadFn<T>>,
    type_mismatch: Option<PayloadFn<T>>,
    no_file: Option<NoFileFn<T>>,
    empty_load_file: Option<EmptyFileFn<T>>,
    no_members: Option<NoticeFn<T>>,
    no_marked_members: Option<NoticeFn<T>>,
}

impl<T: Reflect> Default for PolicyHandler<T> {
    fn default() -> Self {
        Self {
            link: HandlerLink::new(),
            fatal: FatalHandler::new(),
            no_target_member: None,
            non_nullable_null: None,
            type_mismatch: None,
            no_file: None,
            empty_load_file: None,
            no_members: None,
            no_marked_members: None,
        }
    }
}

impl<T: Reflect> PolicyHandler<T> {
    /// A handler with every hook fatal.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that never fails.
    ///
    /// Unknown entries are skipped, bad payloads leave their member alone, a
    /// missing or empty file ends the load, and empty discovery is a no-op.
    pub fn lenient() -> Self {
        Self::new()
            .with_no_target_member_found(|_, _, _, _| Ok(NoTargetMemberOutcome::Continue))
            .with_non_nullable_null(|_, _, _, _| Ok(PayloadOutcome::Skip))
            .with_type_mismatch(|_, _, _, _| Ok(PayloadOutcome::Skip))
            .with_no_file_found(|_, _| Ok(None))
            .with_empty_load_file(|_, _| Ok(()))
            .with_no_members_found(|_, _| Ok(()))
            .with_no_marked_members_found(|_, _| Ok(()))
    }

    /// Convert mismatched values losslessly where possible, skip otherwise.
    #[must_use]
    pub fn coerce_mismatches(self) -> Self {
        self.with_type_mismatch(|_, _, member, value| {
            match value.coerce_to(member.declared_type().tag) {
                Some(coerced) => {
                    tracing::debug!(
                        member = member.name(),
                        from = value.type_name(),
                        to = %member.declared_type(),
                        "Coerced setting value"
                    );
                    *value = coerced;
                    Ok(PayloadOutcome::ExplicitSet)
                }
                None => Ok(PayloadOutcome::Skip),
            }
        })
    }

    #[must_use]
    pub fn with_no_target_member_found<F>(mut self, f: F) -> Self
    where
        F: Fn(&HookContext<'_, T>, &mut T, &str, &Value) -> Result<NoTargetMemberOutcome>
            + Send
            + Sync
            + 'static,
    {
        self.no_target_member = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_non_nullable_null<F>(mut self, f: F) -> Self
    where
        F: Fn(&HookContext<'_, T>, &mut T, &Member<T>, &mut Value) -> Result<PayloadOutcome>
            + Send
            + Sync
            + 'static,
    {
        self.non_nullable_null = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_type_mismatch<F>(mut self, f: F) -> Self
    where
        F: Fn(&HookContext<'_, T>, &mut T, &Member<T>, &mut Value) -> Result<PayloadOutcome>
            + Send
            + Sync
            + 'static,
    {
        self.type_mismatch = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_no_file_found<F>(mut self, f: F) -> Self
    where
        F: Fn(&HookContext<'_, T>, &mut T) -> Result<Option<Box<dyn Read>>>
            + Send
            + Sync
            + 'static,
    {
        self.no_file = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_empty_load_file<F>(mut self, f: F) -> Self
    where
        F: Fn(&HookContext<'_, T>, &mut T) -> Result<()> + Send + Sync + 'static,
    {
        self.empty_load_file = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_no_members_found<F>(mut self, f: F) -> Self
    where
        F: Fn(&HookContext<'_, T>, &T) -> Result<()> + Send + Sync + 'static,
    {
        self.no_members = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_no_marked_members_found<F>(mut self, f: F) -> Self
    where
        F: Fn(&HookContext<'_, T>, &T) -> Result<()> + Send + Sync + 'static,
    {
        self.no_marked_members = Some(Box::new(f));
        self
    }
}

impl<T: Reflect> DecisionHandler<T> for PolicyHandler<T> {
    fn link_slot(&self) -> &HandlerLink {
        &self.link
    }

    fn on_no_target_member_found(
        &self,
        cx: &HookContext<'_, T>,
        caller: &mut T,
        name: &str,
        value: &Value,
    ) -> Result<NoTargetMemberOutcome> {
        match &self.no_target_member {
            Some(f) => f(cx, caller, name, value),
            None => self.fatal.on_no_target_member_found(cx, caller, name, value),
        }
    }

    fn on_non_nullable_null(
        &self,
        cx: &HookContext<'_, T>,
        caller: &mut T,
        member: &Member<T>,
        value: &mut Value,
    ) -> Result<PayloadOutcome> {
        match &self.non_nullable_null {
            Some(f) => f(cx, caller, member, value),
            None => self.fatal.on_non_nullable_null(cx, caller, member, value),
        }
    }

    fn on_type_mismatch(
        &self,
        cx: &HookContext<'_, T>,
        caller: &mut T,
        member: &Member<T>,
        value: &mut Value,
    ) -> Result<PayloadOutcome> {
        match &self.type_mismatch {
            Some(f) => f(cx, caller, member, value),
            None => self.fatal.on_type_mismatch(cx, caller, member, value),
        }
    }

    fn on_no_file_found(
        &self,
        cx: &HookContext<'_, T>,
        caller: &mut T,
    ) -> Result<Option<Box<dyn Read>>> {
        match &self.no_file {
            Some(f) => f(cx, caller),
            None => self.fatal.on_no_file_found(cx, caller),
        }
    }

    fn on_empty_load_file(&self, cx: &HookContext<'_, T>, caller: &mut T) -> Result<()> {
        match &self.empty_load_file {
            Some(f) => f(cx, caller),
            None => self.fatal.on_empty_load_file(cx, caller),
        }
    }

    fn on_no_members_found(&self, cx: &HookContext<'_, T>, caller: &T) -> Result<()> {
        match &self.no_members {
            Some(f) => f(cx, caller),
            None => self.fatal.on_no_members_found(cx, caller),
        }
    }

    fn on_no_marked_members_found(&self, cx: &HookContext<'_, T>, caller: &T) -> Result<()> {
        match &self.no_marked_members {
            Some(f) => f(cx, caller),
            None => self.fatal.on_no_marked_members_found(cx, caller),
        }
    }
}

impl<T: Reflect> fmt::Debug for PolicyHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyHandler")
            .field("link", &self.link)
            .field("no_target_member", &self.no_target_member.is_some())
            .field("non_nullable_null", &self.non_nullable_null.is_some())
            .field("type_mismatch", &self.type_mismatch.is_some())
            .field("no_file", &self.no_file.is_some())
            .field("empty_load_file", &self.empty_load_file.is_some())
            .field("no_members", &self.no_members.is_some())
            .field("no_marked_members", &self.no_marked_members.is_some())
            .finish()
    }
}
