//! Load-or-initialize handler.

use std::io::Read;

use super::{DecisionHandler, HandlerLink, HookContext};
use crate::error::Result;
use crate::member::Reflect;

/// Creates the settings file from the target's current values on first load.
///
/// A missing file is answered by saving the target through the owning
/// descriptor and ending the load, so the in-memory defaults stay in place.
/// An empty file is ignored. Every other hook is fatal.
///
/// Only the owning descriptor's file is written, not the files of other
/// descriptors attached to the same type in a
/// [`SettingsRegistry`](crate::SettingsRegistry). Through a registry load each
/// descriptor linked to its own `CreateDefaultsHandler` creates its own file.
#[derive(Debug, Default)]
pub struct CreateDefaultsHandler {
    link: HandlerLink,
}

impl CreateDefaultsHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Reflect> DecisionHandler<T> for CreateDefaultsHandler {
    fn link_slot(&self) -> &HandlerLink {
        &self.link
    }

    fn on_no_file_found(
        &self,
        cx: &HookContext<'_, T>,
        caller: &mut T,
    ) -> Result<Option<Box<dyn Read>>> {
        tracing::info!(
            path = %cx.path().display(),
            "No settings file, writing defaults"
        );
        cx.descriptor().save(caller)?;
        Ok(None)
    }

    fn on_empty_load_file(&self, cx: &HookContext<'_, T>, _caller: &mut T) -> Result<()> {
        tracing::debug!(path = %cx.path().display(), "Settings file is empty, keeping defaults");
        Ok(())
    }
}
