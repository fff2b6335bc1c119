//! The default handler.

use super::{DecisionHandler, HandlerLink};
use crate::member::Reflect;

/// Fails at every decision point.
///
/// Descriptors built without a handler get one of these.
#[derive(Debug, Default)]
pub struct FatalHandler {
    link: HandlerLink,
}

impl FatalHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Reflect> DecisionHandler<T> for FatalHandler {
    fn link_slot(&self) -> &HandlerLink {
        &self.link
    }
}
