//! Settings descriptors.
//!
//! A descriptor binds one persistence channel of a type: the file it lives
//! in, the format adapter that encodes it, which members take part, and the
//! decision handler consulted when something does not line up.
//!
//! - `save.rs` - writing the marked members of a target
//! - `load.rs` - applying a decoded mapping to a target
//! - `config.rs` - serializable descriptor configuration

mod config;
mod load;
mod save;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub use config::{DescriptorConfig, WriteMode};

use crate::error::{Result, SettingsError};
use crate::filter::MemberFilter;
use crate::format::FormatAdapter;
use crate::handler::{DecisionHandler, FatalHandler};
use crate::marker::{Marker, MarkerLink};
use crate::member::Reflect;

static NEXT_DESCRIPTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique descriptor identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorId(u64);

impl DescriptorId {
    fn next() -> Self {
        Self(NEXT_DESCRIPTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One persistence channel for values of `T`.
///
/// Immutable once built. Save and load are synchronous and must not run
/// concurrently against the same file.
pub struct SettingsDescriptor<T: Reflect> {
    id: DescriptorId,
    path: PathBuf,
    filter: MemberFilter,
    include_properties: bool,
    marker: MarkerLink,
    write_mode: WriteMode,
    handler: Arc<dyn DecisionHandler<T>>,
    format: Box<dyn FormatAdapter>,
}

impl<T: Reflect> SettingsDescriptor<T> {
    /// Start building a descriptor for `path` in the given format.
    pub fn builder(
        path: impl Into<PathBuf>,
        format: impl FormatAdapter + 'static,
    ) -> DescriptorBuilder<T> {
        DescriptorBuilder {
            path: path.into(),
            format: Box::new(format),
            filter: MemberFilter::default(),
            include_properties: false,
            marker: MarkerLink::default(),
            write_mode: WriteMode::default(),
            handler: None,
        }
    }

    /// Build a descriptor from configuration with the default handler.
    pub fn from_config(
        config: &DescriptorConfig,
        format: impl FormatAdapter + 'static,
    ) -> Result<Self> {
        Self::builder(config.path.clone(), format)
            .filter(config.filter)
            .include_properties(config.include_properties)
            .write_mode(config.write_mode)
            .build()
    }

    #[inline]
    pub fn id(&self) -> DescriptorId {
        self.id
    }

    /// Path as realized by the format adapter.
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn filter(&self) -> MemberFilter {
        self.filter
    }

    #[inline]
    pub fn include_properties(&self) -> bool {
        self.include_properties
    }

    #[inline]
    pub fn marker(&self) -> MarkerLink {
        self.marker
    }

    #[inline]
    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    pub fn format_name(&self) -> &'static str {
        self.format.name()
    }
}

impl<T: Reflect> fmt::Debug for SettingsDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsDescriptor")
            .field("id", &self.id)
            .field("type", &T::type_name())
            .field("path", &self.path)
            .field("format", &self.format.name())
            .field("filter", &self.filter)
            .field("include_properties", &self.include_properties)
            .field("marker", &self.marker)
            .field("write_mode", &self.write_mode)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SettingsDescriptor`].
pub struct DescriptorBuilder<T: Reflect> {
    path: PathBuf,
    format: Box<dyn FormatAdapter>,
    filter: MemberFilter,
    include_properties: bool,
    marker: MarkerLink,
    write_mode: WriteMode,
    handler: Option<Arc<dyn DecisionHandler<T>>>,
}

impl<T: Reflect> DescriptorBuilder<T> {
    #[must_use]
    pub fn filter(mut self, filter: MemberFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Let properties take part alongside fields.
    #[must_use]
    pub fn include_properties(mut self, enable: bool) -> Self {
        self.include_properties = enable;
        self
    }

    /// Persist members carrying marker `M` instead of [`SaveLoad`](crate::SaveLoad).
    #[must_use]
    pub fn marker<M: Marker>(self) -> Self {
        self.marker_link(MarkerLink::of::<M>())
    }

    #[must_use]
    pub fn marker_link(mut self, marker: MarkerLink) -> Self {
        self.marker = marker;
        self
    }

    #[must_use]
    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Use `handler` for this descriptor only.
    #[must_use]
    pub fn handler(self, handler: impl DecisionHandler<T> + 'static) -> Self {
        self.shared_handler(Arc::new(handler))
    }

    /// Use a handler the caller keeps a reference to.
    ///
    /// [`build`](Self::build) fails if it already serves another descriptor.
    #[must_use]
    pub fn shared_handler(mut self, handler: Arc<dyn DecisionHandler<T>>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Link the handler and finish the descriptor.
    pub fn build(self) -> Result<SettingsDescriptor<T>> {
        let id = DescriptorId::next();
        let handler: Arc<dyn DecisionHandler<T>> = match self.handler {
            Some(handler) => handler,
            None => Arc::new(FatalHandler::new()),
        };

        let link = handler.link_slot();
        if !link.link(id) {
            return Err(SettingsError::HandlerAlreadyLinked {
                linked_to: link.linked_to().map_or(0, DescriptorId::get),
            });
        }

        let path = self.format.realize_path(&self.path);
        tracing::debug!(
            descriptor = %id,
            type_name = T::type_name(),
            path = %path.display(),
            format = self.format.name(),
            "Built settings descriptor"
        );

        Ok(SettingsDescriptor {
            id,
            path,
            filter: self.filter,
            include_properties: self.include_properties,
            marker: self.marker,
            write_mode: self.write_mode,
            handler,
            format: self.format,
        })
    }
}
