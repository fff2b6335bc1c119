//! Per-type descriptor registry.
//!
//! Owner objects do not carry their descriptors. They are attached here, keyed
//! by type, and every save or load of a type runs all of its descriptors in
//! attachment order. The `*_inherited` variants first run the descriptors of
//! every base the type embeds through [`MemberTable::inherit`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::descriptor::SettingsDescriptor;
use crate::error::{Result, SettingsError};
use crate::member::{MemberTable, Reflect};

/// Descriptors attached to each persistable type.
#[derive(Default)]
pub struct SettingsRegistry {
    // Each value is a `Vec<SettingsDescriptor<T>>` for the keyed `T`.
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl SettingsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `descriptor` after any already attached to `T`.
    pub fn attach<T: Reflect>(&mut self, descriptor: SettingsDescriptor<T>) -> &mut Self {
        tracing::debug!(
            descriptor = %descriptor.id(),
            type_name = T::type_name(),
            path = %descriptor.path().display(),
            "Attached settings descriptor"
        );
        let slot = self
            .entries
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Vec::<SettingsDescriptor<T>>::new()));
        if let Some(list) = slot.downcast_mut::<Vec<SettingsDescriptor<T>>>() {
            list.push(descriptor);
        }
        self
    }

    /// Descriptors attached to `T`, in attachment order.
    pub fn descriptors<T: Reflect>(&self) -> &[SettingsDescriptor<T>] {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_ref::<Vec<SettingsDescriptor<T>>>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Save `target` through every descriptor attached to `T`.
    ///
    /// Stops at the first descriptor that fails.
    pub fn save<T: Reflect>(&self, target: &T) -> Result<()> {
        for descriptor in self.attached::<T>()? {
            descriptor.save(target)?;
        }
        Ok(())
    }

    /// Load `target` through every descriptor attached to `T`.
    ///
    /// Later descriptors overwrite members loaded by earlier ones.
    pub fn load<T: Reflect>(&self, target: &mut T) -> Result<()> {
        for descriptor in self.attached::<T>()? {
            descriptor.load(target)?;
        }
        Ok(())
    }

    /// Save `target` through the descriptors of its inherited bases, then
    /// through its own.
    ///
    /// Bases are visited depth first in registration order. Fails with
    /// `NoDescriptors` only when no descriptor ran at all.
    pub fn save_inherited<T: Reflect>(&self, target: &T) -> Result<()> {
        if self.run_save(target)? == 0 {
            return Err(SettingsError::NoDescriptors {
                type_name: T::type_name(),
            });
        }
        Ok(())
    }

    /// Load `target` through the descriptors of its inherited bases, then
    /// through its own, so the type's own files win.
    pub fn load_inherited<T: Reflect>(&self, target: &mut T) -> Result<()> {
        if self.run_load(target)? == 0 {
            return Err(SettingsError::NoDescriptors {
                type_name: T::type_name(),
            });
        }
        Ok(())
    }

    pub(crate) fn run_save<T: Reflect>(&self, target: &T) -> Result<usize> {
        let mut ran = 0;
        for base in MemberTable::<T>::of().bases() {
            tracing::debug!(
                type_name = T::type_name(),
                base = base.type_name(),
                "Saving base settings"
            );
            ran += base.save(self, target)?;
        }
        for descriptor in self.descriptors::<T>() {
            descriptor.save(target)?;
            ran += 1;
        }
        Ok(ran)
    }

    pub(crate) fn run_load<T: Reflect>(&self, target: &mut T) -> Result<usize> {
        let mut ran = 0;
        for base in MemberTable::<T>::of().bases() {
            tracing::debug!(
                type_name = T::type_name(),
                base = base.type_name(),
                "Loading base settings"
            );
            ran += base.load(self, target)?;
        }
        for descriptor in self.descriptors::<T>() {
            descriptor.load(target)?;
            ran += 1;
        }
        Ok(ran)
    }

    fn attached<T: Reflect>(&self) -> Result<&[SettingsDescriptor<T>]> {
        let descriptors = self.descriptors::<T>();
        if descriptors.is_empty() {
            return Err(SettingsError::NoDescriptors {
                type_name: T::type_name(),
            });
        }
        Ok(descriptors)
    }
}

impl fmt::Debug for SettingsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsRegistry")
            .field("types", &self.entries.len())
            .finish()
    }
}

/// `save_settings` / `load_settings` on every persistable type.
pub trait SettingsExt: Reflect {
    fn save_settings(&self, registry: &SettingsRegistry) -> Result<()> {
        registry.save(self)
    }

    fn load_settings(&mut self, registry: &SettingsRegistry) -> Result<()> {
        registry.load(self)
    }

    fn save_settings_inherited(&self, registry: &SettingsRegistry) -> Result<()> {
        registry.save_inherited(self)
    }

    fn load_settings_inherited(&mut self, registry: &SettingsRegistry) -> Result<()> {
        registry.load_inherited(self)
    }
}

impl<T: Reflect> SettingsExt for T {}
