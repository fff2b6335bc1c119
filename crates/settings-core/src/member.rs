//! Member tables.
//!
//! Rust has no runtime reflection, so each persistable type registers its
//! members once through [`Reflect::members`]. The table stores a name, a
//! declared type, markers, and a pair of accessors per member; discovery and
//! the descriptors work entirely off that table.
//!
//! ```ignore
//! impl Reflect for Window {
//!     fn members(table: &mut MemberTable<Self>) {
//!         table.field("width", |w| &w.width, |w| &mut w.width).marked::<SaveLoad>();
//!         table.field("title", |w| &w.title, |w| &mut w.title).public().marked::<SaveLoad>();
//!         table.property("area", Window::area, Window::set_area).marked::<SaveLoad>();
//!         table.field("scratch", |w| &w.scratch, |w| &mut w.scratch);
//!     }
//! }
//! ```

use crate::error::Result as SettingsResult;
use crate::filter::{MemberOrigin, Visibility};
use crate::marker::{Marker, MarkerLink};
use crate::registry::SettingsRegistry;
use crate::value::{SettingValue, Value, ValueType};

/// A type whose members can be discovered by name.
pub trait Reflect: Sized + 'static {
    /// Name used in logs and errors.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Register this type's members.
    fn members(table: &mut MemberTable<Self>);
}

/// Whether a member is stored directly or goes through accessor methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Property,
}

type ReadFn<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;
type WriteFn<T> = Box<dyn Fn(&mut T, Value) -> Result<(), Value> + Send + Sync>;

/// One registered member of `T`.
pub struct Member<T> {
    name: &'static str,
    kind: MemberKind,
    declared_type: ValueType,
    visibility: Visibility,
    origin: MemberOrigin,
    markers: Vec<MarkerLink>,
    read: ReadFn<T>,
    write: WriteFn<T>,
}

impl<T> Member<T> {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    #[inline]
    pub fn declared_type(&self) -> ValueType {
        self.declared_type
    }

    #[inline]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    #[inline]
    pub fn origin(&self) -> MemberOrigin {
        self.origin
    }

    pub fn markers(&self) -> &[MarkerLink] {
        &self.markers
    }

    /// Whether any attached marker is related to `link`.
    pub fn carries(&self, link: &MarkerLink) -> bool {
        self.markers.iter().any(|m| m.is_related(link))
    }

    /// Read the member's current value.
    pub fn read(&self, target: &T) -> Value {
        (self.read)(target)
    }

    /// Store `value` in the member.
    ///
    /// Hands the value back if it does not fit the declared type.
    pub fn write(&self, target: &mut T, value: Value) -> Result<(), Value> {
        (self.write)(target, value)
    }
}

impl<T> std::fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("declared_type", &self.declared_type)
            .field("visibility", &self.visibility)
            .field("origin", &self.origin)
            .field("markers", &self.markers)
            .finish_non_exhaustive()
    }
}

type BaseSaveFn<T> = Box<dyn Fn(&SettingsRegistry, &T) -> SettingsResult<usize> + Send + Sync>;
type BaseLoadFn<T> =
    Box<dyn Fn(&SettingsRegistry, &mut T) -> SettingsResult<usize> + Send + Sync>;

/// An embedded base registered through [`MemberTable::inherit`].
///
/// Runs the registry descriptors of the base type against the embedded value.
pub(crate) struct BaseLink<T> {
    type_name: &'static str,
    save: BaseSaveFn<T>,
    load: BaseLoadFn<T>,
}

impl<T> BaseLink<T> {
    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Save through the base's descriptors; returns how many ran.
    pub(crate) fn save(&self, registry: &SettingsRegistry, target: &T) -> SettingsResult<usize> {
        (self.save)(registry, target)
    }

    /// Load through the base's descriptors; returns how many ran.
    pub(crate) fn load(
        &self,
        registry: &SettingsRegistry,
        target: &mut T,
    ) -> SettingsResult<usize> {
        (self.load)(registry, target)
    }
}

/// Registration-ordered members of `T`.
pub struct MemberTable<T> {
    members: Vec<Member<T>>,
    bases: Vec<BaseLink<T>>,
}

impl<T> Default for MemberTable<T> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            bases: Vec::new(),
        }
    }
}

impl<T: Reflect> MemberTable<T> {
    /// Build the table for `T` from its registration.
    pub fn of() -> Self {
        let mut table = Self::default();
        T::members(&mut table);
        table
    }
}

impl<T: 'static> MemberTable<T> {
    /// Register a field reached by reference.
    pub fn field<V>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> MemberBuilder<'_, T>
    where
        V: SettingValue + 'static,
    {
        self.push(Member {
            name,
            kind: MemberKind::Field,
            declared_type: V::value_type(),
            visibility: Visibility::default(),
            origin: MemberOrigin::Declared,
            markers: Vec::new(),
            read: Box::new(move |target: &T| get(target).to_value()),
            write: Box::new(move |target: &mut T, value: Value| -> Result<(), Value> {
                let v = V::from_value(value.clone()).ok_or(value)?;
                *get_mut(target) = v;
                Ok(())
            }),
        })
    }

    /// Register a property reached through a getter and a setter.
    pub fn property<V>(
        &mut self,
        name: &'static str,
        getter: fn(&T) -> V,
        setter: fn(&mut T, V),
    ) -> MemberBuilder<'_, T>
    where
        V: SettingValue + 'static,
    {
        self.push(Member {
            name,
            kind: MemberKind::Property,
            declared_type: V::value_type(),
            visibility: Visibility::default(),
            origin: MemberOrigin::Declared,
            markers: Vec::new(),
            read: Box::new(move |target: &T| getter(target).to_value()),
            write: Box::new(move |target: &mut T, value: Value| -> Result<(), Value> {
                let v = V::from_value(value.clone()).ok_or(value)?;
                setter(target, v);
                Ok(())
            }),
        })
    }

    /// Flatten the members of an embedded base into this table.
    ///
    /// They keep their visibility and markers and are tagged
    /// [`MemberOrigin::Inherited`]. The base is also remembered, so
    /// [`SettingsRegistry::save_inherited`] can run descriptors attached to `B`.
    pub fn inherit<B: Reflect>(&mut self, get: fn(&T) -> &B, get_mut: fn(&mut T) -> &mut B) {
        self.bases.push(BaseLink {
            type_name: B::type_name(),
            save: Box::new(move |registry: &SettingsRegistry, target: &T| {
                registry.run_save(get(target))
            }),
            load: Box::new(move |registry: &SettingsRegistry, target: &mut T| {
                registry.run_load(get_mut(target))
            }),
        });
        for base in MemberTable::<B>::of().members {
            let Member {
                name,
                kind,
                declared_type,
                visibility,
                markers,
                read,
                write,
                ..
            } = base;
            self.members.push(Member {
                name,
                kind,
                declared_type,
                visibility,
                origin: MemberOrigin::Inherited,
                markers,
                read: Box::new(move |target: &T| read(get(target))),
                write: Box::new(move |target: &mut T, value: Value| -> Result<(), Value> {
                    write(get_mut(target), value)
                }),
            });
        }
    }

    fn push(&mut self, member: Member<T>) -> MemberBuilder<'_, T> {
        self.members.push(member);
        let index = self.members.len() - 1;
        MemberBuilder {
            member: &mut self.members[index],
        }
    }
}

impl<T> MemberTable<T> {
    pub fn iter(&self) -> impl Iterator<Item = &Member<T>> {
        self.members.iter()
    }

    /// Embedded bases, in registration order.
    pub(crate) fn bases(&self) -> &[BaseLink<T>] {
        &self.bases
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// First member registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Member<T>> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// Adjusts a member right after registration.
pub struct MemberBuilder<'a, T> {
    member: &'a mut Member<T>,
}

impl<T> MemberBuilder<'_, T> {
    /// Attach marker `M`.
    pub fn marked<M: Marker>(self) -> Self {
        self.marked_with(MarkerLink::of::<M>())
    }

    /// Attach a marker by link.
    pub fn marked_with(self, link: MarkerLink) -> Self {
        if !self.member.markers.contains(&link) {
            self.member.markers.push(link);
        }
        self
    }

    pub fn public(self) -> Self {
        self.member.visibility = Visibility::Public;
        self
    }

    pub fn private(self) -> Self {
        self.member.visibility = Visibility::Private;
        self
    }
}
