//! Member markers.
//!
//! A marker opts a member into persistence. Descriptors hold a
//! [`MarkerLink`] naming which marker counts, so a type can carry several
//! markers and each descriptor picks up only its own members.

use std::any::TypeId;
use std::fmt;

/// A tag attached to members.
pub trait Marker: 'static {
    /// Human-readable marker name.
    const NAME: &'static str;

    /// Markers this one refines.
    ///
    /// A descriptor linked to a parent also accepts members carrying the
    /// child, and the other way around.
    fn parents() -> Vec<MarkerLink> {
        Vec::new()
    }
}

/// The built-in persistence marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveLoad;

impl Marker for SaveLoad {
    const NAME: &'static str = "SaveLoad";
}

/// Runtime handle to a [`Marker`] type.
#[derive(Clone, Copy)]
pub struct MarkerLink {
    id: TypeId,
    name: &'static str,
    parents: fn() -> Vec<MarkerLink>,
}

impl MarkerLink {
    /// Link to marker `M`.
    pub fn of<M: Marker>() -> Self {
        Self {
            id: TypeId::of::<M>(),
            name: M::NAME,
            parents: M::parents,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this marker is `other` or refines it, directly or not.
    ///
    /// A lineage that loops back on itself is walked once.
    pub fn derives_from(&self, other: &MarkerLink) -> bool {
        self.reaches(other, &mut Vec::new())
    }

    fn reaches(&self, other: &MarkerLink, visited: &mut Vec<TypeId>) -> bool {
        if self.id == other.id {
            return true;
        }
        if visited.contains(&self.id) {
            return false;
        }
        visited.push(self.id);
        (self.parents)().iter().any(|p| p.reaches(other, visited))
    }

    /// Whether either marker derives from the other.
    pub fn is_related(&self, other: &MarkerLink) -> bool {
        self.derives_from(other) || other.derives_from(self)
    }
}

impl Default for MarkerLink {
    fn default() -> Self {
        Self::of::<SaveLoad>()
    }
}

impl PartialEq for MarkerLink {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MarkerLink {}

impl fmt::Debug for MarkerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MarkerLink").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UserPreference;

    impl Marker for UserPreference {
        const NAME: &'static str = "UserPreference";

        fn parents() -> Vec<MarkerLink> {
            vec![MarkerLink::of::<SaveLoad>()]
        }
    }

    struct Window;

    impl Marker for Window {
        const NAME: &'static str = "Window";

        fn parents() -> Vec<MarkerLink> {
            vec![MarkerLink::of::<UserPreference>()]
        }
    }

    struct Unrelated;

    impl Marker for Unrelated {
        const NAME: &'static str = "Unrelated";
    }

    struct Ping;

    impl Marker for Ping {
        const NAME: &'static str = "Ping";

        fn parents() -> Vec<MarkerLink> {
            vec![MarkerLink::of::<Pong>()]
        }
    }

    struct Pong;

    impl Marker for Pong {
        const NAME: &'static str = "Pong";

        fn parents() -> Vec<MarkerLink> {
            vec![MarkerLink::of::<Ping>(), MarkerLink::of::<SaveLoad>()]
        }
    }

    #[test]
    fn test_default_link_is_save_load() {
        assert_eq!(MarkerLink::default(), MarkerLink::of::<SaveLoad>());
        assert_eq!(MarkerLink::default().name(), "SaveLoad");
    }

    #[test]
    fn test_lineage_is_transitive() {
        let window = MarkerLink::of::<Window>();
        let save_load = MarkerLink::of::<SaveLoad>();
        assert!(window.derives_from(&save_load));
        assert!(!save_load.derives_from(&window));
    }

    #[test]
    fn test_relation_is_symmetric() {
        let pref = MarkerLink::of::<UserPreference>();
        let save_load = MarkerLink::of::<SaveLoad>();
        assert!(pref.is_related(&save_load));
        assert!(save_load.is_related(&pref));
        assert!(!MarkerLink::of::<Unrelated>().is_related(&save_load));
    }

    #[test]
    fn test_cyclic_lineage_terminates() {
        let ping = MarkerLink::of::<Ping>();
        let pong = MarkerLink::of::<Pong>();
        assert!(ping.derives_from(&pong));
        assert!(pong.derives_from(&ping));
        assert!(ping.derives_from(&MarkerLink::of::<SaveLoad>()));
        assert!(!ping.derives_from(&MarkerLink::of::<Unrelated>()));
        assert!(!ping.is_related(&MarkerLink::of::<Unrelated>()));
    }
}
