//! Member visibility filter.

use serde::{Deserialize, Serialize};

/// Visibility of a registered member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

/// Where a member was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberOrigin {
    /// Declared on the type itself.
    #[default]
    Declared,
    /// Flattened in from an embedded base.
    Inherited,
}

/// Which members of a type discovery may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberFilter {
    /// Include public members.
    pub public: bool,
    /// Include private members.
    pub non_public: bool,
    /// Exclude members inherited from an embedded base.
    pub declared_only: bool,
}

impl Default for MemberFilter {
    fn default() -> Self {
        Self {
            public: true,
            non_public: true,
            declared_only: true,
        }
    }
}

impl MemberFilter {
    /// A filter that sees every member, inherited ones included.
    pub fn all() -> Self {
        Self {
            declared_only: false,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_public(mut self, enable: bool) -> Self {
        self.public = enable;
        self
    }

    #[must_use]
    pub fn with_non_public(mut self, enable: bool) -> Self {
        self.non_public = enable;
        self
    }

    #[must_use]
    pub fn with_declared_only(mut self, enable: bool) -> Self {
        self.declared_only = enable;
        self
    }

    /// Check a member against the filter.
    pub fn matches(&self, visibility: Visibility, origin: MemberOrigin) -> bool {
        let visible = match visibility {
            Visibility::Public => self.public,
            Visibility::Private => self.non_public,
        };
        visible && (!self.declared_only || origin == MemberOrigin::Declared)
    }
}
