//! Member discovery.
//!
//! Discovery answers two separate questions that the descriptors report
//! through different hooks: which members pass the filter at all, and which
//! of those carry the descriptor's marker.

use std::collections::HashSet;

use crate::filter::MemberFilter;
use crate::format::PersistedMapping;
use crate::marker::MarkerLink;
use crate::member::{Member, MemberKind, MemberTable};
use crate::value::{Value, ValueType};

/// A member seen by one discovery pass.
#[derive(Debug)]
pub struct MemberRecord<'t, T> {
    member: &'t Member<T>,
    marked: bool,
    /// Value read from the target, when discovery was given one.
    pub current_value: Option<Value>,
}

impl<'t, T> MemberRecord<'t, T> {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.member.name()
    }

    #[inline]
    pub fn kind(&self) -> MemberKind {
        self.member.kind()
    }

    #[inline]
    pub fn declared_type(&self) -> ValueType {
        self.member.declared_type()
    }

    /// Whether the member carries the descriptor's marker.
    #[inline]
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    pub fn member(&self) -> &'t Member<T> {
        self.member
    }
}

/// Result of one discovery pass, in registration order.
#[derive(Debug)]
pub struct Discovery<'t, T> {
    records: Vec<MemberRecord<'t, T>>,
}

impl<'t, T> Discovery<'t, T> {
    /// No member passed the filter.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Every member that passed the filter.
    pub fn iter(&self) -> impl Iterator<Item = &MemberRecord<'t, T>> {
        self.records.iter()
    }

    /// Members that also carry the marker.
    pub fn eligible(&self) -> impl Iterator<Item = &MemberRecord<'t, T>> {
        self.records.iter().filter(|r| r.marked)
    }

    pub fn find(&self, name: &str) -> Option<&MemberRecord<'t, T>> {
        self.records.iter().find(|r| r.name() == name)
    }

    /// Current values of the eligible members.
    ///
    /// Empty unless discovery was given a target.
    pub fn snapshot(&self) -> PersistedMapping {
        self.eligible()
            .filter_map(|r| r.current_value.clone().map(|v| (r.name(), v)))
            .collect()
    }
}

/// Enumerate the members of `table` visible under `filter`.
///
/// Fields are always considered; properties only when `include_properties`
/// is set. When a name repeats, the first registration wins.
pub fn discover<'t, T>(
    table: &'t MemberTable<T>,
    target: Option<&T>,
    filter: &MemberFilter,
    marker: &MarkerLink,
    include_properties: bool,
) -> Discovery<'t, T> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for member in table.iter() {
        if member.kind() == MemberKind::Property && !include_properties {
            continue;
        }
        if !filter.matches(member.visibility(), member.origin()) {
            continue;
        }
        if !seen.insert(member.name()) {
            tracing::warn!(member = member.name(), "Duplicate member name, keeping the first");
            continue;
        }

        let marked = member.carries(marker);
        let current_value = match target {
            Some(target) if marked => Some(member.read(target)),
            _ => None,
        };
        records.push(MemberRecord {
            member,
            marked,
            current_value,
        });
    }

    tracing::debug!(
        members = records.len(),
        eligible = records.iter().filter(|r| r.marked).count(),
        marker = marker.name(),
        "Discovered members"
    );

    Discovery { records }
}
