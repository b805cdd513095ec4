// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ports to the script engine and the session.
//!
//! These traits are the hexagonal boundary of the builder: a script engine
//! adapter implements [`MirrorFactory`] and [`BulkUpdater`], the session owner
//! implements [`SessionCache`]. Every call on the engine-facing ports is
//! assumed to cross an expensive boundary, so the builder batches them.
use rustc_hash::FxHashMap;

use crate::graph::GlueId;
use crate::host::{EnumValue, HostValue};

/// Constructs script-side mirror values.
pub trait MirrorFactory {
    /// Engine handle for a mirror value.
    type Mirror: Clone;

    /// The engine's null value.
    fn create_null(&mut self) -> Self::Mirror;

    /// A boolean primitive.
    fn create_bool(&mut self, value: bool) -> Self::Mirror;

    /// An integer primitive.
    fn create_int(&mut self, value: i64) -> Self::Mirror;

    /// Converts `value` directly to a primitive mirror, or returns `None`
    /// when the engine has no primitive form for it.
    fn try_create_basic(&mut self, value: &HostValue) -> Option<Self::Mirror>;

    /// Mirror for an enum value.
    fn create_enum(&mut self, value: &EnumValue) -> Self::Mirror;

    /// One container mirror.
    fn create_object(&mut self, blank: bool) -> Self::Mirror;

    /// `count` container mirrors in one crossing.
    ///
    /// The result must hold exactly `count` mirrors; the i-th is assigned to
    /// the i-th request.
    fn create_objects(&mut self, blank: bool, count: usize) -> Vec<Self::Mirror>;

    /// `count` sequence mirrors in one crossing, same contract as
    /// [`MirrorFactory::create_objects`].
    fn create_arrays(&mut self, count: usize) -> Vec<Self::Mirror>;

    /// Sets field `name` of `container` to `value`.
    fn set_value(&mut self, container: &Self::Mirror, name: &str, value: Self::Mirror);
}

/// Attaches child mirrors onto a container mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyUpdate<M> {
    /// Container receiving the properties.
    pub father: M,
    /// Property name and child mirror, in name order.
    pub properties: Vec<(String, M)>,
}

/// Fills a sequence mirror with its element mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayUpdate<M> {
    /// Sequence receiving the elements.
    pub father: M,
    /// Element mirrors in index order.
    pub items: Vec<M>,
}

/// Wires children onto fathers with as few crossings as the engine allows.
///
/// Implementations may batch however they like but must attach every listed
/// child, and must keep element order for arrays.
pub trait BulkUpdater {
    /// Engine handle for a mirror value.
    type Mirror;

    /// Attaches every listed property to its father.
    fn bulk_update_property(&mut self, updates: &[PropertyUpdate<Self::Mirror>]);

    /// Fills every listed sequence with its elements.
    fn bulk_update_array(&mut self, updates: &[ArrayUpdate<Self::Mirror>]);
}

/// Session-scoped interning of host values to glue nodes.
///
/// The builder only inserts; lookups happen upstream before a node is handed
/// to the builder.
pub trait SessionCache {
    /// Records that `node` mirrors `value`.
    fn cache_local(&mut self, value: &HostValue, node: GlueId);
}

impl<T: MirrorFactory + ?Sized> MirrorFactory for &mut T {
    type Mirror = T::Mirror;

    fn create_null(&mut self) -> Self::Mirror {
        (**self).create_null()
    }

    fn create_bool(&mut self, value: bool) -> Self::Mirror {
        (**self).create_bool(value)
    }

    fn create_int(&mut self, value: i64) -> Self::Mirror {
        (**self).create_int(value)
    }

    fn try_create_basic(&mut self, value: &HostValue) -> Option<Self::Mirror> {
        (**self).try_create_basic(value)
    }

    fn create_enum(&mut self, value: &EnumValue) -> Self::Mirror {
        (**self).create_enum(value)
    }

    fn create_object(&mut self, blank: bool) -> Self::Mirror {
        (**self).create_object(blank)
    }

    fn create_objects(&mut self, blank: bool, count: usize) -> Vec<Self::Mirror> {
        (**self).create_objects(blank, count)
    }

    fn create_arrays(&mut self, count: usize) -> Vec<Self::Mirror> {
        (**self).create_arrays(count)
    }

    fn set_value(&mut self, container: &Self::Mirror, name: &str, value: Self::Mirror) {
        (**self).set_value(container, name, value);
    }
}

impl<T: BulkUpdater + ?Sized> BulkUpdater for &mut T {
    type Mirror = T::Mirror;

    fn bulk_update_property(&mut self, updates: &[PropertyUpdate<Self::Mirror>]) {
        (**self).bulk_update_property(updates);
    }

    fn bulk_update_array(&mut self, updates: &[ArrayUpdate<Self::Mirror>]) {
        (**self).bulk_update_array(updates);
    }
}

impl<T: SessionCache + ?Sized> SessionCache for &mut T {
    fn cache_local(&mut self, value: &HostValue, node: GlueId) {
        (**self).cache_local(value, node);
    }
}

/// In-memory [`SessionCache`] owned by a single session.
///
/// Insert-only: the first node cached for a value keeps the entry.
#[derive(Debug, Clone, Default)]
pub struct LocalSessionCache {
    entries: FxHashMap<HostValue, GlueId>,
}

impl LocalSessionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Node previously cached for `value`.
    pub fn get(&self, value: &HostValue) -> Option<GlueId> {
        self.entries.get(value).copied()
    }

    /// Number of cached values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry; called by the session owner, never by the builder.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl SessionCache for LocalSessionCache {
    fn cache_local(&mut self, value: &HostValue, node: GlueId) {
        self.entries.entry(value.clone()).or_insert(node);
    }
}
