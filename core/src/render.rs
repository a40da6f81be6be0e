//! The render storage tree: one node per materialized widget.

use crate::backend::Backend;
use crate::identity::{NodeId, StateId};
use crate::scope::ScopeTable;
use crate::view::View;
use core::any::Any;
use core::fmt;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// The name of the default child slot.
pub const MAIN_SLOT: &str = "main";

/// A string-keyed bag of arbitrary data attached to a render node.
///
/// Retrieval is by expected type and returns `None` on a mismatch.
#[derive(Default)]
pub struct Fields {
    map: HashMap<String, Box<dyn Any>>,
}

impl Fields {
    pub fn new() -> Fields {
        Fields::default()
    }

    pub fn insert<T: Any>(&mut self, key: impl Into<String>, value: T) {
        self.map.insert(key.into(), Box::new(value));
    }

    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.map.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.map.get_mut(key).and_then(|v| v.downcast_mut::<T>())
    }

    /// Removes and returns a value. The entry is left alone if it has a different type.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        if !self.map.get(key).map_or(false, |v| v.is::<T>()) {
            return None;
        }
        self.map
            .remove(key)
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.map.keys()).finish()
    }
}

/// One list of sibling nodes: the top level of a tree, or one child slot of a widget.
///
/// Besides the nodes, a level keeps the state of the composites that were expanded into it.
/// That state is anchored to where each composite was declared rather than to a node, so it
/// survives passes in which the composite produces no widget at all.
pub struct Level<B: Backend> {
    pub(crate) nodes: Vec<RenderNode<B>>,
    pub(crate) scopes: ScopeTable,
}

impl<B: Backend> Level<B> {
    pub fn new() -> Level<B> {
        Level {
            nodes: Vec::new(),
            scopes: ScopeTable::new(),
        }
    }

    pub fn nodes(&self) -> &[RenderNode<B>] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [RenderNode<B>] {
        &mut self.nodes
    }

    /// State identities declared by the composites of this level.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.scopes.values().flat_map(|bindings| bindings.values().copied())
    }

    /// Total number of nodes in this level and below.
    pub fn count(&self) -> usize {
        self.nodes.iter().map(RenderNode::count).sum()
    }
}

impl<B: Backend> Default for Level<B> {
    fn default() -> Level<B> {
        Level::new()
    }
}

impl<B: Backend> fmt::Debug for Level<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Level")
            .field("nodes", &self.nodes)
            .field("scopes", &self.scopes.len())
            .finish()
    }
}

/// One materialized widget.
///
/// Created when a widget first appears at a tree position, updated in place on every later
/// pass at that position, and destroyed when the position goes away or changes kind.
pub struct RenderNode<B: Backend> {
    pub(crate) id: NodeId,
    pub(crate) handle: B::Handle,
    /// Children per slot name.
    pub(crate) content: BTreeMap<&'static str, Level<B>>,
    pub(crate) fields: Fields,
    /// The widget view that last pushed its properties to this node.
    pub(crate) snapshot: Arc<dyn View<B>>,
}

impl<B: Backend> RenderNode<B> {
    pub(crate) fn new(handle: B::Handle, snapshot: Arc<dyn View<B>>) -> RenderNode<B> {
        RenderNode {
            id: NodeId::new(),
            handle,
            content: BTreeMap::new(),
            fields: Fields::new(),
            snapshot,
        }
    }

    /// A unique id; stays the same for as long as the node is updated in place.
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn handle(&self) -> &B::Handle {
        &self.handle
    }

    pub fn handle_mut(&mut self) -> &mut B::Handle {
        &mut self.handle
    }

    /// The children in a slot. Empty if the slot doesn’t exist.
    pub fn content(&self, slot: &str) -> &[RenderNode<B>] {
        self.content.get(slot).map_or(&[], |level| level.nodes())
    }

    /// A child slot, including the state of the composites expanded into it.
    pub fn level(&self, slot: &str) -> Option<&Level<B>> {
        self.content.get(slot)
    }

    /// Names of all child slots, in order.
    pub fn slots(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.content.keys().copied()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// The widget view this node was last updated from.
    pub fn snapshot(&self) -> &Arc<dyn View<B>> {
        &self.snapshot
    }

    /// The widget kind of the snapshot.
    pub fn kind(&self) -> &'static str {
        self.snapshot.widget().map_or("?", |w| w.kind())
    }

    /// Total number of nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.content.values().map(Level::count).sum::<usize>()
    }
}

impl<B: Backend> fmt::Debug for RenderNode<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RenderNode")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("fields", &self.fields)
            .field("content", &self.content)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_typed() {
        let mut fields = Fields::new();
        fields.insert("count", 3_usize);
        assert_eq!(fields.get::<usize>("count"), Some(&3));
        assert_eq!(fields.get::<u32>("count"), None);
        assert_eq!(fields.get::<usize>("missing"), None);

        *fields.get_mut::<usize>("count").unwrap() += 1;
        assert_eq!(fields.remove::<u32>("count"), None);
        assert!(fields.contains("count"), "mismatched remove keeps the entry");
        assert_eq!(fields.remove::<usize>("count"), Some(4));
        assert!(fields.is_empty());
    }
}
