//! Matches a freshly expanded body against the render nodes of the previous pass.
//!
//! Matching is positional. Composites are expanded first into a flat list of widget entries,
//! so a composite occupies as many positions as it produces widgets; the entry at index `i` is
//! then reconciled against the node at index `i`:
//!
//! - no node: the widget is created
//! - node of another kind: a new node is created and the old one is destroyed
//! - otherwise the node is updated in place and its child slots are reconciled recursively
//!
//! Nodes beyond the end of the new list are destroyed.
//!
//! Composite state does not follow nodes. It is kept per [`Level`], under the place each
//! composite was declared at, and released once a pass no longer declares the composite there.

use crate::backend::Backend;
use crate::dispatch;
use crate::identity::{NodeId, StateId};
use crate::modifier::{HookPhase, Modifier, NodeHook, Rewrite};
use crate::render::{Level, RenderNode};
use crate::scope::{Anchor, Scope, ScopeTable};
use crate::state::Runtime;
use crate::view::{Body, View, Widget};
use std::collections::HashSet;
use std::mem;
use std::sync::Arc;

/// One widget produced by expanding a body, with everything its wrappers added on the way.
struct Entry<B: Backend> {
    view: Arc<dyn View<B>>,
    frozen: bool,
    /// Outermost first.
    hooks: Vec<(HookPhase, NodeHook<B>)>,
    /// Carried on into the widget’s child slots.
    rewrites: Vec<Rewrite<B>>,
    /// Set if a composite this entry came out of owns dirty state.
    state_changed: bool,
}

/// Inherited while descending through composites and modifiers.
struct Decoration<B: Backend> {
    frozen: bool,
    hooks: Vec<(HookPhase, NodeHook<B>)>,
    /// Outermost first.
    rewrites: Vec<Rewrite<B>>,
    state_changed: bool,
    /// Of the innermost enclosing composite.
    anchor: Anchor,
}

impl<B: Backend> Decoration<B> {
    fn root(rewrites: &[Rewrite<B>]) -> Decoration<B> {
        Decoration {
            frozen: false,
            hooks: Vec::new(),
            rewrites: rewrites.to_vec(),
            state_changed: false,
            anchor: Anchor::new(),
        }
    }

    /// For the content of a modifier, which does not count as a nesting level.
    fn wrapped(&self) -> Decoration<B> {
        Decoration {
            frozen: self.frozen,
            hooks: self.hooks.clone(),
            rewrites: self.rewrites.clone(),
            state_changed: self.state_changed,
            anchor: self.anchor.clone(),
        }
    }

    /// For the body of the composite at `anchor`.
    fn child(&self, anchor: Anchor) -> Decoration<B> {
        Decoration {
            anchor,
            ..self.wrapped()
        }
    }
}

/// Output of expanding a body.
struct Expansion<B: Backend> {
    entries: Vec<Entry<B>>,
    /// State declared on this pass.
    scopes: ScopeTable,
}

/// Performs reconciliation passes against one backend.
pub struct Reconciler<'a, B: Backend> {
    backend: &'a mut B,
    runtime: &'a Runtime,
}

impl<'a, B: Backend> Reconciler<'a, B> {
    pub fn new(backend: &'a mut B, runtime: &'a Runtime) -> Reconciler<'a, B> {
        Reconciler { backend, runtime }
    }

    /// Reconciles `body` against `level` in place.
    ///
    /// If `force` is set, this is a property-update pass for the entire level.
    /// Returns true if the list of nodes changed (i.e. the parent must be told).
    pub fn reconcile(&mut self, body: &Body<B>, level: &mut Level<B>, force: bool) -> bool {
        self.reconcile_level(body, level, force, &[])
    }

    /// Destroys every node of `level` and releases the state anchored to it.
    pub fn clear(&mut self, level: &mut Level<B>) {
        for node in level.nodes.drain(..) {
            self.destroy(node);
        }
        let mut store = self.runtime.store();
        for id in level.states() {
            store.release(id);
        }
        level.scopes.clear();
    }

    /// Destroys a node and its subtree: children first, then the backend widget.
    pub fn destroy(&mut self, node: RenderNode<B>) {
        let RenderNode {
            id,
            handle,
            content,
            ..
        } = node;
        for (_, mut level) in content {
            self.clear(&mut level);
        }
        log::debug!("destroying node {:?}", id);
        self.backend.destroy(handle);
    }

    fn reconcile_level(
        &mut self,
        body: &Body<B>,
        level: &mut Level<B>,
        force: bool,
        rewrites: &[Rewrite<B>],
    ) -> bool {
        let expansion = self.expand_body(body, &level.scopes, rewrites);
        let before: Vec<NodeId> = level.nodes.iter().map(|node| node.id).collect();

        let mut old = mem::take(&mut level.nodes).into_iter();
        for entry in expansion.entries {
            let widget = match entry.view.widget() {
                Some(widget) => widget,
                None => continue,
            };
            let node = match old.next() {
                Some(node) => self.update(node, &entry, widget, force),
                None => self.create(&entry, widget),
            };
            level.nodes.push(node);
        }
        for node in old {
            self.destroy(node);
        }

        let previous = mem::replace(&mut level.scopes, expansion.scopes);
        self.release_undeclared(&previous, &level.scopes);

        let nodes = &level.nodes;
        nodes.len() != before.len() || nodes.iter().zip(&before).any(|(n, id)| n.id != *id)
    }

    /// Releases state that was declared on the previous pass but not on this one.
    fn release_undeclared(&self, previous: &ScopeTable, current: &ScopeTable) {
        let declared: HashSet<StateId> = current
            .values()
            .flat_map(|bindings| bindings.values().copied())
            .collect();
        let mut store = self.runtime.store();
        for id in previous.values().flat_map(|bindings| bindings.values()) {
            if !declared.contains(id) {
                store.release(*id);
            }
        }
    }

    fn expand_body(
        &self,
        body: &Body<B>,
        prior: &ScopeTable,
        rewrites: &[Rewrite<B>],
    ) -> Expansion<B> {
        let mut expansion = Expansion {
            entries: Vec::new(),
            scopes: ScopeTable::new(),
        };
        let decoration = Decoration::root(rewrites);
        for (index, view) in body.iter().enumerate() {
            self.expand(view, index, &decoration, prior, &mut expansion);
        }
        expansion
    }

    fn expand(
        &self,
        view: &Arc<dyn View<B>>,
        index: usize,
        decoration: &Decoration<B>,
        prior: &ScopeTable,
        out: &mut Expansion<B>,
    ) {
        let rewritten = decoration
            .rewrites
            .iter()
            .find_map(|rewrite| rewrite(&**view));
        if let Some(replacement) = rewritten {
            // a replacement is never rewritten again
            let mut decoration = decoration.wrapped();
            decoration.rewrites.clear();
            self.expand(&replacement, index, &decoration, prior, out);
            return;
        }

        if view.widget().is_some() {
            out.entries.push(Entry {
                view: Arc::clone(view),
                frozen: decoration.frozen,
                hooks: decoration.hooks.clone(),
                rewrites: decoration.rewrites.clone(),
                state_changed: decoration.state_changed,
            });
            return;
        }

        match view.modifier() {
            Some(Modifier::Freeze { content, frozen }) => {
                let mut decoration = decoration.wrapped();
                decoration.frozen |= frozen;
                self.expand(content, index, &decoration, prior, out);
            }
            Some(Modifier::Hook {
                content,
                phase,
                hook,
            }) => {
                let mut decoration = decoration.wrapped();
                decoration.hooks.push((phase, Arc::clone(hook)));
                self.expand(content, index, &decoration, prior, out);
            }
            Some(Modifier::Rewrite { content, rewrite }) => {
                let mut decoration = decoration.wrapped();
                decoration.rewrites.push(Arc::clone(rewrite));
                self.expand(content, index, &decoration, prior, out);
            }
            Some(Modifier::Stop { content }) => {
                let mut decoration = decoration.wrapped();
                decoration.rewrites.clear();
                self.expand(content, index, &decoration, prior, out);
            }
            None => {
                let mut anchor = decoration.anchor.clone();
                anchor.push((index, view.as_any().type_id()));
                let mut scope = Scope::new(self.runtime, prior.get(&anchor));
                let body = view.body(&mut scope);
                let declared = scope.finish();

                let mut decoration = decoration.child(anchor.clone());
                if !declared.is_empty() {
                    let store = self.runtime.store();
                    decoration.state_changed |= declared.values().any(|id| store.is_dirty(*id));
                }

                for (index, child) in body.iter().enumerate() {
                    self.expand(child, index, &decoration, prior, out);
                }

                if !declared.is_empty() {
                    out.scopes.insert(anchor, declared);
                }
            }
        }
    }

    fn create(&mut self, entry: &Entry<B>, widget: &dyn Widget<B>) -> RenderNode<B> {
        let handle = self.backend.create(widget);
        let mut node = RenderNode::new(handle, Arc::clone(&entry.view));
        log::debug!("created {} node {:?}", widget.kind(), node.id);

        let properties = widget.properties();
        dispatch::push_all(&mut *self.backend, &mut node.handle, &mut node.fields, &properties);

        for (slot, body) in widget.content() {
            let mut level = Level::new();
            self.reconcile_level(&body, &mut level, true, &entry.rewrites);
            let handles = level.nodes.iter().map(|child| &child.handle).collect();
            self.backend.set_children(&mut node.handle, slot, handles);
            node.content.insert(slot, level);
        }

        for (phase, hook) in entry.hooks.iter().rev() {
            if phase.on_create() {
                hook(&mut node);
            }
        }
        node
    }

    fn update(
        &mut self,
        mut node: RenderNode<B>,
        entry: &Entry<B>,
        widget: &dyn Widget<B>,
        force: bool,
    ) -> RenderNode<B> {
        // frozen storage is left alone entirely, even if the kind changed
        if entry.frozen {
            return node;
        }
        if !is_same_kind(&node, &entry.view, widget) {
            return self.replace(node, entry, widget);
        }

        let update_properties = force || entry.state_changed;
        let previous = node
            .snapshot
            .widget()
            .map(|w| w.properties())
            .unwrap_or_default();
        let properties = widget.properties();
        let pushed = dispatch::push_changed(
            &mut *self.backend,
            &mut node.handle,
            &mut node.fields,
            &properties,
            &previous,
            update_properties,
        );
        if pushed > 0 {
            log::trace!("pushed {} properties to node {:?}", pushed, node.id);
        }
        node.snapshot = Arc::clone(&entry.view);

        let content = widget.content();
        let stale: Vec<&'static str> = node
            .content
            .keys()
            .copied()
            .filter(|slot| !content.iter().any(|(s, _)| s == slot))
            .collect();
        for (slot, body) in content {
            let is_new = !node.content.contains_key(slot);
            let level = node.content.entry(slot).or_default();
            let changed = self.reconcile_level(&body, level, update_properties, &entry.rewrites);
            if changed || is_new {
                let handles = level.nodes.iter().map(|child| &child.handle).collect();
                self.backend.set_children(&mut node.handle, slot, handles);
            }
        }
        for slot in stale {
            if let Some(mut level) = node.content.remove(slot) {
                self.backend.set_children(&mut node.handle, slot, Vec::new());
                self.clear(&mut level);
            }
        }

        for (phase, hook) in entry.hooks.iter().rev() {
            if phase.on_update() {
                hook(&mut node);
            }
        }
        node
    }

    /// Creates a node for `entry` and destroys `old`.
    fn replace(
        &mut self,
        old: RenderNode<B>,
        entry: &Entry<B>,
        widget: &dyn Widget<B>,
    ) -> RenderNode<B> {
        log::debug!(
            "replacing {} node {:?} with {}",
            old.kind(),
            old.id,
            widget.kind()
        );
        let node = self.create(entry, widget);
        self.destroy(old);
        node
    }
}

fn is_same_kind<B: Backend>(
    node: &RenderNode<B>,
    view: &Arc<dyn View<B>>,
    widget: &dyn Widget<B>,
) -> bool {
    if node.snapshot.as_any().type_id() != view.as_any().type_id() {
        return false;
    }
    match node.snapshot.widget() {
        Some(previous) => previous.is_same_kind(widget),
        None => false,
    }
}
