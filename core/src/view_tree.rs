use crate::backend::Backend;
use crate::reconcile::Reconciler;
use crate::render::{Level, RenderNode};
use crate::state::Runtime;
use crate::view::{Body, View};
use std::sync::Arc;

/// A mounted view hierarchy: a root view, the backend drawing it, and the render nodes of the
/// last pass.
pub struct ViewTree<B: Backend> {
    runtime: Runtime,
    backend: B,
    root: Arc<dyn View<B>>,
    level: Level<B>,
    passes: usize,
}

impl<B: Backend> ViewTree<B> {
    /// Creates a tree. Nothing is materialized until the first [`render`](ViewTree::render).
    pub fn new(runtime: Runtime, backend: B, root: impl View<B>) -> ViewTree<B> {
        ViewTree {
            runtime,
            backend,
            root: Arc::new(root),
            level: Level::new(),
            passes: 0,
        }
    }

    /// Replaces the root view. Takes effect on the next pass.
    pub fn set_root(&mut self, root: impl View<B>) {
        self.root = Arc::new(root);
    }

    /// Runs one reconciliation pass.
    ///
    /// If `force` is set, every node gets a property-update pass.
    pub fn render(&mut self, force: bool) {
        self.passes += 1;
        log::debug!("pass {} (force: {})", self.passes, force);
        let body: Body<B> = vec![Arc::clone(&self.root)];
        let mut reconciler = Reconciler::new(&mut self.backend, &self.runtime);
        let changed = reconciler.reconcile(&body, &mut self.level, force);
        if changed {
            let roots = self.level.nodes().iter().map(|node| node.handle()).collect();
            self.backend.set_root(roots);
        }
    }

    /// Destroys every node and releases all state declared by the tree’s composites.
    pub fn clear(&mut self) {
        Reconciler::new(&mut self.backend, &self.runtime).clear(&mut self.level);
    }

    /// The top-level render nodes.
    pub fn nodes(&self) -> &[RenderNode<B>] {
        self.level.nodes()
    }

    pub fn nodes_mut(&mut self) -> &mut [RenderNode<B>] {
        self.level.nodes_mut()
    }

    /// The top level, including the state of the composites expanded into it.
    pub fn level(&self) -> &Level<B> {
        &self.level
    }

    /// Total number of render nodes.
    pub fn count(&self) -> usize {
        self.level.count()
    }

    /// Number of passes run so far.
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}
