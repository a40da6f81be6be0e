use crate::identity::StateId;
use crate::state::{Runtime, Signal, State};
use core::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// Where a composite was declared within one node list: for it and every composite around it,
/// the index in the enclosing body and the view type.
///
/// Unlike the position of the nodes a composite produces, this does not depend on what its
/// siblings expanded to, and it exists even if the composite produces nothing.
pub(crate) type Anchor = Vec<(usize, TypeId)>;

/// Bindings of state names to identities, for one composite.
pub(crate) type StateBindings = HashMap<Cow<'static, str>, StateId>;

/// State bindings of every composite expanded into one node list.
pub(crate) type ScopeTable = HashMap<Anchor, StateBindings>;

/// Passed to a view body while it is being expanded; used to declare state.
///
/// State declared here is bound to the place the view was declared at, so the same name
/// resolves to the same identity on every pass for as long as the view keeps being declared
/// there. That holds even while the view renders nothing.
pub struct Scope<'a> {
    runtime: &'a Runtime,
    prior: Option<&'a StateBindings>,
    auto_key: usize,
    declared: StateBindings,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(runtime: &'a Runtime, prior: Option<&'a StateBindings>) -> Scope<'a> {
        Scope {
            runtime,
            prior,
            auto_key: 0,
            declared: StateBindings::new(),
        }
    }

    pub fn runtime(&self) -> &Runtime {
        self.runtime
    }

    /// Declares a state cell under an explicit key.
    ///
    /// `init` is evaluated the first time the cell is read, at most once per identity.
    pub fn state<T>(
        &mut self,
        key: &'static str,
        init: impl Fn() -> T + Send + Sync + 'static,
    ) -> State<T>
    where
        T: Any + Clone + Send,
    {
        let id = self.resolve(Cow::Borrowed(key));
        State::new(self.runtime.clone(), id, Arc::new(init))
    }

    /// Declares a state cell keyed by the order of declaration within this body.
    ///
    /// Only stable if the body declares the same cells in the same order on every pass; put
    /// cells declared conditionally under an explicit key with [`state`](Scope::state).
    pub fn use_state<T>(&mut self, init: impl Fn() -> T + Send + Sync + 'static) -> State<T>
    where
        T: Any + Clone + Send,
    {
        let key = format!("#{}", self.auto_key);
        self.auto_key += 1;
        let id = self.resolve(Cow::Owned(key));
        State::new(self.runtime.clone(), id, Arc::new(init))
    }

    /// Declares a [`Signal`] under an explicit key.
    pub fn signal(&mut self, key: &'static str) -> Signal {
        Signal::new(self.state(key, || false))
    }

    /// Binds a cell that was created elsewhere (e.g. with [`Runtime::state`]) to this view.
    ///
    /// If a previous pass bound `key` to another cell, that cell’s value is moved over to
    /// `state`. Handles to the previous cell are stale afterwards.
    pub fn adopt<T>(&mut self, key: &'static str, state: &State<T>)
    where
        T: Any + Clone + Send,
    {
        let key = Cow::Borrowed(key);
        let new = state.id();
        if let Some(old) = self.prior.and_then(|prior| prior.get(&key)).copied() {
            if old != new {
                self.runtime.store().retarget(old, new);
            }
        }
        self.declared.insert(key, new);
    }

    fn resolve(&mut self, key: Cow<'static, str>) -> StateId {
        if let Some(id) = self.declared.get(&key) {
            return *id;
        }
        let id = self
            .prior
            .and_then(|prior| prior.get(&key))
            .copied()
            .unwrap_or_else(StateId::new);
        self.declared.insert(key, id);
        id
    }

    /// Returns everything declared in this scope.
    pub(crate) fn finish(self) -> StateBindings {
        self.declared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_resolve_against_prior_bindings() {
        let (runtime, _rx) = Runtime::new();
        let mut first = Scope::new(&runtime, None);
        let a = first.state("a", || 1_i32);
        let b = first.use_state(|| 2_i32);
        let declared = first.finish();
        assert_eq!(declared.len(), 2);

        let mut second = Scope::new(&runtime, Some(&declared));
        assert_eq!(second.state("a", || 1_i32).id(), a.id());
        assert_eq!(second.use_state(|| 2_i32).id(), b.id());
        assert_ne!(second.state("c", || 0_i32).id(), a.id());
    }

    #[test]
    fn repeated_keys_share_a_cell() {
        let (runtime, _rx) = Runtime::new();
        let mut scope = Scope::new(&runtime, None);
        let a = scope.state("a", || 0_u8);
        let again = scope.state("a", || 0_u8);
        assert_eq!(a.id(), again.id());
        assert_eq!(scope.finish().len(), 1);
    }

    #[test]
    fn signals_are_keyed_like_state() {
        let (runtime, _rx) = Runtime::new();
        let mut first = Scope::new(&runtime, None);
        let reload = first.signal("reload");
        assert!(!reload.is_active());
        let declared = first.finish();

        let mut second = Scope::new(&runtime, Some(&declared));
        assert_eq!(second.signal("reload").id(), reload.id());
    }

    #[test]
    fn adopt_moves_the_previous_value() {
        let (runtime, _rx) = Runtime::new();
        let first_cell = runtime.state(|| 0_i32);
        runtime.store().set(first_cell.id(), 42_i32);

        let mut first = Scope::new(&runtime, None);
        first.adopt("count", &first_cell);
        let bindings = first.finish();

        // the next pass constructs a fresh cell
        let second_cell = runtime.state(|| 0_i32);
        let mut second = Scope::new(&runtime, Some(&bindings));
        second.adopt("count", &second_cell);
        assert_eq!(second_cell.get(), 42);
        assert!(!runtime.store().contains(first_cell.id()));
        assert_eq!(second.finish().get("count"), Some(&second_cell.id()));
    }
}
