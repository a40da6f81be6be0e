//! Traits for backends.

use crate::render::Fields;
use crate::value::Value;
use crate::view::Widget;

/// A backend implementation.
///
/// Backends own the actual native widgets; the reconciler only holds their handles and never
/// looks inside them. All methods are called from the reconciliation lane.
///
/// None of these methods can fail: a backend that can’t apply a value should clamp or ignore
/// it internally.
pub trait Backend: Sized + 'static {
    /// A reference to a widget in the backend.
    type Handle;

    /// Creates a new widget. Properties are pushed separately right after.
    fn create(&mut self, widget: &dyn Widget<Self>) -> Self::Handle;

    /// Applies one property value.
    ///
    /// `fields` is the node’s side-data bag; backends may stash anything there between passes
    /// (a live callback, a cached native object, ...).
    fn push_field(
        &mut self,
        handle: &mut Self::Handle,
        fields: &mut Fields,
        name: &str,
        value: &Value,
    );

    /// Sets the contents of one of a container’s child slots.
    ///
    /// Called after a container is created and whenever the slot’s list of children changed.
    fn set_children(
        &mut self,
        parent: &mut Self::Handle,
        slot: &str,
        children: Vec<&Self::Handle>,
    ) {
        let _ = (parent, slot, children);
    }

    /// Sets the top-level widgets of a mounted tree.
    ///
    /// Called after the first pass and whenever the list of top-level nodes changed.
    fn set_root(&mut self, roots: Vec<&Self::Handle>) {
        let _ = roots;
    }

    /// Tears down a widget. Children are destroyed before their parents.
    fn destroy(&mut self, handle: Self::Handle) {
        drop(handle);
    }
}
