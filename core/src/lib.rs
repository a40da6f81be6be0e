//! Backend-agnostic declarative UI core.
//!
//! # Conceptual overview
//! Roost keeps a tree of live widgets, owned by some backend, in sync with a tree of views that
//! is described from scratch on every pass.
//!
//! ## Views
//! There are two kinds of views: widgets and composite views. Widgets are leaves that a backend
//! knows how to materialize (a button, a label, a container with child slots), while composite
//! views are simply made up of other views. Views are plain values and should be very cheap to
//! create: constructors should not do anything other than storing their properties. A
//! composite’s body is derived from its properties and its state, and must not have side
//! effects on rendered widgets.
//!
//! ## State
//! Views are rebuilt on every pass, so their state lives elsewhere: in the identity store of a
//! [`Runtime`], keyed by a [`StateId`]. A composite declares state through the [`Scope`] it
//! receives while its body is expanded. The identity is bound to the place the composite was
//! declared at (its index in the enclosing body, its type, and the same for every composite
//! around it), so the same declaration resolves to the same identity on every pass, even while
//! the composite renders nothing. Slots are released once a pass no longer declares the
//! composite there, or when the widget whose children it belongs to is destroyed.
//!
//! A [`Signal`] is a one-shot flag: raised by a write, it reads as active during the next pass
//! only.
//!
//! State can be read from anywhere. Writes are never applied on the writer’s thread: they are
//! sent to the update lane (the [`Host`]), which applies them, marks the slots dirty, and runs
//! the next pass. A write therefore always becomes visible on the next pass, never during the
//! current one.
//!
//! ## Reconciliation
//! Each pass expands the root view down to widgets and matches them against the render nodes
//! of the previous pass by position. A node whose widget kind changed is recreated; all other
//! nodes are updated in place. Widgets declare their properties together with an
//! [`UpdateStrategy`] that decides when a property is pushed to the backend:
//!
//! - `Always` properties are pushed on every pass (callbacks, mostly).
//! - `Automatic` properties are pushed when their value changed.
//! - `AlwaysWhenStateChanged` properties are pushed on every property-update pass, i.e. a pass
//!   that was forced or caused by dirty state declared by an enclosing composite.
//!
//! Subtrees can be excluded from updates with [`modifier::freeze`], and views of one type can
//! be swapped for others throughout a subtree with [`modifier::modify_content`].
//!
//! ## Backends
//! Backends are platform-specific UI frameworks, abstracted to the small interface in
//! [`Backend`]: create a widget, push a property, set a container’s children, destroy a widget.
//! The core never looks inside a backend’s handles.

#[macro_use]
mod view;

pub mod backend;
mod dispatch;
mod host;
pub mod identity;
pub mod modifier;
mod reconcile;
mod render;
mod scheduler;
mod scope;
mod state;
pub mod testing;
mod value;
mod view_tree;

pub use backend::Backend;
pub use host::{Host, Mount};
pub use identity::{IdentityStore, NodeId, StateId};
pub use modifier::{
    either, freeze, inspect, modify_content, on_appear, on_update, stop_modifiers,
};
pub use reconcile::Reconciler;
pub use render::{Fields, Level, RenderNode, MAIN_SLOT};
pub use scheduler::{RedrawCallback, Scheduler};
pub use scope::Scope;
pub use state::{Binding, Runtime, Signal, State};
pub use value::{Callback, Value};
pub use view::{view, Body, Property, UpdateStrategy, View, Widget};
pub use view_tree::ViewTree;
