use crate::backend::Backend;
use crate::modifier::Modifier;
use crate::scope::Scope;
use crate::value::Value;
use core::any::Any;
use core::fmt;
use std::sync::Arc;

/// An ordered list of views, as produced by a view body.
pub type Body<B> = Vec<Arc<dyn View<B>>>;

/// Implements the `View` trait for a composite view.
///
/// Syntax:
///
/// ```text
/// impl_view! {
///     StructName<B>; // the backend parameter may also be a concrete type
///     fn body(&self, scope) {
///         ... -> Body<B>
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_view {
    (
        $(#[$attr:meta])*
        $struct:ident<$backend:ident>;
        fn body(&$self:ident, $scope:ident) $body:block
    ) => {
        $(#[$attr])*
        impl<$backend: $crate::Backend> $crate::View<$backend> for $struct {
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            #[allow(unused_variables)]
            fn body(&$self, $scope: &mut $crate::Scope<'_>) -> $crate::Body<$backend> $body
        }
    };
    (
        $(#[$attr:meta])*
        $struct:ty : $backend:ty;
        fn body(&$self:ident, $scope:ident) $body:block
    ) => {
        $(#[$attr])*
        impl $crate::View<$backend> for $struct {
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            #[allow(unused_variables)]
            fn body(&$self, $scope: &mut $crate::Scope<'_>) -> $crate::Body<$backend> $body
        }
    };
}

/// Implements the `View` trait for a type that already implements `Widget`.
#[macro_export]
macro_rules! impl_widget {
    ($struct:ident<$backend:ident>) => {
        impl<$backend: $crate::Backend> $crate::View<$backend> for $struct
        where
            $struct: $crate::Widget<$backend>,
        {
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn body(&self, _: &mut $crate::Scope<'_>) -> $crate::Body<$backend> {
                Vec::new()
            }

            fn widget(&self) -> Option<&dyn $crate::Widget<$backend>> {
                Some(self)
            }
        }
    };
    ($struct:ty : $backend:ty) => {
        impl $crate::View<$backend> for $struct {
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn body(&self, _: &mut $crate::Scope<'_>) -> $crate::Body<$backend> {
                Vec::new()
            }

            fn widget(&self) -> Option<&dyn $crate::Widget<$backend>> {
                Some(self)
            }
        }
    };
}

/// Views are the declarative description of UI: cheap values that are rebuilt from scratch on
/// every pass and compared against what is currently on screen.
///
/// A view is either a *widget* (a leaf the backend knows how to draw; `widget` returns `Some`)
/// or a *composite* whose `body` expands into further views. Expanding a body must not have
/// side effects on rendered nodes; the only thing a body may do besides returning views is
/// declare state through its [`Scope`].
///
/// This trait should probably be implemented using the [`impl_view`] or [`impl_widget`] macros.
///
/// # Panics
/// Bodies that expand into themselves will recurse forever.
pub trait View<B: Backend>: Any + fmt::Debug {
    /// For downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Expands this view. Not called for widgets.
    fn body(&self, scope: &mut Scope<'_>) -> Body<B>;

    /// Returns the widget if this is a leaf.
    fn widget(&self) -> Option<&dyn Widget<B>> {
        None
    }

    /// Built-in wrapper views (freeze, inspectors). Should not be overridden.
    #[doc(hidden)]
    fn modifier(&self) -> Option<Modifier<'_, B>> {
        None
    }
}

/// A leaf view that is materialized by the backend.
pub trait Widget<B: Backend>: fmt::Debug {
    /// A name for the kind of widget; backends use it to decide what to create.
    fn kind(&self) -> &'static str;

    /// The widget’s properties and their update strategies.
    ///
    /// Must return the same names in the same order every time for a given widget type.
    fn properties(&self) -> Vec<Property>;

    /// Named child lists, for container widgets.
    fn content(&self) -> Vec<(&'static str, Body<B>)> {
        Vec::new()
    }

    /// For proxy widgets; called only if both widgets have the same type.
    ///
    /// Returning false forces the node to be recreated instead of updated.
    fn is_same_kind(&self, other: &dyn Widget<B>) -> bool {
        let _ = other;
        true
    }
}

/// When a property is pushed to the backend on an update pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateStrategy {
    /// Push when the value changed. Values that cannot be compared are pushed on every pass.
    Automatic,
    /// Push on every pass (e.g. callbacks that must capture the latest state).
    Always,
    /// Push on every pass that was caused by a state change in an ancestor, regardless of
    /// whether the value changed.
    AlwaysWhenStateChanged,
}

/// One declared widget property.
#[derive(Debug, Clone)]
pub struct Property {
    pub name: &'static str,
    pub strategy: UpdateStrategy,
    /// Absent values are never pushed.
    pub value: Option<Value>,
}

impl Property {
    pub fn new(name: &'static str, strategy: UpdateStrategy, value: Option<Value>) -> Property {
        Property {
            name,
            strategy,
            value,
        }
    }

    /// A property pushed only when it changed.
    pub fn automatic<T: PartialEq + Into<Value>>(name: &'static str, value: T) -> Property {
        Property::new(name, UpdateStrategy::Automatic, Some(value.into()))
    }

    /// A property pushed on every pass.
    pub fn always(name: &'static str, value: impl Into<Value>) -> Property {
        Property::new(name, UpdateStrategy::Always, Some(value.into()))
    }

    /// A property pushed on every pass caused by a state change.
    pub fn when_state_changed(name: &'static str, value: impl Into<Value>) -> Property {
        Property::new(
            name,
            UpdateStrategy::AlwaysWhenStateChanged,
            Some(value.into()),
        )
    }

    /// An optional property; `None` is never pushed.
    pub fn optional<T: Into<Value>>(
        name: &'static str,
        strategy: UpdateStrategy,
        value: Option<T>,
    ) -> Property {
        Property::new(name, strategy, value.map(Into::into))
    }
}

/// An empty view that renders nothing.
impl<B: Backend> View<B> for () {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn body(&self, _: &mut Scope<'_>) -> Body<B> {
        Vec::new()
    }
}

/// A list of views expands into its items.
impl<B: Backend> View<B> for Body<B> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn body(&self, _: &mut Scope<'_>) -> Body<B> {
        self.clone()
    }
}

/// Wraps a view for use in a [`Body`].
pub fn view<B: Backend, V: View<B>>(view: V) -> Arc<dyn View<B>> {
    Arc::new(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Button, Label, RecordingBackend};

    #[test]
    fn optional_properties() {
        let p = Property::optional::<String>("tooltip", UpdateStrategy::Automatic, None);
        assert!(p.value.is_none());
        let p = Property::optional("tooltip", UpdateStrategy::Always, Some("hi"));
        assert_eq!(p.value, Some(Value::from("hi")));
        assert_eq!(p.strategy, UpdateStrategy::Always);
    }

    #[test]
    fn widgets_are_leaves() {
        let button: Arc<dyn View<RecordingBackend>> = view(Button::new("A"));
        assert!(button.widget().is_some());
        assert_eq!(button.widget().map(|w| w.kind()), Some("button"));

        let empty: Arc<dyn View<RecordingBackend>> = view(());
        assert!(empty.widget().is_none());

        let list: Body<RecordingBackend> = vec![view(Label::new("a")), view(())];
        let list: Arc<dyn View<RecordingBackend>> = view(list);
        assert!(list.widget().is_none());
    }
}
