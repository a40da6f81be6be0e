//! Property values passed to backends.

use core::any::Any;
use core::fmt;
use std::sync::Arc;

/// A callback stored in a widget property, e.g. a button action.
///
/// Callbacks can't be compared, so properties holding them are pushed on every pass.
#[derive(Clone)]
pub struct Callback(Arc<dyn Fn(&Value) + Send + Sync>);

impl Callback {
    /// Creates a callback that ignores its argument.
    pub fn new(f: impl Fn() + Send + Sync + 'static) -> Callback {
        Callback(Arc::new(move |_: &Value| f()))
    }

    /// Creates a callback that receives a value from the backend (e.g. edited text).
    pub fn with_value(f: impl Fn(&Value) + Send + Sync + 'static) -> Callback {
        Callback(Arc::new(f))
    }

    pub fn call(&self) {
        (self.0)(&Value::Unit)
    }

    pub fn call_with(&self, value: &Value) {
        (self.0)(value)
    }

    /// True if both refer to the same closure allocation.
    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Callback({:p})", Arc::as_ptr(&self.0))
    }
}

/// The closed set of value kinds a property can carry.
///
/// Anything backend-specific goes into `Opaque`, which is passed through untouched.
#[derive(Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Callback(Callback),
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Returns false for kinds without a meaningful equality (callbacks, opaque data).
    pub fn is_comparable(&self) -> bool {
        match self {
            Value::Callback(_) | Value::Opaque(_) => false,
            Value::List(items) => items.iter().all(Value::is_comparable),
            _ => true,
        }
    }

    /// Compares two values for the purpose of diffing.
    ///
    /// Returns `None` if either side is not comparable.
    pub fn diff_eq(&self, other: &Value) -> Option<bool> {
        if !self.is_comparable() || !other.is_comparable() {
            return None;
        }
        Some(self == other)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Value::Callback(c) => Some(c),
            _ => None,
        }
    }

    /// Downcasts opaque data.
    pub fn as_opaque<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(data) => data.downcast_ref::<T>(),
            _ => None,
        }
    }
}

/// Structural equality. Callbacks compare by allocation and opaque values never compare
/// equal; use [`Value::diff_eq`] when deciding whether to push.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Callback(a), Value::Callback(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{:?}", b),
            Value::Int(i) => write!(f, "{:?}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Callback(c) => write!(f, "{:?}", c),
            Value::Opaque(_) => write!(f, "Opaque"),
        }
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident $(as $cast:ty)?),+ $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Value {
                    Value::$variant(v $(as $cast)?)
                }
            }
        )+
    };
}

impl_from! {
    bool => Bool,
    i64 => Int,
    i32 => Int as i64,
    u32 => Int as i64,
    f64 => Float,
    f32 => Float as f64,
    String => Text,
    Callback => Callback,
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Text(s.to_string())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Value {
        Value::Unit
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Value {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}
