//! A backend that records every call, plus a few widgets for it. Used by the tests.

use crate::backend::Backend;
use crate::render::{Fields, MAIN_SLOT};
use crate::value::{Callback, Value};
use crate::view::{Body, Property, UpdateStrategy, Widget};
use parking_lot::Mutex;
use std::sync::Arc;

/// A recorded backend call. Handles are plain integers, allocated in creation order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create {
        handle: usize,
        kind: &'static str,
    },
    Push {
        handle: usize,
        name: String,
        value: Value,
    },
    SetChildren {
        parent: usize,
        slot: String,
        children: Vec<usize>,
    },
    SetRoot {
        roots: Vec<usize>,
    },
    Destroy {
        handle: usize,
    },
}

/// A shared call log. Clones observe the same log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    /// Returns a copy of the log.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Returns and clears the log.
    pub fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock())
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// All pushes in the log, as `(handle, name, value)`.
    pub fn pushes(&self) -> Vec<(usize, String, Value)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Push {
                    handle,
                    name,
                    value,
                } => Some((*handle, name.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }

    /// Handles created, in order.
    pub fn created(&self) -> Vec<usize> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Create { handle, .. } => Some(*handle),
                _ => None,
            })
            .collect()
    }

    /// Handles destroyed, in order.
    pub fn destroyed(&self) -> Vec<usize> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Destroy { handle } => Some(*handle),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

/// Records calls instead of drawing anything.
///
/// Every pushed value is also stored in the node’s field bag under the property name.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    recorder: Recorder,
    next_handle: usize,
}

impl RecordingBackend {
    pub fn new() -> RecordingBackend {
        RecordingBackend::default()
    }

    /// A handle to the call log, which stays valid after the backend was moved into a tree.
    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }
}

impl Backend for RecordingBackend {
    type Handle = usize;

    fn create(&mut self, widget: &dyn Widget<Self>) -> usize {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.recorder.record(Call::Create {
            handle,
            kind: widget.kind(),
        });
        handle
    }

    fn push_field(&mut self, handle: &mut usize, fields: &mut Fields, name: &str, value: &Value) {
        fields.insert(name, value.clone());
        self.recorder.record(Call::Push {
            handle: *handle,
            name: name.to_string(),
            value: value.clone(),
        });
    }

    fn set_children(&mut self, parent: &mut usize, slot: &str, children: Vec<&usize>) {
        self.recorder.record(Call::SetChildren {
            parent: *parent,
            slot: slot.to_string(),
            children: children.into_iter().copied().collect(),
        });
    }

    fn set_root(&mut self, roots: Vec<&usize>) {
        self.recorder.record(Call::SetRoot {
            roots: roots.into_iter().copied().collect(),
        });
    }

    fn destroy(&mut self, handle: usize) {
        self.recorder.record(Call::Destroy { handle });
    }
}

/// A button with an automatic `label` and an optional `action` pushed on every pass.
#[derive(Debug, Clone)]
pub struct Button {
    pub label: String,
    pub action: Option<Callback>,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Button {
        Button {
            label: label.into(),
            action: None,
        }
    }

    pub fn action(mut self, f: impl Fn() + Send + Sync + 'static) -> Button {
        self.action = Some(Callback::new(f));
        self
    }
}

impl Widget<RecordingBackend> for Button {
    fn kind(&self) -> &'static str {
        "button"
    }

    fn properties(&self) -> Vec<Property> {
        vec![
            Property::automatic("label", self.label.clone()),
            Property::optional("action", UpdateStrategy::Always, self.action.clone()),
        ]
    }
}

impl_widget!(Button: RecordingBackend);

/// A text label. `tooltip` is pushed on every pass caused by a state change.
#[derive(Debug, Clone)]
pub struct Label {
    pub text: String,
    pub tooltip: Option<String>,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Label {
        Label {
            text: text.into(),
            tooltip: None,
        }
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Label {
        self.tooltip = Some(tooltip.into());
        self
    }
}

impl Widget<RecordingBackend> for Label {
    fn kind(&self) -> &'static str {
        "label"
    }

    fn properties(&self) -> Vec<Property> {
        vec![
            Property::automatic("text", self.text.clone()),
            Property::optional(
                "tooltip",
                UpdateStrategy::AlwaysWhenStateChanged,
                self.tooltip.clone(),
            ),
        ]
    }
}

impl_widget!(Label: RecordingBackend);

/// A container with a main slot and an optional `footer` slot.
#[derive(Debug, Clone)]
pub struct Stack {
    pub spacing: i64,
    pub children: Body<RecordingBackend>,
    pub footer: Option<Body<RecordingBackend>>,
}

impl Stack {
    pub fn new(children: Body<RecordingBackend>) -> Stack {
        Stack {
            spacing: 0,
            children,
            footer: None,
        }
    }

    pub fn spacing(mut self, spacing: i64) -> Stack {
        self.spacing = spacing;
        self
    }

    pub fn footer(mut self, footer: Body<RecordingBackend>) -> Stack {
        self.footer = Some(footer);
        self
    }
}

impl Widget<RecordingBackend> for Stack {
    fn kind(&self) -> &'static str {
        "stack"
    }

    fn properties(&self) -> Vec<Property> {
        vec![Property::automatic("spacing", self.spacing)]
    }

    fn content(&self) -> Vec<(&'static str, Body<RecordingBackend>)> {
        let mut content = vec![(MAIN_SLOT, self.children.clone())];
        if let Some(footer) = &self.footer {
            content.push(("footer", footer.clone()));
        }
        content
    }
}

impl_widget!(Stack: RecordingBackend);
