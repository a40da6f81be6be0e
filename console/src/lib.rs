//! A backend that keeps its widgets as an in-memory text tree.
//!
//! Useful for demos and for poking at the reconciler without a window system. Button actions
//! can be triggered with [`ConsoleBackend::press`].

use roost::{
    impl_widget, Backend, Body, Callback, Fields, Property, UpdateStrategy, Value, Widget,
    MAIN_SLOT,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::rc::Rc;

/// Holds the current action of a button; shared between the widget and the node’s field bag.
type ActionHolder = Rc<RefCell<Option<Callback>>>;

#[derive(Debug)]
struct ConsoleNode {
    kind: &'static str,
    properties: BTreeMap<String, String>,
    children: BTreeMap<String, Vec<ConsoleHandle>>,
    action: Option<ActionHolder>,
}

/// A reference to a console widget.
#[derive(Debug, Clone)]
pub struct ConsoleHandle(Rc<RefCell<ConsoleNode>>);

impl ConsoleHandle {
    pub fn kind(&self) -> &'static str {
        self.0.borrow().kind
    }

    /// The last value pushed for a property, formatted.
    pub fn property(&self, name: &str) -> Option<String> {
        self.0.borrow().properties.get(name).cloned()
    }
}

/// Draws widgets as lines of text.
#[derive(Debug, Default)]
pub struct ConsoleBackend {
    roots: Vec<ConsoleHandle>,
    created: usize,
    destroyed: usize,
}

impl ConsoleBackend {
    pub fn new() -> ConsoleBackend {
        ConsoleBackend::default()
    }

    /// Returns the current widget tree, one widget per line, children indented.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for root in &self.roots {
            write_node(&mut out, root, 0);
        }
        out
    }

    /// Invokes the action of the first enabled button labeled `label`.
    ///
    /// Returns false if there is no such button, or if it has no action.
    pub fn press(&self, label: &str) -> bool {
        let action = self
            .roots
            .iter()
            .find_map(|root| find_action(root, label));
        match action {
            Some(action) => {
                log::debug!("pressing {:?}", label);
                action.call();
                true
            }
            None => false,
        }
    }

    /// Number of widgets that currently exist.
    pub fn live(&self) -> usize {
        self.created - self.destroyed
    }
}

fn write_node(out: &mut String, handle: &ConsoleHandle, depth: usize) {
    let node = handle.0.borrow();
    let _ = write!(out, "{:indent$}{}", "", node.kind, indent = depth * 2);
    for (name, value) in &node.properties {
        let _ = write!(out, " {}={}", name, value);
    }
    out.push('\n');
    for (slot, children) in &node.children {
        if slot != MAIN_SLOT {
            let _ = writeln!(out, "{:indent$}{}:", "", slot, indent = depth * 2 + 2);
        }
        for child in children {
            write_node(out, child, depth + 1);
        }
    }
}

fn find_action(handle: &ConsoleHandle, label: &str) -> Option<Callback> {
    let node = handle.0.borrow();
    let labeled = node.properties.get("label").map(String::as_str) == Some(label);
    let disabled = node.properties.get("enabled").map(String::as_str) == Some("false");
    if node.kind == "button" && labeled && !disabled {
        if let Some(action) = node.action.as_ref().and_then(|holder| holder.borrow().clone()) {
            return Some(action);
        }
    }
    node.children
        .values()
        .flatten()
        .find_map(|child| find_action(child, label))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Text(text) => format!("{:?}", text),
        Value::List(items) => {
            let items: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        other => format!("{:?}", other),
    }
}

impl Backend for ConsoleBackend {
    type Handle = ConsoleHandle;

    fn create(&mut self, widget: &dyn Widget<Self>) -> ConsoleHandle {
        self.created += 1;
        log::debug!("create {}", widget.kind());
        ConsoleHandle(Rc::new(RefCell::new(ConsoleNode {
            kind: widget.kind(),
            properties: BTreeMap::new(),
            children: BTreeMap::new(),
            action: None,
        })))
    }

    fn push_field(
        &mut self,
        handle: &mut ConsoleHandle,
        fields: &mut Fields,
        name: &str,
        value: &Value,
    ) {
        log::trace!("{} {} = {:?}", handle.kind(), name, value);
        if let Value::Callback(callback) = value {
            let holder = match fields.get::<ActionHolder>(name) {
                Some(holder) => Rc::clone(holder),
                None => {
                    let holder: ActionHolder = Rc::new(RefCell::new(None));
                    fields.insert(name, Rc::clone(&holder));
                    handle.0.borrow_mut().action = Some(Rc::clone(&holder));
                    holder
                }
            };
            *holder.borrow_mut() = Some(callback.clone());
            return;
        }
        handle
            .0
            .borrow_mut()
            .properties
            .insert(name.to_string(), format_value(value));
    }

    fn set_children(
        &mut self,
        parent: &mut ConsoleHandle,
        slot: &str,
        children: Vec<&ConsoleHandle>,
    ) {
        let children = children.into_iter().cloned().collect();
        parent.0.borrow_mut().children.insert(slot.to_string(), children);
    }

    fn set_root(&mut self, roots: Vec<&ConsoleHandle>) {
        self.roots = roots.into_iter().cloned().collect();
    }

    fn destroy(&mut self, handle: ConsoleHandle) {
        self.destroyed += 1;
        log::debug!("destroy {}", handle.kind());
    }
}

/// A line of text.
#[derive(Debug, Clone)]
pub struct Text {
    text: String,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Text {
        Text { text: text.into() }
    }
}

impl Widget<ConsoleBackend> for Text {
    fn kind(&self) -> &'static str {
        "text"
    }

    fn properties(&self) -> Vec<Property> {
        vec![Property::automatic("text", self.text.clone())]
    }
}

impl_widget!(Text: ConsoleBackend);

/// A pressable button.
#[derive(Debug, Clone)]
pub struct Button {
    label: String,
    action: Option<Callback>,
    enabled: bool,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Button {
        Button {
            label: label.into(),
            action: None,
            enabled: true,
        }
    }

    pub fn action(mut self, f: impl Fn() + Send + Sync + 'static) -> Button {
        self.action = Some(Callback::new(f));
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Button {
        self.enabled = enabled;
        self
    }
}

impl Widget<ConsoleBackend> for Button {
    fn kind(&self) -> &'static str {
        "button"
    }

    fn properties(&self) -> Vec<Property> {
        vec![
            Property::automatic("label", self.label.clone()),
            Property::automatic("enabled", self.enabled),
            Property::optional("action", UpdateStrategy::Always, self.action.clone()),
        ]
    }
}

impl_widget!(Button: ConsoleBackend);

/// Stacks its children vertically.
#[derive(Debug, Clone)]
pub struct Column {
    children: Body<ConsoleBackend>,
    spacing: i64,
}

impl Column {
    pub fn new(children: Body<ConsoleBackend>) -> Column {
        Column {
            children,
            spacing: 0,
        }
    }

    pub fn spacing(mut self, spacing: i64) -> Column {
        self.spacing = spacing;
        self
    }
}

impl Widget<ConsoleBackend> for Column {
    fn kind(&self) -> &'static str {
        "column"
    }

    fn properties(&self) -> Vec<Property> {
        vec![Property::automatic("spacing", self.spacing)]
    }

    fn content(&self) -> Vec<(&'static str, Body<ConsoleBackend>)> {
        vec![(MAIN_SLOT, self.children.clone())]
    }
}

impl_widget!(Column: ConsoleBackend);
