use roost::testing::{Button, Label, RecordingBackend};
use roost::{either, impl_view, view, Body, Host, Mount, State, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Invokes the action stored by the recording backend on a top-level button.
fn press(mount: &Mount<RecordingBackend>, index: usize) {
    let action = mount.tree().nodes()[index]
        .fields()
        .get::<Value>("action")
        .and_then(|value| value.as_callback())
        .cloned()
        .expect("button has an action");
    action.call();
}

fn label_of(mount: &Mount<RecordingBackend>, index: usize) -> String {
    let tree = mount.tree();
    let fields = tree.nodes()[index].fields();
    fields
        .get::<Value>("label")
        .or_else(|| fields.get::<Value>("text"))
        .and_then(|value| value.as_str().map(String::from))
        .unwrap_or_default()
}

fn increment(count: &State<i64>) -> impl Fn() + Send + Sync + 'static {
    let count = count.clone();
    move || count.update(|c| *c += 1)
}

#[derive(Debug)]
struct Counter {
    name: &'static str,
}

impl_view! {
    Counter: RecordingBackend;
    fn body(&self, scope) {
        let count = scope.state("count", || 0_i64);
        let label = format!("{} {}", self.name, count.get());
        vec![view(Button::new(label).action(increment(&count)))]
    }
}

#[test]
fn keyed_state_survives_passes() {
    let mut host = Host::new();
    let body: Body<RecordingBackend> =
        vec![view(Counter { name: "a" }), view(Counter { name: "b" })];
    let mount = host.mount(RecordingBackend::new(), body);
    assert_eq!(label_of(&mount, 0), "a 0");

    press(&mount, 0);
    press(&mount, 0);
    press(&mount, 1);
    host.poll();
    assert_eq!(label_of(&mount, 0), "a 2");
    assert_eq!(label_of(&mount, 1), "b 1");
    assert_eq!(mount.tree().passes(), 2);

    press(&mount, 1);
    host.poll();
    assert_eq!(label_of(&mount, 0), "a 2");
    assert_eq!(label_of(&mount, 1), "b 2");
}

#[test]
fn state_is_released_with_its_node() {
    let mut host = Host::new();
    let body: Body<RecordingBackend> =
        vec![view(Counter { name: "a" }), view(Counter { name: "b" })];
    let mount = host.mount(RecordingBackend::new(), body);
    assert_eq!(host.runtime().store().len(), 2);

    let body: Body<RecordingBackend> = vec![view(Counter { name: "a" })];
    mount.tree_mut().set_root(body);
    host.request_update(false);
    assert_eq!(host.runtime().store().len(), 1);

    mount.tree_mut().clear();
    assert!(host.runtime().store().is_empty());
}

#[derive(Debug)]
struct Conditional {
    extra: bool,
}

impl_view! {
    Conditional: RecordingBackend;
    fn body(&self, scope) {
        if self.extra {
            let extra = scope.state("extra", || 100_i64);
            extra.get();
        }
        let main = scope.state("main", || 0_i64);
        vec![view(Button::new(main.get().to_string()).action(increment(&main)))]
    }
}

#[test]
fn keys_are_stable_under_conditional_declarations() {
    let mut host = Host::new();
    let mount = host.mount(RecordingBackend::new(), Conditional { extra: false });
    press(&mount, 0);
    host.poll();
    assert_eq!(label_of(&mount, 0), "1");

    mount.tree_mut().set_root(Conditional { extra: true });
    host.request_update(false);
    assert_eq!(label_of(&mount, 0), "1");

    mount.tree_mut().set_root(Conditional { extra: false });
    press(&mount, 0);
    host.poll();
    assert_eq!(label_of(&mount, 0), "2");
}

#[derive(Debug)]
struct Positional;

impl_view! {
    Positional: RecordingBackend;
    fn body(&self, scope) {
        let first = scope.use_state(|| 1_i64);
        let second = scope.use_state(|| 10_i64);
        let label = (first.get() + second.get()).to_string();
        vec![view(Button::new(label).action(increment(&second)))]
    }
}

#[test]
fn positional_state_fallback() {
    let mut host = Host::new();
    let mount = host.mount(RecordingBackend::new(), Positional);
    assert_eq!(label_of(&mount, 0), "11");
    press(&mount, 0);
    host.poll();
    assert_eq!(label_of(&mount, 0), "12");
}

#[derive(Debug)]
struct Switcher {
    as_label: bool,
}

impl_view! {
    Switcher: RecordingBackend;
    fn body(&self, scope) {
        let count = scope.state("count", || 0_i64);
        let text = count.get().to_string();
        vec![view(either(
            self.as_label,
            Label::new(text.clone()),
            Button::new(text).action(increment(&count)),
        ))]
    }
}

#[test]
fn state_moves_to_the_replacement_node() {
    let mut host = Host::new();
    let backend = RecordingBackend::new();
    let recorder = backend.recorder();
    let mount = host.mount(backend, Switcher { as_label: false });
    press(&mount, 0);
    press(&mount, 0);
    host.poll();
    assert_eq!(label_of(&mount, 0), "2");

    mount.tree_mut().set_root(Switcher { as_label: true });
    host.request_update(false);
    assert_eq!(mount.tree().nodes()[0].kind(), "label");
    assert_eq!(label_of(&mount, 0), "2");
    assert_eq!(recorder.destroyed(), [0]);
    assert_eq!(host.runtime().store().len(), 1);
}

#[derive(Debug)]
struct Parent;

#[derive(Debug)]
struct Child {
    count: State<i64>,
}

impl_view! {
    Parent: RecordingBackend;
    fn body(&self, scope) {
        // a fresh cell on every pass
        let count = scope.runtime().state(|| 0_i64);
        vec![view(Child { count })]
    }
}

impl_view! {
    Child: RecordingBackend;
    fn body(&self, scope) {
        scope.adopt("count", &self.count);
        let label = self.count.get().to_string();
        vec![view(Button::new(label).action(increment(&self.count)))]
    }
}

#[test]
fn adopted_cells_keep_their_value() {
    let mut host = Host::new();
    let mount = host.mount(RecordingBackend::new(), Parent);
    for expected in ["1", "2", "3"] {
        press(&mount, 0);
        host.poll();
        assert_eq!(label_of(&mount, 0), expected);
    }
    assert_eq!(host.runtime().store().len(), 1);
}

#[test]
fn background_writes_reach_the_lane() {
    let mut host = Host::new();
    let label = host.runtime().state(|| String::from("waiting"));
    let runtime = host.runtime().clone();

    #[derive(Debug)]
    struct Status {
        label: State<String>,
    }

    impl_view! {
        Status: RecordingBackend;
        fn body(&self, scope) {
            scope.adopt("label", &self.label);
            vec![view(Label::new(self.label.get()))]
        }
    }

    let mount = host.mount(
        RecordingBackend::new(),
        Status {
            label: label.clone(),
        },
    );
    let worker = std::thread::spawn(move || {
        label.set(String::from("done"));
        runtime.quit();
    });
    host.run();
    worker.join().unwrap();
    assert_eq!(label_of(&mount, 0), "done");
}

#[derive(Debug)]
struct Toggle {
    initial: bool,
    name: &'static str,
}

impl_view! {
    Toggle: RecordingBackend;
    fn body(&self, scope) {
        let initial = self.initial;
        let shown = scope.state("shown", move || initial);
        if shown.get() {
            vec![view(Label::new(self.name))]
        } else {
            Vec::new()
        }
    }
}

fn texts(mount: &Mount<RecordingBackend>) -> Vec<String> {
    (0..mount.tree().nodes().len())
        .map(|index| label_of(mount, index))
        .collect()
}

#[test]
fn siblings_of_one_type_do_not_share_state() {
    let mut host = Host::new();
    let body: Body<RecordingBackend> = vec![
        view(Toggle {
            initial: false,
            name: "first",
        }),
        view(Toggle {
            initial: true,
            name: "second",
        }),
    ];
    let mount = host.mount(RecordingBackend::new(), body);
    assert_eq!(texts(&mount), ["second"]);

    host.request_update(false);
    host.request_update(true);
    assert_eq!(texts(&mount), ["second"]);
    assert_eq!(mount.tree().level().states().count(), 2);
    assert_eq!(host.runtime().store().len(), 2);
}

#[derive(Debug)]
struct Loader {
    cell: Rc<RefCell<Option<State<Option<String>>>>>,
}

impl_view! {
    Loader: RecordingBackend;
    fn body(&self, scope) {
        let data = scope.state("data", || None::<String>);
        *self.cell.borrow_mut() = Some(data.clone());
        match data.get() {
            Some(text) => vec![view(Label::new(text))],
            None => Vec::new(),
        }
    }
}

#[test]
fn empty_composites_receive_background_results() {
    let mut host = Host::new();
    let cell = Rc::new(RefCell::new(None));
    let mount = host.mount(
        RecordingBackend::new(),
        Loader {
            cell: Rc::clone(&cell),
        },
    );
    assert!(mount.tree().nodes().is_empty());

    let data = cell.borrow().clone().expect("loader ran");
    let runtime = host.runtime().clone();
    let worker = std::thread::spawn(move || {
        data.set(Some(String::from("loaded")));
        runtime.quit();
    });
    host.run();
    worker.join().unwrap();
    assert_eq!(texts(&mount), ["loaded"]);

    // still the same cell after more passes
    host.request_update(true);
    assert_eq!(texts(&mount), ["loaded"]);
    assert_eq!(host.runtime().store().len(), 1);
}
