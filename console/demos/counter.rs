//! A counter driven from the UI lane and from a background thread.
//!
//! Run with `RUST_LOG=roost=debug` to see what the reconciler does.

use roost::{impl_view, view, Host, State};
use roost_console::{Button, Column, ConsoleBackend, Text};
use std::thread;
use std::time::Duration;

#[derive(Debug)]
struct App {
    ticks: State<u32>,
}

impl_view! {
    App: ConsoleBackend;
    fn body(&self, scope) {
        scope.adopt("ticks", &self.ticks);
        let count = scope.state("count", || 0_i64);
        let increment = count.clone();
        let reset = count.clone();
        let value = count.get();
        vec![view(Column::new(vec![
            view(Text::new(format!("count: {}", value))),
            view(Text::new(format!("ticks: {}", self.ticks.get()))),
            view(Button::new("increment").action(move || increment.update(|c| *c += 1))),
            view(Button::new("reset").enabled(value != 0).action(move || reset.set(0))),
        ]).spacing(1))]
    }
}

fn main() {
    env_logger::init();

    let mut host = Host::new();
    let ticks = host.runtime().state(|| 0_u32);
    let mount = host.mount(
        ConsoleBackend::new(),
        App {
            ticks: ticks.clone(),
        },
    );
    println!("{}", mount.tree().backend().render());

    for _ in 0..3 {
        mount.tree().backend().press("increment");
    }
    host.poll();
    println!("{}", mount.tree().backend().render());

    let runtime = host.runtime().clone();
    let worker = thread::spawn(move || {
        for _ in 0..5 {
            thread::sleep(Duration::from_millis(20));
            ticks.update(|t| *t += 1);
        }
        runtime.quit();
    });
    host.run();
    if worker.join().is_err() {
        eprintln!("worker panicked");
    }
    println!("{}", mount.tree().backend().render());

    mount.tree().backend().press("reset");
    host.poll();
    println!("{}", mount.tree().backend().render());
}
