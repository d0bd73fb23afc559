use std::cell::RefCell;
use std::rc::Rc;

use live_core::{
    DispatchState, ItemError, LiveCollection, LiveCollectionOptions, MemorySurface,
    QueuedLiveCollection, RenderedItem, Strategy,
};
use live_runtime_std::{StdRuntime, StdScheduler};

const FRAME_BUDGET_MILLIS: u64 = 8;

/// Text row that prints itself whenever it is refreshed.
struct Label {
    text: String,
    index: usize,
}

impl RenderedItem for Label {
    type Value = String;

    fn value(&self) -> &String {
        &self.text
    }

    fn set_value(&mut self, value: String) {
        self.text = value;
    }

    fn index(&self) -> usize {
        self.index
    }

    fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    fn refresh(&mut self) -> Result<(), ItemError> {
        if self.text.is_empty() {
            return Err(ItemError::new(format!("empty label at row {}", self.index)));
        }
        println!("  render row {:>2}: {}", self.index, self.text);
        Ok(())
    }

    fn destroy(&mut self) {
        println!("  dispose {}", self.text);
    }
}

type Labels = QueuedLiveCollection<MemorySurface, Label, fn(usize, String) -> Label, Rc<StdScheduler>>;

fn new_label(index: usize, text: String) -> Label {
    Label { text, index }
}

/// Moves, creates and trims rows until the collection shows `next`.
fn reconcile(labels: &mut Labels, next: &[&str]) {
    for (index, &text) in next.iter().enumerate() {
        if index < labels.length() && labels.at(index) == text {
            continue;
        }
        match (index + 1..labels.length()).find(|&at| labels.at(at) == text) {
            Some(from) => labels.move_item(from, index),
            None => {
                let item = labels.create(index, text.to_owned());
                labels.attach(index, item);
            }
        }
    }
    while labels.length() > next.len() {
        let item = labels.detach(labels.length() - 1);
        labels.destroy(item);
    }
}

fn run_pass(runtime: &StdRuntime, labels: &mut Labels, name: &str, next: &[&str]) {
    println!("--- {name} ---");
    reconcile(labels, next);
    log::info!(
        "{name}: {} pending operations, index update needed: {}",
        labels.pending_len(),
        labels.needs_index_update()
    );
    let tokens = labels.flush();

    let mut frames = 0;
    while runtime.take_frame_request() {
        frames += 1;
        let ran = runtime.run_frame();
        log::debug!("frame {frames}: ran {ran} units");
    }

    let failed = tokens
        .iter()
        .filter(|token| matches!(token.state(), DispatchState::Failed(_)))
        .count();
    if failed > 0 {
        log::warn!("{name}: {failed} units failed");
    }
    labels.reset();
    println!("  surface: {}", labels.surface().borrow().dump());
}

fn main() {
    env_logger::init();

    println!("=== Live Collection Demo ===");
    println!("Each pass diffs the rows, queues the edits and drains them per frame.");
    println!("Set RUST_LOG=trace to follow every queued operation.");
    println!();

    let runtime = StdRuntime::with_frame_budget(FRAME_BUDGET_MILLIS);
    let mut labels: Labels = QueuedLiveCollection::with_options(
        Rc::new(RefCell::new(MemorySurface::new())),
        new_label as fn(usize, String) -> Label,
        runtime.scheduler(),
        LiveCollectionOptions {
            strategy: Strategy::UserBlocking,
            ..LiveCollectionOptions::default()
        },
    );
    labels.reset();

    run_pass(&runtime, &mut labels, "initial", &["apple", "banana", "cherry", "date"]);
    run_pass(&runtime, &mut labels, "reorder", &["date", "apple", "cherry", "banana"]);
    run_pass(&runtime, &mut labels, "insert", &["date", "apple", "elderberry", "cherry", "banana"]);
    run_pass(&runtime, &mut labels, "trim", &["apple", "cherry"]);

    println!("--- rename ---");
    labels.update_value(1, "cherry (ripe)".to_owned());
    labels.update_value(0, String::new());
    labels.flush();
    runtime.run_frame();
    labels.reset();
    println!("  surface: {}", labels.surface().borrow().dump());
}
