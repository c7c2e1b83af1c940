use std::cell::{Cell, RefCell};
use std::rc::Weak;

use crate::reaction::Reactive;

thread_local! {
	static STARTED: Cell<bool> = const { Cell::new(false) };
	static CHANGED: RefCell<Vec<Weak<dyn Reactive>>> = const { RefCell::new(Vec::new()) };
}

pub fn in_batch() -> bool {
	STARTED.with(|s| s.get())
}

/// Run `func` as one propagation pass. Writes made inside are only observed
/// by reactions once the outermost batch returns.
pub fn batch<R>(func: impl FnOnce() -> R) -> R {
	let root = BatchRoot::start();
	let result = func();
	if let Some(root) = root {
		batch_run();
		drop(root);
	}
	result
}

/// Resets the batch flag even if the batch body panics.
struct BatchRoot;

impl BatchRoot {
	fn start() -> Option<BatchRoot> {
		STARTED.with(|s| {
			if s.get() {
				None
			} else {
				s.set(true);
				Some(BatchRoot)
			}
		})
	}
}

impl Drop for BatchRoot {
	fn drop(&mut self) {
		STARTED.with(|s| s.set(false));
	}
}

pub(crate) fn enqueue(reaction: Weak<dyn Reactive>) {
	CHANGED.with(|changed| changed.borrow_mut().push(reaction));
}

fn batch_run() {
	loop {
		let changed = CHANGED.with(|changed| std::mem::take(&mut *changed.borrow_mut()));

		if changed.is_empty() {
			break;
		}

		tracing::trace!(reactions = changed.len(), "flushing batch");
		for reaction in changed {
			if let Some(reactive) = reaction.upgrade() {
				reactive.update();
			}
		}
	}
}
