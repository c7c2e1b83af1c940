use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::{abortable, AbortHandle, LocalBoxFuture};

use crate::scheduler::Scheduler;
use crate::signal::Signal;
use crate::var::Var;

/// Bookkeeping for the request that is allowed to deliver.
#[derive(Default)]
struct Latest {
	generation: Cell<u64>,
	abort: RefCell<Option<AbortHandle>>,
}

impl Latest {
	/// Stamp a new request and cancel the one it supersedes.
	fn supersede(&self, handle: AbortHandle) -> u64 {
		let generation = self.generation.get() + 1;
		self.generation.set(generation);
		if let Some(previous) = self.abort.replace(Some(handle)) {
			previous.abort();
			tracing::trace!(generation, "superseded in-flight request");
		}
		generation
	}

	fn is_current(&self, generation: u64) -> bool {
		self.generation.get() == generation
	}
}

impl<K> Signal<K>
where
	K: Clone + 'static,
{
	/// For every key, start the asynchronous lookup `func(key)` on
	/// `scheduler` and forward its result. Only the most recently started
	/// lookup may deliver: older ones are aborted, and a result that still
	/// slips through is dropped by its generation stamp.
	pub fn flat_map_latest<R, F>(&self, scheduler: &Scheduler, func: F) -> Signal<R>
	where
		F: Fn(&K) -> LocalBoxFuture<'static, R> + 'static,
		R: 'static,
	{
		let output = Var::with_name("flat_map_latest", None);
		let latest = Rc::new(Latest::default());

		let target = output.downgrade();
		let scheduler = scheduler.clone();
		let driver = self.subscribe_with_name("flat_map_latest", move |key| {
			let (lookup, handle) = abortable(func(key));
			let generation = latest.supersede(handle);

			let target = target.clone();
			let latest = latest.clone();
			scheduler.spawn(async move {
				let Ok(value) = lookup.await else {
					return;
				};
				if !latest.is_current(generation) {
					tracing::trace!(generation, "discarded stale result");
					return;
				}
				latest.abort.replace(None);
				if let Some(target) = target.upgrade() {
					target.set(value);
				}
			});
		});

		output.feed_from(driver);
		output.signal()
	}
}
