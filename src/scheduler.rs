use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;

use crate::batch::batch;

/// Handle to a scheduled timer. Timers fire in due-time order, ties in the
/// order they were scheduled.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct TimerId {
	due: Duration,
	sequence: u64,
}

impl TimerId {
	pub fn due(&self) -> Duration {
		self.due
	}
}

type Task = Box<dyn FnOnce()>;

/// The single logical thread the graph runs on: a virtual clock, a timer
/// queue and a local executor for asynchronous work.
///
/// Nothing here reads the wall clock. The embedder moves time forward with
/// [`Scheduler::advance`], which keeps debounce behaviour deterministic.
/// Spawned futures are always polled on the scheduler's thread, so results
/// produced on other threads re-enter the graph from here.
#[derive(Clone)]
pub struct Scheduler {
	inner: Rc<SchedulerInner>,
}

struct SchedulerInner {
	now: Cell<Duration>,
	sequence: Cell<u64>,
	timers: RefCell<BTreeMap<TimerId, Task>>,
	pool: RefCell<LocalPool>,
	spawner: LocalSpawner,
}

impl Default for Scheduler {
	fn default() -> Self {
		Self::new()
	}
}

impl Scheduler {
	pub fn new() -> Self {
		let pool = LocalPool::new();
		let spawner = pool.spawner();
		Scheduler {
			inner: Rc::new(SchedulerInner {
				now: Cell::new(Duration::ZERO),
				sequence: Cell::new(0),
				timers: RefCell::new(BTreeMap::new()),
				pool: RefCell::new(pool),
				spawner,
			}),
		}
	}

	/// Logical time elapsed since the scheduler was created.
	pub fn now(&self) -> Duration {
		self.inner.now.get()
	}

	pub fn pending_timers(&self) -> usize {
		self.inner.timers.borrow().len()
	}

	pub fn schedule(&self, delay: Duration, task: impl FnOnce() + 'static) -> TimerId {
		let sequence = self.inner.sequence.get();
		self.inner.sequence.set(sequence + 1);

		let id = TimerId {
			due: self.now() + delay,
			sequence,
		};
		self.inner.timers.borrow_mut().insert(id, Box::new(task));
		tracing::trace!(?id, "timer scheduled");
		id
	}

	/// Returns `false` if the timer already fired or was cancelled.
	pub fn cancel(&self, id: TimerId) -> bool {
		let cancelled = self.inner.timers.borrow_mut().remove(&id).is_some();
		if cancelled {
			tracing::trace!(?id, "timer cancelled");
		}
		cancelled
	}

	pub fn spawn(&self, future: impl Future<Output = ()> + 'static) {
		if let Err(error) = self.inner.spawner.spawn_local(future) {
			tracing::error!(%error, "failed to spawn task");
		}
	}

	/// Poll every spawned task that can make progress without blocking.
	pub fn run_until_stalled(&self) {
		match self.inner.pool.try_borrow_mut() {
			Ok(mut pool) => pool.run_until_stalled(),
			Err(_) => tracing::trace!("executor already running"),
		}
	}

	/// Move logical time forward by `by`, firing every timer that comes due
	/// on the way. Each timer runs as its own propagation pass.
	pub fn advance(&self, by: Duration) {
		let target = self.now() + by;
		while self.fire_next(target) {}
		self.inner.now.set(target);
		self.run_until_stalled();
	}

	/// Fast-forward through every pending timer without blocking on tasks
	/// that wait for the outside world.
	pub fn settle(&self) {
		while self.fire_next(Duration::MAX) {}
		self.run_until_stalled();
	}

	/// Block until every spawned task has completed, fast-forwarding the
	/// clock through pending timers in between. Meant for checkers that
	/// answer from another thread.
	pub fn run(&self) {
		loop {
			if let Ok(mut pool) = self.inner.pool.try_borrow_mut() {
				pool.run();
			}
			if !self.fire_next(Duration::MAX) {
				break;
			}
		}
	}

	fn fire_next(&self, limit: Duration) -> bool {
		self.run_until_stalled();

		let next = {
			let mut timers = self.inner.timers.borrow_mut();
			match timers.first_key_value() {
				Some((id, _)) if id.due <= limit => timers.pop_first(),
				_ => None,
			}
		};

		let Some((id, task)) = next else {
			return false;
		};

		if id.due > self.now() {
			self.inner.now.set(id.due);
		}
		tracing::trace!(?id, "timer fired");
		batch(task);
		true
	}
}

impl std::fmt::Debug for Scheduler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Scheduler")
			.field("now", &self.now())
			.field("pending_timers", &self.pending_timers())
			.finish()
	}
}
