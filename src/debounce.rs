use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::scheduler::{Scheduler, TimerId};
use crate::signal::Signal;
use crate::var::Var;

impl<T> Signal<T>
where
	T: Clone + 'static,
{
	/// Emit a value only after `duration` of logical time passed without a
	/// newer one. Each arrival cancels the pending timer and starts over, so
	/// a superseded value is never delivered.
	pub fn debounce(&self, scheduler: &Scheduler, duration: Duration) -> Signal<T> {
		let output = Var::with_name("debounce", None);
		let pending: Rc<Cell<Option<TimerId>>> = Rc::new(Cell::new(None));

		let target = output.downgrade();
		let scheduler = scheduler.clone();
		let driver = self.subscribe_with_name("debounce", move |value| {
			if let Some(id) = pending.take() {
				scheduler.cancel(id);
			}

			let target = target.clone();
			let value = value.clone();
			let fired = pending.clone();
			let id = scheduler.schedule(duration, move || {
				fired.set(None);
				if let Some(target) = target.upgrade() {
					target.set(value);
				}
			});
			pending.set(Some(id));
		});

		output.feed_from(driver);
		output.signal()
	}
}
