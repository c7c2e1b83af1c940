use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use formwatch::{batch, combine_latest, CombineLatest, Scheduler, Signal, Var};
use futures::channel::oneshot;
use futures::future::FutureExt;

use crate::mock::{self, SharedMock, Spy};

fn collect<T: Clone + 'static>(signal: &Signal<T>) -> (Rc<RefCell<Vec<T>>>, formwatch::Subscription) {
	let seen = Rc::new(RefCell::new(Vec::new()));
	let subscription = signal.subscribe({
		let seen = seen.clone();
		move |value: &T| seen.borrow_mut().push(value.clone())
	});
	(seen, subscription)
}

#[test]
fn empty_var_emits_after_first_set() {
	mock::init_tracing();

	let name: Var<String> = Var::empty();
	let mock = SharedMock::new();

	mock.get().expect_record().times(0).return_const(());
	let _subscription = name.signal().subscribe({
		let mock = mock.clone();
		move |value: &String| mock.get().record(value.clone())
	});
	mock.get().checkpoint();

	mock.get()
		.expect_record()
		.withf(|value| value == "alice")
		.times(1)
		.return_const(());
	name.set("alice".to_owned());
	mock.get().checkpoint();
}

#[test]
fn map_emits_for_every_write() {
	let number = Var::new(1);
	let (seen, _subscription) = collect(&number.signal().map(|n| n * 10));

	number.set(2);
	number.set(2);

	assert_eq!(*seen.borrow(), [10, 20, 20]);
}

#[test]
fn combine_latest_waits_for_every_input() {
	let count: Var<u32> = Var::empty();
	let label: Var<&'static str> = Var::empty();
	let (seen, _subscription) = collect(&(&count.signal(), &label.signal()).combine_latest());

	count.set(1);
	assert!(seen.borrow().is_empty());

	label.set("x");
	count.set(2);
	label.set("y");

	assert_eq!(*seen.borrow(), [(1, "x"), (2, "x"), (2, "y")]);
}

#[test]
fn combine_latest_sees_one_snapshot() {
	let text = Var::new(String::from("ab"));
	let length = text.signal().map(|text| text.len());
	let upper = text.signal().map(|text| text.to_uppercase());

	let (seen, _subscription) = collect(&combine_latest((&length, &upper)));

	text.set("abcd".to_owned());
	text.set(String::new());
	batch(|| {
		text.set("x".to_owned());
		text.set("xyz".to_owned());
	});

	let seen = seen.borrow();
	assert_eq!(seen.len(), 4);
	for (length, upper) in seen.iter() {
		assert_eq!(*length, upper.len(), "torn pair: {length} / {upper}");
	}
	assert_eq!(seen.last(), Some(&(3, "XYZ".to_owned())));
}

#[test]
fn batch_propagates_once() {
	let left = Var::new(0);
	let right = Var::new(0);
	let sum = (&left.signal(), &right.signal())
		.combine_latest()
		.map(|(left, right)| left + right);
	let (seen, _subscription) = collect(&sum);

	batch(|| {
		left.set(1);
		right.set(2);
	});

	assert_eq!(*seen.borrow(), [0, 3]);
}

#[test]
fn remove_duplicates_skips_repeats() {
	let number = Var::new(0);
	let (seen, _subscription) = collect(&number.signal().remove_duplicates());

	number.set(0);
	number.set(1);
	number.set(1);
	number.set(0);

	assert_eq!(*seen.borrow(), [0, 1, 0]);
}

#[test]
fn share_evaluates_once_per_change() {
	let runs = Rc::new(Cell::new(0));
	let number = Var::new(1);
	let shared = number
		.signal()
		.map({
			let runs = runs.clone();
			move |n| {
				runs.set(runs.get() + 1);
				n + 1
			}
		})
		.share();

	let subscribers: Vec<_> = (0..3).map(|_| collect(&shared)).collect();
	assert_eq!(runs.get(), 1);

	number.set(5);
	assert_eq!(runs.get(), 2);
	for (seen, _) in &subscribers {
		assert_eq!(*seen.borrow(), [2, 6]);
	}
}

#[test]
fn dropped_subscription_is_silent() {
	let name = Var::new(String::from("a"));
	let mock = SharedMock::new();

	mock.get().expect_record().times(1).return_const(());
	let subscription = name.signal().subscribe({
		let mock = mock.clone();
		move |value: &String| mock.get().record(value.clone())
	});
	mock.get().checkpoint();

	assert_eq!(subscription.name(), "subscriber");
	drop(subscription);

	mock.get().expect_record().times(0).return_const(());
	name.set("b".to_owned());
	mock.get().checkpoint();
}

#[test]
fn computed_follows_the_branch_it_read() {
	let use_left = Var::new(true);
	let left = Var::new(1);
	let right = Var::new(100);
	let runs = Rc::new(Cell::new(0));

	let picked = Signal::computed({
		let (use_left, left, right, runs) = (use_left.clone(), left.clone(), right.clone(), runs.clone());
		move |cx| {
			runs.set(runs.get() + 1);
			if *use_left.get(cx)? {
				left.get(cx).map(|value| *value)
			} else {
				right.get(cx).map(|value| *value)
			}
		}
	});
	let (seen, _subscription) = collect(&picked);

	right.set(200);
	assert_eq!(runs.get(), 1);

	use_left.set(false);
	left.set(2);
	assert_eq!(runs.get(), 2);

	right.set(300);
	assert_eq!(*seen.borrow(), [1, 200, 300]);
}

#[test]
fn computed_keeps_its_value_when_nothing_is_produced() {
	let source: Var<Option<i32>> = Var::new(Some(1));
	let picked = Signal::computed({
		let source = source.clone();
		move |cx| *source.get(cx)?
	});
	let (seen, _subscription) = collect(&picked);

	source.set(None);
	assert_eq!(picked.latest(), Some(1));

	source.set(Some(2));
	assert_eq!(*seen.borrow(), [1, 2]);
}

#[test]
fn debounce_waits_for_quiet_period() {
	mock::init_tracing();

	let scheduler = Scheduler::new();
	let text = Var::new(String::new());
	let (seen, _subscription) = collect(&text.signal().debounce(&scheduler, Duration::from_millis(400)));

	assert!(seen.borrow().is_empty());
	scheduler.advance(Duration::from_millis(400));
	assert_eq!(*seen.borrow(), [""]);

	text.set("a".to_owned());
	scheduler.advance(Duration::from_millis(100));
	text.set("ab".to_owned());
	scheduler.advance(Duration::from_millis(100));
	text.set("abc".to_owned());
	scheduler.advance(Duration::from_millis(399));
	assert_eq!(*seen.borrow(), [""]);

	scheduler.advance(Duration::from_millis(1));
	assert_eq!(*seen.borrow(), ["", "abc"]);
	assert_eq!(scheduler.pending_timers(), 0);
}

#[test]
fn flat_map_latest_drops_superseded_lookups() {
	mock::init_tracing();

	let scheduler = Scheduler::new();
	let key: Var<u32> = Var::empty();
	let senders = Rc::new(RefCell::new(HashMap::new()));
	let started = Rc::new(Cell::new(0));

	let looked_up = key.signal().flat_map_latest(&scheduler, {
		let senders = senders.clone();
		let started = started.clone();
		move |key: &u32| {
			started.set(started.get() + 1);
			let (sender, receiver) = oneshot::channel::<u32>();
			senders.borrow_mut().insert(*key, sender);
			receiver.map(|value| value.unwrap_or(0)).boxed_local()
		}
	});
	let (seen, _subscription) = collect(&looked_up);

	key.set(1);
	scheduler.run_until_stalled();
	key.set(2);

	// Still deliverable, but the lookup was aborted before it could land.
	let first = senders.borrow_mut().remove(&1).unwrap();
	assert!(first.send(10).is_ok());
	scheduler.run_until_stalled();
	assert!(seen.borrow().is_empty());

	let second = senders.borrow_mut().remove(&2).unwrap();
	assert!(second.send(20).is_ok());
	scheduler.run_until_stalled();

	assert_eq!(*seen.borrow(), [20]);
	assert_eq!(started.get(), 2);
}
