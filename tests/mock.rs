use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use formwatch::form::AvailabilityChecker;
use formwatch::CheckError;
use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use mockall::*;

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_max_level(tracing::Level::TRACE)
		.with_test_writer()
		.try_init();
}

#[automock]
pub trait Spy {
	fn record(&self, value: String);
}

#[derive(Clone)]
pub struct SharedMock(Arc<Mutex<MockSpy>>);

impl SharedMock {
	pub fn new() -> SharedMock {
		SharedMock(Arc::new(Mutex::new(MockSpy::new())))
	}

	pub fn get(&self) -> MutexGuard<'_, MockSpy> {
		self.0.lock().unwrap()
	}
}

mock! {
	pub Checker {}

	impl AvailabilityChecker for Checker {
		fn check_availability(&self, username: &str) -> LocalBoxFuture<'static, Result<bool, CheckError>>;
	}
}

pub fn answer(result: Result<bool, CheckError>) -> LocalBoxFuture<'static, Result<bool, CheckError>> {
	futures::future::ready(result).boxed_local()
}

/// A checker whose answers are handed out by the test, one request at a
/// time, in any order.
#[derive(Clone, Default)]
pub struct PendingChecker {
	inner: Rc<RefCell<PendingInner>>,
}

#[derive(Default)]
struct PendingInner {
	requests: Vec<String>,
	waiting: Vec<(String, oneshot::Sender<Result<bool, CheckError>>)>,
}

impl PendingChecker {
	pub fn requests(&self) -> Vec<String> {
		self.inner.borrow().requests.clone()
	}

	/// Answer the oldest open request for `username`. Returns `false` when
	/// nobody is listening any more.
	pub fn resolve(&self, username: &str, result: Result<bool, CheckError>) -> bool {
		let sender = {
			let mut inner = self.inner.borrow_mut();
			let position = inner
				.waiting
				.iter()
				.position(|(name, _)| name == username)
				.unwrap_or_else(|| panic!("no open request for {username}"));
			inner.waiting.remove(position).1
		};
		sender.send(result).is_ok()
	}
}

impl AvailabilityChecker for PendingChecker {
	fn check_availability(&self, username: &str) -> LocalBoxFuture<'static, Result<bool, CheckError>> {
		let (sender, receiver) = oneshot::channel();
		let mut inner = self.inner.borrow_mut();
		inner.requests.push(username.to_owned());
		inner.waiting.push((username.to_owned(), sender));

		receiver
			.map(|answer| answer.unwrap_or(Err(CheckError::NoData)))
			.boxed_local()
	}
}

/// A checker that answers from its own thread after a short delay, the way
/// a blocking network client would. Every name except `taken` is free.
#[derive(Clone, Default)]
pub struct ThreadChecker {
	requests: Arc<Mutex<Vec<String>>>,
}

impl ThreadChecker {
	pub fn requests(&self) -> Vec<String> {
		self.requests.lock().unwrap().clone()
	}
}

impl AvailabilityChecker for ThreadChecker {
	fn check_availability(&self, username: &str) -> LocalBoxFuture<'static, Result<bool, CheckError>> {
		let (sender, receiver) = oneshot::channel();
		let username = username.to_owned();
		let requests = self.requests.clone();

		thread::spawn(move || {
			thread::sleep(Duration::from_millis(20));
			requests.lock().unwrap().push(username.clone());
			let _ = sender.send(Ok(username != "taken"));
		});

		receiver
			.map(|answer| answer.unwrap_or(Err(CheckError::NoData)))
			.boxed_local()
	}
}
