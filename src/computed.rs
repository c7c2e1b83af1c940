use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use crate::dependencies::{invalidate_all, Dependencies, UsedBy};
use crate::signal::Access;
use crate::{Derived, Evaluation, Invalid, Observable, State, Version};

/// When a recomputation counts as an emission.
pub(crate) enum Emit<T> {
	/// Every recomputation that produces a value.
	Always,
	/// Only when the value differs from the previous emission.
	Distinct(fn(&T, &T) -> bool),
}

/// A lazily evaluated, memoized node. The function runs at most once per
/// upstream change no matter how many downstream nodes read it. A `None`
/// from the function is not an emission: the previous value stays.
pub(crate) struct ComputedBody<T: 'static> {
	name: &'static str,
	value: RefCell<Option<T>>,
	revision: Cell<u64>,
	state: Cell<State>,
	emit: Emit<T>,
	func: Box<dyn Fn(&Evaluation) -> Option<T>>,
	used_by: RefCell<UsedBy>,
	dependencies: RefCell<Dependencies>,
	this: Weak<ComputedBody<T>>,
}

impl<T: 'static> Drop for ComputedBody<T> {
	fn drop(&mut self) {
		let this = self.this.clone() as Weak<dyn Derived>;
		self.dependencies.get_mut().drop(&this);
	}
}

impl<T: 'static> ComputedBody<T> {
	pub fn new(
		name: &'static str,
		emit: Emit<T>,
		func: Box<dyn Fn(&Evaluation) -> Option<T>>,
	) -> Rc<Self> {
		Rc::new_cyclic(|this| ComputedBody {
			name,
			value: RefCell::new(None),
			revision: Cell::new(0),
			state: Cell::new(State::Invalid(Invalid::Definitely)),
			emit,
			func,
			used_by: RefCell::new(UsedBy::default()),
			dependencies: RefCell::new(Dependencies::new()),
			this: this.clone(),
		})
	}

	fn refresh(&self) {
		let is_valid = match self.state.get() {
			State::Valid => true,
			State::Invalid(Invalid::Definitely) => false,
			State::Invalid(Invalid::Maybe) => self.dependencies.borrow().are_valid(),
		};

		if is_valid {
			self.state.set(State::Valid);
			return;
		}

		let this = self.this.clone() as Weak<dyn Derived>;
		let evaluation = Evaluation::new(this.clone());
		let next = (self.func)(&evaluation);
		self.state.set(State::Valid);
		self.dependencies.borrow_mut().swap(evaluation.take(), &this);

		let Some(next) = next else {
			return;
		};

		let changed = match (&self.emit, self.value.borrow().as_ref()) {
			(Emit::Distinct(eq), Some(prev)) => !eq(prev, &next),
			_ => true,
		};

		if changed {
			*self.value.borrow_mut() = Some(next);
			self.revision.set(self.revision.get() + 1);
			tracing::trace!(node = self.name, revision = self.revision.get(), "recomputed");
		} else {
			tracing::trace!(node = self.name, "duplicate suppressed");
		}
	}

	fn get_once(&self) -> Option<Ref<'_, T>> {
		self.refresh();
		Ref::filter_map(self.value.borrow(), Option::as_ref).ok()
	}

	fn get<'a>(&'a self, eval: &'_ Evaluation) -> Option<Ref<'a, T>> {
		self.refresh();
		if let Some(this) = self.this.upgrade() {
			eval.based_on(this, self.version());
		}
		self.used_by.borrow_mut().insert(eval.parent());

		Ref::filter_map(self.value.borrow(), Option::as_ref).ok()
	}
}

impl<T: 'static> Observable for ComputedBody<T> {
	fn update(&self) -> Version {
		self.refresh();
		self.version()
	}

	fn version(&self) -> Version {
		match self.revision.get() {
			0 => Version::Empty,
			revision => Version::Revision(revision),
		}
	}

	fn used_by(&self, derived: Weak<dyn Derived>) {
		self.used_by.borrow_mut().insert(derived);
	}

	fn not_used_by(&self, derived: &Weak<dyn Derived>) {
		self.used_by.borrow_mut().remove(derived);
	}
}

impl<T: 'static> Access<T> for ComputedBody<T> {
	fn get(&self, eval: &Evaluation) -> Option<Ref<'_, T>> {
		ComputedBody::get(self, eval)
	}

	fn get_once(&self) -> Option<Ref<'_, T>> {
		ComputedBody::get_once(self)
	}
}

impl<T: 'static> Derived for ComputedBody<T> {
	fn invalidate(self: Rc<Self>, invalid: Invalid) {
		if self.state.get() == State::Valid {
			self.state.set(State::Invalid(invalid));
			invalidate_all(&self.used_by, Invalid::Maybe);
		}
	}
}
