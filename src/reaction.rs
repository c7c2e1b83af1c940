use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::batch::{enqueue, in_batch};
use crate::dependencies::Dependencies;
use crate::{Derived, Evaluation, Invalid, State};

pub trait Reactive {
	fn update(&self);
}

/// An eager side effect. It runs once when first updated and then again
/// after every propagation pass that changed something it read.
#[derive(Clone)]
pub struct Reaction {
	pub(crate) body: Rc<ReactionBody>,
}

pub struct ReactionBody {
	name: &'static str,
	state: Cell<State>,
	func: Box<dyn Fn(&Evaluation)>,
	dependencies: RefCell<Dependencies>,
	this: Weak<ReactionBody>,
}

impl Drop for ReactionBody {
	fn drop(&mut self) {
		let this = self.this.clone() as Weak<dyn Derived>;
		self.dependencies.get_mut().drop(&this)
	}
}

impl Reaction {
	#[must_use]
	pub fn new(func: Box<dyn Fn(&Evaluation)>) -> Self {
		Self::new_with_name("<unnamed>", func)
	}

	#[must_use]
	pub fn new_with_name(name: &'static str, func: Box<dyn Fn(&Evaluation)>) -> Self {
		Reaction {
			body: Rc::new_cyclic(|this| ReactionBody {
				name,
				func,
				state: Cell::new(State::Invalid(Invalid::Definitely)),
				dependencies: RefCell::new(Dependencies::new()),
				this: this.clone(),
			}),
		}
	}

	pub fn name(&self) -> &'static str {
		self.body.name
	}

	pub fn update(&self) {
		self.body.update();
	}
}

impl ReactionBody {
	fn run(&self) {
		// Marked valid before running so an invalidation raised by the
		// reaction itself queues it again instead of being lost.
		self.state.set(State::Valid);

		let this = self.this.clone() as Weak<dyn Derived>;
		let tracker = Evaluation::new(this.clone());
		(self.func)(&tracker);

		self.dependencies.borrow_mut().swap(tracker.take(), &this);
		tracing::trace!(reaction = self.name, "reaction ran");
	}
}

impl Reactive for ReactionBody {
	fn update(&self) {
		let is_valid = match self.state.get() {
			State::Valid => true,
			State::Invalid(Invalid::Definitely) => false,
			State::Invalid(Invalid::Maybe) => self.dependencies.borrow().are_valid(),
		};

		if is_valid {
			self.state.set(State::Valid);
			return;
		}

		self.run();
	}
}

impl Derived for ReactionBody {
	fn invalidate(self: Rc<Self>, invalid: Invalid) {
		if self.state.get() == State::Valid {
			debug_assert!(in_batch(), "reaction `{}` invalidated outside of a batch", self.name);

			self.state.set(State::Invalid(invalid));
			enqueue(Rc::downgrade(&self) as Weak<dyn Reactive>);
		}
	}
}

impl std::fmt::Debug for Reaction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Reaction")
			.field("name", &self.body.name)
			.finish()
	}
}

/// Keeps a subscriber attached to the graph. Dropping it detaches the
/// callback before the next propagation pass.
#[must_use = "dropping a Subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct Subscription {
	reaction: Reaction,
}

impl Subscription {
	pub(crate) fn new(reaction: Reaction) -> Self {
		reaction.update();
		Subscription { reaction }
	}

	pub fn name(&self) -> &'static str {
		self.reaction.name()
	}
}

/// A small inline bag of subscriptions owned by one component.
#[derive(Default, Debug)]
pub struct Subscriptions<const N: usize> {
	vec: SmallVec<[Subscription; N]>,
}

impl<const N: usize> Subscriptions<N> {
	pub fn new() -> Self {
		Subscriptions { vec: SmallVec::new() }
	}

	pub fn add(&mut self, subscription: Subscription) {
		self.vec.push(subscription);

		#[cfg(debug_assertions)]
		if self.vec.len() > N {
			tracing::debug!(limit = N, "subscriptions spilled to the heap");
		}
	}
}
