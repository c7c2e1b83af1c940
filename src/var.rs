use std::cell::{Cell, Ref, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::batch::batch;
use crate::dependencies::{invalidate_all, UsedBy};
use crate::evaluation::Evaluation;
use crate::reaction::Subscription;
use crate::signal::{Access, Signal};
use crate::{Derived, Invalid, Observable, Version};

/// A writable source cell. Every write is an emission, even when the new
/// value equals the old one; use [`Signal::remove_duplicates`] downstream to
/// coalesce repeats.
pub struct Var<T> {
	body: Rc<VarBody<T>>,
}

pub(crate) struct VarBody<T> {
	name: &'static str,
	value: RefCell<Option<T>>,
	revision: Cell<u64>,
	used_by: RefCell<UsedBy>,
	/// Drivers feeding this cell from elsewhere in the graph.
	feeds: RefCell<SmallVec<[Subscription; 1]>>,
	this: Weak<VarBody<T>>,
}

impl<T> Clone for Var<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> Default for Var<T>
where
	T: Default + 'static,
{
	fn default() -> Self {
		Var::new(Default::default())
	}
}

impl<T> Var<T>
where
	T: 'static,
{
	pub fn new(value: T) -> Self {
		Self::with_name("var", Some(value))
	}

	/// Like [`Var::new`], with a name that shows up in trace logs.
	pub fn named(name: &'static str, value: T) -> Self {
		Self::with_name(name, Some(value))
	}

	/// A cell that has not produced a value yet. Subscribers are not called
	/// until the first [`Var::set`].
	pub fn empty() -> Self {
		Self::with_name("var", None)
	}

	pub(crate) fn with_name(name: &'static str, value: Option<T>) -> Self {
		let revision = u64::from(value.is_some());
		Var {
			body: Rc::new_cyclic(|this| VarBody {
				name,
				value: RefCell::new(value),
				revision: Cell::new(revision),
				used_by: RefCell::new(UsedBy::default()),
				feeds: RefCell::new(SmallVec::new()),
				this: this.clone(),
			}),
		}
	}

	pub fn signal(&self) -> Signal<T> {
		Signal::from_node(self.body.clone())
	}

	#[inline]
	pub fn get(&self, eval: &impl AsRef<Evaluation>) -> Option<Ref<'_, T>> {
		self.body.get(eval.as_ref())
	}

	#[inline]
	pub fn get_once(&self) -> Option<Ref<'_, T>> {
		self.body.get_once()
	}

	pub fn version(&self) -> Version {
		self.body.version()
	}

	#[inline]
	pub fn set(&self, value: T) {
		let _ = self.replace(value);
	}

	pub fn replace(&self, value: T) -> Option<T> {
		let old = self.body.value.borrow_mut().replace(value);
		self.body.emit();
		old
	}

	/// Mutate the current value in place. Does nothing while the cell is
	/// still empty.
	pub fn update(&self, func: impl FnOnce(&mut T)) -> bool {
		{
			let mut value = self.body.value.borrow_mut();
			match value.as_mut() {
				Some(value) => func(value),
				None => return false,
			}
		}
		self.body.emit();
		true
	}

	pub(crate) fn downgrade(&self) -> Weak<VarBody<T>> {
		Rc::downgrade(&self.body)
	}

	/// Tie the lifetime of `subscription` to this cell.
	pub(crate) fn feed_from(&self, subscription: Subscription) {
		self.body.feeds.borrow_mut().push(subscription);
	}
}

impl<T: 'static> VarBody<T> {
	pub fn set(&self, value: T) {
		*self.value.borrow_mut() = Some(value);
		self.emit();
	}

	fn emit(&self) {
		self.revision.set(self.revision.get() + 1);
		tracing::trace!(node = self.name, revision = self.revision.get(), "emitted");
		batch(|| invalidate_all(&self.used_by, Invalid::Definitely));
	}

	fn get_once(&self) -> Option<Ref<'_, T>> {
		Ref::filter_map(self.value.borrow(), Option::as_ref).ok()
	}

	fn get<'a>(&'a self, eval: &'_ Evaluation) -> Option<Ref<'a, T>> {
		if let Some(this) = self.this.upgrade() {
			eval.based_on(this, self.version());
		}
		self.used_by.borrow_mut().insert(eval.parent());

		self.get_once()
	}
}

impl<T: 'static> Observable for VarBody<T> {
	fn version(&self) -> Version {
		match self.revision.get() {
			0 => Version::Empty,
			revision => Version::Revision(revision),
		}
	}

	fn update(&self) -> Version {
		self.version()
	}

	fn used_by(&self, derived: Weak<dyn Derived>) {
		self.used_by.borrow_mut().insert(derived);
	}

	fn not_used_by(&self, derived: &Weak<dyn Derived>) {
		self.used_by.borrow_mut().remove(derived);
	}
}

impl<T: 'static> Access<T> for VarBody<T> {
	fn get(&self, eval: &Evaluation) -> Option<Ref<'_, T>> {
		VarBody::get(self, eval)
	}

	fn get_once(&self) -> Option<Ref<'_, T>> {
		VarBody::get_once(self)
	}
}

impl<T: 'static> From<Var<T>> for Signal<T> {
	fn from(var: Var<T>) -> Self {
		Signal::from_node(var.body)
	}
}

impl<T> Debug for Var<T>
where
	T: 'static + Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Var")
			.field("value", &self.get_once().as_deref())
			.field("version", &self.version())
			.finish()
	}
}
