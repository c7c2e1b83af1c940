use std::cell::{Cell, Ref};
use std::fmt::Debug;
use std::rc::Rc;

use crate::computed::{ComputedBody, Emit};
use crate::reaction::{Reaction, Subscription};
use crate::{Evaluation, Observable, Version};

/// Read access shared by every kind of node.
pub(crate) trait Access<T>: Observable {
	fn get(&self, eval: &Evaluation) -> Option<Ref<'_, T>>;
	fn get_once(&self) -> Option<Ref<'_, T>>;
}

/// A read-only handle to a node of the graph: a [`crate::Var`] or anything
/// derived from one. Cloning the handle shares the node.
pub struct Signal<T> {
	node: Rc<dyn Access<T>>,
}

impl<T> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Signal {
			node: self.node.clone(),
		}
	}
}

impl<T> Signal<T>
where
	T: 'static,
{
	pub(crate) fn from_node(node: Rc<dyn Access<T>>) -> Self {
		Signal { node }
	}

	/// A derived signal computed from whatever `func` reads through the
	/// evaluation context. Returning `None` emits nothing: the signal keeps
	/// the last value it produced, or stays empty if it never had one.
	pub fn computed(func: impl Fn(&Evaluation) -> Option<T> + 'static) -> Self {
		Self::from_node(ComputedBody::new("computed", Emit::Always, Box::new(func)))
	}

	/// Read the value and record this signal as a dependency of `eval`.
	#[inline]
	pub fn get(&self, eval: &impl AsRef<Evaluation>) -> Option<Ref<'_, T>> {
		self.node.get(eval.as_ref())
	}

	/// Read the value without tracking.
	#[inline]
	pub fn get_once(&self) -> Option<Ref<'_, T>> {
		self.node.get_once()
	}

	/// A copy of the current value, without tracking.
	pub fn latest(&self) -> Option<T>
	where
		T: Clone,
	{
		self.get_once().map(|value| T::clone(&value))
	}

	pub fn version(&self) -> Version {
		self.node.update()
	}

	pub fn map<R, F>(&self, func: F) -> Signal<R>
	where
		F: Fn(&T) -> R + 'static,
		R: 'static,
	{
		let node = self.node.clone();
		Signal::from_node(ComputedBody::new(
			"map",
			Emit::Always,
			Box::new(move |cx| node.get(cx).map(|value| func(&value))),
		))
	}

	/// Skip emissions equal to the previous one. The first value always
	/// passes.
	pub fn remove_duplicates(&self) -> Signal<T>
	where
		T: Clone + PartialEq,
	{
		let node = self.node.clone();
		Signal::from_node(ComputedBody::new(
			"remove_duplicates",
			Emit::Distinct(<T as PartialEq>::eq),
			Box::new(move |cx| node.get(cx).map(|value| T::clone(&value))),
		))
	}

	/// A caching node in front of this signal: the upstream is evaluated
	/// once per change and every reader of the returned signal gets the
	/// cached result.
	pub fn share(&self) -> Signal<T>
	where
		T: Clone,
	{
		let node = self.node.clone();
		Signal::from_node(ComputedBody::new(
			"share",
			Emit::Always,
			Box::new(move |cx| node.get(cx).map(|value| T::clone(&value))),
		))
	}

	/// Call `func` with the current value, if there is one, and then with
	/// every later emission. `func` receives a clone, so it may write to
	/// the graph.
	pub fn subscribe(&self, func: impl Fn(&T) + 'static) -> Subscription
	where
		T: Clone,
	{
		self.subscribe_with_name("subscriber", func)
	}

	pub(crate) fn subscribe_with_name(
		&self,
		name: &'static str,
		func: impl Fn(&T) + 'static,
	) -> Subscription
	where
		T: Clone,
	{
		let node = self.node.clone();
		let delivered = Cell::new(Version::Empty);
		Subscription::new(Reaction::new_with_name(
			name,
			Box::new(move |cx| {
				let Some(value) = node.get(cx).map(|value| T::clone(&value)) else {
					return;
				};
				let version = node.version();
				if version != delivered.replace(version) {
					func(&value);
				}
			}),
		))
	}
}

impl<T> Debug for Signal<T>
where
	T: 'static + Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Signal")
			.field("value", &self.get_once().as_deref())
			.finish()
	}
}
