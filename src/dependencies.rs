use std::collections::{BTreeMap, BTreeSet};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::addr::{RcAddr, WeakAddr};
use crate::{Derived, Invalid, Observable, Version};

/// Upstream nodes read by one evaluation, with the version that was seen.
#[derive(Default)]
pub struct Dependencies {
	based_on: BTreeMap<RcAddr<dyn Observable>, Version>,
}

impl Dependencies {
	pub fn new() -> Self {
		Self::default()
	}

	/// Detach `parent` from every upstream.
	pub fn drop(&mut self, parent: &Weak<dyn Derived>) {
		for item in self.based_on.keys() {
			item.not_used_by(parent)
		}
		self.based_on.clear();
	}

	pub fn based_on(&mut self, observable: Rc<dyn Observable>, version: Version) {
		self.based_on.insert(RcAddr::new(observable), version);
	}

	/// Bring every upstream up to date and report whether all of them are
	/// still at the version this evaluation saw.
	pub fn are_valid(&self) -> bool {
		self.based_on
			.iter()
			.all(|(base, version)| base.update() == *version)
	}

	pub fn swap(&mut self, next: Dependencies, parent: &Weak<dyn Derived>) {
		let prev = std::mem::replace(&mut self.based_on, next.based_on);

		prev.keys()
			.filter(|k| !self.based_on.contains_key(k))
			.for_each(|k| k.not_used_by(parent));
	}
}

/// Downstream nodes listening to an observable.
#[derive(Default)]
pub(crate) struct UsedBy {
	set: BTreeSet<WeakAddr<dyn Derived>>,
}

impl UsedBy {
	pub fn insert(&mut self, derived: Weak<dyn Derived>) {
		self.set.insert(WeakAddr::new(derived));
	}

	pub fn remove(&mut self, derived: &Weak<dyn Derived>) {
		self.set.remove(&WeakAddr::new(derived.clone()));
	}

	/// Live listeners; dead ones are pruned on the way.
	pub fn take_live(&mut self) -> SmallVec<[Rc<dyn Derived>; 4]> {
		let mut live = SmallVec::new();
		self.set.retain(|item| match item.upgrade() {
			Some(item) => {
				live.push(item);
				true
			}
			None => false,
		});
		live
	}
}

/// Invalidate everything in `used_by` without holding its borrow while the
/// wave travels further downstream.
pub(crate) fn invalidate_all(used_by: &std::cell::RefCell<UsedBy>, invalid: Invalid) {
	let live = used_by.borrow_mut().take_live();
	for item in live {
		item.invalidate(invalid);
	}
}
