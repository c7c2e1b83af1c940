use std::cmp::Ordering;
use std::ops::Deref;
use std::rc::{Rc, Weak};

/// Pointers that can be compared by the address of their allocation.
pub trait Addressable {
	fn addr(&self) -> *const ();
}

impl<T: ?Sized> Addressable for Rc<T> {
	fn addr(&self) -> *const () {
		Rc::as_ptr(self) as *const ()
	}
}

impl<T: ?Sized> Addressable for Weak<T> {
	fn addr(&self) -> *const () {
		Weak::as_ptr(self) as *const ()
	}
}

/// Orders and compares a shared pointer by identity instead of by value,
/// so graph nodes can live in ordered sets and maps.
pub struct ByAddr<P> {
	ptr: P,
}

pub type RcAddr<T> = ByAddr<Rc<T>>;
pub type WeakAddr<T> = ByAddr<Weak<T>>;

impl<P> ByAddr<P> {
	pub fn new(ptr: P) -> Self {
		ByAddr { ptr }
	}
}

impl<P> Deref for ByAddr<P> {
	type Target = P;
	fn deref(&self) -> &Self::Target {
		&self.ptr
	}
}

impl<P: Addressable> PartialEq for ByAddr<P> {
	fn eq(&self, other: &Self) -> bool {
		self.ptr.addr() == other.ptr.addr()
	}
}

impl<P: Addressable> Eq for ByAddr<P> {}

impl<P: Addressable> Ord for ByAddr<P> {
	fn cmp(&self, other: &Self) -> Ordering {
		self.ptr.addr().cmp(&other.ptr.addr())
	}
}

impl<P: Addressable> PartialOrd for ByAddr<P> {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
