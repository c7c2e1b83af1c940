//! Reactive sign-up form validation.
//!
//! The crate is split in two layers:
//!
//! - a small observable graph ([`Var`], [`Signal`], [`Subscription`], the
//!   combinators on [`Signal`] and the logical-time [`Scheduler`]);
//! - the [`form`] module, which wires username/password inputs through that
//!   graph into messages, per-rule requirements and overall validity.
//!
//! Propagation is two-phase. Writing a [`Var`] invalidates everything that
//! depends on it; reactions queued by that wave run once the outermost
//! [`batch`] finishes and pull derived values, so every observer sees a single
//! consistent snapshot of the inputs.

mod addr;
mod batch;
mod combine;
mod computed;
mod debounce;
mod dependencies;
mod evaluation;
mod latest;
mod reaction;
mod scheduler;
mod signal;
mod var;

pub mod config;
pub mod error;
pub mod form;

use std::rc::{Rc, Weak};

pub use batch::{batch, in_batch};
pub use combine::{combine_latest, CombineLatest};
pub use config::{FormConfig, Messages};
pub use dependencies::Dependencies;
pub use error::{CheckError, ConfigError};
pub use evaluation::Evaluation;
pub use reaction::{Reaction, Subscription, Subscriptions};
pub use scheduler::{Scheduler, TimerId};
pub use signal::Signal;
pub use var::Var;

pub trait Derived: 'static {
	fn invalidate(self: Rc<Self>, invalid: Invalid);
}

pub trait Observable: 'static {
	/// Bring this observable up to date and
	/// return the resulting version.
	fn update(&self) -> Version;

	/// The version as of the last update.
	fn version(&self) -> Version;

	/// Notify this observable that `derived` started
	/// to listen.
	fn used_by(&self, derived: Weak<dyn Derived>);

	/// Notify this observable that `derived` stopped
	/// to listen.
	fn not_used_by(&self, derived: &Weak<dyn Derived>);
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum State {
	Valid,
	Invalid(Invalid),
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Invalid {
	Maybe,
	Definitely,
}

/// Emission counter of a node. `Empty` until the first value is produced,
/// then bumped once per emission.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Version {
	Empty,
	Revision(u64),
}
