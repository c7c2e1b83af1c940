use crate::computed::{ComputedBody, Emit};
use crate::signal::Signal;

/// Combine a tuple of signals into one signal of tuples.
///
/// Nothing is emitted until every input has a value. After that the tuple
/// is re-emitted whenever any input emits, paired with the latest values
/// of the others. Inputs are read after the whole propagation wave, so a
/// tuple never mixes a new value of one input with a stale value of
/// another that changed in the same pass.
pub trait CombineLatest {
	type Output;

	fn combine_latest(self) -> Signal<Self::Output>;
}

pub fn combine_latest<C: CombineLatest>(signals: C) -> Signal<C::Output> {
	signals.combine_latest()
}

macro_rules! impl_combine_latest {
	($($name:ident: $ty:ident),+) => {
		impl<$($ty),+> CombineLatest for ($(&Signal<$ty>,)+)
		where
			$($ty: Clone + 'static,)+
		{
			type Output = ($($ty,)+);

			fn combine_latest(self) -> Signal<Self::Output> {
				let ($($name,)+) = self;
				let ($($name,)+) = ($($name.clone(),)+);
				Signal::from_node(ComputedBody::new(
					"combine_latest",
					Emit::Always,
					Box::new(move |cx| {
						// Read every input before bailing out so all of them
						// are tracked even while some are still empty.
						$(let $name = $name.get(cx);)+
						Some(($(<$ty as Clone>::clone(&*$name?),)+))
					}),
				))
			}
		}
	};
}

impl_combine_latest!(a: A, b: B);
impl_combine_latest!(a: A, b: B, c: C);
impl_combine_latest!(a: A, b: B, c: C, d: D);
impl_combine_latest!(a: A, b: B, c: C, d: D, e: E);
