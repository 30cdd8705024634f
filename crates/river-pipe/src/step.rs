use river_core::resolve::Resolve;

/// The first step of a pipeline.
///
/// Implemented for every `Fn(A1, .., An) -> R` with up to eight parameters.
/// `Args` is the tuple `(A1, .., An)`; the step is called with the tuple's
/// elements spread as positional arguments.
pub trait EntryStep<Args>: Send + Sync + 'static {
    type Output: Resolve;

    fn call(&self, args: Args) -> Self::Output;
}

macro_rules! impl_entry_step {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> EntryStep<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: Resolve,
        {
            type Output = R;

            #[allow(non_snake_case)]
            fn call(&self, ($($arg,)*): ($($arg,)*)) -> R {
                (self)($($arg),*)
            }
        }
    };
}

impl_entry_step!();
impl_entry_step!(A1);
impl_entry_step!(A1, A2);
impl_entry_step!(A1, A2, A3);
impl_entry_step!(A1, A2, A3, A4);
impl_entry_step!(A1, A2, A3, A4, A5);
impl_entry_step!(A1, A2, A3, A4, A5, A6);
impl_entry_step!(A1, A2, A3, A4, A5, A6, A7);
impl_entry_step!(A1, A2, A3, A4, A5, A6, A7, A8);
