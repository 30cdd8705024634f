//! Normalization of step results into plain values.
//!
//! Every value a pipeline hands from one step to the next goes through
//! [`Resolve`]. Futures are awaited, sequences have all of their elements
//! resolved together, and anything else passes through untouched.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;

use futures::future::{self, FutureExt, TryFutureExt};

pub use futures::future::BoxFuture;

use crate::error::{Result, RiverError};

/// A value that can be turned into a fully resolved value.
///
/// The resolved `Output` never contains a pending future. Resolution of a
/// sequence runs its elements concurrently, keeps their order and fails on
/// the first element that fails.
pub trait Resolve: Send + 'static {
    type Output: Send + 'static;

    fn resolve(self) -> BoxFuture<'static, Result<Self::Output>>;
}

/// An already-resolved future for `value`.
pub fn resolved<T: Send + 'static>(value: T) -> BoxFuture<'static, Result<T>> {
    future::ready(Ok(value)).boxed()
}

/// Implements [`Resolve`] for types that are plain values.
///
/// ```ignore
/// struct Invoice { total: u64 }
/// river_core::impl_resolved!(Invoice);
/// ```
#[macro_export]
macro_rules! impl_resolved {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::resolve::Resolve for $ty {
                type Output = $ty;

                fn resolve(self) -> $crate::resolve::BoxFuture<'static, $crate::error::Result<$ty>> {
                    $crate::resolve::resolved(self)
                }
            }
        )*
    };
}

impl_resolved!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
    std::time::Duration,
    serde_json::Value,
);

/// Marks any value as plain, for types without a `Resolve` impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Ready<T>(pub T);

impl<T: Send + 'static> Resolve for Ready<T> {
    type Output = T;

    fn resolve(self) -> BoxFuture<'static, Result<T>> {
        resolved(self.0)
    }
}

/// A future whose output is resolved again once it completes.
///
/// Created with [`defer`].
#[must_use = "a deferred value does nothing until it is resolved"]
pub struct Deferred<F>(F);

/// Wrap a future so it can be returned from a pipeline step.
pub fn defer<F>(future: F) -> Deferred<F>
where
    F: Future + Send + 'static,
    F::Output: Resolve,
{
    Deferred(future)
}

impl<F> Resolve for Deferred<F>
where
    F: Future + Send + 'static,
    F::Output: Resolve,
{
    type Output = <F::Output as Resolve>::Output;

    fn resolve(self) -> BoxFuture<'static, Result<Self::Output>> {
        async move { self.0.await.resolve().await }.boxed()
    }
}

impl<R: Resolve> Resolve for Pin<Box<dyn Future<Output = R> + Send + 'static>> {
    type Output = R::Output;

    fn resolve(self) -> BoxFuture<'static, Result<Self::Output>> {
        async move { self.await.resolve().await }.boxed()
    }
}

impl<R, E> Resolve for std::result::Result<R, E>
where
    R: Resolve,
    E: Into<RiverError> + Send + 'static,
{
    type Output = R::Output;

    fn resolve(self) -> BoxFuture<'static, Result<Self::Output>> {
        match self {
            Ok(value) => value.resolve(),
            Err(err) => future::ready(Err(err.into())).boxed(),
        }
    }
}

impl<R: Resolve> Resolve for Option<R> {
    type Output = Option<R::Output>;

    fn resolve(self) -> BoxFuture<'static, Result<Self::Output>> {
        match self {
            Some(value) => value.resolve().map_ok(Some).boxed(),
            None => resolved(None),
        }
    }
}

// Always joined, even when every element is already plain.
impl<R: Resolve> Resolve for Vec<R> {
    type Output = Vec<R::Output>;

    fn resolve(self) -> BoxFuture<'static, Result<Self::Output>> {
        future::try_join_all(self.into_iter().map(Resolve::resolve)).boxed()
    }
}

impl<K, V, S> Resolve for HashMap<K, V, S>
where
    K: Send + 'static,
    V: Send + 'static,
    S: Send + 'static,
{
    type Output = Self;

    fn resolve(self) -> BoxFuture<'static, Result<Self>> {
        resolved(self)
    }
}

impl<K, V> Resolve for BTreeMap<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    type Output = Self;

    fn resolve(self) -> BoxFuture<'static, Result<Self>> {
        resolved(self)
    }
}

impl<A: Resolve> Resolve for (A,) {
    type Output = (A::Output,);

    fn resolve(self) -> BoxFuture<'static, Result<Self::Output>> {
        self.0.resolve().map_ok(|a| (a,)).boxed()
    }
}

macro_rules! impl_resolve_tuple {
    ($($name:ident),+) => {
        impl<$($name: Resolve),+> Resolve for ($($name,)+) {
            type Output = ($($name::Output,)+);

            #[allow(non_snake_case)]
            fn resolve(self) -> BoxFuture<'static, Result<Self::Output>> {
                let ($($name,)+) = self;
                async move { futures::try_join!($($name.resolve()),+) }.boxed()
            }
        }
    };
}

impl_resolve_tuple!(A, B);
impl_resolve_tuple!(A, B, C);
impl_resolve_tuple!(A, B, C, D);
impl_resolve_tuple!(A, B, C, D, E);
impl_resolve_tuple!(A, B, C, D, E, F);
impl_resolve_tuple!(A, B, C, D, E, F, G);
impl_resolve_tuple!(A, B, C, D, E, F, G, H);
