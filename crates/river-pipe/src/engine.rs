//! Sequential step execution over type-erased values.
//!
//! `Pipeline` keeps the step types straight at construction time; here every
//! value travels as an [`Accumulator`] and is downcast back by the step that
//! consumes it.

use std::any::{Any, type_name};
use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tracing::Instrument;

use river_core::config::RunConfig;
use river_core::error::{Result, RiverError};
use river_core::resolve::Resolve;
use river_core::runnable::Runnable;

use crate::step::EntryStep;

/// The value handed from one step to the next during a single invocation.
pub(crate) type Accumulator = Box<dyn Any + Send>;

pub(crate) trait ErasedStep: Send + Sync {
    /// Call the step on `input` and resolve what it returns.
    fn run(
        &self,
        index: usize,
        input: Accumulator,
        config: &Arc<RunConfig>,
    ) -> BoxFuture<'static, Result<Accumulator>>;
}

/// A captured step plus the name it is reported under.
///
/// Unnamed steps are reported as `step_<index>`, so a step keeps an accurate
/// default name when pipelines are concatenated.
#[derive(Clone)]
pub(crate) struct StepSlot {
    pub(crate) name: Option<String>,
    pub(crate) step: Arc<dyn ErasedStep>,
}

impl StepSlot {
    pub(crate) fn unnamed(step: impl ErasedStep + 'static) -> Self {
        Self {
            name: None,
            step: Arc::new(step),
        }
    }

    pub(crate) fn display_name(&self, index: usize) -> Cow<'_, str> {
        match &self.name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("step_{index}")),
        }
    }
}

/// Step 0: receives the resolved argument tuple spread positionally.
pub(crate) struct Entry<S, Args> {
    step: S,
    _args: PhantomData<fn(Args)>,
}

impl<S, Args> Entry<S, Args> {
    pub(crate) fn new(step: S) -> Self {
        Self {
            step,
            _args: PhantomData,
        }
    }
}

impl<S, Args> ErasedStep for Entry<S, Args>
where
    S: EntryStep<Args>,
    Args: Send + 'static,
{
    fn run(
        &self,
        index: usize,
        input: Accumulator,
        _config: &Arc<RunConfig>,
    ) -> BoxFuture<'static, Result<Accumulator>> {
        match input.downcast::<Args>() {
            Ok(args) => resolve_erased(self.step.call(*args)),
            Err(_) => mismatch::<Args>(index),
        }
    }
}

/// Step i>0: receives exactly one value.
pub(crate) struct Unary<F, T> {
    step: F,
    _input: PhantomData<fn(T)>,
}

impl<F, T> Unary<F, T> {
    pub(crate) fn new(step: F) -> Self {
        Self {
            step,
            _input: PhantomData,
        }
    }
}

impl<F, T, R> ErasedStep for Unary<F, T>
where
    F: Fn(T) -> R + Send + Sync + 'static,
    T: 'static,
    R: Resolve,
{
    fn run(
        &self,
        index: usize,
        input: Accumulator,
        _config: &Arc<RunConfig>,
    ) -> BoxFuture<'static, Result<Accumulator>> {
        match input.downcast::<T>() {
            Ok(value) => resolve_erased((self.step)(*value)),
            Err(_) => mismatch::<T>(index),
        }
    }
}

/// A [`Runnable`] invoked with the config of the surrounding run.
pub(crate) struct Invoke<R>(Arc<R>);

impl<R> Invoke<R> {
    pub(crate) fn new(runnable: R) -> Self {
        Self(Arc::new(runnable))
    }
}

impl<R> ErasedStep for Invoke<R>
where
    R: Runnable + 'static,
{
    fn run(
        &self,
        index: usize,
        input: Accumulator,
        config: &Arc<RunConfig>,
    ) -> BoxFuture<'static, Result<Accumulator>> {
        match input.downcast::<R::Input>() {
            Ok(value) => {
                let runnable = Arc::clone(&self.0);
                let config = Arc::clone(config);
                async move {
                    let out = runnable.invoke(*value, &config).await?;
                    Ok(Box::new(out) as Accumulator)
                }
                .boxed()
            }
            Err(_) => mismatch::<R::Input>(index),
        }
    }
}

/// Another pipeline's steps, run on `(value,)` under the same config.
pub(crate) struct Nested<T> {
    steps: Arc<Vec<StepSlot>>,
    _input: PhantomData<fn(T)>,
}

impl<T> Nested<T> {
    pub(crate) fn new(steps: Arc<Vec<StepSlot>>) -> Self {
        Self {
            steps,
            _input: PhantomData,
        }
    }
}

impl<T> ErasedStep for Nested<T>
where
    T: Send + 'static,
{
    fn run(
        &self,
        index: usize,
        input: Accumulator,
        config: &Arc<RunConfig>,
    ) -> BoxFuture<'static, Result<Accumulator>> {
        match input.downcast::<T>() {
            Ok(value) => {
                let steps = Arc::clone(&self.steps);
                let config = Arc::clone(config);
                let span = tracing::debug_span!("nested", index, steps = steps.len());
                async move { run_steps(&steps, Box::new((*value,)), &config).await }
                    .instrument(span)
                    .boxed()
            }
            Err(_) => mismatch::<T>(index),
        }
    }
}

fn resolve_erased<R: Resolve>(raw: R) -> BoxFuture<'static, Result<Accumulator>> {
    raw.resolve()
        .map(|resolved| resolved.map(|value| Box::new(value) as Accumulator))
        .boxed()
}

fn mismatch<T>(index: usize) -> BoxFuture<'static, Result<Accumulator>> {
    future::ready(Err(RiverError::TypeMismatch {
        index,
        expected: type_name::<T>(),
    }))
    .boxed()
}

fn annotate(err: RiverError, index: usize, name: &str, config: &RunConfig) -> RiverError {
    if config.annotate_errors {
        RiverError::Step {
            index,
            name: name.to_owned(),
            source: Box::new(err),
        }
    } else {
        err
    }
}

/// Thread `acc` through `steps` in order. Stops at the first failing step;
/// no later step is called.
pub(crate) async fn run_steps(
    steps: &[StepSlot],
    mut acc: Accumulator,
    config: &Arc<RunConfig>,
) -> Result<Accumulator> {
    for (index, slot) in steps.iter().enumerate() {
        let name = slot.display_name(index);
        tracing::trace!(index, step = %name, "invoking step");
        acc = match slot.step.run(index, acc, config).await {
            Ok(next) => next,
            Err(err) => {
                tracing::debug!(index, step = %name, error = %err, "step failed");
                return Err(annotate(err, index, &name, config));
            }
        };
    }
    Ok(acc)
}

/// Resolve `args`, run `steps` on the result, and return the final resolved
/// value.
pub(crate) async fn execute<A, Out>(
    steps: Arc<Vec<StepSlot>>,
    args: A,
    config: RunConfig,
) -> Result<Out>
where
    A: Resolve,
    Out: 'static,
{
    let config = Arc::new(config);
    let acc: Accumulator = Box::new(args.resolve().await?);
    let out = run_steps(&steps, acc, &config).await?;

    out.downcast::<Out>()
        .map(|out| *out)
        .map_err(|_| RiverError::TypeMismatch {
            index: steps.len(),
            expected: type_name::<Out>(),
        })
}
