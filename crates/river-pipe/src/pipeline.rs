use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use tracing::Instrument;

use river_core::config::RunConfig;
use river_core::error::Result;
use river_core::resolve::{Resolve, defer};
use river_core::runnable::Runnable;

use crate::engine::{self, Entry, Invoke, Nested, StepSlot, Unary};
use crate::step::EntryStep;

const DEFAULT_LABEL: &str = "pipeline";

/// Stage of a pipeline that has no steps yet.
///
/// Such a pipeline only resolves its arguments. It cannot be extended with
/// [`Pipeline::then`], because its first step has to take the arguments
/// spread; start from [`Pipeline::new`] instead.
///
/// ```compile_fail
/// use river_pipe::pipeline::{Empty, Pipeline};
///
/// let unspread = Pipeline::<(i32,), (i32,), Empty>::identity().then(|args: (i32,)| args.0);
/// ```
pub enum Empty {}

/// Stage of a pipeline whose first step spreads the arguments.
pub enum Chained {}

/// An ordered, immutable chain of steps.
///
/// `In` is the argument tuple the first step is spread over, `Out` the
/// resolved result of the last step. Every value between two steps is
/// resolved first (see [`Resolve`]), so a step always receives a plain value.
///
/// Cloning is cheap and clones share their steps. Adding a step to a clone
/// never affects the pipeline it was cloned from.
///
/// ```ignore
/// let describe = Pipeline::new(|a: i32, b: i32| a + b).then(|sum| sum.to_string());
/// assert_eq!(describe.call((2, 3)).await?, "5");
/// ```
pub struct Pipeline<In, Out, Stage = Chained> {
    steps: Arc<Vec<StepSlot>>,
    label: Arc<str>,
    _types: PhantomData<fn(In, Stage) -> Out>,
}

impl<In, Out, S> Clone for Pipeline<In, Out, S> {
    fn clone(&self) -> Self {
        Self {
            steps: Arc::clone(&self.steps),
            label: Arc::clone(&self.label),
            _types: PhantomData,
        }
    }
}

impl<In, Out, S> std::fmt::Debug for Pipeline<In, Out, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("label", &self.label)
            .field("steps", &self.step_names())
            .finish()
    }
}

impl<In: Send + 'static> Pipeline<In, In, Empty> {
    /// A pipeline without steps: invoking it returns the resolved arguments.
    pub fn identity() -> Self {
        Self {
            steps: Arc::new(Vec::new()),
            label: Arc::from(DEFAULT_LABEL),
            _types: PhantomData,
        }
    }
}

impl<In: Send + 'static> Default for Pipeline<In, In, Empty> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<In, Out, S> Pipeline<In, Out, S> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step names in execution order.
    pub fn step_names(&self) -> Vec<String> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, slot)| slot.display_name(index).into_owned())
            .collect()
    }

    /// Set the label reported on the tracing span of each invocation.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Arc::from(label.into());
        self
    }
}

impl<In, Out, S> Pipeline<In, Out, S>
where
    In: Send + 'static,
    Out: Send + 'static,
{
    /// Invoke with a default [`RunConfig`].
    pub fn call<A>(&self, args: A) -> BoxFuture<'static, Result<Out>>
    where
        A: Resolve<Output = In>,
    {
        self.invoke_with(args, RunConfig::default())
    }

    /// Invoke the pipeline.
    ///
    /// `args` is resolved first and then spread over the first step. The
    /// returned future owns everything it needs, so it can be spawned.
    pub fn invoke_with<A>(&self, args: A, config: RunConfig) -> BoxFuture<'static, Result<Out>>
    where
        A: Resolve<Output = In>,
    {
        let span = tracing::info_span!(
            "pipeline",
            label = %self.label,
            run_id = %config.run_id,
            tags = ?config.tags,
            metadata = ?config.metadata,
            steps = self.steps.len(),
        );
        engine::execute(Arc::clone(&self.steps), args, config)
            .instrument(span)
            .boxed()
    }
}

impl<In, Out> Pipeline<In, Out, Chained>
where
    In: Send + 'static,
    Out: Send + 'static,
{
    /// Start a pipeline with `first`, which takes the arguments positionally.
    pub fn new<S>(first: S) -> Self
    where
        S: EntryStep<In>,
        S::Output: Resolve<Output = Out>,
    {
        Self {
            steps: Arc::new(vec![StepSlot::unnamed(Entry::<S, In>::new(first))]),
            label: Arc::from(DEFAULT_LABEL),
            _types: PhantomData,
        }
    }

    /// Append a step that receives the previous step's resolved result.
    pub fn then<F, R>(self, step: F) -> Pipeline<In, R::Output>
    where
        F: Fn(Out) -> R + Send + Sync + 'static,
        R: Resolve,
    {
        self.push(StepSlot::unnamed(Unary::<F, Out>::new(step)))
    }

    /// Append a step written as an async closure.
    pub fn then_async<F, Fut>(self, step: F) -> Pipeline<In, <Fut::Output as Resolve>::Output>
    where
        F: Fn(Out) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Resolve,
    {
        self.then(move |value| defer(step(value)))
    }

    /// Append a [`Runnable`]. It is invoked with the same [`RunConfig`] as
    /// the pipeline run that reaches it.
    pub fn then_runnable<R>(self, runnable: R) -> Pipeline<In, R::Output>
    where
        R: Runnable<Input = Out> + 'static,
    {
        self.push(StepSlot::unnamed(Invoke::new(runnable)))
    }

    /// Append a single-argument pipeline as one step.
    ///
    /// The inner pipeline runs under the caller's [`RunConfig`], so it shares
    /// the run id and, with `annotate_errors`, its failures are annotated
    /// with the inner step and then with this step.
    pub fn then_pipeline<Next, S2>(self, inner: Pipeline<(Out,), Next, S2>) -> Pipeline<In, Next>
    where
        Next: Send + 'static,
    {
        self.push(StepSlot::unnamed(Nested::<Out>::new(inner.steps)))
    }

    /// Feed this pipeline's result into `next` as its arguments.
    ///
    /// The steps of both are joined into one pipeline with this pipeline's
    /// label. Steps keep the names they were given and unnamed steps are
    /// numbered by their new position.
    pub fn pipe<Next, S2>(self, next: Pipeline<Out, Next, S2>) -> Pipeline<In, Next>
    where
        Next: Send + 'static,
    {
        let Self { mut steps, label, .. } = self;
        Arc::make_mut(&mut steps).extend(next.steps.iter().cloned());
        Pipeline {
            steps,
            label,
            _types: PhantomData,
        }
    }

    /// Name the most recently added step.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if let Some(last) = Arc::make_mut(&mut self.steps).last_mut() {
            last.name = Some(name.into());
        }
        self
    }

    fn push<Next>(self, slot: StepSlot) -> Pipeline<In, Next> {
        let Self { mut steps, label, .. } = self;
        Arc::make_mut(&mut steps).push(slot);
        Pipeline {
            steps,
            label,
            _types: PhantomData,
        }
    }
}

#[async_trait]
impl<In, Out, S> Runnable for Pipeline<In, Out, S>
where
    In: Resolve<Output = In>,
    Out: Send + 'static,
    S: 'static,
{
    type Input = In;
    type Output = Out;

    async fn invoke(&self, input: Self::Input, config: &RunConfig) -> Result<Self::Output> {
        self.invoke_with(input, config.clone()).await
    }
}
