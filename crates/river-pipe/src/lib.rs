mod engine;
pub mod pipeline;
pub mod step;

/// Build a [`Pipeline`](crate::pipeline::Pipeline) from a list of steps.
///
/// `pipe!(f, g, h)` is `Pipeline::new(f).then(g).then(h)`; `pipe!()` is the
/// identity pipeline, which returns its resolved arguments.
#[macro_export]
macro_rules! pipe {
    () => {
        $crate::pipeline::Pipeline::identity()
    };
    ($first:expr $(, $step:expr)* $(,)?) => {
        $crate::pipeline::Pipeline::new($first)$(.then($step))*
    };
}

pub mod prelude {
    pub use crate::pipe;
    pub use crate::pipeline::{Chained, Empty, Pipeline};
    pub use crate::step::EntryStep;
}
