use async_trait::async_trait;
use futures::future;

use crate::config::RunConfig;
use crate::error::Result;

/// An async unit of work that is handed the caller's [`RunConfig`].
///
/// Built pipelines implement this, and a pipeline can take any runnable as a
/// step. That step then sees the same `run_id`, tags and metadata as the
/// invocation that reached it.
#[async_trait]
pub trait Runnable: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    async fn invoke(&self, input: Self::Input, config: &RunConfig) -> Result<Self::Output>;

    /// Invoke once per input, all at the same time.
    ///
    /// Results keep the order of `inputs`. The first failure is returned and
    /// the remaining invocations are dropped.
    async fn batch(&self, inputs: Vec<Self::Input>, config: &RunConfig) -> Result<Vec<Self::Output>> {
        future::try_join_all(inputs.into_iter().map(|input| self.invoke(input, config))).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Barrier;
    use uuid::Uuid;

    use super::*;
    use crate::error::RiverError;

    /// Looks user names up by id, waiting on a shared barrier when present.
    struct Directory {
        names: HashMap<u32, &'static str>,
        barrier: Option<Arc<Barrier>>,
    }

    impl Directory {
        fn new() -> Self {
            Self {
                names: HashMap::from([(1, "ada"), (2, "grace"), (3, "edsger")]),
                barrier: None,
            }
        }
    }

    #[async_trait]
    impl Runnable for Directory {
        type Input = u32;
        type Output = String;

        async fn invoke(&self, id: u32, config: &RunConfig) -> Result<String> {
            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }
            let name = self
                .names
                .get(&id)
                .ok_or_else(|| RiverError::Other(format!("no user {id}")))?;
            match config.tags.first() {
                Some(tag) => Ok(format!("{tag}:{name}")),
                None => Ok((*name).to_string()),
            }
        }
    }

    /// Echoes the run id it was invoked under.
    struct RunId;

    #[async_trait]
    impl Runnable for RunId {
        type Input = ();
        type Output = Uuid;

        async fn invoke(&self, _input: (), config: &RunConfig) -> Result<Uuid> {
            Ok(config.run_id)
        }
    }

    #[tokio::test]
    async fn invoke_sees_the_config() {
        let config = RunConfig::new().with_tag("staff");
        let name = Directory::new().invoke(2, &config).await.unwrap();
        assert_eq!(name, "staff:grace");
    }

    #[tokio::test]
    async fn batch_keeps_input_order() {
        let config = RunConfig::default();
        let names = Directory::new().batch(vec![3, 1, 2], &config).await.unwrap();
        assert_eq!(names, vec!["edsger", "ada", "grace"]);
    }

    #[tokio::test]
    async fn batch_invocations_overlap() {
        let directory = Directory {
            barrier: Some(Arc::new(Barrier::new(3))),
            ..Directory::new()
        };
        let config = RunConfig::default();
        let names = tokio::time::timeout(
            Duration::from_secs(1),
            directory.batch(vec![1, 2, 3], &config),
        )
        .await
        .expect("batch invocations ran one at a time")
        .unwrap();
        assert_eq!(names.len(), 3);
    }

    #[tokio::test]
    async fn batch_fails_on_unknown_input() {
        let config = RunConfig::default();
        let err = Directory::new().batch(vec![1, 9, 2], &config).await.unwrap_err();
        assert_eq!(err.to_string(), "no user 9");
    }

    #[tokio::test]
    async fn batch_shares_one_run_id() {
        let config = RunConfig::default();
        let ids = RunId.batch(vec![(), ()], &config).await.unwrap();
        assert_eq!(ids, vec![config.run_id, config.run_id]);
    }
}
