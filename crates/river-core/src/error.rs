use thiserror::Error;

/// Boxed error produced by user code that is not a `RiverError`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for the River library.
#[derive(Debug, Error)]
pub enum RiverError {
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Custom(BoxError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Step {index} ('{name}') failed: {source}")]
    Step {
        index: usize,
        name: String,
        source: Box<RiverError>,
    },

    #[error("Step {index} received a value that is not a {expected}")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
    },
}

impl RiverError {
    /// Wrap an arbitrary error so it can travel through a pipeline.
    pub fn custom<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Custom(Box::new(err))
    }

    /// Strip any step annotations and return the error a step produced.
    pub fn root_cause(&self) -> &RiverError {
        match self {
            Self::Step { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Index of the failing step, if the error was annotated.
    pub fn step_index(&self) -> Option<usize> {
        match self {
            Self::Step { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Borrow the user error carried by `Custom` as a concrete type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self.root_cause() {
            Self::Custom(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl From<String> for RiverError {
    fn from(message: String) -> Self {
        Self::Other(message)
    }
}

impl From<&str> for RiverError {
    fn from(message: &str) -> Self {
        Self::Other(message.to_owned())
    }
}

pub type Result<T> = std::result::Result<T, RiverError>;
