//! Dispatch errors.

use thiserror::Error;

use crate::backend::FetchError;
use crate::cache::CacheError;
use crate::decode::DecodeError;
use crate::dom::SelectorError;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matched `{0}`")]
    NoRouteMatched(String),

    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("unknown stage #{0}")]
    UnknownStage(usize),

    #[error("dispatch cancelled")]
    Cancelled,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error("{stage}: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<DispatchError>,
    },

    #[error(transparent)]
    Handler(Box<dyn std::error::Error + Send + Sync>),
}

impl DispatchError {
    /// Wrap with the name of the stage it passed through.
    pub fn in_stage(self, stage: impl Into<String>) -> Self {
        DispatchError::Stage {
            stage: stage.into(),
            source: Box::new(self),
        }
    }

    /// Wrap an arbitrary handler failure (e.g. a storage error).
    pub fn handler<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DispatchError::Handler(Box::new(err))
    }

    /// The innermost error below any stage wrappers.
    pub fn root_cause(&self) -> &DispatchError {
        let mut current = self;
        while let DispatchError::Stage { source, .. } = current {
            current = source;
        }
        current
    }

    /// Stage names from outermost to innermost.
    pub fn stages(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = self;
        while let DispatchError::Stage { stage, source } = current {
            names.push(stage.as_str());
            current = source;
        }
        names
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), DispatchError::Cancelled)
    }
}

/// `.in_stage(..)` on any result whose error converts into [`DispatchError`].
pub trait StageResultExt<T> {
    fn in_stage(self, stage: &str) -> Result<T, DispatchError>;
}

impl<T, E: Into<DispatchError>> StageResultExt<T> for Result<T, E> {
    fn in_stage(self, stage: &str) -> Result<T, DispatchError> {
        self.map_err(|e| Into::<DispatchError>::into(e).in_stage(stage))
    }
}
