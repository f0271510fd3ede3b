//! Error type shared by every session and source.
//!
//! A session hands its terminal error back on every call after it fails, so
//! the error has to be cheap to clone. Application failures are carried as an
//! `anyhow::Error` behind an `Arc`.

use std::fmt::{Debug, Display};
use std::sync::Arc;

use thiserror::Error;

/// Errors produced while fetching from a [`Paginated`](crate::Paginated).
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Clean end of data.
    ///
    /// Function-backed producers return this to say they have nothing more
    /// to give. Consumers never see it from those sources: the session
    /// reports a short batch instead.
    #[error("no more elements")]
    EndOfData,

    /// A session's lock was poisoned by a callback that panicked mid-fetch.
    #[error("session lock poisoned")]
    Poisoned,

    /// A source, transformation, or nested session failed.
    #[error("{0}")]
    Failed(Arc<anyhow::Error>),
}

impl Error {
    /// Build a failure from a printable message.
    pub fn msg<M>(message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self::Failed(Arc::new(anyhow::Error::msg(message)))
    }

    /// Wrap any standard error as a failure.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        anyhow::Error::new(error).into()
    }

    /// True for the end-of-data sentinel.
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Self::EndOfData)
    }

    /// The underlying failure, if this is one.
    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Failed(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        // `?` through anyhow must not turn the sentinel into a failure
        match error.downcast::<Error>() {
            Ok(inner) => inner,
            Err(error) => Self::Failed(Arc::new(error)),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
