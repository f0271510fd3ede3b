//! The session handle and the capability every source implements.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::buffer::Buffered;
use crate::config::PaginatedConfig;
use crate::error::{Error, Result};

/// Batch size used by [`Paginated::fetch_all`].
pub const DRAIN_BATCH: usize = 256;

/// The minimal contract a data source implements.
///
/// `fetch` must return at least `at_least` elements while data remains. It
/// may return more; the session buffers the surplus. Returning fewer means
/// the source is finished, and the session will never call it again.
pub trait Fetch<T>: Send {
    fn fetch(&mut self, at_least: usize) -> Result<Vec<T>>;
}

enum Session<T> {
    Open(Buffered<T>),
    /// Terminal state. `None` is a clean end of data.
    Exhausted(Option<Error>),
}

struct Shared<T> {
    session: Mutex<Session<T>>,
    range_factor: f64,
}

/// A handle to one cursor over a lazily produced sequence.
///
/// Elements come out in batches: [`fetch`](Self::fetch) returns at least the
/// requested number of elements until the source runs dry, at which point it
/// returns whatever was left (possibly nothing). After that, and after any
/// error, the session is inert: every call returns an empty batch, or the same
/// error, without touching the source again.
///
/// Cloning is cheap and clones share the cursor. Calls on one session are
/// serialized by a mutex, so handles can be shared across threads.
pub struct Paginated<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Paginated<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Paginated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // no locking here: this may run inside a fetch on the same session
        f.debug_struct("Paginated")
            .field("range_factor", &self.shared.range_factor)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Paginated<T> {
    /// Wrap a custom source with the default configuration.
    pub fn from_fetch<F>(source: F) -> Self
    where
        F: Fetch<T> + 'static,
    {
        Self::from_fetch_with(source, &PaginatedConfig::default())
    }

    /// Wrap a custom source, taking the range factor from `config`.
    pub fn from_fetch_with<F>(source: F, config: &PaginatedConfig) -> Self
    where
        F: Fetch<T> + 'static,
    {
        Self::open(Box::new(source), config.range_factor)
    }

    pub(crate) fn open(source: Box<dyn Fetch<T>>, range_factor: f64) -> Self {
        Self::with_state(Session::Open(Buffered::new(source)), range_factor)
    }

    /// A session that is already over, optionally carrying an error.
    pub(crate) fn signal(error: Option<Error>) -> Self {
        Self::with_state(Session::Exhausted(error), PaginatedConfig::default().range_factor)
    }
}

impl<T> Paginated<T> {
    fn with_state(state: Session<T>, range_factor: f64) -> Self {
        // below 1.0 (or NaN) a full batch would look short and end the session
        let range_factor = if range_factor >= 1.0 {
            range_factor
        } else {
            warn!(range_factor, "range factor below 1.0, using 1.0");
            1.0
        };
        Self {
            shared: Arc::new(Shared {
                session: Mutex::new(state),
                range_factor,
            }),
        }
    }

    /// Multiplier deriving the implicit upper bound of [`fetch`](Self::fetch).
    pub fn range_factor(&self) -> f64 {
        self.shared.range_factor
    }

    fn ceiling(&self, at_least: usize) -> usize {
        ((at_least as f64 * self.shared.range_factor) as usize).max(at_least)
    }

    /// Fetch at least `at_least` elements, and at most `at_least * range_factor`.
    ///
    /// Returns fewer than `at_least` exactly once, when the source runs out.
    pub fn fetch(&self, at_least: usize) -> Result<Vec<T>> {
        self.fetch_bounded(at_least, self.ceiling(at_least))
    }

    /// Fetch between `at_least` and `at_most` elements, inclusive.
    ///
    /// `at_most` is clamped to `at_least * range_factor`, and never below
    /// `at_least`.
    pub fn fetch_range(&self, at_least: usize, at_most: usize) -> Result<Vec<T>> {
        let at_most = at_most.min(self.ceiling(at_least)).max(at_least);
        self.fetch_bounded(at_least, at_most)
    }

    fn fetch_bounded(&self, at_least: usize, at_most: usize) -> Result<Vec<T>> {
        let mut session = self.shared.session.lock().map_err(|_| Error::Poisoned)?;

        let engine = match &mut *session {
            Session::Exhausted(None) => return Ok(Vec::new()),
            Session::Exhausted(Some(err)) => return Err(err.clone()),
            Session::Open(engine) => engine,
        };
        if at_least == 0 {
            return Ok(Vec::new());
        }

        match engine.fetch(at_least, at_most) {
            Ok(batch) if batch.len() >= at_least => Ok(batch),
            Ok(batch) => {
                debug!(at_least, got = batch.len(), "session reached end of data");
                // dropping the engine releases the source and any buffer
                *session = Session::Exhausted(None);
                Ok(batch)
            }
            Err(err) => {
                debug!(at_least, error = %err, "session failed");
                *session = Session::Exhausted(Some(err.clone()));
                Err(err)
            }
        }
    }

    /// True once the session has ended, cleanly or not.
    pub fn is_exhausted(&self) -> bool {
        match self.shared.session.lock() {
            Ok(session) => matches!(*session, Session::Exhausted(_)),
            Err(_) => true,
        }
    }

    /// Iterate over batches of at least `at_least` elements until the session ends.
    ///
    /// The final batch may be short. An error is yielded once and ends the
    /// iteration.
    pub fn batches(&self, at_least: usize) -> Batches<T> {
        Batches {
            session: self.clone(),
            at_least,
            done: false,
        }
    }

    /// Drain everything that is left into one vector.
    ///
    /// Blocks for as long as the source does; a queue that is never closed
    /// never finishes.
    pub fn fetch_all(&self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for batch in self.batches(DRAIN_BATCH) {
            out.extend(batch?);
        }
        Ok(out)
    }
}

/// Iterator returned by [`Paginated::batches`].
pub struct Batches<T> {
    session: Paginated<T>,
    at_least: usize,
    done: bool,
}

impl<T> Iterator for Batches<T> {
    type Item = Result<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.session.fetch(self.at_least) {
            Ok(batch) if batch.is_empty() => {
                self.done = true;
                None
            }
            Ok(batch) => {
                self.done = batch.len() < self.at_least;
                Some(Ok(batch))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
