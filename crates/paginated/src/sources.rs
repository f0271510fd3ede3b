//! Primitive sources: callbacks, fixed sequences, and pre-ended sessions.

use crate::error::{Error, Result};
use crate::session::{Fetch, Paginated};

struct FromFn<F> {
    produce: F,
}

impl<T, F> Fetch<T> for FromFn<F>
where
    F: FnMut() -> Result<T> + Send,
{
    fn fetch(&mut self, at_least: usize) -> Result<Vec<T>> {
        // at_least can be far beyond what the producer holds; grow as items arrive
        let mut out = Vec::new();
        while out.len() < at_least {
            match (self.produce)() {
                Ok(item) => out.push(item),
                Err(Error::EndOfData) => break,
                Err(err) => return Err(err),
            }
        }
        Ok(out)
    }
}

struct FromVec<T> {
    items: Vec<T>,
}

impl<T: Send> Fetch<T> for FromVec<T> {
    fn fetch(&mut self, _at_least: usize) -> Result<Vec<T>> {
        // everything at once; the engine buffers it and the next pull is empty
        Ok(std::mem::take(&mut self.items))
    }
}

impl<T: Send + 'static> Paginated<T> {
    /// Elements are the successive return values of `produce`.
    ///
    /// `produce` is called until it returns [`Error::EndOfData`]. Any other
    /// error is handed to whoever is fetching.
    pub fn from_fn<F>(produce: F) -> Self
    where
        F: FnMut() -> Result<T> + Send + 'static,
    {
        Self::from_fetch(FromFn { produce })
    }

    /// Elements are the concatenated vectors returned by `produce`.
    ///
    /// `produce` is called until it returns [`Error::EndOfData`]. If it keeps
    /// returning empty vectors, a fetch will keep calling it.
    pub fn from_batch_fn<F>(produce: F) -> Self
    where
        F: FnMut() -> Result<Vec<T>> + Send + 'static,
    {
        Paginated::from_fn(produce).flat_map(|batch| Ok(Paginated::from_vec(batch)))
    }

    /// A session over a fixed sequence.
    ///
    /// Uses a range factor of 1.0 so every non-final batch is exactly the
    /// requested size.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::open(Box::new(FromVec { items }), 1.0)
    }

    /// A session with no elements.
    pub fn empty() -> Self {
        Self::signal(None)
    }

    /// A session that fails with `error` on the first call, and every call after.
    pub fn failed(error: impl Into<Error>) -> Self {
        Self::signal(Some(error.into()))
    }
}

impl<T: Send + 'static> FromIterator<T> for Paginated<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}
