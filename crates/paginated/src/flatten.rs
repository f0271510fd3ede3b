//! Flattening sessions of sessions, and the combinators built on it.

use std::collections::VecDeque;

use crate::error::Result;
use crate::session::{Fetch, Paginated};

struct Flatten<T> {
    outer: Paginated<Paginated<T>>,
    /// Sub-sessions pulled from `outer` but not yet drained, front is current.
    pending: VecDeque<Paginated<T>>,
}

impl<T: Send + 'static> Flatten<T> {
    /// The sub-session to read from next, or `None` once `outer` is spent.
    fn current(&mut self) -> Result<Option<Paginated<T>>> {
        if self.pending.is_empty() {
            let next = self.outer.fetch(1)?;
            self.pending.extend(next);
        }
        Ok(self.pending.front().cloned())
    }
}

impl<T: Send + 'static> Fetch<T> for Flatten<T> {
    fn fetch(&mut self, at_least: usize) -> Result<Vec<T>> {
        let mut out = Vec::new();

        while out.len() < at_least {
            let Some(current) = self.current()? else {
                break;
            };

            let want = at_least - out.len();
            let batch = current.fetch(want)?;
            if batch.len() < want {
                // short means that sub-session is finished
                self.pending.pop_front();
            }
            out.extend(batch);
        }

        Ok(out)
    }
}

impl<T: Send + 'static> Paginated<Paginated<T>> {
    /// Yield every element of every sub-session, in order.
    pub fn flatten(self) -> Paginated<T> {
        Paginated::from_fetch(Flatten {
            outer: self,
            pending: VecDeque::new(),
        })
    }
}

impl<T: Send + 'static> Paginated<T> {
    /// Chain sessions end to end.
    pub fn concat(sessions: Vec<Paginated<T>>) -> Self {
        Paginated::from_vec(sessions).flatten()
    }

    /// Map each element to a sub-session and flatten the results.
    pub fn flat_map<B, F>(self, expand: F) -> Paginated<B>
    where
        B: Send + 'static,
        F: FnMut(T) -> Result<Paginated<B>> + Send + 'static,
    {
        self.map(expand).flatten()
    }
}
