//! Buffered engine: pairs a fetch capability with a FIFO of surplus elements.
//!
//! Sources may return more than they were asked for. The surplus waits here
//! until a later call, and is always served before the source is pulled again.

use tracing::trace;

use crate::error::Result;
use crate::session::Fetch;

pub(crate) struct Buffered<T> {
    source: Box<dyn Fetch<T>>,
    buffer: Vec<T>,
}

impl<T> Buffered<T> {
    pub(crate) fn new(source: Box<dyn Fetch<T>>) -> Self {
        Self {
            source,
            buffer: Vec::new(),
        }
    }

    /// Return between `at_least` and `at_most` elements, fewer only when the
    /// source has run dry.
    ///
    /// On a source error the buffer is left untouched.
    pub(crate) fn fetch(&mut self, at_least: usize, at_most: usize) -> Result<Vec<T>> {
        if self.buffer.len() > at_most {
            return Ok(self.take(at_most));
        }
        if self.buffer.len() >= at_least {
            return Ok(std::mem::take(&mut self.buffer));
        }

        let need = at_least - self.buffer.len();
        let pulled = self.source.fetch(need)?;
        trace!(need, got = pulled.len(), buffered = self.buffer.len(), "pulled from source");
        self.buffer.extend(pulled);

        if self.buffer.len() > at_most {
            Ok(self.take(at_most))
        } else {
            Ok(std::mem::take(&mut self.buffer))
        }
    }

    fn take(&mut self, n: usize) -> Vec<T> {
        let rest = self.buffer.split_off(n);
        std::mem::replace(&mut self.buffer, rest)
    }

    #[cfg(test)]
    pub(crate) fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
