//! Sessions fed by a blocking queue.
//!
//! Each element is one blocking receive. A closed, drained queue ends the
//! session. Asking for more elements than will ever be sent blocks until the
//! queue closes: there is no timeout, so close senders as early as you can and
//! don't rely on an exact count being available. Combinators such as
//! [`Paginated::filter`] routinely ask for a little more than their caller did.

use std::sync::mpsc;

use tokio::sync::mpsc as tokio_mpsc;

use crate::error::Error;
use crate::session::Paginated;

/// A FIFO with a blocking receive that reports when it is closed and empty.
pub trait BlockingQueue<T>: Send {
    /// Wait for the next element. `None` means the queue is closed and drained.
    fn recv_blocking(&mut self) -> Option<T>;
}

/// Must not be used from inside an async runtime; `blocking_recv` panics there.
impl<T: Send> BlockingQueue<T> for tokio_mpsc::Receiver<T> {
    fn recv_blocking(&mut self) -> Option<T> {
        self.blocking_recv()
    }
}

/// Must not be used from inside an async runtime; `blocking_recv` panics there.
impl<T: Send> BlockingQueue<T> for tokio_mpsc::UnboundedReceiver<T> {
    fn recv_blocking(&mut self) -> Option<T> {
        self.blocking_recv()
    }
}

impl<T: Send> BlockingQueue<T> for mpsc::Receiver<T> {
    fn recv_blocking(&mut self) -> Option<T> {
        self.recv().ok()
    }
}

impl<T: Send + 'static> Paginated<T> {
    /// Fetch elements as they arrive on `queue`.
    pub fn from_queue<Q>(mut queue: Q) -> Self
    where
        Q: BlockingQueue<T> + 'static,
    {
        Paginated::from_fn(move || queue.recv_blocking().ok_or(Error::EndOfData))
    }
}
