//! Adaptive batch fetching over lazy, possibly expensive or blocking sources.
//!
//! A [`Paginated`] pulls elements in groups: [`Paginated::fetch`] returns *at
//! least* the requested number of elements until the source runs out, while
//! keeping the number of calls into the source small. It sits between
//! element-at-a-time pipelines (too many round trips) and materializing the
//! whole sequence (wasteful when the size is unknown or the consumer may stop
//! early).
//!
//! # Quick Start
//!
//! ```rust
//! use paginated::{Error, Paginated};
//!
//! let evens = Paginated::from_vec((1..=10).collect::<Vec<i32>>())
//!     .filter(|n| Ok(n % 2 == 0))
//!     .map(|n| Ok(n * 10));
//!
//! assert_eq!(evens.fetch(2)?, vec![20, 40]);
//! assert_eq!(evens.fetch(3)?, vec![60, 80, 100]);
//! assert!(evens.fetch(3)?.is_empty());
//! # Ok::<(), Error>(())
//! ```
//!
//! # Sources
//!
//! - [`Paginated::from_fn`] / [`Paginated::from_batch_fn`]: callbacks that
//!   return [`Error::EndOfData`] when done
//! - [`Paginated::from_queue`]: any [`BlockingQueue`], e.g. a tokio or std channel
//! - [`Paginated::from_vec`] and `collect()`: a fixed sequence
//! - [`Paginated::empty`] / [`Paginated::failed`]: sessions that are already over
//! - [`Paginated::from_fetch`]: anything implementing [`Fetch`]
//!
//! # Combinators
//!
//! - [`map`](Paginated::map): one for one
//! - [`filter`](Paginated::filter) and [`map_windowed`](Paginated::map_windowed):
//!   transforms of unknown selectivity, with upstream pulls sized from the
//!   ratio observed so far
//! - [`flatten`](Paginated::flatten), [`flat_map`](Paginated::flat_map),
//!   [`concat`](Paginated::concat)
//!
//! # Errors and exhaustion
//!
//! The first error anywhere in a pipeline fails the call that saw it, with
//! no partial output, and becomes the session's permanent result. A clean end
//! of data shows up as one short batch; after either, calls are cheap and
//! never reach the source again.
//!
//! # Blocking
//!
//! No threads are spawned. A fetch runs on the caller's thread and blocks
//! only when a source does, which for queue sources means until enough
//! elements arrive or the queue closes.

mod buffer;
pub mod config;
pub mod error;
mod flatten;
mod map;
pub mod queue;
pub mod session;
mod sources;
mod windowed;

pub use config::{ConfigError, PaginatedConfig, WindowConfig};
pub use error::{Error, Result};
pub use queue::BlockingQueue;
pub use session::{Batches, Fetch, Paginated, DRAIN_BATCH};
