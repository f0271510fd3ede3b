//! Windowed estimation: batch transforms with unknown selectivity.
//!
//! A window function takes an arbitrary slice of input and may produce any
//! number of outputs, so it can express filters and one-to-many expansions.
//! The estimator tracks how many outputs each input has yielded so far and
//! sizes upstream pulls from that ratio. Processing a few extra elements is
//! assumed to be cheap compared to making an extra upstream call.

use tracing::trace;

use crate::config::WindowConfig;
use crate::error::Result;
use crate::session::{Fetch, Paginated};

struct Windowed<A, F> {
    upstream: Paginated<A>,
    window: F,
    tuning: WindowConfig,
    n_in: usize,
    n_out: usize,
}

impl<A, F> Windowed<A, F> {
    /// Upstream `(at_least, at_most)` for one pull, given the lifetime ratio.
    fn estimate(&self, at_least: usize) -> (usize, usize) {
        // smoothed so the first call assumes one-for-one
        let ratio = (self.n_out + 1) as f64 / (self.n_in + 1) as f64;
        let optimistic = at_least as f64 / ratio;

        let low = self.tuning.pessimism_low * optimistic;
        let high = self.tuning.pessimism_high * low;
        let floor = self.tuning.floor_for(at_least) as f64;

        (low.max(floor) as usize, high.ceil() as usize)
    }
}

impl<A, B, F> Fetch<B> for Windowed<A, F>
where
    A: Send,
    F: FnMut(Vec<A>) -> Result<Vec<B>> + Send,
{
    fn fetch(&mut self, at_least: usize) -> Result<Vec<B>> {
        let mut results = Vec::new();

        loop {
            let (low, high) = self.estimate(at_least);
            let input = self.upstream.fetch_range(low, high)?;
            let n_in = input.len();

            let output = (self.window)(input)?;
            trace!(at_least, low, high, n_in, n_out = output.len(), "window");

            self.n_in += n_in;
            self.n_out += output.len();
            results.extend(output);

            if results.len() >= at_least || self.upstream.is_exhausted() {
                return Ok(results);
            }
        }
    }
}

impl<A: Send + 'static> Paginated<A> {
    /// Apply `window` to implementation-chosen runs of elements and
    /// concatenate what it returns.
    ///
    /// Upstream pull sizes adapt to the output/input ratio observed so far,
    /// aiming for as few upstream calls as possible.
    pub fn map_windowed<B, F>(self, window: F) -> Paginated<B>
    where
        B: Send + 'static,
        F: FnMut(Vec<A>) -> Result<Vec<B>> + Send + 'static,
    {
        self.map_windowed_with(window, WindowConfig::default())
    }

    /// [`map_windowed`](Self::map_windowed) with explicit estimator tuning.
    pub fn map_windowed_with<B, F>(self, window: F, tuning: WindowConfig) -> Paginated<B>
    where
        B: Send + 'static,
        F: FnMut(Vec<A>) -> Result<Vec<B>> + Send + 'static,
    {
        Paginated::from_fetch(Windowed {
            upstream: self,
            window,
            tuning,
            n_in: 0,
            n_out: 0,
        })
    }

    /// Keep the elements for which `predicate` returns true.
    ///
    /// A filter that rejects four of every five elements early on will pull
    /// about five inputs per requested output. A predicate error fails the
    /// whole batch.
    pub fn filter<F>(self, predicate: F) -> Paginated<A>
    where
        F: FnMut(&A) -> Result<bool> + Send + 'static,
    {
        self.filter_with(predicate, WindowConfig::default())
    }

    /// [`filter`](Self::filter) with explicit estimator tuning.
    pub fn filter_with<F>(self, mut predicate: F, tuning: WindowConfig) -> Paginated<A>
    where
        F: FnMut(&A) -> Result<bool> + Send + 'static,
    {
        self.map_windowed_with(
            move |input: Vec<A>| {
                let mut kept = Vec::new();
                for item in input {
                    if predicate(&item)? {
                        kept.push(item);
                    }
                }
                Ok(kept)
            },
            tuning,
        )
    }
}
