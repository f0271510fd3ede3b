//! One-for-one element transforms.

use crate::error::Result;
use crate::session::{Fetch, Paginated};

struct MapFetch<A, F> {
    upstream: Paginated<A>,
    transform: F,
}

impl<A, B, F> Fetch<B> for MapFetch<A, F>
where
    A: Send,
    F: FnMut(A) -> Result<B> + Send,
{
    fn fetch(&mut self, at_least: usize) -> Result<Vec<B>> {
        self.upstream
            .fetch(at_least)?
            .into_iter()
            .map(&mut self.transform)
            .collect()
    }
}

impl<A: Send + 'static> Paginated<A> {
    /// Apply `transform` to every element, one for one and in order.
    ///
    /// The first error from `transform` fails the whole batch.
    pub fn map<B, F>(self, transform: F) -> Paginated<B>
    where
        B: Send + 'static,
        F: FnMut(A) -> Result<B> + Send + 'static,
    {
        Paginated::from_fetch(MapFetch {
            upstream: self,
            transform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    const BATS: [&str; 3] = ["Desmodus rotundus", "Diaemus youngi", "Diphylla ecaudata"];

    #[test]
    fn test_map() {
        let src = Paginated::from_vec(BATS.to_vec()).map(|s| Ok(s.len()));

        assert_eq!(
            src.fetch(2).unwrap(),
            vec!["Desmodus rotundus".len(), "Diaemus youngi".len()]
        );
        assert_eq!(src.fetch(1).unwrap(), vec!["Diphylla ecaudata".len()]);
        assert!(src.fetch(1).unwrap().is_empty());
    }

    #[test]
    fn test_map_error() {
        let src = Paginated::from_vec(BATS.to_vec()).map(|s| {
            if s.contains("ecaudata") {
                return Err(Error::msg("BAT ERROR"));
            }
            Ok(s.len())
        });

        assert_eq!(src.fetch(2).unwrap().len(), 2);

        let err = src.fetch(1).unwrap_err();
        assert_eq!(err.to_string(), "BAT ERROR");
        assert!(src.is_exhausted());
    }

    #[test]
    fn test_map_error_discards_whole_batch() {
        let src = Paginated::from_vec((1..=6).collect::<Vec<i32>>()).map(|x| {
            if x == 5 {
                return Err(Error::msg("five"));
            }
            Ok(x * 10)
        });

        assert_eq!(src.fetch(6).unwrap_err().to_string(), "five");
        assert_eq!(src.fetch(1).unwrap_err().to_string(), "five");
    }

    #[test]
    fn test_upstream_error_passes_through() {
        let src = Paginated::<i32>::failed(Error::msg("upstream")).map(|x| Ok(x + 1));
        assert_eq!(src.fetch(3).unwrap_err().to_string(), "upstream");
    }
}
