//! End-to-end behavior of sessions and pipelines.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use paginated::{Error, Paginated};
use pretty_assertions::assert_eq;

/// A function source over `1..=n` that counts how often it is called.
fn counted(n: u32) -> (Paginated<u32>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut next = 0;
    let src = Paginated::from_fn(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        next += 1;
        if next > n {
            return Err(Error::EndOfData);
        }
        Ok(next)
    });
    (src, calls)
}

/// Every pipeline shape over `1..=n`, paired with the elements it should yield.
fn pipelines(n: u32) -> Vec<(&'static str, Paginated<u32>, Vec<u32>)> {
    let all: Vec<u32> = (1..=n).collect();
    let odds: Vec<u32> = all.iter().copied().filter(|x| x % 2 == 1).collect();
    let half = (n / 2) as usize;

    vec![
        ("vec", Paginated::from_vec(all.clone()), all.clone()),
        ("fn", counted(n).0, all.clone()),
        (
            "map",
            Paginated::from_vec(all.clone()).map(|x| Ok(x * 3)),
            all.iter().map(|x| x * 3).collect(),
        ),
        (
            "filter",
            counted(n).0.filter(|x| Ok(x % 2 == 1)),
            odds.clone(),
        ),
        (
            "map_windowed",
            Paginated::from_vec(all.clone()).map_windowed(|xs: Vec<u32>| {
                Ok(xs.into_iter().filter(|x| x % 2 == 1).map(|x| x * 2).collect())
            }),
            odds.iter().map(|x| x * 2).collect(),
        ),
        (
            "concat",
            Paginated::concat(vec![
                Paginated::from_vec(all[..half].to_vec()),
                Paginated::empty(),
                counted(n).0.filter(move |x| Ok(*x as usize > half)),
            ]),
            all.clone(),
        ),
        (
            "flat_map",
            Paginated::from_vec(all.clone())
                .flat_map(|x| Ok(Paginated::from_vec(vec![x; (x % 3) as usize]))),
            all.iter()
                .flat_map(|&x| std::iter::repeat(x).take((x % 3) as usize))
                .collect(),
        ),
    ]
}

#[test]
fn scenario_a_basic_draining() {
    let src = Paginated::from_vec(vec![1, 2, 3, 4, 5]);

    assert_eq!(src.fetch(2).unwrap(), vec![1, 2]);
    assert_eq!(src.fetch(2).unwrap(), vec![3, 4]);
    assert_eq!(src.fetch(3).unwrap(), vec![5]);
    assert!(src.is_exhausted());
    assert!(src.fetch(5).unwrap().is_empty());
}

#[test]
fn scenario_b_filter_selectivity() {
    let src = Paginated::from_vec((1..=10).collect::<Vec<i32>>()).filter(|x| Ok(x % 2 == 0));

    assert_eq!(src.fetch(2).unwrap(), vec![2, 4]);
    assert_eq!(src.fetch(3).unwrap(), vec![6, 8, 10]);
    assert!(src.fetch(3).unwrap().is_empty());
}

#[test]
fn scenario_c_flatten() {
    let src = Paginated::from_vec(vec![
        Paginated::from_vec(vec![1, 2, 3]),
        Paginated::from_vec(vec![4, 5]),
        Paginated::from_vec(vec![]),
        Paginated::from_vec(vec![6, 7, 8, 9]),
    ])
    .flatten();

    assert_eq!(src.fetch(3).unwrap(), vec![1, 2, 3]);
    assert_eq!(src.fetch(4).unwrap(), vec![4, 5, 6, 7]);
    assert_eq!(src.fetch(2).unwrap(), vec![8, 9]);
}

#[test]
fn scenario_d_blocking_queue() {
    let (tx, rx) = tokio::sync::mpsc::channel::<&'static str>(4);
    let src = Paginated::from_queue(rx);

    let (done_tx, done_rx) = mpsc::channel();
    let waiter = src.clone();
    thread::spawn(move || {
        let _ = done_tx.send(waiter.fetch(2));
    });

    thread::sleep(Duration::from_millis(250));
    assert!(done_rx.try_recv().is_err(), "fetch returned from an empty open queue");

    tx.blocking_send("first").unwrap();
    tx.blocking_send("second").unwrap();
    drop(tx);

    let result = done_rx
        .recv_timeout(Duration::from_secs(2))
        .expect("fetch should resume once elements arrive");
    assert_eq!(result.unwrap(), vec!["first", "second"]);
}

#[test]
fn scenario_e_signaled_failure() {
    let src = Paginated::<i32>::failed(Error::msg("barf"));

    let err = src.fetch(0).unwrap_err();
    assert_eq!(err.to_string(), "barf");
}

#[test]
fn at_least_contract_holds_for_every_pipeline() {
    for (name, src, expected) in pipelines(60) {
        let mut remaining = expected.len();
        for want in [1, 4, 7, 2, 11] {
            let batch = src.fetch(want).unwrap();
            if remaining >= want {
                assert!(batch.len() >= want, "{name}: asked {want}, got {}", batch.len());
            }
            remaining -= batch.len();
        }
    }
}

#[test]
fn no_loss_no_duplication_in_order() {
    for (name, src, expected) in pipelines(97) {
        let mut got = Vec::new();
        for batch in src.batches(5) {
            got.extend(batch.unwrap());
        }
        assert_eq!(got, expected, "pipeline {name}");
        assert!(src.is_exhausted(), "pipeline {name}");
    }
}

#[test]
fn exhausted_session_never_calls_source_again() {
    let (src, calls) = counted(5);

    assert_eq!(src.fetch(2).unwrap(), vec![1, 2]);
    assert_eq!(src.fetch(2).unwrap(), vec![3, 4]);
    assert_eq!(src.fetch(3).unwrap(), vec![5]);
    let after = calls.load(Ordering::SeqCst);

    for n in [0, 1, 5, 100] {
        assert!(src.fetch(n).unwrap().is_empty());
    }
    assert_eq!(calls.load(Ordering::SeqCst), after);
}

#[test]
fn exhausted_pipeline_never_calls_source_again() {
    let (src, calls) = counted(20);
    let pipeline = src.filter(|x| Ok(x % 4 == 0)).map(|x| Ok(x + 1));

    assert_eq!(pipeline.fetch_all().unwrap(), vec![5, 9, 13, 17, 21]);
    let after = calls.load(Ordering::SeqCst);

    assert!(pipeline.fetch(3).unwrap().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), after);
}

#[test]
fn failure_is_atomic_and_permanent() {
    let (src, calls) = counted(100);
    let pipeline = src.map(|x| {
        if x == 13 {
            return Err(Error::msg("unlucky"));
        }
        Ok(x)
    });

    assert_eq!(pipeline.fetch(10).unwrap(), (1..=10).collect::<Vec<_>>());

    // the failing element is the third of this batch; nothing comes back
    let err = pipeline.fetch(5).unwrap_err();
    assert_eq!(err.to_string(), "unlucky");
    let after = calls.load(Ordering::SeqCst);

    for _ in 0..3 {
        assert_eq!(pipeline.fetch(1).unwrap_err().to_string(), "unlucky");
    }
    assert_eq!(calls.load(Ordering::SeqCst), after);
}

#[test]
fn concurrent_consumers_share_one_cursor() {
    let src = Paginated::from_vec((0..10_000u32).collect::<Vec<_>>()).map(|x| Ok(x * 2));

    let mut seen: Vec<u32> = thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let handle = src.clone();
                scope.spawn(move || {
                    let mut mine = Vec::new();
                    loop {
                        let batch = handle.fetch(7).unwrap();
                        // each batch is a contiguous, ordered run
                        assert!(batch.windows(2).all(|w| w[1] == w[0] + 2));
                        if batch.is_empty() {
                            return mine;
                        }
                        mine.extend(batch);
                    }
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect()
    });

    seen.sort_unstable();
    assert_eq!(seen, (0..10_000u32).map(|x| x * 2).collect::<Vec<_>>());
}
