// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::{Stream, StreamExt};
use std::fmt::Debug;
use std::time::Duration;

/// Collect the stream until it ends. Panics if it has not ended within `limit`.
pub async fn drain_within<S, T>(stream: S, limit: Duration) -> Vec<T>
where
    S: Stream<Item = T>,
{
    tokio::time::timeout(limit, stream.collect::<Vec<_>>())
        .await
        .unwrap_or_else(|_| panic!("stream did not end within {limit:?}"))
}

/// Order-independent equality.
pub fn assert_same_multiset<T>(actual: &[T], expected: &[T])
where
    T: Ord + Clone + Debug,
{
    let mut actual = actual.to_vec();
    let mut expected = expected.to_vec();
    actual.sort();
    expected.sort();
    assert_eq!(actual, expected, "delivered values differ from produced values");
}

/// Assert that `expected` appears in `actual` as a subsequence, i.e. in the
/// same relative order though possibly interleaved with other values.
pub fn assert_in_relative_order<T>(actual: &[T], expected: &[T])
where
    T: PartialEq + Debug,
{
    let mut remaining = expected.iter().peekable();
    for item in actual {
        if remaining.peek() == Some(&item) {
            remaining.next();
        }
    }
    assert!(
        remaining.peek().is_none(),
        "expected {expected:?} in relative order within {actual:?}"
    );
}
