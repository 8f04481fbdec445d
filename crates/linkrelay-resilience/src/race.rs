// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Race two optional lookups and keep the first hit.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Poll `a` and `b` concurrently; return the first `Some`.
///
/// A branch that finishes with `None` does not end the race: the other
/// branch keeps running. Whatever is still pending when a winner is found,
/// or when `timeout` elapses, is dropped.
pub async fn first_success<T, A, B>(a: A, b: B, timeout: Duration) -> Option<T>
where
    A: Future<Output = Option<T>>,
    B: Future<Output = Option<T>>,
{
    let race = async {
        tokio::pin!(a);
        tokio::pin!(b);
        let mut a_done = false;
        let mut b_done = false;

        while !(a_done && b_done) {
            tokio::select! {
                result = &mut a, if !a_done => match result {
                    Some(value) => return Some(value),
                    None => a_done = true,
                },
                result = &mut b, if !b_done => match result {
                    Some(value) => return Some(value),
                    None => b_done = true,
                },
            }
        }
        None
    };

    match tokio::time::timeout(timeout, race).await {
        Ok(winner) => winner,
        Err(_) => {
            debug!(?timeout, "race timed out without a result");
            None
        }
    }
}
