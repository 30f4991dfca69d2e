//! Quick sort with a fixed last-element pivot.
//!
//! The pivot is never randomized, so already sorted and reverse-sorted inputs
//! hit the quadratic worst case. Sub-ranges are kept on an explicit stack with
//! the smaller side processed first, bounding the stack at O(log n).

use crate::protocol::{ProducerError, ProducerFuture, SortKey, StepSink};

pub(crate) fn produce(values: Vec<i64>, sink: StepSink) -> ProducerFuture {
    Box::pin(sort(values, sink))
}

pub(crate) async fn sort<E: SortKey>(
    mut values: Vec<E>,
    mut sink: StepSink,
) -> Result<Vec<E>, ProducerError> {
    // Half-open ranges [lo, hi).
    let mut pending = vec![(0, values.len())];
    while let Some((lo, hi)) = pending.pop() {
        sink.checkpoint()?;
        match hi - lo {
            0 => continue,
            1 => {
                sink.complete(lo);
                continue;
            }
            _ => {}
        }

        let pivot = partition(&mut values, lo, hi, &mut sink).await?;
        sink.complete(pivot);

        let left = (lo, pivot);
        let right = (pivot + 1, hi);
        if left.1 - left.0 < right.1 - right.0 {
            pending.push(right);
            pending.push(left);
        } else {
            pending.push(left);
            pending.push(right);
        }
    }
    Ok(values)
}

/// Lomuto partition of `[lo, hi)` around `values[hi - 1]`.
///
/// `store` trails `scan`; everything left of `store` is smaller than the pivot.
async fn partition<E: SortKey>(
    values: &mut [E],
    lo: usize,
    hi: usize,
    sink: &mut StepSink,
) -> Result<usize, ProducerError> {
    let pivot_at = hi - 1;
    let pivot = values[pivot_at].key();
    let mut store = lo;

    for scan in lo..pivot_at {
        sink.checkpoint()?;
        sink.compare(
            values,
            scan,
            pivot_at,
            format!("Comparing {} with pivot {pivot}", values[scan].key()),
        )
        .await?;
        if values[scan].key() < pivot {
            if scan != store {
                values.swap(scan, store);
                sink.swap(
                    values,
                    store,
                    scan,
                    format!(
                        "Swapped {} and {}",
                        values[store].key(),
                        values[scan].key()
                    ),
                )
                .await?;
            }
            store += 1;
        }
    }

    if store != pivot_at {
        values.swap(store, pivot_at);
        sink.swap(
            values,
            store,
            pivot_at,
            format!("Moved pivot {pivot} to position {store}"),
        )
        .await?;
    }
    Ok(store)
}
