//! Bottom-up merge sort.
//!
//! Runs of width 1, 2, 4, ... are merged through auxiliary copies, so each
//! write to the working array is a single overwrite step. Positions written
//! during the final merge are already in their sorted place.

use crate::protocol::{ProducerError, ProducerFuture, SortKey, StepSink};

pub(crate) fn produce(values: Vec<i64>, sink: StepSink) -> ProducerFuture {
    Box::pin(sort(values, sink))
}

pub(crate) async fn sort<E: SortKey>(
    mut values: Vec<E>,
    mut sink: StepSink,
) -> Result<Vec<E>, ProducerError> {
    let n = values.len();
    let mut width = 1;
    while width < n {
        sink.checkpoint()?;
        let final_pass = width * 2 >= n;
        let mut lo = 0;
        while lo < n {
            sink.checkpoint()?;
            let mid = (lo + width).min(n);
            let hi = (lo + 2 * width).min(n);
            if mid < hi {
                merge(&mut values, lo, mid, hi, final_pass, &mut sink).await?;
            }
            lo += 2 * width;
        }
        width *= 2;
    }
    Ok(values)
}

async fn merge<E: SortKey>(
    values: &mut [E],
    lo: usize,
    mid: usize,
    hi: usize,
    final_pass: bool,
    sink: &mut StepSink,
) -> Result<(), ProducerError> {
    let left = values[lo..mid].to_vec();
    let right = values[mid..hi].to_vec();
    let (mut i, mut j, mut k) = (0, 0, lo);

    while i < left.len() && j < right.len() {
        sink.checkpoint()?;
        sink.compare(
            values,
            k,
            mid + j,
            format!("Comparing {} and {}", left[i].key(), right[j].key()),
        )
        .await?;
        // `<=` takes from the left run on ties, preserving input order.
        if left[i].key() <= right[j].key() {
            values[k] = left[i];
            i += 1;
        } else {
            values[k] = right[j];
            j += 1;
        }
        if final_pass {
            sink.complete(k);
        }
        sink.overwrite(
            values,
            k,
            format!("Placed {} at position {k}", values[k].key()),
        )
        .await?;
        k += 1;
    }

    for &item in &left[i..] {
        sink.checkpoint()?;
        values[k] = item;
        if final_pass {
            sink.complete(k);
        }
        sink.overwrite(
            values,
            k,
            format!("Placed {} at position {k}", item.key()),
        )
        .await?;
        k += 1;
    }

    // Leftover right-run elements already sit at their final offsets.
    if final_pass {
        for index in k..hi {
            sink.complete(index);
        }
    }
    Ok(())
}
