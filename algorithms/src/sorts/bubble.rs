//! Bubble sort.
//!
//! Every pass runs to the end of the unsorted region even when it made no
//! swaps, so step counts depend only on the input length.

use crate::protocol::{ProducerError, ProducerFuture, SortKey, StepSink};

pub(crate) fn produce(values: Vec<i64>, sink: StepSink) -> ProducerFuture {
    Box::pin(sort(values, sink))
}

pub(crate) async fn sort<E: SortKey>(
    mut values: Vec<E>,
    mut sink: StepSink,
) -> Result<Vec<E>, ProducerError> {
    let n = values.len();
    for pass in 0..n.saturating_sub(1) {
        sink.checkpoint()?;
        let end = n - 1 - pass;
        for j in 0..end {
            sink.checkpoint()?;
            let (left, right) = (values[j].key(), values[j + 1].key());
            sink.compare(&values, j, j + 1, format!("Comparing {left} and {right}"))
                .await?;
            // Strict comparison keeps equal keys in input order.
            if left > right {
                values.swap(j, j + 1);
                sink.swap(&values, j, j + 1, format!("Swapped {left} and {right}"))
                    .await?;
            }
        }
        sink.complete(end);
    }
    sink.complete(0);
    Ok(values)
}
