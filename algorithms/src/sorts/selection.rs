//! Selection sort. At most `n - 1` swaps.

use crate::protocol::{ProducerError, ProducerFuture, SortKey, StepSink};

pub(crate) fn produce(values: Vec<i64>, sink: StepSink) -> ProducerFuture {
    Box::pin(sort(values, sink))
}

pub(crate) async fn sort<E: SortKey>(
    mut values: Vec<E>,
    mut sink: StepSink,
) -> Result<Vec<E>, ProducerError> {
    let n = values.len();
    for i in 0..n.saturating_sub(1) {
        sink.checkpoint()?;
        let mut min = i;
        for j in i + 1..n {
            sink.checkpoint()?;
            sink.compare(
                &values,
                min,
                j,
                format!(
                    "Comparing current minimum {} with {}",
                    values[min].key(),
                    values[j].key()
                ),
            )
            .await?;
            if values[j].key() < values[min].key() {
                min = j;
            }
        }
        sink.complete(i);
        if min != i {
            values.swap(i, min);
            sink.swap(
                &values,
                i,
                min,
                format!("Moved minimum {} to position {i}", values[i].key()),
            )
            .await?;
        }
    }
    sink.complete(n.saturating_sub(1));
    Ok(values)
}
