//! Insertion sort by shifting.
//!
//! The key being inserted is held aside while larger elements shift right, so
//! the working array briefly shows a duplicated value until the key lands.

use crate::protocol::{ProducerError, ProducerFuture, SortKey, StepSink};

pub(crate) fn produce(values: Vec<i64>, sink: StepSink) -> ProducerFuture {
    Box::pin(sort(values, sink))
}

pub(crate) async fn sort<E: SortKey>(
    mut values: Vec<E>,
    mut sink: StepSink,
) -> Result<Vec<E>, ProducerError> {
    for i in 1..values.len() {
        sink.checkpoint()?;
        let key = values[i];
        let mut j = i;
        while j > 0 {
            sink.checkpoint()?;
            sink.compare(
                &values,
                j - 1,
                j,
                format!("Comparing {} with key {}", values[j - 1].key(), key.key()),
            )
            .await?;
            if values[j - 1].key() <= key.key() {
                break;
            }
            values[j] = values[j - 1];
            sink.overwrite(
                &values,
                j,
                format!("Shifted {} right to position {j}", values[j].key()),
            )
            .await?;
            j -= 1;
        }
        if j != i {
            values[j] = key;
            sink.overwrite(
                &values,
                j,
                format!("Inserted {} at position {j}", key.key()),
            )
            .await?;
        }
    }
    Ok(values)
}
