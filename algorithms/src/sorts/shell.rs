//! Shell sort with the halving gap sequence `n/2, n/4, ..., 1`.

use crate::protocol::{ProducerError, ProducerFuture, SortKey, StepSink};

pub(crate) fn produce(values: Vec<i64>, sink: StepSink) -> ProducerFuture {
    Box::pin(sort(values, sink))
}

pub(crate) async fn sort<E: SortKey>(
    mut values: Vec<E>,
    mut sink: StepSink,
) -> Result<Vec<E>, ProducerError> {
    let n = values.len();
    let mut gap = n / 2;
    while gap > 0 {
        sink.checkpoint()?;
        for i in gap..n {
            sink.checkpoint()?;
            let held = values[i];
            let mut j = i;
            while j >= gap {
                sink.checkpoint()?;
                sink.compare(
                    &values,
                    j - gap,
                    j,
                    format!(
                        "Gap {gap}: comparing {} with {}",
                        values[j - gap].key(),
                        held.key()
                    ),
                )
                .await?;
                if values[j - gap].key() <= held.key() {
                    break;
                }
                values[j] = values[j - gap];
                sink.overwrite(
                    &values,
                    j,
                    format!("Gap {gap}: moved {} to position {j}", values[j].key()),
                )
                .await?;
                j -= gap;
            }
            if j != i {
                values[j] = held;
                sink.overwrite(
                    &values,
                    j,
                    format!("Gap {gap}: placed {} at position {j}", held.key()),
                )
                .await?;
            }
        }
        gap /= 2;
    }
    Ok(values)
}
