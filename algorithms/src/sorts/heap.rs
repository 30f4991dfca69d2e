//! Heap sort: build a max-heap, then repeatedly move the maximum behind the
//! shrinking heap.

use crate::protocol::{ProducerError, ProducerFuture, SortKey, StepSink};

pub(crate) fn produce(values: Vec<i64>, sink: StepSink) -> ProducerFuture {
    Box::pin(sort(values, sink))
}

pub(crate) async fn sort<E: SortKey>(
    mut values: Vec<E>,
    mut sink: StepSink,
) -> Result<Vec<E>, ProducerError> {
    let n = values.len();
    for root in (0..n / 2).rev() {
        sink.checkpoint()?;
        sift_down(&mut values, root, n, &mut sink).await?;
    }

    for end in (1..n).rev() {
        sink.checkpoint()?;
        values.swap(0, end);
        sink.complete(end);
        sink.swap(
            &values,
            0,
            end,
            format!("Moved maximum {} to position {end}", values[end].key()),
        )
        .await?;
        sift_down(&mut values, 0, end, &mut sink).await?;
    }
    sink.complete(0);
    Ok(values)
}

async fn sift_down<E: SortKey>(
    values: &mut [E],
    mut root: usize,
    len: usize,
    sink: &mut StepSink,
) -> Result<(), ProducerError> {
    loop {
        sink.checkpoint()?;
        let left = 2 * root + 1;
        if left >= len {
            return Ok(());
        }

        let mut largest = root;
        sink.compare(
            values,
            largest,
            left,
            format!(
                "Comparing parent {} with left child {}",
                values[largest].key(),
                values[left].key()
            ),
        )
        .await?;
        if values[left].key() > values[largest].key() {
            largest = left;
        }

        let right = left + 1;
        if right < len {
            sink.compare(
                values,
                largest,
                right,
                format!(
                    "Comparing {} with right child {}",
                    values[largest].key(),
                    values[right].key()
                ),
            )
            .await?;
            if values[right].key() > values[largest].key() {
                largest = right;
            }
        }

        if largest == root {
            return Ok(());
        }
        values.swap(root, largest);
        sink.swap(
            values,
            root,
            largest,
            format!(
                "Sifted {} down below {}",
                values[largest].key(),
                values[root].key()
            ),
        )
        .await?;
        root = largest;
    }
}
