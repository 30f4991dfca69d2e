//! LSD radix sort, base 10.
//!
//! One pass per decimal digit of the largest value. Each pass inspects every
//! element's digit, then writes the stably bucketed order back one position
//! at a time. Negative values are rejected.

use crate::protocol::{ProducerError, ProducerFault, ProducerFuture, SortKey, StepSink};

const RADIX: usize = 10;

pub(crate) fn produce(values: Vec<i64>, sink: StepSink) -> ProducerFuture {
    Box::pin(sort(values, sink))
}

pub(crate) async fn sort<E: SortKey>(
    mut values: Vec<E>,
    mut sink: StepSink,
) -> Result<Vec<E>, ProducerError> {
    if let Some(negative) = values.iter().map(SortKey::key).find(|&key| key < 0) {
        return Err(ProducerFault::Unsupported(format!(
            "radix sort requires non-negative integers (found {negative})"
        ))
        .into());
    }

    let n = values.len();
    let max = values.iter().map(SortKey::key).max().unwrap_or(0);
    let passes = digit_count(max);
    let mut place: i64 = 1;

    for pass in 1..=passes {
        sink.checkpoint()?;
        let last_pass = pass == passes;

        let mut counts = [0usize; RADIX];
        for (index, item) in values.iter().enumerate() {
            sink.checkpoint()?;
            let digit = digit_at(item.key(), place);
            counts[digit] += 1;
            sink.inspect(
                &values,
                index,
                format!("Pass {pass}: digit {digit} of {}", item.key()),
            )
            .await?;
        }

        for digit in 1..RADIX {
            counts[digit] += counts[digit - 1];
        }
        // Walk backwards so equal digits keep their relative order.
        let mut output = values.clone();
        for item in values.iter().rev() {
            let digit = digit_at(item.key(), place);
            counts[digit] -= 1;
            output[counts[digit]] = *item;
        }

        for (index, item) in output.into_iter().enumerate() {
            sink.checkpoint()?;
            values[index] = item;
            if last_pass {
                sink.complete(index);
            }
            sink.overwrite(
                &values,
                index,
                format!("Pass {pass}: placed {} at position {index}", item.key()),
            )
            .await?;
        }

        place = place.saturating_mul(RADIX as i64);
    }

    debug_assert_eq!(values.len(), n);
    Ok(values)
}

/// Decimal digits in `value`; zero has one digit.
fn digit_count(mut value: i64) -> usize {
    let mut digits = 1;
    while value >= RADIX as i64 {
        value /= RADIX as i64;
        digits += 1;
    }
    digits
}

fn digit_at(value: i64, place: i64) -> usize {
    ((value / place) % RADIX as i64) as usize
}
