//! Instrumented sorting algorithms.
//!
//! Each algorithm is a producer: an async routine that sorts a private working
//! copy and reports every comparison, swap and overwrite through a
//! [`StepSink`], suspending after each one until the consumer lets it
//! continue. The static [`AlgorithmDescriptor`] table is the registry the
//! playback engine and the CLI select from.

mod protocol;
mod sorts;

pub use protocol::{
    CancelToken, Continuation, ProducerError, ProducerEvent, ProducerFault, ProducerFn,
    ProducerFuture, ProducerOutcome, Recording, SortKey, StepRequest, StepSink, record,
    spawn_producer,
};

use sortscope_types::AlgorithmId;

/// Static description of one algorithm.
#[derive(Debug, Clone, Copy)]
pub struct AlgorithmDescriptor {
    pub id: AlgorithmId,
    pub name: &'static str,
    pub description: &'static str,
    pub best_case: &'static str,
    pub average_case: &'static str,
    pub worst_case: &'static str,
    pub space_complexity: &'static str,
    pub stable: bool,
    pub producer: ProducerFn,
}

/// Registry in [`AlgorithmId::all`] order.
static DESCRIPTORS: [AlgorithmDescriptor; 8] = [
    AlgorithmDescriptor {
        id: AlgorithmId::Bubble,
        name: "Bubble Sort",
        description: "Repeatedly swaps adjacent out-of-order pairs; every pass runs to the end.",
        best_case: "O(n)",
        average_case: "O(n²)",
        worst_case: "O(n²)",
        space_complexity: "O(1)",
        stable: true,
        producer: sorts::bubble::produce,
    },
    AlgorithmDescriptor {
        id: AlgorithmId::Selection,
        name: "Selection Sort",
        description: "Selects the minimum of the unsorted suffix and swaps it into place.",
        best_case: "O(n²)",
        average_case: "O(n²)",
        worst_case: "O(n²)",
        space_complexity: "O(1)",
        stable: false,
        producer: sorts::selection::produce,
    },
    AlgorithmDescriptor {
        id: AlgorithmId::Insertion,
        name: "Insertion Sort",
        description: "Shifts larger elements right and inserts each key into the sorted prefix.",
        best_case: "O(n)",
        average_case: "O(n²)",
        worst_case: "O(n²)",
        space_complexity: "O(1)",
        stable: true,
        producer: sorts::insertion::produce,
    },
    AlgorithmDescriptor {
        id: AlgorithmId::Shell,
        name: "Shell Sort",
        description: "Gapped insertion sort with gaps n/2, n/4, ..., 1.",
        best_case: "O(n log n)",
        average_case: "O(n log n)",
        worst_case: "O(n²)",
        space_complexity: "O(1)",
        stable: false,
        producer: sorts::shell::produce,
    },
    AlgorithmDescriptor {
        id: AlgorithmId::Merge,
        name: "Merge Sort",
        description: "Merges sorted runs of doubling width through an auxiliary buffer.",
        best_case: "O(n log n)",
        average_case: "O(n log n)",
        worst_case: "O(n log n)",
        space_complexity: "O(n)",
        stable: true,
        producer: sorts::merge::produce,
    },
    AlgorithmDescriptor {
        id: AlgorithmId::Quick,
        name: "Quick Sort",
        description: "Partitions around the last element; sorted input hits the worst case.",
        best_case: "O(n log n)",
        average_case: "O(n log n)",
        worst_case: "O(n²)",
        space_complexity: "O(log n)",
        stable: false,
        producer: sorts::quick::produce,
    },
    AlgorithmDescriptor {
        id: AlgorithmId::Heap,
        name: "Heap Sort",
        description: "Builds a max-heap, then repeatedly moves the maximum to the end.",
        best_case: "O(n log n)",
        average_case: "O(n log n)",
        worst_case: "O(n log n)",
        space_complexity: "O(1)",
        stable: false,
        producer: sorts::heap::produce,
    },
    AlgorithmDescriptor {
        id: AlgorithmId::Radix,
        name: "Radix Sort",
        description: "LSD base-10 counting passes, one per digit of the largest value.",
        best_case: "O(d·(n+10))",
        average_case: "O(d·(n+10))",
        worst_case: "O(d·(n+10))",
        space_complexity: "O(n+10)",
        stable: true,
        producer: sorts::radix::produce,
    },
];

#[must_use]
pub fn descriptor(id: AlgorithmId) -> &'static AlgorithmDescriptor {
    let index = AlgorithmId::all()
        .iter()
        .position(|candidate| *candidate == id)
        .unwrap_or_default();
    &DESCRIPTORS[index]
}

/// All descriptors in presentation order.
pub fn descriptors() -> impl Iterator<Item = &'static AlgorithmDescriptor> {
    DESCRIPTORS.iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_matches_id_order() {
        let ids: Vec<_> = descriptors().map(|d| d.id).collect();
        assert_eq!(ids, AlgorithmId::all());
        for id in AlgorithmId::all() {
            assert_eq!(descriptor(*id).id, *id);
            assert_eq!(descriptor(*id).name, id.display_name());
        }
    }

    #[test]
    fn stable_flags_match_documentation() {
        let stable: Vec<_> = descriptors().filter(|d| d.stable).map(|d| d.id).collect();
        assert_eq!(
            stable,
            [
                AlgorithmId::Bubble,
                AlgorithmId::Insertion,
                AlgorithmId::Merge,
                AlgorithmId::Radix
            ]
        );
    }
}
