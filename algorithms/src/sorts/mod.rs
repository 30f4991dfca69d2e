//! The eight producers.
//!
//! Every module exposes a generic `sort` over [`SortKey`](crate::SortKey)
//! elements and a `produce` entry point fixed to `i64` for the registry.

pub(crate) mod bubble;
pub(crate) mod heap;
pub(crate) mod insertion;
pub(crate) mod merge;
pub(crate) mod quick;
pub(crate) mod radix;
pub(crate) mod selection;
pub(crate) mod shell;
