//! tally-import: turns parsed credit-card statements into records an
//! account ledger can import.

pub mod projector;

pub use projector::{
    DEFAULT_CATEGORY, EntryKind, ImportSummary, ImportableTransaction, project, source_category,
};
