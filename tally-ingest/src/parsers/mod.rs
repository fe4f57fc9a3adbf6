//! Field and line parsers that run over located statement regions.

pub mod metadata;
pub mod transactions;

pub use metadata::MetadataParser;
pub use transactions::{TransactionLineParser, clean_description};
