pub mod duplicate_groups;

pub use duplicate_groups::{group_duplicates, records_for_key};
