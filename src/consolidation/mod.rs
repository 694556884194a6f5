pub mod bulk;
pub mod field_merge;
pub mod merger;

pub use bulk::{bulk_delete, bulk_update};
pub use field_merge::merge_fields;
pub use merger::{select_master, RecordMerger};
