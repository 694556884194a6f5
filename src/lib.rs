pub mod clustering;
pub mod consolidation;
pub mod errors;
pub mod models;
pub mod similarity;
pub mod store;
pub mod utils;

pub use errors::{ResolutionError, ResolutionResult};
