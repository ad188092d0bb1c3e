pub mod comparator;
pub mod types;

pub use comparator::*;
pub use types::*;
