pub mod asset;
pub mod search;

pub use asset::*;
pub use search::*;
