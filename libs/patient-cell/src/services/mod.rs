pub mod validation;
pub mod derivation;
pub mod merge;
pub mod sort;
pub mod store;
pub mod patient;

pub use store::*;
pub use patient::*;
