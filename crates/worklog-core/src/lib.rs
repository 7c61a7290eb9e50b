pub mod clock;
pub mod event;
pub mod hash;
pub mod types;

pub use types::*;
