//! Type definitions for milktrack

mod error;
mod milk;
mod stats;
mod user;

pub use error::*;
pub use milk::*;
pub use stats::*;
pub use user::*;
