//! Type signatures and type definitions

mod type_system;
mod definition;

pub use type_system::*;
pub use definition::*;
