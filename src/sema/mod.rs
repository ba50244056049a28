//! Semantic analysis: type registry, assignment checking, overload
//! resolution and common feature adoption

pub mod addressing;
pub mod adoption;
pub mod assignment;
pub mod call_resolver;
pub mod conflicts;
pub mod deducer;
pub mod exit_paths;
pub mod generics;
pub mod overloads;
pub mod program;
pub mod resolution;
pub mod scope;
pub mod specificity;
pub mod type_dependencies;
pub mod type_registry;
pub mod validator;

#[cfg(test)]
pub mod testing;

pub use program::ProgramRepresentation;
pub use validator::FunctionValidator;
