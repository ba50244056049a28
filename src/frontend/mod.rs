//! Frontend module - AST and project structure handed over by the parser

pub mod ast;
pub mod project;
