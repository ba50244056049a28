//! Error handling for Meridian

use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Compiler error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Definitional Conflicts ====================

    #[error("Duplicate type definition: {name} (in {file})")]
    DuplicateType { name: String, file: String },

    #[error("Duplicate function definition: {name} (in {file})")]
    DuplicateFunction { name: String, file: String, span: Span },

    #[error("Duplicate file in project: {filename}")]
    DuplicateFile { filename: String },

    #[error("Duplicate identifier: {name}")]
    DuplicateIdentifier { name: String, span: Span },

    #[error("Type {pattern} is defined by both package {first} and package {second}, which are visible together from package {package}")]
    PackageTypeConflict {
        pattern: String,
        package: String,
        first: String,
        second: String,
    },

    // ==================== Resolution Failures ====================

    #[error("Unknown type: {name} (referenced from {file})")]
    UnknownType { name: String, file: String },

    #[error("Type alias {name} refers to itself")]
    CyclicTypeAlias { name: String },

    #[error("Type {name} contains itself by value")]
    CyclicTypeDependency { name: String },

    #[error("No matching overload for call {call}({arguments})")]
    NoMatchingOverload {
        call: String,
        arguments: String,
        span: Span,
    },

    #[error("Ambiguous call {call}({arguments}): {candidates} equally specific definitions match")]
    AmbiguousCall {
        call: String,
        arguments: String,
        candidates: usize,
        span: Span,
    },

    #[error("Common feature adoption is not possible for call {call}({arguments})")]
    CommonFeatureAdoptionImpossible {
        call: String,
        arguments: String,
        span: Span,
    },

    #[error("Call {call} mixes void and non-void definitions across union alternatives")]
    MixedVoidness { call: String, span: Span },

    #[error("Return type of call {call} depends on unresolved generic arguments")]
    UnresolvedGenericCall { call: String, span: Span },

    // ==================== Validation Errors ====================

    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String, span: Span },

    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Unknown field {field} in type {type_name}")]
    UnknownField {
        field: String,
        type_name: String,
        span: Span,
    },

    #[error("Expression of type {type_name} is not a struct")]
    NotAStruct { type_name: String, span: Span },

    #[error("Cannot dereference value of type {type_name}")]
    CannotDeref { type_name: String, span: Span },

    #[error("Value of type {type_name} is not indexable")]
    NotIndexable { type_name: String, span: Span },

    #[error("Call {call} returns nothing and cannot be used as a value")]
    VoidValue { call: String, span: Span },

    #[error("Cannot assign to constant {name}")]
    AssignmentToConst { name: String, span: Span },

    #[error("Expression is not assignable")]
    NotAssignable { span: Span },

    #[error("{keyword} outside of a loop")]
    MisplacedLoopControl { keyword: String, span: Span },

    #[error("Function {function} must return a value")]
    MissingReturnValue { function: String, span: Span },

    #[error("Function {function} does not return a value")]
    UnexpectedReturnValue { function: String, span: Span },

    #[error("Function {function} does not return a value on every path")]
    MissingReturnPath { function: String, span: Span },

    #[error("Unreachable code in function {function}")]
    UnreachableCode { function: String, span: Span },

    #[error("Cannot take the address of a temporary value")]
    NotAddressable { span: Span },

    // ==================== Input / Output ====================

    #[error("IO error: {0}")]
    Io(String),

    #[error("Malformed project description: {0}")]
    Json(String),

    // ==================== Internal ====================

    #[error("Internal compiler error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::DuplicateFunction { span, .. }
            | Self::DuplicateIdentifier { span, .. }
            | Self::NoMatchingOverload { span, .. }
            | Self::AmbiguousCall { span, .. }
            | Self::CommonFeatureAdoptionImpossible { span, .. }
            | Self::MixedVoidness { span, .. }
            | Self::UnresolvedGenericCall { span, .. }
            | Self::UndefinedVariable { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::UnknownField { span, .. }
            | Self::NotAStruct { span, .. }
            | Self::CannotDeref { span, .. }
            | Self::NotIndexable { span, .. }
            | Self::VoidValue { span, .. }
            | Self::AssignmentToConst { span, .. }
            | Self::NotAssignable { span }
            | Self::MisplacedLoopControl { span, .. }
            | Self::MissingReturnValue { span, .. }
            | Self::UnexpectedReturnValue { span, .. }
            | Self::MissingReturnPath { span, .. }
            | Self::UnreachableCode { span, .. }
            | Self::NotAddressable { span } => Some(*span),
            Self::DuplicateType { .. }
            | Self::DuplicateFile { .. }
            | Self::PackageTypeConflict { .. }
            | Self::UnknownType { .. }
            | Self::CyclicTypeAlias { .. }
            | Self::CyclicTypeDependency { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Internal(_) => None,
        }
    }

    /// Whether this error signals a compiler bug or inconsistent input
    /// rather than a problem in the user's program
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateType { .. } => "E0101",
            Self::DuplicateFunction { .. } => "E0102",
            Self::DuplicateFile { .. } => "E0103",
            Self::DuplicateIdentifier { .. } => "E0104",
            Self::PackageTypeConflict { .. } => "E0105",
            Self::UnknownType { .. } => "E0201",
            Self::CyclicTypeAlias { .. } => "E0202",
            Self::NoMatchingOverload { .. } => "E0203",
            Self::AmbiguousCall { .. } => "E0204",
            Self::CommonFeatureAdoptionImpossible { .. } => "E0205",
            Self::MixedVoidness { .. } => "E0206",
            Self::UnresolvedGenericCall { .. } => "E0207",
            Self::CyclicTypeDependency { .. } => "E0208",
            Self::UndefinedVariable { .. } => "E0301",
            Self::TypeMismatch { .. } => "E0302",
            Self::UnknownField { .. } => "E0303",
            Self::NotAStruct { .. } => "E0304",
            Self::CannotDeref { .. } => "E0305",
            Self::NotIndexable { .. } => "E0306",
            Self::VoidValue { .. } => "E0307",
            Self::AssignmentToConst { .. } => "E0308",
            Self::NotAssignable { .. } => "E0309",
            Self::MisplacedLoopControl { .. } => "E0310",
            Self::MissingReturnValue { .. } => "E0311",
            Self::UnexpectedReturnValue { .. } => "E0312",
            Self::MissingReturnPath { .. } => "E0313",
            Self::UnreachableCode { .. } => "E0314",
            Self::NotAddressable { .. } => "E0315",
            Self::Io(_) => "E0901",
            Self::Json(_) => "E0902",
            Self::Internal(_) => "E0999",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
