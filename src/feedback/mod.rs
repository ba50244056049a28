//! Structured Feedback Module
//!
//! Machine-readable results of checking a project:
//! - JSON diagnostics with stable codes
//! - Project statistics

use serde::{Deserialize, Serialize};

use crate::sema::ProgramRepresentation;
use crate::utils::Error;

// ==================== Structured Error Report ====================

/// One diagnostic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error code (e.g., "E0302")
    pub code: String,

    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    pub location: Option<Location>,

    /// Suggested next step, when one is obvious from the error kind
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    /// Compiler bug or inconsistent front-end input
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub file_id: usize,
    pub start: usize,
    pub end: usize,
}

impl ErrorReport {
    pub fn from_error(error: &Error) -> Self {
        let location = error
            .span()
            .filter(|s| !s.is_dummy())
            .map(|s| Location { file_id: s.file_id, start: s.start, end: s.end });
        let severity = if error.is_internal() { Severity::Internal } else { Severity::Error };
        Self {
            code: error.code().to_string(),
            severity,
            message: error.to_string(),
            location,
            hint: hint_for(error).map(str::to_string),
        }
    }
}

fn hint_for(error: &Error) -> Option<&'static str> {
    match error {
        Error::AmbiguousCall { .. } => Some("pass explicit generic arguments or add a more specific overload"),
        Error::CommonFeatureAdoptionImpossible { .. } => {
            Some("every alternative of the union argument needs a matching overload")
        }
        Error::MixedVoidness { .. } => Some("make all overloads reached through the union return a value, or none"),
        Error::UnresolvedGenericCall { .. } => Some("call this function from a non-generic context"),
        Error::PackageTypeConflict { .. } => Some("rename the type in one of the two packages"),
        Error::CyclicTypeDependency { .. } => Some("store one of the types behind a pointer to break the cycle"),
        Error::NotAddressable { .. } => Some("store the value in a variable and take the address of the variable"),
        Error::Internal(_) => Some("this is a compiler bug"),
        _ => None,
    }
}

// ==================== Check Report ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckStats {
    pub file_count: usize,
    pub package_count: usize,
    pub type_count: usize,
    pub function_count: usize,
    pub main_function_count: usize,
}

impl CheckStats {
    pub fn from_program(program: &ProgramRepresentation) -> Self {
        let project = program.project();
        Self {
            file_count: project.files().len(),
            package_count: project.packages().count(),
            type_count: program.types().stored_keys().len(),
            function_count: program.functions().definitions().len(),
            main_function_count: program.main_functions().len(),
        }
    }
}

/// Result of checking one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub success: bool,
    pub project: String,
    pub diagnostics: Vec<ErrorReport>,
    pub stats: CheckStats,
}

impl CheckReport {
    pub fn new(project: impl Into<String>, errors: &[Error], stats: CheckStats) -> Self {
        Self {
            success: errors.is_empty(),
            project: project.into(),
            diagnostics: errors.iter().map(ErrorReport::from_error).collect(),
            stats,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
