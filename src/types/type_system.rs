//! Type System for Meridian
//!
//! `TypeSignature` is the closed set of type shapes a program can mention.
//! Custom types are resolved against the type registry; everything else is
//! structural.

use std::fmt;
use serde::{Deserialize, Serialize};

// ==================== Primitive Names ====================

pub const INT: &str = "Int";
pub const FLOAT: &str = "Float";
pub const BOOL: &str = "Bool";
pub const CHAR: &str = "Char";
pub const STRING: &str = "String";
pub const RAW_STRING: &str = "RawString";

/// Every primitive the language knows about
pub const PRIMITIVE_NAMES: [&str; 6] = [INT, FLOAT, BOOL, CHAR, STRING, RAW_STRING];

// ==================== Type Signature ====================

/// A reference to a user-defined type (struct, union or alias)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomType {
    pub name: String,
    /// Explicit `package::` qualifier, if the source wrote one
    #[serde(default)]
    pub package_prefix: Option<String>,
    #[serde(default)]
    pub type_parameters: Vec<TypeSignature>,
    /// File the reference was written in; decides the lookup scopes
    #[serde(default)]
    pub origin_file: String,
}

impl CustomType {
    pub fn new(name: impl Into<String>, origin_file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package_prefix: None,
            type_parameters: Vec::new(),
            origin_file: origin_file.into(),
        }
    }

    pub fn with_type_parameters(mut self, type_parameters: Vec<TypeSignature>) -> Self {
        self.type_parameters = type_parameters;
        self
    }

    pub fn with_package_prefix(mut self, package: impl Into<String>) -> Self {
        self.package_prefix = Some(package.into());
        self
    }
}

/// Type signature as written in the program
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TypeSignature {
    Primitive { name: String },
    Custom(CustomType),
    Pointer { pointed: Box<TypeSignature> },
    Array { length: usize, element: Box<TypeSignature> },
    Slice { element: Box<TypeSignature> },
    /// Unbound generic parameter (e.g. T in `fn id<T>(x: T)`)
    Template { name: String },
    /// Anonymous sum type (`A | B`)
    InlineUnion { alternatives: Vec<TypeSignature> },
}

impl TypeSignature {
    pub fn primitive(name: &str) -> Self {
        Self::Primitive { name: name.to_string() }
    }

    pub fn template(name: &str) -> Self {
        Self::Template { name: name.to_string() }
    }

    pub fn pointer(pointed: TypeSignature) -> Self {
        Self::Pointer { pointed: Box::new(pointed) }
    }

    pub fn array(length: usize, element: TypeSignature) -> Self {
        Self::Array { length, element: Box::new(element) }
    }

    pub fn slice(element: TypeSignature) -> Self {
        Self::Slice { element: Box::new(element) }
    }

    pub fn custom(name: &str, origin_file: &str) -> Self {
        Self::Custom(CustomType::new(name, origin_file))
    }

    pub fn inline_union(alternatives: Vec<TypeSignature>) -> Self {
        Self::InlineUnion { alternatives }
    }

    /// Check if this is the primitive with the given name
    pub fn is_primitive_named(&self, expected: &str) -> bool {
        matches!(self, Self::Primitive { name } if name == expected)
    }

    /// Check if this is `String` or `RawString`
    pub fn is_string_kind(&self) -> bool {
        self.is_primitive_named(STRING) || self.is_primitive_named(RAW_STRING)
    }

    /// Check if this is `Int` or `Float`
    pub fn is_numeric(&self) -> bool {
        self.is_primitive_named(INT) || self.is_primitive_named(FLOAT)
    }

    /// Check if any template parameter occurs inside this signature
    pub fn is_generic(&self) -> bool {
        match self {
            Self::Template { .. } => true,
            Self::Primitive { .. } => false,
            Self::Custom(custom) => custom.type_parameters.iter().any(Self::is_generic),
            Self::Pointer { pointed } => pointed.is_generic(),
            Self::Array { element, .. } | Self::Slice { element } => element.is_generic(),
            Self::InlineUnion { alternatives } => alternatives.iter().any(Self::is_generic),
        }
    }

    /// Fill in the origin file of every custom type that lacks one
    pub fn assign_origin(&mut self, file: &str) {
        match self {
            Self::Custom(custom) => {
                if custom.origin_file.is_empty() {
                    custom.origin_file = file.to_string();
                }
                for param in &mut custom.type_parameters {
                    param.assign_origin(file);
                }
            }
            Self::Pointer { pointed } => pointed.assign_origin(file),
            Self::Array { element, .. } | Self::Slice { element } => element.assign_origin(file),
            Self::InlineUnion { alternatives } => {
                for alternative in alternatives {
                    alternative.assign_origin(file);
                }
            }
            Self::Primitive { .. } | Self::Template { .. } => {}
        }
    }
}

/// Source-level rendering, used in diagnostics
impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive { name } | Self::Template { name } => write!(f, "{}", name),
            Self::Custom(custom) => {
                if let Some(package) = &custom.package_prefix {
                    write!(f, "{}::", package)?;
                }
                write!(f, "{}", custom.name)?;
                if !custom.type_parameters.is_empty() {
                    write!(f, "<{}>", join(&custom.type_parameters, ", "))?;
                }
                Ok(())
            }
            Self::Pointer { pointed } => write!(f, "#{}", pointed),
            Self::Array { length, element } => write!(f, "[{}]{}", length, element),
            Self::Slice { element } => write!(f, "${}", element),
            Self::InlineUnion { alternatives } => write!(f, "{}", join(alternatives, " | ")),
        }
    }
}

/// Render a list of types with a separator
pub fn join(types: &[TypeSignature], separator: &str) -> String {
    types.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(separator)
}
