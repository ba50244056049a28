//! Type definitions: structs, unions and aliases

use serde::{Deserialize, Serialize};
use super::TypeSignature;

/// Struct field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: TypeSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDefinition {
    pub name: String,
    pub fields: Vec<Field>,
    #[serde(default)]
    pub generics: Vec<String>,
    #[serde(default)]
    pub origin_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionDefinition {
    pub name: String,
    pub alternatives: Vec<TypeSignature>,
    #[serde(default)]
    pub generics: Vec<String>,
    #[serde(default)]
    pub origin_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAlias {
    pub name: String,
    pub aliased: TypeSignature,
    #[serde(default)]
    pub generics: Vec<String>,
    #[serde(default)]
    pub origin_file: String,
}

/// A named type definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TypeDefinition {
    Struct(StructDefinition),
    Union(UnionDefinition),
    Alias(TypeAlias),
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            Self::Struct(def) => &def.name,
            Self::Union(def) => &def.name,
            Self::Alias(def) => &def.name,
        }
    }

    pub fn generics(&self) -> &[String] {
        match self {
            Self::Struct(def) => &def.generics,
            Self::Union(def) => &def.generics,
            Self::Alias(def) => &def.generics,
        }
    }

    pub fn origin_file(&self) -> &str {
        match self {
            Self::Struct(def) => &def.origin_file,
            Self::Union(def) => &def.origin_file,
            Self::Alias(def) => &def.origin_file,
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.generics().is_empty()
    }

    /// Set the origin file of the definition and of every custom type it mentions
    pub fn assign_origin(&mut self, file: &str) {
        let (origin, signatures): (&mut String, Vec<&mut TypeSignature>) = match self {
            Self::Struct(def) => (
                &mut def.origin_file,
                def.fields.iter_mut().map(|f| &mut f.field_type).collect(),
            ),
            Self::Union(def) => (&mut def.origin_file, def.alternatives.iter_mut().collect()),
            Self::Alias(def) => (&mut def.origin_file, vec![&mut def.aliased]),
        };
        if origin.is_empty() {
            *origin = file.to_string();
        }
        for signature in signatures {
            signature.assign_origin(file);
        }
    }
}
