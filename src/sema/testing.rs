//! Fixtures shared by the semantic analysis tests

use std::rc::Rc;

use crate::frontend::ast::{Argument, Expression, FunctionCall, FunctionDefinition};
use crate::frontend::project::{FileRepresentation, ProjectFileStructure};
use crate::sema::overloads::FunctionOverloadsRegister;
use crate::sema::resolution::{OverloadingResolutionEngine, ResolutionCaches};
use crate::sema::type_registry::TypeDefinitionsRegister;
use crate::types::*;
use crate::utils::Span;

pub const MAIN_FILE: &str = "main.mer";

pub fn int() -> TypeSignature {
    TypeSignature::primitive(INT)
}

pub fn float() -> TypeSignature {
    TypeSignature::primitive(FLOAT)
}

pub fn boolean() -> TypeSignature {
    TypeSignature::primitive(BOOL)
}

pub fn character() -> TypeSignature {
    TypeSignature::primitive(CHAR)
}

pub fn string() -> TypeSignature {
    TypeSignature::primitive(STRING)
}

pub fn raw_string() -> TypeSignature {
    TypeSignature::primitive(RAW_STRING)
}

pub fn template(name: &str) -> TypeSignature {
    TypeSignature::template(name)
}

/// Custom type referenced from the main file
pub fn custom(name: &str) -> TypeSignature {
    TypeSignature::custom(name, MAIN_FILE)
}

pub fn generic_custom(name: &str, params: Vec<TypeSignature>) -> TypeSignature {
    TypeSignature::Custom(CustomType::new(name, MAIN_FILE).with_type_parameters(params))
}

pub fn union_of(alternatives: Vec<TypeSignature>) -> TypeSignature {
    TypeSignature::inline_union(alternatives)
}

pub fn struct_def(name: &str, fields: Vec<(&str, TypeSignature)>) -> TypeDefinition {
    generic_struct(name, &[], fields)
}

pub fn generic_struct(name: &str, generics: &[&str], fields: Vec<(&str, TypeSignature)>) -> TypeDefinition {
    TypeDefinition::Struct(StructDefinition {
        name: name.to_string(),
        fields: fields
            .into_iter()
            .map(|(n, t)| Field { name: n.to_string(), field_type: t })
            .collect(),
        generics: generics.iter().map(|g| g.to_string()).collect(),
        origin_file: String::new(),
    })
}

pub fn union_def(name: &str, alternatives: Vec<TypeSignature>) -> TypeDefinition {
    TypeDefinition::Union(UnionDefinition {
        name: name.to_string(),
        alternatives,
        generics: Vec::new(),
        origin_file: String::new(),
    })
}

pub fn alias_def(name: &str, aliased: TypeSignature) -> TypeDefinition {
    TypeDefinition::Alias(TypeAlias {
        name: name.to_string(),
        aliased,
        generics: Vec::new(),
        origin_file: String::new(),
    })
}

pub fn function(name: &str, args: Vec<TypeSignature>, ret: Option<TypeSignature>) -> FunctionDefinition {
    generic_function(name, &[], args, ret)
}

pub fn generic_function(
    name: &str,
    generics: &[&str],
    args: Vec<TypeSignature>,
    ret: Option<TypeSignature>,
) -> FunctionDefinition {
    FunctionDefinition {
        name: name.to_string(),
        arguments: args
            .into_iter()
            .enumerate()
            .map(|(i, t)| Argument { name: format!("arg{}", i), argument_type: t })
            .collect(),
        return_type: ret,
        generics: generics.iter().map(|g| g.to_string()).collect(),
        body: Vec::new(),
        origin_file: String::new(),
        span: Span::dummy(),
    }
}

/// Call written in the main file
pub fn call(name: &str) -> FunctionCall {
    FunctionCall::new(name, MAIN_FILE)
}

pub fn call_with(name: &str, arguments: Vec<Expression>) -> FunctionCall {
    FunctionCall { arguments, ..call(name) }
}

/// Single-file `app` package holding the given definitions
pub fn main_file(types: Vec<TypeDefinition>, functions: Vec<FunctionDefinition>) -> FileRepresentation {
    FileRepresentation {
        type_definitions: types,
        function_definitions: functions,
        ..FileRepresentation::new(MAIN_FILE, "app")
    }
}

pub fn project(files: Vec<FileRepresentation>) -> Rc<ProjectFileStructure> {
    Rc::new(ProjectFileStructure::new(files).expect("valid test project"))
}

/// Registers and caches built from a set of files
pub struct Registers {
    pub types: TypeDefinitionsRegister,
    pub functions: FunctionOverloadsRegister,
    pub caches: ResolutionCaches,
}

impl Registers {
    pub fn new(files: Vec<FileRepresentation>) -> Self {
        let project = project(files);
        let types = TypeDefinitionsRegister::from_project(Rc::clone(&project)).expect("valid test types");
        let functions = FunctionOverloadsRegister::from_project(project, &types).expect("valid test functions");
        Self { types, functions, caches: ResolutionCaches::new() }
    }

    pub fn engine(&self) -> OverloadingResolutionEngine<'_> {
        OverloadingResolutionEngine::new(&self.types, &self.functions, &self.caches)
    }
}
