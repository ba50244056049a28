//! Type definitions register
//!
//! Stores every struct, union and alias under a canonical key and resolves
//! custom type references against them. Generic definitions are stored
//! once in template form and instantiated lazily; each instantiation is
//! memoized under its concrete key.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::{debug, trace};

use crate::frontend::project::ProjectFileStructure;
use crate::sema::generics::{GenericsInstantiationEngine, SubstitutionRules};
use crate::types::{CustomType, TypeDefinition, TypeSignature};
use crate::utils::{Error, Result};

/// Key of a stored definition: `package::Name` or `package::Name<N>` for generics
pub fn match_pattern(package: &str, name: &str, arity: usize) -> String {
    if arity == 0 {
        format!("{}::{}", package, name)
    } else {
        format!("{}::{}<{}>", package, name, arity)
    }
}

pub struct TypeDefinitionsRegister {
    project: Rc<ProjectFileStructure>,
    /// Stored definitions and memoized instantiations
    definitions: RefCell<HashMap<String, TypeDefinition>>,
    /// Keys of user-written definitions, in store order
    stored_keys: Vec<String>,
    instantiations: Cell<usize>,
}

impl TypeDefinitionsRegister {
    pub fn new(project: Rc<ProjectFileStructure>) -> Self {
        Self {
            project,
            definitions: RefCell::new(HashMap::new()),
            stored_keys: Vec::new(),
            instantiations: Cell::new(0),
        }
    }

    /// Register every type definition of the project
    pub fn from_project(project: Rc<ProjectFileStructure>) -> Result<Self> {
        let mut register = Self::new(Rc::clone(&project));
        for file in project.files() {
            for def in &file.type_definitions {
                register.store(def.clone())?;
            }
        }
        Ok(register)
    }

    pub fn store(&mut self, def: TypeDefinition) -> Result<()> {
        let package = self.project.package_of(def.origin_file()).ok_or_else(|| {
            Error::Internal(format!(
                "type {} comes from file {} which is not part of the project",
                def.name(),
                def.origin_file()
            ))
        })?;
        let key = match_pattern(package, def.name(), def.generics().len());
        let definitions = self.definitions.get_mut();
        if definitions.contains_key(&key) {
            return Err(Error::DuplicateType {
                name: def.name().to_string(),
                file: def.origin_file().to_string(),
            });
        }
        trace!("stored type {}", key);
        definitions.insert(key.clone(), def);
        self.stored_keys.push(key);
        Ok(())
    }

    /// Canonical keys of the user-written definitions
    pub fn stored_keys(&self) -> &[String] {
        &self.stored_keys
    }

    /// User-written definitions with their canonical keys, in store order
    pub fn stored_definitions(&self) -> Vec<(String, TypeDefinition)> {
        let definitions = self.definitions.borrow();
        self.stored_keys
            .iter()
            .filter_map(|key| definitions.get(key).map(|def| (key.clone(), def.clone())))
            .collect()
    }

    /// Number of generic instantiations performed so far
    pub fn instantiation_count(&self) -> usize {
        self.instantiations.get()
    }

    pub fn retrieve(&self, ty: &CustomType) -> Result<TypeDefinition> {
        self.locate(ty).map(|(_, def)| def)
    }

    /// Resolve a custom type to the package defining it and its definition
    pub fn locate(&self, ty: &CustomType) -> Result<(String, TypeDefinition)> {
        let arity = ty.type_parameters.len();
        let concrete_suffix = if arity == 0 {
            String::new()
        } else {
            let params = ty
                .type_parameters
                .iter()
                .map(|p| self.get_fully_qualified_name(p))
                .collect::<Result<Vec<_>>>()?;
            format!("<{}>", params.join(","))
        };

        for package in self.lookup_scopes(ty) {
            let concrete_key = format!("{}::{}{}", package, ty.name, concrete_suffix);
            if let Some(def) = self.definitions.borrow().get(&concrete_key) {
                return Ok((package, def.clone()));
            }
            if arity == 0 {
                continue;
            }

            let pattern = match_pattern(&package, &ty.name, arity);
            let generic = match self.definitions.borrow().get(&pattern) {
                Some(def) => def.clone(),
                None => continue,
            };
            let rules = SubstitutionRules::zip(generic.generics(), &ty.type_parameters);
            let instance = GenericsInstantiationEngine::new(&rules).instantiate_type_definition(&generic);
            self.instantiations.set(self.instantiations.get() + 1);
            debug!("instantiated type {}", concrete_key);
            self.definitions.borrow_mut().insert(concrete_key, instance.clone());
            return Ok((package, instance));
        }

        Err(Error::UnknownType {
            name: TypeSignature::Custom(ty.clone()).to_string(),
            file: ty.origin_file.clone(),
        })
    }

    /// Explicit prefix only, or the file's own package followed by its imports
    fn lookup_scopes(&self, ty: &CustomType) -> Vec<String> {
        if let Some(prefix) = &ty.package_prefix {
            return vec![prefix.clone()];
        }
        let mut scopes = Vec::new();
        if let Some(own) = self.project.package_of(&ty.origin_file) {
            scopes.push(own.to_string());
        }
        for import in self.project.imports_of(&ty.origin_file) {
            if !scopes.contains(import) {
                scopes.push(import.clone());
            }
        }
        scopes
    }

    /// Canonical name used for cache keys
    pub fn get_fully_qualified_name(&self, ty: &TypeSignature) -> Result<String> {
        Ok(match ty {
            TypeSignature::Primitive { name } | TypeSignature::Template { name } => name.clone(),
            TypeSignature::Pointer { pointed } => format!("#{}", self.get_fully_qualified_name(pointed)?),
            TypeSignature::Slice { element } => format!("${}", self.get_fully_qualified_name(element)?),
            TypeSignature::Array { length, element } => {
                format!("[{}]{}", length, self.get_fully_qualified_name(element)?)
            }
            TypeSignature::InlineUnion { alternatives } => alternatives
                .iter()
                .map(|a| self.get_fully_qualified_name(a))
                .collect::<Result<Vec<_>>>()?
                .join(" | "),
            TypeSignature::Custom(custom) => {
                let (package, _) = self.locate(custom)?;
                let mut name = format!("{}::{}", package, custom.name);
                if !custom.type_parameters.is_empty() {
                    let params = custom
                        .type_parameters
                        .iter()
                        .map(|p| self.get_fully_qualified_name(p))
                        .collect::<Result<Vec<_>>>()?;
                    name.push_str(&format!("<{}>", params.join(",")));
                }
                name
            }
        })
    }

    /// Follow alias chains down to the first non-alias type
    pub fn unalias(&self, ty: &TypeSignature) -> Result<TypeSignature> {
        let mut current = ty.clone();
        let mut seen: Vec<String> = Vec::new();
        loop {
            let TypeSignature::Custom(custom) = &current else {
                return Ok(current);
            };
            let TypeDefinition::Alias(alias) = self.retrieve(custom)? else {
                return Ok(current);
            };
            let key = self.get_fully_qualified_name(&current)?;
            if seen.contains(&key) {
                return Err(Error::CyclicTypeAlias { name: alias.name });
            }
            seen.push(key);
            current = alias.aliased;
        }
    }

    /// Alternatives of a union, with nested unions flattened.
    /// Empty if the type is not a union.
    pub fn fetch_union_alternatives(&self, ty: &TypeSignature) -> Result<Vec<TypeSignature>> {
        let mut alternatives = Vec::new();
        let mut names = HashSet::new();
        let mut visiting = Vec::new();
        self.collect_alternatives(ty, &mut alternatives, &mut names, &mut visiting)?;
        Ok(alternatives)
    }

    fn collect_alternatives(
        &self,
        ty: &TypeSignature,
        alternatives: &mut Vec<TypeSignature>,
        names: &mut HashSet<String>,
        visiting: &mut Vec<String>,
    ) -> Result<()> {
        let Some(direct) = self.direct_alternatives(ty)? else {
            return Ok(());
        };
        let key = self.get_fully_qualified_name(ty)?;
        if visiting.contains(&key) {
            return Ok(());
        }
        visiting.push(key);
        for alternative in direct {
            if self.direct_alternatives(&alternative)?.is_some() {
                self.collect_alternatives(&alternative, alternatives, names, visiting)?;
            } else if names.insert(self.get_fully_qualified_name(&alternative)?) {
                alternatives.push(alternative);
            }
        }
        visiting.pop();
        Ok(())
    }

    fn direct_alternatives(&self, ty: &TypeSignature) -> Result<Option<Vec<TypeSignature>>> {
        match self.unalias(ty)? {
            TypeSignature::InlineUnion { alternatives } => Ok(Some(alternatives)),
            TypeSignature::Custom(custom) => match self.retrieve(&custom)? {
                TypeDefinition::Union(union) => Ok(Some(union.alternatives)),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    pub fn is_union(&self, ty: &TypeSignature) -> Result<bool> {
        Ok(!self.fetch_union_alternatives(ty)?.is_empty())
    }

    /// Fail with `UnknownType` if any custom type inside `ty` cannot be resolved
    pub fn verify_that_the_type_exists(&self, ty: &TypeSignature) -> Result<()> {
        match ty {
            TypeSignature::Primitive { .. } | TypeSignature::Template { .. } => Ok(()),
            TypeSignature::Pointer { pointed } => self.verify_that_the_type_exists(pointed),
            TypeSignature::Array { element, .. } | TypeSignature::Slice { element } => {
                self.verify_that_the_type_exists(element)
            }
            TypeSignature::InlineUnion { alternatives } => alternatives
                .iter()
                .try_for_each(|a| self.verify_that_the_type_exists(a)),
            TypeSignature::Custom(custom) => {
                custom
                    .type_parameters
                    .iter()
                    .try_for_each(|p| self.verify_that_the_type_exists(p))?;
                self.retrieve(custom).map(|_| ())
            }
        }
    }
}
