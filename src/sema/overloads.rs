//! Function overloads register
//!
//! Groups function definitions into overload sets keyed by package, name,
//! generic arity and argument count. Generic definitions are also indexed
//! with generic arity 0 so calls that infer their generics find them.

use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

use crate::frontend::ast::{FunctionCall, FunctionDefinition};
use crate::frontend::project::ProjectFileStructure;
use crate::sema::type_registry::TypeDefinitionsRegister;
use crate::utils::{Error, Result};

/// `package::name<generics>(arguments)`
pub fn overload_set_id(package: &str, name: &str, generics: usize, arguments: usize) -> String {
    format!("{}::{}<{}>({})", package, name, generics, arguments)
}

pub struct FunctionOverloadsRegister {
    project: Rc<ProjectFileStructure>,
    overload_sets: HashMap<String, Vec<Rc<FunctionDefinition>>>,
    /// Every stored definition, in store order
    definitions: Vec<Rc<FunctionDefinition>>,
    main_functions: Vec<Rc<FunctionDefinition>>,
}

impl FunctionOverloadsRegister {
    pub fn new(project: Rc<ProjectFileStructure>) -> Self {
        Self {
            project,
            overload_sets: HashMap::new(),
            definitions: Vec::new(),
            main_functions: Vec::new(),
        }
    }

    /// Register every function definition of the project
    pub fn from_project(project: Rc<ProjectFileStructure>, types: &TypeDefinitionsRegister) -> Result<Self> {
        let mut register = Self::new(Rc::clone(&project));
        for file in project.files() {
            for def in &file.function_definitions {
                register.store(def.clone(), types)?;
            }
        }
        Ok(register)
    }

    pub fn store(&mut self, def: FunctionDefinition, types: &TypeDefinitionsRegister) -> Result<()> {
        let package = self.package_of(&def)?.to_string();
        let id = overload_set_id(&package, &def.name, def.generics.len(), def.arguments.len());

        let signature = canonical_arguments(&def, types)?;
        for existing in self.get_overload_set(&id) {
            if canonical_arguments(existing, types)? == signature {
                return Err(Error::DuplicateFunction {
                    name: def.name.clone(),
                    file: def.origin_file.clone(),
                    span: def.span,
                });
            }
        }

        let def = Rc::new(def);
        trace!("stored function {}", id);
        self.overload_sets.entry(id).or_default().push(Rc::clone(&def));
        if def.is_generic() {
            let unaware = overload_set_id(&package, &def.name, 0, def.arguments.len());
            self.overload_sets.entry(unaware).or_default().push(Rc::clone(&def));
        } else if def.name == "main" && def.arguments.is_empty() {
            self.main_functions.push(Rc::clone(&def));
        }
        self.definitions.push(def);
        Ok(())
    }

    fn package_of(&self, def: &FunctionDefinition) -> Result<&str> {
        self.project.package_of(&def.origin_file).ok_or_else(|| {
            Error::Internal(format!(
                "function {} comes from file {} which is not part of the project",
                def.name, def.origin_file
            ))
        })
    }

    /// Definitions of one overload set; empty if the id is unknown
    pub fn get_overload_set(&self, id: &str) -> &[Rc<FunctionDefinition>] {
        self.overload_sets.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Overload sets visible from a call site: the explicit package, or the
    /// caller's own package followed by the packages its file imports
    pub fn candidate_set_ids(&self, call: &FunctionCall) -> Vec<String> {
        let generics = call.instantiated_generics.len();
        let arguments = call.arguments.len();
        if let Some(prefix) = &call.package_prefix {
            return vec![overload_set_id(prefix, &call.name, generics, arguments)];
        }

        let mut packages: Vec<&str> = Vec::new();
        if let Some(own) = self.project.package_of(&call.origin_file) {
            packages.push(own);
        }
        for import in self.project.imports_of(&call.origin_file) {
            if !packages.contains(&import.as_str()) {
                packages.push(import);
            }
        }
        packages
            .into_iter()
            .map(|p| overload_set_id(p, &call.name, generics, arguments))
            .collect()
    }

    pub fn definitions(&self) -> &[Rc<FunctionDefinition>] {
        &self.definitions
    }

    /// Non-generic, argument-less `main` definitions
    pub fn main_functions(&self) -> &[Rc<FunctionDefinition>] {
        &self.main_functions
    }
}

/// Unknown argument types fall back to their written form; the function
/// validator reports them
fn canonical_arguments(def: &FunctionDefinition, types: &TypeDefinitionsRegister) -> Result<Vec<String>> {
    def.argument_types()
        .map(|t| match types.get_fully_qualified_name(t) {
            Err(Error::UnknownType { .. }) => Ok(t.to_string()),
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::project::FileRepresentation;
    use crate::sema::testing::*;
    use crate::types::TypeDefinition;
    use pretty_assertions::assert_eq;

    fn registers(files: Vec<FileRepresentation>) -> Result<(TypeDefinitionsRegister, FunctionOverloadsRegister)> {
        let project = project(files);
        let types = TypeDefinitionsRegister::from_project(Rc::clone(&project))?;
        let functions = FunctionOverloadsRegister::from_project(project, &types)?;
        Ok((types, functions))
    }

    #[test]
    fn test_generic_definitions_are_indexed_twice() {
        let file = main_file(
            vec![],
            vec![
                function("show", vec![int()], None),
                generic_function("show", &["T"], vec![template("T")], None),
            ],
        );
        let (_, functions) = registers(vec![file]).unwrap();
        assert_eq!(functions.get_overload_set("app::show<0>(1)").len(), 2);
        assert_eq!(functions.get_overload_set("app::show<1>(1)").len(), 1);
        assert!(functions.get_overload_set("app::show<0>(2)").is_empty());
    }

    #[test]
    fn test_duplicate_function_is_rejected() {
        let types: Vec<TypeDefinition> = vec![alias_def("Count", int())];
        let file = main_file(
            types,
            vec![function("f", vec![int()], None), function("f", vec![int()], Some(float()))],
        );
        let err = registers(vec![file]).err().unwrap();
        assert!(matches!(err, Error::DuplicateFunction { name, .. } if name == "f"));
    }

    #[test]
    fn test_unknown_argument_types_are_registered() {
        let file = main_file(
            vec![],
            vec![function("f", vec![custom("Ghost")], None), function("f", vec![int()], None)],
        );
        let (_, functions) = registers(vec![file]).unwrap();
        assert_eq!(functions.get_overload_set("app::f<0>(1)").len(), 2);

        let file = main_file(
            vec![],
            vec![function("f", vec![custom("Ghost")], None), function("f", vec![custom("Ghost")], None)],
        );
        assert!(matches!(registers(vec![file]), Err(Error::DuplicateFunction { .. })));
    }

    #[test]
    fn test_candidate_sets_follow_imports() {
        let mut main = main_file(vec![], vec![]);
        main.imports = vec!["io".to_string(), "math".to_string()];
        let (_, functions) = registers(vec![main]).unwrap();

        let mut c = call_with("print", vec![crate::frontend::ast::Expression::int(1)]);
        assert_eq!(
            functions.candidate_set_ids(&c),
            vec!["app::print<0>(1)", "io::print<0>(1)", "math::print<0>(1)"]
        );
        c.package_prefix = Some("io".to_string());
        c.instantiated_generics = vec![int()];
        assert_eq!(functions.candidate_set_ids(&c), vec!["io::print<1>(1)"]);
    }

    #[test]
    fn test_main_functions_are_tracked() {
        let file = main_file(
            vec![],
            vec![function("main", vec![], None), function("main", vec![int()], None)],
        );
        let (_, functions) = registers(vec![file]).unwrap();
        assert_eq!(functions.main_functions().len(), 1);
        assert_eq!(functions.definitions().len(), 2);
    }
}
