//! Package type conflict detection
//!
//! A package sees the types of every package reachable through imports.
//! Two reachable packages defining the same type pattern make references
//! to that name ambiguous, so the project is rejected up front.

use std::collections::{HashMap, HashSet, VecDeque};

use log::trace;

use crate::frontend::project::ProjectFileStructure;
use crate::types::TypeDefinition;
use crate::utils::{Error, Result};

/// `Name` or `Name<?,?>`, ignoring the defining package
pub fn type_pattern(def: &TypeDefinition) -> String {
    let arity = def.generics().len();
    if arity == 0 {
        def.name().to_string()
    } else {
        format!("{}<{}>", def.name(), vec!["?"; arity].join(","))
    }
}

pub struct PackageTypeConflictNavigator<'a> {
    project: &'a ProjectFileStructure,
    /// Package -> patterns it defines
    patterns: HashMap<&'a str, Vec<String>>,
}

impl<'a> PackageTypeConflictNavigator<'a> {
    pub fn new(project: &'a ProjectFileStructure) -> Self {
        let mut patterns: HashMap<&str, Vec<String>> = HashMap::new();
        for file in project.files() {
            let defined = patterns.entry(file.package_name.as_str()).or_default();
            defined.extend(file.type_definitions.iter().map(type_pattern));
        }
        Self { project, patterns }
    }

    /// Check every package of the project
    pub fn check_project(&self) -> Result<()> {
        for package in self.project.packages() {
            self.check_package(package)?;
        }
        Ok(())
    }

    pub fn check_package(&self, package: &str) -> Result<()> {
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for reached in self.reachable_packages(package) {
            for pattern in self.patterns.get(reached).into_iter().flatten() {
                match owners.get(pattern.as_str()) {
                    Some(&first) if first != reached => {
                        return Err(Error::PackageTypeConflict {
                            pattern: pattern.clone(),
                            package: package.to_string(),
                            first: first.to_string(),
                            second: reached.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        owners.insert(pattern.as_str(), reached);
                    }
                }
            }
        }
        Ok(())
    }

    /// Breadth-first walk over the import graph, starting with `package`
    pub fn reachable_packages<'p>(&'p self, package: &'p str) -> Vec<&'p str> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([package]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            trace!("package {} reaches {}", package, current);
            order.push(current);
            for file in self.project.files_of_package(current) {
                for import in &file.imports {
                    if !visited.contains(import.as_str()) {
                        queue.push_back(import.as_str());
                    }
                }
            }
        }
        order
    }
}
