//! Project file structure
//!
//! Indexes the parsed files of a project by filename and by package.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::frontend::ast::FunctionDefinition;
use crate::types::TypeDefinition;
use crate::utils::{Error, Result};

/// One parsed source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRepresentation {
    pub filename: String,
    pub package_name: String,
    /// Packages imported by this file
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub type_definitions: Vec<TypeDefinition>,
    #[serde(default)]
    pub function_definitions: Vec<FunctionDefinition>,
}

impl FileRepresentation {
    #[cfg(test)]
    pub fn new(filename: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            package_name: package_name.into(),
            imports: Vec::new(),
            type_definitions: Vec::new(),
            function_definitions: Vec::new(),
        }
    }
}

/// All files of a project, grouped by package
#[derive(Debug, Clone, Default)]
pub struct ProjectFileStructure {
    files: Vec<FileRepresentation>,
    /// Filename -> position in `files`
    file_index: HashMap<String, usize>,
    /// Package name -> positions in `files`, in input order
    packages: HashMap<String, Vec<usize>>,
    /// Package names in order of first appearance
    package_order: Vec<String>,
}

impl ProjectFileStructure {
    /// Build the structure, stamping each file's name onto everything it defines
    pub fn new(files: Vec<FileRepresentation>) -> Result<Self> {
        let mut project = Self::default();
        for mut file in files {
            if project.file_index.contains_key(&file.filename) {
                return Err(Error::DuplicateFile { filename: file.filename });
            }
            let filename = file.filename.clone();
            for def in &mut file.type_definitions {
                def.assign_origin(&filename);
            }
            for def in &mut file.function_definitions {
                def.assign_origin(&filename);
            }

            let position = project.files.len();
            if !project.packages.contains_key(&file.package_name) {
                project.package_order.push(file.package_name.clone());
            }
            project.packages.entry(file.package_name.clone()).or_default().push(position);
            project.file_index.insert(filename, position);
            project.files.push(file);
        }
        debug!(
            "project loaded: {} files in {} packages",
            project.files.len(),
            project.package_order.len()
        );
        Ok(project)
    }

    /// Parse a JSON array of files
    pub fn from_json(source: &str) -> Result<Self> {
        let files: Vec<FileRepresentation> = serde_json::from_str(source)?;
        Self::new(files)
    }

    /// Read and parse a JSON project description from disk
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    pub fn get_file(&self, filename: &str) -> Option<&FileRepresentation> {
        self.file_index.get(filename).map(|&i| &self.files[i])
    }

    pub fn package_of(&self, filename: &str) -> Option<&str> {
        self.get_file(filename).map(|f| f.package_name.as_str())
    }

    pub fn imports_of(&self, filename: &str) -> &[String] {
        self.get_file(filename).map(|f| f.imports.as_slice()).unwrap_or(&[])
    }

    pub fn files_of_package(&self, package: &str) -> impl Iterator<Item = &FileRepresentation> {
        self.packages
            .get(package)
            .into_iter()
            .flatten()
            .map(move |&i| &self.files[i])
    }

    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.package_order.iter().map(String::as_str)
    }

    pub fn files(&self) -> &[FileRepresentation] {
        &self.files
    }
}
