//! Scope context for function bodies
//!
//! Tracks local objects (arguments, variables, constants) in nested
//! scopes. An identifier may not be redeclared while an object of the same
//! name is visible.

use std::collections::HashMap;

use crate::frontend::ast::FunctionDefinition;
use crate::types::TypeSignature;
use crate::utils::{Error, Result, Span};

/// Unique identifier for a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// A named value living in a function body
#[derive(Debug, Clone, PartialEq)]
pub struct LocalObject {
    pub id: usize,
    pub identifier: String,
    pub object_type: TypeSignature,
    pub is_const: bool,
    pub is_argument: bool,
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    objects: HashMap<String, LocalObject>,
}

#[derive(Debug)]
pub struct ScopeContext {
    scopes: Vec<Scope>,
    current: ScopeId,
    next_object_id: usize,
}

impl ScopeContext {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope { parent: None, objects: HashMap::new() }],
            current: ScopeId(0),
            next_object_id: 0,
        }
    }

    /// Root scope holding the function's arguments
    pub fn from_function(function: &FunctionDefinition) -> Result<Self> {
        let mut context = Self::new();
        for argument in &function.arguments {
            context.add_object(&argument.name, argument.argument_type.clone(), false, true, function.span)?;
        }
        Ok(context)
    }

    pub fn enter_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope { parent: Some(self.current), objects: HashMap::new() });
        self.current = id;
        id
    }

    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current.0].parent {
            self.current = parent;
        }
    }

    pub fn add_object(
        &mut self,
        identifier: &str,
        object_type: TypeSignature,
        is_const: bool,
        is_argument: bool,
        span: Span,
    ) -> Result<()> {
        if self.lookup(identifier).is_some() {
            return Err(Error::DuplicateIdentifier { name: identifier.to_string(), span });
        }
        let object = LocalObject {
            id: self.next_object_id,
            identifier: identifier.to_string(),
            object_type,
            is_const,
            is_argument,
        };
        self.next_object_id += 1;
        self.scopes[self.current.0].objects.insert(identifier.to_string(), object);
        Ok(())
    }

    /// Look up an object, searching from the current scope upward
    pub fn lookup(&self, identifier: &str) -> Option<&LocalObject> {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            if let Some(object) = self.scopes[id.0].objects.get(identifier) {
                return Some(object);
            }
            scope_id = self.scopes[id.0].parent;
        }
        None
    }
}

impl Default for ScopeContext {
    fn default() -> Self {
        Self::new()
    }
}
