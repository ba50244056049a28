//! Assignment type checker
//!
//! Decides whether a value of a source type may flow into a slot of a
//! destination type. While checking, template parameters met in the
//! destination are bound to the source types they receive; the
//! accumulated bindings are the inferred generic arguments.
//!
//! Lenient mode allows widening: union membership, string conversions and
//! merging several bindings of one parameter into an inline union. Strict
//! mode requires both directions to hold and never widens.

use std::collections::HashSet;

use log::trace;

use crate::sema::generics::SubstitutionRules;
use crate::sema::type_registry::TypeDefinitionsRegister;
use crate::types::{CustomType, TypeSignature, CHAR, RAW_STRING, STRING};
use crate::utils::Result;

/// How permissive a compatibility check is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Lenient,
    Strict,
}

pub struct AssignmentTypeChecker<'a> {
    types: &'a TypeDefinitionsRegister,
    rules: SubstitutionRules,
    /// Parameters bound by a strict check; these never widen afterwards
    locked: HashSet<String>,
}

impl<'a> AssignmentTypeChecker<'a> {
    pub fn new(types: &'a TypeDefinitionsRegister) -> Self {
        Self::with_rules(types, SubstitutionRules::new())
    }

    pub fn with_rules(types: &'a TypeDefinitionsRegister, rules: SubstitutionRules) -> Self {
        Self { types, rules, locked: HashSet::new() }
    }

    pub fn rules(&self) -> &SubstitutionRules {
        &self.rules
    }

    pub fn into_rules(self) -> SubstitutionRules {
        self.rules
    }

    /// Lenient check of `source -> dest`
    pub fn validate_assignment(&mut self, source: &TypeSignature, dest: &TypeSignature) -> Result<bool> {
        self.validate(source, dest, ValidationMode::Lenient)
    }

    /// Mutual compatibility; only template bindings may differ
    pub fn validate_assignment_very_strictly(&mut self, source: &TypeSignature, dest: &TypeSignature) -> Result<bool> {
        self.validate(source, dest, ValidationMode::Strict)
    }

    pub fn validate(&mut self, source: &TypeSignature, dest: &TypeSignature, mode: ValidationMode) -> Result<bool> {
        let source = self.types.unalias(source)?;
        let dest = self.types.unalias(dest)?;

        if mode == ValidationMode::Lenient {
            return self.dispatch(&source, &dest, mode);
        }
        if !self.dispatch(&source, &dest, mode)? {
            return Ok(false);
        }
        // The reverse direction runs on a copy so it cannot leak bindings back.
        let mut reverse = self.snapshot();
        if !reverse.dispatch(&dest, &source, mode)? {
            return Ok(false);
        }
        if let (TypeSignature::Primitive { name: a }, TypeSignature::Primitive { name: b }) = (&source, &dest) {
            return Ok(a == b);
        }
        Ok(true)
    }

    fn snapshot(&self) -> Self {
        Self {
            types: self.types,
            rules: self.rules.clone(),
            locked: self.locked.clone(),
        }
    }

    /// Run a check, keeping its bindings only if it succeeds
    fn attempt(&mut self, source: &TypeSignature, dest: &TypeSignature, mode: ValidationMode) -> Result<bool> {
        let mut trial = self.snapshot();
        if trial.validate(source, dest, mode)? {
            self.rules = trial.rules;
            self.locked = trial.locked;
            return Ok(true);
        }
        Ok(false)
    }

    fn dispatch(&mut self, source: &TypeSignature, dest: &TypeSignature, mode: ValidationMode) -> Result<bool> {
        // A bound template in source position stands for its binding
        if let TypeSignature::Template { name } = source {
            if let Some(bound) = self.rules.find(name).cloned() {
                if !matches!(dest, TypeSignature::Template { name: d } if d == name) {
                    return self.validate(&bound, dest, mode);
                }
            }
        }

        match dest {
            TypeSignature::Template { name } => self.bind_template(source, name, mode),
            TypeSignature::Custom(custom) => {
                if self.name_equivalent(source, custom)? {
                    return Ok(true);
                }
                self.structurally_equivalent(source, dest, mode)
            }
            TypeSignature::InlineUnion { .. } => self.structurally_equivalent(source, dest, mode),
            TypeSignature::Pointer { pointed } => match source {
                TypeSignature::Pointer { pointed: source_pointed } => {
                    self.validate(source_pointed, pointed, ValidationMode::Strict)
                }
                _ => Ok(false),
            },
            TypeSignature::Array { length, element } => match source {
                TypeSignature::Array { length: source_length, element: source_element } if source_length == length => {
                    self.validate(source_element, element, mode)
                }
                _ => Ok(false),
            },
            TypeSignature::Slice { element } => match source {
                TypeSignature::Slice { element: source_element } => {
                    self.validate(source_element, element, ValidationMode::Strict)
                }
                TypeSignature::Pointer { pointed } => match self.types.unalias(pointed)? {
                    TypeSignature::Array { element: source_element, .. } => {
                        self.validate(&source_element, element, ValidationMode::Strict)
                    }
                    _ => Ok(false),
                },
                _ => Ok(false),
            },
            TypeSignature::Primitive { name } if name == STRING || name == RAW_STRING => {
                self.string_compatible(source, name)
            }
            TypeSignature::Primitive { name } => Ok(source.is_primitive_named(name)),
        }
    }

    fn bind_template(&mut self, source: &TypeSignature, name: &str, mode: ValidationMode) -> Result<bool> {
        if matches!(source, TypeSignature::Template { name: s } if s == name) {
            return Ok(true);
        }
        let already_locked = self.locked.contains(name);
        if mode == ValidationMode::Strict {
            self.locked.insert(name.to_string());
        }

        let Some(bound) = self.rules.find(name).cloned() else {
            trace!("binding {} to {}", name, source);
            self.rules.push(name, source.clone());
            return Ok(true);
        };

        if mode == ValidationMode::Strict || already_locked {
            return self.validate(source, &bound, ValidationMode::Strict);
        }
        if self.snapshot().validate(source, &bound, ValidationMode::Lenient)? {
            return Ok(true);
        }

        let widened = if self.snapshot().validate(&bound, source, ValidationMode::Lenient)? {
            source.clone()
        } else {
            Self::merge_into_union(&bound, source)
        };
        trace!("widening {} from {} to {}", name, bound, widened);
        if let Some(replacement) = self.rules.find_mut(name) {
            *replacement = widened;
        }
        Ok(true)
    }

    /// Append `source` to an inline union binding, or pair both types in a new one
    fn merge_into_union(bound: &TypeSignature, source: &TypeSignature) -> TypeSignature {
        match bound {
            TypeSignature::InlineUnion { alternatives } => {
                let mut alternatives = alternatives.clone();
                alternatives.push(source.clone());
                TypeSignature::inline_union(alternatives)
            }
            _ => TypeSignature::inline_union(vec![bound.clone(), source.clone()]),
        }
    }

    /// Same name, same defining package, same arity, invariant type arguments
    fn name_equivalent(&mut self, source: &TypeSignature, dest: &CustomType) -> Result<bool> {
        let TypeSignature::Custom(source) = source else {
            return Ok(false);
        };
        if source.name != dest.name || source.type_parameters.len() != dest.type_parameters.len() {
            return Ok(false);
        }
        let (source_package, _) = self.types.locate(source)?;
        let (dest_package, _) = self.types.locate(dest)?;
        if source_package != dest_package {
            return Ok(false);
        }

        let mut trial = self.snapshot();
        for (s, d) in source.type_parameters.iter().zip(&dest.type_parameters) {
            if !trial.validate(s, d, ValidationMode::Strict)? {
                return Ok(false);
            }
        }
        self.rules = trial.rules;
        self.locked = trial.locked;
        Ok(true)
    }

    /// Union membership: the source (or each of its alternatives) must be
    /// accepted by some alternative of the destination union
    fn structurally_equivalent(&mut self, source: &TypeSignature, dest: &TypeSignature, mode: ValidationMode) -> Result<bool> {
        let dest_alternatives = self.types.fetch_union_alternatives(dest)?;
        if dest_alternatives.is_empty() {
            return Ok(false);
        }
        for alternative in &dest_alternatives {
            if self.attempt(source, alternative, mode)? {
                return Ok(true);
            }
        }

        let source_alternatives = self.types.fetch_union_alternatives(source)?;
        if source_alternatives.is_empty() {
            return Ok(false);
        }
        let mut trial = self.snapshot();
        for source_alternative in &source_alternatives {
            let mut accepted = false;
            for alternative in &dest_alternatives {
                if trial.attempt(source_alternative, alternative, mode)? {
                    accepted = true;
                    break;
                }
            }
            if !accepted {
                return Ok(false);
            }
        }
        self.rules = trial.rules;
        self.locked = trial.locked;
        Ok(true)
    }

    fn string_compatible(&self, source: &TypeSignature, dest_name: &str) -> Result<bool> {
        match source {
            TypeSignature::Primitive { name } if name == STRING || name == RAW_STRING => {
                Ok(name == STRING || dest_name == RAW_STRING)
            }
            TypeSignature::Slice { element } => Ok(self.types.unalias(element)?.is_primitive_named(CHAR)),
            TypeSignature::Pointer { pointed } => match self.types.unalias(pointed)? {
                TypeSignature::Array { element, .. } => Ok(self.types.unalias(&element)?.is_primitive_named(CHAR)),
                _ => Ok(false),
            },
            _ => Ok(false),
        }
    }
}
