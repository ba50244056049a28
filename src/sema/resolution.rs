//! Overloading resolution engine
//!
//! Picks the most specific function definition applicable to a call,
//! instantiating it when its generics were bound, and memoizes the result
//! per call site and argument types.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, trace};

use crate::frontend::ast::{FunctionCall, FunctionDefinition};
use crate::sema::adoption::CommonFeatureAdoptionPlanDescriptor;
use crate::sema::assignment::AssignmentTypeChecker;
use crate::sema::generics::{GenericsInstantiationEngine, SubstitutionRules};
use crate::sema::overloads::FunctionOverloadsRegister;
use crate::sema::specificity::{FunctionSpecificityDescriptor, SpecificityComparison};
use crate::sema::type_registry::TypeDefinitionsRegister;
use crate::types::{join, TypeSignature};
use crate::utils::{Error, Result};

/// Memoized answers shared by every resolution in one compilation
#[derive(Debug, Default)]
pub struct ResolutionCaches {
    /// Call key -> resolved definition
    pub(crate) calls: RefCell<HashMap<String, Rc<FunctionDefinition>>>,
    /// Instantiated function key -> definition
    pub(crate) instances: RefCell<HashMap<String, Rc<FunctionDefinition>>>,
    /// Call key -> common-feature adoption plan
    pub(crate) plans: RefCell<HashMap<String, Rc<CommonFeatureAdoptionPlanDescriptor>>>,
}

impl ResolutionCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.borrow().len()
    }
}

/// `scope::name<generics>(arg;arg;)` where scope is the explicit package or the calling file
pub fn call_cache_key(types: &TypeDefinitionsRegister, call: &FunctionCall, arg_types: &[TypeSignature]) -> Result<String> {
    let scope = call.package_prefix.as_deref().unwrap_or(&call.origin_file);
    let generics = call
        .instantiated_generics
        .iter()
        .map(|g| types.get_fully_qualified_name(g))
        .collect::<Result<Vec<_>>>()?;
    let mut key = format!("{}::{}<{}>(", scope, call.name, generics.join(","));
    for arg in arg_types {
        key.push_str(&types.get_fully_qualified_name(arg)?);
        key.push(';');
    }
    key.push(')');
    Ok(key)
}

pub struct OverloadingResolutionEngine<'a> {
    types: &'a TypeDefinitionsRegister,
    functions: &'a FunctionOverloadsRegister,
    caches: &'a ResolutionCaches,
}

impl<'a> OverloadingResolutionEngine<'a> {
    pub fn new(
        types: &'a TypeDefinitionsRegister,
        functions: &'a FunctionOverloadsRegister,
        caches: &'a ResolutionCaches,
    ) -> Self {
        Self { types, functions, caches }
    }

    /// Best matching definition, or `None` if no candidate accepts the arguments
    pub fn retrieve_function_definition(
        &self,
        call: &FunctionCall,
        arg_types: &[TypeSignature],
    ) -> Result<Option<Rc<FunctionDefinition>>> {
        if arg_types.len() != call.arguments.len() {
            return Err(Error::Internal(format!(
                "call {} has {} arguments but {} argument types were supplied",
                call.display_name(),
                call.arguments.len(),
                arg_types.len()
            )));
        }

        let key = call_cache_key(self.types, call, arg_types)?;
        if let Some(hit) = self.caches.calls.borrow().get(&key) {
            trace!("overload cache hit: {}", key);
            return Ok(Some(Rc::clone(hit)));
        }

        let mut best = FunctionSpecificityDescriptor::worst_possible_specificity();
        let mut matches: Vec<(Rc<FunctionDefinition>, SubstitutionRules)> = Vec::new();
        for id in self.functions.candidate_set_ids(call) {
            for candidate in self.functions.get_overload_set(&id) {
                let specificity = FunctionSpecificityDescriptor::new(candidate, self.types)?;
                let comparison = specificity.compare_with(&best);
                if comparison == SpecificityComparison::LessSpecific {
                    continue;
                }
                let Some(rules) = self.check_function_compatibility(candidate, call, arg_types)? else {
                    continue;
                };
                if comparison == SpecificityComparison::MoreSpecific {
                    matches.clear();
                    best = specificity;
                }
                matches.push((Rc::clone(candidate), rules));
            }
        }

        if matches.len() > 1 {
            return Err(Error::AmbiguousCall {
                call: call.display_name(),
                arguments: join(arg_types, ", "),
                candidates: matches.len(),
                span: call.span,
            });
        }
        let Some((definition, rules)) = matches.pop() else {
            debug!("no direct definition for {}", key);
            return Ok(None);
        };

        let resolved = if definition.is_generic() {
            self.instantiate(&definition, &rules)?
        } else {
            definition
        };
        debug!("resolved {} to {}", key, resolved.name);
        self.caches.calls.borrow_mut().insert(key, Rc::clone(&resolved));
        Ok(Some(resolved))
    }

    /// Substitution rules under which `candidate` accepts the call, or `None`
    pub fn check_function_compatibility(
        &self,
        candidate: &FunctionDefinition,
        call: &FunctionCall,
        arg_types: &[TypeSignature],
    ) -> Result<Option<SubstitutionRules>> {
        if candidate.arguments.len() != arg_types.len() {
            return Err(Error::Internal(format!(
                "candidate {} takes {} arguments but the call supplies {}",
                candidate.name,
                candidate.arguments.len(),
                arg_types.len()
            )));
        }

        let explicit = !call.instantiated_generics.is_empty();
        let fixed = if explicit {
            if call.instantiated_generics.len() != candidate.generics.len() {
                return Ok(None);
            }
            SubstitutionRules::zip(&candidate.generics, &call.instantiated_generics)
        } else {
            SubstitutionRules::new()
        };

        let engine = GenericsInstantiationEngine::new(&fixed);
        let mut checker = AssignmentTypeChecker::with_rules(self.types, fixed.clone());
        for (declared, actual) in candidate.argument_types().zip(arg_types) {
            let expected = engine.instantiate_type(declared);
            if !checker.validate_assignment(actual, &expected)? {
                return Ok(None);
            }
        }

        let rules = checker.into_rules();
        if !explicit && rules.count_bound(&candidate.generics) != candidate.generics.len() {
            return Ok(None);
        }
        Ok(Some(rules))
    }

    /// Concrete copy of a generic definition, shared between call sites
    fn instantiate(&self, definition: &FunctionDefinition, rules: &SubstitutionRules) -> Result<Rc<FunctionDefinition>> {
        let mut bound = Vec::with_capacity(definition.generics.len());
        for generic in &definition.generics {
            let replacement = rules.find(generic).ok_or_else(|| {
                Error::Internal(format!("generic {} of {} was never bound", generic, definition.name))
            })?;
            bound.push(self.types.get_fully_qualified_name(replacement)?);
        }
        let name = format!("{}<{}>", definition.name, bound.join(","));
        let key = format!("{}::{}", definition.origin_file, name);

        if let Some(existing) = self.caches.instances.borrow().get(&key) {
            return Ok(Rc::clone(existing));
        }
        let instance = Rc::new(GenericsInstantiationEngine::new(rules).instantiate_function(definition, name));
        debug!("instantiated function {}", key);
        self.caches.instances.borrow_mut().insert(key, Rc::clone(&instance));
        Ok(instance)
    }
}
