//! Common feature adoption
//!
//! When no single overload accepts a call because an argument is a union,
//! the call is split over every alternative of that union. Each branch
//! must resolve (directly or by splitting further); the call's return type
//! is then assembled from the return types of all leaves.

use std::collections::HashSet;
use std::rc::Rc;

use log::debug;

use crate::frontend::ast::{FunctionCall, FunctionDefinition};
use crate::sema::resolution::{call_cache_key, OverloadingResolutionEngine, ResolutionCaches};
use crate::sema::type_registry::TypeDefinitionsRegister;
use crate::types::{join, TypeSignature};
use crate::utils::{Error, Result};

/// How a call is dispatched over union alternatives
#[derive(Debug, Clone)]
pub enum CommonFeatureAdoptionPlan {
    /// Call resolved to a single definition
    Direct(Rc<FunctionDefinition>),
    /// Argument `argument_index` is split; one nested plan per alternative
    Branch {
        argument_index: usize,
        alternatives: Vec<TypeSignature>,
        nested_plans: Vec<CommonFeatureAdoptionPlan>,
    },
}

impl CommonFeatureAdoptionPlan {
    /// Definitions at the leaves, left to right
    pub fn leaves(&self) -> Vec<&Rc<FunctionDefinition>> {
        match self {
            Self::Direct(def) => vec![def],
            Self::Branch { nested_plans, .. } => nested_plans.iter().flat_map(|p| p.leaves()).collect(),
        }
    }
}

/// A plan together with the return type it yields; `None` means void
#[derive(Debug, Clone)]
pub struct CommonFeatureAdoptionPlanDescriptor {
    pub plan: CommonFeatureAdoptionPlan,
    pub return_type: Option<TypeSignature>,
}

pub struct CommonFeatureAdoptionPlanGenerationEngine<'a> {
    types: &'a TypeDefinitionsRegister,
    overloads: OverloadingResolutionEngine<'a>,
    caches: &'a ResolutionCaches,
}

impl<'a> CommonFeatureAdoptionPlanGenerationEngine<'a> {
    pub fn new(
        types: &'a TypeDefinitionsRegister,
        overloads: OverloadingResolutionEngine<'a>,
        caches: &'a ResolutionCaches,
    ) -> Self {
        Self { types, overloads, caches }
    }

    pub fn generate_plan_descriptor(
        &self,
        call: &FunctionCall,
        arg_types: &[TypeSignature],
    ) -> Result<Rc<CommonFeatureAdoptionPlanDescriptor>> {
        let key = call_cache_key(self.types, call, arg_types)?;
        if let Some(hit) = self.caches.plans.borrow().get(&key) {
            return Ok(Rc::clone(hit));
        }

        let mut args = arg_types.to_vec();
        let plan = self.split(call, &mut args, 0, true)?;
        let return_type = self.merge_return_types(call, &plan)?;
        debug!("adoption plan for {} returns {:?}", key, return_type.as_ref().map(|t| t.to_string()));

        let descriptor = Rc::new(CommonFeatureAdoptionPlanDescriptor { plan, return_type });
        self.caches.plans.borrow_mut().insert(key, Rc::clone(&descriptor));
        Ok(descriptor)
    }

    fn split(
        &self,
        call: &FunctionCall,
        args: &mut Vec<TypeSignature>,
        start: usize,
        top_level: bool,
    ) -> Result<CommonFeatureAdoptionPlan> {
        if let Some(def) = self.overloads.retrieve_function_definition(call, args)? {
            return Ok(CommonFeatureAdoptionPlan::Direct(def));
        }

        for index in start..args.len() {
            let alternatives = self.types.fetch_union_alternatives(&args[index])?;
            if alternatives.is_empty() {
                continue;
            }
            debug!("splitting argument {} of {} over {} alternatives", index, call.name, alternatives.len());
            let original = args[index].clone();
            let mut nested_plans = Vec::with_capacity(alternatives.len());
            for alternative in &alternatives {
                args[index] = alternative.clone();
                nested_plans.push(self.split(call, args, index + 1, false)?);
            }
            args[index] = original;
            return Ok(CommonFeatureAdoptionPlan::Branch {
                argument_index: index,
                alternatives,
                nested_plans,
            });
        }

        let arguments = join(args, ", ");
        if top_level {
            Err(Error::NoMatchingOverload { call: call.display_name(), arguments, span: call.span })
        } else {
            Err(Error::CommonFeatureAdoptionImpossible { call: call.display_name(), arguments, span: call.span })
        }
    }

    /// All leaves void: void. All leaves non-void: the single distinct
    /// return type, or an inline union of them.
    fn merge_return_types(&self, call: &FunctionCall, plan: &CommonFeatureAdoptionPlan) -> Result<Option<TypeSignature>> {
        let leaves = plan.leaves();
        let void_leaves = leaves.iter().filter(|l| l.return_type.is_none()).count();
        if void_leaves == leaves.len() {
            return Ok(None);
        }
        if void_leaves > 0 {
            return Err(Error::MixedVoidness { call: call.display_name(), span: call.span });
        }

        let mut seen = HashSet::new();
        let mut distinct = Vec::new();
        for ret in leaves.iter().filter_map(|l| l.return_type.as_ref()) {
            if seen.insert(self.types.get_fully_qualified_name(ret)?) {
                distinct.push(ret.clone());
            }
        }
        if distinct.len() == 1 {
            return Ok(distinct.pop());
        }
        Ok(Some(TypeSignature::inline_union(distinct)))
    }
}
