//! Function call resolver
//!
//! Answers "what does this call return" by trying direct overload
//! resolution first and common feature adoption second.

use crate::frontend::ast::FunctionCall;
use crate::sema::adoption::CommonFeatureAdoptionPlanGenerationEngine;
use crate::sema::overloads::FunctionOverloadsRegister;
use crate::sema::resolution::{OverloadingResolutionEngine, ResolutionCaches};
use crate::sema::type_registry::TypeDefinitionsRegister;
use crate::types::TypeSignature;
use crate::utils::Result;

/// Return type of a call
#[derive(Debug, Clone, PartialEq)]
pub enum CallResolution {
    Type(TypeSignature),
    Void,
    /// Some argument types are still unbound generics; decide later
    Unresolved,
}

impl From<Option<TypeSignature>> for CallResolution {
    fn from(return_type: Option<TypeSignature>) -> Self {
        match return_type {
            Some(ty) => Self::Type(ty),
            None => Self::Void,
        }
    }
}

pub struct FunctionCallResolver<'a> {
    types: &'a TypeDefinitionsRegister,
    functions: &'a FunctionOverloadsRegister,
    caches: &'a ResolutionCaches,
}

impl<'a> FunctionCallResolver<'a> {
    pub fn new(
        types: &'a TypeDefinitionsRegister,
        functions: &'a FunctionOverloadsRegister,
        caches: &'a ResolutionCaches,
    ) -> Self {
        Self { types, functions, caches }
    }

    pub fn overloads(&self) -> OverloadingResolutionEngine<'a> {
        OverloadingResolutionEngine::new(self.types, self.functions, self.caches)
    }

    pub fn adoption(&self) -> CommonFeatureAdoptionPlanGenerationEngine<'a> {
        CommonFeatureAdoptionPlanGenerationEngine::new(self.types, self.overloads(), self.caches)
    }

    pub fn resolve_function_call_return_type(
        &self,
        call: &FunctionCall,
        arg_types: &[TypeSignature],
    ) -> Result<CallResolution> {
        if arg_types.iter().any(TypeSignature::is_generic) {
            return Ok(CallResolution::Unresolved);
        }
        if let Some(def) = self.overloads().retrieve_function_definition(call, arg_types)? {
            return Ok(def.return_type.clone().into());
        }
        let descriptor = self.adoption().generate_plan_descriptor(call, arg_types)?;
        Ok(descriptor.return_type.clone().into())
    }

    /// Whether the call resolves to a procedure returning nothing
    pub fn is_void_procedure(&self, call: &FunctionCall, arg_types: &[TypeSignature]) -> Result<bool> {
        Ok(self.resolve_function_call_return_type(call, arg_types)? == CallResolution::Void)
    }
}
