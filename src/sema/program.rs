//! Program representation
//!
//! Entry surface for statement and expression validators. Owns the project
//! structure, both registers and the resolution caches, and answers typing
//! questions about expressions in a given scope.

use std::rc::Rc;

use log::info;

use crate::frontend::ast::{Expression, FunctionCall, FunctionDefinition, UnaryOperator};
use crate::frontend::project::{FileRepresentation, ProjectFileStructure};
use crate::sema::adoption::CommonFeatureAdoptionPlanDescriptor;
use crate::sema::assignment::AssignmentTypeChecker;
use crate::sema::call_resolver::{CallResolution, FunctionCallResolver};
use crate::sema::conflicts::PackageTypeConflictNavigator;
use crate::sema::deducer::ExpressionTypeDeducer;
use crate::sema::overloads::FunctionOverloadsRegister;
use crate::sema::resolution::ResolutionCaches;
use crate::sema::scope::ScopeContext;
use crate::sema::type_dependencies::TypeDependencyNavigator;
use crate::sema::type_registry::TypeDefinitionsRegister;
use crate::types::{join, TypeDefinition, TypeSignature};
use crate::utils::{Error, Result, Span};

pub struct ProgramRepresentation {
    project: Rc<ProjectFileStructure>,
    types: TypeDefinitionsRegister,
    functions: FunctionOverloadsRegister,
    caches: ResolutionCaches,
}

impl ProgramRepresentation {
    /// Check package visibility, register every type, check the type
    /// definition bodies, then register every function
    pub fn new(project: ProjectFileStructure) -> Result<Self> {
        PackageTypeConflictNavigator::new(&project).check_project()?;

        let project = Rc::new(project);
        let types = TypeDefinitionsRegister::from_project(Rc::clone(&project))?;
        TypeDependencyNavigator::new(&types).visit_all_type_definitions()?;
        let functions = FunctionOverloadsRegister::from_project(Rc::clone(&project), &types)?;
        info!(
            "program ready: {} types, {} functions",
            types.stored_keys().len(),
            functions.definitions().len()
        );
        Ok(Self { project, types, functions, caches: ResolutionCaches::new() })
    }

    pub fn from_files(files: Vec<FileRepresentation>) -> Result<Self> {
        Self::new(ProjectFileStructure::new(files)?)
    }

    pub fn project(&self) -> &ProjectFileStructure {
        &self.project
    }

    pub fn types(&self) -> &TypeDefinitionsRegister {
        &self.types
    }

    pub fn functions(&self) -> &FunctionOverloadsRegister {
        &self.functions
    }

    pub fn main_functions(&self) -> &[Rc<FunctionDefinition>] {
        self.functions.main_functions()
    }

    /// Concrete copies of generic functions created by resolutions so far,
    /// ordered by instance key
    pub fn instantiated_functions(&self) -> Vec<(String, Rc<FunctionDefinition>)> {
        let mut instances: Vec<_> = self
            .caches
            .instances
            .borrow()
            .iter()
            .map(|(key, def)| (key.clone(), Rc::clone(def)))
            .collect();
        instances.sort_by(|a, b| a.0.cmp(&b.0));
        instances
    }

    pub fn call_resolver(&self) -> FunctionCallResolver<'_> {
        FunctionCallResolver::new(&self.types, &self.functions, &self.caches)
    }

    pub fn deducer<'a>(&'a self, scope: &'a ScopeContext) -> ExpressionTypeDeducer<'a> {
        ExpressionTypeDeducer::new(&self.types, self.call_resolver(), scope)
    }

    pub fn resolve_expression_type(&self, expression: &Expression, scope: &ScopeContext) -> Result<TypeSignature> {
        self.deducer(scope).deduce(expression)
    }

    /// Whether a value of type `source` may be stored in a slot of type `dest`
    pub fn validate_assignment(&self, source: &TypeSignature, dest: &TypeSignature) -> Result<bool> {
        AssignmentTypeChecker::new(&self.types).validate_assignment(source, dest)
    }

    pub fn validate_assignment_very_strictly(&self, source: &TypeSignature, dest: &TypeSignature) -> Result<bool> {
        AssignmentTypeChecker::new(&self.types).validate_assignment_very_strictly(source, dest)
    }

    /// Position of `member` among the fields of the struct `ty`
    pub fn resolve_field_index(&self, ty: &TypeSignature, member: &str, span: Span) -> Result<usize> {
        let unaliased = self.types.unalias(ty)?;
        let TypeSignature::Custom(custom) = &unaliased else {
            return Err(Error::NotAStruct { type_name: ty.to_string(), span });
        };
        let TypeDefinition::Struct(def) = self.types.retrieve(custom)? else {
            return Err(Error::NotAStruct { type_name: ty.to_string(), span });
        };
        def.fields
            .iter()
            .position(|f| f.name == member)
            .ok_or_else(|| Error::UnknownField {
                field: member.to_string(),
                type_name: ty.to_string(),
                span,
            })
    }

    pub fn resolve_function_call_return_type(&self, call: &FunctionCall, scope: &ScopeContext) -> Result<CallResolution> {
        let arg_types = self.deducer(scope).deduce_arguments(call)?;
        self.call_resolver().resolve_function_call_return_type(call, &arg_types)
    }

    pub fn is_void_procedure(&self, call: &FunctionCall, scope: &ScopeContext) -> Result<bool> {
        Ok(self.resolve_function_call_return_type(call, scope)? == CallResolution::Void)
    }

    /// Rewrite `a.b` so that `a` is explicitly dereferenced while it is a pointer
    pub fn normalize_dot_member_access(&self, expression: &Expression, scope: &ScopeContext) -> Result<Expression> {
        let Expression::DotMemberAccess { struct_value, member, span } = expression else {
            return Ok(expression.clone());
        };
        let mut operand = self.normalize_dot_member_access(struct_value, scope)?;
        let mut ty = self.resolve_expression_type(&operand, scope)?;
        while let TypeSignature::Pointer { pointed } = ty {
            operand = Expression::UnaryOperator {
                operator: UnaryOperator::Deref,
                operand: Box::new(operand),
                span: *span,
            };
            ty = self.types.unalias(&pointed)?;
        }
        Ok(Expression::DotMemberAccess {
            struct_value: Box::new(operand),
            member: member.clone(),
            span: *span,
        })
    }

    /// Definition a call resolves to directly; `NoMatchingOverload` if none
    pub fn retrieve_function_definition(
        &self,
        call: &FunctionCall,
        arg_types: &[TypeSignature],
    ) -> Result<Rc<FunctionDefinition>> {
        self.call_resolver()
            .overloads()
            .retrieve_function_definition(call, arg_types)?
            .ok_or_else(|| Error::NoMatchingOverload {
                call: call.display_name(),
                arguments: join(arg_types, ", "),
                span: call.span,
            })
    }

    pub fn generate_common_feature_adoption_plan(
        &self,
        call: &FunctionCall,
        arg_types: &[TypeSignature],
    ) -> Result<Rc<CommonFeatureAdoptionPlanDescriptor>> {
        self.call_resolver().adoption().generate_plan_descriptor(call, arg_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::Argument;
    use crate::sema::testing::*;
    use pretty_assertions::assert_eq;

    fn program() -> ProgramRepresentation {
        ProgramRepresentation::from_files(vec![main_file(
            vec![
                struct_def("Point", vec![("x", int()), ("y", int())]),
                struct_def("Segment", vec![("from", custom("Point")), ("to", TypeSignature::pointer(custom("Point")))]),
                alias_def("Location", custom("Point")),
                union_def("Value", vec![int(), float()]),
            ],
            vec![
                function("show", vec![int()], None),
                function("show", vec![float()], None),
                function("main", vec![], None),
            ],
        )])
        .unwrap()
    }

    fn scope_with(name: &str, ty: TypeSignature) -> ScopeContext {
        let mut scope = ScopeContext::new();
        scope.add_object(name, ty, false, false, Span::dummy()).unwrap();
        scope
    }

    #[test]
    fn test_field_index_follows_aliases() {
        let program = program();
        assert_eq!(program.resolve_field_index(&custom("Location"), "y", Span::dummy()).unwrap(), 1);
        assert!(matches!(
            program.resolve_field_index(&custom("Point"), "z", Span::dummy()),
            Err(Error::UnknownField { .. })
        ));
        assert!(matches!(
            program.resolve_field_index(&int(), "x", Span::dummy()),
            Err(Error::NotAStruct { .. })
        ));
    }

    #[test]
    fn test_normalize_inserts_dereferences() {
        let program = program();
        let scope = scope_with("pp", TypeSignature::pointer(TypeSignature::pointer(custom("Point"))));
        let access = Expression::DotMemberAccess {
            struct_value: Box::new(Expression::identifier("pp")),
            member: "x".to_string(),
            span: Span::dummy(),
        };
        let normalized = program.normalize_dot_member_access(&access, &scope).unwrap();
        let Expression::DotMemberAccess { struct_value, .. } = &normalized else {
            panic!("expected a member access");
        };
        let Expression::UnaryOperator { operator: UnaryOperator::Deref, operand, .. } = struct_value.as_ref() else {
            panic!("expected a dereference");
        };
        assert!(matches!(operand.as_ref(), Expression::UnaryOperator { operator: UnaryOperator::Deref, .. }));
        assert_eq!(program.resolve_expression_type(&normalized, &scope).unwrap(), int());
    }

    #[test]
    fn test_void_procedure_through_adoption() {
        let program = program();
        let scope = scope_with("v", custom("Value"));
        let show = call_with("show", vec![Expression::identifier("v")]);
        assert!(program.is_void_procedure(&show, &scope).unwrap());
        let plan = program.generate_common_feature_adoption_plan(&show, &[custom("Value")]).unwrap();
        assert_eq!(plan.plan.leaves().len(), 2);
    }

    #[test]
    fn test_missing_definition_is_an_error() {
        let program = program();
        let show = call_with("show", vec![Expression::identifier("v")]);
        assert!(program.retrieve_function_definition(&show, &[int()]).is_ok());
        assert!(matches!(
            program.retrieve_function_definition(&show, &[custom("Value")]),
            Err(Error::NoMatchingOverload { .. })
        ));
    }

    #[test]
    fn test_assignment_queries() {
        let program = program();
        assert!(program.validate_assignment(&int(), &custom("Value")).unwrap());
        assert!(!program.validate_assignment_very_strictly(&int(), &custom("Value")).unwrap());
    }

    #[test]
    fn test_main_functions_are_tracked() {
        let program = program();
        assert_eq!(program.main_functions().len(), 1);
        let with_args = FunctionDefinition {
            arguments: vec![Argument { name: "argc".into(), argument_type: int() }],
            ..function("main", vec![], None)
        };
        let other = ProgramRepresentation::from_files(vec![main_file(vec![], vec![with_args])]).unwrap();
        assert!(other.main_functions().is_empty());
    }

    #[test]
    fn test_type_definition_bodies_are_checked() {
        let ghost_field = main_file(vec![struct_def("S", vec![("x", custom("Ghost"))])], vec![]);
        assert!(matches!(ProgramRepresentation::from_files(vec![ghost_field]), Err(Error::UnknownType { .. })));

        let by_value = main_file(
            vec![struct_def("A", vec![("b", custom("B"))]), struct_def("B", vec![("a", custom("A"))])],
            vec![],
        );
        assert!(matches!(ProgramRepresentation::from_files(vec![by_value]), Err(Error::CyclicTypeDependency { .. })));
    }

    #[test]
    fn test_conflicting_packages_are_rejected() {
        let mut main = main_file(vec![], vec![]);
        main.imports = vec!["a".into(), "b".into()];
        let mut a = FileRepresentation::new("a.mer", "a");
        a.type_definitions.push(struct_def("Node", vec![]));
        let mut b = FileRepresentation::new("b.mer", "b");
        b.type_definitions.push(struct_def("Node", vec![]));
        let err = ProgramRepresentation::from_files(vec![main, a, b]).err().unwrap();
        assert!(matches!(err, Error::PackageTypeConflict { .. }));
    }
}
