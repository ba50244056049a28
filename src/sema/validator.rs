//! Function body validation
//!
//! Every function gets the structural checks: addressable `&` operands,
//! exit paths and loop control. Non-generic functions are then type
//! checked statement by statement. Generic functions are type checked
//! through the concrete copies that calls instantiate, until no new copy
//! appears. Checking a function stops at its first error; errors of
//! different functions are collected together.

use std::collections::HashSet;

use log::debug;

use crate::frontend::ast::{Expression, FunctionDefinition, Statement, UnaryOperator};
use crate::sema::addressing::AddressSanitizer;
use crate::sema::call_resolver::CallResolution;
use crate::sema::exit_paths::FunctionExitPathNavigator;
use crate::sema::program::ProgramRepresentation;
use crate::sema::scope::ScopeContext;
use crate::types::{TypeSignature, BOOL};
use crate::utils::{Error, Result, Span};

pub struct FunctionValidator<'a> {
    program: &'a ProgramRepresentation,
}

impl<'a> FunctionValidator<'a> {
    pub fn new(program: &'a ProgramRepresentation) -> Self {
        Self { program }
    }

    /// Validate every function and every generic instance reached from them
    pub fn validate_all(&self) -> Vec<Error> {
        let mut errors = Vec::new();
        for function in self.program.functions().definitions() {
            let result = if function.is_generic() {
                self.check_structure(function)
            } else {
                self.validate_function(function)
            };
            if let Err(err) = result {
                debug!("function {} failed validation: {}", function.name, err);
                errors.push(err);
            }
        }

        let mut checked = HashSet::new();
        loop {
            let pending: Vec<_> = self
                .program
                .instantiated_functions()
                .into_iter()
                .filter(|(key, _)| !checked.contains(key))
                .collect();
            if pending.is_empty() {
                break;
            }
            for (key, instance) in pending {
                if let Err(err) = self.check_types(&instance) {
                    debug!("instance {} failed validation: {}", key, err);
                    errors.push(err);
                }
                checked.insert(key);
            }
        }
        errors
    }

    pub fn validate_function(&self, function: &FunctionDefinition) -> Result<()> {
        self.check_structure(function)?;
        self.check_types(function)
    }

    /// Checks that need no type information
    fn check_structure(&self, function: &FunctionDefinition) -> Result<()> {
        AddressSanitizer::visit_function_definition(function)?;
        FunctionExitPathNavigator::new(function).visit_function_definition()
    }

    fn check_types(&self, function: &FunctionDefinition) -> Result<()> {
        debug!("validating function {} from {}", function.name, function.origin_file);
        let types = self.program.types();
        for argument_type in function.argument_types() {
            types.verify_that_the_type_exists(argument_type)?;
        }
        if let Some(return_type) = &function.return_type {
            types.verify_that_the_type_exists(return_type)?;
        }

        let mut checker = BodyChecker {
            program: self.program,
            function,
            scope: ScopeContext::from_function(function)?,
        };
        checker.check_block(&function.body)
    }
}

/// Walks one function body
struct BodyChecker<'a> {
    program: &'a ProgramRepresentation,
    function: &'a FunctionDefinition,
    scope: ScopeContext,
}

impl<'a> BodyChecker<'a> {
    fn check_block(&mut self, statements: &[Statement]) -> Result<()> {
        statements.iter().try_for_each(|s| self.check_statement(s))
    }

    fn check_scoped_block(&mut self, statements: &[Statement]) -> Result<()> {
        self.scope.enter_scope();
        let result = self.check_block(statements);
        self.scope.exit_scope();
        result
    }

    fn check_statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::VariableDeclaration { identifier, declared_type, value, span } => {
                self.program.types().verify_that_the_type_exists(declared_type)?;
                if let Some(value) = value {
                    self.expect_assignable(value, declared_type, *span)?;
                }
                self.scope.add_object(identifier, declared_type.clone(), false, false, *span)
            }
            Statement::ConstDeclaration { identifier, declared_type, value, span } => {
                self.program.types().verify_that_the_type_exists(declared_type)?;
                self.expect_assignable(value, declared_type, *span)?;
                self.scope.add_object(identifier, declared_type.clone(), true, false, *span)
            }
            Statement::Assignment { target, value, span } => {
                self.check_assignable_target(target, *span)?;
                let target_type = self.deduce(target)?;
                self.expect_assignable(value, &target_type, *span)
            }
            Statement::Conditional { condition, then_branch, else_branch, .. } => {
                self.expect_condition(condition)?;
                self.check_scoped_block(then_branch)?;
                self.check_scoped_block(else_branch)
            }
            Statement::WhileLoop { condition, body, .. } | Statement::UntilLoop { condition, body, .. } => {
                self.expect_condition(condition)?;
                self.check_scoped_block(body)
            }
            Statement::Return { value, span } => self.check_return(value.as_ref(), *span),
            Statement::FunctionCall(call) => {
                let resolution = self.program.resolve_function_call_return_type(call, &self.scope)?;
                if resolution == CallResolution::Unresolved {
                    debug!("deferring generic call {} in {}", call.display_name(), self.function.name);
                }
                Ok(())
            }
            Statement::Continue { .. } | Statement::Break { .. } => Ok(()),
        }
    }

    fn check_return(&self, value: Option<&Expression>, span: Span) -> Result<()> {
        match (&self.function.return_type, value) {
            (Some(expected), Some(value)) => self.expect_assignable(value, expected, span),
            (Some(_), None) => Err(Error::MissingReturnValue { function: self.function.name.clone(), span }),
            (None, Some(_)) => Err(Error::UnexpectedReturnValue { function: self.function.name.clone(), span }),
            (None, None) => Ok(()),
        }
    }

    /// Targets are variables, fields, elements or dereferenced pointers.
    /// A constant may not be written through its own name, fields or elements.
    fn check_assignable_target(&self, target: &Expression, span: Span) -> Result<()> {
        let mut current = target;
        loop {
            match current {
                Expression::Identifier { name, .. } => {
                    return match self.scope.lookup(name) {
                        Some(object) if object.is_const => Err(Error::AssignmentToConst { name: name.clone(), span }),
                        Some(_) => Ok(()),
                        None => Err(Error::UndefinedVariable { name: name.clone(), span }),
                    };
                }
                Expression::DotMemberAccess { struct_value, .. } => {
                    // writing through a pointer field leaves the constant untouched
                    if matches!(self.deduce(struct_value)?, TypeSignature::Pointer { .. }) {
                        return Ok(());
                    }
                    current = struct_value;
                }
                Expression::SquareBracketsAccess { storage, .. } => current = storage,
                Expression::UnaryOperator { operator: UnaryOperator::Deref, .. } => return Ok(()),
                _ => return Err(Error::NotAssignable { span }),
            }
        }
    }

    fn expect_assignable(&self, value: &Expression, dest: &TypeSignature, span: Span) -> Result<()> {
        let value_type = self.deduce(value)?;
        if self.program.validate_assignment(&value_type, dest)? {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                expected: dest.to_string(),
                got: value_type.to_string(),
                span,
            })
        }
    }

    fn expect_condition(&self, condition: &Expression) -> Result<()> {
        let ty = self.deduce(condition)?;
        if ty.is_primitive_named(BOOL) {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                expected: BOOL.to_string(),
                got: ty.to_string(),
                span: condition.span(),
            })
        }
    }

    fn deduce(&self, expression: &Expression) -> Result<TypeSignature> {
        self.program.resolve_expression_type(expression, &self.scope)
    }
}
