//! Address sanitizer
//!
//! `&` may only be applied to expressions denoting a storage location:
//! variables, fields, elements and dereferenced pointers.

use crate::frontend::ast::{Expression, FunctionDefinition, Statement, UnaryOperator};
use crate::utils::{Error, Result};

/// Whether `expression` denotes a storage location
pub fn is_expression_addressable(expression: &Expression) -> bool {
    match expression {
        Expression::Identifier { .. } | Expression::DotMemberAccess { .. } | Expression::SquareBracketsAccess { .. } => {
            true
        }
        Expression::TypeOperator { expression, .. } => is_expression_addressable(expression),
        Expression::UnaryOperator { operator, .. } => *operator == UnaryOperator::Deref,
        Expression::FunctionCall(_)
        | Expression::BinaryOperator { .. }
        | Expression::ArrayLiteral { .. }
        | Expression::IntLiteral { .. }
        | Expression::FloatLiteral { .. }
        | Expression::CharLiteral { .. }
        | Expression::BoolLiteral { .. }
        | Expression::StringLiteral { .. } => false,
    }
}

pub struct AddressSanitizer;

impl AddressSanitizer {
    pub fn visit_function_definition(function: &FunctionDefinition) -> Result<()> {
        Self::visit_code_block(&function.body)
    }

    fn visit_code_block(statements: &[Statement]) -> Result<()> {
        statements.iter().try_for_each(Self::visit_statement)
    }

    fn visit_statement(statement: &Statement) -> Result<()> {
        match statement {
            Statement::VariableDeclaration { value, .. } | Statement::Return { value, .. } => {
                value.iter().try_for_each(Self::visit_expression)
            }
            Statement::ConstDeclaration { value, .. } => Self::visit_expression(value),
            Statement::Assignment { target, value, .. } => {
                Self::visit_expression(target)?;
                Self::visit_expression(value)
            }
            Statement::Conditional { condition, then_branch, else_branch, .. } => {
                Self::visit_expression(condition)?;
                Self::visit_code_block(then_branch)?;
                Self::visit_code_block(else_branch)
            }
            Statement::WhileLoop { condition, body, .. } | Statement::UntilLoop { condition, body, .. } => {
                Self::visit_expression(condition)?;
                Self::visit_code_block(body)
            }
            Statement::FunctionCall(call) => call.arguments.iter().try_for_each(Self::visit_expression),
            Statement::Continue { .. } | Statement::Break { .. } => Ok(()),
        }
    }

    fn visit_expression(expression: &Expression) -> Result<()> {
        match expression {
            Expression::UnaryOperator { operator, operand, span } => {
                if *operator == UnaryOperator::AddressOf && !is_expression_addressable(operand) {
                    return Err(Error::NotAddressable { span: *span });
                }
                Self::visit_expression(operand)
            }
            Expression::FunctionCall(call) => call.arguments.iter().try_for_each(Self::visit_expression),
            Expression::BinaryOperator { left, right, .. } => {
                Self::visit_expression(left)?;
                Self::visit_expression(right)
            }
            Expression::ArrayLiteral { elements, .. } => elements.iter().try_for_each(Self::visit_expression),
            Expression::TypeOperator { expression, .. } => Self::visit_expression(expression),
            Expression::DotMemberAccess { struct_value, .. } => Self::visit_expression(struct_value),
            Expression::SquareBracketsAccess { storage, index, .. } => {
                Self::visit_expression(storage)?;
                Self::visit_expression(index)
            }
            Expression::IntLiteral { .. }
            | Expression::FloatLiteral { .. }
            | Expression::CharLiteral { .. }
            | Expression::BoolLiteral { .. }
            | Expression::StringLiteral { .. }
            | Expression::Identifier { .. } => Ok(()),
        }
    }
}
