//! Abstract Syntax Tree definitions for Meridian
//!
//! The tree is produced by an external parser and handed over as JSON;
//! every enum is tagged by `kind`. Spans and origin files may be omitted.

use serde::{Deserialize, Serialize};
use crate::types::TypeSignature;
use crate::utils::Span;

// ==================== Functions ====================

/// Function argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub argument_type: TypeSignature,
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    /// `None` for procedures that return nothing
    #[serde(default)]
    pub return_type: Option<TypeSignature>,
    #[serde(default)]
    pub generics: Vec<String>,
    #[serde(default)]
    pub body: Vec<Statement>,
    #[serde(default)]
    pub origin_file: String,
    #[serde(default)]
    pub span: Span,
}

impl FunctionDefinition {
    pub fn is_generic(&self) -> bool {
        !self.generics.is_empty()
    }

    pub fn argument_types(&self) -> impl Iterator<Item = &TypeSignature> {
        self.arguments.iter().map(|a| &a.argument_type)
    }

    /// Set the origin file of the definition and of everything inside it
    pub fn assign_origin(&mut self, file: &str) {
        if self.origin_file.is_empty() {
            self.origin_file = file.to_string();
        }
        for argument in &mut self.arguments {
            argument.argument_type.assign_origin(file);
        }
        if let Some(ret) = &mut self.return_type {
            ret.assign_origin(file);
        }
        for statement in &mut self.body {
            statement.assign_origin(file);
        }
    }
}

// ==================== Statements ====================

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Statement {
    VariableDeclaration {
        identifier: String,
        declared_type: TypeSignature,
        #[serde(default)]
        value: Option<Expression>,
        #[serde(default)]
        span: Span,
    },
    ConstDeclaration {
        identifier: String,
        declared_type: TypeSignature,
        value: Expression,
        #[serde(default)]
        span: Span,
    },
    Assignment {
        target: Expression,
        value: Expression,
        #[serde(default)]
        span: Span,
    },
    Conditional {
        condition: Expression,
        then_branch: Vec<Statement>,
        #[serde(default)]
        else_branch: Vec<Statement>,
        #[serde(default)]
        span: Span,
    },
    WhileLoop {
        condition: Expression,
        body: Vec<Statement>,
        #[serde(default)]
        span: Span,
    },
    UntilLoop {
        condition: Expression,
        body: Vec<Statement>,
        #[serde(default)]
        span: Span,
    },
    Return {
        #[serde(default)]
        value: Option<Expression>,
        #[serde(default)]
        span: Span,
    },
    FunctionCall(FunctionCall),
    Continue {
        #[serde(default)]
        span: Span,
    },
    Break {
        #[serde(default)]
        span: Span,
    },
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Self::VariableDeclaration { span, .. }
            | Self::ConstDeclaration { span, .. }
            | Self::Assignment { span, .. }
            | Self::Conditional { span, .. }
            | Self::WhileLoop { span, .. }
            | Self::UntilLoop { span, .. }
            | Self::Return { span, .. }
            | Self::Continue { span }
            | Self::Break { span } => *span,
            Self::FunctionCall(call) => call.span,
        }
    }

    pub fn assign_origin(&mut self, file: &str) {
        match self {
            Self::VariableDeclaration { declared_type, value, .. } => {
                declared_type.assign_origin(file);
                if let Some(value) = value {
                    value.assign_origin(file);
                }
            }
            Self::ConstDeclaration { declared_type, value, .. } => {
                declared_type.assign_origin(file);
                value.assign_origin(file);
            }
            Self::Assignment { target, value, .. } => {
                target.assign_origin(file);
                value.assign_origin(file);
            }
            Self::Conditional { condition, then_branch, else_branch, .. } => {
                condition.assign_origin(file);
                for statement in then_branch.iter_mut().chain(else_branch.iter_mut()) {
                    statement.assign_origin(file);
                }
            }
            Self::WhileLoop { condition, body, .. } | Self::UntilLoop { condition, body, .. } => {
                condition.assign_origin(file);
                for statement in body {
                    statement.assign_origin(file);
                }
            }
            Self::Return { value, .. } => {
                if let Some(value) = value {
                    value.assign_origin(file);
                }
            }
            Self::FunctionCall(call) => call.assign_origin(file),
            Self::Continue { .. } | Self::Break { .. } => {}
        }
    }
}

// ==================== Expressions ====================

/// Function call, usable both as an expression and as a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub package_prefix: Option<String>,
    #[serde(default)]
    pub arguments: Vec<Expression>,
    /// Explicit generic arguments (`f<Int>(x)`)
    #[serde(default)]
    pub instantiated_generics: Vec<TypeSignature>,
    #[serde(default)]
    pub origin_file: String,
    #[serde(default)]
    pub span: Span,
}

impl FunctionCall {
    #[cfg(test)]
    pub fn new(name: impl Into<String>, origin_file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package_prefix: None,
            arguments: Vec::new(),
            instantiated_generics: Vec::new(),
            origin_file: origin_file.into(),
            span: Span::dummy(),
        }
    }

    /// Name as written at the call site
    pub fn display_name(&self) -> String {
        match &self.package_prefix {
            Some(package) => format!("{}::{}", package, self.name),
            None => self.name.clone(),
        }
    }

    pub fn assign_origin(&mut self, file: &str) {
        if self.origin_file.is_empty() {
            self.origin_file = file.to_string();
        }
        for generic in &mut self.instantiated_generics {
            generic.assign_origin(file);
        }
        for argument in &mut self.arguments {
            argument.assign_origin(file);
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, Self::Eq | Self::Ne)
    }

    pub fn is_ordering(&self) -> bool {
        matches!(self, Self::Lt | Self::Le | Self::Gt | Self::Ge)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// `&x`
    AddressOf,
    /// `*x`
    Deref,
    /// `!x`
    Not,
    /// `+x`
    Plus,
    /// `-x`
    Minus,
}

/// `x is T` / `x as T`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeOperator {
    Is,
    As,
}

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expression {
    FunctionCall(FunctionCall),
    BinaryOperator {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
        #[serde(default)]
        span: Span,
    },
    UnaryOperator {
        operator: UnaryOperator,
        operand: Box<Expression>,
        #[serde(default)]
        span: Span,
    },
    ArrayLiteral {
        length: usize,
        stored_type: TypeSignature,
        #[serde(default)]
        elements: Vec<Expression>,
        #[serde(default)]
        span: Span,
    },
    TypeOperator {
        operator: TypeOperator,
        expression: Box<Expression>,
        type_signature: TypeSignature,
        #[serde(default)]
        span: Span,
    },
    DotMemberAccess {
        struct_value: Box<Expression>,
        member: String,
        #[serde(default)]
        span: Span,
    },
    SquareBracketsAccess {
        storage: Box<Expression>,
        index: Box<Expression>,
        #[serde(default)]
        span: Span,
    },
    IntLiteral {
        value: i64,
        #[serde(default)]
        span: Span,
    },
    FloatLiteral {
        value: f64,
        #[serde(default)]
        span: Span,
    },
    CharLiteral {
        value: char,
        #[serde(default)]
        span: Span,
    },
    BoolLiteral {
        value: bool,
        #[serde(default)]
        span: Span,
    },
    StringLiteral {
        value: String,
        #[serde(default)]
        span: Span,
    },
    Identifier {
        name: String,
        #[serde(default)]
        span: Span,
    },
}

impl Expression {
    #[cfg(test)]
    pub fn identifier(name: &str) -> Self {
        Self::Identifier { name: name.to_string(), span: Span::dummy() }
    }

    #[cfg(test)]
    pub fn int(value: i64) -> Self {
        Self::IntLiteral { value, span: Span::dummy() }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::FunctionCall(call) => call.span,
            Self::BinaryOperator { span, .. }
            | Self::UnaryOperator { span, .. }
            | Self::ArrayLiteral { span, .. }
            | Self::TypeOperator { span, .. }
            | Self::DotMemberAccess { span, .. }
            | Self::SquareBracketsAccess { span, .. }
            | Self::IntLiteral { span, .. }
            | Self::FloatLiteral { span, .. }
            | Self::CharLiteral { span, .. }
            | Self::BoolLiteral { span, .. }
            | Self::StringLiteral { span, .. }
            | Self::Identifier { span, .. } => *span,
        }
    }

    pub fn assign_origin(&mut self, file: &str) {
        match self {
            Self::FunctionCall(call) => call.assign_origin(file),
            Self::BinaryOperator { left, right, .. } => {
                left.assign_origin(file);
                right.assign_origin(file);
            }
            Self::UnaryOperator { operand, .. } => operand.assign_origin(file),
            Self::ArrayLiteral { stored_type, elements, .. } => {
                stored_type.assign_origin(file);
                for element in elements {
                    element.assign_origin(file);
                }
            }
            Self::TypeOperator { expression, type_signature, .. } => {
                expression.assign_origin(file);
                type_signature.assign_origin(file);
            }
            Self::DotMemberAccess { struct_value, .. } => struct_value.assign_origin(file),
            Self::SquareBracketsAccess { storage, index, .. } => {
                storage.assign_origin(file);
                index.assign_origin(file);
            }
            Self::IntLiteral { .. }
            | Self::FloatLiteral { .. }
            | Self::CharLiteral { .. }
            | Self::BoolLiteral { .. }
            | Self::StringLiteral { .. }
            | Self::Identifier { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_function_with_body() {
        let json = r#"{
            "name": "main",
            "body": [
                {"kind": "VariableDeclaration", "identifier": "x",
                 "declared_type": {"kind": "Primitive", "name": "Int"},
                 "value": {"kind": "IntLiteral", "value": 3}},
                {"kind": "FunctionCall", "name": "print",
                 "arguments": [{"kind": "Identifier", "name": "x"}]}
            ]
        }"#;
        let func: FunctionDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(func.body.len(), 2);
        assert!(func.return_type.is_none());
        assert!(matches!(&func.body[1], Statement::FunctionCall(call) if call.arguments.len() == 1));
    }

    #[test]
    fn test_assign_origin_reaches_nested_calls() {
        let mut inner = FunctionCall::new("inner", "");
        inner.instantiated_generics.push(TypeSignature::custom("Box", ""));
        let mut outer = FunctionCall::new("outer", "");
        outer.arguments.push(Expression::FunctionCall(inner));

        let mut statement = Statement::Return {
            value: Some(Expression::FunctionCall(outer)),
            span: Span::dummy(),
        };
        statement.assign_origin("a.mer");

        let Statement::Return { value: Some(Expression::FunctionCall(outer)), .. } = statement else {
            panic!("expected return of a call");
        };
        assert_eq!(outer.origin_file, "a.mer");
        let Expression::FunctionCall(inner) = &outer.arguments[0] else {
            panic!("expected nested call");
        };
        assert_eq!(inner.origin_file, "a.mer");
        assert!(matches!(&inner.instantiated_generics[0], TypeSignature::Custom(c) if c.origin_file == "a.mer"));
    }
}
