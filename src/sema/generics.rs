//! Generic substitution rules and the instantiation engine
//!
//! A `SubstitutionRules` set maps generic parameter names to concrete
//! types. The engine rewrites types, definitions and whole function bodies
//! through such a set.

use crate::frontend::ast::{Argument, Expression, FunctionCall, FunctionDefinition, Statement};
use crate::types::{
    CustomType, Field, StructDefinition, TypeAlias, TypeDefinition, TypeSignature, UnionDefinition,
};

// ==================== Substitution Rules ====================

/// `parameter -> replacement`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericSubstitutionRule {
    pub parameter: String,
    pub replacement: TypeSignature,
}

/// Ordered set of substitution rules, at most one per parameter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionRules {
    rules: Vec<GenericSubstitutionRule>,
}

impl SubstitutionRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair each generic parameter with its type argument
    pub fn zip(generics: &[String], arguments: &[TypeSignature]) -> Self {
        let rules = generics
            .iter()
            .zip(arguments)
            .map(|(parameter, replacement)| GenericSubstitutionRule {
                parameter: parameter.clone(),
                replacement: replacement.clone(),
            })
            .collect();
        Self { rules }
    }

    pub fn find(&self, parameter: &str) -> Option<&TypeSignature> {
        self.rules
            .iter()
            .find(|r| r.parameter == parameter)
            .map(|r| &r.replacement)
    }

    pub fn find_mut(&mut self, parameter: &str) -> Option<&mut TypeSignature> {
        self.rules
            .iter_mut()
            .find(|r| r.parameter == parameter)
            .map(|r| &mut r.replacement)
    }

    /// Append a rule for a parameter that has none yet
    pub fn push(&mut self, parameter: &str, replacement: TypeSignature) {
        debug_assert!(self.find(parameter).is_none());
        self.rules.push(GenericSubstitutionRule {
            parameter: parameter.to_string(),
            replacement,
        });
    }

    /// Number of the given parameters bound by this set
    pub fn count_bound(&self, generics: &[String]) -> usize {
        generics.iter().filter(|g| self.find(g).is_some()).count()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

// ==================== Instantiation Engine ====================

/// Rewrites trees by replacing template parameters with their bindings.
/// Parameters without a rule are left in place.
pub struct GenericsInstantiationEngine<'a> {
    rules: &'a SubstitutionRules,
}

impl<'a> GenericsInstantiationEngine<'a> {
    pub fn new(rules: &'a SubstitutionRules) -> Self {
        Self { rules }
    }

    pub fn instantiate_type(&self, ty: &TypeSignature) -> TypeSignature {
        match ty {
            TypeSignature::Template { name } => match self.rules.find(name) {
                Some(replacement) => replacement.clone(),
                None => ty.clone(),
            },
            TypeSignature::Primitive { .. } => ty.clone(),
            TypeSignature::Custom(custom) => TypeSignature::Custom(CustomType {
                type_parameters: self.instantiate_types(&custom.type_parameters),
                ..custom.clone()
            }),
            TypeSignature::Pointer { pointed } => TypeSignature::pointer(self.instantiate_type(pointed)),
            TypeSignature::Array { length, element } => {
                TypeSignature::array(*length, self.instantiate_type(element))
            }
            TypeSignature::Slice { element } => TypeSignature::slice(self.instantiate_type(element)),
            TypeSignature::InlineUnion { alternatives } => {
                TypeSignature::inline_union(self.instantiate_types(alternatives))
            }
        }
    }

    fn instantiate_types(&self, types: &[TypeSignature]) -> Vec<TypeSignature> {
        types.iter().map(|t| self.instantiate_type(t)).collect()
    }

    /// Produce the concrete definition; the result carries no generics
    pub fn instantiate_type_definition(&self, def: &TypeDefinition) -> TypeDefinition {
        match def {
            TypeDefinition::Struct(s) => TypeDefinition::Struct(StructDefinition {
                name: s.name.clone(),
                fields: s
                    .fields
                    .iter()
                    .map(|f| Field {
                        name: f.name.clone(),
                        field_type: self.instantiate_type(&f.field_type),
                    })
                    .collect(),
                generics: Vec::new(),
                origin_file: s.origin_file.clone(),
            }),
            TypeDefinition::Union(u) => TypeDefinition::Union(UnionDefinition {
                name: u.name.clone(),
                alternatives: self.instantiate_types(&u.alternatives),
                generics: Vec::new(),
                origin_file: u.origin_file.clone(),
            }),
            TypeDefinition::Alias(a) => TypeDefinition::Alias(TypeAlias {
                name: a.name.clone(),
                aliased: self.instantiate_type(&a.aliased),
                generics: Vec::new(),
                origin_file: a.origin_file.clone(),
            }),
        }
    }

    /// Produce a renamed, non-generic copy of a function
    pub fn instantiate_function(&self, def: &FunctionDefinition, new_name: String) -> FunctionDefinition {
        FunctionDefinition {
            name: new_name,
            arguments: def
                .arguments
                .iter()
                .map(|a| Argument {
                    name: a.name.clone(),
                    argument_type: self.instantiate_type(&a.argument_type),
                })
                .collect(),
            return_type: def.return_type.as_ref().map(|t| self.instantiate_type(t)),
            generics: Vec::new(),
            body: self.instantiate_statements(&def.body),
            origin_file: def.origin_file.clone(),
            span: def.span,
        }
    }

    fn instantiate_statements(&self, statements: &[Statement]) -> Vec<Statement> {
        statements.iter().map(|s| self.instantiate_statement(s)).collect()
    }

    pub fn instantiate_statement(&self, statement: &Statement) -> Statement {
        match statement {
            Statement::VariableDeclaration { identifier, declared_type, value, span } => {
                Statement::VariableDeclaration {
                    identifier: identifier.clone(),
                    declared_type: self.instantiate_type(declared_type),
                    value: value.as_ref().map(|v| self.instantiate_expression(v)),
                    span: *span,
                }
            }
            Statement::ConstDeclaration { identifier, declared_type, value, span } => {
                Statement::ConstDeclaration {
                    identifier: identifier.clone(),
                    declared_type: self.instantiate_type(declared_type),
                    value: self.instantiate_expression(value),
                    span: *span,
                }
            }
            Statement::Assignment { target, value, span } => Statement::Assignment {
                target: self.instantiate_expression(target),
                value: self.instantiate_expression(value),
                span: *span,
            },
            Statement::Conditional { condition, then_branch, else_branch, span } => {
                Statement::Conditional {
                    condition: self.instantiate_expression(condition),
                    then_branch: self.instantiate_statements(then_branch),
                    else_branch: self.instantiate_statements(else_branch),
                    span: *span,
                }
            }
            Statement::WhileLoop { condition, body, span } => Statement::WhileLoop {
                condition: self.instantiate_expression(condition),
                body: self.instantiate_statements(body),
                span: *span,
            },
            Statement::UntilLoop { condition, body, span } => Statement::UntilLoop {
                condition: self.instantiate_expression(condition),
                body: self.instantiate_statements(body),
                span: *span,
            },
            Statement::Return { value, span } => Statement::Return {
                value: value.as_ref().map(|v| self.instantiate_expression(v)),
                span: *span,
            },
            Statement::FunctionCall(call) => Statement::FunctionCall(self.instantiate_call(call)),
            Statement::Continue { .. } | Statement::Break { .. } => statement.clone(),
        }
    }

    fn instantiate_call(&self, call: &FunctionCall) -> FunctionCall {
        FunctionCall {
            arguments: call.arguments.iter().map(|a| self.instantiate_expression(a)).collect(),
            instantiated_generics: self.instantiate_types(&call.instantiated_generics),
            ..call.clone()
        }
    }

    pub fn instantiate_expression(&self, expression: &Expression) -> Expression {
        match expression {
            Expression::FunctionCall(call) => Expression::FunctionCall(self.instantiate_call(call)),
            Expression::BinaryOperator { operator, left, right, span } => Expression::BinaryOperator {
                operator: *operator,
                left: Box::new(self.instantiate_expression(left)),
                right: Box::new(self.instantiate_expression(right)),
                span: *span,
            },
            Expression::UnaryOperator { operator, operand, span } => Expression::UnaryOperator {
                operator: *operator,
                operand: Box::new(self.instantiate_expression(operand)),
                span: *span,
            },
            Expression::ArrayLiteral { length, stored_type, elements, span } => Expression::ArrayLiteral {
                length: *length,
                stored_type: self.instantiate_type(stored_type),
                elements: elements.iter().map(|e| self.instantiate_expression(e)).collect(),
                span: *span,
            },
            Expression::TypeOperator { operator, expression, type_signature, span } => {
                Expression::TypeOperator {
                    operator: *operator,
                    expression: Box::new(self.instantiate_expression(expression)),
                    type_signature: self.instantiate_type(type_signature),
                    span: *span,
                }
            }
            Expression::DotMemberAccess { struct_value, member, span } => Expression::DotMemberAccess {
                struct_value: Box::new(self.instantiate_expression(struct_value)),
                member: member.clone(),
                span: *span,
            },
            Expression::SquareBracketsAccess { storage, index, span } => Expression::SquareBracketsAccess {
                storage: Box::new(self.instantiate_expression(storage)),
                index: Box::new(self.instantiate_expression(index)),
                span: *span,
            },
            Expression::IntLiteral { .. }
            | Expression::FloatLiteral { .. }
            | Expression::CharLiteral { .. }
            | Expression::BoolLiteral { .. }
            | Expression::StringLiteral { .. }
            | Expression::Identifier { .. } => expression.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FLOAT, INT};
    use crate::utils::Span;
    use pretty_assertions::assert_eq;

    fn t() -> TypeSignature {
        TypeSignature::template("T")
    }

    #[test]
    fn test_rules_lookup_and_binding_count() {
        let generics = vec!["T".to_string(), "U".to_string()];
        let rules = SubstitutionRules::zip(&generics[..1], &[TypeSignature::primitive(INT)]);
        assert_eq!(rules.find("T"), Some(&TypeSignature::primitive(INT)));
        assert_eq!(rules.find("U"), None);
        assert_eq!(rules.count_bound(&generics), 1);
    }

    #[test]
    fn test_unbound_templates_are_kept() {
        let rules = SubstitutionRules::zip(&["T".to_string()], &[TypeSignature::primitive(FLOAT)]);
        let engine = GenericsInstantiationEngine::new(&rules);
        let ty = TypeSignature::inline_union(vec![
            TypeSignature::pointer(t()),
            TypeSignature::template("U"),
        ]);
        assert_eq!(
            engine.instantiate_type(&ty),
            TypeSignature::inline_union(vec![
                TypeSignature::pointer(TypeSignature::primitive(FLOAT)),
                TypeSignature::template("U"),
            ])
        );
    }

    #[test]
    fn test_instantiate_type_definition_clears_generics() {
        let def = TypeDefinition::Struct(StructDefinition {
            name: "Box".to_string(),
            fields: vec![Field { name: "value".to_string(), field_type: t() }],
            generics: vec!["T".to_string()],
            origin_file: "box.mer".to_string(),
        });
        let rules = SubstitutionRules::zip(&["T".to_string()], &[TypeSignature::primitive(INT)]);
        let TypeDefinition::Struct(s) = GenericsInstantiationEngine::new(&rules).instantiate_type_definition(&def) else {
            panic!("expected struct");
        };
        assert!(s.generics.is_empty());
        assert_eq!(s.fields[0].field_type, TypeSignature::primitive(INT));
    }

    #[test]
    fn test_instantiate_function_rewrites_body() {
        let def = FunctionDefinition {
            name: "first".to_string(),
            arguments: vec![Argument { name: "items".to_string(), argument_type: TypeSignature::slice(t()) }],
            return_type: Some(t()),
            generics: vec!["T".to_string()],
            body: vec![Statement::VariableDeclaration {
                identifier: "tmp".to_string(),
                declared_type: TypeSignature::array(2, t()),
                value: Some(Expression::ArrayLiteral {
                    length: 2,
                    stored_type: t(),
                    elements: vec![],
                    span: Span::dummy(),
                }),
                span: Span::dummy(),
            }],
            origin_file: "lib.mer".to_string(),
            span: Span::dummy(),
        };
        let rules = SubstitutionRules::zip(&def.generics, &[TypeSignature::primitive(INT)]);
        let inst = GenericsInstantiationEngine::new(&rules).instantiate_function(&def, "first<Int>".to_string());

        assert_eq!(inst.name, "first<Int>");
        assert!(!inst.is_generic());
        assert_eq!(inst.return_type, Some(TypeSignature::primitive(INT)));
        let Statement::VariableDeclaration { declared_type, value: Some(Expression::ArrayLiteral { stored_type, .. }), .. } = &inst.body[0] else {
            panic!("expected declaration with array literal");
        };
        assert_eq!(declared_type, &TypeSignature::array(2, TypeSignature::primitive(INT)));
        assert_eq!(stored_type, &TypeSignature::primitive(INT));
    }
}
