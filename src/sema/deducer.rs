//! Expression type deducer
//!
//! Computes the type of an expression tree bottom-up. Children are always
//! deduced before their parent is checked. Deduced types are unaliased.

use crate::frontend::ast::{BinaryOperator, Expression, FunctionCall, TypeOperator, UnaryOperator};
use crate::sema::call_resolver::{CallResolution, FunctionCallResolver};
use crate::sema::scope::ScopeContext;
use crate::sema::type_registry::TypeDefinitionsRegister;
use crate::types::*;
use crate::utils::{Error, Result, Span};

/// Member available on strings and slices
pub const LENGTH_MEMBER: &str = "len";

pub struct ExpressionTypeDeducer<'a> {
    types: &'a TypeDefinitionsRegister,
    calls: FunctionCallResolver<'a>,
    scope: &'a ScopeContext,
}

impl<'a> ExpressionTypeDeducer<'a> {
    pub fn new(types: &'a TypeDefinitionsRegister, calls: FunctionCallResolver<'a>, scope: &'a ScopeContext) -> Self {
        Self { types, calls, scope }
    }

    pub fn deduce(&self, expression: &Expression) -> Result<TypeSignature> {
        let ty = self.deduce_unaliased(expression)?;
        self.types.unalias(&ty)
    }

    fn deduce_unaliased(&self, expression: &Expression) -> Result<TypeSignature> {
        match expression {
            Expression::IntLiteral { .. } => Ok(TypeSignature::primitive(INT)),
            Expression::FloatLiteral { .. } => Ok(TypeSignature::primitive(FLOAT)),
            Expression::CharLiteral { .. } => Ok(TypeSignature::primitive(CHAR)),
            Expression::BoolLiteral { .. } => Ok(TypeSignature::primitive(BOOL)),
            Expression::StringLiteral { .. } => Ok(TypeSignature::primitive(STRING)),
            Expression::Identifier { name, span } => match self.scope.lookup(name) {
                Some(object) => Ok(object.object_type.clone()),
                None => Err(Error::UndefinedVariable { name: name.clone(), span: *span }),
            },
            Expression::FunctionCall(call) => self.deduce_call(call),
            Expression::ArrayLiteral { length, stored_type, .. } => {
                self.types.verify_that_the_type_exists(stored_type)?;
                Ok(TypeSignature::array(*length, stored_type.clone()))
            }
            Expression::TypeOperator { operator, expression, type_signature, .. } => {
                self.deduce(expression)?;
                self.types.verify_that_the_type_exists(type_signature)?;
                Ok(match operator {
                    TypeOperator::Is => TypeSignature::primitive(BOOL),
                    TypeOperator::As => type_signature.clone(),
                })
            }
            Expression::BinaryOperator { operator, left, right, span } => {
                self.deduce_binary(*operator, left, right, *span)
            }
            Expression::UnaryOperator { operator, operand, span } => self.deduce_unary(*operator, operand, *span),
            Expression::SquareBracketsAccess { storage, index, span } => {
                let storage_type = self.deduce(storage)?;
                let index_type = self.deduce(index)?;
                if !index_type.is_primitive_named(INT) {
                    return Err(mismatch(INT, &index_type, index.span()));
                }
                match storage_type {
                    TypeSignature::Array { element, .. } | TypeSignature::Slice { element } => Ok(*element),
                    ref ty if ty.is_string_kind() => Ok(TypeSignature::primitive(CHAR)),
                    other => Err(Error::NotIndexable { type_name: other.to_string(), span: *span }),
                }
            }
            Expression::DotMemberAccess { struct_value, member, span } => {
                let mut ty = self.deduce(struct_value)?;
                while let TypeSignature::Pointer { pointed } = ty {
                    ty = self.types.unalias(&pointed)?;
                }
                self.member_type(&ty, member, *span)
            }
        }
    }

    /// Types of a call's arguments, in order
    pub fn deduce_arguments(&self, call: &FunctionCall) -> Result<Vec<TypeSignature>> {
        call.arguments.iter().map(|a| self.deduce(a)).collect()
    }

    fn deduce_call(&self, call: &FunctionCall) -> Result<TypeSignature> {
        let arg_types = self.deduce_arguments(call)?;
        match self.calls.resolve_function_call_return_type(call, &arg_types)? {
            CallResolution::Type(ty) => Ok(ty),
            CallResolution::Void => Err(Error::VoidValue { call: call.display_name(), span: call.span }),
            CallResolution::Unresolved => Err(Error::UnresolvedGenericCall { call: call.display_name(), span: call.span }),
        }
    }

    fn deduce_binary(&self, operator: BinaryOperator, left: &Expression, right: &Expression, span: Span) -> Result<TypeSignature> {
        let left_type = self.deduce(left)?;
        let right_type = self.deduce(right)?;

        if operator.is_logical() {
            for (ty, operand) in [(&left_type, left), (&right_type, right)] {
                if !ty.is_primitive_named(BOOL) {
                    return Err(mismatch(BOOL, ty, operand.span()));
                }
            }
            return Ok(TypeSignature::primitive(BOOL));
        }

        if !self.same_type(&left_type, &right_type)? {
            return Err(Error::TypeMismatch {
                expected: left_type.to_string(),
                got: right_type.to_string(),
                span,
            });
        }
        if operator.is_equality() {
            return Ok(TypeSignature::primitive(BOOL));
        }
        if operator.is_ordering() {
            if !left_type.is_numeric() && !left_type.is_primitive_named(CHAR) {
                return Err(mismatch("Int, Float or Char", &left_type, span));
            }
            return Ok(TypeSignature::primitive(BOOL));
        }
        if !left_type.is_numeric() {
            return Err(mismatch("Int or Float", &left_type, span));
        }
        Ok(left_type)
    }

    fn deduce_unary(&self, operator: UnaryOperator, operand: &Expression, span: Span) -> Result<TypeSignature> {
        let operand_type = self.deduce(operand)?;
        match operator {
            UnaryOperator::AddressOf => Ok(TypeSignature::pointer(operand_type)),
            UnaryOperator::Deref => match operand_type {
                TypeSignature::Pointer { pointed } => Ok(*pointed),
                other => Err(Error::CannotDeref { type_name: other.to_string(), span }),
            },
            UnaryOperator::Not => {
                if !operand_type.is_primitive_named(BOOL) {
                    return Err(mismatch(BOOL, &operand_type, span));
                }
                Ok(operand_type)
            }
            UnaryOperator::Plus | UnaryOperator::Minus => {
                if !operand_type.is_numeric() {
                    return Err(mismatch("Int or Float", &operand_type, span));
                }
                Ok(operand_type)
            }
        }
    }

    fn member_type(&self, ty: &TypeSignature, member: &str, span: Span) -> Result<TypeSignature> {
        match ty {
            TypeSignature::Custom(custom) => match self.types.retrieve(custom)? {
                TypeDefinition::Struct(def) => def
                    .fields
                    .into_iter()
                    .find(|f| f.name == member)
                    .map(|f| f.field_type)
                    .ok_or_else(|| Error::UnknownField {
                        field: member.to_string(),
                        type_name: ty.to_string(),
                        span,
                    }),
                _ => Err(Error::NotAStruct { type_name: ty.to_string(), span }),
            },
            _ if ty.is_string_kind() || matches!(ty, TypeSignature::Slice { .. }) => {
                if member == LENGTH_MEMBER {
                    Ok(TypeSignature::primitive(INT))
                } else {
                    Err(Error::UnknownField { field: member.to_string(), type_name: ty.to_string(), span })
                }
            }
            _ => Err(Error::NotAStruct { type_name: ty.to_string(), span }),
        }
    }

    fn same_type(&self, a: &TypeSignature, b: &TypeSignature) -> Result<bool> {
        Ok(self.types.get_fully_qualified_name(a)? == self.types.get_fully_qualified_name(b)?)
    }
}

fn mismatch(expected: &str, got: &TypeSignature, span: Span) -> Error {
    Error::TypeMismatch { expected: expected.to_string(), got: got.to_string(), span }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::testing::*;
    use pretty_assertions::assert_eq;

    fn env() -> Registers {
        Registers::new(vec![main_file(
            vec![
                struct_def("Point", vec![("x", int()), ("y", float())]),
                alias_def("Meters", float()),
                union_def("Shape", vec![custom("Point"), int()]),
            ],
            vec![
                function("norm", vec![custom("Point")], Some(custom("Meters"))),
                function("describe", vec![custom("Point")], Some(string())),
                function("describe", vec![int()], Some(string())),
                function("print", vec![string()], None),
            ],
        )])
    }

    fn scope() -> ScopeContext {
        let mut scope = ScopeContext::new();
        scope.add_object("p", custom("Point"), false, false, Span::dummy()).unwrap();
        scope.add_object("pp", TypeSignature::pointer(custom("Point")), false, false, Span::dummy()).unwrap();
        scope.add_object("s", string(), false, false, Span::dummy()).unwrap();
        scope.add_object("xs", TypeSignature::slice(int()), false, false, Span::dummy()).unwrap();
        scope.add_object("shape", custom("Shape"), false, false, Span::dummy()).unwrap();
        scope
    }

    fn deduce(env: &Registers, expression: &Expression) -> Result<TypeSignature> {
        let scope = scope();
        let calls = FunctionCallResolver::new(&env.types, &env.functions, &env.caches);
        ExpressionTypeDeducer::new(&env.types, calls, &scope).deduce(expression)
    }

    fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
        Expression::BinaryOperator { operator, left: Box::new(left), right: Box::new(right), span: Span::dummy() }
    }

    fn unary(operator: UnaryOperator, operand: Expression) -> Expression {
        Expression::UnaryOperator { operator, operand: Box::new(operand), span: Span::dummy() }
    }

    fn member(value: Expression, member: &str) -> Expression {
        Expression::DotMemberAccess { struct_value: Box::new(value), member: member.to_string(), span: Span::dummy() }
    }

    fn index(storage: Expression, at: Expression) -> Expression {
        Expression::SquareBracketsAccess { storage: Box::new(storage), index: Box::new(at), span: Span::dummy() }
    }

    fn id(name: &str) -> Expression {
        Expression::identifier(name)
    }

    #[test]
    fn test_literals_and_identifiers() {
        let env = env();
        assert_eq!(deduce(&env, &Expression::int(1)).unwrap(), int());
        assert_eq!(
            deduce(&env, &Expression::StringLiteral { value: "hi".into(), span: Span::dummy() }).unwrap(),
            string()
        );
        assert_eq!(deduce(&env, &id("p")).unwrap(), custom("Point"));
        assert!(matches!(deduce(&env, &id("nope")), Err(Error::UndefinedVariable { name, .. }) if name == "nope"));
    }

    #[test]
    fn test_call_return_types_are_unaliased() {
        let env = env();
        let norm = Expression::FunctionCall(call_with("norm", vec![id("p")]));
        assert_eq!(deduce(&env, &norm).unwrap(), float());
    }

    #[test]
    fn test_union_argument_goes_through_adoption() {
        let env = env();
        let describe = Expression::FunctionCall(call_with("describe", vec![id("shape")]));
        assert_eq!(deduce(&env, &describe).unwrap(), string());
    }

    #[test]
    fn test_void_call_has_no_value() {
        let env = env();
        let print = Expression::FunctionCall(call_with("print", vec![id("s")]));
        assert!(matches!(deduce(&env, &print), Err(Error::VoidValue { .. })));
    }

    #[test]
    fn test_binary_operators() {
        let env = env();
        let sum = binary(BinaryOperator::Add, Expression::int(1), Expression::int(2));
        assert_eq!(deduce(&env, &sum).unwrap(), int());

        let less = binary(BinaryOperator::Lt, Expression::int(1), Expression::int(2));
        assert_eq!(deduce(&env, &less).unwrap(), boolean());

        let both = binary(BinaryOperator::And, less.clone(), less);
        assert_eq!(deduce(&env, &both).unwrap(), boolean());

        let mixed = binary(BinaryOperator::Add, Expression::int(1), member(id("p"), "y"));
        assert!(matches!(deduce(&env, &mixed), Err(Error::TypeMismatch { .. })));

        let strings = binary(BinaryOperator::Sub, id("s"), id("s"));
        assert!(matches!(deduce(&env, &strings), Err(Error::TypeMismatch { .. })));

        let equal = binary(BinaryOperator::Eq, id("s"), id("s"));
        assert_eq!(deduce(&env, &equal).unwrap(), boolean());
    }

    #[test]
    fn test_unary_operators() {
        let env = env();
        assert_eq!(
            deduce(&env, &unary(UnaryOperator::AddressOf, id("p"))).unwrap(),
            TypeSignature::pointer(custom("Point"))
        );
        assert_eq!(deduce(&env, &unary(UnaryOperator::Deref, id("pp"))).unwrap(), custom("Point"));
        assert!(matches!(deduce(&env, &unary(UnaryOperator::Deref, id("p"))), Err(Error::CannotDeref { .. })));
        assert!(matches!(deduce(&env, &unary(UnaryOperator::Not, Expression::int(0))), Err(Error::TypeMismatch { .. })));
        assert_eq!(deduce(&env, &unary(UnaryOperator::Minus, Expression::int(3))).unwrap(), int());
    }

    #[test]
    fn test_member_access() {
        let env = env();
        assert_eq!(deduce(&env, &member(id("p"), "x")).unwrap(), int());
        assert_eq!(deduce(&env, &member(id("pp"), "y")).unwrap(), float());
        assert_eq!(deduce(&env, &member(id("s"), LENGTH_MEMBER)).unwrap(), int());
        assert_eq!(deduce(&env, &member(id("xs"), LENGTH_MEMBER)).unwrap(), int());
        assert!(matches!(deduce(&env, &member(id("p"), "z")), Err(Error::UnknownField { field, .. }) if field == "z"));
        assert!(matches!(deduce(&env, &member(id("shape"), "x")), Err(Error::NotAStruct { .. })));
    }

    #[test]
    fn test_indexing() {
        let env = env();
        assert_eq!(deduce(&env, &index(id("xs"), Expression::int(0))).unwrap(), int());
        assert_eq!(deduce(&env, &index(id("s"), Expression::int(0))).unwrap(), character());
        assert!(matches!(deduce(&env, &index(id("s"), id("s"))), Err(Error::TypeMismatch { .. })));
        assert!(matches!(deduce(&env, &index(id("p"), Expression::int(0))), Err(Error::NotIndexable { .. })));

        let array = Expression::ArrayLiteral { length: 3, stored_type: float(), elements: vec![], span: Span::dummy() };
        assert_eq!(deduce(&env, &index(array.clone(), Expression::int(1))).unwrap(), float());
        assert_eq!(deduce(&env, &array).unwrap(), TypeSignature::array(3, float()));
    }

    #[test]
    fn test_type_operators() {
        let env = env();
        let is = Expression::TypeOperator {
            operator: TypeOperator::Is,
            expression: Box::new(id("shape")),
            type_signature: custom("Point"),
            span: Span::dummy(),
        };
        assert_eq!(deduce(&env, &is).unwrap(), boolean());
        let cast = Expression::TypeOperator {
            operator: TypeOperator::As,
            expression: Box::new(Expression::int(1)),
            type_signature: float(),
            span: Span::dummy(),
        };
        assert_eq!(deduce(&env, &cast).unwrap(), float());
        let unknown = Expression::TypeOperator {
            operator: TypeOperator::As,
            expression: Box::new(Expression::int(1)),
            type_signature: custom("Ghost"),
            span: Span::dummy(),
        };
        assert!(matches!(deduce(&env, &unknown), Err(Error::UnknownType { .. })));
    }
}
