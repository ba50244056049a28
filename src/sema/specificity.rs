//! Function specificity descriptor
//!
//! Summarises how concrete a function's signature is, so overload
//! resolution can prefer the most specific applicable candidate.

use std::cmp::{Ordering, Reverse};

use crate::frontend::ast::FunctionDefinition;
use crate::sema::type_registry::TypeDefinitionsRegister;
use crate::types::{TypeSignature, RAW_STRING, STRING};
use crate::utils::Result;

/// Conversion weight of a `RawString` argument
const RAW_STRING_CONVERSION_COST: usize = 3;
/// Conversion weight of a `String` argument
const STRING_CONVERSION_COST: usize = 2;

/// Outcome of comparing two descriptors, from the left-hand side's view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecificityComparison {
    LessSpecific,
    EquallySpecific,
    MoreSpecific,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSpecificityDescriptor {
    pub is_generic: bool,
    /// Occurrences of template parameters in the argument types
    pub generic_uses: usize,
    /// Generic arguments of custom types, counted recursively
    pub complexity: usize,
    /// Union-typed positions
    pub unions: usize,
    /// Alternatives covered by those unions
    pub covered_cases: usize,
    /// Weighted count of arguments accepting implicit conversions
    pub conversions: usize,
}

impl FunctionSpecificityDescriptor {
    pub fn new(function: &FunctionDefinition, types: &TypeDefinitionsRegister) -> Result<Self> {
        let mut descriptor = Self {
            is_generic: function.is_generic(),
            generic_uses: 0,
            complexity: 0,
            unions: 0,
            covered_cases: 0,
            conversions: 0,
        };
        for ty in function.argument_types() {
            descriptor.visit(ty, true, types)?;
        }
        Ok(descriptor)
    }

    /// Loses against every real function
    pub fn worst_possible_specificity() -> Self {
        Self {
            is_generic: true,
            generic_uses: usize::MAX,
            complexity: 0,
            unions: usize::MAX,
            covered_cases: usize::MAX,
            conversions: usize::MAX,
        }
    }

    /// `convertible` holds only for a type passed by value as the argument itself
    fn visit(&mut self, ty: &TypeSignature, convertible: bool, types: &TypeDefinitionsRegister) -> Result<()> {
        let ty = &types.unalias(ty)?;
        match ty {
            TypeSignature::Template { .. } => self.generic_uses += 1,
            TypeSignature::Primitive { name } => {
                if convertible {
                    self.conversions += match name.as_str() {
                        RAW_STRING => RAW_STRING_CONVERSION_COST,
                        STRING => STRING_CONVERSION_COST,
                        _ => 0,
                    };
                }
            }
            TypeSignature::Custom(custom) => {
                self.complexity += custom.type_parameters.len();
                for param in &custom.type_parameters {
                    self.visit(param, false, types)?;
                }
                self.count_union(ty, types)?;
            }
            TypeSignature::InlineUnion { alternatives } => {
                self.generic_uses += alternatives.iter().map(count_templates).sum::<usize>();
                self.count_union(ty, types)?;
            }
            TypeSignature::Pointer { pointed } => self.visit(pointed, false, types)?,
            TypeSignature::Array { .. } | TypeSignature::Slice { .. } => {}
        }
        Ok(())
    }

    fn count_union(&mut self, ty: &TypeSignature, types: &TypeDefinitionsRegister) -> Result<()> {
        let alternatives = types.fetch_union_alternatives(ty)?;
        if !alternatives.is_empty() {
            self.unions += 1;
            self.covered_cases += alternatives.len();
        }
        Ok(())
    }

    /// Lower is more specific
    fn rank(&self) -> (bool, usize, Reverse<usize>, usize, usize, usize) {
        (
            self.is_generic,
            self.generic_uses,
            Reverse(self.complexity),
            self.unions,
            self.covered_cases,
            self.conversions,
        )
    }

    pub fn compare_with(&self, other: &Self) -> SpecificityComparison {
        match self.rank().cmp(&other.rank()) {
            Ordering::Less => SpecificityComparison::MoreSpecific,
            Ordering::Equal => SpecificityComparison::EquallySpecific,
            Ordering::Greater => SpecificityComparison::LessSpecific,
        }
    }
}

fn count_templates(ty: &TypeSignature) -> usize {
    match ty {
        TypeSignature::Template { .. } => 1,
        TypeSignature::Primitive { .. } => 0,
        TypeSignature::Custom(custom) => custom.type_parameters.iter().map(count_templates).sum(),
        TypeSignature::Pointer { pointed } => count_templates(pointed),
        TypeSignature::Array { element, .. } | TypeSignature::Slice { element } => count_templates(element),
        TypeSignature::InlineUnion { alternatives } => alternatives.iter().map(count_templates).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::testing::*;
    use pretty_assertions::assert_eq;

    fn register(types: Vec<crate::types::TypeDefinition>) -> TypeDefinitionsRegister {
        TypeDefinitionsRegister::from_project(project(vec![main_file(types, vec![])])).unwrap()
    }

    fn describe(types: &TypeDefinitionsRegister, function: FunctionDefinition) -> FunctionSpecificityDescriptor {
        let mut function = function;
        function.assign_origin(MAIN_FILE);
        FunctionSpecificityDescriptor::new(&function, types).unwrap()
    }

    #[test]
    fn test_metrics() {
        let types = register(vec![
            generic_struct("Pair", &["A", "B"], vec![("a", template("A")), ("b", template("B"))]),
            union_def("Number", vec![int(), float()]),
            union_def("Scalar", vec![custom("Number"), character()]),
        ]);
        let f = generic_function(
            "f",
            &["T"],
            vec![
                template("T"),
                generic_custom("Pair", vec![int(), generic_custom("Pair", vec![template("T"), string()])]),
                custom("Scalar"),
                raw_string(),
                TypeSignature::pointer(string()),
                TypeSignature::slice(template("T")),
            ],
            None,
        );
        assert_eq!(
            describe(&types, f),
            FunctionSpecificityDescriptor {
                is_generic: true,
                generic_uses: 2,
                complexity: 4,
                unions: 1,
                covered_cases: 3,
                conversions: 3,
            }
        );
    }

    #[test]
    fn test_non_generic_beats_generic() {
        let types = register(vec![]);
        let concrete = describe(&types, function("f", vec![int()], None));
        let generic = describe(&types, generic_function("f", &["T"], vec![template("T")], None));
        assert_eq!(concrete.compare_with(&generic), SpecificityComparison::MoreSpecific);
        assert_eq!(generic.compare_with(&concrete), SpecificityComparison::LessSpecific);
    }

    #[test]
    fn test_fewer_unions_and_conversions_win() {
        let types = register(vec![union_def("Number", vec![int(), float()])]);
        let plain = describe(&types, function("f", vec![int()], None));
        let union = describe(&types, function("f", vec![custom("Number")], None));
        assert_eq!(plain.compare_with(&union), SpecificityComparison::MoreSpecific);

        let string_arg = describe(&types, function("g", vec![string()], None));
        let raw_arg = describe(&types, function("g", vec![raw_string()], None));
        assert_eq!(string_arg.compare_with(&raw_arg), SpecificityComparison::MoreSpecific);
    }

    #[test]
    fn test_aliases_are_measured_by_their_target() {
        let types = register(vec![
            alias_def("Text", string()),
            union_def("Number", vec![int(), float()]),
            alias_def("Amount", custom("Number")),
        ]);
        let aliased = describe(&types, function("f", vec![custom("Text"), custom("Amount")], None));
        let direct = describe(&types, function("f", vec![string(), custom("Number")], None));
        assert_eq!(aliased, direct);
        assert_eq!(aliased.conversions, STRING_CONVERSION_COST);
    }

    #[test]
    fn test_higher_complexity_wins() {
        let types = register(vec![generic_struct("Box", &["T"], vec![("v", template("T"))])]);
        let nested = describe(&types, generic_function("f", &["T"], vec![generic_custom("Box", vec![template("T")])], None));
        let bare = describe(&types, generic_function("f", &["T"], vec![template("T")], None));
        assert_eq!(nested.compare_with(&bare), SpecificityComparison::MoreSpecific);
    }

    #[test]
    fn test_everything_beats_the_worst() {
        let types = register(vec![]);
        let worst = FunctionSpecificityDescriptor::worst_possible_specificity();
        let generic = describe(&types, generic_function("f", &["T"], vec![template("T"), template("T")], None));
        assert_eq!(generic.compare_with(&worst), SpecificityComparison::MoreSpecific);
        assert_eq!(worst.compare_with(&worst), SpecificityComparison::EquallySpecific);
    }
}
