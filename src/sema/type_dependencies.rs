//! Type dependency navigation
//!
//! Walks the body of every stored type definition. Each referenced type
//! must exist, and no struct, union or alias may contain itself by value.
//! Pointers and slices break the by-value chain, so their targets are only
//! checked for existence.

use log::trace;

use crate::sema::type_registry::TypeDefinitionsRegister;
use crate::types::{TypeDefinition, TypeSignature};
use crate::utils::{Error, Result};

pub struct TypeDependencyNavigator<'a> {
    types: &'a TypeDefinitionsRegister,
    /// Keys of the definitions being expanded by value
    visiting: Vec<String>,
}

impl<'a> TypeDependencyNavigator<'a> {
    pub fn new(types: &'a TypeDefinitionsRegister) -> Self {
        Self { types, visiting: Vec::new() }
    }

    pub fn visit_all_type_definitions(&mut self) -> Result<()> {
        for (key, def) in self.types.stored_definitions() {
            self.visit_type_definition(&key, &def)?;
        }
        Ok(())
    }

    fn visit_type_definition(&mut self, key: &str, def: &TypeDefinition) -> Result<()> {
        if self.visiting.iter().any(|k| k == key) {
            return Err(Error::CyclicTypeDependency { name: def.name().to_string() });
        }
        trace!("visiting type {}", key);
        self.visiting.push(key.to_string());
        let result = match def {
            TypeDefinition::Struct(s) => s.fields.iter().try_for_each(|f| self.visit_type_signature(&f.field_type)),
            TypeDefinition::Union(u) => u.alternatives.iter().try_for_each(|a| self.visit_type_signature(a)),
            TypeDefinition::Alias(a) => self.visit_type_signature(&a.aliased),
        };
        self.visiting.pop();
        result
    }

    fn visit_type_signature(&mut self, ty: &TypeSignature) -> Result<()> {
        // bodies of generic definitions are checked once instantiated
        if ty.is_generic() {
            return Ok(());
        }
        match ty {
            TypeSignature::Primitive { .. } | TypeSignature::Template { .. } => Ok(()),
            TypeSignature::Pointer { pointed } => self.types.verify_that_the_type_exists(pointed),
            TypeSignature::Slice { element } => self.types.verify_that_the_type_exists(element),
            TypeSignature::Array { element, .. } => self.visit_type_signature(element),
            TypeSignature::InlineUnion { alternatives } => {
                alternatives.iter().try_for_each(|a| self.visit_type_signature(a))
            }
            TypeSignature::Custom(custom) => {
                let key = self.types.get_fully_qualified_name(ty)?;
                let def = self.types.retrieve(custom)?;
                self.visit_type_definition(&key, &def)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::testing::*;
    use pretty_assertions::assert_eq;

    fn navigate(types: Vec<TypeDefinition>) -> Result<()> {
        let env = Registers::new(vec![main_file(types, vec![])]);
        TypeDependencyNavigator::new(&env.types).visit_all_type_definitions()
    }

    #[test]
    fn test_well_formed_definitions() {
        let result = navigate(vec![
            struct_def("Point", vec![("x", int()), ("y", int())]),
            struct_def("Segment", vec![("from", custom("Point")), ("to", custom("Point"))]),
            union_def("Shape", vec![custom("Point"), custom("Segment")]),
            alias_def("Figure", custom("Shape")),
        ]);
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_unknown_field_type() {
        let result = navigate(vec![struct_def("S", vec![("x", custom("Ghost"))])]);
        assert!(matches!(result, Err(Error::UnknownType { name, .. }) if name == "Ghost"));
    }

    #[test]
    fn test_unknown_alternative_and_alias_target() {
        assert!(matches!(
            navigate(vec![union_def("U", vec![int(), custom("Ghost")])]),
            Err(Error::UnknownType { .. })
        ));
        assert!(matches!(navigate(vec![alias_def("A", custom("Ghost"))]), Err(Error::UnknownType { .. })));
        assert!(matches!(
            navigate(vec![struct_def("S", vec![("p", TypeSignature::pointer(custom("Ghost")))])]),
            Err(Error::UnknownType { .. })
        ));
    }

    #[test]
    fn test_mutual_by_value_structs_are_cyclic() {
        let result = navigate(vec![
            struct_def("A", vec![("b", custom("B"))]),
            struct_def("B", vec![("a", custom("A"))]),
        ]);
        assert!(matches!(result, Err(Error::CyclicTypeDependency { name }) if name == "A"));
    }

    #[test]
    fn test_cycle_through_array_and_union() {
        assert!(matches!(
            navigate(vec![struct_def("Grid", vec![("cells", TypeSignature::array(4, custom("Grid")))])]),
            Err(Error::CyclicTypeDependency { .. })
        ));
        assert!(matches!(
            navigate(vec![union_def("Tree", vec![int(), custom("Node")]), struct_def("Node", vec![("t", custom("Tree"))])]),
            Err(Error::CyclicTypeDependency { .. })
        ));
    }

    #[test]
    fn test_pointers_and_slices_break_cycles() {
        let result = navigate(vec![
            struct_def("List", vec![("value", int()), ("next", TypeSignature::pointer(custom("List")))]),
            struct_def("Tree", vec![("children", TypeSignature::slice(custom("Tree")))]),
        ]);
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_generic_instances_are_followed() {
        let result = navigate(vec![
            generic_struct("Box", &["T"], vec![("inner", template("T"))]),
            struct_def("Loop", vec![("boxed", generic_custom("Box", vec![custom("Loop")]))]),
        ]);
        assert!(matches!(result, Err(Error::CyclicTypeDependency { .. })));

        let result = navigate(vec![
            generic_struct("Box", &["T"], vec![("inner", template("T"))]),
            struct_def("Holder", vec![("boxed", generic_custom("Box", vec![int()]))]),
        ]);
        assert_eq!(result, Ok(()));
    }
}
