//! Transitive closure of the structs reachable from a set of root types.
use std::fmt;
use indexmap::IndexMap;

use crate::error::BindError;
use crate::structs::{BoundStruct, StructRegistry};
use crate::ty::GenericType;

/// A non-fatal problem found while walking the type graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Issue {
    UnresolvedStruct(String),
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::UnresolvedStruct(name) => write!(f, "could not find struct {name}"),
        }
    }
}

/// Bound structs keyed by the canonical string of their actual type.
///
/// A struct is recorded before its own arguments and fields are walked, so
/// membership in `structs` is what stops self- and mutually-referential
/// graphs from recursing forever.
#[derive(Clone, Debug, Default)]
pub struct StructClosure {
    structs: IndexMap<String, BoundStruct>,
    issues: Vec<Issue>,
}

impl StructClosure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of<'t, I>(roots: I, registry: &StructRegistry) -> Result<Self, BindError>
    where
        I: IntoIterator<Item = &'t GenericType>,
    {
        let mut closure = StructClosure::new();
        for root in roots {
            closure.visit(root, registry)?;
        }
        Ok(closure)
    }

    pub fn visit(&mut self, ty: &GenericType, registry: &StructRegistry) -> Result<(), BindError> {
        if let Some(element) = ty.as_list() {
            return self.visit(element, registry);
        }
        // map keys are never struct-valued
        if let Some((_, value)) = ty.as_map() {
            return self.visit(value, registry);
        }
        match ty {
            GenericType::Named { .. } if ty.is_basic_type() => Ok(()),
            GenericType::Named { name, args } => {
                let key = ty.canonical();
                if self.structs.contains_key(&key) {
                    return Ok(());
                }
                let Some(definition) = registry.get(name) else {
                    self.issues.push(Issue::UnresolvedStruct(name.clone()));
                    return Ok(());
                };
                let bound = definition.as_bound_struct(ty)?;
                let field_types: Vec<GenericType> = bound.fields.iter().map(|f| f.ty.clone()).collect();
                self.structs.insert(key, bound);

                for arg in args {
                    self.visit(arg, registry)?;
                }
                for field_ty in &field_types {
                    self.visit(field_ty, registry)?;
                }
                Ok(())
            }
            GenericType::Var(_) => Ok(()),
            GenericType::Union(alternatives) => {
                for alternative in alternatives.values() {
                    self.visit(alternative, registry)?;
                }
                Ok(())
            }
        }
    }

    pub fn structs(&self) -> &IndexMap<String, BoundStruct> {
        &self.structs
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_parts(self) -> (IndexMap<String, BoundStruct>, Vec<Issue>) {
        (self.structs, self.issues)
    }
}
