//! Generic struct definitions, and binding them at actual types.
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::codec;
use crate::error::BindError;
use crate::path_de;
use crate::ty::{Binding, GenericType};

// -------------------------------- Fields ---------------------------------- //

#[derive(Clone, Debug, Deserialize)]
#[serde(from = "RawField")]
pub struct FieldInfo {
    pub name: String,
    pub ty: GenericType,
    pub desc: Option<String>,
    pub deprecated: bool,
    /// Author-supplied literal, already parsed against `ty`.
    pub example_value: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    ty: GenericType,
    #[serde(default)]
    desc: Option<String>,
    #[serde(default, deserialize_with = "path_de::null_as_default")]
    deprecated: bool,
    #[serde(default)]
    example_value: Option<Value>,
}

impl From<RawField> for FieldInfo {
    fn from(raw: RawField) -> Self {
        let example_value = codec::parse(&raw.ty, raw.example_value.as_ref());
        FieldInfo {
            name: raw.name,
            ty: raw.ty,
            desc: raw.desc,
            deprecated: raw.deprecated,
            example_value,
        }
    }
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, ty: GenericType) -> Self {
        FieldInfo { name: name.into(), ty, desc: None, deprecated: false, example_value: None }
    }

    /// Attach a literal example, parsed the same way a schema literal is.
    pub fn with_example(mut self, literal: &str) -> Self {
        self.example_value = codec::parse(&self.ty, Some(&Value::String(literal.to_owned())));
        self
    }

    /// Same field with its type variables substituted.
    pub fn as_bound_field(&self, binding: &Binding) -> FieldInfo {
        FieldInfo {
            ty: self.ty.resolve_type_vars(binding),
            ..self.clone()
        }
    }
}

// ------------------------------- TypeStruct ------------------------------- //

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStruct {
    pub name: String,
    #[serde(default, deserialize_with = "path_de::null_as_default")]
    pub group_name: String,
    #[serde(default, deserialize_with = "path_de::null_as_default")]
    pub type_vars: Vec<String>,
    #[serde(default, deserialize_with = "path_de::null_as_default")]
    pub fields: Vec<FieldInfo>,
}

impl TypeStruct {
    pub fn new(name: impl Into<String>, type_vars: &[&str], fields: Vec<FieldInfo>) -> Self {
        TypeStruct {
            name: name.into(),
            group_name: String::new(),
            type_vars: type_vars.iter().map(|v| v.to_string()).collect(),
            fields,
        }
    }

    /// `Name` or `Name<T, U>`.
    pub fn signature(&self) -> String {
        if self.type_vars.is_empty() {
            self.name.clone()
        } else {
            format!("{}<{}>", self.name, self.type_vars.join(", "))
        }
    }

    /// Positional mapping from declared type variables to the actual type's
    /// arguments. The counts must agree.
    pub fn variable_binding(&self, actual: &GenericType) -> Result<Binding, BindError> {
        let args = actual.type_args();
        if actual.type_name().is_none() || args.len() != self.type_vars.len() {
            return Err(BindError::Arity {
                actual: actual.canonical(),
                signature: self.signature(),
            });
        }
        Ok(self.type_vars.iter().cloned().zip(args.iter().cloned()).collect())
    }

    pub fn as_bound_struct(&self, actual: &GenericType) -> Result<BoundStruct, BindError> {
        if actual.type_name() != Some(self.name.as_str()) {
            return Err(BindError::NameMismatch {
                actual: actual.canonical(),
                signature: self.signature(),
            });
        }
        let binding = self.variable_binding(actual)?;
        Ok(BoundStruct {
            name: self.name.clone(),
            group_name: self.group_name.clone(),
            ty: actual.clone(),
            fields: self.fields.iter().map(|f| f.as_bound_field(&binding)).collect(),
        })
    }
}

// ------------------------------- BoundStruct ------------------------------ //

/// A struct instantiated at concrete type arguments.
#[derive(Clone, Debug)]
pub struct BoundStruct {
    pub name: String,
    pub group_name: String,
    pub ty: GenericType,
    pub fields: Vec<FieldInfo>,
}

impl BoundStruct {
    pub fn key(&self) -> String {
        self.ty.canonical()
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn matches_keyword(&self, keyword: &str) -> bool {
        !keyword.is_empty() && self.name.to_uppercase().contains(&keyword.to_uppercase())
    }
}

// -------------------------------- Registry -------------------------------- //

/// Struct definitions by name, built once per schema load.
#[derive(Clone, Debug, Default)]
pub struct StructRegistry {
    structs: IndexMap<String, TypeStruct>,
}

impl StructRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, s: TypeStruct) {
        if let Some(previous) = self.structs.insert(s.name.clone(), s) {
            tracing::warn!(name = %previous.name, "duplicate struct definition, keeping the last one");
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeStruct> {
        self.structs.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeStruct> {
        self.structs.values()
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }
}

impl FromIterator<TypeStruct> for StructRegistry {
    fn from_iter<I: IntoIterator<Item = TypeStruct>>(iter: I) -> Self {
        let mut registry = StructRegistry::new();
        for s in iter {
            registry.insert(s);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn holder() -> TypeStruct {
        TypeStruct::new(
            "Holder",
            &["T"],
            vec![
                FieldInfo::new("value", GenericType::type_var("T")),
                FieldInfo::new("values", GenericType::list(GenericType::type_var("T"))),
                FieldInfo::new("count", GenericType::named("int")),
            ],
        )
    }

    #[test]
    fn binding_substitutes_field_types() {
        let actual = GenericType::parameterized("Holder", vec![GenericType::named("int")]);
        let bound = holder().as_bound_struct(&actual).unwrap();
        assert_eq!(bound.name, "Holder");
        assert_eq!(bound.key(), "Holder<int>");
        let value = bound.field("value").unwrap();
        assert!(value.ty.is_basic_type());
        assert_eq!(value.ty, GenericType::named("int"));
        assert_eq!(bound.field("values").unwrap().ty.canonical(), "[int]");
    }

    #[test]
    fn binding_is_positional() {
        let pair = TypeStruct::new(
            "Pair",
            &["B", "A"],
            vec![FieldInfo::new("a", GenericType::type_var("A"))],
        );
        let actual = GenericType::parameterized(
            "Pair",
            vec![GenericType::named("long"), GenericType::named("string")],
        );
        let binding = pair.variable_binding(&actual).unwrap();
        assert_eq!(binding["B"], GenericType::named("long"));
        let bound = pair.as_bound_struct(&actual).unwrap();
        assert_eq!(bound.fields[0].ty, GenericType::named("string"));
    }

    #[test]
    fn binding_with_wrong_arity_fails() {
        let two = GenericType::parameterized(
            "Holder",
            vec![GenericType::named("A"), GenericType::named("B")],
        );
        let err = holder().as_bound_struct(&two).unwrap_err();
        assert!(matches!(err, BindError::Arity { .. }));
        assert_eq!(
            err.to_string(),
            "the given actual type Holder<A, B> does not match the struct Holder<T>"
        );

        let zero = GenericType::named("Holder");
        assert!(matches!(holder().variable_binding(&zero), Err(BindError::Arity { .. })));
    }

    #[test]
    fn binding_with_other_name_fails() {
        let other = GenericType::parameterized("Other", vec![GenericType::named("int")]);
        let err = holder().as_bound_struct(&other).unwrap_err();
        assert!(matches!(err, BindError::NameMismatch { .. }));
    }

    #[test]
    fn non_generic_struct_binds_to_its_plain_name() {
        let user = TypeStruct::new("User", &[], vec![FieldInfo::new("id", GenericType::named("long"))]);
        assert_eq!(user.signature(), "User");
        let bound = user.as_bound_struct(&GenericType::named("User")).unwrap();
        assert_eq!(bound.fields.len(), 1);
    }

    #[test]
    fn struct_definitions_deserialize_with_parsed_examples() {
        let s: TypeStruct = serde_json::from_value(json!({
            "name": "Page",
            "groupName": "common",
            "typeVars": ["T"],
            "fields": [
                {"name": "items", "type": {"typeName": "list", "typeArgs": [{"typeVar": "T"}]}, "desc": "rows"},
                {"name": "cursor", "type": "Cursor", "exampleValue": "{\"next\": 3}"},
                {"name": "total", "type": "int", "deprecated": true, "exampleValue": "99"}
            ]
        }))
        .unwrap();
        assert_eq!(s.signature(), "Page<T>");
        assert_eq!(s.fields[1].example_value, Some(json!({"next": 3})));
        assert_eq!(s.fields[2].example_value, Some(json!("99")));
        assert!(s.fields[2].deprecated);
    }

    #[test]
    fn registry_keeps_last_duplicate() {
        let registry: StructRegistry = [
            TypeStruct::new("A", &[], vec![]),
            TypeStruct::new("A", &["T"], vec![]),
        ]
        .into_iter()
        .collect();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("A").unwrap().type_vars, ["T"]);
    }

    #[test]
    fn keyword_match_ignores_case() {
        let bound = TypeStruct::new("UserProfile", &[], vec![])
            .as_bound_struct(&GenericType::named("UserProfile"))
            .unwrap();
        assert!(bound.matches_keyword("profile"));
        assert!(!bound.matches_keyword(""));
    }
}
