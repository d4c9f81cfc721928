//! Generic type calculus.
//!
//! A [`GenericType`] is one of three shapes:
//! - a named type, optionally parameterized (`Page<User>`, `list<int>`, `string`),
//! - a type variable (`T`) that only means something inside a generic struct,
//! - a tagged union of alternatives (`{cat: Cat, dog: Dog}`).
//!
//! Two string forms are derived from the structure. The canonical form
//! ([`fmt::Display`], [`GenericType::canonical`]) spells out everything and is
//! the identity key used by closure computation and example synthesis. The
//! title ([`GenericType::title`]) is the short human form and abbreviates wide
//! unions.
pub mod raw;

use std::fmt;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

pub const LIST: &str = "list";
pub const MAP: &str = "map";

/// Unions wider than this are abbreviated in titles.
const TITLE_UNION_MAX: usize = 3;

/// Type-variable name → actual type.
pub type Binding = IndexMap<String, GenericType>;

// ------------------------------- Primitives ------------------------------- //

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Date,
}

impl Primitive {
    pub const ALL: [Primitive; 10] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Char,
        Primitive::Short,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
        Primitive::String,
        Primitive::Date,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        let p = match name {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "char" => Primitive::Char,
            "short" => Primitive::Short,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "string" => Primitive::String,
            "date" => Primitive::Date,
            _ => return None,
        };
        Some(p)
    }

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::String => "string",
            Primitive::Date => "date",
        }
    }
}

// ------------------------------ GenericType ------------------------------- //

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "raw::RawType", into = "raw::RawType")]
pub enum GenericType {
    /// Empty `args` means a non-parameterized type.
    Named { name: String, args: Vec<GenericType> },
    Var(String),
    /// Discriminant key → alternative, in declaration order.
    Union(IndexMap<String, GenericType>),
}

impl GenericType {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named { name: name.into(), args: Vec::new() }
    }

    pub fn parameterized(name: impl Into<String>, args: Vec<GenericType>) -> Self {
        Self::Named { name: name.into(), args }
    }

    pub fn primitive(p: Primitive) -> Self {
        Self::named(p.name())
    }

    pub fn list(element: GenericType) -> Self {
        Self::parameterized(LIST, vec![element])
    }

    pub fn map(key: GenericType, value: GenericType) -> Self {
        Self::parameterized(MAP, vec![key, value])
    }

    pub fn type_var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    pub fn union<K, I>(alternatives: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, GenericType)>,
    {
        Self::Union(alternatives.into_iter().map(|(k, t)| (k.into(), t)).collect())
    }

    /// Build a named type, enforcing the arity of the built-in names.
    pub fn checked_named(name: String, args: Vec<GenericType>) -> Result<Self, TypeError> {
        let expected = match name.as_str() {
            LIST => Some(1),
            MAP => Some(2),
            _ => None,
        };
        if let Some(expected) = expected {
            if args.len() != expected {
                return Err(TypeError::BuiltinArity { name, expected, found: args.len() });
            }
        } else if !args.is_empty() && Primitive::from_name(&name).is_some() {
            return Err(TypeError::PrimitiveWithArgs { name });
        }
        Ok(Self::Named { name, args })
    }

    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn type_args(&self) -> &[GenericType] {
        match self {
            Self::Named { args, .. } => args,
            _ => &[],
        }
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        self.type_name().and_then(Primitive::from_name)
    }

    pub fn is_basic_type(&self) -> bool {
        self.as_primitive().is_some()
    }

    /// Element type of `list<E>`.
    pub fn as_list(&self) -> Option<&GenericType> {
        match self {
            Self::Named { name, args } if name == LIST && args.len() == 1 => Some(&args[0]),
            _ => None,
        }
    }

    /// Key and value types of `map<K, V>`.
    pub fn as_map(&self) -> Option<(&GenericType, &GenericType)> {
        match self {
            Self::Named { name, args } if name == MAP && args.len() == 2 => Some((&args[0], &args[1])),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&IndexMap<String, GenericType>> {
        match self {
            Self::Union(alternatives) => Some(alternatives),
            _ => None,
        }
    }

    /// Substitute every bound type variable. Unbound variables are kept as-is,
    /// so a partial binding is fine.
    pub fn resolve_type_vars(&self, binding: &Binding) -> GenericType {
        match self {
            Self::Var(var) => binding.get(var).cloned().unwrap_or_else(|| self.clone()),
            Self::Named { name, args } => Self::Named {
                name: name.clone(),
                args: args.iter().map(|a| a.resolve_type_vars(binding)).collect(),
            },
            Self::Union(alternatives) => Self::Union(
                alternatives
                    .iter()
                    .map(|(key, t)| (key.clone(), t.resolve_type_vars(binding)))
                    .collect(),
            ),
        }
    }

    pub fn canonical(&self) -> String {
        self.to_string()
    }

    pub fn title(&self) -> String {
        Title(self).to_string()
    }
}

impl fmt::Display for GenericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(element) = self.as_list() {
            return write!(f, "[{element}]");
        }
        if let Some((key, value)) = self.as_map() {
            return write!(f, "[{key}: {value}]");
        }
        match self {
            Self::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    write_joined(f, args.iter(), ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Var(var) => f.write_str(var),
            Self::Union(alternatives) => {
                for (i, (key, t)) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{key}:{t}")?;
                }
                Ok(())
            }
        }
    }
}

struct Title<'a>(&'a GenericType);

impl fmt::Display for Title<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.0;
        if let Some(element) = t.as_list() {
            return write!(f, "[{}]", Title(element));
        }
        if let Some((key, value)) = t.as_map() {
            return write!(f, "[{}: {}]", Title(key), Title(value));
        }
        match t {
            GenericType::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    write_joined(f, args.iter().map(Title), ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            GenericType::Var(var) => f.write_str(var),
            GenericType::Union(alternatives) => {
                f.write_str("(")?;
                write_joined(f, alternatives.keys().take(TITLE_UNION_MAX), " | ")?;
                if alternatives.len() > TITLE_UNION_MAX {
                    f.write_str(" | ..")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn write_joined<I>(f: &mut fmt::Formatter<'_>, items: I, sep: &str) -> fmt::Result
where
    I: Iterator,
    I::Item: fmt::Display,
{
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn page_of(t: GenericType) -> GenericType {
        GenericType::parameterized("Page", vec![t])
    }

    #[test]
    fn primitives_are_basic_and_structs_are_not() {
        for p in Primitive::ALL {
            let t = GenericType::primitive(p);
            assert!(t.is_basic_type(), "{} should be basic", p.name());
            assert_eq!(Primitive::from_name(p.name()), Some(p));
        }
        assert!(!GenericType::named("User").is_basic_type());
        assert!(!GenericType::type_var("T").is_basic_type());
        assert!(!GenericType::list(GenericType::named("int")).is_basic_type());
    }

    #[test]
    fn canonical_and_title_forms() {
        let t = GenericType::map(
            GenericType::named("string"),
            page_of(GenericType::list(GenericType::named("User"))),
        );
        assert_eq!(t.canonical(), "[string: Page<[User]>]");
        assert_eq!(t.title(), "[string: Page<[User]>]");

        let u = GenericType::union([
            ("cat", GenericType::named("Cat")),
            ("dog", page_of(GenericType::named("Dog"))),
        ]);
        assert_eq!(u.canonical(), "cat:Cat | dog:Page<Dog>");
        assert_eq!(u.title(), "(cat | dog)");
    }

    #[test]
    fn wide_union_titles_are_abbreviated() {
        let u = GenericType::union(
            ["a", "b", "c", "d"].map(|k| (k, GenericType::named(k.to_uppercase()))),
        );
        assert_eq!(u.title(), "(a | b | c | ..)");
        assert_eq!(u.canonical(), "a:A | b:B | c:C | d:D");
    }

    #[test]
    fn partial_binding_keeps_unbound_vars() {
        let t = GenericType::map(GenericType::type_var("K"), page_of(GenericType::type_var("V")));
        let mut binding = Binding::new();
        binding.insert("V".into(), GenericType::named("long"));
        let resolved = t.resolve_type_vars(&binding);
        assert_eq!(resolved.canonical(), "[K: Page<long>]");
    }

    #[test]
    fn union_resolution_keeps_every_key_in_order() {
        let u = GenericType::union([
            ("z", GenericType::type_var("T")),
            ("a", GenericType::named("A")),
        ]);
        let mut binding = Binding::new();
        binding.insert("T".into(), GenericType::named("Z"));
        let resolved = u.resolve_type_vars(&binding);
        let keys: Vec<_> = resolved.as_union().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["z", "a"]);
        assert_eq!(resolved.canonical(), "z:Z | a:A");
    }

    #[test]
    fn wire_form_accepts_shorthand_and_objects() {
        let t: GenericType = serde_json::from_value(json!("User")).unwrap();
        assert_eq!(t, GenericType::named("User"));

        let t: GenericType = serde_json::from_value(json!({
            "typeName": "map",
            "typeArgs": ["string", {"typeName": "list", "typeArgs": [{"typeVar": "T"}]}]
        }))
        .unwrap();
        assert_eq!(t.canonical(), "[string: [T]]");

        let t: GenericType = serde_json::from_value(json!({
            "possibleTypes": {"cat": "Cat", "dog": {"typeName": "Dog"}}
        }))
        .unwrap();
        assert_eq!(t.canonical(), "cat:Cat | dog:Dog");
    }

    #[test]
    fn wire_form_rejects_broken_shapes() {
        let ambiguous = serde_json::from_value::<GenericType>(json!({"typeName": "A", "typeVar": "T"}));
        assert!(ambiguous.unwrap_err().to_string().contains("exactly one"));

        let bad_list = serde_json::from_value::<GenericType>(json!({"typeName": "list"}));
        assert!(bad_list.is_err());

        let bad_map = serde_json::from_value::<GenericType>(json!({"typeName": "map", "typeArgs": ["string"]}));
        assert!(bad_map.is_err());

        let bad_prim = serde_json::from_value::<GenericType>(json!({"typeName": "int", "typeArgs": ["string"]}));
        assert!(bad_prim.is_err());

        let empty = serde_json::from_value::<GenericType>(json!({}));
        assert!(empty.is_err());
    }

    #[test]
    fn serializes_back_to_wire_form() {
        let t = page_of(GenericType::type_var("T"));
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v, json!({"typeName": "Page", "typeArgs": [{"typeVar": "T"}]}));
        assert_eq!(serde_json::to_value(GenericType::named("int")).unwrap(), json!("int"));
    }

    fn generic_type() -> impl Strategy<Value = GenericType> {
        let leaf = prop_oneof![
            proptest::sample::select(Primitive::ALL.to_vec()).prop_map(GenericType::primitive),
            "[A-Z][a-z]{0,6}".prop_map(|n: String| GenericType::named(n)),
            "[A-Z]".prop_map(|v: String| GenericType::type_var(v)),
        ];
        leaf.prop_recursive(4, 24, 3, |inner| {
            prop_oneof![
                inner.clone().prop_map(GenericType::list),
                (inner.clone(), inner.clone()).prop_map(|(k, v)| GenericType::map(k, v)),
                ("[A-Z][a-z]{0,6}", proptest::collection::vec(inner.clone(), 1..3))
                    .prop_map(|(n, args)| GenericType::parameterized(n, args)),
                proptest::collection::btree_map("[a-z]{1,4}", inner, 1..4)
                    .prop_map(|alts| GenericType::union(alts)),
            ]
        })
    }

    proptest! {
        #[test]
        fn empty_binding_is_a_no_op(t in generic_type()) {
            let resolved = t.resolve_type_vars(&Binding::new());
            prop_assert_eq!(resolved.canonical(), t.canonical());
            prop_assert_eq!(resolved, t);
        }

        #[test]
        fn wire_form_preserves_structure(t in generic_type()) {
            let v = serde_json::to_value(&t).unwrap();
            let back: GenericType = serde_json::from_value(v).unwrap();
            prop_assert_eq!(back.canonical(), t.canonical());
        }
    }
}
