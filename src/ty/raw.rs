//! Wire form of a type: either a bare name (`"User"`) or an object carrying
//! exactly one of `typeName` (+ `typeArgs`), `typeVar`, `possibleTypes`.
use std::fmt;
use indexmap::IndexMap;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use super::GenericType;
use crate::error::TypeError;

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum RawType {
    Name(String),
    Shape(RawShape),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawShape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_args: Option<Vec<GenericType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_var: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possible_types: Option<IndexMap<String, GenericType>>,
}

// Hand-written instead of `#[serde(untagged)]` so that errors from nested
// types keep their message and path.
impl<'de> Deserialize<'de> for RawType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawTypeVisitor;

        impl<'de> Visitor<'de> for RawTypeVisitor {
            type Value = RawType;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a type name or a type object")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RawType, E> {
                Ok(RawType::Name(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<RawType, E> {
                Ok(RawType::Name(v))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<RawType, A::Error> {
                RawShape::deserialize(de::value::MapAccessDeserializer::new(map)).map(RawType::Shape)
            }
        }

        deserializer.deserialize_any(RawTypeVisitor)
    }
}

impl TryFrom<RawType> for GenericType {
    type Error = TypeError;

    fn try_from(raw: RawType) -> Result<Self, Self::Error> {
        match raw {
            RawType::Name(name) => GenericType::checked_named(name, Vec::new()),
            RawType::Shape(shape) => shape.into_type(),
        }
    }
}

impl RawShape {
    fn into_type(self) -> Result<GenericType, TypeError> {
        let found = [
            self.type_name.is_some(),
            self.type_var.is_some(),
            self.possible_types.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();
        if found != 1 {
            return Err(TypeError::Ambiguous { found });
        }
        if let Some(name) = self.type_name {
            return GenericType::checked_named(name, self.type_args.unwrap_or_default());
        }
        if let Some(var) = self.type_var {
            return Ok(GenericType::Var(var));
        }
        Ok(GenericType::Union(self.possible_types.unwrap_or_default()))
    }
}

impl From<GenericType> for RawType {
    fn from(t: GenericType) -> Self {
        match t {
            GenericType::Named { name, args } if args.is_empty() => RawType::Name(name),
            GenericType::Named { name, args } => RawType::Shape(RawShape {
                type_name: Some(name),
                type_args: Some(args),
                ..RawShape::default()
            }),
            GenericType::Var(var) => RawType::Shape(RawShape {
                type_var: Some(var),
                ..RawShape::default()
            }),
            GenericType::Union(alternatives) => RawType::Shape(RawShape {
                possible_types: Some(alternatives),
                ..RawShape::default()
            }),
        }
    }
}
