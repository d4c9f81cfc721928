//! Example-value synthesis.
//!
//! Values are driven by a per-run sequence counter, so a fresh
//! [`SynthContext`] over the same structs always yields the same payload
//! (dates aside, which read the context's clock).
//!
//! Recursion through struct references is cut by the context's active path:
//! a struct already being expanded on the current branch renders as `{}`.
//! The path is per branch, so the same struct may appear fully expanded on
//! several sibling branches.
use chrono::{Local, NaiveDateTime};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::codec;
use crate::structs::{BoundStruct, FieldInfo};
use crate::ty::{GenericType, Primitive};

/// Field carrying the discriminant key of a union value.
pub const CLASS_KEY: &str = "@classKey";
/// Holds a non-object union value next to its discriminant.
pub const VALUE_KEY: &str = "@value";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SynthContext<'a> {
    seq: u64,
    path: Vec<&'a BoundStruct>,
    structs: &'a IndexMap<String, BoundStruct>,
    now: NaiveDateTime,
}

impl<'a> SynthContext<'a> {
    /// `structs` are the bound structs available to struct references, keyed
    /// by canonical type string.
    pub fn new(structs: &'a IndexMap<String, BoundStruct>) -> Self {
        SynthContext {
            seq: 1,
            path: Vec::new(),
            structs,
            now: Local::now().naive_local(),
        }
    }

    pub fn with_clock(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    pub fn next_seq(&mut self) -> u64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    fn push_struct(&mut self, s: &'a BoundStruct) -> bool {
        if self.path.iter().any(|active| std::ptr::eq(*active, s)) {
            return false;
        }
        self.path.push(s);
        true
    }

    fn pop_struct(&mut self) {
        self.path.pop();
    }

    pub fn generate(&mut self, ty: &GenericType) -> Value {
        if let Some(element) = ty.as_list() {
            return match element.as_union() {
                Some(alternatives) => Value::Array(
                    alternatives
                        .iter()
                        .map(|(key, alt)| {
                            let value = self.generate(alt);
                            tagged(key, value)
                        })
                        .collect(),
                ),
                None => Value::Array(vec![self.generate(element)]),
            };
        }
        if let Some((key_ty, value_ty)) = ty.as_map() {
            let mut map = Map::new();
            match value_ty.as_union() {
                Some(alternatives) => {
                    for (key, alt) in alternatives {
                        let k = self.generate(key_ty);
                        let value = self.generate(alt);
                        map.insert(codec::scalar_text(&k), tagged(key, value));
                    }
                }
                None => {
                    let k = self.generate(key_ty);
                    let value = self.generate(value_ty);
                    map.insert(codec::scalar_text(&k), value);
                }
            }
            return Value::Object(map);
        }
        if let Some(p) = ty.as_primitive() {
            return self.primitive(p);
        }
        match ty {
            GenericType::Named { .. } => {
                let structs = self.structs;
                match structs.get(&ty.canonical()) {
                    Some(s) => self.generate_struct(s),
                    None => Value::Object(Map::new()),
                }
            }
            GenericType::Var(_) => Value::Null,
            GenericType::Union(alternatives) => {
                if alternatives.is_empty() {
                    return Value::Null;
                }
                let index = (self.next_seq() % alternatives.len() as u64) as usize;
                match alternatives.get_index(index) {
                    Some((key, alt)) => {
                        let value = self.generate(alt);
                        tagged(key, value)
                    }
                    None => Value::Null,
                }
            }
        }
    }

    fn primitive(&mut self, p: Primitive) -> Value {
        match p {
            Primitive::String => Value::String(format!("string{}", self.next_seq())),
            Primitive::Char => {
                let offset = (self.next_seq() % 26) as u8;
                Value::String(char::from(b'a' + offset).to_string())
            }
            Primitive::Date => Value::String(self.now.format(DATE_FORMAT).to_string()),
            Primitive::Boolean => Value::Bool(self.next_seq() % 2 == 0),
            Primitive::Byte => Value::from(self.next_seq() % 256),
            Primitive::Short | Primitive::Int | Primitive::Long => Value::from(self.next_seq()),
            Primitive::Float | Primitive::Double => {
                let int_part = self.next_seq();
                let frac_part = self.next_seq();
                format!("{int_part}.{frac_part}")
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
    }

    /// One value per field, keyed by field name. A struct already on the
    /// active path renders as `{}`.
    pub fn generate_struct(&mut self, s: &'a BoundStruct) -> Value {
        if !self.push_struct(s) {
            return Value::Object(Map::new());
        }
        let mut map = Map::new();
        for field in &s.fields {
            let value = self.field_value(field);
            map.insert(field.name.clone(), value);
        }
        self.pop_struct();
        Value::Object(map)
    }

    /// The field's literal example if it has one, otherwise a generated value.
    pub fn field_value(&mut self, field: &FieldInfo) -> Value {
        match &field.example_value {
            Some(literal) => literal.clone(),
            None => self.generate(&field.ty),
        }
    }
}

impl BoundStruct {
    pub fn generate_example_value<'a>(&'a self, ctx: &mut SynthContext<'a>) -> Value {
        ctx.generate_struct(self)
    }
}

fn tagged(key: &str, value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            map.insert(CLASS_KEY.to_owned(), Value::String(key.to_owned()));
            Value::Object(map)
        }
        other => {
            let mut map = Map::new();
            map.insert(CLASS_KEY.to_owned(), Value::String(key.to_owned()));
            map.insert(VALUE_KEY.to_owned(), other);
            Value::Object(map)
        }
    }
}
