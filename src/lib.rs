//! Generic type calculus for documenting an API surface.
//!
//! A schema document supplies generic struct definitions and method
//! signatures. From it this crate:
//! 1. binds each referenced struct at its actual type arguments ([`structs`]),
//! 2. computes the closure of structs reachable from a method ([`closure`]),
//! 3. synthesizes deterministic example payloads for any type ([`synth`]),
//! 4. formats literal and generated examples for display ([`codec`]).
pub mod ty;
pub mod codec;
pub mod structs;
pub mod closure;
pub mod synth;
pub mod document;
pub mod catalog;
pub mod report;
pub mod error;
pub mod path_de;
pub mod jq_exec;
pub mod cli;

pub use closure::{Issue, StructClosure};
pub use document::{ApiDocument, CodeInfo, MethodInfo, ParameterInfo};
pub use error::{BindError, SchemaError, TypeError};
pub use structs::{BoundStruct, FieldInfo, StructRegistry, TypeStruct};
pub use synth::SynthContext;
pub use ty::{Binding, GenericType, Primitive};
