//! Error taxonomy for type resolution and schema loading.
use thiserror::Error;

/// A wire type that violates the shape rules of [`crate::ty::GenericType`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("a type must set exactly one of typeName, typeVar or possibleTypes (found {found})")]
    Ambiguous { found: usize },
    #[error("type `{name}` expects {expected} type argument(s), found {found}")]
    BuiltinArity { name: String, expected: usize, found: usize },
    #[error("primitive type `{name}` cannot carry type arguments")]
    PrimitiveWithArgs { name: String },
}

/// Raised when a generic struct is instantiated at an incompatible actual type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("the given actual type {actual} does not match the struct {signature}")]
    Arity { actual: String, signature: String },
    #[error("struct name of {signature} does not match {actual}")]
    NameMismatch { actual: String, signature: String },
}

#[derive(Debug, Error)]
pub enum SchemaError {
    /// The upstream producer shipped `{"error": ..}` instead of a document.
    #[error("the api schema could not be produced: {0}")]
    Upstream(String),
    #[error("failed to decode api schema: {0}")]
    Decode(String),
    #[error("json pointer `{0}` selects nothing")]
    Pointer(String),
    #[error("jq filter failed: {0}")]
    Filter(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
