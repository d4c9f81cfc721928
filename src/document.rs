//! Schema document load: struct registry, method signatures and their
//! referred-struct closures.
//!
//! Loading is all-or-nothing for the document itself (an upstream error or
//! an undecodable document fails the whole load), but a method whose
//! signature cannot be bound is only rejected on its own and the rest of the
//! document still loads.
use std::str::FromStr;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::closure::{Issue, StructClosure};
use crate::codec;
use crate::error::{BindError, SchemaError};
use crate::path_de;
use crate::structs::{BoundStruct, FieldInfo, StructRegistry, TypeStruct};
use crate::synth::SynthContext;
use crate::ty::GenericType;

static NON_ANCHOR_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_]").expect("anchor pattern is valid"));

// ------------------------------- Records ---------------------------------- //

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeInfo {
    pub code: i64,
    #[serde(default, deserialize_with = "path_de::null_as_default")]
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default, deserialize_with = "path_de::null_as_default")]
    pub exposed_to_client: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(from = "RawParameter")]
pub struct ParameterInfo {
    pub name: String,
    pub ty: GenericType,
    pub description: Option<String>,
    pub required: bool,
    pub encryption_method: Option<String>,
    pub example_value: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParameter {
    name: String,
    #[serde(rename = "type")]
    ty: GenericType,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "path_de::null_as_default")]
    required: bool,
    #[serde(default)]
    encryption_method: Option<String>,
    #[serde(default)]
    example_value: Option<Value>,
}

impl From<RawParameter> for ParameterInfo {
    fn from(raw: RawParameter) -> Self {
        let example_value = codec::parse(&raw.ty, raw.example_value.as_ref());
        ParameterInfo {
            name: raw.name,
            ty: raw.ty,
            description: raw.description,
            required: raw.required,
            encryption_method: raw.encryption_method,
            example_value,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMethod {
    method_name: String,
    #[serde(default, deserialize_with = "path_de::null_as_default")]
    group_name: String,
    return_type: GenericType,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default, deserialize_with = "path_de::null_as_default")]
    security_level: String,
    #[serde(default, deserialize_with = "path_de::null_as_default")]
    parameters: Vec<ParameterInfo>,
    #[serde(default, deserialize_with = "path_de::null_as_default")]
    error_codes: Vec<CodeInfo>,
    #[serde(default)]
    group_owner: Option<String>,
    #[serde(default)]
    method_owner: Option<String>,
    #[serde(default)]
    jar_file: Option<String>,
    #[serde(default)]
    example_value: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawApiDocument {
    #[serde(default, deserialize_with = "path_de::null_as_default")]
    apis: Vec<RawMethod>,
    #[serde(default, deserialize_with = "path_de::null_as_default")]
    codes: Vec<CodeInfo>,
    #[serde(default, deserialize_with = "path_de::null_as_default")]
    structures: Vec<TypeStruct>,
    #[serde(default, deserialize_with = "path_de::null_as_default")]
    common_params: Vec<Value>,
}

// ------------------------------- MethodInfo ------------------------------- //

#[derive(Clone, Debug)]
pub struct MethodInfo {
    pub method_name: String,
    pub group_name: String,
    pub return_type: GenericType,
    pub description: Option<String>,
    pub detail: Option<String>,
    pub security_level: String,
    pub parameters: Vec<ParameterInfo>,
    pub error_codes: Vec<CodeInfo>,
    pub group_owner: Option<String>,
    pub method_owner: Option<String>,
    pub jar_file: Option<String>,
    pub example_value: Option<Value>,
    /// Closure over the parameter types and the return type.
    pub referred_structs: IndexMap<String, BoundStruct>,
    pub issues: Vec<Issue>,
    searchable_text: String,
}

impl MethodInfo {
    fn assemble(raw: RawMethod, registry: &StructRegistry) -> Result<Self, BindError> {
        let mut closure = StructClosure::new();
        for parameter in &raw.parameters {
            closure.visit(&parameter.ty, registry)?;
        }
        closure.visit(&raw.return_type, registry)?;
        let (referred_structs, issues) = closure.into_parts();
        tracing::debug!(
            method = %raw.method_name,
            structs = referred_structs.len(),
            issues = issues.len(),
            "resolved method closure"
        );

        let mut searchable = vec![raw.method_name.to_uppercase()];
        if let Some(description) = raw.description.as_deref().filter(|d| !d.is_empty()) {
            searchable.push(description.to_uppercase());
        }
        searchable.extend(referred_structs.values().map(|s| s.name.to_uppercase()));
        searchable.extend(issues.iter().map(|i| i.to_string().to_uppercase()));

        let example_value = codec::parse(&raw.return_type, raw.example_value.as_ref());
        Ok(MethodInfo {
            method_name: raw.method_name,
            group_name: raw.group_name,
            return_type: raw.return_type,
            description: raw.description,
            detail: raw.detail,
            security_level: raw.security_level,
            parameters: raw.parameters,
            error_codes: raw.error_codes,
            group_owner: raw.group_owner,
            method_owner: raw.method_owner,
            jar_file: raw.jar_file,
            example_value,
            referred_structs,
            issues,
            searchable_text: searchable.join("\n"),
        })
    }

    pub fn anchor_id(&self) -> String {
        format!("api_{}", self.method_name)
    }

    /// Anchor of a type's section inside this method's documentation.
    pub fn type_anchor_id(&self, ty: &GenericType) -> String {
        let canonical = ty.canonical();
        format!("api_{}_type_{}", self.method_name, NON_ANCHOR_CHARS.replace_all(&canonical, ""))
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterInfo> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Fresh synthesis context over this method's referred structs.
    pub fn synth_context(&self) -> SynthContext<'_> {
        SynthContext::new(&self.referred_structs)
    }

    pub fn generate_example_value(&self, ctx: &mut SynthContext<'_>) -> Value {
        match &self.example_value {
            Some(literal) => literal.clone(),
            None => ctx.generate(&self.return_type),
        }
    }

    pub fn formatted_example_value(&self) -> String {
        codec::format(&self.generate_example_value(&mut self.synth_context()))
    }

    /// Formatted example of one referred struct, by canonical key.
    pub fn struct_example(&self, key: &str) -> Option<String> {
        let s = self.referred_structs.get(key)?;
        let mut ctx = self.synth_context();
        Some(codec::format(&s.generate_example_value(&mut ctx)))
    }

    /// Upper-cases `keyword` and looks for it in the method name,
    /// description, referred struct names and issues.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        self.searchable_text.contains(&keyword.trim().to_uppercase())
    }
}

impl ParameterInfo {
    pub fn generate_example_value(&self, ctx: &mut SynthContext<'_>) -> Value {
        match &self.example_value {
            Some(literal) => literal.clone(),
            None => ctx.generate(&self.ty),
        }
    }

    pub fn formatted_example_value(&self, api: &MethodInfo) -> String {
        codec::format(&self.generate_example_value(&mut api.synth_context()))
    }
}

impl FieldInfo {
    pub fn generate_example_value(&self, ctx: &mut SynthContext<'_>) -> Value {
        ctx.field_value(self)
    }

    pub fn formatted_example_value(&self, api: &MethodInfo) -> String {
        codec::format(&self.generate_example_value(&mut api.synth_context()))
    }
}

// ------------------------------- ApiDocument ------------------------------ //

/// A method left out of the document because its signature could not be bound.
#[derive(Clone, Debug)]
pub struct RejectedMethod {
    pub method_name: String,
    pub error: BindError,
}

#[derive(Clone, Debug, Default)]
pub struct ApiDocument {
    pub apis: Vec<MethodInfo>,
    pub codes: Vec<CodeInfo>,
    pub structures: StructRegistry,
    pub common_params: Vec<Value>,
    pub rejected: Vec<RejectedMethod>,
}

impl ApiDocument {
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        if let Some(error) = upstream_error(&value) {
            return Err(SchemaError::Upstream(error));
        }
        let raw: RawApiDocument = path_de::from_value_with_path(value)?;
        let structures: StructRegistry = raw.structures.into_iter().collect();

        let mut apis = Vec::with_capacity(raw.apis.len());
        let mut rejected = Vec::new();
        for method in raw.apis {
            let method_name = method.method_name.clone();
            match MethodInfo::assemble(method, &structures) {
                Ok(api) => apis.push(api),
                Err(error) => {
                    tracing::warn!(method = %method_name, %error, "method signature rejected");
                    rejected.push(RejectedMethod { method_name, error });
                }
            }
        }
        tracing::info!(
            methods = apis.len(),
            structs = structures.len(),
            rejected = rejected.len(),
            "api schema loaded"
        );

        Ok(ApiDocument {
            apis,
            codes: raw.codes,
            structures,
            common_params: raw.common_params,
            rejected,
        })
    }

    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.apis.iter().find(|m| m.method_name == name)
    }

    /// Every unresolved reference, paired with the method that hit it.
    pub fn issues(&self) -> impl Iterator<Item = (&MethodInfo, &Issue)> {
        self.apis.iter().flat_map(|m| m.issues.iter().map(move |i| (m, i)))
    }
}

impl FromStr for ApiDocument {
    type Err = SchemaError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let value: Value = path_de::from_str_with_path(src)?;
        ApiDocument::from_value(value)
    }
}

/// `{"error": ..}` in place of a document.
fn upstream_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(codec::scalar_text(other)),
    }
}
