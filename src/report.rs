//! JSON report of everything the presentation layer consumes: type titles
//! and canonical strings, referred structs, formatted examples and issues.
use serde_json::{Map, Value, json};

use crate::catalog::Catalog;
use crate::document::{ApiDocument, MethodInfo};
use crate::structs::BoundStruct;
use crate::ty::GenericType;

pub fn type_report(ty: &GenericType) -> Value {
    json!({ "title": ty.title(), "canonical": ty.canonical() })
}

pub fn struct_report(api: &MethodInfo, s: &BoundStruct) -> Value {
    let fields: Vec<Value> = s
        .fields
        .iter()
        .map(|f| {
            let mut o = json!({
                "name": f.name,
                "type": f.ty.title(),
                "example": f.formatted_example_value(api),
            });
            if let Some(desc) = &f.desc {
                o["desc"] = Value::from(desc.clone());
            }
            if f.deprecated {
                o["deprecated"] = Value::Bool(true);
            }
            o
        })
        .collect();
    json!({
        "name": s.name,
        "groupName": s.group_name,
        "title": s.ty.title(),
        "anchor": api.type_anchor_id(&s.ty),
        "fields": fields,
    })
}

pub fn method_report(api: &MethodInfo) -> Value {
    let parameters: Vec<Value> = api
        .parameters
        .iter()
        .map(|p| {
            json!({
                "name": p.name,
                "type": type_report(&p.ty),
                "required": p.required,
                "example": p.formatted_example_value(api),
            })
        })
        .collect();

    let mut referred = Map::new();
    for (key, s) in &api.referred_structs {
        referred.insert(key.clone(), struct_report(api, s));
    }

    json!({
        "methodName": api.method_name,
        "groupName": api.group_name,
        "anchor": api.anchor_id(),
        "securityLevel": api.security_level,
        "description": api.description,
        "returnType": type_report(&api.return_type),
        "parameters": parameters,
        "referredStructs": referred,
        "example": api.formatted_example_value(),
        "errorCodes": api.error_codes,
        "issues": api.issues.iter().map(|i| i.to_string()).collect::<Vec<_>>(),
    })
}

/// Report over the methods admitted by `catalog`, in group order.
pub fn document_report(doc: &ApiDocument, catalog: &Catalog<'_>) -> Value {
    let rejected: Vec<Value> = doc
        .rejected
        .iter()
        .map(|r| json!({ "methodName": r.method_name, "error": r.error.to_string() }))
        .collect();
    json!({
        "scope": format!("{:?}", catalog.scope).to_lowercase(),
        "methods": catalog.apis().map(method_report).collect::<Vec<_>>(),
        "codes": doc.codes,
        "rejected": rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Scope;
    use serde_json::json;

    fn doc() -> ApiDocument {
        ApiDocument::from_value(json!({
            "apis": [{
                "methodName": "shop.pets",
                "securityLevel": "User",
                "returnType": {"typeName": "list", "typeArgs": [
                    {"possibleTypes": {"cat": "Cat", "dog": "Dog"}}
                ]},
                "parameters": [{"name": "limit", "type": "int", "required": true}]
            }, {
                "methodName": "shop.broken",
                "returnType": {"typeName": "Cat", "typeArgs": ["int"]}
            }],
            "structures": [
                {"name": "Cat", "fields": [{"name": "lives", "type": "int", "desc": "count", "deprecated": true}]},
                {"name": "Dog", "fields": [{"name": "name", "type": "string"}]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn method_report_carries_titles_examples_and_structs() {
        let doc = doc();
        let report = method_report(doc.method("shop.pets").unwrap());
        assert_eq!(report["returnType"]["title"], "[(cat | dog)]");
        assert_eq!(report["returnType"]["canonical"], "[cat:Cat | dog:Dog]");
        assert_eq!(report["parameters"][0]["example"], "1");
        let example: Value = serde_json::from_str(report["example"].as_str().unwrap()).unwrap();
        assert_eq!(example.as_array().unwrap().len(), 2);
        assert_eq!(example[1]["@classKey"], "dog");

        let cat = &report["referredStructs"]["Cat"];
        assert_eq!(cat["fields"][0]["deprecated"], true);
        assert_eq!(cat["fields"][0]["desc"], "count");
        assert_eq!(cat["anchor"], "api_shop.pets_type_Cat");
    }

    #[test]
    fn document_report_lists_rejections() {
        let doc = doc();
        let catalog = Catalog::build(&doc, Scope::Client);
        let report = document_report(&doc, &catalog);
        assert_eq!(report["scope"], "client");
        assert_eq!(report["methods"].as_array().unwrap().len(), 1);
        assert_eq!(report["rejected"][0]["methodName"], "shop.broken");
    }
}
