//! jq pre-filter for schema documents shipped inside a wrapper
//! (e.g. `.data.schema` of an admin endpoint dump).
use anyhow::{Context, Result, anyhow};
use jaq_core::{compile::Undefined, load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

/// Run `filter_src` over `input`; every output becomes one document.
pub fn select_documents(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader
        .load(&arena, program)
        .map_err(format_parse_errors)?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(format_undefined_errors)?;

    let inputs = RcIter::new(core::iter::empty());
    let outputs = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut documents = Vec::new();
    for (i, output) in outputs.enumerate() {
        let val = output.map_err(|e| anyhow!("schema filter output #{i} failed: {e:?}"))?;
        // Val renders as JSON text
        let document = serde_json::from_str::<Value>(&val.to_string())
            .with_context(|| format!("schema filter output #{i} is not a JSON document"))?;
        documents.push(document);
    }
    Ok(documents)
}

/// One line per syntax error, naming the schema filter that failed to parse.
fn format_parse_errors(
    errs: Vec<(load::File<&str, ()>, load::Error<&str>)>,
) -> anyhow::Error {
    let lines: Vec<String> = errs
        .into_iter()
        .map(|(file, err)| format!("schema filter `{}` does not parse: {err:?}", file.code))
        .collect();
    anyhow!(lines.join("\n"))
}

fn format_undefined_errors(
    errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>,
) -> anyhow::Error {
    let lines: Vec<String> = errs
        .into_iter()
        .flat_map(|(file, list)| {
            list.into_iter().map(move |(name, undef)| {
                format!("schema filter `{}` refers to unknown `{name}` ({undef:?})", file.code)
            })
        })
        .collect();
    anyhow!(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selects_nested_documents() {
        let wrapper = json!({"data": [{"apis": []}, {"error": "down"}]});
        let docs = select_documents(".data[]", &wrapper).unwrap();
        assert_eq!(docs, [json!({"apis": []}), json!({"error": "down"})]);
    }

    #[test]
    fn reports_parse_errors() {
        let err = select_documents(".data[", &json!({})).unwrap_err().to_string();
        assert!(err.contains("schema filter `.data[` does not parse"), "{err}");
    }

    #[test]
    fn reports_unknown_filters() {
        let err = select_documents("no_such_schema_fn", &json!({})).unwrap_err().to_string();
        assert!(err.contains("refers to unknown `no_such_schema_fn`"), "{err}");
    }
}
