//! Smoke-runs every schema fixture: load, closure, two synthesis passes that
//! must agree, and report emission. Files named `error_*.json` must fail with
//! an upstream schema error instead.
use std::process::ExitCode;

use apidoc_types::catalog::{Catalog, Scope};
use apidoc_types::{ApiDocument, SchemaError, report};
use chrono::NaiveDateTime;
use colored::Colorize;

fn check(path: &str) -> Result<String, String> {
    let source = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let expect_upstream = std::path::Path::new(path)
        .file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with("error_"));

    let doc = match source.parse::<ApiDocument>() {
        Ok(_) if expect_upstream => return Err("expected an upstream schema error".into()),
        Ok(doc) => doc,
        Err(SchemaError::Upstream(msg)) if expect_upstream => return Ok(format!("upstream error: {msg}")),
        Err(e) => return Err(e.to_string()),
    };

    let now = NaiveDateTime::default();
    for api in &doc.apis {
        let first = api.generate_example_value(&mut api.synth_context().with_clock(now));
        let second = api.generate_example_value(&mut api.synth_context().with_clock(now));
        if first != second {
            return Err(format!("{}: synthesis is not deterministic", api.method_name));
        }
    }
    let catalog = Catalog::build(&doc, Scope::All);
    let report = report::document_report(&doc, &catalog);
    let methods = report["methods"].as_array().map_or(0, Vec::len);
    let issues = doc.issues().count();
    Ok(format!("{methods} methods, {} rejected, {issues} issues", doc.rejected.len()))
}

fn main() -> ExitCode {
    let pattern = std::env::args().nth(1).unwrap_or_else(|| "fixtures/*.json".to_string());
    let paths = match glob::glob(&pattern) {
        Ok(paths) => paths.filter_map(Result::ok).collect::<Vec<_>>(),
        Err(e) => {
            eprintln!("bad pattern {pattern}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut failed = 0;
    for path in &paths {
        let label = path.to_string_lossy();
        match check(&label) {
            Ok(summary) => eprintln!("✅ {label}: {}", summary.dimmed()),
            Err(error) => {
                failed += 1;
                eprintln!("❌ {label}: {}", error.red());
            }
        }
    }
    eprintln!("—— {} fixtures, {failed} failed ——", paths.len());
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
