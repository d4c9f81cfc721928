//! Command line: load API schema documents → (report | example | closure | list)
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::catalog::{Catalog, Scope};
use crate::document::ApiDocument;
use crate::error::SchemaError;
use crate::{jq_exec, path_de, report};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// resolve API schema documents: referred structs, type titles and synthesized example payloads
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// more logging (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// emit the JSON report consumed by the documentation viewer
    Report(ReportOut),
    /// print the formatted example of a method, one of its parameters or a struct
    Example(ExampleOut),
    /// list the structs reachable from method signatures and the resolution issues
    Closure(ClosureOut),
    /// list methods grouped by service
    List(ListOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to the schema inside each document (e.g. /data/schema)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is one schema
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct Filter {
    /// audience scope
    #[arg(long, value_enum, default_value_t = Scope::All)]
    scope: Scope,

    /// keyword over method names, descriptions, struct names and issues
    #[arg(long)]
    query: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct ReportOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    filter: Filter,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// single-line JSON
    #[arg(long)]
    compact: bool,
}

#[derive(clap::Parser, Debug)]
struct ExampleOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// method name, e.g. user.getProfile
    #[arg(long)]
    method: String,

    /// print the example of this parameter instead of the return value
    #[arg(long, conflicts_with = "struct_key")]
    param: Option<String>,

    /// print the example of this referred struct (canonical type, e.g. 'Page<User>')
    #[arg(long = "struct")]
    struct_key: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct ClosureOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    filter: Filter,

    /// only this method
    #[arg(long)]
    method: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct ListOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    filter: Filter,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Every schema document selected by the inputs, labelled by source path.
    fn load_documents(&self) -> Result<Vec<(String, ApiDocument)>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let label = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {label}"))?;
            let value: Value = path_de::from_str_with_path(&source)
                .with_context(|| format!("failed to parse JSON source file ({label})"))?;
            for value in self.select(value)? {
                let doc = ApiDocument::from_value(value)
                    .with_context(|| format!("failed to load api schema from {label}"))?;
                documents.push((label.clone(), doc));
            }
        }
        Ok(documents)
    }

    fn select(&self, value: Value) -> Result<Vec<Value>, SchemaError> {
        let value = match self.json_pointer.as_deref() {
            None => value,
            Some(pointer) => value
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| SchemaError::Pointer(pointer.to_owned()))?,
        };
        match self.jq_expr.as_deref() {
            None => Ok(vec![value]),
            Some(jq_expr) => jq_exec::select_documents(jq_expr, &value)
                .map_err(|e| SchemaError::Filter(format!("{e:#}"))),
        }
    }
}

impl Filter {
    fn apply<'d>(&self, doc: &'d ApiDocument) -> Catalog<'d> {
        let catalog = Catalog::build(doc, self.scope);
        match self.query.as_deref() {
            Some(query) => Catalog { scope: catalog.scope, groups: catalog.search(query) },
            None => catalog,
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        init_logging(self.verbose);
        match &self.cmd {
            Command::Report(target) => {
                let documents = target.input_settings.load_documents()?;
                let mut reports: Vec<Value> = documents
                    .iter()
                    .map(|(label, doc)| {
                        let mut r = report::document_report(doc, &target.filter.apply(doc));
                        r["source"] = Value::from(label.clone());
                        r
                    })
                    .collect();
                let out = if reports.len() == 1 { reports.remove(0) } else { Value::Array(reports) };
                let src = if target.compact {
                    serde_json::to_string(&out)?
                } else {
                    serde_json::to_string_pretty(&out)?
                };
                write_output(target.out.as_deref(), &src)
            }
            Command::Example(target) => {
                for (label, doc) in target.input_settings.load_documents()? {
                    let api = doc
                        .method(&target.method)
                        .ok_or_else(|| anyhow!("no method `{}` in {label}", target.method))?;
                    let text = if let Some(name) = &target.param {
                        let param = api
                            .parameter(name)
                            .ok_or_else(|| anyhow!("method `{}` has no parameter `{name}`", api.method_name))?;
                        param.formatted_example_value(api)
                    } else if let Some(key) = &target.struct_key {
                        api.struct_example(key)
                            .ok_or_else(|| anyhow!("method `{}` does not refer to struct `{key}`", api.method_name))?
                    } else {
                        api.formatted_example_value()
                    };
                    println!("{text}");
                }
                Ok(())
            }
            Command::Closure(target) => {
                for (label, doc) in target.input_settings.load_documents()? {
                    let catalog = target.filter.apply(&doc);
                    let mut found = false;
                    for api in catalog.apis() {
                        if target.method.as_deref().is_some_and(|m| m != api.method_name) {
                            continue;
                        }
                        found = true;
                        print!("{}", render_closure(api));
                    }
                    if let Some(method) = &target.method {
                        if !found {
                            bail!("no method `{method}` in {label} for scope {:?}", target.filter.scope);
                        }
                    }
                    for rejected in &doc.rejected {
                        eprintln!("{} {}: {}", "rejected".red().bold(), rejected.method_name, rejected.error);
                    }
                }
                Ok(())
            }
            Command::List(target) => {
                for (label, doc) in target.input_settings.load_documents()? {
                    println!("{}", label.dimmed());
                    print!("{}", render_catalog(&target.filter.apply(&doc)));
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn render_closure(api: &crate::document::MethodInfo) -> String {
    let mut lines = vec![format!("{} → {}", api.method_name.bold(), api.return_type.title())];
    for (key, bound) in &api.referred_structs {
        lines.push(format!("  {} {}", key.cyan(), format!("({})", bound.group_name).dimmed()));
        for field in &bound.fields {
            let name = if field.deprecated { field.name.strikethrough() } else { field.name.normal() };
            lines.push(format!("    {name}: {}", field.ty.title()));
        }
    }
    for issue in &api.issues {
        lines.push(format!("  {} {issue}", "!".yellow().bold()));
    }
    lines.into_iter().map(|line| line + "\n").collect()
}

fn render_catalog(catalog: &Catalog<'_>) -> String {
    let mut lines = Vec::new();
    for group in &catalog.groups {
        let title = if group.group_name.is_empty() { "(no group)" } else { group.group_name.as_str() };
        lines.push(title.bold().to_string());
        for api in &group.apis {
            lines.push(format!(
                "  {} {} {}",
                api.method_name,
                format!("[{}]", api.security_level).dimmed(),
                api.description.as_deref().unwrap_or_default(),
            ));
        }
    }
    lines.into_iter().map(|line| line + "\n").collect()
}

fn write_output(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{src}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
