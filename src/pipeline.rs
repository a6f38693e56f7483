//! One run: source text in, finished TypeBox module out.
//!
//! parse → contract check → ignore → rewrites → graph → order → codegen →
//! synthesis → assembly. Every stage finishes before the next begins and
//! nothing survives the call, including the synthesis cache.

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::assemble::{assemble, Emitted};
use crate::codegen;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::graph::{emission_order, Class, DependencyGraph, EmissionOrder};
use crate::ir::Declaration;
use crate::parser::parse_declarations;
use crate::recursive::{SynthesisCache, Synthesizer};
use crate::rewrite;

/// Names the generated module binds itself: the builder imports, the
/// recursion anchor, template names and template parameters.
static RESERVED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:Type|Static|TSchema|This|__.*|ref\d+|pRef\d+)$").unwrap());

/// Declarations ready for graph construction.
pub fn prepare(src: &str, settings: &Settings) -> Result<Vec<Declaration>> {
    let decls = parse_declarations(src)?;
    check_contract(&decls)?;

    let decls: Vec<Declaration> = decls
        .into_iter()
        .filter(|d| {
            let keep = !settings.is_ignored(&d.name);
            if !keep {
                tracing::debug!(name = %d.name, "ignored");
            }
            keep
        })
        .map(|d| if settings.remove_null_if_optional { rewrite::remove_null_if_optional(&d) } else { d })
        .map(|d| if settings.require_optional_arrays { rewrite::require_optional_arrays(&d) } else { d })
        .collect();
    Ok(decls)
}

fn check_contract(decls: &[Declaration]) -> Result<()> {
    let mut seen = IndexSet::with_capacity(decls.len());
    for decl in decls {
        if decl.name.is_empty() {
            return Err(Error::ExtractorContract("declaration without a name".into()));
        }
        if !seen.insert(decl.name.as_str()) {
            return Err(Error::ExtractorContract(format!("duplicate declaration `{}`", decl.name)));
        }
        if RESERVED_NAME.is_match(&decl.name) {
            return Err(Error::ExtractorContract(format!(
                "declaration `{}` clashes with a name used by the generated code",
                decl.name
            )));
        }
    }
    Ok(())
}

/// Emit every declaration: standalone when it has no known dependencies,
/// template + usage otherwise, in emission order.
pub fn synthesize_all(decls: &[Declaration]) -> Result<Vec<Emitted>> {
    let graph = DependencyGraph::build(decls);
    let order = emission_order(&graph);
    let synth = Synthesizer::new(&graph);
    let mut cache = SynthesisCache::new();

    let mut out = Vec::with_capacity(decls.len());
    for name in order.iter() {
        let Some(decl) = decls.iter().find(|d| d.name == name) else { continue };
        let fragment = codegen::fragment(decl);
        if graph.dependencies(name).is_empty() {
            out.push(Emitted::Standalone { name: decl.name.clone(), fragment });
        } else {
            out.push(Emitted::Pair(synth.synthesize(&fragment, &mut cache)?));
        }
    }
    tracing::info!(
        declarations = out.len(),
        synthesized = cache.len(),
        "synthesis complete"
    );
    Ok(out)
}

pub fn generate(src: &str, settings: &Settings) -> Result<String> {
    let decls = prepare(src, settings)?;
    let items = synthesize_all(&decls)?;
    Ok(assemble(settings.import_style.preamble(), &items))
}

// ------------------------------- Report ----------------------------------- //

#[derive(Debug, Serialize)]
pub struct Report {
    pub declarations: Vec<DeclarationReport>,
    pub order: EmissionOrder,
}

#[derive(Debug, Serialize)]
pub struct DeclarationReport {
    pub name: String,
    pub class: Class,
    pub dependencies: Vec<String>,
    pub external: Vec<String>,
}

/// Graph view of a run, without generating any code.
pub fn report(src: &str, settings: &Settings) -> Result<Report> {
    let decls = prepare(src, settings)?;
    let graph = DependencyGraph::build(&decls);
    let declarations = graph
        .names()
        .map(|name| DeclarationReport {
            name: name.to_string(),
            class: graph.classify(name),
            dependencies: graph.dependencies(name).into_iter().map(str::to_string).collect(),
            external: graph.external_references(name).into_iter().map(str::to_string).collect(),
        })
        .collect();
    Ok(Report { declarations, order: emission_order(&graph) })
}
