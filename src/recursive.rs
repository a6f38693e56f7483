//! Template/usage synthesis for declarations that depend on other
//! declarations.
//!
//! TypeBox has no forward declarations, so a schema can only mention schemas
//! that already exist. Every declaration with dependencies is therefore split
//! in two:
//!
//! - a **template**, `const __X = <pRef1 extends TSchema, ...>(ref1: pRef1, ...) => ...;`,
//!   the declaration's shape with every dependency replaced by a parameter;
//! - a **usage**, `export const X = Type.Recursive((This) => __X(...));`,
//!   which feeds the template either the real schema (terminal dependencies),
//!   a nested template application, or the anchor `This` where the
//!   declaration refers back to itself.
//!
//! Templates only mention their parameters and usages only mention
//! standalone schemas and templates, so emitting all standalone schemas,
//! then all templates, then all usages never references an undefined name.
//!
//! Dependency lookahead is one level deep: a dependency's own dependencies
//! are resolved, theirs are not. Cycles of three or more declarations get a
//! `__Sub(This)` application at the second level regardless of that
//! template's arity.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::graph::DependencyGraph;

/// Placeholder bound by `Type.Recursive` for "the schema being built".
pub const ANCHOR: &str = "This";

static EXPORT_TYPE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"export\s+type\s+(\w+)").unwrap());
static EXPORT_CONST_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"export\s+const\s+(\w+)").unwrap());
static EXPORT_TYPE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"export\s+type\s+.*").unwrap());
static EXPORT_CONST_BINDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"export\s+const\s+\w+\s*=\s*").unwrap());

// ------------------------------- Cache ------------------------------------ //

/// Usage calls already built during this run, keyed by declaration name.
///
/// Lives exactly as long as one run: create it empty, thread it through
/// every [`Synthesizer::synthesize`] call, drop it with the output.
#[derive(Debug, Default)]
pub struct SynthesisCache {
    calls: IndexMap<String, String>,
}

impl SynthesisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.calls.get(name).map(String::as_str)
    }

    /// First write wins; entries are never replaced.
    fn record(&mut self, name: &str, call: String) {
        self.calls.entry(name.to_string()).or_insert(call);
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

// ------------------------------ Synthesis --------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesized {
    pub name: String,
    pub template: String,
    pub usage: String,
}

pub struct Synthesizer<'g> {
    graph: &'g DependencyGraph,
}

impl<'g> Synthesizer<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self { graph }
    }

    /// Split one generated fragment into its template and usage.
    ///
    /// Must only be called for declarations with at least one known
    /// dependency; terminal declarations are emitted as they are.
    pub fn synthesize(&self, fragment: &str, cache: &mut SynthesisCache) -> Result<Synthesized> {
        let name = extract_name(fragment).ok_or_else(|| Error::UnnameableFragment {
            fragment: fragment.to_string(),
        })?;
        let deps = self.graph.dependencies(&name);
        debug_assert!(!deps.is_empty(), "terminal declaration `{name}` reached the synthesizer");
        let external = self.graph.external_references(&name);
        if !external.is_empty() {
            tracing::debug!(%name, ?external, "passing external references through");
        }

        let template = build_template(&name, &strip_exports(fragment), &deps);

        let lookahead = self.graph.lookahead(&name);
        let args: Vec<String> = deps
            .iter()
            .map(|dep| self.argument(&name, dep, lookahead.get(dep), cache))
            .collect();
        let call = format!("__{name}({})", args.join(", "));
        let usage = format!(
            "export const {name} = Type.Recursive(({ANCHOR}) => {call});\nexport type {name} = Static<typeof {name}>;"
        );
        tracing::debug!(%name, %call, "synthesized usage");
        cache.record(&name, call);

        Ok(Synthesized { name, template, usage })
    }

    /// What to pass for one dependency of `name`.
    fn argument(&self, name: &str, dep: &str, subs: Option<&Vec<&str>>, cache: &SynthesisCache) -> String {
        if dep == name {
            return ANCHOR.to_string();
        }
        if let Some(cached) = cache.get(dep) {
            tracing::trace!(%name, %dep, "reusing cached usage");
            return cached.to_string();
        }
        if self.graph.is_terminal(dep) {
            return dep.to_string();
        }
        match subs {
            Some(subs) if !subs.is_empty() => {
                let inner: Vec<String> = subs
                    .iter()
                    .map(|sub| {
                        if *sub == name {
                            ANCHOR.to_string()
                        } else if self.graph.is_terminal(sub) {
                            sub.to_string()
                        } else {
                            format!("__{sub}({ANCHOR})")
                        }
                    })
                    .collect();
                format!("__{dep}({})", inner.join(", "))
            }
            _ => format!("__{dep}({ANCHOR})"),
        }
    }
}

// ------------------------------- Helpers ---------------------------------- //

/// Declared name of a fragment: `export type X` wins over `export const X`.
pub fn extract_name(fragment: &str) -> Option<String> {
    EXPORT_TYPE_NAME
        .captures(fragment)
        .or_else(|| EXPORT_CONST_NAME.captures(fragment))
        .map(|c| c[1].to_string())
}

/// Bare schema expression: `export type` lines and the `export const X =`
/// binder removed.
pub fn strip_exports(fragment: &str) -> String {
    let without_types = EXPORT_TYPE_LINE.replace_all(fragment, "");
    let expr = EXPORT_CONST_BINDER.replace(&without_types, "");
    expr.trim().trim_end_matches(';').trim_end().to_string()
}

fn build_template(name: &str, expr: &str, deps: &[&str]) -> String {
    let params: Vec<String> = (1..=deps.len()).map(|i| format!("pRef{i} extends TSchema")).collect();
    let args: Vec<String> = (1..=deps.len()).map(|i| format!("ref{i}: pRef{i}")).collect();
    let body = substitute_references(expr, deps);
    format!("const __{name} = <{}>({}) => {body};", params.join(", "), args.join(", "))
}

/// Replace each whole-identifier reference to `deps[i]` with `ref{i+1}`.
///
/// Identifiers inside string literals, object keys (`name:`), member
/// accesses (`Type.name`) and member receivers (`name.Object`) are left
/// alone, so a property or literal that happens to share a declaration's
/// name is not rewritten.
pub fn substitute_references(expr: &str, deps: &[&str]) -> String {
    let chars: Vec<char> = expr.chars().collect();
    let mut out = String::with_capacity(expr.len());
    let mut i = 0;
    let mut prev_significant: Option<char> = None;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' || c == '"' || c == '`' {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i] != c {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(chars.len());
            out.extend(&chars[start..i]);
            prev_significant = Some(c);
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let is_member = prev_significant == Some('.');
            let next_significant = chars[i..].iter().find(|c| !c.is_whitespace());
            let is_key = next_significant == Some(&':');
            let is_receiver = next_significant == Some(&'.');
            match deps.iter().position(|d| *d == word) {
                Some(idx) if !is_member && !is_key && !is_receiver => out.push_str(&format!("ref{}", idx + 1)),
                _ => out.push_str(&word),
            }
            prev_significant = chars[i - 1].into();
            continue;
        }
        if !c.is_whitespace() {
            prev_significant = Some(c);
        }
        out.push(c);
        i += 1;
    }
    out
}
