//! Final layout: standalone schemas, then templates, then usages.

use crate::recursive::Synthesized;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emitted {
    /// A declaration with no known dependencies, fragment unchanged.
    Standalone { name: String, fragment: String },
    Pair(Synthesized),
}

/// Partition in production order and concatenate the three blocks, each
/// separated by a blank line. No validation of the result.
pub fn assemble(preamble: Option<&str>, items: &[Emitted]) -> String {
    let mut standalone = Vec::new();
    let mut templates = Vec::new();
    let mut usages = Vec::new();
    for item in items {
        match item {
            Emitted::Standalone { fragment, .. } => standalone.push(fragment.trim()),
            Emitted::Pair(s) => {
                templates.push(s.template.trim());
                usages.push(s.usage.trim());
            }
        }
    }

    let blocks: Vec<String> = [
        preamble.map(str::to_string),
        (!standalone.is_empty()).then(|| standalone.join("\n\n")),
        (!templates.is_empty()).then(|| templates.join("\n\n")),
        (!usages.is_empty()).then(|| usages.join("\n")),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut out = blocks.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}
