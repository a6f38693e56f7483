//! Reference graph between declarations and the order they are visited in.
//!
//! Edges may point at names outside the declaration set (types imported from
//! elsewhere). Those are kept in the adjacency map but never traversed and
//! never count as dependencies.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::ir::Declaration;

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// name → directly referenced names; keys in extraction order.
    edges: IndexMap<String, IndexSet<String>>,
}

/// How a declaration ends up being emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Class {
    /// No known dependencies; emitted as-is.
    Standalone,
    /// Has dependencies but none lead back to itself.
    Acyclic,
    /// Reaches itself through one or more edges.
    Recursive,
}

impl DependencyGraph {
    pub fn build(decls: &[Declaration]) -> Self {
        let mut edges = IndexMap::with_capacity(decls.len());
        for decl in decls {
            let deps = decl.references();
            tracing::debug!(name = %decl.name, deps = ?deps, "graph edges");
            edges.insert(decl.name.clone(), deps);
        }
        Self { edges }
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Raw edge set, unknown names included.
    pub fn edges(&self, name: &str) -> Option<&IndexSet<String>> {
        self.edges.get(name)
    }

    /// Edges restricted to known declarations, in edge order.
    pub fn dependencies(&self, name: &str) -> Vec<&str> {
        self.edges
            .get(name)
            .map(|deps| deps.iter().map(String::as_str).filter(|d| self.is_known(d)).collect())
            .unwrap_or_default()
    }

    /// Edges pointing outside the declaration set.
    pub fn external_references(&self, name: &str) -> Vec<&str> {
        self.edges
            .get(name)
            .map(|deps| deps.iter().map(String::as_str).filter(|d| !self.is_known(d)).collect())
            .unwrap_or_default()
    }

    /// A known declaration with no known dependencies.
    pub fn is_terminal(&self, name: &str) -> bool {
        self.is_known(name) && self.dependencies(name).is_empty()
    }

    /// One level of lookahead: each direct dependency mapped to its own
    /// direct dependencies. Deliberately not the transitive closure.
    pub fn lookahead(&self, name: &str) -> IndexMap<&str, Vec<&str>> {
        self.dependencies(name)
            .into_iter()
            .map(|dep| (dep, self.dependencies(dep)))
            .collect()
    }

    /// Whether `name` can reach itself.
    pub fn is_recursive(&self, name: &str) -> bool {
        let mut seen = IndexSet::new();
        let mut stack: Vec<&str> = self.dependencies(name);
        while let Some(n) = stack.pop() {
            if n == name {
                return true;
            }
            if seen.insert(n) {
                stack.extend(self.dependencies(n));
            }
        }
        false
    }

    pub fn classify(&self, name: &str) -> Class {
        if self.dependencies(name).is_empty() {
            Class::Standalone
        } else if self.is_recursive(name) {
            Class::Recursive
        } else {
            Class::Acyclic
        }
    }
}

// ------------------------------ Ordering ---------------------------------- //

/// Each known name exactly once. Dependencies come before dependents only
/// where the dependency subgraph is acyclic; inside a cycle the order only
/// guarantees that every name is visited once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EmissionOrder(Vec<String>);

impl EmissionOrder {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Depth-first, seeded in extraction order. Names are marked before their
/// dependencies are visited, which is what stops descent on a cycle.
pub fn emission_order(graph: &DependencyGraph) -> EmissionOrder {
    fn visit<'g>(graph: &'g DependencyGraph, name: &'g str, visited: &mut IndexSet<&'g str>, out: &mut Vec<String>) {
        if !visited.insert(name) {
            return;
        }
        for dep in graph.dependencies(name) {
            visit(graph, dep, visited, out);
        }
        out.push(name.to_string());
    }

    let mut visited = IndexSet::with_capacity(graph.len());
    let mut out = Vec::with_capacity(graph.len());
    for name in graph.names() {
        visit(graph, name, &mut visited, &mut out);
    }
    tracing::debug!(order = ?out, "emission order");
    EmissionOrder(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_declarations;

    fn graph(src: &str) -> DependencyGraph {
        DependencyGraph::build(&parse_declarations(src).unwrap())
    }

    #[test]
    fn unknown_references_are_kept_but_not_dependencies() {
        let g = graph("interface A { b: B; ext: Media; me?: A }\ninterface B { s: string }");
        let raw: Vec<_> = g.edges("A").unwrap().iter().map(String::as_str).collect();
        assert_eq!(raw, vec!["B", "Media", "A"]);
        assert_eq!(g.dependencies("A"), vec!["B", "A"]);
        assert_eq!(g.external_references("A"), vec!["Media"]);
        assert!(g.is_terminal("B"));
        assert!(!g.is_terminal("Media"));
    }

    #[test]
    fn acyclic_dependency_comes_first() {
        let g = graph("interface A { b: B }\ninterface B { s: string }");
        let order: Vec<_> = emission_order(&g).iter().map(str::to_string).collect();
        assert_eq!(order, vec!["B", "A"]);
    }

    #[test]
    fn cycles_terminate_and_visit_each_name_once() {
        let g = graph("interface A { b: B }\ninterface B { c: C }\ninterface C { a: A; self?: C }");
        let order: Vec<_> = emission_order(&g).iter().map(str::to_string).collect();
        assert_eq!(order, vec!["C", "B", "A"]);
    }

    #[test]
    fn classification() {
        let g = graph(
            "interface Leaf { s: string }\ninterface Uses { l: Leaf }\ninterface Tree { kids: Tree[] }\n\
             interface Cat { p?: (string | Prov)[] }\ninterface Prov { c: (string | Cat)[] }",
        );
        assert_eq!(g.classify("Leaf"), Class::Standalone);
        assert_eq!(g.classify("Uses"), Class::Acyclic);
        assert_eq!(g.classify("Tree"), Class::Recursive);
        assert_eq!(g.classify("Cat"), Class::Recursive);
        assert_eq!(g.classify("Prov"), Class::Recursive);
    }

    #[test]
    fn lookahead_is_one_level() {
        let g = graph("interface A { b: B }\ninterface B { c: C }\ninterface C { a: A }");
        let la = g.lookahead("A");
        assert_eq!(la.len(), 1);
        assert_eq!(la["B"], vec!["C"]);
    }
}
