//! Declaration extractor: TypeScript source → `ir::Declaration`s.
//!
//! The source is parsed with the tree-sitter TypeScript grammar and the
//! syntax tree is lowered into the IR. Interfaces and type aliases become
//! declarations, at the top level or behind `export`. Imports, re-exports
//! (`export { .. }`, `export type { .. } from ..`), `declare` blocks and
//! statements that are not type declarations are stepped over. Syntax that
//! has no schema counterpart (generic declarations, methods, indexed access,
//! qualified names) is a parse error rather than a silently wrong schema.

use tree_sitter::{Node, Parser};

use crate::error::{Error, Result};
use crate::ir::{Declaration, Field, Keyword, Literal, Shape, Ty, Utility};

pub fn parse_declarations(src: &str) -> Result<Vec<Declaration>> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())?;
    let tree = parser
        .parse(src, None)
        .ok_or_else(|| Error::parse(1, 1, "parser returned no syntax tree"))?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(first_syntax_error(root, src));
    }

    let lower = Lower { src };
    let mut out = Vec::new();
    for item in named_children(root) {
        let item = match item.kind() {
            "export_statement" => match item.child_by_field_name("declaration") {
                Some(decl) => decl,
                None => continue,
            },
            _ => item,
        };
        let decl = match item.kind() {
            "interface_declaration" => lower.interface(item)?,
            "type_alias_declaration" => lower.alias(item)?,
            kind => {
                tracing::trace!(kind, line = item.start_position().row + 1, "skipped top-level item");
                continue;
            }
        };
        tracing::trace!(name = %decl.name, "extracted declaration");
        out.push(decl);
    }
    Ok(out)
}

/// Named children without the `comment` extras.
fn named_children(node: Node) -> Vec<Node> {
    node.named_children(&mut node.walk())
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn error_at(node: Node, message: impl Into<String>) -> Error {
    let at = node.start_position();
    Error::parse(at.row + 1, at.column + 1, message)
}

/// First `ERROR` or `MISSING` node in document order.
fn first_syntax_error(root: Node, src: &str) -> Error {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_missing() {
            return error_at(node, format!("missing `{}`", node.kind()));
        }
        if node.is_error() {
            let text = node.utf8_text(src.as_bytes()).unwrap_or_default();
            let text = text.lines().next().unwrap_or_default().trim();
            return error_at(node, format!("unexpected `{text}`"));
        }
        if node.has_error() {
            let mut children: Vec<Node> = node.children(&mut node.walk()).collect();
            children.reverse();
            stack.extend(children);
        }
    }
    error_at(root, "syntax error")
}

struct Lower<'s> {
    src: &'s str,
}

impl<'s> Lower<'s> {
    fn text(&self, node: Node) -> &'s str {
        &self.src[node.byte_range()]
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> Result<Node<'t>> {
        node.child_by_field_name(name)
            .ok_or_else(|| error_at(node, format!("`{}` without a {name}", node.kind())))
    }

    /// Single named child of a wrapper node such as `(T)` or `: T`.
    fn inner<'t>(&self, node: Node<'t>) -> Result<Node<'t>> {
        named_children(node)
            .into_iter()
            .next()
            .ok_or_else(|| error_at(node, format!("empty `{}`", node.kind())))
    }

    // ------------------------------ items --------------------------------- //

    fn declaration_name(&self, node: Node) -> Result<String> {
        let name = self.text(self.field(node, "name")?).to_string();
        if let Some(params) = node.child_by_field_name("type_parameters") {
            return Err(error_at(params, format!("generic declaration `{name}` is not supported")));
        }
        Ok(name)
    }

    fn interface(&self, node: Node) -> Result<Declaration> {
        let name = self.declaration_name(node)?;
        let mut extends = Vec::new();
        for clause in named_children(node).into_iter().filter(|c| c.kind() == "extends_type_clause") {
            for base in named_children(clause) {
                if base.kind() != "type_identifier" {
                    return Err(error_at(base, format!("heritage `{}` is not supported", self.text(base))));
                }
                extends.push(self.text(base).to_string());
            }
        }
        let (fields, index) = self.members(self.field(node, "body")?)?;
        let shape = match index {
            None => Shape::Interface { extends, fields },
            // An index signature has no place in `Type.Composite`, so the
            // interface is spelled as the intersection it describes.
            Some(index) => {
                let mut parts: Vec<Ty> = extends.into_iter().map(Ty::Ref).collect();
                if !fields.is_empty() {
                    parts.push(Ty::Object { fields });
                }
                parts.push(index);
                Shape::Alias(collapse(parts, Ty::Intersect))
            }
        };
        Ok(Declaration { name, shape })
    }

    fn alias(&self, node: Node) -> Result<Declaration> {
        let name = self.declaration_name(node)?;
        let ty = self.ty(self.field(node, "value")?)?;
        Ok(Declaration { name, shape: Shape::Alias(ty) })
    }

    /// Members of an interface body or object type: plain properties plus at
    /// most one index signature, lowered to a `Record`.
    fn members(&self, body: Node) -> Result<(Vec<Field>, Option<Ty>)> {
        let mut fields = Vec::new();
        let mut index = None;
        for member in named_children(body) {
            match member.kind() {
                "property_signature" => fields.push(self.property(member)?),
                "index_signature" => {
                    if index.is_some() {
                        return Err(error_at(member, "more than one index signature"));
                    }
                    index = Some(self.index_signature(member)?);
                }
                "method_signature" | "call_signature" | "construct_signature" => {
                    let name = member
                        .child_by_field_name("name")
                        .map(|n| self.text(n))
                        .unwrap_or("(anonymous)");
                    return Err(error_at(member, format!("method member `{name}` is not supported")));
                }
                kind => return Err(error_at(member, format!("member `{kind}` is not supported"))),
            }
        }
        Ok((fields, index))
    }

    fn property(&self, node: Node) -> Result<Field> {
        let key = self.field(node, "name")?;
        let name = match key.kind() {
            "property_identifier" | "number" => self.text(key).to_string(),
            "string" => self.string(key),
            _ => return Err(error_at(key, format!("member name `{}` is not supported", self.text(key)))),
        };
        let optional = node.children(&mut node.walk()).any(|c| c.kind() == "?");
        let ty = match node.child_by_field_name("type") {
            Some(annotation) => self.ty(annotation)?,
            // `x;` is `x: any` in TypeScript.
            None => Ty::Keyword(Keyword::Any),
        };
        Ok(Field { name, ty, optional })
    }

    /// `[k: string]: V` → `Record<string, V>`.
    fn index_signature(&self, node: Node) -> Result<Ty> {
        let key = match node.child_by_field_name("index_type") {
            Some(key) => key,
            None => named_children(node)
                .into_iter()
                .find(|c| !matches!(c.kind(), "identifier" | "type_annotation"))
                .ok_or_else(|| error_at(node, "index signature without a key type"))?,
        };
        if key.kind() == "mapped_type_clause" {
            return Err(error_at(key, "mapped index signatures are not supported"));
        }
        let value = self.field(node, "type")?;
        if value.kind() != "type_annotation" {
            return Err(error_at(value, format!("index signature `{}` is not supported", self.text(node))));
        }
        Ok(Ty::Record { key: Box::new(self.ty(key)?), value: Box::new(self.ty(value)?) })
    }

    // ------------------------------ types --------------------------------- //

    fn ty(&self, node: Node) -> Result<Ty> {
        match node.kind() {
            "type_annotation" | "parenthesized_type" | "readonly_type" => self.ty(self.inner(node)?),
            "predefined_type" | "type_identifier" => Ok(self.named(self.text(node))),
            "literal_type" => self.literal(self.inner(node)?),
            "union_type" => Ok(collapse(self.flatten(node, "union_type")?, Ty::Union)),
            "intersection_type" => Ok(collapse(self.flatten(node, "intersection_type")?, Ty::Intersect)),
            "array_type" => Ok(Ty::Array(Box::new(self.ty(self.inner(node)?)?))),
            "tuple_type" => {
                let mut elems = Vec::new();
                for elem in named_children(node) {
                    if matches!(elem.kind(), "optional_type" | "rest_type" | "tuple_parameter" | "optional_tuple_parameter") {
                        return Err(error_at(elem, format!("tuple element `{}` is not supported", self.text(elem))));
                    }
                    elems.push(self.ty(elem)?);
                }
                Ok(Ty::Tuple(elems))
            }
            "object_type" => {
                let (fields, index) = self.members(node)?;
                Ok(match index {
                    None => Ty::Object { fields },
                    Some(index) if fields.is_empty() => index,
                    Some(index) => Ty::Intersect(vec![Ty::Object { fields }, index]),
                })
            }
            "generic_type" => self.generic(node),
            "nested_type_identifier" => {
                Err(error_at(node, format!("qualified name `{}` is not supported", self.text(node))))
            }
            "lookup_type" | "index_type_query" => {
                Err(error_at(node, format!("indexed access `{}` is not supported", self.text(node))))
            }
            _ => Err(error_at(node, format!("type `{}` is not supported", self.text(node)))),
        }
    }

    fn named(&self, word: &str) -> Ty {
        let keyword = match word {
            "string" => Keyword::String,
            "number" => Keyword::Number,
            "boolean" => Keyword::Boolean,
            "bigint" => Keyword::BigInt,
            "null" => Keyword::Null,
            "undefined" => Keyword::Undefined,
            "any" => Keyword::Any,
            "unknown" => Keyword::Unknown,
            "never" => Keyword::Never,
            "object" => Keyword::Object,
            "void" => Keyword::Void,
            "Date" => Keyword::Date,
            _ => return Ty::Ref(word.to_string()),
        };
        Ty::Keyword(keyword)
    }

    fn literal(&self, node: Node) -> Result<Ty> {
        Ok(match node.kind() {
            "string" => Ty::Literal(Literal::Str(self.string(node))),
            "number" | "unary_expression" => {
                let spelled: String = self.text(node).split_whitespace().collect();
                Ty::Literal(Literal::Num(spelled))
            }
            "true" => Ty::Literal(Literal::Bool(true)),
            "false" => Ty::Literal(Literal::Bool(false)),
            "null" => Ty::Keyword(Keyword::Null),
            "undefined" => Ty::Keyword(Keyword::Undefined),
            _ => return Err(error_at(node, format!("literal `{}` is not supported", self.text(node)))),
        })
    }

    /// `a | b | c` parses left-nested; every arm is lifted to one level.
    fn flatten(&self, node: Node, kind: &str) -> Result<Vec<Ty>> {
        let mut arms = Vec::new();
        for child in named_children(node) {
            if child.kind() == kind {
                arms.extend(self.flatten(child, kind)?);
            } else {
                arms.push(self.ty(child)?);
            }
        }
        Ok(arms)
    }

    fn generic(&self, node: Node) -> Result<Ty> {
        let name = self.text(self.field(node, "name")?);
        let mut args = Vec::new();
        for arg in named_children(self.field(node, "type_arguments")?) {
            args.push(self.ty(arg)?);
        }
        let arity = |n: usize| -> Result<()> {
            if args.len() == n {
                Ok(())
            } else {
                Err(error_at(node, format!("`{name}` takes {n} type argument(s), found {}", args.len())))
            }
        };
        let utility = match name {
            "Array" | "ReadonlyArray" => {
                arity(1)?;
                return Ok(Ty::Array(Box::new(args.remove(0))));
            }
            "Record" => {
                arity(2)?;
                let value = args.pop().map(Box::new);
                let key = args.pop().map(Box::new);
                return match (key, value) {
                    (Some(key), Some(value)) => Ok(Ty::Record { key, value }),
                    _ => Err(error_at(node, "`Record` takes 2 type argument(s)")),
                };
            }
            "Partial" => Utility::Partial,
            "Required" => Utility::Required,
            "Pick" => Utility::Pick,
            "Omit" => Utility::Omit,
            _ => return Err(error_at(node, format!("generic type `{name}<...>` is not supported"))),
        };
        arity(utility.arity())?;
        Ok(Ty::Utility { utility, args })
    }

    /// Contents of a string literal with its escapes resolved.
    fn string(&self, node: Node) -> String {
        let mut out = String::new();
        for part in node.named_children(&mut node.walk()) {
            let text = self.text(part);
            match part.kind() {
                "escape_sequence" => match text {
                    "\\n" => out.push('\n'),
                    "\\t" => out.push('\t'),
                    "\\r" => out.push('\r'),
                    _ => out.push_str(&text[1..]),
                },
                _ => out.push_str(text),
            }
        }
        out
    }
}

fn collapse(mut parts: Vec<Ty>, wrap: fn(Vec<Ty>) -> Ty) -> Ty {
    if parts.len() == 1 { parts.remove(0) } else { wrap(parts) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_fields_optionality_and_references() {
        let src = r#"
            import type { Foo } from './foo';
            /** doc */
            export interface Category {
              id: string
              providers?: (string | Provider)[] | null
              readonly tags: Array<'a' | 'b'>;
            }
        "#;
        let decls = parse_declarations(src).unwrap();
        assert_eq!(decls.len(), 1);
        let fields = decls[0].fields();
        assert_eq!(fields.len(), 3);
        assert!(!fields[0].optional);
        assert!(fields[1].optional);
        assert_eq!(fields[2].name, "tags");
        let refs: Vec<_> = decls[0].references().into_iter().collect();
        assert_eq!(refs, vec!["Provider"]);
    }

    #[test]
    fn aliases_heritage_and_nested_objects() {
        let src = "type Status = 'draft' | 'published';\n\
                   interface Post extends Base, Audited { meta: { author?: User; score: -1 | 2 }, pair: [string, Status] }\n\
                   declare module 'payload' { export interface GeneratedTypes extends Config {} }";
        let decls = parse_declarations(src).unwrap();
        let names: Vec<_> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Status", "Post"]);
        assert!(matches!(&decls[0].shape, Shape::Alias(Ty::Union(arms)) if arms.len() == 2));
        let refs: Vec<_> = decls[1].references().into_iter().collect();
        assert_eq!(refs, vec!["Base", "Audited", "User", "Status"]);
        match &decls[1].fields()[0].ty {
            Ty::Object { fields } => {
                assert!(matches!(&fields[1].ty, Ty::Union(arms) if arms[0] == Ty::Literal(Literal::Num("-1".into()))));
            }
            other => panic!("unexpected type {other:?}"),
        }
    }

    #[test]
    fn leading_bar_and_records() {
        let decls = parse_declarations("export type M = | Record<string, unknown> | null").unwrap();
        match &decls[0].shape {
            Shape::Alias(Ty::Union(arms)) => {
                assert!(matches!(arms[0], Ty::Record { .. }));
                assert!(arms[1].is_null());
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn index_signatures_become_records() {
        let src = "interface Doc {\n  content?: { [k: string]: unknown } | null\n  node: { type: string; [k: string]: unknown }\n}";
        let decls = parse_declarations(src).unwrap();
        let fields = decls[0].fields();
        let record = Ty::Record {
            key: Box::new(Ty::Keyword(Keyword::String)),
            value: Box::new(Ty::Keyword(Keyword::Unknown)),
        };
        assert_eq!(fields[0].ty, Ty::Union(vec![record.clone(), Ty::Keyword(Keyword::Null)]));
        match &fields[1].ty {
            Ty::Intersect(parts) => {
                assert!(matches!(&parts[0], Ty::Object { fields } if fields[0].name == "type"));
                assert_eq!(parts[1], record);
            }
            other => panic!("unexpected type {other:?}"),
        }

        let decls = parse_declarations("interface Bag extends Base { [key: string]: number }").unwrap();
        assert!(matches!(&decls[0].shape, Shape::Alias(Ty::Intersect(parts)) if parts[0] == Ty::Ref("Base".into())));
    }

    #[test]
    fn type_only_reexports_are_skipped() {
        let src = "export type { Foo } from './foo';\nexport { Bar };\nexport * from './baz';\nexport type Id = string;";
        let decls = parse_declarations(src).unwrap();
        let names: Vec<_> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Id"]);
    }

    #[test]
    fn utility_types_keep_their_references() {
        let decls = parse_declarations("interface A { tags?: Partial<B>; brief: Pick<C, 'id' | 'name'> }").unwrap();
        let fields = decls[0].fields();
        assert_eq!(
            fields[0].ty,
            Ty::Utility { utility: Utility::Partial, args: vec![Ty::Ref("B".into())] }
        );
        assert!(matches!(&fields[1].ty, Ty::Utility { utility: Utility::Pick, args } if args.len() == 2));
        let refs: Vec<_> = decls[0].references().into_iter().collect();
        assert_eq!(refs, vec!["B", "C"]);
    }

    #[test]
    fn escaped_quotes_stay_inside_string_literals() {
        let decls = parse_declarations(r#"type Q = 'it\'s' | "say \"hi\"""#).unwrap();
        match &decls[0].shape {
            Shape::Alias(Ty::Union(arms)) => {
                assert_eq!(arms[0], Ty::Literal(Literal::Str("it's".into())));
                assert_eq!(arms[1], Ty::Literal(Literal::Str("say \"hi\"".into())));
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn unsupported_constructs_report_position() {
        let err = parse_declarations("interface A {\n  f(): void\n}").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, column: 3, .. }), "{err}");
        let err = parse_declarations("interface A { x: string }\ninterface Box<T> { v: T }").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }), "{err}");
        assert!(parse_declarations("interface A { x: Maybe<string> }").is_err());
        assert!(parse_declarations("type K = A['b']").is_err());
    }

    #[test]
    fn syntax_errors_are_reported() {
        let err = parse_declarations("interface A {\n  x: string\n  y: = 1\n}").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "{err}");
    }
}
