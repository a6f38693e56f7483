//! Field-level code generation: one declaration → one TypeBox fragment.
//!
//! Works on a single declaration and knows nothing about the others; a
//! reference to another declaration is rendered as its bare name.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::{Declaration, Field, Keyword, Literal, Shape, Ty};

static BARE_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

const INDENT: &str = "  ";

pub struct Codegen {
    out: String,
    depth: usize,
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}

impl Codegen {
    pub fn new() -> Self {
        Self { out: String::new(), depth: 0 }
    }

    pub fn into_string(self) -> String {
        self.out
    }

    /// `export type X = Static<typeof X>` followed by `export const X = ...`.
    pub fn emit(&mut self, decl: &Declaration) {
        let name = &decl.name;
        self.out.push_str(&format!("export type {name} = Static<typeof {name}>\n"));
        self.out.push_str(&format!("export const {name} = "));
        match &decl.shape {
            Shape::Interface { extends, fields } if extends.is_empty() => self.object(fields),
            Shape::Interface { extends, fields } => {
                self.out.push_str("Type.Composite([");
                for base in extends {
                    self.out.push_str(base);
                    self.out.push_str(", ");
                }
                self.object(fields);
                self.out.push_str("])");
            }
            Shape::Alias(ty) => self.ty(ty),
        }
        self.out.push('\n');
    }

    fn ty(&mut self, ty: &Ty) {
        match ty {
            Ty::Keyword(k) => self.out.push_str(keyword(*k)),
            Ty::Literal(lit) => {
                self.out.push_str("Type.Literal(");
                match lit {
                    Literal::Str(s) => self.out.push_str(&quote(s)),
                    Literal::Num(n) => self.out.push_str(n),
                    Literal::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
                }
                self.out.push(')');
            }
            Ty::Ref(name) => self.out.push_str(name),
            Ty::Array(item) => {
                self.out.push_str("Type.Array(");
                self.ty(item);
                self.out.push(')');
            }
            Ty::Record { key, value } => {
                self.out.push_str("Type.Record(");
                self.ty(key);
                self.out.push_str(", ");
                self.ty(value);
                self.out.push(')');
            }
            Ty::Tuple(xs) => self.list("Type.Tuple", xs),
            Ty::Union(xs) => self.list("Type.Union", xs),
            Ty::Intersect(xs) => self.list("Type.Intersect", xs),
            Ty::Object { fields } => self.object(fields),
            Ty::Utility { utility, args } => {
                self.out.push_str(utility.builder());
                self.out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.ty(arg);
                }
                self.out.push(')');
            }
        }
    }

    fn list(&mut self, ctor: &str, xs: &[Ty]) {
        self.out.push_str(ctor);
        self.out.push_str("([");
        for (i, x) in xs.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.ty(x);
        }
        self.out.push_str("])");
    }

    fn object(&mut self, fields: &[Field]) {
        if fields.is_empty() {
            self.out.push_str("Type.Object({})");
            return;
        }
        self.out.push_str("Type.Object({\n");
        self.depth += 1;
        for f in fields {
            self.out.push_str(&INDENT.repeat(self.depth));
            self.out.push_str(&key(&f.name));
            self.out.push_str(": ");
            if f.optional {
                self.out.push_str("Type.Optional(");
                self.ty(&f.ty);
                self.out.push(')');
            } else {
                self.ty(&f.ty);
            }
            self.out.push_str(",\n");
        }
        self.depth -= 1;
        self.out.push_str(&INDENT.repeat(self.depth));
        self.out.push_str("})");
    }
}

/// Render one declaration on its own.
pub fn fragment(decl: &Declaration) -> String {
    let mut cg = Codegen::new();
    cg.emit(decl);
    cg.into_string()
}

fn keyword(k: Keyword) -> &'static str {
    match k {
        Keyword::String => "Type.String()",
        Keyword::Number => "Type.Number()",
        Keyword::Boolean => "Type.Boolean()",
        Keyword::BigInt => "Type.BigInt()",
        Keyword::Null => "Type.Null()",
        Keyword::Undefined => "Type.Undefined()",
        Keyword::Any => "Type.Any()",
        Keyword::Unknown => "Type.Unknown()",
        Keyword::Never => "Type.Never()",
        Keyword::Object => "Type.Object({})",
        Keyword::Void => "Type.Void()",
        Keyword::Date => "Type.Date()",
    }
}

fn key(name: &str) -> String {
    if BARE_KEY.is_match(name) { name.to_string() } else { quote(name) }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_declarations;

    fn render(src: &str) -> String {
        fragment(&parse_declarations(src).unwrap().remove(0))
    }

    #[test]
    fn interface_becomes_object_with_optional_wrappers() {
        let out = render("interface Provider { id: string; status?: ('draft' | 'published') | null; categories: (string | Category)[] }");
        assert_eq!(
            out,
            "export type Provider = Static<typeof Provider>\n\
             export const Provider = Type.Object({\n  \
               id: Type.String(),\n  \
               status: Type.Optional(Type.Union([Type.Union([Type.Literal('draft'), Type.Literal('published')]), Type.Null()])),\n  \
               categories: Type.Array(Type.Union([Type.String(), Category])),\n\
             })\n"
        );
    }

    #[test]
    fn nested_objects_indent_and_odd_keys_are_quoted() {
        let out = render("interface M { 'x-id': number; inner: { ok?: boolean } }");
        assert!(out.contains("  'x-id': Type.Number(),\n"));
        assert!(out.contains("  inner: Type.Object({\n    ok: Type.Optional(Type.Boolean()),\n  }),\n"));
    }

    #[test]
    fn heritage_and_aliases() {
        assert!(render("interface Post extends Base { n: 1 }").contains("export const Post = Type.Composite([Base, Type.Object({\n"));
        assert!(render("type Pair = [string, Date]").ends_with("export const Pair = Type.Tuple([Type.String(), Type.Date()])\n"));
        assert!(render("type Empty = {}").ends_with("= Type.Object({})\n"));
    }

    #[test]
    fn index_signatures_and_utility_types() {
        let out = render("interface Doc { content?: { [k: string]: unknown } | null; tags?: Partial<Tag>; brief: Omit<Tag, 'id'> }");
        assert!(out.contains(
            "  content: Type.Optional(Type.Union([Type.Record(Type.String(), Type.Unknown()), Type.Null()])),\n"
        ));
        assert!(out.contains("  tags: Type.Optional(Type.Partial(Tag)),\n"));
        assert!(out.contains("  brief: Type.Omit(Tag, Type.Literal('id')),\n"));
    }
}
