// Strongly-typed IR for declarations. Produced once by the parser, read by
// everything downstream. No generated text in here.

use indexmap::IndexSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    String,
    Number,
    Boolean,
    BigInt,
    Null,
    Undefined,
    Any,
    Unknown,
    Never,
    Object,
    Void,
    Date,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Num(String),         // kept as written so codegen round-trips the source spelling
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Keyword(Keyword),
    Literal(Literal),
    Ref(String),               // another declaration, known or not
    Array(Box<Ty>),
    Tuple(Vec<Ty>),
    Record { key: Box<Ty>, value: Box<Ty> },
    Object { fields: Vec<Field> },
    Union(Vec<Ty>),
    Intersect(Vec<Ty>),
    /// `Partial<T>`, `Pick<T, K>` and friends.
    Utility { utility: Utility, args: Vec<Ty> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utility {
    Partial,
    Required,
    Pick,
    Omit,
}

impl Utility {
    pub fn arity(self) -> usize {
        match self {
            Utility::Partial | Utility::Required => 1,
            Utility::Pick | Utility::Omit => 2,
        }
    }

    /// TypeBox builder of the same name.
    pub fn builder(self) -> &'static str {
        match self {
            Utility::Partial => "Type.Partial",
            Utility::Required => "Type.Required",
            Utility::Pick => "Type.Pick",
            Utility::Omit => "Type.Omit",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// `interface Name extends A, B { ... }`
    Interface { extends: Vec<String>, fields: Vec<Field> },
    /// `type Name = ...`
    Alias(Ty),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub shape: Shape,
}

impl Ty {
    pub fn is_null(&self) -> bool {
        matches!(self, Ty::Keyword(Keyword::Null))
    }

    /// Every referenced name, in first-seen order.
    pub fn collect_refs(&self, out: &mut IndexSet<String>) {
        match self {
            Ty::Keyword(_) | Ty::Literal(_) => {}
            Ty::Ref(name) => {
                out.insert(name.clone());
            }
            Ty::Array(item) => item.collect_refs(out),
            Ty::Record { key, value } => {
                key.collect_refs(out);
                value.collect_refs(out);
            }
            Ty::Object { fields } => {
                for f in fields {
                    f.ty.collect_refs(out);
                }
            }
            Ty::Tuple(xs) | Ty::Union(xs) | Ty::Intersect(xs) | Ty::Utility { args: xs, .. } => {
                for x in xs {
                    x.collect_refs(out);
                }
            }
        }
    }
}

impl Declaration {
    /// Top-level fields. Aliases of a non-object type have none.
    pub fn fields(&self) -> &[Field] {
        match &self.shape {
            Shape::Interface { fields, .. } => fields,
            Shape::Alias(Ty::Object { fields }) => fields,
            Shape::Alias(_) => &[],
        }
    }

    /// Union of every name this declaration refers to: heritage first, then
    /// field references in field order.
    pub fn references(&self) -> IndexSet<String> {
        let mut out = IndexSet::new();
        match &self.shape {
            Shape::Interface { extends, fields } => {
                out.extend(extends.iter().cloned());
                for f in fields {
                    f.ty.collect_refs(&mut out);
                }
            }
            Shape::Alias(ty) => ty.collect_refs(&mut out),
        }
        out
    }
}
