//! Field-level rewrites applied to one declaration at a time, before any
//! cross-declaration work happens.

use crate::ir::{Declaration, Field, Shape, Ty};

/// Drop `null` arms from the unions of optional fields, descending into
/// object literal types. `x?: T | null` becomes `x?: T`.
pub fn remove_null_if_optional(decl: &Declaration) -> Declaration {
    let shape = match &decl.shape {
        Shape::Interface { extends, fields } => Shape::Interface {
            extends: extends.clone(),
            fields: fields.iter().map(strip_field).collect(),
        },
        Shape::Alias(Ty::Object { fields }) => Shape::Alias(Ty::Object {
            fields: fields.iter().map(strip_field).collect(),
        }),
        Shape::Alias(ty) => Shape::Alias(ty.clone()),
    };
    Declaration { name: decl.name.clone(), shape }
}

fn strip_field(field: &Field) -> Field {
    let ty = match &field.ty {
        Ty::Object { fields } => Ty::Object { fields: fields.iter().map(strip_field).collect() },
        // `{ a?: T | null; [k: string]: V }` arrives as an intersection.
        Ty::Intersect(parts) => Ty::Intersect(parts.iter().map(strip_nested).collect()),
        ty if field.optional => strip_null(ty),
        ty => ty.clone(),
    };
    Field { ty, ..field.clone() }
}

fn strip_nested(ty: &Ty) -> Ty {
    match ty {
        Ty::Object { fields } => Ty::Object { fields: fields.iter().map(strip_field).collect() },
        other => other.clone(),
    }
}

fn strip_null(ty: &Ty) -> Ty {
    match ty {
        Ty::Union(arms) => {
            let mut kept: Vec<Ty> = arms.iter().filter(|t| !t.is_null()).cloned().collect();
            match kept.len() {
                // `null` on its own stays as written.
                0 => ty.clone(),
                1 => kept.remove(0),
                _ => Ty::Union(kept),
            }
        }
        Ty::Object { fields } => Ty::Object { fields: fields.iter().map(strip_field).collect() },
        other => other.clone(),
    }
}

/// Optional array-typed fields become required: `tags?: string[]` → `tags: string[]`.
pub fn require_optional_arrays(decl: &Declaration) -> Declaration {
    let require = |f: &Field| Field {
        optional: f.optional && !matches!(f.ty, Ty::Array(_)),
        ..f.clone()
    };
    let shape = match &decl.shape {
        Shape::Interface { extends, fields } => Shape::Interface {
            extends: extends.clone(),
            fields: fields.iter().map(require).collect(),
        },
        Shape::Alias(Ty::Object { fields }) => Shape::Alias(Ty::Object {
            fields: fields.iter().map(require).collect(),
        }),
        Shape::Alias(ty) => Shape::Alias(ty.clone()),
    };
    Declaration { name: decl.name.clone(), shape }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Keyword;
    use crate::parser::parse_declarations;

    fn one(src: &str) -> Declaration {
        parse_declarations(src).unwrap().remove(0)
    }

    #[test]
    fn null_removed_only_from_optional_unions() {
        let decl = remove_null_if_optional(&one(
            "interface P { bio?: string | null; name: string | null; status?: ('a' | 'b') | null; meta: { x?: number | null } }",
        ));
        let f = decl.fields();
        assert_eq!(f[0].ty, Ty::Keyword(Keyword::String));
        assert!(matches!(&f[1].ty, Ty::Union(arms) if arms.len() == 2));
        assert!(matches!(&f[2].ty, Ty::Union(arms) if arms.len() == 2 && !arms.iter().any(Ty::is_null)));
        match &f[3].ty {
            Ty::Object { fields } => assert_eq!(fields[0].ty, Ty::Keyword(Keyword::Number)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn null_removed_beside_index_signatures() {
        let decl = remove_null_if_optional(&one(
            "interface P { node: { label?: string | null; [k: string]: unknown }; data?: { [k: string]: unknown } | null }",
        ));
        let f = decl.fields();
        match &f[0].ty {
            Ty::Intersect(parts) => {
                assert!(matches!(&parts[0], Ty::Object { fields } if fields[0].ty == Ty::Keyword(Keyword::String)));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(f[1].ty, Ty::Record { .. }));
    }

    #[test]
    fn bare_null_is_left_alone() {
        let decl = remove_null_if_optional(&one("interface P { gone?: null }"));
        assert!(decl.fields()[0].ty.is_null());
    }

    #[test]
    fn optional_arrays_become_required() {
        let decl = require_optional_arrays(&one("interface P { ids?: string[]; bio?: string; all: number[] }"));
        let optional: Vec<_> = decl.fields().iter().map(|f| f.optional).collect();
        assert_eq!(optional, vec![false, true, false]);
    }
}
