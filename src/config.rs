//! Run settings: which declarations to drop, which field rewrites to apply,
//! and which import line heads the output.
//!
//! Read from an optional JSON file; CLI flags are merged on top.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStyle {
    /// `import { Type, Static, TSchema } from '@sinclair/typebox'`
    #[default]
    Typebox,
    /// `import { Static, TSchema, t as Type } from 'elysia'`
    Elysia,
    /// No import line; the caller prepends its own.
    None,
}

impl ImportStyle {
    pub fn preamble(self) -> Option<&'static str> {
        match self {
            ImportStyle::Typebox => Some("import { Type, Static, TSchema } from '@sinclair/typebox'"),
            ImportStyle::Elysia => Some("import { Static, TSchema, t as Type } from 'elysia'"),
            ImportStyle::None => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Settings {
    /// Declarations removed before the graph is built. References to them
    /// are then treated like any other external name.
    pub ignore: Vec<String>,
    /// `x?: T | null` → `x?: T`
    pub remove_null_if_optional: bool,
    /// `xs?: T[]` → `xs: T[]`
    pub require_optional_arrays: bool,
    pub import_style: ImportStyle,
}

impl Settings {
    pub fn from_json_str(src: &str) -> Result<Self> {
        let de = &mut serde_json::Deserializer::from_str(src);
        serde_path_to_error::deserialize(de).map_err(|err| {
            let path = err.path().to_string();
            Error::Config(format!("at JSON path {path} → {}", err.into_inner()))
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)?;
        Self::from_json_str(&src).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.iter().any(|n| n == name)
    }
}
