//! Minimal CLI: TypeScript declarations → (typebox | graph)
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, Args};
use colored::Colorize;

use crate::config::{ImportStyle, Settings};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate TypeBox schemas from TypeScript interfaces, including recursive and mutually recursive ones
#[derive(Parser, Debug)]
#[command(name = "ts2typebox", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// emit a TypeBox module
    Typebox(TypeboxOut),
    /// print the dependency graph, classification and emission order as JSON
    Graph(GraphOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns; concatenated in order
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// JSON settings file (ignore list, rewrites, import style)
    #[arg(long)]
    config: Option<PathBuf>,

    /// declaration names to drop before anything else runs
    #[arg(long, num_args = 1..)]
    ignore: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct TypeboxOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// drop `null` from the unions of optional fields
    #[arg(long)]
    remove_null: bool,

    /// make optional array fields required
    #[arg(long)]
    required_arrays: bool,

    /// import `t as Type` from elysia instead of @sinclair/typebox
    #[arg(long)]
    elysia: bool,

    /// output .ts file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct GraphOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_source(&self) -> Result<String> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut source = String::new();
        for source_path in source_paths {
            let text = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            tracing::info!(path = %source_path.display(), bytes = text.len(), "read input");
            source.push_str(&text);
            source.push('\n');
        }
        Ok(source)
    }

    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        settings.ignore.extend(self.ignore.iter().cloned());
        Ok(settings)
    }
}

impl TypeboxOut {
    fn settings(&self) -> Result<Settings> {
        let mut settings = self.input_settings.settings()?;
        settings.remove_null_if_optional |= self.remove_null;
        settings.require_optional_arrays |= self.required_arrays;
        if self.elysia {
            settings.import_style = ImportStyle::Elysia;
        }
        Ok(settings)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Typebox(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(())
                }
                let settings = target.settings()?;
                let source = target.input_settings.load_source()?;
                let module = crate::pipeline::generate(&source, &settings)?;
                write_output(target.out.as_deref(), &module)
            }
            Command::Graph(target) => {
                let settings = target.input_settings.settings()?;
                let source = target.input_settings.load_source()?;
                let report = crate::pipeline::report(&source, &settings)?;
                let json = serde_json::to_string_pretty(&report)?;
                write_output(target.out.as_deref(), &json)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Nothing is written unless the whole run succeeded.
fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))?;
            eprintln!("{} {}", "wrote".green().bold(), out.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched = glob::glob(pattern)
                .with_context(|| format!("invalid glob pattern: {pattern}"))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                bail!("glob pattern matched no files: {pattern}");
            }
            matched.sort();
            out.extend(matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
