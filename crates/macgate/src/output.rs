//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders action results in the format selected by `--output`. Table uses
//! `tabled`, structured formats use serde, plain emits bare values for
//! scripting.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::{builder::Builder, settings::Style};

use macgate_core::ActionResult;

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

fn headline(result: &ActionResult, color: bool) -> String {
    match (result.success, color) {
        (true, true) => format!("{} {}", "✓".green().bold(), result.message),
        (false, true) => format!("{} {}", "✗".red().bold(), result.message.red()),
        (true, false) => format!("✓ {}", result.message),
        (false, false) => format!("✗ {}", result.message),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render an action result in the chosen format.
///
/// - `table`: status line followed by `table_fn` applied to the data
/// - `json` / `json-compact` / `yaml`: the whole result via serde
/// - `plain`: `plain_fn` applied to the data
pub fn render_action(
    format: &OutputFormat,
    result: &ActionResult,
    color: bool,
    table_fn: impl Fn(&Value) -> String,
    plain_fn: impl Fn(&Value) -> String,
) -> String {
    match format {
        OutputFormat::Table => {
            let body = table_fn(&result.data);
            if body.is_empty() {
                headline(result, color)
            } else {
                format!("{}\n{body}", headline(result, color))
            }
        }
        OutputFormat::Json => render_json(result, false),
        OutputFormat::JsonCompact => render_json(result, true),
        OutputFormat::Yaml => render_yaml(result),
        OutputFormat::Plain => plain_fn(&result.data),
    }
}

/// Render a single serde-serializable item in the chosen format.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Tables from JSON ────────────────────────────────────────────────

/// Generic table for a JSON value.
///
/// Arrays of objects become one row per element with the union of keys as
/// columns; objects become a Field/Value table; nested structures render
/// as nested tables.
pub fn value_table(value: &Value) -> String {
    match value {
        Value::Array(items) if items.is_empty() => "(none)".into(),
        Value::Array(items) if items.iter().all(Value::is_object) => rows_table(items),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join("\n"),
        Value::Object(map) if map.is_empty() => String::new(),
        Value::Object(map) => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, val) in map {
                builder.push_record([key.clone(), nested(val)]);
            }
            finish(builder)
        }
        other => cell(other),
    }
}

/// One row per object, columns in first-seen key order.
pub fn rows_table(items: &[Value]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for item in items {
        if let Value::Object(map) = item {
            for key in map.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().copied());
    for item in items {
        builder.push_record(
            columns
                .iter()
                .map(|col| item.get(col).map_or_else(|| "-".into(), cell)),
        );
    }
    finish(builder)
}

fn finish(builder: Builder) -> String {
    builder.build().with(Style::rounded()).to_string()
}

fn nested(value: &Value) -> String {
    match value {
        Value::Array(items) if !items.is_empty() => value_table(value),
        Value::Object(map) if !map.is_empty() => value_table(value),
        other => cell(other),
    }
}

/// Scalar display: strings unquoted, null as `-`, structures as compact JSON.
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".into(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => render_json(other, true),
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}
