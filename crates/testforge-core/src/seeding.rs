// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use crate::error::CoreError;
use testforge_bytecode::{SeedPool, Value};

/// Round-trips a [`SeedPool`] through a CSV of harvested primitive constants
/// (spec.md §6 "Persisted state": "a seed file... may be supplied as input
/// and appended as output"). One row per value, `type,literal`; only the
/// primitive types the factory's seed pools actually draw from are
/// supported (spec.md §4.3).
pub fn load_csv(pool: &SeedPool, contents: &str) -> Result<usize, CoreError> {
    let mut loaded = 0;
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (kind, literal) = line
            .split_once(',')
            .ok_or_else(|| CoreError::Configuration(format!("seed file line {}: expected `type,value`", line_no + 1)))?;
        let value = parse_value(kind, literal)
            .ok_or_else(|| CoreError::Configuration(format!("seed file line {}: cannot parse `{kind}` value", line_no + 1)))?;
        pool.push(value);
        loaded += 1;
    }
    Ok(loaded)
}

fn parse_value(kind: &str, literal: &str) -> Option<Value> {
    match kind {
        "int" => literal.parse::<i64>().ok().map(Value::Int),
        "float" => literal.parse::<f64>().ok().map(Value::Float),
        "bool" => literal.parse::<bool>().ok().map(Value::Bool),
        "str" => Some(Value::Str(unescape(literal))),
        _ => None,
    }
}

/// Renders every value currently in `pool` as a CSV document, appendable to
/// the file `load_csv` was originally read from.
pub fn append_csv(pool: &SeedPool) -> String {
    let mut out = String::new();
    for value in pool.snapshot() {
        if let Some(row) = render_value(&value) {
            out.push_str(&row);
            out.push('\n');
        }
    }
    out
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Int(i) => Some(format!("int,{i}")),
        Value::Float(f) => Some(format!("float,{f}")),
        Value::Bool(b) => Some(format!("bool,{b}")),
        Value::Str(s) => Some(format!("str,{}", escape(s))),
        Value::Bytes(_) | Value::List(_) | Value::None => None,
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace(',', "\\,").replace('\n', "\\n")
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some(',') => out.push(','),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_primitive_values() {
        let pool = SeedPool::new();
        pool.push(Value::Int(42));
        pool.push(Value::Str("hi, there".into()));
        let csv = append_csv(&pool);

        let reloaded = SeedPool::new();
        let count = load_csv(&reloaded, &csv).unwrap();
        assert_eq!(count, 2);
        let snapshot = reloaded.snapshot();
        assert_eq!(snapshot[0], Value::Int(42));
        assert_eq!(snapshot[1], Value::Str("hi, there".into()));
    }

    #[test]
    fn malformed_line_is_a_configuration_error() {
        let pool = SeedPool::new();
        assert!(load_csv(&pool, "not-a-valid-row").is_err());
    }
}
