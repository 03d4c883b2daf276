// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A runtime value flowing through an instrumented [`crate::code_object::CodeObject`].
///
/// This plays the role of the host language's dynamically typed objects: every
/// value carries its own tag, and `None` is a first-class bottom value distinct
/// from "no value was produced".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    None,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::None => "none",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
            Value::Bytes(b) => !b.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::None => false,
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Bytes(b) => Some(b.len()),
            Value::List(l) => Some(l.len()),
            _ => None,
        }
    }

    /// Elementwise numeric distance used by branch-distance computation. Returns
    /// `None` for heterogeneous-type comparisons, the "maximal distance" open
    /// question from spec.md DESIGN NOTES is resolved by the caller treating
    /// `None` as the configured maximal distance.
    pub fn numeric_distance(&self, other: &Value) -> Option<f64> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some((*a - *b).unsigned_abs() as f64),
            (Value::Float(a), Value::Float(b)) => Some((a - b).abs()),
            (Value::Int(a), Value::Float(b)) => Some((*a as f64 - b).abs()),
            (Value::Float(a), Value::Int(b)) => Some((a - *b as f64).abs()),
            _ => None,
        }
    }

    pub fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "{b:?}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::None => write!(f, "None"),
        }
    }
}
