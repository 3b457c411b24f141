//! Function-Value Codec
//!
//! Cells store [`Plain`] values, which must support equality so the sync
//! path can detect changes. Function values have no structural equality,
//! so they travel inside [`FnBox`], an opaque container comparing by
//! pointer identity. The codec is invisible from outside: callers hand in
//! and receive [`Value`], and `Plain` never leaves the crate.
//!
//! Round-trip law: `unwrap(wrap(v)) == v` for every value, including
//! functions (same `Arc`, so identity is preserved).

use super::value::{FieldFn, Value};
use std::sync::Arc;

/// Opaque carrier for a function inside a cell.
///
/// The payload is private to this module; nothing outside the codec can
/// observe or construct one.
#[derive(Clone)]
pub(crate) struct FnBox {
    f: FieldFn,
}

impl PartialEq for FnBox {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

/// Cell-side representation of a field value.
#[derive(Clone, PartialEq)]
pub(crate) enum Plain {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Plain>),
    Fn(FnBox),
}

impl std::fmt::Debug for Plain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Plain::Null => write!(f, "Null"),
            Plain::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Plain::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Plain::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Plain::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Plain::List(items) => f.debug_tuple("List").field(items).finish(),
            Plain::Fn(_) => write!(f, "Fn(..)"),
        }
    }
}

/// Convert a caller-facing value into its cell representation.
///
/// Non-function values pass through unchanged in shape; functions are
/// boxed. Lists convert element-wise.
pub(crate) fn wrap(value: Value) -> Plain {
    match value {
        Value::Null => Plain::Null,
        Value::Bool(b) => Plain::Bool(b),
        Value::Int(n) => Plain::Int(n),
        Value::Float(x) => Plain::Float(x),
        Value::Str(s) => Plain::Str(s),
        Value::List(items) => Plain::List(items.into_iter().map(wrap).collect()),
        Value::Func(f) => Plain::Fn(FnBox { f }),
    }
}

/// Convert a cell representation back into a caller-facing value.
pub(crate) fn unwrap(plain: Plain) -> Value {
    match plain {
        Plain::Null => Value::Null,
        Plain::Bool(b) => Value::Bool(b),
        Plain::Int(n) => Value::Int(n),
        Plain::Float(x) => Value::Float(x),
        Plain::Str(s) => Value::Str(s),
        Plain::List(items) => Value::List(items.into_iter().map(unwrap).collect()),
        Plain::Fn(boxed) => Value::Func(boxed.f),
    }
}
