//! Runtime values.
//!
//! A [`Value`] is a small tagged union.  Strings and arrays are heap-backed
//! behind shared-ownership handles: cloning a value retains the payload,
//! dropping it releases, and dropping the last handle to an array releases
//! every element recursively.  Closures borrow the parse-tree node that
//! defines them, so the arena holding that tree must outlive the closure —
//! the lifetime parameter enforces this at compile time.

use std::fmt;
use std::rc::Rc;

use super::parser::ParseNode;

/// Stable handle into the extern-function registry.
pub type ExternFnId = usize;

#[derive(Debug, Clone)]
pub enum Value<'a> {
    Null,
    Int(i64),
    Str(Rc<str>),
    Array(Rc<Vec<Value<'a>>>),
    /// A user-defined function: the `lambda` call node that produced it
    /// (parameter names followed by the body expression).
    Closure(&'a ParseNode<'a>),
    ExternFn(ExternFnId),
    /// Reserved error marker; no operator produces it today, but hosts may.
    Error,
}

impl<'a> Value<'a> {
    /// Build a string value, copying `s` into fresh shared storage.
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub fn array(items: Vec<Value<'a>>) -> Self {
        Value::Array(Rc::new(items))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness: non-zero integers and non-empty strings; everything else
    /// is false.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Int(v) => *v != 0,
            Value::Str(s) => !s.is_empty(),
            _ => false,
        }
    }

    /// Script-level equality: values of different kinds never compare equal;
    /// functions compare by identity.
    pub fn eq_value(&self, other: &Value<'_>) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => {
                std::ptr::eq(*a as *const ParseNode, *b as *const ParseNode)
            }
            (Value::ExternFn(a), Value::ExternFn(b)) => a == b,
            _ => false,
        }
    }

    /// Ordering is defined for integers only.
    pub fn less_than(&self, other: &Value<'_>) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a < b,
            _ => false,
        }
    }

    pub fn greater_than(&self, other: &Value<'_>) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a > b,
            _ => false,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Closure(_) | Value::ExternFn(_) => write!(f, "Function"),
            Value::Array(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Value::Error => write!(f, "Error"),
        }
    }
}

// ── Bounded rendering ─────────────────────────────────────────────────────────

/// Render a value into at most `limit` bytes of text: strings verbatim,
/// integers in decimal, anything else as empty.  Returns `None` when the
/// rendering would not fit — callers treat that as an error rather than
/// truncating.
pub fn render_bounded(value: &Value<'_>, limit: usize) -> Option<String> {
    match value {
        Value::Str(s) => {
            if s.len() > limit {
                None
            } else {
                Some(s.to_string())
            }
        }
        Value::Int(v) => {
            let text = v.to_string();
            if text.len() > limit {
                None
            } else {
                Some(text)
            }
        }
        _ => Some(String::new()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Value::Null.to_string(), "Null");
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::str("hi").to_string(), "hi");
        assert_eq!(Value::ExternFn(0).to_string(), "Function");
        let arr = Value::array(vec![Value::Int(1), Value::str("a")]);
        assert_eq!(arr.to_string(), "(1 a)");
    }

    #[test]
    fn truthiness() {
        assert!(Value::Int(1).truthy());
        assert!(!Value::Int(0).truthy());
        assert!(Value::str("x").truthy());
        assert!(!Value::str("").truthy());
        assert!(!Value::Null.truthy());
        assert!(!Value::array(vec![Value::Int(1)]).truthy());
    }

    #[test]
    fn equality_across_kinds_is_false() {
        assert!(!Value::Int(0).eq_value(&Value::str("0")));
        assert!(!Value::Null.eq_value(&Value::Null));
        assert!(Value::Int(5).eq_value(&Value::Int(5)));
        assert!(Value::str("ab").eq_value(&Value::str("ab")));
        assert!(Value::ExternFn(2).eq_value(&Value::ExternFn(2)));
        assert!(!Value::ExternFn(2).eq_value(&Value::ExternFn(3)));
    }

    #[test]
    fn ordering_is_int_only() {
        assert!(Value::Int(1).less_than(&Value::Int(2)));
        assert!(!Value::str("a").less_than(&Value::str("b")));
        assert!(Value::Int(2).greater_than(&Value::Int(1)));
    }

    #[test]
    fn clone_retains_and_drop_releases() {
        let s = Value::str("shared");
        let Value::Str(rc) = &s else { unreachable!() };
        assert_eq!(Rc::strong_count(rc), 1);
        let copy = s.clone();
        assert_eq!(Rc::strong_count(rc), 2);
        drop(copy);
        assert_eq!(Rc::strong_count(rc), 1);
    }

    #[test]
    fn array_drop_releases_elements_recursively() {
        let inner = Value::str("elem");
        let Value::Str(rc) = inner.clone() else { unreachable!() };
        assert_eq!(Rc::strong_count(&rc), 2);

        let outer = Value::array(vec![Value::array(vec![inner])]);
        assert_eq!(Rc::strong_count(&rc), 2);
        drop(outer);
        // Dropping the outer array released the nested array, which
        // released the string element.
        assert_eq!(Rc::strong_count(&rc), 1);
    }

    #[test]
    fn render_bounded_limits() {
        assert_eq!(render_bounded(&Value::str("abc"), 3).as_deref(), Some("abc"));
        assert_eq!(render_bounded(&Value::str("abcd"), 3), None);
        assert_eq!(render_bounded(&Value::Int(1234), 4).as_deref(), Some("1234"));
        assert_eq!(render_bounded(&Value::Int(1234), 3), None);
        // Null and friends render as empty regardless of limit.
        assert_eq!(render_bounded(&Value::Null, 0).as_deref(), Some(""));
    }
}
