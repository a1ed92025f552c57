//! String operators: `endswith`, `split`, `trim`, `contains`.
//!
//! All of them are eager and byte-oriented; `split` and `contains` accept
//! any number of needle strings after the subject.

use crate::lang::diag::Source;
use crate::lang::env::Env;
use crate::lang::interp::Interp;
use crate::lang::value::Value;
use super::Bindings;

fn op_endswith<'a>(
    _interp: &Interp<'a>,
    _env: &mut Env<'a>,
    args: &[Value<'a>],
    _src: Source<'_>,
) -> Value<'a> {
    let (Value::Str(subject), Value::Str(suffix)) = (&args[0], &args[1]) else {
        return Value::Null;
    };
    Value::Int(subject.as_bytes().ends_with(suffix.as_bytes()) as i64)
}

fn op_split<'a>(
    _interp: &Interp<'a>,
    _env: &mut Env<'a>,
    args: &[Value<'a>],
    _src: Source<'_>,
) -> Value<'a> {
    if args.iter().any(|a| !matches!(a, Value::Str(_))) {
        return Value::Null;
    }
    let Value::Str(subject) = &args[0] else {
        unreachable!();
    };
    let separators: Vec<&[u8]> = args[1..]
        .iter()
        .map(|a| match a {
            Value::Str(s) => s.as_bytes(),
            _ => unreachable!(),
        })
        .collect();

    let bytes = subject.as_bytes();
    let mut pieces: Vec<Value<'a>> = Vec::new();
    let mut piece_start = 0;
    let mut i = 0;
    'scan: while i < bytes.len() {
        for sep in &separators {
            // An empty separator never matches (it would not advance).
            if !sep.is_empty() && bytes[i..].starts_with(sep) {
                if piece_start != i {
                    pieces.push(Value::str(&String::from_utf8_lossy(
                        &bytes[piece_start..i],
                    )));
                }
                i += sep.len();
                piece_start = i;
                continue 'scan;
            }
        }
        i += 1;
    }
    if piece_start < bytes.len() {
        pieces.push(Value::str(&String::from_utf8_lossy(&bytes[piece_start..])));
    }
    Value::array(pieces)
}

fn op_trim<'a>(
    _interp: &Interp<'a>,
    _env: &mut Env<'a>,
    args: &[Value<'a>],
    _src: Source<'_>,
) -> Value<'a> {
    let Value::Str(subject) = &args[0] else {
        return Value::Null;
    };
    let trimmed = subject.trim_matches(|c| matches!(c, ' ' | '\n' | '\r' | '\t'));
    Value::str(trimmed)
}

fn op_contains<'a>(
    _interp: &Interp<'a>,
    _env: &mut Env<'a>,
    args: &[Value<'a>],
    _src: Source<'_>,
) -> Value<'a> {
    let Value::Str(subject) = &args[0] else {
        return Value::Null;
    };
    // A non-string needle makes the whole test false, not Null.
    let mut needles: Vec<&[u8]> = Vec::with_capacity(args.len() - 1);
    for needle in &args[1..] {
        match needle {
            Value::Str(s) => needles.push(s.as_bytes()),
            _ => return Value::Int(0),
        }
    }

    let bytes = subject.as_bytes();
    for i in 0..bytes.len() {
        if needles.iter().any(|n| bytes[i..].starts_with(n)) {
            return Value::Int(1);
        }
    }
    Value::Int(0)
}

// ── Registration ──────────────────────────────────────────────────────────────

pub fn load<'a>(interp: &mut Interp<'a>) -> Bindings<'a> {
    vec![
        ("endswith", interp.register_eager("endswith", 2, op_endswith)),
        ("split", interp.register_eager("split", -3, op_split)),
        ("trim", interp.register_eager("trim", 1, op_trim)),
        ("contains", interp.register_eager("contains", -3, op_contains)),
    ]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
