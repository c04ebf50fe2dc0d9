//! Positional placeholder expansion.
//!
//! Walks the fragment left to right; the k-th `?` consumes `args[k]`. A
//! `Value::List` argument turns its placeholder into one `?` per element and
//! is flattened into the output arguments. Placeholders beyond the supplied
//! arguments are left alone for the driver to reject.

use crate::value::Value;

pub const MARKER: char = '?';

#[must_use]
pub fn expand(fragment: &str, args: &[Value]) -> (String, Vec<Value>) {
    if args.is_empty() {
        return (fragment.to_string(), Vec::new());
    }

    let mut query = String::with_capacity(fragment.len());
    let mut flat = Vec::with_capacity(args.len());
    let mut pending = args.iter();

    for c in fragment.chars() {
        if c != MARKER {
            query.push(c);
            continue;
        }

        match pending.next() {
            Some(Value::List(items)) => {
                for i in 0..items.len() {
                    if i > 0 {
                        query.push(',');
                    }
                    query.push(MARKER);
                }
                flat.extend(items.iter().cloned());
            }
            Some(value) => {
                query.push(MARKER);
                flat.push(value.clone());
            }
            None => query.push(MARKER),
        }
    }

    (query, flat)
}
