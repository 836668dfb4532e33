// SPDX-License-Identifier: MIT

//! Routing heuristic between the operator path and the full parser
//!
//! This is never a security boundary: anything it calls "simple" is still
//! resolved without executing code, and anything "complex" goes through the
//! parser and the validator.

use once_cell::sync::Lazy;
use regex::Regex;

/// `name(` or `a.b(`, e.g. `get(`, `isEmpty(`, `Math.max(`
static CALL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z_$][\w$]*(?:\s*\.\s*[A-Za-z_$][\w$]*)*\s*\(").expect("invalid regex")
});

/// True when the text needs the full parser: logical, comparison or negation
/// operators, a ternary, or a function call outside string literals
pub fn is_complex_expression(text: &str) -> bool {
    let code = strip_string_contents(text);

    if ["&&", "||", "==", ">", "<", "!"].iter().any(|op| code.contains(op)) {
        return true;
    }

    if let Some(question) = code.find('?') {
        if code[question..].contains(':') {
            return true;
        }
    }

    CALL_PATTERN.is_match(&code)
}

/// Replace the contents of quoted strings with nothing, keeping the quotes
fn strip_string_contents(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                    out.push(c);
                }
            }
            None => {
                if matches!(c, '\'' | '"' | '`') {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    out
}
