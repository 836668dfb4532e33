// SPDX-License-Identifier: MIT

//! Static checks for patterns that are expensive to match
//!
//! The `regex` crate matches in linear time, but operators write patterns for
//! other engines too, so the classic catastrophic shapes are refused up front:
//! - nested unbounded quantifiers: `(a+)+`, `(.*)*`, `(\w+\s?)+`
//! - repeated alternation whose branches overlap: `(a|a)*`, `(a|ab)+`
//! - huge counted repetition: `a{1,100000}`

use crate::core::error::PatternError;

/// Largest accepted `{n}` / `{n,m}` bound
pub const MAX_REPETITION: u32 = 1000;

struct Group {
    open: usize,
    branch_start: usize,
    branches: Vec<String>,
    has_unbounded: bool,
}

/// Reject patterns longer than `max_length` characters or with a risky shape
pub fn analyze(pattern: &str, max_length: usize) -> Result<(), PatternError> {
    let chars: Vec<char> = pattern.chars().collect();
    if chars.len() > max_length {
        return Err(PatternError::TooLong {
            length: chars.len(),
            max: max_length,
        });
    }

    let mut stack: Vec<Group> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '[' => i = skip_class(&chars, i),
            '(' => {
                let open = i;
                i = skip_group_prefix(&chars, i + 1)?;
                if i == usize::MAX {
                    // Inline flags such as `(?i)`, no group is opened
                    i = open + 1;
                    while i < chars.len() && chars[i] != ')' {
                        i += 1;
                    }
                    i += 1;
                    continue;
                }
                stack.push(Group {
                    open,
                    branch_start: i,
                    branches: Vec::new(),
                    has_unbounded: false,
                });
            }
            '|' => {
                if let Some(group) = stack.last_mut() {
                    group
                        .branches
                        .push(chars[group.branch_start..i].iter().collect());
                    group.branch_start = i + 1;
                }
                i += 1;
            }
            ')' => {
                let Some(mut group) = stack.pop() else {
                    return Err(PatternError::Invalid(format!("unopened group at position {}", i)));
                };
                group
                    .branches
                    .push(chars[group.branch_start..i].iter().collect());

                let (quantifier, next) = read_quantifier(&chars, i + 1)?;
                if quantifier == Some(true) {
                    if group.has_unbounded {
                        return Err(PatternError::NestedQuantifier(group.open));
                    }
                    if group.branches.len() > 1 && branches_overlap(&group.branches) {
                        return Err(PatternError::OverlappingAlternation(group.open));
                    }
                }

                if let Some(parent) = stack.last_mut() {
                    parent.has_unbounded |= group.has_unbounded || quantifier == Some(true);
                }
                i = next;
            }
            _ => {
                let (quantifier, next) = read_quantifier(&chars, i)?;
                if quantifier == Some(true) {
                    if let Some(group) = stack.last_mut() {
                        group.has_unbounded = true;
                    }
                }
                i = if next > i { next } else { i + 1 };
            }
        }
    }

    Ok(())
}

/// Position just past a `[...]` class starting at `start`
fn skip_class(chars: &[char], start: usize) -> usize {
    let mut i = start + 1;
    if chars.get(i) == Some(&'^') {
        i += 1;
    }
    // A leading ']' is literal
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            ']' => return i + 1,
            _ => i += 1,
        }
    }
    i
}

/// Skip `?:`, `?P<name>` or `?<name>` after '('. Returns `usize::MAX` for an
/// inline flag group that does not open a capture.
fn skip_group_prefix(chars: &[char], start: usize) -> Result<usize, PatternError> {
    if chars.get(start) != Some(&'?') {
        return Ok(start);
    }
    let mut i = start + 1;
    match (chars.get(i), chars.get(i + 1)) {
        (Some('='), _) | (Some('!'), _) | (Some('<'), Some('=')) | (Some('<'), Some('!')) => {
            Err(PatternError::Invalid("look-around is not supported".to_string()))
        }
        (Some('P'), Some('<')) | (Some('<'), _) => {
            while i < chars.len() && chars[i] != '>' {
                i += 1;
            }
            Ok(i + 1)
        }
        _ => {
            while i < chars.len() && (chars[i].is_ascii_alphabetic() || chars[i] == '-') {
                i += 1;
            }
            match chars.get(i) {
                Some(':') => Ok(i + 1),
                _ => Ok(usize::MAX),
            }
        }
    }
}

/// Quantifier at `i`: `Some(true)` when unbounded (`*`, `+`, `{n,}`),
/// `Some(false)` for bounded ones, plus the position after it
fn read_quantifier(chars: &[char], i: usize) -> Result<(Option<bool>, usize), PatternError> {
    let (quantifier, mut next) = match chars.get(i) {
        Some('*') | Some('+') => (Some(true), i + 1),
        Some('?') => (Some(false), i + 1),
        Some('{') => match read_counted(chars, i)? {
            Some((unbounded, end)) => (Some(unbounded), end),
            None => (None, i),
        },
        _ => (None, i),
    };
    // Lazy / possessive suffix
    if quantifier.is_some() && matches!(chars.get(next), Some('?') | Some('+')) {
        next += 1;
    }
    Ok((quantifier, next))
}

fn read_counted(chars: &[char], start: usize) -> Result<Option<(bool, usize)>, PatternError> {
    let Some(len) = chars[start..].iter().position(|&c| c == '}') else {
        return Ok(None);
    };
    let body: String = chars[start + 1..start + len].iter().collect();
    let end = start + len + 1;

    let (min, max) = match body.split_once(',') {
        Some((min, max)) => (min.trim(), Some(max.trim())),
        None => (body.trim(), None),
    };
    if min.is_empty() || !min.chars().all(|c| c.is_ascii_digit()) {
        return Ok(None);
    }

    let check = |bound: &str| -> Result<(), PatternError> {
        let value = bound.parse::<u32>().unwrap_or(u32::MAX);
        if value > MAX_REPETITION {
            return Err(PatternError::ExcessiveRepetition(value));
        }
        Ok(())
    };

    check(min)?;
    match max {
        None => Ok(Some((false, end))),
        Some("") => Ok(Some((true, end))),
        Some(max) if max.chars().all(|c| c.is_ascii_digit()) => {
            check(max)?;
            Ok(Some((false, end)))
        }
        Some(_) => Ok(None),
    }
}

/// Two branches can match the same text when one is a prefix of the other or
/// both start with the same literal character
fn branches_overlap(branches: &[String]) -> bool {
    for (i, a) in branches.iter().enumerate() {
        for b in &branches[i + 1..] {
            if a.starts_with(b.as_str()) || b.starts_with(a.as_str()) {
                return true;
            }
            if let (Some(x), Some(y)) = (a.chars().next(), b.chars().next()) {
                if x == y && !is_meta(x) {
                    return true;
                }
            }
        }
    }
    false
}

fn is_meta(c: char) -> bool {
    matches!(c, '\\' | '[' | '(' | '.' | '^' | '$')
}
