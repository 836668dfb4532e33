// SPDX-License-Identifier: MIT

//! Allow-list check over a parsed expression
//!
//! Every node must be one of the permitted forms and every call must target a
//! known builtin. A single bad node anywhere rejects the whole expression.

use super::ast::{Literal, MemberProperty, Node, PropertyKey, UnaryOperator};
use crate::core::error::EvalError;

/// Plain function calls an expression may make
pub const ALLOWED_FUNCTIONS: &[&str] = &["get", "isEmpty", "notEmpty", "matches"];

/// Functions reachable through the `Math` namespace
pub const ALLOWED_MATH_FUNCTIONS: &[&str] = &["max", "min", "abs", "round", "floor", "ceil"];

/// Property names that lead into host internals
const FORBIDDEN_PROPERTIES: &[&str] = &["__proto__", "constructor", "prototype"];

/// Accept the AST only if every node is on the allow-list
pub fn validate(node: &Node) -> Result<(), EvalError> {
    check(node).inspect_err(|e| log::warn!("Rejected condition expression: {}", e))
}

fn check(node: &Node) -> Result<(), EvalError> {
    match node {
        Node::Literal(_) => Ok(()),
        Node::Identifier(name) => check_property_name(name),
        Node::Member { object, property } => {
            check(object)?;
            check_member_property(property)
        }
        Node::Call { callee, arguments } => {
            for argument in arguments {
                check(argument)?;
            }
            check_callee(callee)
        }
        Node::Binary { left, right, .. } | Node::Logical { left, right, .. } => {
            check(left)?;
            check(right)
        }
        Node::Unary { operator, argument } => {
            check(argument)?;
            match operator {
                UnaryOperator::Not | UnaryOperator::Minus | UnaryOperator::Plus => Ok(()),
                UnaryOperator::Typeof | UnaryOperator::Void | UnaryOperator::Delete => {
                    Err(EvalError::security(format!("'{}' operator", operator)))
                }
            }
        }
        Node::Conditional {
            test,
            consequent,
            alternate,
        } => {
            check(test)?;
            check(consequent)?;
            check(alternate)
        }
        Node::Array(items) => items.iter().try_for_each(check),
        Node::Object(properties) => {
            for property in properties {
                match &property.key {
                    PropertyKey::Static(key) => check_property_name(key)?,
                    PropertyKey::Computed(_) => {
                        return Err(EvalError::security("computed object key"))
                    }
                }
                check(&property.value)?;
            }
            Ok(())
        }

        Node::Function { .. }
        | Node::Class { .. }
        | Node::Assignment { .. }
        | Node::Update { .. }
        | Node::Loop { .. }
        | Node::New { .. }
        | Node::Template { .. }
        | Node::Sequence(_)
        | Node::This
        | Node::Statement { .. } => Err(EvalError::security(describe(node))),
    }
}

fn check_member_property(property: &MemberProperty) -> Result<(), EvalError> {
    match property {
        MemberProperty::Named(name) => check_property_name(name),
        MemberProperty::Computed(index) => {
            if let Node::Literal(Literal::String(key)) = index.as_ref() {
                check_property_name(key)?;
            }
            check(index)
        }
    }
}

pub(crate) fn check_property_name(name: &str) -> Result<(), EvalError> {
    if FORBIDDEN_PROPERTIES.contains(&name) {
        return Err(EvalError::security(format!("access to '{}'", name)));
    }
    Ok(())
}

fn check_callee(callee: &Node) -> Result<(), EvalError> {
    match callee {
        Node::Identifier(name) if ALLOWED_FUNCTIONS.contains(&name.as_str()) => Ok(()),
        Node::Member {
            object,
            property: MemberProperty::Named(name),
        } if matches!(object.as_ref(), Node::Identifier(ns) if ns == "Math")
            && ALLOWED_MATH_FUNCTIONS.contains(&name.as_str()) =>
        {
            Ok(())
        }
        other => Err(EvalError::security(match other.static_path() {
            Some(path) => format!("call to '{}'", path),
            None => format!("call through {}", other.tag()),
        })),
    }
}

fn describe(node: &Node) -> String {
    match node {
        Node::Function {
            name: Some(name), ..
        } => format!("{} '{}'", node.tag(), name),
        Node::Class { name: Some(name) } => format!("{} '{}'", node.tag(), name),
        Node::Loop { keyword } | Node::Statement { keyword } => {
            format!("{} '{}'", node.tag(), keyword)
        }
        Node::Assignment { operator, .. } | Node::Update { operator, .. } => {
            format!("{} '{}'", node.tag(), operator)
        }
        _ => node.tag().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::parser::parse;
    use crate::core::error::ErrorKind;

    fn validate_source(source: &str) -> Result<(), EvalError> {
        validate(&parse(source).unwrap())
    }

    #[test]
    fn test_accepts_allowed_forms() {
        let sources = [
            "intent === 'search'",
            "balance > 100 && !blocked || vip",
            "user.profile.name",
            "items[0].price * 2 + 1",
            "isEmpty(phone) ? 'ask' : notEmpty(phone)",
            "get('balance') >= Math.max(10, Math.abs(-5))",
            "matches(email, '^[a-z]+@')",
            "[1, 2, 3]",
            "{ name: user.name, 'age': 30 }",
            "-x + +y",
            "items['count']",
        ];
        for source in sources {
            assert!(validate_source(source).is_ok(), "{}", source);
        }
    }

    #[test]
    fn test_rejects_functions_and_classes() {
        for source in [
            "function test() {}",
            "x => x",
            "(a, b) => a + b",
            "class Test {}",
        ] {
            let err = validate_source(source).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Security, "{}", source);
        }
    }

    #[test]
    fn test_rejects_mutation_and_statements() {
        for source in [
            "a = 1",
            "a += 1",
            "i++",
            "--i",
            "while (true) {}",
            "for (;;) {}",
            "var x = 1",
            "return 1",
            "new Date()",
            "`hi ${name}`",
            "`plain`",
            "a, b",
            "this",
            "delete user.name",
            "typeof x",
            "void 0",
        ] {
            let err = validate_source(source).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Security, "{}", source);
        }
    }

    #[test]
    fn test_rejects_unknown_calls() {
        for source in [
            "eval('1')",
            "Math.random()",
            "Math.pow(2, 3)",
            "user.toString()",
            "Math['max'](1, 2)",
            "get('a')('b')",
            "alert(1)",
        ] {
            let err = validate_source(source).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Security, "{}", source);
        }
    }

    #[test]
    fn test_rejects_prototype_access() {
        for source in [
            "user.__proto__",
            "user.constructor",
            "a['prototype']",
            "{ __proto__: 1 }",
            "{ [key]: 1 }",
        ] {
            let err = validate_source(source).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Security, "{}", source);
        }
    }

    #[test]
    fn test_nested_bad_node_rejects_whole_expression() {
        let err = validate_source("a && (b || isEmpty(function () {}))").unwrap_err();
        assert!(
            matches!(err, EvalError::Security { ref construct } if construct.contains("Function"))
        );

        let err = validate_source("[1, 2, x = 3]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Security);
    }

    #[test]
    fn test_error_names_construct() {
        match validate_source("class Test {}").unwrap_err() {
            EvalError::Security { construct } => {
                assert_eq!(construct, "ClassDeclaration 'Test'")
            }
            other => panic!("Expected security error, got {:?}", other),
        }
    }
}
