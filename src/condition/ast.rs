// SPDX-License-Identifier: MIT

//! Abstract Syntax Tree for condition expressions
//!
//! The parser produces every construct it recognises, including ones that are
//! never allowed to run (functions, classes, assignments, loops). Deciding what
//! may run is the validator's job, so the two can evolve separately.

/// A parsed expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(Literal),
    Identifier(String),
    /// `object.name` or `object[expr]`
    Member {
        object: Box<Node>,
        property: MemberProperty,
    },
    Call {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    Logical {
        operator: LogicalOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    Unary {
        operator: UnaryOperator,
        argument: Box<Node>,
    },
    /// `test ? consequent : alternate`
    Conditional {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    Array(Vec<Node>),
    Object(Vec<ObjectProperty>),

    // Recognised but never permitted
    /// `function name(params) { ... }` or `(params) => body`
    Function {
        name: Option<String>,
        params: Vec<String>,
        arrow: bool,
    },
    Class {
        name: Option<String>,
    },
    Assignment {
        operator: String,
        target: Box<Node>,
        value: Box<Node>,
    },
    /// `++x`, `x--`
    Update {
        operator: String,
        argument: Box<Node>,
        prefix: bool,
    },
    Loop {
        keyword: String,
    },
    New {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    Template {
        quasis: Vec<String>,
        expressions: Vec<Node>,
    },
    Sequence(Vec<Node>),
    This,
    /// Any other statement keyword (`var`, `if`, `return`, `import`, ...)
    Statement {
        keyword: String,
    },
}

/// Literal values in expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    Named(String),
    Computed(Box<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectProperty {
    pub key: PropertyKey,
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    /// Identifier, string or number key
    Static(String),
    /// `[expr]: value`
    Computed(Box<Node>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// ==
    LooseEq,
    /// !=
    LooseNotEq,
    /// ===
    StrictEq,
    /// !==
    StrictNotEq,
    Lt,
    Gt,
    Lte,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
    Plus,
    Typeof,
    Void,
    Delete,
}

impl Node {
    /// Name of the syntactic form, used in error messages
    pub fn tag(&self) -> &'static str {
        match self {
            Node::Literal(_) => "Literal",
            Node::Identifier(_) => "Identifier",
            Node::Member { .. } => "MemberExpression",
            Node::Call { .. } => "CallExpression",
            Node::Binary { .. } => "BinaryExpression",
            Node::Logical { .. } => "LogicalExpression",
            Node::Unary { .. } => "UnaryExpression",
            Node::Conditional { .. } => "ConditionalExpression",
            Node::Array(_) => "ArrayExpression",
            Node::Object(_) => "ObjectExpression",
            Node::Function { arrow: true, .. } => "ArrowFunctionExpression",
            Node::Function { .. } => "FunctionDeclaration",
            Node::Class { .. } => "ClassDeclaration",
            Node::Assignment { .. } => "AssignmentExpression",
            Node::Update { .. } => "UpdateExpression",
            Node::Loop { .. } => "LoopStatement",
            Node::New { .. } => "NewExpression",
            Node::Template { .. } => "TemplateLiteral",
            Node::Sequence(_) => "SequenceExpression",
            Node::This => "ThisExpression",
            Node::Statement { .. } => "Statement",
        }
    }

    /// Dotted path for static member chains (`a.b.c`), `None` otherwise
    pub fn static_path(&self) -> Option<String> {
        match self {
            Node::Identifier(name) => Some(name.clone()),
            Node::Member {
                object,
                property: MemberProperty::Named(name),
            } => object
                .static_path()
                .map(|base| format!("{}.{}", base, name)),
            _ => None,
        }
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        1 + match self {
            Node::Literal(_)
            | Node::Identifier(_)
            | Node::Function { .. }
            | Node::Class { .. }
            | Node::Loop { .. }
            | Node::This
            | Node::Statement { .. } => 0,
            Node::Member { object, property } => {
                object.size()
                    + match property {
                        MemberProperty::Named(_) => 0,
                        MemberProperty::Computed(index) => index.size(),
                    }
            }
            Node::Call { callee, arguments } | Node::New { callee, arguments } => {
                callee.size() + arguments.iter().map(Node::size).sum::<usize>()
            }
            Node::Binary { left, right, .. } | Node::Logical { left, right, .. } => {
                left.size() + right.size()
            }
            Node::Unary { argument, .. } | Node::Update { argument, .. } => argument.size(),
            Node::Conditional {
                test,
                consequent,
                alternate,
            } => test.size() + consequent.size() + alternate.size(),
            Node::Array(items) | Node::Sequence(items) => items.iter().map(Node::size).sum(),
            Node::Object(props) => props
                .iter()
                .map(|p| {
                    p.value.size()
                        + match &p.key {
                            PropertyKey::Static(_) => 0,
                            PropertyKey::Computed(k) => k.size(),
                        }
                })
                .sum(),
            Node::Assignment { target, value, .. } => target.size() + value.size(),
            Node::Template { expressions, .. } => expressions.iter().map(Node::size).sum(),
        }
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOperator::LooseEq => write!(f, "=="),
            BinaryOperator::LooseNotEq => write!(f, "!="),
            BinaryOperator::StrictEq => write!(f, "==="),
            BinaryOperator::StrictNotEq => write!(f, "!=="),
            BinaryOperator::Lt => write!(f, "<"),
            BinaryOperator::Gt => write!(f, ">"),
            BinaryOperator::Lte => write!(f, "<="),
            BinaryOperator::Gte => write!(f, ">="),
            BinaryOperator::Add => write!(f, "+"),
            BinaryOperator::Sub => write!(f, "-"),
            BinaryOperator::Mul => write!(f, "*"),
            BinaryOperator::Div => write!(f, "/"),
            BinaryOperator::Mod => write!(f, "%"),
        }
    }
}

impl std::fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "&&"),
            LogicalOperator::Or => write!(f, "||"),
        }
    }
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Not => write!(f, "!"),
            UnaryOperator::Minus => write!(f, "-"),
            UnaryOperator::Plus => write!(f, "+"),
            UnaryOperator::Typeof => write!(f, "typeof"),
            UnaryOperator::Void => write!(f, "void"),
            UnaryOperator::Delete => write!(f, "delete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Node> {
        Box::new(Node::Identifier(name.to_string()))
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(format!("{}", BinaryOperator::StrictEq), "===");
        assert_eq!(format!("{}", BinaryOperator::LooseNotEq), "!=");
        assert_eq!(format!("{}", BinaryOperator::Gte), ">=");
        assert_eq!(format!("{}", LogicalOperator::Or), "||");
        assert_eq!(format!("{}", UnaryOperator::Typeof), "typeof");
    }

    #[test]
    fn test_static_path() {
        let node = Node::Member {
            object: Box::new(Node::Member {
                object: ident("user"),
                property: MemberProperty::Named("profile".to_string()),
            }),
            property: MemberProperty::Named("name".to_string()),
        };
        assert_eq!(node.static_path().as_deref(), Some("user.profile.name"));

        let computed = Node::Member {
            object: ident("items"),
            property: MemberProperty::Computed(Box::new(Node::Literal(Literal::Number(0.0)))),
        };
        assert_eq!(computed.static_path(), None);
    }

    #[test]
    fn test_tags() {
        let arrow = Node::Function {
            name: None,
            params: vec![],
            arrow: true,
        };
        let decl = Node::Function {
            name: Some("f".to_string()),
            params: vec![],
            arrow: false,
        };
        assert_eq!(arrow.tag(), "ArrowFunctionExpression");
        assert_eq!(decl.tag(), "FunctionDeclaration");
        assert_eq!(Node::This.tag(), "ThisExpression");
    }

    #[test]
    fn test_size() {
        let node = Node::Logical {
            operator: LogicalOperator::And,
            left: ident("a"),
            right: Box::new(Node::Unary {
                operator: UnaryOperator::Not,
                argument: ident("b"),
            }),
        };
        assert_eq!(node.size(), 4);
    }
}
