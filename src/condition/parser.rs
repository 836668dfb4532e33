// SPDX-License-Identifier: MIT

//! Recursive-descent parser for condition expressions
//!
//! Parses expressions like:
//! - `intent === 'search'`
//! - `balance > 100 && !blocked`
//! - `isEmpty(user.phone) ? 'ask' : 'skip'`
//!
//! Function, class, loop and assignment syntax is recognised too, so that it
//! can be rejected as "not permitted" instead of "invalid syntax".

use super::ast::{
    BinaryOperator, Literal, LogicalOperator, MemberProperty, Node, ObjectProperty, PropertyKey,
    UnaryOperator,
};
use super::lexer::{tokenize, Token, TokenKind};
use crate::core::config::DEFAULT_MAX_EXPRESSION_LENGTH;
use crate::core::error::EvalError;

/// Default maximum nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 64;

const LOOP_KEYWORDS: &[&str] = &["for", "while", "do"];

const STATEMENT_KEYWORDS: &[&str] = &[
    "var", "let", "const", "if", "else", "return", "throw", "import", "export", "try", "catch",
    "finally", "switch", "case", "default", "break", "continue", "with", "yield", "await",
    "async", "debugger", "static", "super",
];

/// Words that never parse as a plain identifier
pub(crate) fn is_reserved_word(word: &str) -> bool {
    matches!(
        word,
        "this" | "function" | "class" | "new" | "typeof" | "void" | "delete"
    ) || LOOP_KEYWORDS.contains(&word)
        || STATEMENT_KEYWORDS.contains(&word)
}

/// Parse a condition expression string into an AST
pub fn parse(input: &str) -> Result<Node, EvalError> {
    parse_with_limits(input, DEFAULT_MAX_EXPRESSION_LENGTH, DEFAULT_MAX_DEPTH)
}

/// Parse with explicit length and nesting limits.
///
/// The length is checked before any tokenizing happens.
pub fn parse_with_limits(
    input: &str,
    max_length: usize,
    max_depth: usize,
) -> Result<Node, EvalError> {
    check_length(input, max_length)?;

    if input.trim().is_empty() {
        return Err(EvalError::syntax("empty expression", 0));
    }

    let tokens = tokenize(input)?;
    let end = input.chars().count();
    Parser::new(tokens, end, max_depth).parse_program()
}

/// Reject expressions longer than `max_length` characters
pub fn check_length(input: &str, max_length: usize) -> Result<(), EvalError> {
    // Byte length bounds the character count from above
    if input.len() <= max_length {
        return Ok(());
    }
    let length = input.chars().count();
    if length > max_length {
        return Err(EvalError::LengthExceeded {
            length,
            max: max_length,
        });
    }
    Ok(())
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    end: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>, end: usize, max_depth: usize) -> Self {
        Self {
            tokens,
            index: 0,
            end,
            depth: 0,
            max_depth,
        }
    }

    fn parse_program(&mut self) -> Result<Node, EvalError> {
        let mut statements = Vec::new();

        loop {
            while self.eat(&TokenKind::Semicolon) {}
            if self.at_end() {
                break;
            }

            let node = self.parse_sequence()?;
            let statement_like = matches!(
                node,
                Node::Function { arrow: false, .. }
                    | Node::Class { .. }
                    | Node::Loop { .. }
                    | Node::Statement { .. }
            );
            statements.push(node);

            if self.at_end() {
                break;
            }
            if !statement_like && !self.check(&TokenKind::Semicolon) {
                return Err(self.unexpected());
            }
        }

        match statements.len() {
            0 => Err(EvalError::syntax("empty expression", 0)),
            1 => Ok(statements.remove(0)),
            _ => Ok(Node::Sequence(statements)),
        }
    }

    fn parse_sequence(&mut self) -> Result<Node, EvalError> {
        let first = self.parse_assignment()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            items.push(self.parse_assignment()?);
        }
        Ok(Node::Sequence(items))
    }

    fn parse_assignment(&mut self) -> Result<Node, EvalError> {
        self.enter()?;
        let result = self.parse_assignment_inner();
        self.depth -= 1;
        result
    }

    fn parse_assignment_inner(&mut self) -> Result<Node, EvalError> {
        // x => body
        if let (Some(TokenKind::Identifier(name)), Some(TokenKind::Arrow)) =
            (self.peek_kind(), self.peek_kind_at(1))
        {
            let params = vec![name.clone()];
            self.index += 2;
            return self.finish_arrow(params);
        }

        let target = self.parse_conditional()?;

        let operator = match self.peek_kind() {
            Some(TokenKind::Assign) => "=".to_string(),
            Some(TokenKind::CompoundAssign(op)) => op.clone(),
            _ => return Ok(target),
        };
        self.index += 1;
        let value = self.parse_assignment()?;
        Ok(Node::Assignment {
            operator,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> Result<Node, EvalError> {
        let test = self.parse_or()?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }

        let consequent = self.parse_assignment()?;
        self.expect(&TokenKind::Colon, "expected ':' in conditional expression")?;
        let alternate = self.parse_assignment()?;
        Ok(Node::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_or(&mut self) -> Result<Node, EvalError> {
        self.fold_left(
            Self::parse_and,
            |kind| (kind == &TokenKind::OrOr).then_some(LogicalOperator::Or),
            logical,
        )
    }

    fn parse_and(&mut self) -> Result<Node, EvalError> {
        self.fold_left(
            Self::parse_equality,
            |kind| (kind == &TokenKind::AndAnd).then_some(LogicalOperator::And),
            logical,
        )
    }

    fn parse_equality(&mut self) -> Result<Node, EvalError> {
        self.fold_left(
            Self::parse_relational,
            |kind| match kind {
                TokenKind::EqEq => Some(BinaryOperator::LooseEq),
                TokenKind::NotEq => Some(BinaryOperator::LooseNotEq),
                TokenKind::EqEqEq => Some(BinaryOperator::StrictEq),
                TokenKind::NotEqEq => Some(BinaryOperator::StrictNotEq),
                _ => None,
            },
            binary,
        )
    }

    fn parse_relational(&mut self) -> Result<Node, EvalError> {
        self.fold_left(
            Self::parse_additive,
            |kind| match kind {
                TokenKind::Lt => Some(BinaryOperator::Lt),
                TokenKind::Gt => Some(BinaryOperator::Gt),
                TokenKind::Lte => Some(BinaryOperator::Lte),
                TokenKind::Gte => Some(BinaryOperator::Gte),
                _ => None,
            },
            binary,
        )
    }

    fn parse_additive(&mut self) -> Result<Node, EvalError> {
        self.fold_left(
            Self::parse_multiplicative,
            |kind| match kind {
                TokenKind::Plus => Some(BinaryOperator::Add),
                TokenKind::Minus => Some(BinaryOperator::Sub),
                _ => None,
            },
            binary,
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Node, EvalError> {
        self.fold_left(
            Self::parse_unary,
            |kind| match kind {
                TokenKind::Star => Some(BinaryOperator::Mul),
                TokenKind::Slash => Some(BinaryOperator::Div),
                TokenKind::Percent => Some(BinaryOperator::Mod),
                _ => None,
            },
            binary,
        )
    }

    /// Left-associative chain of `operand (op operand)*`.
    ///
    /// Every folded operator adds a level to the tree, so each one counts
    /// against the depth limit until the chain ends.
    fn fold_left<O>(
        &mut self,
        operand: fn(&mut Self) -> Result<Node, EvalError>,
        operator: fn(&TokenKind) -> Option<O>,
        combine: fn(O, Node, Node) -> Node,
    ) -> Result<Node, EvalError> {
        let depth = self.depth;
        let result = self.fold_left_inner(operand, operator, combine);
        self.depth = depth;
        result
    }

    fn fold_left_inner<O>(
        &mut self,
        operand: fn(&mut Self) -> Result<Node, EvalError>,
        operator: fn(&TokenKind) -> Option<O>,
        combine: fn(O, Node, Node) -> Node,
    ) -> Result<Node, EvalError> {
        let mut left = operand(self)?;
        while let Some(op) = self.peek_kind().and_then(operator) {
            self.index += 1;
            self.enter()?;
            let right = operand(self)?;
            left = combine(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Node, EvalError> {
        let operator = match self.peek_kind() {
            Some(TokenKind::Not) => Some(UnaryOperator::Not),
            Some(TokenKind::Minus) => Some(UnaryOperator::Minus),
            Some(TokenKind::Plus) => Some(UnaryOperator::Plus),
            Some(TokenKind::Identifier(word)) => match word.as_str() {
                "typeof" => Some(UnaryOperator::Typeof),
                "void" => Some(UnaryOperator::Void),
                "delete" => Some(UnaryOperator::Delete),
                _ => None,
            },
            _ => None,
        };

        if let Some(operator) = operator {
            self.index += 1;
            self.enter()?;
            let argument = self.parse_unary();
            self.depth -= 1;
            return Ok(Node::Unary {
                operator,
                argument: Box::new(argument?),
            });
        }

        let update = match self.peek_kind() {
            Some(TokenKind::PlusPlus) => Some("++"),
            Some(TokenKind::MinusMinus) => Some("--"),
            _ => None,
        };
        if let Some(op) = update {
            self.index += 1;
            self.enter()?;
            let argument = self.parse_unary();
            self.depth -= 1;
            return Ok(Node::Update {
                operator: op.to_string(),
                argument: Box::new(argument?),
                prefix: true,
            });
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Node, EvalError> {
        let node = self.parse_call_member()?;
        let op = match self.peek_kind() {
            Some(TokenKind::PlusPlus) => "++",
            Some(TokenKind::MinusMinus) => "--",
            _ => return Ok(node),
        };
        self.index += 1;
        Ok(Node::Update {
            operator: op.to_string(),
            argument: Box::new(node),
            prefix: false,
        })
    }

    fn parse_call_member(&mut self) -> Result<Node, EvalError> {
        let depth = self.depth;
        let result = self.parse_call_member_inner();
        self.depth = depth;
        result
    }

    fn parse_call_member_inner(&mut self) -> Result<Node, EvalError> {
        let mut node = self.parse_primary()?;
        loop {
            if matches!(
                self.peek_kind(),
                Some(TokenKind::Dot | TokenKind::LBracket | TokenKind::LParen)
            ) {
                self.enter()?;
            }
            if self.eat(&TokenKind::Dot) {
                let name = self.property_name()?;
                node = Node::Member {
                    object: Box::new(node),
                    property: MemberProperty::Named(name),
                };
            } else if self.eat(&TokenKind::LBracket) {
                let index = self.parse_sequence()?;
                self.expect(&TokenKind::RBracket, "expected ']' after index")?;
                node = Node::Member {
                    object: Box::new(node),
                    property: MemberProperty::Computed(Box::new(index)),
                };
            } else if self.eat(&TokenKind::LParen) {
                let arguments = self.parse_arguments()?;
                node = Node::Call {
                    callee: Box::new(node),
                    arguments,
                };
            } else {
                return Ok(node);
            }
        }
    }

    /// Arguments after an already consumed '('
    fn parse_arguments(&mut self) -> Result<Vec<Node>, EvalError> {
        let mut arguments = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return Ok(arguments);
        }
        loop {
            arguments.push(self.parse_assignment()?);
            if self.eat(&TokenKind::RParen) {
                return Ok(arguments);
            }
            self.expect(&TokenKind::Comma, "expected ',' between arguments")?;
        }
    }

    fn property_name(&mut self) -> Result<String, EvalError> {
        let name = match self.peek_kind() {
            Some(TokenKind::Identifier(name)) => name.clone(),
            Some(TokenKind::True) => "true".to_string(),
            Some(TokenKind::False) => "false".to_string(),
            Some(TokenKind::Null) => "null".to_string(),
            Some(TokenKind::Undefined) => "undefined".to_string(),
            _ => return Err(self.error_here("expected property name after '.'")),
        };
        self.index += 1;
        Ok(name)
    }

    fn parse_primary(&mut self) -> Result<Node, EvalError> {
        let Some(token) = self.tokens.get(self.index).cloned() else {
            return Err(EvalError::syntax("unexpected end of expression", self.end));
        };

        match token.kind {
            TokenKind::Number(n) => {
                self.index += 1;
                Ok(Node::Literal(Literal::Number(n)))
            }
            TokenKind::String(s) => {
                self.index += 1;
                Ok(Node::Literal(Literal::String(s)))
            }
            TokenKind::True => {
                self.index += 1;
                Ok(Node::Literal(Literal::Boolean(true)))
            }
            TokenKind::False => {
                self.index += 1;
                Ok(Node::Literal(Literal::Boolean(false)))
            }
            TokenKind::Null => {
                self.index += 1;
                Ok(Node::Literal(Literal::Null))
            }
            TokenKind::Undefined => {
                self.index += 1;
                Ok(Node::Literal(Literal::Undefined))
            }
            TokenKind::Template {
                quasis,
                expressions,
            } => {
                self.index += 1;
                self.parse_template(quasis, expressions)
            }
            TokenKind::LParen => {
                self.index += 1;
                self.parse_parenthesized()
            }
            TokenKind::LBracket => {
                self.index += 1;
                self.parse_array()
            }
            TokenKind::LBrace => {
                self.index += 1;
                self.parse_object()
            }
            TokenKind::Identifier(name) => self.parse_word(name, token.position),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_word(&mut self, name: String, position: usize) -> Result<Node, EvalError> {
        self.index += 1;
        match name.as_str() {
            "this" => Ok(Node::This),
            "function" => self.parse_function(),
            "class" => self.parse_class(position),
            "new" => self.parse_new(),
            word if LOOP_KEYWORDS.contains(&word) => {
                self.skip_statement()?;
                Ok(Node::Loop { keyword: name })
            }
            word if STATEMENT_KEYWORDS.contains(&word) => {
                self.skip_statement()?;
                Ok(Node::Statement { keyword: name })
            }
            _ => Ok(Node::Identifier(name)),
        }
    }

    fn parse_parenthesized(&mut self) -> Result<Node, EvalError> {
        // () => body
        if self.check(&TokenKind::RParen) && self.peek_kind_at(1) == Some(&TokenKind::Arrow) {
            self.index += 2;
            return self.finish_arrow(Vec::new());
        }

        let inner = self.parse_sequence()?;
        self.expect(&TokenKind::RParen, "expected ')' after expression")?;

        if self.eat(&TokenKind::Arrow) {
            let params = match &inner {
                Node::Identifier(name) => vec![name.clone()],
                Node::Sequence(items) => items
                    .iter()
                    .map(|item| match item {
                        Node::Identifier(name) => Ok(name.clone()),
                        _ => Err(self.error_here("invalid arrow function parameter")),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                _ => return Err(self.error_here("invalid arrow function parameters")),
            };
            return self.finish_arrow(params);
        }

        Ok(inner)
    }

    fn finish_arrow(&mut self, params: Vec<String>) -> Result<Node, EvalError> {
        if self.check(&TokenKind::LBrace) {
            self.skip_balanced()?;
        } else {
            self.parse_assignment()?;
        }
        Ok(Node::Function {
            name: None,
            params,
            arrow: true,
        })
    }

    fn parse_function(&mut self) -> Result<Node, EvalError> {
        let name = match self.peek_kind() {
            Some(TokenKind::Identifier(name)) => {
                let name = name.clone();
                self.index += 1;
                Some(name)
            }
            _ => None,
        };

        if !self.check(&TokenKind::LParen) {
            return Err(self.error_here("expected '(' after function"));
        }
        let params = self
            .skip_balanced()?
            .into_iter()
            .filter_map(|t| match t.kind {
                TokenKind::Identifier(name) => Some(name),
                _ => None,
            })
            .collect();

        if !self.check(&TokenKind::LBrace) {
            return Err(self.error_here("expected '{' before function body"));
        }
        self.skip_balanced()?;

        Ok(Node::Function {
            name,
            params,
            arrow: false,
        })
    }

    fn parse_class(&mut self, position: usize) -> Result<Node, EvalError> {
        let name = match self.peek_kind() {
            Some(TokenKind::Identifier(name)) if name != "extends" => {
                let name = name.clone();
                self.index += 1;
                Some(name)
            }
            _ => None,
        };

        // Skip an `extends` clause up to the class body
        while !self.check(&TokenKind::LBrace) {
            if self.at_end() {
                return Err(EvalError::syntax("expected class body", position));
            }
            self.index += 1;
        }
        self.skip_balanced()?;

        Ok(Node::Class { name })
    }

    fn parse_new(&mut self) -> Result<Node, EvalError> {
        let depth = self.depth;
        let result = self.enter().and_then(|_| self.parse_new_inner());
        self.depth = depth;
        result
    }

    fn parse_new_inner(&mut self) -> Result<Node, EvalError> {
        let mut callee = self.parse_primary()?;
        loop {
            if matches!(self.peek_kind(), Some(TokenKind::Dot | TokenKind::LBracket)) {
                self.enter()?;
            }
            if self.eat(&TokenKind::Dot) {
                let name = self.property_name()?;
                callee = Node::Member {
                    object: Box::new(callee),
                    property: MemberProperty::Named(name),
                };
            } else if self.eat(&TokenKind::LBracket) {
                let index = self.parse_sequence()?;
                self.expect(&TokenKind::RBracket, "expected ']' after index")?;
                callee = Node::Member {
                    object: Box::new(callee),
                    property: MemberProperty::Computed(Box::new(index)),
                };
            } else {
                break;
            }
        }

        let arguments = if self.eat(&TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Ok(Node::New {
            callee: Box::new(callee),
            arguments,
        })
    }

    fn parse_array(&mut self) -> Result<Node, EvalError> {
        let mut items = Vec::new();
        loop {
            if self.eat(&TokenKind::RBracket) {
                return Ok(Node::Array(items));
            }
            items.push(self.parse_assignment()?);
            if self.eat(&TokenKind::RBracket) {
                return Ok(Node::Array(items));
            }
            self.expect(&TokenKind::Comma, "expected ',' or ']' in array literal")?;
        }
    }

    fn parse_object(&mut self) -> Result<Node, EvalError> {
        let mut properties = Vec::new();
        loop {
            if self.eat(&TokenKind::RBrace) {
                return Ok(Node::Object(properties));
            }

            let key = match self.peek_kind().cloned() {
                Some(TokenKind::Identifier(name)) => {
                    self.index += 1;
                    // Shorthand `{ name }`
                    if matches!(
                        self.peek_kind(),
                        Some(TokenKind::Comma) | Some(TokenKind::RBrace)
                    ) {
                        properties.push(ObjectProperty {
                            key: PropertyKey::Static(name.clone()),
                            value: Node::Identifier(name),
                        });
                        if !self.eat(&TokenKind::Comma) && !self.check(&TokenKind::RBrace) {
                            return Err(self.unexpected());
                        }
                        continue;
                    }
                    PropertyKey::Static(name)
                }
                Some(TokenKind::String(s)) => {
                    self.index += 1;
                    PropertyKey::Static(s)
                }
                Some(TokenKind::Number(n)) => {
                    self.index += 1;
                    PropertyKey::Static(crate::core::value::format_number(n))
                }
                Some(TokenKind::True) | Some(TokenKind::False) | Some(TokenKind::Null)
                | Some(TokenKind::Undefined) => PropertyKey::Static(self.property_name()?),
                Some(TokenKind::LBracket) => {
                    self.index += 1;
                    let key = self.parse_assignment()?;
                    self.expect(&TokenKind::RBracket, "expected ']' after computed key")?;
                    PropertyKey::Computed(Box::new(key))
                }
                _ => return Err(self.error_here("expected property key in object literal")),
            };

            self.expect(&TokenKind::Colon, "expected ':' after property key")?;
            let value = self.parse_assignment()?;
            properties.push(ObjectProperty { key, value });

            if self.eat(&TokenKind::RBrace) {
                return Ok(Node::Object(properties));
            }
            self.expect(&TokenKind::Comma, "expected ',' or '}' in object literal")?;
        }
    }

    fn parse_template(
        &mut self,
        quasis: Vec<String>,
        sources: Vec<(String, usize)>,
    ) -> Result<Node, EvalError> {
        let mut expressions = Vec::with_capacity(sources.len());
        for (source, offset) in sources {
            let tokens = tokenize(&source).map_err(|e| shift_position(e, offset))?;
            let remaining = self.max_depth.saturating_sub(self.depth);
            let node = Parser::new(tokens, source.chars().count(), remaining)
                .parse_sequence_to_end()
                .map_err(|e| shift_position(e, offset))?;
            expressions.push(node);
        }
        Ok(Node::Template {
            quasis,
            expressions,
        })
    }

    fn parse_sequence_to_end(&mut self) -> Result<Node, EvalError> {
        let node = self.parse_sequence()?;
        if !self.at_end() {
            return Err(self.unexpected());
        }
        Ok(node)
    }

    /// Consume a bracketed group starting at the current token, returning the
    /// tokens strictly inside it
    fn skip_balanced(&mut self) -> Result<Vec<Token>, EvalError> {
        let open = self.index;
        let mut stack: Vec<TokenKind> = Vec::new();
        let mut inner = Vec::new();

        while let Some(token) = self.tokens.get(self.index).cloned() {
            self.index += 1;
            match &token.kind {
                TokenKind::LParen => stack.push(TokenKind::RParen),
                TokenKind::LBracket => stack.push(TokenKind::RBracket),
                TokenKind::LBrace => stack.push(TokenKind::RBrace),
                kind @ (TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace) => {
                    if stack.pop().as_ref() != Some(kind) {
                        return Err(EvalError::syntax("mismatched bracket", token.position));
                    }
                    if stack.is_empty() {
                        return Ok(inner);
                    }
                }
                _ => {}
            }
            if self.index - 1 != open {
                inner.push(token);
            }
        }

        let position = self
            .tokens
            .get(open)
            .map(|t| t.position)
            .unwrap_or(self.end);
        Err(EvalError::syntax("unclosed bracket", position))
    }

    /// Consume the rest of a statement: up to a top-level ';', the end of
    /// input, or a closing bracket that belongs to an enclosing group
    fn skip_statement(&mut self) -> Result<(), EvalError> {
        let mut stack: Vec<TokenKind> = Vec::new();

        while let Some(token) = self.tokens.get(self.index) {
            match &token.kind {
                TokenKind::Semicolon if stack.is_empty() => return Ok(()),
                TokenKind::LParen => stack.push(TokenKind::RParen),
                TokenKind::LBracket => stack.push(TokenKind::RBracket),
                TokenKind::LBrace => stack.push(TokenKind::RBrace),
                kind @ (TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace) => {
                    if stack.is_empty() {
                        return Ok(());
                    }
                    if stack.pop().as_ref() != Some(kind) {
                        return Err(EvalError::syntax("mismatched bracket", token.position));
                    }
                }
                _ => {}
            }
            self.index += 1;
        }

        if !stack.is_empty() {
            return Err(EvalError::syntax("unclosed bracket", self.end));
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            self.depth -= 1;
            let position = self
                .tokens
                .get(self.index)
                .map(|t| t.position)
                .unwrap_or(self.end);
            return Err(EvalError::syntax(
                format!("expression nested deeper than {} levels", self.max_depth),
                position,
            ));
        }
        Ok(())
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.index).map(|t| &t.kind)
    }

    fn peek_kind_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.index + offset).map(|t| &t.kind)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.index += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<(), EvalError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error_here(message))
        }
    }

    fn at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn error_here(&self, message: &str) -> EvalError {
        let position = self
            .tokens
            .get(self.index)
            .map(|t| t.position)
            .unwrap_or(self.end);
        EvalError::syntax(message, position)
    }

    fn unexpected(&self) -> EvalError {
        match self.tokens.get(self.index) {
            Some(token) => EvalError::syntax(
                format!("unexpected token {:?}", token.kind),
                token.position,
            ),
            None => EvalError::syntax("unexpected end of expression", self.end),
        }
    }
}

fn logical(operator: LogicalOperator, left: Node, right: Node) -> Node {
    Node::Logical {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn binary(operator: BinaryOperator, left: Node, right: Node) -> Node {
    Node::Binary {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn shift_position(err: EvalError, offset: usize) -> EvalError {
    match err {
        EvalError::Syntax { message, position } => EvalError::Syntax {
            message,
            position: position + offset,
        },
        other => other,
    }
}
