// SPDX-License-Identifier: MIT

//! Tokenizer for condition expressions

use crate::core::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    String(String),
    /// Template literal: literal chunks plus the source of each `${...}`
    Template {
        quasis: Vec<String>,
        expressions: Vec<(String, usize)>,
    },
    Identifier(String),
    True,
    False,
    Null,
    Undefined,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Dot,
    Comma,
    Semicolon,
    Colon,
    Question,
    Arrow,
    Not,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    Gt,
    Lte,
    Gte,
    AndAnd,
    OrOr,
    Assign,
    /// `+=`, `-=`, `*=`, `/=`, `%=`, `&&=`, `||=`
    CompoundAssign(String),
}

/// A token and the character offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

/// Split an expression into tokens
pub fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    Lexer::new(input).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn push(&mut self, kind: TokenKind, position: usize) {
        self.tokens.push(Token { kind, position });
    }

    fn run(mut self) -> Result<Vec<Token>, EvalError> {
        while let Some(c) = self.peek() {
            let start = self.pos;

            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }

            let fraction = c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit());
            if c.is_ascii_digit() || fraction {
                let number = self.read_number()?;
                self.push(TokenKind::Number(number), start);
                continue;
            }

            if c == '\'' || c == '"' {
                let s = self.read_string(c)?;
                self.push(TokenKind::String(s), start);
                continue;
            }

            if c == '`' {
                let kind = self.read_template()?;
                self.push(kind, start);
                continue;
            }

            if is_ident_start(c) {
                let word = self.read_identifier();
                let kind = match word.as_str() {
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    "null" => TokenKind::Null,
                    "undefined" => TokenKind::Undefined,
                    _ => TokenKind::Identifier(word),
                };
                self.push(kind, start);
                continue;
            }

            let kind = self.read_punctuator(c, start)?;
            self.push(kind, start);
        }

        Ok(self.tokens)
    }

    fn read_number(&mut self) -> Result<f64, EvalError> {
        let start = self.pos;

        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            let digits: String = self.chars[digits_start..self.pos].iter().collect();
            return i64::from_str_radix(&digits, 16)
                .map(|v| v as f64)
                .map_err(|_| EvalError::syntax("invalid hexadecimal literal", start));
        }

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        } else if self.peek() == Some('.') && !self.peek_at(1).is_some_and(is_ident_start) {
            // "1." is a complete number; "1.toFixed" is not supported anyway
            self.pos += 1;
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.pos += 1;
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            } else {
                self.pos = mark;
            }
        }

        if self.peek().is_some_and(is_ident_start) {
            return Err(EvalError::syntax("identifier directly after number", self.pos));
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map_err(|e| EvalError::syntax(format!("invalid number '{}': {}", text, e), start))
    }

    fn read_escape(&mut self) -> Result<char, EvalError> {
        let at = self.pos;
        let c = self
            .peek()
            .ok_or_else(|| EvalError::syntax("unterminated escape sequence", at))?;
        self.pos += 1;
        let translated = match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            'u' => {
                let hex: String = self.chars.iter().skip(self.pos).take(4).collect();
                if hex.len() != 4 {
                    return Err(EvalError::syntax("invalid unicode escape", at));
                }
                self.pos += 4;
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| EvalError::syntax("invalid unicode escape", at))?
            }
            other => other,
        };
        Ok(translated)
    }

    fn read_string(&mut self, quote: char) -> Result<String, EvalError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();

        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => value.push(self.read_escape()?),
                '\n' => {
                    return Err(EvalError::syntax(
                        "line break inside string literal",
                        self.pos - 1,
                    ))
                }
                c if c == quote => return Ok(value),
                c => value.push(c),
            }
        }

        Err(EvalError::syntax("unterminated string literal", start))
    }

    fn read_template(&mut self) -> Result<TokenKind, EvalError> {
        let start = self.pos;
        self.pos += 1;
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        let mut current = String::new();

        while let Some(c) = self.peek() {
            match c {
                '`' => {
                    self.pos += 1;
                    quasis.push(current);
                    return Ok(TokenKind::Template { quasis, expressions });
                }
                '\\' => {
                    self.pos += 1;
                    current.push(self.read_escape()?);
                }
                '$' if self.peek_at(1) == Some('{') => {
                    self.pos += 2;
                    let expr_start = self.pos;
                    let mut depth = 1;
                    while let Some(inner) = self.peek() {
                        match inner {
                            '{' => depth += 1,
                            '}' => {
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            _ => {}
                        }
                        self.pos += 1;
                    }
                    if depth != 0 {
                        return Err(EvalError::syntax(
                            "unterminated template expression",
                            expr_start,
                        ));
                    }
                    let source: String = self.chars[expr_start..self.pos].iter().collect();
                    self.pos += 1;
                    quasis.push(std::mem::take(&mut current));
                    expressions.push((source, expr_start));
                }
                c => {
                    self.pos += 1;
                    current.push(c);
                }
            }
        }

        Err(EvalError::syntax("unterminated template literal", start))
    }

    fn read_identifier(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_part) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn read_punctuator(&mut self, c: char, start: usize) -> Result<TokenKind, EvalError> {
        let next = self.peek_at(1);
        let third = self.peek_at(2);

        let (kind, len) = match (c, next, third) {
            ('=', Some('='), Some('=')) => (TokenKind::EqEqEq, 3),
            ('!', Some('='), Some('=')) => (TokenKind::NotEqEq, 3),
            ('&', Some('&'), Some('=')) => (TokenKind::CompoundAssign("&&=".to_string()), 3),
            ('|', Some('|'), Some('=')) => (TokenKind::CompoundAssign("||=".to_string()), 3),
            ('=', Some('='), _) => (TokenKind::EqEq, 2),
            ('=', Some('>'), _) => (TokenKind::Arrow, 2),
            ('!', Some('='), _) => (TokenKind::NotEq, 2),
            ('<', Some('='), _) => (TokenKind::Lte, 2),
            ('>', Some('='), _) => (TokenKind::Gte, 2),
            ('&', Some('&'), _) => (TokenKind::AndAnd, 2),
            ('|', Some('|'), _) => (TokenKind::OrOr, 2),
            ('+', Some('+'), _) => (TokenKind::PlusPlus, 2),
            ('-', Some('-'), _) => (TokenKind::MinusMinus, 2),
            ('+' | '-' | '*' | '/' | '%', Some('='), _) => {
                (TokenKind::CompoundAssign(format!("{}=", c)), 2)
            }
            ('(', _, _) => (TokenKind::LParen, 1),
            (')', _, _) => (TokenKind::RParen, 1),
            ('[', _, _) => (TokenKind::LBracket, 1),
            (']', _, _) => (TokenKind::RBracket, 1),
            ('{', _, _) => (TokenKind::LBrace, 1),
            ('}', _, _) => (TokenKind::RBrace, 1),
            ('.', _, _) => (TokenKind::Dot, 1),
            (',', _, _) => (TokenKind::Comma, 1),
            (';', _, _) => (TokenKind::Semicolon, 1),
            (':', _, _) => (TokenKind::Colon, 1),
            ('?', _, _) => (TokenKind::Question, 1),
            ('!', _, _) => (TokenKind::Not, 1),
            ('+', _, _) => (TokenKind::Plus, 1),
            ('-', _, _) => (TokenKind::Minus, 1),
            ('*', _, _) => (TokenKind::Star, 1),
            ('/', _, _) => (TokenKind::Slash, 1),
            ('%', _, _) => (TokenKind::Percent, 1),
            ('<', _, _) => (TokenKind::Lt, 1),
            ('>', _, _) => (TokenKind::Gt, 1),
            ('=', _, _) => (TokenKind::Assign, 1),
            ('&', _, _) => return Err(EvalError::syntax("unexpected '&'; use '&&'", start)),
            ('|', _, _) => return Err(EvalError::syntax("unexpected '|'; use '||'", start)),
            (other, _, _) => {
                return Err(EvalError::syntax(format!("unexpected character '{}'", other), start))
            }
        };

        self.pos += len;
        Ok(kind)
    }
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            kinds("a === b !== c == d != e"),
            vec![
                TokenKind::Identifier("a".to_string()),
                TokenKind::EqEqEq,
                TokenKind::Identifier("b".to_string()),
                TokenKind::NotEqEq,
                TokenKind::Identifier("c".to_string()),
                TokenKind::EqEq,
                TokenKind::Identifier("d".to_string()),
                TokenKind::NotEq,
                TokenKind::Identifier("e".to_string()),
            ]
        );
        assert_eq!(kinds("x += 1")[1], TokenKind::CompoundAssign("+=".to_string()));
        assert_eq!(kinds("x => x")[1], TokenKind::Arrow);
        assert_eq!(kinds("i++")[1], TokenKind::PlusPlus);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42"), vec![TokenKind::Number(42.0)]);
        assert_eq!(kinds("0.5"), vec![TokenKind::Number(0.5)]);
        assert_eq!(kinds(".5"), vec![TokenKind::Number(0.5)]);
        assert_eq!(kinds("1e3"), vec![TokenKind::Number(1000.0)]);
        assert_eq!(kinds("0xff"), vec![TokenKind::Number(255.0)]);
        assert!(tokenize("12abc").is_err());
    }

    #[test]
    fn test_strings() {
        assert_eq!(kinds("'it\\'s'"), vec![TokenKind::String("it's".to_string())]);
        assert_eq!(kinds(r#""a\nb""#), vec![TokenKind::String("a\nb".to_string())]);
        assert_eq!(kinds(r#""A""#), vec![TokenKind::String("A".to_string())]);
        assert!(tokenize("'open").is_err());
    }

    #[test]
    fn test_keywords_and_unicode_identifiers() {
        assert_eq!(
            kinds("true false null undefined баланс"),
            vec![
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::Undefined,
                TokenKind::Identifier("баланс".to_string()),
            ]
        );
    }

    #[test]
    fn test_template() {
        let tokens = kinds("`Hello ${user.name}!`");
        assert_eq!(
            tokens,
            vec![TokenKind::Template {
                quasis: vec!["Hello ".to_string(), "!".to_string()],
                expressions: vec![("user.name".to_string(), 9)],
            }]
        );
        assert!(tokenize("`open ${x`").is_err());
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("a  && b").unwrap();
        assert_eq!(tokens[1].position, 3);
        assert_eq!(tokens[2].position, 6);
    }

    #[test]
    fn test_rejects_bitwise() {
        let err = tokenize("a & b").unwrap_err();
        assert!(matches!(err, EvalError::Syntax { position: 2, .. }));
        assert!(tokenize("a | b").is_err());
        assert!(tokenize("a # b").is_err());
    }
}
