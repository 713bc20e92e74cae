//! Filter的词法分析器
//!
//! 词法分析器会记住上一个 token 的类型：字段名之后优先匹配比较运算符,
//! 字面量、`]` 或 `)` 之后优先匹配逻辑运算符。匹配失败时再按普通规则
//! 读取标识符、字面量和标点符号。运算符的匹配规则见 [`AliasRegistry`]。

use std::borrow::Cow;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::alias::{is_ident_char, AliasRegistry};
use crate::ast::LiteralKind;
use crate::token::{Span, Token, TokenKind};

/// 词法错误
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at offset {position}")]
pub struct LexError {
    /// 出错位置（字节索引）
    pub position: usize,
    pub kind: LexErrorKind,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("malformed literal `{0}`")]
    MalformedLiteral(String),
    #[error("malformed field path `{0}`")]
    MalformedFieldPath(String),
    #[error("unrecognized character {0:?}")]
    UnexpectedChar(char),
}

/// 根据上一个 token 推断下一个 token 的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Field,
    Operator,
    Value,
    Combinator,
}

impl Expect {
    fn after(kind: &TokenKind<'_>) -> Self {
        match kind {
            TokenKind::Identifier(_) => Expect::Operator,
            TokenKind::Comparison { .. } | TokenKind::LBracket | TokenKind::Comma => Expect::Value,
            TokenKind::Literal(..) | TokenKind::RBracket | TokenKind::RParen => Expect::Combinator,
            TokenKind::LParen | TokenKind::Logical(_) | TokenKind::Eof => Expect::Field,
        }
    }
}

pub struct Lexer<'a, 'r> {
    input: &'a str,
    registry: &'r AliasRegistry,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
    expect: Expect,
    finished: bool,
}

/// 对整个输入进行分词, 结果以 `Eof` 结尾
pub fn tokenize<'a>(input: &'a str, registry: &AliasRegistry) -> Result<Vec<Token<'a>>, LexError> {
    Lexer::new(input, registry).collect()
}

impl<'a, 'r> Lexer<'a, 'r> {
    pub fn new(input: &'a str, registry: &'r AliasRegistry) -> Self {
        Lexer {
            input,
            registry,
            position: 0,
            expect: Expect::Field,
            finished: false,
        }
    }

    /// 尚未消费的输入
    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// 返回下一个位置的字符，不推进位置
    fn peek_next(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 跳过空白字符
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn token(&self, kind: TokenKind<'a>, start: usize) -> Token<'a> {
        Token {
            kind,
            span: Span::new(start, self.position),
        }
    }

    fn next_token(&mut self, start: usize) -> Result<Token<'a>, LexError> {
        // 先按位置尝试运算符
        match self.expect {
            Expect::Operator => {
                if let Some(m) = self.registry.resolve_comparison(self.rest()) {
                    self.position += m.len;
                    let kind = TokenKind::Comparison {
                        op: m.op,
                        case_insensitive: m.case_insensitive,
                    };
                    return Ok(self.token(kind, start));
                }
            }
            Expect::Combinator => {
                if let Some((op, len)) = self.registry.resolve_logical(self.rest()) {
                    self.position += len;
                    return Ok(self.token(TokenKind::Logical(op), start));
                }
            }
            Expect::Field | Expect::Value => {}
        }

        let Some(c) = self.peek() else {
            return Ok(self.token(TokenKind::Eof, start));
        };

        match c {
            '(' | ')' | '[' | ']' | ',' => {
                self.bump();
                let kind = match c {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    _ => TokenKind::Comma,
                };
                Ok(self.token(kind, start))
            }
            '"' => {
                self.bump();
                self.read_string(start)
            }
            c if c.is_ascii_digit() => self.read_number_or_date(start),
            '-' | '+' if self.peek_next().is_some_and(|n| n.is_ascii_digit()) => {
                self.read_number_or_date(start)
            }
            c if c.is_alphabetic() || c == '_' => self.read_identifier(start),
            _ => self.read_stray_operator(start, c),
        }
    }

    /// 读取双引号包围的字符串字面量, 支持 `\"` 和 `\\` 转义
    /// 注意：开始的引号已经被调用者消费
    fn read_string(&mut self, start: usize) -> Result<Token<'a>, LexError> {
        let content_start = self.position;
        let mut unescaped: Option<String> = None;

        loop {
            let Some(c) = self.bump() else {
                return Err(LexError {
                    position: start,
                    kind: LexErrorKind::UnterminatedString,
                });
            };
            match c {
                '"' => break,
                '\\' if matches!(self.peek(), Some('"') | Some('\\')) => {
                    let buf = unescaped.get_or_insert_with(|| {
                        self.input[content_start..self.position - 1].to_string()
                    });
                    if let Some(escaped) = self.bump() {
                        buf.push(escaped);
                    }
                }
                c => {
                    if let Some(buf) = unescaped.as_mut() {
                        buf.push(c);
                    }
                }
            }
        }

        let content = match unescaped {
            Some(owned) => Cow::Owned(owned),
            // 不含转义时直接借用原始输入
            None => Cow::Borrowed(&self.input[content_start..self.position - 1]),
        };
        Ok(self.token(TokenKind::Literal(LiteralKind::String, content), start))
    }

    /// 读取数字或不带引号的日期, 例如 `-12.5`、`2022-07-01`、`2022-07-01T10:00:00Z`
    fn read_number_or_date(&mut self, start: usize) -> Result<Token<'a>, LexError> {
        self.bump(); // 符号或第一个数字
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '+' | '-') {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.input[start..self.position];
        let number = text.strip_prefix('+').unwrap_or(text);

        let kind = if Decimal::from_str(number).is_ok() {
            TokenKind::Literal(LiteralKind::Number, Cow::Borrowed(number))
        } else if looks_like_date(text) {
            TokenKind::Literal(LiteralKind::Date, Cow::Borrowed(text))
        } else {
            return Err(LexError {
                position: start,
                kind: LexErrorKind::MalformedLiteral(text.to_string()),
            });
        };
        Ok(self.token(kind, start))
    }

    /// 读取字段路径或关键字
    /// 字段路径由点分隔, 每一段可以包含字母、数字和下划线
    fn read_identifier(&mut self, start: usize) -> Result<Token<'a>, LexError> {
        while let Some(c) = self.peek() {
            if is_ident_char(c) || c == '.' {
                self.bump();
            } else {
                break;
            }
        }
        let literal = &self.input[start..self.position];

        // 关键字区分大小写
        let kind = match literal {
            "true" | "false" => TokenKind::Literal(LiteralKind::Boolean, Cow::Borrowed(literal)),
            "null" => TokenKind::Literal(LiteralKind::Null, Cow::Borrowed(literal)),
            path if path.split('.').any(str::is_empty) => {
                return Err(LexError {
                    position: start,
                    kind: LexErrorKind::MalformedFieldPath(path.to_string()),
                });
            }
            path => TokenKind::Identifier(path),
        };
        Ok(self.token(kind, start))
    }

    /// 出现在意料之外位置的运算符, 交给语法分析器报告
    fn read_stray_operator(&mut self, start: usize, c: char) -> Result<Token<'a>, LexError> {
        if let Some((op, len)) = self.registry.resolve_logical(self.rest()) {
            self.position += len;
            return Ok(self.token(TokenKind::Logical(op), start));
        }
        if let Some(m) = self.registry.resolve_comparison(self.rest()) {
            self.position += m.len;
            let kind = TokenKind::Comparison {
                op: m.op,
                case_insensitive: m.case_insensitive,
            };
            return Ok(self.token(kind, start));
        }
        Err(LexError {
            position: start,
            kind: LexErrorKind::UnexpectedChar(c),
        })
    }
}

fn looks_like_date(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 5 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-'
}

impl<'a, 'r> Iterator for Lexer<'a, 'r> {
    type Item = Result<Token<'a>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        self.skip_whitespace();
        let start = self.position;

        let result = self.next_token(start);
        match &result {
            Ok(token) if token.kind.is_eof() => self.finished = true,
            Ok(token) => self.expect = Expect::after(&token.kind),
            Err(_) => self.finished = true,
        }
        Some(result)
    }
}
