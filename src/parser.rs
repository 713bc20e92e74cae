//! Filter的语法分析器
//!
//! ## 解析流程图
//!
//! ```text
//! parse()
//!   └─ parse_expression(0)            (优先级爬升)
//!        ├─ parse_primary()
//!        │    ├─ "(" → 分组表达式 (递归调用 parse_expression(0)), 期望 ')'
//!        │    └─ 字段名 → parse_comparison()
//!        │                  ├─ 期望比较运算符
//!        │                  ├─ IN / NOT IN → parse_list()
//!        │                  └─ 其他 → parse_literal()
//!        │
//!        └─ 遇到逻辑运算符时, 比较其优先级:
//!             高于当前最小优先级 → 消费运算符, 递归解析右侧
//!             否则 → 返回给上一层
//! ```
//!
//! ## 语法优先级（从高到低）
//!
//! 1. **括号分组** `(expression)`
//! 2. **比较操作** `field op value`, `field ^^ [v1, v2]`
//! 3. **AND操作** `expr1 && expr2`
//! 4. **OR操作** `expr1 || expr2`
//!
//! AND 和 OR 都是左结合的: `a || b || c` 解析为 `(a || b) || c`。
//!
//! ## 解析示例
//!
//! ```text
//! // 简单过滤
//! Title == "foo"
//!
//! // 复杂条件
//! (Title @=* "pasta" || Rating > 3) && Tags ^^ ["quick", "vegan"]
//!
//! // 嵌套字段
//! Ingredients.Name _= "tom"
//! ```

use thiserror::Error;

use crate::ast::{CompOp, Comparison, Literal, LogicalOp, Node, Operand};
use crate::token::{Span, Token, TokenKind};

/// 表达式树允许的最大高度, 括号嵌套和逻辑运算链都计入
pub const MAX_DEPTH: usize = 256;

pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    position: usize,
    /// 当前括号嵌套层数
    depth: usize,
}

/// 语法错误
#[derive(Debug, Clone, PartialEq, Error)]
#[error("expected {expected}, found {found} at {span}")]
pub struct ParseError {
    pub span: Span,
    pub expected: String,
    pub found: String,
}

impl ParseError {
    fn new(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        Self {
            span,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// 逻辑运算符的左右绑定强度, AND 比 OR 绑定更紧
fn binding_power(op: LogicalOp) -> (u8, u8) {
    match op {
        LogicalOp::Or => (1, 2),
        LogicalOp::And => (3, 4),
    }
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// 返回当前 token，不推进位置
    fn peek(&self) -> Option<&'a Token<'a>> {
        self.tokens.get(self.position)
    }

    /// 返回当前 token 并推进位置
    fn advance(&mut self) -> Option<&'a Token<'a>> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// 输入结束处的位置
    fn end_span(&self) -> Span {
        self.tokens
            .last()
            .map(|t| Span::new(t.span.end, t.span.end))
            .unwrap_or_default()
    }

    /// 在当前位置生成错误
    fn error_here(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::new(expected, token.kind.to_string(), token.span),
            None => ParseError::new(expected, "end of input", self.end_span()),
        }
    }

    /// 期望特定类型的 token 并推进，否则返回错误
    fn expect(&mut self, expected: TokenKind, description: &str) -> Result<&'a Token<'a>, ParseError> {
        if self.match_token(&expected) {
            self.advance().ok_or_else(|| self.error_here(description))
        } else {
            Err(self.error_here(description))
        }
    }

    /// 检查当前 token 是否匹配给定类型
    fn match_token(&self, kind: &TokenKind) -> bool {
        if let Some(token) = self.peek() {
            std::mem::discriminant(&token.kind) == std::mem::discriminant(kind)
        } else {
            false
        }
    }

    /// 嵌套过深, 报告在使树超出高度限制的 token 上
    fn too_deep(token: &Token<'_>) -> ParseError {
        ParseError::new(
            format!("at most {} nested expressions", MAX_DEPTH),
            token.kind.to_string(),
            token.span,
        )
    }

    fn at_end(&self) -> bool {
        self.peek().map_or(true, |t| t.kind.is_eof())
    }

    /// 解析整个过滤表达式, 必须消费全部 token
    pub fn parse(&mut self) -> Result<Node, ParseError> {
        if self.at_end() {
            return Err(self.error_here("a comparison"));
        }
        let (node, _) = self.parse_expression(0)?;
        if !self.at_end() {
            return Err(self.error_here("a logical operator or end of input"));
        }
        Ok(node)
    }

    /// 优先级爬升解析逻辑表达式
    ///
    /// 只有左绑定强度不低于 `min_bp` 的运算符会在这一层被消费,
    /// 右侧用更高的强度递归, 从而得到左结合的结果。
    /// 返回节点及其高度, 超过 [`MAX_DEPTH`] 时报错。
    fn parse_expression(&mut self, min_bp: u8) -> Result<(Node, usize), ParseError> {
        let (mut left, mut height) = self.parse_primary()?;

        while let Some(token) = self.peek() {
            let TokenKind::Logical(op) = token.kind else {
                break;
            };
            let (left_bp, right_bp) = binding_power(op);
            if left_bp < min_bp {
                break;
            }
            self.advance(); // 消费逻辑运算符
            let (right, right_height) = self.parse_expression(right_bp)?;
            height = height.max(right_height) + 1;
            if height > MAX_DEPTH {
                return Err(Self::too_deep(token));
            }
            left = match op {
                LogicalOp::And => Node::and(left, right),
                LogicalOp::Or => Node::or(left, right),
            };
        }

        Ok((left, height))
    }

    /// 解析基础表达式 (最高优先级)
    ///
    /// 支持的表达式类型:
    /// - `(expression)` - 分组表达式
    /// - `field op value` - 比较操作
    fn parse_primary(&mut self) -> Result<(Node, usize), ParseError> {
        match self.peek() {
            Some(open @ Token {
                kind: TokenKind::LParen,
                ..
            }) => {
                self.advance(); // 消费 (
                if self.depth >= MAX_DEPTH {
                    return Err(Self::too_deep(open));
                }
                self.depth += 1;
                let (inner, height) = self.parse_expression(0)?;
                self.depth -= 1;
                self.expect(TokenKind::RParen, "`)`")?;
                if height >= MAX_DEPTH {
                    return Err(Self::too_deep(open));
                }
                Ok((Node::group(inner), height + 1))
            }
            Some(Token {
                kind: TokenKind::Identifier(_),
                ..
            }) => Ok((self.parse_comparison()?, 1)),
            _ => Err(self.error_here("a field path or `(`")),
        }
    }

    fn parse_comparison(&mut self) -> Result<Node, ParseError> {
        let field_token = self.expect(TokenKind::Identifier(""), "a field path")?;
        let TokenKind::Identifier(field) = field_token.kind else {
            return Err(ParseError::new(
                "a field path",
                field_token.kind.to_string(),
                field_token.span,
            ));
        };

        let (op, case_insensitive) = self.parse_comparison_operator()?;
        let (operand, operand_span) = if op.takes_list() {
            self.parse_list()?
        } else if self.match_token(&TokenKind::LBracket) {
            // 只有 IN / NOT IN 接受列表
            return Err(self.error_here(&format!("a single literal value for {}", op)));
        } else {
            let literal = self.parse_literal()?;
            let span = literal.span;
            (Operand::Scalar(literal), span)
        };

        Ok(Node::Comparison(Comparison {
            field: field.to_string(),
            field_span: field_token.span,
            op,
            case_insensitive,
            operand,
            span: field_token.span.to(operand_span),
        }))
    }

    fn parse_comparison_operator(&mut self) -> Result<(CompOp, bool), ParseError> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Comparison {
                op,
                case_insensitive,
            }) => {
                self.advance();
                Ok((*op, *case_insensitive))
            }
            _ => Err(self.error_here("a comparison operator")),
        }
    }

    /// 解析 `[v1, v2, ...]`, 允许空列表, 不允许结尾的逗号
    fn parse_list(&mut self) -> Result<(Operand, Span), ParseError> {
        let open = self.expect(TokenKind::LBracket, "`[`")?;
        let mut values = Vec::new();

        if !self.match_token(&TokenKind::RBracket) {
            loop {
                values.push(self.parse_literal()?);
                if self.match_token(&TokenKind::RBracket) {
                    break;
                }
                self.expect(TokenKind::Comma, "`,` or `]`")?;
            }
        }

        let close = self.expect(TokenKind::RBracket, "`]`")?;
        Ok((Operand::List(values), open.span.to(close.span)))
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Literal(kind, text),
                span,
            }) => {
                self.advance();
                Ok(Literal {
                    kind: *kind,
                    text: text.to_string(),
                    span: *span,
                })
            }
            _ => Err(self.error_here("a literal value")),
        }
    }
}
