//! Filter 的抽象语法树

use std::fmt;

use serde::Serialize;

use crate::token::Span;

/// AST 节点, 代表一个完整的过滤表达式或其子表达式
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// 基础比较运算, 这是表达式的叶子节点
    Comparison(Comparison),
    /// 逻辑与运算 (AND)
    And(Box<Node>, Box<Node>),
    /// 逻辑或运算 (OR)
    Or(Box<Node>, Box<Node>),
    /// 使用括号分组的表达式, 仅用于保留原始的括号结构
    Group(Box<Node>),
}

impl Node {
    pub fn and(left: Node, right: Node) -> Node {
        Node::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Node, right: Node) -> Node {
        Node::Or(Box::new(left), Box::new(right))
    }

    pub fn group(inner: Node) -> Node {
        Node::Group(Box::new(inner))
    }

    /// 去掉外层的所有括号分组
    pub fn ungrouped(&self) -> &Node {
        match self {
            Node::Group(inner) => inner.ungrouped(),
            other => other,
        }
    }

    /// 表达式中比较节点的数量
    pub fn comparison_count(&self) -> usize {
        match self {
            Node::Comparison(_) => 1,
            Node::And(left, right) | Node::Or(left, right) => {
                left.comparison_count() + right.comparison_count()
            }
            Node::Group(inner) => inner.comparison_count(),
        }
    }
}

/// 单个字段的比较, 例如：`Title == "foo"`
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// 点分隔的字段路径, 例如 `Ingredients.Name`
    pub field: String,
    pub field_span: Span,
    pub op: CompOp,
    pub case_insensitive: bool,
    pub operand: Operand,
    /// 整个比较表达式的范围
    pub span: Span,
}

/// 比较运算的右侧操作数
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(Literal),
    /// `[a, b, c]`, 仅用于 IN / NOT IN
    List(Vec<Literal>),
}

/// 字面量值, 保留原始文本, 类型转换推迟到编译阶段
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub kind: LiteralKind,
    /// 字符串字面量为去掉转义后的内容
    pub text: String,
    pub span: Span,
}

/// 词法分析推断出的字面量类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    String,
    Number,
    Boolean,
    Date,
    Null,
}

impl fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LiteralKind::String => "string",
            LiteralKind::Number => "number",
            LiteralKind::Boolean => "boolean",
            LiteralKind::Date => "date",
            LiteralKind::Null => "null",
        };
        f.write_str(name)
    }
}

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompOp {
    Eq,            // ==
    NotEq,         // !=
    Gt,            // >
    Gte,           // >=
    Lt,            // <
    Lte,           // <=
    Contains,      // @=
    NotContains,   // !@=
    StartsWith,    // _=
    NotStartsWith, // !_=
    EndsWith,      // =_
    NotEndsWith,   // !=_
    In,            // ^^
    NotIn,         // !^^
}

impl CompOp {
    pub const ALL: [CompOp; 14] = [
        CompOp::Eq,
        CompOp::NotEq,
        CompOp::Gt,
        CompOp::Gte,
        CompOp::Lt,
        CompOp::Lte,
        CompOp::Contains,
        CompOp::NotContains,
        CompOp::StartsWith,
        CompOp::NotStartsWith,
        CompOp::EndsWith,
        CompOp::NotEndsWith,
        CompOp::In,
        CompOp::NotIn,
    ];

    /// 未配置别名时使用的默认符号
    pub fn default_token(self) -> &'static str {
        match self {
            CompOp::Eq => "==",
            CompOp::NotEq => "!=",
            CompOp::Gt => ">",
            CompOp::Gte => ">=",
            CompOp::Lt => "<",
            CompOp::Lte => "<=",
            CompOp::Contains => "@=",
            CompOp::NotContains => "!@=",
            CompOp::StartsWith => "_=",
            CompOp::NotStartsWith => "!_=",
            CompOp::EndsWith => "=_",
            CompOp::NotEndsWith => "!=_",
            CompOp::In => "^^",
            CompOp::NotIn => "!^^",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CompOp::Eq => "Equals",
            CompOp::NotEq => "NotEquals",
            CompOp::Gt => "GreaterThan",
            CompOp::Gte => "GreaterThanOrEqual",
            CompOp::Lt => "LessThan",
            CompOp::Lte => "LessThanOrEqual",
            CompOp::Contains => "Contains",
            CompOp::NotContains => "NotContains",
            CompOp::StartsWith => "StartsWith",
            CompOp::NotStartsWith => "NotStartsWith",
            CompOp::EndsWith => "EndsWith",
            CompOp::NotEndsWith => "NotEndsWith",
            CompOp::In => "In",
            CompOp::NotIn => "NotIn",
        }
    }

    /// 该运算符的右侧是否为列表字面量
    pub fn takes_list(self) -> bool {
        matches!(self, CompOp::In | CompOp::NotIn)
    }

    pub fn is_ordering(self) -> bool {
        matches!(self, CompOp::Gt | CompOp::Gte | CompOp::Lt | CompOp::Lte)
    }

    /// 只能用于字符串字段的运算符
    pub fn is_text_match(self) -> bool {
        matches!(
            self,
            CompOp::Contains
                | CompOp::NotContains
                | CompOp::StartsWith
                | CompOp::NotStartsWith
                | CompOp::EndsWith
                | CompOp::NotEndsWith
        )
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 逻辑运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And, // &&
    Or,  // ||
}

impl LogicalOp {
    pub fn default_token(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LiteralKind::String => {
                f.write_str("\"")?;
                for c in self.text.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                f.write_str("\"")
            }
            _ => f.write_str(&self.text),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Scalar(literal) => write!(f, "{}", literal),
            Operand::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// 使用默认符号打印表达式, 输出可以被重新解析
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Comparison(cmp) => {
                write!(f, "{} {}", cmp.field, cmp.op.default_token())?;
                if cmp.case_insensitive {
                    f.write_str("*")?;
                }
                write!(f, " {}", cmp.operand)
            }
            Node::And(left, right) => write!(f, "{} && {}", left, right),
            Node::Or(left, right) => write!(f, "{} || {}", left, right),
            Node::Group(inner) => write!(f, "({})", inner),
        }
    }
}
