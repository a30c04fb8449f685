//! # 选择字符串解析器
//!
//! 从左到右逐字符扫描，递归下降地构建节点树。
//!
//! ## 语法
//! ```text
//! list    := item ( (',' | 空白)+ item )*
//! item    := [op] term ( op term )*        op := '+' | '-'
//! term    := content [ '(' list ')' ]
//! content := token ( sep token )*          sep := ':' | '~'（同一组内不可混用）
//! token   := 除 空白 , : ~ ( ) + - 以外的字符序列
//! ```
//! 分隔符、运算符和括号两侧的空白均被忽略。
//!
//! ## 依赖关系
//! - 被 `select/mod.rs` 使用
//! - 使用 `error.rs`

use super::{Content, Group, Node, Operator, Separator};
use crate::error::{SelectResult, SelectionError};

/// 解析整个选择字符串，返回顶层节点
pub(super) fn parse(selection: &str) -> SelectResult<Vec<Node>> {
    let mut parser = Parser::new(selection);
    parser.parse_list(false)
}

fn is_special(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | ':' | '~' | '(' | ')' | '+' | '-')
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // 语法规则
    // ─────────────────────────────────────────────────────────────

    fn parse_list(&mut self, nested: bool) -> SelectResult<Vec<Node>> {
        let mut nodes = Vec::new();
        loop {
            self.skip_separators();
            match self.peek() {
                None if nested => {
                    return Err(
                        self.error("An opening parenthesis was not followed by a closing one.")
                    );
                }
                None => return Ok(nodes),
                Some(')') if nested => {
                    self.bump();
                    return Ok(nodes);
                }
                Some(')') => {
                    return Err(self.error("Closing parenthesis ')' must follow an opening one."));
                }
                Some('(') => {
                    return Err(
                        self.error("Opening parenthesis '(' must relate to a previous argument.")
                    );
                }
                Some(c) => {
                    if let Some(separator) = Separator::from_char(c) {
                        return Err(self.group_error("left", separator));
                    }
                    nodes.push(self.parse_item()?);
                }
            }
        }
    }

    fn parse_item(&mut self) -> SelectResult<Node> {
        let mut node = match self.peek().and_then(Operator::from_char) {
            Some(operator) => {
                self.bump();
                self.parse_operand(operator, Node::default())?
            }
            None => self.parse_term()?,
        };

        while let Some(operator) = self.lookahead_operator() {
            self.bump();
            node = self.parse_operand(operator, node)?;
        }

        Ok(node)
    }

    fn parse_operand(&mut self, operator: Operator, left: Node) -> SelectResult<Node> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if !is_special(c) => {
                let right = self.parse_term()?;
                Ok(Node::operation(operator, left, right))
            }
            _ => Err(self.error(&format!(
                "The operator {} is not followed by an element.",
                operator
            ))),
        }
    }

    fn parse_term(&mut self) -> SelectResult<Node> {
        let content = self.parse_content()?;
        let mut node = Node::new(content);
        if self.lookahead('(') {
            self.bump();
            node.children = self.parse_list(true)?;
        }
        Ok(node)
    }

    fn parse_content(&mut self) -> SelectResult<Content> {
        let first = self.parse_token();
        if first.is_empty() {
            return Err(self.error("Expected a selection."));
        }

        let Some(separator) = self.lookahead_separator() else {
            return Ok(Content::Token(first));
        };

        let mut elements = vec![first];
        while let Some(next) = self.peek().and_then(Separator::from_char) {
            if next != separator {
                return Err(self.error(
                    "A group may not mix the range ':' and the pair '~' separator.",
                ));
            }
            self.bump();
            self.skip_whitespace();
            let token = self.parse_token();
            if token.is_empty() {
                return Err(self.group_error("right", separator));
            }
            elements.push(token);
            if self.lookahead_separator().is_none() {
                break;
            }
        }

        Ok(Content::Group(Group::new(elements, separator)))
    }

    fn parse_token(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if !is_special(c)) {
            self.bump();
        }
        self.chars[start..self.pos].iter().collect()
    }

    // ─────────────────────────────────────────────────────────────
    // 字符游标
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// 跳过连续的空白和逗号（重复或前导分隔符被忽略）
    fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace() || c == ',') {
            self.bump();
        }
    }

    /// 跳过空白后若下一个字符为 `expected` 则停在该字符处，否则回退
    fn lookahead(&mut self, expected: char) -> bool {
        let saved = self.pos;
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            true
        } else {
            self.pos = saved;
            false
        }
    }

    fn lookahead_separator(&mut self) -> Option<Separator> {
        let saved = self.pos;
        self.skip_whitespace();
        let separator = self.peek().and_then(Separator::from_char);
        if separator.is_none() {
            self.pos = saved;
        }
        separator
    }

    fn lookahead_operator(&mut self) -> Option<Operator> {
        let saved = self.pos;
        self.skip_whitespace();
        let operator = self.peek().and_then(Operator::from_char);
        if operator.is_none() {
            self.pos = saved;
        }
        operator
    }

    // ─────────────────────────────────────────────────────────────
    // 错误
    // ─────────────────────────────────────────────────────────────

    fn error(&self, message: &str) -> SelectionError {
        SelectionError::Syntax {
            selection: self.source.to_string(),
            position: self.pos,
            message: message.to_string(),
        }
    }

    fn group_error(&self, side: &str, separator: Separator) -> SelectionError {
        self.error(&format!(
            "The {} argument of {} is missing.",
            side,
            separator.name()
        ))
    }
}
