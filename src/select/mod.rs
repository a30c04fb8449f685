//! # 选择树
//!
//! 将用户输入的选择字符串解析为一棵树。所有需要用户选择子集的功能
//! （投影态密度、力的某个分量等）都应通过这棵树理解用户输入：
//!
//! ```
//! use qrefine::select::Tree;
//!
//! let tree = Tree::from_selection("Sr(x), Ti").unwrap();
//! for selection in tree.selections().unwrap() {
//!     // 每个 selection 是一条从根到叶的路径
//!     assert!(!selection.is_empty());
//! }
//! ```
//!
//! ## 特性
//! - 列表：空格或逗号分隔元素，`"a, b c"` 产生三个选择
//! - 嵌套：`"Ti(d)"` 产生单个选择 `[Ti, d]`
//! - 分组：`"1:3"` 表示范围，`"A~B"` 表示一对
//! - 运算：`"Ti(d) - O(p)"`，从左到右依次求值
//!
//! 解析后的选择通常交给 [`crate::index::Selector`] 映射到数组索引。
//!
//! ## 依赖关系
//! - 被 `index/` 和 `refinery/` 使用
//! - 子模块: parser

mod parser;

use crate::error::{SelectResult, SelectionError};
use std::collections::HashSet;
use std::fmt;

/// 表示“沿该轴选择全部”的保留键
pub const ALL: &str = "__all__";

/// 分组分隔符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Separator {
    /// 范围 `a:b`
    Range,
    /// 组合 `a~b`
    Pair,
}

impl Separator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ':' => Some(Separator::Range),
            '~' => Some(Separator::Pair),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Separator::Range => ':',
            Separator::Pair => '~',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Separator::Range => "range",
            Separator::Pair => "pair",
        }
    }
}

/// 需要一起处理的多个元素
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Group {
    pub elements: Vec<String>,
    pub separator: Separator,
}

impl Group {
    pub fn new(elements: Vec<String>, separator: Separator) -> Self {
        Group {
            elements,
            separator,
        }
    }

    /// 元素顺序反转后的组
    pub fn reversed(&self) -> Self {
        let mut elements = self.elements.clone();
        elements.reverse();
        Group::new(elements, self.separator)
    }

    /// 判断预先计算的标签是否表示同一个组
    ///
    /// 组合 `a~b` 与 `b~a` 视为同一组合；范围必须完全一致。
    pub fn matches_label(&self, label: &str) -> bool {
        if self.to_string() == label {
            return true;
        }
        self.separator == Separator::Pair && self.reversed().to_string() == label
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = self.separator.as_char().to_string();
        write!(f, "{}", self.elements.join(&separator))
    }
}

/// 算术运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
}

impl Operator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            _ => None,
        }
    }

    /// 该运算符作用于右操作数时的符号
    pub fn sign(self) -> f64 {
        match self {
            Operator::Add => 1.0,
            Operator::Subtract => -1.0,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Add => write!(f, "+"),
            Operator::Subtract => write!(f, "-"),
        }
    }
}

/// 两个选择之间的运算，左操作数为空时为一元运算
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub left: Selection,
    pub operator: Operator,
    pub right: Selection,
}

impl Operation {
    pub fn is_unary(&self) -> bool {
        self.left.is_empty()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let right = selection_to_string(&self.right);
        if self.is_unary() {
            write!(f, "{}{}", self.operator, right)
        } else {
            let left = selection_to_string(&self.left);
            write!(f, "{} {} {}", left, self.operator, right)
        }
    }
}

/// 一条选择路径中的一个元素
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Key(String),
    Group(Group),
    Operation(Operation),
}

impl From<&str> for Part {
    fn from(key: &str) -> Self {
        Part::Key(key.to_string())
    }
}

impl From<Group> for Part {
    fn from(group: Group) -> Self {
        Part::Group(group)
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Key(key) => write!(f, "{}", key),
            Part::Group(group) => write!(f, "{}", group),
            Part::Operation(operation) => write!(f, "{}", operation),
        }
    }
}

/// 从根到叶的一条完整选择
pub type Selection = Vec<Part>;

/// 节点内容
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Content {
    #[default]
    Empty,
    Token(String),
    Group(Group),
    /// 运算节点，两个子节点分别为左、右操作数
    Operator(Operator),
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Empty => Ok(()),
            Content::Token(token) => write!(f, "{}", token),
            Content::Group(group) => write!(f, "{}", group),
            Content::Operator(operator) => write!(f, "{}", operator),
        }
    }
}

/// 选择树的节点，子节点表示对父节点选择的进一步限定
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    content: Content,
    children: Vec<Node>,
}

impl Node {
    fn new(content: Content) -> Self {
        Node {
            content,
            children: Vec::new(),
        }
    }

    fn operation(operator: Operator, left: Node, right: Node) -> Self {
        Node {
            content: Content::Operator(operator),
            children: vec![left, right],
        }
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn nodes(&self) -> &[Node] {
        &self.children
    }

    /// 渲染为可重新解析的字符串，包含子节点
    pub fn to_selection_string(&self) -> String {
        if let Content::Operator(operator) = &self.content {
            let left = self.children[0].to_selection_string();
            let right = self.children[1].to_selection_string();
            return if left.is_empty() {
                format!("{}{}", operator, right)
            } else {
                format!("{} {} {}", left, operator, right)
            };
        }
        let content = self.content.to_string();
        if self.children.is_empty() {
            return content;
        }
        let children: Vec<String> = self
            .children
            .iter()
            .map(|child| child.to_selection_string())
            .collect();
        format!("{}({})", content, children.join(", "))
    }

    fn part(&self, filter: &HashSet<String>) -> Option<Part> {
        let part = match &self.content {
            Content::Token(token) => Part::Key(token.clone()),
            Content::Group(group) => Part::Group(group.clone()),
            Content::Empty | Content::Operator(_) => return None,
        };
        if filter.contains(&part.to_string()) {
            None
        } else {
            Some(part)
        }
    }

    fn collect_selections(
        &self,
        prefix: &Selection,
        filter: &HashSet<String>,
        out: &mut Vec<Selection>,
    ) -> SelectResult<()> {
        if let Content::Operator(operator) = self.content {
            let left = self.children[0].operands(filter)?;
            let right = self.children[1].operands(filter)?;
            for left_operand in &left {
                for right_operand in &right {
                    let mut selection = prefix.clone();
                    selection.push(Part::Operation(Operation {
                        left: left_operand.clone(),
                        operator,
                        right: right_operand.clone(),
                    }));
                    out.push(selection);
                }
            }
            return Ok(());
        }

        let mut selected = prefix.clone();
        selected.extend(self.part(filter));
        if self.children.is_empty() {
            out.push(selected);
        } else {
            for child in &self.children {
                child.collect_selections(&selected, filter, out)?;
            }
        }
        Ok(())
    }

    /// 运算的一个操作数；有内容的节点不能被过滤成空选择，反之亦然
    fn operands(&self, filter: &HashSet<String>) -> SelectResult<Vec<Selection>> {
        let mut out = Vec::new();
        self.collect_selections(&Vec::new(), filter, &mut out)?;
        let has_content = self.content != Content::Empty;
        if let Some(operand) = out.iter().find(|operand| operand.is_empty() == has_content) {
            return Err(SelectionError::IncorrectUsage(format!(
                "The operand `{}` has a qualitatively different behavior then the content `{}`. \
                 This may occur when a filter would replace the last element.",
                selection_to_string(operand),
                self
            )));
        }
        Ok(out)
    }

    fn mermaid_lines(&self, parent: Option<&str>, counter: &mut usize, lines: &mut Vec<String>) {
        let name = match &self.content {
            Content::Empty => None,
            Content::Operator(operator) => {
                let name = format!("_{}_[{}]", counter, operator);
                *counter += 1;
                Some(name)
            }
            content => Some(content.to_string()),
        };

        if let Some(name) = &name {
            match parent {
                Some(parent) => lines.push(format!("    {} --> {}", parent, name)),
                None if self.children.is_empty() => lines.push(format!("    {}", name)),
                None => {}
            }
        }

        for child in &self.children {
            child.mermaid_lines(name.as_deref(), counter, lines);
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content)
    }
}

/// 从用户输入解析得到的整棵树
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// 解析用户的选择字符串；空字符串得到空树
    pub fn from_selection(selection: &str) -> SelectResult<Self> {
        let nodes = parser::parse(selection)?;
        Ok(Tree { nodes })
    }

    /// `None` 表示未选择，得到空树
    pub fn from_optional(selection: Option<&str>) -> SelectResult<Self> {
        Self::from_selection(selection.unwrap_or_default())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 生成所有从根到叶的选择路径
    ///
    /// 空树产生一个空选择，表示使用默认值。
    pub fn selections(&self) -> SelectResult<std::vec::IntoIter<Selection>> {
        self.selections_with(&[], &HashSet::new())
    }

    /// 在每条路径前加上 `prefix`，并去掉渲染结果出现在 `filter` 中的元素
    ///
    /// 过滤掉运算某一侧的全部元素会改变运算的含义（`"A - B"` 变成 `"-B"`），
    /// 此时返回 `IncorrectUsage`。
    pub fn selections_with(
        &self,
        prefix: &[Part],
        filter: &HashSet<String>,
    ) -> SelectResult<std::vec::IntoIter<Selection>> {
        let prefix = prefix.to_vec();
        let mut out = Vec::new();
        if self.nodes.is_empty() {
            out.push(prefix);
        } else {
            for node in &self.nodes {
                node.collect_selections(&prefix, filter, &mut out)?;
            }
        }
        Ok(out.into_iter())
    }

    /// 以 Mermaid 流程图可视化选择树
    pub fn to_mermaid(&self) -> String {
        let mut lines = vec!["graph LR".to_string()];
        let mut counter = 0;
        for node in &self.nodes {
            node.mermaid_lines(None, &mut counter, &mut lines);
        }
        lines.join("\n")
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<String> = self
            .nodes
            .iter()
            .map(|node| node.to_selection_string())
            .collect();
        write!(f, "{}", nodes.join(", "))
    }
}

/// 将选择转换回可重新生成同一棵树的字符串
pub fn selections_to_string(selections: &[Selection]) -> String {
    selections
        .iter()
        .map(|selection| selection_to_string(selection))
        .collect::<Vec<_>>()
        .join(", ")
}

/// 单个选择的字符串形式，例如 `[A, x]` -> `A(x)`
pub fn selection_to_string(selection: &[Part]) -> String {
    let parts: Vec<String> = selection.iter().map(|part| part.to_string()).collect();
    let closing = ")".repeat(parts.len().saturating_sub(1));
    format!("{}{}", parts.join("("), closing)
}

/// 选择中是否包含某个键（包括分组和运算内部）
pub fn contains(selection: &[Part], choice: &str, ignore_case: bool) -> bool {
    let equal = |element: &str| {
        if ignore_case {
            element.to_lowercase() == choice.to_lowercase()
        } else {
            element == choice
        }
    };
    selection.iter().any(|part| match part {
        Part::Key(key) => equal(key),
        Part::Group(group) => group.elements.iter().any(|element| equal(element)),
        Part::Operation(operation) => {
            contains(&operation.left, choice, ignore_case)
                || contains(&operation.right, choice, ignore_case)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(selection: &Selection) -> Vec<String> {
        selection.iter().map(|part| part.to_string()).collect()
    }

    fn paths(selection: &str) -> Vec<Vec<String>> {
        Tree::from_selection(selection)
            .unwrap()
            .selections()
            .unwrap()
            .map(|s| keys(&s))
            .collect()
    }

    #[test]
    fn test_empty_selection_is_default() {
        for tree in [
            Tree::from_selection("").unwrap(),
            Tree::from_optional(None).unwrap(),
            Tree::default(),
        ] {
            assert!(tree.nodes().is_empty());
            let selections: Vec<Selection> = tree.selections().unwrap().collect();
            assert_eq!(selections, vec![Vec::<Part>::new()]);
        }
    }

    #[test]
    fn test_flat_tokens_in_source_order() {
        assert_eq!(
            paths("Sr Ti,O ,  Zr"),
            vec![vec!["Sr"], vec!["Ti"], vec!["O"], vec!["Zr"]]
        );
    }

    #[test]
    fn test_round_trip_of_top_level_nodes() {
        for (source, separator) in [("Sr, Ti, O", ", "), ("a b c", " "), ("1:3 A~B", " ")] {
            let tree = Tree::from_selection(source).unwrap();
            let rendered: Vec<String> = tree.nodes().iter().map(|n| n.to_string()).collect();
            assert_eq!(rendered.join(separator), source);
        }
    }

    #[test]
    fn test_nested_selection() {
        assert_eq!(paths("Sr(x)"), vec![vec!["Sr", "x"]]);
        assert_eq!(
            paths("Sr(x, y) Ti(z)"),
            vec![vec!["Sr", "x"], vec!["Sr", "y"], vec!["Ti", "z"]]
        );
    }

    #[test]
    fn test_unbounded_nesting_depth() {
        let tree = Tree::from_selection("a(b(c(d)))").unwrap();
        let mut node = &tree.nodes()[0];
        for expected in ["a", "b", "c"] {
            assert_eq!(node.to_string(), expected);
            assert_eq!(node.nodes().len(), 1);
            node = &node.nodes()[0];
        }
        assert_eq!(node.to_string(), "d");
        assert!(node.nodes().is_empty());
        assert_eq!(paths("a(b(c(d)))"), vec![vec!["a", "b", "c", "d"]]);
    }

    #[test]
    fn test_groups_are_parts() {
        let selections: Vec<Selection> = Tree::from_selection("1 : 3(x) foo~bar")
            .unwrap()
            .selections()
            .unwrap()
            .collect();
        let range = Group::new(vec!["1".into(), "3".into()], Separator::Range);
        let pair = Group::new(vec!["foo".into(), "bar".into()], Separator::Pair);
        assert_eq!(selections[0], vec![Part::Group(range), Part::from("x")]);
        assert_eq!(selections[1], vec![Part::Group(pair)]);
    }

    #[test]
    fn test_pair_order_and_label_matching() {
        let forward = Group::new(vec!["foo".into(), "bar".into()], Separator::Pair);
        let backward = forward.reversed();
        assert_ne!(forward, backward);
        assert_ne!(forward.to_string(), backward.to_string());
        assert!(forward.matches_label("bar~foo"));
        assert!(backward.matches_label("bar~foo"));

        let range = Group::new(vec!["1".into(), "3".into()], Separator::Range);
        assert!(range.matches_label("1:3"));
        assert!(!range.matches_label("3:1"));
    }

    #[test]
    fn test_operations() {
        let selections: Vec<Selection> = Tree::from_selection("Ti(d) - O(p)")
            .unwrap()
            .selections()
            .unwrap()
            .collect();
        assert_eq!(selections.len(), 1);
        let Part::Operation(operation) = &selections[0][0] else {
            panic!("expected an operation");
        };
        assert_eq!(operation.left, vec![Part::from("Ti"), Part::from("d")]);
        assert_eq!(operation.operator, Operator::Subtract);
        assert_eq!(operation.right, vec![Part::from("O"), Part::from("p")]);
        assert_eq!(operation.to_string(), "Ti(d) - O(p)");
    }

    #[test]
    fn test_operation_inside_nesting_and_unary() {
        let selections: Vec<Selection> = Tree::from_selection("A(x + y), -B")
            .unwrap()
            .selections()
            .unwrap()
            .collect();
        assert_eq!(selections.len(), 2);
        assert_eq!(selections[0][0], Part::from("A"));
        assert!(matches!(&selections[0][1], Part::Operation(op) if !op.is_unary()));
        assert!(matches!(&selections[1][0], Part::Operation(op) if op.is_unary()));
        assert_eq!(selections[1][0].to_string(), "-B");
    }

    #[test]
    fn test_operations_chain_left_to_right() {
        let tree = Tree::from_selection("A + B - C").unwrap();
        assert_eq!(tree.nodes().len(), 1);
        let root = &tree.nodes()[0];
        assert_eq!(root.content(), &Content::Operator(Operator::Subtract));
        assert_eq!(
            root.nodes()[0].content(),
            &Content::Operator(Operator::Add)
        );
        assert_eq!(tree.to_string(), "A + B - C");
    }

    #[test]
    fn test_operation_expands_operand_lists() {
        let selections: Vec<Selection> = Tree::from_selection("A(x, y) + B")
            .unwrap()
            .selections()
            .unwrap()
            .collect();
        assert_eq!(selections.len(), 2);
        assert_eq!(selections[1][0].to_string(), "A(y) + B");
    }

    #[test]
    fn test_selections_with_prefix_and_filter() {
        let tree = Tree::from_selection("Sr(up) Ti").unwrap();
        let filter: HashSet<String> = ["up".to_string()].into_iter().collect();
        let selections: Vec<Vec<String>> = tree
            .selections_with(&[Part::from("total")], &filter)
            .unwrap()
            .map(|s| keys(&s))
            .collect();
        assert_eq!(selections, vec![vec!["total", "Sr"], vec!["total", "Ti"]]);
    }

    #[test]
    fn test_selections_are_restartable() {
        let tree = Tree::from_selection("a(b c) d").unwrap();
        let first: Vec<Selection> = tree.selections().unwrap().collect();
        let second: Vec<Selection> = tree.selections().unwrap().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_selections_to_string_reparses() {
        let tree = Tree::from_selection("A(x y), B").unwrap();
        let selections: Vec<Selection> = tree.selections().unwrap().collect();
        let text = selections_to_string(&selections);
        assert_eq!(text, "A(x), A(y), B");
        let again: Vec<Selection> = Tree::from_selection(&text).unwrap().selections().unwrap().collect();
        assert_eq!(again, selections);
    }

    #[test]
    fn test_contains() {
        let selections: Vec<Selection> = Tree::from_selection("Sr(Up) 1:3 A - B(down)")
            .unwrap()
            .selections()
            .unwrap()
            .collect();
        assert!(contains(&selections[0], "Up", false));
        assert!(!contains(&selections[0], "up", false));
        assert!(contains(&selections[0], "up", true));
        assert!(contains(&selections[1], "3", false));
        assert!(contains(&selections[2], "down", false));
    }

    #[test]
    fn test_to_mermaid() {
        let tree = Tree::from_selection("Sr(x), Ti, A + B").unwrap();
        assert_eq!(
            tree.to_mermaid(),
            "graph LR\n    Sr --> x\n    Ti\n    _0_[+] --> A\n    _0_[+] --> B"
        );
    }

    #[test]
    fn test_filter_cannot_remove_an_operand() {
        let filter: HashSet<String> = ["up".to_string()].into_iter().collect();
        let err = Tree::from_selection("up - down")
            .unwrap()
            .selections_with(&[], &filter)
            .unwrap_err();
        assert!(matches!(err, SelectionError::IncorrectUsage(_)));
        assert!(err.to_string().contains("operand"));

        let kept: Vec<Vec<String>> = Tree::from_selection("A(up) - B")
            .unwrap()
            .selections_with(&[], &filter)
            .unwrap()
            .map(|s| keys(&s))
            .collect();
        assert_eq!(kept, vec![vec!["A - B"]]);
    }
}
