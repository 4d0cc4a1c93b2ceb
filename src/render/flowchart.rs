//! Mermaid流程图子集的解析：graph/flowchart头、节点形状、连线、链式与`&`分组、subgraph

use std::collections::HashMap;

use crate::error::RenderFailure;

/// 布局方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TopDown,
    BottomUp,
    LeftRight,
    RightLeft,
}

impl Direction {
    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "TD" | "TB" => Some(Direction::TopDown),
            "BT" => Some(Direction::BottomUp),
            "LR" => Some(Direction::LeftRight),
            "RL" => Some(Direction::RightLeft),
            _ => None,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Direction::LeftRight | Direction::RightLeft)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    Rect,
    Round,
    Stadium,
    Subroutine,
    Cylinder,
    Circle,
    Asymmetric,
    Diamond,
    Hexagon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dotted,
    Thick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowHead {
    None,
    Arrow,
    Circle,
    Cross,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub style: LineStyle,
    pub head: ArrowHead,
    pub tail: ArrowHead,
}

/// subgraph只作为分组框，不影响分层
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub title: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flowchart {
    pub direction: Direction,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub groups: Vec<Group>,
}

/// 忽略的样式/交互语句
const IGNORED_KEYWORDS: [&str; 6] = ["classDef", "class", "style", "linkStyle", "click", "direction"];

/// 解析流程图；失败时返回带行号的RenderFailure
pub fn parse_flowchart(source: &str) -> Result<Flowchart, RenderFailure> {
    let statements = split_statements(source);
    let Some((header_line, header)) = statements.first() else {
        return Err(RenderFailure::new(source, "Diagram source is empty"));
    };

    let mut words = header.split_whitespace();
    let keyword = words.next().unwrap_or_default();
    if keyword != "graph" && keyword != "flowchart" {
        return Err(RenderFailure::at_line(
            source,
            *header_line,
            format!(
                "unsupported diagram type `{}`, only flowcharts (`graph` / `flowchart`) can be rendered",
                keyword
            ),
        ));
    }

    let mut builder = Builder::default();
    let mut direction = Direction::TopDown;
    let mut rest: Vec<(usize, String)> = Vec::new();
    if let Some(token) = words.next() {
        match Direction::parse(token) {
            Some(parsed) => direction = parsed,
            None => {
                // 头部后直接跟语句的写法
                let remainder = header[header.find(token).unwrap_or(0)..].to_string();
                rest.push((*header_line, remainder));
            }
        }
        let tail: Vec<&str> = words.collect();
        if !tail.is_empty() && rest.is_empty() {
            rest.push((*header_line, tail.join(" ")));
        }
    }
    rest.extend(statements.iter().skip(1).cloned());

    let mut open_groups: Vec<(usize, Group)> = Vec::new();
    for (line, statement) in rest {
        let first_word = statement.split_whitespace().next().unwrap_or_default();

        if IGNORED_KEYWORDS.contains(&first_word) {
            continue;
        }
        if first_word == "subgraph" {
            let title = statement["subgraph".len()..].trim();
            open_groups.push((line, Group { title: group_title(title), members: Vec::new() }));
            continue;
        }
        if statement == "end" {
            match open_groups.pop() {
                Some((_, group)) => {
                    if let Some((_, parent)) = open_groups.last_mut() {
                        for member in &group.members {
                            if !parent.members.contains(member) {
                                parent.members.push(member.clone());
                            }
                        }
                    }
                    builder.groups.push(group);
                }
                None => {
                    return Err(RenderFailure::at_line(
                        source,
                        line,
                        "`end` without a matching `subgraph`",
                    ));
                }
            }
            continue;
        }

        let touched = ChainParser::new(&statement)
            .parse(&mut builder)
            .map_err(|message| RenderFailure::at_line(source, line, message))?;
        if let Some((_, group)) = open_groups.last_mut() {
            for id in touched {
                if !group.members.contains(&id) {
                    group.members.push(id);
                }
            }
        }
    }

    if let Some((line, group)) = open_groups.pop() {
        return Err(RenderFailure::at_line(
            source,
            line,
            format!("subgraph `{}` is never closed", group.title),
        ));
    }

    Ok(Flowchart {
        direction,
        nodes: builder.nodes,
        edges: builder.edges,
        groups: builder.groups,
    })
}

/// 按行和分号切分语句，保留原始行号；跳过代码块围栏和`%%`注释，引号和括号内的分号不切分
fn split_statements(source: &str) -> Vec<(usize, String)> {
    let mut statements = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.starts_with("```") || line.starts_with("%%") || line.is_empty() {
            continue;
        }

        let mut current = String::new();
        let mut depth = 0i32;
        let mut quoted = false;
        for c in line.chars() {
            match c {
                '"' => quoted = !quoted,
                '[' | '(' | '{' if !quoted => depth += 1,
                ']' | ')' | '}' if !quoted => depth -= 1,
                ';' if !quoted && depth <= 0 => {
                    push_statement(&mut statements, index + 1, &current);
                    current.clear();
                    continue;
                }
                _ => {}
            }
            current.push(c);
        }
        push_statement(&mut statements, index + 1, &current);
    }
    statements
}

fn push_statement(statements: &mut Vec<(usize, String)>, line: usize, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        statements.push((line, text.to_string()));
    }
}

/// `subgraph id [title]` 或 `subgraph title`
fn group_title(text: &str) -> String {
    match (text.find('['), text.rfind(']')) {
        (Some(open), Some(close)) if open < close => unquote(text[open + 1..close].trim()),
        _ => unquote(text),
    }
}

fn unquote(text: &str) -> String {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
        .to_string()
}

#[derive(Default)]
struct Builder {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    groups: Vec<Group>,
}

impl Builder {
    /// 首次出现时登记；带形状的再次出现会覆盖标签和形状
    fn upsert(&mut self, id: &str, decl: Option<(String, NodeShape)>) {
        match (self.index.get(id), decl) {
            (Some(&idx), Some((label, shape))) => {
                self.nodes[idx].label = label;
                self.nodes[idx].shape = shape;
            }
            (Some(_), None) => {}
            (None, decl) => {
                let (label, shape) = decl.unwrap_or_else(|| (id.to_string(), NodeShape::Rect));
                self.index.insert(id.to_string(), self.nodes.len());
                self.nodes.push(Node { id: id.to_string(), label, shape });
            }
        }
    }
}

struct Link {
    style: LineStyle,
    head: ArrowHead,
    tail: ArrowHead,
    label: Option<String>,
}

/// 单条语句的游标解析：`group (link group)*`，group为`node (& node)*`
struct ChainParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> ChainParser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn near(&self) -> String {
        self.rest().chars().take(24).collect()
    }

    /// 返回本语句涉及的节点id
    fn parse(mut self, builder: &mut Builder) -> Result<Vec<String>, String> {
        let mut touched = Vec::new();
        let mut previous = self.parse_group(builder)?;
        touched.extend(previous.iter().cloned());

        loop {
            self.skip_ws();
            if self.rest().is_empty() {
                return Ok(touched);
            }
            let link = self.parse_link()?;
            self.skip_ws();
            if self.rest().is_empty() {
                return Err("link without a target node".to_string());
            }
            let current = self.parse_group(builder)?;
            for from in &previous {
                for to in &current {
                    builder.edges.push(Edge {
                        from: from.clone(),
                        to: to.clone(),
                        label: link.label.clone(),
                        style: link.style,
                        head: link.head,
                        tail: link.tail,
                    });
                }
            }
            touched.extend(current.iter().cloned());
            previous = current;
        }
    }

    fn parse_group(&mut self, builder: &mut Builder) -> Result<Vec<String>, String> {
        let mut ids = vec![self.parse_node(builder)?];
        loop {
            self.skip_ws();
            if !self.eat("&") {
                return Ok(ids);
            }
            self.skip_ws();
            ids.push(self.parse_node(builder)?);
        }
    }

    fn parse_node(&mut self, builder: &mut Builder) -> Result<String, String> {
        self.skip_ws();
        let id_len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.rest().len());
        if id_len == 0 {
            return Err(format!("expected a node id near `{}`", self.near()));
        }
        let id = self.rest()[..id_len].to_string();
        self.pos += id_len;

        let decl = self.parse_shape()?;
        self.skip_class_suffix();
        builder.upsert(&id, decl);
        Ok(id)
    }

    fn parse_shape(&mut self) -> Result<Option<(String, NodeShape)>, String> {
        // 长的开符号在前
        const SHAPES: [(&str, &str, NodeShape); 9] = [
            ("([", "])", NodeShape::Stadium),
            ("((", "))", NodeShape::Circle),
            ("[[", "]]", NodeShape::Subroutine),
            ("[(", ")]", NodeShape::Cylinder),
            ("{{", "}}", NodeShape::Hexagon),
            ("(", ")", NodeShape::Round),
            ("[", "]", NodeShape::Rect),
            ("{", "}", NodeShape::Diamond),
            (">", "]", NodeShape::Asymmetric),
        ];

        for (open, close, shape) in SHAPES {
            if !self.eat(open) {
                continue;
            }
            let label = if self.rest().starts_with('"') {
                let body = &self.rest()[1..];
                let end = body
                    .find('"')
                    .ok_or_else(|| format!("unterminated quoted label near `{}`", self.near()))?;
                let label = body[..end].to_string();
                self.pos += end + 2;
                self.skip_ws();
                if !self.eat(close) {
                    return Err(format!("expected `{}` after quoted label near `{}`", close, self.near()));
                }
                label
            } else {
                let end = self
                    .rest()
                    .find(close)
                    .ok_or_else(|| format!("expected `{}` to close node shape near `{}`", close, self.near()))?;
                let label = self.rest()[..end].trim().to_string();
                self.pos += end + close.len();
                label
            };
            return Ok(Some((label, shape)));
        }
        Ok(None)
    }

    fn skip_class_suffix(&mut self) {
        if self.eat(":::") {
            let len = self
                .rest()
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
                .unwrap_or(self.rest().len());
            self.pos += len;
        }
    }

    fn parse_link(&mut self) -> Result<Link, String> {
        let run = self.take_link_run();
        if run.is_empty() {
            return Err(format!("expected a link near `{}`", self.near()));
        }

        // `A -- text --> B` 形式的内联标签
        let mut inline_label = None;
        let opens_label = matches!(run.as_str(), "--" | "==" | "-." | "<--" | "<==" | "<-.");
        let run = if opens_label {
            let closer = if run.ends_with('.') { ".-" } else { &run[run.len() - 2..] };
            let end = self
                .rest()
                .find(closer)
                .ok_or_else(|| format!("unterminated link label near `{}`", self.near()))?;
            inline_label = Some(self.rest()[..end].trim().to_string());
            self.pos += end;
            let closing = self.take_link_run();
            if run.ends_with('.') {
                let prefix = run.trim_end_matches(['-', '.']);
                format!("{}-.{}", prefix, closing.trim_start_matches('.'))
            } else {
                format!("{}{}", run, closing)
            }
        } else {
            run
        };

        let mut link = classify_link(&run)
            .ok_or_else(|| format!("malformed link `{}`", run))?;
        link.label = inline_label;

        self.skip_ws();
        if self.eat("|") {
            let end = self
                .rest()
                .find('|')
                .ok_or_else(|| format!("unterminated edge label near `{}`", self.near()))?;
            let label = unquote(self.rest()[..end].trim());
            self.pos += end + 1;
            link.label = Some(label);
        }
        Ok(link)
    }

    /// 读取连续的连线字符；紧跟在`-`或`=`之后的o/x视为箭头
    fn take_link_run(&mut self) -> String {
        let rest = self.rest();
        let mut end = 0;
        let mut chars = rest.char_indices().peekable();

        if let Some((_, '<')) = chars.peek() {
            chars.next();
            end = 1;
        }
        while let Some(&(idx, c)) = chars.peek() {
            match c {
                '-' | '=' | '.' | '>' => {
                    chars.next();
                    end = idx + 1;
                    if c == '>' {
                        break;
                    }
                }
                // 与Mermaid词法一致取最长匹配：`--oB`是圆点连线指向B
                'o' | 'x' if end > 1 && rest[..end].ends_with(['-', '=']) => {
                    end = idx + 1;
                    break;
                }
                _ => break,
            }
        }

        // 只有`<`不是连线
        if end <= 1 && rest.starts_with('<') {
            return String::new();
        }
        let run = rest[..end].to_string();
        self.pos += end;
        run
    }
}

fn classify_link(run: &str) -> Option<Link> {
    let (tail, body) = match run.strip_prefix('<') {
        Some(body) => (ArrowHead::Arrow, body),
        None => (ArrowHead::None, run),
    };
    let (head, body) = match body.chars().last()? {
        '>' => (ArrowHead::Arrow, &body[..body.len() - 1]),
        'o' => (ArrowHead::Circle, &body[..body.len() - 1]),
        'x' => (ArrowHead::Cross, &body[..body.len() - 1]),
        _ => (ArrowHead::None, body),
    };
    if tail == ArrowHead::Arrow && head == ArrowHead::None {
        return None;
    }

    let has_head = head != ArrowHead::None;
    let style = if body.contains('.') {
        let dots = body.trim_start_matches('-').trim_end_matches('-');
        let valid = body.starts_with('-') && !dots.is_empty() && dots.chars().all(|c| c == '.');
        valid.then_some(LineStyle::Dotted)?
    } else if body.chars().all(|c| c == '=') {
        (body.len() >= 3 || (has_head && body.len() >= 2)).then_some(LineStyle::Thick)?
    } else if body.chars().all(|c| c == '-') {
        (body.len() >= 3 || (has_head && body.len() >= 2)).then_some(LineStyle::Solid)?
    } else {
        return None;
    };

    Some(Link { style, head, tail, label: None })
}
