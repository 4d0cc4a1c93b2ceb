//! 分层布局与SVG输出；输出只取决于输入，便于比较和缓存

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::config::RenderConfig;
use crate::error::RenderFailure;
use crate::render::Palette;
use crate::render::flowchart::{ArrowHead, Direction, Flowchart, LineStyle, Node, NodeShape};

const MARGIN: f64 = 40.0;
const LINE_HEIGHT: f64 = 18.0;
const CHAR_WIDTH: f64 = 7.5;
const GROUP_PADDING: f64 = 14.0;
const GROUP_TITLE_HEIGHT: f64 = 20.0;
const FONT_FAMILY: &str = "trebuchet ms, verdana, arial, sans-serif";

/// 节点的中心坐标与尺寸
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placed {
    cx: f64,
    cy: f64,
    w: f64,
    h: f64,
}

impl Placed {
    fn left(&self) -> f64 {
        self.cx - self.w / 2.0
    }
    fn right(&self) -> f64 {
        self.cx + self.w / 2.0
    }
    fn top(&self) -> f64 {
        self.cy - self.h / 2.0
    }
    fn bottom(&self) -> f64 {
        self.cy + self.h / 2.0
    }

    /// 从中心指向(tx, ty)的射线与外框的交点
    fn boundary_towards(&self, tx: f64, ty: f64) -> (f64, f64) {
        let dx = tx - self.cx;
        let dy = ty - self.cy;
        if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
            return (self.cx, self.cy);
        }
        let sx = if dx.abs() < f64::EPSILON { f64::INFINITY } else { self.w / 2.0 / dx.abs() };
        let sy = if dy.abs() < f64::EPSILON { f64::INFINITY } else { self.h / 2.0 / dy.abs() };
        let t = sx.min(sy);
        (self.cx + dx * t, self.cy + dy * t)
    }
}

struct Layout {
    width: f64,
    height: f64,
    placed: Vec<Placed>,
}

/// 标签按`<br>`换行
fn label_lines(label: &str) -> Vec<String> {
    let mut normalized = label.to_string();
    for br in ["<br/>", "<br />", "<BR>", "<BR/>"] {
        normalized = normalized.replace(br, "<br>");
    }
    normalized.split("<br>").map(|l| l.trim().to_string()).collect()
}

fn text_width(lines: &[String]) -> f64 {
    lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0) as f64
        * CHAR_WIDTH
}

fn node_size(node: &Node) -> (f64, f64) {
    let lines = label_lines(&node.label);
    let w = (text_width(&lines) + 32.0).max(60.0);
    let h = lines.len() as f64 * LINE_HEIGHT + 24.0;
    match node.shape {
        NodeShape::Circle => {
            let d = w.max(h);
            (d, d)
        }
        NodeShape::Diamond => (w * 1.4, h * 1.4),
        NodeShape::Hexagon => (w + 24.0, h),
        NodeShape::Cylinder => (w, h + 16.0),
        NodeShape::Asymmetric => (w + 12.0, h),
        _ => (w, h),
    }
}

/// 按声明顺序逐个放置节点：已放置前驱的最大层级+1；指向已放置节点的边视为回边
fn assign_ranks(chart: &Flowchart, index: &HashMap<&str, usize>) -> Vec<usize> {
    let n = chart.nodes.len();
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for edge in &chart.edges {
        if let (Some(&from), Some(&to)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str())) {
            if from != to {
                predecessors[to].push(from);
            }
        }
    }

    let mut rank = vec![0usize; n];
    let mut placed = vec![false; n];
    for _ in 0..n {
        // 优先取所有前驱都已放置的节点；都不满足时取声明最早的节点打断环
        let next = (0..n)
            .find(|&v| !placed[v] && predecessors[v].iter().all(|&p| placed[p]))
            .or_else(|| (0..n).find(|&v| !placed[v]));
        let Some(v) = next else { break };

        rank[v] = predecessors[v]
            .iter()
            .filter(|&&p| placed[p])
            .map(|&p| rank[p] + 1)
            .max()
            .unwrap_or(0);
        placed[v] = true;
    }
    rank
}

/// 每层内的顺序：先按声明顺序，再按上一层前驱的平均位置排序一遍
fn order_ranks(chart: &Flowchart, index: &HashMap<&str, usize>, rank: &[usize]) -> Vec<Vec<usize>> {
    let depth = rank.iter().copied().max().map_or(0, |r| r + 1);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); depth];
    for (v, &r) in rank.iter().enumerate() {
        layers[r].push(v);
    }

    for r in 1..depth {
        let position: HashMap<usize, usize> = layers[r - 1]
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, i))
            .collect();

        let keys: HashMap<usize, f64> = layers[r]
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let upstream: Vec<f64> = chart
                    .edges
                    .iter()
                    .filter(|e| index.get(e.to.as_str()) == Some(&v))
                    .filter_map(|e| index.get(e.from.as_str()))
                    .filter_map(|u| position.get(u))
                    .map(|&p| p as f64)
                    .collect();
                let key = if upstream.is_empty() {
                    i as f64
                } else {
                    upstream.iter().sum::<f64>() / upstream.len() as f64
                };
                (v, key)
            })
            .collect();

        layers[r].sort_by(|a, b| keys[a].total_cmp(&keys[b]));
    }
    layers
}

fn layout(chart: &Flowchart, config: &RenderConfig) -> Layout {
    let index: HashMap<&str, usize> = chart
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id.as_str(), i))
        .collect();
    let sizes: Vec<(f64, f64)> = chart.nodes.iter().map(node_size).collect();
    let rank = assign_ranks(chart, &index);
    let layers = order_ranks(chart, &index, &rank);

    let horizontal = chart.direction.is_horizontal();
    // (沿层级方向的尺寸, 层内方向的尺寸)
    let dims = |v: usize| {
        let (w, h) = sizes[v];
        if horizontal { (w, h) } else { (h, w) }
    };
    let node_spacing = f64::from(config.node_spacing);
    let rank_spacing = f64::from(config.rank_spacing);

    let extents: Vec<f64> = layers
        .iter()
        .map(|layer| {
            let total: f64 = layer.iter().map(|&v| dims(v).1).sum();
            total + node_spacing * layer.len().saturating_sub(1) as f64
        })
        .collect();
    let max_cross = extents.iter().copied().fold(0.0, f64::max);

    let mut main_of = vec![0.0; chart.nodes.len()];
    let mut cross_of = vec![0.0; chart.nodes.len()];
    let mut cursor = MARGIN;
    for (layer, extent) in layers.iter().zip(&extents) {
        let thickness = layer.iter().map(|&v| dims(v).0).fold(0.0, f64::max);
        let mut start = MARGIN + (max_cross - extent) / 2.0;
        for &v in layer {
            let (_, cross) = dims(v);
            main_of[v] = cursor + thickness / 2.0;
            cross_of[v] = start + cross / 2.0;
            start += cross + node_spacing;
        }
        cursor += thickness + rank_spacing;
    }
    let total_main = if layers.is_empty() {
        2.0 * MARGIN
    } else {
        cursor - rank_spacing + MARGIN
    };
    let total_cross = max_cross + 2.0 * MARGIN;

    let reversed = matches!(chart.direction, Direction::BottomUp | Direction::RightLeft);
    let placed = (0..chart.nodes.len())
        .map(|v| {
            let main = if reversed { total_main - main_of[v] } else { main_of[v] };
            let (w, h) = sizes[v];
            if horizontal {
                Placed { cx: main, cy: cross_of[v], w, h }
            } else {
                Placed { cx: cross_of[v], cy: main, w, h }
            }
        })
        .collect();

    let (width, height) = if horizontal {
        (total_main, total_cross)
    } else {
        (total_cross, total_main)
    };
    Layout { width, height, placed }
}

fn num(v: f64) -> String {
    format!("{:.1}", v)
}

pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn write_text(out: &mut String, lines: &[String], cx: f64, cy: f64, fill: &str) {
    let first = cy - (lines.len().saturating_sub(1)) as f64 * LINE_HEIGHT / 2.0;
    let _ = write!(
        out,
        r#"<text x="{}" y="{}" fill="{}" text-anchor="middle" dominant-baseline="central">"#,
        num(cx),
        num(first),
        fill
    );
    for (i, line) in lines.iter().enumerate() {
        let _ = write!(
            out,
            r#"<tspan x="{}" y="{}">{}</tspan>"#,
            num(cx),
            num(first + i as f64 * LINE_HEIGHT),
            escape(line)
        );
    }
    out.push_str("</text>");
}

fn write_shape(out: &mut String, shape: NodeShape, p: &Placed, palette: &Palette) {
    let style = format!(
        r#"fill="{}" stroke="{}" stroke-width="1.5""#,
        palette.node_fill, palette.node_stroke
    );
    let (x0, y0, x1, y1) = (p.left(), p.top(), p.right(), p.bottom());
    let polygon = |points: &[(f64, f64)]| {
        let points: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{},{}", num(*x), num(*y)))
            .collect();
        format!(r#"<polygon points="{}" {}/>"#, points.join(" "), style)
    };
    let rect = |rx: f64| {
        format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" {}/>"#,
            num(x0),
            num(y0),
            num(p.w),
            num(p.h),
            num(rx),
            style
        )
    };

    let markup = match shape {
        NodeShape::Rect => rect(2.0),
        NodeShape::Round => rect(10.0),
        NodeShape::Stadium => rect(p.h / 2.0),
        NodeShape::Subroutine => format!(
            r#"{}<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}"/><line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}"/>"#,
            rect(0.0),
            num(x0 + 8.0),
            num(y0),
            num(x0 + 8.0),
            num(y1),
            palette.node_stroke,
            num(x1 - 8.0),
            num(y0),
            num(x1 - 8.0),
            num(y1),
            palette.node_stroke
        ),
        NodeShape::Cylinder => {
            let ry = 8.0;
            let rx = p.w / 2.0;
            format!(
                r#"<path d="M{x0},{top} A{rx},{ry} 0 0 0 {x1},{top} A{rx},{ry} 0 0 0 {x0},{top} L{x0},{bottom} A{rx},{ry} 0 0 0 {x1},{bottom} L{x1},{top}" {style}/>"#,
                x0 = num(x0),
                x1 = num(x1),
                top = num(y0 + ry),
                bottom = num(y1 - ry),
                rx = num(rx),
                ry = num(ry),
                style = style
            )
        }
        NodeShape::Circle => format!(
            r#"<circle cx="{}" cy="{}" r="{}" {}/>"#,
            num(p.cx),
            num(p.cy),
            num(p.w / 2.0),
            style
        ),
        NodeShape::Asymmetric => polygon(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0 + 12.0, p.cy)]),
        NodeShape::Diamond => polygon(&[(p.cx, y0), (x1, p.cy), (p.cx, y1), (x0, p.cy)]),
        NodeShape::Hexagon => polygon(&[
            (x0 + 12.0, y0),
            (x1 - 12.0, y0),
            (x1, p.cy),
            (x1 - 12.0, y1),
            (x0 + 12.0, y1),
            (x0, p.cy),
        ]),
    };
    out.push_str(&markup);
}

fn marker_ref(target_id: &str, head: ArrowHead) -> Option<String> {
    let name = match head {
        ArrowHead::None => return None,
        ArrowHead::Arrow => "arrow",
        ArrowHead::Circle => "circle",
        ArrowHead::Cross => "cross",
    };
    Some(format!("url(#{}-{})", target_id, name))
}

fn write_defs(out: &mut String, target_id: &str, palette: &Palette) {
    let _ = write!(
        out,
        concat!(
            "<defs>",
            r#"<marker id="{id}-arrow" viewBox="0 0 10 10" refX="9" refY="5" markerWidth="8" markerHeight="8" orient="auto-start-reverse"><path d="M0,0 L10,5 L0,10 z" fill="{c}"/></marker>"#,
            r#"<marker id="{id}-circle" viewBox="0 0 10 10" refX="5" refY="5" markerWidth="8" markerHeight="8" orient="auto"><circle cx="5" cy="5" r="4" fill="{c}"/></marker>"#,
            r#"<marker id="{id}-cross" viewBox="0 0 10 10" refX="5" refY="5" markerWidth="8" markerHeight="8" orient="auto"><path d="M1,1 L9,9 M9,1 L1,9" stroke="{c}" stroke-width="2"/></marker>"#,
            "</defs>"
        ),
        id = target_id,
        c = palette.edge
    );
}

/// 完整的SVG文档
pub fn draw(target_id: &str, chart: &Flowchart, config: &RenderConfig) -> String {
    let palette = config.theme.palette();
    let Layout { width, height, placed } = layout(chart, config);
    let index: HashMap<&str, usize> = chart
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id.as_str(), i))
        .collect();

    let mut out = String::new();
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" id="{}" width="{}" height="{}" viewBox="0 0 {} {}" role="img" font-family="{}" font-size="14">"#,
        target_id,
        num(width),
        num(height),
        num(width),
        num(height),
        FONT_FAMILY
    );
    write_defs(&mut out, target_id, &palette);
    let _ = write!(
        out,
        r#"<rect width="100%" height="100%" fill="{}"/>"#,
        palette.background
    );

    out.push_str(r#"<g class="groups">"#);
    for group in &chart.groups {
        let members: Vec<&Placed> = group
            .members
            .iter()
            .filter_map(|id| index.get(id.as_str()))
            .map(|&i| &placed[i])
            .collect();
        if members.is_empty() {
            continue;
        }
        let x0 = members.iter().map(|p| p.left()).fold(f64::INFINITY, f64::min) - GROUP_PADDING;
        let x1 = members.iter().map(|p| p.right()).fold(f64::NEG_INFINITY, f64::max) + GROUP_PADDING;
        let y0 = members.iter().map(|p| p.top()).fold(f64::INFINITY, f64::min)
            - GROUP_PADDING
            - GROUP_TITLE_HEIGHT;
        let y1 = members.iter().map(|p| p.bottom()).fold(f64::NEG_INFINITY, f64::max) + GROUP_PADDING;
        let _ = write!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="4" fill="{}" stroke="{}" stroke-dasharray="6 3"/><text x="{}" y="{}" fill="{}" font-size="12">{}</text>"#,
            num(x0),
            num(y0),
            num(x1 - x0),
            num(y1 - y0),
            palette.group_fill,
            palette.group_stroke,
            num(x0 + 8.0),
            num(y0 + 14.0),
            palette.text,
            escape(&group.title)
        );
    }
    out.push_str("</g>");

    let mut labels = String::new();
    out.push_str(r#"<g class="edges">"#);
    for edge in &chart.edges {
        let (Some(&from), Some(&to)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str()))
        else {
            continue;
        };
        let (a, b) = (&placed[from], &placed[to]);

        let (path, mid) = if from == to {
            let x = a.right();
            (
                format!(
                    "M{},{} C{},{} {},{} {},{}",
                    num(x),
                    num(a.cy - 6.0),
                    num(x + 36.0),
                    num(a.cy - 36.0),
                    num(x + 36.0),
                    num(a.cy + 36.0),
                    num(x),
                    num(a.cy + 6.0)
                ),
                (x + 30.0, a.cy),
            )
        } else {
            let (x1, y1) = a.boundary_towards(b.cx, b.cy);
            let (x2, y2) = b.boundary_towards(a.cx, a.cy);
            (
                format!("M{},{} L{},{}", num(x1), num(y1), num(x2), num(y2)),
                ((x1 + x2) / 2.0, (y1 + y2) / 2.0),
            )
        };

        let stroke = match edge.style {
            LineStyle::Solid => r#"stroke-width="1.5""#,
            LineStyle::Dotted => r#"stroke-width="1.5" stroke-dasharray="4 4""#,
            LineStyle::Thick => r#"stroke-width="3""#,
        };
        let _ = write!(
            out,
            r#"<path d="{}" fill="none" stroke="{}" {}"#,
            path, palette.edge, stroke
        );
        if let Some(marker) = marker_ref(target_id, edge.head) {
            let _ = write!(out, r#" marker-end="{}""#, marker);
        }
        if let Some(marker) = marker_ref(target_id, edge.tail) {
            let _ = write!(out, r#" marker-start="{}""#, marker);
        }
        out.push_str("/>");

        if let Some(label) = edge.label.as_deref().filter(|l| !l.is_empty()) {
            let lines = label_lines(label);
            let w = text_width(&lines) + 8.0;
            let h = lines.len() as f64 * LINE_HEIGHT;
            let _ = write!(
                labels,
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
                num(mid.0 - w / 2.0),
                num(mid.1 - h / 2.0),
                num(w),
                num(h),
                palette.label_background
            );
            write_text(&mut labels, &lines, mid.0, mid.1, palette.text);
        }
    }
    out.push_str("</g>");

    out.push_str(r#"<g class="nodes">"#);
    for (node, p) in chart.nodes.iter().zip(&placed) {
        let _ = write!(out, r#"<g class="node" data-id="{}">"#, escape(&node.id));
        write_shape(&mut out, node.shape, p, &palette);
        write_text(&mut out, &label_lines(&node.label), p.cx, p.cy, palette.text);
        out.push_str("</g>");
    }
    out.push_str("</g>");

    let _ = write!(out, r#"<g class="edge-labels">{}</g></svg>"#, labels);
    out
}

/// 失败页：错误信息加上逐行编号的源码，出错行高亮
pub fn draw_failure(target_id: &str, failure: &RenderFailure, palette: &Palette) -> String {
    let source_lines: Vec<&str> = failure.source_text.lines().collect();
    let heading = failure.to_string();
    let longest = source_lines
        .iter()
        .map(|l| l.chars().count() + 6)
        .chain(std::iter::once(heading.chars().count()))
        .max()
        .unwrap_or(0);

    let width = (longest as f64 * CHAR_WIDTH + 2.0 * MARGIN).max(320.0);
    let height = (source_lines.len() as f64 + 2.0) * LINE_HEIGHT + 2.0 * MARGIN;

    let mut out = String::new();
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" id="{}" width="{}" height="{}" viewBox="0 0 {} {}" role="img" font-family="monospace" font-size="13">"#,
        target_id,
        num(width),
        num(height),
        num(width),
        num(height)
    );
    let _ = write!(
        out,
        r#"<rect width="100%" height="100%" fill="{}"/><text x="{}" y="{}" fill="{}" font-weight="bold">{}</text>"#,
        palette.background,
        num(MARGIN),
        num(MARGIN),
        palette.error,
        escape(&heading)
    );

    for (i, line) in source_lines.iter().enumerate() {
        let number = i + 1;
        let fill = if failure.line == Some(number) { palette.error } else { palette.text };
        let _ = write!(
            out,
            r#"<text x="{}" y="{}" fill="{}" xml:space="preserve">{:>4}  {}</text>"#,
            num(MARGIN),
            num(MARGIN + (i as f64 + 2.0) * LINE_HEIGHT),
            fill,
            number,
            escape(line)
        );
    }
    out.push_str("</svg>");
    out
}
