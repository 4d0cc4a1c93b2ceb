//! 图表渲染适配器：图表源码 -> SVG矢量图或结构化的渲染失败
//!
//! 渲染是纯函数：不读写文件、不访问网络、不修改会话状态。
//! 同一目标、同一源码的两次渲染得到完全相同的结果。

use serde::{Deserialize, Serialize};

use crate::config::RenderConfig;
use crate::error::RenderFailure;

pub mod flowchart;
pub mod svg;

/// 图表主题
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagramTheme {
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "dark")]
    #[default]
    Dark,
    #[serde(rename = "neutral")]
    Neutral,
    #[serde(rename = "forest")]
    Forest,
}

impl std::fmt::Display for DiagramTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagramTheme::Default => write!(f, "default"),
            DiagramTheme::Dark => write!(f, "dark"),
            DiagramTheme::Neutral => write!(f, "neutral"),
            DiagramTheme::Forest => write!(f, "forest"),
        }
    }
}

impl std::str::FromStr for DiagramTheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" | "light" => Ok(DiagramTheme::Default),
            "dark" => Ok(DiagramTheme::Dark),
            "neutral" => Ok(DiagramTheme::Neutral),
            "forest" => Ok(DiagramTheme::Forest),
            _ => Err(format!("Unknown diagram theme: {}", s)),
        }
    }
}

/// 主题配色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub node_fill: &'static str,
    pub node_stroke: &'static str,
    pub text: &'static str,
    pub edge: &'static str,
    pub label_background: &'static str,
    pub group_fill: &'static str,
    pub group_stroke: &'static str,
    pub error: &'static str,
}

impl DiagramTheme {
    pub fn palette(&self) -> Palette {
        match self {
            DiagramTheme::Default => Palette {
                background: "#ffffff",
                node_fill: "#ececff",
                node_stroke: "#9370db",
                text: "#333333",
                edge: "#333333",
                label_background: "#e8e8e8",
                group_fill: "#ffffde",
                group_stroke: "#aaaa33",
                error: "#c62828",
            },
            DiagramTheme::Dark => Palette {
                background: "#1e1e2e",
                node_fill: "#313244",
                node_stroke: "#89b4fa",
                text: "#cdd6f4",
                edge: "#a6adc8",
                label_background: "#45475a",
                group_fill: "#181825",
                group_stroke: "#585b70",
                error: "#f38ba8",
            },
            DiagramTheme::Neutral => Palette {
                background: "#ffffff",
                node_fill: "#eeeeee",
                node_stroke: "#999999",
                text: "#333333",
                edge: "#666666",
                label_background: "#ffffff",
                group_fill: "#f4f4f4",
                group_stroke: "#bbbbbb",
                error: "#b00020",
            },
            DiagramTheme::Forest => Palette {
                background: "#ffffff",
                node_fill: "#cde498",
                node_stroke: "#13540c",
                text: "#333333",
                edge: "#008000",
                label_background: "#e8e8e8",
                group_fill: "#cdffb2",
                group_stroke: "#6eaa49",
                error: "#b71c1c",
            },
        }
    }
}

/// 渲染目标：每个实例持有唯一的内部id，并发渲染互不冲突
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    id: String,
}

impl RenderTarget {
    pub fn new() -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        Self {
            id: format!("mermaid-diagram-{}", &uuid[..9]),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Default for RenderTarget {
    fn default() -> Self {
        Self::new()
    }
}

/// 渲染产物：一份完整的SVG文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub target_id: String,
    pub svg: String,
}

impl RenderedArtifact {
    /// 渲染失败时代替图表展示的内容：错误信息与出错源码
    pub fn failure_page(target: &RenderTarget, failure: &RenderFailure, theme: DiagramTheme) -> Self {
        Self {
            target_id: target.id().to_string(),
            svg: svg::draw_failure(target.id(), failure, &theme.palette()),
        }
    }
}

/// 渲染能力边界
pub trait DiagramRenderer: Send + Sync {
    fn render(&self, target: &RenderTarget, source: &str) -> Result<RenderedArtifact, RenderFailure>;
}

/// Mermaid流程图子集的SVG渲染器
#[derive(Debug, Clone, Default)]
pub struct MermaidSvgRenderer {
    config: RenderConfig,
}

impl MermaidSvgRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn theme(&self) -> DiagramTheme {
        self.config.theme
    }
}

impl DiagramRenderer for MermaidSvgRenderer {
    fn render(&self, target: &RenderTarget, source: &str) -> Result<RenderedArtifact, RenderFailure> {
        let chart = flowchart::parse_flowchart(source).inspect_err(|failure| {
            tracing::warn!(target_id = %target.id(), "diagram render failed: {}", failure.message);
        })?;

        tracing::debug!(
            target_id = %target.id(),
            nodes = chart.nodes.len(),
            edges = chart.edges.len(),
            "diagram rendered"
        );

        Ok(RenderedArtifact {
            target_id: target.id().to_string(),
            svg: svg::draw(target.id(), &chart, &self.config),
        })
    }
}

#[cfg(test)]
mod tests;
