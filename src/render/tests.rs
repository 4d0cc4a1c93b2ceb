#[cfg(test)]
mod tests {
    use crate::config::RenderConfig;
    use crate::render::flowchart::{ArrowHead, Direction, LineStyle, NodeShape, parse_flowchart};
    use crate::render::{DiagramRenderer, DiagramTheme, MermaidSvgRenderer, RenderTarget, RenderedArtifact};

    fn renderer() -> MermaidSvgRenderer {
        MermaidSvgRenderer::new(RenderConfig::default())
    }

    #[test]
    fn test_parse_semicolon_chain() {
        let chart = parse_flowchart("graph TD; LB-->Web-->App-->DB;").unwrap();

        assert_eq!(chart.direction, Direction::TopDown);
        let ids: Vec<&str> = chart.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["LB", "Web", "App", "DB"]);
        assert_eq!(chart.edges.len(), 3);
        assert_eq!(chart.edges[2].from, "App");
        assert_eq!(chart.edges[2].to, "DB");
        assert_eq!(chart.edges[0].head, ArrowHead::Arrow);
    }

    #[test]
    fn test_parse_shapes_and_labels() {
        let source = r#"flowchart LR
    U((User)) --> GW{{API Gateway}}
    GW --> S([Auth Service])
    GW --> DB[(Orders DB)]
    GW --> Q>Event Queue]
    GW --> D{Cache hit?}
    GW --> R["Reports (nightly)"]
    GW --> SUB[[Billing]]
    GW --> W(Worker)"#;
        let chart = parse_flowchart(source).unwrap();

        assert_eq!(chart.direction, Direction::LeftRight);
        let shape = |id: &str| chart.nodes.iter().find(|n| n.id == id).unwrap().shape;
        let label = |id: &str| chart.nodes.iter().find(|n| n.id == id).unwrap().label.clone();
        assert_eq!(shape("U"), NodeShape::Circle);
        assert_eq!(shape("GW"), NodeShape::Hexagon);
        assert_eq!(shape("S"), NodeShape::Stadium);
        assert_eq!(shape("DB"), NodeShape::Cylinder);
        assert_eq!(shape("Q"), NodeShape::Asymmetric);
        assert_eq!(shape("D"), NodeShape::Diamond);
        assert_eq!(shape("R"), NodeShape::Rect);
        assert_eq!(shape("SUB"), NodeShape::Subroutine);
        assert_eq!(shape("W"), NodeShape::Round);
        assert_eq!(label("R"), "Reports (nightly)");
        assert_eq!(label("DB"), "Orders DB");
    }

    #[test]
    fn test_parse_link_styles_and_labels() {
        let source = "graph TD
    A -.-> B
    B ==> C
    C --- D
    D -->|writes| E
    E -- reads from --> F
    F -. async .-> G
    G --o H
    H --x I
    I <--> J";
        let chart = parse_flowchart(source).unwrap();
        let edges = &chart.edges;

        assert_eq!(edges[0].style, LineStyle::Dotted);
        assert_eq!(edges[1].style, LineStyle::Thick);
        assert_eq!(edges[2].head, ArrowHead::None);
        assert_eq!(edges[3].label.as_deref(), Some("writes"));
        assert_eq!(edges[4].label.as_deref(), Some("reads from"));
        assert_eq!(edges[4].head, ArrowHead::Arrow);
        assert_eq!(edges[5].label.as_deref(), Some("async"));
        assert_eq!(edges[5].style, LineStyle::Dotted);
        assert_eq!(edges[6].head, ArrowHead::Circle);
        assert_eq!(edges[7].head, ArrowHead::Cross);
        assert_eq!(edges[8].tail, ArrowHead::Arrow);
        assert_eq!(edges[8].head, ArrowHead::Arrow);
    }

    #[test]
    fn test_parse_unspaced_circle_and_cross_links() {
        let chart = parse_flowchart("graph TD\n  D--oE\n  E==xF\n  F-.-oG").unwrap();
        let edges = &chart.edges;

        assert_eq!(edges.len(), 3);
        assert_eq!((edges[0].from.as_str(), edges[0].to.as_str()), ("D", "E"));
        assert_eq!(edges[0].head, ArrowHead::Circle);
        assert_eq!(edges[0].style, LineStyle::Solid);
        assert_eq!((edges[1].from.as_str(), edges[1].to.as_str()), ("E", "F"));
        assert_eq!(edges[1].head, ArrowHead::Cross);
        assert_eq!(edges[1].style, LineStyle::Thick);
        assert_eq!(edges[2].to, "G");
        assert_eq!(edges[2].head, ArrowHead::Circle);
        assert_eq!(edges[2].style, LineStyle::Dotted);
    }

    #[test]
    fn test_parse_ampersand_groups_and_subgraphs() {
        let source = "```mermaid
graph TD
  %% edge tier
  subgraph edge [Edge Tier]
    LB[Load Balancer]
  end
  LB --> W1 & W2
  W1 & W2 --> DB
  classDef hot fill:#f96
  class DB hot
  style LB stroke:#333
```";
        let chart = parse_flowchart(source).unwrap();

        assert_eq!(chart.edges.len(), 4);
        assert_eq!(chart.groups.len(), 1);
        assert_eq!(chart.groups[0].title, "Edge Tier");
        assert_eq!(chart.groups[0].members, vec!["LB".to_string()]);
        assert!(chart.nodes.iter().all(|n| n.id != "classDef" && n.id != "hot"));
    }

    #[test]
    fn test_unsupported_diagram_kind_fails_with_line() {
        let source = "sequenceDiagram\n  Alice->>Bob: Hi";
        let failure = parse_flowchart(source).unwrap_err();

        assert_eq!(failure.line, Some(1));
        assert_eq!(failure.source_text, source);
        assert!(failure.message.contains("sequenceDiagram"));
    }

    #[test]
    fn test_malformed_statement_reports_line() {
        let source = "graph TD\n  A --> B\n  B -->\n";
        let failure = parse_flowchart(source).unwrap_err();
        assert_eq!(failure.line, Some(3));
        assert!(failure.message.starts_with("Parse error on line 3"));

        let unclosed = parse_flowchart("graph TD\n  A[Web --> B").unwrap_err();
        assert_eq!(unclosed.line, Some(2));

        let dangling = parse_flowchart("graph TD\n  subgraph api\n  A --> B").unwrap_err();
        assert_eq!(dangling.line, Some(2));
    }

    #[test]
    fn test_empty_source_fails() {
        let failure = parse_flowchart("  \n```\n```").unwrap_err();
        assert_eq!(failure.line, None);
    }

    #[test]
    fn test_render_is_idempotent() {
        let target = RenderTarget::new();
        let renderer = renderer();
        let source = "graph TD; LB-->Web-->App-->DB;";

        let first = renderer.render(&target, source).unwrap();
        let second = renderer.render(&target, source).unwrap();
        assert_eq!(first, second);

        let failure_a = renderer.render(&target, "pie title Pets").unwrap_err();
        let failure_b = renderer.render(&target, "pie title Pets").unwrap_err();
        assert_eq!(failure_a, failure_b);
    }

    #[test]
    fn test_svg_contains_nodes_and_markers() {
        let target = RenderTarget::new();
        let artifact = renderer()
            .render(&target, "graph LR\n  A[Client] -->|HTTPS| B[API & Auth]")
            .unwrap();

        assert!(artifact.svg.starts_with("<svg"));
        assert!(artifact.svg.ends_with("</svg>"));
        assert!(artifact.svg.contains(&format!(r#"id="{}""#, target.id())));
        assert!(artifact.svg.contains(&format!("url(#{}-arrow)", target.id())));
        assert!(artifact.svg.contains("Client"));
        assert!(artifact.svg.contains("API &amp; Auth"));
        assert!(artifact.svg.contains("HTTPS"));
    }

    #[test]
    fn test_themes_change_palette() {
        let target = RenderTarget::new();
        let source = "graph TD; A-->B;";
        let dark = renderer().render(&target, source).unwrap();
        let forest = MermaidSvgRenderer::new(RenderConfig {
            theme: DiagramTheme::Forest,
            ..RenderConfig::default()
        })
        .render(&target, source)
        .unwrap();

        assert_ne!(dark.svg, forest.svg);
        assert!(forest.svg.contains(DiagramTheme::Forest.palette().node_fill));
    }

    #[test]
    fn test_cycles_and_self_loops_render() {
        let artifact = renderer()
            .render(&RenderTarget::new(), "graph TD\n A --> B\n B --> A\n C --> C")
            .unwrap();
        assert!(artifact.svg.contains(r#"data-id="C""#));
    }

    #[test]
    fn test_render_target_ids_are_unique() {
        let ids: std::collections::HashSet<String> =
            (0..64).map(|_| RenderTarget::new().id().to_string()).collect();
        assert_eq!(ids.len(), 64);

        let id = RenderTarget::new().id().to_string();
        assert!(id.starts_with("mermaid-diagram-"));
        assert_eq!(id.len(), "mermaid-diagram-".len() + 9);
    }

    #[test]
    fn test_failure_page_shows_source_and_message() {
        let target = RenderTarget::new();
        let source = "graph TD\n  A -->\n";
        let failure = renderer().render(&target, source).unwrap_err();
        let page = RenderedArtifact::failure_page(&target, &failure, DiagramTheme::Dark);

        assert_eq!(page.target_id, target.id());
        assert!(page.svg.contains("Could not render diagram."));
        assert!(page.svg.contains("A --&gt;"));
    }

    #[test]
    fn test_theme_from_str() {
        assert_eq!("Forest".parse::<DiagramTheme>().unwrap(), DiagramTheme::Forest);
        assert_eq!("light".parse::<DiagramTheme>().unwrap(), DiagramTheme::Default);
        assert!("sepia".parse::<DiagramTheme>().is_err());
        assert_eq!(DiagramTheme::default(), DiagramTheme::Dark);
    }
}
