//! Portable Text rendering
//!
//! Turns a Portable Text block sequence into HTML. Consecutive spans that
//! share a mark are grouped under a single element, so a link stretching
//! over several differently-styled spans renders as one `<a>`.

use serde_json::Value;
use std::cmp::Ordering;

use crate::helpers::{link_to, text_with_breaks, uri_looks_safe, wrap};

/// Decorators in the order they nest when equally long-lived
const KNOWN_DECORATORS: [&str; 5] = ["strong", "em", "code", "underline", "strike-through"];

/// Portable Text to HTML renderer
#[derive(Debug, Default, Clone)]
pub struct PortableTextRenderer;

/// A rendered list item waiting to be grouped into `<ul>`/`<ol>`
struct ListEntry {
    kind: String,
    level: u64,
    html: String,
}

/// Node of the per-block mark tree
enum MarkChild {
    Text(String),
    Node(usize),
}

struct MarkNode {
    mark: Option<String>,
    children: Vec<MarkChild>,
}

impl PortableTextRenderer {
    /// Create a new renderer
    pub fn new() -> Self {
        Self
    }

    /// Render a block sequence to HTML
    pub fn render(&self, blocks: &[Value]) -> String {
        let mut out = String::new();
        let mut pending: Vec<ListEntry> = Vec::new();

        for block in blocks {
            match list_item(block) {
                Some((kind, level)) => pending.push(ListEntry {
                    kind: kind.to_string(),
                    level,
                    html: self.render_children(block),
                }),
                None => {
                    if !pending.is_empty() {
                        out.push_str(&self.render_list(&pending));
                        pending.clear();
                    }
                    out.push_str(&self.render_block(block));
                }
            }
        }

        if !pending.is_empty() {
            out.push_str(&self.render_list(&pending));
        }

        out
    }

    fn render_block(&self, block: &Value) -> String {
        match block.get("_type").and_then(Value::as_str) {
            Some("block") => {
                let style = block
                    .get("style")
                    .and_then(Value::as_str)
                    .unwrap_or("normal");
                let tag = match style {
                    "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" => style,
                    "normal" => "p",
                    other => {
                        tracing::warn!("Unknown block style {:?}, rendering as paragraph", other);
                        "p"
                    }
                };
                wrap(tag, &self.render_children(block))
            }
            other => {
                tracing::warn!("Unknown block type {:?}, skipping", other);
                String::new()
            }
        }
    }

    /// Group list items into nested lists; deeper items nest in the item before them
    fn render_list(&self, items: &[ListEntry]) -> String {
        let level = items.iter().map(|e| e.level).min().unwrap_or(1);
        let mut out = String::new();
        let mut i = 0;

        while i < items.len() {
            let kind = items[i].kind.as_str();
            let tag = if kind == "number" { "ol" } else { "ul" };
            out.push_str(&format!("<{tag}>"));

            while i < items.len() && (items[i].level > level || items[i].kind == kind) {
                let mut li = String::new();
                if items[i].level == level {
                    li.push_str(&items[i].html);
                    i += 1;
                }
                let start = i;
                while i < items.len() && items[i].level > level {
                    i += 1;
                }
                if start < i {
                    li.push_str(&self.render_list(&items[start..i]));
                }
                out.push_str(&wrap("li", &li));
            }

            out.push_str(&format!("</{tag}>"));
        }

        out
    }

    /// Render the inline children of a text block
    fn render_children(&self, block: &Value) -> String {
        let children = match block.get("children").and_then(Value::as_array) {
            Some(children) => children,
            None => return String::new(),
        };
        let mark_defs = block
            .get("markDefs")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let mut arena = vec![MarkNode {
            mark: None,
            children: Vec::new(),
        }];
        let mut stack: Vec<usize> = vec![0];

        for (index, child) in children.iter().enumerate() {
            let mut needed = sorted_marks(children, index);

            // The root stays; keep open marks until the first one this span drops
            let mut pos = 1;
            while pos < stack.len() {
                let open = arena[stack[pos]].mark.as_deref();
                match needed.iter().position(|m| Some(m.as_str()) == open) {
                    Some(found) => {
                        needed.remove(found);
                        pos += 1;
                    }
                    None => break,
                }
            }
            stack.truncate(pos);

            for mark in needed {
                let id = arena.len();
                arena.push(MarkNode {
                    mark: Some(mark),
                    children: Vec::new(),
                });
                let parent = *stack.last().unwrap_or(&0);
                arena[parent].children.push(MarkChild::Node(id));
                stack.push(id);
            }

            let current = *stack.last().unwrap_or(&0);
            match child.get("_type").and_then(Value::as_str) {
                Some("span") | None if child.get("text").is_some() => {
                    let text = child.get("text").and_then(Value::as_str).unwrap_or("");
                    arena[current]
                        .children
                        .push(MarkChild::Text(text.to_string()));
                }
                other => {
                    tracing::warn!("Unknown inline type {:?}, skipping", other);
                }
            }
        }

        self.render_node(&arena, 0, mark_defs)
    }

    fn render_node(&self, arena: &[MarkNode], id: usize, mark_defs: &[Value]) -> String {
        let node = &arena[id];
        let inner: String = node
            .children
            .iter()
            .map(|child| match child {
                MarkChild::Text(text) => text_with_breaks(text),
                MarkChild::Node(child_id) => self.render_node(arena, *child_id, mark_defs),
            })
            .collect();

        match node.mark.as_deref() {
            None => inner,
            Some(mark) => self.render_mark(mark, &inner, mark_defs),
        }
    }

    fn render_mark(&self, mark: &str, inner: &str, mark_defs: &[Value]) -> String {
        if let Some(def) = mark_defs
            .iter()
            .find(|def| def.get("_key").and_then(Value::as_str) == Some(mark))
        {
            return match def.get("_type").and_then(Value::as_str) {
                Some("link") => {
                    let href = def.get("href").and_then(Value::as_str).unwrap_or("");
                    if uri_looks_safe(href) {
                        link_to(href, inner)
                    } else {
                        tracing::warn!("Dropping unsafe link href {:?}", href);
                        wrap("a", inner)
                    }
                }
                other => {
                    tracing::warn!("Unknown annotation type {:?}, rendering children", other);
                    inner.to_string()
                }
            };
        }

        match mark {
            "strong" => wrap("strong", inner),
            "em" => wrap("em", inner),
            "code" => wrap("code", inner),
            "underline" => format!(
                r#"<span style="text-decoration:underline">{}</span>"#,
                inner
            ),
            "strike-through" => wrap("del", inner),
            other => {
                tracing::warn!("Unknown mark {:?}, rendering children", other);
                inner.to_string()
            }
        }
    }
}

/// `(listItem, level)` when the block is a list item
fn list_item(block: &Value) -> Option<(&str, u64)> {
    if block.get("_type").and_then(Value::as_str) != Some("block") {
        return None;
    }
    let kind = block.get("listItem").and_then(Value::as_str)?;
    let level = block.get("level").and_then(Value::as_u64).unwrap_or(1);
    Some((kind, level.max(1)))
}

fn span_marks(span: &Value) -> Vec<String> {
    span.get("marks")
        .and_then(Value::as_array)
        .map(|marks| {
            marks
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Marks of `children[index]`, longest-running first
fn sorted_marks(children: &[Value], index: usize) -> Vec<String> {
    let mut marks = span_marks(&children[index]);
    let runs: Vec<(String, usize)> = marks
        .iter()
        .map(|mark| {
            let following = children[index + 1..]
                .iter()
                .take_while(|sibling| span_marks(sibling).contains(mark))
                .count();
            (mark.clone(), following + 1)
        })
        .collect();
    let run_of = |mark: &str| {
        runs.iter()
            .find(|(m, _)| m == mark)
            .map(|(_, n)| *n)
            .unwrap_or(1)
    };
    let known_pos = |mark: &str| KNOWN_DECORATORS.iter().position(|d| *d == mark);

    marks.sort_by(|a, b| {
        run_of(b)
            .cmp(&run_of(a))
            .then_with(|| match (known_pos(a), known_pos(b)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| a.cmp(b))
    });
    marks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(blocks: Value) -> String {
        let blocks = blocks.as_array().cloned().unwrap();
        PortableTextRenderer::new().render(&blocks)
    }

    fn span(text: &str, marks: &[&str]) -> Value {
        json!({ "_type": "span", "text": text, "marks": marks })
    }

    #[test]
    fn test_paragraph_and_heading() {
        let html = render(json!([
            { "_type": "block", "style": "h2", "children": [span("Intro", &[])] },
            { "_type": "block", "children": [span("Hello <world>", &[])] }
        ]));
        assert_eq!(html, "<h2>Intro</h2><p>Hello &lt;world&gt;</p>");
    }

    #[test]
    fn test_decorators() {
        let html = render(json!([{
            "_type": "block",
            "style": "normal",
            "children": [
                span("bold", &["strong"]),
                span(" and ", &[]),
                span("struck", &["strike-through"]),
                span("under", &["underline"])
            ]
        }]));
        assert_eq!(
            html,
            "<p><strong>bold</strong> and <del>struck</del>\
             <span style=\"text-decoration:underline\">under</span></p>"
        );
    }

    #[test]
    fn test_link_spanning_spans_renders_once() {
        let html = render(json!([{
            "_type": "block",
            "markDefs": [{ "_key": "l1", "_type": "link", "href": "https://example.com/?a=1&b=2" }],
            "children": [
                span("see ", &["l1"]),
                span("this", &["l1", "em"]),
                span(" now", &[])
            ]
        }]));
        assert_eq!(
            html,
            "<p><a href=\"https://example.com/?a=1&amp;b=2\">see <em>this</em></a> now</p>"
        );
    }

    #[test]
    fn test_unsafe_link_href_is_dropped() {
        let html = render(json!([{
            "_type": "block",
            "markDefs": [
                { "_key": "l1", "_type": "link", "href": "javascript:alert(document.cookie)" },
                { "_key": "l2", "_type": "link", "href": "data:text/html,<script>x</script>" }
            ],
            "children": [span("click", &["l1"]), span(" or ", &[]), span("here", &["l2"])]
        }]));
        assert_eq!(html, "<p><a>click</a> or <a>here</a></p>");
    }

    #[test]
    fn test_equal_runs_nest_in_known_order() {
        let html = render(json!([{
            "_type": "block",
            "children": [span("x", &["em", "strong"])]
        }]));
        assert_eq!(html, "<p><strong><em>x</em></strong></p>");
    }

    #[test]
    fn test_nested_lists() {
        let item = |text: &str, kind: &str, level: u64| {
            json!({
                "_type": "block",
                "listItem": kind,
                "level": level,
                "children": [span(text, &[])]
            })
        };
        let html = render(json!([
            item("a", "bullet", 1),
            item("a1", "number", 2),
            item("a2", "number", 2),
            item("b", "bullet", 1),
            { "_type": "block", "children": [span("after", &[])] }
        ]));
        assert_eq!(
            html,
            "<ul><li>a<ol><li>a1</li><li>a2</li></ol></li><li>b</li></ul><p>after</p>"
        );
    }

    #[test]
    fn test_list_kind_change_starts_new_list() {
        let html = render(json!([
            { "_type": "block", "listItem": "bullet", "children": [span("a", &[])] },
            { "_type": "block", "listItem": "number", "children": [span("b", &[])] }
        ]));
        assert_eq!(html, "<ul><li>a</li></ul><ol><li>b</li></ol>");
    }

    #[test]
    fn test_line_breaks_and_unknown_blocks() {
        let html = render(json!([
            { "_type": "image", "asset": { "_ref": "image-a-1x1-png" } },
            { "_type": "block", "children": [span("one\ntwo", &[])] }
        ]));
        assert_eq!(html, "<p>one<br/>two</p>");
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(render(json!([])), "");
    }
}
