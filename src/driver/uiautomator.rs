use crate::widget::{Bounds, NodeHandle, UiNode, UiTree};
use anyhow::{Context, Result};
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::sync::LazyLock;

static DECIMAL_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#(\d+);").unwrap());
static HEX_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#x([0-9A-Fa-f]+);").unwrap());

/// Decode common HTML entities in a string
/// Handles: &amp; &lt; &gt; &quot; &apos; &#NNN; (decimal) &#xHHH; (hex)
fn decode_html_entities(s: &str) -> String {
    let mut result = s
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ");

    result = DECIMAL_ENTITY
        .replace_all(&result, |caps: &regex::Captures| {
            caps[1]
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string();

    result = HEX_ENTITY
        .replace_all(&result, |caps: &regex::Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string();

    // Last, so "&amp;lt;" stays "&lt;"
    result.replace("&amp;", "&")
}

fn read_node(e: &BytesStart<'_>, handle: NodeHandle) -> UiNode {
    let mut node = UiNode::new(handle, "");

    for attr in e.attributes().filter_map(|a| a.ok()) {
        let key = String::from_utf8_lossy(attr.key.as_ref());
        let value = String::from_utf8_lossy(&attr.value);

        match key.as_ref() {
            "class" => node.class_name = value.to_string(),
            "text" => node.text = decode_html_entities(&value),
            "resource-id" => node.resource_id = value.to_string(),
            "content-desc" => node.content_desc = decode_html_entities(&value),
            "bounds" => {
                if let Some(b) = Bounds::from_string(&value) {
                    node.bounds = b;
                }
            }
            "clickable" => node.clickable = value == "true",
            "visible-to-user" => node.visible = value == "true",
            "accessibility-focused" => node.accessibility_focused = value == "true",
            _ => {}
        }
    }

    node
}

/// Accumulates nodes while streaming through the dump
#[derive(Default)]
struct TreeBuilder {
    tree: UiTree,
    stack: Vec<usize>,
    // Depth inside a skipped extra window
    skipped_depth: usize,
    next_handle: u64,
}

impl TreeBuilder {
    fn open(&mut self, e: &BytesStart<'_>, has_children: bool) {
        if self.skipped_depth > 0 || (self.stack.is_empty() && !self.tree.is_empty()) {
            if has_children {
                self.skipped_depth += 1;
            }
            debug!("Skipping node outside the first window");
            return;
        }

        let node = read_node(e, NodeHandle(self.next_handle));
        self.next_handle += 1;
        let index = self.tree.push(self.stack.last().copied(), node);
        if has_children {
            self.stack.push(index);
        }
    }

    fn close(&mut self) {
        if self.skipped_depth > 0 {
            self.skipped_depth -= 1;
        } else {
            self.stack.pop();
        }
    }
}

/// Parse a uiautomator dump into a tree snapshot.
///
/// Handles are assigned in document order. Only the first top-level window is kept.
pub fn parse_tree(xml: &str) -> Result<UiTree> {
    let mut builder = TreeBuilder::default();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .with_context(|| format!("XML parse error at {}", reader.buffer_position()))?
        {
            Event::Start(ref e) if e.name().as_ref() == b"node" => builder.open(e, true),
            Event::Empty(ref e) if e.name().as_ref() == b"node" => builder.open(e, false),
            Event::End(ref e) if e.name().as_ref() == b"node" => builder.close(),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(builder.tree)
}
