//! Deterministic HTML writer.
//!
//! Output is compact (no indentation or inserted newlines) so that equal
//! trees always serialize to equal bytes; history snapshots and dirty
//! detection rely on that.

use crate::arena::{Dom, NodeId, NodeKind};
use crate::tags::{ZERO_WIDTH, is_void_tag};

#[derive(Debug, Clone, Copy)]
pub struct SerializeOptions {
    /// Keep zero-width caret anchors in text. History snapshots need them;
    /// host-visible values do not.
    pub keep_zero_width: bool,
}

impl SerializeOptions {
    /// Byte-stable form for history snapshots.
    pub fn history() -> Self {
        Self { keep_zero_width: true }
    }

    /// Host-visible form.
    pub fn value() -> Self {
        Self { keep_zero_width: false }
    }
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self::value()
    }
}

pub fn serialize_node(dom: &Dom, id: NodeId, opts: &SerializeOptions) -> String {
    let mut w = HtmlWriter { dom, opts, out: String::new() };
    w.write_node(id);
    w.out
}

/// Serializes the children of `parent` in order; `parent`'s own tag is not
/// written. This is how a document root becomes a value string.
pub fn serialize_children(dom: &Dom, parent: NodeId, opts: &SerializeOptions) -> String {
    let mut w = HtmlWriter { dom, opts, out: String::new() };
    for &child in dom.children(parent) {
        w.write_node(child);
    }
    w.out
}

struct HtmlWriter<'a> {
    dom: &'a Dom,
    opts: &'a SerializeOptions,
    out: String,
}

impl HtmlWriter<'_> {
    fn write_node(&mut self, id: NodeId) {
        match self.dom.kind(id) {
            NodeKind::Text(text) => {
                if self.opts.keep_zero_width {
                    escape_text(text, &mut self.out);
                } else {
                    let stripped: String = text.chars().filter(|&c| c != ZERO_WIDTH).collect();
                    escape_text(&stripped, &mut self.out);
                }
            }
            NodeKind::Element(el) => {
                self.out.push('<');
                self.out.push_str(el.tag());
                for (name, value) in el.attrs() {
                    self.out.push(' ');
                    self.out.push_str(name);
                    self.out.push_str("=\"");
                    escape_attr(value, &mut self.out);
                    self.out.push('"');
                }
                self.out.push('>');
                if is_void_tag(el.tag()) {
                    return;
                }
                let tag = el.tag().to_string();
                for &child in self.dom.children(id) {
                    self.write_node(child);
                }
                self.out.push_str("</");
                self.out.push_str(&tag);
                self.out.push('>');
            }
        }
    }
}

pub fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

pub fn escape_attr(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
