//! Tag classification and the inline format vocabulary.

/// Zero-width space used as a caret anchor inside freshly toggled format
/// spans. Stripped from host-visible serialized values.
pub const ZERO_WIDTH: char = '\u{200B}';

/// Marks an embedded block container (value names the block kind).
pub const ATTR_EMBEDDED: &str = "data-embedded";
/// Marks an editable region inside an embedded block (value names the region).
pub const ATTR_EMBEDDED_EDITABLE: &str = "data-embedded-editable";
/// Stable id of a toggle block, generated at insertion time.
pub const ATTR_TOGGLE_ID: &str = "data-toggle-id";
/// Present (value "true") while a toggle block is collapsed.
pub const ATTR_TOGGLE_COLLAPSED: &str = "data-toggle-collapsed";

pub fn is_block_tag(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "ul"
            | "ol"
            | "li"
            | "blockquote"
            | "pre"
            | "div"
            | "table"
            | "thead"
            | "tbody"
            | "tfoot"
            | "tr"
            | "td"
            | "th"
            | "hr"
    )
}

/// Tags serialized without an end tag and never given children.
pub fn is_void_tag(tag: &str) -> bool {
    matches!(tag, "br" | "hr" | "img")
}

/// Containers that merge with an adjacent sibling of the same tag.
pub fn is_mergeable_container(tag: &str) -> bool {
    matches!(tag, "ul" | "ol")
}

pub fn is_format_tag(tag: &str) -> bool {
    Format::from_tag(tag).is_some()
}

/// An inline formatting mark, identified by its canonical wrapper tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::Bold,
        Format::Italic,
        Format::Underline,
        Format::Strikethrough,
        Format::Code,
    ];

    /// The tag this format writes.
    pub fn tag(self) -> &'static str {
        match self {
            Format::Bold => "b",
            Format::Italic => "i",
            Format::Underline => "u",
            Format::Strikethrough => "s",
            Format::Code => "code",
        }
    }

    /// Recognizes the canonical tag and its semantic synonyms.
    pub fn from_tag(tag: &str) -> Option<Format> {
        match tag {
            "b" | "strong" => Some(Format::Bold),
            "i" | "em" => Some(Format::Italic),
            "u" => Some(Format::Underline),
            "s" | "strike" | "del" => Some(Format::Strikethrough),
            "code" => Some(Format::Code),
            _ => None,
        }
    }
}
