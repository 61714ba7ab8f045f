//! Permissive HTML reader.
//!
//! Pasted markup is untrusted and frequently malformed, so this reader is
//! total: any input produces some tree and parsing never fails. Bad
//! constructs degrade to text or are skipped. Comments, doctypes and
//! processing instructions are dropped. Tag and attribute names are
//! lowercased; character references are decoded in text and attribute
//! values.

use smol_str::SmolStr;

use crate::arena::{Dom, Element, NodeId};
use crate::tags::{is_block_tag, is_void_tag};

/// Parses `html` and appends the resulting top-level nodes under `parent`.
/// Returns the appended node ids in order.
pub fn parse_fragment(dom: &mut Dom, parent: NodeId, html: &str) -> Vec<NodeId> {
    let first_new = dom.children(parent).len();
    let mut tokens = Tokenizer::new(html);
    let mut stack: Vec<NodeId> = vec![parent];

    while let Some(token) = tokens.next_token() {
        match token {
            Token::Text(text) => {
                let cur = *stack.last().expect("stack holds at least the base");
                if text.chars().all(char::is_whitespace) && is_container_only(dom.tag(cur)) {
                    // Indentation between <li> or <tr> rows, not content.
                    continue;
                }
                match dom.last_child(cur) {
                    Some(last) if dom.is_text(last) => {
                        let merged = format!("{}{}", dom.text(last).unwrap_or(""), text);
                        dom.set_text(last, merged);
                    }
                    _ => {
                        let t = dom.create_text(text);
                        dom.append_child(cur, t);
                    }
                }
            }
            Token::Open { tag, attrs, self_closing } => {
                while stack.len() > 1 {
                    let top = *stack.last().expect("non-empty");
                    if implied_close(dom.tag(top), &tag) {
                        stack.pop();
                    } else {
                        break;
                    }
                }
                let mut el = Element::new(tag.clone());
                for (name, value) in attrs {
                    el.set_attr(name, value);
                }
                let id = dom.create_element(el);
                let cur = *stack.last().expect("non-empty");
                dom.append_child(cur, id);
                if !self_closing && !is_void_tag(&tag) {
                    stack.push(id);
                }
            }
            Token::Close(tag) => {
                if is_void_tag(&tag) {
                    continue;
                }
                // Pop to the nearest matching open element; ignore strays.
                let above_base = &stack[1..];
                if let Some(at) = above_base
                    .iter()
                    .rposition(|&id| dom.tag(id) == Some(tag.as_str()))
                {
                    stack.truncate(at + 1);
                }
            }
        }
    }

    dom.children(parent)[first_new..].to_vec()
}

/// Containers whose direct text is formatting whitespace, never content.
fn is_container_only(tag: Option<&str>) -> bool {
    matches!(
        tag,
        Some("ul" | "ol" | "table" | "thead" | "tbody" | "tfoot" | "tr")
    )
}

fn implied_close(open: Option<&str>, incoming: &str) -> bool {
    match open {
        Some("p") => is_block_tag(incoming),
        Some("li") => incoming == "li",
        Some("td" | "th") => matches!(incoming, "td" | "th" | "tr"),
        Some("tr") => incoming == "tr",
        _ => false,
    }
}

enum Token {
    Text(String),
    Open {
        tag: SmolStr,
        attrs: Vec<(SmolStr, String)>,
        self_closing: bool,
    },
    Close(SmolStr),
}

struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn byte(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.byte(0).is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Advances past bytes matching `keep` and returns the span.
    fn take_while(&mut self, keep: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.byte(0).is_some_and(&keep) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// Skips up to and including the next `>` (or to EOF).
    fn skip_past_gt(&mut self) {
        match self.rest().find('>') {
            Some(at) => self.pos += at + 1,
            None => self.pos = self.input.len(),
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            if self.pos >= self.input.len() {
                return None;
            }
            let rest = self.rest();
            if !rest.starts_with('<') {
                return Some(self.text_token());
            }
            if rest.starts_with("<!--") {
                match rest.find("-->") {
                    Some(at) => self.pos += at + 3,
                    None => self.pos = self.input.len(),
                }
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_past_gt();
                continue;
            }
            if rest.starts_with("</") {
                self.pos += 2;
                let name = self.take_while(|b| b.is_ascii_alphanumeric());
                if name.is_empty() {
                    self.skip_past_gt();
                    continue;
                }
                let tag = lowercase_smol(name);
                self.skip_past_gt();
                return Some(Token::Close(tag));
            }
            if self.byte(1).is_some_and(|b| b.is_ascii_alphabetic()) {
                self.pos += 1;
                return Some(self.open_tag_token());
            }
            // A lone '<' is text.
            return Some(self.text_token());
        }
    }

    /// Text run up to the next construct that looks like markup.
    fn text_token(&mut self) -> Token {
        let start = self.pos;
        // The char at `start` is consumed unconditionally so a bare '<'
        // cannot loop forever.
        self.pos += self.rest().chars().next().map(char::len_utf8).unwrap_or(1);
        loop {
            match self.rest().find('<') {
                None => {
                    self.pos = self.input.len();
                    break;
                }
                Some(at) => {
                    self.pos += at;
                    if self.looks_like_markup() {
                        break;
                    }
                    self.pos += 1;
                }
            }
        }
        Token::Text(decode_entities(&self.input[start..self.pos]))
    }

    /// At a '<': does a tag, comment or directive start here?
    fn looks_like_markup(&self) -> bool {
        match self.byte(1) {
            Some(b'!' | b'/' | b'?') => true,
            Some(b) => b.is_ascii_alphabetic(),
            None => false,
        }
    }

    /// Called with `pos` just past the '<' of an open tag.
    fn open_tag_token(&mut self) -> Token {
        let name = self.take_while(|b| b.is_ascii_alphanumeric());
        let tag = lowercase_smol(name);
        let mut attrs: Vec<(SmolStr, String)> = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.byte(0) {
                None => break,
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/') => {
                    if self.byte(1) == Some(b'>') {
                        self.pos += 2;
                        self_closing = true;
                        break;
                    }
                    self.pos += 1;
                }
                Some(_) => {
                    let attr_name = self.take_while(|b| {
                        !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/' | b'"' | b'\'')
                    });
                    if attr_name.is_empty() {
                        // Stray quote or slash; step over it.
                        self.pos += 1;
                        continue;
                    }
                    let attr_name = lowercase_smol(attr_name);
                    self.skip_whitespace();
                    let value = if self.byte(0) == Some(b'=') {
                        self.pos += 1;
                        self.skip_whitespace();
                        self.attr_value()
                    } else {
                        String::new()
                    };
                    attrs.push((attr_name, value));
                }
            }
        }

        Token::Open { tag, attrs, self_closing }
    }

    fn attr_value(&mut self) -> String {
        let raw = match self.byte(0) {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let v = self.take_while(|b| b != quote);
                if self.byte(0) == Some(quote) {
                    self.pos += 1;
                }
                v
            }
            _ => self.take_while(|b| !b.is_ascii_whitespace() && b != b'>'),
        };
        decode_entities(raw)
    }
}

fn lowercase_smol(s: &str) -> SmolStr {
    if s.bytes().any(|b| b.is_ascii_uppercase()) {
        SmolStr::from(s.to_ascii_lowercase())
    } else {
        SmolStr::new(s)
    }
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_entity(rest) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decodes one reference at the start of `s` (which begins with '&').
/// Returns the char and the bytes consumed, or None to keep the '&' literal.
fn decode_entity(s: &str) -> Option<(char, usize)> {
    let semi = s[1..].find(';')?;
    if semi > 30 {
        return None;
    }
    let body = &s[1..1 + semi];
    let ch = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let num = body.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code).filter(|&c| c != '\0')?
        }
    };
    Some((ch, semi + 2))
}
