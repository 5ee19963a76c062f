//! Parsed window content: the `nd-window` root of fetched markup and its declared attributes.

use serde::{Deserialize, Serialize};

use crate::{
    geometry::parse_css_pixel_value,
    model::{Dependency, SnapType},
};

const ROOT_ATTRIBUTE: &str = "nd-window";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowSurface {
    /// Markup inside the root element, rendered into the window frame.
    pub markup: String,
    pub class_name: Option<String>,
    pub declared_width: Option<f64>,
    pub declared_height: Option<f64>,
    pub default_snap: Option<SnapType>,
    pub depends_on: Vec<Dependency>,
    pub busy: bool,
}

impl WindowSurface {
    /// Extracts the first element carrying an `nd-window` attribute, or `None` when absent.
    pub fn parse(markup: &str) -> Option<Self> {
        let tags = scan_tags(markup);
        let root_index = tags
            .iter()
            .position(|tag| tag.attribute(ROOT_ATTRIBUTE).is_some())?;
        let root = &tags[root_index];

        let style = root.attribute("style").flatten().unwrap_or_default();
        let close = root_close(markup, root).unwrap_or(markup.len());
        let busy = tags[root_index..]
            .iter()
            .take_while(|tag| tag.end <= close)
            .any(|tag| tag.attribute("data-is-busy").flatten() == Some("true"));

        Some(Self {
            markup: markup[root.end.min(close)..close].trim().to_string(),
            class_name: root
                .attribute("class")
                .flatten()
                .map(str::trim)
                .filter(|class| !class.is_empty())
                .map(str::to_string),
            declared_width: style_property(style, "width").and_then(parse_css_pixel_value),
            declared_height: style_property(style, "height").and_then(parse_css_pixel_value),
            default_snap: root
                .attribute("data-default-snap")
                .flatten()
                .and_then(SnapType::parse),
            depends_on: root
                .attribute("data-depends-on")
                .flatten()
                .map(Dependency::parse_list)
                .unwrap_or_default(),
            busy,
        })
    }
}

struct Tag<'a> {
    name: &'a str,
    attributes: Vec<(&'a str, Option<&'a str>)>,
    end: usize,
}

impl<'a> Tag<'a> {
    /// `Some(None)` for a valueless attribute, `None` when missing.
    fn attribute(&self, name: &str) -> Option<Option<&'a str>> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }
}

fn scan_tags(markup: &str) -> Vec<Tag<'_>> {
    let bytes = markup.as_bytes();
    let mut tags = Vec::new();
    let mut pos = 0;
    while let Some(offset) = markup[pos..].find('<') {
        let start = pos + offset + 1;
        match bytes.get(start) {
            Some(b) if b.is_ascii_alphabetic() => {
                let (tag, end) = scan_tag(markup, start);
                pos = end;
                tags.push(tag);
            }
            Some(_) => pos = start,
            None => break,
        }
    }
    tags
}

fn scan_tag(markup: &str, start: usize) -> (Tag<'_>, usize) {
    let bytes = markup.as_bytes();
    let mut pos = start;
    while pos < bytes.len() && !is_tag_delimiter(bytes[pos]) {
        pos += 1;
    }
    let name = &markup[start..pos];
    let mut attributes = Vec::new();

    loop {
        while pos < bytes.len() && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b'/') {
            pos += 1;
        }
        if pos >= bytes.len() || bytes[pos] == b'>' {
            break;
        }
        let attr_start = pos;
        while pos < bytes.len() && !is_tag_delimiter(bytes[pos]) && bytes[pos] != b'=' {
            pos += 1;
        }
        let attr = &markup[attr_start..pos];
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'=') {
            attributes.push((attr, None));
            continue;
        }
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let value = match bytes.get(pos) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                let value_start = pos + 1;
                let value_end = markup[value_start..]
                    .find(quote as char)
                    .map(|len| value_start + len)
                    .unwrap_or(bytes.len());
                pos = (value_end + 1).min(bytes.len());
                &markup[value_start..value_end]
            }
            _ => {
                let value_start = pos;
                while pos < bytes.len() && !is_tag_delimiter(bytes[pos]) {
                    pos += 1;
                }
                &markup[value_start..pos]
            }
        };
        attributes.push((attr, Some(value)));
    }

    let end = (pos + 1).min(bytes.len());
    (
        Tag {
            name,
            attributes,
            end,
        },
        end,
    )
}

fn is_tag_delimiter(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == b'>' || byte == b'/'
}

/// Offset of the root's closing tag, skipping nested elements with the same name.
fn root_close(markup: &str, root: &Tag<'_>) -> Option<usize> {
    let lower = markup.to_ascii_lowercase();
    let name = root.name.to_ascii_lowercase();
    let open = format!("<{name}");
    let close = format!("</{name}");
    let at_boundary =
        |idx: usize| lower.as_bytes().get(idx).map_or(true, |byte| is_tag_delimiter(*byte));

    let mut depth = 1_usize;
    let mut pos = root.end;
    while let Some(offset) = lower.get(pos..)?.find('<') {
        let at = pos + offset;
        let rest = &lower[at..];
        if rest.starts_with(&close) && at_boundary(at + close.len()) {
            depth -= 1;
            if depth == 0 {
                return Some(at);
            }
        } else if rest.starts_with(&open) && at_boundary(at + open.len()) {
            depth += 1;
        }
        pos = at + 1;
    }
    None
}

fn style_property<'a>(style: &'a str, property: &str) -> Option<&'a str> {
    style.split(';').find_map(|declaration| {
        let (name, value) = declaration.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case(property)
            .then(|| value.trim())
    })
}
