use std::fmt::Write;

use crate::template::Segment;
use crate::{ConfigError, Item, ItemSnapshot, ShopTemplate};

/// Longest post body the forum accepts, in characters.
pub const MAX_POST_LEN: usize = 50_000;

/// Renders the listed items of `snapshot` into forum markup using `template`.
///
/// Pure and byte-deterministic. Items are grouped by price label in order of
/// first appearance; unpriced items are left out. Items with a stash location
/// render as a linked item tag, which intentionally omits the item name.
pub fn render(snapshot: &ItemSnapshot, template: &ShopTemplate) -> Result<String, ConfigError> {
    let items = render_items(snapshot);
    let count = snapshot.listed_count().to_string();

    let mut text = String::new();
    for segment in template.segments() {
        match segment {
            Segment::Text(literal) => text.push_str(literal),
            Segment::Items => text.push_str(&items),
            Segment::Count => text.push_str(&count),
        }
    }

    let len = text.chars().count();
    if len > MAX_POST_LEN {
        return Err(ConfigError::TooLong {
            len,
            max: MAX_POST_LEN,
        });
    }
    Ok(text)
}

fn render_items(snapshot: &ItemSnapshot) -> String {
    let mut groups: Vec<(String, Vec<&Item>)> = Vec::new();
    for item in snapshot.iter() {
        let Some(price) = item.price.as_ref() else {
            continue;
        };
        let label = price.label();
        match groups.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, items)) => items.push(item),
            None => groups.push((label, vec![item])),
        }
    }

    let mut out = String::new();
    for (label, items) in &groups {
        let _ = writeln!(out, "[spoiler=\"{}\"]", escape_attr(label));
        for item in items {
            out.push_str(&render_item(item));
            out.push('\n');
        }
        out.push_str("[/spoiler]\n");
    }
    out
}

fn render_item(item: &Item) -> String {
    let mut line = match &item.location {
        Some(location) => format!(
            "[linkItem location=\"{}\" league=\"{}\" x=\"{}\" y=\"{}\"]",
            escape_attr(&location.tab),
            escape_attr(&location.league),
            location.x,
            location.y
        ),
        None => escape_text(&item.name),
    };
    if let Some(note) = item.note.as_deref().filter(|note| !note.trim().is_empty()) {
        line.push_str(" - ");
        line.push_str(&escape_text(note));
    }
    line
}

/// Escapes free text so it can never open or close a markup tag.
pub fn escape_text(input: &str) -> String {
    escape(input, false)
}

/// Escapes a quoted attribute value.
pub fn escape_attr(input: &str) -> String {
    escape(input, true)
}

// Every replacement starts with '&' and '&' itself is escaped, so distinct
// inputs stay distinct after escaping.
fn escape(input: &str, in_attribute: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '[' => out.push_str("&#91;"),
            ']' => out.push_str("&#93;"),
            '"' if in_attribute => out.push_str("&quot;"),
            c if c.is_control() => {
                let _ = write!(out, "&#{};", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}
