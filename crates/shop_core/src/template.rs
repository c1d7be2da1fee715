use crate::ConfigError;

pub const ITEMS_PLACEHOLDER: &str = "[items]";
pub const COUNT_PLACEHOLDER: &str = "[count]";
pub const DEFAULT_TEMPLATE: &str = ITEMS_PLACEHOLDER;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Text(String),
    Items,
    Count,
}

/// User-editable forum markup with placeholders, parsed once on configuration.
///
/// Everything outside the placeholders is copied verbatim, so users can wrap
/// the item list in their own markup. `[items]` must appear at least once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl ShopTemplate {
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        if source.trim().is_empty() {
            return Err(ConfigError::EmptyTemplate);
        }

        let mut segments = Vec::new();
        let mut rest = source;
        while let Some((idx, segment, len)) = next_placeholder(rest) {
            if idx > 0 {
                segments.push(Segment::Text(rest[..idx].to_string()));
            }
            segments.push(segment);
            rest = &rest[idx + len..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        if !segments.contains(&Segment::Items) {
            return Err(ConfigError::MissingItemsPlaceholder);
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl Default for ShopTemplate {
    fn default() -> Self {
        Self {
            source: DEFAULT_TEMPLATE.to_string(),
            segments: vec![Segment::Items],
        }
    }
}

fn next_placeholder(text: &str) -> Option<(usize, Segment, usize)> {
    let items = text
        .find(ITEMS_PLACEHOLDER)
        .map(|idx| (idx, Segment::Items, ITEMS_PLACEHOLDER.len()));
    let count = text
        .find(COUNT_PLACEHOLDER)
        .map(|idx| (idx, Segment::Count, COUNT_PLACEHOLDER.len()));
    match (items, count) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}
