use scraper::{Html, Selector};

use crate::{FailureKind, FetchError, PageForm};

/// Reads the hidden anti-forgery input `token_field` and the title input from a form page.
pub fn parse_forum_form(html: &str, token_field: &str) -> Result<PageForm, FetchError> {
    let doc = Html::parse_document(html);
    let token = input_value(&doc, token_field)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            FetchError::new(
                FailureKind::TokenMissing,
                format!("no {token_field:?} input on page"),
            )
        })?;
    let title = input_value(&doc, "title");
    Ok(PageForm { token, title })
}

/// Error messages the forum lists after a rejected submission, joined with `; `.
///
/// An expired or reused token lands here too.
pub fn detect_forum_errors(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let items = Selector::parse(".errors li").ok()?;
    let messages: Vec<String> = doc
        .select(&items)
        .map(|li| collapse_whitespace(&li.text().collect::<String>()))
        .filter(|message| !message.is_empty())
        .collect();
    if !messages.is_empty() {
        return Some(messages.join("; "));
    }

    let block = Selector::parse(".errors").ok()?;
    doc.select(&block)
        .map(|node| collapse_whitespace(&node.text().collect::<String>()))
        .find(|message| !message.is_empty())
}

fn input_value(doc: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!("input[name=\"{name}\"]")).ok()?;
    doc.select(&selector)
        .find_map(|input| input.value().attr("value"))
        .map(str::to_string)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
