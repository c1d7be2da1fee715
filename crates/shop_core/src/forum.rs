use std::fmt;

use url::Url;

use crate::ConfigError;

pub const THREAD_PLACEHOLDER: &str = "{thread}";

/// Forum thread id hosting the shop. Only url-safe characters are accepted
/// because the id is templated into request paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadId(String);

impl ThreadId {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MissingThread);
        }
        let valid = trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ConfigError::InvalidThread(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the edit and bump forms live and how they are filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumEndpoints {
    pub base_url: String,
    pub edit_path: String,
    pub bump_path: String,
    /// Name of the hidden anti-forgery input on both forms.
    pub token_field: String,
    pub bump_message: String,
}

impl Default for ForumEndpoints {
    fn default() -> Self {
        Self {
            base_url: "https://www.pathofexile.com".to_string(),
            edit_path: "/forum/edit-thread/{thread}".to_string(),
            bump_path: "/forum/post-reply/{thread}".to_string(),
            token_field: "hash".to_string(),
            bump_message: "[b]Bump[/b] - shop is up to date.".to_string(),
        }
    }
}

impl ForumEndpoints {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = Url::parse(&self.base_url)
            .map_err(|err| ConfigError::InvalidEndpoint(format!("{}: {err}", self.base_url)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint(format!(
                "unsupported scheme {}",
                base.scheme()
            )));
        }
        for path in [&self.edit_path, &self.bump_path] {
            if !path.contains(THREAD_PLACEHOLDER) {
                return Err(ConfigError::InvalidEndpoint(format!(
                    "path {path:?} has no {THREAD_PLACEHOLDER} placeholder"
                )));
            }
        }
        if self.token_field.trim().is_empty() {
            return Err(ConfigError::InvalidEndpoint("token field is empty".to_string()));
        }
        Ok(())
    }

    pub fn edit_url(&self, thread: &ThreadId) -> String {
        self.build_url(&self.edit_path, thread)
    }

    pub fn bump_url(&self, thread: &ThreadId) -> String {
        self.build_url(&self.bump_path, thread)
    }

    /// Edit form: keeps the thread title, replaces the body.
    pub fn edit_form(&self, page: &ForumForm, content: &str) -> FormPayload {
        let mut form = FormPayload::default();
        if let Some(title) = &page.title {
            form.push("title", title);
        }
        form.push("content", content);
        form.push(&self.token_field, &page.token);
        form.push("submit", "Submit");
        form
    }

    pub fn bump_form(&self, page: &ForumForm) -> FormPayload {
        let mut form = FormPayload::default();
        form.push("content", &self.bump_message);
        form.push(&self.token_field, &page.token);
        form.push("submit", "Submit");
        form
    }

    fn build_url(&self, path: &str, thread: &ThreadId) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            path.replace(THREAD_PLACEHOLDER, thread.as_str())
        )
    }
}

/// The parts of a fetched forum form needed to submit it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumForm {
    pub token: String,
    pub title: Option<String>,
}

/// Ordered form fields, posted url-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormPayload {
    fields: Vec<(String, String)>,
}

impl FormPayload {
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}
