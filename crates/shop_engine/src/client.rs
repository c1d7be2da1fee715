use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, COOKIE, USER_AGENT};
use shop_logging::{shop_debug, shop_workflow};

use crate::decode::decode_page;
use crate::forum_page::{detect_forum_errors, parse_forum_form};
use crate::{FailureKind, FetchError, PageForm, SubmitReceipt};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
    /// Full `Cookie` header value of an already authenticated forum session.
    pub session_cookie: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 2 * 1024 * 1024,
            user_agent: concat!("shop-sync/", env!("CARGO_PKG_VERSION")).to_string(),
            session_cookie: None,
        }
    }
}

/// Page fetch and form submission against the forum. Both complete asynchronously.
#[async_trait::async_trait]
pub trait ForumClient: Send + Sync {
    async fn fetch_form(&self, url: &str, token_field: &str) -> Result<PageForm, FetchError>;

    async fn submit_form(
        &self,
        url: &str,
        fields: &[(String, String)],
    ) -> Result<SubmitReceipt, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestForumClient {
    settings: ClientSettings,
    client: reqwest::Client,
}

struct Page {
    final_url: String,
    status: u16,
    html: String,
}

impl ReqwestForumClient {
    pub fn new(settings: ClientSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: &str,
    ) -> Result<reqwest::RequestBuilder, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let mut builder = self
            .client
            .request(method, parsed)
            .header(USER_AGENT, self.settings.user_agent.as_str());
        if let Some(cookie) = &self.settings.session_cookie {
            builder = builder.header(COOKIE, cookie.as_str());
        }
        Ok(builder)
    }

    async fn read_page(&self, builder: reqwest::RequestBuilder) -> Result<Page, FetchError> {
        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        let decoded = decode_page(&bytes, content_type.as_deref())
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;
        shop_debug!(
            "Read {} bytes ({}) from {}",
            bytes.len(),
            decoded.encoding_label,
            final_url
        );

        Ok(Page {
            final_url,
            status: status.as_u16(),
            html: decoded.html,
        })
    }
}

#[async_trait::async_trait]
impl ForumClient for ReqwestForumClient {
    async fn fetch_form(&self, url: &str, token_field: &str) -> Result<PageForm, FetchError> {
        let builder = self.request(reqwest::Method::GET, url)?;
        let page = self.read_page(builder).await?;
        parse_forum_form(&page.html, token_field)
    }

    async fn submit_form(
        &self,
        url: &str,
        fields: &[(String, String)],
    ) -> Result<SubmitReceipt, FetchError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter().map(|(name, value)| (name.as_str(), value.as_str())))
            .finish();
        shop_workflow!("POST {} ({} fields, {} bytes)", url, fields.len(), body.len());

        let builder = self
            .request(reqwest::Method::POST, url)?
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);
        let page = self.read_page(builder).await?;

        if let Some(message) = detect_forum_errors(&page.html) {
            return Err(FetchError::new(FailureKind::Rejected, message));
        }
        Ok(SubmitReceipt {
            final_url: page.final_url,
            status: page.status,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
