//! Facebook Graph API client.
//!
//! Credentials come from the environment (`FACEBOOK_ACCESS_TOKEN`,
//! `FACEBOOK_PAGE_ID`) with a `~/.muhtar/config.json` fallback. The page
//! feed is read through the endpoint chain /posts → /feed → /published_posts;
//! the first edge that returns data wins.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const GRAPH_BASE: &str = "https://graph.facebook.com/v19.0";

// ─── Errors ─────────────────────────────────────────────────────

/// Feed ingestion errors. A failed fetch yields zero records for the cycle;
/// it never touches gazetteer or row state.
#[derive(Debug)]
pub enum FeedError {
    /// A required credential is absent from env and config file.
    MissingCredential(String),
    /// Token present but does not look like a Page Access Token.
    SuspiciousToken(String),
    /// The Graph API returned an error object (possibly with HTTP 200).
    Graph(String),
    Network(String),
    InvalidResponse(String),
    /// All endpoints answered but produced no posts.
    Empty,
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential(name) => write!(f, "Missing credential: {} is not set", name),
            Self::SuspiciousToken(masked) => write!(
                f,
                "Token format looks wrong (read: {}). Make sure it is a Page Access Token.",
                masked
            ),
            Self::Graph(msg) => write!(f, "Graph API error: {}", msg),
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid API response: {}", msg),
            Self::Empty => write!(
                f,
                "No posts or comments returned. Check that the token is a Page Access Token \
                 with pages_read_user_content and pages_read_engagement, and that the page id \
                 or username is correct."
            ),
        }
    }
}

impl std::error::Error for FeedError {}

// ─── Configuration ──────────────────────────────────────────────

/// Mask a token for diagnostics. Never log the full value.
pub fn mask_token(tok: &str) -> String {
    if tok.is_empty() {
        String::new()
    } else if tok.len() <= 10 {
        "***".to_string()
    } else {
        format!("{}...{}", &tok[..4], &tok[tok.len() - 4..])
    }
}

fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    page_id: Option<String>,
}

/// Credentials for the page feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub access_token: String,
    /// Numeric page id or page username.
    pub page_id: String,
}

impl FeedConfig {
    /// Validate raw credentials. Page tokens start with "EA" and are long;
    /// anything else is rejected early with a masked diagnostic.
    pub fn new(access_token: String, page_id: String) -> Result<Self, FeedError> {
        let access_token = access_token.trim().to_string();
        let page_id = page_id.trim().to_string();
        if access_token.is_empty() {
            return Err(FeedError::MissingCredential("FACEBOOK_ACCESS_TOKEN".into()));
        }
        if page_id.is_empty() {
            return Err(FeedError::MissingCredential("FACEBOOK_PAGE_ID".into()));
        }
        if !(access_token.starts_with("EA") && access_token.len() > 40) {
            return Err(FeedError::SuspiciousToken(mask_token(&access_token)));
        }
        Ok(Self { access_token, page_id })
    }

    /// Environment first, then ~/.muhtar/config.json.
    pub fn from_env() -> Result<Self, FeedError> {
        let file = Self::read_config_file().unwrap_or_default();
        let token = std::env::var("FACEBOOK_ACCESS_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .or(file.access_token)
            .unwrap_or_default();
        let page = std::env::var("FACEBOOK_PAGE_ID")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .or(file.page_id)
            .unwrap_or_default();
        Self::new(token, page)
    }

    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".muhtar")
            .join("config.json")
    }

    fn read_config_file() -> Option<ConfigFile> {
        let data = std::fs::read_to_string(Self::config_path()).ok()?;
        serde_json::from_str(&data).ok()
    }
}

// ─── Payload views ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub permalink_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentAuthor {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub from: Option<CommentAuthor>,
}

/// One page post with its comments.
#[derive(Debug, Clone)]
pub struct PostWithComments {
    pub post: Post,
    pub comments: Vec<Comment>,
}

// ─── Client ─────────────────────────────────────────────────────

pub struct GraphClient {
    config: FeedConfig,
    agent: ureq::Agent,
}

impl GraphClient {
    pub fn new(config: FeedConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self { config, agent }
    }

    fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<serde_json::Value, FeedError> {
        let mut req = self
            .agent
            .get(url)
            .query("access_token", &self.config.access_token);
        for (k, v) in params {
            req = req.query(k, v);
        }

        let resp = match req.call() {
            Ok(r) => r,
            Err(ureq::Error::Status(_, r)) => {
                // Error bodies carry the useful message.
                let msg = r
                    .into_json::<serde_json::Value>()
                    .ok()
                    .and_then(|v| graph_error_message(&v))
                    .unwrap_or_else(|| "Graph API error".to_string());
                return Err(FeedError::Graph(msg));
            }
            Err(e) => return Err(FeedError::Network(e.to_string())),
        };

        let val: serde_json::Value = resp
            .into_json()
            .map_err(|e| FeedError::InvalidResponse(e.to_string()))?;

        // HTTP 200 can still carry an embedded error object.
        if let Some(msg) = graph_error_message(&val) {
            return Err(FeedError::Graph(msg));
        }
        Ok(val)
    }

    /// Resolve a page username to its numeric id; numeric ids pass through.
    pub fn resolve_page_id(&self) -> Result<String, FeedError> {
        if is_numeric_id(&self.config.page_id) {
            return Ok(self.config.page_id.clone());
        }
        let url = format!("{}/{}", GRAPH_BASE, self.config.page_id);
        let val = self.get(&url, &[("fields", "id")])?;
        match val.get("id").and_then(|v| v.as_str()) {
            Some(id) if is_numeric_id(id) => Ok(id.to_string()),
            _ => Err(FeedError::InvalidResponse(format!(
                "Could not resolve page id for '{}'",
                self.config.page_id
            ))),
        }
    }

    /// Fetch page posts through the endpoint fallback chain.
    pub fn posts(&self, limit: usize) -> Result<Vec<Post>, FeedError> {
        let page_id = self.resolve_page_id()?;
        let limit_s = limit.to_string();
        let fields = "id,message,created_time,permalink_url";

        for edge in ["posts", "feed", "published_posts"] {
            let url = format!("{}/{}/{}", GRAPH_BASE, page_id, edge);
            let val = self.get(&url, &[("limit", &limit_s), ("fields", fields)])?;
            let posts = parse_data::<Post>(&val)?;
            if !posts.is_empty() {
                return Ok(posts);
            }
        }
        Ok(Vec::new())
    }

    pub fn comments(&self, post_id: &str, limit: usize) -> Result<Vec<Comment>, FeedError> {
        let url = format!("{}/{}/comments", GRAPH_BASE, post_id);
        let val = self.get(
            &url,
            &[
                ("limit", &limit.to_string()),
                ("fields", "id,message,created_time,from"),
            ],
        )?;
        parse_data::<Comment>(&val)
    }

    /// One fetch cycle: posts plus their comments. A post whose comment
    /// fetch fails still comes through, with zero comments.
    pub fn fetch_posts_with_comments(
        &self,
        limit_posts: usize,
        limit_comments: usize,
    ) -> Result<Vec<PostWithComments>, FeedError> {
        eprintln!(
            "[feed] page '{}' | token {}",
            self.config.page_id,
            mask_token(&self.config.access_token)
        );

        let posts = self.posts(limit_posts)?;
        if posts.is_empty() {
            return Err(FeedError::Empty);
        }

        let mut out = Vec::with_capacity(posts.len());
        for post in posts {
            let comments = match self.comments(&post.id, limit_comments) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("[feed] comments failed for {}: {}", post.id, e);
                    Vec::new()
                }
            };
            out.push(PostWithComments { post, comments });
        }
        Ok(out)
    }
}

fn graph_error_message(val: &serde_json::Value) -> Option<String> {
    let err = val.get("error")?;
    Some(
        err.get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Graph API error")
            .to_string(),
    )
}

fn parse_data<T: for<'de> Deserialize<'de>>(val: &serde_json::Value) -> Result<Vec<T>, FeedError> {
    match val.get("data") {
        None => Ok(Vec::new()),
        Some(data) => serde_json::from_value(data.clone())
            .map_err(|e| FeedError::InvalidResponse(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token(""), "");
        assert_eq!(mask_token("short"), "***");
        assert_eq!(mask_token("EAAB12345678901234567890"), "EAAB...7890");
    }

    #[test]
    fn test_is_numeric_id() {
        assert!(is_numeric_id("1234567890"));
        assert!(!is_numeric_id("olurbelediyesi"));
        assert!(!is_numeric_id(""));
    }

    #[test]
    fn test_config_missing_token() {
        let err = FeedConfig::new("".into(), "12345".into()).unwrap_err();
        assert!(matches!(err, FeedError::MissingCredential(ref n) if n == "FACEBOOK_ACCESS_TOKEN"));
    }

    #[test]
    fn test_config_missing_page() {
        let token = format!("EA{}", "x".repeat(50));
        let err = FeedConfig::new(token, "  ".into()).unwrap_err();
        assert!(matches!(err, FeedError::MissingCredential(ref n) if n == "FACEBOOK_PAGE_ID"));
    }

    #[test]
    fn test_config_suspicious_token() {
        let err = FeedConfig::new("not-a-page-token".into(), "12345".into()).unwrap_err();
        match err {
            FeedError::SuspiciousToken(masked) => {
                assert!(!masked.contains("not-a-page-token"));
            }
            other => panic!("expected SuspiciousToken, got {:?}", other),
        }
    }

    #[test]
    fn test_config_valid() {
        let token = format!("EA{}", "x".repeat(50));
        let cfg = FeedConfig::new(format!(" {} ", token), "olur".into()).unwrap();
        assert_eq!(cfg.access_token, token);
        assert_eq!(cfg.page_id, "olur");
    }

    #[test]
    fn test_graph_error_message() {
        let val: serde_json::Value =
            serde_json::from_str(r#"{"error":{"message":"Invalid OAuth access token"}}"#).unwrap();
        assert_eq!(
            graph_error_message(&val).as_deref(),
            Some("Invalid OAuth access token")
        );
        let ok: serde_json::Value = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(graph_error_message(&ok).is_none());
    }

    #[test]
    fn test_parse_post_payload() {
        let val: serde_json::Value = serde_json::from_str(
            r#"{"data":[{"id":"1_2","message":"Yol çalışması","created_time":"2024-05-17T09:30:00+0000","permalink_url":"https://facebook.com/1_2"},{"id":"1_3"}]}"#,
        )
        .unwrap();
        let posts = parse_data::<Post>(&val).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].message.as_deref(), Some("Yol çalışması"));
        assert!(posts[1].message.is_none());
    }

    #[test]
    fn test_parse_comment_payload() {
        let val: serde_json::Value = serde_json::from_str(
            r#"{"data":[{"id":"c1","message":"Akbayır mah. yol bozuk","created_time":"2024-05-17T10:00:00+0000","from":{"name":"Bir Vatandaş"}}]}"#,
        )
        .unwrap();
        let comments = parse_data::<Comment>(&val).unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(
            comments[0].from.as_ref().and_then(|a| a.name.as_deref()),
            Some("Bir Vatandaş")
        );
    }

    #[test]
    fn test_error_display() {
        let e = FeedError::MissingCredential("FACEBOOK_PAGE_ID".into());
        assert!(e.to_string().contains("FACEBOOK_PAGE_ID"));
        assert!(FeedError::Empty.to_string().contains("Page Access Token"));
    }
}
