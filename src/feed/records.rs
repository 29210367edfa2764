//! Flattening the post+comment bundle into per-comment rows.

use super::graph::PostWithComments;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One comment, denormalized with its post context. Created per fetch cycle
/// and replaced wholesale on the next one.
#[derive(Debug, Clone, Serialize)]
pub struct CommentRecord {
    pub post_id: String,
    pub post_message: String,
    pub post_time: Option<DateTime<Utc>>,
    pub post_url: Option<String>,
    pub comment_id: String,
    pub message: String,
    pub created_time: Option<DateTime<Utc>>,
    pub author: String,
}

/// Graph timestamps come as "2024-05-17T09:30:00+0000" (no colon in the
/// offset, so not strict RFC 3339); accept both forms.
pub fn parse_graph_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Flatten posts and comments into rows. A post with no comments still
/// yields one row with an empty message, so the dashboard keeps the post
/// visible; empty messages resolve to no-match downstream.
pub fn flatten(bundle: &[PostWithComments]) -> Vec<CommentRecord> {
    let mut rows = Vec::new();
    for item in bundle {
        let post = &item.post;
        let post_time = post.created_time.as_deref().and_then(parse_graph_time);
        let post_message = post.message.clone().unwrap_or_default().trim().to_string();

        if item.comments.is_empty() {
            rows.push(CommentRecord {
                post_id: post.id.clone(),
                post_message: post_message.clone(),
                post_time,
                post_url: post.permalink_url.clone(),
                comment_id: String::new(),
                message: String::new(),
                created_time: post_time,
                author: String::new(),
            });
            continue;
        }

        for c in &item.comments {
            rows.push(CommentRecord {
                post_id: post.id.clone(),
                post_message: post_message.clone(),
                post_time,
                post_url: post.permalink_url.clone(),
                comment_id: c.id.clone(),
                message: c.message.clone().unwrap_or_default().trim().to_string(),
                created_time: c.created_time.as_deref().and_then(parse_graph_time),
                author: c
                    .from
                    .as_ref()
                    .and_then(|a| a.name.clone())
                    .unwrap_or_default(),
            });
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::graph::{Comment, CommentAuthor, Post};
    use chrono::Timelike;

    fn post(id: &str, message: Option<&str>) -> Post {
        Post {
            id: id.to_string(),
            message: message.map(|s| s.to_string()),
            created_time: Some("2024-05-17T09:30:00+0000".to_string()),
            permalink_url: Some(format!("https://facebook.com/{}", id)),
        }
    }

    fn comment(id: &str, message: Option<&str>, author: Option<&str>) -> Comment {
        Comment {
            id: id.to_string(),
            message: message.map(|s| s.to_string()),
            created_time: Some("2024-05-17T10:15:00+0000".to_string()),
            from: author.map(|n| CommentAuthor {
                name: Some(n.to_string()),
            }),
        }
    }

    #[test]
    fn test_parse_graph_time_offset_forms() {
        let t = parse_graph_time("2024-05-17T09:30:00+0000").unwrap();
        assert_eq!(t.hour(), 9);
        assert!(parse_graph_time("2024-05-17T09:30:00+00:00").is_some());
        assert!(parse_graph_time("2024-05-17T09:30:00Z").is_some());
        assert!(parse_graph_time("17.05.2024").is_none());
        assert!(parse_graph_time("").is_none());
    }

    #[test]
    fn test_flatten_comments() {
        let bundle = vec![PostWithComments {
            post: post("1_2", Some(" Yol çalışması duyurusu ")),
            comments: vec![
                comment("c1", Some("Akbayır mah. yol bozuk"), Some("Bir Vatandaş")),
                comment("c2", None, None),
            ],
        }];

        let rows = flatten(&bundle);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].post_id, "1_2");
        assert_eq!(rows[0].post_message, "Yol çalışması duyurusu");
        assert_eq!(rows[0].message, "Akbayır mah. yol bozuk");
        assert_eq!(rows[0].author, "Bir Vatandaş");
        assert!(rows[0].created_time.is_some());
        // missing message/author degrade to empty, never error
        assert_eq!(rows[1].message, "");
        assert_eq!(rows[1].author, "");
    }

    #[test]
    fn test_flatten_commentless_post() {
        let bundle = vec![PostWithComments {
            post: post("1_9", Some("Duyuru")),
            comments: vec![],
        }];

        let rows = flatten(&bundle);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].comment_id, "");
        assert_eq!(rows[0].message, "");
        assert_eq!(rows[0].created_time, rows[0].post_time);
    }

    #[test]
    fn test_flatten_empty_bundle() {
        assert!(flatten(&[]).is_empty());
    }
}
