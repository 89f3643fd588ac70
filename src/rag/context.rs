//! Context synthesis from a graph neighborhood

use crate::models::Post;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders posts as one prompt-ready text block
#[derive(Debug, Clone)]
pub struct ContextSynthesizer {
    anonymous_author: String,
}

impl ContextSynthesizer {
    pub fn new(anonymous_author: impl Into<String>) -> Self {
        Self {
            anonymous_author: anonymous_author.into(),
        }
    }

    /// Posts in ascending sequence order, separated by a blank line
    #[must_use]
    pub fn synthesize(&self, posts: &[Post]) -> String {
        let mut sorted: Vec<&Post> = posts.iter().collect();
        sorted.sort_by_key(|post| post.source_sequence_no);

        sorted
            .into_iter()
            .map(|post| self.format_post(post))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn format_post(&self, post: &Post) -> String {
        format!(
            "[No.{}] {} ({})\n{}",
            post.source_sequence_no,
            post.display_author(&self.anonymous_author),
            post.timestamp.format(TIMESTAMP_FORMAT),
            post.content
        )
    }
}

impl Default for ContextSynthesizer {
    fn default() -> Self {
        Self::new("名無し")
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn post(seq: i64, author: Option<&str>, content: &str) -> Post {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        Post {
            post_id: Uuid::new_v4(),
            source_sequence_no: seq,
            content: content.to_string(),
            author: author.map(str::to_string),
            timestamp: ts,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_sorted_ascending_with_blank_line() {
        let posts = vec![post(12, Some("bob"), "second"), post(3, Some("alice"), "first")];
        let text = ContextSynthesizer::default().synthesize(&posts);
        assert_eq!(
            text,
            "[No.3] alice (2024-01-02 03:04:05)\nfirst\n\n[No.12] bob (2024-01-02 03:04:05)\nsecond"
        );
    }

    #[test]
    fn test_missing_author_uses_anonymous_name() {
        let posts = vec![post(1, None, "a"), post(2, Some(""), "b")];
        let text = ContextSynthesizer::new("anon").synthesize(&posts);
        assert!(text.starts_with("[No.1] anon ("));
        assert!(text.contains("[No.2] anon ("));
    }

    #[test]
    fn test_empty_neighborhood() {
        assert_eq!(ContextSynthesizer::default().synthesize(&[]), "");
    }
}
