//! Citation extraction from generated answers

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::database::PostStore;
use crate::models::Citation;
use crate::models::Post;

const CITATION_PATTERN: &str = r"No\.(\d+)";

static CITATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CITATION_PATTERN).expect("citation pattern is a valid regex"));

const EXCERPT_CHARS: usize = 200;

/// Distinct `No.<n>` numbers in order of first appearance
pub fn referenced_numbers(answer: &str) -> Vec<i64> {
    let mut seen = HashSet::new();
    let mut numbers = Vec::new();
    for captures in CITATION_MARKER.captures_iter(answer) {
        let digits = &captures[1];
        match digits.parse::<i64>() {
            Ok(number) if seen.insert(number) => numbers.push(number),
            Ok(_) => {}
            Err(e) => warn!("Ignoring citation No.{}: {}", digits, e),
        }
    }
    numbers
}

/// First 200 characters; longer text is cut to 197 plus an ellipsis
pub fn excerpt(content: &str) -> String {
    if content.chars().count() > EXCERPT_CHARS {
        let cut: String = content.chars().take(EXCERPT_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        content.to_string()
    }
}

pub struct CitationExtractor {
    store: Arc<dyn PostStore>,
    limit: usize,
    scan: usize,
    anonymous_author: String,
}

impl CitationExtractor {
    pub fn new(
        store: Arc<dyn PostStore>,
        limit: usize,
        scan: usize,
        anonymous_author: impl Into<String>,
    ) -> Self {
        Self {
            store,
            limit,
            scan,
            anonymous_author: anonymous_author.into(),
        }
    }

    #[must_use]
    pub fn citation_for(&self, post: &Post) -> Citation {
        Citation {
            source_sequence_no: post.source_sequence_no,
            author: post.display_author(&self.anonymous_author).to_string(),
            timestamp: post.timestamp,
            excerpt: excerpt(&post.content),
        }
    }

    /// Explicit references first, then backfill from the head of the context.
    /// Lookup failures are skipped, never fatal.
    pub async fn extract(&self, answer: &str, context_posts: &[Post]) -> Vec<Citation> {
        let mut citations = Vec::new();
        let mut cited = HashSet::new();

        for number in referenced_numbers(answer) {
            match self.store.post_by_sequence_no(number).await {
                Ok(Some(post)) => {
                    cited.insert(post.source_sequence_no);
                    citations.push(self.citation_for(&post));
                }
                Ok(None) => warn!("Cited post No.{} not found", number),
                Err(e) => warn!("Failed to look up cited post No.{}: {}", number, e),
            }
        }

        for post in context_posts.iter().take(self.scan) {
            if citations.len() >= self.limit {
                break;
            }
            if cited.insert(post.source_sequence_no) {
                citations.push(self.citation_for(post));
            }
        }

        citations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_pattern_compiles() {
        let pattern = Regex::new(CITATION_PATTERN).unwrap();
        assert_eq!(&pattern.captures("No.42 より").unwrap()[1], "42");
        assert_eq!(referenced_numbers("No.7"), vec![7]);
    }

    #[test]
    fn test_numbers_deduplicated_in_first_appearance_order() {
        assert_eq!(
            referenced_numbers("No.12 と No.3 によると… また No.12 も参照"),
            vec![12, 3]
        );
    }

    #[test]
    fn test_overflowing_number_skipped() {
        assert_eq!(
            referenced_numbers("No.99999999999999999999999 and No.5"),
            vec![5]
        );
    }

    #[test]
    fn test_no_markers() {
        assert!(referenced_numbers("分かりません").is_empty());
        assert!(referenced_numbers("No. 5 has a space").is_empty());
    }

    #[test]
    fn test_excerpt_boundaries() {
        let exact = "あ".repeat(200);
        assert_eq!(excerpt(&exact), exact);

        let long = "い".repeat(201);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), 200);
        assert!(cut.ends_with("..."));
        assert!(cut.starts_with(&"い".repeat(197)));
    }
}
