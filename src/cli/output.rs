//! Terminal output for the `boardrag` commands

use crate::index::IndexReport;
use crate::models::Citation;
use crate::models::IndexStatus;
use crate::AppConfig;

/// Cut to `max_chars` characters, appending `...` when anything was dropped
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_at, _)) => format!("{}...", &s[..byte_at]),
        None => s.to_string(),
    }
}

/// Print index status
pub fn print_status(status: &IndexStatus) {
    println!("📊 BoardRAG Status");
    println!("==================");
    println!("  Total posts: {}", status.total_posts);
    if status.total_posts > 0 {
        println!("  Sequence range: No.{} - No.{}", status.min_seq, status.max_seq);
    }
    match status.last_sync_time {
        Some(ts) => println!("  Last sync: {}", ts.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("  Last sync: never"),
    }
}

/// Print citations after a streamed answer
pub fn print_citations(citations: &[Citation]) {
    if citations.is_empty() {
        return;
    }
    println!();
    println!("📚 Sources:");
    for citation in citations {
        println!(
            "  [No.{}] {} ({})",
            citation.source_sequence_no,
            citation.author,
            citation.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
        println!("      {}", truncate_str(&citation.excerpt, 80));
    }
}

pub fn print_index_report(report: &IndexReport) {
    print_success(&format!(
        "Indexed {} new and {} updated posts ({} posts in index)",
        report.new_indexed, report.updated, report.total_indexed
    ));
}

/// Print configuration
pub fn print_config(config: &AppConfig) {
    println!("📋 BoardRAG Configuration:");
    println!();

    println!("🗄️  Database:");
    println!("  URL: {}", mask_database_url(config.database_url()));
    println!("  Max connections: {}", config.max_connections());
    println!("  Min connections: {}", config.min_connections());
    println!("  Connection timeout: {}s", config.connection_timeout());
    println!();

    println!("📥 Source:");
    println!("  URL: {}", mask_database_url(config.source_url()));
    println!("  Max connections: {}", config.source.max_connections);
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Backtrace: {}", config.logging.backtrace);
    println!();

    println!("🧠 Embeddings:");
    println!("  Dimension: {}", config.embedding_dimension());
    println!("  Model: {}", config.embedding_model());
    println!();

    println!("🔄 Sync:");
    println!("  Batch size: {}", config.sync.batch_size);
    println!("  Link window: {}", config.sync.link_window);
    println!("  Interval: {}s", config.sync.interval_secs);
    println!("  Error backoff: {}s", config.sync_error_backoff_secs());
    println!();

    println!("🗂️  Index:");
    println!("  Batch size: {}", config.index.batch_size);
    println!("  Checkpoint: {}", config.index.checkpoint_path.display());
    println!();

    println!("🔎 RAG:");
    println!("  Top k: {}", config.rag.top_k);
    println!("  Window posts: {}", config.rag.window_posts);
    println!(
        "  Graph limits: depth {}, nodes {}",
        config.rag.max_depth, config.rag.max_nodes
    );
    println!("  Citation limit: {}", config.rag.citation_limit);
    println!();

    println!("🤖 LLM:");
    println!("  Endpoint: {}", config.llm_endpoint());
    println!("  Model: {}", config.llm_model());
    println!("  Key: {}", mask_secret(config.llm_key()));
    println!();

    println!("🌐 API:");
    println!("  Bind: {}:{}", config.api.host, config.api.port);
    println!("  CORS: {}", config.api.enable_cors);
}

/// Connection URL without password or database path
fn mask_database_url(url: &str) -> String {
    let Ok(parsed) = url::Url::parse(url) else {
        return "<invalid url>".to_string();
    };
    match parsed.host_str() {
        Some(host) => format!(
            "{}://{}@{}:{}",
            parsed.scheme(),
            parsed.username(),
            host,
            parsed.port().unwrap_or(5432)
        ),
        None => "<masked>".to_string(),
    }
}

/// Keep the first four characters of a key
fn mask_secret(secret: &str) -> String {
    if secret.chars().count() <= 8 {
        "********".to_string()
    } else {
        let head: String = secret.chars().take(4).collect();
        format!("{head}********")
    }
}

pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}
