//! Question answering handler

use std::io::Write;

use crate::app::BoardRag;
use crate::cli::output::print_citations;
use crate::Result;

/// Stream the answer to stdout, then list citations
pub async fn handle_ask_command(app: &BoardRag, question: String) -> Result<()> {
    println!("🤔 {question}");
    println!();

    let answer = app
        .ask_streaming(question)
        .forward(|token| {
            print!("{token}");
            let _ = std::io::stdout().flush();
        })
        .await?;
    println!();

    print_citations(&answer.citations);
    tracing::debug!(
        "Answered from {} context posts ({} seeds, depth {})",
        answer.stats.total_posts,
        answer.stats.seed_posts,
        answer.stats.depth_reached
    );
    Ok(())
}
