//! Token bridge between the answer-producing task and its consumer
//!
//! The producer pushes tokens onto an unbounded queue and raises a one-shot
//! done flag; the consumer drains the queue and stops only once the flag is
//! set and nothing is left to read.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::RagAnswer;
use crate::BoardRagError;
use crate::Result;

/// Producer half
#[derive(Debug, Clone)]
pub struct TokenSink {
    tx: mpsc::UnboundedSender<String>,
    done: Arc<AtomicBool>,
}

impl TokenSink {
    /// Queue a token; a consumer that went away is not an error
    pub fn send(&self, token: String) {
        let _ = self.tx.send(token);
    }

    /// Raise the done flag; returns true only for the first caller
    pub fn finish(&self) -> bool {
        !self.done.swap(true, Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

/// Consumer half
#[derive(Debug)]
pub struct TokenStream {
    rx: mpsc::UnboundedReceiver<String>,
    done: Arc<AtomicBool>,
    poll_interval: Duration,
    cancel: CancellationToken,
}

/// Connected sink and stream
pub fn token_channel(poll_interval: Duration, cancel: CancellationToken) -> (TokenSink, TokenStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let done = Arc::new(AtomicBool::new(false));
    (
        TokenSink {
            tx,
            done: Arc::clone(&done),
        },
        TokenStream {
            rx,
            done,
            poll_interval,
            cancel,
        },
    )
}

impl TokenStream {
    /// Next token in production order, `None` once finished or cancelled
    pub async fn next_token(&mut self) -> Option<String> {
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return None,
                received = tokio::time::timeout(self.poll_interval, self.rx.recv()) => {
                    match received {
                        Ok(Some(token)) => return Some(token),
                        Ok(None) => return None,
                        Err(_) if self.done.load(Ordering::SeqCst) => {
                            // A token may have landed between the timeout and the flag check
                            return match self.rx.try_recv() {
                                Ok(token) => Some(token),
                                Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
                            };
                        }
                        Err(_) => {}
                    }
                }
            }
        }
    }

    /// Stops delivery to this consumer; the producer keeps running
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn into_stream(self) -> impl Stream<Item = String> + Send {
        futures::stream::unfold(self, |mut tokens| async move {
            tokens.next_token().await.map(|token| (token, tokens))
        })
    }
}

/// Handle to the producer task
#[derive(Debug)]
pub struct AnswerTask {
    handle: JoinHandle<Result<RagAnswer>>,
}

impl AnswerTask {
    pub(crate) const fn new(handle: JoinHandle<Result<RagAnswer>>) -> Self {
        Self { handle }
    }

    /// Wait for the structured result
    pub async fn finish(self) -> Result<RagAnswer> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(BoardRagError::Generation(format!("Answer task failed: {e}"))),
        }
    }
}

/// Tokens as they are generated, then the full answer with citations
#[derive(Debug)]
pub struct StreamingAnswer {
    pub tokens: TokenStream,
    pub result: AnswerTask,
}

impl StreamingAnswer {
    /// Drain every token into `on_token`, then wait for the result
    pub async fn forward<F>(mut self, mut on_token: F) -> Result<RagAnswer>
    where
        F: FnMut(&str) + Send,
    {
        while let Some(token) = self.tokens.next_token().await {
            on_token(&token);
        }
        self.result.finish().await
    }
}
