//! Application facade wiring stores, services and pipelines from one config

use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::database::Database;
use crate::database::PostStore;
use crate::embeddings::EmbeddingService;
use crate::index::CheckpointStore;
use crate::index::IndexUpdater;
use crate::index::PgVectorIndex;
use crate::llm::LlmService;
use crate::models::IndexStatus;
use crate::rag::RagAnswer;
use crate::rag::RagService;
use crate::rag::StreamingAnswer;
use crate::sync::PgSource;
use crate::sync::SyncOptions;
use crate::sync::SyncPipeline;
use crate::Result;

/// Main entry point for library users
///
/// ```rust,no_run
/// use boardrag::app::BoardRag;
/// use boardrag::AppConfig;
///
/// # async fn example() -> boardrag::Result<()> {
/// let config = AppConfig::load()?;
/// let app = BoardRag::new(&config).await?;
/// let answer = app.ask("このスレの結論は？").await?;
/// println!("{}", answer.answer);
/// # Ok(())
/// # }
/// ```
pub struct BoardRag {
    config: AppConfig,
    database: Arc<Database>,
    embedding_service: Arc<EmbeddingService>,
    vector_index: Arc<PgVectorIndex>,
    llm_service: Arc<LlmService>,
    rag_service: Arc<RagService>,
}

impl BoardRag {
    /// Connect to the post store and build every service
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let database = Arc::new(Database::from_config(config).await?);
        let embedding_service = Arc::new(EmbeddingService::new(config)?);
        let vector_index = Arc::new(PgVectorIndex::new(
            database.pool().clone(),
            embedding_service.clone(),
        ));
        let llm_service = Arc::new(LlmService::new(config)?);

        let rag_service = Arc::new(RagService::from_services(
            database.clone(),
            vector_index.clone(),
            llm_service.clone(),
            &config.rag,
        ));

        info!(
            "BoardRag ready (embeddings: {}, llm: {})",
            embedding_service.model(),
            llm_service.model()
        );

        Ok(Self {
            config: config.clone(),
            database,
            embedding_service,
            vector_index,
            llm_service,
            rag_service,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }

    #[must_use]
    pub fn embedding_service(&self) -> &Arc<EmbeddingService> {
        &self.embedding_service
    }

    #[must_use]
    pub fn llm_service(&self) -> &Arc<LlmService> {
        &self.llm_service
    }

    #[must_use]
    pub fn vector_index(&self) -> &Arc<PgVectorIndex> {
        &self.vector_index
    }

    #[must_use]
    pub fn rag_service(&self) -> Arc<RagService> {
        Arc::clone(&self.rag_service)
    }

    /// Create the post store schema (idempotent)
    pub async fn init_database(&self) -> Result<()> {
        self.database
            .init_schema(self.config.embedding_dimension())
            .await
    }

    /// Drop every table and the index checkpoint that describes them
    pub async fn reset_database(&self) -> Result<()> {
        self.database.drop_schema().await?;
        self.checkpoint_store().clear()
    }

    #[must_use]
    pub fn checkpoint_store(&self) -> CheckpointStore {
        CheckpointStore::new(self.config.index.checkpoint_path.clone())
    }

    /// Connect to the board source and build a sync pipeline
    pub async fn sync_pipeline(&self, options: SyncOptions) -> Result<SyncPipeline> {
        let source = Arc::new(PgSource::from_config(&self.config).await?);
        Ok(SyncPipeline::new(self.database.clone(), source, options))
    }

    #[must_use]
    pub fn index_updater(&self, batch_size: usize) -> IndexUpdater {
        IndexUpdater::new(
            self.database.clone(),
            self.vector_index.clone(),
            self.checkpoint_store(),
            batch_size,
        )
    }

    pub async fn ask(&self, question: &str) -> Result<RagAnswer> {
        self.rag_service.answer(question).await
    }

    #[must_use]
    pub fn ask_streaming(&self, question: impl Into<String>) -> StreamingAnswer {
        self.rag_service.answer_streaming(question)
    }

    pub async fn status(&self) -> Result<IndexStatus> {
        self.database.status().await
    }
}
