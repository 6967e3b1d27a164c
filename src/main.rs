//! JSON-lines driver for the triage engine.
//!
//! Reads one turn request per stdin line:
//!
//! ```text
//! {"conversation_id": "c1", "user_id": "u1", "message": "孩子发烧了",
//!  "intent": "TRIAGE", "entities": {"symptom": "fever", "temperature": "39.2"}}
//! ```
//!
//! and writes one JSON outcome per line to stdout. `intent` and `entities`
//! are the caller's own classification of the message; lines without them
//! run with an empty extraction. Logs go to stderr.

use serde::Deserialize;
use serde_json::{json, Map, Value as JsonValue};
use std::error::Error;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use triage_engine::adapters::{
    FileSessionRecordStorage, InMemoryProfileReader, InMemorySessionRecordStorage,
    MockKnowledgeRetriever, PassthroughExtractor, RedisSessionRecordStorage,
};
use triage_engine::application::{ConversationOrchestrator, SessionStore, TurnCommand};
use triage_engine::config::{AppConfig, LoggingConfig, StoreBackend};
use triage_engine::domain::dialogue::Intent;
use triage_engine::domain::foundation::{ConversationId, UserId};
use triage_engine::domain::triage::TriageRuleEngine;
use triage_engine::ports::{Extraction, SessionRecordStorage, SessionStorageError};

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Deserialize)]
struct TurnRequest {
    conversation_id: Option<String>,
    user_id: String,
    message: String,
    #[serde(default)]
    intent: Option<Intent>,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    entities: Map<String, JsonValue>,
}

impl TurnRequest {
    fn extraction(&self) -> Option<Extraction> {
        if self.intent.is_none() && self.entities.is_empty() {
            return None;
        }
        Some(Extraction {
            intent: self.intent,
            confidence: self.confidence.unwrap_or(1.0),
            entities: self.entities.clone(),
        })
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(logging.env_filter())
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.with_ansi(false).init();
    }
}

async fn build_storage(config: &AppConfig) -> Result<Arc<dyn SessionRecordStorage>, BoxError> {
    let storage: Arc<dyn SessionRecordStorage> = match config.store.backend {
        StoreBackend::Memory => Arc::new(InMemorySessionRecordStorage::new()),
        StoreBackend::File => Arc::new(FileSessionRecordStorage::new(&config.store.data_dir)),
        StoreBackend::Redis => {
            let connect = RedisSessionRecordStorage::connect(
                &config.redis.url,
                &config.redis.key_prefix,
            );
            let storage = tokio::time::timeout(config.redis.timeout(), connect)
                .await
                .map_err(|_| SessionStorageError::Timeout(config.redis.timeout_secs))??;
            Arc::new(storage)
        }
    };
    tracing::info!(backend = ?config.store.backend, "Session storage ready");
    Ok(storage)
}

async fn run_turn(
    orchestrator: &ConversationOrchestrator,
    extractor: &PassthroughExtractor,
    line: &str,
) -> JsonValue {
    let request: TurnRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => return json!({"error": format!("invalid request: {}", e)}),
    };

    let conversation_id = match request.conversation_id.as_deref() {
        Some(id) => match ConversationId::new(id) {
            Ok(id) => id,
            Err(e) => return json!({"error": e.to_string()}),
        },
        None => ConversationId::generate(),
    };
    let user_id = match UserId::new(request.user_id.as_str()) {
        Ok(id) => id,
        Err(e) => return json!({"error": e.to_string()}),
    };

    if let Some(extraction) = request.extraction() {
        extractor.stage(request.message.clone(), extraction);
    }

    let outcome = orchestrator
        .handle(TurnCommand {
            conversation_id: conversation_id.clone(),
            user_id,
            message: request.message,
        })
        .await;

    match outcome {
        Ok(result) => serde_json::to_value(&result)
            .unwrap_or_else(|e| json!({"error": format!("unserializable result: {}", e)})),
        Err(e) => json!({"conversation_id": conversation_id, "error": e.to_string()}),
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);
    config.validate()?;

    let storage = build_storage(&config).await?;
    let store = Arc::new(SessionStore::new(storage, config.store.cache_capacity));
    let engine = Arc::new(TriageRuleEngine::new(config.rules.load_rule_book()));
    let extractor = PassthroughExtractor::new();

    let orchestrator = ConversationOrchestrator::new(
        store,
        engine,
        Arc::new(extractor.clone()),
        Arc::new(InMemoryProfileReader::new()),
        Arc::new(MockKnowledgeRetriever::new()),
    )
    .with_collaborator_timeout(config.orchestrator.collaborator_timeout());

    tracing::info!("Triage engine ready; reading turns from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let outcome = run_turn(&orchestrator, &extractor, &line).await;
        stdout.write_all(outcome.to_string().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    tracing::info!("Input closed; shutting down");
    Ok(())
}
