//! Orchestrator - classify → plan → generate → validate → explain → commit
//!
//! One `run` call owns one request. Progress flows out through a bounded
//! channel in generation order. Cancellation before the commit point drops
//! whatever model call is in flight and leaves the version store untouched;
//! once a version is committed the turn is `Completed`.

use std::sync::Arc;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use ryze_config::PipelineConfig;
use ryze_core::{
    tree_to_code, AgentStep, ComponentNode, PlanOutput, ProgressEvent, StoreError, Version,
    VersionStore,
};
use ryze_llm::{strip_code_fences, ModelGateway};

use crate::stages::{
    Explainer, GeneratedTree, Intent, IntentClassifier, Planner, StageError, TreeGenerator,
};

/// One prior message of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Input of one generation turn.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub message: String,
    /// Tree to modify; defaults to the latest committed version.
    pub previous_tree: Option<ComponentNode>,
    pub pro_mode: bool,
    pub history: Vec<ChatTurn>,
}

impl GenerationRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Completed { version: Version },
    Chat { response: String },
    Failed { message: String },
    Cancelled,
}

/// Orchestrator errors
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("generation cancelled")]
    Cancelled,
}

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Render code with the tree and stream it as chunks.
    pub emit_code: bool,
    /// Lines per code chunk event.
    pub code_chunk_lines: usize,
    /// Capacity of the progress channel created by `spawn`.
    pub event_buffer: usize,
    /// Most recent conversation turns handed to the planner (0 = none).
    pub max_history: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for OrchestratorConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            emit_code: config.emit_code,
            code_chunk_lines: config.code_chunk_lines.max(1),
            event_buffer: config.event_buffer.max(1),
            max_history: config.max_history,
        }
    }
}

/// Running generation started by [`Orchestrator::spawn`].
pub struct GenerationHandle {
    pub events: mpsc::Receiver<ProgressEvent>,
    pub cancel: CancellationToken,
    pub task: JoinHandle<PipelineOutcome>,
}

/// Orchestrator - wires the pipeline stages to the version store
#[derive(Clone)]
pub struct Orchestrator {
    classifier: IntentClassifier,
    planner: Planner,
    generator: TreeGenerator,
    explainer: Explainer,
    store: Arc<dyn VersionStore>,
    config: OrchestratorConfig,
}

/// Output of the cancellable part of a turn.
enum Prepared {
    Chat(String),
    Ready {
        tree: ComponentNode,
        code: Option<String>,
        explanation: String,
    },
}

/// Sends progress events; a closed receiver counts as cancellation.
struct Emitter {
    sink: mpsc::Sender<ProgressEvent>,
    cancel: CancellationToken,
}

impl Emitter {
    async fn emit(&self, event: ProgressEvent) -> Result<(), OrchestratorError> {
        if self.cancel.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }
        if let Some(step) = event.step {
            info!(step = step.as_str(), "pipeline step");
        }
        self.sink.send(event).await.map_err(|_| {
            self.cancel.cancel();
            OrchestratorError::Cancelled
        })
    }

    /// Send without failing the turn. Waits for channel capacity only until
    /// the token is cancelled.
    async fn deliver(&self, event: ProgressEvent) {
        tokio::select! {
            biased;
            sent = self.sink.send(event) => {
                if sent.is_err() {
                    warn!("consumer gone before the terminal event");
                }
            }
            _ = self.cancel.cancelled() => {
                warn!("terminal event dropped, consumer cancelled after commit");
            }
        }
    }
}

impl Orchestrator {
    /// Create an orchestrator whose stages share one gateway.
    pub fn new(gateway: ModelGateway, store: Arc<dyn VersionStore>) -> Self {
        Self::with_config(gateway, store, OrchestratorConfig::default())
    }

    pub fn with_config(
        gateway: ModelGateway,
        store: Arc<dyn VersionStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(gateway.clone()),
            planner: Planner::new(gateway.clone()),
            generator: TreeGenerator::new(gateway.clone()),
            explainer: Explainer::new(gateway),
            store,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn VersionStore> {
        &self.store
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run one turn on a background task.
    pub fn spawn(&self, request: GenerationRequest) -> GenerationHandle {
        let (sink, events) = mpsc::channel(self.config.event_buffer);
        let cancel = CancellationToken::new();
        let orchestrator = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move { orchestrator.run(request, sink, token).await });
        GenerationHandle {
            events,
            cancel,
            task,
        }
    }

    /// Run one turn, reporting progress to `sink`.
    ///
    /// Stage failures produce a single `error` event. Cancellation produces
    /// no terminal event and commits nothing, unless it lands after the
    /// commit point, in which case the outcome is still `Completed`.
    pub async fn run(
        &self,
        request: GenerationRequest,
        sink: mpsc::Sender<ProgressEvent>,
        cancel: CancellationToken,
    ) -> PipelineOutcome {
        let emitter = Emitter {
            sink,
            cancel: cancel.clone(),
        };
        let prepared = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(OrchestratorError::Cancelled),
            prepared = self.execute(request, &emitter) => prepared,
        };
        let result = match prepared {
            Ok(Prepared::Chat(response)) => Ok(PipelineOutcome::Chat { response }),
            Ok(Prepared::Ready {
                tree,
                code,
                explanation,
            }) => self.commit(tree, code, explanation, &emitter).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(outcome) => outcome,
            Err(OrchestratorError::Cancelled) => {
                info!("generation cancelled");
                PipelineOutcome::Cancelled
            }
            Err(err) => {
                let message = err.to_string();
                warn!(error = %message, "generation failed");
                // Best effort; the consumer may already be gone.
                let _ = emitter.emit(ProgressEvent::error(message.clone())).await;
                PipelineOutcome::Failed { message }
            }
        }
    }

    async fn execute(
        &self,
        request: GenerationRequest,
        emitter: &Emitter,
    ) -> Result<Prepared, OrchestratorError> {
        let previous = match request.previous_tree {
            Some(tree) => Some(tree),
            None => self.store.latest().await?.map(|v| v.component_tree),
        };
        let previous = previous.as_ref();

        let intent = self
            .classifier
            .classify(&request.message, previous.is_some())
            .await?;
        if let Intent::Chat { response } = intent {
            emitter
                .emit(ProgressEvent::direct_response(response.clone()))
                .await?;
            return Ok(Prepared::Chat(response));
        }

        emitter
            .emit(ProgressEvent::step(
                AgentStep::Planning,
                "Analyzing your request and planning the UI structure...",
            ))
            .await?;
        let history = recent_history(&request.history, self.config.max_history);
        let plan = self
            .planner
            .plan(&request.message, previous, request.pro_mode, history)
            .await?;
        emitter
            .emit(
                ProgressEvent::step(
                    AgentStep::PlanComplete,
                    "Plan created. Generating the component tree...",
                )
                .with_plan(plan.clone()),
            )
            .await?;

        emitter
            .emit(ProgressEvent::step(
                AgentStep::Generating,
                "Generating the component tree from the plan...",
            ))
            .await?;
        let GeneratedTree { tree, warnings } = self
            .generator
            .generate(&plan, previous, request.pro_mode)
            .await?;
        emitter
            .emit(
                ProgressEvent::step(
                    AgentStep::GenerateComplete,
                    "Component tree generated. Preparing explanation...",
                )
                .with_tree(tree.clone())
                .with_warnings(warnings),
            )
            .await?;

        let code = self.config.emit_code.then(|| tree_to_code(&tree));
        if let Some(code) = &code {
            for chunk in code_chunks(code, self.config.code_chunk_lines) {
                emitter.emit(ProgressEvent::code_chunk(chunk)).await?;
            }
        }

        emitter
            .emit(ProgressEvent::step(
                AgentStep::Explaining,
                "Explaining the design decisions...",
            ))
            .await?;
        let explanation = self.explanation(&plan, previous, &tree, emitter).await?;
        Ok(Prepared::Ready {
            tree,
            code,
            explanation,
        })
    }

    /// Commit the version and report it. Runs outside the cancellable
    /// region so a committed version is never reported as cancelled.
    async fn commit(
        &self,
        tree: ComponentNode,
        code: Option<String>,
        explanation: String,
        emitter: &Emitter,
    ) -> Result<PipelineOutcome, OrchestratorError> {
        if emitter.cancel.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }
        let version = self
            .store
            .add(tree.clone(), code.clone(), explanation.clone())
            .await?;
        info!(version = version.version, "version committed");

        emitter
            .deliver(ProgressEvent {
                step: Some(AgentStep::Complete),
                explanation: Some(explanation),
                version: Some(version.version),
                component_tree: Some(tree),
                code,
                ..ProgressEvent::default()
            })
            .await;
        Ok(PipelineOutcome::Completed { version })
    }

    /// Stream the explanation, falling back to a single-shot call when the
    /// stream fails to open or breaks midway.
    async fn explanation(
        &self,
        plan: &PlanOutput,
        previous: Option<&ComponentNode>,
        tree: &ComponentNode,
        emitter: &Emitter,
    ) -> Result<String, OrchestratorError> {
        let failure = match self.explainer.explain_stream(plan, previous, tree).await {
            Ok(mut stream) => {
                let mut full = String::new();
                let mut failure = None;
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(chunk) => {
                            full.push_str(&chunk);
                            emitter.emit(ProgressEvent::explanation_chunk(chunk)).await?;
                        }
                        Err(err) => {
                            failure = Some(StageError::from(err));
                            break;
                        }
                    }
                }
                match failure {
                    None => return Ok(strip_code_fences(&full)),
                    Some(err) => err,
                }
            }
            Err(err) => err,
        };

        warn!(error = %failure, "explanation stream failed, falling back to single call");
        let text = self.explainer.explain(plan, previous, tree).await?;
        emitter
            .emit(ProgressEvent::explanation_chunk(text.clone()))
            .await?;
        Ok(text)
    }
}

fn recent_history(history: &[ChatTurn], max: usize) -> &[ChatTurn] {
    &history[history.len().saturating_sub(max)..]
}

/// Split code into groups of `lines` lines; the groups concatenate back to
/// the original text.
fn code_chunks(code: &str, lines: usize) -> Vec<String> {
    let all: Vec<&str> = code.split_inclusive('\n').collect();
    all.chunks(lines.max(1)).map(|group| group.concat()).collect()
}
