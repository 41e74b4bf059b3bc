//! Pipeline orchestrator — one briefing run, end to end.
//!
//! `START → COLLECT → DEDUPE → {EMPTY: idle notice | NONEMPTY: GENERATE →
//! DELIVER} → END`. Linear, single pass; repeated execution by an external
//! scheduler provides the periodic behavior. The seen-item store is the only
//! state carried between invocations, and it is written exactly once, inside
//! DEDUPE, regardless of what happens downstream.

use std::sync::Arc;

use crate::collect::{self, Collector};
use crate::config::{BriefConfig, IdleNotice};
use crate::deliver::{self, Formatting, MessageSink};
use crate::error::PipelineError;
use crate::generate::GenerationClient;
use crate::prompt;
use crate::store::{self, SeenStore};

/// External collaborators of one run.
pub struct PipelineDeps {
    pub collectors: Vec<Arc<dyn Collector>>,
    pub store: Arc<dyn SeenStore>,
    pub generator: GenerationClient,
    pub sink: Arc<dyn MessageSink>,
}

/// What one run did, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub collected: usize,
    pub novel: usize,
    /// Whether the generation backend was invoked.
    pub generated: bool,
    /// Whether anything was handed to the sink.
    pub delivered: bool,
}

pub struct Pipeline {
    config: BriefConfig,
    deps: PipelineDeps,
}

impl Pipeline {
    pub fn new(config: BriefConfig, deps: PipelineDeps) -> Self {
        Self { config, deps }
    }

    /// Execute one briefing run.
    pub async fn run_once(&self) -> Result<RunReport, PipelineError> {
        // COLLECT
        let batch = collect::collect_all(&self.deps.collectors).await;

        // DEDUPE — the store write happens in here, exactly once.
        let novel = store::dedupe(
            self.deps.store.as_ref(),
            &batch,
            self.config.store_write_policy,
        )
        .await?;

        // EMPTY path
        if novel.is_empty() {
            return match self.config.idle_notice {
                IdleNotice::Silent => {
                    tracing::info!("No novel items; ending run silently");
                    Ok(RunReport {
                        collected: batch.len(),
                        novel: 0,
                        generated: false,
                        delivered: false,
                    })
                }
                IdleNotice::Notify => {
                    tracing::info!("No novel items; sending idle notice");
                    self.deps
                        .sink
                        .send(prompt::IDLE_NOTICE, Formatting::Plain)
                        .await?;
                    Ok(RunReport {
                        collected: batch.len(),
                        novel: 0,
                        generated: false,
                        delivered: true,
                    })
                }
            };
        }

        // GENERATE — never fails; exhaustion yields a diagnostic text.
        let briefing_prompt = prompt::build_briefing_prompt(&novel);
        let text = self.deps.generator.generate(&briefing_prompt).await;

        // DELIVER
        deliver::deliver(
            self.deps.sink.as_ref(),
            &text,
            self.config.chunk_limit,
            self.config.send_pause,
        )
        .await?;

        Ok(RunReport {
            collected: batch.len(),
            novel: novel.len(),
            generated: true,
            delivered: true,
        })
    }
}
