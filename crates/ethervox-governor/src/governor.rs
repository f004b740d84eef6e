//! The reasoning loop itself (spec.md §4.5).
//!
//! `execute` takes the backend out of `self` for the duration of the call so
//! its helper methods can hold `&mut self` and `&mut dyn LlmBackend`
//! simultaneously without aliasing the same field — the backend is put back
//! before returning, on every exit path.

use std::time::{Duration, Instant};

use ethervox_llm::{LlmBackend, Token};
use ethervox_registry::{CorrectionsSource, PlatformMode, ToolRegistry};
use ethervox_template::{ChatTemplate, TemplateCatalog};
use std::sync::Arc;
use uuid::Uuid;

use crate::cancellation::CancellationToken;
use crate::config::GovernorConfig;
use crate::error::{GovernorError, Result};
use crate::metrics::GovernorMetrics;
use crate::progress::{emit, ProgressCallback, ProgressEvent, TokenCallback};
use crate::state::{GovernorState, Lifecycle};
use crate::status::GovernorStatus;
use crate::streaming;

const CHUNK_SIZE: usize = 1024;
const BRIEF_ANSWER_TOKEN_THRESHOLD: usize = 32;

/// Outcome of one `execute` call.
#[derive(Debug, Clone)]
pub struct ExecuteOutcome {
    pub status: GovernorStatus,
    pub response: String,
    pub error: Option<String>,
    pub metrics: GovernorMetrics,
}

/// Drives a loaded model through iterative think -> call-tool -> observe
/// cycles until it produces a final answer, runs out of iterations, or times
/// out.
pub struct Governor {
    config: GovernorConfig,
    registry: Arc<ToolRegistry>,
    template: &'static ChatTemplate,
    backend: Option<Box<dyn LlmBackend>>,
    lifecycle: Lifecycle,
    system_prompt_token_count: u32,
    current_kv_pos: u32,
    prefix_text: String,
    prefix_tokens: Vec<Token>,
    suffix_text: String,
    suffix_tokens: Vec<Token>,
    last_iteration_count: u32,
    model_path: String,
}

impl Governor {
    /// `C2`'s registry should already hold every tool the system prompt will
    /// advertise by the time this is called.
    pub fn init(config: GovernorConfig, registry: Arc<ToolRegistry>) -> Self {
        Self {
            config,
            registry,
            template: TemplateCatalog::get(Some("qwen"), ""),
            backend: None,
            lifecycle: Lifecycle::Initialized,
            system_prompt_token_count: 0,
            current_kv_pos: 0,
            prefix_text: String::new(),
            prefix_tokens: Vec::new(),
            suffix_text: String::new(),
            suffix_tokens: Vec::new(),
            last_iteration_count: 0,
            model_path: String::new(),
        }
    }

    pub fn state(&self) -> GovernorState {
        GovernorState {
            model_path: self.model_path.clone(),
            system_prompt_token_count: self.system_prompt_token_count,
            current_kv_pos: self.current_kv_pos,
            last_iteration_count: self.last_iteration_count,
            initialized: !matches!(self.lifecycle, Lifecycle::Uninitialized),
            llm_loaded: self.backend.is_some(),
        }
    }

    /// Load `backend`, resolve the chat template for `model_path`, synthesize
    /// the system prompt from the registry (folding in `memory`'s corrections
    /// and patterns if given), and prefill the KV cache with it.
    pub fn load_model(
        &mut self,
        model_path: &str,
        family: Option<&str>,
        platform: PlatformMode,
        memory: Option<&dyn CorrectionsSource>,
        mut backend: Box<dyn LlmBackend>,
    ) -> Result<()> {
        if !matches!(self.lifecycle, Lifecycle::Initialized) {
            return Err(GovernorError::AlreadyInitialized);
        }

        let template = TemplateCatalog::get(family, model_path);
        let system_prompt = self.registry.build_system_prompt(template, platform, memory)?;

        let tokens = backend
            .tokenize(&system_prompt)
            .map_err(|e| GovernorError::TokenizeFailed(e.to_string()))?;

        decode_chunked(backend.as_mut(), &tokens, 0)?;

        self.template = template;
        self.system_prompt_token_count = tokens.len() as u32;
        self.current_kv_pos = tokens.len() as u32;
        self.model_path = model_path.to_string();

        self.prefix_text = format!("{}{}", template.user_open, template.tool_result_open);
        self.suffix_text = format!(
            "{}{}{}",
            template.tool_result_close, template.user_close, template.assistant_open
        );
        self.prefix_tokens = backend
            .tokenize(&self.prefix_text)
            .map_err(|e| GovernorError::TokenizeFailed(e.to_string()))?;
        self.suffix_tokens = backend
            .tokenize(&self.suffix_text)
            .map_err(|e| GovernorError::TokenizeFailed(e.to_string()))?;

        self.backend = Some(backend);
        self.lifecycle = Lifecycle::ModelLoaded;
        tracing::info!(model_path, tokens = self.system_prompt_token_count, "model loaded");
        Ok(())
    }

    /// Run the reasoning loop for `user_query`. `progress_cb` and `token_cb`
    /// are invoked synchronously on the caller's thread; `cancel` is checked
    /// at each iteration boundary alongside the wall-clock timeout.
    pub fn execute(
        &mut self,
        user_query: &str,
        progress_cb: Option<ProgressCallback>,
        token_cb: Option<TokenCallback>,
        cancel: Option<CancellationToken>,
    ) -> Result<ExecuteOutcome> {
        if !matches!(self.lifecycle, Lifecycle::ModelLoaded) {
            return Err(GovernorError::NotLoaded);
        }
        let mut backend = self.backend.take().ok_or(GovernorError::NotLoaded)?;
        self.lifecycle = Lifecycle::Executing;

        let invocation_id = Uuid::now_v7();
        let start = Instant::now();
        backend.kv_cache_remove_from(self.system_prompt_token_count);
        self.current_kv_pos = self.system_prompt_token_count;

        let mut conversation = format!(
            "{}{}{}{}",
            self.template.user_open, user_query, self.template.user_close, self.template.assistant_open
        );
        let mut processed_len = 0usize;
        let mut tool_calls_made = 0u32;
        let mut tokens_generated = 0u64;
        let mut confidence = 0.0f64;
        let mut any_tool_call_emitted = false;
        let mut iterations_run = 0u32;

        let outcome = 'outer: loop {
            if iterations_run >= self.config.max_iterations {
                break 'outer finish(
                    GovernorStatus::Timeout,
                    String::new(),
                    Some("max-iterations-reached".to_string()),
                    iterations_run,
                    tool_calls_made,
                    tokens_generated,
                    start.elapsed(),
                    confidence,
                );
            }
            if cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                break 'outer finish(
                    GovernorStatus::Timeout,
                    String::new(),
                    Some("cancelled".to_string()),
                    iterations_run,
                    tool_calls_made,
                    tokens_generated,
                    start.elapsed(),
                    confidence,
                );
            }
            if start.elapsed() > Duration::from_secs(self.config.timeout_seconds) {
                break 'outer finish(
                    GovernorStatus::Timeout,
                    String::new(),
                    Some("timeout".to_string()),
                    iterations_run,
                    tool_calls_made,
                    tokens_generated,
                    start.elapsed(),
                    confidence,
                );
            }

            iterations_run += 1;
            self.last_iteration_count = iterations_run;
            emit(&progress_cb, ProgressEvent::IterationStart { invocation_id, iteration: iterations_run });
            emit(&progress_cb, ProgressEvent::Thinking { invocation_id, iteration: iterations_run });

            if processed_len < conversation.len() {
                let tail = &conversation[processed_len..];
                let tokens = match backend.tokenize(tail) {
                    Ok(t) => t,
                    Err(e) => {
                        break 'outer finish(
                            GovernorStatus::Error,
                            String::new(),
                            Some(format!("tokenize-failed: {e}")),
                            iterations_run,
                            tool_calls_made,
                            tokens_generated,
                            start.elapsed(),
                            confidence,
                        );
                    }
                };
                let n = tokens.len() as u32;
                if n > 0 {
                    let logits_at = [tokens.len() - 1];
                    if let Err(e) = backend.decode_batch(&tokens, self.current_kv_pos, &logits_at) {
                        break 'outer finish(
                            GovernorStatus::Error,
                            String::new(),
                            Some(format!("decode-failed: {e}")),
                            iterations_run,
                            tool_calls_made,
                            tokens_generated,
                            start.elapsed(),
                            confidence,
                        );
                    }
                    self.current_kv_pos += n;
                }
                processed_len = conversation.len();
            }

            let mut accumulator = String::new();
            let mut generated = 0usize;
            let mut decode_failure: Option<String> = None;
            while generated < self.config.max_tokens_per_response {
                let token = backend.sample(0);
                if backend.is_end_of_generation(token) {
                    break;
                }
                let piece = backend.decode_text(token);
                accumulator.push_str(&piece);
                generated += 1;
                tokens_generated += 1;

                if streaming::is_forwardable(&accumulator, &piece, self.template) {
                    if let Some(cb) = &token_cb {
                        cb(&piece);
                    }
                }

                if let Some(pos) = streaming::earliest_stop_offset(&accumulator, self.template) {
                    accumulator.truncate(pos);
                    break;
                }

                if let Err(e) = backend.decode_batch(&[token], self.current_kv_pos, &[0]) {
                    decode_failure = Some(e.to_string());
                    break;
                }
                self.current_kv_pos += 1;

                if streaming::has_complete_tool_call(&accumulator) {
                    break;
                }
                if streaming::truncate_at_hallucination(&mut accumulator) {
                    break;
                }
                if any_tool_call_emitted && generated > BRIEF_ANSWER_TOKEN_THRESHOLD {
                    break;
                }
            }

            if let Some(e) = decode_failure {
                break 'outer finish(
                    GovernorStatus::Error,
                    String::new(),
                    Some(format!("decode-failed: {e}")),
                    iterations_run,
                    tool_calls_made,
                    tokens_generated,
                    start.elapsed(),
                    confidence,
                );
            }

            if let Some(c) = streaming::harvest_confidence(&accumulator) {
                confidence = c;
                emit(&progress_cb, ProgressEvent::ConfidenceUpdate { invocation_id, confidence });
            }

            let batch = ethervox_extract::extract_and_dispatch(
                &accumulator,
                &self.registry,
                self.config.max_tool_calls_per_iteration,
            );

            if batch.outcomes.is_empty() {
                break 'outer finish(
                    GovernorStatus::Success,
                    accumulator,
                    None,
                    iterations_run,
                    tool_calls_made,
                    tokens_generated,
                    start.elapsed(),
                    confidence,
                );
            }

            any_tool_call_emitted = true;
            tool_calls_made += batch.outcomes.len() as u32;
            conversation.push_str(&accumulator);

            let mut injection_failure: Option<String> = None;
            for call_outcome in &batch.outcomes {
                let name = call_outcome.name.clone().unwrap_or_else(|| "<unnamed>".to_string());
                match &call_outcome.result {
                    Ok(result_text) => {
                        emit(
                            &progress_cb,
                            ProgressEvent::ToolCall {
                                invocation_id,
                                name: name.clone(),
                                arguments: serde_json::Value::Null,
                            },
                        );
                        emit(
                            &progress_cb,
                            ProgressEvent::ToolResult {
                                invocation_id,
                                name: name.clone(),
                                result: result_text.clone(),
                            },
                        );

                        if let Err(e) = self.inject_tool_result(backend.as_mut(), result_text) {
                            injection_failure = Some(e.to_string());
                            break;
                        }
                        conversation.push_str(&self.prefix_text);
                        conversation.push_str(result_text);
                        conversation.push_str(&self.suffix_text);
                    }
                    Err(e) => {
                        let message = e.to_string();
                        emit(
                            &progress_cb,
                            ProgressEvent::ToolError { invocation_id, name: name.clone(), error: message.clone() },
                        );
                        let error_text = format!("<tool_error>{message}</tool_error>");

                        if let Err(e) = self.inject_plain_text(backend.as_mut(), &error_text) {
                            injection_failure = Some(e.to_string());
                            break;
                        }
                        conversation.push_str(&error_text);
                    }
                }
            }

            if let Some(message) = injection_failure {
                break 'outer finish(
                    GovernorStatus::Error,
                    String::new(),
                    Some(message),
                    iterations_run,
                    tool_calls_made,
                    tokens_generated,
                    start.elapsed(),
                    confidence,
                );
            }
            processed_len = conversation.len();
        };

        self.backend = Some(backend);
        self.lifecycle = Lifecycle::ModelLoaded;
        emit(&progress_cb, ProgressEvent::Complete { invocation_id, status: outcome.status });
        Ok(outcome)
    }

    /// Splice a successful tool result into the KV cache using the cached
    /// prefix/suffix framing tokens, tokenizing only the variable result
    /// text (spec.md §4.5.3 step 6's "no re-tokenization" requirement).
    fn inject_tool_result(&mut self, backend: &mut dyn LlmBackend, result_text: &str) -> Result<()> {
        let prefix = self.prefix_tokens.clone();
        let suffix = self.suffix_tokens.clone();
        self.decode_advance(backend, &prefix)?;

        let result_tokens = backend
            .tokenize(result_text)
            .map_err(|e| GovernorError::TokenizeFailed(e.to_string()))?;
        self.decode_advance(backend, &result_tokens)?;
        self.decode_advance(backend, &suffix)?;
        Ok(())
    }

    /// Tokenize and decode arbitrary text directly (used for `<tool_error>`
    /// segments, which have no cached framing to reuse, per spec.md §4.5.5).
    fn inject_plain_text(&mut self, backend: &mut dyn LlmBackend, text: &str) -> Result<()> {
        let tokens = backend
            .tokenize(text)
            .map_err(|e| GovernorError::TokenizeFailed(e.to_string()))?;
        self.decode_advance(backend, &tokens)
    }

    fn decode_advance(&mut self, backend: &mut dyn LlmBackend, tokens: &[Token]) -> Result<()> {
        if tokens.is_empty() {
            return Ok(());
        }
        let logits_at = [tokens.len() - 1];
        backend
            .decode_batch(tokens, self.current_kv_pos, &logits_at)
            .map_err(|e| GovernorError::DecodeFailed(e.to_string()))?;
        self.current_kv_pos += tokens.len() as u32;
        Ok(())
    }

    /// Tear the Governor down: drop the backend and reset KV-cache
    /// bookkeeping. A torn-down Governor cannot be reused.
    pub fn cleanup(&mut self) {
        self.backend = None;
        self.lifecycle = Lifecycle::TornDown;
        self.current_kv_pos = 0;
        tracing::info!("governor torn down");
    }
}

fn decode_chunked(backend: &mut dyn LlmBackend, tokens: &[Token], start_pos: u32) -> Result<()> {
    for (i, chunk) in tokens.chunks(CHUNK_SIZE).enumerate() {
        let chunk_start = start_pos + (i * CHUNK_SIZE) as u32;
        let is_last = chunk_start as usize + chunk.len() == start_pos as usize + tokens.len();
        let logits_at: &[usize] = if is_last && !chunk.is_empty() { &[chunk.len() - 1] } else { &[] };
        backend
            .decode_batch(chunk, chunk_start, logits_at)
            .map_err(|e| GovernorError::DecodeFailed(e.to_string()))?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn finish(
    status: GovernorStatus,
    response: String,
    error: Option<String>,
    iteration_count: u32,
    tool_calls_made: u32,
    tokens_generated: u64,
    elapsed: Duration,
    confidence: f64,
) -> ExecuteOutcome {
    ExecuteOutcome {
        status,
        response,
        error,
        metrics: GovernorMetrics {
            iteration_count,
            tool_calls_made,
            tokens_generated,
            elapsed,
            confidence,
        },
    }
}
