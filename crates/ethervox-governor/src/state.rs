//! The Governor's lifecycle state machine (spec.md §4.5.4):
//! `Uninitialized -> Initialized -> ModelLoaded -> [Executing <-> ModelLoaded] -> TornDown`.
//! `Executing` is only ever observed from inside a single `execute` call —
//! by the time it returns control to the caller the Governor is back to
//! `ModelLoaded` (the "Idle" state of the spec's table, folded in here since
//! nothing distinguishes it structurally).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    Uninitialized,
    Initialized,
    ModelLoaded,
    Executing,
    TornDown,
}

/// KV-cache and framing bookkeeping carried between `execute` calls. Exposed
/// read-only for diagnostics and tests; the Governor is the only writer.
#[derive(Debug, Clone, Default)]
pub struct GovernorState {
    pub model_path: String,
    pub system_prompt_token_count: u32,
    pub current_kv_pos: u32,
    pub last_iteration_count: u32,
    pub initialized: bool,
    pub llm_loaded: bool,
}
