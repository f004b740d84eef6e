/// Outcome of one `execute` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovernorStatus {
    /// The model produced a final answer without running out of iterations,
    /// time, or tokens.
    Success,
    /// `max_iterations` was reached, or the wall-clock timeout fired.
    Timeout,
    /// A fatal inference error (tokenize/decode) aborted the run.
    Error,
}
