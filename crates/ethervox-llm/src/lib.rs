//! The LLM inference backend trait boundary the Governor is coded against.
//!
//! Not an inference engine — model loading, decode kernels, and GPU offload
//! stay out of scope. [`LlmBackend`] is the seam a real backend plugs into;
//! [`mock::MockLlmBackend`] is a scripted test double used by the Governor's
//! own test suite.

pub mod backend;
pub mod error;
pub mod mock;
pub mod token;

pub use backend::LlmBackend;
pub use error::{LlmError, Result};
pub use mock::MockLlmBackend;
pub use token::Token;
