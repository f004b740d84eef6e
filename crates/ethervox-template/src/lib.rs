//! Chat template catalog for EthervoxAI.
//!
//! Maps a model family to its framing tokens (system/user/assistant
//! open/close markers, tool-result wrappers, stop sequences). The catalog is
//! immutable and has no runtime state — the Governor resolves one template
//! at model-load time and treats it as frozen for the process lifetime.

pub mod catalog;
pub mod error;
pub mod format;

pub use catalog::{ChatTemplate, TemplateCatalog, has_stop_sequence};
pub use error::{Result, TemplateError};
pub use format::format_into;
