//! Immutable chat-template catalog.
//!
//! Each model family frames a conversation turn with its own open/close
//! markers. The Governor selects a template once at model-load time and
//! treats it as frozen for the lifetime of the process — no mutable state
//! lives here, so a `&'static ChatTemplate` is safe to share across threads.

/// Framing tokens for one model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatTemplate {
    /// Short tag identifying this family (e.g. `"qwen"`, `"granite"`).
    pub family_tag: &'static str,
    pub system_open: &'static str,
    pub system_close: &'static str,
    pub user_open: &'static str,
    pub user_close: &'static str,
    pub assistant_open: &'static str,
    pub assistant_close: &'static str,
    pub tool_result_open: &'static str,
    pub tool_result_close: &'static str,
    /// At most 8 stop sequences, matched as literal substrings.
    pub stop_sequences: &'static [&'static str],
}

const QWEN: ChatTemplate = ChatTemplate {
    family_tag: "qwen",
    system_open: "<|im_start|>system\n",
    system_close: "<|im_end|>\n",
    user_open: "<|im_start|>user\n",
    user_close: "<|im_end|>\n",
    assistant_open: "<|im_start|>assistant\n",
    assistant_close: "<|im_end|>\n",
    tool_result_open: "<tool_result>",
    tool_result_close: "</tool_result>",
    stop_sequences: &["<|im_end|>", "<|im_start|>", "<|endoftext|>"],
};

const GRANITE: ChatTemplate = ChatTemplate {
    family_tag: "granite",
    system_open: "<|system|>\n",
    system_close: "\n",
    user_open: "<|user|>\n",
    user_close: "\n",
    assistant_open: "<|assistant|>\n",
    assistant_close: "\n",
    tool_result_open: "<tool_result>",
    tool_result_close: "</tool_result>",
    stop_sequences: &["<|endoftext|>", "<|user|>", "<|system|>"],
};

const PHI: ChatTemplate = ChatTemplate {
    family_tag: "phi",
    system_open: "<|system|>\n",
    system_close: "<|end|>\n",
    user_open: "<|user|>\n",
    user_close: "<|end|>\n",
    assistant_open: "<|assistant|>\n",
    assistant_close: "<|end|>\n",
    tool_result_open: "<tool_result>",
    tool_result_close: "</tool_result>",
    stop_sequences: &["<|end|>", "<|endoftext|>", "<|user|>"],
};

const LLAMA3: ChatTemplate = ChatTemplate {
    family_tag: "llama-3",
    system_open: "<|start_header_id|>system<|end_header_id|>\n\n",
    system_close: "<|eot_id|>",
    user_open: "<|start_header_id|>user<|end_header_id|>\n\n",
    user_close: "<|eot_id|>",
    assistant_open: "<|start_header_id|>assistant<|end_header_id|>\n\n",
    assistant_close: "<|eot_id|>",
    tool_result_open: "<tool_result>",
    tool_result_close: "</tool_result>",
    stop_sequences: &["<|eot_id|>", "<|end_of_text|>", "<|start_header_id|>"],
};

/// The full catalog of known chat templates. Immutable, safe to share.
pub struct TemplateCatalog;

impl TemplateCatalog {
    /// Resolve a template either by explicit `family` tag or by sniffing
    /// `model_path` (case-insensitive substring match). Falls back to the
    /// Qwen-style template, per spec, when nothing matches.
    pub fn get(family: Option<&str>, model_path: &str) -> &'static ChatTemplate {
        let tag = family.map(str::to_owned).unwrap_or_else(|| Self::detect(model_path));
        match tag.as_str() {
            "granite" => &GRANITE,
            "qwen" => &QWEN,
            "phi" => &PHI,
            "llama-3" | "llama3" => &LLAMA3,
            _ => &QWEN,
        }
    }

    /// Sniff a family tag from a model artifact's filename.
    pub fn detect(model_path: &str) -> String {
        let lower = model_path.to_lowercase();
        if lower.contains("granite") {
            "granite".to_owned()
        } else if lower.contains("qwen") {
            "qwen".to_owned()
        } else if lower.contains("phi") {
            "phi".to_owned()
        } else if lower.contains("llama-3") || lower.contains("llama3") {
            "llama-3".to_owned()
        } else {
            "qwen".to_owned()
        }
    }
}

/// Returns `true` if `text` contains any of `template`'s stop sequences.
pub fn has_stop_sequence(template: &ChatTemplate, text: &str) -> bool {
    template.stop_sequences.iter().any(|seq| text.contains(seq))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_known_families() {
        assert_eq!(TemplateCatalog::detect("Qwen2.5-7B-Instruct.gguf"), "qwen");
        assert_eq!(TemplateCatalog::detect("granite-3.0-8b-instruct.Q4_K_M.gguf"), "granite");
        assert_eq!(TemplateCatalog::detect("Phi-3-mini-4k-instruct.gguf"), "phi");
        assert_eq!(TemplateCatalog::detect("Meta-Llama-3-8B-Instruct.gguf"), "llama-3");
        assert_eq!(TemplateCatalog::detect("llama3-8b.gguf"), "llama-3");
    }

    #[test]
    fn detect_unknown_falls_back_to_qwen() {
        assert_eq!(TemplateCatalog::detect("some-mystery-model.bin"), "qwen");
    }

    #[test]
    fn get_by_explicit_family_overrides_filename() {
        let t = TemplateCatalog::get(Some("phi"), "granite-model.gguf");
        assert_eq!(t.family_tag, "phi");
    }

    #[test]
    fn get_auto_uses_detection() {
        let t = TemplateCatalog::get(None, "Qwen2.5-Instruct.gguf");
        assert_eq!(t.family_tag, "qwen");
    }

    #[test]
    fn stop_sequence_detection() {
        let t = &QWEN;
        assert!(has_stop_sequence(t, "hello <|im_end|> world"));
        assert!(!has_stop_sequence(t, "hello world"));
    }

    #[test]
    fn default_template_is_qwen_style() {
        let t = TemplateCatalog::get(None, "unknown.gguf");
        assert_eq!(t.family_tag, "qwen");
    }
}
