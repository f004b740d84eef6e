//! Derives the model family tag used to name the per-model prompt file
//! (spec.md §4.6 step 1): the filename up to the first `-` or `.`, lowercased.

use std::path::Path;

pub fn family_name(model_path: &str) -> String {
    let base = Path::new(model_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(model_path);
    let end = base.find(['-', '.']).unwrap_or(base.len());
    base[..end].to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_dash() {
        assert_eq!(family_name("Qwen2.5-7B-Instruct.gguf"), "qwen2");
    }

    #[test]
    fn splits_on_first_dot_when_no_dash() {
        assert_eq!(family_name("granite.gguf"), "granite");
    }

    #[test]
    fn strips_directory_components() {
        assert_eq!(family_name("/models/Phi-3-mini.gguf"), "phi");
    }

    #[test]
    fn lowercases_the_result() {
        assert_eq!(family_name("LLAMA3.gguf"), "llama3");
    }
}
