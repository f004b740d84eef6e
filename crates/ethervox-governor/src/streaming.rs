//! Streaming-token suppression and early-stop detection for the generation
//! loop (spec.md §4.5.3 step 4). Implemented as explicit checks over the
//! accumulator's tail rather than fixed-length substring comparisons, per the
//! open-question resolution recorded in SPEC_FULL.md.

use ethervox_template::{has_stop_sequence, ChatTemplate};

/// Partial prefixes of `<tool_call` that must not leak to the user mid-token.
const PARTIAL_TOOL_CALL_TAILS: &[&str] = &["<", "<tool", "<tool_", "<tool_call"];

/// Fragments of template stop sequences that must not leak to the user
/// one token before the full sequence completes.
const STOP_FRAGMENTS: &[&str] = &["im_end", "im_start", "|>", "<|", "<", ">", "|"];

/// A sentinel some fine-tunes emit in place of a proper stop sequence.
const SENTINEL_STOP: &str = "STOP";

/// Whether the just-appended `token_text` should be forwarded to the
/// caller's token callback, given the accumulator *after* appending it.
pub fn is_forwardable(accumulator: &str, token_text: &str, template: &ChatTemplate) -> bool {
    if has_unterminated_tool_call(accumulator) {
        return false;
    }
    if PARTIAL_TOOL_CALL_TAILS.iter().any(|tail| accumulator.ends_with(tail)) {
        return false;
    }
    if STOP_FRAGMENTS.iter().any(|frag| token_text.contains(frag)) {
        return false;
    }
    if has_stop_sequence(template, accumulator) || accumulator.contains(SENTINEL_STOP) {
        return false;
    }
    true
}

fn has_unterminated_tool_call(accumulator: &str) -> bool {
    match accumulator.find("<tool_call") {
        None => false,
        Some(pos) => !accumulator[pos..].contains("/>"),
    }
}

/// True once the accumulator contains a complete, well-formed
/// `<tool_call ... />` occurrence.
pub fn has_complete_tool_call(accumulator: &str) -> bool {
    match accumulator.find("<tool_call") {
        None => false,
        Some(pos) => accumulator[pos..].contains("/>"),
    }
}

/// If the accumulator contains a hallucinated `<|im_start|>` continuation,
/// truncate it at that point and report that a truncation happened.
pub fn truncate_at_hallucination(accumulator: &mut String) -> bool {
    if let Some(pos) = accumulator.find("<|im_start|>") {
        accumulator.truncate(pos);
        true
    } else {
        false
    }
}

/// If the accumulator now contains a template stop sequence or the `STOP`
/// sentinel, return the byte offset of its earliest occurrence so the caller
/// can truncate there.
pub fn earliest_stop_offset(accumulator: &str, template: &ChatTemplate) -> Option<usize> {
    template
        .stop_sequences
        .iter()
        .copied()
        .chain(std::iter::once(SENTINEL_STOP))
        .filter_map(|seq| accumulator.find(seq))
        .min()
}

/// Harvest a `<confidence value="0.92" />`-style tag, if present.
pub fn harvest_confidence(accumulator: &str) -> Option<f64> {
    let marker = "<confidence value=\"";
    let start = accumulator.find(marker)? + marker.len();
    let rest = &accumulator[start..];
    let end = rest.find('"')?;
    rest[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qwen() -> &'static ChatTemplate {
        ethervox_template::TemplateCatalog::get(Some("qwen"), "")
    }

    #[test]
    fn suppresses_partial_tool_call_prefix() {
        let template = qwen();
        assert!(!is_forwardable("<tool", "tool", template));
        assert!(!is_forwardable("<tool_call name=\"x\"", "x\"", template));
    }

    #[test]
    fn forwards_ordinary_text() {
        let template = qwen();
        assert!(is_forwardable("The answer is 4", "4", template));
    }

    #[test]
    fn suppresses_stop_fragment_tokens() {
        let template = qwen();
        assert!(!is_forwardable("done<|im", "<|im", template));
    }

    #[test]
    fn suppresses_once_accumulator_has_stop_sequence() {
        let template = qwen();
        assert!(!is_forwardable("done<|im_end|>", "extra", template));
    }

    #[test]
    fn detects_complete_tool_call() {
        assert!(has_complete_tool_call(
            "thinking <tool_call name=\"x\" /> done"
        ));
        assert!(!has_complete_tool_call("thinking <tool_call name=\"x\""));
    }

    #[test]
    fn truncates_on_hallucinated_continuation() {
        let mut acc = "Answer.<|im_start|>user\nwhat now".to_string();
        assert!(truncate_at_hallucination(&mut acc));
        assert_eq!(acc, "Answer.");
    }

    #[test]
    fn earliest_stop_offset_finds_first_match() {
        let template = qwen();
        let acc = "hello<|im_end|> world<|im_start|>";
        assert_eq!(earliest_stop_offset(acc, template), acc.find("<|im_end|>"));
    }

    #[test]
    fn harvests_confidence_tag() {
        assert_eq!(
            harvest_confidence("The tip is $7.13. <confidence value=\"0.92\" />"),
            Some(0.92)
        );
        assert_eq!(harvest_confidence("no tag here"), None);
    }
}
