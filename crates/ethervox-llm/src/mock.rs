//! A deterministic, scripted [`LlmBackend`] used to drive the Governor's own
//! test suite without a real model file. Ships unconditionally — it's a
//! first-class test double, not a feature-gated stub.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use crate::backend::LlmBackend;
use crate::error::{LlmError, Result};
use crate::token::Token;

/// Reserved token id for end-of-generation; never allocated by the vocab.
const EOG: Token = Token(-1);

#[derive(Default)]
struct Vocab {
    word_to_id: HashMap<String, i32>,
    id_to_word: Vec<String>,
}

impl Vocab {
    fn intern(&mut self, piece: &str) -> Token {
        if let Some(&id) = self.word_to_id.get(piece) {
            return Token(id);
        }
        let id = self.id_to_word.len() as i32;
        self.id_to_word.push(piece.to_string());
        self.word_to_id.insert(piece.to_string(), id);
        Token(id)
    }

    fn lookup(&self, token: Token) -> &str {
        self.id_to_word
            .get(token.0 as usize)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Scripted backend: `tokenize`/`decode_text` round-trip exactly (whitespace
/// is preserved as its own piece), and generation replays whatever text was
/// queued via [`MockLlmBackend::queue_response`], one call's worth per
/// Governor iteration.
pub struct MockLlmBackend {
    n_ctx: u32,
    vocab: RefCell<Vocab>,
    generation_queue: RefCell<VecDeque<Token>>,
    kv_pos: Cell<u32>,
}

impl MockLlmBackend {
    pub fn new(n_ctx: u32) -> Self {
        Self {
            n_ctx,
            vocab: RefCell::new(Vocab::default()),
            generation_queue: RefCell::new(VecDeque::new()),
            kv_pos: Cell::new(0),
        }
    }

    /// Queue `text` to be replayed as the next generation, terminated by an
    /// end-of-generation token. Call once per scripted Governor iteration.
    pub fn queue_response(&self, text: &str) {
        let tokens = self.tokenize(text).expect("mock tokenize never fails");
        tracing::debug!(tokens = tokens.len(), "queued scripted mock response");
        let mut queue = self.generation_queue.borrow_mut();
        queue.extend(tokens);
        queue.push_back(EOG);
    }

    /// Current simulated KV-cache position, for assertions in tests.
    pub fn kv_pos(&self) -> u32 {
        self.kv_pos.get()
    }
}

impl LlmBackend for MockLlmBackend {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        let mut vocab = self.vocab.borrow_mut();
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut current_is_space: Option<bool> = None;

        for ch in text.chars() {
            let is_space = ch.is_whitespace();
            match current_is_space {
                Some(flag) if flag == is_space => current.push(ch),
                _ => {
                    if !current.is_empty() {
                        tokens.push(vocab.intern(&current));
                    }
                    current = ch.to_string();
                    current_is_space = Some(is_space);
                }
            }
        }
        if !current.is_empty() {
            tokens.push(vocab.intern(&current));
        }

        Ok(tokens)
    }

    fn decode_text(&self, token: Token) -> String {
        if token == EOG {
            return String::new();
        }
        self.vocab.borrow().lookup(token).to_string()
    }

    fn decode_batch(&mut self, tokens: &[Token], start_pos: u32, _logits_at: &[usize]) -> Result<()> {
        let end = start_pos + tokens.len() as u32;
        if end > self.n_ctx {
            tracing::warn!(requested = end, capacity = self.n_ctx, "mock decode exceeded context window");
            return Err(LlmError::ContextExceeded {
                requested: end,
                capacity: self.n_ctx,
            });
        }
        self.kv_pos.set(end);
        Ok(())
    }

    fn kv_cache_remove_from(&mut self, from: u32) {
        self.kv_pos.set(from.min(self.kv_pos.get()));
    }

    fn sample(&mut self, _logits_index: usize) -> Token {
        self.generation_queue
            .borrow_mut()
            .pop_front()
            .unwrap_or(EOG)
    }

    fn is_end_of_generation(&self, token: Token) -> bool {
        token == EOG
    }

    fn n_ctx(&self) -> u32 {
        self.n_ctx
    }
}
