//! The token type the Governor threads through tokenize/decode/sample.

/// An opaque vocabulary token id. A thin newtype over the backend's raw
/// token representation, matching the `LlamaToken(i32)` shape seen across
/// `llama.cpp`-style bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(pub i32);

impl Token {
    pub fn new(id: i32) -> Self {
        Self(id)
    }
}

impl From<i32> for Token {
    fn from(id: i32) -> Self {
        Self(id)
    }
}
