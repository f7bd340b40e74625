//! Upstream capabilities and the turn pipeline built on them.
//!
//! - [`llm`]: language-model completion
//! - [`tts`]: speech synthesis
//! - [`storage`]: public object storage
//! - [`speech`]: synthesis + upload, best effort
//! - [`turn`]: one conversation turn end to end

pub mod llm;
pub mod speech;
pub mod storage;
pub mod tts;
pub mod turn;

#[cfg(test)]
pub mod testing;
