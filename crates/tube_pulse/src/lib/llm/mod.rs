pub mod openai;
pub mod speech;
pub mod writer;

pub use speech::Synthesizer;
pub use writer::{ScriptDraft, ScriptWriter};
