// FACTSHORTS Narration Modules
// Sequential multi-utterance driving and concrete speech engines.

pub mod driver;
pub mod engine;

pub use driver::{NarrationDriver, NarrationReport};
pub use engine::{CommandTtsEngine, PacedEngine};
