// FACTSHORTS Caption Modules
// Chunking, timing estimation and speech-synchronized display.

pub mod chunker;
pub mod estimator;
pub mod sync;

pub use chunker::{chunk, chunk_index_at, Chunk};
pub use estimator::{build_schedule, estimate_ms, ChunkSchedule, ScheduledChunk};
pub use sync::{
    CancelFlag, CaptionSession, CaptionSink, SessionCanceller, SessionOutcome, SpeechEngine,
    SpeechSignal, Synchronizer,
};
