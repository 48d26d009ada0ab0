/*!
 * Batch translation of subtitle entries.
 *
 * - `batch`: partitioning entries and framing them as one request
 * - `checkpoint`: persisted progress for resumable runs
 * - `pipeline`: the sequential batch driver with retries
 * - `prompts`: the system instruction sent to every backend
 */

// Re-export main types for easier usage
pub use self::batch::SEGMENT_DELIMITER;
pub use self::checkpoint::{Checkpoint, CheckpointStore};
pub use self::pipeline::{BatchTranslationPipeline, PipelineOptions};
pub use self::prompts::PromptTemplate;

// Submodules
pub mod batch;
pub mod checkpoint;
pub mod pipeline;
pub mod prompts;
