/*!
 * Sequential batch translation with retries and checkpointing.
 *
 * Batches are processed strictly in order. After every successful batch the
 * translated entries so far are written to the checkpoint, so an interrupted
 * or failed run picks up after the last completed batch. The checkpoint is
 * removed once every batch has succeeded.
 */

use log::{debug, error, info, warn};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::app_config::PipelineConfig;
use crate::errors::{PipelineError, TranslationError};
use crate::providers::Provider;
use crate::subtitle_processor::SubtitleEntry;

use super::batch::{apply_translations, batch_count, join_batch_text, partition, split_response};
use super::checkpoint::{Checkpoint, CheckpointStore};

/// Tuning for a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Entries per backend request
    pub batch_size: usize,
    /// Retries after the first failed attempt of a batch
    pub max_retries: u32,
    /// Fixed delay between attempts
    pub retry_delay: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            batch_size: 80,
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl From<&PipelineConfig> for PipelineOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            max_retries: config.max_retries,
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

/// Drives subtitle entries through a translation backend batch by batch
#[derive(Debug, Clone, Default)]
pub struct BatchTranslationPipeline {
    options: PipelineOptions,
}

impl BatchTranslationPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options: PipelineOptions {
                batch_size: options.batch_size.max(1),
                ..options
            },
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Translate all entries, resuming from the checkpoint at `checkpoint_path`
    pub async fn run<P>(
        &self,
        entries: &[SubtitleEntry],
        provider: &P,
        checkpoint_path: &Path,
    ) -> Result<Vec<SubtitleEntry>, PipelineError>
    where
        P: Provider + ?Sized,
    {
        self.run_with_progress(entries, provider, checkpoint_path, |_, _| {}).await
    }

    /// Like `run`, calling `progress(completed_batches, total_batches)` once at
    /// the start and after every completed batch
    pub async fn run_with_progress<P, F>(
        &self,
        entries: &[SubtitleEntry],
        provider: &P,
        checkpoint_path: &Path,
        progress: F,
    ) -> Result<Vec<SubtitleEntry>, PipelineError>
    where
        P: Provider + ?Sized,
        F: Fn(usize, usize),
    {
        let batch_size = self.options.batch_size;
        let store = CheckpointStore::new(checkpoint_path);
        let batches = partition(entries, batch_size);
        let total_batches = batch_count(entries.len(), batch_size);

        let (mut translated, resume_from) = match self.resume_state(&store, entries.len()) {
            Some((checkpoint, resume_from)) => {
                info!(
                    "Resuming from checkpoint {}: {} entries done, continuing at batch {}/{}",
                    store.path().display(),
                    checkpoint.entries.len(),
                    resume_from.saturating_add(1).min(total_batches),
                    total_batches
                );
                (checkpoint.entries, resume_from)
            }
            None => (Vec::with_capacity(entries.len()), 0),
        };

        progress(resume_from.min(total_batches), total_batches);

        for (batch_index, batch) in batches.iter().enumerate().skip(resume_from) {
            let first = batch.first().map_or(0, |entry| entry.index);
            let last = batch.last().map_or(0, |entry| entry.index);
            info!(
                "Translating batch {}/{} (entries {}-{}) with {}",
                batch_index + 1, total_batches, first, last, provider.name()
            );

            let start_time = Instant::now();
            let result = self.translate_batch(batch, provider, batch_index).await;

            match result {
                Ok(batch_translated) => {
                    translated.extend(batch_translated);
                    store.save(&Checkpoint::new(translated.clone(), batch_index));
                    debug!("Batch {} completed in {:?}", batch_index + 1, start_time.elapsed());
                    progress(batch_index + 1, total_batches);
                }
                Err(source) => {
                    error!(
                        "Batch {}/{} failed after {} attempts: {}",
                        batch_index + 1, total_batches, self.options.max_retries.saturating_add(1), source
                    );
                    return Err(PipelineError::BatchFailed { batch_index, source });
                }
            }
        }

        store.clear();
        info!("Translated {} entries in {} batches", translated.len(), total_batches);
        Ok(translated)
    }

    /// Load the checkpoint and check that it matches the entries being translated.
    /// Returns the checkpoint with the batch index to continue from.
    fn resume_state(&self, store: &CheckpointStore, total_entries: usize) -> Option<(Checkpoint, usize)> {
        let checkpoint = store.load()?;

        let Some(resume_from) = checkpoint.next_batch_index() else {
            warn!(
                "Checkpoint {} has out-of-range batch index {}; starting over",
                store.path().display(),
                checkpoint.last_batch_index
            );
            return None;
        };

        let expected = resume_from
            .saturating_mul(self.options.batch_size)
            .min(total_entries);

        if checkpoint.entries.len() != expected {
            warn!(
                "Checkpoint {} holds {} entries but batch {} implies {}; starting over",
                store.path().display(),
                checkpoint.entries.len(),
                checkpoint.last_batch_index,
                expected
            );
            return None;
        }

        Some((checkpoint, resume_from))
    }

    /// Attempt one batch up to `1 + max_retries` times
    async fn translate_batch<P>(
        &self,
        batch: &[SubtitleEntry],
        provider: &P,
        batch_index: usize,
    ) -> Result<Vec<SubtitleEntry>, TranslationError>
    where
        P: Provider + ?Sized,
    {
        let prompt = join_batch_text(batch);
        let max_attempts = self.options.max_retries.saturating_add(1);
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < max_attempts {
            match self.attempt_batch(batch, provider, &prompt).await {
                Ok(translated) => return Ok(translated),
                Err(e) => {
                    match &e {
                        TranslationError::Provider(provider_error) => warn!(
                            "Batch {}: {} request failed (attempt {}/{}): {}",
                            batch_index + 1, provider.name(), attempt + 1, max_attempts, provider_error
                        ),
                        TranslationError::CountMismatch { expected, received } => warn!(
                            "Batch {}: expected {} segments, received {} (attempt {}/{})",
                            batch_index + 1, expected, received, attempt + 1, max_attempts
                        ),
                    }
                    last_error = Some(e);
                }
            }

            attempt += 1;

            if attempt < max_attempts && !self.options.retry_delay.is_zero() {
                tokio::time::sleep(self.options.retry_delay).await;
            }
        }

        Err(last_error.unwrap_or(TranslationError::CountMismatch {
            expected: batch.len(),
            received: 0,
        }))
    }

    async fn attempt_batch<P>(
        &self,
        batch: &[SubtitleEntry],
        provider: &P,
        prompt: &str,
    ) -> Result<Vec<SubtitleEntry>, TranslationError>
    where
        P: Provider + ?Sized,
    {
        let response = provider.translate(prompt).await?;
        let segments = split_response(&response);
        let received = segments.len();

        apply_translations(batch, segments).ok_or_else(|| {
            debug!("Mismatched response: {}", response);
            TranslationError::CountMismatch {
                expected: batch.len(),
                received,
            }
        })
    }
}
