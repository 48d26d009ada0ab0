use log::{error, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use indicatif::{ProgressBar, ProgressStyle};

use crate::app_config::Config;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::providers::{Provider, TranslationBackend};
use crate::subtitle_processor::SubtitleCodec;
use crate::translation::{BatchTranslationPipeline, PipelineOptions};

// @module: Application controller for subtitle translation

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        config.validate().map_err(|e| AppError::Config(format!("{:#}", e)))?;
        Ok(Self { config })
    }

    /// Translate `input_file` with the configured backend.
    ///
    /// Returns the path of the written subtitle file.
    pub async fn run(&self, input_file: &Path, output_file: Option<PathBuf>) -> Result<PathBuf, AppError> {
        let backend = TranslationBackend::from_config(&self.config)
            .map_err(|e| AppError::Config(format!("{:#}", e)))?;

        info!("Using {} - {}", self.config.provider.display_name(), self.config.get_model());

        self.translate_file(input_file, output_file, &backend).await
    }

    /// Translate `input_file` with the given backend
    pub async fn translate_file<P>(
        &self,
        input_file: &Path,
        output_file: Option<PathBuf>,
        provider: &P,
    ) -> Result<PathBuf, AppError>
    where
        P: Provider + ?Sized,
    {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(AppError::File(format!("Input file does not exist: {:?}", input_file)));
        }

        let entries = SubtitleCodec::parse_file(input_file)?;
        if entries.is_empty() {
            return Err(AppError::File(format!("No subtitle entries found in {:?}", input_file)));
        }
        info!("Loaded {} subtitle entries from {:?}", entries.len(), input_file);

        let output_path = output_file.unwrap_or_else(|| self.default_output_path(input_file));
        let checkpoint_path = self.config.pipeline.checkpoint_path.clone();
        let pipeline = BatchTranslationPipeline::new(PipelineOptions::from(&self.config.pipeline));

        let progress_bar = Self::create_progress_bar();
        let result = pipeline
            .run_with_progress(&entries, provider, &checkpoint_path, |done, total| {
                progress_bar.set_length(total as u64);
                progress_bar.set_position(done as u64);
            })
            .await;

        let translated = match result {
            Ok(translated) => {
                progress_bar.finish_with_message("done");
                translated
            }
            Err(e) => {
                progress_bar.abandon_with_message("failed");
                error!(
                    "Translation stopped at batch {}. Progress is kept in {:?}; run again to resume.",
                    e.batch_index() + 1,
                    checkpoint_path
                );
                return Err(e.into());
            }
        };

        FileManager::write_to_file(&output_path, &SubtitleCodec::render(&translated))?;

        info!(
            "Translation completed in {}. Output: {:?}",
            Self::format_duration(start_time.elapsed()),
            output_path
        );

        Ok(output_path)
    }

    // @returns: `{output_dir or input dir}/{stem}.{target}.srt`
    fn default_output_path(&self, input_file: &Path) -> PathBuf {
        let output_dir = self.config.output_dir
            .clone()
            .unwrap_or_else(|| FileManager::parent_dir(input_file));
        FileManager::generate_output_path(input_file, output_dir, &self.config.target_language, "srt")
    }

    fn create_progress_bar() -> ProgressBar {
        let progress_bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:01}s", seconds, duration.subsec_millis() / 100)
        }
    }
}
