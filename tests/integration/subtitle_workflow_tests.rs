/*!
 * End-to-end tests: SRT file in, translated SRT file out
 */

use std::path::Path;
use anyhow::Result;
use subtrans::app_config::Config;
use subtrans::app_controller::Controller;
use subtrans::errors::AppError;
use subtrans::providers::mock::{MockProvider, MockReply};
use subtrans::subtitle_processor::{SubtitleCodec, SubtitleEntry};
use crate::common;

/// Ollama config with test-friendly pipeline settings rooted in `dir`
fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.target_language = "es".to_string();
    config.pipeline.batch_size = 2;
    config.pipeline.max_retries = 1;
    config.pipeline.retry_delay_secs = 0;
    config.pipeline.checkpoint_path = dir.join("checkpoint.json");
    config
}

/// Test the full file workflow with the default output path
#[tokio::test]
async fn test_translate_file_withSampleSubtitle_shouldWriteTranslatedFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let controller = Controller::with_config(test_config(temp_dir.path()))?;
    let provider = MockProvider::working();

    let output = controller.translate_file(&input, None, &provider).await?;

    assert_eq!(output, temp_dir.path().join("movie.es.srt"));
    let entries = SubtitleCodec::parse_file(&output)?;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].index, 1);
    assert_eq!(entries[0].time_code, "00:00:01,000 --> 00:00:04,000");
    assert_eq!(entries[0].text, common::translated("This is a test subtitle."));
    assert_eq!(
        entries[1].text,
        common::translated("It contains multiple entries.\nAnd a second line.")
    );
    assert_eq!(provider.request_count(), 2);
    assert!(!temp_dir.path().join("checkpoint.json").exists());
    Ok(())
}

/// Test an explicit output path and configured output directory
#[tokio::test]
async fn test_translate_file_withOutputOptions_shouldHonorThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "show.srt")?;

    let explicit = temp_dir.path().join("custom").join("result.srt");
    let controller = Controller::with_config(test_config(temp_dir.path()))?;
    let written = controller
        .translate_file(&input, Some(explicit.clone()), &MockProvider::working())
        .await?;
    assert_eq!(written, explicit);
    assert!(explicit.exists());

    let mut config = test_config(temp_dir.path());
    config.output_dir = Some(temp_dir.path().join("translations"));
    let controller = Controller::with_config(config)?;
    let written = controller.translate_file(&input, None, &MockProvider::working()).await?;
    assert_eq!(written, temp_dir.path().join("translations").join("show.es.srt"));
    Ok(())
}

/// Test a missing input file
#[tokio::test]
async fn test_translate_file_withMissingInput_shouldReturnFileError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_config(test_config(temp_dir.path()))?;

    let result = controller
        .translate_file(&temp_dir.path().join("missing.srt"), None, &MockProvider::working())
        .await;

    assert!(matches!(result, Err(AppError::File(_))));
    Ok(())
}

/// Test an input without any valid block
#[tokio::test]
async fn test_translate_file_withNoEntries_shouldFailWithoutRequests() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "empty.srt", "just some text\n\nnothing else\n")?;
    let controller = Controller::with_config(test_config(temp_dir.path()))?;
    let provider = MockProvider::working();

    let result = controller.translate_file(&input, None, &provider).await;

    match result {
        Err(AppError::File(message)) => assert!(message.contains("No subtitle entries")),
        other => panic!("expected file error, got {:?}", other),
    }
    assert_eq!(provider.request_count(), 0);
    Ok(())
}

/// Test a failed run leaves a checkpoint and a second run completes from it
#[tokio::test]
async fn test_translate_file_withFailureThenRerun_shouldResumeAndFinish() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let checkpoint_path = temp_dir.path().join("checkpoint.json");
    let controller = Controller::with_config(test_config(temp_dir.path()))?;

    // First batch succeeds, second batch fails on both attempts
    let flaky = MockProvider::scripted(vec![MockReply::Echo, MockReply::Fail, MockReply::Fail]);
    let result = controller.translate_file(&input, None, &flaky).await;

    match result {
        Err(AppError::Pipeline(error)) => assert_eq!(error.batch_index(), 1),
        other => panic!("expected pipeline error, got {:?}", other),
    }
    assert!(checkpoint_path.exists());
    assert!(!temp_dir.path().join("movie.es.srt").exists());

    let provider = MockProvider::working();
    let output = controller.translate_file(&input, None, &provider).await?;

    assert_eq!(provider.request_count(), 1);
    assert_eq!(SubtitleCodec::parse_file(&output)?.len(), 3);
    assert!(!checkpoint_path.exists());
    Ok(())
}

/// Test the controller rejects an invalid configuration
#[test]
fn test_with_config_withInvalidConfig_shouldReturnConfigError() {
    let mut config = Config::default();
    config.pipeline.batch_size = 0;

    assert!(matches!(Controller::with_config(config), Err(AppError::Config(_))));
}

/// Test a larger file goes through many batches and keeps numbering gaps
#[tokio::test]
async fn test_translate_file_withManyEntries_shouldPreserveIndicesAndTimes() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let entries: Vec<SubtitleEntry> = common::make_entries(25)
        .into_iter()
        .map(|e| SubtitleEntry::new(e.index * 10, e.time_code, e.text))
        .collect();
    let input = common::create_test_file(temp_dir.path(), "long.srt", &SubtitleCodec::render(&entries))?;

    let mut config = test_config(temp_dir.path());
    config.pipeline.batch_size = 4;
    let controller = Controller::with_config(config)?;
    let provider = MockProvider::working();

    let output = controller.translate_file(&input, None, &provider).await?;
    let translated = SubtitleCodec::parse_file(&output)?;

    assert_eq!(provider.request_count(), 7);
    assert_eq!(translated.len(), 25);
    for (source, result) in entries.iter().zip(&translated) {
        assert_eq!(result.index, source.index);
        assert_eq!(result.time_code, source.time_code);
        assert_eq!(result.text, common::translated(&source.text));
    }
    Ok(())
}
