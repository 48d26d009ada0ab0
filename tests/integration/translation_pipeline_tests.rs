/*!
 * Tests for the batch translation pipeline: partitioning, retries, checkpointing
 * and resume.
 */

use anyhow::Result;
use subtrans::errors::{PipelineError, TranslationError};
use subtrans::providers::mock::{MockProvider, MockReply};
use subtrans::translation::{BatchTranslationPipeline, Checkpoint, CheckpointStore, SEGMENT_DELIMITER};
use crate::common;

/// Test every batch is sent once, in order, and the result keeps every entry
#[tokio::test]
async fn test_run_withSevenEntriesAndBatchOfThree_shouldVisitThreeBatches() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let checkpoint_path = temp_dir.path().join("checkpoint.json");
    let entries = common::make_entries(7);
    let provider = MockProvider::working();
    let pipeline = BatchTranslationPipeline::new(common::fast_options(3, 0));

    let translated = pipeline.run(&entries, &provider, &checkpoint_path).await?;

    let requests = provider.requests();
    assert_eq!(requests.len(), 3);

    // Concatenating the batches gives back the original texts exactly once
    let sent: Vec<String> = requests
        .iter()
        .flat_map(|r| r.split(SEGMENT_DELIMITER).map(str::to_string).collect::<Vec<_>>())
        .collect();
    let original: Vec<String> = entries.iter().map(|e| e.text.clone()).collect();
    assert_eq!(sent, original);
    assert_eq!(requests[2], "Line number 7");

    assert_eq!(translated.len(), 7);
    for (source, result) in entries.iter().zip(&translated) {
        assert_eq!(result.index, source.index);
        assert_eq!(result.time_code, source.time_code);
        assert_eq!(result.text, common::translated(&source.text));
    }
    Ok(())
}

/// Test batch counts for a range of sizes
#[tokio::test]
async fn test_run_withVariousSizes_shouldSendCeilingOfBatches() -> Result<()> {
    for (count, batch_size, expected_batches) in [(1, 80, 1), (80, 80, 1), (81, 80, 2), (10, 1, 10), (12, 5, 3)] {
        let temp_dir = common::create_temp_dir()?;
        let entries = common::make_entries(count);
        let provider = MockProvider::working();
        let pipeline = BatchTranslationPipeline::new(common::fast_options(batch_size, 0));

        let translated = pipeline.run(&entries, &provider, &temp_dir.path().join("cp.json")).await?;

        assert_eq!(provider.request_count(), expected_batches, "n={} b={}", count, batch_size);
        assert_eq!(translated.len(), count);
    }
    Ok(())
}

/// Test an empty input makes no requests
#[tokio::test]
async fn test_run_withNoEntries_shouldReturnEmptyWithoutRequests() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let checkpoint_path = temp_dir.path().join("checkpoint.json");
    let provider = MockProvider::working();

    let translated = BatchTranslationPipeline::default().run(&[], &provider, &checkpoint_path).await?;

    assert!(translated.is_empty());
    assert_eq!(provider.request_count(), 0);
    assert!(!checkpoint_path.exists());
    Ok(())
}

/// Test the checkpoint is removed after a successful run
#[tokio::test]
async fn test_run_withAllBatchesSucceeding_shouldClearCheckpoint() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let checkpoint_path = temp_dir.path().join("checkpoint.json");
    let entries = common::make_entries(10);
    let pipeline = BatchTranslationPipeline::new(common::fast_options(4, 0));

    pipeline.run(&entries, &MockProvider::working(), &checkpoint_path).await?;

    assert!(!checkpoint_path.exists());
    Ok(())
}

/// Test a persistent count mismatch on the first batch
#[tokio::test]
async fn test_run_withWrongCountOnFirstBatch_shouldRetryThenFailWithoutCheckpoint() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let checkpoint_path = temp_dir.path().join("checkpoint.json");
    let entries = common::make_entries(5);
    let provider = MockProvider::wrong_count();
    let pipeline = BatchTranslationPipeline::new(common::fast_options(2, 3));

    let result = pipeline.run(&entries, &provider, &checkpoint_path).await;

    assert_eq!(provider.request_count(), 4);
    match result {
        Err(PipelineError::BatchFailed { batch_index, source }) => {
            assert_eq!(batch_index, 0);
            assert!(matches!(source, TranslationError::CountMismatch { expected: 2, received: 3 }));
        }
        other => panic!("expected BatchFailed, got {:?}", other),
    }
    assert!(!checkpoint_path.exists());
    Ok(())
}

/// Test a failing later batch keeps the checkpoint of the last successful one
#[tokio::test]
async fn test_run_withMismatchOnThirdBatch_shouldKeepCheckpointOfSecond() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let checkpoint_path = temp_dir.path().join("checkpoint.json");
    let entries = common::make_entries(7);
    let provider = MockProvider::scripted(vec![
        MockReply::Echo,
        MockReply::Echo,
        MockReply::WrongCount,
        MockReply::WrongCount,
        MockReply::WrongCount,
    ]);
    let pipeline = BatchTranslationPipeline::new(common::fast_options(3, 2));

    let error = pipeline
        .run(&entries, &provider, &checkpoint_path)
        .await
        .expect_err("third batch should fail");

    assert_eq!(error.batch_index(), 2);
    assert_eq!(provider.request_count(), 2 + 3);

    let checkpoint = CheckpointStore::new(&checkpoint_path).load().expect("checkpoint should remain");
    assert_eq!(checkpoint.last_batch_index, 1);
    assert_eq!(checkpoint.entries.len(), 6);
    assert_eq!(checkpoint.entries[5].text, common::translated("Line number 6"));
    Ok(())
}

/// Test backend errors are retried and a later success is accepted
#[tokio::test]
async fn test_run_withTransientBackendFailures_shouldRecoverWithinRetries() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let checkpoint_path = temp_dir.path().join("checkpoint.json");
    let entries = common::make_entries(4);
    let provider = MockProvider::scripted(vec![MockReply::Fail, MockReply::WrongCount, MockReply::Echo]);
    let pipeline = BatchTranslationPipeline::new(common::fast_options(4, 3));

    let translated = pipeline.run(&entries, &provider, &checkpoint_path).await?;

    assert_eq!(provider.request_count(), 3);
    assert_eq!(translated.len(), 4);
    assert!(!checkpoint_path.exists());
    Ok(())
}

/// Test a backend that always errors surfaces the provider error
#[tokio::test]
async fn test_run_withFailingBackend_shouldFailAfterAllAttempts() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let checkpoint_path = temp_dir.path().join("checkpoint.json");
    let provider = MockProvider::failing();
    let pipeline = BatchTranslationPipeline::new(common::fast_options(80, 1));

    let error = pipeline
        .run(&common::make_entries(3), &provider, &checkpoint_path)
        .await
        .expect_err("run should fail");

    assert_eq!(provider.request_count(), 2);
    assert!(matches!(
        error,
        PipelineError::BatchFailed { batch_index: 0, source: TranslationError::Provider(_) }
    ));
    Ok(())
}

/// Test the same prompt is resent on every attempt
#[tokio::test]
async fn test_run_withRetries_shouldResendIdenticalPrompt() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let provider = MockProvider::scripted(vec![MockReply::Fail, MockReply::Fail]);
    let pipeline = BatchTranslationPipeline::new(common::fast_options(80, 3));

    pipeline.run(&common::make_entries(2), &provider, &temp_dir.path().join("cp.json")).await?;

    let requests = provider.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r == &requests[0]));
    Ok(())
}

/// Test resuming from a checkpoint only sends the remaining batches
#[tokio::test]
async fn test_run_withCheckpoint_shouldResumeAfterLastCompletedBatch() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let entries = common::make_entries(10);
    let pipeline = BatchTranslationPipeline::new(common::fast_options(3, 0));

    // Reference run from scratch
    let reference_path = temp_dir.path().join("reference.json");
    let reference = pipeline.run(&entries, &MockProvider::working(), &reference_path).await?;

    // First run stops at batch 2
    let checkpoint_path = temp_dir.path().join("checkpoint.json");
    let failing_first = MockProvider::scripted(vec![MockReply::Echo, MockReply::Echo, MockReply::Fail]);
    let error = pipeline
        .run(&entries, &failing_first, &checkpoint_path)
        .await
        .expect_err("first run should stop");
    assert_eq!(error.batch_index(), 2);
    assert!(checkpoint_path.exists());

    // Second run picks up at batch 2
    let resumed_provider = MockProvider::working();
    let resumed = pipeline.run(&entries, &resumed_provider, &checkpoint_path).await?;

    let requests = resumed_provider.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].starts_with("Line number 7"));
    assert_eq!(requests[1], "Line number 10");
    assert_eq!(resumed, reference);
    assert!(!checkpoint_path.exists());
    Ok(())
}

/// Test resuming from a hand-made checkpoint uses its stored entries
#[tokio::test]
async fn test_run_withSeededCheckpoint_shouldKeepStoredTranslations() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let checkpoint_path = temp_dir.path().join("checkpoint.json");
    let entries = common::make_entries(4);

    let stored: Vec<_> = entries[..2].iter().map(|e| e.with_text(format!("stored {}", e.index))).collect();
    CheckpointStore::new(&checkpoint_path).try_save(&Checkpoint::new(stored, 0))?;

    let provider = MockProvider::working();
    let pipeline = BatchTranslationPipeline::new(common::fast_options(2, 0));
    let translated = pipeline.run(&entries, &provider, &checkpoint_path).await?;

    assert_eq!(provider.request_count(), 1);
    assert_eq!(translated[0].text, "stored 1");
    assert_eq!(translated[1].text, "stored 2");
    assert_eq!(translated[2].text, common::translated("Line number 3"));
    Ok(())
}

/// Test a checkpoint covering every batch finishes without requests
#[tokio::test]
async fn test_run_withCompleteCheckpoint_shouldReturnStoredEntriesAndClear() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let checkpoint_path = temp_dir.path().join("checkpoint.json");
    let entries = common::make_entries(4);
    CheckpointStore::new(&checkpoint_path).try_save(&Checkpoint::new(entries.clone(), 1))?;

    let provider = MockProvider::working();
    let pipeline = BatchTranslationPipeline::new(common::fast_options(2, 0));
    let translated = pipeline.run(&entries, &provider, &checkpoint_path).await?;

    assert_eq!(provider.request_count(), 0);
    assert_eq!(translated, entries);
    assert!(!checkpoint_path.exists());
    Ok(())
}

/// Test a checkpoint that does not fit the input is discarded
#[tokio::test]
async fn test_run_withInconsistentCheckpoint_shouldStartOver() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let checkpoint_path = temp_dir.path().join("checkpoint.json");
    let entries = common::make_entries(6);

    // Claims two batches of two but holds a single entry
    CheckpointStore::new(&checkpoint_path).try_save(&Checkpoint::new(common::make_entries(1), 1))?;

    let provider = MockProvider::working();
    let pipeline = BatchTranslationPipeline::new(common::fast_options(2, 0));
    let translated = pipeline.run(&entries, &provider, &checkpoint_path).await?;

    assert_eq!(provider.request_count(), 3);
    assert_eq!(translated.len(), 6);
    Ok(())
}

/// Test a corrupt checkpoint does not block a fresh run
#[tokio::test]
async fn test_run_withCorruptCheckpoint_shouldRunFromScratch() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let checkpoint_path = common::create_test_file(temp_dir.path(), "checkpoint.json", "not json at all")?;

    let provider = MockProvider::working();
    let pipeline = BatchTranslationPipeline::new(common::fast_options(2, 0));
    let translated = pipeline.run(&common::make_entries(3), &provider, &checkpoint_path).await?;

    assert_eq!(provider.request_count(), 2);
    assert_eq!(translated.len(), 3);
    assert!(!checkpoint_path.exists());
    Ok(())
}

/// Test a checkpoint with the largest possible batch index is discarded
#[tokio::test]
async fn test_run_withMaxBatchIndexCheckpoint_shouldRunFromScratch() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let checkpoint_path = common::create_test_file(
        temp_dir.path(),
        "checkpoint.json",
        &format!(r#"{{"entries":[],"lastBatchIndex":{}}}"#, usize::MAX),
    )?;

    let provider = MockProvider::working();
    let pipeline = BatchTranslationPipeline::new(common::fast_options(2, 0));
    let translated = pipeline.run(&common::make_entries(3), &provider, &checkpoint_path).await?;

    assert_eq!(provider.request_count(), 2);
    assert_eq!(translated.len(), 3);
    assert_eq!(translated[2].text, common::translated("Line number 3"));
    assert!(!checkpoint_path.exists());
    Ok(())
}

/// Test a complete checkpoint with a huge batch index finishes without requests
#[tokio::test]
async fn test_run_withCompleteCheckpointAndHugeBatchIndex_shouldReturnStoredEntries() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let checkpoint_path = temp_dir.path().join("checkpoint.json");
    let entries = common::make_entries(3);
    CheckpointStore::new(&checkpoint_path).try_save(&Checkpoint::new(entries.clone(), usize::MAX - 1))?;

    let provider = MockProvider::working();
    let pipeline = BatchTranslationPipeline::new(common::fast_options(2, 0));
    let translated = pipeline.run(&entries, &provider, &checkpoint_path).await?;

    assert_eq!(provider.request_count(), 0);
    assert_eq!(translated, entries);
    assert!(!checkpoint_path.exists());
    Ok(())
}

/// Test a checkpoint is written after every completed batch
#[tokio::test]
async fn test_run_withProgressCallback_shouldSeeCheckpointAfterEachBatch() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let checkpoint_path = temp_dir.path().join("checkpoint.json");
    let store = CheckpointStore::new(&checkpoint_path);
    let pipeline = BatchTranslationPipeline::new(common::fast_options(2, 0));

    let seen = std::cell::RefCell::new(Vec::new());
    pipeline
        .run_with_progress(&common::make_entries(5), &MockProvider::working(), &checkpoint_path, |done, total| {
            let stored = store.load().map(|c| (c.last_batch_index, c.entries.len()));
            seen.borrow_mut().push((done, total, stored));
        })
        .await?;

    assert_eq!(
        seen.into_inner(),
        vec![
            (0, 3, None),
            (1, 3, Some((0, 2))),
            (2, 3, Some((1, 4))),
            (3, 3, Some((2, 5))),
        ]
    );
    Ok(())
}

/// Test an entry containing the delimiter breaks alignment and fails the batch
#[tokio::test]
async fn test_run_withDelimiterInsideEntry_shouldReportMismatch() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let checkpoint_path = temp_dir.path().join("checkpoint.json");
    let mut entries = common::make_entries(2);
    entries[0].text = "before\n\n---\n\nafter".to_string();

    let provider = MockProvider::working();
    let pipeline = BatchTranslationPipeline::new(common::fast_options(80, 1));
    let error = pipeline
        .run(&entries, &provider, &checkpoint_path)
        .await
        .expect_err("delimiter collision should fail");

    assert_eq!(provider.request_count(), 2);
    assert!(matches!(
        error,
        PipelineError::BatchFailed {
            batch_index: 0,
            source: TranslationError::CountMismatch { expected: 2, received: 3 }
        }
    ));
    Ok(())
}

/// Test whitespace around translated segments is trimmed
#[tokio::test]
async fn test_run_withPaddedSegments_shouldTrimTranslations() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let provider = MockProvider::scripted(vec![MockReply::Text("  uno \n\n---\n\n\ndos\n".to_string())]);
    let pipeline = BatchTranslationPipeline::new(common::fast_options(80, 0));

    let translated = pipeline
        .run(&common::make_entries(2), &provider, &temp_dir.path().join("cp.json"))
        .await?;

    assert_eq!(translated[0].text, "uno");
    assert_eq!(translated[1].text, "dos");
    Ok(())
}

/// Test the fixed retry delay is applied between attempts only
#[tokio::test(start_paused = true)]
async fn test_run_withRetryDelay_shouldWaitBetweenAttempts() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let provider = MockProvider::scripted(vec![MockReply::Fail, MockReply::Fail]);
    let pipeline = BatchTranslationPipeline::new(subtrans::translation::PipelineOptions {
        batch_size: 80,
        max_retries: 3,
        retry_delay: std::time::Duration::from_secs(2),
    });

    let start = tokio::time::Instant::now();
    pipeline.run(&common::make_entries(1), &provider, &temp_dir.path().join("cp.json")).await?;

    assert_eq!(provider.request_count(), 3);
    // Two failures, two delays; none after the successful third attempt
    let elapsed = start.elapsed();
    assert!(elapsed >= std::time::Duration::from_secs(4));
    assert!(elapsed < std::time::Duration::from_secs(6));
    Ok(())
}
