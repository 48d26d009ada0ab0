/*!
 * Batch partitioning and segment framing.
 *
 * Entries are cut into contiguous batches of a fixed size. Each batch is sent
 * as one request: the entries' texts joined by a delimiter line, and the
 * reply is split on the same delimiter.
 */

use crate::subtitle_processor::SubtitleEntry;

/// Separator placed between entry texts in a batch request
pub const SEGMENT_DELIMITER: &str = "\n\n---\n\n";

/// Number of batches needed for `total` entries, `ceil(total / batch_size)`
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    total.div_ceil(batch_size)
}

/// Cut entries into contiguous batches.
///
/// Every batch holds `batch_size` entries except possibly the last one.
pub fn partition(entries: &[SubtitleEntry], batch_size: usize) -> Vec<&[SubtitleEntry]> {
    if batch_size == 0 {
        return Vec::new();
    }
    entries.chunks(batch_size).collect()
}

/// Join the texts of a batch into a single request body
pub fn join_batch_text(batch: &[SubtitleEntry]) -> String {
    batch.iter()
        .map(|entry| entry.text.as_str())
        .collect::<Vec<_>>()
        .join(SEGMENT_DELIMITER)
}

/// Split a reply into trimmed segments
pub fn split_response(response: &str) -> Vec<String> {
    response.split(SEGMENT_DELIMITER)
        .map(|segment| segment.trim().to_string())
        .collect()
}

/// Pair translated segments with their entries.
///
/// Returns `None` when the segment count differs from the batch length.
pub fn apply_translations(batch: &[SubtitleEntry], segments: Vec<String>) -> Option<Vec<SubtitleEntry>> {
    if segments.len() != batch.len() {
        return None;
    }

    Some(
        batch.iter()
            .zip(segments)
            .map(|(entry, text)| entry.with_text(text))
            .collect(),
    )
}
