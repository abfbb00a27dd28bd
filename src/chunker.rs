//! Fixed-window text chunking with overlap.
//!
//! Pure and deterministic; the ingestion pipeline calls this before
//! embedding, nothing here touches the network or disk.

use crate::errors::ApiError;

/// Split `text` into overlapping windows of `window` characters.
///
/// Each chunk starts `window - overlap` characters after the previous one, so
/// consecutive chunks share exactly `overlap` characters (the final chunk may
/// be shorter). Empty input yields an empty vec. `overlap >= window` would
/// make the window start stop advancing, so it is rejected instead of looping.
pub fn chunk_text(text: &str, window: usize, overlap: usize) -> Result<Vec<String>, ApiError> {
    if window == 0 || overlap >= window {
        return Err(ApiError::BadRequest(format!(
            "invalid chunking parameters: window={} overlap={}",
            window, overlap
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let step = window - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < total {
        let end = (start + window).min(total);
        chunks.push(chars[start..end].iter().collect());
        start += step;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 100, 20).unwrap().is_empty());
    }

    #[test]
    fn short_text_yields_single_chunk() {
        let chunks = chunk_text("hello", 100, 20).unwrap();
        assert_eq!(chunks, vec!["hello".to_string()]);
    }

    #[test]
    fn consecutive_chunks_overlap_exactly() {
        let text: String = ('a'..='z').cycle().take(250).collect();
        let window = 100;
        let overlap = 20;
        let chunks = chunk_text(&text, window, overlap).unwrap();

        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            if prev.len() == window {
                let tail: String = prev[window - overlap..].iter().collect();
                let head: String = next[..overlap.min(next.len())].iter().collect();
                assert_eq!(tail[..head.len()], head[..]);
            }
        }
    }

    #[test]
    fn de_overlapping_reconstructs_the_text() {
        let text: String = "0123456789".repeat(37);
        let window = 100;
        let overlap = 30;
        let chunks = chunk_text(&text, window, overlap).unwrap();

        let mut rebuilt: String = chunks[0].clone();
        for chunk in &chunks[1..] {
            let chars: Vec<char> = chunk.chars().collect();
            rebuilt.extend(chars[overlap.min(chars.len())..].iter());
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn overlap_at_least_window_is_rejected() {
        assert!(chunk_text("some text", 10, 10).is_err());
        assert!(chunk_text("some text", 10, 15).is_err());
        assert!(chunk_text("some text", 0, 0).is_err());
    }

    #[test]
    fn multibyte_text_is_chunked_by_characters() {
        let text = "日本語のテキスト".repeat(20);
        let chunks = chunk_text(&text, 50, 10).unwrap();
        let total: usize = text.chars().count();
        assert_eq!(chunks[0].chars().count(), 50);
        assert!(chunks.iter().all(|c| c.chars().count() <= 50));
        // Every character position is covered.
        let mut covered = 0;
        for (i, chunk) in chunks.iter().enumerate() {
            let start = i * 40;
            covered = covered.max(start + chunk.chars().count());
        }
        assert_eq!(covered, total);
    }
}
