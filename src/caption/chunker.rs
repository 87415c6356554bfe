// FACTSHORTS Text Chunker
// Splits narration text into display-sized word groups.

/// One caption line: a run of consecutive words from the utterance.
///
/// `char_start..char_end` is the chunk's span (in characters) within the
/// utterance rejoined with single spaces, with `char_end` covering the
/// separator that follows the chunk. Speech engines report progress as
/// character offsets into that joined text, so the span is what maps a
/// boundary event back to a chunk index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub word_count: usize,
    pub char_start: usize,
    pub char_end: usize,
}

/// Split `text` into chunks of `words_per_chunk` words (the last chunk keeps
/// the remainder). Empty or all-whitespace input yields a single chunk with
/// the trimmed text so callers always have something to display.
pub fn chunk(text: &str, words_per_chunk: usize) -> Vec<Chunk> {
    let size = words_per_chunk.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();

    if words.is_empty() {
        let trimmed = text.trim().to_string();
        let len = trimmed.chars().count();
        return vec![Chunk {
            text: trimmed,
            word_count: 0,
            char_start: 0,
            char_end: len + 1,
        }];
    }

    let mut chunks = Vec::with_capacity(words.len().div_ceil(size));
    let mut acc = 0usize;
    for group in words.chunks(size) {
        let joined = group.join(" ");
        let len = joined.chars().count();
        chunks.push(Chunk {
            text: joined,
            word_count: group.len(),
            char_start: acc,
            char_end: acc + len + 1,
        });
        acc += len + 1;
    }
    chunks
}

/// Map a speech-engine character offset to the chunk containing it.
///
/// Offsets past the end of the joined text (or into an empty chunk list)
/// return `None`; callers ignore those events and keep their fallback
/// schedule rather than guessing.
pub fn chunk_index_at(chunks: &[Chunk], char_offset: usize) -> Option<usize> {
    chunks
        .iter()
        .position(|c| char_offset >= c.char_start && char_offset < c.char_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_exact_groups() {
        let chunks = chunk("The quick brown fox jumps over the lazy dog", 3);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["The quick brown", "fox jumps over", "the lazy dog"]);
        assert!(chunks.iter().all(|c| c.word_count == 3));
    }

    #[test]
    fn test_last_chunk_keeps_remainder() {
        let chunks = chunk("one two three four five", 2);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].text, "five");
        assert_eq!(chunks[2].word_count, 1);
        for c in &chunks[..2] {
            assert_eq!(c.word_count, 2);
        }
    }

    #[test]
    fn test_reconstruction_is_whitespace_normalized() {
        let chunks = chunk("  spaced   out\ttext  here ", 2);
        let rejoined = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rejoined, "spaced out text here");
    }

    #[test]
    fn test_empty_input_yields_single_chunk() {
        let chunks = chunk("   ", 5);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "");
        assert_eq!(chunks[0].word_count, 0);
    }

    #[test]
    fn test_char_spans_are_contiguous() {
        let chunks = chunk("Honey never spoils.", 2);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Honey never");
        assert_eq!(chunks[0].char_start, 0);
        // "Honey never" is 11 chars, span covers the joining space
        assert_eq!(chunks[0].char_end, 12);
        assert_eq!(chunks[1].char_start, 12);
    }

    #[test]
    fn test_offset_mapping() {
        let chunks = chunk("Honey never spoils.", 2);
        assert_eq!(chunk_index_at(&chunks, 0), Some(0));
        assert_eq!(chunk_index_at(&chunks, 6), Some(0));
        assert_eq!(chunk_index_at(&chunks, 13), Some(1));
        // past the end of the joined text
        assert_eq!(chunk_index_at(&chunks, 500), None);
    }

    #[test]
    fn test_zero_chunk_size_clamped_to_one() {
        let chunks = chunk("a b c", 0);
        assert_eq!(chunks.len(), 3);
    }
}
