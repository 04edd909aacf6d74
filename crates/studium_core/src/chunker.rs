//! crates/studium_core/src/chunker.rs
//!
//! Splits extracted text into overlapping segments for prompt construction.
//! Pure and deterministic: no I/O, no side effects.

/// A bounded, possibly overlapping segment of a larger text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position of this chunk in the sequence, starting at 0.
    pub index: usize,
    /// Character offset of the chunk's first character in the source text.
    pub start_char: usize,
    pub content: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
    #[error("overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    OverlapTooLarge { overlap: usize, chunk_size: usize },
}

/// Split `text` into chunks of at most `chunk_size` characters, consecutive
/// chunks overlapping by `overlap` characters.
///
/// Offsets are measured in characters, and slicing always happens on char
/// boundaries, so multi-byte text is never cut mid-character. Concatenating
/// the first chunk with every later chunk's non-overlapping suffix
/// reconstructs the input exactly; no character is ever dropped.
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<TextChunk>, ChunkError> {
    if chunk_size == 0 {
        return Err(ChunkError::ZeroChunkSize);
    }
    if overlap >= chunk_size {
        return Err(ChunkError::OverlapTooLarge { overlap, chunk_size });
    }
    if text.is_empty() {
        return Ok(Vec::new());
    }

    // Byte offset of every char boundary, plus the end of the string.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;
    let step = chunk_size - overlap;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;
    loop {
        let end = (start + chunk_size).min(char_count);
        chunks.push(TextChunk {
            index,
            start_char: start,
            content: text[boundaries[start]..boundaries[end]].to_string(),
        });
        if end == char_count {
            break;
        }
        start += step;
        index += 1;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rebuild the source text from chunk 0 plus each later chunk's
    /// non-overlapping suffix.
    fn reassemble(chunks: &[TextChunk], overlap: usize) -> String {
        let mut out = String::new();
        for chunk in chunks {
            if chunk.index == 0 {
                out.push_str(&chunk.content);
            } else {
                out.extend(chunk.content.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunk("hola mundo", 100, 20).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "hola mundo");
        assert_eq!(chunks[0].start_char, 0);
    }

    #[test]
    fn consecutive_chunks_overlap_exactly() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunk(text, 10, 4).unwrap();
        for pair in chunks.windows(2) {
            let head_tail: String = pair[0].content.chars().skip(pair[0].content.chars().count() - 4).collect();
            let next_head: String = pair[1].content.chars().take(4).collect();
            assert_eq!(head_tail, next_head);
        }
    }

    #[test]
    fn round_trip_reconstructs_original() {
        let text = "La fotosíntesis es el proceso por el cual las plantas \
                    convierten la luz solar en energía química almacenada.";
        for (size, overlap) in [(10, 3), (25, 10), (40, 0), (7, 6)] {
            let chunks = chunk(text, size, overlap).unwrap();
            assert_eq!(reassemble(&chunks, overlap), text, "size={size} overlap={overlap}");
        }
    }

    #[test]
    fn round_trip_with_multibyte_characters() {
        let text = "años de enseñanza: matemáticas, física y química — 100%";
        let chunks = chunk(text, 8, 3).unwrap();
        assert_eq!(reassemble(&chunks, 3), text);
        for c in &chunks {
            assert!(c.content.chars().count() <= 8);
        }
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk("", 100, 10).unwrap().is_empty());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        assert_eq!(
            chunk("texto", 5, 5),
            Err(ChunkError::OverlapTooLarge { overlap: 5, chunk_size: 5 })
        );
        assert_eq!(chunk("texto", 0, 0), Err(ChunkError::ZeroChunkSize));
    }

    #[test]
    fn chunks_preserve_order_and_offsets() {
        let text = "0123456789".repeat(5);
        let chunks = chunk(&text, 20, 5).unwrap();
        for pair in chunks.windows(2) {
            assert!(pair[0].start_char < pair[1].start_char);
            assert_eq!(pair[1].start_char, pair[0].start_char + 15);
        }
    }
}
