// =============================================================================
// Text chunking for size-limited message transports
// =============================================================================

/// Split `text` into pieces of at most `max_chars` characters, never cutting
/// through a UTF-8 code point. A `max_chars` of 0 disables splitting.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if max_chars == 0 {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::with_capacity(text.len() / max_chars + 1);
    let mut current = String::new();
    let mut count = 0;
    for ch in text.chars() {
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
