use std::borrow::Cow;

use tracing::warn;

/// Longest run of characters without a newline before the buffer is dropped.
pub const MAX_PENDING: usize = 100;

/// Splits a byte stream into `\n`-terminated lines. Bytes are kept until a
/// line is complete, so a character split across reads decodes intact.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every line it completed, without the
    /// terminator.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }

        let pending = self.pending_chars();
        if pending > MAX_PENDING {
            warn!(
                "serial buffer reached {} characters without a newline, clearing",
                pending
            );
            self.buffer.clear();
        }

        lines
    }

    pub fn pending(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// UTF-8 continuation bytes do not start a character.
    fn pending_chars(&self) -> usize {
        self.buffer.iter().filter(|b| (**b & 0xC0) != 0x80).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_split_across_chunks() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"INP").is_empty());
        assert_eq!(framer.push(b"UT: A\r\nB\nC"), vec!["INPUT: A", "B"]);
        assert_eq!(framer.pending(), "C");
        assert_eq!(framer.push(b"\n"), vec!["C"]);
        assert_eq!(framer.pending(), "");
    }

    #[test]
    fn test_overlong_buffer_is_cleared() {
        let mut framer = LineFramer::new();
        let noise = vec![b'x'; MAX_PENDING];
        assert!(framer.push(&noise).is_empty());
        assert_eq!(framer.pending().len(), MAX_PENDING);

        assert!(framer.push(b"y").is_empty());
        assert_eq!(framer.pending(), "");

        assert_eq!(framer.push(b"A\n"), vec!["A"]);
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let mut framer = LineFramer::new();
        let bytes = "INPUT: é\n".as_bytes();
        let split = bytes.len() - 2;
        assert!(framer.push(&bytes[..split]).is_empty());
        assert_eq!(framer.push(&bytes[split..]), vec!["INPUT: é"]);
    }

    #[test]
    fn test_pending_limit_counts_characters() {
        let mut framer = LineFramer::new();
        let wide = "é".repeat(MAX_PENDING);
        assert!(framer.push(wide.as_bytes()).is_empty());
        assert_eq!(framer.pending().chars().count(), MAX_PENDING);

        assert!(framer.push("é".as_bytes()).is_empty());
        assert_eq!(framer.pending(), "");
    }
}
