//! Stream Frame Decoding
//!
//! The chat server delivers its reply as a text stream of records separated
//! by a blank line (two consecutive newlines). Chunks arrive at arbitrary
//! boundaries - a record may span several chunks, and a chunk may carry
//! several records - so decoding is a split-and-carry loop: append the chunk
//! to a running buffer, emit every delimiter-terminated record, and keep the
//! trailing incomplete piece as the new buffer.
//!
//! The buffer is kept as raw bytes until a complete frame is extracted. The
//! delimiter is pure ASCII, so frame extraction can never land inside a
//! multi-byte character: the bytes of a character split across chunks stay
//! in the carry buffer until its remaining bytes arrive.

/// Minimum buffer capacity for the carry buffer
const MIN_BUFFER_CAPACITY: usize = 4096;

/// Decoder state machine for blank-line-delimited stream records
///
/// Buffers incoming bytes and yields complete frame payloads. Frames are
/// emitted strictly in arrival order, and never before their terminating
/// delimiter has been fully seen.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a new decoder with an empty carry buffer
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MIN_BUFFER_CAPACITY),
        }
    }

    /// Feed one chunk of the stream, returning every frame it completes
    ///
    /// Empty frames (nothing between two delimiters) are skipped.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some((end, delim_len)) = find_delimiter(&self.buffer) {
            let frame_bytes = self.buffer[..end].to_vec();
            self.buffer.drain(..end + delim_len);
            if !frame_bytes.is_empty() {
                frames.push(String::from_utf8_lossy(&frame_bytes).into_owned());
            }
        }
        frames
    }

    /// Number of bytes currently held back waiting for a delimiter
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Locate the earliest frame delimiter in `buf`
///
/// Returns the index where the frame ends and the delimiter length. The
/// server emits `\n\n`; the CRLF form is accepted as well in case a proxy
/// normalizes line endings.
fn find_delimiter(buf: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i + 1 < buf.len() {
        if buf[i] == b'\n' && buf[i + 1] == b'\n' {
            return Some((i, 2));
        }
        if i + 3 < buf.len()
            && buf[i] == b'\r'
            && buf[i + 1] == b'\n'
            && buf[i + 2] == b'\r'
            && buf[i + 3] == b'\n'
        {
            return Some((i, 4));
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn decode_in_one_shot(input: &[u8]) -> Vec<String> {
        FrameDecoder::new().push_chunk(input)
    }

    #[test]
    fn test_single_frame() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push_chunk(b"data: hello\n\n");
        assert_eq!(frames, vec!["data: hello".to_string()]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push_chunk(b"data: hel").is_empty());
        let frames = decoder.push_chunk(b"lo\n\ndata: world\n\n");
        assert_eq!(
            frames,
            vec!["data: hello".to_string(), "data: world".to_string()]
        );
    }

    #[test]
    fn test_incomplete_frame_stays_buffered() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push_chunk(b"data: partial").is_empty());
        assert_eq!(decoder.pending(), "data: partial".len());
    }

    #[test]
    fn test_empty_frames_are_skipped() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push_chunk(b"\n\n\n\ndata: a\n\n\n\n");
        assert_eq!(frames, vec!["data: a".to_string()]);
    }

    #[test]
    fn test_crlf_delimiter() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push_chunk(b"data: a\r\n\r\ndata: b\n\n");
        assert_eq!(frames, vec!["data: a".to_string(), "data: b".to_string()]);
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        // "你好" is six bytes; cut in the middle of the first character.
        let input = "data: \"你好\"\n\n".as_bytes();
        let mut decoder = FrameDecoder::new();
        let mut frames = decoder.push_chunk(&input[..8]);
        frames.extend(decoder.push_chunk(&input[8..]));
        assert_eq!(frames, vec!["data: \"你好\"".to_string()]);
    }

    #[test]
    fn test_any_chunking_matches_single_shot() {
        let input = "data: \"Hel\u{00e9}\"\n\ndata: [CONV_ID]abc\n\n\n\ndata: [DONE]\n\n".as_bytes();
        let expected = decode_in_one_shot(input);
        assert!(!expected.is_empty());

        // Every split point, including ones inside the multi-byte character
        // and inside the delimiter itself.
        for split in 0..=input.len() {
            let mut decoder = FrameDecoder::new();
            let mut frames = decoder.push_chunk(&input[..split]);
            frames.extend(decoder.push_chunk(&input[split..]));
            assert_eq!(frames, expected, "split at byte {split}");
        }

        // Byte-at-a-time delivery.
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for byte in input {
            frames.extend(decoder.push_chunk(std::slice::from_ref(byte)));
        }
        assert_eq!(frames, expected);
    }
}
