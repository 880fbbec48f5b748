//! Newline-delimited frames read from a peer, with a cap on line length.

use std::mem;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::error::{HotlineError, Result};

/// One line read from a peer
#[derive(Debug)]
pub enum Frame {
    /// A complete UTF-8 line without its delimiter
    Line(String),

    /// A line that could not be used. The reader has already skipped past
    /// it, so the next frame starts on the following line.
    Rejected(HotlineError),
}

/// Reads newline-delimited frames of at most `max_length` bytes
///
/// Longer lines are dropped up to their delimiter and reported as
/// [`Frame::Rejected`], so a peer that never sends a newline cannot grow the
/// buffer past the cap.
pub struct FrameReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    max_length: usize,
    /// Skipping the rest of an oversized line
    discarding: bool,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R, max_length: usize) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
            max_length,
            discarding: false,
        }
    }

    /// Next frame, `None` at end of stream
    ///
    /// Cancel safe: bytes read before a cancellation stay buffered and the
    /// next call picks up where it left off.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            let limit = (self.max_length + 1).saturating_sub(self.buf.len()) as u64;
            let read = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.buf)
                .await?;
            let complete = self.buf.last() == Some(&b'\n');

            if self.discarding {
                self.buf.clear();
                if complete {
                    self.discarding = false;
                    return Ok(Some(Frame::Rejected(HotlineError::invalid_frame(format!(
                        "line longer than {} bytes",
                        self.max_length
                    )))));
                }
                if read == 0 {
                    return Ok(None);
                }
                continue;
            }

            if complete || read == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(decode(mem::take(&mut self.buf))));
            }

            if self.buf.len() > self.max_length {
                self.buf.clear();
                self.discarding = true;
            }
        }
    }
}

fn decode(mut line: Vec<u8>) -> Frame {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }

    match String::from_utf8(line) {
        Ok(line) => Frame::Line(line),
        Err(e) => Frame::Rejected(HotlineError::invalid_frame(format!(
            "line is not valid UTF-8 ({})",
            e.utf8_error()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn frames(input: &[u8], max_length: usize) -> Vec<Frame> {
        let mut reader = FrameReader::new(input, max_length);
        let mut frames = Vec::new();
        while let Some(frame) = reader.next_frame().await.unwrap() {
            frames.push(frame);
        }
        frames
    }

    fn line(frame: &Frame) -> &str {
        match frame {
            Frame::Line(line) => line,
            Frame::Rejected(e) => panic!("expected a line, got {}", e),
        }
    }

    #[tokio::test]
    async fn test_splits_lines_and_strips_delimiters() {
        let frames = frames(b"call 1\r\nanswer A\n\nhangup 1", 64).await;

        assert_eq!(frames.len(), 4);
        assert_eq!(line(&frames[0]), "call 1");
        assert_eq!(line(&frames[1]), "answer A");
        assert_eq!(line(&frames[2]), "");
        assert_eq!(line(&frames[3]), "hangup 1");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_rejected_and_reading_continues() {
        let frames = frames(b"{\"id\":\"\xff\"}\nstate\n", 64).await;

        assert_eq!(frames.len(), 2);
        assert!(matches!(&frames[0], Frame::Rejected(HotlineError::InvalidFrame(_))));
        assert_eq!(line(&frames[1]), "state");
    }

    #[tokio::test]
    async fn test_oversized_line_is_skipped_to_its_delimiter() {
        let mut input = vec![b'x'; 100];
        input.extend_from_slice(b"\ncall 2\n");
        let frames = frames(&input, 16).await;

        assert_eq!(frames.len(), 2);
        match &frames[0] {
            Frame::Rejected(e) => assert_eq!(e.to_string(), "Invalid frame: line longer than 16 bytes"),
            Frame::Line(line) => panic!("oversized line accepted: {} bytes", line.len()),
        }
        assert_eq!(line(&frames[1]), "call 2");
    }

    #[tokio::test]
    async fn test_line_at_the_cap_is_accepted() {
        let frames = frames(b"0123456789abcdef\n", 16).await;
        assert_eq!(line(&frames[0]), "0123456789abcdef");
    }

    #[tokio::test]
    async fn test_unterminated_oversized_tail_ends_the_stream() {
        let frames = frames(&[b'y'; 64], 16).await;
        assert!(frames.is_empty());
    }
}
