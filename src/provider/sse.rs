//! Incremental `text/event-stream` decoder.
//!
//! Bytes arrive in arbitrary network-sized pieces; the decoder buffers
//! partial lines and hands out the `data` payload of each complete event.
//! Multi-line data fields are joined with `\n`. Comments and other fields
//! are ignored.

use std::collections::VecDeque;

use bytes::BytesMut;

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: BytesMut,
    data_lines: Vec<String>,
    ready: VecDeque<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.split_to(pos + 1);
            self.process_line(&line[..pos]);
        }
    }

    /// Next complete event payload, if any.
    pub fn next_data(&mut self) -> Option<String> {
        self.ready.pop_front()
    }

    /// Flush a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) {
        if !self.buffer.is_empty() {
            let rest = self.buffer.split();
            self.process_line(&rest);
        }
        self.dispatch();
    }

    fn process_line(&mut self, line: &[u8]) {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            self.dispatch();
            return;
        }
        if line.starts_with(b":") {
            return;
        }

        let line = String::from_utf8_lossy(line);
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (&*line, ""),
        };
        if field == "data" {
            self.data_lines.push(value.to_string());
        }
    }

    fn dispatch(&mut self) {
        if !self.data_lines.is_empty() {
            self.ready.push_back(self.data_lines.join("\n"));
            self.data_lines.clear();
        }
    }
}
