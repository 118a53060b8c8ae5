//! SSE line demultiplexing for task event streams.
//!
//! Meshy task streams are `text/event-stream` bodies whose `data:` frames
//! each carry one JSON document describing task state. Only `data:` lines
//! matter; comments, `event:` lines and blank keep-alives are discarded.

use serde_json::Value;

/// Task statuses after which the server emits no further updates.
///
/// Vendor knowledge, matched verbatim; not a general state grammar.
pub const TERMINAL_STATUSES: [&str; 3] = ["SUCCEEDED", "FAILED", "CANCELED"];

const DATA_PREFIX: &str = "data:";

/// Accumulates raw body chunks and yields complete lines.
///
/// The trailing fragment of the latest chunk is held until a later chunk
/// (or [`LineBuffer::finish`]) completes it. Buffering is byte-level:
/// `\n` cannot occur inside a multi-byte UTF-8 sequence, so characters
/// split across chunk boundaries are reassembled before decoding.
#[derive(Debug, Default)]
pub struct LineBuffer {
    residual: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning every newly completed line.
    ///
    /// Lines end with `\n` or `\r\n`; the terminator is stripped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.residual.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.residual.iter().position(|&byte| byte == b'\n') {
            let mut line: Vec<u8> = self.residual.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Flush the final, unterminated fragment when the body closes.
    pub fn finish(self) -> Option<String> {
        if self.residual.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.residual).into_owned())
        }
    }
}

/// Extract the payload of a `data:` frame.
///
/// The prefix match is case-sensitive; any amount of whitespace between the
/// marker and the payload is tolerated. Non-`data:` lines yield `None`.
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX).map(str::trim_start)
}

/// True when the snapshot is an object whose `status` string is terminal.
pub fn is_terminal(snapshot: &Value) -> bool {
    snapshot
        .get("status")
        .and_then(Value::as_str)
        .map_or(false, |status| TERMINAL_STATUSES.contains(&status))
}
