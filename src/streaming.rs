use crate::error::ChatError;
use crate::events::ServerEvent;

/// Prefix marking an event line
pub const DATA_PREFIX: &str = "data: ";

/// Splits a chunked byte stream into `\n`-terminated lines.
///
/// Bytes after the last newline are held until the next chunk arrives, so a
/// line (or a multi-byte character) split across reads comes out whole.
#[derive(Debug, Default, Clone)]
pub struct LineDecoder {
    /// Bytes of the current, not yet terminated line
    pending: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(newline_pos) = rest.iter().position(|b| *b == b'\n') {
            self.pending.extend_from_slice(&rest[..newline_pos]);
            lines.push(Self::decode(&self.pending));
            self.pending.clear();
            rest = &rest[newline_pos + 1..];
        }

        self.pending.extend_from_slice(rest);
        lines
    }

    /// Flush the trailing unterminated line, if any
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = Self::decode(&self.pending);
        self.pending.clear();
        Some(line)
    }

    fn decode(bytes: &[u8]) -> String {
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
        String::from_utf8_lossy(bytes).into_owned()
    }
}

/// Interpret one line of the event stream.
///
/// Returns `None` for lines that carry no event (blank keep-alives, `event:`
/// or `:` comment lines), `Some(Err)` when the payload is not JSON.
pub fn parse_line(line: &str) -> Option<Result<ServerEvent, ChatError>> {
    let data = line.strip_prefix(DATA_PREFIX)?;
    let parsed = serde_json::from_str::<serde_json::Value>(data)
        .map(|value| ServerEvent::from_value(&value))
        .map_err(|source| ChatError::MalformedEvent {
            line: line.to_string(),
            source,
        });
    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_lines_in_one_chunk() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"event: message\ndata: {}\n\n");
        assert_eq!(lines, vec!["event: message", "data: {}", ""]);
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn line_split_across_chunks_is_reassembled() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"data: {\"role\":\"assis").is_empty());
        let lines = decoder.push(b"tant\",\"content\":\"Hi\"}\ndata: ");
        assert_eq!(lines, vec![r#"data: {"role":"assistant","content":"Hi"}"#]);
        assert_eq!(decoder.finish().as_deref(), Some("data: "));
    }

    #[test]
    fn split_utf8_sequence_decodes_intact() {
        let text = "data: héllo\n".as_bytes();
        // 'é' is two bytes starting at index 7
        let (first, second) = text.split_at(8);
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(first).is_empty());
        assert_eq!(decoder.push(second), vec!["data: héllo"]);
    }

    #[test]
    fn carriage_returns_are_stripped() {
        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.push(b"data: 1\r\n\r\n"), vec!["data: 1", ""]);
    }

    #[test]
    fn non_data_lines_carry_no_event() {
        assert!(parse_line("").is_none());
        assert!(parse_line("event: message").is_none());
        assert!(parse_line(": keep-alive").is_none());
        assert!(parse_line("data:{\"no\":\"space\"}").is_none());
    }

    #[test]
    fn data_line_parses_to_event() {
        let event = parse_line(r#"data: {"type":"tool_call","tool_name":"search"}"#)
            .expect("event line")
            .expect("valid json");
        assert_eq!(event, ServerEvent::ToolCall("search".into()));
    }

    #[test]
    fn malformed_payload_is_reported() {
        let result = parse_line("data: {not json").expect("event line");
        assert!(matches!(result, Err(ChatError::MalformedEvent { .. })));
    }
}
