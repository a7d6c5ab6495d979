use crate::error::{ChatError, ChatResult};
use crate::store::{ConversationStore, IdGenerator, Message, UuidGenerator};
use crate::streaming::{LineDecoder, parse_line};
use futures::{Stream, StreamExt};
use reqwest::Url;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use std::sync::Arc;

/// Name of the query parameter carrying the user's message
pub const QUERY_PARAM: &str = "q";

/// Counters for one consumed event stream
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    /// Lines seen, including ones that carried no event
    pub lines: usize,
    /// Events that appended a fragment
    pub applied: usize,
    /// Event lines whose payload was not JSON
    pub malformed: usize,
}

/// Client for the streaming agent endpoint.
///
/// One `send_message` call is one turn: it records the user message, opens an
/// assistant placeholder and streams fragments into it until the server
/// closes the response.
#[derive(Clone)]
pub struct ChatClient {
    endpoint: String,
    client: reqwest::Client,
    ids: Arc<dyn IdGenerator>,
}

impl ChatClient {
    /// The underlying HTTP client has no request timeout: a turn lasts until
    /// the server finishes or the connection fails.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
            ids: Arc::new(UuidGenerator),
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// `<endpoint>?q="<content>"`, with the quotes part of the value
    pub fn request_url(&self, content: &str) -> ChatResult<Url> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| ChatError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair(QUERY_PARAM, &format!("\"{}\"", content));
        Ok(url)
    }

    /// Run one turn against the endpoint.
    ///
    /// The caller must pass non-blank content and must not start another turn
    /// on the same store while `is_loading` is set. Never fails: transport
    /// errors end up as text in the assistant message.
    pub async fn send_message(&self, store: &ConversationStore, content: &str) {
        store.append_message(Message::user(self.ids.next_id(), content));
        store.append_message(Message::assistant_placeholder(self.ids.next_id()));
        store.set_loading(true);

        match self.stream_turn(store, content).await {
            Ok(summary) => {
                tracing::info!(
                    applied = summary.applied,
                    malformed = summary.malformed,
                    "turn complete"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "chat turn failed");
                store.append_to_last_assistant_message(&error_fragment(store, &e));
            }
        }

        store.set_loading(false);
    }

    async fn stream_turn(
        &self,
        store: &ConversationStore,
        content: &str,
    ) -> ChatResult<StreamSummary> {
        let url = self.request_url(content)?;
        tracing::info!(%url, "sending chat request");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(ChatError::Network)?;

        let status = response.status();
        tracing::info!(%status, "response received");
        if !status.is_success() {
            return Err(ChatError::Status { status });
        }

        consume_stream(response.bytes_stream(), store)
            .await
            .map_err(ChatError::StreamRead)
    }
}

/// Error text for the open assistant message, started on its own line when
/// partial output is already there
fn error_fragment(store: &ConversationStore, error: &ChatError) -> String {
    let needs_break = store
        .last_message()
        .is_some_and(|m| m.is_assistant() && !m.content.is_empty() && !m.content.ends_with('\n'));
    if needs_break {
        format!("\nError: {}", error)
    } else {
        format!("Error: {}", error)
    }
}

/// Apply every event in `stream` to the open assistant message, in order.
///
/// Malformed event lines are logged and skipped. The first read error stops
/// consumption; fragments applied before it stay in place.
pub async fn consume_stream<S, B, E>(stream: S, store: &ConversationStore) -> Result<StreamSummary, E>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    let mut stream = std::pin::pin!(stream);
    let mut decoder = LineDecoder::new();
    let mut summary = StreamSummary::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for line in decoder.push(chunk.as_ref()) {
            apply_line(&line, store, &mut summary);
        }
    }

    // Flush a final line the server did not terminate
    if let Some(line) = decoder.finish() {
        apply_line(&line, store, &mut summary);
    }

    Ok(summary)
}

fn apply_line(line: &str, store: &ConversationStore, summary: &mut StreamSummary) {
    summary.lines += 1;
    match parse_line(line) {
        None => {}
        Some(Ok(event)) => {
            tracing::debug!(?event, "parsed event");
            if let Some(fragment) = event.fragment() {
                store.append_to_last_assistant_message(&fragment);
                summary.applied += 1;
            }
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, "skipping malformed event");
            summary.malformed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Role, SequentialIds};
    use futures::stream;
    use std::convert::Infallible;

    fn open_turn() -> ConversationStore {
        let ids = SequentialIds::new();
        let store = ConversationStore::new();
        store.append_message(Message::user(ids.next_id(), "hi"));
        store.append_message(Message::assistant_placeholder(ids.next_id()));
        store
    }

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<&'static [u8], Infallible>> {
        let items: Vec<Result<&'static [u8], Infallible>> =
            parts.iter().copied().map(|p| Ok(p.as_bytes())).collect();
        stream::iter(items)
    }

    fn assistant_text(store: &ConversationStore) -> String {
        let last = store.last_message().expect("message");
        assert_eq!(last.role, Role::Assistant);
        last.content
    }

    #[tokio::test]
    async fn consecutive_assistant_events_accumulate() {
        let store = open_turn();
        let summary = consume_stream(
            chunks(&[
                "data: {\"role\":\"assistant\",\"content\":\"Hi\"}\n",
                "data: {\"role\":\"assistant\",\"content\":\" there\"}\n",
            ]),
            &store,
        )
        .await
        .expect("infallible");

        assert_eq!(assistant_text(&store), "Hi there");
        assert_eq!(summary.applied, 2);
    }

    #[tokio::test]
    async fn event_split_across_reads_is_applied_once() {
        let store = open_turn();
        consume_stream(
            chunks(&[
                "event: message\ndata: {\"role\":\"assi",
                "stant\",\"content\":\"whole\"}\n\n",
            ]),
            &store,
        )
        .await
        .expect("infallible");

        assert_eq!(assistant_text(&store), "whole");
    }

    #[tokio::test]
    async fn malformed_line_does_not_stop_the_stream() {
        let store = open_turn();
        let summary = consume_stream(
            chunks(&[
                "data: {broken\n",
                "data: {\"type\":\"text\",\"text\":\"ok\"}\n",
            ]),
            &store,
        )
        .await
        .expect("infallible");

        assert_eq!(assistant_text(&store), "ok");
        assert_eq!(summary.malformed, 1);
        assert_eq!(summary.applied, 1);
    }

    #[tokio::test]
    async fn unterminated_final_line_is_applied() {
        let store = open_turn();
        consume_stream(chunks(&["data: {\"type\":\"error\",\"message\":\"late\"}"]), &store)
            .await
            .expect("infallible");

        assert_eq!(assistant_text(&store), "Error: late\n");
    }

    #[tokio::test]
    async fn read_error_keeps_earlier_fragments() {
        let store = open_turn();
        let items: Vec<Result<&'static [u8], &'static str>> = vec![
            Ok(b"data: {\"type\":\"text\",\"content\":\"partial\"}\n".as_slice()),
            Err("connection reset"),
            Ok(b"data: {\"type\":\"text\",\"content\":\"never\"}\n".as_slice()),
        ];

        let result = consume_stream(stream::iter(items), &store).await;

        assert_eq!(result, Err("connection reset"));
        assert_eq!(assistant_text(&store), "partial");
    }

    #[tokio::test]
    async fn ignored_lines_leave_message_untouched() {
        let store = open_turn();
        let summary = consume_stream(
            chunks(&[": comment\n", "\n", "event: ping\n", "data: {\"type\":\"ping\"}\n"]),
            &store,
        )
        .await
        .expect("infallible");

        assert_eq!(assistant_text(&store), "");
        assert_eq!(summary.lines, 4);
        assert_eq!(summary.applied, 0);
    }

    #[test]
    fn error_text_starts_on_its_own_line_after_partial_output() {
        let err = ChatError::InvalidEndpoint {
            endpoint: "x".into(),
            reason: "bad".into(),
        };

        let store = open_turn();
        assert_eq!(error_fragment(&store, &err), "Error: invalid endpoint x: bad");

        store.append_to_last_assistant_message("part");
        assert_eq!(error_fragment(&store, &err), "\nError: invalid endpoint x: bad");

        store.append_to_last_assistant_message("\n");
        assert_eq!(error_fragment(&store, &err), "Error: invalid endpoint x: bad");
    }

    #[test]
    fn request_url_quotes_the_content() {
        let client = ChatClient::new("http://localhost:5050/query");
        let url = client.request_url("hello world").expect("valid url");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs, vec![("q".to_string(), "\"hello world\"".to_string())]);
        assert_eq!(url.path(), "/query");
    }

    #[test]
    fn request_url_rejects_bad_endpoint() {
        let client = ChatClient::new("not a url");
        assert!(matches!(
            client.request_url("x"),
            Err(ChatError::InvalidEndpoint { .. })
        ));
    }

    #[tokio::test]
    async fn bad_endpoint_surfaces_as_message_text() {
        let store = ConversationStore::new();
        let client = ChatClient::new("::nope::").with_id_generator(Arc::new(SequentialIds::new()));

        client.send_message(&store, "hello").await;

        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "hello");
        assert!(messages[1].content.starts_with("Error: invalid endpoint"));
        assert!(!store.is_loading());
    }
}
