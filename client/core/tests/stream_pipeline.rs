//! Integration tests
//!
//! Exercises the full decode → interpret → accumulate pipeline over raw
//! chunk sequences, and the session controller against a scripted transport
//! (no network).

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use shellway_core::{
    interpret, ChatController, ChatRequest, ChatTransport, ClientError, FrameDecoder,
    SessionUpdate, SettingsUpdate, SettingsView, StreamEvent, StreamSignal,
};

// ---------------------------------------------------------------------------
// Decoder → Interpreter → accumulate
// ---------------------------------------------------------------------------

/// Drive raw chunks through the decoder and interpreter, accumulating text.
/// Returns the accumulated text and how many `End` events were seen.
fn run_pipeline(chunks: &[&str]) -> (String, usize) {
    let mut decoder = FrameDecoder::new();
    let mut accumulated = String::new();
    let mut ends = 0;
    'chunks: for chunk in chunks {
        for frame in decoder.push_chunk(chunk.as_bytes()) {
            match interpret(&frame) {
                Some(StreamEvent::TextDelta(text)) => accumulated.push_str(&text),
                Some(StreamEvent::ConversationAssigned(_)) | None => {}
                Some(StreamEvent::End) => {
                    ends += 1;
                    break 'chunks;
                }
            }
        }
    }
    (accumulated, ends)
}

#[test]
fn full_pipeline_round_trip() {
    let (text, ends) = run_pipeline(&[
        "data: \"Hel",
        "lo\"\n\n",
        "data: \" world\"\n\ndata: [DONE]\n\n",
    ]);
    assert_eq!(text, "Hello world");
    assert_eq!(ends, 1);
}

#[test]
fn pipeline_ignores_frames_without_record_prefix() {
    let (text, ends) = run_pipeline(&[
        ": keep-alive\n\ndata: \"ok\"\n\n",
        "noise\n\ndata: [DONE]\n\n",
    ]);
    assert_eq!(text, "ok");
    assert_eq!(ends, 1);
}

#[test]
fn pipeline_result_is_independent_of_chunking() {
    let stream = "data: \"one \"\n\ndata: \"two\"\n\ndata: [CONV_ID]c-1\n\ndata: [DONE]\n\n";
    let (single, _) = run_pipeline(&[stream]);

    let halves = stream.split_at(stream.len() / 2);
    let (split, ends) = run_pipeline(&[halves.0, halves.1]);
    assert_eq!(split, single);
    assert_eq!(ends, 1);
}

// ---------------------------------------------------------------------------
// Controller against a scripted transport
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MockState {
    requests: Mutex<Vec<ChatRequest>>,
    interrupts: Mutex<Vec<String>>,
    uploads: Mutex<Vec<Vec<PathBuf>>>,
    upload_result: Vec<String>,
    script: Mutex<Vec<StreamSignal>>,
    fail_request: bool,
}

#[derive(Clone, Default)]
struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    fn scripted(signals: Vec<StreamSignal>) -> Self {
        Self {
            state: Arc::new(MockState {
                script: Mutex::new(signals),
                ..MockState::default()
            }),
        }
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn stream_reply(
        &self,
        request: ChatRequest,
    ) -> Result<mpsc::Receiver<StreamSignal>, ClientError> {
        self.state.requests.lock().unwrap().push(request);
        if self.state.fail_request {
            return Err(ClientError::Status {
                status: reqwest::StatusCode::BAD_GATEWAY,
                body: "upstream unavailable".to_string(),
            });
        }
        let (tx, rx) = mpsc::channel(100);
        for signal in self.state.script.lock().unwrap().drain(..) {
            tx.try_send(signal).expect("script fits channel");
        }
        Ok(rx)
    }

    async fn interrupt(&self, request_id: &str) -> Result<(), ClientError> {
        self.state
            .interrupts
            .lock()
            .unwrap()
            .push(request_id.to_string());
        Ok(())
    }

    async fn upload(&self, files: &[PathBuf]) -> Result<Vec<String>, ClientError> {
        self.state.uploads.lock().unwrap().push(files.to_vec());
        Ok(self.state.upload_result.clone())
    }

    async fn fetch_settings(&self) -> Result<SettingsView, ClientError> {
        Ok(SettingsView::default())
    }

    async fn update_settings(&self, _update: &SettingsUpdate) -> Result<(), ClientError> {
        Ok(())
    }

    async fn delete_conversation(&self, _conversation_id: &str) -> Result<(), ClientError> {
        Ok(())
    }
}

fn drain(rx: &mut mpsc::Receiver<SessionUpdate>) -> Vec<SessionUpdate> {
    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    updates
}

fn delta(text: &str) -> StreamSignal {
    StreamSignal::Event(StreamEvent::TextDelta(text.to_string()))
}

#[tokio::test]
async fn submit_streams_to_completion() {
    let transport = MockTransport::scripted(vec![
        delta("Hello"),
        delta(" world"),
        StreamSignal::Event(StreamEvent::ConversationAssigned("c-9".to_string())),
        StreamSignal::Event(StreamEvent::End),
    ]);
    let (tx, mut rx) = mpsc::channel(100);
    let mut controller = ChatController::new(transport.clone(), tx);

    assert!(controller.submit("hi there").await);
    assert!(controller.is_busy());
    controller.poll_streaming().await;
    assert!(!controller.is_busy());
    assert_eq!(controller.conversation_id(), Some("c-9"));

    assert_eq!(
        drain(&mut rx),
        vec![
            SessionUpdate::UserMessage {
                content: "hi there".to_string()
            },
            SessionUpdate::AssistantStarted,
            SessionUpdate::AssistantDelta {
                content: "Hello".to_string()
            },
            SessionUpdate::AssistantDelta {
                content: "Hello world".to_string()
            },
            SessionUpdate::ConversationAssigned {
                id: "c-9".to_string()
            },
            SessionUpdate::Completed {
                conversation_id: Some("c-9".to_string())
            },
        ]
    );
}

#[tokio::test]
async fn follow_up_turn_carries_conversation_id() {
    let transport = MockTransport::scripted(vec![
        StreamSignal::Event(StreamEvent::ConversationAssigned("c-9".to_string())),
        StreamSignal::Event(StreamEvent::End),
    ]);
    let (tx, _rx) = mpsc::channel(100);
    let mut controller = ChatController::new(transport.clone(), tx);

    assert!(controller.submit("first").await);
    controller.poll_streaming().await;
    assert!(controller.submit("second").await);

    let requests = transport.state.requests.lock().unwrap();
    assert_eq!(requests[0].conversation_id, None);
    assert_eq!(requests[1].conversation_id, Some("c-9".to_string()));
    assert_ne!(requests[0].request_id, requests[1].request_id);
}

#[tokio::test]
async fn empty_and_concurrent_submissions_are_rejected() {
    let transport = MockTransport::scripted(vec![delta("still streaming")]);
    let (tx, _rx) = mpsc::channel(100);
    let mut controller = ChatController::new(transport.clone(), tx);

    assert!(!controller.submit("   ").await);
    assert!(controller.submit("hi").await);
    // No End yet: the session is still in flight.
    controller.poll_streaming().await;
    assert!(!controller.submit("again").await);
    assert_eq!(transport.state.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn interrupt_reverts_affordance_and_detaches() {
    let transport = MockTransport::scripted(vec![delta("partial reply")]);
    let (tx, mut rx) = mpsc::channel(100);
    let mut controller = ChatController::new(transport.clone(), tx);

    assert!(controller.submit("hi").await);
    controller.poll_streaming().await;
    controller.interrupt().await;

    // Affordance reverts immediately, without waiting for the server.
    assert!(!controller.is_busy());
    let request_id = transport.state.requests.lock().unwrap()[0].request_id.clone();
    assert_eq!(*transport.state.interrupts.lock().unwrap(), vec![request_id]);

    let updates = drain(&mut rx);
    assert_eq!(updates.last(), Some(&SessionUpdate::Interrupted));

    // Detached: further polling produces nothing.
    controller.poll_streaming().await;
    assert!(drain(&mut rx).is_empty());

    // A new submission may start now.
    assert!(controller.submit("next").await);
}

#[tokio::test]
async fn stream_failure_keeps_partial_content() {
    let transport = MockTransport::scripted(vec![
        delta("partial"),
        StreamSignal::Failed("connection reset".to_string()),
    ]);
    let (tx, mut rx) = mpsc::channel(100);
    let mut controller = ChatController::new(transport, tx);

    assert!(controller.submit("hi").await);
    controller.poll_streaming().await;
    assert!(!controller.is_busy());

    let updates = drain(&mut rx);
    assert!(updates.contains(&SessionUpdate::AssistantDelta {
        content: "partial".to_string()
    }));
    assert_eq!(
        updates.last(),
        Some(&SessionUpdate::Failed {
            error: "connection reset".to_string()
        })
    );
}

#[tokio::test]
async fn request_failure_resets_affordance() {
    let transport = MockTransport {
        state: Arc::new(MockState {
            fail_request: true,
            ..MockState::default()
        }),
    };
    let (tx, mut rx) = mpsc::channel(100);
    let mut controller = ChatController::new(transport, tx);

    assert!(controller.submit("hi").await);
    assert!(!controller.is_busy());
    assert!(matches!(
        drain(&mut rx).last(),
        Some(SessionUpdate::Failed { .. })
    ));
}

#[tokio::test]
async fn staged_attachments_upload_before_send() {
    let transport = MockTransport {
        state: Arc::new(MockState {
            upload_result: vec!["tmp/uploads/a.txt".to_string(), "tmp/uploads/b.rs".to_string()],
            script: Mutex::new(vec![StreamSignal::Event(StreamEvent::End)]),
            ..MockState::default()
        }),
    };
    let (tx, mut rx) = mpsc::channel(100);
    let mut controller = ChatController::new(transport.clone(), tx);

    controller.stage_attachment(PathBuf::from("a.txt"));
    controller.stage_attachment(PathBuf::from("b.rs"));
    assert_eq!(controller.staged_attachments(), 2);

    assert!(controller.submit("look at these").await);
    controller.poll_streaming().await;

    // Upload happened exactly once, before the stream request, and the
    // request carries the returned references.
    let uploads = transport.state.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0], vec![PathBuf::from("a.txt"), PathBuf::from("b.rs")]);
    let requests = transport.state.requests.lock().unwrap();
    assert_eq!(
        requests[0].files,
        vec!["tmp/uploads/a.txt".to_string(), "tmp/uploads/b.rs".to_string()]
    );
    // Staged list is consumed by the submission.
    assert_eq!(controller.staged_attachments(), 0);

    let updates = drain(&mut rx);
    assert!(updates.contains(&SessionUpdate::UploadProgress { done: 2, total: 2 }));
}
