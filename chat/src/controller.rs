use crate::api::{QueryReply, SourceReply, UploadReply};
use std::fmt;

/// Upload ceiling enforced client-side, matching the server's limit.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// File types the assistant accepts.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "doc", "docx", "txt"];

/// Appended verbatim whenever a query request fails, whatever the server
/// actually said.
pub const QUERY_FAILED_MESSAGE: &str =
    "Sorry, I encountered an error processing your question. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Idle,
    AwaitingReply,
}

/// Why a file never left the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    UnsupportedType { filename: String },
    TooLarge { filename: String },
}

impl fmt::Display for UploadRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadRejection::UnsupportedType { filename } => write!(
                f,
                "{} is not a supported file type. Please upload a PDF, DOC, DOCX, or TXT file.",
                filename
            ),
            UploadRejection::TooLarge { filename } => {
                write!(f, "{} is too large. The maximum file size is 10MB.", filename)
            }
        }
    }
}

/// State-driven chat dispatcher: owns the transcript and refuses to
/// start a request while one is outstanding.
pub struct ChatController {
    transcript: Vec<ChatMessage>,
    state: SendState,
}

impl Default for ChatController {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatController {
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            state: SendState::Idle,
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.state == SendState::AwaitingReply
    }

    /// Accept a query for dispatch. Whitespace-only input is a silent
    /// no-op, and nothing is accepted while a request is in flight. On
    /// acceptance the user's message joins the transcript and the
    /// trimmed query is returned for the network call.
    pub fn begin_query(&mut self, input: &str) -> Option<String> {
        if self.state != SendState::Idle {
            return None;
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        self.transcript.push(ChatMessage {
            speaker: Speaker::User,
            text: trimmed.to_string(),
        });
        self.state = SendState::AwaitingReply;
        Some(trimmed.to_string())
    }

    /// Append the assistant's answer plus one line per cited source.
    pub fn complete_query(&mut self, reply: &QueryReply) {
        let mut text = reply.response.clone();
        let source_lines = format_sources(&reply.sources);
        if !source_lines.is_empty() {
            text.push_str("\n\nSources:");
            for line in source_lines {
                text.push('\n');
                text.push_str(&line);
            }
        }

        self.transcript.push(ChatMessage {
            speaker: Speaker::Assistant,
            text,
        });
        self.state = SendState::Idle;
    }

    /// Append the fixed apology. The failure's details are irrelevant to
    /// the transcript.
    pub fn fail_query(&mut self) {
        self.transcript.push(ChatMessage {
            speaker: Speaker::Assistant,
            text: QUERY_FAILED_MESSAGE.to_string(),
        });
        self.state = SendState::Idle;
    }

    /// Record a confirmed upload. The confirmation names the file and the
    /// server-reported chunk count.
    pub fn note_upload_success(&mut self, filename: &str, reply: &UploadReply) {
        self.transcript.push(ChatMessage {
            speaker: Speaker::System,
            text: upload_confirmation(filename, reply.chunks_created),
        });
    }

    /// Record a failed upload request, naming the file.
    pub fn note_upload_failure(&mut self, filename: &str) {
        self.transcript.push(ChatMessage {
            speaker: Speaker::System,
            text: format!("Failed to upload {}. Please try again.", filename),
        });
    }
}

/// Client-side gate: files that fail here never generate a request.
pub fn validate_upload(filename: &str, size: u64) -> Result<(), UploadRejection> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadRejection::UnsupportedType {
            filename: filename.to_string(),
        });
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadRejection::TooLarge {
            filename: filename.to_string(),
        });
    }
    Ok(())
}

/// One rendered line per source: name plus score as a one-decimal
/// percentage.
pub fn format_sources(sources: &[SourceReply]) -> Vec<String> {
    sources
        .iter()
        .map(|source| format!("• {} ({})", source.source, format_score(source.score)))
        .collect()
}

/// 0.853 → "85.3%"
pub fn format_score(score: f32) -> String {
    format!("{:.1}%", score * 100.0)
}

pub fn upload_confirmation(filename: &str, chunks_created: usize) -> String {
    format!(
        "{} uploaded successfully! Created {} text chunks for retrieval.",
        filename, chunks_created
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(response: &str, sources: Vec<SourceReply>) -> QueryReply {
        QueryReply {
            response: response.to_string(),
            sources,
            confidence: 0.8,
        }
    }

    #[test]
    fn whitespace_query_is_a_silent_noop() {
        let mut controller = ChatController::new();
        assert_eq!(controller.begin_query("   \t  "), None);
        assert!(controller.transcript().is_empty());
        assert!(!controller.is_awaiting_reply());
    }

    #[test]
    fn query_is_trimmed_and_recorded() {
        let mut controller = ChatController::new();
        let accepted = controller.begin_query("  What is the deadline?  ");
        assert_eq!(accepted.as_deref(), Some("What is the deadline?"));
        assert_eq!(controller.transcript().len(), 1);
        assert_eq!(controller.transcript()[0].speaker, Speaker::User);
        assert!(controller.is_awaiting_reply());
    }

    #[test]
    fn second_query_refused_while_in_flight() {
        let mut controller = ChatController::new();
        controller.begin_query("first question").unwrap();
        assert_eq!(controller.begin_query("second question"), None);
        assert_eq!(controller.transcript().len(), 1);
    }

    #[test]
    fn reply_renders_one_line_per_source() {
        let mut controller = ChatController::new();
        controller.begin_query("deadlines?").unwrap();
        controller.complete_query(&reply(
            "Applications close March 1.",
            vec![
                SourceReply {
                    source: "handbook.pdf".to_string(),
                    score: 0.853,
                },
                SourceReply {
                    source: "faq.txt".to_string(),
                    score: 0.501,
                },
            ],
        ));

        let answer = &controller.transcript()[1];
        assert_eq!(answer.speaker, Speaker::Assistant);
        let source_lines: Vec<&str> = answer
            .text
            .lines()
            .filter(|line| line.starts_with('•'))
            .collect();
        assert_eq!(source_lines.len(), 2);
        assert_eq!(source_lines[0], "• handbook.pdf (85.3%)");
        assert_eq!(source_lines[1], "• faq.txt (50.1%)");
        assert!(!controller.is_awaiting_reply());
    }

    #[test]
    fn reply_without_sources_has_no_source_block() {
        let mut controller = ChatController::new();
        controller.begin_query("hello").unwrap();
        controller.complete_query(&reply("Hi there!", Vec::new()));
        assert!(!controller.transcript()[1].text.contains("Sources:"));
    }

    #[test]
    fn score_rounds_to_one_decimal_percent() {
        assert_eq!(format_score(0.853), "85.3%");
        assert_eq!(format_score(1.0), "100.0%");
        assert_eq!(format_score(0.0), "0.0%");
    }

    #[test]
    fn failure_appends_exact_apology() {
        let mut controller = ChatController::new();
        controller.begin_query("deadlines?").unwrap();
        controller.fail_query();

        assert_eq!(controller.transcript()[1].text, QUERY_FAILED_MESSAGE);
        assert!(!controller.is_awaiting_reply());
    }

    #[test]
    fn upload_validation_rejects_type_and_size() {
        assert_eq!(
            validate_upload("virus.exe", 100),
            Err(UploadRejection::UnsupportedType {
                filename: "virus.exe".to_string()
            })
        );
        assert_eq!(
            validate_upload("huge.pdf", MAX_UPLOAD_BYTES + 1),
            Err(UploadRejection::TooLarge {
                filename: "huge.pdf".to_string()
            })
        );
        assert_eq!(validate_upload("fine.pdf", MAX_UPLOAD_BYTES), Ok(()));
        assert_eq!(validate_upload("Guide.TXT", 10), Ok(()));
    }

    #[test]
    fn confirmation_names_the_chunk_count() {
        let text = upload_confirmation("handbook.pdf", 7);
        assert!(text.contains("Created 7 text chunks"));
        assert!(text.contains("handbook.pdf"));
    }

    #[test]
    fn upload_failure_names_the_file() {
        let mut controller = ChatController::new();
        controller.note_upload_failure("handbook.pdf");
        assert!(controller.transcript()[0].text.contains("handbook.pdf"));
        assert_eq!(controller.transcript()[0].speaker, Speaker::System);
    }
}
