//! Response records and export requests
//!
//! A response is what a customer wrote for one recipient of a book: a target
//! label plus the ordered question/answer pairs, each optionally illustrated
//! by an image URL. The export engine only reads these.

use super::ids::{to_file_component, BookId};
use serde::{Deserialize, Deserializer, Serialize};

/// One question with its answer and optional illustration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    /// Question identifier (numeric or string on the wire)
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,

    /// Question text
    pub question: String,

    /// Answer text, empty when the customer skipped it
    #[serde(default, deserialize_with = "null_as_empty")]
    pub answer: String,

    /// Image attached to the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl QuestionAnswer {
    /// Creates a question/answer pair without an image
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: None,
            question: question.into(),
            answer: answer.into(),
            image_url: None,
        }
    }

    /// Attaches an image URL
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// The image URL, ignoring empty values
    ///
    /// A whitespace-only URL still counts as an image; resolving it fails and
    /// the image is skipped.
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|url| !url.is_empty())
    }

    /// Whether this pair contributes an image step
    pub fn has_image(&self) -> bool {
        self.image_url().is_some()
    }
}

/// Wrapper matching the backend's `answers` object
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Answers {
    #[serde(default)]
    pub questions: Vec<QuestionAnswer>,
}

/// One response record as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Response identifier
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,

    /// Owner of the response
    #[serde(default, deserialize_with = "string_or_number")]
    pub user_id: Option<String>,

    /// Book the response belongs to
    #[serde(default, deserialize_with = "string_or_number")]
    pub book_id: Option<String>,

    /// Free-text recipient label ("Mother", "Best friend", ...)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target: String,

    /// Ordered questions
    #[serde(default)]
    pub answers: Answers,
}

impl ResponseRecord {
    /// Creates a record for the given target with no questions
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id: None,
            book_id: None,
            target: target.into(),
            answers: Answers::default(),
        }
    }

    /// Sets the owning book
    pub fn with_book_id(mut self, book_id: impl Into<String>) -> Self {
        self.book_id = Some(book_id.into());
        self
    }

    /// Sets the response identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Appends a question
    pub fn with_question(mut self, question: QuestionAnswer) -> Self {
        self.answers.questions.push(question);
        self
    }

    /// Ordered question/answer pairs
    pub fn questions(&self) -> &[QuestionAnswer] {
        &self.answers.questions
    }

    /// Number of questions carrying an image
    pub fn image_count(&self) -> usize {
        self.questions().iter().filter(|q| q.has_image()).count()
    }
}

/// What is being exported; drives the artifact file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// Every response of a book
    Book(BookId),

    /// A single response, named after its author and recipient
    Response {
        response_id: String,
        username: String,
        target: String,
    },
}

impl ExportTarget {
    /// Deterministic artifact file name for this target
    ///
    /// ```
    /// use keepsake::domain::{BookId, ExportTarget};
    ///
    /// let target = ExportTarget::Book(BookId::new("42").unwrap());
    /// assert_eq!(target.file_name("pdf"), "book_42_responses.pdf");
    /// ```
    pub fn file_name(&self, extension: &str) -> String {
        match self {
            ExportTarget::Book(book_id) => {
                format!("book_{}_responses.{extension}", book_id.to_file_component())
            }
            ExportTarget::Response {
                response_id,
                username,
                target,
            } => format!(
                "response_{}_{}_{}.{extension}",
                to_file_component(username),
                to_file_component(target),
                to_file_component(response_id)
            ),
        }
    }

    /// Author printed above a single response; `None` for book exports
    pub fn author(&self) -> Option<&str> {
        match self {
            ExportTarget::Book(_) => None,
            ExportTarget::Response { username, .. } => Some(username),
        }
    }

    /// Identifier used in logs
    pub fn label(&self) -> String {
        match self {
            ExportTarget::Book(book_id) => format!("book:{book_id}"),
            ExportTarget::Response { response_id, .. } => format!("response:{response_id}"),
        }
    }
}

/// Immutable input of one export run
#[derive(Debug, Clone)]
pub struct ExportRequest {
    target: ExportTarget,
    responses: Vec<ResponseRecord>,
}

impl ExportRequest {
    /// Creates a request from already-selected records
    pub fn new(target: ExportTarget, responses: Vec<ResponseRecord>) -> Self {
        Self { target, responses }
    }

    /// Selects the records of one book, keeping their order
    ///
    /// Records without a `book_id` are assumed to belong to the book (they
    /// were already fetched per book).
    pub fn for_book(book_id: BookId, records: impl IntoIterator<Item = ResponseRecord>) -> Self {
        let responses = records
            .into_iter()
            .filter(|r| {
                r.book_id
                    .as_deref()
                    .map_or(true, |id| id == book_id.as_str())
            })
            .collect();
        Self {
            target: ExportTarget::Book(book_id),
            responses,
        }
    }

    /// Request exporting exactly one response
    pub fn single_response(record: ResponseRecord, username: impl Into<String>) -> Self {
        let target = ExportTarget::Response {
            response_id: record.id.clone().unwrap_or_else(|| "unknown".to_string()),
            username: username.into(),
            target: record.target.clone(),
        };
        Self {
            target,
            responses: vec![record],
        }
    }

    /// Export target
    pub fn target(&self) -> &ExportTarget {
        &self.target
    }

    /// Ordered response records
    pub fn responses(&self) -> &[ResponseRecord] {
        &self.responses
    }

    /// Whether there is nothing to export
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
