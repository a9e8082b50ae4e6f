//! Test doubles and fixtures shared by the integration tests.

use crate::config::{AssistantSettings, ChunkOptions};
use crate::embeddings::EmbeddingProvider;
use crate::notify::Notifier;
use crate::parser::PlainTextLoader;
use crate::service::{AssistantComponents, ResumeAssistant};
use resume_core::{AppError, AppResult};
use resume_llm::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmUsage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const RESUME: &str = "Jane Doe\n\n\
Senior Software Engineer at Acme Corp, 2019-2023. Led the payments platform team.\n\n\
Migrated billing services from Python to Rust.\n\n\
Skills:\n• Python\n• Rust\n• PostgreSQL\
\x0c\
Education: B.Sc. Computer Science, State University.\n\n\
Interests: hiking and chess.";

const VOCABULARY: &[&str] = &[
    "python",
    "rust",
    "acme",
    "payments",
    "education",
    "university",
    "hiking",
    "chess",
    "kubernetes",
];

/// Embeds text as keyword counts over a fixed vocabulary.
///
/// The last dimension is a constant so no vector is ever zero.
#[derive(Debug, Default)]
pub struct KeywordEmbedder {
    pub embedded_texts: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn embedded(&self) -> usize {
        self.embedded_texts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn provider_name(&self) -> &str {
        "keyword"
    }

    fn model_name(&self) -> &str {
        "keyword-v1"
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len() + 1
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.embedded_texts.fetch_add(texts.len(), Ordering::SeqCst);

        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut vector: Vec<f32> = VOCABULARY
                    .iter()
                    .map(|word| lower.matches(word).count() as f32)
                    .collect();
                vector.push(0.1);
                vector
            })
            .collect())
    }
}

/// Keyword embedder that stalls on every multi-text batch.
///
/// Index builds embed in batches while queries embed one text, so only
/// builds are slowed down.
#[derive(Debug)]
pub struct SlowEmbedder {
    pub inner: Arc<KeywordEmbedder>,
    pub delay: Duration,
}

impl SlowEmbedder {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: KeywordEmbedder::new(),
            delay,
        })
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for SlowEmbedder {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.len() > 1 {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.embed_batch(texts).await
    }
}

/// Language model double with fixed replies.
///
/// Requests whose system prompt asks for a standalone question get
/// `condensed`; everything else gets `answer`.
#[derive(Debug)]
pub struct ScriptedLlm {
    pub answer: String,
    pub condensed: String,
    pub fail: bool,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn answering(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.to_string(),
            condensed: String::new(),
            fail: false,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn condensing(condensed: &str, answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.to_string(),
            condensed: condensed.to_string(),
            fail: false,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            answer: String::new(),
            condensed: String::new(),
            fail: true,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn is_condense_request(request: &LlmRequest) -> bool {
    request
        .system
        .as_deref()
        .is_some_and(|s| s.contains("standalone question"))
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if self.fail {
            return Err(AppError::Generation("model unavailable".to_string()));
        }

        let content = if is_condense_request(request) {
            self.condensed.clone()
        } else {
            self.answer.clone()
        };

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
            done: true,
        })
    }

    async fn stream(&self, _request: &LlmRequest) -> AppResult<LlmStream> {
        Err(AppError::Generation("streaming not scripted".to_string()))
    }
}

/// Keeps every notification it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, subject: &str, body: &str) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// Always fails to deliver.
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait::async_trait]
impl Notifier for FailingNotifier {
    fn name(&self) -> &str {
        "failing"
    }

    async fn notify(&self, _subject: &str, _body: &str) -> AppResult<()> {
        Err(AppError::Notification("smtp down".to_string()))
    }
}

pub fn write_resume(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("resume.txt");
    std::fs::write(&path, content).unwrap();
    path
}

/// Settings over `dir` with small chunks so the resume spans several.
pub fn settings(dir: &Path) -> AssistantSettings {
    let mut settings = AssistantSettings::new(dir, dir.join("resume.txt"));
    settings.chunking = ChunkOptions {
        chunk_size: 120,
        chunk_overlap: 20,
    };
    settings
}

pub fn components(
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmClient>,
    notifier: Arc<dyn Notifier>,
) -> AssistantComponents {
    AssistantComponents {
        loader: Arc::new(PlainTextLoader),
        embedder,
        llm,
        notifier,
    }
}

/// Assistant over `RESUME` in `dir`, with a keyword embedder.
pub async fn assistant(
    dir: &Path,
    llm: Arc<dyn LlmClient>,
    notifier: Arc<dyn Notifier>,
) -> ResumeAssistant {
    write_resume(dir, RESUME);
    ResumeAssistant::initialize_with(settings(dir), components(KeywordEmbedder::new(), llm, notifier))
        .await
        .unwrap()
}

/// A minimal PDF with one line of Courier text per page.
pub fn pdf_bytes(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
