//! Chat session
//!
//! A [`ChatSession`] owns the transcript, the context selection and the
//! model client. Front ends either hold it directly or talk to it through a
//! [`SessionHandle`], which queues typed requests so turns never interleave.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::ai::claude::prompts;
use crate::ai::{ModelClient, ModelError};
use crate::config::Config;
use crate::context::{
    ActiveFile, ContextAssembler, ContextMode, ContextRequest, ContextSelection, FileDiscovery,
    IgnoreMatcher,
};

const CONNECTION_PROBE: &str = "Reply with the single word OK.";

/// Who wrote a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the transcript
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            at: Utc::now(),
        }
    }
}

/// Per-session state for one workspace
pub struct ChatSession {
    id: Uuid,
    client: Box<dyn ModelClient>,
    assembler: ContextAssembler,
    root: Option<PathBuf>,
    default_mode: ContextMode,
    selection: ContextSelection,
    active_file: Option<ActiveFile>,
    history: Vec<Message>,
    history_window: usize,
    timeout: Duration,
}

impl ChatSession {
    /// Build a session; the ignore rules are read once here.
    pub fn new(client: Box<dyn ModelClient>, root: Option<PathBuf>, config: &Config) -> Self {
        let matcher = IgnoreMatcher::new(root.as_deref(), &config.context.extra_ignore);
        let assembler = ContextAssembler::new(FileDiscovery::new(matcher))
            .with_max_context_files(config.context.max_context_files)
            .with_reference_phrases(config.context.reference_phrases.clone());
        let default_mode = config.context.mode();

        let id = Uuid::new_v4();
        info!(
            "Session {} started for {}",
            id,
            root.as_deref()
                .map(|r| r.display().to_string())
                .unwrap_or_else(|| "no workspace".to_string())
        );

        Self {
            id,
            client,
            assembler,
            root,
            default_mode,
            selection: ContextSelection::with_mode(default_mode),
            active_file: None,
            history: Vec::new(),
            history_window: config.context.history_messages,
            timeout: config.ai.timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn model_name(&self) -> String {
        self.client.describe()
    }

    pub fn selection(&self) -> &ContextSelection {
        &self.selection
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn active_file(&self) -> Option<&ActiveFile> {
        self.active_file.as_ref()
    }

    pub fn set_context_mode(&mut self, mode: ContextMode) {
        debug!("Context mode: {} -> {}", self.selection.mode, mode);
        self.selection.mode = mode;
    }

    pub fn set_selected_files(&mut self, paths: Vec<String>) {
        self.selection.set_selected(paths);
        debug!("{} files selected", self.selection.selected_files.len());
    }

    pub fn toggle_selected_file(&mut self, path: &str) {
        self.selection.toggle(path);
    }

    pub fn set_active_file(&mut self, file: Option<ActiveFile>) {
        self.active_file = file;
    }

    /// Clear the transcript and the context selection
    pub fn reset(&mut self) {
        self.history.clear();
        self.selection = ContextSelection::with_mode(self.default_mode);
        info!("Session {} reset", self.id);
    }

    /// Every discoverable file with its size
    pub fn list_available_files(&self) -> Vec<(String, usize)> {
        match self.assembler.discovery().discover(self.root()) {
            Ok(files) => files.into_iter().map(|f| (f.path, f.size)).collect(),
            Err(e) => {
                warn!("Could not list workspace files: {}", e);
                Vec::new()
            }
        }
    }

    /// The context block the next turn would send for `query`
    pub fn build_context(&self, query: &str) -> String {
        self.assembler.assemble(&ContextRequest {
            mode: self.selection.mode,
            query,
            selected_files: &self.selection.selected_files,
            active_file: self.active_file.as_ref(),
            root: self.root(),
        })
    }

    /// Combine instructions, context, recent turns and the question
    fn build_prompt(&self, query: &str, context: &str) -> String {
        let mut prompt = format!(
            "{}\n\n## Context ({} mode)\n\n{}\n",
            prompts::CODING_ASSISTANT,
            self.selection.mode,
            context.trim_end()
        );

        // The newest entry is the question itself
        let earlier = &self.history[..self.history.len().saturating_sub(1)];
        let recent = &earlier[earlier.len().saturating_sub(self.history_window)..];
        if !recent.is_empty() {
            prompt.push_str("\n## Conversation so far\n\n");
            for message in recent {
                let speaker = match message.role {
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                };
                prompt.push_str(&format!("{}: {}\n\n", speaker, message.content.trim()));
            }
        }

        prompt.push_str(&format!("\n## Question\n\n{}\n", query));
        prompt
    }

    /// Run one chat turn. The question stays in the transcript even when the
    /// model call fails.
    #[instrument(skip(self, query), fields(session = %self.id, mode = %self.selection.mode))]
    pub async fn send_query(&mut self, query: &str) -> Result<String, ModelError> {
        self.history.push(Message::new(Role::User, query));

        let context = self.build_context(query);
        let prompt = self.build_prompt(query, &context);
        debug!("Prompt is {} chars", prompt.chars().count());

        let result = match tokio::time::timeout(self.timeout, self.client.complete(&prompt)).await {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout(self.timeout)),
        };

        match result {
            Ok(answer) => {
                self.history.push(Message::new(Role::Assistant, &answer));
                Ok(answer)
            }
            Err(e) => {
                warn!("Chat turn failed: {}", e);
                Err(e)
            }
        }
    }

    /// Send a trivial prompt and report whether a non-empty answer came back
    pub async fn test_model_connection(&self) -> bool {
        match tokio::time::timeout(self.timeout, self.client.complete(CONNECTION_PROBE)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!("Model connection test failed: {}", e);
                false
            }
            Err(_) => {
                warn!("Model connection test timed out after {:?}", self.timeout);
                false
            }
        }
    }

    /// Apply one queued request
    pub async fn handle(&mut self, request: SessionRequest) -> SessionResponse {
        match request {
            SessionRequest::SetContextMode(mode) => {
                self.set_context_mode(mode);
                SessionResponse::Done
            }
            SessionRequest::SetSelectedFiles(paths) => {
                self.set_selected_files(paths);
                SessionResponse::Done
            }
            SessionRequest::SetActiveFile(file) => {
                self.set_active_file(file);
                SessionResponse::Done
            }
            SessionRequest::SendQuery(text) => SessionResponse::Reply(self.send_query(&text).await),
            SessionRequest::ListAvailableFiles => SessionResponse::Files(self.list_available_files()),
            SessionRequest::TestModelConnection => {
                SessionResponse::Connection(self.test_model_connection().await)
            }
            SessionRequest::Status => SessionResponse::Status(SessionStatus {
                root: self.root.clone(),
                selection: self.selection().clone(),
                active_file: self.active_file().map(|f| f.name.clone()),
                model: self.model_name(),
                messages: self.history.len(),
            }),
            SessionRequest::History => SessionResponse::History(self.history().to_vec()),
            SessionRequest::Reset => {
                self.reset();
                SessionResponse::Done
            }
        }
    }
}

/// Typed requests from a front end to its session
#[derive(Debug)]
pub enum SessionRequest {
    SetContextMode(ContextMode),
    SetSelectedFiles(Vec<String>),
    SetActiveFile(Option<ActiveFile>),
    SendQuery(String),
    ListAvailableFiles,
    TestModelConnection,
    Status,
    History,
    Reset,
}

#[derive(Debug)]
pub enum SessionResponse {
    Done,
    Reply(Result<String, ModelError>),
    Files(Vec<(String, usize)>),
    Connection(bool),
    Status(SessionStatus),
    History(Vec<Message>),
}

/// Snapshot for status lines
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub root: Option<PathBuf>,
    pub selection: ContextSelection,
    pub active_file: Option<String>,
    pub model: String,
    pub messages: usize,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("chat session has shut down")]
    Closed,

    #[error("unexpected response from chat session")]
    UnexpectedResponse,
}

struct Envelope {
    request: SessionRequest,
    reply: oneshot::Sender<SessionResponse>,
}

/// Cloneable front-end handle; requests are served one at a time in order.
#[derive(Clone)]
pub struct SessionHandle {
    tx: async_channel::Sender<Envelope>,
}

/// Move `session` onto its own task and return a handle to it
pub fn spawn(mut session: ChatSession) -> SessionHandle {
    let (tx, rx) = async_channel::unbounded::<Envelope>();

    tokio::spawn(async move {
        while let Ok(Envelope { request, reply }) = rx.recv().await {
            let response = session.handle(request).await;
            if reply.send(response).is_err() {
                debug!("Session caller went away before the reply");
            }
        }
        debug!("Session {} stopped", session.id());
    });

    SessionHandle { tx }
}

impl SessionHandle {
    async fn call(&self, request: SessionRequest) -> Result<SessionResponse, SessionError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)
    }

    async fn call_done(&self, request: SessionRequest) -> Result<(), SessionError> {
        match self.call(request).await? {
            SessionResponse::Done => Ok(()),
            _ => Err(SessionError::UnexpectedResponse),
        }
    }

    pub async fn set_context_mode(&self, mode: ContextMode) -> Result<(), SessionError> {
        self.call_done(SessionRequest::SetContextMode(mode)).await
    }

    pub async fn set_selected_files(&self, paths: Vec<String>) -> Result<(), SessionError> {
        self.call_done(SessionRequest::SetSelectedFiles(paths)).await
    }

    pub async fn set_active_file(&self, file: Option<ActiveFile>) -> Result<(), SessionError> {
        self.call_done(SessionRequest::SetActiveFile(file)).await
    }

    pub async fn reset(&self) -> Result<(), SessionError> {
        self.call_done(SessionRequest::Reset).await
    }

    pub async fn send_query(&self, text: &str) -> Result<String, SessionError> {
        match self.call(SessionRequest::SendQuery(text.to_string())).await? {
            SessionResponse::Reply(result) => Ok(result?),
            _ => Err(SessionError::UnexpectedResponse),
        }
    }

    pub async fn list_available_files(&self) -> Result<Vec<(String, usize)>, SessionError> {
        match self.call(SessionRequest::ListAvailableFiles).await? {
            SessionResponse::Files(files) => Ok(files),
            _ => Err(SessionError::UnexpectedResponse),
        }
    }

    pub async fn test_model_connection(&self) -> Result<bool, SessionError> {
        match self.call(SessionRequest::TestModelConnection).await? {
            SessionResponse::Connection(ok) => Ok(ok),
            _ => Err(SessionError::UnexpectedResponse),
        }
    }

    pub async fn history(&self) -> Result<Vec<Message>, SessionError> {
        match self.call(SessionRequest::History).await? {
            SessionResponse::History(messages) => Ok(messages),
            _ => Err(SessionError::UnexpectedResponse),
        }
    }

    pub async fn status(&self) -> Result<SessionStatus, SessionError> {
        match self.call(SessionRequest::Status).await? {
            SessionResponse::Status(status) => Ok(status),
            _ => Err(SessionError::UnexpectedResponse),
        }
    }
}
