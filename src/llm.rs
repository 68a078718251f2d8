//! The one non-deterministic step: talking to a language model.
//!
//! Everything else in a pipeline should be plain code; this module is the
//! seam where a model comes in. [`LlmClient`] speaks to any OpenAI-compatible
//! chat-completions endpoint, and [`ScriptedModel`] stands in for it when you
//! want deterministic runs (tests, demos, dry runs).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use ureq::Agent;

use crate::step::StepError;
use crate::tools::parse::{extract_json, strip_code_fences};

/// One chat message.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// A model-agnostic chat request: messages plus sampling knobs.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
}

/// Anything that can turn a chat request into a text response.
///
/// The HTTP client implements this; so does [`ScriptedModel`]. Steps never
/// see which one is installed.
pub trait Model {
    fn complete(&self, req: &ChatRequest) -> Result<String, StepError>;
}

// Lets callers keep a handle to a model (e.g. a ScriptedModel they want to
// inspect afterwards) while the Ctx owns its own reference.
impl<M: Model + ?Sized> Model for std::sync::Arc<M> {
    fn complete(&self, req: &ChatRequest) -> Result<String, StepError> {
        (**self).complete(req)
    }
}

// ---------------------------------------------------------------------------
// HTTP client (OpenAI-compatible chat completions)
// ---------------------------------------------------------------------------

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct LlmClient {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl LlmClient {
    /// `endpoint` is the API base URL (e.g. `http://localhost:11434/v1`);
    /// `model` is the model name the endpoint expects.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct ApiMessage {
    content: String,
}

impl Model for LlmClient {
    fn complete(&self, req: &ChatRequest) -> Result<String, StepError> {
        let config = Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .build();
        let agent: Agent = config.into();

        let body = ApiRequest {
            model: &self.model,
            messages: &req.messages,
            temperature: req.temperature,
        };

        let url = format!("{}/chat/completions", self.endpoint);
        let mut request = agent.post(&url);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let text = request.send_json(&body)?.body_mut().read_to_string()?;

        let parsed: ApiResponse = serde_json::from_str(&text)
            .map_err(|e| StepError::other(format!("bad completion response: {e}")))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| StepError::other("completion response had no choices"))?;

        Ok(choice.message.content)
    }
}

// ---------------------------------------------------------------------------
// Scripted model
// ---------------------------------------------------------------------------

/// A model that replays canned responses in order.
///
/// Keeps every user message it was sent, so tests can assert how many calls
/// a pipeline made and with what.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// User messages received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Number of completions served so far.
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl Model for ScriptedModel {
    fn complete(&self, req: &ChatRequest) -> Result<String, StepError> {
        let user = req
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(user);

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| StepError::transient("scripted model ran out of replies"))
    }
}

// ---------------------------------------------------------------------------
// Chat builder
// ---------------------------------------------------------------------------

/// Builder for one model call, obtained from [`crate::Ctx::llm`].
pub struct Chat<'a> {
    model: Option<&'a dyn Model>,
    req: ChatRequest,
}

impl<'a> Chat<'a> {
    pub(crate) fn new(model: Option<&'a dyn Model>) -> Self {
        Self {
            model,
            req: ChatRequest::default(),
        }
    }

    /// Add a system message.
    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.req.messages.push(Message {
            role: "system".into(),
            content: content.into(),
        });
        self
    }

    /// Add a user message.
    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.req.messages.push(Message {
            role: "user".into(),
            content: content.into(),
        });
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.req.temperature = Some(t);
        self
    }

    /// Send the request and return the raw text response.
    pub fn send(self) -> Result<String, StepError> {
        let model = self
            .model
            .ok_or_else(|| StepError::invalid("no model installed on Ctx"))?;
        model.complete(&self.req)
    }

    /// Send the request and coerce the response into a fixed-shape record.
    ///
    /// Strips markdown code fences, carves the first JSON object out of
    /// whatever prose surrounds it, and deserializes. A response that holds
    /// no parseable record is rejected with [`StepError::Invalid`] — the
    /// caller decides whether to retry, substitute, or give up.
    pub fn send_structured<T: DeserializeOwned>(self) -> Result<T, StepError> {
        let raw = self.send()?;
        let cleaned = strip_code_fences(&raw);
        let json = extract_json(&cleaned)
            .ok_or_else(|| StepError::invalid("no JSON object in model response"))?;
        Ok(serde_json::from_str(&json)?)
    }
}
