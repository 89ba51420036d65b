//! Question answering: web search snippets folded into a chat completion.

use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const UNABLE_TO_RESPOND: &str = "Unable to get response.";
const MAX_SNIPPETS: usize = 5;
const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.7;

const SYSTEM_PROMPT: &str = "You are AWaS, a civic awareness and safety assistant AI. Your task is to answer user questions about protests and civic events in real-time. Always provide clear, concise, and actionable guidance, focusing on safety, context, and civic literacy.

When a user asks about a protest:
1. Identify the location, date, and type of protest (if not given, infer from context or web search results).
2. If the user's question is vague or lacks details, always select the closest or most relevant protest or civic event from the web search results and answer about that event.
3. Provide a brief summary: what the protest is about, who is organizing it, and the main demands or causes.
4. Provide safety guidance: risks, precautions, or areas to avoid.
5. Suggest responsible actions: ways to participate safely, or alternative civic engagement if the user wants to support the cause.
6. Prioritize user safety and neutrality. Never encourage unsafe or illegal actions.
7. Keep responses short and mobile-friendly.

Examples of user questions:
- \"Is it safe to go to the protest in Jakarta tomorrow?\"
- \"What are the demands of the protest near City Hall?\"
- \"Which protests are happening near me today?\"

Format your answer like this:
- **Summary**: [Brief context about the protest]
- **Safety Advice**: [Guidance for staying safe]
- **Suggested Actions**: [Optional ways to participate responsibly]

If you don't have enough information, clearly indicate uncertainty and suggest safe alternatives. Always try to answer about the closest or most relevant protest or event found in the web search results.";

const ACTION_PLAN_SYSTEM_PROMPT: &str = "You are a civic safety assistant.";

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("question is empty")]
    EmptyQuestion,
    #[error("assistant is not configured (CHAT_API_KEY missing)")]
    NotConfigured,
    #[error("assistant upstream error: {0}")]
    Upstream(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantAnswer {
    pub answer: String,
    pub sources: Vec<WebSnippet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlanRequest {
    pub location: String,
    pub weather: String,
    pub situation: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<WebSnippet>,
}

/// System prompt with an optional numbered block of web results appended.
pub fn system_prompt(snippets: &[WebSnippet]) -> String {
    let mut prompt = SYSTEM_PROMPT.to_string();
    if snippets.is_empty() {
        return prompt;
    }
    prompt.push_str("\n\nRecent web search results about this topic:");
    for (idx, item) in snippets.iter().enumerate() {
        prompt.push_str(&format!(
            "\n{}. {} - {}\n{}",
            idx + 1,
            item.title,
            item.link,
            item.snippet
        ));
    }
    prompt.push_str("\nUse these results to inform your answer, but do not copy text verbatim.");
    prompt
}

pub fn action_plan_prompt(request: &ActionPlanRequest) -> String {
    format!(
        "You are a civic safety assistant. Create a protest action plan for the following:\n\
         Location: {}\n\
         Weather: {}\n\
         Situation: {}\n\
         List items to bring, precautions, and safety tips. Format as a checklist.",
        request.location.trim(),
        request.weather.trim(),
        request.situation.trim()
    )
}

pub struct AssistantClient {
    client: Client,
    search_url: String,
    search_credentials: Option<(String, String)>,
    chat_url: String,
    chat_api_key: Option<String>,
    chat_model: String,
}

impl AssistantClient {
    pub fn new(
        client: Client,
        search_url: impl Into<String>,
        search_credentials: Option<(String, String)>,
        chat_url: impl Into<String>,
        chat_api_key: Option<String>,
        chat_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            search_url: search_url.into(),
            search_credentials,
            chat_url: chat_url.into(),
            chat_api_key,
            chat_model: chat_model.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.chat_api_key.is_some()
    }

    pub async fn ask(&self, question: &str) -> Result<AssistantAnswer, AssistantError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::EmptyQuestion);
        }
        if !self.is_configured() {
            return Err(AssistantError::NotConfigured);
        }

        let sources = self.search(question).await;
        let prompt = system_prompt(&sources);
        let answer = self.complete(&prompt, question).await?;
        Ok(AssistantAnswer { answer, sources })
    }

    pub async fn action_plan(&self, request: &ActionPlanRequest) -> Result<String, AssistantError> {
        if !self.is_configured() {
            return Err(AssistantError::NotConfigured);
        }
        self.complete(ACTION_PLAN_SYSTEM_PROMPT, &action_plan_prompt(request))
            .await
    }

    /// Top results for `query`; any failure yields no snippets.
    pub async fn search(&self, query: &str) -> Vec<WebSnippet> {
        let Some((key, engine_id)) = &self.search_credentials else {
            tracing::debug!("web search disabled, no credentials");
            return Vec::new();
        };
        let url = format!("{}/customsearch/v1", self.search_url.trim_end_matches('/'));
        let num = MAX_SNIPPETS.to_string();
        let result: Result<SearchResponse, reqwest::Error> = async {
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("q", query),
                    ("key", key.as_str()),
                    ("cx", engine_id.as_str()),
                    ("num", num.as_str()),
                ])
                .send()
                .await?
                .error_for_status()?;
            response.json::<SearchResponse>().await
        }
        .await;

        match result {
            Ok(body) => body.items.into_iter().take(MAX_SNIPPETS).collect(),
            Err(err) => {
                tracing::warn!("web search failed: {err}");
                Vec::new()
            }
        }
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, AssistantError> {
        let key = self
            .chat_api_key
            .as_deref()
            .ok_or(AssistantError::NotConfigured)?;
        let url = format!("{}/v1/chat/completions", self.chat_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Upstream(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Upstream(format!("chat completion returned {status}")));
        }
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Upstream(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .unwrap_or_else(|| UNABLE_TO_RESPOND.to_string()))
    }
}
