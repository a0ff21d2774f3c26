//! Risk oracle adapters.

use crate::http::{build_http_client, truncate};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use splitchain_core::{Currency, ResolvedTransfer, RiskOracle, RiskVerdict, SplitchainError};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::debug;

const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are a security expert assessing the risk associated with a \
cryptocurrency transaction. Reply with a single JSON object of the form \
{\"riskAssessment\": string, \"isSafe\": boolean} and nothing else.";

/// Connection settings for [`LlmRiskOracle`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmOracleConfig {
    /// OpenAI-compatible base URL or full chat-completions URL.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for LlmOracleConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: default_model(),
            api_key: None,
            temperature: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Value,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct VerdictPayload {
    #[serde(rename = "riskAssessment")]
    risk_assessment: String,
    #[serde(rename = "isSafe")]
    is_safe: bool,
}

/// Risk oracle backed by an OpenAI-compatible chat-completions model.
#[derive(Debug, Clone)]
pub struct LlmRiskOracle {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    temperature: Option<f32>,
}

impl LlmRiskOracle {
    pub fn new(config: &LlmOracleConfig) -> Result<Self, SplitchainError> {
        if config.model.trim().is_empty() {
            return Err(SplitchainError::Config("llm oracle requires a model".to_string()));
        }
        Ok(Self {
            client: build_http_client(Duration::from_secs(config.request_timeout_secs))?,
            url: resolve_chat_endpoint(config.endpoint.as_deref(), DEFAULT_OPENAI_ENDPOINT),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            temperature: config.temperature,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RiskOracle for LlmRiskOracle {
    fn oracle_id(&self) -> &'static str {
        "llm"
    }

    async fn evaluate(&self, transfer: &ResolvedTransfer) -> Result<RiskVerdict, SplitchainError> {
        let mut payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": compose_prompt(transfer) },
            ],
        });
        if let Some(temp) = self.temperature {
            payload["temperature"] = json!(temp);
        }

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(api_key) = self.api_key.as_deref() {
            request = request.bearer_auth(api_key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| SplitchainError::Oracle(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SplitchainError::Oracle(format!(
                "model error {}: {}",
                status,
                truncate(&body, 320)
            )));
        }

        let body: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| SplitchainError::Oracle(format!("invalid model response: {}", e)))?;
        let choice = body
            .choices
            .first()
            .ok_or_else(|| SplitchainError::Oracle("model response did not include choices".to_string()))?;

        let text = extract_text(&choice.message.content);
        debug!(index = transfer.index, reply = %truncate(&text, 120), "risk model replied");
        parse_verdict(&text)
    }
}

fn compose_prompt(transfer: &ResolvedTransfer) -> String {
    format!(
        "Analyze the following transaction details to determine if the transaction is \
potentially malicious or erroneous.\n\n\
Recipient Address: {}\n\
Amount: {} {}\n\
User Address: {}\n\n\
Provide a risk assessment and indicate whether the transaction is considered safe.\n\
Consider factors such as known scams, suspicious activity associated with the recipient \
address, and unusually large transaction amounts.\n\
Be brief, and provide a safety assessment.",
        transfer.recipient_address, transfer.amount, transfer.currency, transfer.sender_address
    )
}

/// Parse a model reply into a verdict. Markdown code fences and stray prose
/// around the JSON object are tolerated.
pub fn parse_verdict(reply: &str) -> Result<RiskVerdict, SplitchainError> {
    let body = strip_code_fence(reply.trim());
    let json = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => {
            return Err(SplitchainError::MalformedVerdict(format!(
                "no JSON object in reply: {}",
                truncate(reply, 120)
            )))
        }
    };

    let payload: VerdictPayload = serde_json::from_str(json)
        .map_err(|e| SplitchainError::MalformedVerdict(e.to_string()))?;
    let verdict = RiskVerdict {
        is_safe: payload.is_safe,
        explanation: payload.risk_assessment,
    };
    verdict.check()?;
    Ok(verdict)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

fn resolve_chat_endpoint(endpoint: Option<&str>, default_endpoint: &str) -> String {
    let endpoint = endpoint
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(default_endpoint);
    if endpoint.contains("/chat/completions") {
        endpoint.to_string()
    } else {
        format!("{}/chat/completions", endpoint.trim_end_matches('/'))
    }
}

fn extract_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// Settings for [`DenylistRiskOracle`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DenylistConfig {
    /// Recipient addresses that are always flagged.
    #[serde(default)]
    pub denylist: Vec<String>,

    /// Largest amount per currency that passes without being flagged.
    #[serde(default)]
    pub ceilings: HashMap<Currency, Decimal>,
}

/// Offline oracle: flags denylisted recipients and amounts above a
/// per-currency ceiling.
#[derive(Debug, Clone, Default)]
pub struct DenylistRiskOracle {
    denylist: HashSet<String>,
    ceilings: HashMap<Currency, Decimal>,
}

impl DenylistRiskOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DenylistConfig) -> Self {
        let mut oracle = Self {
            denylist: HashSet::new(),
            ceilings: config.ceilings.clone(),
        };
        for address in &config.denylist {
            oracle.deny(address);
        }
        oracle
    }

    pub fn deny(&mut self, address: &str) {
        self.denylist.insert(address.trim().to_ascii_lowercase());
    }

    pub fn with_denied(mut self, address: &str) -> Self {
        self.deny(address);
        self
    }

    pub fn with_ceiling(mut self, currency: Currency, ceiling: Decimal) -> Self {
        self.ceilings.insert(currency, ceiling);
        self
    }
}

#[async_trait]
impl RiskOracle for DenylistRiskOracle {
    fn oracle_id(&self) -> &'static str {
        "denylist"
    }

    async fn evaluate(&self, transfer: &ResolvedTransfer) -> Result<RiskVerdict, SplitchainError> {
        if self
            .denylist
            .contains(&transfer.recipient_address.to_ascii_lowercase())
        {
            return Ok(RiskVerdict::unsafe_because(format!(
                "Recipient {} is on the denylist of known scam addresses.",
                transfer.recipient_address
            )));
        }

        if let Some(ceiling) = self.ceilings.get(&transfer.currency) {
            if transfer.amount > *ceiling {
                return Ok(RiskVerdict::unsafe_because(format!(
                    "Amount {} {} is unusually large (review ceiling is {} {}).",
                    transfer.amount, transfer.currency, ceiling, transfer.currency
                )));
            }
        }

        Ok(RiskVerdict::safe(format!(
            "No known issues with recipient {}.",
            transfer.recipient_address
        )))
    }
}
