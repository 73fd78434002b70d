//! Bridge to the generative oil-finder assistant.
//!
//! Wraps the Gemini `generateContent` endpoint. The bridge never surfaces
//! a failure to its caller: transport faults, empty candidate lists, and
//! malformed replies all collapse into a localized fallback suggestion,
//! and a missing credential short-circuits into an offline canned reply
//! after a small artificial delay, without any network call.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::i18n::{messages, Lang};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";

/// Advice length cap passed to the model.
const ADVICE_WORD_LIMIT: usize = 30;

/// Simulated thinking time before the offline canned reply.
const OFFLINE_REPLY_DELAY: Duration = Duration::from_secs(1);

/// A structured product suggestion extracted from the assistant reply.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub text: String,
    #[serde(default, rename = "productId")]
    pub product_id: Option<String>,
}

#[derive(Debug, Error)]
enum AssistantError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no candidate text in the reply")]
    EmptyReply,
    #[error("reply was not the expected JSON shape: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Part {
    text: String,
}

/// Client for the oil-finder assistant. Constructed without a credential it
/// runs in offline degradation mode.
pub struct AssistantClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl AssistantClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying `reqwest::Client` cannot be
    /// constructed.
    pub fn new(api_key: Option<String>, timeout_secs: u64) -> Result<Self, reqwest::Error> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying `reqwest::Client` cannot be
    /// constructed.
    pub fn with_base_url(
        api_key: Option<String>,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("sinopec-bd-storefront/0.1")
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Whether the client runs without a credential.
    pub fn is_offline(&self) -> bool {
        self.api_key.is_none()
    }

    /// Produces exactly one assistant reply for one user query. Never
    /// fails: offline mode yields the canned localized suggestion, and any
    /// service fault yields the localized fallback with no recommendation.
    pub async fn recommend(&self, query: &str, lang: Lang, catalog: &Catalog) -> Recommendation {
        if self.is_offline() {
            tokio::time::sleep(OFFLINE_REPLY_DELAY).await;
            return Recommendation {
                text: messages::assistant_offline_suggestion(lang).to_string(),
                product_id: None,
            };
        }
        match self.try_recommend(query, lang, catalog).await {
            Ok(recommendation) => recommendation,
            Err(e) => {
                tracing::warn!("assistant request failed: {e}");
                Recommendation {
                    text: messages::connection_trouble(lang).to_string(),
                    product_id: None,
                }
            }
        }
    }

    async fn try_recommend(
        &self,
        query: &str,
        lang: Lang,
        catalog: &Catalog,
    ) -> Result<Recommendation, AssistantError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            self.api_key.as_deref().unwrap_or_default()
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": build_prompt(query, lang, catalog) }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });
        let raw = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let reply: GenerateResponse = serde_json::from_str(&raw)?;
        let text = reply
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim())
            .filter(|t| !t.is_empty())
            .ok_or(AssistantError::EmptyReply)?;
        Ok(serde_json::from_str(text)?)
    }
}

fn build_prompt(query: &str, lang: Lang, catalog: &Catalog) -> String {
    let inventory = grounding_context(catalog);
    let language = match lang {
        Lang::En => "English",
        Lang::Bn => "Bengali",
    };
    format!(
        "You are a friendly Sinopec Lubricant Expert for the Bangladesh market.\n\
         Language Preference: {language}.\n\
         Inventory: {inventory}.\n\
         \n\
         User Query: \"{query}\"\n\
         \n\
         Rules:\n\
         1. Recommend a specific product based on vehicle type (Car vs Bike vs Scooter) and viscosity.\n\
         2. Important: For Scooters (e.g., Vespa, Honda Dio), ONLY recommend JASO MB oils.\n\
         3. For wet-clutch bikes (e.g., FZS, Gixxer), recommend JASO MA2 oils (Xplore, Xpert).\n\
         4. Reply in strict JSON: {{ \"text\": \"Advice...\", \"productId\": \"id_string\" | null }}.\n\
         5. Keep advice under {ADVICE_WORD_LIMIT} words.\n\
         6. Respond in {language}."
    )
}

/// Catalog excerpt handed to the model as grounding context.
fn grounding_context(catalog: &Catalog) -> String {
    let entries: Vec<_> = catalog
        .products()
        .iter()
        .map(|p| {
            json!({
                "id": p.id,
                "name": p.name.en,
                "desc": p.desc.en,
                "viscosity": p.viscosity,
                "specs": p.specs,
                "application": p.application.en,
            })
        })
        .collect();
    serde_json::to_string(&entries).unwrap_or_default()
}
