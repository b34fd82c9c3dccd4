use crate::error::{RagError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const DEFAULT_BASE_URL: &str = "https://us-south.ml.cloud.ibm.com";
const DEFAULT_MODEL_ID: &str = "ibm/granite-3-2b-instruct";
const API_VERSION: &str = "2024-05-31";
const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

// Refresh the cached IAM token a minute before it actually expires.
const TOKEN_EXPIRY_SLACK: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct GenerationRequest {
    model_id: String,
    input: String,
    parameters: GenerationParameters,
    project_id: String,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    decoding_method: String,
    max_new_tokens: u32,
    temperature: f32,
    repetition_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    results: Vec<GenerationResult>,
}

#[derive(Debug, Deserialize)]
struct GenerationResult {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Client for IBM watsonx.ai text generation with Granite models.
/// Exchanges the IBM Cloud API key for a short-lived IAM bearer token
/// and caches it across calls.
#[derive(Debug)]
pub struct WatsonxClient {
    client: Client,
    api_key: String,
    project_id: String,
    base_url: String,
    model_id: String,
    token: RwLock<Option<CachedToken>>,
}

impl WatsonxClient {
    /// Build a client from environment configuration. `IBM_CLOUD_API_KEY`
    /// and `WATSONX_PROJECT_ID` are required.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("IBM_CLOUD_API_KEY")
            .map_err(|_| RagError::Config("IBM_CLOUD_API_KEY environment variable not set".into()))?;
        let project_id = env::var("WATSONX_PROJECT_ID")
            .map_err(|_| RagError::Config("WATSONX_PROJECT_ID environment variable not set".into()))?;
        let base_url = env::var("WATSONX_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model_id = env::var("MODEL_ID").unwrap_or_else(|_| DEFAULT_MODEL_ID.to_string());

        log::info!("Using watsonx model {}", model_id);

        Ok(Self {
            client: Client::new(),
            api_key,
            project_id,
            base_url,
            model_id,
            token: RwLock::new(None),
        })
    }

    async fn access_token(&self) -> Result<String> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Instant::now() {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let response = self
            .client
            .post(IAM_TOKEN_URL)
            .form(&[
                ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RagError::Watsonx(format!(
                "IAM token request failed: {}",
                error_text
            )));
        }

        let token: IamTokenResponse = response.json().await?;
        let expires_at = Instant::now()
            + Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_SLACK);

        let mut cached = self.token.write().await;
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });

        Ok(token.access_token)
    }

    /// Run a single greedy generation against the configured Granite model.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let token = self.access_token().await?;

        let request = GenerationRequest {
            model_id: self.model_id.clone(),
            input: prompt.to_string(),
            parameters: GenerationParameters {
                decoding_method: "greedy".to_string(),
                max_new_tokens: 500,
                temperature: 0.1,
                repetition_penalty: 1.0,
            },
            project_id: self.project_id.clone(),
        };

        let url = format!(
            "{}/ml/v1/text/generation?version={}",
            self.base_url, API_VERSION
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RagError::Watsonx(format!(
                "text generation failed: {}",
                error_text
            )));
        }

        let generation: GenerationResponse = response.json().await?;
        let answer = generation
            .results
            .first()
            .map(|r| r.generated_text.trim().to_string())
            .unwrap_or_else(|| "No response generated".to_string());

        Ok(answer)
    }

    /// Connectivity probe for the health endpoint: can we still obtain an
    /// IAM token? Avoids burning a generation on every poll.
    pub async fn is_connected(&self) -> bool {
        self.access_token().await.is_ok()
    }

    /// Prompt template for admission queries grounded in retrieved context.
    pub fn build_prompt(query: &str, context: &str) -> String {
        format!(
            r#"You are a College Admission Assistant. You help prospective students with admission-related questions using official college information.

Context Information:
{context}

Student Question: {query}

Instructions:
1. Answer based on the provided context information
2. Be helpful, accurate, and professional
3. If information is not available in context, state that clearly
4. Provide specific details like deadlines, requirements, and procedures when available
5. Always be encouraging and supportive

Answer:"#
        )
    }
}
