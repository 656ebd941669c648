use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tervis_core::error::AppError;
use tervis_core::traits::TextGenerator;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// HTTP client for Google's Gemini `generateContent` API.
///
/// One prompt in, one text answer out. The client performs a single attempt
/// per call; callers decide what to do on failure.
///
/// # Examples
///
/// ```no_run
/// use tervis_client::GeminiClient;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GeminiClient::new("your-api-key", "gemini-2.0-flash", Duration::from_secs(8))?;
/// let answer = client.generate_content("Como melhorar o sono?").await?;
/// println!("{}", answer);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

/// Request body for the generateContent API
#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// Response from the generateContent API
#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Error response from Gemini API
#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
    #[allow(dead_code)]
    status: Option<String>,
}

impl GeminiClient {
    /// Creates a new Gemini client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Google AI API key
    /// * `model` - Model name, e.g. `gemini-2.0-flash`
    /// * `timeout` - Upper bound for one request
    ///
    /// # Errors
    ///
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self, AppError> {
        Self::with_base_url(api_key, model, timeout, DEFAULT_BASE_URL)
    }

    /// Same as [`new`](Self::new) against a different API host.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout: Duration,
        base_url: &str,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Sends `prompt` as a single user turn and returns the first candidate's text.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Timeout` or `AppError::NetworkError` on transport failures,
    /// `AppError::GeminiError` for API errors (invalid key, blocked prompt),
    /// `AppError::RateLimitExceeded` on HTTP 429, and `AppError::EmptyResponse`
    /// when the reply carries no text.
    pub async fn generate_content(&self, prompt: &str) -> Result<String, AppError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let request_body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                if e.is_timeout() {
                    AppError::Timeout(self.timeout.as_secs())
                } else if e.is_connect() {
                    AppError::NetworkError(format!("Connection failed: {}", e))
                } else {
                    AppError::ClientError(e.to_string())
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(AppError::RateLimitExceeded);
            }

            if let Ok(gemini_error) = serde_json::from_str::<GeminiError>(&error_text) {
                let msg = gemini_error.error.message;
                if status.as_u16() == 401 || msg.contains("API key") {
                    return Err(AppError::GeminiError(
                        "401 Unauthorized - Invalid API key".to_string(),
                    ));
                }
                return Err(AppError::GeminiError(format!("HTTP {}: {}", status.as_u16(), msg)));
            }

            return Err(AppError::GeminiError(format!("HTTP {}", status)));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::ClientError(format!("Failed to parse response: {}", e)))?;

        first_text(generated).ok_or(AppError::EmptyResponse)
    }
}

fn first_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .map(|p| p.text)
        .find(|t| !t.trim().is_empty())
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        self.generate_content(prompt).await
    }
}
