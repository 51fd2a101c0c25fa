use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::SendError;

#[derive(Serialize)]
struct UploadRequest<'a> {
    img: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct UploadResponse {
    chat: String,
}

/// Client for the vision endpoint: one frame and one message in, reply text out.
#[derive(Clone)]
pub struct VisionClient {
    client: Client,
    endpoint: String,
}

impl VisionClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    /// POST `{img, text}` and return the raw `chat` field of the reply.
    ///
    /// `img` is the base64 payload without its data-URI prefix. No timeout
    /// is applied beyond what the transport does on its own.
    pub async fn upload_info(&self, img: &str, text: &str) -> Result<String, SendError> {
        let request = UploadRequest { img, text };

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SendError::Status(response.status()));
        }

        let upload_response: UploadResponse = response.json().await?;
        Ok(upload_response.chat)
    }
}
