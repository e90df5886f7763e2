use std::sync::{Arc, RwLock};

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use kalita_types::api::{
    AuthResponse, CreateCategoryRequest, CreateCommentRequest, CreateNewsRequest, Deleted,
    Envelope, SetRoleRequest, SignInRequest, SignUpRequest, UpdateNewsRequest,
    UpsertResidentRequest,
};
use kalita_types::directory::DirectoryStats;
use kalita_types::models::{
    News, NewsCategory, NewsComment, NewsDetail, ResidentInfo, Role, UserProfile,
};

use crate::error::ClientError;

/// Where the API lives and the public key it expects.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: String,
}

impl ClientConfig {
    /// Reads `KALITA_API_URL` and `KALITA_API_KEY`. Both are required.
    pub fn from_env() -> Result<Self, ClientError> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ClientError::Config(format!("{} is not set", name)))
        };
        Ok(Self {
            api_url: var("KALITA_API_URL")?,
            api_key: var("KALITA_API_KEY")?,
        })
    }
}

/// Cheap to clone; clones share the HTTP pool and the bearer token.
#[derive(Clone)]
pub struct KalitaClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    token: Arc<RwLock<Option<String>>>,
}

impl KalitaClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.api_url.trim().is_empty() || config.api_key.trim().is_empty() {
            return Err(ClientError::Config("API URL and API key are both required".into()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = token;
        }
    }

    // -- Auth --

    pub async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<AuthResponse, ClientError> {
        let body = SignUpRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
        };
        self.send(self.request(Method::POST, "/auth/signup").json(&body)).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send(self.request(Method::POST, "/auth/signin").json(&body)).await
    }

    pub async fn sign_out(&self) -> Result<(), ClientError> {
        self.send_envelope::<()>(self.request(Method::POST, "/auth/signout")).await?;
        Ok(())
    }

    pub async fn current_user(&self) -> Result<UserProfile, ClientError> {
        self.send(self.request(Method::GET, "/auth/user")).await
    }

    pub async fn set_role(&self, user_id: Uuid, role: Role) -> Result<UserProfile, ClientError> {
        let path = format!("/admin/users/{}/role", user_id);
        self.send(self.request(Method::PUT, &path).json(&SetRoleRequest { role })).await
    }

    // -- News --

    pub async fn published_news(&self, limit: u32, offset: u32) -> Result<Vec<News>, ClientError> {
        let req = self.request(Method::GET, "/news").query(&[("limit", limit), ("offset", offset)]);
        self.send(req).await
    }

    pub async fn news_by_category(&self, category_id: Uuid, limit: u32) -> Result<Vec<News>, ClientError> {
        let path = format!("/categories/{}/news", category_id);
        self.send(self.request(Method::GET, &path).query(&[("limit", limit)])).await
    }

    pub async fn news_detail(&self, id: Uuid) -> Result<NewsDetail, ClientError> {
        self.send(self.request(Method::GET, &format!("/news/{}", id))).await
    }

    pub async fn important_news(&self) -> Result<Vec<News>, ClientError> {
        self.send(self.request(Method::GET, "/news/important")).await
    }

    pub async fn create_news(&self, news: &CreateNewsRequest) -> Result<News, ClientError> {
        self.send(self.request(Method::POST, "/news").json(news)).await
    }

    pub async fn update_news(&self, id: Uuid, changes: &UpdateNewsRequest) -> Result<News, ClientError> {
        self.send(self.request(Method::PATCH, &format!("/news/{}", id)).json(changes)).await
    }

    pub async fn delete_news(&self, id: Uuid) -> Result<Deleted, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/news/{}", id))).await
    }

    // -- Categories --

    pub async fn categories(&self) -> Result<Vec<NewsCategory>, ClientError> {
        self.send(self.request(Method::GET, "/categories")).await
    }

    pub async fn create_category(&self, category: &CreateCategoryRequest) -> Result<NewsCategory, ClientError> {
        self.send(self.request(Method::POST, "/categories").json(category)).await
    }

    // -- Comments --

    pub async fn comments(&self, news_id: Uuid) -> Result<Vec<NewsComment>, ClientError> {
        self.send(self.request(Method::GET, &format!("/news/{}/comments", news_id))).await
    }

    pub async fn add_comment(&self, news_id: Uuid, content: &str) -> Result<NewsComment, ClientError> {
        let body = CreateCommentRequest { content: content.to_string() };
        let path = format!("/news/{}/comments", news_id);
        self.send(self.request(Method::POST, &path).json(&body)).await
    }

    pub async fn delete_comment(&self, id: Uuid) -> Result<Deleted, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/comments/{}", id))).await
    }

    // -- Residents --

    pub async fn public_residents(&self) -> Result<Vec<ResidentInfo>, ClientError> {
        self.send(self.request(Method::GET, "/residents")).await
    }

    pub async fn residents_by_block(&self, block: &str) -> Result<Vec<ResidentInfo>, ClientError> {
        self.send(self.request(Method::GET, "/residents").query(&[("block", block)])).await
    }

    /// Server-side directory search over public records.
    pub async fn search_residents(&self, term: &str) -> Result<Vec<ResidentInfo>, ClientError> {
        self.send(self.request(Method::GET, "/residents").query(&[("q", term)])).await
    }

    pub async fn blocks(&self) -> Result<Vec<String>, ClientError> {
        self.send(self.request(Method::GET, "/residents/blocks")).await
    }

    pub async fn directory_stats(&self) -> Result<DirectoryStats, ClientError> {
        self.send(self.request(Method::GET, "/residents/stats")).await
    }

    pub async fn current_resident(&self) -> Result<ResidentInfo, ClientError> {
        self.send(self.request(Method::GET, "/residents/me")).await
    }

    pub async fn upsert_resident(&self, resident: &UpsertResidentRequest) -> Result<ResidentInfo, ClientError> {
        self.send(self.request(Method::PUT, "/residents/me").json(resident)).await
    }

    pub async fn delete_resident(&self, id: Uuid) -> Result<Deleted, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/residents/{}", id))).await
    }

    // -- Plumbing --

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.api_key);
        if let Some(token) = self.token() {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        self.send_envelope(req).await?.ok_or(ClientError::EmptyResponse)
    }

    async fn send_envelope<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Option<T>, ClientError> {
        let resp = req.send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        let envelope: Envelope<T> = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            // Transport-level rejections (bad JSON body, bad path) are plain text.
            Err(_) if !status.is_success() => Envelope::err(String::from_utf8_lossy(&bytes).trim()),
            Err(e) => {
                return Err(ClientError::Api {
                    status,
                    message: format!("malformed response: {}", e),
                });
            }
        };

        if let Some(message) = envelope.error.filter(|_| !status.is_success()) {
            debug!("API error {}: {}", status, message);
            return Err(ClientError::Api { status, message });
        }
        if !status.is_success() {
            return Err(ClientError::Api {
                status,
                message: status.canonical_reason().unwrap_or("request failed").to_string(),
            });
        }
        Ok(envelope.data)
    }
}

