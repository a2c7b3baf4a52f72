use crate::{
    common::LOGIN_PATH,
    config::MemeFactoryConfigApi,
    errors::{ApiError, ApiResult},
    session::Session,
};
use http::{header::CONTENT_TYPE, Method, StatusCode};
use log::{debug, info, warn};
use reqwest::{multipart::Form, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
    time::Duration,
};
use url::Url;

pub mod comment;
pub mod meme;
pub mod user;

/// Called after the stored token was cleared because the server rejected it. A user
/// interface would reload itself and show the login page.
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    pub base_url: String,
    session: Session,
    on_session_expired: Option<SessionExpiredHook>,
}

impl Debug for ApiClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: &MemeFactoryConfigApi, session: Session) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        // relative endpoints are joined onto this, so it must be absolute
        Url::parse(&config.base_url)?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            session,
            on_session_expired: None,
        })
    }

    pub fn with_session_expired_hook(mut self, hook: SessionExpiredHook) -> Self {
        self.on_session_expired = Some(hook);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn get<T, R>(&self, path: &str, query: Option<R>) -> ApiResult<T>
    where
        T: for<'de> Deserialize<'de>,
        R: Serialize + Debug,
    {
        let mut req = self.request(Method::GET, path);
        if let Some(query) = query {
            req = req.query(&query);
        }
        self.send(req.header(CONTENT_TYPE, "application/json"))
            .await
    }

    async fn post<T, R>(&self, path: &str, body: &R) -> ApiResult<T>
    where
        T: for<'de> Deserialize<'de>,
        R: Serialize + Debug,
    {
        // .json() also sets the content type
        self.send(self.request(Method::POST, path).json(body)).await
    }

    /// Content type is left to reqwest, which needs to add the multipart boundary.
    async fn post_multipart<T>(&self, path: &str, form: Form) -> ApiResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.send(self.request(Method::POST, path).multipart(form))
            .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let endpoint = self.request_endpoint(path);
        debug!("{method} {endpoint}");
        let token = self.session.current_token().unwrap_or_default();
        self.client.request(method, endpoint).bearer_auth(token)
    }

    async fn send<T>(&self, req: RequestBuilder) -> ApiResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let res = req.send().await?;
        let status = res.status();
        let url = res.url().to_string();
        let text = res.text().await?;
        self.response(status, text, &url)
    }

    fn response<T>(&self, status: StatusCode, text: String, url: &str) -> ApiResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        if status == StatusCode::UNAUTHORIZED {
            if url.contains(LOGIN_PATH) {
                return Err(ApiError::Unauthorized);
            }
            warn!("Token rejected on {url}, clearing session");
            if let Err(e) = self.session.clear() {
                warn!("Failed to clear token: {e}");
            }
            if let Some(hook) = &self.on_session_expired {
                hook();
            }
            return Err(ApiError::SessionExpired);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !status.is_success() {
            info!("API error: {text} on {url} status {status}");
            return Err(ApiError::Unknown(format!("API error {status}: {text}")));
        }
        serde_json::from_str(&text).map_err(|e| {
            info!("Failed to deserialize api response: {e} from {text} on {url}");
            ApiError::Unknown(e.to_string())
        })
    }

    fn request_endpoint(&self, path: &str) -> String {
        if path.starts_with("http:") || path.starts_with("https:") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
