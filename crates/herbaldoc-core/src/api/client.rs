//! API client for the HerbalDoc REST API.
//!
//! `ApiClient` holds the session it authenticates with. Each authenticated
//! request carries `Authorization: Bearer <token>` when a token is stored, and
//! any 401 response is reported to the registered unauthorized handler.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::Session;
use crate::models::{Doctor, LoginForm, PatientRequest, PatientRequestsResponse, SignupForm};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

const SIGNUP_PATH: &str = "doctor/auth/signup";
const LOGIN_PATH: &str = "doctor/auth/login";
const VERIFY_JWT_PATH: &str = "doctor/auth/jwt";
const PATIENT_REQUESTS_PATH: &str = "doctor/patient-requests";

/// `message` value of a successful JWT verification
const JWT_VERIFIED_MESSAGE: &str = "JWT verified";

const SESSION_NOT_SAVED: &str = "Session could not be saved. Please try again.";

/// Body returned by signup and login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: Option<String>,
    #[serde(alias = "user")]
    pub doctor: Option<Value>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
struct JwtRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct JwtResponse {
    message: Option<String>,
    doctor: Option<Value>,
}

/// Called after any 401 response, before the error is returned.
pub type UnauthorizedHandler = Arc<dyn Fn() + Send + Sync>;

/// API client for HerbalDoc.
/// Clone is cheap - reqwest::Client and Session are both shared handles.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: Session,
    on_unauthorized: Option<UnauthorizedHandler>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("session", &self.session)
            .field("on_unauthorized", &self.on_unauthorized.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a client with no unauthorized handler.
    pub fn new(base_url: &str, session: Session) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: Self::parse_base_url(base_url)?,
            session,
            on_unauthorized: None,
        })
    }

    /// Create a client that clears `session` whenever the server answers 401.
    pub fn with_session(base_url: &str, session: Session) -> Result<Self> {
        let expired = session.clone();
        Ok(Self::new(base_url, session)?.on_unauthorized(move || {
            if !expired.clear_all() {
                warn!("Failed to clear session after 401");
            }
        }))
    }

    /// Register the handler run on 401 responses, replacing any previous one.
    pub fn on_unauthorized<F>(mut self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_unauthorized = Some(Arc::new(handler));
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Relative paths only join under the base when it ends with a slash.
    fn parse_base_url(base_url: &str) -> Result<Url> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        Url::parse(&normalized).with_context(|| format!("Invalid API base URL: {}", base_url))
    }

    fn auth_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.session.get_token() {
            match header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(e) => warn!(error = %e, "Stored token is not a valid header value"),
            }
        }
        headers
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        authenticated: bool,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::Unknown(format!("Invalid request path {}: {}", path, e)))?;
        let builder = self.client.request(method, url);
        if authenticated {
            Ok(builder.headers(self.auth_headers()))
        } else {
            Ok(builder)
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Request failed without a response");
            ApiError::from(e)
        })?;
        self.check_response(response).await
    }

    /// Check if response is successful, returning a classified error if not.
    async fn check_response(&self, response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            info!(url = %response.url(), "Received 401, session is no longer valid");
            if let Some(ref handler) = self.on_unauthorized {
                handler();
            }
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response.json().await.map_err(ApiError::from)
    }

    /// Store a fresh token and its doctor record. A new token always replaces
    /// the previous user record, even when the response carries none. A
    /// doctor record without a token is not stored, since it would sit next to
    /// an older session's token.
    fn persist(&self, auth: &AuthResponse) -> Result<(), ApiError> {
        let Some(token) = auth.token.as_deref().filter(|t| !t.is_empty()) else {
            if auth.doctor.is_some() {
                debug!("Response has a doctor record but no token, not storing it");
            }
            return Ok(());
        };

        if !self.session.clear_all() {
            warn!("Previous session could not be cleared");
        }
        if !self.session.set_token(token) {
            warn!("Token could not be persisted");
            return Err(ApiError::Unknown(SESSION_NOT_SAVED.to_string()));
        }
        if let Some(ref doctor) = auth.doctor {
            if !self.session.set_user_data(doctor) {
                warn!("User data could not be persisted");
                if !self.session.clear_all() {
                    warn!("Partial session could not be cleared");
                }
                return Err(ApiError::Unknown(SESSION_NOT_SAVED.to_string()));
            }
        }
        Ok(())
    }

    // ===== Auth =====

    /// Register a new doctor account.
    pub async fn signup(&self, form: &SignupForm) -> Result<AuthResponse, ApiError> {
        form.validate()?;

        let request = self.request(Method::POST, SIGNUP_PATH, true)?.json(form);
        let auth: AuthResponse = Self::parse(self.send(request).await?).await?;

        self.persist(&auth)?;
        info!(has_token = auth.token.is_some(), "Signup complete");
        Ok(auth)
    }

    /// Sign in and persist the returned token and doctor record.
    pub async fn login(&self, form: &LoginForm) -> Result<AuthResponse, ApiError> {
        form.validate()?;

        let request = self.request(Method::POST, LOGIN_PATH, true)?.json(form);
        let auth: AuthResponse = Self::parse(self.send(request).await?).await?;

        if auth.token.as_deref().map_or(true, str::is_empty) {
            return Err(ApiError::Unknown(
                "Login response did not include a token".to_string(),
            ));
        }

        self.persist(&auth)?;
        info!("Login complete");
        Ok(auth)
    }

    /// Ask the server whether `token` is still valid.
    ///
    /// Sent without the bearer header. Returns the doctor record when the
    /// server confirms the token, `None` when it answers without confirming.
    pub async fn verify_jwt(&self, token: &str) -> Result<Option<Value>, ApiError> {
        let request = self
            .request(Method::POST, VERIFY_JWT_PATH, false)?
            .json(&JwtRequest { token });
        let response: JwtResponse = Self::parse(self.send(request).await?).await?;

        if response.message.as_deref() == Some(JWT_VERIFIED_MESSAGE) {
            Ok(response.doctor)
        } else {
            debug!(message = ?response.message, "JWT not verified");
            Ok(None)
        }
    }

    /// The signed-in doctor: cached record first, otherwise verified from the
    /// stored token and cached.
    pub async fn load_profile(&self) -> Result<Doctor, ApiError> {
        let token = self
            .session
            .get_token()
            .ok_or_else(|| ApiError::not_authenticated("Please log in to continue."))?;

        if let Some(record) = self.session.get_user_data() {
            debug!("Doctor info loaded from storage");
            return Ok(Doctor::from_record(&record));
        }

        match self.verify_jwt(&token).await? {
            Some(record) => {
                if !self.session.set_user_data(&record) {
                    warn!("Doctor info could not be cached");
                }
                debug!("Doctor info fetched from API");
                Ok(Doctor::from_record(&record))
            }
            None => Err(ApiError::not_authenticated(
                "Session could not be verified. Please log in again.",
            )),
        }
    }

    /// Forget the stored session.
    pub fn logout(&self) -> bool {
        self.session.clear_all()
    }

    // ===== Patient Requests =====

    pub async fn patient_requests(&self) -> Result<Vec<PatientRequest>, ApiError> {
        let request = self.request(Method::GET, PATIENT_REQUESTS_PATH, true)?;
        let response: PatientRequestsResponse = Self::parse(self.send(request).await?).await?;

        let requests = response.data.unwrap_or_default();
        debug!(count = requests.len(), "Fetched patient requests");
        Ok(requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = ApiClient::new("http://localhost:5001", Session::in_memory()).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:5001/");
        assert_eq!(
            client.base_url().join(LOGIN_PATH).unwrap().as_str(),
            "http://localhost:5001/doctor/auth/login"
        );

        let client = ApiClient::new("http://localhost:5001/api/", Session::in_memory()).unwrap();
        assert_eq!(
            client.base_url().join(PATIENT_REQUESTS_PATH).unwrap().as_str(),
            "http://localhost:5001/api/doctor/patient-requests"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new("not a url", Session::in_memory()).is_err());
    }

    #[test]
    fn test_auth_headers_follow_session() {
        let session = Session::in_memory();
        let client = ApiClient::new("http://localhost:5001", session.clone()).unwrap();
        assert!(client.auth_headers().get(header::AUTHORIZATION).is_none());

        session.set_token("abc");
        assert_eq!(
            client.auth_headers().get(header::AUTHORIZATION).unwrap(),
            "Bearer abc"
        );
    }

    #[test]
    fn test_auth_response_accepts_user_alias() {
        let auth: AuthResponse =
            serde_json::from_str(r#"{"token": "t", "user": {"name": "Anita"}}"#).unwrap();
        assert_eq!(auth.token.as_deref(), Some("t"));
        assert_eq!(auth.doctor.unwrap()["name"], "Anita");
    }

    #[test]
    fn test_persist_replaces_previous_user_record() {
        let session = Session::in_memory();
        session.set_token("old");
        session.set_user_data(&serde_json::json!({"name": "Previous"}));

        let client = ApiClient::new("http://localhost:5001", session.clone()).unwrap();
        client
            .persist(&AuthResponse {
                token: Some("new".to_string()),
                doctor: None,
                message: None,
            })
            .unwrap();

        assert_eq!(session.get_token().as_deref(), Some("new"));
        assert_eq!(session.get_user_data(), None);
    }

    #[test]
    fn test_persist_ignores_doctor_without_token() {
        let session = Session::in_memory();
        session.set_token("old");
        session.set_user_data(&serde_json::json!({"name": "Previous"}));

        let client = ApiClient::new("http://localhost:5001", session.clone()).unwrap();
        client
            .persist(&AuthResponse {
                token: None,
                doctor: Some(serde_json::json!({"name": "Someone Else"})),
                message: None,
            })
            .unwrap();

        assert_eq!(session.get_token().as_deref(), Some("old"));
        assert_eq!(session.get_user_data(), Some(serde_json::json!({"name": "Previous"})));
    }

    #[test]
    fn test_persist_reports_unsaved_token() {
        struct ReadOnlyStore;

        impl crate::auth::KeyValueStore for ReadOnlyStore {
            fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
                Ok(None)
            }
            fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
                Err(anyhow::anyhow!("read-only"))
            }
            fn remove(&self, _key: &str) -> anyhow::Result<()> {
                Ok(())
            }
        }

        let client = ApiClient::new("http://localhost:5001", Session::new(ReadOnlyStore)).unwrap();
        let err = client
            .persist(&AuthResponse {
                token: Some("new".to_string()),
                doctor: None,
                message: None,
            })
            .unwrap_err();
        assert_eq!(err.to_string(), SESSION_NOT_SAVED);
    }
}
