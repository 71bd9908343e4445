//! REST client for the Tesoro admin API.
//!
//! # Design
//! - Every call carries the bearer token from the [`SessionStore`] when one exists.
//! - Non-2xx responses become [`UiError::Server`] with the envelope message; a 401
//!   also signs the admin out.
//! - Requests are aborted after the configured timeout and surface as network errors.

use std::rc::Rc;

use async_trait::async_trait;
use gloo::timers::callback::Timeout;
use gloo_net::http::{Request, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use tesoro_api_models::{LOGIN_PATH, ListParams, LoginRequest, LoginResponse, ResourceKind};
use tracing::{debug, warn};
use web_sys::AbortController;

use crate::core::auth::SessionStore;
use crate::core::config::UiConfig;
use crate::core::error::UiError;
use crate::features::details::key::{DetailKey, DetailRequest};
use crate::features::lists::transport::{
    DetailFetcher, ListFetcher, RecordMutator, encode_query, update_body,
};

/// HTTP client bound to one API base URL and session.
#[derive(Clone)]
pub struct ApiClient {
    config: Rc<UiConfig>,
    session: SessionStore,
}

impl ApiClient {
    /// Client for `config.api_base_url`.
    #[must_use]
    pub fn new(config: UiConfig, session: SessionStore) -> Self {
        Self {
            config: Rc::new(config),
            session,
        }
    }

    /// Sign in and persist the admin session.
    ///
    /// # Errors
    /// Returns the server error, or a validation error when the account is not an admin.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, UiError> {
        let body = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let request = self.authorized(Request::post(&self.config.endpoint(LOGIN_PATH)));
        let raw = self.send_json(request, &body).await?;
        let response = LoginResponse::from_value(&raw);
        self.session.accept_login(&response)?;
        Ok(response)
    }

    /// Create a record from a validated form payload.
    ///
    /// # Errors
    /// Fails for read-only resources and non-2xx responses.
    pub async fn create<T: Serialize + ?Sized>(
        &self,
        resource: ResourceKind,
        payload: &T,
    ) -> Result<Value, UiError> {
        let path = resource
            .create_path()
            .ok_or_else(|| UiError::validation("resource", "is read-only"))?;
        let request = self.authorized(Request::post(&self.config.endpoint(path)));
        self.send_json(request, payload).await
    }

    /// Save a full form payload over an existing record.
    ///
    /// # Errors
    /// Fails for read-only resources, unserializable payloads and non-2xx responses.
    pub async fn update<T: Serialize + ?Sized>(
        &self,
        resource: ResourceKind,
        id: &str,
        payload: &T,
    ) -> Result<Value, UiError> {
        let fields = match serde_json::to_value(payload) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) | Err(_) => return Err(UiError::validation("payload", "must be an object")),
        };
        self.mutate(resource, id, &fields).await
    }

    /// Delete a record.
    ///
    /// # Errors
    /// Fails for resources without a delete endpoint and non-2xx responses.
    pub async fn delete(&self, resource: ResourceKind, id: &str) -> Result<Value, UiError> {
        let path = resource
            .delete_path()
            .ok_or_else(|| UiError::validation("resource", "is read-only"))?;
        let mut body = Map::new();
        body.insert(resource.id_field().to_string(), Value::String(id.to_string()));
        let request = self.authorized(Request::post(&self.config.endpoint(path)));
        self.send_json(request, &body).await
    }

    fn authorized(&self, request: Request) -> Request {
        match self.session.token() {
            Some(token) => request.header("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        request: Request,
        body: &T,
    ) -> Result<Value, UiError> {
        let request = request
            .json(body)
            .map_err(|err| UiError::network(err.to_string()))?;
        self.send(request).await
    }

    async fn send(&self, request: Request) -> Result<Value, UiError> {
        let controller = AbortController::new().ok();
        let request = request.abort_signal(controller.as_ref().map(|c| c.signal()).as_ref());
        let timeout_ms = u32::try_from(self.config.request_timeout_ms).unwrap_or(u32::MAX);
        let _deadline = controller.map(|controller| Timeout::new(timeout_ms, move || controller.abort()));

        let response = request
            .send()
            .await
            .map_err(|err| UiError::network(err.to_string()))?;
        self.read(response).await
    }

    async fn read(&self, response: Response) -> Result<Value, UiError> {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::Null);
        if response.ok() {
            debug!(status, url = %response.url(), "api response");
            return Ok(body);
        }
        let error = UiError::from_response(status, &body);
        warn!(status, url = %response.url(), error = %error, "api request failed");
        self.session.on_unauthorized(&error);
        Err(error)
    }
}

#[async_trait(?Send)]
impl ListFetcher for ApiClient {
    async fn fetch_list(
        &self,
        resource: ResourceKind,
        params: &ListParams,
    ) -> Result<Value, UiError> {
        let url = format!(
            "{}{}",
            self.config.endpoint(resource.list_path()),
            encode_query(&params.to_query_pairs())
        );
        let request = if resource.list_uses_get() {
            Request::get(&url)
        } else {
            Request::post(&url)
        };
        self.send(self.authorized(request)).await
    }
}

#[async_trait(?Send)]
impl DetailFetcher for ApiClient {
    async fn fetch_detail(&self, key: &DetailKey) -> Result<Value, UiError> {
        match key.request()? {
            DetailRequest::Body { path, body } => {
                let request = self.authorized(Request::post(&self.config.endpoint(path)));
                self.send_json(request, &body).await
            }
            DetailRequest::Query {
                path,
                pairs,
                uses_get,
            } => {
                let url = format!("{}{}", self.config.endpoint(path), encode_query(&pairs));
                let request = if uses_get {
                    Request::get(&url)
                } else {
                    Request::post(&url)
                };
                self.send(self.authorized(request)).await
            }
        }
    }
}

#[async_trait(?Send)]
impl RecordMutator for ApiClient {
    async fn mutate(
        &self,
        resource: ResourceKind,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Result<Value, UiError> {
        let (path, body) = update_body(resource, id, patch)?;
        let request = self.authorized(Request::post(&self.config.endpoint(path)));
        self.send_json(request, &body).await
    }
}
