//! REST client for the milk collection backend
//!
//! [`MilkApi`] is the seam the CLI and TUI program against; [`HttpApi`]
//! implements it over blocking `reqwest`. Responses come in a few shapes
//! (`{status, message, data}` envelopes, bare objects, bare arrays) and are
//! normalized here so callers only see typed values.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::services::capabilities::Capabilities;
use crate::services::session::Session;
use crate::types::{
    JwtResponse, LoginRequest, MilkEntry, MilkRequest, MilktrackError, PasswordChange, Result,
    SignupRequest, User, UserUpdate,
};

/// Which milk entries a listing returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryScope {
    /// Every user's entries (administrators)
    All,
    /// Only the signed-in user's entries
    Own,
}

impl EntryScope {
    pub fn for_capabilities(caps: Capabilities) -> Self {
        if caps.can_view_all_entries {
            Self::All
        } else {
            Self::Own
        }
    }

    fn path(self) -> &'static str {
        match self {
            Self::All => "/milk",
            Self::Own => "/milk/my-milk",
        }
    }
}

/// Backend operations used by the app
pub trait MilkApi: Send + Sync {
    /// Exchange credentials for a session
    fn sign_in(&self, username: &str, password: &str) -> Result<Session>;

    /// Register an account, returning the server's message
    fn sign_up(&self, request: &SignupRequest) -> Result<String>;

    /// Tell the server the session ended. Failures are only logged.
    fn sign_out(&self);

    fn list_milk(&self, scope: EntryScope) -> Result<Vec<MilkEntry>>;
    fn get_milk(&self, id: i64) -> Result<MilkEntry>;
    fn list_milk_by_type(&self, milk_type: &str) -> Result<Vec<MilkEntry>>;
    fn list_milk_for_user(&self, user_id: i64) -> Result<Vec<MilkEntry>>;
    fn create_milk(&self, request: &MilkRequest) -> Result<MilkEntry>;
    fn update_milk(&self, id: i64, request: &MilkRequest) -> Result<MilkEntry>;
    fn delete_milk(&self, id: i64) -> Result<()>;

    fn list_users(&self) -> Result<Vec<User>>;
    fn count_users(&self) -> Result<u64>;
    fn get_user(&self, id: i64) -> Result<User>;
    fn current_user(&self) -> Result<User>;
    fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User>;
    fn delete_user(&self, id: i64) -> Result<String>;
    fn change_password(&self, change: &PasswordChange) -> Result<String>;
}

/// Blocking HTTP implementation of [`MilkApi`]
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_settings(&config.api_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn with_settings(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MilktrackError::Http(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Attach a bearer token to every subsequent request
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| {
                MilktrackError::Config(format!("invalid API URL {}: {}", self.base_url, e))
            })
    }

    /// `path` followed by one percent-encoded segment
    fn url_with_segment(&self, path: &str, segment: &str) -> Result<Url> {
        let mut url = self.url(path)?;
        url.path_segments_mut()
            .map_err(|_| MilktrackError::Config(format!("invalid API URL {}", self.base_url)))?
            .push(segment);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "api request");
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and decode the body; `what` names the resource in 404 errors
    fn send(&self, builder: RequestBuilder, what: &str) -> Result<Value> {
        let response = builder
            .send()
            .map_err(|e| MilktrackError::Http(format!("HTTP request failed: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| MilktrackError::Http(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "api error response");
            return Err(status_error(status, &body, what));
        }
        parse_body(&body)
    }

    fn get(&self, path: &str, what: &str) -> Result<Value> {
        let url = self.url(path)?;
        self.send(self.request(Method::GET, url), what)
    }
}

impl MilkApi for HttpApi {
    fn sign_in(&self, username: &str, password: &str) -> Result<Session> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let url = self.url("/auth/signin")?;
        let value = self
            .send(self.request(Method::POST, url).json(&body), "sign-in")
            .map_err(|e| match e {
                MilktrackError::Unauthorized => {
                    MilktrackError::Validation("invalid username or password".into())
                }
                MilktrackError::NotFound(_) => MilktrackError::Http(format!(
                    "login service not found, check the API URL ({})",
                    self.base_url
                )),
                other => other,
            })?;

        let response: JwtResponse = decode(value, "sign-in response")?;
        let token = response
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| MilktrackError::Parse("sign-in response has no token".into()))?;

        Ok(Session {
            token,
            user: response.user(),
        })
    }

    fn sign_up(&self, request: &SignupRequest) -> Result<String> {
        let url = self.url("/auth/signup")?;
        let value = self.send(self.request(Method::POST, url).json(request), "sign-up")?;
        Ok(message_of(&value, "User registered successfully"))
    }

    fn sign_out(&self) {
        let result = self
            .url("/auth/signout")
            .and_then(|url| self.send(self.request(Method::POST, url), "sign-out"));
        if let Err(e) = result {
            warn!(error = %e, "server sign-out failed");
        }
    }

    fn list_milk(&self, scope: EntryScope) -> Result<Vec<MilkEntry>> {
        let value = self.get(scope.path(), "milk list")?;
        milk_list(value)
    }

    fn get_milk(&self, id: i64) -> Result<MilkEntry> {
        let value = self.get(&format!("/milk/{}", id), &format!("milk entry {}", id))?;
        decode(unwrap_data(value), "milk entry")
    }

    fn list_milk_by_type(&self, milk_type: &str) -> Result<Vec<MilkEntry>> {
        let url = self.url_with_segment("/milk/type", milk_type)?;
        let value = self.send(self.request(Method::GET, url), &format!("milk type {}", milk_type))?;
        milk_list(value)
    }

    fn list_milk_for_user(&self, user_id: i64) -> Result<Vec<MilkEntry>> {
        let value = self.get(&format!("/milk/user/{}", user_id), &format!("user {}", user_id))?;
        milk_list(value)
    }

    fn create_milk(&self, request: &MilkRequest) -> Result<MilkEntry> {
        let url = self.url("/milk/")?;
        let value = self.send(self.request(Method::POST, url).json(request), "milk entry")?;
        decode(unwrap_data(value), "created milk entry")
    }

    fn update_milk(&self, id: i64, request: &MilkRequest) -> Result<MilkEntry> {
        let url = self.url(&format!("/milk/{}", id))?;
        let value = self.send(
            self.request(Method::PUT, url).json(request),
            &format!("milk entry {}", id),
        )?;
        decode(unwrap_data(value), "updated milk entry")
    }

    fn delete_milk(&self, id: i64) -> Result<()> {
        let url = self.url(&format!("/milk/{}", id))?;
        self.send(self.request(Method::DELETE, url), &format!("milk entry {}", id))?;
        Ok(())
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let value = self.get("/users/", "user list")?;
        let items = match unwrap_data(value) {
            Value::Array(items) => items,
            _ => return Err(MilktrackError::Parse("user list is not an array".into())),
        };
        items
            .into_iter()
            .filter(|v| !v.is_null())
            .map(|v| decode(v, "user"))
            .collect()
    }

    fn count_users(&self) -> Result<u64> {
        let value = self.get("/users/count", "user count")?;
        value
            .get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| MilktrackError::Parse("user count response has no count".into()))
    }

    fn get_user(&self, id: i64) -> Result<User> {
        let value = self.get(&format!("/users/{}", id), &format!("user {}", id))?;
        decode(unwrap_data(value), "user")
    }

    fn current_user(&self) -> Result<User> {
        let value = self.get("/users/me", "current user")?;
        decode(unwrap_data(value), "user")
    }

    fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User> {
        let url = self.url(&format!("/users/{}", id))?;
        let value = self.send(
            self.request(Method::PUT, url).json(update),
            &format!("user {}", id),
        )?;
        decode(unwrap_data(value), "updated user")
    }

    fn delete_user(&self, id: i64) -> Result<String> {
        let url = self.url(&format!("/users/{}", id))?;
        let value = self.send(self.request(Method::DELETE, url), &format!("user {}", id))?;
        Ok(message_of(&value, "User deleted successfully"))
    }

    fn change_password(&self, change: &PasswordChange) -> Result<String> {
        let url = self.url("/users/change-password")?;
        let value = self.send(self.request(Method::POST, url).json(change), "password change")?;
        Ok(message_of(&value, "Password changed successfully"))
    }
}

/// Map a non-success status to an error
fn status_error(status: StatusCode, body: &str, what: &str) -> MilktrackError {
    let message = error_message(body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    match status {
        StatusCode::UNAUTHORIZED => MilktrackError::Unauthorized,
        StatusCode::FORBIDDEN => MilktrackError::Forbidden(message),
        StatusCode::NOT_FOUND => MilktrackError::NotFound(what.to_string()),
        _ => MilktrackError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// `message` (or `error`) from a JSON error body, else a short plain-text body
fn error_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return ["message", "error"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str))
            .map(str::to_string);
    }
    let text = body.trim();
    if text.is_empty() || text.starts_with('<') || text.len() > 200 {
        None
    } else {
        Some(text.to_string())
    }
}

fn parse_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body)
        .map_err(|e| MilktrackError::Parse(format!("invalid JSON response: {}", e)))
}

/// Envelope payload when present, else the value itself
fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) if !data.is_null() => data,
            _ => Value::Object(map),
        },
        other => other,
    }
}

/// Milk list from a bare array or an envelope's `data` or `milk` key.
/// Null and undecodable items are skipped.
fn milk_list(value: Value) -> Result<Vec<MilkEntry>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            match map
                .remove("data")
                .filter(Value::is_array)
                .or_else(|| map.remove("milk").filter(Value::is_array))
            {
                Some(Value::Array(items)) => items,
                _ => return Err(MilktrackError::Parse("response contains no milk list".into())),
            }
        }
        _ => return Err(MilktrackError::Parse("response contains no milk list".into())),
    };

    Ok(items
        .into_iter()
        .filter(|item| !item.is_null())
        .filter_map(|item| match serde_json::from_value::<MilkEntry>(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping malformed milk entry");
                None
            }
        })
        .collect())
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| MilktrackError::Parse(format!("invalid {}: {}", what, e)))
}

fn message_of(value: &Value, fallback: &str) -> String {
    value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_string()
}
