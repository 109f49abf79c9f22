use crate::error::OverrideError;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Wire shape of the override service, both directions:
/// `{"overrides": {"<x>,<y>,<layer>": bool}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverridePayload {
    #[serde(default)]
    pub overrides: BTreeMap<String, bool>,
}

/// Remote mirror of the override map.
pub trait OverrideBackend {
    /// Current remote state. 401/403 must come back as
    /// [`OverrideError::PermissionDenied`].
    fn fetch(&self) -> Result<OverridePayload, OverrideError>;

    /// Push the full override map. May return before the remote side has
    /// seen it.
    fn submit(&self, payload: OverridePayload) -> Result<(), OverrideError>;
}

/// HTTP client for the override service.
///
/// On native targets submissions run on a detached thread so the caller
/// never waits; two quick toggles may therefore reach the server in either
/// order. wasm32 has no threads, so there the save blocks the caller.
#[derive(Debug, Clone)]
pub struct HttpOverrideBackend {
    endpoint: String,
    token: Option<String>,
}

impl HttpOverrideBackend {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token,
        }
    }

    fn authorize(&self, req: ureq::Request) -> ureq::Request {
        match &self.token {
            Some(token) => req.set("Authorization", &format!("Bearer {token}")),
            None => req,
        }
    }

    fn convert_error(e: ureq::Error) -> OverrideError {
        match e {
            ureq::Error::Status(status @ (401 | 403), _) => OverrideError::PermissionDenied { status },
            ureq::Error::Status(status, response) => OverrideError::Http {
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(t) => OverrideError::Transport(t.to_string()),
        }
    }

    /// Blocking POST; used by the detached submit thread.
    pub fn post_blocking(&self, payload: &OverridePayload) -> Result<(), OverrideError> {
        self.authorize(ureq::post(&self.endpoint))
            .set("Content-Type", "application/json")
            .send_json(payload)
            .map(|_| ())
            .map_err(Self::convert_error)
    }
}

impl OverrideBackend for HttpOverrideBackend {
    fn fetch(&self) -> Result<OverridePayload, OverrideError> {
        let response = self
            .authorize(ureq::get(&self.endpoint))
            .call()
            .map_err(Self::convert_error)?;
        response
            .into_json::<OverridePayload>()
            .map_err(|e| OverrideError::Decode(e.to_string()))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn submit(&self, payload: OverridePayload) -> Result<(), OverrideError> {
        let client = self.clone();
        std::thread::spawn(move || client.post_and_log(&payload));
        Ok(())
    }

    // no threads on the web target; the save runs inline
    #[cfg(target_arch = "wasm32")]
    fn submit(&self, payload: OverridePayload) -> Result<(), OverrideError> {
        self.post_and_log(&payload);
        Ok(())
    }
}

impl HttpOverrideBackend {
    fn post_and_log(&self, payload: &OverridePayload) {
        match self.post_blocking(payload) {
            Ok(()) => log::debug!("Saved {} collision overrides", payload.overrides.len()),
            Err(e) if e.is_permission_denied() => log::debug!("Override save skipped: {e}"),
            Err(e) => log::error!("Failed to save collision overrides: {e}"),
        }
    }
}

/// In-process backend; clones share the same stored payload. Useful for
/// tests and offline sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryOverrideBackend {
    stored: Rc<RefCell<OverridePayload>>,
    deny_status: Option<u16>,
    fail_status: Option<u16>,
    submissions: Rc<RefCell<usize>>,
}

impl MemoryOverrideBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request as if the caller lacked permission.
    pub fn denying(status: u16) -> Self {
        Self {
            deny_status: Some(status),
            ..Self::default()
        }
    }

    /// Fail every submission with a server error.
    pub fn failing_saves(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::default()
        }
    }

    pub fn stored(&self) -> OverridePayload {
        self.stored.borrow().clone()
    }

    pub fn submissions(&self) -> usize {
        *self.submissions.borrow()
    }
}

impl OverrideBackend for MemoryOverrideBackend {
    fn fetch(&self) -> Result<OverridePayload, OverrideError> {
        if let Some(status) = self.deny_status {
            return Err(OverrideError::PermissionDenied { status });
        }
        Ok(self.stored.borrow().clone())
    }

    fn submit(&self, payload: OverridePayload) -> Result<(), OverrideError> {
        *self.submissions.borrow_mut() += 1;
        if let Some(status) = self.deny_status {
            return Err(OverrideError::PermissionDenied { status });
        }
        if let Some(status) = self.fail_status {
            return Err(OverrideError::Http {
                status,
                body: String::new(),
            });
        }
        *self.stored.borrow_mut() = payload;
        Ok(())
    }
}
