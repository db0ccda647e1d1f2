//! Bearer credentials handed explicitly to the HTTP backend.
//!
//! The backend asks for the current token on every request and calls
//! [`Credentials::refresh`] at most once per request, after a 401.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::error::StoreError;

pub trait Credentials: Send + Sync {
    /// Token to send as `Authorization: Bearer …`, if any.
    fn bearer_token(&self) -> Option<String>;

    /// Obtain a fresh token after the backend rejected the current one.
    fn refresh(&self) -> Result<Option<String>, StoreError> {
        Ok(self.bearer_token())
    }
}

/// Anonymous requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl Credentials for NoCredentials {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// A fixed token that never changes.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

impl Credentials for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Token read from an environment variable; refresh re-reads it.
#[derive(Debug)]
pub struct EnvToken {
    var: String,
    current: RwLock<Option<String>>,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        let var = var.into();
        let current = read_env(&var);
        Self {
            var,
            current: RwLock::new(current),
        }
    }
}

impl Credentials for EnvToken {
    fn bearer_token(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn refresh(&self) -> Result<Option<String>, StoreError> {
        let fresh = read_env(&self.var);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = fresh.clone();
        tracing::debug!("re-read bearer token from ${}", self.var);
        Ok(fresh)
    }
}

fn read_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

type FetchToken = dyn Fn() -> Result<String, String> + Send + Sync;

/// Token obtained from a callback, cached until the backend rejects it.
pub struct CallbackToken {
    fetch: Box<FetchToken>,
    current: RwLock<Option<String>>,
}

impl CallbackToken {
    pub fn new<F>(fetch: F) -> Self
    where
        F: Fn() -> Result<String, String> + Send + Sync + 'static,
    {
        Self {
            fetch: Box::new(fetch),
            current: RwLock::new(None),
        }
    }
}

impl fmt::Debug for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackToken").finish_non_exhaustive()
    }
}

impl Credentials for CallbackToken {
    fn bearer_token(&self) -> Option<String> {
        if let Some(token) = self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Some(token);
        }
        match self.refresh() {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!("could not obtain bearer token: {err}");
                None
            }
        }
    }

    fn refresh(&self) -> Result<Option<String>, StoreError> {
        let token = (self.fetch)().map_err(StoreError::Credentials)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(Some(token))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn static_token_debug_is_redacted() {
        let token = StaticToken::new("secret");
        assert!(!format!("{token:?}").contains("secret"));
        assert_eq!(token.bearer_token().as_deref(), Some("secret"));
    }

    #[test]
    fn callback_token_is_cached_until_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let creds = CallbackToken::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("token-{n}"))
        });

        assert_eq!(creds.bearer_token().as_deref(), Some("token-1"));
        assert_eq!(creds.bearer_token().as_deref(), Some("token-1"));
        assert_eq!(creds.refresh().unwrap().as_deref(), Some("token-2"));
        assert_eq!(creds.bearer_token().as_deref(), Some("token-2"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn callback_failure_surfaces_on_refresh() {
        let creds = CallbackToken::new(|| Err("signed out".to_string()));
        assert!(creds.bearer_token().is_none());
        assert!(matches!(creds.refresh(), Err(StoreError::Credentials(_))));
    }

    #[test]
    fn env_token_missing_var_is_none() {
        let creds = EnvToken::new("LIVEDOC_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert!(creds.bearer_token().is_none());
        assert!(creds.refresh().unwrap().is_none());
    }
}
