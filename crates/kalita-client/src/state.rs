use tracing::debug;

use crate::error::ClientError;

/// The loading flag and last error message every binding exposes.
///
/// Errors stay put until the next `mount`/`refetch` clears them, so a view
/// can keep showing the last failure while a background fetch succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchState {
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for FetchState {
    /// Bindings start out loading until their first fetch settles.
    fn default() -> Self {
        Self { loading: true, error: None }
    }
}

impl FetchState {
    pub fn begin(&mut self) {
        self.loading = true;
    }

    /// Settle a loading fetch: clears the flag and keeps the error message,
    /// if any.
    pub fn finish<T>(&mut self, result: Result<T, ClientError>) -> Option<T> {
        self.loading = false;
        self.record(result)
    }

    /// Like `finish` for fetches that never toggled `loading`.
    pub fn record<T>(&mut self, result: Result<T, ClientError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("fetch failed: {}", e);
                self.error = Some(e.to_string());
                None
            }
        }
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn api_error(message: &str) -> ClientError {
        ClientError::Api { status: StatusCode::BAD_REQUEST, message: message.to_string() }
    }

    #[test]
    fn starts_loading() {
        let state = FetchState::default();
        assert!(state.loading);
        assert_eq!(state.error, None);
    }

    #[test]
    fn finish_clears_loading_on_both_outcomes() {
        let mut state = FetchState::default();
        assert_eq!(state.finish(Ok::<_, ClientError>(3)), Some(3));
        assert!(!state.loading);

        state.begin();
        assert_eq!(state.finish::<u8>(Err(api_error("boom"))), None);
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("boom"));
    }

    #[test]
    fn errors_are_sticky_until_cleared() {
        let mut state = FetchState::default();
        state.finish::<()>(Err(api_error("first")));
        state.begin();
        state.finish(Ok::<_, ClientError>(()));
        assert_eq!(state.error.as_deref(), Some("first"));

        state.clear_error();
        assert_eq!(state.error, None);
    }

    #[test]
    fn record_leaves_loading_alone() {
        let mut state = FetchState::default();
        state.record::<()>(Err(api_error("categories down")));
        assert!(state.loading);
        assert_eq!(state.error.as_deref(), Some("categories down"));
    }
}
