use std::time::Duration;

use calnow_core::CalNowError;
use http::Uri;

/// Default upper bound for the whole discovery-and-scan run.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Process settings, resolved from flags and `CALNOW_*` environment variables.
#[derive(Clone)]
pub struct Settings {
    pub user: String,
    pub url: String,
    pub password: String,
    /// Emit per-event diagnostics on stderr
    pub verbose: bool,
    pub timeout: Duration,
}

impl Settings {
    /// Validate raw values. Runs before any network activity.
    pub fn new(
        user: Option<String>,
        url: Option<String>,
        password: Option<String>,
        verbose: bool,
        timeout_secs: u64,
    ) -> Result<Self, CalNowError> {
        let user = non_blank(user);
        let password = non_blank(password);

        let (Some(user), Some(password)) = (user, password) else {
            return Err(CalNowError::Config(
                "Please set CALNOW_USER and CALNOW_PASS environment variables".to_string(),
            ));
        };

        let url = non_blank(url).ok_or_else(|| {
            CalNowError::Config("Please set the CALNOW_URL environment variable".to_string())
        })?;
        if !is_absolute_url(&url) {
            return Err(CalNowError::Config(format!("Invalid CALNOW_URL: {}", url)));
        }

        if timeout_secs == 0 {
            return Err(CalNowError::Config("Timeout must be at least one second".to_string()));
        }

        Ok(Settings {
            user,
            url,
            password,
            verbose,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// `scheme://authority/...`, the shape the CalDAV client needs as base URL.
fn is_absolute_url(url: &str) -> bool {
    url.parse::<Uri>()
        .map(|uri| uri.scheme().is_some() && uri.authority().is_some())
        .unwrap_or(false)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
