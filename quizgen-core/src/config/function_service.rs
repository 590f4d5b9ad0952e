//! External function service configuration.

use std::time::Duration;

use url::Url;

/// Where the External Processor and External Store live.
///
/// Every call goes to `{base_url}/{function}?code={token}`.
#[derive(Clone)]
pub struct FunctionServiceConfig {
    pub base_url: Url,
    pub token: String,
    pub timeout: Duration,
}

impl FunctionServiceConfig {
    /// URL of one function, with the access code attached.
    pub fn function_url(&self, function: &str) -> Result<Url, url::ParseError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut url = base.join(function)?;
        url.query_pairs_mut().append_pair("code", &self.token);
        Ok(url)
    }
}

impl std::fmt::Debug for FunctionServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionServiceConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}
