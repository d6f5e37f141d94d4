//! Service-account authentication for the Google Sheets API.
//!
//! The bot runs unattended, so instead of an interactive consent flow it signs in with a service
//! account key. The key is given either inline (the JSON itself, usually from an environment
//! variable) or as a path to the downloaded key file. `yup-oauth2` caches the access token in
//! memory and refreshes it shortly before it expires.

use crate::api::SPREADSHEETS_SCOPE;
use crate::config::Credentials;
use crate::Result;
use anyhow::Context;
use std::fmt;
use tracing::debug;
use yup_oauth2::authenticator::DefaultAuthenticator;

/// Hands out valid access tokens for the service account.
pub struct TokenProvider {
    auth: DefaultAuthenticator,
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider").finish_non_exhaustive()
    }
}

impl TokenProvider {
    /// Parses the service account key from `credentials` and builds an authenticator for it. No
    /// network call is made until the first call to `token`.
    pub async fn load(credentials: &Credentials) -> Result<Self> {
        let key = match credentials {
            Credentials::Inline(json) => yup_oauth2::parse_service_account_key(json)
                .context("Unable to parse the inline service account credentials")?,
            Credentials::File(path) => yup_oauth2::read_service_account_key(path)
                .await
                .with_context(|| {
                    format!(
                        "Unable to read the service account credentials at {}",
                        path.display()
                    )
                })?,
        };
        debug!("Loaded service account key for {}", key.client_email);

        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .context("Failed to create the service account authenticator")?;
        Ok(Self { auth })
    }

    /// Returns an access token, refreshing it first if it has expired.
    pub async fn token(&self) -> Result<String> {
        let token = self
            .auth
            .token(&[SPREADSHEETS_SCOPE])
            .await
            .context("Failed to get an access token for the service account")?;
        token
            .token()
            .map(str::to_string)
            .context("The service account access token was empty")
    }
}
