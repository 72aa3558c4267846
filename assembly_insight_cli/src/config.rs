//! Credentials and endpoint overrides read from the environment (and `.env`).

use std::env::VarError;

use anyhow::{bail, Result};
use assembly_insight_lib::assembly_api::{NewsSearchClient, OpenAssemblyClient};

pub const GOV_API_KEY: &str = "GOV_API_KEY";
pub const NAVER_CLIENT_ID: &str = "NAVER_CLIENT_ID";
pub const NAVER_CLIENT_SECRET: &str = "NAVER_CLIENT_SECRET";
pub const ASSEMBLY_API_BASE_URL: &str = "ASSEMBLY_API_BASE_URL";
pub const NEWS_API_BASE_URL: &str = "NEWS_API_BASE_URL";

fn credential(name: &str, value: Result<String, VarError>) -> Result<String> {
    match value {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => bail!("{} is not set. Add it to the environment or a .env file.", name),
    }
}

fn optional(value: Result<String, VarError>) -> Option<String> {
    value.ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Client for the Open Assembly portal. Fails when `GOV_API_KEY` is missing.
pub fn portal_client() -> Result<OpenAssemblyClient> {
    let key = credential(GOV_API_KEY, std::env::var(GOV_API_KEY))?;
    let client = match optional(std::env::var(ASSEMBLY_API_BASE_URL)) {
        Some(url) => OpenAssemblyClient::with_base_url(&url, key)?,
        None => OpenAssemblyClient::new(key)?,
    };
    Ok(client)
}

/// Client for the news search API. Fails when either Naver credential is
/// missing.
pub fn news_client() -> Result<NewsSearchClient> {
    let id = credential(NAVER_CLIENT_ID, std::env::var(NAVER_CLIENT_ID))?;
    let secret = credential(NAVER_CLIENT_SECRET, std::env::var(NAVER_CLIENT_SECRET))?;
    let client = match optional(std::env::var(NEWS_API_BASE_URL)) {
        Some(url) => NewsSearchClient::with_base_url(&url, id, secret)?,
        None => NewsSearchClient::new(id, secret)?,
    };
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_names_the_variable() {
        let err = credential(GOV_API_KEY, Err(VarError::NotPresent)).unwrap_err();
        assert!(err.to_string().contains("GOV_API_KEY"));
    }

    #[test]
    fn blank_credential_is_missing() {
        assert!(credential(NAVER_CLIENT_ID, Ok("   ".into())).is_err());
    }

    #[test]
    fn credential_is_trimmed() {
        assert_eq!(credential(NAVER_CLIENT_ID, Ok(" abc \n".into())).unwrap(), "abc");
    }

    #[test]
    fn optional_ignores_blank() {
        assert_eq!(optional(Ok("".into())), None);
        assert_eq!(optional(Err(VarError::NotPresent)), None);
        assert_eq!(
            optional(Ok("http://localhost:8080".into())).as_deref(),
            Some("http://localhost:8080")
        );
    }
}
