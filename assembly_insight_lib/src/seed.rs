//! Seed data compiled into the binary: the trusted-press allow-list and the
//! keyword stopword list.
//!
//! Both follow the same pattern: YAML embedded with `include_str!`, parsed
//! and validated once at startup.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedDataError {
    #[error("Failed to parse seed YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Duplicate press domain: {0}")]
    DuplicateDomain(String),
    #[error("Empty entry in seed data: {0}")]
    EmptyEntry(String),
}

#[derive(Deserialize, Debug)]
struct TrustedPressFile {
    press: Vec<TrustedPress>,
}

/// A publisher domain and the canonical press name stored with its articles.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TrustedPress {
    pub domain: String,
    pub name: String,
}

#[derive(Deserialize, Debug)]
struct StopwordFile {
    stopwords: Vec<String>,
}

/// Parse and validate the trusted-press list, preserving file order.
pub fn parse_trusted_press(yaml_content: &str) -> Result<Vec<TrustedPress>, SeedDataError> {
    let file: TrustedPressFile = serde_yml::from_str(yaml_content)?;

    let mut seen = HashSet::new();
    let mut validated = Vec::with_capacity(file.press.len());
    for entry in file.press {
        let domain = entry.domain.trim().to_lowercase();
        let name = entry.name.trim().to_string();
        if domain.is_empty() || name.is_empty() {
            return Err(SeedDataError::EmptyEntry(format!("{}={}", domain, name)));
        }
        if !seen.insert(domain.clone()) {
            return Err(SeedDataError::DuplicateDomain(domain));
        }
        validated.push(TrustedPress { domain, name });
    }
    Ok(validated)
}

pub fn load_trusted_press() -> Result<Vec<TrustedPress>, SeedDataError> {
    parse_trusted_press(include_str!("../../seed_data/trusted_press.yml"))
}

pub fn parse_stopwords(yaml_content: &str) -> Result<HashSet<String>, SeedDataError> {
    let file: StopwordFile = serde_yml::from_str(yaml_content)?;
    let mut words = HashSet::with_capacity(file.stopwords.len());
    for word in file.stopwords {
        let word = word.trim();
        if word.is_empty() {
            return Err(SeedDataError::EmptyEntry("stopword".into()));
        }
        words.insert(word.to_string());
    }
    Ok(words)
}

pub fn load_stopwords() -> Result<HashSet<String>, SeedDataError> {
    parse_stopwords(include_str!("../../seed_data/stopwords.yml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_press_normalizes_domain() {
        let yaml = r#"
press:
  - domain: " Example.COM "
    name: Example Daily
"#;
        let press = parse_trusted_press(yaml).unwrap();
        assert_eq!(press[0].domain, "example.com");
        assert_eq!(press[0].name, "Example Daily");
    }

    #[test]
    fn test_parse_press_duplicate_rejected() {
        let yaml = r#"
press:
  - domain: a.com
    name: A
  - domain: a.com
    name: B
"#;
        assert!(matches!(
            parse_trusted_press(yaml),
            Err(SeedDataError::DuplicateDomain(_))
        ));
    }

    #[test]
    fn test_load_trusted_press_succeeds() {
        let press = load_trusted_press().unwrap();
        assert!(press.len() >= 20);
        assert!(press.iter().any(|p| p.domain == "hani.co.kr" && p.name == "한겨레"));
    }

    #[test]
    fn test_load_stopwords_succeeds() {
        let words = load_stopwords().unwrap();
        assert!(words.contains("의원"));
        assert!(words.contains("국회"));
    }

    #[test]
    fn test_empty_stopword_rejected() {
        let yaml = "stopwords:\n  - 의원\n  - \"  \"\n";
        assert!(matches!(parse_stopwords(yaml), Err(SeedDataError::EmptyEntry(_))));
    }
}
