//! Trust filtering and cross-reference resolution for inbound content.

use std::collections::BTreeSet;

use regex::Regex;

use crate::seed::{load_trusted_press, SeedDataError, TrustedPress};

/// Closed allow-list of publisher domains.
#[derive(Debug, Clone)]
pub struct TrustedSources {
    press: Vec<TrustedPress>,
}

impl TrustedSources {
    pub fn new(press: Vec<TrustedPress>) -> Self {
        Self { press }
    }

    /// The compiled-in list from `seed_data/trusted_press.yml`.
    pub fn bundled() -> Result<Self, SeedDataError> {
        Ok(Self::new(load_trusted_press()?))
    }

    /// Canonical press name for a link, or `None` to reject the item.
    pub fn classify(&self, origin_link: &str) -> Option<&str> {
        if origin_link.is_empty() {
            return None;
        }
        let link = origin_link.to_lowercase();
        self.press
            .iter()
            .find(|p| link.contains(&p.domain))
            .map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.press.len()
    }

    pub fn is_empty(&self) -> bool {
        self.press.is_empty()
    }
}

/// Strips markup and decodes the entities the search API emits.
#[derive(Debug, Clone)]
pub struct MarkupCleaner {
    tag: Regex,
}

impl MarkupCleaner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            tag: Regex::new(r"<[^>]*>")?,
        })
    }

    pub fn clean(&self, text: &str) -> String {
        let stripped = self.tag.replace_all(text, "");
        stripped
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&#39;", "'")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&nbsp;", " ")
            .replace("&amp;", "&")
            .trim()
            .to_string()
    }
}

/// Display names of every known member, used to find mentions in text.
#[derive(Debug, Clone, Default)]
pub struct MemberDirectory {
    members: Vec<(String, String)>,
}

impl MemberDirectory {
    /// Build from `(code, name)` pairs. Blank names are ignored.
    pub fn new(members: impl IntoIterator<Item = (String, String)>) -> Self {
        let members = members
            .into_iter()
            .filter(|(_, name)| !name.trim().is_empty())
            .collect();
        Self { members }
    }

    /// Codes of every member whose name occurs anywhere in `title` or
    /// `body`. Substring matching only; names are not disambiguated.
    pub fn mentions(&self, title: &str, body: &str) -> BTreeSet<String> {
        self.members
            .iter()
            .filter(|(_, name)| title.contains(name.as_str()) || body.contains(name.as_str()))
            .map(|(code, _)| code.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Canonical watch URL for a video id.
pub fn video_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

/// Extract the id from a watch URL, accepting the short-link form too.
pub fn video_id_from_url(url: &str) -> Option<&str> {
    let id = if let Some((_, rest)) = url.split_once("v=") {
        rest
    } else if let Some((_, rest)) = url.split_once("youtu.be/") {
        rest
    } else {
        return None;
    };
    let id = id.split(['&', '?', '#']).next().unwrap_or_default();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// A video belongs to a member only when the member's name is in its title.
pub fn video_mentions_member(title: &str, member_name: &str) -> bool {
    !member_name.is_empty() && title.contains(member_name)
}
