//! Weighted keyword ranking over a member's recent content.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::seed::{load_stopwords, SeedDataError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    CommonNoun,
    ProperNoun,
    Other,
}

impl PartOfSpeech {
    pub fn is_noun(&self) -> bool {
        matches!(self, PartOfSpeech::CommonNoun | PartOfSpeech::ProperNoun)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub form: String,
    pub pos: PartOfSpeech,
}

impl Token {
    pub fn new(form: impl Into<String>, pos: PartOfSpeech) -> Self {
        Self {
            form: form.into(),
            pos,
        }
    }
}

/// Morphological analysis capability.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Trailing postpositions stripped from Hangul words, longest first.
const PARTICLES: &[&str] = &[
    "에서는", "으로는", "에게서", "에서", "에게", "으로", "까지", "부터", "께서", "처럼",
    "보다", "이나", "은", "는", "이", "가", "을", "를", "의", "에", "와", "과", "도", "만", "로",
];

/// Deterministic Unicode word splitter used when no morphological analyser
/// is available.
///
/// Words are runs of alphanumeric characters. A Hangul word loses one
/// trailing postposition when at least two characters remain. Purely numeric
/// words are tagged [`PartOfSpeech::Other`], words starting with a Latin
/// letter [`PartOfSpeech::ProperNoun`], everything else a common noun.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTokenizer;

impl SimpleTokenizer {
    fn strip_particle(word: &str) -> &str {
        if !word.chars().any(is_hangul) {
            return word;
        }
        for particle in PARTICLES {
            if let Some(stem) = word.strip_suffix(particle) {
                if stem.chars().count() >= 2 {
                    return stem;
                }
            }
        }
        word
    }
}

fn is_hangul(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

impl Tokenizer for SimpleTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|word| {
                if word.chars().all(|c| c.is_ascii_digit()) {
                    return Token::new(word, PartOfSpeech::Other);
                }
                let stem = Self::strip_particle(word);
                let pos = if stem.starts_with(|c: char| c.is_ascii_alphabetic()) {
                    PartOfSpeech::ProperNoun
                } else {
                    PartOfSpeech::CommonNoun
                };
                Token::new(stem, pos)
            })
            .collect()
    }
}

/// One piece of content fed to the extractor.
#[derive(Debug, Clone, Copy)]
pub struct KeywordDocument<'a> {
    pub title: &'a str,
    pub body: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub text: String,
    pub value: usize,
}

pub struct KeywordExtractor<T> {
    tokenizer: T,
    stopwords: HashSet<String>,
    title_weight: usize,
    top_k: usize,
}

impl<T: Tokenizer> KeywordExtractor<T> {
    pub fn new(tokenizer: T, stopwords: HashSet<String>, title_weight: usize, top_k: usize) -> Self {
        Self {
            tokenizer,
            stopwords,
            title_weight: title_weight.max(1),
            top_k,
        }
    }

    /// Extractor with the compiled-in stopword list.
    pub fn with_bundled_stopwords(
        tokenizer: T,
        title_weight: usize,
        top_k: usize,
    ) -> Result<Self, SeedDataError> {
        Ok(Self::new(tokenizer, load_stopwords()?, title_weight, top_k))
    }

    /// Concatenate documents in order, each title repeated `title_weight`
    /// times ahead of its body.
    pub fn corpus(&self, documents: &[KeywordDocument<'_>]) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for doc in documents {
            for _ in 0..self.title_weight {
                parts.push(doc.title);
            }
            parts.push(doc.body);
        }
        parts.retain(|p| !p.trim().is_empty());
        parts.join(" ")
    }

    /// Top keywords by weighted frequency, ties broken by first occurrence.
    pub fn extract(&self, documents: &[KeywordDocument<'_>], member_name: &str) -> Vec<KeywordCount> {
        let corpus = self.corpus(documents);
        if corpus.trim().is_empty() {
            return Vec::new();
        }

        // form -> (count, first position)
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        for (position, token) in self
            .tokenizer
            .tokenize(&corpus)
            .into_iter()
            .filter(|t| self.qualifies(t, member_name))
            .enumerate()
        {
            counts.entry(token.form).or_insert((0, position)).0 += 1;
        }

        let mut ranked: Vec<(String, usize, usize)> = counts
            .into_iter()
            .map(|(form, (count, first))| (form, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked.truncate(self.top_k);

        ranked
            .into_iter()
            .map(|(text, value, _)| KeywordCount { text, value })
            .collect()
    }

    fn qualifies(&self, token: &Token, member_name: &str) -> bool {
        token.pos.is_noun()
            && token.form.chars().count() >= 2
            && !self.stopwords.contains(&token.form)
            && token.form != member_name
    }
}
