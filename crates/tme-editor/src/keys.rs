//! Key and id issuing for new entities

use crate::entity::EntityKind;
use crate::error::EditError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tme_document::{Document, Node};

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random `prefix + [0-9a-z]*` tokens padded to a fixed total length
#[derive(Debug)]
pub struct KeyIssuer {
    rng: StdRng,
    max_attempts: usize,
}

impl KeyIssuer {
    /// Create issuer seeded from the thread rng
    #[must_use]
    pub fn new(max_attempts: usize) -> Self {
        Self {
            rng: StdRng::from_rng(&mut rand::rng()),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Create issuer with a fixed seed
    #[must_use]
    pub fn with_seed(seed: u64, max_attempts: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Random token; the prefix alone when it already fills the length
    pub fn token(&mut self, prefix: &str, total_len: usize) -> String {
        let mut out = String::with_capacity(total_len.max(prefix.len()));
        out.push_str(prefix);
        while out.len() < total_len {
            let index = self.rng.random_range(0..ALPHABET.len());
            out.push(char::from(ALPHABET[index]));
        }
        out
    }

    /// Issue a key not yet present in the collection of `kind`
    ///
    /// # Errors
    /// Returns [`EditError::IssueExhausted`] when every attempt collides.
    pub fn issue_key(&mut self, doc: &Document, kind: &EntityKind) -> Result<String, EditError> {
        let (prefix, len) = kind.key_format();
        let taken: HashSet<String> = doc
            .get(&kind.collection_path())
            .and_then(Node::as_map)
            .map(|map| map.keys().into_iter().collect())
            .unwrap_or_default();
        self.issue("key", prefix, len, |candidate| taken.contains(candidate))
    }

    /// Issue an id that occurs nowhere in the document
    ///
    /// Returns `Ok(None)` for kinds that carry no id.
    ///
    /// # Errors
    /// Returns [`EditError::IssueExhausted`] when every attempt collides.
    pub fn issue_id(&mut self, doc: &Document, kind: &EntityKind) -> Result<Option<String>, EditError> {
        let Some((prefix, len)) = kind.id_format() else {
            return Ok(None);
        };
        let taken = strings_in(doc);
        self.issue("id", prefix, len, |candidate| taken.contains(candidate))
            .map(Some)
    }

    fn issue<F>(&mut self, what: &'static str, prefix: &str, len: usize, taken: F) -> Result<String, EditError>
    where
        F: Fn(&str) -> bool,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = self.token(prefix, len);
            if !taken(&candidate) {
                tracing::debug!(what, attempt, "issued {}", candidate);
                return Ok(candidate);
            }
        }
        tracing::warn!(what, attempts = self.max_attempts, "key space exhausted");
        Err(EditError::IssueExhausted {
            what,
            attempts: self.max_attempts,
        })
    }
}

/// Every string scalar in the document, keys included
pub(crate) fn strings_in(doc: &Document) -> HashSet<String> {
    let mut found = HashSet::new();
    doc.walk(&mut |_, _, node| {
        if let Some(text) = node.as_str() {
            found.insert(text.to_string());
        }
    });
    found
}
