use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::profile::Difficulty;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;
const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// The three kinds of hint a player can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum HintKind {
    Definition,
    Letter,
    Context,
}

impl HintKind {
    /// Maps the 1/2/3 menu keys onto hint kinds
    pub fn from_key(c: char) -> Option<Self> {
        match c {
            '1' => Some(HintKind::Definition),
            '2' => Some(HintKind::Letter),
            '3' => Some(HintKind::Context),
            _ => None,
        }
    }
}

/// Moments that get a line of flavor text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlavorKind {
    Opening,
    Resignation,
}

/// Source of hint and flavor text.
///
/// Implementations never fail: any backend trouble degrades to local text, and
/// the returned text never contains the secret verbatim.
pub trait HintProvider {
    fn get_hint(&self, secret: &str, kind: HintKind, taunt: bool) -> String;

    fn get_flavor(&self, secret: &str, kind: FlavorKind, difficulty: Difficulty) -> String {
        OfflineHints.get_flavor(secret, kind, difficulty)
    }
}

/// Deterministic hints built from the secret alone
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineHints;

impl HintProvider for OfflineHints {
    fn get_hint(&self, secret: &str, kind: HintKind, taunt: bool) -> String {
        let words: Vec<&str> = secret.split_whitespace().collect();
        let lengths = words
            .iter()
            .map(|w| w.chars().count().to_string())
            .collect::<Vec<_>>()
            .join("-");

        let text = match kind {
            HintKind::Definition => format!(
                "No dictionary is on hand, but the answer is {} word(s) long ({} letters).",
                words.len(),
                lengths
            ),
            HintKind::Letter => match middle_letter(secret) {
                Some(c) => format!("Try the letter '{c}'."),
                None => "There are no letters left to offer.".to_string(),
            },
            HintKind::Context => {
                let blanks = words
                    .iter()
                    .map(|w| "_".repeat(w.chars().count()))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("Picture it in a sentence: \"Everyone was talking about the {blanks}.\"")
            }
        };

        let text = if taunt {
            format!("{text} Needed help already?")
        } else {
            text
        };
        redact(&text, secret)
    }

    fn get_flavor(&self, secret: &str, kind: FlavorKind, difficulty: Difficulty) -> String {
        let text = match (kind, difficulty.is_taunting()) {
            (FlavorKind::Opening, false) => {
                format!("Good luck on {difficulty}! Take it one letter at a time.")
            }
            (FlavorKind::Opening, true) => {
                "Ready or not, the clock is already running.".to_string()
            }
            (FlavorKind::Resignation, false) => {
                "So close! Give it another go, you would have found it.".to_string()
            }
            (FlavorKind::Resignation, true) => {
                format!("Giving up on {difficulty}? You could have had it.")
            }
        };
        redact(&text, secret)
    }
}

#[derive(Debug, Error)]
pub enum HintError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("service returned no text")]
    Empty,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Hints from a generative text service, falling back to [`OfflineHints`].
#[derive(Debug, Clone)]
pub struct GenerativeHints {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GenerativeHints {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, HintError> {
        Self::with_endpoint(GEMINI_ENDPOINT.to_string(), api_key, model, timeout)
    }

    pub fn with_endpoint(
        endpoint: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, HintError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
        })
    }

    fn generate(&self, prompt: &str) -> Result<String, HintError> {
        let url = format!("{}/{}:generateContent", self.endpoint, self.model);
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        debug!(model = %self.model, "requesting generated text");
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(HintError::Status {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let parsed: GenerateResponse = response.json()?;
        parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .map(|t| t.trim().to_string())
            .find(|t| !t.is_empty())
            .ok_or(HintError::Empty)
    }
}

impl HintProvider for GenerativeHints {
    fn get_hint(&self, secret: &str, kind: HintKind, taunt: bool) -> String {
        let mut prompt = match kind {
            HintKind::Definition => format!(
                "Give a short, simple definition of '{secret}' for a hangman player. Never write the word itself."
            ),
            HintKind::Letter => format!(
                "Name one letter that appears in '{secret}'. Reply with the letter only, never the word."
            ),
            HintKind::Context => format!(
                "Write one everyday sentence that uses '{secret}', replacing it with blanks. Never write the word itself."
            ),
        };
        if taunt {
            prompt.push_str(" Also tease the player for needing a hint.");
        }

        match self.generate(&prompt) {
            Ok(text) => redact(&text, secret),
            Err(e) => {
                warn!(error = %e, %kind, "hint service failed, using offline hint");
                OfflineHints.get_hint(secret, kind, taunt)
            }
        }
    }

    fn get_flavor(&self, secret: &str, kind: FlavorKind, difficulty: Difficulty) -> String {
        let prompt = match (kind, difficulty.is_taunting()) {
            (FlavorKind::Opening, false) => format!(
                "In one sentence, encourage a player starting hangman on {difficulty} difficulty."
            ),
            (FlavorKind::Opening, true) => format!(
                "In one sentence, taunt a player that the {difficulty} hangman game starts whether they are ready or not."
            ),
            (FlavorKind::Resignation, false) => format!(
                "In one sentence, encourage a player who resigned hangman on {difficulty} to try again. Do not reveal the answer."
            ),
            (FlavorKind::Resignation, true) => format!(
                "In one sentence, taunt a player for giving up on {difficulty} hangman while admitting they could have won. Do not reveal the answer."
            ),
        };

        match self.generate(&prompt) {
            Ok(text) => redact(&text, secret),
            Err(e) => {
                warn!(error = %e, "flavor text service failed, using offline text");
                OfflineHints.get_flavor(secret, kind, difficulty)
            }
        }
    }
}

/// Masks the secret, and each of its longer words, wherever it appears in `text`.
pub fn redact(text: &str, secret: &str) -> String {
    let secret = secret.trim();
    std::iter::once(secret)
        .chain(
            secret
                .split_whitespace()
                .filter(|w| w.chars().count() >= 3),
        )
        .fold(text.to_string(), |acc, needle| mask_ignore_case(&acc, needle))
}

fn mask_ignore_case(text: &str, needle: &str) -> String {
    let hay: Vec<char> = text.chars().collect();
    let pat: Vec<char> = needle.chars().collect();
    if pat.is_empty() || pat.len() > hay.len() {
        return text.to_string();
    }

    let matches_at = |i: usize| {
        hay[i..i + pat.len()]
            .iter()
            .zip(&pat)
            .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
    };

    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < hay.len() {
        if i + pat.len() <= hay.len() && matches_at(i) {
            out.extend(pat.iter().map(|c| if c.is_whitespace() { ' ' } else { '_' }));
            i += pat.len();
        } else {
            out.push(hay[i]);
            i += 1;
        }
    }
    out
}

fn middle_letter(secret: &str) -> Option<char> {
    let letters: Vec<char> = secret.chars().filter(|c| c.is_alphabetic()).collect();
    letters.get(letters.len() / 2).map(|c| c.to_ascii_lowercase())
}
