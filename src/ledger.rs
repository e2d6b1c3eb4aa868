use crate::error::{GameError, Result};
use itertools::Itertools;
use std::collections::BTreeSet;
use std::ops::Range;

/// Marker shown for a position the player has not uncovered yet
pub const HIDDEN_MARKER: char = '_';

/// How a phrase guess relates to the secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseMatch {
    /// The whole secret; carries the positions still undisclosed before the guess
    Exact { undisclosed: usize },
    /// A substring of the secret
    Partial,
    Miss,
}

/// Disclosure state of a single position of the secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealCell {
    Space,
    Revealed(char),
    Hidden,
}

impl RevealCell {
    pub fn is_hidden(&self) -> bool {
        matches!(self, RevealCell::Hidden)
    }

    pub fn symbol(&self) -> char {
        match self {
            RevealCell::Space => ' ',
            RevealCell::Revealed(c) => *c,
            RevealCell::Hidden => HIDDEN_MARKER,
        }
    }
}

/// Record of every guess made against one secret.
#[derive(Debug, Clone)]
pub struct GuessLedger {
    secret: Vec<char>,
    folded: Vec<char>,
    guessed_letters: BTreeSet<char>,
    valid_letters: BTreeSet<char>,
    vetoed_letters: BTreeSet<char>,
    guessed_phrases: Vec<String>,
}

impl GuessLedger {
    pub fn new(secret: &str) -> Self {
        let secret: Vec<char> = secret.chars().collect();
        let folded = secret.iter().map(|c| fold(*c)).collect();
        Self {
            secret,
            folded,
            guessed_letters: BTreeSet::new(),
            valid_letters: BTreeSet::new(),
            vetoed_letters: BTreeSet::new(),
            guessed_phrases: Vec::new(),
        }
    }

    /// Records a letter guess and returns how often it occurs in the secret.
    pub fn guess_letter(&mut self, ch: char) -> Result<usize> {
        let ch = fold(ch);
        if self.guessed_letters.contains(&ch) {
            return Err(GameError::DuplicateGuess(ch.to_string()));
        }

        let occurrences = self.folded.iter().filter(|c| **c == ch).count();
        self.guessed_letters.insert(ch);
        if occurrences > 0 {
            self.valid_letters.insert(ch);
        } else {
            self.vetoed_letters.insert(ch);
        }

        Ok(occurrences)
    }

    /// Records a phrase guess and classifies it against the secret.
    pub fn guess_phrase(&mut self, text: &str) -> Result<PhraseMatch> {
        let text = normalize_phrase(text);
        if self.guessed_phrases.contains(&text) {
            return Err(GameError::DuplicateGuess(text));
        }

        let needle: Vec<char> = text.chars().collect();
        let verdict = if needle == self.folded {
            PhraseMatch::Exact {
                undisclosed: self.hidden_count(),
            }
        } else if find_span(&self.folded, &needle).is_some() {
            PhraseMatch::Partial
        } else {
            PhraseMatch::Miss
        };

        self.guessed_phrases.push(text);
        Ok(verdict)
    }

    /// Adds every letter of the secret to the guessed (and valid) letters.
    pub fn mark_all_guessed(&mut self) {
        for c in self.folded.iter().filter(|c| !c.is_whitespace()) {
            self.guessed_letters.insert(*c);
            self.valid_letters.insert(*c);
        }
    }

    /// Per-position disclosure of the secret, recomputed on every call.
    pub fn reveal_mask(&self) -> impl Iterator<Item = RevealCell> + '_ {
        let spans: Vec<Range<usize>> = self
            .guessed_phrases
            .iter()
            .filter_map(|p| {
                let needle: Vec<char> = p.chars().collect();
                find_span(&self.folded, &needle)
            })
            .collect();

        self.secret.iter().enumerate().map(move |(i, c)| {
            if *c == ' ' {
                RevealCell::Space
            } else if self.guessed_letters.contains(&self.folded[i])
                || spans.iter().any(|span| span.contains(&i))
            {
                RevealCell::Revealed(*c)
            } else {
                RevealCell::Hidden
            }
        })
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.reveal_mask().all(|cell| !cell.is_hidden())
    }

    pub fn hidden_count(&self) -> usize {
        self.reveal_mask().filter(RevealCell::is_hidden).count()
    }

    /// Mask rendered for display, e.g. `c _ t`
    pub fn display_mask(&self) -> String {
        self.reveal_mask().map(|cell| cell.symbol()).join(" ")
    }

    pub fn secret(&self) -> String {
        self.secret.iter().collect()
    }

    pub fn guessed_letters(&self) -> &BTreeSet<char> {
        &self.guessed_letters
    }

    pub fn valid_letters(&self) -> &BTreeSet<char> {
        &self.valid_letters
    }

    pub fn vetoed_letters(&self) -> &BTreeSet<char> {
        &self.vetoed_letters
    }

    pub fn guessed_phrases(&self) -> &[String] {
        &self.guessed_phrases
    }
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

pub(crate) fn normalize_phrase(text: &str) -> String {
    text.trim().chars().map(fold).collect()
}

/// Span of the first occurrence of `needle` in `haystack`
fn find_span(haystack: &[char], needle: &[char]) -> Option<Range<usize>> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|start| start..start + needle.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn letter_guess_counts_occurrences() {
        let mut ledger = GuessLedger::new("banana");
        assert_eq!(ledger.guess_letter('a').unwrap(), 3);
        assert_eq!(ledger.guess_letter('N').unwrap(), 2);
        assert_eq!(ledger.guess_letter('z').unwrap(), 0);

        assert!(ledger.valid_letters().contains(&'a'));
        assert!(ledger.valid_letters().contains(&'n'));
        assert!(ledger.vetoed_letters().contains(&'z'));
        assert_eq!(ledger.guessed_letters().len(), 3);
    }

    #[test]
    fn duplicate_letter_is_rejected_without_change() {
        let mut ledger = GuessLedger::new("cat");
        ledger.guess_letter('c').unwrap();
        let before = ledger.guessed_letters().clone();

        assert_matches!(ledger.guess_letter('C'), Err(GameError::DuplicateGuess(s)) if s == "c");
        assert_eq!(ledger.guessed_letters(), &before);
    }

    #[test]
    fn every_guessed_letter_is_valid_or_vetoed() {
        let mut ledger = GuessLedger::new("molecular biology");
        for c in "mzxoqyb".chars() {
            ledger.guess_letter(c).unwrap();
        }
        for c in ledger.guessed_letters() {
            let valid = ledger.valid_letters().contains(c);
            let vetoed = ledger.vetoed_letters().contains(c);
            assert!(valid ^ vetoed, "{c} must be in exactly one set");
        }
    }

    #[test]
    fn phrase_classification() {
        let mut ledger = GuessLedger::new("Molecular Biology");
        assert_eq!(ledger.guess_phrase("biology").unwrap(), PhraseMatch::Partial);
        assert_eq!(ledger.guess_phrase("chemistry").unwrap(), PhraseMatch::Miss);
        assert_matches!(
            ledger.guess_phrase("  MOLECULAR biology "),
            Ok(PhraseMatch::Exact { .. })
        );
        assert_eq!(ledger.guessed_phrases().len(), 3);
    }

    #[test]
    fn duplicate_phrase_is_rejected() {
        let mut ledger = GuessLedger::new("quantum physics");
        ledger.guess_phrase("physics").unwrap();
        assert_matches!(ledger.guess_phrase("Physics"), Err(GameError::DuplicateGuess(_)));
        assert_eq!(ledger.guessed_phrases().len(), 1);
    }

    #[test]
    fn exact_match_reports_undisclosed_before_recording() {
        let mut ledger = GuessLedger::new("cat");
        ledger.guess_letter('c').unwrap();
        assert_eq!(
            ledger.guess_phrase("cat").unwrap(),
            PhraseMatch::Exact { undisclosed: 2 }
        );
        assert!(ledger.is_fully_revealed());
    }

    #[test]
    fn mask_reveals_spaces_letters_and_phrase_spans() {
        let mut ledger = GuessLedger::new("quantum physics");
        assert_eq!(ledger.display_mask(), "_ _ _ _ _ _ _   _ _ _ _ _ _ _");

        ledger.guess_letter('u').unwrap();
        ledger.guess_phrase("phys").unwrap();
        assert_eq!(ledger.display_mask(), "_ u _ _ _ u _   p h y s _ _ _");
        assert!(!ledger.is_fully_revealed());
    }

    #[test]
    fn mask_is_recomputed_after_new_phrases() {
        let mut ledger = GuessLedger::new("dog");
        let before: Vec<RevealCell> = ledger.reveal_mask().collect();
        assert!(before.iter().all(RevealCell::is_hidden));

        ledger.guess_phrase("og").unwrap();
        let after: Vec<RevealCell> = ledger.reveal_mask().collect();
        assert_eq!(
            after,
            vec![
                RevealCell::Hidden,
                RevealCell::Revealed('o'),
                RevealCell::Revealed('g')
            ]
        );
    }

    #[test]
    fn fully_guessed_letters_reveal_everything() {
        let mut ledger = GuessLedger::new("big cat");
        for c in "bigcat".chars() {
            ledger.guess_letter(c).unwrap();
        }
        assert!(ledger.reveal_mask().all(|c| !c.is_hidden()));
        assert!(ledger.is_fully_revealed());
        assert_eq!(ledger.hidden_count(), 0);
    }

    #[test]
    fn mask_preserves_original_case() {
        let mut ledger = GuessLedger::new("Zebra");
        ledger.guess_letter('z').unwrap();
        assert_eq!(ledger.display_mask(), "Z _ _ _ _");
    }

    #[test]
    fn mark_all_guessed_moves_letters_to_valid() {
        let mut ledger = GuessLedger::new("ox");
        ledger.mark_all_guessed();
        assert!(ledger.is_fully_revealed());
        assert!(ledger.valid_letters().contains(&'o'));
        assert!(ledger.valid_letters().contains(&'x'));
        assert!(ledger.vetoed_letters().is_empty());
    }

    #[test]
    fn find_span_edge_cases() {
        let hay: Vec<char> = "abc".chars().collect();
        assert_eq!(find_span(&hay, &[]), None);
        assert_eq!(find_span(&hay, &['a', 'b', 'c', 'd']), None);
        assert_eq!(find_span(&hay, &['b', 'c']), Some(1..3));
    }
}
