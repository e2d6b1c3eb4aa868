use std::thread;
use std::time::Duration;

use assert_matches::assert_matches;
use rand::{rngs::StdRng, Rng, SeedableRng};

use hangtime::clock::ManualTime;
use hangtime::hint::{HintKind, OfflineHints};
use hangtime::ledger::PhraseMatch;
use hangtime::profile::{Difficulty, DifficultyProfile, ProfileTable};
use hangtime::score::ScoreDelta;
use hangtime::session::TurnOutcome;
use hangtime::{GameError, Session, Status};

fn start(
    secret: &str,
    profile: DifficultyProfile,
    high_score: u32,
) -> (Session<ManualTime>, ManualTime) {
    let time = ManualTime::new();
    let mut session = Session::with_time_source(secret, profile, high_score, time.clone())
        .unwrap()
        .with_poll_interval(Duration::from_millis(2));
    session.begin().unwrap();
    (session, time)
}

fn tier(difficulty: Difficulty) -> DifficultyProfile {
    ProfileTable::standard().get(difficulty).clone()
}

fn letter_delta(session: &mut Session<ManualTime>, letter: &str) -> ScoreDelta {
    match session.submit_letter(letter).unwrap().outcome {
        TurnOutcome::Letter { delta, .. } => delta,
        other => panic!("expected a letter outcome, got {other:?}"),
    }
}

#[test]
fn cat_on_easy_is_won_letter_by_letter() {
    let (mut session, _time) = start("cat", tier(Difficulty::Easy), 0);

    assert_eq!(letter_delta(&mut session, "c"), ScoreDelta { old: 0, new: 10 });
    assert_eq!(letter_delta(&mut session, "a"), ScoreDelta { old: 10, new: 20 });
    assert_eq!(letter_delta(&mut session, "z"), ScoreDelta { old: 20, new: 10 });
    assert_eq!(session.remaining_attempts(), 8);

    let report = session.submit_letter("t").unwrap();
    assert_matches!(
        report.outcome,
        TurnOutcome::Letter { delta: ScoreDelta { old: 10, new: 20 }, .. }
    );
    assert!(session.ledger().is_fully_revealed());
    assert_eq!(report.status, Status::Won);
    assert_eq!(session.status(), Status::Won);
}

#[test]
fn misses_never_push_the_score_below_zero() {
    let (mut session, _time) = start("cat", tier(Difficulty::Easy), 0);
    assert_eq!(letter_delta(&mut session, "q"), ScoreDelta { old: 0, new: 0 });
    assert_eq!(session.current_score(), 0);
}

#[test]
fn last_attempt_miss_loses_with_time_left() {
    let profile = DifficultyProfile::new(Difficulty::Easy, 1, 600, 60, 10, 10).unwrap();
    let (mut session, _time) = start("dog", profile, 0);

    let report = session.submit_letter("x").unwrap();
    assert_eq!(session.remaining_attempts(), 0);
    assert_eq!(report.status, Status::LostAttempts);
    assert!(!session.remaining_game_time().is_zero());
}

#[test]
fn out_of_attempts_beats_out_of_time() {
    let profile = DifficultyProfile::new(Difficulty::Easy, 1, 600, 60, 10, 10).unwrap();
    let (mut session, time) = start("dog", profile, 0);

    time.advance(Duration::from_secs(601));
    assert!(session.remaining_game_time().is_zero());

    // whether the turn countdown has fired yet or not, the last attempt is gone
    let report = session.submit_letter("x").unwrap();
    assert_eq!(session.remaining_attempts(), 0);
    assert_eq!(report.status, Status::LostAttempts);
    assert_eq!(session.status(), Status::LostAttempts);
}

#[test]
fn resign_moves_the_score_into_the_high_score() {
    let (mut session, _time) = start("banana", tier(Difficulty::Easy), 30);
    session.submit_letter("a").unwrap();
    session.submit_letter("n").unwrap();
    assert_eq!(session.current_score(), 50);

    let report = session.resign().unwrap();
    assert_eq!(report.status, Status::Resigned);
    assert_eq!(session.high_score(), 50);
    assert_eq!(session.current_score(), 0);

    assert_matches!(session.submit_letter("b"), Err(GameError::InvalidState(_)));
    assert_matches!(session.submit_phrase("banana"), Err(GameError::InvalidState(_)));
    assert_matches!(
        session.request_hint(HintKind::Letter, &OfflineHints),
        Err(GameError::InvalidState(_))
    );
}

#[test]
fn challenger_hints_unlock_at_two_attempts() {
    let (mut session, _time) = start("banana", tier(Difficulty::Challenger), 0);
    session.submit_letter("x").unwrap();
    session.submit_letter("y").unwrap();
    assert_eq!(session.remaining_attempts(), 4);

    assert_matches!(
        session.request_hint(HintKind::Definition, &OfflineHints),
        Err(GameError::HintNotYetAvailable { threshold: 2, remaining: 4 })
    );
    assert_eq!(session.hints_used(), 0);

    session.submit_letter("w").unwrap();
    session.submit_letter("v").unwrap();
    session.submit_letter("a").unwrap();
    assert_eq!(session.remaining_attempts(), 2);
    assert_eq!(session.current_score(), 75);

    let report = session.request_hint(HintKind::Definition, &OfflineHints).unwrap();
    assert_matches!(
        report.outcome,
        TurnOutcome::Hint { delta: ScoreDelta { old: 75, new: 50 }, .. }
    );
    assert_eq!(session.hints_used(), 1);
    assert_eq!(session.remaining_attempts(), 2);
}

#[test]
fn partial_phrase_pays_half_word_score_per_character() {
    let (mut session, _time) = start("molecular biology", tier(Difficulty::Hard), 0);

    let report = session.submit_phrase("biology").unwrap();
    assert_eq!(
        report.outcome,
        TurnOutcome::Phrase {
            phrase: "biology".to_string(),
            verdict: PhraseMatch::Partial,
            delta: ScoreDelta { old: 0, new: 7 * (30 / 2) },
        }
    );
    assert_eq!(session.display_mask(), "_ _ _ _ _ _ _ _ _   b i o l o g y");
    assert_eq!(report.status, Status::InProgress);
}

#[test]
fn repeated_letter_is_rejected_without_penalty() {
    let (mut session, _time) = start("cat", tier(Difficulty::Medium), 0);
    session.submit_letter("c").unwrap();
    let score = session.current_score();
    let attempts = session.remaining_attempts();

    assert_matches!(session.submit_letter("C"), Err(GameError::DuplicateGuess(_)));
    assert_eq!(session.current_score(), score);
    assert_eq!(session.remaining_attempts(), attempts);
    assert_eq!(session.ledger().guessed_letters().len(), 1);
}

#[test]
fn expired_turn_replaces_the_action() {
    let (mut session, time) = start("cat", tier(Difficulty::Master), 0);
    session.submit_letter("c").unwrap();

    time.advance(Duration::from_secs(16));
    for _ in 0..200 {
        if session.is_turn_timed_out() {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert!(session.is_turn_timed_out());

    let report = session.submit_phrase("cat").unwrap();
    assert_eq!(
        report.outcome,
        TurnOutcome::TimedOut {
            penalty: ScoreDelta { old: 30, new: 25 }
        }
    );
    assert_eq!(session.remaining_attempts(), 4);
    assert!(session.ledger().guessed_phrases().is_empty());
    assert!(session.high_score() >= session.current_score());
}

#[test]
fn random_play_keeps_score_invariants() {
    const SECRETS: [&str; 3] = ["cat", "molecular biology", "the quick brown fox"];

    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let secret = SECRETS[rng.gen_range(0..SECRETS.len())];
        let (mut session, _time) = start(secret, tier(Difficulty::Hard), 40);
        let mut outstanding = session.outstanding_score();

        for _ in 0..40 {
            if session.status().is_terminal() {
                break;
            }
            let result = match rng.gen_range(0..10) {
                0..=6 => {
                    let letter = rng.gen_range(b'a'..=b'z') as char;
                    session.submit_letter(&letter.to_string())
                }
                7 => {
                    let words: Vec<&str> = secret.split(' ').collect();
                    session.submit_phrase(words[rng.gen_range(0..words.len())])
                }
                8 => session.submit_phrase("nope"),
                _ => session.request_hint(HintKind::Context, &OfflineHints),
            };
            // rejected guesses are fine here; the invariants must hold either way
            let _ = result;

            assert!(session.high_score() >= session.current_score());
            assert!(session.outstanding_score() >= outstanding);
            outstanding = session.outstanding_score();
        }
    }
}
