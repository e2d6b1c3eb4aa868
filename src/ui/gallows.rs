use hangtime::profile::Difficulty;

/// Gallows drawings from the bare base to the full figure
const STAGES: [&[&str]; 10] = [
    &["", "", "", "", "", "______"],
    &["", "", "", "", "|", "______"],
    &["", "", "", "|", "|", "______"],
    &["", "|", "|", "|", "|", "|______"],
    &["", "|", "|", "|", "|", "|_____"],
    &["______", "|", "|", "|", "|", "|_____"],
    &["______", "|    0", "|", "|", "|", "|_____"],
    &["______", "|    0", "| ---|---", "|", "|", "|_____"],
    &["______", "|    0", "| ---|---", "|   /", "|  /", "|_____"],
    &["______", "|    0", "| ---|---", "|   / \\", "|  /   \\", "|_____"],
];

/// Stage a fresh game opens on; harder tiers start closer to the end.
fn start_stage(difficulty: Difficulty) -> usize {
    match difficulty {
        Difficulty::Easy | Difficulty::Creator => 0,
        Difficulty::Medium => 1,
        Difficulty::Hard => 2,
        Difficulty::Challenger => 3,
        Difficulty::Master => 4,
    }
}

/// Which drawing to show after `max_attempts - remaining` misses.
pub fn stage(difficulty: Difficulty, max_attempts: u32, remaining: u32) -> usize {
    let start = start_stage(difficulty);
    let last = STAGES.len() - 1;
    let wrong = max_attempts.saturating_sub(remaining) as usize;
    if wrong == 0 || max_attempts == 0 {
        return start;
    }
    let span = last - start;
    (start + wrong * span / max_attempts as usize).min(last)
}

pub fn figure(difficulty: Difficulty, max_attempts: u32, remaining: u32) -> &'static [&'static str] {
    STAGES[stage(difficulty, max_attempts, remaining)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_game_uses_tier_start() {
        assert_eq!(stage(Difficulty::Easy, 9, 9), 0);
        assert_eq!(stage(Difficulty::Master, 5, 5), 4);
    }

    #[test]
    fn last_attempt_lost_shows_full_figure() {
        for (d, max) in [(Difficulty::Easy, 9), (Difficulty::Hard, 7), (Difficulty::Master, 5)] {
            assert_eq!(stage(d, max, 0), STAGES.len() - 1);
        }
    }

    #[test]
    fn stages_only_move_forward() {
        let mut prev = 0;
        for remaining in (0..=9).rev() {
            let s = stage(Difficulty::Easy, 9, remaining);
            assert!(s >= prev);
            prev = s;
        }
    }

    #[test]
    fn figure_has_fixed_height() {
        for remaining in 0..=6 {
            assert_eq!(figure(Difficulty::Challenger, 6, remaining).len(), 6);
        }
    }
}
