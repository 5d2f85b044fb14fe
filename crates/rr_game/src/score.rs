/// Session score. Lives only as long as the process; nothing is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scoreboard {
    pub score: u32,
    pub high_score: u32,
}

impl Scoreboard {
    /// Count one collected bonus and return the new score.
    pub fn add_bonus(&mut self) -> u32 {
        self.score += 1;
        self.score
    }

    /// Fold the current score into the high score. Returns `(score, high_score)`.
    pub fn record_game_over(&mut self) -> (u32, u32) {
        self.high_score = self.high_score.max(self.score);
        (self.score, self.high_score)
    }

    pub fn reset_score(&mut self) {
        self.score = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_over_takes_max() {
        let mut board = Scoreboard::default();
        board.add_bonus();
        board.add_bonus();
        assert_eq!(board.record_game_over(), (2, 2));

        board.reset_score();
        board.add_bonus();
        assert_eq!(board.record_game_over(), (1, 2));
        assert_eq!(board.high_score, 2);
    }
}
