//! Column names shared by every stage.

pub const TEAM: &str = "Team";
pub const SEASON: &str = "Season";
pub const RANK: &str = "rank";
pub const WINNER: &str = "Winner";
pub const POINTS: &str = "points";
pub const GOAL_DIFF: &str = "Goal_Diff";
pub const WINS: &str = "Wins";
pub const LOSSES: &str = "Losses";
pub const GOALS_FOR: &str = "Goals_For";
pub const GOALS_AGAINST: &str = "Goals_Against";
pub const WIN_PROBABILITY: &str = "Win_Probability";
pub const NORMALIZED_PROB: &str = "Normalized_Prob";
