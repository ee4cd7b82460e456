pub mod leaderboard;
pub mod medals;
pub mod results;
