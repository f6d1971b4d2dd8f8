//! Built-in data used when no input is supplied.

use crate::domain::columns::TEAM;
use crate::domain::model::{Record, Table};
use serde_json::Value;

const TEAMS: [&str; 8] = [
    "Manchester City",
    "Arsenal",
    "Liverpool",
    "Tottenham",
    "Manchester United",
    "Newcastle",
    "Chelsea",
    "Aston Villa",
];

const STATS: [(&str, [f64; 8]); 11] = [
    ("members", [50.0, 47.0, 48.0, 45.0, 49.0, 46.0, 52.0, 44.0]),
    ("foreign_players", [35.0, 29.0, 32.0, 28.0, 30.0, 27.0, 33.0, 25.0]),
    ("mean_age", [26.5, 25.8, 26.9, 26.2, 27.0, 25.7, 26.4, 26.0]),
    ("MOY", [0.7, 0.5, 0.6, 0.5, 0.4, 0.5, 0.5, 0.4]),
    ("points", [89.0, 85.0, 83.0, 75.0, 72.0, 68.0, 64.0, 62.0]),
    ("Goal_Diff", [55.0, 48.0, 46.0, 35.0, 28.0, 24.0, 20.0, 18.0]),
    ("Wins", [28.0, 26.0, 25.0, 22.0, 20.0, 19.0, 17.0, 16.0]),
    ("Draws", [5.0, 7.0, 8.0, 9.0, 12.0, 11.0, 13.0, 14.0]),
    ("Losses", [5.0, 5.0, 5.0, 7.0, 6.0, 8.0, 8.0, 8.0]),
    ("Goals_For", [92.0, 88.0, 85.0, 78.0, 70.0, 66.0, 64.0, 61.0]),
    ("Goals_Against", [37.0, 40.0, 39.0, 43.0, 42.0, 46.0, 44.0, 43.0]),
];

/// Title odds shown when no prediction file exists yet.
const PROBABILITIES: [(&str, f64); 8] = [
    ("Manchester City", 0.59),
    ("Liverpool", 0.335),
    ("Arsenal", 0.235),
    ("Tottenham", 0.010),
    ("Manchester United", 0.010),
    ("Newcastle", 0.0),
    ("Chelsea", 0.0),
    ("Aston Villa", 0.0),
];

/// A hypothetical upcoming season for eight clubs.
pub fn sample_season() -> Table {
    let mut columns = vec![TEAM.to_string()];
    columns.extend(STATS.iter().map(|(name, _)| name.to_string()));

    let mut table = Table::new(columns);
    for (i, team) in TEAMS.iter().enumerate() {
        let mut record = Record::new();
        record.set(TEAM, Value::String(team.to_string()));
        for (name, values) in &STATS {
            record.set_number(*name, values[i]);
        }
        table.push(record);
    }
    table
}

pub fn sample_probabilities() -> Vec<(String, f64)> {
    PROBABILITIES
        .iter()
        .map(|(team, p)| (team.to_string(), *p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::default_features;

    #[test]
    fn test_sample_season_has_every_feature() {
        let table = sample_season();

        assert_eq!(table.len(), 8);
        table.require_columns(&default_features()).unwrap();
        assert_eq!(table.records[0].text(TEAM), Some("Manchester City"));
        assert_eq!(table.records[7].number("Goals_Against"), Some(43.0));
    }

    #[test]
    fn test_sample_probabilities_cover_sample_teams() {
        let probabilities = sample_probabilities();
        assert_eq!(probabilities.len(), TEAMS.len());
        assert!(probabilities.iter().all(|(team, _)| TEAMS.contains(&team.as_str())));
        assert_eq!(probabilities[0], ("Manchester City".to_string(), 0.59));
    }
}
