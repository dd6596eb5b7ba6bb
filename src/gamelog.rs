//! Team schedule rows mapped onto winner/loser game records.

use crate::parser::ColumnMap;
use crate::schema::{count, date, int, text, week, ColumnDef, ColumnKind, TableSchema};
use crate::types::ExtractedRow;
use serde_json::Value;

/// Schedule table on a team season page.
pub const GAMELOG_TABLE_ID: &str = "games";

pub const GAMELOG_COLUMNS: ColumnMap = ColumnMap {
    entries: &[
        ("week_num", "week"),
        ("game_day_of_week", "day"),
        ("game_date", "date"),
        ("gametime", "time"),
        ("game_outcome", "result"),
        ("game_location", "location"),
        ("opp", "opponent"),
        ("pts_off", "team_score"),
        ("pts_def", "opp_score"),
        ("yards_off", "yards_for"),
        ("yards_def", "yards_against"),
        ("to_off", "turnovers"),
        ("to_def", "opp_turnovers"),
    ],
    identity_stat: "week_num",
    identity_numeric: true,
    strip_markers: &[],
};

pub static TEAM_GAME_SCHEMA: TableSchema = TableSchema {
    table: "team_games",
    columns: &[
        ColumnDef::new("team_abbr", ColumnKind::Text(8)).required(),
        crate::schema::season(),
        week().required(),
        text("day", 3),
        date("game_date"),
        text("game_time", 16),
        text("winner", 64),
        text("loser", 64),
        count("pts_w"),
        count("pts_l"),
        int("yds_w"),
        count("to_w"),
        int("yds_l"),
        count("to_l"),
    ],
    unique: &["team_abbr", "season", "week"],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Won,
    Lost,
    NoResult,
}

fn outcome(row: &ExtractedRow) -> Outcome {
    match row.get_str("result").map(str::trim) {
        Some("W") => Outcome::Won,
        Some("L") => Outcome::Lost,
        _ => Outcome::NoResult,
    }
}

fn field(row: &ExtractedRow, key: &str) -> Value {
    row.get(key).cloned().unwrap_or(Value::Null)
}

/// Map one extracted schedule row to a `team_games` row.
///
/// A win makes the team the winner and a loss makes the opponent the winner;
/// ties, byes and unplayed weeks keep only the schedule columns.
pub fn to_game_record(row: &ExtractedRow, team: &str, season: i32) -> ExtractedRow {
    let team_abbr = team.trim().to_uppercase();
    let opponent = field(row, "opponent");

    let mut game = ExtractedRow::new();
    game.set("team_abbr", team_abbr.as_str());
    game.set("season", season);
    game.set("week", field(row, "week"));
    game.set("day", field(row, "day"));
    game.set("game_date", field(row, "date"));
    game.set("game_time", field(row, "time"));

    let (winner, loser, pts_w, pts_l, yds_w, yds_l, to_w, to_l) = match outcome(row) {
        Outcome::Won => (
            Value::from(team_abbr.as_str()),
            opponent,
            field(row, "team_score"),
            field(row, "opp_score"),
            field(row, "yards_for"),
            field(row, "yards_against"),
            field(row, "turnovers"),
            field(row, "opp_turnovers"),
        ),
        Outcome::Lost => (
            opponent,
            Value::from(team_abbr.as_str()),
            field(row, "opp_score"),
            field(row, "team_score"),
            field(row, "yards_against"),
            field(row, "yards_for"),
            field(row, "opp_turnovers"),
            field(row, "turnovers"),
        ),
        Outcome::NoResult => Default::default(),
    };

    game.set("winner", winner);
    game.set("loser", loser);
    game.set("pts_w", pts_w);
    game.set("pts_l", pts_l);
    game.set("yds_w", yds_w);
    game.set("yds_l", yds_l);
    game.set("to_w", to_w);
    game.set("to_l", to_l);
    game
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_row;
    use crate::types::TypedValue;

    fn schedule_row(result: &str) -> ExtractedRow {
        let mut row = ExtractedRow::new();
        row.set("week", "3");
        row.set("day", "Sun");
        row.set("date", "September 24");
        row.set("time", "4:25PM ET");
        row.set("result", result);
        row.set("opponent", "Chicago Bears");
        row.set("team_score", "41");
        row.set("opp_score", "10");
        row.set("yards_for", "456");
        row.set("yards_against", "203");
        row.set("turnovers", Value::Null);
        row.set("opp_turnovers", "3");
        row
    }

    #[test]
    fn test_win_makes_team_the_winner() {
        let game = to_game_record(&schedule_row("W"), "kan", 2023);
        assert_eq!(game.get_str("team_abbr"), Some("KAN"));
        assert_eq!(game.get_str("winner"), Some("KAN"));
        assert_eq!(game.get_str("loser"), Some("Chicago Bears"));
        assert_eq!(game.get_str("pts_w"), Some("41"));
        assert_eq!(game.get_str("to_l"), Some("3"));
    }

    #[test]
    fn test_loss_makes_opponent_the_winner() {
        let game = to_game_record(&schedule_row("L"), "KAN", 2023);
        assert_eq!(game.get_str("winner"), Some("Chicago Bears"));
        assert_eq!(game.get_str("loser"), Some("KAN"));
        assert_eq!(game.get_str("pts_w"), Some("10"));
        assert_eq!(game.get_str("pts_l"), Some("41"));
        assert_eq!(game.get_str("yds_w"), Some("203"));
    }

    #[test]
    fn test_unplayed_week_has_null_result_fields() {
        let mut row = schedule_row("");
        row.set("opponent", "Bye Week");
        let game = to_game_record(&row, "KAN", 2023);
        for key in ["winner", "loser", "pts_w", "pts_l", "yds_w", "yds_l", "to_w", "to_l"] {
            assert_eq!(game.get(key), Some(&Value::Null), "{key}");
        }
        assert_eq!(game.get_str("week"), Some("3"));
    }

    #[test]
    fn test_game_record_validates() {
        let game = to_game_record(&schedule_row("W"), "KAN", 2023);
        let typed = validate_row(&TEAM_GAME_SCHEMA, &game).unwrap();
        assert_eq!(typed.get("game_date"), Some(&TypedValue::Text("2023-09-24".into())));
        assert_eq!(typed.get("week"), Some(&TypedValue::Int(3)));
    }
}
