//! SQLite implementation of [`QueryService`].

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, info};

use super::catalog::QueryId;
use super::params::QueryParams;
use super::QueryService;
use crate::error::RinkstatError;
use crate::table::{Row, TabularResult};
use crate::Result;

// Column names and order match the generated INSERT scripts, so their
// `INSERT INTO t (cols) VALUES ...` statements load unchanged.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS teams (
    teamID INTEGER PRIMARY KEY,
    city TEXT NOT NULL,
    teamName TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS venues (
    venueID INTEGER PRIMARY KEY,
    venueName TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS games (
    gameID INTEGER PRIMARY KEY,
    type TEXT NOT NULL,
    dateTime TEXT NOT NULL,
    outcome TEXT NOT NULL,
    season TEXT NOT NULL,
    homeTeamID INTEGER REFERENCES teams (teamID),
    awayTeamID INTEGER REFERENCES teams (teamID),
    venueID INTEGER REFERENCES venues (venueID)
);

CREATE TABLE IF NOT EXISTS players (
    playerID INTEGER PRIMARY KEY,
    firstName TEXT NOT NULL,
    lastName TEXT NOT NULL,
    nationality TEXT NOT NULL,
    birthDate TEXT NOT NULL,
    height TEXT NOT NULL,
    weight INTEGER NOT NULL,
    playerType TEXT
);

CREATE TABLE IF NOT EXISTS playsIn (
    gameID INTEGER REFERENCES games (gameID),
    playerID INTEGER REFERENCES players (playerID),
    plusMinus INTEGER,
    savePercentage REAL,
    PRIMARY KEY (gameID, playerID)
);

CREATE TABLE IF NOT EXISTS playsOn (
    playerID INTEGER REFERENCES players (playerID),
    teamID INTEGER REFERENCES teams (teamID),
    startDate TEXT NOT NULL,
    endDate TEXT,
    PRIMARY KEY (playerID, teamID, startDate)
);

CREATE TABLE IF NOT EXISTS officials (
    officialID INTEGER PRIMARY KEY,
    officialName TEXT
);

CREATE TABLE IF NOT EXISTS officiatedBy (
    gameID INTEGER REFERENCES games (gameID),
    officialID INTEGER REFERENCES officials (officialID),
    officialType TEXT,
    PRIMARY KEY (gameID, officialID)
);

CREATE TABLE IF NOT EXISTS shifts (
    shiftID INTEGER PRIMARY KEY,
    playerID INTEGER REFERENCES players (playerID),
    gameID INTEGER REFERENCES games (gameID),
    periodNumber INTEGER NOT NULL,
    shiftStart INTEGER NOT NULL,
    shiftEnd INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS plays (
    playID TEXT PRIMARY KEY,
    playerID INTEGER REFERENCES players (playerID),
    gameID INTEGER REFERENCES games (gameID),
    shiftID INTEGER REFERENCES shifts (shiftID),
    periodNumber INTEGER,
    periodType TEXT,
    periodTime INTEGER,
    playType TEXT CHECK (playType IN ('Shot', 'Goal', 'Penalty')),
    secondaryType TEXT,
    goalieID INTEGER REFERENCES players (playerID)
);

CREATE TABLE IF NOT EXISTS assists (
    playID TEXT REFERENCES plays (playID),
    playerID INTEGER REFERENCES players (playerID),
    PRIMARY KEY (playID, playerID)
);

CREATE INDEX IF NOT EXISTS idx_games_season ON games (season);
CREATE INDEX IF NOT EXISTS idx_plays_game ON plays (gameID);
CREATE INDEX IF NOT EXISTS idx_plays_type ON plays (playType);
CREATE INDEX IF NOT EXISTS idx_plays_on_team ON playsOn (teamID);
"#;

/// Runs catalog queries against a SQLite database file.
pub struct SqliteQueryService {
    conn: Connection,
}

impl SqliteQueryService {
    /// Open an existing database.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if !db_path.exists() {
            return Err(RinkstatError::PathNotFound(db_path.to_path_buf()));
        }
        Self::create(db_path)
    }

    /// Open a database, creating the file if needed.
    pub fn create(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)?;
        debug!(path = %db_path.display(), "opened database");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Create the hockey schema when absent.
    pub fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Run a multi-statement SQL script in a single transaction.
    ///
    /// Either every statement applies or none does.
    pub fn load_batch(&mut self, sql: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.commit()?;
        info!(bytes = sql.len(), "loaded SQL batch");
        Ok(())
    }

    /// Load a SQL script from a file.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RinkstatError::PathNotFound(path.to_path_buf()));
        }
        let sql = std::fs::read_to_string(path).map_err(|source| RinkstatError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loading SQL file");
        self.load_batch(&sql)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl QueryService for SqliteQueryService {
    fn run(&self, query: QueryId, params: &QueryParams) -> Result<TabularResult> {
        let statement = query.statement(params)?;
        let mut stmt = self.conn.prepare(&statement.sql)?;
        let columns = stmt.column_count();

        let mut rows = stmt.query(params_from_iter(statement.args.iter()))?;
        let mut materialized: Vec<Row> = Vec::new();
        while let Some(row) = rows.next()? {
            let cells = (0..columns)
                .map(|i| row.get_ref(i).map(display_value))
                .collect::<rusqlite::Result<Row>>()?;
            materialized.push(cells);
        }

        debug!(
            query = query.name(),
            columns,
            rows = materialized.len(),
            "ran query"
        );
        Ok(TabularResult::collect(
            query.headers().iter().copied(),
            materialized,
        ))
    }
}

/// String form of a SQLite value.
fn display_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => format_real(f),
        ValueRef::Text(text) => String::from_utf8_lossy(text).into_owned(),
        ValueRef::Blob(blob) => format!("<{} bytes>", blob.len()),
    }
}

/// Up to two decimals, trailing zeros dropped.
fn format_real(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RenderPolicy, TableRenderer};

    const FIXTURE_SQL: &str = r#"
INSERT INTO teams VALUES (1, 'Winnipeg', 'Jets'), (2, 'Calgary', 'Flames'), (3, 'Edmonton', 'Oilers');
INSERT INTO venues VALUES (1, 'Bell MTS Place'), (2, 'Scotiabank Saddledome'), (3, 'Rogers Place');
INSERT INTO players VALUES
    (10, 'Mark', 'Scheifele', 'CAN', '1993-03-15', '6'' 3"', 207, 'Skater'),
    (11, 'Johnny', 'Gaudreau', 'USA', '1993-08-13', '5'' 9"', 165, 'Skater'),
    (12, 'Connor', 'Hellebuyck', 'USA', '1993-05-19', '6'' 4"', 207, 'Goalie'),
    (13, 'Jacob', 'Markstrom', 'SWE', '1990-01-31', '6'' 6"', 196, 'Goalie'),
    (14, 'Blake', 'Wheeler', 'USA', '1986-08-31', '6'' 5"', 225, 'Skater'),
    (15, 'Cam', 'Talbot', 'CAN', '1987-07-05', '6'' 3"', 195, 'Goalie');
INSERT INTO playsOn VALUES
    (10, 1, '2012-09-01', NULL),
    (11, 2, '2012-09-01', NULL),
    (12, 1, '2012-09-01', NULL),
    (13, 2, '2012-09-01', NULL),
    (14, 3, '2012-09-01', '2015-01-01'),
    (14, 1, '2015-01-01', NULL),
    (15, 3, '2012-09-01', NULL);
INSERT INTO games VALUES
    (100, 'R', '2018-10-04 00:00:00', 'home win REG', '2018-2019', 1, 2, 1),
    (101, 'P', '2019-04-10 02:00:00', 'away win OT', '2018-2019', 2, 1, 2),
    (102, 'R', '2017-11-01 01:00:00', 'home win REG', '2017-2018', 2, 1, 2),
    (103, 'R', '2017-12-01 02:00:00', 'away win REG', '2017-2018', 3, 1, 3);
INSERT INTO playsIn VALUES
    (100, 10, 2, NULL), (100, 11, -1, NULL), (100, 14, 1, NULL), (100, 12, NULL, 0.966),
    (101, 10, 1, NULL), (101, 11, 0, NULL), (101, 14, 3, NULL);
INSERT INTO shifts VALUES
    (1, 10, 100, 1, 0, 45),
    (2, 11, 100, 1, 50, 90),
    (3, 10, 101, 2, 100, 175);
INSERT INTO plays (playID, playerID, gameID, shiftID, periodNumber, periodType, periodTime, playType, secondaryType, goalieID) VALUES
    ('100_1', 10, 100, 1, 1, 'REGULAR', 30, 'Goal', 'Wrist Shot', 13),
    ('100_2', 11, 100, 2, 1, 'REGULAR', 70, 'Goal', 'Snap Shot', 12),
    ('100_3', 10, 100, NULL, 2, 'REGULAR', 400, 'Shot', 'Slap Shot', 13),
    ('101_1', 10, 101, 3, 2, 'REGULAR', 150, 'Goal', 'Backhand', 13),
    ('101_2', 10, 101, NULL, 2, 'REGULAR', 600, 'Penalty', 'Hooking', NULL),
    ('102_1', 10, 102, NULL, 1, 'REGULAR', 900, 'Goal', 'Wrist Shot', 13),
    ('102_2', 10, 102, NULL, 3, 'REGULAR', 100, 'Shot', 'Wrist Shot', 13),
    ('103_1', 10, 103, NULL, 1, 'REGULAR', 200, 'Goal', 'Tip-In', 15),
    ('103_2', 14, 103, NULL, 2, 'REGULAR', 300, 'Goal', 'Wrist Shot', 15),
    ('103_3', 10, 103, NULL, 2, 'REGULAR', 500, 'Penalty', 'Fighting', NULL);
INSERT INTO assists VALUES ('100_1', 14), ('101_1', 14), ('100_2', 13), ('103_2', 10);
INSERT INTO officials VALUES (1, 'Wes McCauley'), (2, 'Chris Rooney');
INSERT INTO officiatedBy VALUES (101, 1, 'Referee'), (101, 2, 'Linesman');
"#;

    fn seeded() -> SqliteQueryService {
        let mut service = SqliteQueryService::open_in_memory().unwrap();
        service.init_schema().unwrap();
        service.load_batch(FIXTURE_SQL).unwrap();
        service
    }

    #[test]
    fn test_teams() {
        let result = seeded().run(QueryId::Teams, &QueryParams::new()).unwrap();
        assert_eq!(result.headers, vec!["ID", "City", "Team Name"]);
        assert_eq!(result.rows[0], vec!["1", "Winnipeg", "Jets"]);
        assert_eq!(result.row_count(), 3);
        result.validate().unwrap();
    }

    #[test]
    fn test_search_player_matches_partial_names() {
        let params = QueryParams::new().with("name", "mark");
        let result = seeded().run(QueryId::SearchPlayer, &params).unwrap();
        let last_names: Vec<&str> = result.rows.iter().map(|r| r[2].as_str()).collect();
        assert_eq!(last_names, vec!["Markstrom", "Scheifele"]);
    }

    #[test]
    fn test_player_totals_per_season() {
        let params = QueryParams::new()
            .with("first", "Mark")
            .with("last", "Scheifele");
        let result = seeded().run(QueryId::PlayerTotals, &params).unwrap();
        assert_eq!(
            result.rows,
            vec![
                vec!["10", "2018-2019", "2", "0", "2"],
                vec!["10", "2017-2018", "2", "1", "3"],
            ]
        );
    }

    #[test]
    fn test_goals_by_team_uses_goalie_team() {
        let params = QueryParams::new()
            .with("first", "Mark")
            .with("last", "Scheifele");
        let result = seeded().run(QueryId::GoalsByTeam, &params).unwrap();
        assert_eq!(result.rows, vec![vec!["Flames", "3"], vec!["Oilers", "1"]]);
    }

    #[test]
    fn test_team_stints_follow_game_date() {
        let mut service = seeded();
        // Markstrom moves from Edmonton to Calgary on 2018-01-01.
        service
            .load_batch(
                "UPDATE playsOn SET startDate = '2018-01-01' WHERE playerID = 13; \
                 INSERT INTO playsOn VALUES (13, 3, '2012-09-01', '2018-01-01');",
            )
            .unwrap();
        let params = QueryParams::new()
            .with("first", "Mark")
            .with("last", "Scheifele");
        let result = service.run(QueryId::GoalsByTeam, &params).unwrap();
        assert_eq!(result.rows, vec![vec!["Flames", "2"], vec!["Oilers", "2"]]);
    }

    #[test]
    fn test_top_players_ranked_render() {
        let service = seeded();
        let params = QueryParams::new().with("stat", "g").with("season", "2018-2019");
        let result = service.run(QueryId::TopPlayers, &params).unwrap();
        assert_eq!(result.rows[0][..3], ["Mark", "Scheifele", "2"]);

        let policy = QueryId::TopPlayers.policy(&params, "Rank").unwrap();
        let text = TableRenderer::new().render_to_string(&result, &policy).unwrap();
        let first_data = text.lines().nth(2).unwrap();
        assert!(first_data.starts_with("1       Mark"));
    }

    #[test]
    fn test_top_players_by_plus_minus() {
        let params = QueryParams::new().with("stat", "+").with("season", "2018-2019");
        let result = seeded().run(QueryId::TopPlayers, &params).unwrap();
        assert_eq!(result.rows[0][1], "Wheeler");
        assert_eq!(result.rows[0][5], "4");
    }

    #[test]
    fn test_schedule_and_playoff_wins() {
        let service = seeded();
        let params = QueryParams::new().with("team", "jets").with("season", "2018-2019");
        let schedule = service.run(QueryId::Schedule, &params).unwrap();
        assert_eq!(schedule.row_count(), 2);
        assert_eq!(schedule.rows[0], vec!["2018-10-04 00:00:00", "Jets", "Flames", "home win REG"]);

        let wins = service.run(QueryId::PlayoffWins, &params).unwrap();
        assert_eq!(wins.rows, vec![vec!["Jets", "2018-2019", "1"]]);
    }

    #[test]
    fn test_goals_by_venue() {
        let params = QueryParams::new().with("season", "2018-2019");
        let result = seeded().run(QueryId::GoalsByVenue, &params).unwrap();
        assert_eq!(
            result.rows,
            vec![
                vec!["Bell MTS Place", "2"],
                vec!["Scotiabank Saddledome", "1"],
            ]
        );
    }

    #[test]
    fn test_limit_queries_return_every_row() {
        let service = seeded();
        let params = QueryParams::new().with("limit", "1");
        let result = service.run(QueryId::MostTeams, &params).unwrap();
        assert_eq!(result.rows[0], vec!["Blake", "Wheeler", "2"]);
        assert_eq!(result.row_count(), 6);

        let policy = QueryId::MostTeams.policy(&params, "Rank").unwrap();
        let text = TableRenderer::new().render_to_string(&result, &policy).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_top_officials_and_penalties() {
        let service = seeded();
        let params = QueryParams::new().with("limit", "3");
        let officials = service.run(QueryId::TopOfficials, &params).unwrap();
        assert_eq!(officials.rows, vec![vec!["Wes McCauley", "1"]]);

        let penalties = service.run(QueryId::TopPenalties, &params).unwrap();
        assert_eq!(penalties.rows, vec![vec!["Mark", "Scheifele", "2"]]);
    }

    #[test]
    fn test_shift_lengths_are_formatted() {
        let service = seeded();
        let by_period = service
            .run(QueryId::ShiftByPeriod, &QueryParams::new())
            .unwrap();
        assert_eq!(by_period.rows, vec![vec!["1", "0:42"], vec!["2", "1:15"]]);

        let by_play = service
            .run(QueryId::ShiftByPlay, &QueryParams::new())
            .unwrap();
        assert_eq!(by_play.rows, vec![vec!["Goal", "0:53"]]);
    }

    #[test]
    fn test_goals_per_shot_counts_goals_as_shots() {
        let params = QueryParams::new()
            .with("first", "mark")
            .with("last", "scheifele");
        let result = seeded().run(QueryId::GoalsPerShot, &params).unwrap();
        assert_eq!(result.rows, vec![vec!["Mark", "Scheifele", "4", "6", "66.67"]]);
    }

    #[test]
    fn test_gordie_howe_needs_goal_assist_and_fight_in_one_game() {
        let result = seeded()
            .run(QueryId::GordieHowe, &QueryParams::new())
            .unwrap();
        assert_eq!(result.rows, vec![vec!["Mark", "Scheifele", "1"]]);
    }

    #[test]
    fn test_scored_against_all_skips_current_team() {
        let service = seeded();
        let result = service
            .run(QueryId::ScoredAgainstAll, &QueryParams::new())
            .unwrap();
        // Gaudreau has only scored on the Jets.
        assert_eq!(result.rows, vec![vec!["Mark", "Scheifele", "2"]]);
    }

    #[test]
    fn test_loads_generated_insert_scripts() {
        let mut service = SqliteQueryService::open_in_memory().unwrap();
        service.init_schema().unwrap();
        service
            .load_batch(
                r#"
INSERT INTO teams (teamID, city, teamName) VALUES (4, 'New York', 'Rangers'), (5, 'Boston', 'Bruins');
INSERT INTO venues (venueName, venueID) VALUES ('Madison Square Garden', 1);
INSERT INTO games (gameID, type, dateTime, outcome, season, homeTeamID, awayTeamID, venueID) VALUES (2016020045, 'R', '2016-10-19 00:30:00', 'home win REG', '2016-2017', 4, 5, 1);
INSERT INTO players (playerID, firstName, lastName, nationality, birthDate, height, weight, playerType) VALUES (8471214, 'Alex', 'Ovechkin', 'RUS', '1985-09-17', '6'' 3"', 235, 'Skater');
INSERT INTO playsIn (gameID, playerID, plusMinus, savePercentage) VALUES (2016020045, 8471214, 1, NULL);
INSERT INTO playsOn (teamID, playerID, startDate, endDate) VALUES (4, 8471214, '2012-09-01', NULL);
INSERT INTO shifts (shiftID, playerID, gameID, periodNumber, shiftStart, shiftEnd) VALUES (1, 8471214, 2016020045, 1, 0, 40);
INSERT INTO plays (playID, playerID, gameID, shiftID, periodNumber, periodType, periodTime, playType, secondaryType, goalieID) VALUES ('2016020045_55', 8471214, 2016020045, 1, 1, 'REGULAR', 35, 'Goal', 'Wrist Shot', NULL);
"#,
            )
            .unwrap();

        let params = QueryParams::new().with("season", "2016-2017");
        let result = service.run(QueryId::GoalsByVenue, &params).unwrap();
        assert_eq!(result.rows, vec![vec!["Madison Square Garden", "1"]]);

        let by_period = service
            .run(QueryId::ShiftByPeriod, &QueryParams::new())
            .unwrap();
        assert_eq!(by_period.rows, vec![vec!["1", "0:40"]]);
    }

    #[test]
    fn test_failed_batch_rolls_back() {
        let mut service = seeded();
        let err = service
            .load_batch("INSERT INTO teams VALUES (4, 'Vancouver', 'Canucks'); INSERT INTO nowhere VALUES (1);")
            .unwrap_err();
        assert!(matches!(err, RinkstatError::Database(_)));

        let result = service.run(QueryId::Teams, &QueryParams::new()).unwrap();
        assert_eq!(result.row_count(), 3);
    }

    #[test]
    fn test_empty_result_still_renders() {
        let params = QueryParams::new().with("first", "Nobody").with("last", "Here");
        let result = seeded().run(QueryId::GoalsByTeam, &params).unwrap();
        assert!(result.is_empty());
        let text = TableRenderer::new()
            .render_to_string(&result, &RenderPolicy::new())
            .unwrap();
        assert_eq!(text, "Team Name   Goals Scored\n---------   ------------\n");
    }

    #[test]
    fn test_open_missing_database() {
        assert!(matches!(
            SqliteQueryService::open("/nonexistent/hockey.db"),
            Err(RinkstatError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(ValueRef::Null), "");
        assert_eq!(display_value(ValueRef::Integer(-3)), "-3");
        assert_eq!(display_value(ValueRef::Real(0.5)), "0.5");
        assert_eq!(display_value(ValueRef::Real(2.0)), "2");
        assert_eq!(display_value(ValueRef::Real(0.12345)), "0.12");
        assert_eq!(display_value(ValueRef::Text(b"Jets")), "Jets");
        assert_eq!(display_value(ValueRef::Blob(&[1, 2, 3])), "<3 bytes>");
    }
}
