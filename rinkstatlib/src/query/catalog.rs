//! The fixed catalog of hockey statistics reports.
//!
//! Each [`QueryId`] bundles everything needed to run and present one report:
//! its command name, the parameters it requires, the column headers, the SQL
//! text (SQLite dialect) and whether it is displayed as a ranked top-N list.
//!
//! Ranked reports return every row; the renderer applies the cap.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::params::QueryParams;
use crate::error::RinkstatError;
use crate::render::RenderPolicy;
use crate::Result;

/// Number of players listed by `top-players`.
pub const TOP_PLAYERS_CAP: usize = 25;

/// Identifies one report in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryId {
    Teams,
    SearchPlayer,
    PlayerTotals,
    GoalsByTeam,
    TopPlayers,
    Schedule,
    PlayoffWins,
    GoalsByVenue,
    MostTeams,
    TopPenalties,
    TopOfficials,
    ShiftByPeriod,
    ShiftByPlay,
    GoalsPerShot,
    GordieHowe,
    ScoredAgainstAll,
}

/// SQL text with its positional arguments, bound as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<String>,
}

impl Statement {
    fn new(sql: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

impl QueryId {
    pub const ALL: [QueryId; 16] = [
        QueryId::Teams,
        QueryId::SearchPlayer,
        QueryId::PlayerTotals,
        QueryId::GoalsByTeam,
        QueryId::TopPlayers,
        QueryId::Schedule,
        QueryId::PlayoffWins,
        QueryId::GoalsByVenue,
        QueryId::MostTeams,
        QueryId::TopPenalties,
        QueryId::TopOfficials,
        QueryId::ShiftByPeriod,
        QueryId::ShiftByPlay,
        QueryId::GoalsPerShot,
        QueryId::GordieHowe,
        QueryId::ScoredAgainstAll,
    ];

    /// Command name
    pub fn name(self) -> &'static str {
        match self {
            QueryId::Teams => "teams",
            QueryId::SearchPlayer => "search-player",
            QueryId::PlayerTotals => "player-totals",
            QueryId::GoalsByTeam => "goals-by-team",
            QueryId::TopPlayers => "top-players",
            QueryId::Schedule => "schedule",
            QueryId::PlayoffWins => "playoff-wins",
            QueryId::GoalsByVenue => "goals-by-venue",
            QueryId::MostTeams => "most-teams",
            QueryId::TopPenalties => "top-penalties",
            QueryId::TopOfficials => "top-officials",
            QueryId::ShiftByPeriod => "shift-by-period",
            QueryId::ShiftByPlay => "shift-by-play",
            QueryId::GoalsPerShot => "goals-per-shot",
            QueryId::GordieHowe => "gordie-howe",
            QueryId::ScoredAgainstAll => "scored-against-all",
        }
    }

    /// One-line description for the query listing
    pub fn description(self) -> &'static str {
        match self {
            QueryId::Teams => "List every team",
            QueryId::SearchPlayer => "Find players by first or last name",
            QueryId::PlayerTotals => "Goals, assists and points per season for a player",
            QueryId::GoalsByTeam => "Goals a player scored against each team",
            QueryId::TopPlayers => "Top 25 players of a season by a statistic",
            QueryId::Schedule => "A team's games in a season",
            QueryId::PlayoffWins => "Playoff wins for a team in a season",
            QueryId::GoalsByVenue => "Goals scored at each venue in a season",
            QueryId::MostTeams => "Players who have played on the most teams",
            QueryId::TopPenalties => "Players who have taken the most penalties",
            QueryId::TopOfficials => "Referees calling the most penalties against away teams",
            QueryId::ShiftByPeriod => "Average shift length per period",
            QueryId::ShiftByPlay => "Average shift length for each play type",
            QueryId::GoalsPerShot => "A player's goals per shot percentage",
            QueryId::GordieHowe => "Players with a goal, an assist and a fight in one game",
            QueryId::ScoredAgainstAll => {
                "Players who have scored against every team but their current one"
            }
        }
    }

    /// Required parameter names
    pub fn params(self) -> &'static [&'static str] {
        match self {
            QueryId::Teams
            | QueryId::ShiftByPeriod
            | QueryId::ShiftByPlay
            | QueryId::GordieHowe
            | QueryId::ScoredAgainstAll => &[],
            QueryId::SearchPlayer => &["name"],
            QueryId::PlayerTotals | QueryId::GoalsByTeam | QueryId::GoalsPerShot => {
                &["first", "last"]
            }
            QueryId::TopPlayers => &["stat", "season"],
            QueryId::Schedule | QueryId::PlayoffWins => &["team", "season"],
            QueryId::GoalsByVenue => &["season"],
            QueryId::MostTeams | QueryId::TopPenalties | QueryId::TopOfficials => &["limit"],
        }
    }

    /// Data column headers (the rank column of ranked reports is not included)
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            QueryId::Teams => &["ID", "City", "Team Name"],
            QueryId::SearchPlayer => &["Player ID", "First", "Last"],
            QueryId::PlayerTotals => &["Player ID", "Season", "Goals", "Assists", "Points"],
            QueryId::GoalsByTeam => &["Team Name", "Goals Scored"],
            QueryId::TopPlayers => &["First", "Last", "Goals", "Assists", "Points", "Plus Minus"],
            QueryId::Schedule => &["Date", "Home", "Away", "Outcome"],
            QueryId::PlayoffWins => &["Team Name", "Season", "Playoff Wins"],
            QueryId::GoalsByVenue => &["Venue Name", "Total Goals"],
            QueryId::MostTeams => &["First", "Last", "Teams"],
            QueryId::TopPenalties => &["First", "Last", "Penalties"],
            QueryId::TopOfficials => &["Name", "Penalties Called"],
            QueryId::ShiftByPeriod => &["Period", "Avg Shift"],
            QueryId::ShiftByPlay => &["Play Type", "Avg Shift"],
            QueryId::GoalsPerShot => &["First", "Last", "Goals", "Shots", "Goal %"],
            QueryId::GordieHowe => &["First", "Last", "Hat Tricks"],
            QueryId::ScoredAgainstAll => &["First", "Last", "Teams Scored Against"],
        }
    }

    pub fn is_ranked(self) -> bool {
        matches!(
            self,
            QueryId::TopPlayers | QueryId::MostTeams | QueryId::TopPenalties | QueryId::TopOfficials
        )
    }

    /// How the result should be presented.
    pub fn policy(self, params: &QueryParams, rank_header: &str) -> Result<RenderPolicy> {
        let name = self.name();
        let policy = match self {
            QueryId::TopPlayers => RenderPolicy::new().cap(TOP_PLAYERS_CAP).ranked(rank_header),
            QueryId::MostTeams | QueryId::TopPenalties | QueryId::TopOfficials => {
                RenderPolicy::new()
                    .cap(params.limit(name, "limit")?)
                    .ranked(rank_header)
            }
            _ => RenderPolicy::new(),
        };
        Ok(policy)
    }

    /// Banner shown above the table
    pub fn title(self, params: &QueryParams) -> Result<String> {
        let name = self.name();
        let title = match self {
            QueryId::Teams => "All NHL Teams".to_string(),
            QueryId::SearchPlayer => {
                format!("Players matching '{}'", params.text(name, "name")?)
            }
            QueryId::PlayerTotals => format!(
                "Total Goals, Assists, and Points for {} {}",
                params.text(name, "first")?,
                params.text(name, "last")?
            ),
            QueryId::GoalsByTeam => format!(
                "Goals against each team for {} {}",
                params.text(name, "first")?,
                params.text(name, "last")?
            ),
            QueryId::TopPlayers => format!(
                "Top {} Players ordered by {} in {}",
                TOP_PLAYERS_CAP,
                params.stat(name, "stat")?.label(),
                params.season(name, "season")?
            ),
            QueryId::Schedule => format!(
                "{} schedule for {}",
                params.text(name, "team")?,
                params.season(name, "season")?
            ),
            QueryId::PlayoffWins => format!(
                "Playoff wins for {} in {}",
                params.text(name, "team")?,
                params.season(name, "season")?
            ),
            QueryId::GoalsByVenue => format!(
                "Total goals scored at each venue for {}",
                params.season(name, "season")?
            ),
            QueryId::MostTeams => format!(
                "Top {} players who have played on the most teams",
                params.limit(name, "limit")?
            ),
            QueryId::TopPenalties => format!(
                "Top {} players with the most penalties",
                params.limit(name, "limit")?
            ),
            QueryId::TopOfficials => format!(
                "Top {} officials who call the most penalties against away teams",
                params.limit(name, "limit")?
            ),
            QueryId::ShiftByPeriod => "Avg. shift length per period".to_string(),
            QueryId::ShiftByPlay => "Avg. shift length for each play type".to_string(),
            QueryId::GoalsPerShot => format!(
                "Goals per shot for {} {}",
                params.text(name, "first")?,
                params.text(name, "last")?
            ),
            QueryId::GordieHowe => "Players with the most Gordie Howe hat tricks".to_string(),
            QueryId::ScoredAgainstAll => {
                "Players who have scored against every team except their current team"
                    .to_string()
            }
        };
        Ok(title)
    }

    /// SQL and bound arguments for this query.
    pub fn statement(self, params: &QueryParams) -> Result<Statement> {
        let name = self.name();
        let statement = match self {
            QueryId::Teams => Statement::new(TEAMS_SQL, vec![]),
            QueryId::SearchPlayer => {
                let pattern = format!("%{}%", params.text(name, "name")?);
                Statement::new(SEARCH_PLAYER_SQL, vec![pattern])
            }
            QueryId::PlayerTotals => Statement::new(
                PLAYER_TOTALS_SQL,
                vec![
                    params.text(name, "first")?.to_string(),
                    params.text(name, "last")?.to_string(),
                ],
            ),
            QueryId::GoalsByTeam => Statement::new(
                GOALS_BY_TEAM_SQL,
                vec![
                    params.text(name, "first")?.to_string(),
                    params.text(name, "last")?.to_string(),
                ],
            ),
            QueryId::TopPlayers => {
                let stat = params.stat(name, "stat")?;
                let season = params.season(name, "season")?;
                let sql = format!(
                    "{}ORDER BY {} DESC, players.lastName, players.firstName",
                    TOP_PLAYERS_SQL,
                    stat.column()
                );
                Statement::new(sql, vec![season.to_string()])
            }
            QueryId::Schedule => Statement::new(
                SCHEDULE_SQL,
                vec![
                    params.text(name, "team")?.to_string(),
                    params.season(name, "season")?.to_string(),
                ],
            ),
            QueryId::PlayoffWins => Statement::new(
                PLAYOFF_WINS_SQL,
                vec![
                    params.text(name, "team")?.to_string(),
                    params.season(name, "season")?.to_string(),
                ],
            ),
            QueryId::GoalsByVenue => Statement::new(
                GOALS_BY_VENUE_SQL,
                vec![params.season(name, "season")?.to_string()],
            ),
            QueryId::MostTeams => {
                params.limit(name, "limit")?;
                Statement::new(MOST_TEAMS_SQL, vec![])
            }
            QueryId::TopPenalties => {
                params.limit(name, "limit")?;
                Statement::new(TOP_PENALTIES_SQL, vec![])
            }
            QueryId::TopOfficials => {
                params.limit(name, "limit")?;
                Statement::new(TOP_OFFICIALS_SQL, vec![])
            }
            QueryId::ShiftByPeriod => Statement::new(SHIFT_BY_PERIOD_SQL, vec![]),
            QueryId::ShiftByPlay => Statement::new(SHIFT_BY_PLAY_SQL, vec![]),
            QueryId::GoalsPerShot => Statement::new(
                GOALS_PER_SHOT_SQL,
                vec![
                    params.text(name, "first")?.to_string(),
                    params.text(name, "last")?.to_string(),
                ],
            ),
            QueryId::GordieHowe => Statement::new(GORDIE_HOWE_SQL, vec![]),
            QueryId::ScoredAgainstAll => Statement::new(SCORED_AGAINST_ALL_SQL, vec![]),
        };
        Ok(statement)
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QueryId {
    type Err = RinkstatError;

    fn from_str(s: &str) -> Result<Self> {
        QueryId::ALL
            .into_iter()
            .find(|q| q.name() == s)
            .ok_or_else(|| RinkstatError::UnknownQuery(s.to_string()))
    }
}

const TEAMS_SQL: &str = "
SELECT teamID, city, teamName
FROM teams
ORDER BY teamID
";

const SEARCH_PLAYER_SQL: &str = "
SELECT playerID, firstName, lastName
FROM players
WHERE firstName LIKE ?1
   OR lastName LIKE ?1
   OR (firstName || ' ' || lastName) LIKE ?1
ORDER BY lastName, firstName, playerID
";

const PLAYER_TOTALS_SQL: &str = "
WITH goals AS (
    SELECT plays.playerID, games.season, COUNT(*) AS numGoals
    FROM plays
    JOIN games ON games.gameID = plays.gameID
    WHERE plays.playType = 'Goal'
    GROUP BY plays.playerID, games.season
),
helpers AS (
    SELECT assists.playerID, games.season, COUNT(*) AS numAssists
    FROM assists
    JOIN plays ON plays.playID = assists.playID
    JOIN games ON games.gameID = plays.gameID
    WHERE plays.playType = 'Goal'
    GROUP BY assists.playerID, games.season
),
seasons AS (
    SELECT playerID, season FROM goals
    UNION
    SELECT playerID, season FROM helpers
)
SELECT players.playerID,
       seasons.season,
       COALESCE(goals.numGoals, 0),
       COALESCE(helpers.numAssists, 0),
       COALESCE(goals.numGoals, 0) + COALESCE(helpers.numAssists, 0)
FROM seasons
JOIN players ON players.playerID = seasons.playerID
LEFT JOIN goals ON goals.playerID = seasons.playerID AND goals.season = seasons.season
LEFT JOIN helpers ON helpers.playerID = seasons.playerID AND helpers.season = seasons.season
WHERE players.firstName = ?1 COLLATE NOCASE
  AND players.lastName = ?2 COLLATE NOCASE
ORDER BY players.playerID, seasons.season DESC
";

// A player's team for a game is the playsOn stint covering the game date;
// a stint's endDate is the first day with the next team.
const GOALS_BY_TEAM_SQL: &str = "
SELECT teams.teamName, COUNT(*) AS numGoals
FROM plays
JOIN players ON players.playerID = plays.playerID
JOIN games ON games.gameID = plays.gameID
JOIN playsOn ON playsOn.playerID = plays.goalieID
    AND playsOn.startDate <= date(games.dateTime)
    AND (playsOn.endDate IS NULL OR playsOn.endDate > date(games.dateTime))
JOIN teams ON teams.teamID = playsOn.teamID
WHERE players.firstName = ?1 COLLATE NOCASE
  AND players.lastName = ?2 COLLATE NOCASE
  AND plays.playType = 'Goal'
GROUP BY teams.teamID, teams.teamName
ORDER BY numGoals DESC, teams.teamName
";

// ORDER BY is appended from a fixed column list.
const TOP_PLAYERS_SQL: &str = "
WITH goals AS (
    SELECT plays.playerID, COUNT(*) AS numGoals
    FROM plays
    JOIN games ON games.gameID = plays.gameID
    WHERE plays.playType = 'Goal' AND games.season = ?1
    GROUP BY plays.playerID
),
helpers AS (
    SELECT assists.playerID, COUNT(*) AS numAssists
    FROM assists
    JOIN plays ON plays.playID = assists.playID
    JOIN games ON games.gameID = plays.gameID
    WHERE games.season = ?1
    GROUP BY assists.playerID
),
ratings AS (
    SELECT playsIn.playerID, SUM(playsIn.plusMinus) AS plusMinus
    FROM playsIn
    JOIN games ON games.gameID = playsIn.gameID
    WHERE games.season = ?1
    GROUP BY playsIn.playerID
),
totals AS (
    SELECT ratings.playerID,
           COALESCE(goals.numGoals, 0) AS numGoals,
           COALESCE(helpers.numAssists, 0) AS numAssists,
           COALESCE(goals.numGoals, 0) + COALESCE(helpers.numAssists, 0) AS numPoints,
           ratings.plusMinus AS plusMinus
    FROM ratings
    LEFT JOIN goals ON goals.playerID = ratings.playerID
    LEFT JOIN helpers ON helpers.playerID = ratings.playerID
)
SELECT players.firstName, players.lastName, numGoals, numAssists, numPoints, plusMinus
FROM totals
JOIN players ON players.playerID = totals.playerID
";

const SCHEDULE_SQL: &str = "
SELECT games.dateTime, home.teamName, away.teamName, games.outcome
FROM games
JOIN teams AS home ON home.teamID = games.homeTeamID
JOIN teams AS away ON away.teamID = games.awayTeamID
WHERE games.season = ?2
  AND (home.teamName = ?1 COLLATE NOCASE OR away.teamName = ?1 COLLATE NOCASE)
ORDER BY games.dateTime
";

const PLAYOFF_WINS_SQL: &str = "
SELECT teams.teamName, ?2, COUNT(games.gameID)
FROM teams
LEFT JOIN games
    ON games.season = ?2
   AND games.type = 'P'
   AND ((games.homeTeamID = teams.teamID AND games.outcome LIKE 'home win%')
     OR (games.awayTeamID = teams.teamID AND games.outcome LIKE 'away win%'))
WHERE teams.teamName = ?1 COLLATE NOCASE
GROUP BY teams.teamID, teams.teamName
";

const GOALS_BY_VENUE_SQL: &str = "
SELECT venues.venueName, COUNT(*) AS numGoals
FROM plays
JOIN games ON games.gameID = plays.gameID
JOIN venues ON venues.venueID = games.venueID
WHERE games.season = ?1 AND plays.playType = 'Goal'
GROUP BY venues.venueID, venues.venueName
ORDER BY numGoals DESC, venues.venueName
";

const MOST_TEAMS_SQL: &str = "
SELECT players.firstName, players.lastName, COUNT(DISTINCT playsOn.teamID) AS numTeams
FROM players
JOIN playsOn ON playsOn.playerID = players.playerID
GROUP BY players.playerID, players.firstName, players.lastName
ORDER BY numTeams DESC, players.lastName, players.firstName
";

const TOP_PENALTIES_SQL: &str = "
SELECT players.firstName, players.lastName, COUNT(*) AS numPenalties
FROM plays
JOIN players ON players.playerID = plays.playerID
WHERE plays.playType = 'Penalty'
GROUP BY players.playerID, players.firstName, players.lastName
ORDER BY numPenalties DESC, players.lastName, players.firstName
";

const TOP_OFFICIALS_SQL: &str = "
WITH awayPenalties AS (
    SELECT plays.gameID
    FROM plays
    JOIN games ON games.gameID = plays.gameID
    JOIN playsOn ON playsOn.playerID = plays.playerID
        AND playsOn.startDate <= date(games.dateTime)
        AND (playsOn.endDate IS NULL OR playsOn.endDate > date(games.dateTime))
    WHERE plays.playType = 'Penalty'
      AND playsOn.teamID = games.awayTeamID
)
SELECT officials.officialName, COUNT(*) AS numPenalties
FROM officiatedBy
JOIN officials ON officials.officialID = officiatedBy.officialID
JOIN awayPenalties ON awayPenalties.gameID = officiatedBy.gameID
WHERE officiatedBy.officialType = 'Referee'
GROUP BY officials.officialID, officials.officialName
ORDER BY numPenalties DESC, officials.officialName
";

const SHIFT_BY_PERIOD_SQL: &str = "
WITH lengths AS (
    SELECT periodNumber, CAST(AVG(shiftEnd - shiftStart) AS INTEGER) AS seconds
    FROM shifts
    GROUP BY periodNumber
)
SELECT periodNumber, printf('%d:%02d', seconds / 60, seconds % 60)
FROM lengths
ORDER BY periodNumber
";

const SHIFT_BY_PLAY_SQL: &str = "
WITH lengths AS (
    SELECT plays.playType, CAST(AVG(shifts.shiftEnd - shifts.shiftStart) AS INTEGER) AS seconds
    FROM plays
    JOIN shifts ON shifts.shiftID = plays.shiftID
    GROUP BY plays.playType
)
SELECT playType, printf('%d:%02d', seconds / 60, seconds % 60)
FROM lengths
ORDER BY playType
";

// A goal also counts as a shot on goal.
const GOALS_PER_SHOT_SQL: &str = "
SELECT players.firstName,
       players.lastName,
       SUM(plays.playType = 'Goal') AS numGoals,
       COUNT(*) AS numShots,
       ROUND(100.0 * SUM(plays.playType = 'Goal') / COUNT(*), 2) AS goalPercentage
FROM plays
JOIN players ON players.playerID = plays.playerID
WHERE players.firstName = ?1 COLLATE NOCASE
  AND players.lastName = ?2 COLLATE NOCASE
  AND plays.playType IN ('Shot', 'Goal')
GROUP BY players.playerID, players.firstName, players.lastName
ORDER BY goalPercentage DESC, players.playerID
";

const GORDIE_HOWE_SQL: &str = "
WITH goals AS (
    SELECT DISTINCT playerID, gameID FROM plays WHERE playType = 'Goal'
),
helpers AS (
    SELECT DISTINCT assists.playerID, plays.gameID
    FROM assists
    JOIN plays ON plays.playID = assists.playID
),
fights AS (
    SELECT DISTINCT playerID, gameID
    FROM plays
    WHERE playType = 'Penalty' AND secondaryType LIKE 'Fight%'
),
hatTricks AS (
    SELECT goals.playerID, goals.gameID
    FROM goals
    JOIN helpers ON helpers.playerID = goals.playerID AND helpers.gameID = goals.gameID
    JOIN fights ON fights.playerID = goals.playerID AND fights.gameID = goals.gameID
)
SELECT players.firstName, players.lastName, COUNT(*) AS numHatTricks
FROM hatTricks
JOIN players ON players.playerID = hatTricks.playerID
GROUP BY players.playerID, players.firstName, players.lastName
ORDER BY numHatTricks DESC, players.lastName, players.firstName
";

// Opponent of a goal is the goalie's team on the game date; the current team
// is the stint without an endDate.
const SCORED_AGAINST_ALL_SQL: &str = "
WITH opponents AS (
    SELECT DISTINCT plays.playerID, playsOn.teamID
    FROM plays
    JOIN games ON games.gameID = plays.gameID
    JOIN playsOn ON playsOn.playerID = plays.goalieID
        AND playsOn.startDate <= date(games.dateTime)
        AND (playsOn.endDate IS NULL OR playsOn.endDate > date(games.dateTime))
    WHERE plays.playType = 'Goal'
),
currentTeams AS (
    SELECT DISTINCT playerID, teamID FROM playsOn WHERE endDate IS NULL
),
scored AS (
    SELECT opponents.playerID, COUNT(*) AS numTeams
    FROM opponents
    LEFT JOIN currentTeams
        ON currentTeams.playerID = opponents.playerID AND currentTeams.teamID = opponents.teamID
    WHERE currentTeams.teamID IS NULL
    GROUP BY opponents.playerID
)
SELECT players.firstName, players.lastName, scored.numTeams
FROM scored
JOIN players ON players.playerID = scored.playerID
WHERE scored.numTeams >= (
    SELECT COUNT(*)
    FROM teams
    WHERE teams.teamID NOT IN (
        SELECT currentTeams.teamID FROM currentTeams WHERE currentTeams.playerID = scored.playerID
    )
)
ORDER BY players.lastName, players.firstName
";
