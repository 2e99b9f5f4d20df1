//! Named query parameters and their typed forms.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RinkstatError;
use crate::Result;

/// First and last season covered by the database.
pub const FIRST_SEASON: u16 = 2012;
pub const LAST_SEASON: u16 = 2019;

/// Statistic used to order player rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatKind {
    Goals,
    Assists,
    Points,
    PlusMinus,
}

impl StatKind {
    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            StatKind::Goals => "Goals",
            StatKind::Assists => "Assists",
            StatKind::Points => "Points",
            StatKind::PlusMinus => "Plus-Minus",
        }
    }

    /// Result column the ranking is ordered by.
    pub(crate) fn column(self) -> &'static str {
        match self {
            StatKind::Goals => "numGoals",
            StatKind::Assists => "numAssists",
            StatKind::Points => "numPoints",
            StatKind::PlusMinus => "plusMinus",
        }
    }
}

impl FromStr for StatKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "g" | "goals" => Ok(StatKind::Goals),
            "a" | "assists" => Ok(StatKind::Assists),
            "p" | "points" => Ok(StatKind::Points),
            "+" | "plus-minus" | "plusminus" => Ok(StatKind::PlusMinus),
            _ => Err("expected one of g, a, p, +".to_string()),
        }
    }
}

/// A regular season, identified by the year it starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Season {
    start: u16,
}

impl Season {
    pub fn new(start: u16) -> std::result::Result<Self, String> {
        if (FIRST_SEASON..=LAST_SEASON).contains(&start) {
            Ok(Self { start })
        } else {
            Err(format!(
                "seasons {}-{} through {}-{} are available",
                FIRST_SEASON,
                FIRST_SEASON + 1,
                LAST_SEASON,
                LAST_SEASON + 1
            ))
        }
    }

    pub fn start(self) -> u16 {
        self.start
    }

    /// Every season in the database, oldest first.
    pub fn all() -> impl Iterator<Item = Season> {
        (FIRST_SEASON..=LAST_SEASON).map(|start| Season { start })
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.start + 1)
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (first, second) = match s.split_once('-') {
            Some(parts) => parts,
            None if s.len() == 8 && s.is_ascii() => s.split_at(4),
            None => return Err("expected a season like 2015-2016".to_string()),
        };
        let first: u16 = first
            .parse()
            .map_err(|_| "expected a season like 2015-2016".to_string())?;
        let second: u16 = second
            .parse()
            .map_err(|_| "expected a season like 2015-2016".to_string())?;
        if first.checked_add(1) != Some(second) {
            return Err("season years must be consecutive".to_string());
        }
        Season::new(first)
    }
}

/// Named string parameters for one query run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    values: BTreeMap<String, String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a parameter
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Parse `name=value` assignments as given on the command line.
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut params = Self::new();
        for assignment in assignments {
            let assignment = assignment.as_ref();
            let (name, value) =
                assignment
                    .split_once('=')
                    .ok_or_else(|| RinkstatError::InvalidParam {
                        param: assignment.to_string(),
                        value: String::new(),
                        message: "expected name=value".to_string(),
                    })?;
            params.set(name.trim(), value.trim());
        }
        Ok(params)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Required non-empty text parameter
    pub fn text(&self, query: &'static str, name: &'static str) -> Result<&str> {
        match self.get(name) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(RinkstatError::MissingParam { query, param: name }),
        }
    }

    pub fn season(&self, query: &'static str, name: &'static str) -> Result<Season> {
        self.parsed(query, name)
    }

    pub fn stat(&self, query: &'static str, name: &'static str) -> Result<StatKind> {
        self.parsed(query, name)
    }

    /// Required positive integer
    pub fn limit(&self, query: &'static str, name: &'static str) -> Result<usize> {
        let value = self.text(query, name)?;
        match value.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(invalid(name, value, "expected a positive integer")),
        }
    }

    fn parsed<T>(&self, query: &'static str, name: &'static str) -> Result<T>
    where
        T: FromStr<Err = String>,
    {
        let value = self.text(query, name)?;
        value.parse().map_err(|message: String| invalid(name, value, &message))
    }
}

fn invalid(param: &str, value: &str, message: &str) -> RinkstatError {
    RinkstatError::InvalidParam {
        param: param.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}
