use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Who a competition is open to. Club-internal events never award
/// standard medals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionScope {
    ClubInternal,
    Open,
    Regional,
    National,
}

impl CompetitionScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClubInternal => "club_internal",
            Self::Open => "open",
            Self::Regional => "regional",
            Self::National => "national",
        }
    }
}

impl fmt::Display for CompetitionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompetitionScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "club_internal" => Ok(Self::ClubInternal),
            "open" => Ok(Self::Open),
            "regional" => Ok(Self::Regional),
            "national" => Ok(Self::National),
            other => Err(format!("unknown competition scope '{}'", other)),
        }
    }
}

/// Series layout of a competition: `Q` qualification series followed by
/// `F` finals series, numbered `1..=Q+F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SeriesFormat {
    pub qualification_series: u32,
    pub finals_series: u32,
}

impl SeriesFormat {
    pub fn new(qualification_series: u32, finals_series: u32) -> Self {
        Self {
            qualification_series,
            finals_series,
        }
    }

    pub fn total_series(&self) -> u32 {
        self.qualification_series + self.finals_series
    }

    pub fn has_finals(&self) -> bool {
        self.finals_series > 0
    }

    pub fn is_final(&self, series_number: i32) -> bool {
        series_number > self.qualification_series as i32
    }

    pub fn contains(&self, series_number: i32) -> bool {
        series_number >= 1 && series_number <= self.total_series() as i32
    }
}

/// Competition settings owned by the registration directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CompetitionConfig {
    pub competition_id: i64,
    pub name: String,
    pub format: SeriesFormat,
    pub award_standard_medals: bool,
    /// Award group C medals per cohort instead of pooled.
    pub split_group_c: bool,
    pub scope: CompetitionScope,
    /// Results recorded here on behalf of another organizer.
    pub is_external: bool,
}

impl CompetitionConfig {
    pub fn awards_medals(&self) -> bool {
        self.award_standard_medals
            && self.scope != CompetitionScope::ClubInternal
            && !self.is_external
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Registration {
    pub member_id: i64,
    pub member_name: String,
    pub club: Option<String>,
    pub shooting_class: String,
}

/// Physical slot assignment. Display ordering only, never identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StartListEntry {
    pub team_number: i32,
    pub position: i32,
    pub member_id: i64,
    pub weapon_class: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(scope: CompetitionScope) -> CompetitionConfig {
        CompetitionConfig {
            competition_id: 1,
            name: "Spring Precision".to_string(),
            format: SeriesFormat::new(6, 0),
            award_standard_medals: true,
            split_group_c: false,
            scope,
            is_external: false,
        }
    }

    #[test]
    fn test_club_internal_events_award_no_medals() {
        assert!(config(CompetitionScope::Open).awards_medals());
        assert!(!config(CompetitionScope::ClubInternal).awards_medals());
    }

    #[test]
    fn test_external_events_award_no_medals() {
        let mut cfg = config(CompetitionScope::National);
        cfg.is_external = true;
        assert!(!cfg.awards_medals());
    }

    #[test]
    fn test_series_format_bounds() {
        let format = SeriesFormat::new(4, 2);
        assert!(!format.contains(0));
        assert!(format.contains(1));
        assert!(format.contains(6));
        assert!(!format.contains(7));
        assert!(!format.is_final(4));
        assert!(format.is_final(5));
    }

    #[test]
    fn test_scope_round_trips_through_text() {
        for scope in [
            CompetitionScope::ClubInternal,
            CompetitionScope::Open,
            CompetitionScope::Regional,
            CompetitionScope::National,
        ] {
            assert_eq!(scope.as_str().parse::<CompetitionScope>(), Ok(scope));
        }
        assert!("league".parse::<CompetitionScope>().is_err());
    }
}
