use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::SessionKey;

/// Request payload for acquiring or releasing an edit lease on a scoring slot
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LeaseRequest {
    #[validate(range(min = 1, message = "team_number must be positive"))]
    pub team_number: i32,

    #[validate(range(min = 1, message = "position must be positive"))]
    pub position: i32,

    #[validate(range(min = 1, message = "series_number must be positive"))]
    pub series_number: i32,

    #[validate(range(min = 1, message = "officer_id must be positive"))]
    pub officer_id: i64,
}

impl LeaseRequest {
    pub fn session_key(&self, competition_id: i64) -> SessionKey {
        SessionKey::new(
            competition_id,
            self.team_number,
            self.position,
            self.series_number,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LeaseResponse {
    Granted {
        lease_id: Uuid,
        holder_id: i64,
        expires_at: DateTime<Utc>,
    },
    Conflict {
        holder_id: i64,
        holder_name: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReleaseLeaseResponse {
    pub released: bool,
}

/// Request payload for recording one series of shots
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitSeriesRequest {
    #[validate(range(min = 1, message = "member_id must be positive"))]
    pub member_id: i64,

    #[validate(range(min = 1, message = "series_number must be positive"))]
    pub series_number: i32,

    #[validate(length(
        equal = 5,
        message = "A series must contain exactly 5 shots"
    ))]
    pub shots: Vec<String>,

    #[validate(length(
        min = 1,
        max = 16,
        message = "shooting_class must be between 1 and 16 characters"
    ))]
    pub shooting_class: String,

    #[validate(range(min = 1, message = "team_number must be positive"))]
    pub team_number: i32,

    #[validate(range(min = 1, message = "position must be positive"))]
    pub position: i32,

    #[validate(range(min = 1, message = "officer_id must be positive"))]
    pub officer_id: i64,
}

impl SubmitSeriesRequest {
    pub fn lease_request(&self) -> LeaseRequest {
        LeaseRequest {
            team_number: self.team_number,
            position: self.position,
            series_number: self.series_number,
            officer_id: self.officer_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitSeriesResponse {
    Recorded {
        result_id: Uuid,
        total: i32,
        inner_tens: i32,
    },
    Conflict {
        holder_id: i64,
        holder_name: String,
    },
}

/// One recorded series as shown on a scoring sheet
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SheetSeries {
    pub series_number: i32,
    pub total: i32,
    pub inner_tens: i32,
}

/// One competitor's line on the range officers' scoring sheet
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScoringSheetRow {
    pub team_number: Option<i32>,
    pub position: Option<i32>,
    pub member_id: i64,
    pub member_name: Option<String>,
    pub shooting_class: String,
    pub series: Vec<SheetSeries>,
    pub total: i32,
    pub inner_tens: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SubmitSeriesRequest {
        SubmitSeriesRequest {
            member_id: 42,
            series_number: 1,
            shots: vec!["10".into(), "9".into(), "X".into(), "8".into(), "7".into()],
            shooting_class: "C2".into(),
            team_number: 3,
            position: 4,
            officer_id: 5,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_wrong_shot_count_is_rejected() {
        let mut req = request();
        req.shots.pop();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("shots"));
    }

    #[test]
    fn test_non_positive_identifiers_are_rejected() {
        let mut req = request();
        req.member_id = 0;
        req.officer_id = -3;
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("member_id"));
        assert!(fields.contains_key("officer_id"));
    }

    #[test]
    fn test_conflict_serializes_with_status_tag() {
        let response = SubmitSeriesResponse::Conflict {
            holder_id: 9,
            holder_name: "Range Officer".into(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "conflict");
        assert_eq!(json["holder_name"], "Range Officer");
    }
}
