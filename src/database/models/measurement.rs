use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type Payload = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    Anthropometric,
    Performance,
    Health,
}

impl MeasurementKind {
    pub const ALL: [MeasurementKind; 3] = [
        MeasurementKind::Anthropometric,
        MeasurementKind::Performance,
        MeasurementKind::Health,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementKind::Anthropometric => "anthropometric",
            MeasurementKind::Performance => "performance",
            MeasurementKind::Health => "health",
        }
    }

    /// Payload fields that must hold JSON numbers when present
    pub fn numeric_fields(&self) -> &'static [&'static str] {
        match self {
            MeasurementKind::Anthropometric => &[
                "weight",
                "height",
                "bodyFatPercentage",
                "chest",
                "waist",
                "hips",
                "biceps",
                "thighs",
                "calves",
            ],
            MeasurementKind::Performance => &[
                "sprintTime",
                "verticalJump",
                "vo2Max",
                "strength",
                "endurance",
                "flexibility",
            ],
            MeasurementKind::Health => &[
                "heartRate",
                "restingHeartRate",
                "oxygenSaturation",
                "bodyTemperature",
                "sleepHours",
            ],
        }
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasurementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown measurement kind '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub id: Uuid,
    pub kind: MeasurementKind,
    pub owner_id: Uuid,
    pub athlete_id: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
    pub payload: Payload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct MeasurementRow {
    pub id: Uuid,
    pub kind: String,
    pub owner_id: Uuid,
    pub athlete_id: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
    pub payload: sqlx::types::Json<Payload>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<MeasurementRow> for Measurement {
    type Error = String;

    fn try_from(row: MeasurementRow) -> Result<Self, Self::Error> {
        Ok(Measurement {
            id: row.id,
            kind: row.kind.parse()?,
            owner_id: row.owner_id,
            athlete_id: row.athlete_id,
            recorded_at: row.recorded_at,
            payload: row.payload.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewMeasurement {
    pub kind: MeasurementKind,
    pub owner_id: Uuid,
    pub athlete_id: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
    pub payload: Payload,
}

impl NewMeasurement {
    pub fn into_measurement(self) -> Measurement {
        let now = Utc::now();
        Measurement {
            id: Uuid::new_v4(),
            kind: self.kind,
            owner_id: self.owner_id,
            athlete_id: self.athlete_id,
            recorded_at: self.recorded_at,
            payload: self.payload,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update: payload keys are set one by one, the rest is optional
#[derive(Debug, Clone, Default)]
pub struct MeasurementPatch {
    /// `Some(None)` clears the subject reference
    pub athlete_id: Option<Option<Uuid>>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub payload: Payload,
}

impl MeasurementPatch {
    pub fn apply(&self, measurement: &mut Measurement) {
        for (key, value) in &self.payload {
            measurement.payload.insert(key.clone(), value.clone());
        }
        if let Some(athlete_id) = self.athlete_id {
            measurement.athlete_id = athlete_id;
        }
        if let Some(recorded_at) = self.recorded_at {
            measurement.recorded_at = recorded_at;
        }
        measurement.updated_at = Utc::now();
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InputError {
    #[error("Field '{0}' must be a number")]
    NotNumeric(String),
    #[error("athleteId must be a valid id")]
    InvalidAthleteId,
    #[error("date must be an RFC 3339 timestamp or YYYY-MM-DD")]
    InvalidDate,
}

/// Keys the server controls; clients cannot set them through the body
const SERVER_FIELDS: &[&str] = &[
    "id", "_id", "__v", "kind", "ownerId", "userId", "owner", "createdAt", "updatedAt",
];

/// A request body split into its reference, date and payload parts
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementInput {
    /// None: key absent; Some(None): explicit null
    pub athlete_id: Option<Option<Uuid>>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub payload: Payload,
}

impl MeasurementInput {
    pub fn parse(kind: MeasurementKind, mut body: Payload) -> Result<Self, InputError> {
        for key in SERVER_FIELDS {
            body.remove(*key);
        }

        let athlete_id = match body.remove("athleteId") {
            None => None,
            Some(Value::Null) => Some(None),
            Some(Value::String(s)) if s.trim().is_empty() => Some(None),
            Some(Value::String(s)) => {
                Some(Some(Uuid::parse_str(s.trim()).map_err(|_| InputError::InvalidAthleteId)?))
            }
            Some(_) => return Err(InputError::InvalidAthleteId),
        };

        let recorded_at = match body.remove("date") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(parse_date(&s)?),
            Some(_) => return Err(InputError::InvalidDate),
        };

        for field in kind.numeric_fields() {
            match body.get(*field) {
                None | Some(Value::Null) | Some(Value::Number(_)) => {}
                Some(_) => return Err(InputError::NotNumeric(field.to_string())),
            }
        }

        Ok(Self {
            athlete_id,
            recorded_at,
            payload: body,
        })
    }

    pub fn into_new(self, kind: MeasurementKind, owner_id: Uuid) -> NewMeasurement {
        NewMeasurement {
            kind,
            owner_id,
            athlete_id: self.athlete_id.flatten(),
            recorded_at: self.recorded_at.unwrap_or_else(Utc::now),
            payload: self.payload,
        }
    }

    pub fn into_patch(self) -> MeasurementPatch {
        MeasurementPatch {
            athlete_id: self.athlete_id,
            recorded_at: self.recorded_at,
            payload: self.payload,
        }
    }
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, InputError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or(InputError::InvalidDate)
}

/// Subject reference resolved to a display name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AthleteRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementView {
    pub id: Uuid,
    pub kind: MeasurementKind,
    pub owner_id: Uuid,
    pub athlete_id: Option<AthleteRef>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: Payload,
}

impl MeasurementView {
    pub fn new(measurement: Measurement, athlete: Option<AthleteRef>) -> Self {
        Self {
            id: measurement.id,
            kind: measurement.kind,
            owner_id: measurement.owner_id,
            athlete_id: athlete,
            date: measurement.recorded_at,
            created_at: measurement.created_at,
            updated_at: measurement.updated_at,
            payload: measurement.payload,
        }
    }
}
