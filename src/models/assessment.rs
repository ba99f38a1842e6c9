//! Assessment model
//!
//! `AssessmentPayload` is the raw submission, validated field by field.
//! Answers are held as untyped JSON until validation so a value of the wrong
//! type is reported against its field instead of failing the whole body.
//! `NewAssessment` is the typed, validated answer set fed to the predictor.
//! `Assessment` is the stored row.

use std::borrow::Cow;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::{AppError, AppResult};
use crate::ml::{DasScore, Prediction};
use crate::survey::*;

// ============================================================================
// SUBMISSION
// ============================================================================

const REQUIRED: &str = "This field is required.";

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AssessmentPayload {
    #[serde(default)]
    #[validate(custom(function = "validate_institute"))]
    pub institute: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_age"))]
    pub age: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_gender"))]
    pub gender: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_da"))]
    pub da1: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_da"))]
    pub da2: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_da"))]
    pub da3: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_da"))]
    pub da4: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_da"))]
    pub da5: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_da"))]
    pub da6: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_da"))]
    pub da7: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_da"))]
    pub da8: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_primary_device"))]
    pub primary_device: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_own_smartphone"))]
    pub own_smartphone: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_mobile_data"))]
    pub mobile_data: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_screen_weekdays"))]
    pub screen_weekdays: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_screen_weekends"))]
    pub screen_weekends: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_night_phone_use"))]
    pub night_phone_use: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_notif_per_hour"))]
    pub notif_per_hour: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_social_time"))]
    pub social_time: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_gaming_time"))]
    pub gaming_time: Option<Value>,

    /// Missing means no platforms
    #[serde(default, deserialize_with = "present")]
    #[validate(custom(function = "validate_platforms"))]
    pub platforms: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "This field is required."), custom(function = "validate_self_rated_da"))]
    pub self_rated_da: Option<Value>,
}

/// Keeps an explicit `null` as `Some(Value::Null)`; only a missing key is `None`
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

fn field_error(code: &'static str, message: impl Into<String>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message.into()));
    err
}

fn not_null(value: &Value) -> Result<(), ValidationError> {
    if value.is_null() {
        Err(field_error("null", "This field may not be null."))
    } else {
        Ok(())
    }
}

/// Integers, integral floats and numeric strings
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= i32::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn integer_between(value: &Value, min: i64, max: i64, message: &str) -> Result<(), ValidationError> {
    not_null(value)?;
    let n = as_integer(value).ok_or_else(|| field_error("invalid", "A valid integer is required."))?;
    if (min..=max).contains(&n) {
        Ok(())
    } else {
        Err(field_error("range", message))
    }
}

/// Closed-set check shared by every categorical field
fn check_choice<T: FromStr>(value: &Value, message: impl FnOnce() -> String) -> Result<(), ValidationError> {
    not_null(value)?;
    match value.as_str() {
        Some("") => Err(field_error("required", REQUIRED)),
        Some(s) if s.parse::<T>().is_ok() => Ok(()),
        _ => Err(field_error("choice", message())),
    }
}

fn one_of(what: &str, labels: Vec<&str>) -> String {
    format!("{} must be one of {:?}.", what, labels)
}

fn validate_institute(value: &Value) -> Result<(), ValidationError> {
    match value.as_str() {
        Some(s) if s.chars().count() > 255 => {
            Err(field_error("length", "Institute must be at most 255 characters."))
        }
        Some(_) => Ok(()),
        None => Err(field_error("invalid", "Not a valid string.")),
    }
}

fn validate_age(value: &Value) -> Result<(), ValidationError> {
    integer_between(value, 15, 45, "Age must be between 15 and 45.")
}

fn validate_da(value: &Value) -> Result<(), ValidationError> {
    integer_between(value, 1, 5, "DA fields must be between 1 and 5.")
}

fn validate_gender(value: &Value) -> Result<(), ValidationError> {
    check_choice::<Gender>(value, || "Gender must be Male or Female.".to_string())
}

fn validate_primary_device(value: &Value) -> Result<(), ValidationError> {
    check_choice::<PrimaryDevice>(value, || one_of("Primary device", PrimaryDevice::labels()))
}

fn validate_own_smartphone(value: &Value) -> Result<(), ValidationError> {
    check_choice::<YesNo>(value, || "Own smartphone must be Yes or No.".to_string())
}

fn validate_mobile_data(value: &Value) -> Result<(), ValidationError> {
    check_choice::<MobileDataPlan>(value, || one_of("Mobile data", MobileDataPlan::labels()))
}

fn validate_screen_weekdays(value: &Value) -> Result<(), ValidationError> {
    check_choice::<ScreenTime>(value, || one_of("Weekday screen time", ScreenTime::labels()))
}

fn validate_screen_weekends(value: &Value) -> Result<(), ValidationError> {
    check_choice::<ScreenTime>(value, || one_of("Weekend screen time", ScreenTime::labels()))
}

fn validate_night_phone_use(value: &Value) -> Result<(), ValidationError> {
    check_choice::<NightPhoneUse>(value, || one_of("Night phone use", NightPhoneUse::labels()))
}

fn validate_notif_per_hour(value: &Value) -> Result<(), ValidationError> {
    check_choice::<NotificationRate>(value, || {
        one_of("Notifications per hour", NotificationRate::labels())
    })
}

fn validate_social_time(value: &Value) -> Result<(), ValidationError> {
    check_choice::<SocialTime>(value, || one_of("Social media time", SocialTime::labels()))
}

fn validate_gaming_time(value: &Value) -> Result<(), ValidationError> {
    check_choice::<GamingTime>(value, || one_of("Gaming time", GamingTime::labels()))
}

fn validate_self_rated_da(value: &Value) -> Result<(), ValidationError> {
    check_choice::<SelfRating>(value, || one_of("Self-rated DA", SelfRating::labels()))
}

fn validate_platforms(value: &Value) -> Result<(), ValidationError> {
    not_null(value)?;
    let items = value
        .as_array()
        .ok_or_else(|| field_error("invalid", "Platforms must be a list."))?;

    let invalid: Vec<String> = items
        .iter()
        .filter(|item| item.as_str().and_then(Platform::parse).is_none())
        .map(|item| match item.as_str() {
            Some(s) => s.to_string(),
            None => item.to_string(),
        })
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(field_error("choice", format!("Invalid platforms: {:?}", invalid)))
    }
}

fn choice<T>(value: Option<&Value>) -> AppResult<T>
where
    T: FromStr<Err = InvalidChoice>,
{
    let label = value.and_then(Value::as_str).unwrap_or_default();
    label.parse().map_err(|e: InvalidChoice| AppError::ValidationError(e.to_string()))
}

fn integer(value: Option<&Value>, field: &str) -> AppResult<i32> {
    value
        .and_then(as_integer)
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| AppError::ValidationError(format!("{} is required", field)))
}

impl AssessmentPayload {
    /// Validate every field, then convert to canonical typed answers
    pub fn into_new_assessment(self) -> AppResult<NewAssessment> {
        self.validate()?;

        let mut platforms = Vec::new();
        let items = self.platforms.as_ref().and_then(Value::as_array);
        for item in items.into_iter().flatten() {
            let platform: Platform = choice(Some(item))?;
            if !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }

        Ok(NewAssessment {
            institute: self
                .institute
                .as_ref()
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            age: integer(self.age.as_ref(), "age")?,
            gender: choice(self.gender.as_ref())?,
            da_items: [
                integer(self.da1.as_ref(), "da1")?,
                integer(self.da2.as_ref(), "da2")?,
                integer(self.da3.as_ref(), "da3")?,
                integer(self.da4.as_ref(), "da4")?,
                integer(self.da5.as_ref(), "da5")?,
                integer(self.da6.as_ref(), "da6")?,
                integer(self.da7.as_ref(), "da7")?,
                integer(self.da8.as_ref(), "da8")?,
            ],
            primary_device: choice(self.primary_device.as_ref())?,
            own_smartphone: choice(self.own_smartphone.as_ref())?,
            mobile_data: choice(self.mobile_data.as_ref())?,
            screen_weekdays: choice(self.screen_weekdays.as_ref())?,
            screen_weekends: choice(self.screen_weekends.as_ref())?,
            night_phone_use: choice(self.night_phone_use.as_ref())?,
            notif_per_hour: choice(self.notif_per_hour.as_ref())?,
            social_time: choice(self.social_time.as_ref())?,
            gaming_time: choice(self.gaming_time.as_ref())?,
            platforms,
            self_rated_da: choice(self.self_rated_da.as_ref())?,
        })
    }
}

/// A validated questionnaire
#[derive(Debug, Clone, PartialEq)]
pub struct NewAssessment {
    pub institute: Option<String>,
    pub age: i32,
    pub gender: Gender,
    pub da_items: [i32; 8],
    pub primary_device: PrimaryDevice,
    pub own_smartphone: YesNo,
    pub mobile_data: MobileDataPlan,
    pub screen_weekdays: ScreenTime,
    pub screen_weekends: ScreenTime,
    pub night_phone_use: NightPhoneUse,
    pub notif_per_hour: NotificationRate,
    pub social_time: SocialTime,
    pub gaming_time: GamingTime,
    pub platforms: Vec<Platform>,
    pub self_rated_da: SelfRating,
}

// ============================================================================
// STORED ROW
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assessment {
    pub id: i64,
    pub student_id: Uuid,
    pub institute: Option<String>,
    pub age: i32,
    pub gender: String,
    pub da1: i32,
    pub da2: i32,
    pub da3: i32,
    pub da4: i32,
    pub da5: i32,
    pub da6: i32,
    pub da7: i32,
    pub da8: i32,
    pub primary_device: String,
    pub own_smartphone: String,
    pub mobile_data: String,
    pub screen_weekdays: String,
    pub screen_weekends: String,
    pub night_phone_use: String,
    pub notif_per_hour: String,
    pub social_time: String,
    pub gaming_time: String,
    pub platforms: serde_json::Value,
    pub self_rated_da: String,
    pub predicted_risk: Option<String>,
    pub risk_confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Single assessment with its normalized DAS
#[derive(Debug, Serialize)]
pub struct AssessmentDetail {
    #[serde(flatten)]
    pub assessment: Assessment,
    pub das_score: f64,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub id: i64,
    pub risk: RiskLevel,
    pub confidence: f64,
}

impl Assessment {
    pub fn da_items(&self) -> [i32; 8] {
        [self.da1, self.da2, self.da3, self.da4, self.da5, self.da6, self.da7, self.da8]
    }

    pub fn das(&self) -> DasScore {
        DasScore::from_items(&self.da_items())
    }

    /// Platform answers that still parse; anything else is skipped
    pub fn platform_list(&self) -> Vec<Platform> {
        self.platforms
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .filter_map(Platform::parse)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Owners see their own submissions; staff see everything
    pub fn is_visible_to(&self, user_id: Uuid, is_staff: bool) -> bool {
        is_staff || self.student_id == user_id
    }

    pub fn into_detail(self) -> AssessmentDetail {
        let das_score = (self.das().weighted_normalized() * 100.0).round() / 100.0;
        AssessmentDetail { assessment: self, das_score }
    }

    pub async fn create(
        pool: &PgPool,
        student_id: Uuid,
        data: &NewAssessment,
    ) -> Result<Self, sqlx::Error> {
        let platforms = serde_json::Value::Array(
            data.platforms
                .iter()
                .map(|p| serde_json::Value::String(p.as_str().to_string()))
                .collect(),
        );
        let [da1, da2, da3, da4, da5, da6, da7, da8] = data.da_items;

        sqlx::query_as::<_, Assessment>(
            r#"
            INSERT INTO assessments (
                student_id, institute, age, gender,
                da1, da2, da3, da4, da5, da6, da7, da8,
                primary_device, own_smartphone, mobile_data,
                screen_weekdays, screen_weekends, night_phone_use,
                notif_per_hour, social_time, gaming_time,
                platforms, self_rated_da
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
            RETURNING *
            "#
        )
        .bind(student_id)
        .bind(&data.institute)
        .bind(data.age)
        .bind(data.gender.as_str())
        .bind(da1)
        .bind(da2)
        .bind(da3)
        .bind(da4)
        .bind(da5)
        .bind(da6)
        .bind(da7)
        .bind(da8)
        .bind(data.primary_device.as_str())
        .bind(data.own_smartphone.as_str())
        .bind(data.mobile_data.as_str())
        .bind(data.screen_weekdays.as_str())
        .bind(data.screen_weekends.as_str())
        .bind(data.night_phone_use.as_str())
        .bind(data.notif_per_hour.as_str())
        .bind(data.social_time.as_str())
        .bind(data.gaming_time.as_str())
        .bind(&platforms)
        .bind(data.self_rated_da.as_str())
        .fetch_one(pool)
        .await
    }

    /// Store the classifier output. Derived fields are written once:
    /// returns `None` if the row is missing or already has a prediction.
    pub async fn record_prediction(
        pool: &PgPool,
        id: i64,
        prediction: &Prediction,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Assessment>(
            r#"
            UPDATE assessments
            SET predicted_risk = $2, risk_confidence = $3
            WHERE id = $1 AND predicted_risk IS NULL
            RETURNING *
            "#
        )
        .bind(id)
        .bind(prediction.risk.as_str())
        .bind(prediction.confidence)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Assessment>("SELECT * FROM assessments WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A student's submissions, oldest first
    pub async fn list_by_student(pool: &PgPool, student_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Assessment>(
            "SELECT * FROM assessments WHERE student_id = $1 ORDER BY created_at ASC, id ASC"
        )
        .bind(student_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Assessment>("SELECT * FROM assessments ORDER BY created_at ASC, id ASC")
            .fetch_all(pool)
            .await
    }
}
