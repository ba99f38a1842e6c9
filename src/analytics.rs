//! Dashboard aggregates
//!
//! Pure functions over stored assessments producing chart-ready series.
//! Rows whose stored answers no longer parse contribute zero hours, the same
//! as an unmapped label does in the feature mapper.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ml::features::{gaming_hours, screen_hours, social_hours};
use crate::models::Assessment;
use crate::survey::{Gender, GamingTime, NightPhoneUse, Platform, RiskLevel, ScreenTime, SelfRating, SocialTime};

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageMetrics {
    pub avg_screen_weekdays: f64,
    pub avg_screen_weekends: f64,
    pub avg_gaming_time_hours: f64,
    pub avg_gaming_time_mins: f64,
    pub avg_social_media_time_hours: f64,
    pub avg_social_media_time_mins: f64,
    pub total_assessments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// YYYY-MM-DD
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeScore {
    pub age: i32,
    pub avg_das: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub label: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeBreakdown {
    pub age: i32,
    pub total: usize,
    pub shares: Vec<CategoryShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderPlatforms {
    pub gender: String,
    pub platforms: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentDashboard {
    pub metrics: UsageMetrics,
    pub das_trend: Vec<TrendPoint>,
    pub social_time_trend: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub metrics: UsageMetrics,
    pub das_by_age: Vec<AgeScore>,
    pub late_night_use: Vec<CategoryCount>,
    pub night_phone_by_age: Vec<AgeBreakdown>,
    pub platform_usage: Vec<CategoryCount>,
    pub platform_usage_by_gender: Vec<GenderPlatforms>,
    pub self_rated: Vec<CategoryCount>,
    pub predicted_risk: Vec<CategoryCount>,
}

// ============================================================================
// AGGREGATES
// ============================================================================

fn hours_of(assessments: &[Assessment], hours: impl Fn(&Assessment) -> Option<f64>) -> Vec<f64> {
    assessments.iter().map(|a| hours(a).unwrap_or(0.0)).collect()
}

pub fn usage_metrics(assessments: &[Assessment]) -> UsageMetrics {
    let weekdays = hours_of(assessments, |a| ScreenTime::parse(&a.screen_weekdays).map(screen_hours));
    let weekends = hours_of(assessments, |a| ScreenTime::parse(&a.screen_weekends).map(screen_hours));
    let gaming = hours_of(assessments, |a| GamingTime::parse(&a.gaming_time).map(gaming_hours));
    let social = hours_of(assessments, |a| SocialTime::parse(&a.social_time).map(social_hours));

    let gaming_hours_avg = round_to(mean(&gaming), 2);
    let social_hours_avg = round_to(mean(&social), 2);

    UsageMetrics {
        avg_screen_weekdays: round_to(mean(&weekdays), 1),
        avg_screen_weekends: round_to(mean(&weekends), 1),
        avg_gaming_time_hours: gaming_hours_avg,
        avg_gaming_time_mins: round_to(gaming_hours_avg * 60.0, 1),
        avg_social_media_time_hours: social_hours_avg,
        avg_social_media_time_mins: round_to(social_hours_avg * 60.0, 1),
        total_assessments: assessments.len(),
    }
}

fn chronological(assessments: &[Assessment]) -> Vec<&Assessment> {
    let mut sorted: Vec<&Assessment> = assessments.iter().collect();
    sorted.sort_by_key(|a| (a.created_at, a.id));
    sorted
}

/// Normalized DAS (0-100) per submission, oldest first
pub fn das_trend(assessments: &[Assessment]) -> Vec<TrendPoint> {
    chronological(assessments)
        .into_iter()
        .map(|a| TrendPoint {
            date: a.created_at.format("%Y-%m-%d").to_string(),
            value: round_to(a.das().normalized(), 2),
        })
        .collect()
}

/// Social media minutes per submission, oldest first
pub fn social_time_trend(assessments: &[Assessment]) -> Vec<TrendPoint> {
    chronological(assessments)
        .into_iter()
        .filter_map(|a| {
            let range = SocialTime::parse(&a.social_time)?;
            Some(TrendPoint {
                date: a.created_at.format("%Y-%m-%d").to_string(),
                value: social_hours(range) * 60.0,
            })
        })
        .collect()
}

pub fn das_by_age(assessments: &[Assessment]) -> Vec<AgeScore> {
    let mut by_age: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for a in assessments {
        by_age.entry(a.age).or_default().push(a.das().normalized());
    }

    by_age
        .into_iter()
        .map(|(age, scores)| AgeScore {
            age,
            avg_das: round_to(mean(&scores), 2),
            count: scores.len(),
        })
        .collect()
}

/// Count per label in vocabulary order, zero counts included
fn count_labels<'a>(labels: &[&str], values: impl Iterator<Item = &'a str>) -> Vec<CategoryCount> {
    let mut counts = vec![0usize; labels.len()];
    for value in values {
        if let Some(i) = labels.iter().position(|l| *l == value) {
            counts[i] += 1;
        }
    }

    labels
        .iter()
        .zip(counts)
        .map(|(label, count)| CategoryCount { label: label.to_string(), count })
        .collect()
}

pub fn late_night_use(assessments: &[Assessment]) -> Vec<CategoryCount> {
    count_labels(
        &NightPhoneUse::labels(),
        assessments.iter().map(|a| a.night_phone_use.as_str()),
    )
}

/// Share of each night-use answer within every age group, in percent
pub fn night_phone_by_age(assessments: &[Assessment]) -> Vec<AgeBreakdown> {
    let mut by_age: BTreeMap<i32, Vec<&str>> = BTreeMap::new();
    for a in assessments {
        by_age.entry(a.age).or_default().push(a.night_phone_use.as_str());
    }

    by_age
        .into_iter()
        .map(|(age, answers)| {
            let total = answers.len();
            let shares = count_labels(&NightPhoneUse::labels(), answers.into_iter())
                .into_iter()
                .map(|c| CategoryShare {
                    percentage: round_to(c.count as f64 / total as f64 * 100.0, 1),
                    label: c.label,
                })
                .collect();
            AgeBreakdown { age, total, shares }
        })
        .collect()
}

pub fn platform_usage(assessments: &[Assessment]) -> Vec<CategoryCount> {
    let used: Vec<Platform> = assessments.iter().flat_map(|a| a.platform_list()).collect();
    count_labels(&Platform::labels(), used.iter().map(|p| p.as_str()))
}

pub fn platform_usage_by_gender(assessments: &[Assessment]) -> Vec<GenderPlatforms> {
    Gender::ALL
        .iter()
        .map(|gender| {
            let group: Vec<Assessment> = assessments
                .iter()
                .filter(|a| a.gender == gender.as_str())
                .cloned()
                .collect();
            GenderPlatforms {
                gender: gender.to_string(),
                platforms: platform_usage(&group),
            }
        })
        .collect()
}

/// Self-ratings under the classifier's labels, so both distributions line up
pub fn self_rated(assessments: &[Assessment]) -> Vec<CategoryCount> {
    let levels: Vec<&'static str> = assessments
        .iter()
        .filter_map(|a| SelfRating::parse(&a.self_rated_da))
        .map(|r| r.risk_level().as_str())
        .collect();
    count_labels(&RiskLevel::labels(), levels.into_iter())
}

/// Distribution of classifier output; rows still awaiting a prediction are skipped
pub fn predicted_risk(assessments: &[Assessment]) -> Vec<CategoryCount> {
    count_labels(
        &RiskLevel::labels(),
        assessments.iter().filter_map(|a| a.predicted_risk.as_deref()),
    )
}

pub fn student_dashboard(assessments: &[Assessment]) -> StudentDashboard {
    StudentDashboard {
        metrics: usage_metrics(assessments),
        das_trend: das_trend(assessments),
        social_time_trend: social_time_trend(assessments),
    }
}

pub fn insights(assessments: &[Assessment]) -> Insights {
    Insights {
        metrics: usage_metrics(assessments),
        das_by_age: das_by_age(assessments),
        late_night_use: late_night_use(assessments),
        night_phone_by_age: night_phone_by_age(assessments),
        platform_usage: platform_usage(assessments),
        platform_usage_by_gender: platform_usage_by_gender(assessments),
        self_rated: self_rated(assessments),
        predicted_risk: predicted_risk(assessments),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use crate::models::assessment::tests::{sample_assessment, stored};

    fn count(series: &[CategoryCount], label: &str) -> usize {
        series.iter().find(|c| c.label == label).map(|c| c.count).unwrap_or(0)
    }

    fn rows() -> Vec<Assessment> {
        let student = Uuid::new_v4();
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();

        let mut first = stored(1, student, &sample_assessment());
        first.age = 20;
        first.gender = "Male".to_string();
        first.da1 = 5;
        first.screen_weekdays = ">6h".to_string();
        first.gaming_time = ">2h".to_string();
        first.social_time = ">4h".to_string();
        first.night_phone_use = ">2h".to_string();
        first.platforms = serde_json::json!(["YouTube", "TikTok"]);
        first.predicted_risk = Some("Severe".to_string());
        first.risk_confidence = Some(0.8);
        first.created_at = start + Duration::days(2);

        let mut second = stored(2, student, &sample_assessment());
        second.age = 20;
        second.screen_weekdays = "<2h".to_string();
        second.gaming_time = "None".to_string();
        second.social_time = "<1h".to_string();
        second.night_phone_use = "Never".to_string();
        second.created_at = start;

        let mut third = stored(3, student, &sample_assessment());
        third.age = 22;
        third.self_rated_da = "Severe".to_string();
        third.created_at = start + Duration::days(1);

        vec![first, second, third]
    }

    #[test]
    fn test_usage_metrics() {
        let metrics = usage_metrics(&rows());
        // weekdays: 6 + 2 + 3.5
        assert_eq!(metrics.avg_screen_weekdays, 3.8);
        // gaming: 3 + 0 + 0.25
        assert_eq!(metrics.avg_gaming_time_hours, 1.08);
        assert_eq!(metrics.avg_gaming_time_mins, 64.8);
        // social: 5 + 0.5 + 2.5
        assert_eq!(metrics.avg_social_media_time_hours, 2.67);
        assert_eq!(metrics.total_assessments, 3);
    }

    #[test]
    fn test_usage_metrics_empty() {
        let metrics = usage_metrics(&[]);
        assert_eq!(metrics.avg_screen_weekends, 0.0);
        assert_eq!(metrics.total_assessments, 0);
    }

    #[test]
    fn test_trends_are_chronological() {
        let trend = das_trend(&rows());
        let dates: Vec<&str> = trend.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-03-01", "2025-03-02", "2025-03-03"]);
        // third point is the row with da1 = 5: sum 26
        assert_eq!(trend[2].value, 65.0);

        let social = social_time_trend(&rows());
        assert_eq!(social[0].value, 30.0);
        assert_eq!(social[2].value, 300.0);
    }

    #[test]
    fn test_das_by_age() {
        let by_age = das_by_age(&rows());
        assert_eq!(by_age.len(), 2);
        assert_eq!(by_age[0], AgeScore { age: 20, avg_das: 62.5, count: 2 });
        assert_eq!(by_age[1].age, 22);
    }

    #[test]
    fn test_night_use_distribution() {
        let counts = late_night_use(&rows());
        assert_eq!(counts.len(), NightPhoneUse::ALL.len());
        assert_eq!(count(&counts, ">2h"), 1);
        assert_eq!(count(&counts, "Never"), 1);
        assert_eq!(count(&counts, "30–60m"), 1);
        assert_eq!(count(&counts, "<30m"), 0);

        let by_age = night_phone_by_age(&rows());
        let twenty = &by_age[0];
        assert_eq!(twenty.total, 2);
        let never = twenty.shares.iter().find(|s| s.label == "Never").unwrap();
        assert_eq!(never.percentage, 50.0);
    }

    #[test]
    fn test_platform_usage() {
        let usage = platform_usage(&rows());
        assert_eq!(usage.len(), Platform::ALL.len());
        assert_eq!(count(&usage, "WhatsApp"), 2);
        assert_eq!(count(&usage, "TikTok"), 1);
        assert_eq!(count(&usage, "Snapchat"), 0);

        let by_gender = platform_usage_by_gender(&rows());
        let male = by_gender.iter().find(|g| g.gender == "Male").unwrap();
        assert_eq!(count(&male.platforms, "YouTube"), 1);
        assert_eq!(count(&male.platforms, "WhatsApp"), 0);
    }

    #[test]
    fn test_rating_distributions() {
        let rated = self_rated(&rows());
        assert_eq!(count(&rated, "Mild"), 2);
        assert_eq!(count(&rated, "Severe"), 1);
        assert_eq!(count(&rated, "Not at Risk"), 0);

        let predicted = predicted_risk(&rows());
        assert_eq!(count(&predicted, "Severe"), 1);
        assert_eq!(predicted.iter().map(|c| c.count).sum::<usize>(), 1);
    }
}
