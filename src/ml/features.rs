//! Feature Mapper
//!
//! Turns one questionnaire submission into the fixed-order feature vector
//! described by [`super::layout`]. Pure and table driven: the same answers
//! always produce the same vector.

use serde::Serialize;

use super::encoder::OrdinalEncoder;
use super::layout::{feature_index, DA_ITEMS_START, FEATURE_COUNT, FEATURE_LAYOUT};
use crate::models::NewAssessment;
use crate::survey::{GamingTime, NightPhoneUse, NotificationRate, Platform, ScreenTime, SocialTime, YesNo};

/// Number of Likert items in the questionnaire
pub const DA_ITEM_COUNT: usize = 8;

/// Highest answer of a single Likert item
pub const MAX_ITEM_SCORE: i32 = 5;

/// Platform flag columns, in layout order
pub const PLATFORM_COLUMNS: [&str; 10] = [
    "youtube", "facebook", "tiktok", "instagram", "linkedin",
    "whatsapp", "x", "snapchat", "livestreaming", "gaming",
];

// ============================================================================
// LOOKUP TABLES
// ============================================================================

/// Representative hours for a screen time range
pub fn screen_hours(range: ScreenTime) -> f64 {
    match range {
        ScreenTime::UnderTwoHours => 2.0,
        // The trained model saw 3.5 for both middle ranges
        ScreenTime::TwoToThree => 3.5,
        ScreenTime::ThreeToFour => 3.5,
        ScreenTime::FourToSix => 5.0,
        ScreenTime::OverSixHours => 6.0,
    }
}

pub fn night_hours(range: NightPhoneUse) -> f64 {
    match range {
        NightPhoneUse::Never => 0.0,
        NightPhoneUse::UnderThirtyMinutes => 0.25,
        NightPhoneUse::ThirtyToSixty => 0.75,
        NightPhoneUse::OneToTwoHours => 1.5,
        NightPhoneUse::OverTwoHours => 3.0,
    }
}

pub fn notifications_per_hour(rate: NotificationRate) -> f64 {
    match rate {
        NotificationRate::UnderFive => 4.0,
        NotificationRate::FiveToTen => 7.0,
        NotificationRate::ElevenToTwenty => 15.0,
        NotificationRate::OverTwenty => 21.0,
    }
}

pub fn social_hours(range: SocialTime) -> f64 {
    match range {
        SocialTime::UnderOneHour => 0.5,
        SocialTime::OneToTwo => 1.5,
        SocialTime::TwoToThree => 2.5,
        SocialTime::ThreeToFour => 3.5,
        SocialTime::OverFourHours => 5.0,
    }
}

pub fn gaming_hours(range: GamingTime) -> f64 {
    match range {
        GamingTime::NoGaming => 0.0,
        GamingTime::UnderThirtyMinutes => 0.25,
        GamingTime::ThirtyToSixty => 0.75,
        GamingTime::OneToTwoHours => 1.5,
        GamingTime::OverTwoHours => 3.0,
    }
}

/// Flag column a platform answer switches on
pub fn platform_column(platform: Platform) -> &'static str {
    match platform {
        Platform::YouTube => "youtube",
        Platform::TikTok => "tiktok",
        Platform::Instagram => "instagram",
        Platform::Facebook => "facebook",
        Platform::WhatsApp => "whatsapp",
        Platform::XTwitter => "x",
        Platform::Snapchat => "snapchat",
        Platform::Gaming => "gaming",
    }
}

// ============================================================================
// DAS
// ============================================================================

/// Digital Addiction Score: aggregate of the eight Likert items
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DasScore {
    pub sum: i32,
}

impl DasScore {
    pub fn from_items(items: &[i32; DA_ITEM_COUNT]) -> Self {
        Self { sum: items.iter().sum() }
    }

    /// Sum scaled to 0-100 against the maximum possible score
    pub fn normalized(&self) -> f64 {
        self.sum as f64 / (DA_ITEM_COUNT as i32 * MAX_ITEM_SCORE) as f64 * 100.0
    }

    /// Mean item answer
    pub fn weighted(&self) -> f64 {
        self.sum as f64 / DA_ITEM_COUNT as f64
    }

    pub fn weighted_normalized(&self) -> f64 {
        self.weighted() / MAX_ITEM_SCORE as f64 * 100.0
    }
}

// ============================================================================
// FEATURE VECTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn new() -> Self {
        Self { values: [0.0; FEATURE_COUNT] }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        feature_index(name).and_then(|i| self.get(i))
    }

    /// Names paired with values, for logging
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_LAYOUT.iter().copied().zip(self.values.iter().copied())
    }

    pub(crate) fn set(&mut self, name: &str, value: f64) {
        // Layout names are compile-time constants; a miss is a typo caught by tests
        if let Some(i) = feature_index(name) {
            self.values[i] = value;
        }
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MAPPER
// ============================================================================

#[derive(Debug, Clone)]
pub struct FeatureMapper {
    encoder: OrdinalEncoder,
}

impl FeatureMapper {
    pub fn new(encoder: OrdinalEncoder) -> Self {
        Self { encoder }
    }

    pub fn map(&self, assessment: &NewAssessment) -> FeatureVector {
        let mut vector = FeatureVector::new();

        vector.set("age", assessment.age as f64);
        vector.set("gender", self.encoder.encode("gender", assessment.gender.as_str()));
        vector.set(
            "primary_device",
            self.encoder.encode("primary_device", assessment.primary_device.as_str()),
        );
        vector.set(
            "own_smartphone",
            if assessment.own_smartphone == YesNo::Yes { 1.0 } else { 0.0 },
        );
        vector.set(
            "mobile_data_plan",
            self.encoder.encode("mobile_data_plan", assessment.mobile_data.as_str()),
        );

        vector.set("screen_time_weekdays", screen_hours(assessment.screen_weekdays));
        vector.set("screen_time_weekends", screen_hours(assessment.screen_weekends));
        vector.set("night_phone_use", night_hours(assessment.night_phone_use));
        vector.set("notif_per_hour", notifications_per_hour(assessment.notif_per_hour));
        vector.set("social_media_time", social_hours(assessment.social_time));
        vector.set("gaming_time", gaming_hours(assessment.gaming_time));

        for (offset, item) in assessment.da_items.iter().enumerate() {
            vector.values[DA_ITEMS_START + offset] = *item as f64;
        }

        let das = DasScore::from_items(&assessment.da_items);
        vector.set("das_sum", das.sum as f64);
        vector.set("das_normalized", das.normalized());
        vector.set("das_weighted", das.weighted());
        vector.set("das_weighted_normalized", das.weighted_normalized());

        for platform in &assessment.platforms {
            vector.set(&format!("use_{}", platform_column(*platform)), 1.0);
        }

        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assessment::tests::sample_assessment;
    use crate::survey::{Gender, PrimaryDevice, SocialTime};

    fn mapper() -> FeatureMapper {
        FeatureMapper::new(OrdinalEncoder::from_vocabulary())
    }

    #[test]
    fn test_platform_columns_are_in_layout() {
        for column in PLATFORM_COLUMNS {
            assert!(feature_index(&format!("use_{}", column)).is_some(), "{}", column);
        }
        for platform in Platform::ALL {
            assert!(PLATFORM_COLUMNS.contains(&platform_column(*platform)));
        }
    }

    #[test]
    fn test_das_aggregates() {
        let das = DasScore::from_items(&[3, 4, 2, 5, 1, 3, 4, 2]);
        assert_eq!(das.sum, 24);
        assert!((das.normalized() - 60.0).abs() < 1e-9);
        assert!((das.weighted() - 3.0).abs() < 1e-9);
        assert!((das.weighted_normalized() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_map_range_midpoints() {
        let mut assessment = sample_assessment();
        assessment.screen_weekdays = ScreenTime::FourToSix;
        assessment.night_phone_use = NightPhoneUse::OverTwoHours;
        assessment.social_time = SocialTime::UnderOneHour;

        let vector = mapper().map(&assessment);
        assert_eq!(vector.get_by_name("screen_time_weekdays"), Some(5.0));
        assert_eq!(vector.get_by_name("night_phone_use"), Some(3.0));
        assert_eq!(vector.get_by_name("social_media_time"), Some(0.5));
    }

    #[test]
    fn test_map_platform_flags() {
        let mut assessment = sample_assessment();
        assessment.platforms = vec![Platform::XTwitter, Platform::Gaming];

        let vector = mapper().map(&assessment);
        assert_eq!(vector.get_by_name("use_x"), Some(1.0));
        assert_eq!(vector.get_by_name("use_gaming"), Some(1.0));
        assert_eq!(vector.get_by_name("use_youtube"), Some(0.0));
        assert_eq!(vector.get_by_name("use_linkedin"), Some(0.0));
    }

    #[test]
    fn test_map_encodes_nominal_columns() {
        let mut assessment = sample_assessment();
        assessment.gender = Gender::Male;
        assessment.primary_device = PrimaryDevice::Tablet;

        let vector = mapper().map(&assessment);
        assert_eq!(vector.get_by_name("gender"), Some(1.0));
        assert_eq!(vector.get_by_name("primary_device"), Some(2.0));
    }

    #[test]
    fn test_map_likert_items_in_order() {
        let mut assessment = sample_assessment();
        assessment.da_items = [1, 2, 3, 4, 5, 1, 2, 3];

        let vector = mapper().map(&assessment);
        assert_eq!(vector.get_by_name("da1_time_loss"), Some(1.0));
        assert_eq!(vector.get_by_name("da5_negative_emotions"), Some(5.0));
        assert_eq!(vector.get_by_name("da8_family_comment"), Some(3.0));
        assert_eq!(vector.get_by_name("das_sum"), Some(21.0));
    }

    #[test]
    fn test_map_is_deterministic() {
        let assessment = sample_assessment();
        let mapper = mapper();

        let first = mapper.map(&assessment);
        for _ in 0..10 {
            assert_eq!(mapper.map(&assessment), first);
        }
    }
}
