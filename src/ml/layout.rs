//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema the classifier was trained on.**
//!
//! ## Rules:
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! The model artifact records the version and hash it was trained against,
//! and the server refuses to start when they disagree.

use crc32fast::Hasher;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT
// ============================================================================

/// Feature names in exact order they appear in the vector
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Demographics (0-4) ===
    "age",
    "gender",                   // ordinal encoded
    "primary_device",           // ordinal encoded
    "own_smartphone",
    "mobile_data_plan",         // ordinal encoded

    // === Usage ranges in hours (5-10) ===
    "screen_time_weekdays",
    "screen_time_weekends",
    "night_phone_use",
    "notif_per_hour",           // notifications, not hours
    "social_media_time",
    "gaming_time",

    // === Likert items (11-18) ===
    "da1_time_loss",
    "da2_restless",
    "da3_failed_cut",
    "da4_skip_tasks",
    "da5_negative_emotions",
    "da6_morning_check",
    "da7_class_check",
    "da8_family_comment",

    // === DAS aggregates (19-22) ===
    "das_sum",
    "das_normalized",
    "das_weighted",
    "das_weighted_normalized",

    // === Platform flags (23-32) ===
    "use_youtube",
    "use_facebook",
    "use_tiktok",
    "use_instagram",
    "use_linkedin",
    "use_whatsapp",
    "use_x",
    "use_snapchat",
    "use_livestreaming",
    "use_gaming",
];

/// Total number of features. Must match FEATURE_LAYOUT.len()
pub const FEATURE_COUNT: usize = 33;

/// Nominal columns handled by the ordinal encoder
pub const CATEGORICAL_FEATURES: [&str; 3] = ["gender", "primary_device", "mobile_data_plan"];

/// Index of the first Likert item
pub const DA_ITEMS_START: usize = 11;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over the version byte and every feature name, NUL separated
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "feature layout mismatch: expected v{expected_version} (hash {expected_hash:08x}), \
     got v{actual_version} (hash {actual_hash:08x})"
)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

/// Validate that an artifact was trained on the current layout
pub fn validate_layout(version: u8, hash: u32) -> Result<(), LayoutMismatchError> {
    let current = layout_hash();

    if version != FEATURE_VERSION || hash != current {
        return Err(LayoutMismatchError {
            expected_version: FEATURE_VERSION,
            expected_hash: current,
            actual_version: version,
            actual_hash: hash,
        });
    }

    Ok(())
}

pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}
