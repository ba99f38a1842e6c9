//! HTTP handlers

pub mod health;
pub mod auth;
pub mod assessments;
pub mod dashboard;
