//! Database module - PostgreSQL connection and migrations

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Postgres prepared statements take one command each
    for statement in SCHEMA_SQL.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Users (students and staff)
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    name VARCHAR(255),
    is_staff BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    last_login TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Questionnaire submissions
CREATE TABLE IF NOT EXISTS assessments (
    id BIGSERIAL PRIMARY KEY,
    student_id UUID NOT NULL REFERENCES users(id),
    institute VARCHAR(255),
    age INT NOT NULL CHECK (age BETWEEN 15 AND 45),
    gender VARCHAR(20) NOT NULL,
    da1 INT NOT NULL CHECK (da1 BETWEEN 1 AND 5),
    da2 INT NOT NULL CHECK (da2 BETWEEN 1 AND 5),
    da3 INT NOT NULL CHECK (da3 BETWEEN 1 AND 5),
    da4 INT NOT NULL CHECK (da4 BETWEEN 1 AND 5),
    da5 INT NOT NULL CHECK (da5 BETWEEN 1 AND 5),
    da6 INT NOT NULL CHECK (da6 BETWEEN 1 AND 5),
    da7 INT NOT NULL CHECK (da7 BETWEEN 1 AND 5),
    da8 INT NOT NULL CHECK (da8 BETWEEN 1 AND 5),
    primary_device VARCHAR(20) NOT NULL,
    own_smartphone VARCHAR(3) NOT NULL,
    mobile_data VARCHAR(20) NOT NULL,
    screen_weekdays VARCHAR(20) NOT NULL,
    screen_weekends VARCHAR(20) NOT NULL,
    night_phone_use VARCHAR(20) NOT NULL,
    notif_per_hour VARCHAR(20) NOT NULL,
    social_time VARCHAR(20) NOT NULL,
    gaming_time VARCHAR(20) NOT NULL,
    platforms JSONB NOT NULL DEFAULT '[]',
    self_rated_da VARCHAR(20) NOT NULL,
    predicted_risk VARCHAR(20),
    risk_confidence DOUBLE PRECISION,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CHECK ((predicted_risk IS NULL) = (risk_confidence IS NULL))
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_assessments_student ON assessments(student_id, created_at);
CREATE INDEX IF NOT EXISTS idx_assessments_created ON assessments(created_at)
"#;
