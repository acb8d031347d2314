// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron expression handling
//!
//! Schedules are written as standard five-field cron expressions. The
//! `cron` crate wants a seconds column, so five-field inputs get a literal
//! `0` prefixed before parsing; six- and seven-field inputs pass through.

use chrono::{DateTime, Utc};
use cron::Schedule as CronSchedule;
use std::str::FromStr;

use crate::error::ApiError;

fn normalize(expression: &str) -> String {
    let fields = expression.split_whitespace().count();
    if fields == 5 {
        format!("0 {}", expression.trim())
    } else {
        expression.trim().to_string()
    }
}

fn parse(expression: &str) -> Result<CronSchedule, ApiError> {
    CronSchedule::from_str(&normalize(expression))
        .map_err(|_| ApiError::Validation(format!("Invalid cron expression: {}", expression)))
}

/// Reject invalid expressions at schedule create/update time.
pub fn validate(expression: &str) -> Result<(), ApiError> {
    parse(expression).map(|_| ())
}

/// Next fire time strictly after `base`.
pub fn next_fire(expression: &str, base: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, ApiError> {
    Ok(parse(expression)?.after(&base).next())
}

#[cfg(test)]
#[path = "cron_expr_tests.rs"]
mod tests;
