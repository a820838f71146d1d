// Cron schedule state: parsing, the eager first deadline, and advancement

use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;

use crate::errors::ScheduleError;

/// A cron rule bound to a timezone, tracking the next fire time.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    schedule: Schedule,
    timezone: Tz,
    deadline: DateTime<Utc>,
}

impl CronSchedule {
    /// Parse `expression` and eagerly compute the first fire time strictly
    /// after `anchor`.
    ///
    /// A first deadline at or before the anchor signals a defective
    /// expression or a clock anomaly; construction refuses rather than
    /// degrading.
    pub fn new(expression: &str, timezone: Tz, anchor: DateTime<Utc>) -> Result<Self, ScheduleError> {
        let schedule = parse_cron_expression(expression)?;
        let deadline = next_occurrence(&schedule, expression, timezone, anchor)?;
        if deadline <= anchor {
            return Err(ScheduleError::InitialDeadlineInPast {
                expression: expression.to_string(),
                deadline,
                anchor,
            });
        }
        Ok(Self {
            expression: expression.to_string(),
            schedule,
            timezone,
            deadline,
        })
    }

    /// The next instant at which the schedule fires.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// The cron expression as written on the label.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Advance the deadline to the next occurrence strictly after `now`.
    ///
    /// Anchoring at `now` rather than the previous deadline means fire
    /// times that passed while the process was busy or asleep are skipped,
    /// never replayed.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        let next = next_occurrence(&self.schedule, &self.expression, self.timezone, now)?;
        self.deadline = next;
        Ok(next)
    }
}

/// Parse a cron expression, accepting the standard five-field form.
///
/// The `cron` crate wants a leading seconds field; five-field input is
/// normalized by prepending `0`, firing at second zero of each matching
/// minute. Six- and seven-field input passes through unchanged, which
/// admits second precision and an optional year field.
pub fn parse_cron_expression(expression: &str) -> Result<Schedule, ScheduleError> {
    let normalized = if expression.split_whitespace().count() == 5 {
        format!("0 {}", expression)
    } else {
        expression.to_string()
    };
    Schedule::from_str(&normalized).map_err(|e| ScheduleError::InvalidCronExpression {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

fn next_occurrence(
    schedule: &Schedule,
    expression: &str,
    timezone: Tz,
    after: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    // Evaluate in the schedule's timezone, then convert back to UTC.
    let after_in_tz = after.with_timezone(&timezone);
    let next_in_tz =
        schedule
            .after(&after_in_tz)
            .next()
            .ok_or_else(|| ScheduleError::ScheduleExhausted {
                expression: expression.to_string(),
                after,
            })?;
    Ok(next_in_tz.with_timezone(&Utc))
}
