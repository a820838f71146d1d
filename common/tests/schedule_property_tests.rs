// Property-based tests for cron schedule state

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use common::schedule::CronSchedule;
use proptest::prelude::*;

fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 10, 20, 0).unwrap()
}

/// *For any* daily rule and anchor time, the first computed deadline is
/// strictly in the future relative to the anchor.
#[test]
fn property_construction_yields_strictly_future_deadline() {
    proptest!(|(
        minute in 0u32..60u32,
        hour in 0u32..24u32,
        anchor_secs in 0i64..2_500_000_000i64,
    )| {
        let anchor = Utc.timestamp_opt(anchor_secs, 0).unwrap();
        let expression = format!("{} {} * * *", minute, hour);

        let schedule = CronSchedule::new(&expression, Tz::UTC, anchor).unwrap();
        prop_assert!(schedule.deadline() > anchor);
    });
}

/// *For any* timezone in a representative set, the deadline lands on the
/// requested wall-clock time in that timezone.
#[test]
fn property_deadline_matches_wall_clock_in_timezone() {
    proptest!(|(
        minute in 0u32..60u32,
        hour in 0u32..24u32,
    )| {
        let expression = format!("{} {} * * *", minute, hour);
        let timezones = [
            Tz::UTC,
            chrono_tz::Asia::Ho_Chi_Minh,
            chrono_tz::America::New_York,
            chrono_tz::Europe::London,
        ];

        for tz in timezones {
            let schedule = CronSchedule::new(&expression, tz, anchor()).unwrap();
            let local = schedule.deadline().with_timezone(&tz);
            prop_assert_eq!(local.hour(), hour);
            prop_assert_eq!(local.minute(), minute);
        }
    });
}

/// *For any* sequence of advancing request times, each deadline issued by
/// the schedule is strictly greater than the time it was requested at.
#[test]
fn property_deadline_monotonicity() {
    proptest!(|(
        step in 1u32..30u32,
        offsets in prop::collection::vec(0i64..300i64, 1..8),
    )| {
        let expression = format!("*/{} * * * *", step);
        let mut schedule = CronSchedule::new(&expression, Tz::UTC, anchor()).unwrap();
        prop_assert!(schedule.deadline() > anchor());

        let mut now = anchor();
        for offset in offsets {
            now += Duration::seconds(offset);
            let next = schedule.advance(now).unwrap();
            prop_assert!(next > now);
            prop_assert_eq!(schedule.deadline(), next);
        }
    });
}

/// *For any* number of missed intervals, a late advance lands on the next
/// occurrence after now, skipping everything that was missed.
#[test]
fn property_missed_fires_are_skipped_not_replayed() {
    proptest!(|(missed_hours in 2i64..10i64)| {
        let mut schedule = CronSchedule::new("0 * * * *", Tz::UTC, anchor()).unwrap();
        // Anchored at 10:20, the hourly rule first fires at 11:00.
        let first = schedule.deadline();
        prop_assert_eq!(first, Utc.with_ymd_and_hms(2024, 3, 15, 11, 0, 0).unwrap());

        // Wake up several scheduled intervals late: a single advance jumps
        // straight to the occurrence after now and resumes the cadence.
        let late = first + Duration::hours(missed_hours) + Duration::minutes(30);
        let next = schedule.advance(late).unwrap();
        prop_assert_eq!(next, first + Duration::hours(missed_hours + 1));
        prop_assert!(next > late);
    });
}
