// src/analysis_tests.rs

#[cfg(test)]
mod tests {
    use crate::analysis::*;
    use crate::detail::NO_DETAILS;
    use crate::error::TimesheetError;
    use crate::external::ExternalTimeRecord;
    use crate::timesheet::AttendanceRecord;
    use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const TARGET: Decimal = dec!(9);

    fn d(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .unwrap_or_else(|_| panic!("Invalid date string format: {}", date_str))
    }

    fn t(time_str: &str) -> NaiveTime {
        NaiveTime::parse_from_str(time_str, "%H:%M").unwrap()
    }

    // Helper to create a test attendance record
    fn record(date: &str, first_in: Option<&str>, last_out: Option<&str>, hours: Decimal) -> AttendanceRecord {
        AttendanceRecord {
            date: d(date),
            first_in: first_in.map(t),
            last_out: last_out.map(t),
            clock_in: None,
            clock_out: None,
            hours_worked: hours,
        }
    }

    fn worked(date: &str, hours: Decimal) -> AttendanceRecord {
        record(date, Some("08:00"), Some("17:00"), hours)
    }

    // 2025-01-13 is a Monday (ISO week 3)
    fn full_week_at_target() -> Vec<AttendanceRecord> {
        ["2025-01-13", "2025-01-14", "2025-01-15", "2025-01-16", "2025-01-17"]
            .iter()
            .map(|date| worked(date, TARGET))
            .collect()
    }

    // --- Filtering ---

    #[test]
    fn test_weekends_and_zero_hour_days_are_excluded() {
        let attendance = vec![
            worked("2025-01-18", dec!(5)), // Saturday
            worked("2025-01-19", dec!(3)), // Sunday
            worked("2025-01-20", dec!(0)), // Monday, nothing worked
            worked("2025-01-21", dec!(8)), // Tuesday
        ];
        let bundle = analyze(&attendance, TARGET, None).unwrap();

        let dates: Vec<_> = bundle.daily().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d("2025-01-21")]);
        assert_eq!(bundle.weekly().unwrap().len(), 1);
    }

    #[test]
    fn test_external_hours_do_not_revive_filtered_days() {
        let attendance = vec![worked("2025-01-18", dec!(4)), worked("2025-01-20", dec!(0))];
        let external = vec![
            ExternalTimeRecord::new(d("2025-01-18"), dec!(4)),
            ExternalTimeRecord::new(d("2025-01-20"), dec!(7)),
        ];
        let bundle = analyze(&attendance, TARGET, Some(external.as_slice())).unwrap();
        assert!(bundle.daily().is_empty());
        assert!(bundle.weekly().is_none());
    }

    #[test]
    fn test_empty_attendance_has_no_weekly_rows() {
        let bundle = analyze(&[], TARGET, None).unwrap();
        assert!(bundle.is_empty());
        assert!(bundle.daily().is_empty());
        assert_eq!(bundle.weekly(), None, "no data is not the same as an empty week list");
        assert_eq!(bundle.daily_target(), TARGET);
        assert!(bundle.detail_by_date().is_empty());
    }

    // --- Daily rollup ---

    #[test]
    fn test_duplicate_dates_are_merged() {
        let attendance = vec![
            record("2025-01-14", Some("13:00"), Some("18:15"), dec!(5.25)),
            record("2025-01-14", Some("07:45"), Some("12:00"), dec!(4.25)),
            record("2025-01-14", None, None, dec!(0.5)),
        ];
        let bundle = analyze(&attendance, TARGET, None).unwrap();
        let day = &bundle.daily()[0];

        assert_eq!(bundle.daily().len(), 1);
        assert_eq!(day.first_in, Some(t("07:45")));
        assert_eq!(day.last_out, Some(t("18:15")));
        assert_eq!(day.hours, dec!(10));
        assert_eq!(day.day_of_week, "Tuesday");
        assert!(day.on_target);
        assert_eq!(day.difference, dec!(1));
        assert_eq!(day.difference_formatted, "+1h");
        assert_eq!(day.span_hours, dec!(10.5));
    }

    #[test]
    fn test_missing_presence_times_stay_absent() {
        let attendance = vec![record("2025-01-14", None, Some("16:00"), dec!(7.5))];
        let bundle = analyze(&attendance, TARGET, None).unwrap();
        let day = &bundle.daily()[0];

        assert_eq!(day.first_in, None);
        assert_eq!(day.last_out, Some(t("16:00")));
        assert_eq!(day.span_hours, Decimal::ZERO);
        assert!(!day.on_target);
        assert_eq!(day.difference, dec!(-1.5));
        assert_eq!(day.hours_formatted, "7h 30min");
        assert_eq!(day.difference_formatted, "-1h 30min");
    }

    #[test]
    fn test_exactly_target_counts_as_on_target() {
        let bundle = analyze(&[worked("2025-01-14", dec!(9.00))], TARGET, None).unwrap();
        assert!(bundle.daily()[0].on_target);
        assert_eq!(bundle.daily()[0].difference_formatted, "+0min");
    }

    #[test]
    fn test_daily_rows_most_recent_first() {
        let attendance = vec![
            worked("2025-01-06", dec!(8)),
            worked("2025-01-15", dec!(8)),
            worked("2025-01-10", dec!(8)),
        ];
        let bundle = analyze(&attendance, TARGET, None).unwrap();
        let dates: Vec<_> = bundle.daily().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d("2025-01-15"), d("2025-01-10"), d("2025-01-06")]);
    }

    // --- External join ---

    #[test]
    fn test_external_records_are_summed_per_date() {
        let attendance = vec![worked("2025-01-14", dec!(8)), worked("2025-01-15", dec!(8))];
        let external = vec![
            ExternalTimeRecord::new(d("2025-01-14"), dec!(1.5))
                .description("Standup")
                .project("Ops"),
            ExternalTimeRecord::new(d("2025-01-14"), dec!(6)).description("Feature work"),
            ExternalTimeRecord::new(d("2025-01-14"), dec!(0.25)),
        ];
        let bundle = analyze(&attendance, TARGET, Some(external.as_slice())).unwrap();

        let tuesday = bundle.daily().iter().find(|r| r.date == d("2025-01-14")).unwrap();
        assert_eq!(tuesday.external_hours, dec!(7.75));
        assert_eq!(tuesday.external_hours_formatted, "7h 45min");
        assert_eq!(tuesday.detail_entries.len(), 3);
        assert_eq!(tuesday.detail_entries[0].project, "Ops");
        assert_eq!(tuesday.detail_entries[1].project, "No project");
        assert_eq!(tuesday.detail_text(), "• Standup\n• Feature work");

        let wednesday = bundle.daily().iter().find(|r| r.date == d("2025-01-15")).unwrap();
        assert_eq!(wednesday.external_hours, Decimal::ZERO);
        assert!(wednesday.detail_entries.is_empty());
        assert_eq!(wednesday.detail_text(), NO_DETAILS);
    }

    #[test]
    fn test_external_only_dates_are_not_promoted() {
        let attendance = vec![worked("2025-01-14", dec!(8))];
        let external = vec![
            ExternalTimeRecord::new(d("2025-01-14"), dec!(8)),
            ExternalTimeRecord::new(d("2025-01-16"), dec!(8)),
        ];
        let bundle = analyze(&attendance, TARGET, Some(external.as_slice())).unwrap();

        assert_eq!(bundle.daily().len(), 1);
        assert_eq!(bundle.daily()[0].date, d("2025-01-14"));
        let week = &bundle.weekly().unwrap()[0];
        assert_eq!(week.external_hours, dec!(8));
    }

    #[test]
    fn test_detail_by_date_uses_iso_dates() {
        let attendance = vec![worked("2025-01-14", dec!(8)), worked("2025-01-15", dec!(8))];
        let external = vec![ExternalTimeRecord::new(d("2025-01-14"), dec!(2)).description("Review")];
        let details = analyze(&attendance, TARGET, Some(external.as_slice()))
            .unwrap()
            .detail_by_date();

        assert_eq!(details.len(), 2);
        assert_eq!(details["2025-01-14"], "• Review");
        assert_eq!(details["2025-01-15"], NO_DETAILS);
    }

    // --- Weekly rollup ---

    #[test]
    fn test_full_week_at_target() {
        let bundle = analyze(&full_week_at_target(), TARGET, None).unwrap();

        assert_eq!(bundle.daily().len(), 5);
        assert!(bundle.daily().iter().all(|r| r.on_target));

        let weekly = bundle.weekly().unwrap();
        assert_eq!(weekly.len(), 1);
        let week = &weekly[0];
        assert_eq!((week.iso_year, week.week), (2025, 3));
        assert_eq!(week.work_days, 5);
        assert_eq!(week.on_target_days, 5);
        assert_eq!(week.hours, dec!(45));
        assert_eq!(week.target_hours, dec!(45));
        assert_eq!(week.weekly_difference, Decimal::ZERO);
        assert_eq!(week.avg_daily_hours, dec!(9));
        assert_eq!(week.on_target_percentage, dec!(100));
        assert_eq!(week.on_target_percentage_formatted, "100.0%");
        assert_eq!(week.weekly_difference_formatted, "+0min");
    }

    #[test]
    fn test_partial_week_figures() {
        let attendance = vec![
            worked("2025-01-13", dec!(9.5)),
            worked("2025-01-14", dec!(7)),
            worked("2025-01-15", dec!(8)),
        ];
        let week = analyze(&attendance, TARGET, None).unwrap().weekly().unwrap()[0].clone();

        assert_eq!(week.work_days, 3);
        assert_eq!(week.on_target_days, 1);
        assert_eq!(week.hours, dec!(24.5));
        assert_eq!(week.target_hours, dec!(27));
        assert_eq!(week.weekly_difference, dec!(-2.5));
        assert_eq!(week.weekly_difference_formatted, "-2h 30min");
        assert_eq!(week.hours_formatted, "24h 30min");
        assert_eq!(week.target_hours_formatted, "27h");
        assert_eq!(week.avg_daily_hours_formatted, "8h 10min");
        assert_eq!(week.on_target_percentage_formatted, "33.3%");
    }

    #[test]
    fn test_weeks_are_keyed_by_iso_year_and_week() {
        // 2024-01-03 and 2025-01-01 are both ISO week 1, different ISO years.
        // 2024-12-30 belongs to ISO week 1 of 2025.
        let attendance = vec![
            worked("2024-01-03", dec!(8)),
            worked("2024-12-30", dec!(8)),
            worked("2025-01-01", dec!(8)),
        ];
        let bundle = analyze(&attendance, TARGET, None).unwrap();
        let weekly = bundle.weekly().unwrap();

        let keys: Vec<_> = weekly.iter().map(|w| (w.iso_year, w.week, w.work_days)).collect();
        assert_eq!(keys, vec![(2025, 1, 2), (2024, 1, 1)]);
    }

    #[test]
    fn test_weekly_rows_most_recent_first() {
        let attendance = vec![
            worked("2025-01-06", dec!(8)),
            worked("2025-01-20", dec!(8)),
            worked("2025-01-13", dec!(8)),
        ];
        let bundle = analyze(&attendance, TARGET, None).unwrap();
        let weeks: Vec<_> = bundle.weekly().unwrap().iter().map(|w| w.week).collect();
        assert_eq!(weeks, vec![4, 3, 2]);
    }

    #[test]
    fn test_summary_totals() {
        let attendance = vec![worked("2025-01-13", dec!(10)), worked("2025-01-14", dec!(6.5))];
        let bundle = analyze(&attendance, TARGET, None).unwrap();
        let summary = bundle.summary();

        assert_eq!(summary.work_days, 2);
        assert_eq!(summary.on_target_days, 1);
        assert_eq!(summary.hours, dec!(16.5));
        assert_eq!(summary.target_hours, dec!(18));
        assert_eq!(summary.difference, dec!(-1.5));
    }

    // --- Overflow ---

    #[test]
    fn test_same_day_hours_overflow_is_an_error() {
        let attendance = vec![worked("2025-01-14", Decimal::MAX), worked("2025-01-14", Decimal::MAX)];
        match analyze(&attendance, TARGET, None) {
            Err(TimesheetError::HoursOverflow(what)) => assert!(what.contains("2025-01-14")),
            other => panic!("Expected HoursOverflow but got: {:?}", other),
        }
    }

    #[test]
    fn test_weekly_hours_overflow_is_an_error() {
        let attendance = vec![worked("2025-01-13", Decimal::MAX), worked("2025-01-14", Decimal::MAX)];
        match analyze(&attendance, TARGET, None) {
            Err(TimesheetError::HoursOverflow(what)) => assert_eq!(what, "week 2025-W03"),
            other => panic!("Expected HoursOverflow but got: {:?}", other),
        }
    }

    #[test]
    fn test_tracked_hours_overflow_is_an_error() {
        let attendance = vec![worked("2025-01-14", dec!(8))];
        let external = vec![
            ExternalTimeRecord::new(d("2025-01-14"), Decimal::MAX),
            ExternalTimeRecord::new(d("2025-01-14"), Decimal::MAX),
        ];
        assert!(matches!(
            analyze(&attendance, TARGET, Some(external.as_slice())),
            Err(TimesheetError::HoursOverflow(_))
        ));
    }

    // --- Randomized properties (seeded, deterministic) ---

    fn random_attendance(rng: &mut StdRng) -> Vec<AttendanceRecord> {
        let start = d("2024-12-02");
        let count = rng.gen_range(0..40);
        (0..count)
            .map(|_| {
                let date = start + Duration::days(rng.gen_range(0..70));
                // Quarter-hour steps, a fair share of zeros
                let hours = if rng.gen_bool(0.2) {
                    Decimal::ZERO
                } else {
                    Decimal::from(rng.gen_range(1..=48i64)) / dec!(4)
                };
                let first_in = NaiveTime::from_hms_opt(rng.gen_range(6..10), rng.gen_range(0..60), 0);
                let last_out = NaiveTime::from_hms_opt(rng.gen_range(14..20), rng.gen_range(0..60), 0);
                AttendanceRecord {
                    date,
                    first_in: first_in.filter(|_| rng.gen_bool(0.9)),
                    last_out: last_out.filter(|_| rng.gen_bool(0.9)),
                    clock_in: None,
                    clock_out: None,
                    hours_worked: hours,
                }
            })
            .collect()
    }

    fn random_target(rng: &mut StdRng) -> Decimal {
        Decimal::from(rng.gen_range(24..=44i64)) / dec!(4)
    }

    #[test]
    fn property_weekend_and_zero_hour_records_never_surface() {
        let mut rng = StdRng::seed_from_u64(0x7153);
        for _ in 0..200 {
            let attendance = random_attendance(&mut rng);
            let bundle = analyze(&attendance, random_target(&mut rng), None).unwrap();

            for row in bundle.daily() {
                assert!(!matches!(row.date.weekday(), Weekday::Sat | Weekday::Sun));
                assert!(row.hours > Decimal::ZERO);
                assert!(attendance
                    .iter()
                    .any(|r| r.date == row.date && r.hours_worked > Decimal::ZERO));
            }
            let expected_dates: std::collections::BTreeSet<_> = attendance
                .iter()
                .filter(|r| is_workday(r.date) && r.hours_worked > Decimal::ZERO)
                .map(|r| r.date)
                .collect();
            assert_eq!(bundle.daily().len(), expected_dates.len());
        }
    }

    #[test]
    fn property_weekly_figures_are_consistent() {
        let mut rng = StdRng::seed_from_u64(0x9e37);
        for _ in 0..200 {
            let attendance = random_attendance(&mut rng);
            let target = random_target(&mut rng);
            let bundle = analyze(&attendance, target, None).unwrap();

            let Some(weekly) = bundle.weekly() else {
                assert!(bundle.daily().is_empty());
                continue;
            };
            let total_days: usize = weekly.iter().map(|w| w.work_days).sum();
            assert_eq!(total_days, bundle.daily().len());

            for week in weekly {
                assert!(week.work_days > 0);
                assert_eq!(week.target_hours, Decimal::from(week.work_days) * target);
                assert_eq!(week.weekly_difference, week.hours - week.target_hours);
                assert!(week.on_target_percentage >= Decimal::ZERO);
                assert!(week.on_target_percentage <= dec!(100));
                assert!(week.on_target_days <= week.work_days);
            }
            for pair in weekly.windows(2) {
                assert!((pair[0].iso_year, pair[0].week) > (pair[1].iso_year, pair[1].week));
            }
        }
    }

    #[test]
    fn property_analysis_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(0x51ed);
        for _ in 0..50 {
            let attendance = random_attendance(&mut rng);
            let target = random_target(&mut rng);
            let mut external = Vec::new();
            for r in &attendance {
                if rng.gen_bool(0.5) {
                    let hours = Decimal::from(rng.gen_range(1..=16i64)) / dec!(4);
                    external.push(ExternalTimeRecord::new(r.date, hours).description("Tracked"));
                }
            }

            let first = analyze(&attendance, target, Some(external.as_slice())).unwrap();
            let second = analyze(&attendance, target, Some(external.as_slice())).unwrap();
            assert_eq!(first, second);
            assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        }
    }
}
