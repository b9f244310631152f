#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use fitstat::db::db::Db;
    use fitstat::db::executor::Executor;
    use fitstat::db::records::{insert_activities, Activity, Effort};
    use fitstat::libs::period::{
        aggregate_period, best_effort_query, best_efforts, period_query, top, top_query, Measure, Period,
    };
    use test_context::{test_context, TestContext};

    struct PeriodTestContext {
        db: Db,
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn five_k(elapsed_time: i64) -> Effort {
        Effort {
            name: "5k".to_string(),
            elapsed_time,
            moving_time: elapsed_time,
            distance: 5000.0,
        }
    }

    impl TestContext for PeriodTestContext {
        fn setup() -> Self {
            let mut db = Db::in_memory().unwrap();

            let mut a1 = Activity::new(1, date(2022, 5, 1), "Run", 10000.0);
            a1.efforts.push(five_k(1300));
            let mut a2 = Activity::new(2, date(2023, 4, 2), "Run", 10000.0);
            a2.efforts.push(five_k(1250));
            let mut a3 = Activity::new(3, date(2024, 1, 9), "Run", 8000.0);
            a3.efforts.push(five_k(1250));
            let mut ride = Activity::new(4, date(2024, 1, 10), "Ride", 40000.0);
            ride.efforts.push(five_k(500));

            let activities = vec![
                a1,
                a2,
                a3,
                ride,
                Activity::new(5, date(2023, 1, 2), "Run", 5000.0),
                Activity::new(6, date(2023, 1, 3), "Run", 3000.0),
                Activity::new(7, date(2023, 6, 20), "Run", 12000.0),
                Activity::new(8, date(2024, 1, 2), "Run", 4000.0),
            ];
            insert_activities(&mut db.conn, &activities).unwrap();
            PeriodTestContext { db }
        }
    }

    #[test_context(PeriodTestContext)]
    #[test]
    fn test_weekly_distance_from_store(ctx: &mut PeriodTestContext) {
        let years = [2023, 2024];
        let sports = vec!["Run".to_string()];
        let (fields, directives) = period_query(Period::Week, Measure::Distance, &years, &sports);
        let measure = Measure::Distance.field().measure_name();

        let table = Executor::new(&ctx.db.conn)
            .build_and_scan(&fields, directives, |rows| aggregate_period(rows, Period::Week, &years, &measure))
            .unwrap();

        assert_eq!(table.buckets.len(), 53);
        assert_eq!(table.cell(1, 2023), Some(8.0));
        // 2024-01-02 and 2024-01-09 fall in ISO weeks 1 and 2
        assert_eq!(table.cell(1, 2024), Some(4.0));
        assert_eq!(table.cell(2, 2024), Some(8.0));
        assert_eq!(table.cell(3, 2024), None);
        assert_eq!(table.totals.get(&2023), Some(&(5.0 + 3.0 + 10.0 + 12.0)));
    }

    #[test_context(PeriodTestContext)]
    #[test]
    fn test_year_end_run_stays_in_its_own_year(ctx: &mut PeriodTestContext) {
        // ISO puts 2024-12-30 in 2025-W01
        let late = Activity::new(9, date(2024, 12, 30), "Run", 7000.0);
        insert_activities(&mut ctx.db.conn, &[late]).unwrap();
        let years = [2024];
        let sports = vec!["Run".to_string()];
        let measure = Measure::Distance.field().measure_name();

        let (fields, directives) = period_query(Period::Week, Measure::Distance, &years, &sports);
        let table = Executor::new(&ctx.db.conn)
            .build_and_scan(&fields, directives, |rows| aggregate_period(rows, Period::Week, &years, &measure))
            .unwrap();
        assert_eq!(table.cell(1, 2024), Some(4.0));
        assert_eq!(table.cell(53, 2024), Some(7.0));

        let (fields, directives) = top_query(Period::Week, Measure::Distance, &years, &sports, 3);
        let ranked = Executor::new(&ctx.db.conn)
            .build_and_scan(&fields, directives, |rows| top(rows, Period::Week, &measure))
            .unwrap();
        let labels: Vec<String> = ranked.iter().map(|e| e.label()).collect();
        assert_eq!(labels, vec!["2024-W02", "2024-W53", "2024-W01"]);
    }

    #[test_context(PeriodTestContext)]
    #[test]
    fn test_monthly_count_keeps_raw_numbers(ctx: &mut PeriodTestContext) {
        let (fields, directives) = period_query(Period::Month, Measure::Count, &[2024], &[]);
        let measure = Measure::Count.field().measure_name();
        let table = Executor::new(&ctx.db.conn)
            .build_and_scan(&fields, directives, |rows| aggregate_period(rows, Period::Month, &[2024], &measure))
            .unwrap();
        assert_eq!(table.cell(1, 2024), Some(3.0));
    }

    #[test_context(PeriodTestContext)]
    #[test]
    fn test_top_months_break_ties_by_recency(ctx: &mut PeriodTestContext) {
        let sports = vec!["Run".to_string()];
        let (fields, directives) = top_query(Period::Month, Measure::Distance, &[], &sports, 3);
        let measure = Measure::Distance.field().measure_name();
        let ranked = Executor::new(&ctx.db.conn)
            .build_and_scan(&fields, directives, |rows| top(rows, Period::Month, &measure))
            .unwrap();

        let labels: Vec<String> = ranked.iter().map(|e| e.label()).collect();
        assert_eq!(labels, vec!["2024-01", "2023-06", "2023-04"]);
        assert_eq!(ranked[0].value, 12.0);
        assert_eq!(ranked[2].rank, 3);
        // 2023-04 and 2022-05 both hold 10 km; the later year wins the last slot
        assert_eq!(ranked[2].value, 10.0);
    }

    #[test_context(PeriodTestContext)]
    #[test]
    fn test_best_efforts_through_join(ctx: &mut PeriodTestContext) {
        let sports = vec!["Run".to_string()];
        let (fields, directives) = best_effort_query("5k", &[], &sports, 2);
        let efforts = Executor::new(&ctx.db.conn)
            .build_and_scan(&fields, directives, |rows| best_efforts(rows))
            .unwrap();

        assert_eq!(efforts.len(), 2);
        assert_eq!(efforts[0].date, date(2024, 1, 9));
        assert_eq!(efforts[0].activity, "Run 2024-01-09");
        assert_eq!(efforts[0].elapsed_time, 1250);
        assert_eq!(efforts[0].distance, 5.0);
        assert_eq!(efforts[1].date, date(2023, 4, 2));
    }

    #[test_context(PeriodTestContext)]
    #[test]
    fn test_reinsert_replaces_efforts(ctx: &mut PeriodTestContext) {
        let mut again = Activity::new(3, date(2024, 1, 9), "Run", 8000.0);
        again.efforts.push(five_k(1400));
        insert_activities(&mut ctx.db.conn, &[again]).unwrap();

        let (fields, directives) = best_effort_query("5k", &[2024], &["Run".to_string()], 0);
        let efforts = Executor::new(&ctx.db.conn)
            .build_and_scan(&fields, directives, |rows| best_efforts(rows))
            .unwrap();
        assert_eq!(efforts.iter().map(|e| e.elapsed_time).collect::<Vec<_>>(), vec![1400]);
    }
}
