#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use fitstat::db::db::Db;
    use fitstat::db::executor::Executor;
    use fitstat::db::records::{insert_activities, insert_daily, Activity, DailyMetric};
    use fitstat::libs::align::{align, series_query, smooth, FillPolicy, SeriesMetric};
    use test_context::{test_context, TestContext};

    struct AlignTestContext {
        db: Db,
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    impl TestContext for AlignTestContext {
        fn setup() -> Self {
            let mut db = Db::in_memory().unwrap();
            let activities = vec![
                Activity::new(1, date(2023, 1, 1), "Run", 5000.0),
                Activity::new(2, date(2023, 1, 3), "Run", 2500.0),
                Activity::new(3, date(2023, 1, 3), "Run", 1500.0),
                Activity::new(4, date(2024, 1, 2), "Run", 3000.0),
                Activity::new(5, date(2024, 1, 2), "Ride", 20000.0),
            ];
            insert_activities(&mut db.conn, &activities).unwrap();
            insert_daily(
                &mut db.conn,
                DailyMetric::HeartRate,
                &[(date(2024, 1, 1), 10.0), (date(2024, 1, 4), 12.0), (date(2023, 1, 2), 50.0)],
            )
            .unwrap();
            insert_daily(
                &mut db.conn,
                DailyMetric::Steps,
                &[(date(2024, 1, 1), 1000.0), (date(2024, 1, 2), 500.0), (date(2024, 1, 4), 700.0)],
            )
            .unwrap();
            AlignTestContext { db }
        }
    }

    fn run_series(
        ctx: &AlignTestContext,
        metric: SeriesMetric,
        years: &[i32],
        until: Option<(u32, u32)>,
    ) -> fitstat::libs::align::AlignedSeries {
        let (fields, directives) = series_query(metric, years, &["Run".to_string()], until);
        Executor::new(&ctx.db.conn)
            .build_and_scan(&fields, directives, |rows| align(rows, years, metric.policy()))
            .unwrap()
            .scale(metric.scale())
    }

    #[test_context(AlignTestContext)]
    #[test]
    fn test_cumulative_distance_per_year(ctx: &mut AlignTestContext) {
        let series = run_series(ctx, SeriesMetric::Distance, &[2023, 2024], None);
        assert_eq!(series.get(2023).unwrap(), &[5.0, 5.0, 9.0]);
        assert_eq!(series.get(2024).unwrap(), &[0.0, 3.0]);
    }

    #[test_context(AlignTestContext)]
    #[test]
    fn test_heart_rate_carries_forward(ctx: &mut AlignTestContext) {
        let series = run_series(ctx, SeriesMetric::HeartRate, &[2024], None);
        assert_eq!(series.get(2024).unwrap(), &[10.0, 10.0, 10.0, 12.0]);
        assert_eq!(series.years(), vec![2024]);
    }

    #[test_context(AlignTestContext)]
    #[test]
    fn test_heart_rate_tails_padded_across_years(ctx: &mut AlignTestContext) {
        let series = run_series(ctx, SeriesMetric::HeartRate, &[2023, 2024], None);
        assert_eq!(series.get(2023).unwrap(), &[0.0, 50.0, 50.0, 50.0]);
        assert_eq!(series.get(2024).unwrap().len(), 4);
    }

    #[test_context(AlignTestContext)]
    #[test]
    fn test_steps_running_total_with_cutoff(ctx: &mut AlignTestContext) {
        let series = run_series(ctx, SeriesMetric::Steps, &[2024], Some((1, 2)));
        assert_eq!(series.get(2024).unwrap(), &[1000.0, 1500.0]);

        let series = run_series(ctx, SeriesMetric::Steps, &[2024], None);
        assert_eq!(series.get(2024).unwrap(), &[1000.0, 1500.0, 1500.0, 2200.0]);
    }

    #[test_context(AlignTestContext)]
    #[test]
    fn test_missing_years_are_reported(ctx: &mut AlignTestContext) {
        let series = run_series(ctx, SeriesMetric::Distance, &[2019, 2023], None);
        assert_eq!(series.present(&[2019, 2023]), vec![2023]);
        assert!(series.get(2019).is_none());
    }

    #[test_context(AlignTestContext)]
    #[test]
    fn test_smoothing_store_series(ctx: &mut AlignTestContext) {
        let series = run_series(ctx, SeriesMetric::HeartRate, &[2024], None);
        let smoothed = smooth(&series, 2);
        assert_eq!(smoothed.get(2024).unwrap(), &[10.0, 10.0, 10.0, 11.0]);
        assert_eq!(SeriesMetric::HeartRate.policy(), FillPolicy::CarryForward);
    }
}
