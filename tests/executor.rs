#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use fitstat::db::db::Db;
    use fitstat::db::executor::{CancelFlag, Cursor, Executor, FromRow};
    use fitstat::db::query::{build, Column, Directive, Field, OrderConfig, Table};
    use fitstat::db::records::{insert_activities, Activity};
    use fitstat::libs::align::DayRow;
    use fitstat::libs::error::{Result, StatsError};
    use fitstat::libs::period::PeriodRow;
    use test_context::{test_context, TestContext};

    struct ExecutorTestContext {
        db: Db,
    }

    impl TestContext for ExecutorTestContext {
        fn setup() -> Self {
            let mut db = Db::in_memory().unwrap();
            let day = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
            let activities = vec![
                Activity::new(1, day(1, 2), "Run", 5000.0),
                Activity::new(2, day(1, 9), "Run", 7000.0),
                Activity::new(3, day(2, 6), "Ride", 30000.0),
            ];
            insert_activities(&mut db.conn, &activities).unwrap();
            ExecutorTestContext { db }
        }
    }

    fn distance_per_month() -> Vec<Field> {
        vec![
            Field::Col(Column::Year),
            Field::Col(Column::Month),
            Field::Sum(Column::Distance),
        ]
    }

    fn group_by_month() -> Directive {
        Directive::WithOrder(
            OrderConfig::new()
                .group(Field::Col(Column::Year))
                .group(Field::Col(Column::Month)),
        )
    }

    #[test_context(ExecutorTestContext)]
    #[test]
    fn test_collects_typed_rows(ctx: &mut ExecutorTestContext) {
        let bound = build(&distance_per_month(), vec![Directive::sports(["Run"]), group_by_month()]).unwrap();
        let rows: Vec<PeriodRow> = Executor::new(&ctx.db.conn).collect(&bound).unwrap();
        assert_eq!(rows, vec![PeriodRow { year: 2024, period: 1, value: 12000.0 }]);
    }

    #[test_context(ExecutorTestContext)]
    #[test]
    fn test_consumer_may_stop_early(ctx: &mut ExecutorTestContext) {
        let first = Executor::new(&ctx.db.conn)
            .build_and_scan(&distance_per_month(), vec![group_by_month()], |rows: &mut Cursor<'_, PeriodRow>| {
                rows.next().transpose()
            })
            .unwrap();
        assert_eq!(first.map(|r| r.period), Some(1));

        // the statement is gone, the connection is free for writes again
        let more = vec![Activity::new(4, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), "Run", 1.0)];
        assert_eq!(insert_activities(&mut ctx.db.conn, &more).unwrap(), 1);
    }

    #[test_context(ExecutorTestContext)]
    #[test]
    fn test_failed_query_carries_text_not_values(ctx: &mut ExecutorTestContext) {
        ctx.db.conn.execute("DROP TABLE steps", []).unwrap();
        let bound = build(
            &[Field::Col(Column::Value)],
            vec![Directive::WithTable(Table::Steps), Directive::years([1987])],
        )
        .unwrap();

        let err = Executor::new(&ctx.db.conn).collect::<DayRow>(&bound).unwrap_err();
        assert!(matches!(err, StatsError::QueryFailed { .. }));
        let message = err.to_string();
        assert!(message.contains("select Value from steps where (Year = ?)"));
        assert!(!message.contains("1987"));
    }

    #[test_context(ExecutorTestContext)]
    #[test]
    fn test_row_shape_mismatch(ctx: &mut ExecutorTestContext) {
        let fields = vec![
            Field::Col(Column::Name),
            Field::Col(Column::Month),
            Field::Col(Column::Day),
            Field::Col(Column::Distance),
        ];
        let bound = build(&fields, vec![]).unwrap();
        let err = Executor::new(&ctx.db.conn).collect::<DayRow>(&bound).unwrap_err();
        assert!(matches!(err, StatsError::ScanMismatch(_)));
    }

    #[test_context(ExecutorTestContext)]
    #[test]
    fn test_cancel_between_rows(ctx: &mut ExecutorTestContext) {
        let flag = CancelFlag::new();
        let bound = build(&distance_per_month(), vec![group_by_month()]).unwrap();
        let executor = Executor::new(&ctx.db.conn).with_cancel(flag.clone());

        let result = executor.scan(&bound, |rows: &mut Cursor<'_, PeriodRow>| {
            let first = rows.next().transpose()?;
            assert!(first.is_some());
            flag.cancel();
            rows.collect::<Result<Vec<_>>>()
        });
        assert!(matches!(result, Err(StatsError::Cancelled)));
    }

    #[test_context(ExecutorTestContext)]
    #[test]
    fn test_cancelled_before_start(ctx: &mut ExecutorTestContext) {
        let flag = CancelFlag::new();
        flag.cancel();
        let bound = build(&distance_per_month(), vec![group_by_month()]).unwrap();
        let err = Executor::new(&ctx.db.conn)
            .with_cancel(flag)
            .collect::<PeriodRow>(&bound)
            .unwrap_err();
        assert!(matches!(err, StatsError::Cancelled));
    }

    #[test]
    fn test_shared_handle_across_threads() {
        let mut db = Db::in_memory().unwrap();
        let runs: Vec<Activity> = (1..=20)
            .map(|i| Activity::new(i, NaiveDate::from_ymd_opt(2023, 5, i as u32).unwrap(), "Run", 1000.0))
            .collect();
        insert_activities(&mut db.conn, &runs).unwrap();
        let shared = db.into_shared();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    let bound = build(&[Field::Count], vec![Directive::sports(["Run"])]).unwrap();
                    shared.with(|conn| {
                        Executor::new(conn).scan(&bound, |rows: &mut Cursor<'_, CountRow>| {
                            rows.map(|r| r.map(|c| c.0)).sum::<Result<i64>>()
                        })
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), 20);
        }
    }

    struct CountRow(i64);

    impl FromRow for CountRow {
        fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
            Ok(CountRow(row.get(0)?))
        }
    }
}
