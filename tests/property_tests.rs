//! Property-based tests for the connection facade
//!
//! These tests verify, for arbitrary inputs, that:
//! - `last_query` always holds the statement text exactly as passed in
//! - bound text values come back unchanged, with or without named sigils
//! - `query_single` always agrees with the first row of `query`

#[cfg(test)]
mod tests {
    use dbal::{ConnectOptions, Dbal, Params, Value};
    use proptest::prelude::*;

    fn memory_db() -> Dbal {
        Dbal::connect(ConnectOptions::in_memory()).unwrap()
    }

    /// A SELECT with arbitrary spacing and a trailing comment
    fn arb_statement() -> impl Strategy<Value = String> {
        ("[ \t\n]{0,3}", "[ \t]{1,4}", "[a-zA-Z0-9 _.,]{0,40}").prop_map(|(lead, gap, comment)| {
            format!("{}SELECT{}1 AS one -- {}", lead, gap, comment)
        })
    }

    fn arb_param_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,15}".prop_map(|s: String| s)
    }

    proptest! {
        /// Whatever the statement text, it is recorded verbatim
        #[test]
        fn prop_last_query_is_verbatim(sql in arb_statement()) {
            let mut dbal = memory_db();
            let set = dbal.query(&sql, ()).unwrap();

            prop_assert_eq!(dbal.last_query(), Some(sql.as_str()));
            prop_assert_eq!(&set.sql, &sql);
            prop_assert_eq!(set.len(), 1);
        }

        /// Failing statements are recorded verbatim as well
        #[test]
        fn prop_failed_query_is_recorded(table in "[a-z]{1,12}") {
            let mut dbal = memory_db();
            let sql = format!("SELECT * FROM missing_{}", table);

            prop_assert!(dbal.query(&sql, ()).is_err());
            prop_assert_eq!(dbal.last_query(), Some(sql.as_str()));
            prop_assert_eq!(dbal.last_error().and_then(|e| e.sql.as_deref()), Some(sql.as_str()));
        }

        /// Named parameters bind with or without the leading colon
        #[test]
        fn prop_named_params_round_trip(
            name in arb_param_name(),
            text in ".{0,64}",
            with_sigil in any::<bool>(),
        ) {
            let mut dbal = memory_db();
            let key = if with_sigil { format!(":{}", name) } else { name.clone() };
            let sql = format!("SELECT :{} AS v", name);

            let row = dbal
                .query_single(&sql, Params::named([(key, text.clone())]))
                .unwrap()
                .unwrap();
            prop_assert_eq!(row.get("v"), Some(&Value::Text(text)));
        }

        /// query_single is exactly the first row of query
        #[test]
        fn prop_query_single_is_first_row(values in prop::collection::vec(any::<i64>(), 0..20)) {
            let mut dbal = memory_db();
            dbal.execute("CREATE TABLE nums (pos INTEGER PRIMARY KEY, n INTEGER)", ()).unwrap();
            for v in &values {
                dbal.execute("INSERT INTO nums (n) VALUES (?)", Params::positional([*v])).unwrap();
            }

            let sql = "SELECT n FROM nums ORDER BY pos";
            let all = dbal.query(sql, ()).unwrap();
            let single = dbal.query_single(sql, ()).unwrap();

            prop_assert_eq!(all.len(), values.len());
            prop_assert_eq!(single.as_ref(), all.first());
        }
    }
}
