//! Unit tests for the loader

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::types::{FieldValue, RawField};
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use serde_json::Value;

    fn record(id: &str, date: Option<&str>) -> RawRecord {
        let mut fields = vec![RawField {
            name: "Outcome".to_string(),
            value: FieldValue::Select("Win".to_string()),
        }];
        if let Some(d) = date {
            fields.push(RawField {
                name: "Date".to_string(),
                value: FieldValue::Date(d.to_string()),
            });
        }
        RawRecord {
            id: id.to_string(),
            fields,
        }
    }

    fn trade_loader(store: Arc<Store>) -> TradeLoader {
        TradeLoader::new(store, LoaderConfig::default(), CacheConfig::default())
    }

    fn macro_loader(store: Arc<Store>, series: Vec<String>) -> MacroLoader {
        let loader = LoaderConfig {
            macro_series: series,
            ..LoaderConfig::default()
        };
        MacroLoader::new(store, loader, CacheConfig::default())
    }

    #[tokio::test]
    async fn test_load_paginates_serially_and_publishes() {
        let mut gateway = MockTradeGateway::new();
        gateway.expect_fetch_page().returning(|cursor| {
            Ok(match cursor.as_deref() {
                None => TradePage {
                    records: vec![
                        record("a", Some("2024-01-01")),
                        record("b", Some("2024-01-02")),
                    ],
                    next_cursor: Some("page-2".to_string()),
                },
                Some("page-2") => TradePage {
                    records: vec![record("c", Some("2024-01-03"))],
                    next_cursor: None,
                },
                other => panic!("unexpected cursor {:?}", other),
            })
        });

        let store = Arc::new(Store::new());
        let progress = Arc::new(Mutex::new(Vec::new()));
        let seen = progress.clone();

        let stats = trade_loader(store.clone())
            .load(&gateway, |count| seen.lock().push(count))
            .await
            .unwrap()
            .expect("fresh load, not a cache hit");

        assert_eq!(stats.trades.len(), 3);
        assert_eq!(*progress.lock(), vec![2, 3], "progress after each page");
        assert!(stats.trades.iter().all(|t| t.grade.is_some()));

        let published: Vec<crate::types::Trade> = store.get_as(keys::TRADES).unwrap();
        assert_eq!(published.len(), 3);
        assert_ne!(store.get(keys::JOURNAL_STATS), Value::Null);
        assert_eq!(
            store.get(keys::AI_CONTEXT)["journalStats"]["totalTrades"],
            serde_json::json!(3)
        );
    }

    #[tokio::test]
    async fn test_undated_records_are_dropped() {
        let mut gateway = MockTradeGateway::new();
        gateway.expect_fetch_page().returning(|_| {
            Ok(TradePage {
                records: vec![record("dated", Some("2024-01-01")), record("undated", None)],
                next_cursor: None,
            })
        });

        let store = Arc::new(Store::new());
        let stats = trade_loader(store.clone())
            .load(&gateway, |_| {})
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.trades.len(), 1);
        assert_eq!(stats.trades[0].id, "dated");
    }

    #[tokio::test]
    async fn test_page_limit_truncates_runaway_cursor() {
        let mut gateway = MockTradeGateway::new();
        gateway.expect_fetch_page().returning(|_| {
            Ok(TradePage {
                records: vec![record("x", Some("2024-01-01"))],
                // Never ends
                next_cursor: Some("again".to_string()),
            })
        });

        let store = Arc::new(Store::new());
        let loader = TradeLoader::new(
            store,
            LoaderConfig {
                max_pages: 3,
                ..LoaderConfig::default()
            },
            CacheConfig::default(),
        );
        let calls = Arc::new(Mutex::new(0usize));
        let counter = calls.clone();
        let stats = loader
            .load(&gateway, |_| *counter.lock() += 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*calls.lock(), 3, "exactly max_pages fetches");
        assert_eq!(stats.trades.len(), 3, "fetched pages are still absorbed");
    }

    #[tokio::test]
    async fn test_mid_chain_failure_leaves_store_untouched() {
        let mut gateway = MockTradeGateway::new();
        gateway.expect_fetch_page().returning(|cursor| match cursor {
            None => Ok(TradePage {
                records: vec![record("a", Some("2024-01-01"))],
                next_cursor: Some("page-2".to_string()),
            }),
            Some(_) => Err(JournalError::Gateway("boom".to_string())),
        });

        let store = Arc::new(Store::new());
        let result = trade_loader(store.clone()).load(&gateway, |_| {}).await;
        assert!(result.is_err());
        assert_eq!(store.get(keys::TRADES), Value::Null);
        assert_eq!(store.get(keys::JOURNAL_STATS), Value::Null);
        assert!(store.is_stale(keys::TRADES, CacheConfig::default().trades_ttl()));
    }

    #[tokio::test]
    async fn test_fresh_cache_short_circuits() {
        // No expectations on the mock: any fetch would panic
        let gateway = MockTradeGateway::new();
        let store = Arc::new(Store::new());
        store.set(keys::TRADES, serde_json::json!([]));

        let result = trade_loader(store).load(&gateway, |_| {}).await.unwrap();
        assert!(result.is_none(), "cache hit performs no fetch");
    }

    #[tokio::test]
    async fn test_macro_partial_failure_is_isolated() {
        let mut gateway = MockSeriesGateway::new();
        gateway.expect_fetch_series().returning(|series| {
            if series == "UNRATE" {
                Err(JournalError::Gateway("series unavailable".to_string()))
            } else {
                Ok(vec![SeriesPoint {
                    date: "2024-01-01".to_string(),
                    value: dec!(3.7),
                }])
            }
        });

        let store = Arc::new(Store::new());
        let loaded = macro_loader(
            store.clone(),
            vec!["CPIAUCSL".to_string(), "UNRATE".to_string()],
        )
        .refresh(&gateway)
        .await
        .unwrap();

        assert_eq!(loaded, 1, "failed series omitted, batch not aborted");
        let slice = store.get(keys::MACRO);
        assert!(slice.get("CPIAUCSL").is_some());
        assert!(slice.get("UNRATE").is_none());
    }

    #[tokio::test]
    async fn test_macro_total_failure_keeps_previous_slice() {
        let mut gateway = MockSeriesGateway::new();
        gateway
            .expect_fetch_series()
            .returning(|_| Err(JournalError::Gateway("down".to_string())));

        let store = Arc::new(Store::new());
        let previous = serde_json::json!({"CPIAUCSL": [{"date": "2023-12-01", "value": 3.1}]});
        store.set(keys::MACRO, previous.clone());

        let loader = MacroLoader::new(
            store.clone(),
            LoaderConfig {
                macro_series: vec!["CPIAUCSL".to_string()],
                ..LoaderConfig::default()
            },
            CacheConfig {
                macro_ttl_secs: 0,
                ..CacheConfig::default()
            },
        );
        let result = loader.refresh(&gateway).await;
        assert!(result.is_err());
        assert_eq!(store.get(keys::MACRO), previous);
    }

    #[tokio::test]
    async fn test_project_risk_publishes_monte_carlo_slice() {
        let mut gateway = MockTradeGateway::new();
        gateway.expect_fetch_page().returning(|_| {
            Ok(TradePage {
                records: vec![
                    record("a", Some("2024-01-01")),
                    record("b", Some("2024-01-02")),
                ],
                next_cursor: None,
            })
        });

        let store = Arc::new(Store::new());
        trade_loader(store.clone())
            .load(&gateway, |_| {})
            .await
            .unwrap();

        let simulator = crate::simulator::MonteCarlo::new(crate::config::SimulatorConfig::default());
        let result = project_risk(&store, &simulator, Some(50)).unwrap();
        assert_eq!(result.trade_count, 2);
        assert_eq!(result.run_count, 50);
        assert!(store.get(keys::MONTE_CARLO).is_object());
    }

    #[test]
    fn test_project_risk_requires_journal_stats() {
        let store = Store::new();
        let simulator = crate::simulator::MonteCarlo::new(crate::config::SimulatorConfig::default());
        let result = project_risk(&store, &simulator, None);
        assert!(matches!(result, Err(JournalError::MissingSlice(_))));
    }

    #[tokio::test]
    async fn test_macro_cache_hit_skips_fetch() {
        let gateway = MockSeriesGateway::new();
        let store = Arc::new(Store::new());
        store.set(keys::MACRO, serde_json::json!({}));

        let loaded = macro_loader(store, vec!["CPIAUCSL".to_string()])
            .refresh(&gateway)
            .await
            .unwrap();
        assert_eq!(loaded, 0);
    }
}
