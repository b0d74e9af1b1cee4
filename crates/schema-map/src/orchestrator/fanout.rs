//! Bounded per-table fan-out with a single-owner aggregator.
//!
//! Workers never touch the destination map. Each sends its table's partial
//! result over one channel to an aggregator task that owns the map. The
//! sequence on every exit path is: workers finish, last sender dropped,
//! aggregator drains and returns, caller gets the result.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::{MapError, Result};

/// Fan-out limits for one phase.
#[derive(Debug, Clone)]
pub(crate) struct FanOut {
    pub threads: usize,
    pub channel_buffer: usize,
    pub cancel: CancellationToken,
}

/// Drain the channel into one map. Keeps draining after a duplicate key so
/// no sender is ever left blocked.
async fn aggregate<T>(mut rx: mpsc::Receiver<(String, T)>) -> Result<BTreeMap<String, T>> {
    let mut merged = BTreeMap::new();
    let mut duplicate = None;

    while let Some((table, partial)) = rx.recv().await {
        if merged.contains_key(&table) {
            duplicate.get_or_insert(table);
            continue;
        }
        merged.insert(table, partial);
    }

    match duplicate {
        Some(table) => Err(MapError::Resolution(format!(
            "table {} was resolved twice",
            table
        ))),
        None => Ok(merged),
    }
}

impl FanOut {
    /// Run `work` once per table, at most `threads` at a time.
    ///
    /// The first failure cancels every queued and in-flight task and is
    /// returned on its own; results already merged are discarded.
    pub(crate) async fn run<T, F, Fut>(
        &self,
        phase: &'static str,
        tables: Vec<String>,
        work: F,
    ) -> Result<BTreeMap<String, T>>
    where
        T: Send + 'static,
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let token = self.cancel.child_token();
        let semaphore = Arc::new(Semaphore::new(self.threads.max(1)));
        let (tx, rx) = mpsc::channel::<(String, T)>(self.channel_buffer.max(1));
        let aggregator = tokio::spawn(aggregate(rx));
        let work = Arc::new(work);

        let mut workers = JoinSet::new();
        let mut task_tables = HashMap::new();

        for table in tables {
            let tx = tx.clone();
            let semaphore = semaphore.clone();
            let token = token.clone();
            let work = work.clone();
            let name = table.clone();

            let handle = workers.spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(MapError::Cancelled),
                    permit = semaphore.acquire_owned() => {
                        permit.map_err(|_| MapError::Cancelled)?
                    }
                };

                let partial = tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(MapError::Cancelled),
                    result = work(table.clone()) => result?,
                };

                debug!("{}: {} resolved", phase, table);
                tx.send((table, partial)).await.map_err(|_| {
                    MapError::Resolution(format!("{} aggregator stopped early", phase))
                })
            });
            task_tables.insert(handle.id(), name);
        }

        // Only the workers' clones keep the channel open from here on
        drop(tx);

        let mut first_error: Option<MapError> = None;
        while let Some(joined) = workers.join_next().await {
            let err = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(join_err) => MapError::TaskPanicked {
                    table: task_tables.get(&join_err.id()).cloned().unwrap_or_default(),
                    message: join_err.to_string(),
                },
            };

            if first_error.is_none() {
                if !matches!(err, MapError::Cancelled) {
                    error!("{}: {}", phase, err);
                }
                token.cancel();
                first_error = Some(err);
            }
        }

        let merged = aggregator.await.map_err(|e| MapError::TaskPanicked {
            table: format!("<{} aggregator>", phase),
            message: e.to_string(),
        })?;

        match first_error {
            Some(err) => Err(err),
            None => merged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    fn fan_out(threads: usize) -> FanOut {
        FanOut {
            threads,
            channel_buffer: 1,
            cancel: CancellationToken::new(),
        }
    }

    fn tables(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("T{:02}", i)).collect()
    }

    #[tokio::test]
    async fn test_every_table_merged_once() {
        let merged = fan_out(3)
            .run("test", tables(20), |t| async move { Ok(t.to_lowercase()) })
            .await
            .unwrap();
        assert_eq!(merged.len(), 20);
        assert_eq!(merged["T07"], "t07");
    }

    #[tokio::test]
    async fn test_concurrency_bounded_by_threads() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (a, p) = (active.clone(), peak.clone());
        fan_out(2)
            .run("test", tables(12), move |_| {
                let (a, p) = (a.clone(), p.clone());
                async move {
                    let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                    p.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    a.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await
            .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_failure_cancels_in_flight_and_returns_no_map() {
        let finished_slow = Arc::new(AtomicBool::new(false));
        let flag = finished_slow.clone();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            fan_out(4).run("test", tables(4), move |t| {
                let flag = flag.clone();
                async move {
                    match t.as_str() {
                        "T01" => Err(MapError::catalog(t.clone(), "boom")),
                        "T02" => {
                            tokio::time::sleep(Duration::from_secs(60)).await;
                            flag.store(true, Ordering::SeqCst);
                            Ok(())
                        }
                        _ => Ok(()),
                    }
                }
            }),
        )
        .await
        .expect("fan-out must not hang after a failure");

        match result {
            Err(MapError::CatalogFetch { table, .. }) => assert_eq!(table, "T01"),
            other => panic!("unexpected result {:?}", other.map(|m| m.len())),
        }
        assert!(!finished_slow.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_queued_tables_never_start_after_failure() {
        let started = Arc::new(AtomicUsize::new(0));
        let counter = started.clone();

        let result = fan_out(1)
            .run("test", tables(10), move |t| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if t == "T00" {
                        Err(MapError::catalog(t, "boom"))
                    } else {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(())
                    }
                }
            })
            .await;

        assert!(result.is_err());
        assert!(started.load(Ordering::SeqCst) < 10);
    }

    #[tokio::test]
    async fn test_panic_reports_table() {
        let result: Result<BTreeMap<String, ()>> = fan_out(2)
            .run("test", tables(3), |t| async move {
                if t == "T02" {
                    panic!("worker blew up");
                }
                Ok(())
            })
            .await;

        match result {
            Err(MapError::TaskPanicked { table, .. }) => assert_eq!(table, "T02"),
            other => panic!("unexpected result {:?}", other.map(|m| m.len())),
        }
    }

    #[tokio::test]
    async fn test_parent_cancellation_surfaces_as_cancelled() {
        let fan = fan_out(2);
        fan.cancel.cancel();
        let result = fan.run("test", tables(3), |_| async { Ok(()) }).await;
        assert!(matches!(result, Err(MapError::Cancelled)));
    }

    #[tokio::test]
    async fn test_duplicate_table_is_rejected() {
        let result = fan_out(2)
            .run("test", vec!["A".into(), "A".into()], |_| async { Ok(()) })
            .await;
        assert!(matches!(result, Err(MapError::Resolution(_))));
    }
}
