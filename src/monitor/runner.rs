//! Probing scheduler.
//!
//! # Responsibilities
//! - Run one pass immediately, then one per interval until shutdown
//! - Fan out one probe per target, bounded by a semaphore
//! - Per target: probe, classify, persist, consult the throttle, alert
//!
//! # Design Decisions
//! - A pass finishes before the next tick is considered (no overlap)
//! - Late ticks are delayed, not queued, when a pass overruns the interval
//! - Store and alert failures are logged and counted, never propagated
//! - On shutdown, in-flight probes are detached and end on their own deadline

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::{broadcast, Semaphore};
use tokio::time::{self, MissedTickBehavior};

use crate::alert::AlertDispatcher;
use crate::config::MonitorSettings;
use crate::monitor::classifier::classify;
use crate::monitor::message;
use crate::monitor::prober::Probe;
use crate::monitor::throttle::Throttle;
use crate::monitor::types::{AlertKind, HealthState, Observation, Target, Verdict};
use crate::observability::metrics;
use crate::store::Store;

/// Drives repeated probing passes over every registered target.
#[derive(Clone)]
pub struct Runner {
    store: Arc<dyn Store>,
    probe: Arc<dyn Probe>,
    throttle: Arc<Throttle>,
    alerts: AlertDispatcher,
    interval: Duration,
    max_concurrency: usize,
    alert_on_recovery: bool,
}

impl Runner {
    pub fn new(
        store: Arc<dyn Store>,
        probe: Arc<dyn Probe>,
        alerts: AlertDispatcher,
        settings: &MonitorSettings,
    ) -> Self {
        Self {
            store,
            probe,
            throttle: Arc::new(Throttle::new(settings.throttle_window())),
            alerts,
            interval: settings.interval(),
            max_concurrency: settings.max_concurrency.max(1),
            alert_on_recovery: settings.alert_on_recovery,
        }
    }

    pub fn throttle(&self) -> &Arc<Throttle> {
        &self.throttle
    }

    /// Run passes until `shutdown` fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            max_concurrency = self.max_concurrency,
            alert_on_recovery = self.alert_on_recovery,
            channels = self.alerts.channel_count(),
            "Monitor runner starting"
        );

        // The first tick completes immediately.
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => {
                    tracing::info!("Monitor runner received shutdown signal, exiting loop");
                    break;
                }
            }

            tokio::select! {
                _ = self.run_once() => {}
                _ = shutdown.recv() => {
                    tracing::info!("Monitor runner received shutdown signal mid-pass, detaching in-flight probes");
                    break;
                }
            }
        }
    }

    /// Probe every target once and wait for all of them.
    pub async fn run_once(&self) {
        let started = std::time::Instant::now();

        let targets = match self.store.list_targets().await {
            Ok(targets) => targets,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list targets, skipping pass");
                metrics::record_pass_skipped();
                return;
            }
        };
        let count = targets.len();

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(count);

        for target in targets {
            // Block for a slot before spawning.
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let runner = self.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                runner.check_target(target).await;
            }));
        }

        for result in join_all(handles).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Probe worker failed");
            }
        }

        metrics::record_pass(count, started);
        metrics::record_throttle_entries(self.throttle.len());
        tracing::debug!(
            targets = count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pass complete"
        );
    }

    async fn check_target(&self, target: Target) {
        metrics::record_in_flight(1.0);
        let observation = self.probe.probe(&target).await;
        metrics::record_in_flight(-1.0);

        let verdict = classify(&observation, &target);
        metrics::record_probe(verdict.state.as_str(), observation.latency_ms);
        tracing::debug!(
            target_id = target.id,
            url = %target.url,
            state = %verdict.state,
            status = %observation.status_label(),
            latency_ms = observation.latency_label(),
            "Probe complete"
        );

        if let Err(e) = self.store.insert_observation(observation.clone()).await {
            tracing::warn!(target_id = target.id, url = %target.url, error = %e, "Failed to store observation");
            metrics::record_store_failure("insert_observation");
        }

        match verdict.kind {
            Some(kind) => self.handle_failure(&target, kind, &verdict, &observation).await,
            None => self.handle_ok(&target, &observation).await,
        }
    }

    async fn handle_failure(&self, target: &Target, kind: AlertKind, verdict: &Verdict, observation: &Observation) {
        let decision = self.throttle.decide(&target.url, kind, verdict.state);

        if decision.notify {
            tracing::warn!(
                target_id = target.id,
                url = %target.url,
                kind = %kind,
                reason = %verdict.reason,
                "Target unhealthy"
            );
            self.alerts
                .dispatch(&message::failure_alert(target, kind, verdict, observation))
                .await;
        }

        // Never set for a non-OK state with the current throttle.
        if decision.recovery && self.alert_on_recovery {
            self.alerts
                .dispatch(&message::interim_recovery_alert(target, kind, verdict, observation))
                .await;
        }
    }

    async fn handle_ok(&self, target: &Target, observation: &Observation) {
        let down = self.throttle.decide(&target.url, AlertKind::Down, HealthState::Ok);
        let slow = self.throttle.decide(&target.url, AlertKind::Slow, HealthState::Ok);

        if !(down.recovery || slow.recovery) {
            return;
        }

        let recovered = if slow.recovery && !down.recovery {
            AlertKind::Slow
        } else {
            AlertKind::Down
        };
        tracing::info!(target_id = target.id, url = %target.url, recovered = %recovered, "Target recovered");

        if self.alert_on_recovery {
            self.alerts
                .dispatch(&message::recovery_alert(target, recovered, observation))
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{Alert, Notifier, NotifyError, Severity};
    use crate::store::{MemoryStore, NewTarget, ObservationStore, StoreError, TargetStatus, TargetStore, ThresholdUpdate};
    use crate::monitor::types::TargetId;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<Alert>>,
    }

    impl Recording {
        fn alerts(&self) -> Vec<Alert> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for Recording {
        fn channel(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, alert: &Alert) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    /// Counts delivery attempts and fails every one of them.
    #[derive(Default)]
    struct Failing {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for Failing {
        fn channel(&self) -> &'static str {
            "failing"
        }

        async fn send(&self, _alert: &Alert) -> Result<(), NotifyError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(NotifyError::Rejected { status: 502 })
        }
    }

    /// Replays (status, latency) pairs; `None` status is a transport error.
    struct Scripted {
        script: Mutex<VecDeque<(Option<u16>, u64)>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(steps: &[(Option<u16>, u64)]) -> Self {
            Self {
                script: Mutex::new(steps.iter().copied().collect()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Probe for Scripted {
        async fn probe(&self, target: &Target) -> Observation {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (status, latency) = self.script.lock().unwrap().pop_front().unwrap_or((Some(200), 1));
            Observation {
                target_id: target.id,
                status_code: status,
                latency_ms: Some(latency),
                ok: status == Some(target.expected_status),
                error: if status.is_none() { Some("connection refused".into()) } else { None },
                observed_at: Utc::now(),
            }
        }
    }

    struct Counting {
        current: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl Counting {
        fn new(delay: Duration) -> Self {
            Self {
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
                delay,
            }
        }
    }

    #[async_trait]
    impl Probe for Counting {
        async fn probe(&self, target: &Target) -> Observation {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Observation {
                target_id: target.id,
                status_code: Some(200),
                latency_ms: Some(self.delay.as_millis() as u64),
                ok: true,
                error: None,
                observed_at: Utc::now(),
            }
        }
    }

    /// Lists a fixed target but cannot write observations, or cannot list at all.
    struct BrokenStore {
        list_fails: bool,
    }

    #[async_trait]
    impl TargetStore for BrokenStore {
        async fn list_targets(&self) -> Result<Vec<Target>, StoreError> {
            if self.list_fails {
                return Err(StoreError::Unavailable("connection reset".into()));
            }
            Ok(vec![Target {
                id: 1,
                url: "http://x".into(),
                expected_status: 200,
                slow_threshold_ms: 2000,
                created_at: Utc::now(),
            }])
        }

        async fn get_target(&self, id: TargetId) -> Result<Target, StoreError> {
            Err(StoreError::NotFound(id))
        }

        async fn upsert_target(&self, _new: NewTarget) -> Result<Target, StoreError> {
            Err(StoreError::Unavailable("read only".into()))
        }

        async fn update_thresholds(&self, id: TargetId, _update: ThresholdUpdate) -> Result<Target, StoreError> {
            Err(StoreError::NotFound(id))
        }
    }

    #[async_trait]
    impl ObservationStore for BrokenStore {
        async fn insert_observation(&self, _observation: Observation) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk full".into()))
        }

        async fn recent_observations(&self, _target_id: TargetId, _limit: usize) -> Result<Vec<Observation>, StoreError> {
            Ok(Vec::new())
        }

        async fn latest_status(&self) -> Result<Vec<TargetStatus>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn settings(alert_on_recovery: bool) -> MonitorSettings {
        MonitorSettings {
            alert_on_recovery,
            ..MonitorSettings::default()
        }
    }

    async fn store_with(urls: &[&str]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new(100));
        for url in urls {
            store
                .upsert_target(NewTarget {
                    url: url.to_string(),
                    expected_status: 200,
                    slow_threshold_ms: 2000,
                })
                .await
                .unwrap();
        }
        store
    }

    fn runner(store: Arc<dyn Store>, probe: Arc<dyn Probe>, notifier: Arc<Recording>, alert_on_recovery: bool) -> Runner {
        Runner::new(
            store,
            probe,
            AlertDispatcher::new(vec![notifier as Arc<dyn Notifier>]),
            &settings(alert_on_recovery),
        )
    }

    #[tokio::test]
    async fn test_down_then_recovery_scenario() {
        let store = store_with(&["http://x"]).await;
        let probe = Arc::new(Scripted::new(&[
            (Some(200), 50),
            (Some(500), 10),
            (Some(500), 10),
            (Some(200), 50),
        ]));
        let notifier = Arc::new(Recording::default());
        let runner = runner(store.clone(), probe, notifier.clone(), true);

        runner.run_once().await;
        assert!(notifier.alerts().is_empty());
        assert_eq!(runner.throttle().last_state("http://x", AlertKind::Down), Some(HealthState::Ok));

        runner.run_once().await;
        let alerts = notifier.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Down);
        assert_eq!(alerts[0].subject, "🔴 [DOWN] http://x - unexpected status 500");
        assert_eq!(runner.throttle().last_state("http://x", AlertKind::Down), Some(HealthState::Down));

        runner.run_once().await;
        assert_eq!(notifier.alerts().len(), 1, "repeat within the window is silent");

        runner.run_once().await;
        let alerts = notifier.alerts();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[1].severity, Severity::Recovered);
        assert_eq!(alerts[1].text, "http://x | RECOVERED from DOWN | status=200 latency=50ms");

        // Every probe was persisted.
        assert_eq!(store.recent_observations(1, 10).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_recovery_is_silent_when_disabled() {
        let store = store_with(&["http://x"]).await;
        let probe = Arc::new(Scripted::new(&[(None, 5000), (Some(200), 50)]));
        let notifier = Arc::new(Recording::default());
        let runner = runner(store, probe, notifier.clone(), false);

        runner.run_once().await;
        runner.run_once().await;

        let alerts = notifier.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].subject, "🔴 [DOWN] http://x - timeout/error");
        // The throttle still records the recovery.
        assert_eq!(runner.throttle().last_state("http://x", AlertKind::Down), Some(HealthState::Ok));
    }

    #[tokio::test]
    async fn test_slow_recovery_label() {
        let store = store_with(&["http://x"]).await;
        let probe = Arc::new(Scripted::new(&[(Some(200), 2500), (Some(200), 50)]));
        let notifier = Arc::new(Recording::default());
        let runner = runner(store, probe, notifier.clone(), true);

        runner.run_once().await;
        runner.run_once().await;

        let alerts = notifier.alerts();
        assert_eq!(alerts.len(), 2);
        assert!(alerts[0].subject.starts_with("🟡 [SLOW] http://x"));
        assert!(alerts[1].text.contains("RECOVERED from SLOW"));
    }

    #[tokio::test]
    async fn test_joint_recovery_sends_one_alert_labelled_down() {
        let store = store_with(&["http://x"]).await;
        let probe = Arc::new(Scripted::new(&[(Some(200), 2500), (Some(503), 10), (Some(200), 50)]));
        let notifier = Arc::new(Recording::default());
        let runner = runner(store, probe, notifier.clone(), true);

        runner.run_once().await;
        runner.run_once().await;
        runner.run_once().await;

        let alerts = notifier.alerts();
        let severities: Vec<_> = alerts.iter().map(|a| a.severity).collect();
        assert_eq!(severities, vec![Severity::Slow, Severity::Down, Severity::Recovered]);
        assert!(alerts[2].text.contains("RECOVERED from DOWN"));
        assert_eq!(runner.throttle().last_state("http://x", AlertKind::Slow), Some(HealthState::Ok));
    }

    #[tokio::test]
    async fn test_concurrency_ceiling() {
        let urls: Vec<String> = (0..50).map(|i| format!("http://t{}.test", i)).collect();
        let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let store = store_with(&refs).await;
        let probe = Arc::new(Counting::new(Duration::from_millis(20)));
        let notifier = Arc::new(Recording::default());

        let mut settings = settings(false);
        settings.max_concurrency = 20;
        let runner = Runner::new(store, probe.clone(), AlertDispatcher::new(vec![notifier as Arc<dyn Notifier>]), &settings);

        runner.run_once().await;

        // run_once returns only after every worker has finished.
        assert_eq!(probe.calls.load(Ordering::SeqCst), 50);
        assert_eq!(probe.current.load(Ordering::SeqCst), 0);
        let peak = probe.peak.load(Ordering::SeqCst);
        assert!(peak <= 20, "peak in-flight probes was {}", peak);
    }

    #[tokio::test]
    async fn test_store_failure_does_not_block_alerting() {
        let probe = Arc::new(Scripted::new(&[(Some(500), 10)]));
        let notifier = Arc::new(Recording::default());
        let runner = runner(Arc::new(BrokenStore { list_fails: false }), probe, notifier.clone(), false);

        runner.run_once().await;
        assert_eq!(notifier.alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_throttle_state() {
        let store = store_with(&["http://x"]).await;
        let probe = Arc::new(Scripted::new(&[(Some(500), 10), (Some(500), 10), (Some(200), 50)]));
        let notifier = Arc::new(Failing::default());
        let runner = Runner::new(
            store,
            probe,
            AlertDispatcher::new(vec![notifier.clone() as Arc<dyn Notifier>]),
            &settings(true),
        );

        runner.run_once().await;
        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(runner.throttle().last_state("http://x", AlertKind::Down), Some(HealthState::Down));

        // Same state inside the window: no resend of the failed alert.
        runner.run_once().await;
        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 1);

        runner.run_once().await;
        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(runner.throttle().last_state("http://x", AlertKind::Down), Some(HealthState::Ok));
    }

    #[tokio::test]
    async fn test_list_failure_skips_pass() {
        let probe = Arc::new(Scripted::new(&[]));
        let notifier = Arc::new(Recording::default());
        let runner = runner(Arc::new(BrokenStore { list_fails: true }), probe.clone(), notifier.clone(), false);

        runner.run_once().await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
        assert!(notifier.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_run_probes_immediately_and_stops_on_shutdown() {
        let store = store_with(&["http://x"]).await;
        let probe = Arc::new(Scripted::new(&[]));
        let notifier = Arc::new(Recording::default());
        let mut settings = settings(false);
        settings.interval_secs = 3600;
        let runner = Runner::new(store, probe.clone(), AlertDispatcher::new(vec![notifier as Arc<dyn Notifier>]), &settings);

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(runner.run(rx));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("runner should stop promptly")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrunning_pass_does_not_overlap() {
        let store = store_with(&["http://x"]).await;
        let probe = Arc::new(Counting::new(Duration::from_secs(3)));
        let mut settings = settings(false);
        settings.interval_secs = 1;
        let runner = Runner::new(store, probe.clone(), AlertDispatcher::default(), &settings);

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(runner.run(rx));

        // Passes start at 0s, 3s, 6s and 9s.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(probe.peak.load(Ordering::SeqCst), 1);
        let calls = probe.calls.load(Ordering::SeqCst);
        assert!((3..=4).contains(&calls), "completed probes: {}", calls);

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("runner should stop promptly")
            .unwrap();
        assert_eq!(probe.peak.load(Ordering::SeqCst), 1);
    }
}
