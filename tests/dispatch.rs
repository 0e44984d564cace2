use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use logvisor::{
    Config, DISABLE_FLUSH_ON_EXIT, ErrorRecord, Hook, HookError, Level, LogEntry, Logging,
    LoggingState, Pacer, Provider, RunState, RuntimeError, Settings, StateCell,
};

/// Provider that records every hook call and can be told to fail.
struct Recorder {
    name: String,
    state: StateCell,
    calls: Mutex<Vec<String>>,
    states: Mutex<Vec<LoggingState>>,
    begin_failures: AtomicUsize,
    fail_on: Option<&'static str>,
    fail_final: bool,
    warnings_only: bool,
}

impl Recorder {
    fn new(name: &str, state: StateCell) -> Self {
        Self {
            name: name.to_string(),
            state,
            calls: Mutex::new(Vec::new()),
            states: Mutex::new(Vec::new()),
            begin_failures: AtomicUsize::new(0),
            fail_on: None,
            fail_final: false,
            warnings_only: false,
        }
    }

    fn failing_begin(self, times: usize) -> Self {
        self.begin_failures.store(times, Ordering::SeqCst);
        self
    }

    fn failing_on(mut self, message: &'static str) -> Self {
        self.fail_on = Some(message);
        self
    }

    fn failing_final(mut self) -> Self {
        self.fail_final = true;
        self
    }

    fn warnings_only(mut self) -> Self {
        self.warnings_only = true;
        self
    }

    fn note(&self, call: String) {
        self.states.lock().push(self.state.get());
        self.calls.lock().push(call);
    }

    fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == call).count()
    }

    fn messages(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| c.strip_prefix("msg:").map(str::to_string))
            .collect()
    }

    fn deliveries(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.starts_with("msg:") || c.starts_with("err:"))
            .cloned()
            .collect()
    }

    fn distinct_states(&self) -> Vec<LoggingState> {
        let mut seen = self.states.lock().clone();
        seen.dedup();
        seen
    }
}

#[async_trait]
impl Provider for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_begin(&self, _settings: &Settings) -> Result<(), HookError> {
        self.note("begin".into());
        let left = self.begin_failures.load(Ordering::SeqCst);
        if left > 0 {
            self.begin_failures.store(left - 1, Ordering::SeqCst);
            return Err(HookError::fail("not ready"));
        }
        Ok(())
    }

    async fn on_start(&self) -> Result<(), HookError> {
        self.note("start".into());
        Ok(())
    }

    async fn on_message(&self, entry: &LogEntry) -> Result<(), HookError> {
        if self.fail_on == Some(entry.message.as_ref()) {
            return Err(HookError::fail(format!("cannot write {}", entry.message)));
        }
        self.note(format!("msg:{}", entry.message));
        Ok(())
    }

    async fn on_error(&self, record: &ErrorRecord) -> Result<(), HookError> {
        self.note(format!("err:{}", record.message));
        Ok(())
    }

    async fn on_end(&self) -> Result<(), HookError> {
        self.note("end".into());
        Ok(())
    }

    async fn on_final(&self) -> Result<(), HookError> {
        self.note("final".into());
        if self.fail_final {
            return Err(HookError::fail("cannot close"));
        }
        Ok(())
    }

    fn message_applies(&self, entry: &LogEntry) -> bool {
        !self.warnings_only || entry.level == Level::Warning
    }
}

/// Provider whose hooks take a while and that tracks how many overlap.
#[derive(Default)]
struct Slow {
    begins: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Slow {
    async fn busy(&self) -> Result<(), HookError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Provider for Slow {
    fn name(&self) -> &str {
        "slow"
    }

    async fn on_begin(&self, _settings: &Settings) -> Result<(), HookError> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        self.busy().await
    }

    async fn on_start(&self) -> Result<(), HookError> {
        self.busy().await
    }

    async fn on_message(&self, _entry: &LogEntry) -> Result<(), HookError> {
        self.busy().await
    }

    async fn on_end(&self) -> Result<(), HookError> {
        self.busy().await
    }
}

/// Pacer that never wakes on its own; only cancellation ends the pause.
struct Parked;

#[async_trait]
impl Pacer for Parked {
    async fn pause(&self) {
        std::future::pending::<()>().await
    }
}

/// Pacer that faults outside any provider hook.
struct Exploding;

#[async_trait]
impl Pacer for Exploding {
    async fn pause(&self) {
        panic!("pacer exploded");
    }
}

fn runtime(pacer: Arc<dyn Pacer>) -> Arc<Logging> {
    Logging::builder(Config::default())
        .with_pacer(pacer)
        .build()
        .unwrap()
}

fn add(logging: &Logging, recorder: Recorder) -> Arc<Recorder> {
    let name = recorder.name.clone();
    let rec = Arc::new(recorder);
    logging.register_provider(rec.clone()).unwrap();
    logging.enable_provider(&name).unwrap();
    rec
}

fn entry(message: &str) -> LogEntry {
    LogEntry::new(Level::Verbose, "test", message)
}

async fn wait_until(cond: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_three_entries_one_cycle_in_order() {
    let logging = runtime(Arc::new(Parked));
    let p = add(&logging, Recorder::new("p", logging.state_cell()));

    for m in ["one", "two", "three"] {
        logging.enqueue_log_entry(entry(m));
    }
    logging.run_cycle().await.unwrap();

    assert_eq!(p.messages(), vec!["one", "two", "three"]);
    assert_eq!(
        p.distinct_states(),
        vec![
            LoggingState::Initializing,
            LoggingState::Ready,
            LoggingState::Writing
        ]
    );
    assert_eq!(logging.state(), LoggingState::Ready);
    assert_eq!(logging.pending(), (0, 0));
}

#[tokio::test]
async fn test_failing_provider_does_not_block_others() {
    let logging = runtime(Arc::new(Parked));
    let p1 = add(&logging, Recorder::new("p1", logging.state_cell()).failing_on("only"));
    let p2 = add(&logging, Recorder::new("p2", logging.state_cell()));

    logging.enqueue_log_entry(entry("only"));
    logging.run_cycle().await.unwrap();

    assert_eq!(p2.messages(), vec!["only"]);
    assert!(p1.messages().is_empty());
    let faults = logging.provider_faults("p1").unwrap();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].hook, Hook::Message);
    assert!(logging.provider_faults("p2").unwrap().is_empty());
    assert_eq!(logging.state(), LoggingState::Ready);
}

#[tokio::test]
async fn test_message_failure_on_n_still_delivers_n_plus_one() {
    let logging = runtime(Arc::new(Parked));
    let p = add(&logging, Recorder::new("p", logging.state_cell()).failing_on("b"));

    for m in ["a", "b", "c"] {
        logging.enqueue_log_entry(entry(m));
    }
    logging.run_cycle().await.unwrap();

    assert_eq!(p.messages(), vec!["a", "c"]);
    assert_eq!(logging.provider_faults("p").unwrap().len(), 1);
    assert_eq!(p.count("end"), 1);
}

#[tokio::test]
async fn test_failed_begin_gets_no_hooks_until_retry_succeeds() {
    let logging = runtime(Arc::new(Parked));
    let p = add(&logging, Recorder::new("p", logging.state_cell()).failing_begin(1));

    logging.enqueue_log_entry(entry("lost"));
    logging.run_cycle().await.unwrap();

    assert_eq!(p.count("begin"), 1);
    assert_eq!(p.count("start"), 0);
    assert_eq!(p.count("end"), 0);
    assert!(p.messages().is_empty());
    assert_eq!(logging.provider_faults("p").unwrap()[0].hook, Hook::Begin);
    assert!(!logging.provider_status()[0].initialized);

    logging.enqueue_log_entry(entry("kept"));
    logging.run_cycle().await.unwrap();

    assert_eq!(p.count("begin"), 2);
    assert_eq!(p.count("start"), 1);
    assert_eq!(p.messages(), vec!["kept"]);
    assert!(logging.provider_status()[0].initialized);
}

#[tokio::test]
async fn test_disable_stops_begin_retries_but_not_delivery() {
    let logging = runtime(Arc::new(Parked));
    let running = add(&logging, Recorder::new("running", logging.state_cell()));
    let stuck = add(&logging, Recorder::new("stuck", logging.state_cell()).failing_begin(usize::MAX));

    logging.run_cycle().await.unwrap();
    assert_eq!(stuck.count("begin"), 1);

    logging.disable_provider("running").unwrap();
    logging.disable_provider("stuck").unwrap();

    logging.enqueue_log_entry(entry("after-disable"));
    logging.run_cycle().await.unwrap();

    assert_eq!(running.messages(), vec!["after-disable"]);
    assert_eq!(running.count("start"), 2);
    assert_eq!(stuck.count("begin"), 1);

    let status = logging.provider_status();
    assert!(!status[0].enabled && status[0].initialized);
    assert!(!status[1].enabled && !status[1].initialized);
}

#[tokio::test]
async fn test_entries_drain_before_errors() {
    let logging = runtime(Arc::new(Parked));
    let p = add(&logging, Recorder::new("p", logging.state_cell()));

    logging.enqueue_error_record(ErrorRecord::new("test", "e1", "boom"));
    logging.enqueue_log_entry(entry("m1"));
    logging.enqueue_error_record(ErrorRecord::new("test", "e2", "boom"));
    logging.enqueue_log_entry(entry("m2"));
    logging.run_cycle().await.unwrap();

    assert_eq!(p.deliveries(), vec!["msg:m1", "msg:m2", "err:e1", "err:e2"]);
}

#[tokio::test]
async fn test_filter_limits_delivery() {
    let logging = runtime(Arc::new(Parked));
    let all = add(&logging, Recorder::new("all", logging.state_cell()));
    let warn = add(&logging, Recorder::new("warn", logging.state_cell()).warnings_only());

    logging.write(Level::Verbose, "test", "chatty");
    logging.write(Level::Warning, "test", "careful");
    logging.run_cycle().await.unwrap();

    assert_eq!(all.messages(), vec!["chatty", "careful"]);
    assert_eq!(warn.messages(), vec!["careful"]);
}

#[tokio::test]
async fn test_stop_flushes_everything_enqueued_before_stop() {
    let logging = runtime(Arc::new(Parked));
    let p = add(&logging, Recorder::new("p", logging.state_cell()));

    logging.start().unwrap();
    wait_until(|| p.count("end") >= 1).await;

    for m in ["x", "y", "z"] {
        logging.enqueue_log_entry(entry(m));
    }
    logging.enqueue_error_record(ErrorRecord::new("test", "late", "boom"));
    logging.stop().await.unwrap();

    assert_eq!(p.deliveries(), vec!["msg:x", "msg:y", "msg:z", "err:late"]);
    let calls = p.calls.lock().clone();
    assert_eq!(calls.last().map(String::as_str), Some("final"));
    assert_eq!(p.count("final"), 1);
    assert_eq!(logging.state(), LoggingState::Stopped);
    assert_eq!(logging.runspace_state(), Some(RunState::Stopped));
    assert!(!logging.provider_status()[0].initialized);
}

#[tokio::test]
async fn test_disable_flush_flag_is_read_at_stop_time() {
    let logging = runtime(Arc::new(Parked));
    let p = add(&logging, Recorder::new("p", logging.state_cell()));

    logging.start().unwrap();
    wait_until(|| p.count("end") >= 1).await;

    for m in ["x", "y"] {
        logging.enqueue_log_entry(entry(m));
    }
    logging.settings().set(DISABLE_FLUSH_ON_EXIT, true);
    logging.stop().await.unwrap();

    assert!(p.messages().is_empty());
    assert_eq!(p.count("start"), 1);
    assert_eq!(p.count("final"), 1);
    assert_eq!(logging.pending(), (0, 0));
    assert_eq!(logging.state(), LoggingState::Stopped);
}

#[tokio::test]
async fn test_double_stop_is_a_noop() {
    let logging = runtime(Arc::new(Parked));
    let p = add(&logging, Recorder::new("p", logging.state_cell()));

    logging.stop().await.unwrap();

    logging.start().unwrap();
    wait_until(|| p.count("end") >= 1).await;
    logging.stop().await.unwrap();
    logging.stop().await.unwrap();

    assert_eq!(p.count("final"), 1);
    assert_eq!(logging.state(), LoggingState::Stopped);
}

#[tokio::test]
async fn test_start_twice_and_manual_cycle_while_running_are_refused() {
    let logging = runtime(Arc::new(Parked));
    logging.start().unwrap();

    assert!(matches!(
        logging.start(),
        Err(RuntimeError::AlreadyRunning { .. })
    ));
    assert!(matches!(
        logging.run_cycle().await,
        Err(RuntimeError::AlreadyRunning { .. })
    ));

    logging.stop().await.unwrap();
    logging.run_cycle().await.unwrap();
}

#[tokio::test]
async fn test_restart_after_stop_reinitializes_providers() {
    let logging = runtime(Arc::new(Parked));
    let p = add(&logging, Recorder::new("p", logging.state_cell()));

    logging.start().unwrap();
    wait_until(|| p.count("end") >= 1).await;
    logging.stop().await.unwrap();

    logging.start().unwrap();
    wait_until(|| p.count("begin") >= 2).await;
    logging.write(Level::Important, "test", "second run");
    logging.stop().await.unwrap();

    assert_eq!(p.count("final"), 2);
    assert!(p.messages().contains(&"second run".to_string()));
}

#[tokio::test]
async fn test_loop_fault_ends_broken_but_still_tears_down() {
    let logging = runtime(Arc::new(Exploding));
    let p = add(&logging, Recorder::new("p", logging.state_cell()));

    logging.start().unwrap();
    wait_until(|| logging.runspace_state() == Some(RunState::Stopped)).await;

    assert_eq!(logging.state(), LoggingState::Broken);
    assert_eq!(
        logging.last_fault(),
        Some(RuntimeError::LoopFault {
            error: "pacer exploded".into()
        })
    );
    assert_eq!(p.count("final"), 1);
    assert!(!logging.provider_status()[0].initialized);

    logging.stop().await.unwrap();
    assert_eq!(p.count("final"), 1);
}

#[tokio::test]
async fn test_wait_for_drain_with_running_loop() {
    let logging = Logging::builder(Config {
        interval_ms: 5,
        ..Config::default()
    })
    .build()
    .unwrap();
    let p = add(&logging, Recorder::new("p", logging.state_cell()));

    logging.start().unwrap();
    wait_until(|| p.count("end") >= 1).await;
    for i in 0..50 {
        logging.write(Level::Verbose, "test", format!("m{i}"));
    }

    assert!(logging.wait_for_drain(Duration::from_secs(5)).await);
    assert_eq!(p.messages().len(), 50);
    logging.stop().await.unwrap();
}

#[tokio::test]
async fn test_instances_are_independent() {
    let a = runtime(Arc::new(Parked));
    let b = runtime(Arc::new(Parked));
    let pa = add(&a, Recorder::new("p", a.state_cell()));
    let pb = add(&b, Recorder::new("p", b.state_cell()));

    a.enqueue_log_entry(entry("for-a"));
    a.run_cycle().await.unwrap();
    b.run_cycle().await.unwrap();

    assert_eq!(pa.messages(), vec!["for-a"]);
    assert!(pb.messages().is_empty());
    assert_eq!(b.state(), LoggingState::Ready);
}

#[tokio::test]
async fn test_concurrent_producers_all_delivered() {
    let logging = runtime(Arc::new(Parked));
    let p = add(&logging, Recorder::new("p", logging.state_cell()));

    let producers: Vec<_> = (0..4)
        .map(|n| {
            let logging = Arc::clone(&logging);
            std::thread::spawn(move || {
                for i in 0..100 {
                    logging.write(Level::Verbose, "producer", format!("{n}-{i}"));
                }
            })
        })
        .collect();
    for h in producers {
        h.join().unwrap();
    }
    logging.run_cycle().await.unwrap();

    let got = p.messages();
    assert_eq!(got.len(), 400);
    for n in 0..4 {
        let mine: Vec<usize> = got
            .iter()
            .filter_map(|m| m.strip_prefix(&format!("{n}-")).map(|i| i.parse().unwrap()))
            .collect();
        assert_eq!(mine, (0..100).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn test_registry_errors_surface_to_caller() {
    let logging = runtime(Arc::new(Parked));
    add(&logging, Recorder::new("p", logging.state_cell()));

    let dup = logging.register_provider(Arc::new(Recorder::new("p", logging.state_cell())));
    assert!(matches!(dup, Err(RuntimeError::DuplicateProvider { .. })));
    assert!(matches!(
        logging.enable_provider("missing"),
        Err(RuntimeError::UnknownProvider { .. })
    ));
}

#[tokio::test]
async fn test_concurrent_manual_cycles_never_overlap() {
    let logging = runtime(Arc::new(Parked));
    let slow = Arc::new(Slow::default());
    logging.register_provider(slow.clone()).unwrap();
    logging.enable_provider("slow").unwrap();
    logging.enqueue_log_entry(entry("one"));

    let (a, b) = tokio::join!(logging.run_cycle(), logging.run_cycle());

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert!(matches!(
        a.and(b),
        Err(RuntimeError::AlreadyRunning { .. })
    ));
    assert_eq!(slow.begins.load(Ordering::SeqCst), 1);
    assert_eq!(slow.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_start_during_manual_cycle_waits_for_it() {
    let logging = runtime(Arc::new(Parked));
    let slow = Arc::new(Slow::default());
    logging.register_provider(slow.clone()).unwrap();
    logging.enable_provider("slow").unwrap();

    let manual = tokio::spawn({
        let logging = Arc::clone(&logging);
        async move { logging.run_cycle().await }
    });
    tokio::time::sleep(Duration::from_millis(5)).await;
    logging.start().unwrap();

    manual.await.unwrap().unwrap();
    logging.write(Level::Verbose, "test", "after");
    logging.stop().await.unwrap();

    assert_eq!(slow.begins.load(Ordering::SeqCst), 1);
    assert_eq!(slow.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(logging.state(), LoggingState::Stopped);
}

#[tokio::test]
async fn test_stop_finalizes_providers_of_manual_cycles() {
    let logging = runtime(Arc::new(Parked));
    let p = add(&logging, Recorder::new("p", logging.state_cell()));

    logging.start().unwrap();
    wait_until(|| p.count("end") >= 1).await;
    logging.stop().await.unwrap();

    logging.run_cycle().await.unwrap();
    assert!(logging.provider_status()[0].initialized);
    logging.enqueue_log_entry(entry("manual"));
    logging.stop().await.unwrap();
    logging.stop().await.unwrap();

    assert_eq!(p.count("begin"), 2);
    assert_eq!(p.count("final"), 2);
    assert_eq!(p.messages(), vec!["manual"]);
    assert!(!logging.provider_status()[0].initialized);
    assert_eq!(logging.state(), LoggingState::Stopped);
}

#[tokio::test]
async fn test_shutdown_failures_stay_with_their_provider() {
    let logging = runtime(Arc::new(Parked));
    let p1 = add(
        &logging,
        Recorder::new("p1", logging.state_cell())
            .failing_on("x")
            .failing_final(),
    );
    let p2 = add(&logging, Recorder::new("p2", logging.state_cell()));

    logging.start().unwrap();
    wait_until(|| p2.count("end") >= 1).await;
    for m in ["x", "y"] {
        logging.enqueue_log_entry(entry(m));
    }
    logging.stop().await.unwrap();

    assert_eq!(p2.messages(), vec!["x", "y"]);
    assert_eq!(p2.count("final"), 1);
    assert_eq!(p1.messages(), vec!["y"]);
    let hooks: Vec<Hook> = logging
        .provider_faults("p1")
        .unwrap()
        .iter()
        .map(|f| f.hook)
        .collect();
    assert_eq!(hooks, vec![Hook::Message, Hook::Final]);
    assert!(logging.provider_faults("p2").unwrap().is_empty());
    assert_eq!(logging.state(), LoggingState::Stopped);
    assert_eq!(logging.last_fault(), None);
    assert!(logging.provider_status().iter().all(|s| !s.initialized));
}
