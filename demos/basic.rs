//! # Example: Console and log file providers
//!
//! Starts the dispatch loop with the tracing console provider and a log file
//! provider, writes a few records from several tasks, then stops and shows that
//! everything reached the file.

use std::{sync::Arc, time::Duration};

use logvisor::{
    Config, ErrorRecord, Level, LogEntry, LogFileProvider, Logging, ProviderFilter,
    TracingProvider,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,logvisor=debug".into()),
        )
        .init();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("demo.log");

    let cfg = Config {
        interval_ms: 50,
        ..Config::default()
    };
    let logging = Logging::builder(cfg)
        .with_providers(vec![
            Arc::new(TracingProvider::with_filter(
                ProviderFilter::new().min_level(Level::Verbose),
            )),
            Arc::new(LogFileProvider::new(&path)),
        ])
        .build()?;

    logging.start()?;

    let mut workers = Vec::new();
    for n in 0..3 {
        let logging = Arc::clone(&logging);
        workers.push(tokio::spawn(async move {
            for step in 0..3 {
                logging.enqueue_log_entry(
                    LogEntry::new(Level::Verbose, "Sync-Mailbox", format!("step {step}"))
                        .with_module("mailbox")
                        .with_tag(format!("worker-{n}")),
                );
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        }));
    }
    for w in workers {
        w.await?;
    }

    logging.write(Level::Warning, "Sync-Mailbox", "quota almost reached");
    logging.enqueue_error_record(ErrorRecord::new(
        "Sync-Mailbox",
        "mailbox sync aborted",
        "connection reset by peer",
    ));

    // Anything still queued is flushed before stop returns.
    logging.stop().await?;

    println!("state: {}", logging.state());
    for status in logging.provider_status() {
        println!(
            "provider {}: enabled={} faults={}",
            status.name, status.enabled, status.total_faults
        );
    }

    let contents = tokio::fs::read_to_string(&path).await?;
    println!("{} lines written to {}", contents.lines().count(), path.display());
    Ok(())
}
