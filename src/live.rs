//! Periodic live-preview OCR
//!
//! Every tick starts an independent read of the current crop. Reads are not
//! ordered against each other: whichever finishes last is what `/live` shows.
//! A tick that finds [`MAX_CONCURRENT_READS`] reads still running is skipped.

use crate::camera::FrameStore;
use crate::scan::{run_blocking, Scanner};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Upper bound on live reads running at once
pub const MAX_CONCURRENT_READS: usize = 2;

/// Most recently resolved live-preview read
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiveText {
    pub text: String,
    /// User-facing failure of the last read, if it failed
    pub error: Option<String>,
    /// Tick that produced this value, 0 before the first read resolves
    pub sequence: u64,
    /// Milliseconds since the Unix epoch when the read resolved
    pub updated_ms: u64,
}

/// Spawn the live-preview loop; the receiver always holds the latest result
pub fn spawn(
    scanner: Arc<Scanner>,
    frames: Arc<FrameStore>,
    interval: Duration,
) -> (watch::Receiver<LiveText>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(LiveText::default());
    let tx = Arc::new(tx);
    let sequence = Arc::new(AtomicU64::new(0));
    let slots = Arc::new(Semaphore::new(MAX_CONCURRENT_READS));

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if tx.is_closed() {
                tracing::debug!("Live preview has no readers left, stopping");
                break;
            }

            let snapshot = match frames.snapshot().await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::debug!("Skipping live preview cycle: {}", e);
                    continue;
                }
            };

            let Ok(permit) = slots.clone().try_acquire_owned() else {
                tracing::debug!("Skipping live preview cycle: previous reads still running");
                continue;
            };

            let seq = sequence.fetch_add(1, Ordering::Relaxed) + 1;
            let scanner = scanner.clone();
            let tx = tx.clone();

            // Not awaited: a slow read never holds back the next tick
            tokio::spawn(async move {
                let result = run_blocking(move || {
                    scanner.read_text(&snapshot.frame, &snapshot.region)
                })
                .await;
                drop(permit);

                let update = match result {
                    Ok(recognition) => LiveText {
                        text: recognition.text,
                        error: None,
                        sequence: seq,
                        updated_ms: now_ms(),
                    },
                    Err(e) if e.is_skip() => {
                        tracing::debug!("Skipping live preview cycle {}: {}", seq, e);
                        return;
                    }
                    Err(e) => {
                        tracing::warn!("Live preview read {} failed: {}", seq, e);
                        LiveText {
                            text: String::new(),
                            error: Some(e.to_string()),
                            sequence: seq,
                            updated_ms: now_ms(),
                        }
                    }
                };
                tx.send_replace(update);
            });
        }
    });

    (rx, handle)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
