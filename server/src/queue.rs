use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use futures_util::StreamExt;
use podbridge_api::Download;
use podbridge_common::Config;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;

use crate::error::CoreError;
use crate::freshen;

/// Invoked exactly once, the first time both `waiting` and `active` become
/// empty after it was registered (§4.6 `processQueue`).
pub type TerminalCallback = Arc<dyn Fn() + Send + Sync>;

struct QueueState {
    waiting: Vec<Download>,
    active: Vec<Download>,
    terminal: Option<TerminalCallback>,
}

/// Process-wide singleton: a deduplicating, sorted, bounded-concurrency
/// download queue (component G). Bounded concurrency is implemented as a
/// semaphore rather than a fixed thread pool; tasks that can't acquire a
/// permit simply wait, which gives the same "N concurrent fetches" contract
/// without a separate idle-thread-reaping timer.
pub struct DownloadQueue {
    state: Mutex<QueueState>,
    permits: Semaphore,
    mkdir_lock: tokio::sync::Mutex<()>,
    client: reqwest::Client,
    user_agent: String,
    oldest_first: bool,
}

impl DownloadQueue {
    pub fn new(config: &Config, client: reqwest::Client) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState {
                waiting: Vec::new(),
                active: Vec::new(),
                terminal: None,
            }),
            permits: Semaphore::new(config.download_threads.resolve()),
            mkdir_lock: tokio::sync::Mutex::new(()),
            client,
            user_agent: config.user_agent.clone(),
            oldest_first: config.download_oldest_first,
        })
    }

    /// Returns `true` if `download` was newly enqueued. Returns `false`
    /// (and, if the final file already exists, refreshes its `lastUsed`
    /// attribute) when the file already exists locally or an equal entry
    /// is already waiting or active — enqueue is idempotent (§8).
    pub fn enqueue(&self, download: Download) -> bool {
        if download.local_file_path.exists() {
            freshen::touch_last_used(&download.local_file_path);
            return false;
        }

        let mut state = self.state.lock().unwrap();
        if state.waiting.contains(&download) || state.active.contains(&download) {
            return false;
        }
        state.waiting.push(download);
        let oldest_first = self.oldest_first;
        state.waiting.sort_by(|a, b| {
            if oldest_first {
                a.last_modified.cmp(&b.last_modified)
            } else {
                b.last_modified.cmp(&a.last_modified)
            }
        });
        true
    }

    /// Drains `waiting` into the worker pool. If `terminal` is given, it
    /// overwrites any previously registered callback and fires immediately
    /// if the queue is already empty.
    pub fn process_queue(self: &Arc<Self>, terminal: Option<TerminalCallback>) {
        let mut state = self.state.lock().unwrap();
        if let Some(cb) = terminal {
            state.terminal = Some(cb);
        }

        let drained: Vec<Download> = state.waiting.drain(..).collect();
        state.active.extend(drained.iter().cloned());

        let fire_now = state.waiting.is_empty() && state.active.is_empty();
        let maybe_cb = if fire_now { state.terminal.take() } else { None };
        drop(state);

        if let Some(cb) = maybe_cb {
            cb();
        }

        for download in drained {
            let this = Arc::clone(self);
            tokio::spawn(async move { this.run_worker(download).await });
        }
    }

    pub fn waiting_len(&self) -> usize {
        self.state.lock().unwrap().waiting.len()
    }

    pub fn active_len(&self) -> usize {
        self.state.lock().unwrap().active.len()
    }

    async fn run_worker(self: Arc<Self>, download: Download) {
        let _permit = self.permits.acquire().await.expect("semaphore never closed");
        let started = std::time::Instant::now();

        match self.fetch(&download).await {
            Ok(()) => {
                tracing::info!(
                    path = %download.local_file_path.display(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "download complete"
                );
            }
            Err(e) => {
                tracing::error!(
                    path = %download.local_file_path.display(),
                    error = %e,
                    "download failed, leaving .part on disk for retry"
                );
            }
        }

        let mut state = self.state.lock().unwrap();
        state.active.retain(|d| d != &download);
        let fire_now = state.waiting.is_empty() && state.active.is_empty();
        let maybe_cb = if fire_now { state.terminal.take() } else { None };
        drop(state);
        if let Some(cb) = maybe_cb {
            cb();
        }
    }

    async fn fetch(&self, download: &Download) -> Result<(), CoreError> {
        if let Some(parent) = download.local_file_path.parent() {
            let _guard = self.mkdir_lock.lock().await;
            tokio::fs::create_dir_all(parent).await?;
        }

        let part_path = download.part_path();
        if let Ok(meta) = tokio::fs::symlink_metadata(&part_path).await {
            if meta.file_type().is_symlink() {
                tokio::fs::remove_file(&part_path).await?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&part_path)
            .await?;
        freshen::touch_last_used(&part_path);

        let response = self
            .client
            .get(&download.remote_url)
            .header("User-Agent", &self.user_agent)
            .header("Referer", &download.remote_url)
            .send()
            .await
            .map_err(|e| CoreError::Remote(e.to_string()))?;

        let file_name = download
            .local_file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let expected = download.length_bytes;
        let mut written: u64 = 0;
        let mut last_reported = 0u32;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| CoreError::Remote(e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            if expected > 0 {
                let pct = ((written.saturating_mul(100)) / expected) as u32;
                if pct > last_reported && pct < 100 && pct % 10 == 0 {
                    println!("  {pct}% {file_name}");
                    last_reported = pct;
                }
            }
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        set_mtime(&part_path, download.last_modified.into())?;

        let final_path: PathBuf = download.local_file_path.clone();
        if final_path.exists() {
            tokio::fs::remove_file(&final_path).await?;
        }
        tokio::fs::rename(&part_path, &final_path).await?;

        Ok(())
    }
}

fn set_mtime(path: &std::path::Path, mtime: SystemTime) -> Result<(), CoreError> {
    let file = std::fs::OpenOptions::new().write(true).open(path)?;
    file.set_modified(mtime)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn dl(dir: &std::path::Path, name: &str) -> Download {
        Download {
            remote_url: "https://example/track.m4a".into(),
            length_bytes: 4,
            last_modified: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            local_file_path: dir.join(name),
        }
    }

    #[test]
    fn enqueue_is_idempotent() {
        let cfg = podbridge_common::config::default_config();
        let client = reqwest::Client::new();
        let queue = DownloadQueue::new(&cfg, client);
        let dir = tempfile::tempdir().unwrap();
        let d = dl(dir.path(), "track.m4a");

        assert!(queue.enqueue(d.clone()));
        assert!(!queue.enqueue(d));
        assert_eq!(queue.waiting_len(), 1);
    }

    #[test]
    fn enqueue_refuses_existing_file() {
        let cfg = podbridge_common::config::default_config();
        let client = reqwest::Client::new();
        let queue = DownloadQueue::new(&cfg, client);
        let dir = tempfile::tempdir().unwrap();
        let d = dl(dir.path(), "track.m4a");
        std::fs::write(&d.local_file_path, b"data").unwrap();

        assert!(!queue.enqueue(d));
        assert_eq!(queue.waiting_len(), 0);
    }
}
