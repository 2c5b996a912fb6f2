//! Concurrent conversion of many files.
//!
//! Each request runs on tokio's blocking pool; at most `concurrency` run at
//! once (`buffer_unordered`), defaulting to the converter's
//! [`ConversionConfig::concurrency`](crate::ConversionConfig::concurrency). Items complete in any order but are returned
//! sorted by their position in the input, and one failure never stops the
//! others.

use crate::convert::Converter;
use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use crate::request::ConversionRequest;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Outcome of one request in a batch.
#[derive(Debug)]
pub struct BatchItem {
    /// 0-based position of the request in the batch.
    pub request_index: usize,
    pub input: PathBuf,
    pub result: Result<PathBuf, ConvertError>,
}

impl BatchItem {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// A serialisable view, as printed by `fileconv --json`.
    pub fn report(&self) -> FileReport {
        match &self.result {
            Ok(output) => FileReport {
                input: self.input.clone(),
                output: Some(output.clone()),
                error: None,
            },
            Err(e) => FileReport {
                input: self.input.clone(),
                output: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Convert every request, `concurrency` at a time (`None` uses the
/// converter's configured value).
///
/// Never fails as a whole: inspect each [`BatchItem::result`].
pub async fn convert_batch(
    converter: Arc<Converter>,
    requests: Vec<ConversionRequest>,
    concurrency: Option<usize>,
    progress: Option<ProgressCallback>,
) -> Vec<BatchItem> {
    let start = Instant::now();
    let total = requests.len();
    let concurrency = concurrency
        .unwrap_or(converter.config().concurrency)
        .max(1);
    info!("Converting {} file(s), {} at a time", total, concurrency);

    if let Some(ref cb) = progress {
        cb.on_batch_start(total);
    }

    let mut items: Vec<BatchItem> = stream::iter(requests.into_iter().enumerate().map(|(index, request)| {
        let converter = Arc::clone(&converter);
        let progress = progress.clone();
        async move {
            let input = request.input.clone();
            if let Some(ref cb) = progress {
                cb.on_file_start(index + 1, total, &input);
            }

            let result = tokio::task::spawn_blocking(move || converter.convert(&request))
                .await
                .unwrap_or_else(|e| Err(ConvertError::Internal(format!("Conversion task failed: {e}"))));

            match &result {
                Ok(output) => {
                    if let Some(ref cb) = progress {
                        cb.on_file_complete(index + 1, total, &input, output);
                    }
                }
                Err(e) => {
                    warn!("{}: {}", input.display(), e);
                    if let Some(ref cb) = progress {
                        cb.on_file_error(index + 1, total, &input, &e.to_string());
                    }
                }
            }

            BatchItem {
                request_index: index,
                input,
                result,
            }
        }
    }))
    .buffer_unordered(concurrency)
    .collect()
    .await;

    items.sort_by_key(|item| item.request_index);

    let succeeded = items.iter().filter(|i| i.is_ok()).count();
    info!(
        "Batch complete: {}/{} converted in {}ms",
        succeeded,
        total,
        start.elapsed().as_millis()
    );
    if let Some(ref cb) = progress {
        cb.on_batch_complete(total, succeeded);
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionConfig;
    use crate::progress::BatchProgressCallback;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counts {
        started: AtomicUsize,
        ok: AtomicUsize,
        failed: AtomicUsize,
        summary: AtomicUsize,
    }

    impl BatchProgressCallback for Counts {
        fn on_file_start(&self, _i: usize, _t: usize, _input: &Path) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_file_complete(&self, _i: usize, _t: usize, _input: &Path, _output: &Path) {
            self.ok.fetch_add(1, Ordering::SeqCst);
        }
        fn on_file_error(&self, _i: usize, _t: usize, _input: &Path, _error: &str) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_batch_complete(&self, _total: usize, success_count: usize) {
            self.summary.store(success_count, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut requests = Vec::new();
        for i in 0..5 {
            let p = dir.path().join(format!("f{i}.txt"));
            std::fs::write(&p, format!("file {i}")).unwrap();
            requests.push(ConversionRequest::new(p, "html", dir.path()));
        }
        requests.insert(2, ConversionRequest::new(dir.path().join("bad.xyz"), "html", dir.path()));

        let counts = Arc::new(Counts::default());
        let converter = Arc::new(Converter::new(
            ConversionConfig::builder().svg_system_fonts(false).build().unwrap(),
        ));
        let items = convert_batch(converter, requests, Some(3), Some(counts.clone())).await;

        assert_eq!(items.len(), 6);
        let indices: Vec<usize> = items.iter().map(|i| i.request_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert!(items[2].result.as_ref().unwrap_err().is_unsupported());
        assert_eq!(items.iter().filter(|i| i.is_ok()).count(), 5);

        assert_eq!(counts.started.load(Ordering::SeqCst), 6);
        assert_eq!(counts.ok.load(Ordering::SeqCst), 5);
        assert_eq!(counts.failed.load(Ordering::SeqCst), 1);
        assert_eq!(counts.summary.load(Ordering::SeqCst), 5);
    }

    /// Tracks how many files are in flight at once.
    #[derive(Default)]
    struct InFlight {
        now: AtomicUsize,
        peak: AtomicUsize,
    }

    impl BatchProgressCallback for InFlight {
        fn on_file_start(&self, _i: usize, _t: usize, _input: &Path) {
            let now = self.now.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }
        fn on_file_complete(&self, _i: usize, _t: usize, _input: &Path, _output: &Path) {
            self.now.fetch_sub(1, Ordering::SeqCst);
        }
        fn on_file_error(&self, _i: usize, _t: usize, _input: &Path, _error: &str) {
            self.now.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn default_concurrency_comes_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let requests: Vec<ConversionRequest> = (0..6)
            .map(|i| {
                let p = dir.path().join(format!("s{i}.txt"));
                std::fs::write(&p, "serial").unwrap();
                ConversionRequest::new(p, "odt", dir.path())
            })
            .collect();

        let tracker = Arc::new(InFlight::default());
        let converter = Arc::new(Converter::new(
            ConversionConfig::builder()
                .svg_system_fonts(false)
                .concurrency(1)
                .build()
                .unwrap(),
        ));
        let items = convert_batch(converter, requests, None, Some(tracker.clone())).await;

        assert!(items.iter().all(|i| i.is_ok()));
        assert_eq!(tracker.peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn report_serialises_without_empty_fields() {
        let item = BatchItem {
            request_index: 0,
            input: PathBuf::from("a.txt"),
            result: Ok(PathBuf::from("a_converted.pdf")),
        };
        let json = serde_json::to_string(&item.report()).unwrap();
        assert_eq!(json, r#"{"input":"a.txt","output":"a_converted.pdf"}"#);
    }
}
