use crate::error::FetchError;
use crate::fetcher::{PageSource, RawPage};
use crate::heuristics::{Classification, HeuristicChain};
use crate::keywords::KeywordTable;
use crate::parsers::Document;
use crate::results::{ResultRecord, Status};
use crate::utils::truncate;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinHandle};

/// Runs Fetch → Normalize → Classify for batches of URLs.
///
/// Built by [`crate::Detector`]. Every input URL produces exactly one
/// [`ResultRecord`], at the same index as the input.
pub struct BatchRunner<S: PageSource> {
    source: Arc<S>,
    table: Arc<KeywordTable>,
    chain: Arc<HeuristicChain>,
    max_concurrency: usize,
    timeout: Duration,
    total_timeout: Option<Duration>,
}

impl<S: PageSource> BatchRunner<S> {
    pub(crate) fn new(
        source: S,
        table: KeywordTable,
        chain: HeuristicChain,
        max_concurrency: usize,
        timeout: Duration,
        total_timeout: Option<Duration>,
    ) -> Self {
        Self {
            source: Arc::new(source),
            table: Arc::new(table),
            chain: Arc::new(chain),
            max_concurrency,
            timeout,
            total_timeout,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn chain(&self) -> &HeuristicChain {
        &self.chain
    }

    /// Classify every URL, returning records in input order.
    ///
    /// At most `max_concurrency` fetches are in flight at once. A failure
    /// for one URL only affects that URL's record.
    pub async fn run<I, T>(&self, urls: I) -> Vec<ResultRecord>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        let started = Instant::now();
        ::log::info!(
            "Starting batch of {} URLs with concurrency {}",
            urls.len(),
            self.max_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let handles: Vec<JoinHandle<ResultRecord>> = urls
            .iter()
            .enumerate()
            .map(|(index, url)| self.spawn_worker(index, url.clone(), Arc::clone(&semaphore)))
            .collect();
        // Dropping this future must not leave workers fetching in the background
        let _workers = AbortOnDrop(handles.iter().map(JoinHandle::abort_handle).collect());

        let deadline = self
            .total_timeout
            .map(|total| tokio::time::Instant::now() + total);

        // Awaiting in spawn order puts each record at its input index no
        // matter which task finishes first
        let mut records = Vec::with_capacity(urls.len());
        for (handle, url) in handles.into_iter().zip(&urls) {
            records.push(collect_record(handle, url, deadline).await);
        }

        log_summary(&records, started);
        records
    }

    /// Classify a single URL without the worker pool
    pub async fn run_one(&self, url: &str) -> ResultRecord {
        let outcome = fetch_and_classify(
            url,
            self.source.as_ref(),
            &self.table,
            &self.chain,
            self.timeout,
        )
        .await;
        ResultRecord::new(url, outcome)
    }

    fn spawn_worker(
        &self,
        index: usize,
        url: String,
        semaphore: Arc<Semaphore>,
    ) -> JoinHandle<ResultRecord> {
        let source = Arc::clone(&self.source);
        let table = Arc::clone(&self.table);
        let chain = Arc::clone(&self.chain);
        let timeout = self.timeout;

        tokio::spawn(async move {
            // Excess tasks wait here until a slot frees up
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return ResultRecord::error(url, "worker pool closed"),
            };
            ::log::trace!("Worker {} processing: {}", index, url);

            let outcome =
                fetch_and_classify(&url, source.as_ref(), &table, &chain, timeout).await;
            ResultRecord::new(url, outcome)
        })
    }
}

/// Aborts every task it holds when dropped
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Fetch one page and run the heuristic chain over it. Never fails: fetch
/// problems become `Classification::FetchError`.
async fn fetch_and_classify<S: PageSource>(
    url: &str,
    source: &S,
    table: &KeywordTable,
    chain: &HeuristicChain,
    timeout: Duration,
) -> Classification {
    let fetched = match tokio::time::timeout(timeout, source.fetch(url)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(timeout)),
    };

    match fetched {
        Ok(page) => classify_page(&page, table, chain),
        Err(e) => {
            ::log::warn!("Failed to fetch {}: {}", url, e);
            Classification::FetchError {
                message: e.to_string(),
            }
        }
    }
}

/// Normalize and classify an already fetched page. Relative links resolve
/// against the URL the body was served from.
pub fn classify_page(
    page: &RawPage,
    table: &KeywordTable,
    chain: &HeuristicChain,
) -> Classification {
    let doc = Document::parse(&page.body);
    let outcome = chain.classify(&page.final_url, &doc, table);
    if let Classification::ShopDetected { evidence } = &outcome {
        ::log::debug!("Shop detected at {}: {}", page.final_url, truncate(evidence, 80));
    }
    outcome
}

/// Wait for one worker, honouring the batch deadline if there is one
async fn collect_record(
    mut handle: JoinHandle<ResultRecord>,
    url: &str,
    deadline: Option<tokio::time::Instant>,
) -> ResultRecord {
    let joined = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                ::log::warn!("Batch deadline exceeded before {} finished", url);
                return ResultRecord::error(url, "batch deadline exceeded");
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(record) => record,
        Err(e) => {
            ::log::warn!("Worker for {} failed: {}", url, e);
            ResultRecord::error(url, format!("worker failed: {}", e))
        }
    }
}

fn log_summary(records: &[ResultRecord], started: Instant) {
    let errors = records.iter().filter(|r| r.is_error()).count();
    let detected = records
        .iter()
        .filter(|r| r.status == Status::Detected)
        .count();
    ::log::info!(
        "Batch complete - {} detected, {} not detected, {} errors in {:.2} seconds",
        detected,
        records.len() - detected - errors,
        errors,
        started.elapsed().as_secs_f64()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Detector;
    use crate::config::DetectorConfig;
    use crate::heuristics::StepKind;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    enum Reply {
        Page { body: &'static str, delay_ms: u64 },
        Fail(&'static str),
        Hang,
        Panic,
    }

    #[derive(Default)]
    struct FakeSource {
        replies: HashMap<String, Reply>,
        in_flight: AtomicUsize,
        peak: Arc<AtomicUsize>,
        cancelled: Arc<AtomicUsize>,
    }

    /// Counts hanging fetches that were dropped before finishing
    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl FakeSource {
        fn page(mut self, url: &str, body: &'static str, delay_ms: u64) -> Self {
            self.replies
                .insert(url.to_string(), Reply::Page { body, delay_ms });
            self
        }

        fn reply(mut self, url: &str, reply: Reply) -> Self {
            self.replies.insert(url.to_string(), reply);
            self
        }
    }

    impl PageSource for FakeSource {
        async fn fetch(&self, url: &str) -> Result<RawPage, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let result = match self.replies.get(url) {
                Some(Reply::Page { body, delay_ms }) => {
                    tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                    Ok(RawPage {
                        final_url: Url::parse(url).unwrap(),
                        status: 200,
                        body: body.to_string(),
                    })
                }
                Some(Reply::Fail(message)) => Err(FetchError::Transport(message.to_string())),
                Some(Reply::Hang) => {
                    let _counter = DropCounter(Arc::clone(&self.cancelled));
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(FetchError::Transport("unreachable".to_string()))
                }
                Some(Reply::Panic) => panic!("source exploded"),
                None => Err(FetchError::InvalidUrl(url.to_string())),
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn runner(source: FakeSource, concurrency: usize) -> BatchRunner<FakeSource> {
        Detector::new(DetectorConfig::default())
            .with_max_concurrency(concurrency)
            .with_timeout(Duration::from_millis(300))
            .build_with_source(source)
            .unwrap()
    }

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://site{}.example/", i)).collect()
    }

    #[tokio::test]
    async fn test_output_order_matches_input() {
        let input = urls(10);
        let mut source = FakeSource::default();
        for (i, url) in input.iter().enumerate() {
            // Later URLs finish first
            let body = if i % 2 == 0 { "<p>Add to cart</p>" } else { "<p>birds</p>" };
            source = source.page(url, body, (10 - i as u64) * 15);
        }

        let records = runner(source, 4).run(input.clone()).await;

        assert_eq!(records.len(), input.len());
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.url, input[i]);
            let expected = if i % 2 == 0 {
                Status::Detected
            } else {
                Status::NotDetected
            };
            assert_eq!(record.status, expected);
        }
    }

    #[tokio::test]
    async fn test_empty_input() {
        let records = runner(FakeSource::default(), 4)
            .run(Vec::<String>::new())
            .await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_hanging_fetch_is_isolated() {
        let input = urls(10);
        let mut source = FakeSource::default();
        for url in &input {
            source = source.page(url, "<p>Checkout</p>", 5);
        }
        source = source.reply(&input[3], Reply::Hang);

        let records = runner(source, 50).run(input.clone()).await;

        assert_eq!(records.len(), 10);
        for (i, record) in records.iter().enumerate() {
            if i == 3 {
                assert!(record.is_error());
                assert!(record.status.to_string().starts_with("Error: request timed out"));
                assert_eq!(record.evidence, "N/A");
                assert_eq!(record.banned_keyword, "N/A");
            } else {
                assert_eq!(record.status, Status::Detected);
                assert_eq!(record.evidence, "checkout");
            }
        }
    }

    #[tokio::test]
    async fn test_fetch_error_row() {
        let source = FakeSource::default()
            .page("https://ok.example/", "<p>Our workshop</p>", 0)
            .reply("https://down.example/", Reply::Fail("connection refused"));

        let records = runner(source, 2)
            .run(["https://down.example/", "https://ok.example/"])
            .await;

        assert_eq!(records[0].status.to_string(), "Error: connection refused");
        assert_eq!(records[1].status, Status::NotDetected);
        assert_eq!(records[1].banned_keyword, "workshop");
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let input = urls(12);
        let mut source = FakeSource::default();
        for url in &input {
            source = source.page(url, "<p>birds</p>", 20);
        }
        let peak = Arc::clone(&source.peak);

        let records = runner(source, 3).run(input).await;

        assert_eq!(records.len(), 12);
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency was {}", peak);
        assert!(peak >= 1);
    }

    #[tokio::test]
    async fn test_panicking_worker_yields_error_row() {
        let source = FakeSource::default()
            .page("https://a.example/", "<p>cart</p>", 0)
            .reply("https://b.example/", Reply::Panic);

        let records = runner(source, 2)
            .run(["https://a.example/", "https://b.example/"])
            .await;

        assert_eq!(records[0].status, Status::Detected);
        assert!(records[1].status.to_string().starts_with("Error: worker failed"));
    }

    #[tokio::test]
    async fn test_batch_deadline() {
        let source = FakeSource::default()
            .page("https://fast.example/", "<p>cart</p>", 0)
            .reply("https://slow.example/", Reply::Hang);

        let runner = Detector::new(DetectorConfig::default())
            .with_timeout(Duration::from_secs(30))
            .with_total_timeout(Duration::from_millis(200))
            .build_with_source(source)
            .unwrap();

        let records = runner
            .run(["https://fast.example/", "https://slow.example/"])
            .await;

        assert_eq!(records[0].status, Status::Detected);
        assert_eq!(
            records[1].status,
            Status::Error("batch deadline exceeded".to_string())
        );
    }

    #[tokio::test]
    async fn test_dropped_batch_aborts_workers() {
        let input = urls(3);
        let mut source = FakeSource::default();
        for url in &input {
            source = source.reply(url, Reply::Hang);
        }
        let cancelled = Arc::clone(&source.cancelled);
        let runner = Detector::new(DetectorConfig::default())
            .with_timeout(Duration::from_secs(30))
            .build_with_source(source)
            .unwrap();

        let outcome = tokio::time::timeout(Duration::from_millis(50), runner.run(input)).await;
        assert!(outcome.is_err());

        // Give the runtime a turn to drop the aborted tasks
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cancelled.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_text_keyword_beats_shop_link() {
        let source = FakeSource::default().page(
            "https://www.example.com/",
            "<p>Add to cart</p><a href=\"https://shop.example.com/\">Visit</a>",
            0,
        );
        let record = runner(source, 1).run_one("https://www.example.com/").await;
        assert_eq!(record.evidence, "add to cart, cart");
    }

    #[tokio::test]
    async fn test_custom_step_set() {
        let source = FakeSource::default().page(
            "https://example.com/",
            "<p>Hello</p><a href=\"/store/items\">Browse</a>",
            0,
        );
        let runner = Detector::new(DetectorConfig::default())
            .with_steps(vec![
                StepKind::BannedTerms,
                StepKind::TextKeywords,
                StepKind::ShopLinks,
            ])
            .build_with_source(source)
            .unwrap();

        let record = runner.run_one("https://example.com/").await;
        assert_eq!(record.status, Status::Detected);
        assert_eq!(record.evidence, "/store/items");
    }

    #[tokio::test]
    async fn test_http_batch_end_to_end() {
        let mut server = mockito::Server::new_async().await;
        let _shop = server
            .mock("GET", "/shop-page")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><body><h1>Welcome! Add to Cart now.</h1></body></html>")
            .create_async()
            .await;
        let _crafts = server
            .mock("GET", "/crafts")
            .with_status(200)
            .with_body("<p>Our workshop teaches crafts.</p>")
            .create_async()
            .await;

        let runner = Detector::new(DetectorConfig::default())
            .with_max_concurrency(2)
            .build()
            .unwrap();
        let input = vec![
            format!("{}/shop-page", server.url()),
            "http://127.0.0.1:1/".to_string(),
            format!("{}/crafts", server.url()),
            "not a url".to_string(),
        ];

        let records = runner.run(input.clone()).await;

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].url, input[0]);
        assert_eq!(records[0].status, Status::Detected);
        assert!(records[0].evidence.contains("add to cart"));

        assert!(records[1].status.to_string().starts_with("Error: "));
        assert_eq!(records[1].evidence, "N/A");
        assert_eq!(records[1].banned_keyword, "N/A");

        assert_eq!(records[2].status, Status::NotDetected);
        assert_eq!(records[2].banned_keyword, "workshop");

        assert!(records[3].status.to_string().starts_with("Error: invalid URL"));
    }
}
