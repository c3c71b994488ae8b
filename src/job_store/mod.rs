//! In-process durable-enough job queue and crawl record store (C11).
//!
//! Grounded on the connection-scoped registry pattern (a map behind a
//! `Mutex`, keyed by crawl id, holding an active-session record) for the
//! record shape. Key layout mirrors `crawl:{id}` / `crawl:{id}:jobs` /
//! `crawl:{id}:done` / `crawl:{id}:cancelled` / `crawl:{id}:finished` /
//! `job:{id}` as typed maps rather than literal string keys, since this
//! crate assumes a single controller process and doesn't ship an external
//! KV store. `REDIS_HOST`/`REDIS_PORT` are read by `config::ProcessConfig`
//! but a Redis-backed implementation of this contract is out of scope.
//!
//! `crawl:{id}:jobs` is a queue private to its crawl, ordered per that
//! crawl's [`TraversalStrategy`] (BFS/FIFO, DFS/LIFO, best-first/scored) —
//! kickoff jobs always dequeue ahead of page jobs within that ordering.

use crate::frontier::TraversalStrategy;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPriority {
    Kickoff,
    Page,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub crawl_id: String,
    pub priority: JobPriority,
    pub url: String,
    pub depth: u32,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Scraping,
    Completed,
    Cancelled,
}

/// Lifecycle of a single enqueued job (§3 page-job lifecycle, §8 invariant 9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    InFlight,
    Completed,
    Failed,
}

/// What a completed job produced, for `listByCrawl`/`exportedFiles`.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub final_url: String,
    pub exported_file: Option<String>,
}

/// A job plus its current lifecycle state, error, and result — the unit
/// `listByCrawl`/`exportedFiles` page over.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub job: Job,
    pub state: JobState,
    pub result: Option<JobResult>,
    pub error: Option<String>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Persistent-ish record for one crawl, analogous to the teacher's
/// `CrawlManifest` but without the MCP tool output shapes.
#[derive(Debug, Clone)]
pub struct CrawlRecord {
    pub crawl_id: String,
    pub start_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub pages_done: usize,
    pub pages_queued: usize,
    pub error: Option<String>,
}

impl CrawlRecord {
    fn new(crawl_id: String, start_url: String) -> Self {
        Self {
            crawl_id,
            start_url,
            started_at: Utc::now(),
            finished_at: None,
            pages_done: 0,
            pages_queued: 0,
            error: None,
        }
    }
}

/// Job wrapper ordered by `score` for the best-first strategy's `BinaryHeap`.
struct ScoredJob(Job);

impl PartialEq for ScoredJob {
    fn eq(&self, other: &Self) -> bool {
        self.0.score == other.0.score
    }
}
impl Eq for ScoredJob {}
impl PartialOrd for ScoredJob {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ScoredJob {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0
            .score
            .partial_cmp(&other.0.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Per-crawl ordering of page jobs (§4.9 "Ordering per strategy"). Kickoff
/// jobs bypass this entirely — they live in their own always-first queue.
enum PageOrder {
    Fifo(VecDeque<Job>),
    Lifo(Vec<Job>),
    Scored(BinaryHeap<ScoredJob>),
}

impl PageOrder {
    fn new(strategy: TraversalStrategy) -> Self {
        match strategy {
            TraversalStrategy::Bfs => PageOrder::Fifo(VecDeque::new()),
            TraversalStrategy::Dfs => PageOrder::Lifo(Vec::new()),
            TraversalStrategy::BestFirst => PageOrder::Scored(BinaryHeap::new()),
        }
    }

    fn push(&mut self, job: Job) {
        match self {
            PageOrder::Fifo(q) => q.push_back(job),
            PageOrder::Lifo(s) => s.push(job),
            PageOrder::Scored(h) => h.push(ScoredJob(job)),
        }
    }

    fn pop(&mut self) -> Option<Job> {
        match self {
            PageOrder::Fifo(q) => q.pop_front(),
            PageOrder::Lifo(s) => s.pop(),
            PageOrder::Scored(h) => h.pop().map(|s| s.0),
        }
    }
}

struct CrawlEntry {
    record: Mutex<CrawlRecord>,
    cancelled: AtomicBool,
    finished: AtomicBool,
    kickoff: Mutex<VecDeque<Job>>,
    pages: Mutex<PageOrder>,
    jobs: Mutex<HashMap<String, JobRecord>>,
    completed_order: Mutex<Vec<String>>,
}

/// The job queue and crawl record store. `Arc<Self>` is shared across
/// worker tasks; internal mutability is via `DashMap`/`Mutex` so callers
/// never need `&mut`.
pub struct JobStore {
    crawls: DashMap<String, Arc<CrawlEntry>>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            crawls: DashMap::new(),
        }
    }

    /// Registers a new crawl and returns its id (`crawl:{id}`). `strategy`
    /// fixes how that crawl's page jobs dequeue for its whole lifetime.
    pub fn create_crawl(&self, start_url: String, strategy: TraversalStrategy) -> String {
        let crawl_id = Uuid::new_v4().to_string();
        self.crawls.insert(
            crawl_id.clone(),
            Arc::new(CrawlEntry {
                record: Mutex::new(CrawlRecord::new(crawl_id.clone(), start_url)),
                cancelled: AtomicBool::new(false),
                finished: AtomicBool::new(false),
                kickoff: Mutex::new(VecDeque::new()),
                pages: Mutex::new(PageOrder::new(strategy)),
                jobs: Mutex::new(HashMap::new()),
                completed_order: Mutex::new(Vec::new()),
            }),
        );
        crawl_id
    }

    pub async fn record(&self, crawl_id: &str) -> Option<CrawlRecord> {
        let entry = self.crawls.get(crawl_id)?;
        Some(entry.record.lock().await.clone())
    }

    /// Enqueues `job` onto its crawl's own queue — kickoff jobs into the
    /// always-first kickoff queue, page jobs into that crawl's strategy
    /// ordering — and records it `Pending` for `listByCrawl`/`jobState`.
    pub async fn enqueue(&self, job: Job) {
        let Some(entry) = self.crawls.get(&job.crawl_id) else {
            return;
        };
        entry.record.lock().await.pages_queued += 1;
        entry.jobs.lock().await.insert(
            job.id.clone(),
            JobRecord {
                job: job.clone(),
                state: JobState::Pending,
                result: None,
                error: None,
                finished_at: None,
            },
        );
        match job.priority {
            JobPriority::Kickoff => entry.kickoff.lock().await.push_back(job),
            JobPriority::Page => entry.pages.lock().await.push(job),
        }
    }

    /// Pops the next job for `crawl_id` per that crawl's strategy, kickoff
    /// jobs first. Returns `None` for a cancelled or unknown crawl.
    pub async fn dequeue(&self, crawl_id: &str) -> Option<Job> {
        let entry = self.crawls.get(crawl_id)?.clone();
        if entry.cancelled.load(Ordering::SeqCst) {
            return None;
        }
        let job = {
            let mut kickoff = entry.kickoff.lock().await;
            match kickoff.pop_front() {
                Some(job) => job,
                None => {
                    drop(kickoff);
                    entry.pages.lock().await.pop()?
                }
            }
        };
        if let Some(rec) = entry.jobs.lock().await.get_mut(&job.id) {
            rec.state = JobState::InFlight;
        }
        Some(job)
    }

    /// Marks `job_id` completed with `result`, records it in completion
    /// order for `listByCrawl`, and bumps the crawl's done count.
    pub async fn complete(&self, crawl_id: &str, job_id: &str, result: JobResult) {
        let Some(entry) = self.crawls.get(crawl_id) else {
            return;
        };
        {
            let mut jobs = entry.jobs.lock().await;
            if let Some(rec) = jobs.get_mut(job_id) {
                rec.state = JobState::Completed;
                rec.result = Some(result);
                rec.finished_at = Some(Utc::now());
            }
        }
        entry.completed_order.lock().await.push(job_id.to_string());
        entry.record.lock().await.pages_done += 1;
    }

    /// Marks `job_id` failed with `error`. A failed job still counts toward
    /// `pages_done` so the crawl can reach a terminal state.
    pub async fn fail(&self, crawl_id: &str, job_id: &str, error: String) {
        let Some(entry) = self.crawls.get(crawl_id) else {
            return;
        };
        {
            let mut jobs = entry.jobs.lock().await;
            if let Some(rec) = jobs.get_mut(job_id) {
                rec.state = JobState::Failed;
                rec.error = Some(error);
                rec.finished_at = Some(Utc::now());
            }
        }
        entry.record.lock().await.pages_done += 1;
    }

    /// Looks up one job's lifecycle state within `crawl_id`.
    pub async fn job_state(&self, crawl_id: &str, job_id: &str) -> Option<JobState> {
        let entry = self.crawls.get(crawl_id)?;
        let jobs = entry.jobs.lock().await;
        jobs.get(job_id).map(|r| r.state)
    }

    /// Pages through completed job records for `crawl_id` in completion
    /// order, skipping `skip` and returning at most `limit`.
    pub async fn list_by_crawl(&self, crawl_id: &str, skip: usize, limit: usize) -> Vec<JobRecord> {
        let Some(entry) = self.crawls.get(crawl_id) else {
            return Vec::new();
        };
        let order = entry.completed_order.lock().await;
        let jobs = entry.jobs.lock().await;
        order
            .iter()
            .skip(skip)
            .take(limit)
            .filter_map(|id| jobs.get(id).cloned())
            .collect()
    }

    /// Every on-disk path a completed job for `crawl_id` exported, in
    /// completion order.
    pub async fn exported_files(&self, crawl_id: &str) -> Vec<String> {
        let Some(entry) = self.crawls.get(crawl_id) else {
            return Vec::new();
        };
        let order = entry.completed_order.lock().await;
        let jobs = entry.jobs.lock().await;
        order
            .iter()
            .filter_map(|id| jobs.get(id))
            .filter_map(|rec| rec.result.as_ref().and_then(|r| r.exported_file.clone()))
            .collect()
    }

    pub fn cancel(&self, crawl_id: &str) {
        if let Some(entry) = self.crawls.get(crawl_id) {
            entry.cancelled.store(true, Ordering::SeqCst);
        }
    }

    pub fn is_cancelled(&self, crawl_id: &str) -> bool {
        self.crawls
            .get(crawl_id)
            .is_some_and(|e| e.cancelled.load(Ordering::SeqCst))
    }

    pub async fn finish(&self, crawl_id: &str, error: Option<String>) {
        if let Some(entry) = self.crawls.get(crawl_id) {
            entry.finished.store(true, Ordering::SeqCst);
            let mut record = entry.record.lock().await;
            record.finished_at = Some(Utc::now());
            record.error = error;
        }
    }

    pub fn is_finished(&self, crawl_id: &str) -> bool {
        self.crawls
            .get(crawl_id)
            .is_some_and(|e| e.finished.load(Ordering::SeqCst))
    }

    /// Derives `cancelled | completed | scraping` the way the controller's
    /// `status` operation reports it.
    pub fn state(&self, crawl_id: &str) -> Option<CrawlState> {
        let entry = self.crawls.get(crawl_id)?;
        if entry.cancelled.load(Ordering::SeqCst) {
            Some(CrawlState::Cancelled)
        } else if entry.finished.load(Ordering::SeqCst) {
            Some(CrawlState::Completed)
        } else {
            Some(CrawlState::Scraping)
        }
    }
}
