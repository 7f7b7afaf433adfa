//! Traversal engine - breadth-first crawl orchestration
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the sitemap with the normalized root
//! - Processing the frontier one depth level at a time
//! - Coordinating robots.txt checks, fetching, retries, and extraction
//! - Discovering, classifying, and enqueuing outbound links
//! - Handling cancellation and the crawl deadline
//!
//! The engine is the only writer of the [`Sitemap`]. Workers for a level run
//! concurrently and only return values; their outcomes are applied in
//! discovery order once the whole level has finished, which keeps the
//! first-discovery-wins rule deterministic under concurrency.

use crate::config::{validate, Config};
use crate::crawler::parser::{extract, ExtractedPage};
use crate::crawler::scheduler::Politeness;
use crate::crawler::{build_http_client, fetch_url, Credentials, FetchResult};
use crate::robots::{fetch_robots, RobotsCache};
use crate::sitemap::{PageId, PageMetadata, Sitemap};
use crate::state::{FetchFailure, FetchStatus, SkipReason};
use crate::url::{host_key, CrawlScope, NormalizedUrl, Normalizer};
use crate::{ConfigError, SitemapError};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Outcome of one page worker
#[derive(Debug)]
enum PageOutcome {
    /// Cancellation arrived before the first request was sent
    Cancelled,

    /// An HTML page was fetched and parsed
    Fetched {
        final_url: String,
        status_code: u16,
        content_type: Option<String>,
        page: ExtractedPage,
    },

    /// A non-HTML resource was fetched; it becomes a leaf
    Leaf {
        final_url: Option<String>,
        status_code: Option<u16>,
        content_type: String,
    },

    /// All attempts failed
    Failed {
        failure: FetchFailure,
        final_url: Option<String>,
        status_code: Option<u16>,
    },
}

/// Main crawler structure
pub struct Crawler {
    config: Arc<Config>,
    client: Client,
    credentials: Option<Credentials>,
    normalizer: Normalizer,
    root: NormalizedUrl,
    scope: CrawlScope,
    politeness: Politeness,
    robots: RobotsCache,
    cancel: CancellationToken,
}

impl Crawler {
    /// Creates a new crawler instance
    ///
    /// # Arguments
    ///
    /// * `config` - The full configuration; the root URL must be set
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(SitemapError::InvalidRoot)` - The root URL cannot be normalized
    /// * `Err(SitemapError)` - Invalid configuration or HTTP client failure
    pub fn new(config: Config) -> Result<Self, SitemapError> {
        let normalizer = Normalizer::from_config(&config.crawler);

        // Step 1: Normalize the root before anything else
        let raw_root = config
            .crawler
            .root_url
            .clone()
            .ok_or_else(|| ConfigError::Validation("a root URL is required".to_string()))?;
        let root = normalizer
            .normalize(&raw_root, None)
            .map_err(|source| SitemapError::InvalidRoot {
                url: raw_root.clone(),
                source,
            })?;

        // Step 2: Validate the rest of the configuration
        validate(&config)?;

        // Step 3: Build HTTP client
        let client = build_http_client(&config.http)?;
        let credentials = Credentials::from_config(&config.http);
        let politeness = Politeness::new(Duration::from_millis(config.crawler.politeness_delay_ms));
        let scope = CrawlScope::new(&root);

        Ok(Self {
            config: Arc::new(config),
            client,
            credentials,
            normalizer,
            root,
            scope,
            politeness,
            robots: RobotsCache::new(),
            cancel: CancellationToken::new(),
        })
    }

    /// Token that stops the crawl when cancelled
    ///
    /// After cancellation no new request starts. Requests already sent run to
    /// completion and the partial sitemap is returned.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The normalized root URL
    pub fn root(&self) -> &NormalizedUrl {
        &self.root
    }

    /// Runs the crawl to completion, cancellation, or deadline
    ///
    /// Levels are processed strictly in order: every page at depth `d`
    /// reaches a terminal state before any page at depth `d + 1` is fetched.
    ///
    /// # Returns
    ///
    /// The sitemap, complete or partial. Individual page failures are
    /// recorded in it and never surface as errors.
    pub async fn run(&mut self) -> Result<Sitemap, SitemapError> {
        let start_time = Instant::now();
        let mut sitemap = Sitemap::new(self.root.clone(), self.config.crawler.max_depth);

        tracing::info!(
            "Starting crawl of {} (max depth: {})",
            self.root,
            self.config
                .crawler
                .max_depth
                .map_or_else(|| "unlimited".to_string(), |d| d.to_string())
        );

        let deadline = self.config.crawler.deadline_secs.map(|secs| {
            let token = self.cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                tracing::warn!("Crawl deadline of {}s reached, stopping", secs);
                token.cancel();
            })
        });

        let mut level = vec![sitemap.root_id()];
        let mut depth = 0u32;

        while !level.is_empty() {
            if self.cancel.is_cancelled() {
                tracing::warn!(
                    "Crawl cancelled with {} pages left at depth {}",
                    level.len(),
                    depth
                );
                break;
            }

            tracing::info!("Crawling depth {}: {} pages", depth, level.len());

            let batch = self.admit_level(&mut sitemap, &level).await?;
            let outcomes = self.fetch_level(batch).await;

            let mut next_level = Vec::new();
            for (id, outcome) in outcomes {
                self.apply_outcome(&mut sitemap, id, outcome, &mut next_level)?;
            }

            level = next_level;
            depth += 1;
        }

        if let Some(handle) = deadline {
            handle.abort();
        }

        tracing::info!(
            "Crawl completed: {} pages fetched, {} URLs known in {:?}",
            sitemap.visit_order().len(),
            sitemap.len(),
            start_time.elapsed()
        );

        Ok(sitemap)
    }

    /// Applies robots.txt to a level and returns the pages to fetch
    ///
    /// Fetches robots.txt for any host not seen yet. Disallowed pages are
    /// marked skipped here and never reach a worker.
    async fn admit_level(
        &mut self,
        sitemap: &mut Sitemap,
        level: &[PageId],
    ) -> Result<Vec<(PageId, NormalizedUrl, String)>, SitemapError> {
        let mut batch = Vec::with_capacity(level.len());

        for &id in level {
            let url = match sitemap.get_by_id(id) {
                Some(record) => record.url.clone(),
                None => return Err(SitemapError::UnknownPage(id)),
            };
            let host = host_key(url.as_url()).unwrap_or_else(|| url.host().to_string());

            if self.config.crawler.respect_robots {
                if !self.robots.contains(&host) {
                    let robots = fetch_robots(&self.client, url.as_url()).await;
                    if let Some(delay) = robots.crawl_delay(&self.config.http.user_agent) {
                        tracing::debug!("robots.txt for {} sets Crawl-delay {:?}", host, delay);
                        self.politeness.set_crawl_delay(&host, delay).await;
                    }
                    self.robots.insert(host.clone(), robots);
                }

                if !self
                    .robots
                    .is_allowed(&host, url.as_str(), &self.config.http.user_agent)
                {
                    tracing::info!("URL {} disallowed by robots.txt", url);
                    sitemap.transition(id, FetchStatus::Skipped(SkipReason::RobotsDisallowed))?;
                    continue;
                }
            }

            batch.push((id, url, host));
        }

        Ok(batch)
    }

    /// Fetches a level with bounded concurrency
    ///
    /// Workers finish in any order; the outcomes come back sorted by their
    /// position in the level.
    async fn fetch_level(&self, batch: Vec<(PageId, NormalizedUrl, String)>) -> Vec<(PageId, PageOutcome)> {
        let concurrency = self.config.crawler.max_concurrent_fetches.max(1) as usize;

        let mut outcomes: Vec<(usize, PageId, PageOutcome)> = stream::iter(batch.into_iter().enumerate())
            .map(|(position, (id, url, host))| async move {
                let outcome = self.process_page(&url, &host).await;
                (position, id, outcome)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        outcomes.sort_by_key(|(position, _, _)| *position);
        outcomes
            .into_iter()
            .map(|(_, id, outcome)| (id, outcome))
            .collect()
    }

    /// Fetches one page with retries and extracts it
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Network error, timeout, HTTP 429, HTTP 5xx | Retry with exponential backoff |
    /// | Other HTTP status | Fail immediately |
    /// | Non-HTML content | Leaf, no retry |
    async fn process_page(&self, url: &NormalizedUrl, host: &str) -> PageOutcome {
        let max_retries = self.config.crawler.max_retries;
        let mut attempt = 0u32;

        loop {
            // Step 1: Wait for our politeness slot unless cancelled
            tokio::select! {
                biased;
                _ = self.cancel.cancelled(), if attempt == 0 => return PageOutcome::Cancelled,
                _ = self.politeness.wait_turn(host) => {}
            }

            // Step 2: Fetch
            tracing::debug!("Fetching {} (attempt {}/{})", url, attempt + 1, max_retries + 1);
            let result = fetch_url(
                &self.client,
                url.as_str(),
                self.credentials.as_ref(),
                self.config.http.max_body_bytes,
            )
            .await;

            match result {
                FetchResult::Success {
                    final_url,
                    status_code,
                    content_type,
                    body,
                } => {
                    // Step 3: Extract relative to where we actually ended up
                    let base = Url::parse(&final_url).unwrap_or_else(|_| url.as_url().clone());
                    let page = extract(&body, &base, self.config.crawler.summary_length);
                    return PageOutcome::Fetched {
                        final_url,
                        status_code,
                        content_type,
                        page,
                    };
                }
                FetchResult::Failed {
                    failure: FetchFailure::NotHtml { content_type },
                    final_url,
                    status_code,
                } => {
                    return PageOutcome::Leaf {
                        final_url,
                        status_code,
                        content_type,
                    };
                }
                FetchResult::Failed {
                    failure,
                    final_url,
                    status_code,
                } => {
                    if !failure.is_transient() || attempt >= max_retries || self.cancel.is_cancelled() {
                        return PageOutcome::Failed {
                            failure,
                            final_url,
                            status_code,
                        };
                    }

                    let backoff = retry_backoff(self.config.crawler.retry_backoff_ms, attempt);
                    tracing::debug!("Fetch of {} failed ({}), retrying in {:?}", url, failure, backoff);

                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            return PageOutcome::Failed {
                                failure,
                                final_url,
                                status_code,
                            };
                        }
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Writes a worker outcome into the sitemap and grows the next level
    fn apply_outcome(
        &self,
        sitemap: &mut Sitemap,
        id: PageId,
        outcome: PageOutcome,
        next_level: &mut Vec<PageId>,
    ) -> Result<(), SitemapError> {
        let url = match sitemap.get_by_id(id) {
            Some(record) => record.url.clone(),
            None => return Err(SitemapError::UnknownPage(id)),
        };

        match outcome {
            PageOutcome::Cancelled => {
                tracing::debug!("Not fetching {} after cancellation", url);
            }

            PageOutcome::Fetched {
                final_url,
                status_code,
                content_type,
                page,
            } => {
                tracing::info!(
                    "Fetched {} ({} links, title: {})",
                    url,
                    page.links.len(),
                    page.title.as_deref().unwrap_or("-")
                );

                sitemap.transition(id, FetchStatus::Fetching)?;
                sitemap.record(
                    id,
                    FetchStatus::Fetched,
                    PageMetadata {
                        title: page.title.clone(),
                        summary: page.summary.clone(),
                        status_code: Some(status_code),
                        content_type,
                        final_url: redirected(&url, final_url),
                    },
                )?;

                self.handle_discovered_links(sitemap, id, &page, next_level)?;
            }

            PageOutcome::Leaf {
                final_url,
                status_code,
                content_type,
            } => {
                tracing::info!("Fetched {} as leaf ({})", url, content_type);

                sitemap.transition(id, FetchStatus::Fetching)?;
                sitemap.record(
                    id,
                    FetchStatus::Fetched,
                    PageMetadata {
                        status_code,
                        content_type: Some(content_type).filter(|ct| !ct.is_empty()),
                        final_url: final_url.and_then(|final_url| redirected(&url, final_url)),
                        ..PageMetadata::default()
                    },
                )?;
            }

            PageOutcome::Failed {
                failure,
                final_url,
                status_code,
            } => {
                tracing::info!("Failed to fetch {}: {}", url, failure);

                sitemap.transition(id, FetchStatus::Fetching)?;
                sitemap.record(
                    id,
                    FetchStatus::Failed(failure),
                    PageMetadata {
                        status_code,
                        final_url: final_url.and_then(|final_url| redirected(&url, final_url)),
                        ..PageMetadata::default()
                    },
                )?;
            }
        }

        Ok(())
    }

    /// Handles discovered links from a page
    ///
    /// This method:
    /// 1. Normalizes links against the page's base, dropping bad ones
    /// 2. Registers each target (first discovery wins)
    /// 3. Classifies new targets: off-site, too deep, or next level
    /// 4. Records the page's outbound edges
    fn handle_discovered_links(
        &self,
        sitemap: &mut Sitemap,
        from: PageId,
        page: &ExtractedPage,
        next_level: &mut Vec<PageId>,
    ) -> Result<(), SitemapError> {
        let mut targets = Vec::with_capacity(page.links.len());

        for link in &page.links {
            // Normalize URL
            let normalized = match self.normalizer.resolve(link, &page.base) {
                Ok(n) => n,
                Err(e) => {
                    tracing::trace!("Skipping link {}: {}", link, e);
                    continue;
                }
            };

            let in_scope = self.scope.contains(&normalized);
            let (target, is_new) = sitemap.discover(normalized, from)?;
            targets.push(target);

            if !is_new {
                continue;
            }

            let Some(record) = sitemap.get_by_id(target) else {
                return Err(SitemapError::UnknownPage(target));
            };
            let too_deep = self
                .config
                .crawler
                .max_depth
                .is_some_and(|max| record.depth > max);

            if !in_scope {
                tracing::trace!("Not following off-site link {}", record.url);
                sitemap.transition(target, FetchStatus::Skipped(SkipReason::OutOfScope))?;
            } else if too_deep {
                tracing::trace!("Not following {} beyond max depth", record.url);
                sitemap.transition(target, FetchStatus::Skipped(SkipReason::DepthExceeded))?;
            } else {
                tracing::trace!("Enqueued {} at depth {}", record.url, record.depth);
                next_level.push(target);
            }
        }

        sitemap.add_edges(from, &targets)
    }
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl.
///
/// # Arguments
///
/// * `config` - The configuration, with a root URL
///
/// # Returns
///
/// * `Ok(Sitemap)` - The traversal result
/// * `Err(SitemapError)` - Invalid root or configuration
pub async fn crawl(config: Config) -> Result<Sitemap, SitemapError> {
    Crawler::new(config)?.run().await
}

/// Backoff before retry number `attempt + 1`
fn retry_backoff(base_ms: u64, attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor))
}

/// The final URL, if a redirect moved the page
fn redirected(url: &NormalizedUrl, final_url: String) -> Option<String> {
    if final_url == url.as_str() {
        None
    } else {
        Some(final_url)
    }
}
