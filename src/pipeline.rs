use kloner_core::{ClonedPost, CoreError, StreakCounter};
use llm_interface::TitleGenerator;
use reddit_client::{PostFetcher, RequestGeneration};
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone)]
pub enum CloneOutcome {
    Applied { cloned: ClonedPost, streak: u64 },
    /// A newer run started while this one was in flight; its result was dropped.
    Superseded,
}

/// Fetch, then retitle. Only the newest run may publish into `latest`.
pub struct ClonePipeline<G> {
    fetcher: PostFetcher,
    titles: G,
    streak: StreakCounter,
    generation: RequestGeneration,
    latest: RwLock<Option<ClonedPost>>,
}

impl<G: TitleGenerator> ClonePipeline<G> {
    pub fn new(fetcher: PostFetcher, titles: G, streak: StreakCounter) -> Self {
        Self {
            fetcher,
            titles,
            streak,
            generation: RequestGeneration::new(),
            latest: RwLock::new(None),
        }
    }

    pub async fn latest(&self) -> Option<ClonedPost> {
        self.latest.read().await.clone()
    }

    pub async fn run(&self, url: &str) -> Result<CloneOutcome, CoreError> {
        let ticket = self.generation.begin();

        let post = self.fetcher.fetch_post(url).await?;
        if !self.generation.is_current(ticket) {
            info!("Discarding post {} from superseded run {}", post.id, ticket.value());
            return Ok(CloneOutcome::Superseded);
        }

        info!("Generating title with {}", self.titles.provider_name());
        let ai_title = self.titles.generate_title(&post.title, &post.selftext).await?;
        if !self.generation.is_current(ticket) {
            info!("Discarding title from superseded run {}", ticket.value());
            return Ok(CloneOutcome::Superseded);
        }

        let streak = self.streak.increment().await?;
        let cloned = ClonedPost { post, ai_title };
        *self.latest.write().await = Some(cloned.clone());
        Ok(CloneOutcome::Applied { cloned, streak })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::{Json, Router};
    use kloner_core::{AppConfig, LlmError};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedTitle {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl TitleGenerator for FixedTitle {
        fn provider_name(&self) -> &'static str {
            "fixed"
        }

        async fn generate_title(&self, title: &str, _body: &str) -> Result<String, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LlmError::EmptyResponse {
                    provider: "fixed".to_string(),
                }
                .into());
            }
            Ok(format!("AITA: {title}"))
        }
    }

    async fn spawn_reddit() -> String {
        let router = Router::new().route(
            "/r/test/comments/abc123/title/.json",
            get(|| async {
                Json(json!([{"kind": "Listing", "data": {"children": [{"kind": "t3", "data": {
                    "id": "abc123",
                    "title": "I kept the ladder",
                    "selftext": "Long story.",
                    "author": "[deleted]",
                    "subreddit": "test",
                    "created_utc": 1700000000.0,
                    "permalink": "/r/test/comments/abc123/title/"
                }}]}}]))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn pipeline(fail: bool, dir: &tempfile::TempDir) -> (ClonePipeline<FixedTitle>, Arc<AtomicUsize>) {
        let mut config = AppConfig::default();
        config.endpoints.reddit_www = spawn_reddit().await;
        config.endpoints.local_proxy = None;
        config.endpoints.mirror_relay = None;

        let calls = Arc::new(AtomicUsize::new(0));
        let titles = FixedTitle {
            calls: Arc::clone(&calls),
            fail,
        };
        let streak = StreakCounter::new(dir.path().join("streak.json"));
        let pipeline = ClonePipeline::new(PostFetcher::from_config(&config).unwrap(), titles, streak);
        (pipeline, calls)
    }

    const POST_URL: &str = "https://www.reddit.com/r/test/comments/abc123/title/";

    #[tokio::test]
    async fn test_run_publishes_title_and_bumps_streak() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, _) = pipeline(false, &dir).await;

        match pipeline.run(POST_URL).await.unwrap() {
            CloneOutcome::Applied { cloned, streak } => {
                assert_eq!(cloned.ai_title, "AITA: I kept the ladder");
                assert_eq!(cloned.post.id, "abc123");
                assert_eq!(streak, 1);
            }
            CloneOutcome::Superseded => panic!("single run must not be superseded"),
        }
        assert!(pipeline.latest().await.is_some());
    }

    #[tokio::test]
    async fn test_stale_run_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, calls) = pipeline(false, &dir).await;

        let (first, second) = tokio::join!(pipeline.run(POST_URL), pipeline.run(POST_URL));
        assert!(matches!(first.unwrap(), CloneOutcome::Superseded));
        assert!(matches!(second.unwrap(), CloneOutcome::Applied { streak: 1, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_title_failure_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, calls) = pipeline(true, &dir).await;

        assert!(pipeline.run(POST_URL).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(pipeline.latest().await.is_none());
        assert_eq!(StreakCounter::new(dir.path().join("streak.json")).current().await, 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_title_generation() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, calls) = pipeline(false, &dir).await;

        assert!(pipeline.run("   ").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
