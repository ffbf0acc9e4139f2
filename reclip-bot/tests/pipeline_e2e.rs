//! End-to-end runs of the polling cycle against in-memory collaborators.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reclip_bot::fetch::MediaFetch;
use reclip_bot::pace::Pacing;
use reclip_bot::pipeline::MentionPipeline;
use reclip_bot::poller::{PollState, PollStatePersist, Poller};
use reclip_bot::sink::CloudLinkSink;
use reclip_bot::sweeper::Sweeper;
use reclip_http::{HttpError, StatusCode};
use reclip_social::twitter::types::{
    ExtendedEntities, MediaEntity, Status, User, Variant, VideoInfo,
};
use reclip_social::{SocialClient, SocialError};
use reclip_storage::{RemoteFile, StorageClient, StorageError};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Platform-format timestamp `secs_ago` seconds in the past.
fn created_secs_ago(secs: i64) -> String {
    (Utc::now() - Duration::seconds(secs))
        .format("%a %b %d %H:%M:%S %z %Y")
        .to_string()
}

fn mention(id: &str, screen_name: &str, in_reply_to: Option<&str>, created_at: String) -> Status {
    Status {
        id: id.to_string(),
        text: Some(format!("@reclip hello from {screen_name}")),
        created_at,
        in_reply_to_status_id: in_reply_to.map(str::to_string),
        user: User {
            screen_name: screen_name.to_string(),
            name: None,
        },
        extended_entities: None,
    }
}

fn video_source(id: &str, author: &str, variant_urls: &[&str]) -> Status {
    Status {
        id: id.to_string(),
        text: Some("look at this".into()),
        created_at: "Mon May 01 08:00:00 +0000 2023".into(),
        in_reply_to_status_id: None,
        user: User {
            screen_name: author.to_string(),
            name: None,
        },
        extended_entities: Some(ExtendedEntities {
            media: vec![MediaEntity {
                kind: Some("video".into()),
                video_info: Some(VideoInfo {
                    duration_millis: Some(12_000),
                    variants: variant_urls
                        .iter()
                        .map(|url| Variant {
                            content_type: "video/mp4".into(),
                            url: (*url).to_string(),
                            bitrate: Some(832_000),
                        })
                        .collect(),
                }),
            }],
        }),
    }
}

#[derive(Default)]
struct FakeSocial {
    batches: Mutex<VecDeque<Vec<Status>>>,
    sources: HashMap<String, Status>,
    seen_since_ids: Mutex<Vec<Option<String>>>,
    replies: Mutex<Vec<(String, String)>>,
    favorites: Mutex<Vec<String>>,
}

impl FakeSocial {
    fn with_batches(batches: Vec<Vec<Status>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            ..Default::default()
        }
    }

    fn with_source(mut self, source: Status) -> Self {
        self.sources.insert(source.id.clone(), source);
        self
    }
}

#[async_trait]
impl SocialClient for FakeSocial {
    async fn mentions(
        &self,
        _count: u32,
        since_id: Option<&str>,
    ) -> Result<Vec<Status>, SocialError> {
        self.seen_since_ids
            .lock()
            .unwrap()
            .push(since_id.map(str::to_string));
        Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn status(&self, id: &str) -> Result<Status, SocialError> {
        self.sources
            .get(id)
            .cloned()
            .ok_or_else(|| SocialError::Api(format!("no status {id}")))
    }

    async fn reply(&self, in_reply_to: &str, text: &str) -> Result<Status, SocialError> {
        self.replies
            .lock()
            .unwrap()
            .push((in_reply_to.to_string(), text.to_string()));
        Ok(mention("90001", "reclip", Some(in_reply_to), created_secs_ago(0)))
    }

    async fn favorite(&self, status_id: &str) -> Result<(), SocialError> {
        self.favorites.lock().unwrap().push(status_id.to_string());
        Ok(())
    }

    async fn verify_credentials(&self) -> Result<User, SocialError> {
        Ok(User {
            screen_name: "reclip".into(),
            name: None,
        })
    }
}

struct FakeFetch {
    bodies: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl MediaFetch for FakeFetch {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| HttpError::Api {
                status: StatusCode::NOT_FOUND,
                message: format!("no media at {url}"),
                request_id: "-".into(),
            })
    }
}

/// Upload-and-link storage fake that counts listings so tests can assert
/// how many sweeps ran.
#[derive(Default)]
struct CountingStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    list_calls: Mutex<usize>,
}

#[async_trait]
impl StorageClient for CountingStorage {
    async fn upload(&self, data: Vec<u8>, name: &str) -> Result<String, StorageError> {
        let path = format!("/destination/{name}");
        self.files.lock().unwrap().insert(path.clone(), data);
        Ok(path)
    }

    async fn temporary_link(&self, path: &str) -> Result<String, StorageError> {
        Ok(format!("https://dl.example{path}"))
    }

    async fn list_folder(&self) -> Result<Vec<RemoteFile>, StorageError> {
        *self.list_calls.lock().unwrap() += 1;
        Ok(Vec::new())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }
}

struct Harness {
    social: Arc<FakeSocial>,
    storage: Arc<CountingStorage>,
    poller: Poller,
}

fn harness(social: FakeSocial, bodies: HashMap<String, Vec<u8>>, max_age_secs: u64) -> Harness {
    let social = Arc::new(social);
    let storage = Arc::new(CountingStorage::default());
    let pipeline = MentionPipeline::new(
        social.clone(),
        Arc::new(FakeFetch { bodies }),
        Arc::new(CloudLinkSink::new(storage.clone())),
        Sweeper::new(storage.clone(), 60, chrono_tz::UTC),
    )
    .with_pacing(Pacing::none())
    .with_max_mention_age(max_age_secs);
    let poller = Poller::new(
        social.clone(),
        pipeline,
        std::time::Duration::from_secs(10),
        10,
    )
    .with_pacing(Pacing::none());
    Harness {
        social,
        storage,
        poller,
    }
}

#[tokio::test]
async fn one_valid_variant_means_one_reply_one_favorite_one_sweep() {
    let url = "https://v.example.com/vid/720x1280/clip.mp4";
    let social = FakeSocial::with_batches(vec![vec![mention(
        "9000",
        "bob",
        Some("100"),
        created_secs_ago(60),
    )]])
    .with_source(video_source("100", "alice", &[url]));
    let bodies = HashMap::from([(url.to_string(), b"clip-bytes".to_vec())]);
    let h = harness(social, bodies, 100_000);

    let next = h.poller.cycle(PollState::default()).await;

    assert_eq!(next.last_id.as_deref(), Some("9000"));

    let replies = h.social.replies.lock().unwrap().clone();
    assert_eq!(replies.len(), 1);
    let (reply_to, text) = &replies[0];
    assert_eq!(reply_to, "9000");
    assert!(text.contains("Hi @bob!"));
    assert!(text.contains(
        "720x1280: https://dl.example/destination/alice_20230501_100_720x1280.mp4"
    ));
    assert!(text.contains("available for 1 hour"));

    assert_eq!(h.social.favorites.lock().unwrap().clone(), vec!["9000"]);
    assert_eq!(*h.storage.list_calls.lock().unwrap(), 1);
    assert!(h
        .storage
        .files
        .lock()
        .unwrap()
        .contains_key("/destination/alice_20230501_100_720x1280.mp4"));
}

#[tokio::test]
async fn source_without_video_gets_no_reply_and_no_favorite() {
    let mut source = video_source("100", "alice", &[]);
    source.extended_entities = None;
    let social = FakeSocial::with_batches(vec![vec![mention(
        "9000",
        "bob",
        Some("100"),
        created_secs_ago(60),
    )]])
    .with_source(source);
    let h = harness(social, HashMap::new(), 100_000);

    let next = h.poller.cycle(PollState::default()).await;

    // The cursor still advances: the mention was seen, there is just
    // nothing to say about it.
    assert_eq!(next.last_id.as_deref(), Some("9000"));
    assert!(h.social.replies.lock().unwrap().is_empty());
    assert!(h.social.favorites.lock().unwrap().is_empty());
    assert_eq!(*h.storage.list_calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn empty_batch_leaves_the_cursor_untouched() {
    let social = FakeSocial::with_batches(vec![vec![]]);
    let h = harness(social, HashMap::new(), 100_000);

    let state = PollState {
        last_id: Some("42".into()),
    };
    let next = h.poller.cycle(state.clone()).await;

    assert_eq!(next, state);
    assert_eq!(
        h.social.seen_since_ids.lock().unwrap().clone(),
        vec![Some("42".to_string())]
    );
}

#[tokio::test]
async fn cursor_lands_on_the_newest_mention_by_date() {
    // Fetch order deliberately disagrees with timestamp order.
    let social = FakeSocial::with_batches(vec![vec![
        mention("7", "carol", None, created_secs_ago(300)),
        mention("5", "dave", None, created_secs_ago(30)),
        mention("6", "erin", None, created_secs_ago(120)),
    ]]);
    let h = harness(social, HashMap::new(), 100_000);

    let next = h.poller.cycle(PollState::default()).await;
    assert_eq!(next.last_id.as_deref(), Some("5"));
}

#[tokio::test]
async fn stale_mentions_are_skipped_without_any_side_effects() {
    let url = "https://v.example.com/vid/720x1280/clip.mp4";
    let social = FakeSocial::with_batches(vec![vec![mention(
        "9000",
        "bob",
        Some("100"),
        created_secs_ago(3600),
    )]])
    .with_source(video_source("100", "alice", &[url]));
    let bodies = HashMap::from([(url.to_string(), b"clip-bytes".to_vec())]);
    // Low-latency deployment: anything older than 20 seconds is ignored.
    let h = harness(social, bodies, 20);

    let next = h.poller.cycle(PollState::default()).await;

    assert_eq!(next.last_id.as_deref(), Some("9000"));
    assert!(h.social.replies.lock().unwrap().is_empty());
    assert!(h.social.favorites.lock().unwrap().is_empty());
    assert!(h.storage.files.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_variants_are_dropped_from_the_reply() {
    let good = "https://v.example.com/vid/480x640/small.mp4";
    let bad = "https://v.example.com/vid/720x1280/big.mp4";
    let social = FakeSocial::with_batches(vec![vec![mention(
        "9000",
        "bob",
        Some("100"),
        created_secs_ago(60),
    )]])
    .with_source(video_source("100", "alice", &[bad, good]));
    // Only the small rendition is downloadable.
    let bodies = HashMap::from([(good.to_string(), b"small-bytes".to_vec())]);
    let h = harness(social, bodies, 100_000);

    h.poller.cycle(PollState::default()).await;

    let replies = h.social.replies.lock().unwrap().clone();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].1.contains("480x640"));
    assert!(!replies[0].1.contains("720x1280"));
}

#[tokio::test]
async fn all_variants_failing_means_no_reply() {
    let url = "https://v.example.com/vid/720x1280/clip.mp4";
    let social = FakeSocial::with_batches(vec![vec![mention(
        "9000",
        "bob",
        Some("100"),
        created_secs_ago(60),
    )]])
    .with_source(video_source("100", "alice", &[url]));
    let h = harness(social, HashMap::new(), 100_000);

    h.poller.cycle(PollState::default()).await;

    assert!(h.social.replies.lock().unwrap().is_empty());
    assert!(h.social.favorites.lock().unwrap().is_empty());
}

struct RecordingHook {
    states: Mutex<Vec<PollState>>,
}

impl PollStatePersist for RecordingHook {
    fn advanced(&self, state: &PollState) {
        self.states.lock().unwrap().push(state.clone());
    }
}

#[tokio::test]
async fn persistence_hook_observes_every_advance() {
    let social = FakeSocial::with_batches(vec![
        vec![mention("5", "bob", None, created_secs_ago(60))],
        vec![],
    ]);
    let h = harness(social, HashMap::new(), 100_000);
    let hook = Arc::new(RecordingHook {
        states: Mutex::new(Vec::new()),
    });
    let poller = h.poller.with_persistence(hook.clone());

    let state = poller.cycle(PollState::default()).await;
    let state = poller.cycle(state).await;

    assert_eq!(state.last_id.as_deref(), Some("5"));
    // Only the advancing cycle notified the hook; the empty one did not.
    assert_eq!(
        hook.states.lock().unwrap().clone(),
        vec![PollState {
            last_id: Some("5".into())
        }]
    );
}
