#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use readlog_engine::{
    fixed_today, BlobClient, BlobError, BlobSnapshot, DocumentLocator, RemoteDocumentStore,
    RetryPolicy, StoreEvent, StoreObserver, StoreSettings, VersionToken,
};
use tokio::sync::Barrier;

pub const TODAY: &str = "2024-06-01";

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(readlog_logging::initialize_for_tests);
}

pub fn locator() -> DocumentLocator {
    DocumentLocator::new("reader", "blog", "data/reading.json", "main")
}

pub fn settings(max_attempts: u32) -> StoreSettings {
    StoreSettings {
        retry: RetryPolicy {
            max_attempts,
            ..RetryPolicy::default()
        },
        today: fixed_today(TODAY),
        ..StoreSettings::default()
    }
}

#[derive(Default)]
struct State {
    content: Option<Vec<u8>>,
    revision: u64,
    gets: usize,
    puts: usize,
    forced_conflicts: usize,
    failing_put: Option<BlobError>,
    messages: Vec<String>,
}

impl State {
    fn version(&self) -> Option<VersionToken> {
        self.content
            .as_ref()
            .map(|_| VersionToken::new(format!("v{}", self.revision)))
    }
}

/// Versioned in-memory blob with compare-and-swap writes.
///
/// With a gate, the first `n` reads all observe the same snapshot and then
/// wait for each other, forcing concurrent writers onto one version.
#[derive(Default)]
pub struct MemoryBlobClient {
    state: Mutex<State>,
    gate: Option<(usize, Barrier)>,
}

impl MemoryBlobClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: &str) -> Self {
        let client = Self::new();
        client.replace(content);
        client
    }

    pub fn gated(readers: usize) -> Self {
        Self {
            gate: Some((readers, Barrier::new(readers))),
            ..Self::default()
        }
    }

    /// Overwrite the stored document as another writer would.
    pub fn replace(&self, content: &str) {
        let mut state = self.state.lock().unwrap();
        state.content = Some(content.as_bytes().to_vec());
        state.revision += 1;
    }

    pub fn force_conflicts(&self, count: usize) {
        self.state.lock().unwrap().forced_conflicts = count;
    }

    pub fn fail_next_put(&self, err: BlobError) {
        self.state.lock().unwrap().failing_put = Some(err);
    }

    pub fn content(&self) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .content
            .as_ref()
            .map(|bytes| String::from_utf8(bytes.clone()).unwrap())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.content().expect("document exists")).unwrap()
    }

    pub fn version(&self) -> Option<VersionToken> {
        self.state.lock().unwrap().version()
    }

    pub fn gets(&self) -> usize {
        self.state.lock().unwrap().gets
    }

    pub fn puts(&self) -> usize {
        self.state.lock().unwrap().puts
    }

    pub fn messages(&self) -> Vec<String> {
        self.state.lock().unwrap().messages.clone()
    }
}

#[async_trait::async_trait]
impl BlobClient for MemoryBlobClient {
    async fn get_blob(&self, _locator: &DocumentLocator) -> Result<BlobSnapshot, BlobError> {
        let (snapshot, wait) = {
            let mut state = self.state.lock().unwrap();
            state.gets += 1;
            let snapshot = BlobSnapshot {
                content: state.content.clone(),
                version: state.version(),
            };
            let wait = matches!(&self.gate, Some((readers, _)) if state.gets <= *readers);
            (snapshot, wait)
        };
        if wait {
            if let Some((_, barrier)) = &self.gate {
                barrier.wait().await;
            }
        }
        Ok(snapshot)
    }

    async fn put_blob(
        &self,
        _locator: &DocumentLocator,
        content: &[u8],
        message: &str,
        version: Option<&VersionToken>,
    ) -> Result<VersionToken, BlobError> {
        let mut state = self.state.lock().unwrap();
        state.puts += 1;
        if let Some(err) = state.failing_put.take() {
            return Err(err);
        }
        if state.forced_conflicts > 0 {
            state.forced_conflicts -= 1;
            return Err(BlobError::Conflict {
                message: "forced".to_string(),
            });
        }
        if state.version().as_ref() != version {
            return Err(BlobError::Conflict {
                message: "stale version".to_string(),
            });
        }
        state.content = Some(content.to_vec());
        state.revision += 1;
        state.messages.push(message.to_string());
        Ok(state.version().expect("just written"))
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<StoreEvent>>,
}

impl RecordingObserver {
    pub fn take(&self) -> Vec<StoreEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl StoreObserver for RecordingObserver {
    fn emit(&self, event: StoreEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn store(client: Arc<MemoryBlobClient>, max_attempts: u32) -> RemoteDocumentStore {
    RemoteDocumentStore::new(client, settings(max_attempts))
}
