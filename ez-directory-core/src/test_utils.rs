//! Test helpers
//!
//! A scripted in-memory [`DirectoryBackend`] plus factories for service contexts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ez_directory_backend::{
    AttributeBag, AttributeChange, Credential, DirectoryBackend, DirectoryError, DirectoryPath,
    DirectorySession, NativeOperation, Result, SearchRequest, SearchScope,
};

use crate::config::DirectoryConfig;
use crate::services::ServiceContext;

pub const DOMAIN: &str = "corp.example.com";
pub const ROOT_DN: &str = "DC=corp,DC=example,DC=com";

/// Scripted search answer: applies when the host matches (or is `None`) and the filter
/// contains `filter_contains`.
struct SearchRule {
    host: Option<String>,
    filter_contains: String,
    entries: Vec<AttributeBag>,
}

#[derive(Default)]
struct MockState {
    objects: HashMap<String, AttributeBag>,
    rules: Vec<SearchRule>,
    host_delays: HashMap<String, Duration>,
    host_failures: HashMap<String, DirectoryError>,
    panic_hosts: Vec<String>,
    commit_failure: Option<DirectoryError>,
    invoke_failure: Option<DirectoryError>,
    binds: Vec<Option<String>>,
    searches: Vec<(String, SearchRequest)>,
    commits: Vec<(String, Vec<AttributeChange>)>,
    operations: Vec<(String, NativeOperation)>,
}

fn key(dn: &str) -> String {
    dn.to_ascii_lowercase()
}

fn host_of(path: &DirectoryPath) -> String {
    path.host().unwrap_or("default").to_ascii_lowercase()
}

/// In-memory backend with per-host delays and failures that records everything it is asked.
#[derive(Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    open: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    /// Store an object readable (and writable) by its DN.
    pub fn add_object(&self, bag: AttributeBag) {
        self.with_state(|s| s.objects.insert(key(&bag.dn), bag));
    }

    pub fn object(&self, dn: &str) -> Option<AttributeBag> {
        self.with_state(|s| s.objects.get(&key(dn)).cloned())
    }

    /// Answer searches whose filter contains `filter_contains`, on any host.
    pub fn on_search(&self, filter_contains: &str, entries: Vec<AttributeBag>) {
        self.on_host_search(None, filter_contains, entries);
    }

    /// Like [`on_search`](Self::on_search) but only for sessions on `host`.
    pub fn on_host_search(
        &self,
        host: Option<&str>,
        filter_contains: &str,
        entries: Vec<AttributeBag>,
    ) {
        self.with_state(|s| {
            s.rules.push(SearchRule {
                host: host.map(str::to_ascii_lowercase),
                filter_contains: filter_contains.to_string(),
                entries,
            });
        });
    }

    pub fn delay_host(&self, host: &str, delay: Duration) {
        self.with_state(|s| s.host_delays.insert(host.to_ascii_lowercase(), delay));
    }

    pub fn fail_host(&self, host: &str, err: DirectoryError) {
        self.with_state(|s| s.host_failures.insert(host.to_ascii_lowercase(), err));
    }

    pub fn panic_on_host(&self, host: &str) {
        self.with_state(|s| s.panic_hosts.push(host.to_ascii_lowercase()));
    }

    pub fn fail_commits(&self, err: DirectoryError) {
        self.with_state(|s| s.commit_failure = Some(err));
    }

    pub fn fail_invokes(&self, err: DirectoryError) {
        self.with_state(|s| s.invoke_failure = Some(err));
    }

    /// Bound usernames, `None` for ambient binds.
    pub fn binds(&self) -> Vec<Option<String>> {
        self.with_state(|s| s.binds.clone())
    }

    /// `(session path, filter)` of every search.
    pub fn searches(&self) -> Vec<(String, String)> {
        self.with_state(|s| {
            s.searches
                .iter()
                .map(|(path, req)| (path.clone(), req.filter.clone()))
                .collect()
        })
    }

    pub fn search_requests(&self) -> Vec<SearchRequest> {
        self.with_state(|s| s.searches.iter().map(|(_, req)| req.clone()).collect())
    }

    pub fn commits(&self) -> Vec<(String, Vec<AttributeChange>)> {
        self.with_state(|s| s.commits.clone())
    }

    pub fn operations(&self) -> Vec<(String, NativeOperation)> {
        self.with_state(|s| s.operations.clone())
    }

    /// Sessions currently alive.
    pub fn open_sessions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Sessions released through `close`.
    pub fn closed_sessions(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryBackend for MockBackend {
    fn id(&self) -> &'static str {
        "mock"
    }

    async fn open_session(
        &self,
        path: &DirectoryPath,
        credential: Option<&Credential>,
    ) -> Result<Box<dyn DirectorySession>> {
        let host = host_of(path);
        let (delay, failure, panics) = self.with_state(|s| {
            s.binds.push(credential.map(|c| c.username.clone()));
            (
                s.host_delays.get(&host).copied(),
                s.host_failures.get(&host).cloned(),
                s.panic_hosts.contains(&host),
            )
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        assert!(!panics, "scripted panic on {host}");
        if let Some(err) = failure {
            return Err(err);
        }
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            state: self.state.clone(),
            open: self.open.clone(),
            closed: self.closed.clone(),
            path: path.clone(),
            host,
        }))
    }
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
    open: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    path: DirectoryPath,
    host: String,
}

impl MockSession {
    fn no_such_object(&self, dn: &str) -> DirectoryError {
        DirectoryError::NoSuchObject {
            endpoint: self.host.clone(),
            dn: dn.to_string(),
            raw_message: None,
        }
    }
}

fn apply(bag: &mut AttributeBag, change: &AttributeChange) {
    match change {
        AttributeChange::Replace { attribute, values } => {
            bag.insert_text(attribute, values.clone());
        }
        AttributeChange::Add { attribute, values } => {
            let mut current = bag.text(attribute).to_vec();
            current.extend(values.iter().cloned());
            bag.insert_text(attribute, current);
        }
        AttributeChange::Delete { attribute, values } if values.is_empty() => {
            bag.remove(attribute);
        }
        AttributeChange::Delete { attribute, values } => {
            let current: Vec<String> = bag
                .text(attribute)
                .iter()
                .filter(|v| !values.contains(v))
                .cloned()
                .collect();
            bag.insert_text(attribute, current);
        }
    }
}

#[async_trait]
impl DirectorySession for MockSession {
    fn path(&self) -> &DirectoryPath {
        &self.path
    }

    async fn search(&mut self, request: &SearchRequest) -> Result<Vec<AttributeBag>> {
        let mut state = self.state.lock().unwrap();
        state
            .searches
            .push((self.path.to_string(), request.clone()));

        if request.scope == SearchScope::Base {
            let dn = request.base.as_deref().unwrap_or(self.path.dn());
            return state
                .objects
                .get(&key(dn))
                .cloned()
                .map(|bag| vec![bag])
                .ok_or_else(|| self.no_such_object(dn));
        }

        let host = self.host.clone();
        Ok(state
            .rules
            .iter()
            .find(|rule| {
                rule.host.as_ref().is_none_or(|h| *h == host)
                    && request.filter.contains(&rule.filter_contains)
            })
            .map(|rule| rule.entries.clone())
            .unwrap_or_default())
    }

    async fn commit(&mut self, changes: &[AttributeChange]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.commit_failure.clone() {
            return Err(err);
        }
        let dn = self.path.dn().to_string();
        state.commits.push((self.path.to_string(), changes.to_vec()));
        let bag = state
            .objects
            .get_mut(&key(&dn))
            .ok_or_else(|| self.no_such_object(&dn))?;
        for change in changes {
            apply(bag, change);
        }
        Ok(())
    }

    async fn invoke(&mut self, operation: &NativeOperation) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.invoke_failure.clone() {
            return Err(err);
        }
        let dn = self.path.dn().to_string();
        if !state.objects.contains_key(&key(&dn)) {
            return Err(self.no_such_object(&dn));
        }
        state
            .operations
            .push((self.path.to_string(), operation.clone()));
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

// ===== Factories =====

pub fn test_config() -> DirectoryConfig {
    DirectoryConfig::from_domain(DOMAIN).unwrap()
}

pub fn test_context(backend: &Arc<MockBackend>) -> Arc<ServiceContext> {
    test_context_with(backend, test_config())
}

pub fn test_context_with(backend: &Arc<MockBackend>, config: DirectoryConfig) -> Arc<ServiceContext> {
    Arc::new(ServiceContext::new(config, backend.clone()).unwrap())
}

/// A user entry as a search or read would return it.
pub fn user_bag(username: &str, ou: &str) -> AttributeBag {
    AttributeBag::new(format!("CN={username},OU={ou},{ROOT_DN}"))
        .with_text("sAMAccountName", [username])
        .with_text("userAccountControl", ["512"])
        .with_text("lockoutTime", ["0"])
        .with_text("badPwdCount", ["0"])
}

/// A domain controller computer entry.
pub fn controller_bag(name: &str) -> AttributeBag {
    AttributeBag::new(format!("CN={name},OU=Domain Controllers,{ROOT_DN}"))
        .with_text("name", [name])
        .with_text("primaryGroupID", ["516"])
}
