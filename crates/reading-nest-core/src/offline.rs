//! Offline asset cache for the static app shell.
//!
//! A fixed manifest is fetched into a named cache on install. Same-origin GET
//! requests are answered cache-first, then from the network (storing what
//! comes back), then from the cached entry page, then with a plain
//! "Offline" body. Nothing else in the crate depends on this.

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use url::Url;

pub const CACHE_NAME: &str = "sloth-reading-nest:v1";

pub const ASSETS: [&str; 8] = [
    "./",
    "./index.html",
    "./styles.css",
    "./app.js",
    "./manifest.webmanifest",
    "./icon.svg",
    "./icon-192.png",
    "./icon-512.png",
];

pub const ENTRY_PAGE: &str = "./index.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Last-resort answer when neither cache nor network can help.
    pub fn offline() -> Self {
        Self::ok("Offline")
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network request for {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("invalid request URL '{0}'")]
    BadUrl(String),
}

/// Network access, injected so the cache can be driven without sockets.
pub trait Fetch {
    fn fetch(&self, url: &Url) -> Result<Response, FetchError>;
}

impl<F> Fetch for F
where
    F: Fn(&Url) -> Result<Response, FetchError>,
{
    fn fetch(&self, url: &Url) -> Result<Response, FetchError> {
        self(url)
    }
}

/// How a request was answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Served {
    /// Not a GET; left to the default network path.
    NotHandled,
    /// Cross-origin; fetched without touching the cache.
    Passthrough(Result<Response, FetchError>),
    Cached(Response),
    /// Fetched and stored.
    Network(Response),
    /// Network failed; the cached entry page stood in.
    EntryPage(Response),
    Offline(Response),
}

impl Served {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Served::NotHandled => None,
            Served::Passthrough(result) => result.as_ref().ok(),
            Served::Cached(r) | Served::Network(r) | Served::EntryPage(r) | Served::Offline(r) => {
                Some(r)
            }
        }
    }
}

type Entries = HashMap<String, Response>;

pub struct AssetCache<F: Fetch> {
    scope: Url,
    caches: BTreeMap<String, Entries>,
    fetcher: F,
}

impl<F: Fetch> AssetCache<F> {
    /// `scope` is the app's base URL; relative manifest entries resolve
    /// against it and its origin decides what is same-origin.
    pub fn new(scope: Url, fetcher: F) -> Self {
        Self {
            scope,
            caches: BTreeMap::new(),
            fetcher,
        }
    }

    pub fn cache_names(&self) -> Vec<&str> {
        self.caches.keys().map(String::as_str).collect()
    }

    /// Put an entry into a named cache.
    pub fn put(&mut self, cache: &str, url: &Url, response: Response) {
        self.caches
            .entry(cache.to_string())
            .or_default()
            .insert(cache_key(url), response);
    }

    /// Fetch the whole manifest into [`CACHE_NAME`]. All or nothing: if any
    /// asset fails, the cache is left as it was.
    pub fn install(&mut self) -> Result<usize, FetchError> {
        let mut fetched = Vec::with_capacity(ASSETS.len());
        for asset in ASSETS {
            let url = self.resolve(asset)?;
            let response = self.fetcher.fetch(&url)?;
            fetched.push((cache_key(&url), response));
        }
        let count = fetched.len();
        self.caches
            .entry(CACHE_NAME.to_string())
            .or_default()
            .extend(fetched);
        tracing::debug!(assets = count, cache = CACHE_NAME, "installed asset cache");
        Ok(count)
    }

    /// Drop every cache except [`CACHE_NAME`]. Returns the names removed.
    pub fn activate(&mut self) -> Vec<String> {
        let stale: Vec<String> = self
            .caches
            .keys()
            .filter(|name| name.as_str() != CACHE_NAME)
            .cloned()
            .collect();
        for name in &stale {
            self.caches.remove(name);
            tracing::debug!(cache = %name, "purged stale cache");
        }
        stale
    }

    pub fn handle(&mut self, method: &str, url: &str) -> Served {
        if !method.eq_ignore_ascii_case("GET") {
            return Served::NotHandled;
        }
        let url = match self.resolve(url) {
            Ok(url) => url,
            Err(e) => return Served::Passthrough(Err(e)),
        };
        if url.origin() != self.scope.origin() {
            return Served::Passthrough(self.fetcher.fetch(&url));
        }

        if let Some(hit) = self.lookup(&url) {
            return Served::Cached(hit.clone());
        }

        match self.fetcher.fetch(&url) {
            Ok(response) => {
                self.put(CACHE_NAME, &url, response.clone());
                Served::Network(response)
            }
            Err(e) => {
                tracing::debug!(error = %e, "network failed; falling back");
                let entry = self.resolve(ENTRY_PAGE).ok();
                match entry.and_then(|u| self.lookup(&u).cloned()) {
                    Some(page) => Served::EntryPage(page),
                    None => Served::Offline(Response::offline()),
                }
            }
        }
    }

    fn resolve(&self, url: &str) -> Result<Url, FetchError> {
        self.scope
            .join(url)
            .map_err(|_| FetchError::BadUrl(url.to_string()))
    }

    /// Match across every cache, like a browser's global cache lookup.
    fn lookup(&self, url: &Url) -> Option<&Response> {
        let key = cache_key(url);
        self.caches.values().find_map(|entries| entries.get(&key))
    }
}

fn cache_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    const SCOPE: &str = "https://nest.test/app/";

    fn scope() -> Url {
        Url::parse(SCOPE).unwrap()
    }

    /// Serves `body for <path>` while online and records every call.
    #[derive(Clone, Default)]
    struct FakeNet(Rc<NetState>);

    #[derive(Default)]
    struct NetState {
        offline: Cell<bool>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeNet {
        fn new() -> Self {
            Self::default()
        }

        fn set_online(&self, online: bool) {
            self.0.offline.set(!online);
        }

        fn calls(&self) -> Vec<String> {
            self.0.calls.borrow().clone()
        }
    }

    impl Fetch for FakeNet {
        fn fetch(&self, url: &Url) -> Result<Response, FetchError> {
            self.0.calls.borrow_mut().push(url.to_string());
            if self.0.offline.get() {
                Err(FetchError::Network {
                    url: url.to_string(),
                    message: "offline".into(),
                })
            } else {
                Ok(Response::ok(format!("body for {}", url.path())))
            }
        }
    }

    #[test]
    fn install_fetches_manifest() {
        let net = FakeNet::new();
        let mut cache = AssetCache::new(scope(), net.clone());
        assert_eq!(cache.install().unwrap(), ASSETS.len());
        assert_eq!(cache.cache_names(), vec![CACHE_NAME]);
        assert!(net
            .calls()
            .contains(&"https://nest.test/app/icon-512.png".to_string()));
    }

    #[test]
    fn install_is_all_or_nothing() {
        let net = FakeNet::new();
        net.set_online(false);
        let mut cache = AssetCache::new(scope(), net.clone());
        assert!(cache.install().is_err());
        assert!(cache.cache_names().is_empty());
    }

    #[test]
    fn cached_assets_are_served_without_network() {
        let net = FakeNet::new();
        let mut cache = AssetCache::new(scope(), net.clone());
        cache.install().unwrap();
        net.set_online(false);
        let calls_before = net.calls().len();

        let served = cache.handle("GET", "https://nest.test/app/styles.css");
        assert_eq!(served, Served::Cached(Response::ok("body for /app/styles.css")));
        assert_eq!(net.calls().len(), calls_before);
    }

    #[test]
    fn misses_go_to_network_and_are_stored() {
        let net = FakeNet::new();
        let mut cache = AssetCache::new(scope(), net.clone());
        let first = cache.handle("GET", "extra.js");
        assert!(matches!(first, Served::Network(_)));
        net.set_online(false);
        let second = cache.handle("GET", "extra.js#frag");
        assert!(matches!(second, Served::Cached(_)));
    }

    #[test]
    fn offline_falls_back_to_entry_page_then_text() {
        let net = FakeNet::new();
        net.set_online(false);
        let mut cache = AssetCache::new(scope(), net.clone());
        assert_eq!(cache.handle("GET", "missing.png"), Served::Offline(Response::offline()));

        cache.put(CACHE_NAME, &scope().join("index.html").unwrap(), Response::ok("<html>"));
        assert_eq!(
            cache.handle("GET", "missing.png"),
            Served::EntryPage(Response::ok("<html>"))
        );
    }

    #[test]
    fn non_get_and_cross_origin_bypass_cache() {
        let net = FakeNet::new();
        let mut cache = AssetCache::new(scope(), net.clone());
        assert_eq!(cache.handle("POST", "index.html"), Served::NotHandled);

        let served = cache.handle("GET", "https://cdn.other.test/lib.js");
        assert!(matches!(served, Served::Passthrough(Ok(_))));
        assert!(cache.cache_names().is_empty());
    }

    #[test]
    fn activate_purges_other_caches() {
        let net = FakeNet::new();
        let mut cache = AssetCache::new(scope(), net.clone());
        let old = scope().join("app.js").unwrap();
        cache.put("sloth-reading-nest:v0", &old, Response::ok("old"));
        cache.install().unwrap();

        assert_eq!(cache.activate(), vec!["sloth-reading-nest:v0".to_string()]);
        assert_eq!(cache.cache_names(), vec![CACHE_NAME]);
        assert_eq!(
            cache.handle("GET", "app.js"),
            Served::Cached(Response::ok("body for /app/app.js"))
        );
    }

    #[test]
    fn closures_can_fetch() {
        let mut cache = AssetCache::new(scope(), |_: &Url| -> Result<Response, FetchError> {
            Ok(Response::ok("hi"))
        });
        assert_eq!(cache.handle("get", "x"), Served::Network(Response::ok("hi")));
    }
}
