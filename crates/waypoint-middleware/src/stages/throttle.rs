//! Request throttling.
//!
//! Counts requests per client in a bounded LRU cache. Each entry lives for
//! one window from the moment it is created; later hits increment the count
//! but never extend the entry's lifetime. Once the count reaches the limit,
//! further requests fail with `429 Too Many Requests` until the entry
//! expires.
//!
//! ## Example
//!
//! ```
//! use waypoint_middleware::stages::Throttle;
//! use std::time::Duration;
//!
//! let throttle = Throttle::builder()
//!     .limit(10)
//!     .window(Duration::from_secs(1))
//!     .build();
//! assert_eq!(throttle.limit(), 10);
//! ```

use crate::middleware::{Middleware, MiddlewareResult};
use lru::LruCache;
use parking_lot::Mutex;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use waypoint_core::{BoxFuture, IncomingRequest, ResponseInit, WaypointError};

/// Default requests allowed per window.
pub const DEFAULT_LIMIT: u64 = 100;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Default number of tracked clients.
pub const DEFAULT_CAPACITY: usize = 100_000;

/// Key used when no client address header is present.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// How to derive the throttle key from a request.
#[derive(Clone, Default)]
pub enum ThrottleKey {
    /// `x-forwarded-for`, then `x-real-ip`, then `"unknown"`.
    #[default]
    ClientIp,
    /// The value of a specific header, `"unknown"` when absent.
    Header(http::HeaderName),
    /// One shared bucket for every request.
    Global,
    /// A custom function.
    Custom(Arc<dyn Fn(&IncomingRequest) -> String + Send + Sync>),
}

impl ThrottleKey {
    fn extract(&self, request: &IncomingRequest) -> String {
        let non_empty = |name: &str| request.header(name).filter(|v| !v.is_empty()).map(str::to_owned);
        match self {
            Self::ClientIp => non_empty("x-forwarded-for")
                .or_else(|| non_empty("x-real-ip"))
                .unwrap_or_else(|| UNKNOWN_CLIENT.to_string()),
            Self::Header(name) => non_empty(name.as_str()).unwrap_or_else(|| UNKNOWN_CLIENT.to_string()),
            Self::Global => "global".to_string(),
            Self::Custom(f) => f(request),
        }
    }
}

impl fmt::Debug for ThrottleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientIp => write!(f, "ThrottleKey::ClientIp"),
            Self::Header(h) => f.debug_tuple("ThrottleKey::Header").field(h).finish(),
            Self::Global => write!(f, "ThrottleKey::Global"),
            Self::Custom(_) => write!(f, "ThrottleKey::Custom(<fn>)"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: u64,
    expires_at: Instant,
}

/// Throttling middleware.
///
/// Clones share the same counters.
#[derive(Clone)]
pub struct Throttle {
    limit: u64,
    window: Duration,
    key: ThrottleKey,
    cache: Arc<Mutex<LruCache<String, Entry>>>,
}

impl Throttle {
    /// Creates a throttle allowing `limit` requests per `window`.
    #[must_use]
    pub fn new(limit: u64, window: Duration) -> Self {
        Self::builder().limit(limit).window(window).build()
    }

    /// Creates a new throttle builder.
    #[must_use]
    pub fn builder() -> ThrottleBuilder {
        ThrottleBuilder::default()
    }

    /// Requests allowed per window.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// The window length.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records one hit for `key`, failing once the limit is reached.
    fn hit(&self, key: &str, now: Instant) -> Result<u64, WaypointError> {
        let mut cache = self.cache.lock();

        if let Some(entry) = cache.get_mut(key) {
            if entry.expires_at > now {
                if entry.count >= self.limit {
                    return Err(WaypointError::too_many_requests());
                }
                entry.count += 1;
                return Ok(entry.count);
            }
        }

        if self.limit == 0 {
            return Err(WaypointError::too_many_requests());
        }

        cache.put(
            key.to_owned(),
            Entry {
                count: 1,
                expires_at: now + self.window,
            },
        );
        Ok(1)
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .field("key", &self.key)
            .field("tracked", &self.cache.lock().len())
            .finish()
    }
}

impl Middleware for Throttle {
    fn name(&self) -> &'static str {
        "throttle"
    }

    fn handle<'a>(
        &'a self,
        request: &'a IncomingRequest,
        _init: &'a ResponseInit,
    ) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            let key = self.key.extract(request);
            match self.hit(&key, Instant::now()) {
                Ok(count) => {
                    tracing::trace!(key = %key, count, limit = self.limit, "throttle hit");
                    Ok(None)
                }
                Err(err) => {
                    tracing::debug!(key = %key, limit = self.limit, "throttle limit reached");
                    Err(err)
                }
            }
        })
    }
}

/// Builder for [`Throttle`].
#[derive(Debug, Clone)]
pub struct ThrottleBuilder {
    limit: u64,
    window: Duration,
    capacity: usize,
    key: ThrottleKey,
}

impl Default for ThrottleBuilder {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            window: DEFAULT_WINDOW,
            capacity: DEFAULT_CAPACITY,
            key: ThrottleKey::default(),
        }
    }
}

impl ThrottleBuilder {
    /// Sets the maximum number of requests allowed per window.
    ///
    /// Default: 100 requests.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the window length.
    ///
    /// Default: 60 seconds.
    #[must_use]
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Sets the window in milliseconds.
    #[must_use]
    pub fn window_ms(self, millis: u64) -> Self {
        self.window(Duration::from_millis(millis))
    }

    /// Sets how many clients are tracked before the least recent is evicted.
    ///
    /// Default: 100 000. Zero is treated as one.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the key derivation.
    #[must_use]
    pub fn key(mut self, key: ThrottleKey) -> Self {
        self.key = key;
        self
    }

    /// Builds the middleware.
    #[must_use]
    pub fn build(self) -> Throttle {
        let capacity = NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN);
        Throttle {
            limit: self.limit,
            window: self.window,
            key: self.key,
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }
}
