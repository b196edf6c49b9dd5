//! Environment driven client feature gates

/// Feature gate enabling watch-list for list calls
pub const WATCH_LIST_CLIENT_ENV: &str = "KUBE_FEATURE_WatchListClient";
/// Enables comparing lists served from the watch cache against an exact list
pub const LIST_FROM_CACHE_DETECTOR_ENV: &str = "KUBE_LIST_FROM_CACHE_INCONSISTENCY_DETECTOR";
/// Enables comparing watch-list results against an exact list
pub const WATCH_LIST_DETECTOR_ENV: &str = "KUBE_WATCHLIST_INCONSISTENCY_DETECTOR";

/// Switches that alter how clients list
///
/// All of them default to off.
/// [`ClientFeatures::from_env`] reads them from the environment variables a Go client reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientFeatures {
    /// Serve list calls through a streaming watch first, see [`prepare_watch_list_options`](gentype_core::watchlist::prepare_watch_list_options)
    pub watch_list_client: bool,
    /// Cross-check lists served from the watch cache against an exact list in the background
    pub list_from_cache_inconsistency_detector: bool,
    /// Cross-check watch-list results against an exact list in the background
    pub watch_list_inconsistency_detector: bool,
}

impl ClientFeatures {
    /// Read the feature gates from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the feature gates from an arbitrary lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| match lookup(key) {
            None => false,
            Some(value) => parse_bool(&value).unwrap_or_else(|| {
                tracing::warn!("ignoring {}={:?}: not a boolean", key, value);
                false
            }),
        };
        Self {
            watch_list_client: flag(WATCH_LIST_CLIENT_ENV),
            list_from_cache_inconsistency_detector: flag(LIST_FROM_CACHE_DETECTOR_ENV),
            watch_list_inconsistency_detector: flag(WATCH_LIST_DETECTOR_ENV),
        }
    }

    /// Enable watch-list for list calls
    #[must_use]
    pub fn with_watch_list(mut self) -> Self {
        self.watch_list_client = true;
        self
    }
}

/// Booleans spelled the way Go's `strconv.ParseBool` accepts them
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
