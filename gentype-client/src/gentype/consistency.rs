//! Data consistency checks for lists served from the watch cache
//!
//! When enabled through [`ClientFeatures`](crate::config::ClientFeatures), every list or
//! watch-list result is compared in the background against a list read at the exact
//! same resource version. Both sides are sorted by uid and compared as JSON, a difference
//! is logged as an error naming the request.
//!
//! These checks issue extra requests and are meant for test environments.
use std::{future::Future, time::Duration};

use assert_json_diff::{assert_json_matches_no_panic, CompareMode, Config};
use serde::Serialize;
use serde_json::Value;

use crate::{
    core::{
        params::{ListOptions, VersionMatch},
        ListObject,
    },
    Result,
};

const RETRY_INTERVAL: Duration = Duration::from_secs(1);
const MAX_ATTEMPTS: usize = 10;

/// Check a list result against an exact read, in the background
///
/// `opts` are the options the list was made with.
pub fn check_list_from_cache<L, F, Fut>(identity: String, list_fn: F, opts: ListOptions, result: &L)
where
    L: ListObject + Send + 'static,
    L::Item: Serialize,
    F: Fn(ListOptions) -> Fut + Send + 'static,
    Fut: Future<Output = Result<L>> + Send + 'static,
{
    spawn_check(identity, list_fn, opts, result);
}

/// Check a list assembled by a watch-list against an exact read, in the background
///
/// `opts` are the options of the list call, before watch-list preparation.
pub fn check_watch_list_from_cache<L, F, Fut>(identity: String, list_fn: F, opts: ListOptions, result: &L)
where
    L: ListObject + Send + 'static,
    L::Item: Serialize,
    F: Fn(ListOptions) -> Fut + Send + 'static,
    Fut: Future<Output = Result<L>> + Send + 'static,
{
    let opts = ListOptions {
        watch: false,
        allow_watch_bookmarks: false,
        send_initial_events: None,
        ..opts
    };
    spawn_check(identity, list_fn, opts, result);
}

fn spawn_check<L, F, Fut>(identity: String, list_fn: F, opts: ListOptions, result: &L)
where
    L: ListObject + Send + 'static,
    L::Item: Serialize,
    F: Fn(ListOptions) -> Fut + Send + 'static,
    Fut: Future<Output = Result<L>> + Send + 'static,
{
    let last_rv = result.list_meta().resource_version.clone().unwrap_or_default();
    let Some(opts) = exact_list_options(&last_rv, opts) else {
        tracing::debug!(
            "data consistency check for {} is enabled but the options do not allow an exact list, skipping",
            identity
        );
        return;
    };
    tracing::warn!(
        "data consistency check for {} is enabled, this will result in an additional call to the API server",
        identity
    );
    let received = match to_values(result.items()) {
        Ok(items) => items,
        Err(err) => {
            tracing::error!("data consistency check for {} could not encode the received items: {}", identity, err);
            return;
        }
    };
    tokio::spawn(async move {
        check_data_consistency(&identity, list_fn, opts, received).await;
    });
}

/// Options reading `last_rv` exactly, `None` when no such read can be formed
fn exact_list_options(last_rv: &str, mut opts: ListOptions) -> Option<ListOptions> {
    if last_rv.is_empty() || opts.resource_version_match == Some(VersionMatch::Exact) {
        return None;
    }
    // a continue token pins its own version
    if opts.continue_token.as_deref().is_some_and(|c| !c.is_empty()) {
        return None;
    }
    // the watch cache ignores the limit for resourceVersion=0
    if opts.resource_version.as_deref() == Some("0") {
        opts.limit = None;
    }
    opts.resource_version = Some(last_rv.to_string());
    opts.resource_version_match = Some(VersionMatch::Exact);
    Some(opts)
}

async fn check_data_consistency<L, F, Fut>(identity: &str, list_fn: F, opts: ListOptions, mut received: Vec<Value>)
where
    L: ListObject,
    L::Item: Serialize,
    F: Fn(ListOptions) -> Fut,
    Fut: Future<Output = Result<L>>,
{
    let mut listed = None;
    for attempt in 1..=MAX_ATTEMPTS {
        match list_fn(opts.clone()).await {
            Ok(list) => {
                listed = Some(list);
                break;
            }
            Err(err) => {
                tracing::error!(
                    "failed to list data from the server for {} (attempt {}), retrying, err: {}",
                    identity,
                    attempt,
                    err
                );
                tokio::time::sleep(RETRY_INTERVAL).await;
            }
        }
    }
    let Some(listed) = listed else {
        tracing::error!("the data consistency check for {} won't be performed, listing kept failing", identity);
        return;
    };
    let mut listed = match to_values(listed.items()) {
        Ok(items) => items,
        Err(err) => {
            tracing::error!("data consistency check for {} could not encode the listed items: {}", identity, err);
            return;
        }
    };

    listed.sort_by(|a, b| uid(a).cmp(uid(b)));
    received.sort_by(|a, b| uid(a).cmp(uid(b)));
    let (listed, received) = (Value::Array(listed), Value::Array(received));
    match assert_json_matches_no_panic(&received, &listed, Config::new(CompareMode::Strict)) {
        Ok(()) => tracing::debug!("data consistency check for {} passed", identity),
        Err(diff) => tracing::error!(
            "data inconsistency detected for {}, previously received data differs from a list against storage: {}",
            identity,
            diff
        ),
    }
}

fn to_values<T: Serialize>(items: &[T]) -> serde_json::Result<Vec<Value>> {
    items.iter().map(serde_json::to_value).collect()
}

fn uid(item: &Value) -> &str {
    item.pointer("/metadata/uid").and_then(Value::as_str).unwrap_or_default()
}
