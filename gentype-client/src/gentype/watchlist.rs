use std::pin::pin;

use futures::TryStreamExt;
use serde::{de::DeserializeOwned, Serialize};

use super::{consistency, finish, list, UntypedClient};
use crate::{
    core::{
        metadata::ListMeta, params::ListOptions, watchlist::prepare_watch_list_options, ListObject, Object,
        WatchEvent,
    },
    error::WatchListError,
    Error, Result,
};

/// List through a watch when enabled and eligible, through a plain list otherwise
pub(super) async fn list_with_fallback<L>(c: &UntypedClient, opts: &ListOptions) -> Result<L>
where
    L: ListObject + DeserializeOwned + Send + 'static,
    L::Item: Object + Serialize + DeserializeOwned + Send + 'static,
{
    let features = c.rest().client().features();
    match prepare_watch_list_options(opts, features.watch_list_client) {
        Ok(Some(wl_opts)) => match watch_list::<L>(c, &wl_opts).await {
            Ok(result) => {
                if features.watch_list_inconsistency_detector {
                    consistency::check_watch_list_from_cache(
                        format!("watchlist request for {}", c.resource()),
                        lister::<L>(c),
                        opts.clone(),
                        &result,
                    );
                }
                return Ok(result);
            }
            Err(err) => tracing::warn!(
                "The watchlist request for {} ended with an error, falling back to the standard LIST semantics, err = {}",
                c.resource(),
                err
            ),
        },
        Ok(None) => {}
        Err(err) => tracing::warn!(
            "Failed preparing watchlist options for {}, falling back to the standard LIST semantics, err = {}",
            c.resource(),
            err
        ),
    }

    let result = list::<L>(c, opts).await?;
    if features.list_from_cache_inconsistency_detector {
        consistency::check_list_from_cache(
            format!("list request for {}", c.resource()),
            lister::<L>(c),
            opts.clone(),
            &result,
        );
    }
    Ok(result)
}

/// Assemble a list from the initial events of a watch
///
/// Every event up to the bookmark annotated as the end of the initial events must be `ADDED`.
/// The list takes the resource version of that bookmark.
async fn watch_list<L>(c: &UntypedClient, opts: &ListOptions) -> Result<L>
where
    L: ListObject,
    L::Item: DeserializeOwned + Send + 'static,
{
    let req = c
        .scoped(c.rest().get())
        .versioned_params(opts, c.codec())
        .timeout(opts.request_timeout().unwrap_or_default());
    let mut events = pin!(c.rest().client().request_events::<L::Item>(finish(req, "watchlist")?).await?);

    let mut items = Vec::new();
    while let Some(event) = events.try_next().await? {
        match event {
            WatchEvent::Added(obj) => items.push(obj),
            WatchEvent::Bookmark(bm) if bm.is_initial_events_end() => {
                tracing::debug!("watchlist for {} received {} items", c.resource(), items.len());
                let metadata = ListMeta {
                    resource_version: Some(bm.metadata.resource_version),
                    ..ListMeta::default()
                };
                return Ok(L::from_parts(metadata, items));
            }
            WatchEvent::Bookmark(_) => {}
            WatchEvent::Error(e) => return Err(Error::Api(e)),
            other => return Err(Error::WatchList(WatchListError::UnexpectedEvent(other.type_name()))),
        }
    }
    Err(Error::WatchList(WatchListError::Incomplete))
}

/// A plain list of the resource, owned so it can run in the background
fn lister<L>(c: &UntypedClient) -> impl Fn(ListOptions) -> futures::future::BoxFuture<'static, Result<L>> + Send + 'static
where
    L: DeserializeOwned + Send + 'static,
{
    let c = c.clone();
    move |opts| {
        let c = c.clone();
        Box::pin(async move { list::<L>(&c, &opts).await })
    }
}
