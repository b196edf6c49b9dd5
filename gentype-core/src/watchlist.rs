//! Preparing list options for serving a list through a watch
//!
//! A watch-list asks the server to start a watch with `sendInitialEvents=true`,
//! streams the current state as `ADDED` events and ends it with a bookmark carrying the
//! [`INITIAL_EVENTS_END_ANNOTATION`](crate::watch::INITIAL_EVENTS_END_ANNOTATION).
use crate::{
    params::{ListOptions, VersionMatch},
    Error, Result,
};

/// Derive watch-list options from the options of a list call
///
/// Returns `Ok(None)` when the list is not eligible for watch-list, which is the case when
/// the client has the feature disabled, when the caller pages through results
/// (a limit without the any-version resource version, or a continue token),
/// or when an exact resource version is asked for.
///
/// Setting `watch` on options passed to a list is a caller error.
pub fn prepare_watch_list_options(opts: &ListOptions, enabled: bool) -> Result<Option<ListOptions>> {
    if !enabled {
        return Ok(None);
    }
    if opts.watch {
        return Err(Error::Validation(
            "ListOptions::watch cannot be set on a list, use watch instead".into(),
        ));
    }
    if opts.has_limit() && opts.resource_version.as_deref() != Some("0") {
        return Ok(None);
    }
    if opts.has_continue_token() {
        return Ok(None);
    }
    if opts.resource_version_match == Some(VersionMatch::Exact) {
        return Ok(None);
    }

    let mut wl = opts.clone();
    wl.watch = true;
    wl.allow_watch_bookmarks = true;
    wl.send_initial_events = Some(true);
    wl.resource_version_match = Some(VersionMatch::NotOlderThan);
    wl.limit = None;
    Ok(Some(wl))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_is_not_eligible() {
        assert_eq!(prepare_watch_list_options(&ListOptions::default(), false).unwrap(), None);
    }

    #[test]
    fn watch_on_list_errors() {
        let opts = ListOptions {
            watch: true,
            ..ListOptions::default()
        };
        assert!(prepare_watch_list_options(&opts, true).is_err());
    }

    #[test]
    fn paging_and_exact_are_not_eligible() {
        for opts in [
            ListOptions::default().limit(10),
            ListOptions::default().limit(10).at("15"),
            ListOptions::default().continue_token("abc"),
            ListOptions::default().at("15").matching(VersionMatch::Exact),
        ] {
            assert_eq!(prepare_watch_list_options(&opts, true).unwrap(), None, "{opts:?}");
        }
    }

    #[test]
    fn eligible_options_become_streaming() {
        let opts = ListOptions::default().labels("app=web").limit(10).at("0").timeout(60);
        let wl = prepare_watch_list_options(&opts, true).unwrap().unwrap();
        assert!(wl.watch);
        assert!(wl.allow_watch_bookmarks);
        assert_eq!(wl.send_initial_events, Some(true));
        assert_eq!(wl.resource_version_match, Some(VersionMatch::NotOlderThan));
        assert_eq!(wl.limit, None);
        assert_eq!(wl.label_selector.as_deref(), Some("app=web"));
        assert_eq!(wl.resource_version.as_deref(), Some("0"));
        assert_eq!(wl.timeout_seconds, Some(60));
    }
}
