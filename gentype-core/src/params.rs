//! Request option types and their query parameter encoding
//!
//! These mirror the `*Options` kinds of the `meta.k8s.io/v1` group.
//! All of them except [`DeleteOptions`] travel as query parameters through a
//! [`ParameterCodec`](crate::codec::ParameterCodec), [`DeleteOptions`] is sent as the request body.
use crate::{codec::VersionedParams, labels::Selector};
use serde::Serialize;

/// How a list interprets its `resourceVersion`
///
/// <https://kubernetes.io/docs/reference/using-api/api-concepts/#semantics-for-get-and-list>
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionMatch {
    /// Serve any state at or after the given version, the newest being preferred
    NotOlderThan,

    /// Serve exactly the given version, or `410 Gone` once it is compacted
    Exact,
}

impl VersionMatch {
    /// Query string value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotOlderThan => "NotOlderThan",
            Self::Exact => "Exact",
        }
    }
}

/// Server-side handling of unknown and duplicate fields, sent as `fieldValidation`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationDirective {
    /// Reject the request with `400 Bad Request`
    Strict,
    /// Accept the request with a warning header
    Warn,
    /// Drop unknown fields silently
    Ignore,
}

impl ValidationDirective {
    /// Query string value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Warn => "Warn",
            Self::Ignore => "Ignore",
        }
    }
}

/// Query parameters for get calls
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetOptions {
    /// Minimum resource version to serve, `"0"` allows the watch cache
    pub resource_version: Option<String>,
}

impl GetOptions {
    /// Read at or after `resource_version`
    #[must_use]
    pub fn at(resource_version: &str) -> Self {
        Self {
            resource_version: Some(resource_version.into()),
        }
    }

    /// Read from the watch cache
    #[must_use]
    pub fn any() -> Self {
        Self::at("0")
    }
}

impl VersionedParams for GetOptions {
    fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        if let Some(rv) = non_empty(&self.resource_version) {
            qp.append_pair("resourceVersion", rv);
        }
    }
}

/// Query parameters of list, watch and delete collection calls
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListOptions {
    /// Label selector, everything when unset
    pub label_selector: Option<String>,

    /// Field selector, everything when unset
    pub field_selector: Option<String>,

    /// Watch for changes instead of listing.
    ///
    /// Set by the client for watch calls, a caller setting it on a list disables watch-list.
    pub watch: bool,

    /// Ask for `BOOKMARK` events on a watch
    pub allow_watch_bookmarks: bool,

    /// Resource version interpreted per `resource_version_match`
    pub resource_version: Option<String>,

    /// Interpretation of `resource_version`
    pub resource_version_match: Option<VersionMatch>,

    /// Server side bound on the call, whether or not events flow
    ///
    /// The client side `timeout` is derived from it.
    pub timeout_seconds: Option<u32>,

    /// Page size, further pages are fetched with the returned continue token
    pub limit: Option<u32>,

    /// Continue token of a previous page
    pub continue_token: Option<String>,

    /// Ask the server to start a watch with synthetic `ADDED` events for the current state.
    ///
    /// Used by watch-list, where the initial events end with an annotated bookmark.
    pub send_initial_events: Option<bool>,
}

/// ```
/// use gentype_core::params::ListOptions;
///
/// let opts = ListOptions::default().labels("tier=front").limit(50);
/// assert_eq!(opts.limit, Some(50));
/// ```
impl ListOptions {
    /// Bound the call to `timeout_secs`
    #[must_use]
    pub fn timeout(mut self, timeout_secs: u32) -> Self {
        self.timeout_seconds = Some(timeout_secs);
        self
    }

    /// Filter by field selector
    #[must_use]
    pub fn fields(mut self, field_selector: &str) -> Self {
        self.field_selector = Some(field_selector.to_string());
        self
    }

    /// Filter by label selector
    #[must_use]
    pub fn labels(mut self, label_selector: &str) -> Self {
        self.label_selector = Some(label_selector.to_string());
        self
    }

    /// Filter by a parsed label selector
    #[must_use]
    pub fn labels_from(mut self, selector: &Selector) -> Self {
        self.label_selector = Some(selector.to_string());
        self
    }

    /// Page the results
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Resume from a previous page
    #[must_use]
    pub fn continue_token(mut self, token: &str) -> Self {
        self.continue_token = Some(token.to_string());
        self
    }

    /// Read at `resource_version`, see [`ListOptions::matching`]
    #[must_use]
    pub fn at(mut self, resource_version: &str) -> Self {
        self.resource_version = Some(resource_version.into());
        self
    }

    /// Interpret the resource version with `version_match`
    #[must_use]
    pub fn matching(mut self, version_match: VersionMatch) -> Self {
        self.resource_version_match = Some(version_match);
        self
    }

    /// Use the apiserver cache for the list
    #[must_use]
    pub fn match_any(self) -> Self {
        self.matching(VersionMatch::NotOlderThan).at("0")
    }

    /// The client side timeout derived from `timeout_seconds`
    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        self.timeout_seconds
            .filter(|secs| *secs > 0)
            .map(|secs| std::time::Duration::from_secs(u64::from(secs)))
    }

    pub(crate) fn has_limit(&self) -> bool {
        self.limit.is_some_and(|l| l > 0)
    }

    pub(crate) fn has_continue_token(&self) -> bool {
        non_empty(&self.continue_token).is_some()
    }
}

impl VersionedParams for ListOptions {
    fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        if let Some(labels) = non_empty(&self.label_selector) {
            qp.append_pair("labelSelector", labels);
        }
        if let Some(fields) = non_empty(&self.field_selector) {
            qp.append_pair("fieldSelector", fields);
        }
        if self.watch {
            qp.append_pair("watch", "true");
        }
        if self.allow_watch_bookmarks {
            qp.append_pair("allowWatchBookmarks", "true");
        }
        if let Some(rv) = non_empty(&self.resource_version) {
            qp.append_pair("resourceVersion", rv);
        }
        if let Some(vm) = &self.resource_version_match {
            qp.append_pair("resourceVersionMatch", vm.as_str());
        }
        if let Some(timeout) = &self.timeout_seconds {
            qp.append_pair("timeoutSeconds", &timeout.to_string());
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            qp.append_pair("limit", &limit.to_string());
        }
        if let Some(token) = non_empty(&self.continue_token) {
            qp.append_pair("continue", token);
        }
        if let Some(initial) = &self.send_initial_events {
            qp.append_pair("sendInitialEvents", if *initial { "true" } else { "false" });
        }
    }
}

/// Query parameters for create calls
#[derive(Default, Clone, Debug, PartialEq)]
pub struct CreateOptions {
    /// Validate and admit without persisting
    pub dry_run: bool,
    /// Actor recorded in the managed fields
    pub field_manager: Option<String>,
    /// Handling of unknown fields
    pub field_validation: Option<ValidationDirective>,
}

/// Query parameters for update calls
#[derive(Default, Clone, Debug, PartialEq)]
pub struct UpdateOptions {
    /// Validate and admit without persisting
    pub dry_run: bool,
    /// Actor recorded in the managed fields
    pub field_manager: Option<String>,
    /// Handling of unknown fields
    pub field_validation: Option<ValidationDirective>,
}

fn populate_write_qp(
    qp: &mut form_urlencoded::Serializer<String>,
    dry_run: bool,
    field_manager: &Option<String>,
    field_validation: &Option<ValidationDirective>,
) {
    if dry_run {
        qp.append_pair("dryRun", "All");
    }
    if let Some(fm) = non_empty(field_manager) {
        qp.append_pair("fieldManager", fm);
    }
    if let Some(fv) = field_validation {
        qp.append_pair("fieldValidation", fv.as_str());
    }
}

impl VersionedParams for CreateOptions {
    fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        populate_write_qp(qp, self.dry_run, &self.field_manager, &self.field_validation);
    }
}

impl VersionedParams for UpdateOptions {
    fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        populate_write_qp(qp, self.dry_run, &self.field_manager, &self.field_validation);
    }
}

impl CreateOptions {
    /// Do not persist the result
    #[must_use]
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Record changes under a field manager
    #[must_use]
    pub fn manager(mut self, manager: &str) -> Self {
        self.field_manager = Some(manager.into());
        self
    }
}

impl UpdateOptions {
    /// Do not persist the result
    #[must_use]
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Record changes under a field manager
    #[must_use]
    pub fn manager(mut self, manager: &str) -> Self {
        self.field_manager = Some(manager.into());
        self
    }
}

/// The content type of a patch body
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchType {
    /// [JSON patch](https://datatracker.ietf.org/doc/html/rfc6902)
    Json,
    /// [JSON Merge patch](https://datatracker.ietf.org/doc/html/rfc7386)
    Merge,
    /// Strategic JSON Merge patch, honouring per field merge strategies
    StrategicMerge,
    /// [Server side apply](https://kubernetes.io/docs/reference/using-api/server-side-apply/)
    ///
    /// Only used by the apply verbs.
    Apply,
}

impl PatchType {
    /// The `Content-Type` header value for this patch type
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json-patch+json",
            Self::Merge => "application/merge-patch+json",
            Self::StrategicMerge => "application/strategic-merge-patch+json",
            Self::Apply => "application/apply-patch+yaml",
        }
    }
}

/// Query parameters for patch calls
#[derive(Default, Clone, Debug, PartialEq)]
pub struct PatchOptions {
    /// Validate and admit without persisting
    pub dry_run: bool,
    /// Take over conflicting fields, [`PatchType::Apply`] only
    pub force: Option<bool>,
    /// Actor recorded in the managed fields, required for [`PatchType::Apply`]
    pub field_manager: Option<String>,
    /// Handling of unknown fields
    pub field_validation: Option<ValidationDirective>,
}

impl PatchOptions {
    /// Record changes under a field manager
    #[must_use]
    pub fn manager(mut self, manager: &str) -> Self {
        self.field_manager = Some(manager.into());
        self
    }

    /// Do not persist the result
    #[must_use]
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Handle unknown fields with `vd`
    #[must_use]
    pub fn validation(mut self, vd: ValidationDirective) -> Self {
        self.field_validation = Some(vd);
        self
    }
}

impl VersionedParams for PatchOptions {
    fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        if self.dry_run {
            qp.append_pair("dryRun", "All");
        }
        if let Some(force) = &self.force {
            qp.append_pair("force", if *force { "true" } else { "false" });
        }
        if let Some(fm) = non_empty(&self.field_manager) {
            qp.append_pair("fieldManager", fm);
        }
        if let Some(fv) = &self.field_validation {
            qp.append_pair("fieldValidation", fv.as_str());
        }
    }
}

/// Options for server-side apply
///
/// Unlike [`PatchOptions`] a field manager is mandatory for apply.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct ApplyOptions {
    /// Validate and admit without persisting
    pub dry_run: bool,
    /// Force the apply through conflicts, taking ownership of conflicting fields
    pub force: bool,
    /// Name of the actor that owns the applied fields
    pub field_manager: String,
}

impl ApplyOptions {
    /// Apply as `manager`
    #[must_use]
    pub fn apply(manager: &str) -> Self {
        Self {
            field_manager: manager.into(),
            ..Self::default()
        }
    }

    /// Force the result through on conflicts
    #[must_use]
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    /// Do not persist the result
    #[must_use]
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// The patch options an apply request is sent with
    pub fn to_patch_options(&self) -> PatchOptions {
        PatchOptions {
            dry_run: self.dry_run,
            force: Some(self.force),
            field_manager: Some(self.field_manager.clone()),
            field_validation: None,
        }
    }
}

/// Options for delete calls, sent as the request body
#[derive(Default, Clone, Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOptions {
    /// Validate and admit without deleting
    #[serde(serialize_with = "dry_run_all", skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,

    /// Seconds before the object is removed
    ///
    /// Zero deletes immediately, unset uses the grace period of the type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_period_seconds: Option<u32>,

    /// Treatment of dependents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagation_policy: Option<PropagationPolicy>,

    /// Guards on the deleted object, failing with `409 Conflict`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<Preconditions>,
}

impl DeleteOptions {
    /// Delete dependents in the background
    pub fn background() -> Self {
        Self {
            propagation_policy: Some(PropagationPolicy::Background),
            ..Self::default()
        }
    }

    /// Delete dependents before the owner
    pub fn foreground() -> Self {
        Self {
            propagation_policy: Some(PropagationPolicy::Foreground),
            ..Self::default()
        }
    }

    /// Keep dependents
    pub fn orphan() -> Self {
        Self {
            propagation_policy: Some(PropagationPolicy::Orphan),
            ..Self::default()
        }
    }

    /// Do not persist the result
    #[must_use]
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Set the grace period
    #[must_use]
    pub fn grace_period(mut self, secs: u32) -> Self {
        self.grace_period_seconds = Some(secs);
        self
    }

    /// Guard the delete
    #[must_use]
    pub fn preconditions(mut self, preconditions: Preconditions) -> Self {
        self.preconditions = Some(preconditions);
        self
    }
}

// dryRun is `["All"]` in a body but `All` in a query string
fn dry_run_all<S: serde::Serializer>(dry_run: &bool, s: S) -> Result<S::Ok, S::Error> {
    if *dry_run {
        ["All"].serialize(s)
    } else {
        s.serialize_none()
    }
}

/// Identity the deleted object must still have
#[derive(Default, Clone, Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preconditions {
    /// Expected resource version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    /// Expected uid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// Garbage collection of the dependents of a deleted object
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub enum PropagationPolicy {
    /// Leave dependents in place
    Orphan,
    /// Delete the owner now and the dependents afterwards
    Background,
    /// Delete the dependents, then the owner
    Foreground,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod test {
    use super::*;

    fn encode(params: &dyn VersionedParams) -> String {
        let mut qp = form_urlencoded::Serializer::new(String::from("some/resource?"));
        params.populate_qp(&mut qp);
        qp.finish()
    }

    #[test]
    fn list_options_query_names() {
        let opts = ListOptions {
            watch: true,
            allow_watch_bookmarks: true,
            send_initial_events: Some(true),
            ..ListOptions::default()
        }
        .labels("app=web")
        .fields("metadata.name=a")
        .timeout(30)
        .limit(5)
        .at("10")
        .matching(VersionMatch::NotOlderThan);
        assert_eq!(
            encode(&opts),
            "some/resource?&labelSelector=app%3Dweb&fieldSelector=metadata.name%3Da&watch=true\
             &allowWatchBookmarks=true&resourceVersion=10&resourceVersionMatch=NotOlderThan\
             &timeoutSeconds=30&limit=5&sendInitialEvents=true"
        );
    }

    #[test]
    fn list_options_skip_unset_values() {
        let opts = ListOptions {
            limit: Some(0),
            continue_token: Some(String::new()),
            label_selector: Some(String::new()),
            ..ListOptions::default()
        };
        assert_eq!(encode(&opts), "some/resource?");
        assert_eq!(opts.request_timeout(), None);
        assert_eq!(ListOptions::default().timeout(0).request_timeout(), None);
        assert_eq!(
            ListOptions::default().timeout(30).request_timeout(),
            Some(std::time::Duration::from_secs(30))
        );
    }

    #[test]
    fn apply_options_convert_to_patch_options() {
        let patch = ApplyOptions::apply("controller").force().to_patch_options();
        assert_eq!(patch.force, Some(true));
        assert_eq!(patch.field_manager.as_deref(), Some("controller"));
        assert_eq!(encode(&patch), "some/resource?&force=true&fieldManager=controller");

        let unforced = ApplyOptions::apply("controller").to_patch_options();
        assert_eq!(encode(&unforced), "some/resource?&force=false&fieldManager=controller");
    }

    #[test]
    fn write_options_serialize_dry_run_and_validation() {
        let create = CreateOptions {
            field_validation: Some(ValidationDirective::Strict),
            ..CreateOptions::default()
        }
        .dry_run()
        .manager("tester");
        assert_eq!(
            encode(&create),
            "some/resource?&dryRun=All&fieldManager=tester&fieldValidation=Strict"
        );
        assert_eq!(encode(&UpdateOptions::default()), "some/resource?");
        assert_eq!(encode(&GetOptions::any()), "some/resource?&resourceVersion=0");
    }

    #[test]
    fn delete_options_serialize() {
        let mut dp = DeleteOptions::default();
        assert_eq!(serde_json::to_string(&dp).unwrap(), "{}");

        dp.dry_run = true;
        assert_eq!(serde_json::to_string(&dp).unwrap(), "{\"dryRun\":[\"All\"]}");

        let ser = serde_json::to_value(DeleteOptions::foreground().grace_period(0)).unwrap();
        assert_json_diff::assert_json_eq!(
            ser,
            serde_json::json!({"propagationPolicy": "Foreground", "gracePeriodSeconds": 0})
        );
    }

    #[test]
    fn patch_content_types() {
        assert_eq!(PatchType::Apply.content_type(), "application/apply-patch+yaml");
        assert_eq!(PatchType::Json.content_type(), "application/json-patch+json");
        assert_eq!(PatchType::Merge.content_type(), "application/merge-patch+json");
        assert_eq!(
            PatchType::StrategicMerge.content_type(),
            "application/strategic-merge-patch+json"
        );
    }
}
