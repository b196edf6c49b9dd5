//! Fluent request construction for the REST verbs
use crate::{
    codec::{ParameterCodec, VersionedParams},
    duration::Duration,
    gvk::GroupVersion,
    params::PatchType,
    Error, Result,
};
use http::{header, HeaderValue, Method};
use serde::Serialize;

pub(crate) const JSON_MIME: &str = "application/json";
/// Accept header asking for protobuf with a JSON fallback
pub const PROTOBUF_ACCEPT: &str = "application/vnd.kubernetes.protobuf,application/json";

/// Client side deadline for a built request
///
/// Inserted into the request extensions when [`RequestBuilder::timeout`] is set.
/// Clients honour it for single responses; streaming responses only carry the `timeout` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeout(pub std::time::Duration);

/// A fluent builder for one API request
///
/// Obtained from a REST client with the verb and the group version prefix already set.
/// Every setter records the first error it hits, later setters become no-ops and
/// [`build`](Self::build) returns that error.
///
/// ```
/// use gentype_core::{params::GetOptions, GroupVersion, QueryParameterCodec, RequestBuilder};
/// let req = RequestBuilder::new(http::Method::GET, GroupVersion::gv("apps", "v1"))
///     .namespace_if_scoped("default", true)
///     .resource("deployments")
///     .name("web")
///     .versioned_params(&GetOptions::any(), &QueryParameterCodec)
///     .build()
///     .unwrap();
/// assert_eq!(req.uri(), "/apis/apps/v1/namespaces/default/deployments/web?resourceVersion=0");
/// ```
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    version: GroupVersion,
    base_path: String,
    supports_protobuf: bool,
    protobuf: bool,
    namespace: Option<String>,
    resource: Option<String>,
    resource_name: Option<String>,
    subresource: Option<String>,
    params: Vec<(String, String)>,
    timeout: Option<std::time::Duration>,
    headers: http::HeaderMap,
    body: Vec<u8>,
    error: Option<Error>,
}

impl RequestBuilder {
    /// A request for `method` under the url prefix of `version`
    pub fn new(method: Method, version: GroupVersion) -> Self {
        let base_path = version.api_path();
        Self {
            method,
            version,
            base_path,
            supports_protobuf: false,
            protobuf: false,
            namespace: None,
            resource: None,
            resource_name: None,
            subresource: None,
            params: Vec::new(),
            timeout: None,
            headers: http::HeaderMap::new(),
            body: Vec::new(),
            error: None,
        }
    }

    /// Allow protobuf negotiation for this request
    ///
    /// Without it a protobuf preference is recorded but the request still asks for JSON.
    #[must_use]
    pub fn supports_protobuf(mut self, supported: bool) -> Self {
        self.supports_protobuf = supported;
        self
    }

    /// Ask for protobuf responses if the resource prefers them and the client can negotiate them
    #[must_use]
    pub fn use_protobuf_as_default_if_preferred(mut self, prefers_protobuf: bool) -> Self {
        if prefers_protobuf && self.supports_protobuf {
            self.protobuf = true;
        }
        self
    }

    /// Whether the built request will ask for protobuf
    pub fn uses_protobuf(&self) -> bool {
        self.protobuf
    }

    fn fail(&mut self, err: String) {
        if self.error.is_none() {
            self.error = Some(Error::Validation(err));
        }
    }

    /// Scope the request to a namespace
    ///
    /// An empty namespace addresses the resource across all namespaces.
    #[must_use]
    pub fn namespace(mut self, namespace: &str) -> Self {
        if self.error.is_some() {
            return self;
        }
        if let Some(existing) = &self.namespace {
            let msg = format!("namespace already set to {existing:?}, cannot change to {namespace:?}");
            self.fail(msg);
            return self;
        }
        if let Err(msg) = validate_path_segment(namespace) {
            self.fail(format!("invalid namespace {namespace:?}: {msg}"));
            return self;
        }
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Scope the request to a namespace when the resource is namespaced
    #[must_use]
    pub fn namespace_if_scoped(self, namespace: &str, scoped: bool) -> Self {
        if scoped {
            self.namespace(namespace)
        } else {
            self
        }
    }

    /// Set the resource, the plural lowercase name of the type
    #[must_use]
    pub fn resource(mut self, resource: &str) -> Self {
        if self.error.is_some() {
            return self;
        }
        if let Some(existing) = &self.resource {
            let msg = format!("resource already set to {existing:?}, cannot change to {resource:?}");
            self.fail(msg);
            return self;
        }
        if let Err(msg) = validate_path_segment(resource) {
            self.fail(format!("invalid resource {resource:?}: {msg}"));
            return self;
        }
        self.resource = Some(resource.to_string());
        self
    }

    /// Address a single named object
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        if self.error.is_some() {
            return self;
        }
        if name.is_empty() {
            self.fail("resource name may not be empty".into());
            return self;
        }
        if let Some(existing) = &self.resource_name {
            let msg = format!("resource name already set to {existing:?}, cannot change to {name:?}");
            self.fail(msg);
            return self;
        }
        if let Err(msg) = validate_path_segment(name) {
            self.fail(format!("invalid resource name {name:?}: {msg}"));
            return self;
        }
        self.resource_name = Some(name.to_string());
        self
    }

    /// Address a subresource such as `status` or `scale`
    ///
    /// Multiple segments are joined with `/`.
    #[must_use]
    pub fn sub_resource(mut self, subresources: &[&str]) -> Self {
        if self.error.is_some() || subresources.is_empty() {
            return self;
        }
        let subresource = subresources.join("/");
        if let Some(existing) = &self.subresource {
            let msg = format!("subresource already set to {existing:?}, cannot change to {subresource:?}");
            self.fail(msg);
            return self;
        }
        for segment in subresources {
            if let Err(msg) = validate_path_segment(segment) {
                self.fail(format!("invalid subresource {segment:?}: {msg}"));
                return self;
            }
        }
        self.subresource = Some(subresource);
        self
    }

    /// Encode an options value into query parameters through `codec`
    #[must_use]
    pub fn versioned_params(mut self, params: &dyn VersionedParams, codec: &dyn ParameterCodec) -> Self {
        if self.error.is_some() {
            return self;
        }
        match codec.encode_parameters(params, &self.version) {
            Ok(pairs) => self.params.extend(pairs),
            Err(err) => self.error = Some(err),
        }
        self
    }

    /// Add a single query parameter
    #[must_use]
    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Bound the request with a timeout
    ///
    /// Sent to the server as the `timeout` query parameter in Go duration format
    /// and attached as a [`RequestTimeout`] extension. A zero duration is ignored.
    #[must_use]
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = Some(timeout).filter(|t| !t.is_zero());
        self
    }

    /// Set a request header
    #[must_use]
    pub fn set_header(mut self, name: header::HeaderName, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }
        match HeaderValue::from_str(value) {
            Ok(v) => {
                self.headers.insert(name, v);
            }
            Err(e) => self.fail(format!("invalid header value for {name}: {e}")),
        }
        self
    }

    /// Use raw bytes as the request body
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Serialize `obj` as the JSON request body
    #[must_use]
    pub fn json_body<T: Serialize + ?Sized>(mut self, obj: &T) -> Self {
        if self.error.is_some() {
            return self;
        }
        match serde_json::to_vec(obj) {
            Ok(body) => {
                self.body = body;
                if !self.headers.contains_key(header::CONTENT_TYPE) {
                    self.headers
                        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_MIME));
                }
            }
            Err(e) => self.error = Some(Error::SerializeBody(e)),
        }
        self
    }

    /// Mark the body as a patch of the given type
    #[must_use]
    pub fn patch_type(mut self, pt: PatchType) -> Self {
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(pt.content_type()));
        self
    }

    /// The path this request addresses, without query parameters
    pub fn path(&self) -> String {
        let mut segments = vec![self.base_path.trim_end_matches('/').to_string()];
        if let Some(ns) = self.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            segments.push("namespaces".into());
            segments.push(ns.into());
        }
        if let Some(resource) = &self.resource {
            segments.push(resource.to_lowercase());
        }
        segments.extend(self.resource_name.iter().cloned());
        segments.extend(self.subresource.iter().cloned());
        segments.join("/")
    }

    /// Finish the request
    ///
    /// Query parameters are sorted by key, as a Go client encodes them.
    pub fn build(mut self) -> Result<http::Request<Vec<u8>>> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        let mut params = std::mem::take(&mut self.params);
        if let Some(timeout) = self.timeout {
            params.retain(|(k, _)| k != "timeout");
            params.push(("timeout".into(), Duration::from(timeout).to_string()));
        }
        params.sort_by(|a, b| a.0.cmp(&b.0));

        let mut uri = self.path();
        if !params.is_empty() {
            let mut qp = form_urlencoded::Serializer::new(String::new());
            qp.extend_pairs(params.iter());
            uri.push('?');
            uri.push_str(&qp.finish());
        }

        let accept = if self.protobuf { PROTOBUF_ACCEPT } else { JSON_MIME };
        let mut req = http::Request::builder()
            .method(self.method)
            .uri(uri)
            .header(header::ACCEPT, accept)
            .body(self.body)
            .map_err(Error::BuildRequest)?;
        req.headers_mut().extend(self.headers);
        if let Some(timeout) = self.timeout {
            req.extensions_mut().insert(RequestTimeout(timeout));
        }
        Ok(req)
    }
}

fn validate_path_segment(segment: &str) -> std::result::Result<(), String> {
    if segment == "." || segment == ".." {
        return Err(format!("may not be '{segment}'"));
    }
    for illegal in ["/", "%"] {
        if segment.contains(illegal) {
            return Err(format!("may not contain '{illegal}'"));
        }
    }
    Ok(())
}
