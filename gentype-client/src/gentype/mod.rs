//! The generic typed client generated clients forward to
//!
//! [`UntypedClient`] holds the coordinates of one resource endpoint: the resource name,
//! the namespace (empty for cluster scoped access), the parameter codec, the protobuf preference
//! and the [`RestClient`]. The free functions of this module implement every verb on top of it,
//! one request per call, decoding into whatever result type the caller names.
//!
//! [`Client`] binds an [`UntypedClient`] to an object type and, through its type parameters,
//! to optional list and apply configuration types:
//!
//! - `Client<K>`: get, watch, create, update, update status, delete and patch
//! - [`ClientWithList<K, L>`]: additionally list and delete collection
//! - [`ClientWithApply<K, C>`]: additionally apply and apply status
//! - [`ClientWithListAndApply<K, L, C>`]: all of the above
use std::{fmt, marker::PhantomData, sync::Arc};

use futures::stream::BoxStream;
use http::Request;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    core::{
        params::{
            ApplyOptions, CreateOptions, DeleteOptions, GetOptions, ListOptions, PatchOptions, PatchType,
            UpdateOptions,
        },
        ApplyConfiguration, ListObject, Object, ParameterCodec, RequestBuilder, WatchEvent,
    },
    error::ApplyError,
    Error, RestClient, Result,
};

pub mod consistency;
mod watchlist;

/// The event stream of a watch
pub type WatchStream<K> = BoxStream<'static, Result<WatchEvent<K>>>;

/// Options for constructing a client
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Ask for protobuf responses when the [`RestClient`] can negotiate them
    pub prefers_protobuf: bool,
}

impl ClientOptions {
    /// Options for a resource preferring protobuf
    pub fn prefers_protobuf() -> Self {
        Self { prefers_protobuf: true }
    }
}

/// The endpoint coordinates of one resource
///
/// Nothing is validated on construction, an invalid resource name or namespace
/// surfaces as a request build error on the first call.
#[derive(Clone)]
pub struct UntypedClient {
    resource: String,
    client: RestClient,
    codec: Arc<dyn ParameterCodec>,
    namespace: String,
    prefers_protobuf: bool,
}

impl UntypedClient {
    /// Address `resource` through `client`, within `namespace` unless it is empty
    pub fn new(
        resource: impl Into<String>,
        client: RestClient,
        codec: Arc<dyn ParameterCodec>,
        namespace: impl Into<String>,
        options: ClientOptions,
    ) -> Self {
        Self {
            resource: resource.into(),
            client,
            codec,
            namespace: namespace.into(),
            prefers_protobuf: options.prefers_protobuf,
        }
    }

    /// The resource name, e.g. `deployments`
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The namespace, empty for cluster scoped clients
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The REST interface requests are made through
    pub fn rest(&self) -> &RestClient {
        &self.client
    }

    /// The codec options are encoded with
    pub fn codec(&self) -> &dyn ParameterCodec {
        self.codec.as_ref()
    }

    /// Whether the resource prefers protobuf responses
    pub fn prefers_protobuf(&self) -> bool {
        self.prefers_protobuf
    }

    /// Scope a fresh request to this resource
    fn scoped(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .use_protobuf_as_default_if_preferred(self.prefers_protobuf)
            .namespace_if_scoped(&self.namespace, !self.namespace.is_empty())
            .resource(&self.resource)
    }
}

impl fmt::Debug for UntypedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UntypedClient")
            .field("resource", &self.resource)
            .field("namespace", &self.namespace)
            .field("group_version", self.client.group_version())
            .field("codec", &self.codec)
            .field("prefers_protobuf", &self.prefers_protobuf)
            .finish()
    }
}

/// Build the request and label it for the trace span
fn finish(builder: RequestBuilder, verb: &'static str) -> Result<Request<Vec<u8>>> {
    let mut req = builder.build().map_err(Error::BuildRequest)?;
    req.extensions_mut().insert(verb);
    Ok(req)
}

fn serialize<T: Serialize + ?Sized>(obj: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(obj).map_err(|e| Error::BuildRequest(crate::core::Error::SerializeBody(e)))
}

/// Get a named object
pub async fn get<R: DeserializeOwned>(c: &UntypedClient, name: &str, opts: &GetOptions) -> Result<R> {
    let req = c.scoped(c.rest().get()).name(name).versioned_params(opts, c.codec());
    c.rest().client().request(finish(req, "get")?).await
}

/// Get a subresource of a named object
pub async fn get_subresource<R: DeserializeOwned>(
    c: &UntypedClient,
    name: &str,
    subresources: &[&str],
    opts: &GetOptions,
) -> Result<R> {
    let req = c
        .scoped(c.rest().get())
        .name(name)
        .sub_resource(subresources)
        .versioned_params(opts, c.codec());
    c.rest().client().request(finish(req, "get_subresource")?).await
}

/// List objects with a plain `GET`
///
/// [`Client::list`] tries a watch-list first when enabled.
pub async fn list<L: DeserializeOwned>(c: &UntypedClient, opts: &ListOptions) -> Result<L> {
    let req = c
        .scoped(c.rest().get())
        .versioned_params(opts, c.codec())
        .timeout(opts.request_timeout().unwrap_or_default());
    c.rest().client().request(finish(req, "list")?).await
}

/// List a subresource of a named object
pub async fn list_subresource<R: DeserializeOwned>(
    c: &UntypedClient,
    name: &str,
    subresources: &[&str],
    opts: &ListOptions,
) -> Result<R> {
    let req = c
        .scoped(c.rest().get())
        .name(name)
        .sub_resource(subresources)
        .versioned_params(opts, c.codec())
        .timeout(opts.request_timeout().unwrap_or_default());
    c.rest().client().request(finish(req, "list_subresource")?).await
}

/// Watch objects, `opts.watch` is forced on
///
/// The stream ends when the server ends the watch, dropping it cancels the request.
pub async fn watch<K>(c: &UntypedClient, opts: &ListOptions) -> Result<WatchStream<K>>
where
    K: DeserializeOwned + Send + 'static,
{
    let opts = ListOptions {
        watch: true,
        ..opts.clone()
    };
    let req = c
        .scoped(c.rest().get())
        .versioned_params(&opts, c.codec())
        .timeout(opts.request_timeout().unwrap_or_default());
    c.rest().client().request_events::<K>(finish(req, "watch")?).await
}

/// Create an object from `obj`
pub async fn create<I, R>(c: &UntypedClient, obj: &I, opts: &CreateOptions) -> Result<R>
where
    I: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let req = c
        .scoped(c.rest().post())
        .versioned_params(opts, c.codec())
        .json_body(obj);
    c.rest().client().request(finish(req, "create")?).await
}

/// Create a subresource of a named object, e.g. an eviction of a pod
pub async fn create_subresource<I, R>(
    c: &UntypedClient,
    name: &str,
    subresources: &[&str],
    obj: &I,
    opts: &CreateOptions,
) -> Result<R>
where
    I: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let req = c
        .scoped(c.rest().post())
        .name(name)
        .sub_resource(subresources)
        .versioned_params(opts, c.codec())
        .json_body(obj);
    c.rest().client().request(finish(req, "create_subresource")?).await
}

/// Replace an object, addressed by its own name
pub async fn update<I, R>(c: &UntypedClient, obj: &I, opts: &UpdateOptions) -> Result<R>
where
    I: Object + Serialize,
    R: DeserializeOwned,
{
    let req = c
        .scoped(c.rest().put())
        .name(obj.name().unwrap_or_default())
        .versioned_params(opts, c.codec())
        .json_body(obj);
    c.rest().client().request(finish(req, "update")?).await
}

/// Replace a subresource of a named object
pub async fn update_subresource<I, R>(
    c: &UntypedClient,
    name: &str,
    subresources: &[&str],
    obj: &I,
    opts: &UpdateOptions,
) -> Result<R>
where
    I: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let req = c
        .scoped(c.rest().put())
        .name(name)
        .sub_resource(subresources)
        .versioned_params(opts, c.codec())
        .json_body(obj);
    c.rest().client().request(finish(req, "update_subresource")?).await
}

/// Delete a named object
pub async fn delete(c: &UntypedClient, name: &str, opts: &DeleteOptions) -> Result<()> {
    let req = c.scoped(c.rest().delete()).name(name).json_body(opts);
    c.rest().client().request_text(finish(req, "delete")?).await?;
    Ok(())
}

/// Delete every object matched by `list_opts`
pub async fn delete_collection(c: &UntypedClient, opts: &DeleteOptions, list_opts: &ListOptions) -> Result<()> {
    let req = c
        .scoped(c.rest().delete())
        .versioned_params(list_opts, c.codec())
        .timeout(list_opts.request_timeout().unwrap_or_default())
        .json_body(opts);
    c.rest().client().request_text(finish(req, "delete_collection")?).await?;
    Ok(())
}

/// Patch a named object, or one of its subresources
pub async fn patch<R: DeserializeOwned>(
    c: &UntypedClient,
    name: &str,
    pt: PatchType,
    data: Vec<u8>,
    opts: &PatchOptions,
    subresources: &[&str],
) -> Result<R> {
    let req = c
        .scoped(c.rest().patch(pt))
        .name(name)
        .sub_resource(subresources)
        .versioned_params(opts, c.codec())
        .body(data);
    c.rest().client().request(finish(req, "patch")?).await
}

/// Server-side apply a configuration to the object it names
pub async fn apply<C, R>(c: &UntypedClient, cfg: &C, opts: &ApplyOptions) -> Result<R>
where
    C: ApplyConfiguration,
    R: DeserializeOwned,
{
    apply_named(c, cfg, opts, &[]).await
}

/// Server-side apply a configuration to a subresource of a named object, e.g. a scale
pub async fn apply_subresource<C, R>(
    c: &UntypedClient,
    name: &str,
    subresources: &[&str],
    cfg: &C,
    opts: &ApplyOptions,
) -> Result<R>
where
    C: ApplyConfiguration,
    R: DeserializeOwned,
{
    if cfg.is_empty() {
        return Err(Error::Apply(ApplyError::ObjectEmpty));
    }
    send_apply(c, name, serialize(cfg)?, opts, subresources).await
}

/// Validate and send an apply addressed by the configuration's own name
async fn apply_named<C, R>(c: &UntypedClient, cfg: &C, opts: &ApplyOptions, subresources: &[&str]) -> Result<R>
where
    C: ApplyConfiguration,
    R: DeserializeOwned,
{
    if cfg.is_empty() {
        return Err(Error::Apply(ApplyError::ObjectEmpty));
    }
    let data = serialize(cfg)?;
    let name = cfg.name().ok_or(Error::Apply(ApplyError::ObjectNameMissing))?;
    send_apply(c, name, data, opts, subresources).await
}

async fn send_apply<R: DeserializeOwned>(
    c: &UntypedClient,
    name: &str,
    data: Vec<u8>,
    opts: &ApplyOptions,
    subresources: &[&str],
) -> Result<R> {
    let req = c
        .scoped(c.rest().patch(PatchType::Apply))
        .name(name)
        .sub_resource(subresources)
        .versioned_params(&opts.to_patch_options(), c.codec())
        .body(data);
    c.rest().client().request(finish(req, "apply")?).await
}

/// Marker for clients without list support
#[derive(Clone, Copy, Debug, Default)]
pub struct NoList;

/// Marker for clients without apply support
#[derive(Clone, Copy, Debug, Default)]
pub struct NoApply;

/// A client for objects of type `K`
///
/// `L` is the list type when the resource supports listing, `C` the apply configuration type
/// when it supports server-side apply. Use the aliases to name the shapes.
pub struct Client<K, L = NoList, C = NoApply> {
    untyped: UntypedClient,
    _types: PhantomData<fn() -> (K, L, C)>,
}

/// A client supporting lists
pub type ClientWithList<K, L> = Client<K, L, NoApply>;
/// A client supporting server-side apply
pub type ClientWithApply<K, C> = Client<K, NoList, C>;
/// A client supporting lists and server-side apply
pub type ClientWithListAndApply<K, L, C> = Client<K, L, C>;

impl<K, L, C> Clone for Client<K, L, C> {
    fn clone(&self) -> Self {
        Self {
            untyped: self.untyped.clone(),
            _types: PhantomData,
        }
    }
}

impl<K, L, C> fmt::Debug for Client<K, L, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Client").field(&self.untyped).finish()
    }
}

impl<K, L, C> Client<K, L, C> {
    /// Construct a client, cluster scoped when `namespace` is empty
    pub fn new(
        resource: impl Into<String>,
        client: RestClient,
        codec: Arc<dyn ParameterCodec>,
        namespace: impl Into<String>,
        options: ClientOptions,
    ) -> Self {
        Self::from_untyped(UntypedClient::new(resource, client, codec, namespace, options))
    }

    /// Bind endpoint coordinates to the types of this client
    pub fn from_untyped(untyped: UntypedClient) -> Self {
        Self {
            untyped,
            _types: PhantomData,
        }
    }

    /// The endpoint coordinates, for use with the free verb functions
    pub fn untyped(&self) -> &UntypedClient {
        &self.untyped
    }

    /// The REST interface
    pub fn get_client(&self) -> &RestClient {
        self.untyped.rest()
    }

    /// The namespace, empty for cluster scoped clients
    pub fn namespace(&self) -> &str {
        self.untyped.namespace()
    }
}

impl<K, L, C> Client<K, L, C>
where
    K: Object + Serialize + DeserializeOwned,
{
    /// Get a named object
    pub async fn get(&self, name: &str, opts: &GetOptions) -> Result<K> {
        get(&self.untyped, name, opts).await
    }

    /// Watch objects
    pub async fn watch(&self, opts: &ListOptions) -> Result<WatchStream<K>>
    where
        K: Send + 'static,
    {
        watch(&self.untyped, opts).await
    }

    /// Create an object, returning the server's representation of it
    pub async fn create(&self, obj: &K, opts: &CreateOptions) -> Result<K> {
        create(&self.untyped, obj, opts).await
    }

    /// Replace an object, returning the server's representation of it
    pub async fn update(&self, obj: &K, opts: &UpdateOptions) -> Result<K> {
        update(&self.untyped, obj, opts).await
    }

    /// Replace the status of an object, returning the whole object
    pub async fn update_status(&self, obj: &K, opts: &UpdateOptions) -> Result<K> {
        update_subresource(&self.untyped, obj.name().unwrap_or_default(), &["status"], obj, opts).await
    }

    /// Delete a named object
    pub async fn delete(&self, name: &str, opts: &DeleteOptions) -> Result<()> {
        delete(&self.untyped, name, opts).await
    }

    /// Patch a named object, or one of its subresources
    pub async fn patch(
        &self,
        name: &str,
        pt: PatchType,
        data: Vec<u8>,
        opts: &PatchOptions,
        subresources: &[&str],
    ) -> Result<K> {
        patch(&self.untyped, name, pt, data, opts, subresources).await
    }
}

impl<K, L, C> Client<K, L, C>
where
    L: ListObject + DeserializeOwned + Send + 'static,
    L::Item: Object + Serialize + DeserializeOwned + Send + 'static,
{
    /// List objects
    ///
    /// With the watch-list feature enabled an eligible list is first served through a watch,
    /// falling back to a plain list when that fails.
    pub async fn list(&self, opts: &ListOptions) -> Result<L> {
        watchlist::list_with_fallback(&self.untyped, opts).await
    }

    /// Delete every object matched by `list_opts`
    pub async fn delete_collection(&self, opts: &DeleteOptions, list_opts: &ListOptions) -> Result<()> {
        delete_collection(&self.untyped, opts, list_opts).await
    }
}

impl<K, L, C> Client<K, L, C>
where
    K: DeserializeOwned,
    C: ApplyConfiguration,
{
    /// Server-side apply a configuration, returning the applied object
    pub async fn apply(&self, cfg: &C, opts: &ApplyOptions) -> Result<K> {
        apply_named(&self.untyped, cfg, opts, &[]).await
    }

    /// Server-side apply a configuration to the status of an object, returning the whole object
    pub async fn apply_status(&self, cfg: &C, opts: &ApplyOptions) -> Result<K> {
        apply_named(&self.untyped, cfg, opts, &["status"]).await
    }
}

#[cfg(test)] mod tests;
