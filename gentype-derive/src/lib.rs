//! A crate for gentype's derive macros.
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![recursion_limit = "1024"]
extern crate proc_macro;
#[macro_use] extern crate quote;

mod typed_client;

/// A custom derive generating a typed client for an API resource.
///
/// The annotated struct is the resource type. It must implement
/// [`Object`](../gentype/core/trait.Object.html) along with `Serialize`, `Deserialize` and `Default`.
/// Every k8s-openapi type already does through its metadata.
///
/// For a struct `Widget` the derive generates:
///
/// - `trait WidgetsGetter`, implemented for `RestClient`, with a `widgets(namespace)` accessor
/// - `trait WidgetInterface` with one async method per selected verb
/// - `struct WidgetClient` implementing `WidgetInterface` on top of the generic typed client
///
/// # Example
///
/// ```rust
/// use gentype::{core::ObjectList, RestClient, TypedClient};
/// use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(TypedClient, Clone, Debug, Default, Deserialize, Serialize)]
/// #[genclient(resource = "widgets", skip_verbs = "watch")]
/// pub struct Widget {
///     metadata: ObjectMeta,
///     spec: WidgetSpec,
///     status: Option<WidgetStatus>,
/// }
///
/// #[derive(Clone, Debug, Default, Deserialize, Serialize)]
/// pub struct WidgetSpec {
///     size: u32,
/// }
///
/// #[derive(Clone, Debug, Default, Deserialize, Serialize)]
/// pub struct WidgetStatus {
///     ready: bool,
/// }
///
/// impl gentype::core::Object for Widget {
///     fn meta(&self) -> &ObjectMeta {
///         &self.metadata
///     }
///     fn meta_mut(&mut self) -> &mut ObjectMeta {
///         &mut self.metadata
///     }
/// }
///
/// fn widgets(rest: &RestClient) -> WidgetClient {
///     rest.widgets("default")
/// }
/// ```
///
/// `WidgetClient` then has `create`, `update`, `update_status`, `delete`, `delete_collection`,
/// `get`, `list` and `patch` through `WidgetInterface`.
///
/// ## Optional `#[genclient]` properties
///
/// ### `#[genclient(resource = "widgets")]`
/// The resource name in request paths.
/// Defaults to the lowercased plural of the struct name.
///
/// ### `#[genclient(non_namespaced)]`
/// The resource is cluster scoped. The getter and `new` take no namespace.
///
/// ### `#[genclient(no_verbs)]`
/// Generate the getter, an empty interface and the client, without any verb.
///
/// ### `#[genclient(only_verbs = "get,list")]`, `#[genclient(skip_verbs = "watch")]`
/// Restrict the generated verbs. Known verbs are `create`, `update`, `update_status`, `delete`,
/// `delete_collection`, `get`, `list`, `watch`, `patch`, `apply` and `apply_status`.
///
/// ### `#[genclient(no_status)]`
/// Skip `update_status` and `apply_status`.
/// They are skipped anyway when the struct has no `status` field.
///
/// ### `#[genclient(list = "WidgetList")]`
/// The list type returned by `list`, implementing `ListObject`. Defaults to `ObjectList<Self>`.
///
/// ### `#[genclient(apply = "WidgetApplyConfiguration")]`
/// The configuration type for server-side apply, implementing `ApplyConfiguration`.
/// `apply` and `apply_status` are only generated when it is set.
///
/// ### `#[genclient(prefers_protobuf)]`
/// Ask for protobuf responses when the transport can negotiate them.
///
/// ### `#[genclient(method(name = "get_scale", verb = "get", subresource = "scale", result = "Scale"))]`
/// An extension method, repeatable. `verb` is one of `get`, `list`, `create`, `update`, `patch` or `apply`.
/// `input` and `result` default to the resource type, except the `input` of `apply` which defaults
/// to the `apply` type. A `list` method returns `ObjectList<result>` when `result` is given and the
/// `list` type otherwise. With a `subresource` the method takes the parent object's name first.
///
/// ### `#[genclient(crates(gentype = "::gentype"))]`
/// The path generated code reaches the facade crate through.
#[proc_macro_derive(TypedClient, attributes(genclient))]
pub fn derive_typed_client(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    typed_client::derive(proc_macro2::TokenStream::from(input)).into()
}
