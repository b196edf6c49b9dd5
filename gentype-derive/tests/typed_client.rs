#![allow(missing_docs)]

use std::pin::pin;

use gentype::{
    client::Body,
    core::{
        metadata::ObjectMeta,
        params::{ApplyOptions, GetOptions, ListOptions, UpdateOptions},
        GroupVersion, Object,
    },
    Client, RestClient, TypedClient,
};
use http::{Method, Request, Response};
use k8s_openapi::api::autoscaling::v1::Scale;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_test::mock;

#[derive(TypedClient, Clone, Debug, Default, Deserialize, Serialize)]
#[genclient(apply = "serde_json::Value")]
#[genclient(method(name = "get_scale", verb = "get", subresource = "scale", result = "Scale"))]
#[genclient(method(name = "update_scale", verb = "update", subresource = "scale", input = "Scale", result = "Scale"))]
pub struct Widget {
    metadata: ObjectMeta,
    spec: WidgetSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<WidgetStatus>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct WidgetSpec {
    replicas: u32,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct WidgetStatus {
    ready: u32,
}

impl Object for Widget {
    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

#[derive(TypedClient, Clone, Debug, Default, Deserialize, Serialize)]
#[genclient(non_namespaced, only_verbs = "get,list,update_status")]
#[genclient(method(name = "list_revisions", verb = "list", subresource = "revisions"))]
pub struct ClusterPolicy {
    metadata: ObjectMeta,
}

impl Object for ClusterPolicy {
    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

type Handle = mock::Handle<Request<Body>, Response<Body>>;

fn rest() -> (RestClient, Handle) {
    let (svc, handle) = mock::pair::<Request<Body>, Response<Body>>();
    let client = Client::new(svc, "default");
    (RestClient::new(client, GroupVersion::gv("example.dev", "v1")), handle)
}

fn respond(body: Value) -> Response<Body> {
    Response::builder()
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn widget(name: &str) -> Value {
    json!({ "metadata": { "name": name, "namespace": "ns" }, "spec": { "replicas": 2 } })
}

#[tokio::test]
async fn derived_verbs_address_the_default_plural() {
    let (rest, handle) = rest();
    let widgets = rest.widgets("ns");
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("get");
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.uri(), "/apis/example.dev/v1/namespaces/ns/widgets/one");
        send.send_response(respond(widget("one")));

        let (req, send) = handle.next_request().await.expect("update_status");
        assert_eq!(req.method(), Method::PUT);
        assert_eq!(req.uri(), "/apis/example.dev/v1/namespaces/ns/widgets/one/status");
        send.send_response(respond(widget("one")));

        let (req, send) = handle.next_request().await.expect("list");
        assert_eq!(req.uri(), "/apis/example.dev/v1/namespaces/ns/widgets?labelSelector=tier%3Dfront");
        send.send_response(respond(json!({
            "metadata": { "resourceVersion": "5" },
            "items": [widget("one"), widget("two")],
        })));
    });

    let one = widgets.get("one", &GetOptions::default()).await.unwrap();
    assert_eq!(one.spec.replicas, 2);
    let updated = widgets.update_status(&one, &UpdateOptions::default()).await.unwrap();
    assert_eq!(updated.name(), Some("one"));
    let list = widgets
        .list(&ListOptions::default().labels("tier=front"))
        .await
        .unwrap();
    assert_eq!(list.items.len(), 2);
    assert_eq!(list.resource_version(), Some("5"));
    server.await.unwrap();
}

#[tokio::test]
async fn extension_methods_reach_subresources() {
    let (rest, handle) = rest();
    let widgets = WidgetClient::new(rest, "ns");
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let scale = json!({
            "apiVersion": "autoscaling/v1",
            "kind": "Scale",
            "metadata": { "name": "one" },
            "spec": { "replicas": 3 },
        });
        let (req, send) = handle.next_request().await.expect("get_scale");
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.uri(), "/apis/example.dev/v1/namespaces/ns/widgets/one/scale");
        send.send_response(respond(scale.clone()));

        let (req, send) = handle.next_request().await.expect("update_scale");
        assert_eq!(req.method(), Method::PUT);
        assert_eq!(req.uri(), "/apis/example.dev/v1/namespaces/ns/widgets/one/scale");
        send.send_response(respond(scale));
    });

    let scale = widgets.get_scale("one", &GetOptions::default()).await.unwrap();
    assert_eq!(scale.spec.as_ref().and_then(|s| s.replicas), Some(3));
    let scale = widgets
        .update_scale("one", &scale, &UpdateOptions::default())
        .await
        .unwrap();
    assert_eq!(scale.metadata.name.as_deref(), Some("one"));
    server.await.unwrap();
}

#[tokio::test]
async fn apply_is_validated_client_side() {
    let (rest, mut handle) = rest();
    handle.allow(0);
    let widgets = rest.widgets("ns");

    let err = widgets
        .apply(&json!({ "spec": {} }), &ApplyOptions::apply("tests"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "obj.Name must be provided to Apply");
    let err = widgets
        .apply_status(&Value::Null, &ApplyOptions::apply("tests"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "object provided to Apply must not be nil");
}

#[tokio::test]
async fn cluster_scoped_clients_have_no_namespace() {
    let (rest, handle) = rest();
    let policies = rest.cluster_policies();
    assert_eq!(policies.inner().namespace(), "");
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("get");
        assert_eq!(req.uri(), "/apis/example.dev/v1/clusterpolicies/strict");
        send.send_response(respond(json!({ "metadata": { "name": "strict" } })));
    });
    let policy = policies.get("strict", &GetOptions::default()).await.unwrap();
    assert_eq!(policy.name(), Some("strict"));
    server.await.unwrap();
}

#[tokio::test]
async fn list_extension_methods_decode_lists() {
    let (rest, handle) = rest();
    let policies = rest.cluster_policies();
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("list_revisions");
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.uri(), "/apis/example.dev/v1/clusterpolicies/strict/revisions?limit=5");
        send.send_response(respond(json!({
            "metadata": { "resourceVersion": "3" },
            "items": [{ "metadata": { "name": "strict-1" } }, { "metadata": { "name": "strict-2" } }],
        })));
    });
    let revisions = policies
        .list_revisions("strict", &ListOptions::default().limit(5))
        .await
        .unwrap();
    let names: Vec<_> = revisions.items.iter().filter_map(|p| p.name()).collect();
    assert_eq!(names, ["strict-1", "strict-2"]);
    assert_eq!(revisions.resource_version(), Some("3"));
    server.await.unwrap();
}
