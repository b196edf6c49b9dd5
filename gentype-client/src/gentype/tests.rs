use std::{pin::pin, sync::Arc};

use futures::TryStreamExt;
use http::{Method, Request, Response};
use k8s_openapi::api::{apps::v1::Deployment, core::v1::ConfigMap};
use serde_json::{json, Value};
use tower_test::mock;

use super::*;
use crate::{
    client::Body,
    config::ClientFeatures,
    core::{params::VersionMatch, GroupVersion, ObjectList, QueryParameterCodec},
    Client as Transport,
};

type Handle = mock::Handle<Request<Body>, Response<Body>>;

fn rest(features: ClientFeatures, gv: GroupVersion) -> (RestClient, Handle) {
    let (svc, handle) = mock::pair::<Request<Body>, Response<Body>>();
    let client = Transport::new(svc, "default").with_features(features);
    (RestClient::new(client, gv), handle)
}

fn configmaps(ns: &str, features: ClientFeatures) -> (ClientWithList<ConfigMap, ObjectList<ConfigMap>>, Handle) {
    let (rest, handle) = rest(features, GroupVersion::gv("", "v1"));
    let client = Client::new("configmaps", rest, Arc::new(QueryParameterCodec), ns, ClientOptions::default());
    (client, handle)
}

fn respond(status: u16, body: &Value) -> Response<Body> {
    Response::builder()
        .status(status)
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn cm(name: &str) -> Value {
    json!({ "apiVersion": "v1", "kind": "ConfigMap", "metadata": { "name": name, "namespace": "ns" } })
}

#[tokio::test]
async fn get_addresses_namespace_and_name() {
    let (client, handle) = configmaps("ns", ClientFeatures::default());
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.uri(), "/api/v1/namespaces/ns/configmaps/cfg?resourceVersion=3");
        assert_eq!(req.extensions().get::<&'static str>(), Some(&"get"));
        send.send_response(respond(200, &cm("cfg")));
    });
    let got = client.get("cfg", &GetOptions::at("3")).await.unwrap();
    assert_eq!(got.metadata.name.as_deref(), Some("cfg"));
    server.await.unwrap();
}

#[tokio::test]
async fn empty_namespace_is_cluster_scoped() {
    let (rest, handle) = rest(ClientFeatures::default(), GroupVersion::gv("apps", "v1"));
    let client: Client<Deployment> =
        Client::new("deployments", rest, Arc::new(QueryParameterCodec), "", ClientOptions::default());
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert_eq!(req.uri(), "/apis/apps/v1/deployments/web");
        send.send_response(respond(200, &json!({
            "apiVersion": "apps/v1", "kind": "Deployment", "metadata": { "name": "web" }
        })));
    });
    client.get("web", &GetOptions::default()).await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn empty_names_fail_before_sending() {
    let (client, _handle) = configmaps("ns", ClientFeatures::default());
    let err = client.get("", &GetOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::BuildRequest(_)), "{err}");

    let unnamed: ConfigMap = serde_json::from_value(json!({ "apiVersion": "v1", "kind": "ConfigMap", "metadata": {} })).unwrap();
    let err = client.update(&unnamed, &UpdateOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::BuildRequest(_)), "{err}");
}

#[tokio::test]
async fn plain_list_carries_timeout() {
    let (client, handle) = configmaps("ns", ClientFeatures::default());
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert_eq!(
            req.uri(),
            "/api/v1/namespaces/ns/configmaps?labelSelector=app%3Dweb&timeout=10s&timeoutSeconds=10"
        );
        let list = json!({ "metadata": { "resourceVersion": "7" }, "items": [cm("a"), cm("b")] });
        send.send_response(respond(200, &list));
    });
    let opts = ListOptions::default().labels("app=web").timeout(10);
    let list = client.list(&opts).await.unwrap();
    assert_eq!(list.items.len(), 2);
    assert_eq!(list.resource_version(), Some("7"));
    server.await.unwrap();
}

#[tokio::test]
async fn watch_list_assembles_initial_events() {
    let (client, handle) = configmaps("ns", ClientFeatures::default().with_watch_list());
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert_eq!(
            req.uri(),
            "/api/v1/namespaces/ns/configmaps?allowWatchBookmarks=true&resourceVersionMatch=NotOlderThan&sendInitialEvents=true&watch=true"
        );
        assert_eq!(req.extensions().get::<&'static str>(), Some(&"watchlist"));
        let events = [
            json!({ "type": "ADDED", "object": cm("a") }),
            json!({ "type": "BOOKMARK", "object": { "metadata": { "resourceVersion": "5" } } }),
            json!({ "type": "ADDED", "object": cm("b") }),
            json!({ "type": "BOOKMARK", "object": {
                "metadata": { "resourceVersion": "9", "annotations": { "k8s.io/initial-events-end": "true" } }
            } }),
        ];
        let lines: String = events.iter().map(|e| format!("{e}\n")).collect();
        send.send_response(Response::new(Body::from(lines.into_bytes())));
    });
    let list = client.list(&ListOptions::default()).await.unwrap();
    let names: Vec<_> = list.iter().filter_map(|c| c.metadata.name.clone()).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(list.resource_version(), Some("9"));
    server.await.unwrap();
}

#[tokio::test]
async fn watch_list_failure_falls_back_to_list() {
    let (client, handle) = configmaps("ns", ClientFeatures::default().with_watch_list());
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert!(req.uri().query().unwrap().contains("sendInitialEvents=true"));
        // a MODIFIED event cannot be part of the initial state
        let line = format!("{}\n", json!({ "type": "MODIFIED", "object": cm("a") }));
        send.send_response(Response::new(Body::from(line.into_bytes())));

        let (req, send) = handle.next_request().await.expect("no fallback list");
        assert_eq!(req.uri(), "/api/v1/namespaces/ns/configmaps");
        send.send_response(respond(200, &json!({ "metadata": {}, "items": [cm("a")] })));
    });
    let list = client.list(&ListOptions::default()).await.unwrap();
    assert_eq!(list.items.len(), 1);
    server.await.unwrap();
}

#[tokio::test]
async fn fallback_list_errors_reach_the_caller() {
    let (client, handle) = configmaps("ns", ClientFeatures::default().with_watch_list());
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert!(req.uri().query().unwrap().contains("sendInitialEvents=true"));
        let unavailable = json!({
            "kind": "Status", "status": "Failure", "message": "etcd unavailable",
            "reason": "InternalError", "code": 500,
        });
        send.send_response(respond(500, &unavailable));

        let (req, send) = handle.next_request().await.expect("no fallback list");
        assert_eq!(req.uri(), "/api/v1/namespaces/ns/configmaps");
        let forbidden = json!({
            "kind": "Status", "status": "Failure", "message": "configmaps is forbidden",
            "reason": "Forbidden", "code": 403,
        });
        send.send_response(respond(403, &forbidden));
    });
    let err = client.list(&ListOptions::default()).await.unwrap_err();
    match err {
        Error::Api(e) => {
            assert_eq!(e.code, 403);
            assert_eq!(e.reason, "Forbidden");
        }
        other => panic!("expected the list error, got {other}"),
    }
    server.await.unwrap();
}

fn uid_cm(name: &str) -> Value {
    json!({
        "apiVersion": "v1", "kind": "ConfigMap",
        "metadata": { "name": name, "namespace": "ns", "uid": name }
    })
}

#[tokio::test]
async fn list_from_cache_is_checked_against_an_exact_list() {
    let features = ClientFeatures {
        list_from_cache_inconsistency_detector: true,
        ..ClientFeatures::default()
    };
    let (client, handle) = configmaps("ns", features);
    let (listed_tx, listed_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert_eq!(req.uri(), "/api/v1/namespaces/ns/configmaps");
        let list = json!({ "metadata": { "resourceVersion": "7" }, "items": [uid_cm("a"), uid_cm("b")] });
        send.send_response(respond(200, &list));

        listed_rx.await.unwrap();
        let (req, send) = handle.next_request().await.expect("no consistency check");
        assert_eq!(req.method(), Method::GET);
        assert_eq!(
            req.uri(),
            "/api/v1/namespaces/ns/configmaps?resourceVersion=7&resourceVersionMatch=Exact"
        );
        // storage disagrees, which is only logged
        let exact = json!({ "metadata": { "resourceVersion": "7" }, "items": [uid_cm("a")] });
        send.send_response(respond(200, &exact));
    });
    let list = client.list(&ListOptions::default()).await.unwrap();
    listed_tx.send(()).unwrap();
    let names: Vec<_> = list.iter().filter_map(|c| c.metadata.name.clone()).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(list.resource_version(), Some("7"));
    server.await.unwrap();
}

#[tokio::test]
async fn watch_list_is_checked_against_an_exact_list() {
    let features = ClientFeatures {
        watch_list_inconsistency_detector: true,
        ..ClientFeatures::default().with_watch_list()
    };
    let (client, handle) = configmaps("ns", features);
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert!(req.uri().query().unwrap().contains("sendInitialEvents=true"));
        let events = [
            json!({ "type": "ADDED", "object": uid_cm("a") }),
            json!({ "type": "BOOKMARK", "object": {
                "metadata": { "resourceVersion": "9", "annotations": { "k8s.io/initial-events-end": "true" } }
            } }),
        ];
        let lines: String = events.iter().map(|e| format!("{e}\n")).collect();
        send.send_response(Response::new(Body::from(lines.into_bytes())));

        let (req, send) = handle.next_request().await.expect("no consistency check");
        assert_eq!(
            req.uri(),
            "/api/v1/namespaces/ns/configmaps?resourceVersion=9&resourceVersionMatch=Exact"
        );
        assert_eq!(req.extensions().get::<&'static str>(), Some(&"list"));
        send.send_response(respond(500, &json!({ "kind": "Status", "code": 500 })));
    });
    let list = client.list(&ListOptions::default()).await.unwrap();
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.resource_version(), Some("9"));
    server.await.unwrap();
}

#[tokio::test]
async fn ineligible_lists_skip_watch_list() {
    let (client, handle) = configmaps("ns", ClientFeatures::default().with_watch_list());
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert_eq!(
            req.uri(),
            "/api/v1/namespaces/ns/configmaps?limit=2&resourceVersion=4&resourceVersionMatch=Exact"
        );
        send.send_response(respond(200, &json!({ "metadata": {}, "items": [] })));
    });
    let opts = ListOptions::default().limit(2).at("4").matching(VersionMatch::Exact);
    client.list(&opts).await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn watch_forces_the_watch_flag() {
    let (client, handle) = configmaps("ns", ClientFeatures::default());
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert_eq!(
            req.uri(),
            "/api/v1/namespaces/ns/configmaps?timeout=30s&timeoutSeconds=30&watch=true"
        );
        let line = format!("{}\n", json!({ "type": "ADDED", "object": cm("a") }));
        send.send_response(Response::new(Body::from(line.into_bytes())));
    });
    let events: Vec<_> = client
        .watch(&ListOptions::default().timeout(30))
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert!(matches!(events.as_slice(), [WatchEvent::Added(_)]));
    server.await.unwrap();
}

#[tokio::test]
async fn update_status_targets_the_subresource() {
    let (client, handle) = configmaps("ns", ClientFeatures::default());
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert_eq!(req.method(), Method::PUT);
        assert_eq!(req.uri(), "/api/v1/namespaces/ns/configmaps/cfg/status?fieldManager=tests");
        let body: Value = serde_json::from_slice(&req.into_body().collect_bytes().await.unwrap()).unwrap();
        assert_eq!(body["metadata"]["name"], "cfg");
        send.send_response(respond(200, &cm("cfg")));
    });
    let obj: ConfigMap = serde_json::from_value(cm("cfg")).unwrap();
    let opts = UpdateOptions {
        field_manager: Some("tests".into()),
        ..UpdateOptions::default()
    };
    let updated = client.update_status(&obj, &opts).await.unwrap();
    assert_eq!(updated.metadata.name.as_deref(), Some("cfg"));
    server.await.unwrap();
}

#[tokio::test]
async fn delete_collection_encodes_list_options_and_timeout() {
    let (client, handle) = configmaps("ns", ClientFeatures::default());
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert_eq!(req.method(), Method::DELETE);
        assert_eq!(
            req.uri(),
            "/api/v1/namespaces/ns/configmaps?labelSelector=app%3Dweb&timeout=30s&timeoutSeconds=30"
        );
        let body: Value = serde_json::from_slice(&req.into_body().collect_bytes().await.unwrap()).unwrap();
        assert_eq!(body["propagationPolicy"], "Foreground");
        send.send_response(respond(200, &json!({ "kind": "Status", "status": "Success" })));

        let (req, send) = handle.next_request().await.expect("second call");
        assert_eq!(req.uri(), "/api/v1/namespaces/ns/configmaps");
        send.send_response(respond(200, &json!({ "kind": "Status", "status": "Success" })));
    });
    let opts = DeleteOptions::foreground();
    client
        .delete_collection(&opts, &ListOptions::default().labels("app=web").timeout(30))
        .await
        .unwrap();
    client
        .delete_collection(&DeleteOptions::default(), &ListOptions::default())
        .await
        .unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn delete_surfaces_not_found() {
    let (client, handle) = configmaps("ns", ClientFeatures::default());
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert_eq!(req.uri(), "/api/v1/namespaces/ns/configmaps/gone");
        let status = json!({
            "kind": "Status", "status": "Failure", "message": "configmaps \"gone\" not found",
            "reason": "NotFound", "code": 404,
        });
        send.send_response(respond(404, &status));
    });
    let err = client.delete("gone", &DeleteOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::Api(e) if e.is_not_found()));
    server.await.unwrap();
}

#[tokio::test]
async fn patch_sends_data_verbatim() {
    let (client, handle) = configmaps("ns", ClientFeatures::default());
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert_eq!(req.method(), Method::PATCH);
        assert_eq!(req.uri(), "/api/v1/namespaces/ns/configmaps/cfg/status");
        assert_eq!(req.headers()[http::header::CONTENT_TYPE], "application/merge-patch+json");
        let body = req.into_body().collect_bytes().await.unwrap();
        assert_eq!(&body[..], br#"{"data":{"k":"v"}}"#);
        send.send_response(respond(200, &cm("cfg")));
    });
    client
        .patch(
            "cfg",
            PatchType::Merge,
            br#"{"data":{"k":"v"}}"#.to_vec(),
            &PatchOptions::default(),
            &["status"],
        )
        .await
        .unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn apply_is_validated_before_any_request() {
    let (rest, mut handle) = rest(ClientFeatures::default(), GroupVersion::gv("", "v1"));
    let client: ClientWithApply<ConfigMap, Value> =
        Client::new("configmaps", rest, Arc::new(QueryParameterCodec), "ns", ClientOptions::default());
    handle.allow(0);

    let nameless = json!({ "apiVersion": "v1", "kind": "ConfigMap", "metadata": {} });
    let opts = ApplyOptions::default();
    for (verb, empty, unnamed) in [
        ("apply", client.apply(&Value::Null, &opts).await, client.apply(&nameless, &opts).await),
        (
            "apply_status",
            client.apply_status(&Value::Null, &opts).await,
            client.apply_status(&nameless, &opts).await,
        ),
    ] {
        let err = empty.unwrap_err();
        assert!(matches!(err, Error::Apply(ApplyError::ObjectEmpty)), "{verb}: {err}");
        assert_eq!(err.to_string(), "object provided to Apply must not be nil");

        let err = unnamed.unwrap_err();
        assert!(matches!(err, Error::Apply(ApplyError::ObjectNameMissing)), "{verb}: {err}");
        assert_eq!(err.to_string(), "obj.Name must be provided to Apply");
    }
}

#[tokio::test]
async fn apply_sends_an_apply_patch() {
    let (rest, handle) = rest(ClientFeatures::default(), GroupVersion::gv("", "v1"));
    let client: ClientWithApply<ConfigMap, Value> =
        Client::new("configmaps", rest, Arc::new(QueryParameterCodec), "ns", ClientOptions::default());
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert_eq!(req.method(), Method::PATCH);
        assert_eq!(req.uri(), "/api/v1/namespaces/ns/configmaps/cfg?fieldManager=tests&force=false");
        assert_eq!(req.headers()[http::header::CONTENT_TYPE], "application/apply-patch+yaml");
        assert_eq!(req.extensions().get::<&'static str>(), Some(&"apply"));
        send.send_response(respond(200, &cm("cfg")));
    });
    let opts = ApplyOptions {
        field_manager: "tests".into(),
        ..ApplyOptions::default()
    };
    let applied = client.apply(&cm("cfg"), &opts).await.unwrap();
    assert_eq!(applied.metadata.name.as_deref(), Some("cfg"));
    server.await.unwrap();
}

#[tokio::test]
async fn preferred_protobuf_needs_a_capable_transport() {
    let (rest, handle) = rest(ClientFeatures::default(), GroupVersion::gv("", "v1"));
    let rest = rest.with_protobuf(true);
    let client: Client<ConfigMap> = Client::new(
        "configmaps",
        rest,
        Arc::new(QueryParameterCodec),
        "ns",
        ClientOptions::prefers_protobuf(),
    );
    let server = tokio::spawn(async move {
        let mut handle = pin!(handle);
        let (req, send) = handle.next_request().await.expect("service not called");
        assert_eq!(
            req.headers()[http::header::ACCEPT],
            crate::core::request::PROTOBUF_ACCEPT
        );
        send.send_response(respond(200, &cm("cfg")));
    });
    client.get("cfg", &GetOptions::default()).await.unwrap();
    server.await.unwrap();
}
