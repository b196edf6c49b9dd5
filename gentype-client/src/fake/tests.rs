use futures::StreamExt;
use k8s_openapi::api::core::v1::ConfigMap;
use serde_json::json;

use super::*;
use crate::core::{ObjectList, WatchEvent};

fn configmaps(fake: &Fake) -> FakeClientWithListAndApply<ConfigMap, ObjectList<ConfigMap>, Value> {
    FakeClient::new(
        fake.clone(),
        "ns",
        GroupVersionResource::gvr("", "v1", "configmaps"),
        GroupVersionKind::gvk("", "v1", "ConfigMap"),
    )
}

fn cm(name: &str, labels: Value) -> Value {
    json!({ "apiVersion": "v1", "kind": "ConfigMap", "metadata": { "name": name, "labels": labels } })
}

#[tokio::test]
async fn unhandled_calls_return_empty_objects() {
    let fake = Fake::new();
    let client = configmaps(&fake);

    let got = client.get("missing", &GetOptions::default()).await.unwrap();
    assert_eq!(got, ConfigMap::default());
    let list = client.list(&ListOptions::default()).await.unwrap();
    assert!(list.items.is_empty());
    client.delete("missing", &DeleteOptions::default()).await.unwrap();

    let verbs: Vec<_> = fake.actions().iter().map(Action::verb).collect();
    assert_eq!(verbs, ["get", "list", "delete"]);
    assert!(matches!(&fake.actions()[1], Action::List { kind, .. } if kind.kind == "ConfigMap"));
}

#[tokio::test]
async fn reactors_run_in_order() {
    let fake = Fake::new();
    fake.add_reactor("get", "configmaps", |_| Some(Ok(Some(cm("second", json!({}))))));
    fake.prepend_reactor("get", "*", |action| match action {
        Action::Get { name, .. } if name == "first" => Some(Ok(Some(cm("first", json!({}))))),
        _ => None,
    });
    fake.add_reactor("delete", "configmaps", |_| {
        Some(Err(Error::Api(crate::core::ErrorResponse::not_found("configmaps", "x"))))
    });
    let client = configmaps(&fake);

    let first = client.get("first", &GetOptions::default()).await.unwrap();
    assert_eq!(first.metadata.name.as_deref(), Some("first"));
    let other = client.get("other", &GetOptions::default()).await.unwrap();
    assert_eq!(other.metadata.name.as_deref(), Some("second"));
    let err = client.delete("x", &DeleteOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::Api(e) if e.is_not_found()));
}

#[tokio::test]
async fn list_filters_labels_and_keeps_list_meta() {
    let fake = Fake::new();
    fake.add_reactor("list", "configmaps", |_| {
        Some(Ok(Some(json!({
            "metadata": { "resourceVersion": "12", "continue": "next-page" },
            "items": [cm("web", json!({ "app": "web" })), cm("db", json!({ "app": "db" }))],
        }))))
    });
    let client = configmaps(&fake);

    let list = client.list(&ListOptions::default().labels("app=web")).await.unwrap();
    let names: Vec<_> = list.iter().filter_map(|c| c.metadata.name.as_deref()).collect();
    assert_eq!(names, ["web"]);
    assert_eq!(list.resource_version(), Some("12"));
    assert_eq!(list.continue_token(), Some("next-page"));

    let everything = client.list(&ListOptions::default()).await.unwrap();
    assert_eq!(everything.items.len(), 2);

    let empty_value = client.list(&ListOptions::default().labels("app=")).await;
    assert!(empty_value.is_ok(), "empty values are valid selectors");
    let err = client.list(&ListOptions::default().labels("=web")).await.unwrap_err();
    assert!(matches!(err, Error::Fake(_)));
}

#[tokio::test]
async fn apply_validation_records_nothing() {
    let fake = Fake::new();
    let client = configmaps(&fake);

    let err = client.apply(&Value::Null, &ApplyOptions::default()).await.unwrap_err();
    assert_eq!(err.to_string(), "configuration provided to Apply must not be nil");
    let err = client
        .apply_status(&json!({ "metadata": {} }), &ApplyOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "configuration.Name must be provided to Apply");
    assert!(fake.actions().is_empty());
}

#[tokio::test]
async fn apply_records_an_apply_patch() {
    let fake = Fake::new();
    let client = configmaps(&fake);
    let opts = ApplyOptions::apply("tests").force();
    client.apply_status(&cm("web", json!({})), &opts).await.unwrap();

    match &fake.actions()[0] {
        Action::Patch {
            name,
            patch_type,
            options,
            subresources,
            ..
        } => {
            assert_eq!(name, "web");
            assert_eq!(*patch_type, PatchType::Apply);
            assert_eq!(options.force, Some(true));
            assert_eq!(subresources, &["status"]);
        }
        other => panic!("unexpected action {other:?}"),
    }
}

#[tokio::test]
async fn update_status_records_the_subresource() {
    let fake = Fake::new();
    let client = configmaps(&fake);
    let obj: ConfigMap = serde_json::from_value(cm("web", json!({}))).unwrap();
    client.update_status(&obj, &UpdateOptions::default()).await.unwrap();
    client.update(&obj, &UpdateOptions::default()).await.unwrap();

    let subresources: Vec<_> = fake.actions().iter().map(Action::subresource).collect();
    assert_eq!(subresources, [Some("status".to_string()), None]);
}

#[tokio::test]
async fn tracker_serves_a_round_trip() {
    let fake = Fake::with_tracker(Tracker::new());
    let client = configmaps(&fake);
    let mut events = client.watch(&ListOptions::default()).await.unwrap();

    let obj: ConfigMap = serde_json::from_value(cm("web", json!({ "app": "web" }))).unwrap();
    let created = client.create(&obj, &CreateOptions::default()).await.unwrap();
    assert_eq!(created.metadata.namespace.as_deref(), Some("ns"));

    let patched = client
        .patch(
            "web",
            PatchType::Merge,
            br#"{"data":{"k":"v"}}"#.to_vec(),
            &PatchOptions::default(),
            &[],
        )
        .await
        .unwrap();
    assert_eq!(patched.data.unwrap()["k"], "v");

    client
        .delete_collection(&DeleteOptions::default(), &ListOptions::default().labels("app=web"))
        .await
        .unwrap();
    let err = client.get("web", &GetOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::Api(e) if e.is_not_found()));

    let kinds: Vec<_> = events
        .by_ref()
        .take(3)
        .map(|e| match e.unwrap() {
            WatchEvent::Added(_) => "ADDED",
            WatchEvent::Modified(_) => "MODIFIED",
            WatchEvent::Deleted(_) => "DELETED",
            _ => "OTHER",
        })
        .collect()
        .await;
    assert_eq!(kinds, ["ADDED", "MODIFIED", "DELETED"]);
    assert!(matches!(&fake.actions()[0], Action::Watch { options, .. } if options.watch));
}

#[tokio::test]
async fn unhandled_watch_is_an_error() {
    let fake = Fake::new();
    let err = configmaps(&fake).watch(&ListOptions::default()).await.err().unwrap();
    assert!(matches!(err, Error::Fake(msg) if msg.starts_with("unhandled watch")));
}
