#![cfg(test)]

use serde_json::json;
use tokio::sync::mpsc;

use crate::event::types::ChannelEvent;
use crate::plugin_system::descriptor::DescriptorBuilder;
use crate::plugin_system::error::PluginSystemError;
use crate::tests::integration::common::TestEnv;

async fn installed_weather() -> TestEnv {
    let env = TestEnv::new(&[]);
    env.publish("robot-plugins", &DescriptorBuilder::new("weather").description("shows weather").build());
    env.add_repository("robot-plugins").await;
    env.app.plugins().install("weather", None).unwrap();
    env
}

fn options(value: serde_json::Value) -> crate::plugin_system::traits::PluginOptions {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_run_brackets_execution_with_busy_and_free() {
    let env = installed_weather().await;
    let mut events = env.app.channel().subscribe();

    let output = env
        .app
        .runner()
        .run("weather", options(json!({"vector_id": "abc123", "city": "Oslo"})))
        .await
        .unwrap();
    assert_eq!(output, json!({"forecast": "sunny in Oslo"}));

    assert_eq!(events.try_recv().unwrap(), ChannelEvent::VectorBusy("abc123".into()));
    assert_eq!(events.try_recv().unwrap(), ChannelEvent::VectorFree("abc123".into()));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_free_is_published_when_run_fails() {
    let env = installed_weather().await;
    let mut events = env.app.channel().subscribe();

    let err = env
        .app
        .runner()
        .run("weather", options(json!({"vector_id": "abc123", "fail": true})))
        .await
        .unwrap_err();
    assert!(matches!(err, PluginSystemError::ExecutionFailed { .. }));

    assert_eq!(events.try_recv().unwrap(), ChannelEvent::VectorBusy("abc123".into()));
    assert_eq!(events.try_recv().unwrap(), ChannelEvent::VectorFree("abc123".into()));
}

#[tokio::test]
async fn test_uninstalled_plugin_cannot_run() {
    let env = installed_weather().await;
    env.app.plugins().uninstall("weather", false).unwrap();

    let err = env.app.runner().run("weather", options(json!({}))).await.unwrap_err();
    assert!(matches!(err, PluginSystemError::ModuleNotFound(_)));
}

#[tokio::test]
async fn test_serve_dispatches_run_requests() {
    let env = installed_weather().await;
    let mut events = env.app.channel().subscribe();
    let (sender, receiver) = mpsc::channel(4);

    sender.send(json!({"name": "weather", "vector_id": "v1", "city": "Rome"})).await.unwrap();
    sender.send(json!(["not", "an", "object"])).await.unwrap();
    drop(sender);
    env.app.serve(receiver).await;

    assert_eq!(events.try_recv().unwrap(), ChannelEvent::VectorBusy("v1".into()));
    assert_eq!(events.try_recv().unwrap(), ChannelEvent::VectorFree("v1".into()));
    assert!(events.try_recv().is_err());
}
