//! Contract Test: Persistence Hook
//!
//! Constraints verified:
//! - Each successful mutation notifies the sink exactly once
//! - Snapshots carry the collection as committed, with increasing generations
//! - A failing sink does not fail or roll back the mutation
//! - Rules survive a restart through the file sink
//! - A store reloaded from a sink it already wrote to keeps persisting

mod common;

use common::*;
use rewrite_core::{FileSink, MemorySink, RewriteConfig, Rule, RuleStore, SinkConfig, SinkRegistry};
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn each_mutation_notifies_once_with_committed_state() {
    let (store, sink) = store_with(&[]);

    store.add("a.com", "1.1.1.1").await.unwrap();
    store.add("b.com", "2.2.2.2").await.unwrap();
    store
        .update("a.com", "1.1.1.1", "a.com", "3.3.3.3")
        .await
        .unwrap();
    store.delete("b.com", "2.2.2.2").await.unwrap();

    let snapshots = sink.snapshots();
    assert_eq!(snapshots.len(), 4);
    assert_eq!(
        snapshots.iter().map(|s| s.generation).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
    assert_eq!(snapshots[3].rules, vec![Rule::new("a.com", "3.3.3.3")]);
    assert_eq!(store.snapshot().await, snapshots[3]);
}

#[tokio::test]
async fn failing_sink_does_not_fail_mutation() {
    let sink = Arc::new(RecordingSink::failing());
    let store = RuleStore::new(sink.clone());

    store.add("a.com", "1.1.1.1").await.unwrap();

    assert_eq!(store.len().await, 1);
    assert_eq!(sink.notify_count(), 1);
}

#[tokio::test]
async fn rules_survive_restart_through_file_sink() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rewrites.json");

    {
        let store = RuleStore::load(Arc::new(FileSink::new(&path).await.unwrap()))
            .await
            .unwrap();
        store.add("ads.example.com", "0.0.0.0").await.unwrap();
        store.add("ok.com", "1.2.3.4").await.unwrap();
        store.add("tmp.com", "5.5.5.5").await.unwrap();
        store
            .update("ok.com", "1.2.3.4", "ok.com", "ok.example.net")
            .await
            .unwrap();
        store.delete("tmp.com", "5.5.5.5").await.unwrap();
    }

    let restarted = RuleStore::load(Arc::new(FileSink::new(&path).await.unwrap()))
        .await
        .unwrap();

    assert_eq!(
        restarted.list("").await,
        rules(&[("ads.example.com", "0.0.0.0"), ("ok.com", "ok.example.net")])
    );
    assert_eq!(restarted.generation().await, 5);
}

#[tokio::test]
async fn reloaded_store_keeps_persisting_to_memory_sink() {
    let sink = Arc::new(MemorySink::new());

    let store = RuleStore::load(sink.clone()).await.unwrap();
    store.add("a.com", "1.1.1.1").await.unwrap();
    store.add("b.com", "2.2.2.2").await.unwrap();

    let reloaded = RuleStore::load(sink.clone()).await.unwrap();
    reloaded.add("c.com", "3.3.3.3").await.unwrap();

    assert_eq!(
        sink.latest().await.rules,
        rules(&[("a.com", "1.1.1.1"), ("b.com", "2.2.2.2"), ("c.com", "3.3.3.3")])
    );
}

#[tokio::test]
async fn reloaded_store_keeps_persisting_to_file_sink() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rewrites.json");
    let sink = Arc::new(FileSink::new(&path).await.unwrap());

    let store = RuleStore::load(sink.clone()).await.unwrap();
    store.add("a.com", "1.1.1.1").await.unwrap();
    store.add("b.com", "2.2.2.2").await.unwrap();

    let reloaded = RuleStore::load(sink.clone()).await.unwrap();
    assert_eq!(reloaded.delete("a.com", "1.1.1.1").await.unwrap(), 1);

    let on_disk = RuleStore::load(Arc::new(FileSink::new(&path).await.unwrap()))
        .await
        .unwrap();
    assert_eq!(on_disk.list("").await, rules(&[("b.com", "2.2.2.2")]));
}

#[tokio::test]
async fn config_seed_is_ignored_once_file_has_rules() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rewrites.json");
    let registry = SinkRegistry::with_builtin();
    let config = RewriteConfig::new()
        .with_sink(SinkConfig::File {
            path: path.to_string_lossy().into_owned(),
        })
        .with_rewrite("seed.com", "1.1.1.1");

    {
        let store = RuleStore::from_config(&config, &registry).await.unwrap();
        assert_eq!(store.list("").await, rules(&[("seed.com", "1.1.1.1")]));
        store.add("added.com", "2.2.2.2").await.unwrap();
        store.delete("seed.com", "1.1.1.1").await.unwrap();
    }

    let store = RuleStore::from_config(&config, &registry).await.unwrap();
    assert_eq!(store.list("").await, rules(&[("added.com", "2.2.2.2")]));
}
