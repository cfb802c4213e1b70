//! 多路复用探测器集成测试
//!
//! 使用本地模拟服务器验证探测周期的结果语义

use mockito::Server;
use resource_vitals::probe::{ChannelReporter, MultiplexedProber, ProbeEvent, ResultRecord};
use resource_vitals::resource::{ResourceDescriptor, ResourceListGuard};
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_test::assert_ok;

fn drain(receiver: &mut mpsc::UnboundedReceiver<ProbeEvent>) -> Vec<ResultRecord> {
    let mut records = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        if let ProbeEvent::Result(record) = event {
            records.push(record);
        }
    }
    records
}

fn find<'a>(records: &'a [ResultRecord], name: &str) -> &'a ResultRecord {
    records
        .iter()
        .find(|r| r.resource.name.as_deref() == Some(name))
        .unwrap_or_else(|| panic!("缺少资源 {name} 的结果"))
}

#[tokio::test]
async fn test_mixed_batch_reports_each_resource_once() {
    let mut server = Server::new_async().await;
    let _fast = server
        .mock("GET", "/fast")
        .with_status(200)
        .with_body("0123456789")
        .create_async()
        .await;
    let _slow = server
        .mock("GET", "/slow")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_millis(500));
            w.write_all(b"late")
        })
        .create_async()
        .await;

    let guard = ResourceListGuard::new(vec![
        ResourceDescriptor::new(format!("{}/fast", server.url()), 2000).with_name("A"),
        ResourceDescriptor::new("http://nonexistent.invalid/", 2000).with_name("B"),
        ResourceDescriptor::new(format!("{}/slow", server.url()), 10).with_name("C"),
    ]);

    let prober = MultiplexedProber::default();
    let (reporter, mut receiver) = ChannelReporter::new();
    let snapshot = guard.snapshot();

    let summary = assert_ok!(prober.run_cycle(&snapshot, &reporter).await);
    let records = drain(&mut receiver);

    assert_eq!(summary.submitted, 3);
    assert_eq!(summary.completed, 3);
    assert_eq!(records.len(), 3);

    let a = find(&records, "A");
    assert!(a.success);
    assert!(a.elapsed > Duration::ZERO);
    assert_eq!(a.status_code, Some(200));
    assert_eq!(a.bytes_downloaded, 10);
    assert!(a.download_rate_bytes_per_second > 0.0);

    let b = find(&records, "B");
    assert!(!b.success);
    assert!(b
        .error_message
        .as_deref()
        .is_some_and(|m| m.starts_with("DNS resolution failed")));

    let c = find(&records, "C");
    assert!(!c.success);
    assert_eq!(c.error_message.as_deref(), Some("Request timeout"));

    for record in &records {
        assert_eq!(record.cycle_id, summary.cycle_id);
        assert!(record.resource.index < snapshot.len());
    }
}

#[tokio::test]
async fn test_http_error_status_is_still_success() {
    let mut server = Server::new_async().await;
    let _missing = server
        .mock("GET", "/missing")
        .with_status(404)
        .with_body("not found")
        .create_async()
        .await;

    let guard = ResourceListGuard::new(vec![ResourceDescriptor::new(
        format!("{}/missing", server.url()),
        2000,
    )]);

    let prober = MultiplexedProber::default();
    let (reporter, mut receiver) = ChannelReporter::new();
    prober.run_cycle(&guard.snapshot(), &reporter).await.unwrap();

    let records = drain(&mut receiver);
    assert_eq!(records.len(), 1);
    assert!(records[0].success);
    assert_eq!(records[0].status_code, Some(404));
}

#[tokio::test]
async fn test_custom_user_agent_is_sent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/ua")
        .match_header("user-agent", "vitals-probe/2.0")
        .with_status(200)
        .create_async()
        .await;

    let guard = ResourceListGuard::new(vec![ResourceDescriptor::new(
        format!("{}/ua", server.url()),
        2000,
    )
    .with_user_agent("vitals-probe/2.0")]);

    let prober = MultiplexedProber::default();
    let (reporter, mut receiver) = ChannelReporter::new();
    prober.run_cycle(&guard.snapshot(), &reporter).await.unwrap();

    mock.assert_async().await;
    assert!(drain(&mut receiver)[0].success);
}

#[tokio::test]
async fn test_list_replacement_does_not_affect_running_cycle() {
    let mut server = Server::new_async().await;
    let _slow = server
        .mock("GET", "/old")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_millis(200));
            w.write_all(b"old")
        })
        .create_async()
        .await;

    let guard = Arc::new(ResourceListGuard::new(vec![
        ResourceDescriptor::new(format!("{}/old", server.url()), 5000),
        ResourceDescriptor::new(format!("{}/old", server.url()), 5000),
    ]));

    let snapshot = guard.snapshot();
    let (reporter, mut receiver) = ChannelReporter::new();
    let cycle = tokio::spawn(async move {
        MultiplexedProber::default()
            .run_cycle(&snapshot, &reporter)
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    guard.update(vec![ResourceDescriptor::new("http://new.example.com/", 100)]);

    let summary = cycle.await.unwrap().unwrap();
    let records = drain(&mut receiver);

    assert_eq!(summary.snapshot_version, 0);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.resource.url.ends_with("/old")));
    assert_eq!(guard.snapshot().len(), 1);
}

#[tokio::test]
async fn test_consecutive_cycles_are_independent() {
    let guard = ResourceListGuard::new(vec![ResourceDescriptor::new("http://127.0.0.1:1/", 1000)]);
    let prober = MultiplexedProber::default();
    let (reporter, mut receiver) = ChannelReporter::new();

    let first = prober.run_cycle(&guard.snapshot(), &reporter).await.unwrap();
    let second = prober.run_cycle(&guard.snapshot(), &reporter).await.unwrap();
    let records = drain(&mut receiver);

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| !r.success));
    assert_ne!(first.cycle_id, second.cycle_id);
    assert_ne!(records[0].id, records[1].id);

    let cycles: HashSet<_> = records.iter().map(|r| r.cycle_id).collect();
    assert_eq!(cycles.len(), 2);
}

#[tokio::test]
async fn test_failure_cause_does_not_depend_on_url_text() {
    let guard = ResourceListGuard::new(vec![
        ResourceDescriptor::new("http://127.0.0.1:1/", 1000).with_name("plain"),
        ResourceDescriptor::new("http://127.0.0.1:1/tls-status", 1000).with_name("tls"),
        ResourceDescriptor::new("http://127.0.0.1:1/certificate", 1000).with_name("cert"),
    ]);
    let prober = MultiplexedProber::default();
    let (reporter, mut receiver) = ChannelReporter::new();

    prober.run_cycle(&guard.snapshot(), &reporter).await.unwrap();
    let records = drain(&mut receiver);

    assert_eq!(records.len(), 3);
    for name in ["plain", "tls", "cert"] {
        let record = find(&records, name);
        assert!(!record.success);
        assert_eq!(record.error_message.as_deref(), Some("Connection refused"));
    }
}
