mod common;

use common::SharedBuf;
use parallel_ping_rs::reporter::{ReportStyle, StatusReporter};
use parallel_ping_rs::types::{ProbeOutcome, ProbeTask};
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_reports_never_interleave() {
    // Three bytes per write() call: only the reporter's lock keeps lines whole.
    let buf = SharedBuf::chunked(3);
    let reporter = Arc::new(StatusReporter::new(buf.clone(), ReportStyle::Human { color: false }));

    let mut set = tokio::task::JoinSet::new();
    for i in 1..=64usize {
        let reporter = reporter.clone();
        set.spawn(async move {
            let task = ProbeTask::new(i, format!("host-{i}.example.net"));
            let outcome = if i % 2 == 0 {
                ProbeOutcome::Success
            } else {
                ProbeOutcome::Unreachable(Some("DestinationHostUnreachable".into()))
            };
            reporter.report(&task, &outcome).await;
        });
    }
    while let Some(res) = set.join_next().await {
        res.unwrap();
    }

    let lines = buf.lines();
    assert_eq!(lines.len(), 64);
    let expected: HashSet<String> = (1..=64usize)
        .map(|i| {
            let status = if i % 2 == 0 { "Success" } else { "DestinationHostUnreachable" };
            format!("Task #{i} pinging host host-{i}.example.net... {status}")
        })
        .collect();
    let got: HashSet<String> = lines.into_iter().collect();
    assert_eq!(got, expected);
    assert_eq!(reporter.reported(), 64);
    assert_eq!(reporter.lost_reports(), 0);
}

#[tokio::test]
async fn messages_share_the_sink_but_are_not_counted() {
    let buf = SharedBuf::default();
    let reporter = StatusReporter::new(buf.clone(), ReportStyle::default());

    reporter.message("Ping canceled.\n").await;
    reporter
        .report(&ProbeTask::new(1, "a"), &ProbeOutcome::Cancelled)
        .await;

    assert_eq!(
        buf.lines(),
        vec!["Ping canceled.", "Task #1 pinging host a... Cancelled"]
    );
    assert_eq!(reporter.reported(), 1);
}
