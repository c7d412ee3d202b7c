//! End-to-end docket fetch (discovery then retrieval) against a stub portal.

mod support;

use std::sync::Arc;
use std::time::Duration;

use docket_fetch::{
    CancelFlag, Docket, DocketFetcher, FetchError, FetchEvent, FetchRequest, FixedClock,
    RecordingSink,
};
use tempfile::TempDir;
use wiremock::MockServer;

use support::{
    PDF_BODY, client, doc_href, file_names, listing_page, mount_document, mount_empty_listings,
    mount_listing, portal_base,
};

async fn stub_docket_200301(server: &MockServer, document_hits: u64) {
    let notice = doc_href("11");
    let pos = doc_href("12");
    mount_listing(
        server,
        "200301",
        2020,
        listing_page(&[(notice.as_str(), "Notice.pdf"), (pos.as_str(), "POS")]),
    )
    .await;
    mount_empty_listings(server).await;
    mount_document(server, "11", PDF_BODY, document_hits).await;
    mount_document(server, "12", PDF_BODY, document_hits).await;
}

fn fetcher(server: &MockServer, sink: Arc<RecordingSink>) -> DocketFetcher {
    DocketFetcher::new(client())
        .with_portal_base(&portal_base(server))
        .unwrap()
        .with_clock(Arc::new(FixedClock(2021)))
        .with_sink(sink)
}

fn request(destination: &std::path::Path) -> FetchRequest {
    FetchRequest::new(Docket::new("200301").unwrap(), 2020)
        .destination(destination)
        .pace(Duration::ZERO)
}

#[tokio::test]
async fn test_fetch_docket_discovers_then_downloads() {
    let server = MockServer::start().await;
    stub_docket_200301(&server, 1).await;
    let temp_dir = TempDir::new().unwrap();
    let destination = temp_dir.path().join("utc_200301");

    let sink = Arc::new(RecordingSink::new());
    let (index, report) = fetcher(&server, sink.clone())
        .fetch_docket_with_report(&request(&destination))
        .await
        .unwrap();

    assert_eq!(index.doc_ids(), vec!["11", "12"]);
    assert_eq!(report.saved(), 2);
    assert_eq!(file_names(&destination), vec!["Notice.pdf", "POS.pdf"]);

    let events = sink.events();
    let complete = events
        .iter()
        .position(|event| matches!(event, FetchEvent::DiscoveryComplete { total: 2 }))
        .expect("discovery completes");
    let first_save = events
        .iter()
        .position(|event| matches!(event, FetchEvent::DocumentSaved { .. }))
        .expect("documents saved");
    assert!(complete < first_save, "discovery must finish before retrieval");
}

#[tokio::test]
async fn test_fetch_docket_rerun_skips_everything() {
    let server = MockServer::start().await;
    stub_docket_200301(&server, 1).await;
    let temp_dir = TempDir::new().unwrap();

    let fetcher = fetcher(&server, Arc::new(RecordingSink::new()));
    let first = fetcher.fetch_docket(&request(temp_dir.path())).await.unwrap();
    let (second, report) = fetcher
        .fetch_docket_with_report(&request(temp_dir.path()))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(report.skipped(), 2);
    assert_eq!(report.saved(), 0);
}

#[tokio::test]
async fn test_fetch_docket_cancelled_before_start() {
    let server = MockServer::start().await;
    stub_docket_200301(&server, 0).await;
    let temp_dir = TempDir::new().unwrap();

    let flag = CancelFlag::new();
    flag.cancel();
    let index = fetcher(&server, Arc::new(RecordingSink::new()))
        .with_cancel_flag(flag)
        .fetch_docket(&request(temp_dir.path()))
        .await
        .unwrap();

    assert!(index.is_empty());
    assert!(file_names(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_fetch_docket_unwritable_destination_is_fatal() {
    let server = MockServer::start().await;
    stub_docket_200301(&server, 0).await;
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("utc_200301");
    std::fs::write(&blocker, b"file in the way").unwrap();

    let err = fetcher(&server, Arc::new(RecordingSink::new()))
        .fetch_docket(&request(&blocker))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Retrieval(_)), "{err:?}");
}
