//! Integration tests for link discovery against a stub portal.

mod support;

use std::sync::Arc;

use docket_fetch::{
    CancelFlag, ConfigError, Docket, FetchEvent, FixedClock, LinkDiscovery, RecordingSink,
};
use wiremock::MockServer;

use support::{
    client, doc_href, doc_url, listing_page, mount_empty_listings, mount_listing,
    mount_listing_status, portal_base, request_count,
};

fn discovery(server: &MockServer, current_year: i32) -> LinkDiscovery {
    LinkDiscovery::new(client())
        .with_portal_base(&portal_base(server))
        .expect("stub portal URL is valid")
        .with_clock(Arc::new(FixedClock(current_year)))
}

#[tokio::test]
async fn test_discover_docket_200301_from_2020() {
    let server = MockServer::start().await;
    let notice = doc_href("11");
    mount_listing(
        &server,
        "200301",
        2020,
        listing_page(&[
            (notice.as_str(), "Notice.pdf"),
            ("../../../cases/GetDocument?docID=12", " POS "),
            ("/cases/GetDocument?format=pdf", "No identifier"),
        ]),
    )
    .await;
    mount_empty_listings(&server).await;

    let sink = Arc::new(RecordingSink::new());
    let index = discovery(&server, 2022)
        .with_sink(sink.clone())
        .discover(&Docket::new("200301").unwrap(), 2020, None)
        .await
        .expect("valid range");

    assert_eq!(index.doc_ids(), vec!["11", "12"]);
    let notice = index.get("11").unwrap();
    assert_eq!(notice.source_url, doc_url(&server, "11"));
    assert_eq!(notice.filename, "Notice.pdf");
    let pos = index.get("12").unwrap();
    assert_eq!(pos.source_url, doc_url(&server, "12"));
    assert_eq!(pos.filename, "POS.pdf");

    assert_eq!(
        sink.events(),
        vec![
            FetchEvent::YearScanned {
                year: 2020,
                documents: 2
            },
            FetchEvent::YearScanned {
                year: 2021,
                documents: 0
            },
            FetchEvent::YearScanned {
                year: 2022,
                documents: 0
            },
            FetchEvent::DiscoveryComplete { total: 2 },
        ]
    );
}

#[tokio::test]
async fn test_discover_first_year_wins_for_repeated_id() {
    let server = MockServer::start().await;
    let first = doc_href("42");
    mount_listing(
        &server,
        "220066",
        2020,
        listing_page(&[(first.as_str(), "Initial Filing")]),
    )
    .await;
    mount_listing(
        &server,
        "220066",
        2021,
        listing_page(&[
            ("/cases/GetDocument?docID=42&relisted=1", "Relisted Filing"),
            ("/cases/GetDocument?docID=43", "Order"),
        ]),
    )
    .await;

    let index = discovery(&server, 2021)
        .discover(&Docket::new("220066").unwrap(), 2020, Some(2021))
        .await
        .unwrap();

    assert_eq!(index.len(), 2);
    let kept = index.get("42").unwrap();
    assert_eq!(kept.source_url, doc_url(&server, "42"));
    assert_eq!(kept.filename, "Initial Filing.pdf");
    assert_eq!(index.get("43").unwrap().filename, "Order.pdf");
}

#[tokio::test]
async fn test_discover_skips_unreachable_years() {
    let server = MockServer::start().await;
    let early = doc_href("100");
    let late = doc_href("300");
    mount_listing(
        &server,
        "230005",
        2021,
        listing_page(&[(early.as_str(), "Petition")]),
    )
    .await;
    mount_listing_status(&server, "230005", 2022, 404).await;
    mount_listing_status(&server, "230005", 2023, 503).await;
    mount_listing(
        &server,
        "230005",
        2024,
        listing_page(&[(late.as_str(), "Final Order")]),
    )
    .await;

    let sink = Arc::new(RecordingSink::new());
    let (index, report) = discovery(&server, 2024)
        .with_sink(sink.clone())
        .discover_with_report(&Docket::new("230005").unwrap(), 2021, None)
        .await
        .unwrap();

    assert_eq!(index.doc_ids(), vec!["100", "300"]);
    assert_eq!(report.unavailable_years(), vec![2022, 2023]);
    assert_eq!(report.total(), 2);
    assert!(!report.interrupted);

    let unavailable: Vec<(i32, String)> = sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            FetchEvent::YearUnavailable { year, reason, .. } => Some((year, reason)),
            _ => None,
        })
        .collect();
    assert_eq!(unavailable.len(), 2);
    assert!(unavailable[0].1.contains("404"), "{:?}", unavailable[0]);
    assert!(unavailable[1].1.contains("503"), "{:?}", unavailable[1]);
}

#[tokio::test]
async fn test_discover_grows_monotonically_with_end_year() {
    let server = MockServer::start().await;
    let a = doc_href("1");
    let b = doc_href("2");
    let c = doc_href("3");
    mount_listing(&server, "190001", 2019, listing_page(&[(a.as_str(), "A")])).await;
    mount_listing(
        &server,
        "190001",
        2020,
        listing_page(&[(b.as_str(), "B"), (a.as_str(), "A again")]),
    )
    .await;
    mount_listing(&server, "190001", 2022, listing_page(&[(c.as_str(), "C")])).await;
    mount_empty_listings(&server).await;

    let docket = Docket::new("190001").unwrap();
    let discovery = discovery(&server, 2023);
    let mut previous: Vec<String> = Vec::new();
    for end_year in 2019..=2023 {
        let index = discovery.discover(&docket, 2019, Some(end_year)).await.unwrap();
        let ids: Vec<String> = index.doc_ids().into_iter().map(String::from).collect();

        assert!(ids.len() >= previous.len(), "shrank at {end_year}");
        assert!(
            previous.iter().all(|id| ids.contains(id)),
            "lost ids at {end_year}: {previous:?} -> {ids:?}"
        );
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len(), "duplicate ids at {end_year}");
        previous = ids;
    }
    assert_eq!(previous, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_discover_filenames_always_end_in_pdf() {
    let server = MockServer::start().await;
    let hrefs: Vec<String> = (1..=7).map(|id| doc_href(&id.to_string())).collect();
    let texts = [
        "",
        "   ",
        "Brief.PDF",
        "memo",
        "<b>Bold</b> &amp; Exhibit",
        "a/b:c",
        "Report.pdf.docx",
    ];
    let links: Vec<(&str, &str)> = hrefs
        .iter()
        .map(String::as_str)
        .zip(texts.iter().copied())
        .collect();
    mount_listing(&server, "210100", 2021, listing_page(&links)).await;

    let index = discovery(&server, 2021)
        .discover(&Docket::new("210100").unwrap(), 2021, None)
        .await
        .unwrap();

    assert_eq!(index.len(), 7);
    for record in &index {
        assert!(
            record.filename.to_ascii_lowercase().ends_with(".pdf"),
            "{record:?}"
        );
        assert!(!record.filename.contains('/'), "{record:?}");
    }
    assert_eq!(index.get("1").unwrap().filename, "1.pdf");
    assert_eq!(index.get("2").unwrap().filename, "2.pdf");
    assert_eq!(index.get("3").unwrap().filename, "Brief.PDF");
    assert_eq!(index.get("4").unwrap().filename, "memo.pdf");
    assert_eq!(index.get("5").unwrap().filename, "Bold & Exhibit.pdf");
}

#[tokio::test]
async fn test_discover_rejects_inverted_range_without_requests() {
    let server = MockServer::start().await;
    mount_empty_listings(&server).await;

    let err = discovery(&server, 2025)
        .discover(&Docket::new("200301").unwrap(), 2024, Some(2020))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ConfigError::InvertedYearRange {
            start: 2024,
            end: 2020
        }
    );
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_discover_stops_when_cancelled() {
    let server = MockServer::start().await;
    mount_empty_listings(&server).await;

    let flag = CancelFlag::new();
    flag.cancel();
    let (index, report) = discovery(&server, 2022)
        .with_cancel_flag(flag)
        .discover_with_report(&Docket::new("200301").unwrap(), 2020, None)
        .await
        .unwrap();

    assert!(index.is_empty());
    assert!(report.interrupted);
    assert_eq!(request_count(&server).await, 0);
}
