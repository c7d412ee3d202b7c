//! Shared fixtures for the integration tests: a stub commission portal
//! served by wiremock.

#![allow(dead_code)]

use docket_fetch::HttpClient;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Minimal body that passes the `%PDF-` header check.
pub const PDF_BODY: &[u8] = b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n%%EOF\n";

/// Portal root on the stub server.
pub fn portal_base(server: &MockServer) -> String {
    format!("{}/casedocket", server.uri())
}

/// Root-relative document link as the portal renders it.
pub fn doc_href(doc_id: &str) -> String {
    format!("/cases/GetDocument?docID={doc_id}")
}

/// Absolute document URL on the stub server.
pub fn doc_url(server: &MockServer, doc_id: &str) -> String {
    format!("{}{}", server.uri(), doc_href(doc_id))
}

/// Renders a listing page with one table row per `(href, text)` anchor.
pub fn listing_page(links: &[(&str, &str)]) -> String {
    let rows: String = links
        .iter()
        .map(|(href, text)| format!("<tr><td><a href=\"{href}\">{text}</a></td></tr>\n"))
        .collect();
    format!(
        "<html><head><title>Docket</title></head><body>\
         <a href=\"/casedocket/help\">Help</a>\
         <table>\n{rows}</table></body></html>"
    )
}

/// Serves `html` as the listing page for `docket` in `year`.
pub async fn mount_listing(server: &MockServer, docket: &str, year: i32, html: String) {
    Mock::given(method("GET"))
        .and(path(format!("/casedocket/{year}/{docket}/docsets")))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .with_priority(1)
        .mount(server)
        .await;
}

/// Answers the listing page for `docket` in `year` with `status`.
pub async fn mount_listing_status(server: &MockServer, docket: &str, year: i32, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/casedocket/{year}/{docket}/docsets")))
        .respond_with(ResponseTemplate::new(status))
        .with_priority(1)
        .mount(server)
        .await;
}

/// Serves an empty listing page for every year not mounted explicitly.
pub async fn mount_empty_listings(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/casedocket/\d{4}/\d+/docsets$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[])))
        .with_priority(10)
        .mount(server)
        .await;
}

/// Serves `body` for document `doc_id`, expecting exactly `expected_hits` requests.
pub async fn mount_document(server: &MockServer, doc_id: &str, body: &[u8], expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path("/cases/GetDocument"))
        .and(query_param("docID", doc_id))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(expected_hits)
        .mount(server)
        .await;
}

/// Answers document `doc_id` with `status`.
pub async fn mount_document_status(server: &MockServer, doc_id: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path("/cases/GetDocument"))
        .and(query_param("docID", doc_id))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Number of requests the stub server has seen so far.
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map_or(0, |requests| requests.len())
}

pub fn client() -> HttpClient {
    HttpClient::new().expect("client should build")
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("destination should be readable")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
