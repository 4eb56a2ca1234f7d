//! End-to-end checks for [`HttpGeoDataSource`] against a local HTTP server.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rstest::rstest;
use sitescore_core::{FeatureExtractor, GeoDataError, GeoDataSource, GeoPoint, TagFilter};
use sitescore_data::{HttpGeoDataSource, HttpGeoDataSourceConfig};

/// Serve one canned response and return the request line that was received.
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap_or_else(|err| panic!("bind: {err}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|err| panic!("local addr: {err}"));
    let handle = thread::spawn(move || {
        let (stream, _) = listener
            .accept()
            .unwrap_or_else(|err| panic!("accept: {err}"));
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .unwrap_or_else(|err| panic!("read request: {err}"));
        loop {
            let mut header = String::new();
            let read = reader
                .read_line(&mut header)
                .unwrap_or_else(|err| panic!("read header: {err}"));
            if read == 0 || header == "\r\n" {
                break;
            }
        }
        let mut stream = reader.into_inner();
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        stream
            .write_all(response.as_bytes())
            .unwrap_or_else(|err| panic!("write response: {err}"));
        request_line
    });
    (format!("http://{addr}"), handle)
}

fn source(base: &str) -> HttpGeoDataSource {
    let config = HttpGeoDataSourceConfig::default()
        .with_overpass_url(format!("{base}/api/interpreter"))
        .with_nominatim_url(base)
        .with_timeout(Duration::from_secs(5));
    HttpGeoDataSource::with_config(config).unwrap_or_else(|err| panic!("build source: {err}"))
}

fn paris() -> GeoPoint {
    GeoPoint::new(48.8566, 2.3522).unwrap_or_else(|err| panic!("{err}"))
}

#[rstest]
fn overpass_elements_become_features() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"elements":[
            {"type":"node","id":1,"lat":48.8567,"lon":2.3523,"tags":{"shop":"shoes"}},
            {"type":"way","id":2,"center":{"lat":48.8568,"lon":2.3524},"tags":{"amenity":"restaurant"}}
        ]}"#,
    );
    let extraction = FeatureExtractor::new(source(&base)).extract(paris(), 500.0);
    let request = server.join().unwrap_or_else(|_| panic!("server panicked"));

    assert!(request.starts_with("GET /api/interpreter?data="));
    assert!(!extraction.is_degraded());
    let features = extraction.features();
    assert_eq!(features.shops_shoes, 1);
    assert_eq!(features.restaurants, 1);
    assert_eq!(features.total_pois, 2);
}

#[rstest]
fn server_errors_surface_as_http_errors() {
    let (base, server) = serve_once("503 Service Unavailable", "{}");
    let err = source(&base)
        .query_features_near(paris(), 500.0, &TagFilter::retail())
        .expect_err("should fail");
    server.join().unwrap_or_else(|_| panic!("server panicked"));

    assert!(matches!(err, GeoDataError::Http { status: 503, .. }));
}

#[rstest]
fn overpass_runtime_remarks_are_service_errors() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"elements":[],"remark":"runtime error: Query timed out in \"query\" at line 3 after 30 seconds."}"#,
    );
    let err = source(&base)
        .query_features_near(paris(), 500.0, &TagFilter::retail())
        .expect_err("should fail");
    server.join().unwrap_or_else(|_| panic!("server panicked"));

    assert!(matches!(err, GeoDataError::Service { .. }));
}

#[rstest]
fn nominatim_outline_becomes_boundary() {
    let (base, server) = serve_once(
        "200 OK",
        r#"[{"display_name":"Lille, Nord, France","geojson":{"type":"Polygon","coordinates":[[[3.0,50.6],[3.1,50.6],[3.1,50.7],[3.0,50.7],[3.0,50.6]]]}}]"#,
    );
    let boundary = source(&base)
        .resolve_boundary("Lille, France")
        .unwrap_or_else(|err| panic!("resolve: {err}"));
    let request = server.join().unwrap_or_else(|_| panic!("server panicked"));

    assert!(request.starts_with("GET /search?q=Lille%2C+France"));
    assert_eq!(boundary.0.len(), 1);
}

#[rstest]
fn empty_search_is_boundary_not_found() {
    let (base, server) = serve_once("200 OK", "[]");
    let err = source(&base)
        .resolve_boundary("Atlantis, France")
        .expect_err("should fail");
    server.join().unwrap_or_else(|_| panic!("server panicked"));

    assert!(matches!(err, GeoDataError::BoundaryNotFound { .. }));
}
