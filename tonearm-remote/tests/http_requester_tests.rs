//! HttpRequester and RemoteCatalog against a local mock server.

use std::net::TcpListener;
use std::time::Duration;

use httpmock::Method::GET;
use httpmock::MockServer;
use serde_json::json;
use tonearm_core::{
    Catalog, CatalogConfig, CatalogError, EntityKind, RequestContext, SearchReleaseGroupRequest,
};
use tonearm_remote::{HttpRequester, RemoteCatalog};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn remote_for(server: &MockServer, retries: u32) -> RemoteCatalog<HttpRequester> {
    let config = CatalogConfig::default()
        .with_base_url(server.url("/ws/2"))
        .with_user_agent("tonearm-tests/0.0 (tests@example.invalid)")
        .with_timeout(Duration::from_secs(5))
        .with_retry(retries, Duration::from_millis(10), Duration::from_millis(50));
    RemoteCatalog::new(HttpRequester::from_config(&config).unwrap())
}

#[tokio::test]
async fn lookup_sends_includes_format_and_user_agent() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ws/2/release/r-1")
                .query_param("inc", "artists+labels+recordings+release-groups+url-rels")
                .query_param("fmt", "json")
                .header("user-agent", "tonearm-tests/0.0 (tests@example.invalid)");
            then.status(200).json_body(json!({
                "id": "r-1",
                "title": "Moon Safari",
                "status": "Official",
                "date": "1998-01-16",
                "country": "FR",
                "label-info": [
                    {"catalog-number": "7243 8 44978 2 9", "label": {"id": "l-1", "name": "Source"}}
                ],
                "release-group": {"id": "rg-1", "title": "Moon Safari", "primary-type": "Album"}
            }));
        })
        .await;

    let remote = remote_for(&server, 0);
    let record = remote
        .release(&RequestContext::new(), "r-1")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(record.data.title, "Moon Safari");
    assert_eq!(record.data.release_group.primary_type, "Album");
    assert_eq!(record.data.label_info[0].label.name, "Source");
}

#[tokio::test]
async fn ids_that_would_alter_the_url_never_reach_the_server() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/ws/2/artist/a-1");
            then.status(200).json_body(json!({"id": "a-1", "name": "Air"}));
        })
        .await;

    let remote = remote_for(&server, 0);
    let ctx = RequestContext::new();
    for id in ["a-1?x=1", "a-1#frag"] {
        let err = remote.artist(&ctx, id).await.unwrap_err();
        assert_eq!(err, CatalogError::InvalidId { id: id.to_string() });
    }

    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn not_found_is_not_retried() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/ws/2/artist/nonexistent-id");
            then.status(404).json_body(json!({"error": "Not Found"}));
        })
        .await;

    let remote = remote_for(&server, 3);
    let err = remote
        .artist(&RequestContext::new(), "nonexistent-id")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CatalogError::NotFound {
            kind: EntityKind::Artist,
            id: "nonexistent-id".to_string()
        }
    );
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn server_errors_are_retried_until_exhausted() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/ws/2/artist/a-1");
            then.status(503)
                .header("retry-after", "0")
                .body("Service Temporarily Unavailable");
        })
        .await;

    let remote = remote_for(&server, 2);
    let err = remote
        .artist(&RequestContext::new(), "a-1")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CatalogError::Client {
            status: Some(503),
            ..
        }
    ));
    assert_eq!(mock.hits_async().await, 3);
}

#[tokio::test]
async fn search_release_group_hits_search_endpoint() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ws/2/release-group")
                .query_param("query", r#"(artistname:"Air"~) AND rgid:"rg-1""#)
                .query_param("fmt", "json");
            then.status(200).json_body(json!({
                "created": "2024-01-01T00:00:00.000Z",
                "count": 1,
                "offset": 0,
                "release-groups": [{"id": "rg-1", "title": "Moon Safari", "score": 100}]
            }));
        })
        .await;

    let remote = remote_for(&server, 0);
    let request = SearchReleaseGroupRequest {
        artist_name: "Air".to_string(),
        rgid: "rg-1".to_string(),
        ..Default::default()
    };
    let result = remote
        .search_release_group(&RequestContext::new(), &request)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.count, 1);
    assert_eq!(result.release_groups[0].score, 100);
}

#[tokio::test]
async fn transport_failure_is_client_error_without_status() {
    // Bind then drop to get a port nothing listens on.
    let port = match TcpListener::bind("127.0.0.1:0") {
        Ok(listener) => listener.local_addr().unwrap().port(),
        Err(_) => {
            eprintln!("Skipping transport test: cannot bind to localhost");
            return;
        }
    };

    let config = CatalogConfig::default()
        .with_base_url(format!("http://127.0.0.1:{}/ws/2", port))
        .with_timeout(Duration::from_secs(2))
        .with_retry(1, Duration::from_millis(10), Duration::from_millis(10));
    let remote = RemoteCatalog::new(HttpRequester::from_config(&config).unwrap());

    let err = remote
        .artist(&RequestContext::new(), "a-1")
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Client { status: None, .. }));
}
