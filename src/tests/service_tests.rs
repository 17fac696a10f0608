use super::test_helpers::*;
use crate::config::ProviderConfig;
use crate::errors::{CalcError, FetchError};
use crate::models::SensorSeries;
use crate::provider::{HttpReadingProvider, InMemoryProvider, JsonFileProvider, ReadingProvider};
use crate::service::{compute_for_sensor, summarize_for_sensor, OutlierRequest};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const TIMEOUT: Duration = Duration::from_secs(5);

fn june_request() -> OutlierRequest {
    OutlierRequest {
        sensor_uri: SENSOR.to_string(),
        start_date: "2016-6-1".to_string(),
        end_date: "2016-6-30".to_string(),
        start_hour: 9,
        end_hour: 17,
        summer_low: 70.0,
        summer_high: 80.0,
        winter_low: 65.0,
        winter_high: 75.0,
    }
}

// 2016-06-15T10:00Z and 2016-06-18T10:00Z (Saturday)
const STREAM_JSON: &str = r#"[{
    "uuid": "http://buildsys.org/ontologies/Brick#Zone_Air_Temperature_Sensor_1",
    "Metadata": {"SourceName": "Soda Hall"},
    "Readings": [[1465984800000, 75.0], [1465984800000, 95.0], [1466244000000, 99.0]]
}]"#;

#[derive(Default)]
struct CountingProvider {
    calls: AtomicUsize,
}

impl ReadingProvider for CountingProvider {
    async fn fetch(&self, uri: &str) -> Result<SensorSeries, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SensorSeries::new(uri, vec![]))
    }
}

struct SlowProvider;

impl ReadingProvider for SlowProvider {
    async fn fetch(&self, uri: &str) -> Result<SensorSeries, FetchError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(SensorSeries::new(uri, vec![]))
    }
}

/// Serves one canned HTTP response and hands back the raw request head.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).into_owned()
    });

    (format!("http://{}", addr), handle)
}

#[tokio::test]
async fn test_in_memory_round_trip() {
    let provider = InMemoryProvider::new().with_readings(
        SENSOR,
        vec![reading(2016, 6, 15, 10, 75.0), reading(2016, 6, 15, 10, 95.0)],
    );

    let ratio = compute_for_sensor(&provider, &june_request(), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(ratio, 0.5);
}

#[tokio::test]
async fn test_invalid_hours_rejected_before_fetch() {
    let provider = CountingProvider::default();
    let request = OutlierRequest {
        start_hour: 17,
        end_hour: 9,
        ..june_request()
    };

    let err = compute_for_sensor(&provider, &request, TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, CalcError::InvalidHours { start_hour: 17, end_hour: 9 }));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_date_rejected_before_fetch() {
    let provider = CountingProvider::default();
    let request = OutlierRequest {
        end_date: "2016-13-45".to_string(),
        ..june_request()
    };

    let err = compute_for_sensor(&provider, &request, TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, CalcError::InvalidDate { field: "end_date", .. }));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_sensor_surfaces_as_fetch_error() {
    let provider = InMemoryProvider::new();
    let err = compute_for_sensor(&provider, &june_request(), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, CalcError::Fetch(FetchError::UnknownSensor { .. })));
}

#[tokio::test]
async fn test_slow_fetch_times_out() {
    let err = compute_for_sensor(&SlowProvider, &june_request(), Duration::from_millis(20))
        .await
        .unwrap_err();
    match err {
        CalcError::FetchTimeout { uri, timeout } => {
            assert_eq!(uri, SENSOR);
            assert_eq!(timeout, Duration::from_millis(20));
        }
        other => panic!("Expected FetchTimeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_json_file_provider() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(STREAM_JSON.as_bytes()).unwrap();

    let provider = JsonFileProvider::new(file.path());
    let summary = summarize_for_sensor(&provider, &june_request(), TIMEOUT)
        .await
        .unwrap();

    assert_eq!(summary.summer_total, 2);
    assert_eq!(summary.summer_out, 1);
    assert_eq!(summary.ratio, 0.5);
}

#[tokio::test]
async fn test_http_provider_fetches_readings() {
    let (base_url, server) = serve_once("HTTP/1.1 200 OK", STREAM_JSON).await;
    let provider = HttpReadingProvider::new(&ProviderConfig {
        base_url: format!("{}/", base_url),
        auth_token: Some("token-123".to_string()),
        timeout_secs: 5,
    })
    .unwrap();

    let ratio = compute_for_sensor(&provider, &june_request(), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(ratio, 0.5);

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /readings?uri=http"));
    assert!(request
        .to_ascii_lowercase()
        .contains("authorization: bearer token-123"));
}

#[tokio::test]
async fn test_silent_http_server_reports_fetch_timeout() {
    // Accepts connections and never answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let provider = HttpReadingProvider::new(&ProviderConfig {
        base_url: format!("http://{}", addr),
        auth_token: None,
        timeout_secs: 1,
    })
    .unwrap();

    for _ in 0..3 {
        let err = compute_for_sensor(&provider, &june_request(), Duration::from_millis(300))
            .await
            .unwrap_err();
        assert!(
            matches!(err, CalcError::FetchTimeout { .. }),
            "Expected FetchTimeout, got {:?}",
            err
        );
    }
    server.abort();
}

#[tokio::test]
async fn test_http_provider_error_status() {
    let (base_url, server) = serve_once("HTTP/1.1 503 Service Unavailable", "").await;
    let provider = HttpReadingProvider::new(&ProviderConfig {
        base_url,
        auth_token: None,
        timeout_secs: 5,
    })
    .unwrap();

    let err = provider.fetch(SENSOR).await.unwrap_err();
    match err {
        FetchError::Status { status, .. } => assert_eq!(status.as_u16(), 503),
        other => panic!("Expected Status error, got {:?}", other),
    }
    server.await.unwrap();
}
