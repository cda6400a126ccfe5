mod common;

use axum::http::StatusCode;
use chrono::DateTime;
use common::{MockApi, unreachable_url};
use station::{
    config::{UploadConfig, UploadShape},
    error::UploadError,
    uploader::Uploader,
};
use telemetry::{SensorReading, TelemetryRecord, WeatherSnapshot};

fn record() -> TelemetryRecord {
    TelemetryRecord::compose(
        SensorReading::from_celsius(21.0, 45.0, 1013.25),
        None,
        None,
        DateTime::from_timestamp(1_714_564_800, 0).unwrap(),
    )
}

fn uploader(shape: UploadShape, data_url: String, image_url: String) -> Uploader {
    Uploader::new(&UploadConfig {
        shape,
        data_url,
        image_url,
        retries: 3,
        retry_delay_seconds: 0,
        timeout_seconds: 5,
    })
    .unwrap()
}

fn split(api: &MockApi) -> Uploader {
    uploader(UploadShape::Split, api.data_url(), api.image_url())
}

#[tokio::test]
async fn record_is_posted_once_as_json() {
    let api = MockApi::start().await;
    let record = record();

    let body = split(&api).send_record(&record, None).await.unwrap();

    let requests = api.data_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(*requests[0].json(), serde_json::to_value(&record).unwrap());
    assert_eq!(body, "{\"status\":\"200\"}");
    assert!(api.image_requests().is_empty());
}

#[tokio::test]
async fn server_errors_are_retried() {
    let api = MockApi::failing_first(2).await;

    split(&api).send_record(&record(), None).await.unwrap();

    assert_eq!(api.data_requests().len(), 3);
}

#[tokio::test]
async fn gives_up_after_configured_attempts() {
    let api = MockApi::failing_first(10).await;

    let err = split(&api).send_record(&record(), None).await.unwrap_err();

    assert!(matches!(err, UploadError::SendFailed { attempts: 3, .. }));
    assert_eq!(api.data_requests().len(), 3);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let api = MockApi::responding(StatusCode::BAD_REQUEST).await;

    let err = split(&api).send_record(&record(), None).await.unwrap_err();

    match err {
        UploadError::Rejected { status, .. } => assert_eq!(status, StatusCode::BAD_REQUEST),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(api.data_requests().len(), 1);
}

#[tokio::test]
async fn unreachable_endpoint_fails_after_retries() {
    let url = unreachable_url().await;
    let uploader = uploader(UploadShape::Split, url.clone(), url);

    let err = uploader.send_record(&record(), None).await.unwrap_err();

    assert!(matches!(err, UploadError::SendFailed { attempts: 3, .. }));
}

#[tokio::test]
async fn image_is_uploaded_as_file_part() {
    let api = MockApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("image_20240501_120000.jpg");
    std::fs::write(&path, b"\xff\xd8jpeg").unwrap();

    split(&api).send_image(&path).await.unwrap();

    let requests = api.image_requests();
    assert_eq!(requests.len(), 1);

    let file = requests[0].part("file");
    assert_eq!(file.file_name.as_deref(), Some("image_20240501_120000.jpg"));
    assert_eq!(file.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(file.data, b"\xff\xd8jpeg");
}

#[tokio::test]
async fn split_record_with_image_makes_two_requests() {
    let api = MockApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("still.jpg");
    std::fs::write(&path, b"jpeg").unwrap();

    split(&api).send_record(&record(), Some(&path)).await.unwrap();

    assert_eq!(api.data_requests().len(), 1);
    assert_eq!(api.image_requests().len(), 1);
}

#[tokio::test]
async fn missing_image_file_is_reported() {
    let api = MockApi::start().await;
    let dir = tempfile::tempdir().unwrap();

    let err = split(&api)
        .send_image(&dir.path().join("gone.jpg"))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Image { .. }));
    assert!(api.image_requests().is_empty());
}

#[tokio::test]
async fn combined_shape_sends_fields_and_image_together() {
    let api = MockApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("still.jpg");
    std::fs::write(&path, b"jpeg").unwrap();

    let mut record = record();
    record.weather = WeatherSnapshot {
        wind_speed: Some(1.4),
        ..Default::default()
    };

    let uploader = uploader(UploadShape::Combined, api.data_url(), api.image_url());
    uploader.send_record(&record, Some(&path)).await.unwrap();

    let requests = api.data_requests();
    assert_eq!(requests.len(), 1);
    assert!(api.image_requests().is_empty());

    let request = &requests[0];
    assert_eq!(request.part("temperature_c").text(), "21.0");
    assert_eq!(request.part("humidity").text(), "45.0");
    assert_eq!(request.part("pressure").text(), "1013.25");
    assert_eq!(request.part("timestamp").text(), record.timestamp);
    assert_eq!(request.part("ambientWeatherWindSpeed").text(), "1.4");
    assert_eq!(request.part("ambientWeatherTemp").text(), "0.0");

    let image = request.part("image");
    assert_eq!(image.file_name.as_deref(), Some("image.jpg"));
    assert_eq!(image.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(image.data, b"jpeg");
}

#[tokio::test]
async fn combined_shape_without_image_has_no_image_part() {
    let api = MockApi::start().await;
    let uploader = uploader(UploadShape::Combined, api.data_url(), api.image_url());

    uploader.send_record(&record(), None).await.unwrap();

    let requests = api.data_requests();
    assert!(requests[0].parts().iter().all(|part| part.name != "image"));
    assert!(requests[0].parts().iter().all(|part| part.file_name.is_none()));
}
