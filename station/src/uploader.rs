use log::{info, warn};
use reqwest::{
    Client, RequestBuilder,
    multipart::{Form, Part},
};
use std::path::Path;
use telemetry::TelemetryRecord;

use crate::{
    config::{UploadConfig, UploadShape},
    error::UploadError,
    retry::RetryPolicy,
};

const IMAGE_MIME: &str = "image/jpeg";
const COMBINED_IMAGE_NAME: &str = "image.jpg";

/// Posts records and images to the ingestion API.
///
/// Transport errors and 5xx responses are retried with a fixed delay; a 4xx
/// response is returned at once as [`UploadError::Rejected`].
pub struct Uploader {
    client: Client,
    shape: UploadShape,
    data_url: String,
    image_url: String,
    retry: RetryPolicy,
}

impl Uploader {
    pub fn new(config: &UploadConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            shape: config.shape,
            data_url: config.data_url.clone(),
            image_url: config.image_url.clone(),
            retry: config.retry(),
        })
    }

    pub fn shape(&self) -> UploadShape {
        self.shape
    }

    /// Sends a record, with an image when one is given, and returns the
    /// response body of the record request.
    ///
    /// In the split shape the image goes out as a second, independent
    /// request to the image endpoint after the record was accepted.
    pub async fn send_record(
        &self,
        record: &TelemetryRecord,
        image: Option<&Path>,
    ) -> Result<String, UploadError> {
        match self.shape {
            UploadShape::Split => {
                let body = self
                    .send_with_retry("record", || Ok(self.client.post(&self.data_url).json(record)))
                    .await?;

                if let Some(path) = image {
                    self.send_image(path).await?;
                }

                Ok(body)
            }
            UploadShape::Combined => {
                let fields = record.form_fields()?;
                let image = match image {
                    Some(path) => Some(read_image(path).await?),
                    None => None,
                };

                self.send_with_retry("record", || {
                    let mut form = Form::new();
                    for (name, value) in &fields {
                        form = form.text(name.clone(), value.clone());
                    }
                    if let Some(bytes) = &image {
                        let part = Part::bytes(bytes.clone())
                            .file_name(COMBINED_IMAGE_NAME)
                            .mime_str(IMAGE_MIME)?;
                        form = form.part("image", part);
                    }

                    Ok(self.client.post(&self.data_url).multipart(form))
                })
                .await
            }
        }
    }

    /// Uploads an image file on its own as the multipart part `file`.
    pub async fn send_image(&self, path: &Path) -> Result<String, UploadError> {
        let bytes = read_image(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| COMBINED_IMAGE_NAME.to_string());

        self.send_with_retry("image", || {
            let part = Part::bytes(bytes.clone())
                .file_name(file_name.clone())
                .mime_str(IMAGE_MIME)?;

            Ok(self
                .client
                .post(&self.image_url)
                .multipart(Form::new().part("file", part)))
        })
        .await
    }

    async fn send_with_retry<F>(&self, what: &str, build: F) -> Result<String, UploadError>
    where
        F: Fn() -> Result<RequestBuilder, UploadError>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let failure = match build()?.send().await {
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();

                    if status.is_success() {
                        info!("[UPLOAD] {what} accepted ({status}): {}", body.trim());
                        return Ok(body);
                    }
                    if status.is_client_error() {
                        return Err(UploadError::Rejected { status, body });
                    }

                    format!("{status}: {}", body.trim())
                }
                Err(e) => e.to_string(),
            };

            warn!(
                "[UPLOAD] {what} attempt {attempt}/{} failed: {failure}",
                self.retry.attempts
            );

            if self.retry.is_last(attempt) {
                return Err(UploadError::SendFailed {
                    attempts: attempt,
                    last: failure,
                });
            }

            self.retry.pause().await;
        }
    }
}

async fn read_image(path: &Path) -> Result<Vec<u8>, UploadError> {
    tokio::fs::read(path).await.map_err(|source| UploadError::Image {
        path: path.to_path_buf(),
        source,
    })
}
