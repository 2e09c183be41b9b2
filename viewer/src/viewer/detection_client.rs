use std::time::Duration;
use tokio::sync::RwLock;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use common::detection::utils::detection::Detection;
use crate::viewer::utils::detection_error::DetectionError;
use crate::viewer::utils::detection_request::DetectionRequest;

#[async_trait]
pub trait DetectionService: Send + Sync {
    /// Returns one batch of detections per submitted file.
    async fn detect(&self, request: DetectionRequest) -> Result<Vec<Vec<Detection>>, DetectionError>;

    /// Applies to requests issued after the call returns.
    async fn set_timeouts(&self, request_timeout: Duration, connect_timeout: Duration) -> Result<(), DetectionError>;
}

#[async_trait]
impl<S: DetectionService + ?Sized> DetectionService for Box<S> {
    async fn detect(&self, request: DetectionRequest) -> Result<Vec<Vec<Detection>>, DetectionError> {
        (**self).detect(request).await
    }

    async fn set_timeouts(&self, request_timeout: Duration, connect_timeout: Duration) -> Result<(), DetectionError> {
        (**self).set_timeouts(request_timeout, connect_timeout).await
    }
}

pub struct HttpDetectionService {
    client: RwLock<reqwest::Client>,
}

impl HttpDetectionService {
    pub fn new(request_timeout: Duration, connect_timeout: Duration) -> Result<Self, DetectionError> {
        Ok(Self {
            client: RwLock::new(Self::build_client(request_timeout, connect_timeout)?),
        })
    }

    fn build_client(request_timeout: Duration, connect_timeout: Duration) -> Result<reqwest::Client, DetectionError> {
        reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|err| DetectionError::Network(err.to_string()))
    }

    pub fn endpoint(address: &str, threshold: f64) -> String {
        format!("{}/crop?threshold={}", address.trim_end_matches('/'), threshold)
    }
}

#[async_trait]
impl DetectionService for HttpDetectionService {
    async fn detect(&self, request: DetectionRequest) -> Result<Vec<Vec<Detection>>, DetectionError> {
        let url = Self::endpoint(&request.address, request.threshold);
        let part = Part::bytes(request.bytes)
            .file_name(request.file_name)
            .mime_str(&request.mime)
            .map_err(|err| DetectionError::Validation(err.to_string()))?;
        let form = Form::new().part("file", part);
        let client = self.client.read().await.clone();
        let response = client.post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| DetectionError::Network(err.to_string()))?;
        let status = response.status();
        let body = response.text()
            .await
            .map_err(|err| DetectionError::Network(err.to_string()))?;
        if !status.is_success() {
            return Err(DetectionError::Service {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|err| DetectionError::Parse(err.to_string()))
    }

    async fn set_timeouts(&self, request_timeout: Duration, connect_timeout: Duration) -> Result<(), DetectionError> {
        let client = Self::build_client(request_timeout, connect_timeout)?;
        *self.client.write().await = client;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use futures::TryStreamExt;
    use actix_multipart::Multipart;
    use actix_web::http::StatusCode;
    use actix_web::{web, App, HttpResponse, HttpServer};

    #[derive(Deserialize)]
    struct ThresholdQuery {
        threshold: f64,
    }

    fn service() -> HttpDetectionService {
        HttpDetectionService::new(Duration::from_secs(5), Duration::from_secs(5)).unwrap()
    }

    fn request(address: String) -> DetectionRequest {
        DetectionRequest {
            address,
            threshold: 0.35,
            file_name: "harbor.png".to_string(),
            mime: "image/png".to_string(),
            bytes: vec![1, 2, 3, 4, 5],
        }
    }

    async fn canned_service(status: u16, body: &'static str) -> String {
        let server = HttpServer::new(move || {
            App::new().route("/crop", web::post().to(move || async move {
                HttpResponse::build(StatusCode::from_u16(status).unwrap()).body(body)
            }))
        })
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
        let address = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{address}")
    }

    /// Answers with one detection whose label is the multipart field name, width the byte count
    /// and confidence the threshold it was asked for.
    async fn echo(query: web::Query<ThresholdQuery>, mut payload: Multipart) -> HttpResponse {
        let mut field_name = String::new();
        let mut length = 0;
        while let Ok(Some(mut field)) = payload.try_next().await {
            field_name = field.name().unwrap_or_default().to_string();
            while let Ok(Some(chunk)) = field.try_next().await {
                length += chunk.len();
            }
        }
        let body = format!(
            r#"[[{{"bbox":[0,0,{length},1],"class_name":"{field_name}","confidence":{}}}]]"#,
            query.threshold
        );
        HttpResponse::Ok().content_type("application/json").body(body)
    }

    #[test]
    fn endpoint_joins_address_and_threshold() {
        assert_eq!(HttpDetectionService::endpoint("http://10.0.0.2:8000/", 0.5), "http://10.0.0.2:8000/crop?threshold=0.5");
        assert_eq!(HttpDetectionService::endpoint("http://10.0.0.2:8000", 0.35), "http://10.0.0.2:8000/crop?threshold=0.35");
    }

    #[actix_web::test]
    async fn uploads_file_field_with_threshold() {
        let server = HttpServer::new(|| App::new().route("/crop", web::post().to(echo)))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
        let address = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        let batches = service().detect(request(format!("http://{address}"))).await.unwrap();
        let detection = &batches[0][0];
        assert_eq!(detection.class_name, "file");
        assert_eq!(detection.bbox.x2, 5.0);
        assert!((detection.confidence - 0.35).abs() < 1e-9);
    }

    #[actix_web::test]
    async fn parses_first_batch() {
        let address = canned_service(200, r#"[[{"bbox":[0,0,10,10],"class_name":"seal","confidence":0.92}]]"#).await;
        let batches = service().detect(request(address)).await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
        assert!((batches[0][0].confidence - 0.92).abs() < 1e-9);
    }

    #[actix_web::test]
    async fn empty_outer_array_is_not_an_error() {
        let address = canned_service(200, "[]").await;
        assert!(service().detect(request(address)).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn non_success_status_keeps_body() {
        let address = canned_service(500, "boom").await;
        let err = service().detect(request(address)).await.unwrap_err();
        assert_eq!(err, DetectionError::Service {
            status: 500,
            status_text: "Internal Server Error".to_string(),
            body: "boom".to_string(),
        });
        let message = err.to_string();
        assert!(message.contains("500") && message.contains("boom"));
    }

    #[actix_web::test]
    async fn invalid_json_is_a_parse_error() {
        let address = canned_service(200, "<html>").await;
        let err = service().detect(request(address)).await.unwrap_err();
        assert!(matches!(err, DetectionError::Parse(_)));
    }

    #[actix_web::test]
    async fn unreachable_service_is_a_network_error() {
        let err = service().detect(request("http://127.0.0.1:1".to_string())).await.unwrap_err();
        assert!(matches!(err, DetectionError::Network(_)));
    }

    #[actix_web::test]
    async fn shortened_timeout_applies_to_next_request() {
        let server = HttpServer::new(|| {
            App::new().route("/crop", web::post().to(|| async {
                actix_web::rt::time::sleep(Duration::from_millis(800)).await;
                HttpResponse::Ok().content_type("application/json").body("[]")
            }))
        })
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
        let address = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        let service = service();
        assert!(service.detect(request(format!("http://{address}"))).await.unwrap().is_empty());
        service.set_timeouts(Duration::from_millis(100), Duration::from_secs(5)).await.unwrap();
        let err = service.detect(request(format!("http://{address}"))).await.unwrap_err();
        assert!(matches!(err, DetectionError::Network(_)));
    }
}
