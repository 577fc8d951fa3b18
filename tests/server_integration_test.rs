use echo_server::client::{classify_url, send_image_for_classification};
use echo_server::core::digit::weights::ModelWeights;
use echo_server::domain::model::ClassifierKind;
use echo_server::{build_classifier, server, ServerConfig};
use image::{GrayImage, ImageFormat, Luma};
use std::io::Cursor;
use tempfile::TempDir;
use tokio::sync::oneshot;

struct RunningServer {
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl RunningServer {
    async fn start(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let app = server::router(build_classifier(&config), config.max_body_bytes);
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            server::serve(listener, app, async move {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            base_url,
            shutdown: Some(tx),
            handle,
        }
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap();
    }
}

fn write_png(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let img = GrayImage::from_fn(28, 28, |x, y| Luma([((x + y) * 4) as u8]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();

    let path = dir.path().join(name);
    std::fs::write(&path, buf.into_inner()).unwrap();
    path
}

#[tokio::test]
async fn test_echo_round_trip_over_tcp() {
    let temp_dir = TempDir::new().unwrap();
    let image_path = temp_dir.path().join("payload.bin");
    std::fs::write(&image_path, b"Hello").unwrap();

    let server = RunningServer::start(ServerConfig::default()).await;

    let report = send_image_for_classification(&image_path, &classify_url(&server.base_url))
        .await
        .unwrap();

    assert_eq!(report.status, 200);
    assert_eq!(report.body, serde_json::json!({ "decoded": "48656c6c6f" }));

    server.stop().await;
}

#[tokio::test]
async fn test_digit_classifier_over_tcp() {
    let temp_dir = TempDir::new().unwrap();
    let model_path = temp_dir.path().join("mnist_classifier.json");
    let mut weights = ModelWeights::zeroed();
    weights.get_mut("fc2.bias").unwrap().data[9] = 3.0;
    weights.to_file(&model_path).unwrap();

    let config = ServerConfig {
        classifier: ClassifierKind::Digit,
        model_path: model_path.to_str().unwrap().to_string(),
        ..ServerConfig::default()
    };
    let server = RunningServer::start(config).await;

    let image_path = write_png(&temp_dir, "digit.png");
    let report = send_image_for_classification(&image_path, &classify_url(&server.base_url))
        .await
        .unwrap();

    assert_eq!(report.status, 200);
    assert_eq!(report.body, serde_json::json!({ "predicted_digit": 9 }));

    // bytes that decode from base64 but are not an image
    let not_image = temp_dir.path().join("notes.txt");
    std::fs::write(&not_image, b"plain text").unwrap();
    let report = send_image_for_classification(&not_image, &classify_url(&server.base_url))
        .await
        .unwrap();
    assert_eq!(report.status, 400);
    assert!(report.body["error"]
        .as_str()
        .unwrap()
        .starts_with("Image preprocessing failed: "));

    server.stop().await;
}

#[tokio::test]
async fn test_missing_model_answers_503_and_health_reports_it() {
    let temp_dir = TempDir::new().unwrap();
    let config = ServerConfig {
        classifier: ClassifierKind::Digit,
        model_path: temp_dir
            .path()
            .join("absent.json")
            .to_str()
            .unwrap()
            .to_string(),
        ..ServerConfig::default()
    };
    let server = RunningServer::start(config).await;
    let client = reqwest::Client::new();

    let response = client
        .post(classify_url(&server.base_url))
        .json(&serde_json::json!({ "image": "AAAA" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 503);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Model not loaded. Cannot perform classification."
    );

    let health: serde_json::Value = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["ready"], false);

    server.stop().await;
}

#[tokio::test]
async fn test_body_without_json_content_type_is_still_parsed() {
    let server = RunningServer::start(ServerConfig::default()).await;

    let response = reqwest::Client::new()
        .post(classify_url(&server.base_url))
        .header("content-type", "text/plain")
        .body(r#"{"image": "AQID"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["decoded"], "010203");

    server.stop().await;
}
