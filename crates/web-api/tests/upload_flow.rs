mod support;

use reqwest::multipart::{Form, Part};

use support::spawn_server;

#[tokio::test]
async fn image_upload_round_trip() {
    let (addr, shutdown_tx) = spawn_server().await;
    let client = reqwest::Client::new();

    let bytes = b"\x89PNG fake image bytes".to_vec();
    let form = Form::new().part("file", Part::bytes(bytes.clone()).file_name("cat.png"));

    let response = client
        .post(format!("http://{addr}/upload/image"))
        .multipart(form)
        .send()
        .await
        .expect("upload image");
    assert!(response.status().is_success());

    let body = response.json::<serde_json::Value>().await.expect("json");
    let url = body["url"].as_str().expect("url field");
    assert!(url.starts_with("/uploads/"), "存储路径由服务器控制: {url}");
    assert!(url.ends_with(".png"), "保留原始扩展名: {url}");

    // 上传后的内容必须能按返回的 URL 取回
    let fetched = client
        .get(format!("http://{addr}{url}"))
        .send()
        .await
        .expect("fetch upload")
        .bytes()
        .await
        .expect("body");
    assert_eq!(fetched.as_ref(), bytes.as_slice());

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn file_upload_echoes_original_name() {
    let (addr, shutdown_tx) = spawn_server().await;
    let client = reqwest::Client::new();

    let form = Form::new().part(
        "file",
        Part::bytes(b"file contents".to_vec()).file_name("notes.pdf"),
    );

    let body = client
        .post(format!("http://{addr}/upload/file"))
        .multipart(form)
        .send()
        .await
        .expect("upload file")
        .json::<serde_json::Value>()
        .await
        .expect("json");

    assert_eq!(body["name"], "notes.pdf");
    let url = body["url"].as_str().expect("url field");
    assert!(url.starts_with("/uploads/") && url.ends_with(".pdf"));

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() {
    let (addr, shutdown_tx) = spawn_server().await;
    let client = reqwest::Client::new();

    // 只有普通文本字段，没有带文件名的部分
    let form = Form::new().text("note", "no file here");

    let response = client
        .post(format!("http://{addr}/upload/file"))
        .multipart(form)
        .send()
        .await
        .expect("upload request");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn oversize_upload_is_rejected() {
    let (addr, shutdown_tx) = spawn_server().await;
    let client = reqwest::Client::new();

    // 默认上限 5 MiB，上传 6 MiB
    let oversized = vec![0u8; 6 * 1024 * 1024];
    let form = Form::new().part("file", Part::bytes(oversized).file_name("big.bin"));

    let response = client
        .post(format!("http://{addr}/upload/image"))
        .multipart(form)
        .send()
        .await
        .expect("upload request");
    assert_eq!(response.status(), reqwest::StatusCode::PAYLOAD_TOO_LARGE);

    let _ = shutdown_tx.send(());
}
