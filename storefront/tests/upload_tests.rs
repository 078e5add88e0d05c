// tests/upload_tests.rs
mod common;

use actix_web::{http::StatusCode, test};
use common::*;
use serde_json::Value;

use keepsake::web::handlers::upload_handlers::MAX_UPLOAD_BYTES;

const BOUNDARY: &str = "----keepsake-test-boundary";

fn multipart_body(parts: &[(&str, Option<(&str, &str)>, &[u8])]) -> Vec<u8> {
  let mut body = Vec::new();
  for (name, file, content) in parts {
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    match file {
      Some((filename, content_type)) => {
        body.extend_from_slice(
          format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            name, filename, content_type
          )
          .as_bytes(),
        );
      }
      None => {
        body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
      }
    }
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
  }
  body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
  body
}

fn upload_request(body: Vec<u8>) -> test::TestRequest {
  test::TestRequest::post()
    .uri("/api/upload")
    .insert_header(("content-type", format!("multipart/form-data; boundary={}", BOUNDARY)))
    .set_payload(body)
}

#[actix_web::test]
async fn image_upload_is_stored_under_uploads() {
  let ctx = test_context(&[]);
  let app = test::init_service(app(&ctx.state)).await;
  let png: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-bytes";

  let body = multipart_body(&[
    ("note", None, b"ignored field".as_slice()),
    ("file", Some(("Nan & Grandad.PNG", "image/png")), png),
  ]);
  let resp = test::call_service(&app, upload_request(body).to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let json: Value = test::read_body_json(resp).await;

  assert_eq!(json["ok"], true);
  assert_eq!(json["contentType"], "image/png");
  assert_eq!(json["size"], png.len());
  let pathname = json["pathname"].as_str().unwrap();
  assert!(pathname.starts_with("uploads/"));
  assert!(pathname.ends_with("-nan-grandad.png"));
  assert_eq!(json["url"], format!("https://blob.test.local/{}", pathname));

  let (content_type, stored) = ctx.blobs.object(pathname).expect("stored blob");
  assert_eq!(content_type, "image/png");
  assert_eq!(&stored[..], png);
}

#[actix_web::test]
async fn non_images_are_rejected() {
  let ctx = test_context(&[]);
  let app = test::init_service(app(&ctx.state)).await;

  let body = multipart_body(&[("file", Some(("notes.txt", "text/plain")), b"hello".as_slice())]);
  let resp = test::call_service(&app, upload_request(body).to_request()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let json: Value = test::read_body_json(resp).await;
  assert_eq!(json["error"], "Only image files are allowed");
}

#[actix_web::test]
async fn missing_file_field_is_rejected() {
  let ctx = test_context(&[]);
  let app = test::init_service(app(&ctx.state)).await;

  let body = multipart_body(&[("caption", None, b"no file here".as_slice())]);
  let resp = test::call_service(&app, upload_request(body).to_request()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let json: Value = test::read_body_json(resp).await;
  assert_eq!(json["error"], "No file uploaded");
}

#[actix_web::test]
async fn oversized_files_are_rejected() {
  let ctx = test_context(&[]);
  let app = test::init_service(app(&ctx.state)).await;

  let oversized = vec![0u8; MAX_UPLOAD_BYTES + 1];
  let body = multipart_body(&[("file", Some(("huge.jpg", "image/jpeg")), oversized.as_slice())]);
  let resp = test::call_service(&app, upload_request(body).to_request()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let json: Value = test::read_body_json(resp).await;
  assert_eq!(json["error"], "File is too large");
}
