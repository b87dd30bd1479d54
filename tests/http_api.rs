use actix_web::http::StatusCode;
use actix_web::{test, App};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use contact_bridge_lib::build_state;
use contact_bridge_lib::domain::error::{AppError, Result};
use contact_bridge_lib::infrastructure::config::AppConfig;
use contact_bridge_lib::infrastructure::crm_client::{BatchCall, BatchOptions, BatchOutcome, CrmApi};
use contact_bridge_lib::infrastructure::csv::{decode_utf16, encode_utf16};
use contact_bridge_lib::interfaces::http::configure;

const BOUNDARY: &str = "contact-bridge-test-boundary";

/// CRM with one company and no contacts; records every added contact.
#[derive(Default)]
struct RecordingCrm {
    added: Mutex<Vec<Value>>,
}

#[async_trait]
impl CrmApi for RecordingCrm {
    async fn call_list_method(&self, method: &str, _params: Value) -> Result<Vec<Value>> {
        match method {
            "crm.contact.list" => Ok(Vec::new()),
            "crm.company.list" => Ok(vec![json!({"ID": "7", "TITLE": "ИП \"Иванов\""})]),
            other => Err(AppError::CrmApi(format!("unexpected method {}", other))),
        }
    }

    async fn batch_api_call(
        &self,
        calls: Vec<BatchCall>,
        _options: BatchOptions,
    ) -> Result<HashMap<String, BatchOutcome>> {
        let mut added = self.added.lock().unwrap();
        Ok(calls
            .into_iter()
            .map(|call| {
                added.push(call.params["fields"].clone());
                (call.label, BatchOutcome::succeeded(json!(added.len())))
            })
            .collect())
    }
}

fn multipart_body(file_name: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n",
        BOUNDARY, file_name
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload(file_name: &str, bytes: &[u8]) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/contacts/import")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(file_name, bytes))
}

#[actix_web::test]
async fn test_export_empty_crm_returns_header_only_csv() {
    let state = build_state(Arc::new(RecordingCrm::default()), &AppConfig::default());
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/contacts/export")
        .set_form([("exporter_format", "csv")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-disposition").unwrap(),
        "attachment; filename=\"contact_export.csv\""
    );
    let body = test::read_body(resp).await;
    assert_eq!(
        decode_utf16(&body).unwrap(),
        "имя,фамилия,номер телефона,почта,компания\r\n"
    );
}

#[actix_web::test]
async fn test_export_unknown_format_is_bad_request() {
    let state = build_state(Arc::new(RecordingCrm::default()), &AppConfig::default());
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/contacts/export")
        .set_form([("exporter_format", "pdf")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_import_csv_upload() {
    let crm = Arc::new(RecordingCrm::default());
    let state = build_state(crm.clone(), &AppConfig::default());
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state))
            .configure(configure),
    )
    .await;

    let csv = encode_utf16("имя;фамилия;компания\nПётр;Иванов;ИП Иванов\n;;\n");
    let resp = test::call_service(&app, upload("contacts.csv", &csv).to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let summary: Value = test::read_body_json(resp).await;
    assert_eq!(summary["message_type"], "success");
    assert_eq!(summary["created"], 1);
    assert_eq!(
        crm.added.lock().unwrap().clone(),
        vec![json!({"NAME": "Пётр", "LAST_NAME": "Иванов", "COMPANY_ID": "7"})]
    );
}

#[actix_web::test]
async fn test_import_without_contacts_is_a_warning() {
    let state = build_state(Arc::new(RecordingCrm::default()), &AppConfig::default());
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state))
            .configure(configure),
    )
    .await;

    let csv = encode_utf16("имя,фамилия\n,\n");
    let resp = test::call_service(&app, upload("empty.csv", &csv).to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let summary: Value = test::read_body_json(resp).await;
    assert_eq!(summary["message_type"], "warning");
    assert_eq!(summary["total"], 0);
}

#[actix_web::test]
async fn test_import_unsupported_extension_is_bad_request() {
    let state = build_state(Arc::new(RecordingCrm::default()), &AppConfig::default());
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state))
            .configure(configure),
    )
    .await;

    let resp = test::call_service(&app, upload("contacts.pdf", b"%PDF-1.4").to_request()).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_formats_are_listed() {
    let state = build_state(Arc::new(RecordingCrm::default()), &AppConfig::default());
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/formats").to_request();
    let formats: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(
        formats,
        json!({"exporters": ["csv", "xlsx"], "importers": ["csv", "xlsx"]})
    );
}
