use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use health_unit::clinic::{clinic_router, ClinicService, ClinicStore, FixedClock, TokenIssuer};
use health_unit::config::BootstrapAdmin;
use serde_json::{json, Value};
use tower::ServiceExt;

fn service() -> Arc<ClinicService> {
    let now = NaiveDate::from_ymd_opt(2024, 1, 10)
        .and_then(|date| date.and_hms_opt(9, 0, 0))
        .expect("valid timestamp");
    let service = ClinicService::new(
        ClinicStore::in_memory(),
        Arc::new(TokenIssuer::new("workflow-secret", 8)),
        Arc::new(FixedClock(now)),
    );
    service
        .bootstrap_admin(&BootstrapAdmin {
            username: "admin".to_string(),
            password: "admin-senha".to_string(),
        })
        .expect("bootstrap admin");
    Arc::new(service)
}

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).expect("request builds"))
        .await
        .expect("router response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    (status, serde_json::from_slice(&bytes).expect("json payload"))
}

#[tokio::test]
async fn front_desk_day_end_to_end() {
    let router = clinic_router(service());

    let (status, body) = call(
        &router,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": "admin", "password": "admin-senha" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let admin = body["token"].as_str().expect("admin token").to_string();

    let (status, body) = call(
        &router,
        Method::POST,
        "/api/professionals",
        Some(&admin),
        Some(json!({
            "full_name": "Dra. Ana Ribeiro",
            "cpf": "987.654.321-00",
            "specialty": "Pediatria"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let professional_id = body["id"].as_u64().expect("professional id");

    let (status, _) = call(
        &router,
        Method::POST,
        "/api/users",
        Some(&admin),
        Some(json!({
            "username": "recepcao",
            "password": "recepcao-senha",
            "role": "receptionist"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = call(
        &router,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": "recepcao", "password": "recepcao-senha" })),
    )
    .await;
    let desk = body["token"].as_str().expect("desk token").to_string();

    let (status, body) = call(
        &router,
        Method::POST,
        "/api/patients",
        Some(&desk),
        Some(json!({ "full_name": "Maria Souza", "cpf": "529.982.247-25" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let patient_id = body["id"].as_u64().expect("patient id");

    let (status, _) = call(
        &router,
        Method::POST,
        "/api/appointments",
        Some(&desk),
        Some(json!({
            "patient_id": patient_id,
            "professional_id": professional_id,
            "scheduled_at": "2024-01-10T14:00:00",
            "status": "confirmed"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &router,
        Method::POST,
        "/api/waiting-queue",
        Some(&desk),
        Some(json!({
            "patient_id": patient_id,
            "professional_id": professional_id,
            "priority": "urgent",
            "notification_channel": "SMS"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let entry_id = body["id"].as_u64().expect("entry id");

    let (status, _) = call(
        &router,
        Method::PUT,
        &format!("/api/waiting-queue/{entry_id}"),
        Some(&desk),
        Some(json!({ "status": "notified" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(
        &router,
        Method::GET,
        "/api/dashboard/notifications",
        Some(&desk),
        None,
    )
    .await;
    assert_eq!(body["data"][0]["message"], "Paciente Maria Souza notificado via SMS");
    assert_eq!(body["data"][0]["elapsed"], "0 min atrás");

    let (status, body) = call(
        &router,
        Method::DELETE,
        &format!("/api/waiting-queue/{entry_id}"),
        Some(&desk),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Paciente atendido e removido da fila");

    let (_, body) = call(&router, Method::GET, "/api/dashboard/stats", Some(&desk), None).await;
    assert_eq!(body["data"]["active_patients"], 1);
    assert_eq!(body["data"]["appointments_today"], 1);
    assert_eq!(body["data"]["upcoming"][0]["professional_name"], "Dra. Ana Ribeiro");

    // Receptionists cannot manage health units.
    let (status, _) = call(
        &router,
        Method::POST,
        "/api/health-units",
        Some(&desk),
        Some(json!({ "name": "UBS Centro", "professional_ids": [professional_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = call(&router, Method::GET, "/api/logs", Some(&admin), None).await;
    let actions: Vec<&str> = body["data"]
        .as_array()
        .expect("log array")
        .iter()
        .filter_map(|entry| entry["action"].as_str())
        .collect();
    assert_eq!(actions, vec!["Login com Sucesso", "Login com Sucesso"]);
}
