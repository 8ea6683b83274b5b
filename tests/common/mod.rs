#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use jobboard_backend::{
    config::Config,
    database::MemoryStore,
    routes,
    services::{
        account_service::SuperuserRequest,
        mail_service::{MailError, Mailer},
        payment_gateway::{checkout_signature, GatewayError, Order, PaymentGateway},
        storage_service::MemoryBlobStore,
    },
    utils::time::ManualClock,
    AppState, Collaborators,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

pub const GATEWAY_SECRET: &str = "rzp_test_secret";
pub const PASSWORD: &str = "secret123";

#[derive(Default)]
pub struct Outbox(Mutex<Vec<(String, String)>>);

impl Outbox {
    pub fn last_body_for(&self, to: &str) -> Option<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(addr, _)| addr == to)
            .map(|(_, body)| body.clone())
    }
}

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, to: &str, _subject: &str, body: &str) -> Result<(), MailError> {
        self.0.lock().unwrap().push((to.to_string(), body.to_string()));
        Ok(())
    }
}

/// Opens orders locally and checks signatures with a fixed secret.
pub struct ScriptedGateway;

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<Order, GatewayError> {
        Ok(Order {
            id: format!("order_{}", &receipt[..8]),
            amount: amount_minor,
            currency: currency.to_string(),
        })
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        checkout_signature(GATEWAY_SECRET, order_id, payment_id).as_deref() == Some(signature)
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub outbox: Arc<Outbox>,
    pub clock: ManualClock,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub bytes: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> JsonValue {
        if self.bytes.is_empty() {
            return JsonValue::Null;
        }
        serde_json::from_slice(&self.bytes).unwrap()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(tweak: impl FnOnce(&mut Config)) -> Self {
        let mut config = Config {
            auth_rps: 1_000,
            ..Config::default()
        };
        tweak(&mut config);

        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let outbox = Arc::new(Outbox::default());
        let clock = ManualClock::default();
        let state = AppState::new(
            &config,
            Collaborators {
                store: store.clone(),
                mailer: outbox.clone(),
                gateway: Arc::new(ScriptedGateway),
                blobs: blobs.clone(),
                clock: Arc::new(clock.clone()),
            },
        );
        Self {
            router: routes::router(state.clone()),
            state,
            store,
            blobs,
            outbox,
            clock,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Reply {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), 16 * 1024 * 1024)
            .await
            .unwrap()
            .to_vec();
        Reply {
            status,
            headers,
            bytes,
        }
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let reply = self.send(req).await;
        (reply.status, reply.json())
    }

    pub async fn upload(&self, uri: &str, token: &str, file_name: &str, data: &[u8]) -> (StatusCode, JsonValue) {
        let boundary = "XBOUNDARYX";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let reply = self.send(req).await;
        (reply.status, reply.json())
    }

    /// `(uidb64, token)` from the last activation mail sent to `email`.
    pub fn activation_parts(&self, email: &str) -> (String, String) {
        let body = self.outbox.last_body_for(email).expect("activation mail");
        let path = body
            .split("/api/auth/activate/")
            .nth(1)
            .unwrap()
            .trim()
            .to_string();
        let (uid, token) = path.split_once('/').unwrap();
        (uid.to_string(), token.to_string())
    }

    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access"].as_str().unwrap().to_string()
    }

    /// Registers, activates and logs in; returns an access token.
    pub async fn signup(&self, email: &str, role: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": PASSWORD,
                    "role": role,
                    "phone_number": "9800000000",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        let (uid, token) = self.activation_parts(email);
        let (status, _) = self
            .call("GET", &format!("/api/auth/activate/{uid}/{token}"), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        self.login(email).await
    }

    pub async fn admin(&self) -> String {
        let email = "root@jobs.test";
        self.state
            .accounts
            .create_superuser(SuperuserRequest::new(email, PASSWORD, "9800000001"))
            .await
            .unwrap();
        self.login(email).await
    }

    /// Company account with a profile; returns `(token, profile id)`.
    pub async fn company(&self, email: &str, name: &str) -> (String, String) {
        let token = self.signup(email, "company").await;
        let (status, body) = self
            .call(
                "POST",
                "/api/profiles/company",
                Some(&token),
                Some(json!({
                    "company_name": name,
                    "industry": "Software",
                    "location": "Pune",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "company profile failed: {body}");
        (token, body["id"].as_str().unwrap().to_string())
    }

    /// Candidate account with a profile; returns `(token, profile id)`.
    pub async fn candidate(&self, email: &str, name: &str) -> (String, String) {
        let token = self.signup(email, "candidate").await;
        let (status, body) = self
            .call(
                "POST",
                "/api/profiles/candidate",
                Some(&token),
                Some(json!({ "name": name, "location": "Delhi" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "candidate profile failed: {body}");
        (token, body["id"].as_str().unwrap().to_string())
    }

    pub async fn post_job(&self, token: &str, title: &str, salary: i32) -> JsonValue {
        let (status, body) = self
            .call(
                "POST",
                "/api/jobs",
                Some(token),
                Some(json!({
                    "title": title,
                    "location": "Bengaluru",
                    "salary": salary,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "job post failed: {body}");
        body
    }
}
