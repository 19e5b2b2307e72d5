use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use apexhms_api::app::{self, services::AppServices};
use apexhms_auth::{JwtClaims, Role, TokenTtlPolicy};
use apexhms_core::{Email, PrincipalId, TenantId};
use apexhms_infra::AuthSettings;
use apexhms_infra::mailer::RecordingMailer;

const SECRET: &str = "black-box-secret-0123456789abcdef";
const ROOT_EMAIL: &str = "root@apexhms.test";
const ROOT_PASSWORD: &str = "RootPass123!";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    mailer: Arc<RecordingMailer>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let mailer = Arc::new(RecordingMailer::new());
        let settings = AuthSettings {
            jwt_secret: SECRET.to_string(),
            bcrypt_cost: 4,
            token_ttl: TokenTtlPolicy::default(),
            verification_ttl: Some(ChronoDuration::hours(48)),
            public_url: "http://hms.test".to_string(),
        };
        let services = Arc::new(AppServices::in_memory(settings, mailer.clone()).unwrap());
        services.accounts.seed_super_admin(ROOT_EMAIL, ROOT_PASSWORD).await.unwrap();

        // Same router as prod, bound to an ephemeral port.
        let router = app::build_app(services.clone(), services.validator());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            mailer,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.unwrap()).await
    }

    async fn send(&self, method: reqwest::Method, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut req = self.client.request(method, self.url(path)).json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.unwrap()).await
    }

    async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, token, body).await
    }

    async fn put(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.send(reqwest::Method::PUT, path, Some(token), json!({})).await
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post("/auth/login", None, json!({ "email": email, "password": password }))
            .await
    }

    async fn token_for(&self, email: &str, password: &str) -> String {
        let (status, body) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK, "login failed for {email}: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Token from the latest verification mail sent to `email`.
    fn verification_token(&self, email: &str) -> String {
        let to = Email::parse(email).unwrap();
        let mail = self
            .mailer
            .sent_to(&to)
            .into_iter()
            .rev()
            .find(|m| m.body.contains("token="))
            .expect("no verification mail");
        let start = mail.body.find("token=").unwrap() + "token=".len();
        mail.body[start..].split_whitespace().next().unwrap().to_string()
    }

    async fn verify(&self, token: &str) -> (StatusCode, Value) {
        self.get(&format!("/auth/verify-email?token={token}"), None).await
    }

    /// Registers, verifies and approves a hospital; returns its id and an
    /// admin token.
    async fn onboard_hospital(&self, email: &str, license: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/auth/hospital/register",
                None,
                json!({
                    "name": "General Hospital",
                    "hospital_type": "public",
                    "address": "1 Main St",
                    "phone": "555-0100",
                    "email": email,
                    "license_number": license,
                    "admin_name": "Dr. Admin",
                    "password": "AdminPass1!",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["hospital"]["status"], "pending");
        let hospital_id = body["hospital"]["id"].as_str().unwrap().to_string();

        let (status, _) = self.verify(&self.verification_token(email)).await;
        assert_eq!(status, StatusCode::OK);

        let root = self.token_for(ROOT_EMAIL, ROOT_PASSWORD).await;
        let (status, body) = self.put(&format!("/admin/hospitals/{hospital_id}/approve"), &root).await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let admin = self.token_for(email, "AdminPass1!").await;
        (hospital_id, admin)
    }

    /// Self-registers and verifies a patient; returns the patient record id
    /// and a patient token.
    async fn onboard_patient(&self, email: &str, hospital_id: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/auth/register",
                None,
                json!({
                    "email": email,
                    "password": "Secret123!",
                    "hospital_id": hospital_id,
                    "full_name": "Jane Doe",
                    "date_of_birth": "1990-04-02",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let patient_id = body["patient"]["id"].as_str().unwrap().to_string();

        let (status, _) = self.verify(&self.verification_token(email)).await;
        assert_eq!(status, StatusCode::OK);

        (patient_id, self.token_for(email, "Secret123!").await)
    }

    async fn provision(&self, admin: &str, hospital_id: &str, email: &str, role: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/hospitals/{hospital_id}/staff"),
                Some(admin),
                json!({ "email": email, "password": "StaffPass1!", "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["status"], "active");
        body["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read(res: reqwest::Response) -> (StatusCode, Value) {
    let status = res.status();
    let body = res.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

fn mint_jwt(secret: &str, role: Role, tenant_id: Option<TenantId>, iat_offset: ChronoDuration, ttl: ChronoDuration) -> String {
    let iat = Utc::now() + iat_offset;
    let claims = JwtClaims {
        sub: PrincipalId::new(),
        role,
        tenant_id,
        iat: iat.timestamp(),
        exp: (iat + ttl).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.get("/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication_required");

    let (status, body) = srv.get("/auth/me", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication_failed");
}

#[tokio::test]
async fn forged_and_expired_tokens_are_one_outcome() {
    let srv = TestServer::spawn().await;
    let tenant = Some(TenantId::new());

    let forged = mint_jwt(
        "some-other-secret-0123456789abcdef",
        Role::Doctor,
        tenant,
        ChronoDuration::zero(),
        ChronoDuration::minutes(10),
    );
    let expired = mint_jwt(SECRET, Role::Doctor, tenant, ChronoDuration::hours(-2), ChronoDuration::hours(1));

    let (forged_status, forged_body) = srv.get("/auth/me", Some(&forged)).await;
    let (expired_status, expired_body) = srv.get("/auth/me", Some(&expired)).await;

    assert_eq!(forged_status, StatusCode::UNAUTHORIZED);
    assert_eq!(expired_status, StatusCode::UNAUTHORIZED);
    assert_eq!(forged_body, expired_body);
}

#[tokio::test]
async fn minted_token_principal_drives_policies() {
    let srv = TestServer::spawn().await;
    let own = TenantId::new();
    let other = TenantId::new();

    let doctor = mint_jwt(SECRET, Role::Doctor, Some(own), ChronoDuration::zero(), ChronoDuration::minutes(10));
    let patient = mint_jwt(SECRET, Role::Patient, Some(own), ChronoDuration::zero(), ChronoDuration::minutes(10));

    // Role mismatch: patients cannot list patients.
    let (status, body) = srv.get(&format!("/patients/hospital/{own}"), Some(&patient)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");

    // Tenant mismatch on a path-named hospital.
    let (status, _) = srv.get(&format!("/patients/hospital/{other}"), Some(&doctor)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Matching tenant and role passes the policy; the hospital is simply empty.
    let (status, body) = srv.get(&format!("/patients/hospital/{own}"), Some(&doctor)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));

    // Platform routes are super-admin only.
    let (status, _) = srv.get("/admin/stats", Some(&doctor)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn patient_registration_and_single_use_verification() {
    let srv = TestServer::spawn().await;
    let (hospital_id, _) = srv.onboard_hospital("gh@h.com", "LIC-1").await;

    let (status, body) = srv
        .post(
            "/auth/register",
            None,
            json!({
                "email": "a@h.com",
                "password": "Secret123!",
                "hospital_id": hospital_id,
                "full_name": "Jane Doe",
                "date_of_birth": "1990-04-02",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["account"]["status"], "unverified");
    assert_eq!(body["patient"]["patient_number"], "P000001");

    // Unverified accounts cannot sign in, even with the right password.
    let (status, body) = srv.login("a@h.com", "Secret123!").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "account_not_verified");

    let token = srv.verification_token("a@h.com");
    let (status, body) = srv.verify(&token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account"]["status"], "active");
    assert_eq!(body["message"], "email verified");

    let (status, body) = srv.verify(&token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "token_invalid");

    let patient = srv.token_for("a@h.com", "Secret123!").await;
    let (status, body) = srv.get("/auth/me", Some(&patient)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account"]["status"], "active");
    assert_eq!(body["principal"]["role"], "patient");
    assert_eq!(body["principal"]["tenant_id"], hospital_id.as_str());

    // Verification mail plus exactly one welcome mail.
    let to = Email::parse("a@h.com").unwrap();
    assert_eq!(srv.mailer.sent_to(&to).len(), 2);
}

#[tokio::test]
async fn concurrent_verification_flips_once() {
    let srv = TestServer::spawn().await;
    let (hospital_id, _) = srv.onboard_hospital("gh@h.com", "LIC-1").await;
    srv.post(
        "/auth/register",
        None,
        json!({
            "email": "b@h.com",
            "password": "Secret123!",
            "hospital_id": hospital_id,
            "full_name": "John Roe",
            "date_of_birth": "1985-01-15",
        }),
    )
    .await;
    let token = srv.verification_token("b@h.com");

    let (first, second) = tokio::join!(srv.verify(&token), srv.verify(&token));
    let mut statuses = [first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST]);

    let to = Email::parse("b@h.com").unwrap();
    let welcomes = srv
        .mailer
        .sent_to(&to)
        .into_iter()
        .filter(|m| m.subject == "Your ApexHMS account is active")
        .count();
    assert_eq!(welcomes, 1);
}

#[tokio::test]
async fn pending_hospital_blocks_login_until_approved() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv
        .post(
            "/auth/hospital/register",
            None,
            json!({
                "name": "North Clinic",
                "hospital_type": "clinic",
                "address": "2 North Rd",
                "phone": "555-0101",
                "email": "north@h.com",
                "license_number": "LIC-N",
                "admin_name": "Dr. North",
                "password": "AdminPass1!",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let hospital_id = body["hospital"]["id"].as_str().unwrap().to_string();
    srv.verify(&srv.verification_token("north@h.com")).await;

    let (status, body) = srv.login("north@h.com", "AdminPass1!").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "tenant_pending");
    assert!(body.get("token").is_none());

    let root = srv.token_for(ROOT_EMAIL, ROOT_PASSWORD).await;
    let (status, body) = srv.get("/admin/hospitals?status=pending", Some(&root)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (status, body) = srv.put(&format!("/admin/hospitals/{hospital_id}/approve"), &root).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
    assert!(body["approved_at"].is_string());

    let (status, body) = srv.login("north@h.com", "AdminPass1!").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["principal"]["role"], "hospital_admin");

    // Approving twice is an invalid transition.
    let (status, _) = srv.put(&format!("/admin/hospitals/{hospital_id}/approve"), &root).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = srv.get("/admin/stats", Some(&root)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approved_hospitals"], 1);
    assert_eq!(body["pending_hospitals"], 0);
}

#[tokio::test]
async fn suspended_hospital_rejects_login_regardless_of_password() {
    let srv = TestServer::spawn().await;
    let (hospital_id, _) = srv.onboard_hospital("gh@h.com", "LIC-1").await;

    let root = srv.token_for(ROOT_EMAIL, ROOT_PASSWORD).await;
    let (status, _) = srv.put(&format!("/admin/hospitals/{hospital_id}/suspend"), &root).await;
    assert_eq!(status, StatusCode::OK);

    for password in ["AdminPass1!", "wrong-password"] {
        let (status, body) = srv.login("gh@h.com", password).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "tenant_suspended");
        assert!(body.get("token").is_none());
    }

    let (status, _) = srv.put(&format!("/admin/hospitals/{hospital_id}/reactivate"), &root).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = srv.login("gh@h.com", "AdminPass1!").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let srv = TestServer::spawn().await;
    srv.onboard_hospital("gh@h.com", "LIC-1").await;

    let (s1, b1) = srv.login("gh@h.com", "not-the-password").await;
    let (s2, b2) = srv.login("nobody@h.com", "not-the-password").await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(b1, b2);
}

#[tokio::test]
async fn cross_tenant_record_is_not_found() {
    let srv = TestServer::spawn().await;
    let (h1, admin1) = srv.onboard_hospital("one@h.com", "LIC-1").await;
    let (h2, admin2) = srv.onboard_hospital("two@h.com", "LIC-2").await;

    let (patient1, _) = srv.onboard_patient("p1@h.com", &h1).await;
    let (_, patient2_token) = srv.onboard_patient("p2@h.com", &h2).await;

    let (status, record) = srv
        .post(
            "/medical-records",
            Some(&admin1),
            json!({
                "patient_id": patient1,
                "diagnosis": "Seasonal influenza",
                "symptoms": "fever",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{record}");
    let record_id = record["id"].as_str().unwrap();

    let (status, body) = srv.get(&format!("/medical-records/{record_id}"), Some(&patient2_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert!(!body.to_string().contains("influenza"));
    assert!(body.get("diagnosis").is_none());

    // Staff of another hospital get the same answer for patients and records.
    let doctor2 = srv.provision(&admin2, &h2, "doc2@h.com", "doctor").await;
    assert!(!doctor2.is_empty());
    let doctor2 = srv.token_for("doc2@h.com", "StaffPass1!").await;
    let (status, _) = srv.get(&format!("/patients/{patient1}"), Some(&doctor2)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = srv.get(&format!("/medical-records/{record_id}"), Some(&doctor2)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patient_reads_only_own_records() {
    let srv = TestServer::spawn().await;
    let (h1, admin) = srv.onboard_hospital("one@h.com", "LIC-1").await;
    let (own_patient, own_token) = srv.onboard_patient("me@h.com", &h1).await;
    let (other_patient, _) = srv.onboard_patient("neighbour@h.com", &h1).await;

    let mut ids = Vec::new();
    for patient in [&own_patient, &other_patient] {
        let (status, record) = srv
            .post(
                "/medical-records",
                Some(&admin),
                json!({ "patient_id": patient, "diagnosis": "Checkup" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(record["id"].as_str().unwrap().to_string());
    }

    let (status, body) = srv.get(&format!("/medical-records/{}", ids[0]), Some(&own_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patient_id"], own_patient.as_str());

    let (status, _) = srv.get(&format!("/medical-records/{}", ids[1]), Some(&own_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = srv.get("/me/records", Some(&own_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    // Patients never reach staff listings.
    let (status, _) = srv.get(&format!("/medical-records/patient/{own_patient}"), Some(&own_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn hospital_admin_manages_only_own_hospital() {
    let srv = TestServer::spawn().await;
    let (h1, admin1) = srv.onboard_hospital("one@h.com", "LIC-1").await;
    let (h2, admin2) = srv.onboard_hospital("two@h.com", "LIC-2").await;

    let nurse = srv.provision(&admin1, &h1, "nurse@h.com", "nurse").await;

    // The path names another hospital: denied before any lookup.
    let (status, _) = srv.get(&format!("/hospitals/{h1}/staff"), Some(&admin2)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = srv.put(&format!("/hospitals/{h1}/staff/{nurse}/suspend"), &admin2).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Own path, foreign account id: not found.
    let (status, _) = srv.put(&format!("/hospitals/{h2}/staff/{nurse}/suspend"), &admin2).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = srv.put(&format!("/hospitals/{h1}/staff/{nurse}/suspend"), &admin1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "suspended");

    let (status, body) = srv.login("nurse@h.com", "StaffPass1!").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "account_suspended");

    let (status, _) = srv.put(&format!("/hospitals/{h1}/staff/{nurse}/activate"), &admin1).await;
    assert_eq!(status, StatusCode::OK);
    srv.token_for("nurse@h.com", "StaffPass1!").await;

    let (status, body) = srv.get(&format!("/hospitals/{h1}"), Some(&admin1)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["staff_count"], 2);
    assert_eq!(body["patient_count"], 0);

    let (status, body) = srv
        .send(
            reqwest::Method::PUT,
            &format!("/hospitals/{h1}"),
            Some(&admin1),
            json!({ "phone": "555-0199" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phone"], "555-0199");
}

#[tokio::test]
async fn appointments_reject_double_booking_and_notify_on_cancel() {
    let srv = TestServer::spawn().await;
    let (h1, admin) = srv.onboard_hospital("one@h.com", "LIC-1").await;
    let doctor_id = srv.provision(&admin, &h1, "doc@h.com", "doctor").await;
    let receptionist = {
        srv.provision(&admin, &h1, "desk@h.com", "receptionist").await;
        srv.token_for("desk@h.com", "StaffPass1!").await
    };
    let (patient_id, patient_token) = srv.onboard_patient("pat@h.com", &h1).await;

    let slot = json!({
        "patient_id": patient_id,
        "doctor_id": doctor_id,
        "scheduled_at": "2030-05-01T09:00:00Z",
        "reason": "follow-up",
    });
    let (status, appointment) = srv
        .post(&format!("/appointments/hospital/{h1}"), Some(&receptionist), slot.clone())
        .await;
    assert_eq!(status, StatusCode::CREATED, "{appointment}");
    assert_eq!(appointment["status"], "scheduled");

    let (status, body) = srv
        .post(&format!("/appointments/hospital/{h1}"), Some(&receptionist), slot)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = srv.get("/me/appointments", Some(&patient_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let id = appointment["id"].as_str().unwrap();
    let (status, body) = srv
        .send(reqwest::Method::DELETE, &format!("/appointments/{id}"), Some(&receptionist), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    // Cancelling again is a no-op and does not mail the patient twice.
    let (status, body) = srv
        .send(reqwest::Method::DELETE, &format!("/appointments/{id}"), Some(&receptionist), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let to = Email::parse("pat@h.com").unwrap();
    let notices = srv.mailer.sent_to(&to).into_iter().filter(|m| m.body.contains("CANCELLED")).count();
    assert_eq!(notices, 1);

    // A cancelled appointment cannot be reopened.
    let (status, _) = srv
        .send(
            reqwest::Method::PATCH,
            &format!("/appointments/{id}/status"),
            Some(&receptionist),
            json!({ "status": "completed" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_requests_and_unknown_routes_answer_in_json() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.post("/auth/login", None, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("email"));

    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.headers()["content-type"].to_str().unwrap().starts_with("application/json"));
    let (_, body) = read(res).await;
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv.get("/no-such-route", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert!(body["message"].as_str().unwrap().contains("/no-such-route"));
}

#[tokio::test]
async fn cors_admits_only_the_frontend_origin() {
    let srv = TestServer::spawn().await;

    let preflight = |origin: &'static str| {
        srv.client
            .request(reqwest::Method::OPTIONS, srv.url("/auth/login"))
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .send()
    };

    let res = preflight("http://hms.test").await.unwrap();
    assert!(res.status().is_success());
    assert_eq!(res.headers()["access-control-allow-origin"], "http://hms.test");
    assert_eq!(res.headers()["access-control-allow-credentials"], "true");

    let res = preflight("http://evil.test").await.unwrap();
    assert!(res.headers().get("access-control-allow-origin").is_none());

    let res = srv
        .client
        .get(srv.url("/health"))
        .header("origin", "http://hms.test")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["access-control-allow-origin"], "http://hms.test");
}

#[tokio::test]
async fn admin_hospital_list_carries_patient_and_staff_counts() {
    let srv = TestServer::spawn().await;
    let (h1, admin) = srv.onboard_hospital("one@h.com", "LIC-1").await;
    let (h2, _) = srv.onboard_hospital("two@h.com", "LIC-2").await;
    srv.provision(&admin, &h1, "doc@h.com", "doctor").await;
    srv.onboard_patient("pat@h.com", &h1).await;

    let root = srv.token_for(ROOT_EMAIL, ROOT_PASSWORD).await;
    let (status, body) = srv.get("/admin/hospitals", Some(&root)).await;
    assert_eq!(status, StatusCode::OK);

    let items = body["items"].as_array().unwrap();
    let find = |id: &str| items.iter().find(|h| h["id"] == id).unwrap().clone();

    let one = find(&h1);
    assert_eq!(one["patient_count"], 1);
    // administrator and doctor
    assert_eq!(one["staff_count"], 2);

    let two = find(&h2);
    assert_eq!(two["patient_count"], 0);
    assert_eq!(two["staff_count"], 1);
}
