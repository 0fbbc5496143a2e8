use wedding_booking::{
    api::router::create_router,
    state::AppState,
    config::Config,
    domain::models::booking::{Booking, NewBookingParams},
    domain::models::package::Package,
    domain::models::user::{SessionUser, User, UserRole},
    domain::services::availability::OverlapPolicy,
    infra::factory::bootstrap_state,
};
use std::sync::Arc;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, header},
    response::Response,
    Router,
};
use chrono::{Days, NaiveDate};
use tower::ServiceExt;
use serde_json::Value;

pub const BOUNDARY: &str = "wedding-booking-test-boundary";

pub struct AuthHeaders {
    pub access_token: String,
    pub csrf_token: String,
}

#[allow(dead_code)]
impl AuthHeaders {
    pub fn session_user(&self, id: &str, role: UserRole) -> SessionUser {
        SessionUser {
            id: id.to_string(),
            role,
            access_token: self.access_token.clone(),
            csrf_token: self.csrf_token.clone(),
        }
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub db_filename: String,
    pub receipt_dir: String,
    pub state: Arc<AppState>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);
        let receipt_dir = std::env::temp_dir()
            .join(format!("receipts-{}", Uuid::new_v4()))
            .to_string_lossy()
            .to_string();

        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url,
            port: 0,
            jwt_secret_key: priv_key_pem.to_string(),
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: "test-issuer".to_string(),
            receipt_dir: receipt_dir.clone(),
            calendar_timezone: chrono_tz::Asia::Manila,
            overlap_policy: OverlapPolicy::CapacityFirst,
            api_base_url: "http://localhost".to_string(),
            pending_booking_dir: None,
            pending_booking_ttl_secs: 300,
        };

        let state = Arc::new(bootstrap_state(&config).await);
        let router = create_router(state.clone());

        Self {
            router,
            db_filename,
            receipt_dir,
            state,
        }
    }

    /// Serves the router on an ephemeral local port and returns its base URL.
    pub async fn spawn_server(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    pub fn login_as(&self, user_id: &str, role: UserRole) -> AuthHeaders {
        let user = User { id: user_id.to_string(), role };
        let issued = self.state.auth_service.issue_access_token(&user).unwrap();
        AuthHeaders {
            access_token: issued.access_token,
            csrf_token: issued.csrf_token,
        }
    }

    pub fn login_expired(&self, user_id: &str, role: UserRole) -> AuthHeaders {
        let user = User { id: user_id.to_string(), role };
        let issued = self.state.auth_service
            .issue_with_ttl(&user, chrono::Duration::hours(-2))
            .unwrap();
        AuthHeaders {
            access_token: issued.access_token,
            csrf_token: issued.csrf_token,
        }
    }

    pub async fn create_package(&self, planner_id: &str, slots: i32, preparation_days: i32) -> Package {
        let package = Package::new(planner_id.to_string(), "Garden Wedding".to_string(), slots, preparation_days, 150000.0);
        self.state.package_repo.create(&package).await.unwrap()
    }

    pub async fn insert_booking(&self, package_id: i64, date: NaiveDate, status: &str) -> Booking {
        let mut booking = Booking::new(NewBookingParams {
            package_id,
            client_id: "seed-client".to_string(),
            wedding_date: date,
            wedding_time: None,
            venue: "Seed Venue".to_string(),
            special_requests: None,
            payment_method: "gcash".to_string(),
            payment_amount: 1000.0,
            receipt_ref: "seed.png".to_string(),
            marketing_opt_in: false,
        });
        booking.status = status.to_string();
        self.state.booking_repo.create(&booking).await.unwrap()
    }

    pub fn today(&self) -> NaiveDate {
        self.state.today()
    }

    pub fn days_from_today(&self, days: u64) -> NaiveDate {
        self.today().checked_add_days(Days::new(days)).unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.router.clone().oneshot(
            Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
        ).await.unwrap()
    }

    pub async fn get_authed(&self, uri: &str, auth: &AuthHeaders) -> Response {
        self.router.clone().oneshot(
            Request::builder().method("GET").uri(uri)
                .header(header::COOKIE, format!("access_token={}", auth.access_token))
                .body(Body::empty()).unwrap()
        ).await.unwrap()
    }

    pub async fn send_json(&self, method: &str, uri: &str, auth: Option<&AuthHeaders>, body: Value) -> Response {
        let mut builder = Request::builder().method(method).uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder
                .header(header::COOKIE, format!("access_token={}", auth.access_token))
                .header("X-CSRF-Token", &auth.csrf_token);
        }
        self.router.clone().oneshot(builder.body(Body::from(body.to_string())).unwrap()).await.unwrap()
    }

    pub async fn post_booking(&self, package_id: i64, auth: Option<&AuthHeaders>, body: Vec<u8>) -> Response {
        let mut builder = Request::builder().method("POST")
            .uri(format!("/api/v1/packages/{}/bookings", package_id))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY));
        if let Some(auth) = auth {
            builder = builder
                .header(header::COOKIE, format!("access_token={}", auth.access_token))
                .header("X-CSRF-Token", &auth.csrf_token);
        }
        self.router.clone().oneshot(builder.body(Body::from(body)).unwrap()).await.unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
        let _ = std::fs::remove_dir_all(&self.receipt_dir);
    }
}

#[allow(dead_code)]
pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Hand-rolled `multipart/form-data` body using [`BOUNDARY`].
#[allow(dead_code)]
pub fn multipart_body(fields: &[(&str, String)], receipt: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", BOUNDARY, name, value).as_bytes()
        );
    }
    if let Some((file_name, content_type, bytes)) = receipt {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"receipt\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file_name, content_type
            ).as_bytes()
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// A complete, valid booking for `date`.
#[allow(dead_code)]
pub fn booking_fields(date: NaiveDate) -> Vec<(&'static str, String)> {
    vec![
        ("wedding_date", date.format("%Y-%m-%d").to_string()),
        ("wedding_time", "15:30".to_string()),
        ("venue", "Garden Hall".to_string()),
        ("special_requests", "".to_string()),
        ("payment_method", "gcash".to_string()),
        ("payment_amount", "50000".to_string()),
        ("accept_terms", "true".to_string()),
        ("accept_privacy", "true".to_string()),
        ("marketing_opt_in", "false".to_string()),
    ]
}
