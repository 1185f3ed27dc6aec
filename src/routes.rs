use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use axum_extra::{
    extract::Query as MultiQuery,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::catalog::{Catalog, CourseFilter};
use crate::enquiry::{Enquiry, EnquiryForm, ENQUIRIES_TABLE};
use crate::filter::{apply_filters, FilterSelection};
use crate::models::{Course, CourseId, Trainer, TrainerId};
use crate::rows::{COURSES_TABLE, TRAINERS_TABLE};
use crate::service::{DataService, ServiceError};

type ApiResult<T> = Result<T, (StatusCode, String)>;
type AdminBearer = Option<TypedHeader<Authorization<Bearer>>>;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(catalog: Catalog, admin_token: Option<String>) -> Self {
        Self { catalog, admin_token: admin_token.map(Arc::from) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // catalog reads
        .route("/api/courses", get(list_courses))
        .route("/api/courses/:id", get(get_course))
        .route("/api/trainers", get(list_trainers))
        .route("/api/trainers/:id", get(get_trainer))
        // faceted views
        .route("/api/catalog/courses", get(filter_courses))
        .route("/api/catalog/trainers", get(filter_trainers))
        // lead capture
        .route("/api/enquiries", post(create_enquiry))
        // admin writes
        .route("/api/admin/:collection", post(admin_create))
        .route("/api/admin/:collection/:id", patch(admin_update).delete(admin_delete))
        .with_state(state)
}

async fn list_courses(State(state): State<AppState>, Query(filter): Query<CourseFilter>) -> Json<Vec<Course>> {
    Json(state.catalog.fetch_courses(&filter).await)
}

async fn get_course(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Course>> {
    state
        .catalog
        .fetch_course_by_id(CourseId(id))
        .await
        .map(Json)
        .ok_or_else(|| e404("course not found"))
}

async fn list_trainers(State(state): State<AppState>) -> Json<Vec<Trainer>> {
    Json(state.catalog.fetch_trainers().await)
}

async fn get_trainer(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Trainer>> {
    state
        .catalog
        .fetch_trainer_by_id(TrainerId(id))
        .await
        .map(Json)
        .ok_or_else(|| e404("trainer not found"))
}

async fn filter_courses(
    State(state): State<AppState>,
    MultiQuery(selection): MultiQuery<FilterSelection>,
) -> Json<Vec<Course>> {
    let courses = state.catalog.fetch_courses(&CourseFilter::default()).await;
    Json(apply_filters(&courses, &selection))
}

async fn filter_trainers(
    State(state): State<AppState>,
    MultiQuery(selection): MultiQuery<FilterSelection>,
) -> Json<Vec<Trainer>> {
    let trainers = state.catalog.fetch_trainers().await;
    Json(apply_filters(&trainers, &selection))
}

async fn create_enquiry(
    State(state): State<AppState>,
    Json(form): Json<EnquiryForm>,
) -> ApiResult<(StatusCode, Json<Enquiry>)> {
    let enquiry = form.validate().map_err(|e| e400(e.to_string()))?;
    let row = serde_json::to_value(&enquiry).map_err(e500)?;
    state
        .catalog
        .service()
        .insert(ENQUIRIES_TABLE, row)
        .await
        .map_err(service_error)?;
    tracing::info!(enquiry_id = %enquiry.id, course = ?enquiry.course, "enquiry captured");
    Ok((StatusCode::CREATED, Json(enquiry)))
}

// --- admin ---

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum Collection {
    Courses,
    Trainers,
}

impl Collection {
    fn table(self) -> &'static str {
        match self {
            Collection::Courses => COURSES_TABLE,
            Collection::Trainers => TRAINERS_TABLE,
        }
    }
}

fn authorize(state: &AppState, bearer: AdminBearer) -> ApiResult<()> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err((StatusCode::FORBIDDEN, "admin access is disabled".into()));
    };
    match bearer {
        Some(TypedHeader(auth)) if auth.token() == expected => Ok(()),
        _ => Err((StatusCode::UNAUTHORIZED, "invalid admin token".into())),
    }
}

async fn admin_create(
    State(state): State<AppState>,
    Path(collection): Path<Collection>,
    bearer: AdminBearer,
    Json(row): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    authorize(&state, bearer)?;
    let stored = state
        .catalog
        .service()
        .insert(collection.table(), row)
        .await
        .map_err(service_error)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn admin_update(
    State(state): State<AppState>,
    Path((collection, id)): Path<(Collection, i64)>,
    bearer: AdminBearer,
    Json(changes): Json<Value>,
) -> ApiResult<Json<Value>> {
    authorize(&state, bearer)?;
    let stored = state
        .catalog
        .service()
        .update(collection.table(), &id.to_string(), changes)
        .await
        .map_err(service_error)?;
    Ok(Json(stored))
}

async fn admin_delete(
    State(state): State<AppState>,
    Path((collection, id)): Path<(Collection, i64)>,
    bearer: AdminBearer,
) -> ApiResult<StatusCode> {
    authorize(&state, bearer)?;
    state
        .catalog
        .service()
        .delete(collection.table(), &id.to_string())
        .await
        .map_err(service_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- helpers ---
fn e400<T: Into<String>>(msg: T) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, msg.into())
}

fn e404<T: Into<String>>(msg: T) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, msg.into())
}

fn e500<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    tracing::error!(error=%e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Writes have no fallback, so data service failures reach the client.
fn service_error(e: ServiceError) -> (StatusCode, String) {
    match e {
        ServiceError::NoRows => e404("record not found"),
        ServiceError::NotAnObject | ServiceError::InvalidIdentifier(_) => e400(e.to_string()),
        other => {
            tracing::error!(error=%other, "data service write failed");
            (StatusCode::BAD_GATEWAY, other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FallbackDataset;
    use crate::service::testing::FakeService;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::json;
    use tower::ServiceExt;

    fn app_with(service: Arc<FakeService>, admin_token: Option<&str>) -> Router {
        let service: Arc<dyn DataService> = service;
        let catalog = Catalog::new(service, Arc::new(FallbackDataset::builtin().unwrap()));
        router(AppState::new(catalog, admin_token.map(str::to_string)))
    }

    fn app() -> Router {
        app_with(Arc::new(FakeService::failing()), None)
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::String(String::from_utf8_lossy(&bytes).into()));
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn ids(body: &Value) -> Vec<i64> {
        body.as_array().unwrap().iter().map(|c| c["id"].as_i64().unwrap()).collect()
    }

    #[tokio::test]
    async fn courses_fall_back_when_service_is_down() {
        let (status, body) = send(app(), get("/api/courses")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), [1, 2, 3, 4, 5, 6]);
        assert_eq!(body[0]["course_skills"], Value::Null);
        assert!(body[0]["skills"].is_array());
    }

    #[tokio::test]
    async fn courses_by_category() {
        let (_, body) = send(app(), get("/api/courses?category=Content%20Creation")).await;
        assert_eq!(ids(&body), [1]);

        let (status, _) = send(app(), get("/api/courses?category=Cooking")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn course_lookup() {
        let (status, body) = send(app(), get("/api/courses/4")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Full Stack Web Development");

        let (status, _) = send(app(), get("/api/courses/404")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(app(), get("/api/courses/abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn trainer_contact_is_always_complete() {
        let (status, body) = send(app(), get("/api/trainers/3")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["contact"], json!({"email": "", "phone": "", "website": "", "linkedin": ""}));

        let (_, body) = send(app(), get("/api/trainers")).await;
        assert_eq!(ids(&body), [1, 2, 3]);
    }

    #[tokio::test]
    async fn faceted_course_view() {
        let (_, body) = send(app(), get("/api/catalog/courses?category=Technology&skill=Beginner")).await;
        assert_eq!(ids(&body), [4]);

        let (_, body) = send(app(), get("/api/catalog/courses?category=Technology&category=Marketing")).await;
        assert_eq!(ids(&body), [2, 3, 4, 5]);

        let (_, body) = send(app(), get("/api/catalog/courses?price=Free")).await;
        assert_eq!(ids(&body), [2]);
    }

    #[tokio::test]
    async fn faceted_trainer_view() {
        let (_, body) = send(app(), get("/api/catalog/trainers?price=Paid")).await;
        assert_eq!(ids(&body), [1, 3]);
        let (_, body) = send(app(), get("/api/catalog/trainers?category=Counselling")).await;
        assert_eq!(ids(&body), [3]);
    }

    #[tokio::test]
    async fn enquiry_is_validated_and_stored() {
        let service = Arc::new(FakeService::new());
        let form = json!({"name": "Neha", "email": "neha@example.in", "phone": "9876543210", "course": "SEO"});
        let (status, body) = send(
            app_with(service.clone(), None),
            json_request("POST", "/api/enquiries", form, None),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "Neha");

        let writes = service.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "insert");
        assert_eq!(writes[0].1, "enquiries");
        assert_eq!(writes[0].2["email"], "neha@example.in");
    }

    #[tokio::test]
    async fn enquiry_errors() {
        let bad = json!({"name": "Neha", "email": "nope", "phone": "9876543210"});
        let (status, body) = send(app(), json_request("POST", "/api/enquiries", bad, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "email address is invalid");

        // valid form, but writes have no fallback
        let good = json!({"name": "Neha", "email": "neha@example.in", "phone": "9876543210"});
        let (status, _) = send(app(), json_request("POST", "/api/enquiries", good, None)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn admin_requires_configured_token() {
        let row = json!({"title": "New"});
        let (status, _) = send(app(), json_request("POST", "/api/admin/courses", row.clone(), Some("x"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let secured = || app_with(Arc::new(FakeService::new()), Some("s3cret"));
        let (status, _) = send(secured(), json_request("POST", "/api/admin/courses", row.clone(), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(secured(), json_request("POST", "/api/admin/courses", row, Some("wrong"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_writes_pass_through() {
        let service = Arc::new(FakeService::new());
        let app = || app_with(service.clone(), Some("s3cret"));

        let (status, body) = send(
            app(),
            json_request("POST", "/api/admin/trainers", json!({"name": "New Trainer"}), Some("s3cret")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "New Trainer");

        let (status, _) = send(
            app(),
            json_request("PATCH", "/api/admin/courses/5", json!({"price": "₹0"}), Some("s3cret")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            app(),
            json_request("PATCH", "/api/admin/courses/404", json!({"price": "₹0"}), Some("s3cret")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let req = Request::delete("/api/admin/courses/5")
            .header(header::AUTHORIZATION, "Bearer s3cret")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app(), req).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let ops: Vec<(String, String)> =
            service.writes.lock().unwrap().iter().map(|(op, table, _)| (op.clone(), table.clone())).collect();
        assert_eq!(
            ops,
            [
                ("insert".to_string(), "trainers".to_string()),
                ("update".to_string(), "courses".to_string()),
                ("delete".to_string(), "courses".to_string()),
            ]
        );

        let (status, _) = send(
            app(),
            json_request("POST", "/api/admin/enquiries", json!({"name": "x"}), Some("s3cret")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
