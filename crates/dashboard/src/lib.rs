//! # RAV Dashboard
//!
//! Server-rendered HTML front end for the Risk Adjustment Viewer.
//!
//! Every request rebuilds a [`ViewState`] from its path and query string, recomputes the
//! list or aggregates from the immutable record store, and renders a full page. The only
//! mutable state is the session note book.

mod detail;
mod render;

use axum::{
    extract::{Form, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use rav_core::aggregate::{analyze, summarize};
use rav_core::{
    CoreConfig, DetailTab, Dialog, EducationCatalog, NoteBook, NoteKind, PatientId, RavError,
    RavResult, RecordStore, ViewEvent, ViewState,
};

use detail::{DetailContext, RejectedNote};

/// Application state shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    store: RecordStore,
    catalog: Arc<EducationCatalog>,
    notes: Arc<RwLock<NoteBook>>,
}

impl AppState {
    /// Build the state, seeding a note book for every patient in `store`.
    pub fn new(cfg: Arc<CoreConfig>, store: RecordStore, catalog: EducationCatalog) -> Self {
        let notes = NoteBook::seeded(store.ids());
        Self {
            cfg,
            store,
            catalog: Arc::new(catalog),
            notes: Arc::new(RwLock::new(notes)),
        }
    }
}

/// Build the dashboard router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_patients))
        .route("/analytics", get(analytics))
        .route("/patients/:id", get(patient_detail))
        .route("/patients/:id/notes", post(add_note))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    q: Option<String>,
    sort: Option<String>,
    filter: Option<String>,
    dialog: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DetailParams {
    tab: Option<String>,
    code: Option<String>,
    measure: Option<String>,
    dialog: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NoteForm {
    #[serde(default)]
    text: String,
    #[serde(default)]
    kind: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthRes {
    ok: bool,
    message: String,
    patients: usize,
}

fn with_dialog(view: ViewState, dialog: Option<Dialog>) -> ViewState {
    match dialog {
        Some(dialog) => view.apply(ViewEvent::OpenDialog(dialog)),
        None => view,
    }
}

fn not_found_response(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Html(render::not_found_page(message))).into_response()
}

fn internal_error(err: &RavError) -> Response {
    tracing::error!("request failed: {}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
}

/// Parse a patient id from the path and look it up.
///
/// Non-numeric ids are treated like unknown ids.
fn find_patient(state: &AppState, raw_id: &str) -> Option<PatientId> {
    let id = raw_id.parse::<PatientId>().ok()?;
    state.store.get(id).map(|r| r.id)
}

/// Patient list with search, sort and risk filter.
#[axum::debug_handler]
async fn list_patients(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Html<String> {
    let view = ViewState::list(
        params.q.as_deref(),
        params.sort.as_deref(),
        params.filter.as_deref(),
    );
    let view = with_dialog(view, Dialog::from_params(params.dialog.as_deref(), None, None));

    let records = state.store.records();
    Html(render::list_page(records, &summarize(records), &view))
}

#[axum::debug_handler]
async fn analytics(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Html<String> {
    let view = ViewState::default().apply(ViewEvent::ShowAnalytics);
    let view = with_dialog(view, Dialog::from_params(params.dialog.as_deref(), None, None));

    let analytics = analyze(state.store.records());
    Html(render::analytics_page(&analytics, &state.catalog, &view))
}

fn render_detail(
    state: &AppState,
    id: PatientId,
    view: &ViewState,
    rejected_note: Option<RejectedNote<'_>>,
) -> RavResult<String> {
    let record = state.store.get(id).ok_or(RavError::PatientNotFound(id))?;
    let book = state.notes.read().map_err(|_| RavError::LockPoisoned)?;
    let ctx = DetailContext {
        catalog: &state.catalog,
        notes: book.notes_for(id),
        rejected_note,
    };
    Ok(detail::detail_page(record, view, &ctx))
}

/// Patient detail screen.
///
/// # Errors
/// Returns `404 Not Found` for unknown or malformed patient ids.
#[axum::debug_handler]
async fn patient_detail(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(params): Query<DetailParams>,
) -> Response {
    let Some(id) = find_patient(&state, &raw_id) else {
        return not_found_response(&format!("No patient with id {raw_id}."));
    };

    let tab = params
        .tab
        .as_deref()
        .map(DetailTab::from_param)
        .unwrap_or_default();
    let dialog = Dialog::from_params(
        params.dialog.as_deref(),
        params.code.as_deref(),
        params.measure.as_deref(),
    );
    let view = with_dialog(ViewState::detail(id, tab), dialog);

    match render_detail(&state, id, &view, None) {
        Ok(html) => Html(html).into_response(),
        Err(err) => internal_error(&err),
    }
}

/// Append a session note and return to the notes tab.
///
/// # Errors
/// - `400 Bad Request` with the note dialog reopened if the text is blank or too long.
/// - `404 Not Found` for unknown patients.
#[axum::debug_handler]
async fn add_note(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Form(form): Form<NoteForm>,
) -> Response {
    let Some(id) = find_patient(&state, &raw_id) else {
        return not_found_response(&format!("No patient with id {raw_id}."));
    };
    let kind = form
        .kind
        .as_deref()
        .and_then(NoteKind::from_param)
        .unwrap_or_default();
    let now = chrono::Local::now().naive_local();

    let added = match state.notes.write() {
        Ok(mut book) => book
            .add(id, state.cfg.note_author(), &form.text, kind, now)
            .map(|_| ()),
        Err(_) => Err(RavError::LockPoisoned),
    };

    match added {
        Ok(()) => Redirect::to(&format!("/patients/{id}?tab=notes")).into_response(),
        Err(RavError::InvalidInput(message)) => {
            tracing::warn!("rejected note for patient {}: {}", id, message);
            let view = ViewState::detail(id, DetailTab::Notes)
                .apply(ViewEvent::OpenDialog(Dialog::NoteEntry));
            let rejected = RejectedNote {
                error: &message,
                text: &form.text,
                kind,
            };
            match render_detail(&state, id, &view, Some(rejected)) {
                Ok(html) => (StatusCode::BAD_REQUEST, Html(html)).into_response(),
                Err(err) => internal_error(&err),
            }
        }
        Err(RavError::PatientNotFound(_)) => {
            not_found_response(&format!("No patient with id {raw_id}."))
        }
        Err(err) => internal_error(&err),
    }
}

/// Liveness probe.
#[axum::debug_handler]
async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "RAV dashboard is alive".into(),
        patients: state.store.len(),
    })
}

async fn not_found() -> Response {
    not_found_response("The page you requested does not exist.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use rav_core::EmbeddedRecords;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let store = RecordStore::load(&EmbeddedRecords).unwrap();
        let catalog = EducationCatalog::embedded().unwrap();
        AppState::new(Arc::new(CoreConfig::default()), store, catalog)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn note_request(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8_lossy(&body).into_owned()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = router(test_state());
        let resp = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["patients"], 10);
    }

    #[tokio::test]
    async fn list_page_shows_summary_and_every_patient() {
        let app = router(test_state());
        let resp = app.oneshot(get_request("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("Cache-Control").unwrap(), "no-store");

        let html = body_text(resp).await;
        assert!(html.contains("Showing 10 of 10 patients"));
        assert!(html.contains("Sarah Johnson"));
        assert!(html.contains("2.57"));
    }

    #[tokio::test]
    async fn list_search_matches_insurance_id_case_insensitively() {
        let app = router(test_state());
        let resp = app
            .oneshot(get_request("/?q=med-789456123"))
            .await
            .unwrap();
        let html = body_text(resp).await;
        assert!(html.contains("Showing 1 of 10 patients"));
        assert!(html.contains("Sarah Johnson"));
    }

    #[tokio::test]
    async fn list_with_no_matches_renders_no_results_row() {
        let app = router(test_state());
        let resp = app.oneshot(get_request("/?q=nobody")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("No patients match the current search and filter."));
    }

    #[tokio::test]
    async fn list_escapes_search_term() {
        let app = router(test_state());
        let resp = app
            .oneshot(get_request("/?q=%3Cscript%3E"))
            .await
            .unwrap();
        let html = body_text(resp).await;
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn detail_page_renders_overview() {
        let app = router(test_state());
        let resp = app.oneshot(get_request("/patients/1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("Sarah Johnson"));
        assert!(html.contains("Risk Score Breakdown"));
    }

    #[tokio::test]
    async fn unknown_patient_is_not_found() {
        let app = router(test_state());
        for uri in ["/patients/999", "/patients/abc"] {
            let resp = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "uri {uri}");
        }
    }

    #[tokio::test]
    async fn hedis_tab_without_quality_data_says_so() {
        let app = router(test_state());
        let resp = app
            .oneshot(get_request("/patients/5?tab=hedis"))
            .await
            .unwrap();
        let html = body_text(resp).await;
        assert!(html.contains("No HEDIS data available"));
    }

    #[tokio::test]
    async fn code_dialog_shows_education_or_unknown_fallback() {
        let app = router(test_state());
        let known = app
            .clone()
            .oneshot(get_request("/patients/1?dialog=code&code=E11.9"))
            .await
            .unwrap();
        let html = body_text(known).await;
        assert!(html.contains("Type 2 Diabetes Mellitus without Complications"));

        let unknown = app
            .oneshot(get_request("/patients/1?dialog=code&code=Z99.89"))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::OK);
        let html = body_text(unknown).await;
        assert!(html.contains("Unknown Code"));
    }

    #[tokio::test]
    async fn measure_dialog_uses_unknown_measure_title() {
        let app = router(test_state());
        let resp = app
            .oneshot(get_request("/patients/1?tab=hedis&dialog=measure&measure=XYZ"))
            .await
            .unwrap();
        let html = body_text(resp).await;
        assert!(html.contains("Unknown Measure"));
    }

    #[tokio::test]
    async fn posting_a_note_redirects_and_prepends() {
        let state = test_state();
        let app = router(state.clone());

        let resp = app
            .clone()
            .oneshot(note_request(
                "/patients/2/notes",
                "text=Called+patient+about+eye+exam&kind=care-coordination",
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/patients/2?tab=notes"
        );

        {
            let book = state.notes.read().unwrap();
            let notes = book.notes_for(PatientId::new(2));
            assert_eq!(notes.len(), 3);
            assert_eq!(notes[0].text.as_str(), "Called patient about eye exam");
            assert_eq!(notes[0].author, "Current User");
            assert_eq!(notes[0].kind, NoteKind::CareCoordination);
            assert_eq!(book.notes_for(PatientId::new(1)).len(), 2);
        }

        let resp = app
            .oneshot(get_request("/patients/2?tab=notes"))
            .await
            .unwrap();
        let html = body_text(resp).await;
        assert!(html.contains("Called patient about eye exam"));
    }

    #[tokio::test]
    async fn blank_note_is_rejected_with_bad_request() {
        let state = test_state();
        let app = router(state.clone());
        let resp = app
            .oneshot(note_request("/patients/1/notes", "text=+++"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let html = body_text(resp).await;
        assert!(html.contains("text cannot be empty"));

        let book = state.notes.read().unwrap();
        assert_eq!(book.notes_for(PatientId::new(1)).len(), 2);
    }

    #[tokio::test]
    async fn over_long_note_keeps_the_draft_in_the_dialog() {
        let state = test_state();
        let app = router(state.clone());
        let filler = "a".repeat(rav_core::constants::MAX_NOTE_CHARS);
        let body = format!("kind=documentation&text={filler}%3Cb%3E");
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/patients/1/notes")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let html = body_text(resp).await;
        assert!(html.contains(&format!("{filler}&lt;b&gt;</textarea>")));
        assert!(html.contains(r#"<option value="Documentation" selected>"#));

        let book = state.notes.read().unwrap();
        assert_eq!(book.notes_for(PatientId::new(1)).len(), 2);
    }

    #[tokio::test]
    async fn note_for_unknown_patient_is_not_found() {
        let app = router(test_state());
        let resp = app
            .oneshot(note_request("/patients/42/notes", "text=hello"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn analytics_page_shows_distribution_and_compliance() {
        let app = router(test_state());
        let resp = app.oneshot(get_request("/analytics")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("Risk Distribution"));
        assert!(html.contains("77.9"));
        assert!(html.contains("Comprehensive Diabetes Care - Eye Exam"));
    }

    #[tokio::test]
    async fn footer_notice_opens_as_dialog() {
        let app = router(test_state());
        let resp = app.oneshot(get_request("/?dialog=hipaa")).await.unwrap();
        let html = body_text(resp).await;
        assert!(html.contains("role=\"dialog\""));
        assert!(html.contains("HIPAA Notice"));
    }

    #[tokio::test]
    async fn unknown_sort_stays_selected_as_input_order() {
        let app = router(test_state());
        let resp = app.oneshot(get_request("/?sort=shoeSize")).await.unwrap();
        let html = body_text(resp).await;
        assert!(html.contains(r#"<option value="none" selected>Input order</option>"#));
        assert!(!html.contains(r#"<option value="name" selected>"#));

        let app = router(test_state());
        let resp = app.oneshot(get_request("/")).await.unwrap();
        let html = body_text(resp).await;
        assert!(html.contains(r#"<option value="name" selected>"#));
        assert!(html.contains(r#"<option value="none">Input order</option>"#));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = router(test_state());
        let resp = app.oneshot(get_request("/billing")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
