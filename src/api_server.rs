// Axum API server: parcel NDVI analysis, auth passthrough, maps and reports
//
// Collaborator calls are blocking and run on the blocking pool; everything
// else (scoring, templating) is cheap and runs inline.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use askama::Template;
use chrono::NaiveDate;
use moka::future::Cache;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::acquisition::{resolve_fetch, FallbackPolicy, SeriesOutcome};
use crate::config::Config;
use crate::parcel::ParcelGeometry;
use crate::report::{MapTemplate, ReportTemplate};
use crate::scorer::{assess_outcome, score_and_label, HealthAssessment};
use crate::series::{round_to, NdviSample};
use crate::services::{
    AuthProvider, Credentials, DisabledAuth, GoTrueAuth, HttpNdviProvider, HttpPdfRenderer,
    ImageryError, InMemoryParcelStore, NdviProvider, NdviQuery, ParcelInsight, ParcelRecord,
    ParcelStore, PdfRenderer, RestParcelStore, TileStyle, UnavailableProvider,
};

const SERIES_CACHE_TTL: Duration = Duration::from_secs(300);
const MAP_CACHE_TTL: Duration = Duration::from_secs(3600);

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub ndvi_provider: Arc<dyn NdviProvider>,
    pub parcel_store: Arc<dyn ParcelStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub pdf_renderer: Option<Arc<dyn PdfRenderer>>,
    /// Observed series per geometry + window
    pub series_cache: Cache<String, Vec<NdviSample>>,
    /// Generated map pages by id
    pub map_cache: Cache<String, MapTemplate>,
    pub ndvi_start: NaiveDate,
    pub fallback_policy: FallbackPolicy,
    rng: Arc<Mutex<StdRng>>,
}

impl AppState {
    /// Wire collaborators from configuration, falling back to local stand-ins
    pub fn from_config(config: &Config) -> Self {
        let ndvi_provider: Arc<dyn NdviProvider> = match &config.imagery {
            Some(imagery) => {
                tracing::info!(url = %imagery.url, collection = %imagery.collection, "Using NDVI service");
                Arc::new(HttpNdviProvider::new(
                    &imagery.url,
                    imagery.token.clone(),
                    &imagery.collection,
                ))
            }
            None => {
                tracing::warn!("IMAGERY_URL not set, NDVI series will be simulated");
                Arc::new(UnavailableProvider::new("IMAGERY_URL not set"))
            }
        };

        let (parcel_store, auth): (Arc<dyn ParcelStore>, Arc<dyn AuthProvider>) = match &config.supabase {
            Some(supabase) => {
                tracing::info!(url = %supabase.url, "Using hosted database and auth");
                (
                    Arc::new(RestParcelStore::new(&supabase.url, &supabase.key)),
                    Arc::new(GoTrueAuth::new(&supabase.url, &supabase.key)),
                )
            }
            None => {
                tracing::warn!("SUPABASE_URL/SUPABASE_KEY not set, parcels kept in memory and auth disabled");
                (Arc::new(InMemoryParcelStore::new()), Arc::new(DisabledAuth))
            }
        };

        let pdf_renderer = config.pdf_renderer_url.as_deref().map(|url| {
            tracing::info!(%url, "Using PDF renderer");
            Arc::new(HttpPdfRenderer::new(url)) as Arc<dyn PdfRenderer>
        });

        Self::with_services(ndvi_provider, parcel_store, auth, pdf_renderer)
            .with_ndvi_start(config.ndvi_start)
            .with_fallback_seed(config.fallback_seed)
            .with_fallback_policy(config.fallback_policy)
    }

    pub fn with_services(
        ndvi_provider: Arc<dyn NdviProvider>,
        parcel_store: Arc<dyn ParcelStore>,
        auth: Arc<dyn AuthProvider>,
        pdf_renderer: Option<Arc<dyn PdfRenderer>>,
    ) -> Self {
        let series_cache = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(SERIES_CACHE_TTL) // 5 min TTL
            .build();

        let map_cache = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(MAP_CACHE_TTL)
            .build();

        Self {
            ndvi_provider,
            parcel_store,
            auth,
            pdf_renderer,
            series_cache,
            map_cache,
            ndvi_start: Config::default().ndvi_start,
            fallback_policy: FallbackPolicy::default(),
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
        }
    }

    pub fn with_ndvi_start(mut self, start: NaiveDate) -> Self {
        self.ndvi_start = start;
        self
    }

    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }

    /// Seed the synthesizer RNG; `None` keeps entropy seeding
    pub fn with_fallback_seed(mut self, seed: Option<u64>) -> Self {
        if let Some(seed) = seed {
            self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        }
        self
    }

    fn query_for(&self, parcel: &ParcelGeometry, today: NaiveDate) -> NdviQuery {
        NdviQuery {
            geometry: parcel.geojson.clone(),
            start: self.ndvi_start,
            end: today,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Accounts
        .route("/api/signup", post(signup))
        .route("/api/login", post(login))

        // Parcel analysis
        .route("/api/compute_ndvi", post(compute_ndvi))
        .route("/api/trend", post(score_trend))

        // Maps and reports
        .route("/api/ndvi_map", post(create_ndvi_map))
        .route("/ndvi_map/:id", get(serve_ndvi_map))
        .route("/api/download_report/:parcel_id", get(download_report))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Request Types
// ============================================================================

/// JSON body extractor whose rejections render as `{"error": ...}`
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
struct ApiJson<T>(T);

/// Absent, `null`, `""`, `{}` and `[]` all count as a missing field
fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[derive(Debug, Deserialize)]
struct CredentialsRequest {
    email: Option<String>,
    password: Option<String>,
}

impl CredentialsRequest {
    fn into_credentials(self) -> Option<Credentials> {
        match (self.email, self.password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(Credentials { email, password })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ComputeNdviRequest {
    #[serde(default)]
    feature: serde_json::Value,
    user_id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrendRequest {
    series: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct MapRequest {
    #[serde(default)]
    feature: serde_json::Value,
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let credentials = payload
        .into_credentials()
        .ok_or_else(|| AppError::BadRequest("Email and password required".to_string()))?;

    let auth = state.auth.clone();
    let user = tokio::task::spawn_blocking(move || auth.sign_up(&credentials))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Signup failed: {}", e)))?;

    tracing::info!(user_id = %user.id, "Signed up");
    Ok(Json(serde_json::json!({
        "message": "Signup successful",
        "user_id": user.id,
        "email": user.email,
    })))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let credentials = payload
        .into_credentials()
        .ok_or_else(|| AppError::BadRequest("Email and password required".to_string()))?;

    let auth = state.auth.clone();
    let session = tokio::task::spawn_blocking(move || auth.sign_in(&credentials))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Login failed: {}", e)))?;

    Ok(Json(serde_json::json!({
        "message": "Login successful",
        "user_id": session.user.id,
        "email": session.user.email,
        "access_token": session.access_token,
    })))
}

/// Acquire the parcel's NDVI series, assess it, persist the parcel
async fn compute_ndvi(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ComputeNdviRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = payload.user_id.filter(|id| !id.is_empty());
    let (feature, user_id) = match (payload.feature, user_id) {
        (feature, Some(user_id)) if !is_blank(&feature) => (feature, user_id),
        _ => return Err(AppError::BadRequest("Missing geometry or user_id".to_string())),
    };

    let parcel = ParcelGeometry::from_feature_value(&feature)
        .map_err(|e| AppError::BadRequest(format!("Invalid geometry: {}", e)))?;

    let parcel_id = format!("parcel-{}", uuid::Uuid::new_v4());
    let name = payload
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| parcel_id.clone());

    let today = chrono::Local::now().date_naive();
    let query = state.query_for(&parcel, today);

    let outcome = fetch_outcome(&state, query, today).await?;
    let assessment = assess_outcome(&outcome)
        .map_err(|e| AppError::Internal(format!("Trend estimation failed: {}", e)))?;

    tracing::info!(
        %parcel_id,
        samples = outcome.samples.len(),
        synthetic = outcome.synthetic,
        score = assessment.score,
        label = assessment.label.as_str(),
        "Computed parcel NDVI"
    );

    let series: Vec<NdviSample> = outcome.samples.iter().map(NdviSample::rounded).collect();
    let insight = ParcelInsight {
        ai_insight: assessment.label.display().to_string(),
        trend_label: assessment.label,
        degradation_score: assessment.score,
        tier: assessment.tier,
        ai_message: assessment.tier.display_message(),
        synthetic: outcome.synthetic,
        message: outcome.status_message(),
        series,
    };

    let response = serde_json::json!({
        "parcel_id": parcel_id,
        "series": insight.series,
        "degradation_score": assessment.score,
        "tier": assessment.tier,
        "ai_message": insight.ai_message,
        "trend_label": assessment.label,
        "ai_insight": insight.ai_insight,
        "slope": assessment.slope,
        "source": outcome.source,
        "synthetic": outcome.synthetic,
        "message": insight.message,
        "area_hectares": round_to(parcel.area_hectares(), 2),
    });

    let record = ParcelRecord {
        id: parcel_id,
        user_id,
        name,
        geom: feature,
        insight,
        created_at: None,
    };
    persist_parcel(&state, record).await;

    Ok(Json(response))
}

/// Cached observed series, else a provider fetch off-thread
async fn fetch_outcome(
    state: &AppState,
    query: NdviQuery,
    today: NaiveDate,
) -> Result<SeriesOutcome, AppError> {
    let cache_key = query.cache_key();

    let fetched: Result<Vec<NdviSample>, ImageryError> = match state.series_cache.get(&cache_key).await {
        Some(samples) => {
            tracing::debug!("NDVI series cache hit");
            Ok(samples)
        }
        None => {
            let provider = state.ndvi_provider.clone();
            tokio::task::spawn_blocking(move || provider.fetch_series(&query))
                .await
                .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        }
    };

    let outcome = {
        let mut rng = state
            .rng
            .lock()
            .map_err(|_| AppError::Internal("Random generator lock poisoned".to_string()))?;
        resolve_fetch(fetched, state.fallback_policy, &mut *rng, today)
    };

    if !outcome.synthetic && !outcome.samples.is_empty() {
        state.series_cache.insert(cache_key, outcome.samples.clone()).await;
    }

    Ok(outcome)
}

/// Storage failures are logged; the analysis is still returned
async fn persist_parcel(state: &AppState, record: ParcelRecord) {
    let store = state.parcel_store.clone();
    let parcel_id = record.id.clone();

    match tokio::task::spawn_blocking(move || store.insert(&record)).await {
        Ok(Ok(())) => tracing::debug!(%parcel_id, "Saved parcel"),
        Ok(Err(e)) => tracing::warn!(%parcel_id, error = %e, "Failed to save parcel"),
        Err(e) => tracing::warn!(%parcel_id, error = %e, "Parcel save task failed"),
    }
}

/// Score a bare NDVI series
async fn score_trend(ApiJson(payload): ApiJson<TrendRequest>) -> Result<Json<serde_json::Value>, AppError> {
    let assessment: HealthAssessment =
        score_and_label(&payload.series).map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "slope": assessment.slope,
        "degradation_score": assessment.score,
        "tier": assessment.tier,
        "ai_message": assessment.tier.display_message(),
        "trend_label": assessment.label,
        "ai_insight": assessment.label.display(),
    })))
}

async fn create_ndvi_map(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<MapRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if is_blank(&payload.feature) {
        return Err(AppError::BadRequest("Missing geometry".to_string()));
    }

    let parcel = ParcelGeometry::from_feature_value(&payload.feature)
        .map_err(|e| AppError::BadRequest(format!("Invalid geometry: {}", e)))?;
    let (lat, lon) = parcel
        .centroid_lat_lon()
        .ok_or_else(|| AppError::BadRequest("Invalid geometry: no centroid".to_string()))?;

    let query = state.query_for(&parcel, chrono::Local::now().date_naive());
    let provider = state.ndvi_provider.clone();
    let tile_url = tokio::task::spawn_blocking(move || provider.tile_url(&query, &TileStyle::default()))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Map generation failed: {}", e)))?;

    let map_id = uuid::Uuid::new_v4().simple().to_string();
    state
        .map_cache
        .insert(map_id.clone(), MapTemplate::new(lat, lon, tile_url))
        .await;

    Ok(Json(serde_json::json!({
        "map_url": format!("/ndvi_map/{}", map_id)
    })))
}

async fn serve_ndvi_map(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let template = state
        .map_cache
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Map {} not found", id)))?;

    let html = template
        .render()
        .map_err(|e| AppError::Internal(format!("Template error: {}", e)))?;
    Ok(Html(html))
}

/// PDF report when a renderer is configured, HTML otherwise
async fn download_report(
    State(state): State<AppState>,
    Path(parcel_id): Path<String>,
) -> Result<Response, AppError> {
    let store = state.parcel_store.clone();
    let lookup_id = parcel_id.clone();
    let record = tokio::task::spawn_blocking(move || store.get(&lookup_id))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Parcel lookup failed: {}", e)))?
        .ok_or_else(|| AppError::NotFound("Parcel not found".to_string()))?;

    let html = ReportTemplate::from_record(&record)
        .render()
        .map_err(|e| AppError::Internal(format!("Template error: {}", e)))?;

    let Some(renderer) = state.pdf_renderer.clone() else {
        return Ok(Html(html).into_response());
    };

    let pdf = tokio::task::spawn_blocking(move || renderer.render(&html))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        .map_err(|e| AppError::Internal(format!("PDF generation failed: {}", e)))?;

    let disposition = format!("attachment; filename=soil_report_{}.pdf", parcel_id);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
