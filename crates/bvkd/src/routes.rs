//! HTTP API routes for bvkd.
//!
//! Bearer-token JSON API under `/v1`. Handlers stay thin: resolve the
//! session, call into the store, shape the response. Flash messages the
//! app shows the child come back in the `message` field.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use bvk_common::auth;
use bvk_common::curriculum::QuizForm;
use bvk_common::error::BvkError;
use bvk_common::levels::LevelProgress;
use bvk_common::models::{
    Achievement, Certificate, DailyStreak, EarnedAchievement, PlayThrough, Product, Profile, Quiz,
    Scenario, User,
};
use bvk_common::store::{
    BuyOutcome, DayOutcome, EndOutcome, LessonActivity, LessonCompletion, LessonView, NewUser,
    PathOverview, PlayActivity, PlayView, ProfileEdit, ProgressCounts, QuizSubmission, SellOutcome,
};

use crate::server::AppState;
use crate::sessions::Session;

type AppStateArc = Arc<AppState>;

/// Error payload, `{"error": "<message>"}`
#[derive(Debug, Serialize, Deserialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Map a domain error onto an HTTP status. Server-side failures are
/// logged here so handlers do not have to.
fn err(e: BvkError) -> ApiError {
    let status = match &e {
        BvkError::Validation(_) => StatusCode::BAD_REQUEST,
        BvkError::Unauthorized => StatusCode::UNAUTHORIZED,
        BvkError::Forbidden(_) => StatusCode::FORBIDDEN,
        BvkError::NotFound(_) => StatusCode::NOT_FOUND,
        BvkError::Conflict(_) => StatusCode::CONFLICT,
        BvkError::Storage(_) | BvkError::Io(_) | BvkError::Internal(_) => {
            error!("request failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorBody { error: e.to_string() }))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the caller's session or fail with 401
fn authed(state: &AppState, headers: &HeaderMap) -> Result<Session, ApiError> {
    bearer_token(headers)
        .and_then(|token| state.sessions.get(token, Utc::now()))
        .ok_or_else(|| err(BvkError::Unauthorized))
}

fn ensure_parent(session: &Session) -> Result<(), ApiError> {
    if session.is_parent {
        Ok(())
    } else {
        Err(err(BvkError::forbidden("parent account required")))
    }
}

/// Cents to a $X.XX display string for messages
fn dollars(cents: i64) -> String {
    format!("${:.2}", cents as f64 / 100.0)
}

/// How many recent items dashboards show
const RECENT_LIMIT: i64 = 5;
/// Per-child slice on the parent dashboard
const CHILD_RECENT_LIMIT: i64 = 3;

// ============================================================================
// Account routes
// ============================================================================

pub fn account_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/accounts/register", post(register))
        .route("/v1/accounts/login", post(login))
        .route("/v1/accounts/logout", post(logout))
        .route("/v1/accounts/profile", get(profile).post(update_profile))
        .route("/v1/accounts/password", post(change_password))
        .route("/v1/accounts/dashboard", get(dashboard))
        .route("/v1/accounts/progress", get(progress))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: String,
    email: String,
    password: String,
    password2: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    age: Option<i64>,
    #[serde(default)]
    parent_name: String,
    #[serde(default)]
    parent_email: String,
    #[serde(default)]
    parent_phone: String,
    #[serde(default)]
    is_parent: bool,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    token: String,
    user: User,
    profile: Profile,
    streak: DailyStreak,
    parent: bool,
    message: String,
}

fn validate_registration(req: &RegisterRequest) -> Result<(), BvkError> {
    if req.username.trim().is_empty() {
        return Err(BvkError::validation("username is required"));
    }
    if !req.email.contains('@') {
        return Err(BvkError::validation("email address looks invalid"));
    }
    if req.password.len() < 6 {
        return Err(BvkError::validation(
            "password must be at least 6 characters",
        ));
    }
    if req.password != req.password2 {
        return Err(BvkError::validation("passwords do not match"));
    }
    Ok(())
}

async fn register(
    State(state): State<AppStateArc>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<RegisterResponse> {
    validate_registration(&req).map_err(err)?;

    let password_hash = auth::hash_password(&req.password).map_err(err)?;
    let new = NewUser {
        username: req.username.trim().to_string(),
        email: req.email.trim().to_string(),
        password_hash,
        first_name: req.first_name,
        last_name: req.last_name,
        age: req.age,
        parent_name: req.parent_name,
        parent_email: req.parent_email,
        parent_phone: req.parent_phone,
        is_parent: req.is_parent,
    };

    let now = Utc::now();
    let reg = state.store.register_user(new, now).map_err(err)?;
    info!(
        user_id = reg.user.id,
        username = %reg.user.username,
        parent = req.is_parent,
        "account registered"
    );

    let token = state.sessions.issue(reg.user.id, req.is_parent, now);
    Ok(Json(RegisterResponse {
        token,
        message: format!("Account created for {}! Welcome to BizVenture.", reg.user.username),
        user: reg.user,
        profile: reg.profile,
        streak: reg.streak,
        parent: req.is_parent,
    }))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    user: User,
    profile: Profile,
    streak: DailyStreak,
    parent: bool,
    newly_awarded: Vec<Achievement>,
    message: String,
}

async fn login(
    State(state): State<AppStateArc>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let (user_id, hash) = state
        .store
        .credentials(&req.username)
        .map_err(err)?
        .ok_or_else(|| err(BvkError::Unauthorized))?;
    if !auth::verify_password(&req.password, &hash).map_err(err)? {
        return Err(err(BvkError::Unauthorized));
    }

    let now = Utc::now();
    let record = state.store.record_login(user_id, now).map_err(err)?;
    let token = state.sessions.issue(user_id, record.is_parent, now);
    info!(
        user_id,
        streak = record.streak.current_streak,
        "login recorded"
    );

    Ok(Json(LoginResponse {
        token,
        message: format!("Welcome back, {}!", record.user.display_name()),
        user: record.user,
        profile: record.profile,
        streak: record.streak,
        parent: record.is_parent,
        newly_awarded: record.newly_awarded,
    }))
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

async fn logout(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> ApiResult<MessageResponse> {
    authed(&state, &headers)?;
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke(token);
    }
    Ok(Json(MessageResponse {
        message: "You have been logged out.".to_string(),
    }))
}

#[derive(Debug, Serialize)]
struct ProfileResponse {
    user: User,
    profile: Profile,
    streak: Option<DailyStreak>,
    achievements: Vec<EarnedAchievement>,
    counts: ProgressCounts,
}

async fn profile(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> ApiResult<ProfileResponse> {
    let session = authed(&state, &headers)?;
    let overview = state.store.profile_overview(session.user_id).map_err(err)?;
    Ok(Json(ProfileResponse {
        user: overview.user,
        profile: overview.profile,
        streak: overview.streak,
        achievements: overview.earned,
        counts: overview.counts,
    }))
}

#[derive(Debug, Serialize)]
struct ProfileUpdateResponse {
    profile: Profile,
    message: String,
}

async fn update_profile(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Json(edit): Json<ProfileEdit>,
) -> ApiResult<ProfileUpdateResponse> {
    let session = authed(&state, &headers)?;
    if let Some(ref email) = edit.email {
        if !email.contains('@') {
            return Err(err(BvkError::validation("email address looks invalid")));
        }
    }
    let profile = state
        .store
        .update_profile(session.user_id, edit, Utc::now())
        .map_err(err)?;
    Ok(Json(ProfileUpdateResponse {
        profile,
        message: "Your profile has been updated!".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
struct PasswordChangeRequest {
    old_password: String,
    new_password: String,
    confirm_password: String,
}

async fn change_password(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Json(req): Json<PasswordChangeRequest>,
) -> ApiResult<MessageResponse> {
    let session = authed(&state, &headers)?;
    if req.new_password.len() < 6 {
        return Err(err(BvkError::validation(
            "password must be at least 6 characters",
        )));
    }
    if req.new_password != req.confirm_password {
        return Err(err(BvkError::validation("passwords do not match")));
    }

    let current = state.store.password_hash_of(session.user_id).map_err(err)?;
    if !auth::verify_password(&req.old_password, &current).map_err(err)? {
        return Err(err(BvkError::validation("old password is incorrect")));
    }

    let hash = auth::hash_password(&req.new_password).map_err(err)?;
    state
        .store
        .set_password_hash(session.user_id, &hash)
        .map_err(err)?;
    info!(user_id = session.user_id, "password changed");
    Ok(Json(MessageResponse {
        message: "Your password was updated successfully.".to_string(),
    }))
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    profile: Profile,
    streak: Option<DailyStreak>,
    counts: ProgressCounts,
    average_quiz_percentage: i64,
    recent_lessons: Vec<LessonActivity>,
    recent_plays: Vec<PlayActivity>,
    recent_achievements: Vec<EarnedAchievement>,
    certificates: Vec<Certificate>,
}

async fn dashboard(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> ApiResult<DashboardResponse> {
    let session = authed(&state, &headers)?;
    let user_id = session.user_id;
    let store = &state.store;

    let profile = store
        .get_profile(user_id)
        .map_err(err)?
        .ok_or_else(|| err(BvkError::NotFound("profile")))?;
    Ok(Json(DashboardResponse {
        profile,
        streak: store.get_streak(user_id).map_err(err)?,
        counts: store.progress_counts(user_id).map_err(err)?,
        average_quiz_percentage: store.average_quiz_percentage(user_id).map_err(err)?,
        recent_lessons: store.recent_lessons(user_id, RECENT_LIMIT).map_err(err)?,
        recent_plays: store.plays_of(user_id, Some(RECENT_LIMIT)).map_err(err)?,
        recent_achievements: store
            .recent_achievements(user_id, RECENT_LIMIT)
            .map_err(err)?,
        certificates: store.certificates_of(user_id).map_err(err)?,
    }))
}

#[derive(Debug, Serialize)]
struct CatalogEntry {
    achievement: Achievement,
    earned: bool,
    earned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct ProgressResponse {
    progress: LevelProgress,
    catalog: Vec<CatalogEntry>,
    recent: Vec<EarnedAchievement>,
    streak: Option<DailyStreak>,
}

async fn progress(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> ApiResult<ProgressResponse> {
    let session = authed(&state, &headers)?;
    let store = &state.store;
    let profile = store
        .get_profile(session.user_id)
        .map_err(err)?
        .ok_or_else(|| err(BvkError::NotFound("profile")))?;

    let earned = store.earned_achievements(session.user_id).map_err(err)?;
    let catalog = store
        .achievement_catalog()
        .map_err(err)?
        .into_iter()
        .map(|achievement| {
            let earned_at = earned
                .iter()
                .find(|e| e.achievement.id == achievement.id)
                .map(|e| e.earned_at);
            CatalogEntry {
                earned: earned_at.is_some(),
                earned_at,
                achievement,
            }
        })
        .collect();

    Ok(Json(ProgressResponse {
        progress: LevelProgress::from_points(profile.total_points),
        catalog,
        recent: store
            .recent_achievements(session.user_id, RECENT_LIMIT)
            .map_err(err)?,
        streak: store.get_streak(session.user_id).map_err(err)?,
    }))
}

// ============================================================================
// Parent routes
// ============================================================================

pub fn parent_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/parents/dashboard", get(parent_dashboard))
        .route("/v1/parents/children", post(link_child))
        .route("/v1/parents/children/:id", delete(unlink_child))
}

#[derive(Debug, Serialize)]
struct ChildReport {
    child: User,
    profile: Profile,
    streak: Option<DailyStreak>,
    counts: ProgressCounts,
    recent_lessons: Vec<LessonActivity>,
    recent_achievements: Vec<EarnedAchievement>,
}

#[derive(Debug, Serialize)]
struct ParentDashboardResponse {
    parent: User,
    children: Vec<ChildReport>,
}

async fn parent_dashboard(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> ApiResult<ParentDashboardResponse> {
    let session = authed(&state, &headers)?;
    ensure_parent(&session)?;
    let store = &state.store;

    let parent = store
        .get_user(session.user_id)
        .map_err(err)?
        .ok_or_else(|| err(BvkError::NotFound("user")))?;

    let mut children = Vec::new();
    for child in store.children_of(session.user_id).map_err(err)? {
        let profile = store
            .get_profile(child.id)
            .map_err(err)?
            .ok_or_else(|| err(BvkError::NotFound("profile")))?;
        children.push(ChildReport {
            profile,
            streak: store.get_streak(child.id).map_err(err)?,
            counts: store.progress_counts(child.id).map_err(err)?,
            recent_lessons: store
                .recent_lessons(child.id, CHILD_RECENT_LIMIT)
                .map_err(err)?,
            recent_achievements: store
                .recent_achievements(child.id, CHILD_RECENT_LIMIT)
                .map_err(err)?,
            child,
        });
    }
    Ok(Json(ParentDashboardResponse { parent, children }))
}

#[derive(Debug, Deserialize)]
struct LinkChildRequest {
    username: String,
}

#[derive(Debug, Serialize)]
struct LinkChildResponse {
    child: User,
    message: String,
}

async fn link_child(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Json(req): Json<LinkChildRequest>,
) -> ApiResult<LinkChildResponse> {
    let session = authed(&state, &headers)?;
    ensure_parent(&session)?;

    let child = state
        .store
        .add_child(session.user_id, &req.username)
        .map_err(err)?;
    info!(
        parent_id = session.user_id,
        child_id = child.id,
        "child linked"
    );
    Ok(Json(LinkChildResponse {
        message: format!("{} is now linked to your account.", child.display_name()),
        child,
    }))
}

async fn unlink_child(
    State(state): State<AppStateArc>,
    Path(child_id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<MessageResponse> {
    let session = authed(&state, &headers)?;
    ensure_parent(&session)?;

    state
        .store
        .remove_child(session.user_id, child_id)
        .map_err(err)?;
    Ok(Json(MessageResponse {
        message: "The child account has been unlinked.".to_string(),
    }))
}

// ============================================================================
// Curriculum routes
// ============================================================================

pub fn curriculum_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/curriculum/path", get(learning_path))
        .route("/v1/curriculum/lessons/:id/start", post(start_lesson))
        .route("/v1/curriculum/lessons/:id/complete", post(complete_lesson))
        .route("/v1/curriculum/quizzes/:id/submit", post(submit_quiz))
        .route("/v1/curriculum/paths/:id/certificate", post(issue_certificate))
}

async fn learning_path(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> ApiResult<PathOverview> {
    let session = authed(&state, &headers)?;
    let paths = state.store.list_paths().map_err(err)?;
    let first = paths
        .into_iter()
        .next()
        .ok_or_else(|| err(BvkError::NotFound("learning path")))?;
    let overview = state
        .store
        .path_overview(session.user_id, first.id)
        .map_err(err)?;
    Ok(Json(overview))
}

/// Quiz as served to clients: the answer key stays server-side.
#[derive(Debug, Serialize)]
struct QuizView {
    quiz: Quiz,
    questions: Vec<QuestionView>,
}

#[derive(Debug, Serialize)]
struct QuestionView {
    id: i64,
    text: String,
    points: i64,
    options: Vec<OptionView>,
}

#[derive(Debug, Serialize)]
struct OptionView {
    id: i64,
    text: String,
}

fn quiz_view(form: QuizForm) -> QuizView {
    QuizView {
        quiz: form.quiz,
        questions: form
            .questions
            .into_iter()
            .map(|q| QuestionView {
                id: q.question.id,
                text: q.question.text,
                points: q.question.points,
                options: q
                    .options
                    .into_iter()
                    .map(|o| OptionView {
                        id: o.id,
                        text: o.text,
                    })
                    .collect(),
            })
            .collect(),
    }
}

#[derive(Debug, Serialize)]
struct StartLessonResponse {
    lesson: LessonView,
    quiz: Option<QuizView>,
}

async fn start_lesson(
    State(state): State<AppStateArc>,
    Path(lesson_id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<StartLessonResponse> {
    let session = authed(&state, &headers)?;
    let lesson = state
        .store
        .start_lesson(session.user_id, lesson_id, Utc::now())
        .map_err(err)?;
    let quiz = state
        .store
        .quiz_for_lesson(lesson_id)
        .map_err(err)?
        .map(quiz_view);
    Ok(Json(StartLessonResponse { lesson, quiz }))
}

#[derive(Debug, Serialize)]
struct CompleteLessonResponse {
    completion: LessonCompletion,
    message: String,
}

async fn complete_lesson(
    State(state): State<AppStateArc>,
    Path(lesson_id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<CompleteLessonResponse> {
    let session = authed(&state, &headers)?;
    let completion = state
        .store
        .complete_lesson(session.user_id, lesson_id, Utc::now())
        .map_err(err)?;

    let message = if completion.already_completed {
        "You have already completed this lesson.".to_string()
    } else {
        info!(
            user_id = session.user_id,
            lesson_id,
            points = completion.points_awarded,
            "lesson completed"
        );
        format!("Congratulations! You completed {}!", completion.lesson.title)
    };
    Ok(Json(CompleteLessonResponse {
        completion,
        message,
    }))
}

#[derive(Debug, Deserialize)]
struct QuizSubmitRequest {
    answers: HashMap<i64, i64>,
}

#[derive(Debug, Serialize)]
struct QuizSubmitResponse {
    result: QuizSubmission,
    message: String,
}

async fn submit_quiz(
    State(state): State<AppStateArc>,
    Path(quiz_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<QuizSubmitRequest>,
) -> ApiResult<QuizSubmitResponse> {
    let session = authed(&state, &headers)?;
    let result = state
        .store
        .submit_quiz(session.user_id, quiz_id, &req.answers, Utc::now())
        .map_err(err)?;
    info!(
        user_id = session.user_id,
        quiz_id,
        percentage = result.attempt.percentage,
        passed = result.attempt.passed,
        "quiz submitted"
    );

    let message = if result.attempt.passed {
        format!("Great job! You passed with {}%!", result.attempt.percentage)
    } else {
        format!(
            "You scored {}%. Review the lesson and try again!",
            result.attempt.percentage
        )
    };
    Ok(Json(QuizSubmitResponse { result, message }))
}

#[derive(Debug, Serialize)]
struct CertificateResponse {
    certificate: Certificate,
    message: String,
}

async fn issue_certificate(
    State(state): State<AppStateArc>,
    Path(path_id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<CertificateResponse> {
    let session = authed(&state, &headers)?;
    let certificate = {
        let mut rng = state.rng.lock().unwrap();
        state
            .store
            .issue_certificate(session.user_id, path_id, Utc::now(), &mut *rng)
    }
    .map_err(err)?;
    info!(
        user_id = session.user_id,
        number = %certificate.certificate_number,
        "certificate issued"
    );
    Ok(Json(CertificateResponse {
        message: format!(
            "Congratulations! Certificate {} is yours.",
            certificate.certificate_number
        ),
        certificate,
    }))
}

// ============================================================================
// Scenario routes
// ============================================================================

pub fn scenario_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/scenarios", get(list_scenarios))
        .route("/v1/scenarios/:slug", get(scenario_detail))
        .route("/v1/scenarios/:slug/start", post(start_scenario))
        .route("/v1/scenarios/:slug/buy", post(buy))
        .route("/v1/scenarios/:slug/sell", post(sell))
        .route("/v1/scenarios/:slug/advance-day", post(advance_day))
        .route("/v1/scenarios/:slug/end", post(end_scenario))
}

#[derive(Debug, Serialize)]
struct ScenarioListResponse {
    scenarios: Vec<Scenario>,
}

async fn list_scenarios(State(state): State<AppStateArc>) -> ApiResult<ScenarioListResponse> {
    let scenarios = state.store.list_scenarios().map_err(err)?;
    Ok(Json(ScenarioListResponse { scenarios }))
}

fn scenario_by_slug(state: &AppState, slug: &str) -> Result<Scenario, ApiError> {
    state
        .store
        .get_scenario_by_slug(slug)
        .map_err(err)?
        .ok_or_else(|| err(BvkError::NotFound("scenario")))
}

/// The caller's live run for a slug, or 404
fn live_play(
    state: &AppState,
    user_id: i64,
    slug: &str,
) -> Result<(Scenario, PlayThrough), ApiError> {
    let scenario = scenario_by_slug(state, slug)?;
    let play = state
        .store
        .active_play(user_id, scenario.id)
        .map_err(err)?
        .ok_or_else(|| err(BvkError::NotFound("play-through")))?;
    Ok((scenario, play))
}

#[derive(Debug, Serialize)]
struct ScenarioDetailResponse {
    scenario: Scenario,
    products: Vec<Product>,
    play: Option<PlayView>,
}

async fn scenario_detail(
    State(state): State<AppStateArc>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> ApiResult<ScenarioDetailResponse> {
    let scenario = scenario_by_slug(&state, &slug)?;
    let products = state.store.products_of(scenario.id).map_err(err)?;

    // Logged-in callers also see their live run
    let session = bearer_token(&headers).and_then(|t| state.sessions.get(t, Utc::now()));
    let play = match session {
        Some(session) => {
            match state
                .store
                .active_play(session.user_id, scenario.id)
                .map_err(err)?
            {
                Some(play) => Some(
                    state
                        .store
                        .playthrough_view(session.user_id, play.id)
                        .map_err(err)?,
                ),
                None => None,
            }
        }
        None => None,
    };

    Ok(Json(ScenarioDetailResponse {
        scenario,
        products,
        play,
    }))
}

#[derive(Debug, Serialize)]
struct StartScenarioResponse {
    view: PlayView,
    resumed: bool,
    message: String,
}

async fn start_scenario(
    State(state): State<AppStateArc>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> ApiResult<StartScenarioResponse> {
    let session = authed(&state, &headers)?;
    let scenario = scenario_by_slug(&state, &slug)?;
    let outcome = state
        .store
        .start_scenario(session.user_id, scenario.id, Utc::now())
        .map_err(err)?;
    info!(
        user_id = session.user_id,
        scenario = %scenario.slug,
        resumed = outcome.resumed,
        "scenario started"
    );

    let message = if outcome.resumed {
        "Picking up where you left off. Good luck!".to_string()
    } else {
        format!("{} is open for business!", scenario.title)
    };
    Ok(Json(StartScenarioResponse {
        view: outcome.view,
        resumed: outcome.resumed,
        message,
    }))
}

#[derive(Debug, Deserialize)]
struct BuyRequest {
    product_id: i64,
    quantity: i64,
}

#[derive(Debug, Serialize)]
struct BuyResponse {
    outcome: BuyOutcome,
    message: String,
}

async fn buy(
    State(state): State<AppStateArc>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Json(req): Json<BuyRequest>,
) -> ApiResult<BuyResponse> {
    let session = authed(&state, &headers)?;
    let (_, play) = live_play(&state, session.user_id, &slug)?;
    let outcome = state
        .store
        .buy_product(
            session.user_id,
            play.id,
            req.product_id,
            req.quantity,
            Utc::now(),
        )
        .map_err(err)?;
    info!(
        user_id = session.user_id,
        product = %outcome.product.name,
        quantity = req.quantity,
        total = outcome.entry.total_cents,
        "stock purchased"
    );

    let message = format!("You bought {} {}!", req.quantity, outcome.product.name);
    Ok(Json(BuyResponse { outcome, message }))
}

#[derive(Debug, Deserialize)]
struct SellRequest {
    product_id: i64,
    quantity: i64,
    price_cents: i64,
}

#[derive(Debug, Serialize)]
struct SellResponse {
    outcome: SellOutcome,
    message: String,
}

async fn sell(
    State(state): State<AppStateArc>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Json(req): Json<SellRequest>,
) -> ApiResult<SellResponse> {
    let session = authed(&state, &headers)?;
    let (_, play) = live_play(&state, session.user_id, &slug)?;
    let outcome = {
        let mut rng = state.rng.lock().unwrap();
        state.store.sell_product(
            session.user_id,
            play.id,
            req.product_id,
            req.quantity,
            req.price_cents,
            &state.config.economy,
            &mut *rng,
            Utc::now(),
        )
    }
    .map_err(err)?;

    let message = match &outcome {
        SellOutcome::Sold {
            product,
            units_sold,
            revenue_cents,
            ..
        } => {
            info!(
                user_id = session.user_id,
                product = %product.name,
                units = units_sold,
                revenue = revenue_cents,
                "sale made"
            );
            format!(
                "You sold {} {} for {}!",
                units_sold,
                product.name,
                dollars(*revenue_cents)
            )
        }
        SellOutcome::NoSale { .. } => "No buyers at that price today. Try adjusting it!".to_string(),
    };
    Ok(Json(SellResponse { outcome, message }))
}

#[derive(Debug, Serialize)]
struct DayResponse {
    outcome: DayOutcome,
    message: String,
}

async fn advance_day(
    State(state): State<AppStateArc>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> ApiResult<DayResponse> {
    let session = authed(&state, &headers)?;
    let (_, play) = live_play(&state, session.user_id, &slug)?;
    let outcome = {
        let mut rng = state.rng.lock().unwrap();
        state.store.advance_day(
            session.user_id,
            play.id,
            &state.config.economy,
            &mut *rng,
            Utc::now(),
        )
    }
    .map_err(err)?;

    let mut message = format!(
        "Day {} is done. Overnight expenses came to {}.",
        outcome.play.days_played,
        dollars(outcome.expense_cents)
    );
    if let Some(event) = &outcome.event {
        message.push(' ');
        message.push_str(&event.description);
    }
    Ok(Json(DayResponse { outcome, message }))
}

#[derive(Debug, Serialize)]
struct EndResponse {
    outcome: EndOutcome,
    message: String,
}

async fn end_scenario(
    State(state): State<AppStateArc>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> ApiResult<EndResponse> {
    let session = authed(&state, &headers)?;
    let (scenario, play) = live_play(&state, session.user_id, &slug)?;
    let outcome = state
        .store
        .end_scenario(session.user_id, play.id, Utc::now())
        .map_err(err)?;
    info!(
        user_id = session.user_id,
        scenario = %scenario.slug,
        target_met = outcome.target_met,
        profit = outcome.final_profit_cents,
        "scenario ended"
    );

    let message = if outcome.target_met {
        format!(
            "Congratulations! You finished {} with {} profit and earned {} points!",
            scenario.title,
            dollars(outcome.final_profit_cents),
            outcome.points_awarded
        )
    } else {
        format!(
            "{} closed with {} profit, short of the {} target. Try again!",
            scenario.title,
            dollars(outcome.final_profit_cents),
            dollars(scenario.target_profit_cents)
        )
    };
    Ok(Json(EndResponse { outcome, message }))
}

// ============================================================================
// Health routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health_check))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
