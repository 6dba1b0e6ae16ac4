//! # sv-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.
//! Request bodies are parsed by hand so malformed JSON maps to the same
//! 400 responses the body-field checks produce.

use actix_session::Session;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use sv_core::error::AppError;
use sv_core::models::{Client, Post, Suggestion, Verdict, Vote};
use sv_core::traits::{Decision, RateGate, SnipRepo, SnippetLinter};
use uuid::Uuid;

use crate::middleware::ClientIp;
use crate::session::{VisitorState, VoteRecord};

/// State shared across all Actix-web workers.
pub struct AppState {
    pub repo: Box<dyn SnipRepo>,
    pub linter: Box<dyn SnippetLinter>,
    pub gate: Box<dyn RateGate>,
}

/// Wraps core errors with their HTTP mapping.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::Validation(_) | AppError::BadCode(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::DuplicateAction(_) => StatusCode::ACCEPTED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match &self.0 {
            AppError::BadCode(errors) => HttpResponse::BadRequest().json(json!({
                "message": "submitted code failed to parse",
                "errors": errors,
            })),
            // plain text with a retry hint, clients decide when to come back
            AppError::RateLimited(_) => HttpResponse::TooManyRequests()
                .content_type("text/plain")
                .body(self.0.to_string()),
            AppError::Internal(msg) => {
                log::error!("request failed: {msg}");
                HttpResponse::InternalServerError().finish()
            }
            other => HttpResponse::build(self.status_code()).json(json!({
                "message": other.to_string(),
            })),
        }
    }
}

/// Rate-limit gate for a named route group. Anonymous requests carry no key
/// and pass through; the write handlers reject them on identity instead.
fn gate(state: &AppState, ip: &ClientIp, group: &str) -> Result<(), ApiError> {
    let Some(addr) = ip.0 else { return Ok(()) };
    match state.gate.check(&Client::aton(addr), group) {
        Decision::Allowed { .. } => Ok(()),
        Decision::Limited { retry_after } => Err(ApiError(AppError::RateLimited(retry_after))),
    }
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location.to_string()))
        .finish()
}

#[derive(Deserialize)]
pub struct IndexQuery {
    /// Previously shown post, excluded from the next draw.
    pub p: Option<String>,
}

/// Serves a random snippet, excluding the previously shown one.
pub async fn index(
    data: web::Data<AppState>,
    ip: ClientIp,
    session: Session,
    query: web::Query<IndexQuery>,
) -> Result<HttpResponse, ApiError> {
    gate(&data, &ip, "index")?;

    // 1. Exclusion: only a previous id that still resolves counts
    let previous = match query.p.as_deref().and_then(|raw| Uuid::parse_str(raw).ok()) {
        Some(id) => data.repo.get_post(id).await?.map(|post| post.id),
        None => None,
    };

    // 2. Draw: an exhausted corpus sends the visitor to the submission flow
    let Some(post) = data.repo.random_post(previous).await? else {
        return Ok(see_other("/post/submit"));
    };

    // 3. Session: remember what this visitor has been shown
    let mut visitor = VisitorState::load(&session);
    visitor.seen_posts.insert(post.id);
    let prior_vote = visitor.votes_by_post.get(&post.id).cloned();
    visitor.store(&session);

    let counts = data.repo.vote_counts(post.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "post": post,
        "currentVoteCounts": counts,
        "priorVote": prior_vote,
    })))
}

pub async fn submit_page(
    data: web::Data<AppState>,
    ip: ClientIp,
) -> Result<HttpResponse, ApiError> {
    gate(&data, &ip, "submit")?;
    Ok(HttpResponse::Ok().json(json!({ "submission": true })))
}

#[derive(Deserialize)]
struct SubmitBody {
    title: Option<String>,
    code: Option<String>,
}

/// Accepts a new snippet after validating it parses as a program.
pub async fn submit(
    data: web::Data<AppState>,
    ip: ClientIp,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    gate(&data, &ip, "submit")?;

    let body: SubmitBody = serde_json::from_slice(&body)
        .map_err(|_| AppError::Validation("could not parse body!".into()))?;
    let (Some(title), Some(code)) = (body.title, body.code) else {
        return Err(ApiError(AppError::Validation(
            "must submit code and title!".into(),
        )));
    };

    // 1. Validation: the snippet must at least be a well-formed program
    let errors = data.linter.lint(&code);
    if !errors.is_empty() {
        return Err(ApiError(AppError::BadCode(errors)));
    }

    // 2. Identity: submissions are attributed when the origin is resolvable
    let submitter_id = match ip.0 {
        Some(addr) => Some(
            data.repo
                .find_or_create_client(&Client::aton(addr))
                .await?
                .id,
        ),
        None => None,
    };

    data.repo
        .create_post(Post {
            id: Uuid::now_v7(),
            title,
            code,
            note: None,
            submitter_id,
            created_at: Utc::now(),
        })
        .await?;

    Ok(see_other("/"))
}

#[derive(Deserialize)]
struct VoteBody {
    #[serde(rename = "isBad")]
    is_bad: Option<bool>,
}

/// Records one vote per (client, post); a repeat is a benign no-op.
pub async fn vote(
    data: web::Data<AppState>,
    ip: ClientIp,
    session: Session,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    gate(&data, &ip, "vote")?;
    let post_id = path.into_inner();

    let body: VoteBody = serde_json::from_slice(&body)
        .map_err(|_| AppError::Validation("could not parse body!".into()))?;
    let Some(is_bad) = body.is_bad else {
        return Err(ApiError(AppError::Validation(
            "isBad must be one of 'true' or 'false'".into(),
        )));
    };

    let Some(addr) = ip.0 else {
        return Err(ApiError(AppError::Forbidden(
            "must provide ip address to vote".into(),
        )));
    };
    let client = data
        .repo
        .find_or_create_client(&Client::aton(addr))
        .await?;

    // 1. Duplicate guard, advisory; the insert re-validates under the
    //    unique index, so a racing double-tap still lands in the same arm
    if data.repo.has_voted(client.id, post_id).await? {
        return Ok(HttpResponse::Accepted().finish());
    }

    let verdict = Verdict::from_is_bad(is_bad);
    let vote = Vote {
        id: Uuid::now_v7(),
        client_id: client.id,
        post_id,
        is_bad: verdict.is_bad(),
        created_at: Utc::now(),
    };
    match data.repo.create_vote(vote.clone()).await {
        Ok(()) => {}
        Err(AppError::DuplicateAction(_)) => return Ok(HttpResponse::Accepted().finish()),
        Err(err) => return Err(ApiError(err)),
    }

    // 2. Session: lets the UI echo the vote back without re-asking the ledger
    let mut visitor = VisitorState::load(&session);
    visitor.votes_by_post.insert(
        post_id,
        VoteRecord {
            vote_id: vote.id,
            is_bad: vote.is_bad,
        },
    );
    visitor.store(&session);

    let counts = data.repo.vote_counts(post_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "vote": { "id": vote.id },
        "currentVoteCounts": counts,
    })))
}

pub async fn suggest_page(
    data: web::Data<AppState>,
    ip: ClientIp,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    gate(&data, &ip, "suggest")?;
    let post_id = path.into_inner();
    let post = data
        .repo
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post".into(), post_id.to_string()))?;
    Ok(HttpResponse::Ok().json(json!({ "post": post, "submission": true })))
}

#[derive(Deserialize)]
struct SuggestBody {
    code: Option<String>,
    summary: Option<String>,
}

/// Records one suggestion per (client, post); a repeat redirects back with
/// a warning flag instead of failing.
pub async fn suggest(
    data: web::Data<AppState>,
    ip: ClientIp,
    session: Session,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    gate(&data, &ip, "suggest")?;
    let post_id = path.into_inner();

    let body: SuggestBody = serde_json::from_slice(&body)
        .map_err(|_| AppError::Validation("could not parse body!".into()))?;
    let (Some(code), Some(summary)) = (body.code, body.summary) else {
        return Err(ApiError(AppError::Validation(
            "must submit code and summary!".into(),
        )));
    };

    let errors = data.linter.lint(&code);
    if !errors.is_empty() {
        return Err(ApiError(AppError::BadCode(errors)));
    }

    let Some(addr) = ip.0 else {
        return Err(ApiError(AppError::Forbidden(
            "must provide ip address to suggest".into(),
        )));
    };
    let client = data
        .repo
        .find_or_create_client(&Client::aton(addr))
        .await?;

    if data.repo.has_suggested(client.id, post_id).await? {
        return Ok(see_other("/?warning=already_suggested"));
    }

    let suggestion = Suggestion {
        id: Uuid::now_v7(),
        client_id: client.id,
        post_id,
        code,
        description: summary,
        created_at: Utc::now(),
    };
    match data.repo.create_suggestion(suggestion.clone()).await {
        Ok(()) => {}
        Err(AppError::DuplicateAction(_)) => return Ok(see_other("/?warning=already_suggested")),
        Err(err) => return Err(ApiError(err)),
    }

    let mut visitor = VisitorState::load(&session);
    visitor.suggestions_by_post.insert(post_id, suggestion.id);
    visitor.store(&session);

    Ok(see_other("/"))
}

pub async fn list_suggestions(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    let suggestions = data.repo.list_suggestions(post_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "suggestions": suggestions })))
}

pub async fn suggestion_detail(
    data: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, ApiError> {
    let (post_id, suggestion_id) = path.into_inner();
    let suggestion = data
        .repo
        .get_suggestion(post_id, suggestion_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Suggestion".into(), suggestion_id.to_string()))?;
    Ok(HttpResponse::Ok().json(json!({ "suggestion": suggestion })))
}
