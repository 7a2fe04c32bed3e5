//! HTTP routing: article endpoints plus the account and read-log API.
//!
//! Handlers are thin glue over `vitalis_core` and the storage layer.
//! Fetch failures surface as JSON sentinels rather than error statuses so
//! the front end can distinguish "no article found" from "found one but
//! could not fetch its content".

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use serde::Deserialize;
use serde_json::{Value, json};
use vitalis_core::{
    ARTICLE_PATH_PREFIX, Article, Category, FetchConfig, WIKI_ORIGIN, fetch_article,
    pick_random_article, render_pdf, render_text, safe_filename,
};

use crate::auth::{self, SESSION_COOKIE, SESSION_MAX_AGE, AuthError};
use crate::storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub fetch: FetchConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/random", get(random_article))
        .route("/download", get(download_article))
        .route("/api/register", post(api_register))
        .route("/api/login", post(api_login))
        .route("/api/logout", post(api_logout))
        .route("/api/me", get(api_me))
        .route("/api/read-log", get(api_get_read_log).post(api_save_read_log))
        .with_state(state)
}

async fn home() -> Html<&'static str> {
    Html(include_str!("../public/index.html"))
}

#[derive(Deserialize)]
struct RandomParams {
    #[serde(default = "default_category")]
    category: String,
    format: Option<String>,
}

fn default_category() -> String {
    "physics".to_string()
}

async fn random_article(
    State(state): State<AppState>,
    Query(params): Query<RandomParams>,
) -> Response {
    let Ok(category) = params.category.parse::<Category>() else {
        return Json(json!({"url": null})).into_response();
    };
    let url = match pick_random_article(category, &state.fetch).await {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!(category = category.as_str(), %err, "random pick failed");
            return Json(json!({"url": null})).into_response();
        }
    };

    match params.format.as_deref() {
        Some("txt" | "plaintext") | Some("pdf") => {
            let article = match fetch_article(&url, &state.fetch).await {
                Ok(article) => article,
                Err(err) => {
                    tracing::warn!(%url, %err, "article fetch failed");
                    return Json(json!({"url": url, "error": "Failed to fetch article content"}))
                        .into_response();
                }
            };
            if params.format.as_deref() == Some("pdf") {
                pdf_attachment(&article)
            } else {
                text_attachment(&article)
            }
        }
        _ => Json(json!({"url": url})).into_response(),
    }
}

#[derive(Deserialize)]
struct DownloadParams {
    url: String,
    #[serde(default = "default_format")]
    format: String,
}

fn default_format() -> String {
    "txt".to_string()
}

async fn download_article(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> Response {
    let prefix = format!("{WIKI_ORIGIN}{ARTICLE_PATH_PREFIX}");
    if !params.url.starts_with(&prefix) {
        return Json(json!({"error": "Invalid Wikipedia URL"})).into_response();
    }

    let article = match fetch_article(&params.url, &state.fetch).await {
        Ok(article) => article,
        Err(err) => {
            tracing::warn!(url = %params.url, %err, "article fetch failed");
            return Json(json!({"error": "Failed to fetch article content"})).into_response();
        }
    };

    if params.format == "pdf" {
        pdf_attachment(&article)
    } else {
        text_attachment(&article)
    }
}

fn text_attachment(article: &Article) -> Response {
    let body = render_text(article);
    (
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, attachment_disposition(&article.title, "txt")),
        ],
        body,
    )
        .into_response()
}

fn pdf_attachment(article: &Article) -> Response {
    match render_pdf(article) {
        Ok(bytes) => (
            [
                (CONTENT_TYPE, "application/pdf".to_string()),
                (CONTENT_DISPOSITION, attachment_disposition(&article.title, "pdf")),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => {
            tracing::error!(title = %article.title, %err, "PDF rendering failed");
            Json(json!({"error": "Failed to fetch article content"})).into_response()
        }
    }
}

fn attachment_disposition(title: &str, extension: &str) -> String {
    format!("attachment; filename=\"{}.{extension}\"", safe_filename(title))
}

#[derive(Deserialize, Default)]
struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn api_register(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Response {
    match auth::register(state.storage.as_ref(), &creds.username, &creds.password).await {
        Ok(_) => Json(json!({"ok": true})).into_response(),
        Err(AuthError::Storage(err)) => {
            tracing::error!(%err, "registration storage failure");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "Storage failure"})))
                .into_response()
        }
        Err(err) => {
            (StatusCode::BAD_REQUEST, Json(json!({"error": err.to_string()}))).into_response()
        }
    }
}

async fn api_login(State(state): State<AppState>, Json(creds): Json<Credentials>) -> Response {
    match auth::login(state.storage.as_ref(), &creds.username, &creds.password).await {
        Ok(Some(token)) => {
            let cookie = format!(
                "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={SESSION_MAX_AGE}"
            );
            (
                [(SET_COOKIE, cookie)],
                Json(json!({"ok": true, "username": creds.username.trim()})),
            )
                .into_response()
        }
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid username or password"})),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(%err, "login storage failure");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "Storage failure"})))
                .into_response()
        }
    }
}

async fn api_logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_cookie(&headers)
        && let Err(err) = auth::logout(state.storage.as_ref(), &token).await
    {
        tracing::error!(%err, "logout storage failure");
    }
    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    ([(SET_COOKIE, cookie)], Json(json!({"ok": true}))).into_response()
}

async fn api_me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match current_user(&state, &headers).await {
        Some(username) => Json(json!({"username": username})).into_response(),
        None => Json(json!({"username": null})).into_response(),
    }
}

async fn api_get_read_log(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(username) = current_user(&state, &headers).await else {
        return not_logged_in();
    };
    match state.storage.get_log(&username).await {
        Ok(log) => Json(json!({"log": log})).into_response(),
        Err(err) => {
            tracing::error!(%username, %err, "read-log load failure");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "Storage failure"})))
                .into_response()
        }
    }
}

async fn api_save_read_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(username) = current_user(&state, &headers).await else {
        return not_logged_in();
    };
    let log = body.get("log").cloned().unwrap_or_else(|| json!([]));
    let Value::Array(entries) = log else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Invalid log"}))).into_response();
    };
    match state.storage.save_log(&username, &entries).await {
        Ok(()) => Json(json!({"ok": true})).into_response(),
        Err(err) => {
            tracing::error!(%username, %err, "read-log save failure");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "Storage failure"})))
                .into_response()
        }
    }
}

fn not_logged_in() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "Not logged in"}))).into_response()
}

async fn current_user(state: &AppState, headers: &HeaderMap) -> Option<String> {
    let token = session_cookie(headers)?;
    auth::verify_session(state.storage.as_ref(), &token)
        .await
        .ok()
        .flatten()
}

/// Value of the session cookie from a request's `Cookie` header.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_session_cookie_parsing() {
        let headers = headers_with_cookie("theme=dark; wiki_session=abc123; lang=en");
        assert_eq!(session_cookie(&headers), Some("abc123".to_string()));

        let headers = headers_with_cookie("theme=dark");
        assert_eq!(session_cookie(&headers), None);

        assert_eq!(session_cookie(&HeaderMap::new()), None);
    }

    #[test]
    fn test_attachment_disposition_sanitizes_title() {
        assert_eq!(
            attachment_disposition("C++: A History?", "pdf"),
            "attachment; filename=\"C___ A History_.pdf\""
        );
    }
}
