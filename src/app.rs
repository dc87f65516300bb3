use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::catalog::FileCatalog;
use crate::config::PortalConfig;
use crate::dataset::Workbook;
use crate::downloader;
use crate::error::PortalError;
use crate::login::{self, SESSION_COOKIE};
use crate::pages::{PORTAL_CSS, Pages};
use crate::session::{Action, Context, FilterChoice, Session, Stage};
use crate::view;

/// Shared state of the web application
pub struct AppState {
    pub config: PortalConfig,
    pub catalog: FileCatalog,
    pub pages: Pages,
}

impl AppState {
    pub fn new(config: PortalConfig) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(AppState {
            catalog: FileCatalog::new(&config.data_dir),
            pages: Pages::new()?,
            config,
        })
    }
}

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    email: String,
}

#[derive(Deserialize)]
struct SelectForm {
    #[serde(default)]
    file: String,
}

#[derive(Deserialize)]
struct TabQuery {
    sheet: Option<usize>,
}

type HandlerError = (StatusCode, String);

/// Build the router with all portal routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_stage))
        .route("/login", post(handle_login))
        .route("/select", post(handle_select))
        .route("/filters", post(handle_filters))
        .route("/view/filter", post(handle_view_filter))
        .route("/back", post(handle_back))
        .route("/logout", post(handle_logout))
        .route("/export/:sheet/:format", get(handle_export))
        .route("/static/portal.css", get(serve_css))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server and serve until the process is stopped
pub async fn run(config: PortalConfig) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config)?);

    let files = state.catalog.list();
    log::info!(
        "serving {} spreadsheet file(s) from {}",
        files.len(),
        state.catalog.dir().display()
    );

    let app = router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    log::info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Session id from the cookie and the session it points to
///
/// Without a live session the user is at the login stage.
fn current_session(jar: &CookieJar) -> (Option<String>, Session) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(session) = login::load_session(cookie.value()) {
            return (Some(cookie.value().to_string()), session);
        }
    }
    (None, Session::default())
}

fn session_cookie(id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id)).path("/").http_only(true).build()
}

/// Render the page of the session's stage
fn render_stage(
    state: &AppState,
    session: &Session,
    tab: usize,
    error: Option<&PortalError>,
    email: &str,
) -> Result<Html<String>, HandlerError> {
    let error = error.map(|e| e.to_string());

    let html = match session.stage {
        Stage::Login => state.pages.login(&state.config.email_domain, email, error),
        Stage::FileSelection => {
            let (files, warning) = match state.catalog.require_files() {
                Ok(files) => (files, None),
                Err(e) => (Vec::new(), Some(e.to_string())),
            };
            state.pages.files(session, &files, warning, error)
        }
        Stage::FilterSetup => state.pages.filters(session, error),
        Stage::DataView => {
            // only the active tab is built; the others are just names
            let count = session.workbook.as_ref().map(|wb| wb.sheets.len()).unwrap_or(0);
            let tab = if tab < count { tab } else { 0 };
            let sheet = if count == 0 {
                None
            } else {
                Some(
                    view::sheet_view(session, tab)
                        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?,
                )
            };
            state.pages.data(session, sheet.as_ref(), error)
        }
    };

    html.map(Html).map_err(|e| {
        log::error!("template rendering failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Rendering error".to_string())
    })
}

/// Render the current stage again with `error` inline
fn rejected(state: &AppState, session: &Session, tab: usize, error: &PortalError, email: &str) -> Response {
    let status = if error.is_auth_denied() {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    match render_stage(state, session, tab, Some(error), email) {
        Ok(page) => (status, page).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn serve_stage(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<TabQuery>,
) -> Response {
    let (_, session) = current_session(&jar);
    render_stage(&state, &session, query.sheet.unwrap_or(0), None, "").into_response()
}

/// Apply `actions` in order to the caller's session
///
/// On success the new session is stored and the browser is sent to
/// `redirect`. On failure nothing is stored and the current stage is rendered
/// again with the error inline.
async fn transition(
    state: Arc<AppState>,
    jar: CookieJar,
    actions: Vec<Action>,
    redirect: String,
    tab: usize,
    email: String,
) -> Response {
    let (session_id, session) = current_session(&jar);

    let worker_state = state.clone();
    let current = session.clone();
    // Workbook loading reads the disk, keep it off the async workers
    let outcome = tokio::task::spawn_blocking(move || {
        let ctx = Context {
            email_domain: &worker_state.config.email_domain,
            workbooks: &worker_state.catalog,
        };
        actions
            .into_iter()
            .try_fold(current, |session, action| session.apply(action, &ctx))
    })
    .await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            log::error!("transition task failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response();
        }
    };

    match result {
        Ok(next) => {
            let stored = session_id
                .as_deref()
                .map(|id| login::store_session(id, next.clone()))
                .unwrap_or(false);
            if stored {
                Redirect::to(&redirect).into_response()
            } else {
                let id = login::create_session(next);
                (jar.add(session_cookie(id)), Redirect::to(&redirect)).into_response()
            }
        }
        Err(e) => rejected(&state, &session, tab, &e, &email),
    }
}

async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.clone();
    let actions = vec![Action::Login { email: form.email }];
    transition(state, jar, actions, "/".to_string(), 0, email).await
}

async fn handle_select(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<SelectForm>,
) -> Response {
    let actions = vec![Action::SelectFile { file: form.file }];
    transition(state, jar, actions, "/".to_string(), 0, String::new()).await
}

/// Split a `"<a>/<b>"` index pair sent by a form
fn index_pair(value: &str) -> Option<(usize, usize)> {
    let (a, b) = value.split_once('/')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

/// Look up the sheet and column named by a `"<sheet>/<column>"` checkbox value
fn decode_column(workbook: &Workbook, value: &str) -> Result<(String, String), PortalError> {
    let (s, c) = index_pair(value).ok_or_else(|| PortalError::InvalidFilterColumn {
        sheet: "?".to_string(),
        column: value.to_string(),
    })?;
    let sheet = workbook
        .sheets
        .get(s)
        .ok_or_else(|| PortalError::UnknownSheet(format!("#{}", s)))?;
    let column = sheet
        .data
        .columns()
        .get(c)
        .ok_or_else(|| PortalError::InvalidFilterColumn {
            sheet: sheet.name.clone(),
            column: format!("#{}", c),
        })?;
    Ok((sheet.name.clone(), column.name.clone()))
}

/// Filter setup form: `mode=all|configure` and `column=<sheet>/<column>` pairs
///
/// A column value that does not decode rejects the whole form.
async fn handle_filters(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let (_, session) = current_session(&jar);

    let configure = fields.iter().any(|(k, v)| k == "mode" && v == "configure");
    let choice = if !configure {
        FilterChoice::ShowAll
    } else {
        let mut columns: BTreeMap<String, Vec<String>> = BTreeMap::new();
        // outside filter setup the state machine reports the misplaced action
        let workbook = session.workbook.as_deref().filter(|_| session.stage == Stage::FilterSetup);
        if let Some(workbook) = workbook {
            for (_, value) in fields.iter().filter(|(k, _)| k == "column") {
                match decode_column(workbook, value) {
                    Ok((sheet, column)) => columns.entry(sheet).or_default().push(column),
                    Err(e) => {
                        log::warn!("rejected filter setup: {}", e);
                        return rejected(&state, &session, 0, &e, "");
                    }
                }
            }
        }
        FilterChoice::Configure(columns)
    };

    let actions = vec![Action::ConfigureFilters(choice)];
    transition(state, jar, actions, "/".to_string(), 0, String::new()).await
}

/// Active filter form of one sheet: `sheet=<n>`, one `filter=<f>` per filter
/// shown, and `value=<f>/<option>` for every selected option
async fn handle_view_filter(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let (_, session) = current_session(&jar);

    let sheet_index = fields
        .iter()
        .find(|(k, _)| k == "sheet")
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    // Decode against the view the user was looking at, before any change
    let mut actions = Vec::new();
    if session.stage == Stage::DataView {
        if let Ok(sheet_view) = view::sheet_view(&session, sheet_index) {
            let shown: Vec<usize> = fields
                .iter()
                .filter(|(k, _)| k == "filter")
                .filter_map(|(_, v)| v.trim().parse().ok())
                .collect();
            let picks: Vec<(usize, usize)> = fields
                .iter()
                .filter(|(k, _)| k == "value")
                .filter_map(|(_, v)| index_pair(v))
                .collect();

            for descriptor in sheet_view.filters.iter().filter(|d| shown.contains(&d.index)) {
                let options: Vec<usize> = picks
                    .iter()
                    .filter(|(f, _)| *f == descriptor.index)
                    .map(|(_, o)| *o)
                    .collect();
                let values = match descriptor.values_for(&options) {
                    Ok(values) => values,
                    Err(e) => {
                        log::warn!("rejected filter change: {}", e);
                        return rejected(&state, &session, sheet_index, &e, "");
                    }
                };
                actions.push(Action::SetActiveFilter {
                    sheet: descriptor.sheet.clone(),
                    column: descriptor.column.clone(),
                    values,
                });
            }
        }
    }

    if actions.is_empty() && session.stage != Stage::DataView {
        // Let the state machine report the misplaced action
        actions.push(Action::SetActiveFilter {
            sheet: String::new(),
            column: String::new(),
            values: Vec::new(),
        });
    }

    let redirect = format!("/?sheet={}", sheet_index);
    transition(state, jar, actions, redirect, sheet_index, String::new()).await
}

async fn handle_back(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    transition(state, jar, vec![Action::Back], "/".to_string(), 0, String::new()).await
}

/// Forget the session and return to the login page
async fn handle_logout(jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        login::destroy_session(cookie.value());
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    (jar, Redirect::to("/")).into_response()
}

/// Download the filtered rows of a sheet as CSV or XLSX
async fn handle_export(
    jar: CookieJar,
    Path((sheet_index, format)): Path<(usize, String)>,
) -> Response {
    let (_, session) = current_session(&jar);
    if session.stage != Stage::DataView {
        return Redirect::to("/").into_response();
    }

    let Some(sheet_name) = session
        .workbook
        .as_deref()
        .and_then(|wb| wb.sheets.get(sheet_index))
        .map(|s| s.name.clone())
    else {
        return (StatusCode::NOT_FOUND, "Sheet not found").into_response();
    };

    let data = match session.filtered_sheet(&sheet_name) {
        Ok(data) => data,
        Err(e) => return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    };

    let stem = session
        .selected_file
        .as_deref()
        .and_then(|f| f.strip_suffix(".xlsx"))
        .unwrap_or("export");
    let file_stem = format!("{}-{}", stem, sheet_name).replace(['"', '/', '\\'], "_");

    match format.as_str() {
        "csv" => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}.csv\"", file_stem),
                ),
            ],
            downloader::to_csv(&data),
        )
            .into_response(),
        "xlsx" => match downloader::to_xlsx(&sheet_name, &data) {
            Ok(bytes) => (
                [
                    (
                        header::CONTENT_TYPE,
                        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
                    ),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}.xlsx\"", file_stem),
                    ),
                ],
                bytes,
            )
                .into_response(),
            Err(e) => {
                log::error!("xlsx export failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Export failed").into_response()
            }
        },
        _ => (StatusCode::NOT_FOUND, "Unknown export format").into_response(),
    }
}

async fn serve_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], PORTAL_CSS)
}
