//! Task list, create, detail, update, complete, and delete handlers.

use super::AppState;
use super::auth_handlers::CurrentUser;
use super::render;
use crate::db::tasks::{TaskFilter, TaskListQuery};
use crate::error::{AppError, AppResult};
use crate::forms::{FormErrors, TaskForm};
use crate::types::Task;
use axum::extract::{Form, Path, Query, State};
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use tracing::info;

/// Query parameters for the list pages.
#[derive(Debug, serde::Deserialize)]
pub struct ListParams {
    search: Option<String>,
    page: Option<i64>,
}

impl ListParams {
    fn search(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

fn list_query(state: &AppState, params: &ListParams) -> TaskListQuery {
    TaskListQuery {
        search: params.search(),
        page: params.page.unwrap_or(1).max(1),
        limit: state.page_size(),
    }
}

/// Active task list with search and pagination.
pub async fn tasks_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Html<String>> {
    let query = list_query(&state, &params);
    let result = state
        .db()
        .list_tasks(&user.id, TaskFilter::Active, &query)?;

    let search = query.search.as_deref().unwrap_or("");
    let content = format!(
        r#"<div class="card">
            <h1>My tasks</h1>
            <form class="search-bar" method="get" action="/tasks">
                <input type="text" name="search" placeholder="Search by title" value="{search}">
                <button type="submit">Search</button>
            </form>
            {table}
            {pagination}
        </div>"#,
        search = render::html_escape(search),
        table = render::task_table(&result.tasks, true),
        pagination = render::pagination("/tasks", &result, query.search.as_deref()),
    );

    Ok(render::page("Tasks", Some(&user.username), &content))
}

/// Completed task list.
pub async fn completed_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Html<String>> {
    let query = list_query(&state, &params);
    let result = state
        .db()
        .list_tasks(&user.id, TaskFilter::Completed, &query)?;

    let content = format!(
        r#"<div class="card">
            <h1>Completed tasks</h1>
            {table}
            {pagination}
        </div>"#,
        table = render::task_table(&result.tasks, false),
        pagination = render::pagination("/tasks/completed", &result, query.search.as_deref()),
    );

    Ok(render::page(
        "Completed tasks",
        Some(&user.username),
        &content,
    ))
}

/// Combined view: active and completed sections plus counts.
pub async fn all_tasks_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Html<String>> {
    let counts = state.db().task_counts(&user.id)?;
    let active = state.db().list_tasks_unpaged(&user.id, TaskFilter::Active)?;
    let completed = state
        .db()
        .list_tasks_unpaged(&user.id, TaskFilter::Completed)?;

    let content = format!(
        r#"<div class="card">
            <h1>All tasks</h1>
            <div class="counts">{completed_count} of {all_count} completed</div>
            <h2>Active</h2>
            {active_table}
            <h2>Completed</h2>
            {completed_table}
        </div>"#,
        completed_count = counts.completed,
        all_count = counts.all,
        active_table = render::task_table(&active, true),
        completed_table = render::task_table(&completed, false),
    );

    Ok(render::page("All tasks", Some(&user.username), &content))
}

/// Empty create form.
pub async fn new_task_page(CurrentUser(user): CurrentUser) -> Html<String> {
    let body = render::task_form(
        "New task",
        "/tasks/new",
        &TaskForm::default(),
        &FormErrors::default(),
    );
    render::page("New task", Some(&user.username), &body)
}

/// Create form submission. Validation failures re-render the form with the
/// submitted values; nothing is persisted.
pub async fn create_task_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<TaskForm>,
) -> AppResult<Response> {
    match form.validate() {
        Ok(input) => {
            let task = state.db().create_task(&user.id, &input)?;
            info!(task_id = %task.id, username = %user.username, "task created");
            Ok(Redirect::to("/tasks").into_response())
        }
        Err(errors) => {
            let body = render::task_form("New task", "/tasks/new", &form, &errors);
            Ok(render::page("New task", Some(&user.username), &body).into_response())
        }
    }
}

/// Task detail with status history.
pub async fn task_detail_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<String>,
) -> AppResult<Html<String>> {
    let task = state
        .db()
        .get_task(&user.id, &task_id)?
        .ok_or_else(|| AppError::task_not_found(&task_id))?;
    let history = state.db().status_history(&task.id)?;

    Ok(render::page(
        &task.title,
        Some(&user.username),
        &render::task_detail(&task, &history),
    ))
}

fn form_from_task(task: &Task) -> TaskForm {
    TaskForm {
        title: task.title.clone(),
        description: task.description.clone(),
        priority: task.priority.to_string(),
        status: task.status.as_str().to_string(),
        completed: task.completed.then(|| "on".to_string()),
    }
}

/// Populated edit form.
pub async fn edit_task_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<String>,
) -> AppResult<Html<String>> {
    let task = state
        .db()
        .get_task(&user.id, &task_id)?
        .ok_or_else(|| AppError::task_not_found(&task_id))?;

    let action = format!("/tasks/{}/edit", task.id);
    let body = render::task_form(
        "Edit task",
        &action,
        &form_from_task(&task),
        &FormErrors::default(),
    );

    Ok(render::page("Edit task", Some(&user.username), &body))
}

/// Edit form submission.
pub async fn update_task_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<String>,
    Form(form): Form<TaskForm>,
) -> AppResult<Response> {
    match form.validate() {
        Ok(input) => {
            let task = state.db().update_task(&user.id, &task_id, &input)?;
            info!(task_id = %task.id, username = %user.username, "task updated");
            Ok(Redirect::to("/tasks").into_response())
        }
        Err(errors) => {
            let action = format!("/tasks/{}/edit", task_id);
            let body = render::task_form("Edit task", &action, &form, &errors);
            Ok(render::page("Edit task", Some(&user.username), &body).into_response())
        }
    }
}

/// Mark a task completed.
pub async fn complete_task_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<String>,
) -> AppResult<Redirect> {
    let task = state.db().complete_task(&user.id, &task_id)?;
    info!(task_id = %task.id, username = %user.username, "task completed");
    Ok(Redirect::to("/tasks"))
}

/// Soft-delete a task.
pub async fn delete_task_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<String>,
) -> AppResult<Redirect> {
    state.db().delete_task(&user.id, &task_id)?;
    info!(task_id = %task_id, username = %user.username, "task deleted");
    Ok(Redirect::to("/tasks"))
}

/// Root redirects to the task list.
pub async fn root() -> Redirect {
    Redirect::to("/tasks")
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
