//! HTML rendering helpers.
//!
//! Pages are assembled server-side: the embedded base shell plus fragments
//! built with `format!`. Everything user-supplied goes through
//! [`html_escape`].

use super::templates;
use crate::db::tasks::TaskListResult;
use crate::forms::{FormErrors, TaskForm};
use crate::types::{Task, TaskStatus, TaskStatusChange};
use axum::response::Html;

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Assemble a full page from the base shell.
pub fn page(title: &str, username: Option<&str>, content: &str) -> Html<String> {
    let nav = match username {
        Some(name) => format!(
            r#"<a href="/tasks">Tasks</a>
            <a href="/tasks/completed">Completed</a>
            <a href="/tasks/all">All</a>
            <a href="/tasks/new">New task</a>
            <span class="spacer"></span>
            <span class="whoami">{}</span>
            <form class="inline" method="post" action="/user/logout"><button class="link" type="submit">Log out</button></form>"#,
            html_escape(name)
        ),
        None => r#"<span class="spacer"></span>
            <a href="/user/login">Log in</a>
            <a href="/user/signup">Sign up</a>"#
            .to_string(),
    };

    Html(
        templates::BASE_TEMPLATE
            .replace("%TITLE%", &html_escape(title))
            .replace("%NAV%", &nav)
            .replace("%CONTENT%", content),
    )
}

/// Format an epoch-millisecond timestamp for display.
pub fn format_timestamp(ms: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

fn badge_class(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "badge-pending",
        TaskStatus::InProgress => "badge-info",
        TaskStatus::Completed => "badge-success",
        TaskStatus::Cancelled => "badge-warning",
    }
}

pub fn status_badge(status: TaskStatus) -> String {
    format!(
        r#"<span class="badge {}">{}</span>"#,
        badge_class(status),
        status.as_str()
    )
}

/// Render a task table. Row actions (edit/complete/delete) are shown for the
/// active list only.
pub fn task_table(tasks: &[Task], with_actions: bool) -> String {
    if tasks.is_empty() {
        return r#"<div class="empty-state">No tasks found</div>"#.to_string();
    }

    let actions_header = if with_actions { "<th>Actions</th>" } else { "" };
    let mut html = format!(
        "<table><thead><tr><th>Priority</th><th>Title</th><th>Status</th><th>Created</th>{}</tr></thead><tbody>",
        actions_header
    );

    for task in tasks {
        let actions = if with_actions {
            format!(
                r#"<td>
                    <a href="/tasks/{id}/edit">Edit</a>
                    <form class="inline" method="post" action="/tasks/{id}/complete"><button class="link" type="submit">Complete</button></form>
                    <form class="inline" method="post" action="/tasks/{id}/delete"><button class="link" type="submit">Delete</button></form>
                </td>"#,
                id = task.id
            )
        } else {
            String::new()
        };

        html.push_str(&format!(
            r#"<tr>
                <td>{priority}</td>
                <td><a href="/tasks/{id}">{title}</a></td>
                <td>{badge}</td>
                <td class="muted">{created}</td>
                {actions}
            </tr>"#,
            priority = task.priority,
            id = task.id,
            title = html_escape(&task.title),
            badge = status_badge(task.status),
            created = format_timestamp(task.created_at),
            actions = actions,
        ));
    }

    html.push_str("</tbody></table>");
    html
}

/// Render pagination controls. Empty when everything fits on one page.
/// The search term survives into the page links.
pub fn pagination(base: &str, result: &TaskListResult, search: Option<&str>) -> String {
    if result.total_pages <= 1 {
        return String::new();
    }

    let search_suffix = search
        .filter(|s| !s.is_empty())
        .map(|s| format!("&search={}", urlencoding::encode(s)))
        .unwrap_or_default();

    let link = |n: i64, label: &str| {
        format!(
            r#"<a href="{}?page={}{}">{}</a>"#,
            base, n, search_suffix, label
        )
    };

    let start = (result.page - 1) * result.limit + 1;
    let end = (start - 1 + result.tasks.len() as i64).min(result.total);

    let mut controls = String::new();
    if result.page > 1 {
        controls.push_str(&link(1, "First"));
        controls.push_str(&link(result.page - 1, "Prev"));
    }
    controls.push_str(&format!(
        r#"<span class="current">{}</span>"#,
        result.page
    ));
    if result.page < result.total_pages {
        controls.push_str(&link(result.page + 1, "Next"));
        controls.push_str(&link(result.total_pages, "Last"));
    }

    format!(
        r#"<div class="pagination">
            <div class="pagination-info">Showing {start} - {end} of {total} tasks</div>
            <div class="pagination-controls">{controls}</div>
        </div>"#,
        start = start,
        end = end,
        total = result.total,
        controls = controls,
    )
}

fn field_error(errors: &FormErrors, field: &str) -> String {
    match errors.get(field) {
        Some(message) => format!(r#"<div class="field-error">{}</div>"#, html_escape(message)),
        None => String::new(),
    }
}

/// Render the task create/edit form with submitted values and field errors.
pub fn task_form(heading: &str, action: &str, form: &TaskForm, errors: &FormErrors) -> String {
    let current_status = form.status.trim();
    let options: String = TaskStatus::all()
        .iter()
        .map(|status| {
            let selected = if status.as_str() == current_status
                || (current_status.is_empty() && *status == TaskStatus::default())
            {
                " selected"
            } else {
                ""
            };
            format!(
                r#"<option value="{value}"{selected}>{value}</option>"#,
                value = status.as_str(),
                selected = selected,
            )
        })
        .collect();

    let checked = if form.completed.is_some() {
        " checked"
    } else {
        ""
    };

    format!(
        r#"<div class="card">
            <h1>{heading}</h1>
            <form method="post" action="{action}">
                <label for="title">Title</label>
                <input type="text" id="title" name="title" value="{title}">
                {title_error}
                <label for="description">Description</label>
                <textarea id="description" name="description" rows="4">{description}</textarea>
                <label for="priority">Priority</label>
                <input type="number" id="priority" name="priority" min="1" value="{priority}">
                {priority_error}
                <label for="status">Status</label>
                <select id="status" name="status">{options}</select>
                {status_error}
                <label for="completed"><input type="checkbox" id="completed" name="completed"{checked}> Completed</label>
                <button type="submit">Save</button>
            </form>
        </div>"#,
        heading = html_escape(heading),
        action = action,
        title = html_escape(&form.title),
        title_error = field_error(errors, "title"),
        description = html_escape(&form.description),
        priority = html_escape(&form.priority),
        priority_error = field_error(errors, "priority"),
        options = options,
        status_error = field_error(errors, "status"),
        checked = checked,
    )
}

/// Render the login form.
pub fn login_form(username: &str, error: Option<&str>, notice: Option<&str>) -> String {
    let error_html = error
        .map(|e| format!(r#"<div class="form-error">{}</div>"#, html_escape(e)))
        .unwrap_or_default();
    let notice_html = notice
        .map(|n| format!(r#"<div class="notice">{}</div>"#, html_escape(n)))
        .unwrap_or_default();

    format!(
        r#"<div class="card">
            <h1>Log in</h1>
            {notice_html}
            {error_html}
            <form method="post" action="/user/login">
                <label for="username">Username</label>
                <input type="text" id="username" name="username" value="{username}">
                <label for="password">Password</label>
                <input type="password" id="password" name="password">
                <button type="submit">Log in</button>
            </form>
            <p class="muted">No account? <a href="/user/signup">Sign up</a></p>
        </div>"#,
        notice_html = notice_html,
        error_html = error_html,
        username = html_escape(username),
    )
}

/// Render the registration form.
pub fn signup_form(username: &str, errors: &FormErrors) -> String {
    format!(
        r#"<div class="card">
            <h1>Sign up</h1>
            <form method="post" action="/user/signup">
                <label for="username">Username</label>
                <input type="text" id="username" name="username" value="{username}">
                {username_error}
                <label for="password">Password</label>
                <input type="password" id="password" name="password">
                {password_error}
                <label for="password_confirm">Confirm password</label>
                <input type="password" id="password_confirm" name="password_confirm">
                {confirm_error}
                <button type="submit">Create account</button>
            </form>
            <p class="muted">Already registered? <a href="/user/login">Log in</a></p>
        </div>"#,
        username = html_escape(username),
        username_error = field_error(errors, "username"),
        password_error = field_error(errors, "password"),
        confirm_error = field_error(errors, "password_confirm"),
    )
}

/// Render the task detail page with its status history.
pub fn task_detail(task: &Task, history: &[TaskStatusChange]) -> String {
    let history_html = if history.is_empty() {
        r#"<div class="empty-state">No status changes recorded</div>"#.to_string()
    } else {
        let mut rows = String::from(
            "<table><thead><tr><th>From</th><th>To</th><th>When</th></tr></thead><tbody>",
        );
        for change in history {
            rows.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td class=\"muted\">{}</td></tr>",
                status_badge(change.old_status),
                status_badge(change.new_status),
                format_timestamp(change.changed_at),
            ));
        }
        rows.push_str("</tbody></table>");
        rows
    };

    format!(
        r#"<div class="card">
            <h1>{title}</h1>
            <p>{description}</p>
            <p>Priority: <strong>{priority}</strong> &middot; Status: {badge} &middot; Created: <span class="muted">{created}</span></p>
            <a href="/tasks/{id}/edit">Edit</a>
            <form class="inline" method="post" action="/tasks/{id}/complete"><button class="link" type="submit">Complete</button></form>
            <form class="inline" method="post" action="/tasks/{id}/delete"><button class="link" type="submit">Delete</button></form>
        </div>
        <div class="card">
            <h2>Status history</h2>
            {history}
        </div>"#,
        title = html_escape(&task.title),
        description = html_escape(&task.description),
        priority = task.priority,
        badge = status_badge(task.status),
        created = format_timestamp(task.created_at),
        id = task.id,
        history = history_html,
    )
}

/// Render a plain error page body.
pub fn error_message(message: &str) -> String {
    format!(
        r#"<div class="card"><div class="form-error">{}</div><p><a href="/tasks">Back to tasks</a></p></div>"#,
        html_escape(message)
    )
}
