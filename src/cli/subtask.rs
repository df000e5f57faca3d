//! Subtask command implementations.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::Subtask;
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::App;

fn subtask_line(subtask: &Subtask) -> String {
    let mark = if subtask.completed { "x" } else { " " };
    format!("[{}] {} (id {})", mark, subtask.text, subtask.id)
}

fn require_task(app: &App, task_id: i64) -> Result<()> {
    if app.tasks.task_exists(task_id) {
        Ok(())
    } else {
        Err(Error::TaskNotFound(task_id))
    }
}

fn require_subtask(app: &App, task_id: i64, id: i64) -> Result<Subtask> {
    app.subtasks
        .subtasks_for_task(task_id)
        .into_iter()
        .find(|s| s.id == id)
        .ok_or(Error::SubtaskNotFound(id))
}

pub fn add(app: &App, task_id: i64, text: &str, options: OutputOptions) -> Result<()> {
    require_task(app, task_id)?;
    app.subtasks.add_subtask(task_id, text)?;

    #[derive(Serialize)]
    struct AddReport {
        task_id: i64,
        added: bool,
        count: usize,
    }

    let added = !text.trim().is_empty();
    let count = app.subtasks.subtask_count(task_id);
    let mut human = HumanOutput::new(if added {
        format!("Added subtask: {}", text.trim())
    } else {
        "Nothing to add (empty text)".to_string()
    });
    human.push_summary("task", task_id.to_string());
    human.push_summary("subtasks", count.to_string());

    emit_success(
        options,
        "sub add",
        &AddReport {
            task_id,
            added,
            count,
        },
        Some(&human),
    )
}

pub fn list(app: &App, task_id: i64, options: OutputOptions) -> Result<()> {
    require_task(app, task_id)?;
    let subtasks = app.subtasks.subtasks_for_task(task_id);

    let mut human = HumanOutput::new(format!(
        "Subtasks of task {} ({}% complete)",
        task_id,
        app.subtasks.completion_percentage(task_id)
    ));
    if subtasks.is_empty() {
        human.push_detail("none");
    }
    for subtask in &subtasks {
        human.push_detail(subtask_line(subtask));
    }
    emit_success(options, "sub list", &subtasks, Some(&human))
}

pub fn toggle(app: &App, task_id: i64, id: i64, options: OutputOptions) -> Result<()> {
    let subtask = require_subtask(app, task_id, id)?;
    app.subtasks.toggle_completion(id, task_id)?;

    #[derive(Serialize)]
    struct ToggleReport {
        id: i64,
        task_id: i64,
        completed: bool,
        parent_completed: bool,
    }

    let completed = !subtask.completed;
    let parent_completed = app
        .tasks
        .task_by_id(task_id)
        .map(|t| t.completed)
        .unwrap_or(false);

    let mut human = HumanOutput::new(format!(
        "{}: {}",
        if completed { "Completed" } else { "Reopened" },
        subtask.text
    ));
    if parent_completed {
        human.push_detail("parent task is now complete".to_string());
    }

    emit_success(
        options,
        "sub toggle",
        &ToggleReport {
            id,
            task_id,
            completed,
            parent_completed,
        },
        Some(&human),
    )
}

pub fn delete(app: &App, task_id: i64, id: i64, options: OutputOptions) -> Result<()> {
    let subtask = require_subtask(app, task_id, id)?;

    app.subtasks.begin_delete(id)?;
    app.subtasks.finish_delete(id, task_id)?;

    #[derive(Serialize)]
    struct DeleteReport {
        id: i64,
        task_id: i64,
        remaining: usize,
    }

    let remaining = app.subtasks.subtask_count(task_id);
    let mut human = HumanOutput::new(format!("Deleted subtask: {}", subtask.text));
    human.push_summary("remaining", remaining.to_string());

    emit_success(
        options,
        "sub delete",
        &DeleteReport {
            id,
            task_id,
            remaining,
        },
        Some(&human),
    )
}

pub fn move_subtask(
    app: &App,
    task_id: i64,
    from: usize,
    to: usize,
    options: OutputOptions,
) -> Result<()> {
    require_task(app, task_id)?;
    app.subtasks.reorder(task_id, from, to)?;

    #[derive(Serialize)]
    struct MoveReport {
        task_id: i64,
        from: usize,
        to: usize,
    }

    let human = HumanOutput::new(format!(
        "Moved subtask of task {task_id} from position {from} to {to}"
    ));
    emit_success(
        options,
        "sub move",
        &MoveReport { task_id, from, to },
        Some(&human),
    )
}

pub fn clear(app: &App, task_id: i64, options: OutputOptions) -> Result<()> {
    require_task(app, task_id)?;
    let before = app.subtasks.subtask_count(task_id);
    app.subtasks.clear_completed(task_id)?;
    let after = app.subtasks.subtask_count(task_id);

    #[derive(Serialize)]
    struct ClearReport {
        task_id: i64,
        removed: usize,
        remaining: usize,
    }

    let mut human = HumanOutput::new(format!(
        "Cleared {} completed subtask(s) of task {task_id}",
        before - after
    ));
    human.push_summary("remaining", after.to_string());
    emit_success(
        options,
        "sub clear",
        &ClearReport {
            task_id,
            removed: before - after,
            remaining: after,
        },
        Some(&human),
    )
}
