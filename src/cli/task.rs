//! Task command implementations.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Filter, Task, TaskCounts};
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::App;

#[derive(Serialize)]
struct TaskView {
    id: i64,
    text: String,
    completed: bool,
    order: i64,
    expanded: bool,
    subtask_count: usize,
    completed_subtask_count: usize,
    completion_percentage: u32,
}

impl TaskView {
    fn build(app: &App, task: &Task) -> Self {
        Self {
            id: task.id,
            text: task.text.clone(),
            completed: task.completed,
            order: task.order,
            expanded: task.expanded,
            subtask_count: app.tasks.subtask_count(task.id),
            completed_subtask_count: app.tasks.completed_subtask_count(task.id),
            completion_percentage: app.tasks.completion_percentage(task.id),
        }
    }

    fn line(&self) -> String {
        let mark = if self.completed { "x" } else { " " };
        let mut line = format!("[{}] {} (id {})", mark, self.text, self.id);
        if self.subtask_count > 0 {
            line.push_str(&format!(
                " [{}/{} subtasks, {}%]",
                self.completed_subtask_count, self.subtask_count, self.completion_percentage
            ));
        }
        line
    }
}

pub fn add(app: &App, text: &str, options: OutputOptions) -> Result<()> {
    app.tasks.add_task(text)?;

    #[derive(Serialize)]
    struct AddReport {
        added: bool,
        total: usize,
    }

    let counts = app.tasks.counts();
    let added = !text.trim().is_empty();
    let report = AddReport {
        added,
        total: counts.total,
    };

    let mut human = HumanOutput::new(if added {
        format!("Added: {}", text.trim())
    } else {
        "Nothing to add (empty text)".to_string()
    });
    human.push_summary("total", counts.total.to_string());
    emit_success(options, "add", &report, Some(&human))
}

pub fn list(app: &App, filter: &str, options: OutputOptions) -> Result<()> {
    let filter: Filter = filter.parse()?;
    let tasks = app.tasks.filtered_tasks(filter);
    let views: Vec<TaskView> = tasks.iter().map(|t| TaskView::build(app, t)).collect();

    let mut human = HumanOutput::new(format!("Tasks ({filter})"));
    if views.is_empty() {
        human.push_detail("none");
    }
    for view in &views {
        human.push_detail(view.line());
    }
    emit_success(options, "list", &views, Some(&human))
}

pub fn toggle(app: &App, id: i64, options: OutputOptions) -> Result<()> {
    let task = app.tasks.task_by_id(id).ok_or(Error::TaskNotFound(id))?;
    app.tasks.toggle_completion(id)?;

    let completed = !task.completed;
    let mut human = HumanOutput::new(format!(
        "{}: {}",
        if completed { "Completed" } else { "Reopened" },
        task.text
    ));
    human.push_summary("id", id.to_string());

    #[derive(Serialize)]
    struct ToggleReport {
        id: i64,
        completed: bool,
    }

    emit_success(options, "toggle", &ToggleReport { id, completed }, Some(&human))
}

pub fn expand(app: &App, id: i64, options: OutputOptions) -> Result<()> {
    let task = app.tasks.task_by_id(id).ok_or(Error::TaskNotFound(id))?;
    app.tasks.toggle_expansion(id)?;

    let expanded = !task.expanded;

    #[derive(Serialize)]
    struct ExpandReport {
        id: i64,
        expanded: bool,
    }

    let human = HumanOutput::new(format!(
        "{} subtask panel for: {}",
        if expanded { "Opened" } else { "Closed" },
        task.text
    ));
    emit_success(options, "expand", &ExpandReport { id, expanded }, Some(&human))
}

pub fn delete(app: &App, id: i64, keep_subtasks: bool, options: OutputOptions) -> Result<()> {
    let task = app.tasks.task_by_id(id).ok_or(Error::TaskNotFound(id))?;

    // Two-phase lifecycle driven back to back; a terminal has no fall
    // animation to wait for. Cascading is the caller's job, done here.
    app.tasks.begin_delete(id)?;
    app.tasks.finish_delete(id)?;
    let cascaded = if keep_subtasks {
        0
    } else {
        let count = app.subtasks.subtask_count(id);
        app.subtasks.delete_for_task(id)?;
        count
    };

    #[derive(Serialize)]
    struct DeleteReport {
        id: i64,
        cascaded_subtasks: usize,
    }

    let mut human = HumanOutput::new(format!("Deleted: {}", task.text));
    if cascaded > 0 {
        human.push_summary("subtasks removed", cascaded.to_string());
    }
    emit_success(
        options,
        "delete",
        &DeleteReport {
            id,
            cascaded_subtasks: cascaded,
        },
        Some(&human),
    )
}

pub fn move_task(app: &App, from: usize, to: usize, options: OutputOptions) -> Result<()> {
    app.tasks.reorder(from, to)?;

    #[derive(Serialize)]
    struct MoveReport {
        from: usize,
        to: usize,
    }

    let human = HumanOutput::new(format!("Moved task from position {from} to {to}"));
    emit_success(options, "move", &MoveReport { from, to }, Some(&human))
}

pub fn clear(app: &App, options: OutputOptions) -> Result<()> {
    let before = app.tasks.counts();
    app.tasks.clear_completed()?;
    let after = app.tasks.counts();

    #[derive(Serialize)]
    struct ClearReport {
        removed: usize,
        remaining: usize,
    }

    let removed = before.total - after.total;
    let mut human = HumanOutput::new(format!("Cleared {removed} completed task(s)"));
    human.push_summary("remaining", after.total.to_string());
    emit_success(
        options,
        "clear",
        &ClearReport {
            removed,
            remaining: after.total,
        },
        Some(&human),
    )
}

pub fn counts(app: &App, options: OutputOptions) -> Result<()> {
    let counts: TaskCounts = app.tasks.counts();

    let mut human = HumanOutput::new("Task counts");
    human.push_summary("active", counts.active.to_string());
    human.push_summary("completed", counts.completed.to_string());
    human.push_summary("total", counts.total.to_string());
    emit_success(options, "counts", &counts, Some(&human))
}

pub fn show(app: &App, id: i64, options: OutputOptions) -> Result<()> {
    let task = app.tasks.task_by_id(id).ok_or(Error::TaskNotFound(id))?;
    let view = TaskView::build(app, &task);

    #[derive(Serialize)]
    struct ShowReport {
        #[serde(flatten)]
        task: TaskView,
        subtasks: Vec<crate::model::Subtask>,
    }

    let subtasks = app.subtasks.subtasks_for_task(id);
    let mut human = HumanOutput::new(view.line());
    for subtask in &subtasks {
        let mark = if subtask.completed { "x" } else { " " };
        human.push_detail(format!("[{}] {} (id {})", mark, subtask.text, subtask.id));
    }

    emit_success(
        options,
        "show",
        &ShowReport {
            task: view,
            subtasks,
        },
        Some(&human),
    )
}
