//! End-to-end completion scenarios: filters, counts, percentages, and the
//! one-way cascade from subtasks to their parent.

mod support;

use support::TestApp;

use tumble::model::Filter;

#[test]
fn add_then_delete_scenario() {
    let app = TestApp::new();

    let milk = app.add_task("Buy milk");
    {
        let tasks = app.tasks.current_tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].order, 0);
        assert!(!tasks[0].completed);
    }

    app.add_task("Walk dog");
    assert_eq!(
        app.tasks
            .current_tasks()
            .iter()
            .find(|t| t.text == "Walk dog")
            .unwrap()
            .order,
        1
    );

    app.tasks.begin_delete(milk).unwrap();
    app.tasks.finish_delete(milk).unwrap();

    let tasks = app.tasks.current_tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].text, "Walk dog");
    assert_eq!(tasks[0].order, 0);
}

#[test]
fn two_subtask_completion_cycle() {
    let app = TestApp::new();
    let parent = app.add_task("parent");
    let one = app.add_subtask(parent, "one");
    let two = app.add_subtask(parent, "two");
    assert!(!app.tasks.task_by_id(parent).unwrap().completed);

    app.subtasks.toggle_completion(one, parent).unwrap();
    assert!(!app.tasks.task_by_id(parent).unwrap().completed);

    app.subtasks.toggle_completion(two, parent).unwrap();
    assert!(app.tasks.task_by_id(parent).unwrap().completed);

    app.subtasks.toggle_completion(one, parent).unwrap();
    assert!(!app.tasks.task_by_id(parent).unwrap().completed);
}

#[test]
fn completion_percentage_rounds_to_nearest() {
    let app = TestApp::new();
    let parent = app.add_task("parent");
    let first = app.add_subtask(parent, "a");
    app.add_subtask(parent, "b");
    app.add_subtask(parent, "c");

    app.subtasks.toggle_completion(first, parent).unwrap();
    assert_eq!(app.subtasks.completion_percentage(parent), 33);
    assert_eq!(app.tasks.completion_percentage(parent), 33);
}

#[test]
fn completing_a_task_directly_leaves_subtasks_alone() {
    let app = TestApp::new();
    let parent = app.add_task("parent");
    app.add_subtask(parent, "child");

    app.tasks.toggle_completion(parent).unwrap();
    assert!(app.tasks.task_by_id(parent).unwrap().completed);
    assert!(!app.subtasks.subtasks_for_task(parent)[0].completed);
}

#[test]
fn filters_partition_the_sorted_view() {
    let app = TestApp::new();
    app.add_task("open 1");
    let done = app.add_task("done");
    app.add_task("open 2");
    app.tasks.toggle_completion(done).unwrap();

    let all = app.tasks.filtered_tasks(Filter::All);
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].order < w[1].order));

    let active = app.tasks.filtered_tasks(Filter::Active);
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|t| !t.completed));

    let completed = app.tasks.filtered_tasks(Filter::Completed);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, done);

    let counts = app.tasks.counts();
    assert_eq!((counts.active, counts.completed, counts.total), (2, 1, 3));
}

#[test]
fn subscribers_observe_every_settled_snapshot() {
    let app = TestApp::new();
    let mut rx = app.tasks.subscribe();

    app.add_task("a");
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().len(), 1);

    let id = app.tasks.current_tasks()[0].id;
    app.tasks.begin_delete(id).unwrap();
    assert!(rx.borrow_and_update()[0].is_falling);

    app.tasks.finish_delete(id).unwrap();
    assert!(rx.borrow_and_update().is_empty());
}
