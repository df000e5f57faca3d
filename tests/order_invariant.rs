//! After any mutating operation settles, order values within a scope are
//! exactly the dense sequence 0..n-1.

mod support;

use support::{assert_dense, TestApp};

#[test]
fn task_orders_stay_dense_through_add_delete_reorder_clear() {
    let app = TestApp::new();

    let a = app.add_task("a");
    app.add_task("b");
    let c = app.add_task("c");
    app.add_task("d");
    assert_dense(&app.task_orders());

    app.tasks.begin_delete(c).unwrap();
    app.tasks.finish_delete(c).unwrap();
    assert_dense(&app.task_orders());

    app.tasks.reorder(0, 2).unwrap();
    assert_dense(&app.task_orders());

    app.tasks.toggle_completion(a).unwrap();
    app.tasks.clear_completed().unwrap();
    assert_dense(&app.task_orders());

    app.add_task("e");
    assert_dense(&app.task_orders());
}

#[test]
fn subtask_orders_stay_dense_per_parent() {
    let app = TestApp::new();
    let left = app.add_task("left");
    let right = app.add_task("right");

    let l1 = app.add_subtask(left, "l1");
    app.add_subtask(left, "l2");
    let l3 = app.add_subtask(left, "l3");
    app.add_subtask(right, "r1");
    app.add_subtask(right, "r2");
    assert_dense(&app.subtask_orders(left));
    assert_dense(&app.subtask_orders(right));

    app.subtasks.begin_delete(l1).unwrap();
    app.subtasks.finish_delete(l1, left).unwrap();
    assert_dense(&app.subtask_orders(left));
    assert_dense(&app.subtask_orders(right));

    app.subtasks.reorder(left, 1, 0).unwrap();
    assert_dense(&app.subtask_orders(left));

    app.subtasks.toggle_completion(l3, left).unwrap();
    app.subtasks.clear_completed(left).unwrap();
    assert_dense(&app.subtask_orders(left));
    assert_dense(&app.subtask_orders(right));
}

#[test]
fn deleting_a_falling_entity_twice_settles_cleanly() {
    let app = TestApp::new();
    let a = app.add_task("a");
    app.add_task("b");

    // The second finish runs against a collection the first already settled.
    app.tasks.begin_delete(a).unwrap();
    app.tasks.finish_delete(a).unwrap();
    app.tasks.finish_delete(a).unwrap();

    assert_eq!(app.tasks.current_tasks().len(), 1);
    assert_dense(&app.task_orders());
}

#[test]
fn reorder_scenario_from_front_to_back() {
    let app = TestApp::new();
    app.add_task("A");
    app.add_task("B");
    app.add_task("C");

    app.tasks.reorder(0, 2).unwrap();

    let sorted = app.tasks.filtered_tasks(tumble::model::Filter::All);
    let names: Vec<&str> = sorted.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(names, vec!["B", "C", "A"]);
    assert_eq!(
        sorted.iter().map(|t| t.order).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}
