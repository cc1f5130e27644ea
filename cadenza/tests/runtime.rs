mod common;

use cadenza::time::sleep_until;
use cadenza::{Channel, Deadline, Error, RuntimeBuilder, task, yield_now};

use std::cell::Cell;
use std::rc::Rc;

#[test]
fn block_on_returns_output() {
    common::init_tracing();

    let rt = RuntimeBuilder::new().build();

    assert_eq!(rt.block_on(async { 42 }), Ok(42));
    assert_eq!(rt.block_on(async { "again" }), Ok("again"));
}

#[test]
fn blocked_root_reports_deadlock() {
    let rt = RuntimeBuilder::new().name("deadlock").build();

    let result = rt.block_on(async {
        let ch = Channel::<u8>::new(0).unwrap();
        ch.recv(Deadline::Never).await
    });

    assert_eq!(result, Err(Error::Deadlock));
    assert_eq!(rt.live_tasks(), 0);
}

#[test]
fn tasks_spawned_before_block_on_run_inside_it() {
    let rt = RuntimeBuilder::new().build();
    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();

    let handle = rt.spawn(async move { flag.set(true) }).unwrap();
    assert!(!ran.get());

    rt.block_on(async move { handle.join().await }).unwrap().unwrap();
    assert!(ran.get());
}

#[test]
fn unfinished_tasks_survive_until_runtime_drop() {
    let rt = RuntimeBuilder::new().build();
    let dropped = Rc::new(Cell::new(false));

    struct SetOnDrop(Rc<Cell<bool>>);

    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    let guard = SetOnDrop(dropped.clone());
    let handle = rt
        .block_on(async move {
            let handle = task::spawn(async move {
                let _guard = guard;
                let _ = sleep_until(Deadline::Never).await;
            })
            .unwrap();

            yield_now().await.unwrap();
            handle
        })
        .unwrap();

    assert_eq!(rt.live_tasks(), 1);
    assert!(!handle.is_finished());

    drop(rt);

    assert!(dropped.get());
    assert!(handle.is_finished());
}

#[test]
fn task_limit_comes_from_builder() {
    let rt = RuntimeBuilder::new().max_tasks(1).build();

    let first = rt.spawn(async {}).unwrap();
    assert_eq!(rt.spawn(async {}).map(|h| h.id()), Err(Error::ResourceExhausted));

    rt.block_on(first.join()).unwrap().unwrap();
    assert!(rt.spawn(async {}).is_ok());
}

#[test]
#[should_panic(expected = "max_tasks must be > 0")]
fn zero_task_limit_panics() {
    let _ = RuntimeBuilder::new().max_tasks(0);
}

#[test]
#[should_panic(expected = "must be called within the context of a cadenza runtime")]
fn spawn_outside_runtime_panics() {
    let _ = task::spawn(async {});
}
