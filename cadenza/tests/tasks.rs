mod common;

use cadenza::task::{self, TaskId, TaskSet, TaskState};
use cadenza::time::{now, sleep, sleep_until};
use cadenza::{Channel, Deadline, Error, yield_now};

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

#[cadenza::test]
async fn spawned_task_runs_on_next_pass() {
    common::init_tracing();

    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();

    let handle = task::spawn(async move { flag.set(true) }).unwrap();
    assert!(!ran.get());
    assert_eq!(handle.state(), TaskState::Runnable);

    yield_now().await.unwrap();

    assert!(ran.get());
    assert!(handle.is_finished());
    handle.join().await.unwrap();
}

#[cadenza::test]
async fn tasks_take_turns_in_fifo_order() {
    let log = Rc::new(RefCell::new(Vec::new()));

    let handles: Vec<_> = ['a', 'b', 'c']
        .into_iter()
        .map(|name| {
            let log = log.clone();
            task::spawn(async move {
                log.borrow_mut().push(format!("{name}1"));
                yield_now().await.unwrap();
                log.borrow_mut().push(format!("{name}2"));
            })
            .unwrap()
        })
        .collect();

    task::cancel(handles, Deadline::Never).await.unwrap();

    assert_eq!(*log.borrow(), ["a1", "b1", "c1", "a2", "b2", "c2"]);
}

#[cadenza::test]
async fn parked_task_reports_blocked() {
    let handle = task::spawn(async {
        let _ = sleep_until(Deadline::Never).await;
    })
    .unwrap();

    yield_now().await.unwrap();
    assert_eq!(handle.state(), TaskState::Blocked);
    assert!(!handle.is_canceled());

    handle.cancel(Deadline::Immediate).await.unwrap();
}

#[cadenza::test]
async fn matched_task_reports_runnable_before_it_resumes() {
    let ch = Channel::<u8>::new(0).unwrap();
    let rx = ch.duplicate();

    let receiver = task::spawn(async move {
        assert_eq!(rx.recv(Deadline::Never).await, Ok(1));
    })
    .unwrap();

    yield_now().await.unwrap();
    assert_eq!(receiver.state(), TaskState::Blocked);

    ch.try_send(1).unwrap();
    assert_eq!(receiver.state(), TaskState::Runnable);

    yield_now().await.unwrap();
    assert!(receiver.is_finished());
    receiver.join().await.unwrap();
}

#[cadenza::test]
async fn current_id_matches_handle() {
    let seen: Rc<Cell<Option<TaskId>>> = Rc::new(Cell::new(None));
    let slot = seen.clone();

    let handle = task::spawn(async move { slot.set(task::current_id()) }).unwrap();
    let id = handle.id();

    handle.join().await.unwrap();

    assert_eq!(seen.get(), Some(id));
    assert_ne!(task::current_id(), Some(id));
    assert!(task::current_id().is_some());
}

#[cadenza::test]
async fn yield_fails_once_canceled() {
    let turns = Rc::new(Cell::new(0));
    let counter = turns.clone();

    let spinner = task::spawn(async move {
        while yield_now().await.is_ok() {
            counter.set(counter.get() + 1);
        }
    })
    .unwrap();

    for _ in 0..3 {
        yield_now().await.unwrap();
    }

    spinner.cancel(Deadline::Immediate).await.unwrap();

    assert!(turns.get() >= 2);
}

#[cadenza::test]
async fn cancel_at_future_deadline() {
    let outcome = Rc::new(Cell::new(None));
    let slot = outcome.clone();

    let sleeper = task::spawn(async move {
        slot.set(Some(sleep_until(Deadline::Never).await));
    })
    .unwrap();

    let start = now();
    sleeper
        .cancel(Deadline::after(Duration::from_millis(20)))
        .await
        .unwrap();

    assert!(start.elapsed() >= Duration::from_millis(20));
    assert_eq!(outcome.get(), Some(Err(Error::Canceled)));
}

#[cadenza::test]
async fn task_finishing_before_deadline_is_not_canceled() {
    let outcome = Rc::new(Cell::new(None));
    let slot = outcome.clone();

    let worker = task::spawn(async move {
        slot.set(Some(sleep(Duration::from_millis(5)).await));
    })
    .unwrap();

    let start = now();
    worker
        .cancel(Deadline::after(Duration::from_secs(5)))
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(outcome.get(), Some(Ok(())));
}

#[cadenza::test]
async fn join_waits_for_natural_completion() {
    let done = Rc::new(Cell::new(false));
    let flag = done.clone();

    let worker = task::spawn(async move {
        sleep(Duration::from_millis(10)).await.unwrap();
        flag.set(true);
    })
    .unwrap();

    worker.join().await.unwrap();
    assert!(done.get());
}

#[cadenza::test]
async fn sleep_with_elapsed_deadline_returns_at_once() {
    sleep_until(Deadline::Immediate).await.unwrap();
    sleep_until(Deadline::at(now())).await.unwrap();
    sleep(Duration::ZERO).await.unwrap();
}

#[cadenza::test]
async fn sleep_waits_for_deadline() {
    let start = now();
    sleep(Duration::from_millis(15)).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(15));
}

#[cadenza::test]
async fn canceled_joiner_escalates_and_still_joins() {
    let inner_outcome = Rc::new(Cell::new(None));
    let outer_outcome = Rc::new(Cell::new(None));

    let inner_slot = inner_outcome.clone();
    let outer_slot = outer_outcome.clone();

    let outer = task::spawn(async move {
        let inner = task::spawn(async move {
            inner_slot.set(Some(sleep_until(Deadline::Never).await));
        })
        .unwrap();

        outer_slot.set(Some(task::cancel([inner], Deadline::Never).await));
    })
    .unwrap();

    for _ in 0..3 {
        yield_now().await.unwrap();
    }

    outer.cancel(Deadline::Immediate).await.unwrap();

    assert_eq!(inner_outcome.get(), Some(Err(Error::Canceled)));
    assert_eq!(outer_outcome.get(), Some(Err(Error::Canceled)));
}

#[cadenza::test]
async fn cancel_joins_a_whole_group() {
    let canceled = Rc::new(Cell::new(0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let canceled = canceled.clone();
            task::spawn(async move {
                if sleep_until(Deadline::Never).await == Err(Error::Canceled) {
                    canceled.set(canceled.get() + 1);
                }
            })
            .unwrap()
        })
        .collect();

    yield_now().await.unwrap();
    task::cancel(handles, Deadline::Immediate).await.unwrap();

    assert_eq!(canceled.get(), 4);
}

#[cadenza::test]
async fn task_set_cancels_members() {
    let canceled = Rc::new(Cell::new(0));
    let mut set = TaskSet::new();

    for _ in 0..3 {
        let canceled = canceled.clone();
        set.spawn(async move {
            if sleep_until(Deadline::Never).await == Err(Error::Canceled) {
                canceled.set(canceled.get() + 1);
            }
        })
        .unwrap();
    }
    assert_eq!(set.len(), 3);

    set.cancel(Deadline::after(Duration::from_millis(5)))
        .await
        .unwrap();

    assert!(set.is_empty());
    assert_eq!(canceled.get(), 3);
}

#[cadenza::test]
async fn task_set_join_all() {
    let finished = Rc::new(Cell::new(0));
    let mut set = TaskSet::new();

    for ms in [3, 1, 2] {
        let finished = finished.clone();
        set.spawn(async move {
            sleep(Duration::from_millis(ms)).await.unwrap();
            finished.set(finished.get() + 1);
        })
        .unwrap();
    }

    set.join_all().await.unwrap();

    assert_eq!(finished.get(), 3);
    assert!(set.is_empty());
}

#[cadenza::test]
async fn dropping_task_set_cancels_members() {
    let outcome = Rc::new(Cell::new(None));

    {
        let slot = outcome.clone();
        let mut set = TaskSet::new();
        set.spawn(async move {
            slot.set(Some(sleep_until(Deadline::Never).await));
        })
        .unwrap();

        yield_now().await.unwrap();
    }

    yield_now().await.unwrap();

    assert_eq!(outcome.get(), Some(Err(Error::Canceled)));
}

#[cadenza::test(max_tasks = 2)]
async fn spawn_fails_at_task_limit() {
    let first = task::spawn(async {}).unwrap();
    let second = task::spawn(async {}).unwrap();

    assert_eq!(
        task::spawn(async {}).map(|handle| handle.id()),
        Err(Error::ResourceExhausted)
    );

    first.join().await.unwrap();

    let third = task::spawn(async {}).unwrap();
    task::cancel([second, third], Deadline::Never).await.unwrap();
}
