//! Integration tests for rxcombine
//!
//! End-to-end scenarios across subjects, futures, operators and the
//! scheduler boundary.

mod common;

use std::{
  convert::Infallible,
  sync::{Arc, Mutex},
  thread,
};

use common::{recorder, Seen};
use rxcombine::prelude::*;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Article {
  id: u64,
  title: String,
}

#[rxcombine_macro::test]
fn subject_scenario_late_subscriber_sees_finished_only() {
  let subject = PassthroughSubject::<&str>::new();
  let (a, a_handle) = recorder(Demand::UNLIMITED);
  let _a = subject.subscribe(a);

  subject.send("x");
  subject.send_completion(Completion::Finished);

  let (b, b_handle) = recorder(Demand::UNLIMITED);
  let _b = subject.subscribe(b);

  assert_eq!(
    a_handle.seen(),
    vec![Seen::Value("x"), Seen::Done(Completion::Finished)]
  );
  assert_eq!(b_handle.seen(), vec![Seen::Done(Completion::Finished)]);
}

#[rxcombine_macro::test]
fn future_scenario_early_and_late_subscribers() {
  let promise_slot = Arc::new(Mutex::new(None));
  let c_slot = promise_slot.clone();
  let future = Future::<Vec<i32>, Infallible>::new(move |promise| {
    *c_slot.lock().unwrap() = Some(promise);
  });

  let (c, c_handle) = recorder(Demand::max(1));
  let _c = future.subscribe(c);
  assert!(c_handle.seen().is_empty());

  let promise = promise_slot.lock().unwrap().take().unwrap();
  promise.succeed(vec![1, 2, 3]);

  let (d, d_handle) = recorder(Demand::max(1));
  let _d = future.subscribe(d);

  let expected = vec![Seen::Value(vec![1, 2, 3]), Seen::Done(Completion::Finished)];
  assert_eq!(c_handle.seen(), expected);
  assert_eq!(d_handle.seen(), expected);
}

#[rxcombine_macro::test]
fn subject_failure_latches_for_everyone() {
  let subject = PassthroughSubject::<i32, FetchError>::new();
  let handles: Vec<_> = (0..3)
    .map(|_| {
      let (rec, handle) = recorder(Demand::UNLIMITED);
      (subject.subscribe(rec), handle)
    })
    .collect();

  subject.send(1);
  subject.send_completion(Completion::Failure(FetchError::Cancelled));
  subject.send(2);

  for (_, handle) in &handles {
    assert_eq!(
      handle.seen(),
      vec![Seen::Value(1), Seen::Done(Completion::Failure(FetchError::Cancelled))]
    );
  }

  let (late, late_handle) = recorder(Demand::UNLIMITED);
  let _late = subject.subscribe(late);
  assert_eq!(
    late_handle.seen(),
    vec![Seen::Done(Completion::Failure(FetchError::Cancelled))]
  );
}

#[rxcombine_macro::test]
fn fetch_decode_pipeline_through_a_subject() {
  let responses = PassthroughSubject::<Bytes, FetchError>::new();
  let articles = responses
    .clone()
    .decode::<Article, _, PipelineError>(JsonDecoder::new())
    .filter(|article| article.id % 2 == 1)
    .map(|article| article.title);

  let (rec, handle) = recorder(Demand::UNLIMITED);
  let _token = articles.subscribe(rec);

  responses.send(br#"{"id": 1, "title": "one"}"#.to_vec());
  responses.send(br#"{"id": 2, "title": "two"}"#.to_vec());
  responses.send(br#"{"id": 3, "title": "three"}"#.to_vec());
  responses.send(b"<html>".to_vec());
  responses.send(br#"{"id": 5, "title": "five"}"#.to_vec());

  assert_eq!(handle.values(), vec!["one".to_string(), "three".to_string()]);
  let completions = handle.completions();
  assert_eq!(completions.len(), 1);
  assert!(matches!(
    completions[0],
    Completion::Failure(PipelineError::Decode(DecodeError::Syntax { .. }))
  ));
  assert_eq!(responses.subscriber_count(), 0);
}

#[rxcombine_macro::test]
fn demand_is_respected_end_to_end() {
  let source = Sequence::new(1..=10).map(|v| v * 10).filter(|v| *v != 30);
  let (rec, handle) = recorder(Demand::max(3));
  let _token = source.subscribe(rec);

  // 10, 20 pass; 30 is filtered but consumed the third unit.
  assert_eq!(handle.values(), vec![10, 20]);

  handle.request(Demand::max(2));
  assert_eq!(handle.values(), vec![10, 20, 40, 50]);

  handle.request(Demand::UNLIMITED);
  assert_eq!(handle.values().len(), 9);
  assert_eq!(handle.completions(), vec![Completion::Finished]);
}

#[rxcombine_macro::test]
fn cancel_twice_is_silent() {
  let subject = PassthroughSubject::<i32>::new();
  let (rec, handle) = recorder(Demand::UNLIMITED);
  let token = subject.subscribe(rec);

  token.cancel();
  token.cancel();
  drop(token);
  subject.send(1);
  subject.send_completion(Completion::Finished);

  assert!(handle.seen().is_empty());
}

#[rxcombine_macro::test]
fn erased_publishers_compose() {
  fn numbers(fail: bool) -> AnyPublisher<i32, PipelineError> {
    if fail {
      Fail::new(PipelineError::Transform("no numbers".into())).erase()
    } else {
      Sequence::new(vec![1, 2, 3]).map_err(PipelineError::from).erase()
    }
  }

  let (ok, ok_handle) = recorder(Demand::UNLIMITED);
  let _ok = numbers(false).map(|v| v + 1).subscribe(ok);
  let (err, err_handle) = recorder::<i32, PipelineError>(Demand::UNLIMITED);
  let _err = numbers(true).subscribe(err);

  assert_eq!(ok_handle.values(), vec![2, 3, 4]);
  assert_eq!(
    err_handle.completions(),
    vec![Completion::Failure(PipelineError::Transform("no numbers".into()))]
  );
}

#[rxcombine_macro::test]
fn current_value_subject_feeds_receive_on() {
  let scheduler = TestScheduler::new();
  let state = CurrentValueSubject::<u32>::new(0);
  let (rec, handle) = recorder(Demand::UNLIMITED);
  let _token = state.clone().receive_on(scheduler.clone()).subscribe(rec);

  state.send(1);
  state.send(2);
  assert!(handle.seen().is_empty());

  scheduler.run();
  assert_eq!(handle.values(), vec![0, 1, 2]);
  assert_eq!(state.value(), 2);
}

#[rxcombine_macro::test]
fn concurrent_sends_reach_every_subscriber_in_per_thread_order() {
  let subject = PassthroughSubject::<(usize, usize)>::new();
  let (rec_a, a) = recorder(Demand::UNLIMITED);
  let (rec_b, b) = recorder(Demand::UNLIMITED);
  let _a = subject.subscribe(rec_a);
  let _b = subject.subscribe(rec_b);

  let threads: Vec<_> = (0..4)
    .map(|t| {
      let subject = subject.clone();
      thread::spawn(move || {
        for i in 0..100 {
          subject.send((t, i));
        }
      })
    })
    .collect();
  for t in threads {
    t.join().unwrap();
  }

  for handle in [a, b] {
    let values = handle.values();
    assert_eq!(values.len(), 400);
    for t in 0..4 {
      let ordered: Vec<_> = values.iter().filter(|(from, _)| *from == t).map(|(_, i)| *i).collect();
      assert_eq!(ordered, (0..100).collect::<Vec<_>>());
    }
  }
}

#[rxcombine_macro::test]
fn future_resolved_on_another_thread_reaches_pending_subscribers() {
  let future = Future::<String, FetchError>::new(|promise| {
    thread::spawn(move || {
      promise.fail(FetchError::Status(502));
    });
  });

  let (tx, rx) = std::sync::mpsc::channel();
  let _token = future.sink(move |c| tx.send(c).unwrap(), |_| {});
  assert_eq!(rx.recv().unwrap(), Completion::Failure(FetchError::Status(502)));
}

#[cfg(feature = "futures-scheduler")]
#[rxcombine_macro::test]
fn thread_pool_boundary_keeps_order_and_forwards_demand() {
  let scheduler = ThreadPoolScheduler::builder()
    .pool_size(3)
    .name_prefix("integration-")
    .build()
    .unwrap();
  let collected = futures::executor::block_on(async {
    use futures::StreamExt;
    Sequence::new(0..50)
      .receive_on(scheduler)
      .into_stream()
      .collect::<Vec<_>>()
      .await
  });
  assert_eq!(collected, (0..50).map(Ok).collect::<Vec<_>>());
}

#[rxcombine_macro::test(multi)]
async fn async_bridges_work_under_tokio() {
  let subject = PassthroughSubject::<u8>::new();
  let first = subject.into_future();
  let sender = subject.clone();
  tokio::spawn(async move {
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    sender.send(7);
    sender.send_completion(Completion::Finished);
  });
  assert_eq!(first.await, Ok(Ok(7)));
}
