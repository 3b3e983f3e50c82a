//! Integration tests for the hsms-core public API.
//!
//! These tests play the part of a connection layer: they build primary
//! messages, keep them until a reply arrives, and run the completion of the
//! matching request.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use hsms_core::{
    ContextCounter, DataItem, DataMessage, DataMessageBuilder, Message, MessageDefaults,
    MessageError, MessageKind,
};

/// Installs a test-friendly subscriber once; later calls are no-ops.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("hsms_core=trace"))
        .with_test_writer()
        .try_init();
}

/// Minimal stand-in for the connection's table of outstanding requests.
#[derive(Default)]
struct Outstanding {
    by_context: HashMap<u32, DataMessage>,
}

impl Outstanding {
    fn send(&mut self, request: DataMessage) {
        if request.is_reply_required() {
            self.by_context.insert(request.context(), request);
        }
    }

    fn receive(&mut self, reply: &DataMessage) -> bool {
        let Some(request) = self.by_context.remove(&reply.context()) else {
            return false;
        };
        request
            .as_primary()
            .is_some_and(|primary| primary.complete_with(reply))
    }
}

#[test]
fn test_request_reply_exchange_runs_completion_once() {
    init_tracing();

    // Arrange
    let completed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&completed);
    let mut builder = DataMessage::builder();
    builder
        .stream_function("S1F3W")
        .unwrap()
        .description("selected status request")
        .items(vec![DataItem::list(vec![DataItem::u4(vec![1001])])])
        .complete(move |reply: &DataMessage| {
            sink.lock().expect("lock").push(reply.to_long_string());
        });
    let request = builder.build();
    let mut connection = Outstanding::default();
    connection.send(request.clone());

    // Act – the equipment answers
    let mut answer = DataMessage::builder();
    answer
        .reply(&request)
        .unwrap()
        .reply_expected(false)
        .items(vec![DataItem::list(vec![DataItem::ascii("IDLE")])]);
    let reply = answer.build();
    let first = connection.receive(&reply);
    let second = connection.receive(&reply);

    // Assert
    assert!(first);
    assert!(!second, "a request completes at most once");
    let completed = completed.lock().expect("lock");
    assert_eq!(
        completed.as_slice(),
        &["S1F4  \n  <L[1]\n    <A[4] \"IDLE\">\n  >.".to_string()]
    );
}

#[test]
fn test_reply_to_s3f5_correlates() {
    // Arrange
    let mut builder = DataMessage::builder();
    builder.stream(3).unwrap().func(5).unwrap().context(77).unwrap();
    let request = builder.build();

    // Act
    let reply = DataMessage::builder().reply(&request).unwrap().build();

    // Assert
    assert_eq!((reply.stream(), reply.func(), reply.context()), (3, 6, 77));
    assert_eq!(reply.to_string(), "S3F6  W");
    assert!(request.as_primary().expect("primary").correlates(&reply));
}

#[test]
fn test_generated_contexts_are_unique_across_threads() {
    init_tracing();

    // Arrange
    let contexts = Arc::new(ContextCounter::new());
    let threads = 8;
    let per_thread = 500;

    // Act
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let contexts = Arc::clone(&contexts);
            thread::spawn(move || {
                let mut builder = DataMessageBuilder::with_contexts(contexts);
                builder.stream(6).unwrap().func(11).unwrap();
                (0..per_thread)
                    .map(|_| builder.build().context())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let all: HashSet<u32> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("thread panicked"))
        .collect();

    // Assert
    assert_eq!(all.len(), threads * per_thread);
    assert!(!all.contains(&0));
}

#[test]
fn test_process_wide_contexts_are_unique() {
    let mut builder = DataMessage::builder();
    builder.func(1).unwrap();

    let contexts: HashSet<u32> = (0..1000).map(|_| builder.build().context()).collect();

    assert_eq!(contexts.len(), 1000);
}

#[test]
fn test_copy_on_a_connection_never_reuses_an_outstanding_context() {
    init_tracing();

    // Arrange
    let defaults = MessageDefaults::default();
    let contexts = Arc::new(defaults.context_counter().expect("counter"));
    let mut builder = defaults.builder(Arc::clone(&contexts)).expect("builder");
    builder.stream_function("S2F41W").expect("header");
    let mut connection = Outstanding::default();
    for _ in 0..50 {
        connection.send(builder.build());
    }
    let resend = connection.by_context[&50].copy();

    // Act
    let in_flight = connection.by_context.contains_key(&resend.context());
    connection.send(resend);

    // Assert
    assert!(!in_flight);
    assert_eq!(connection.by_context.len(), 51);
}

#[test]
fn test_reply_fields_match_the_request() {
    let mut builder = DataMessage::builder();
    builder.stream_function("S1F1W").unwrap().device(4).unwrap();
    let request = builder.build();

    let reply = DataMessage::builder().reply(&request).unwrap().build();
    let fields = reply.as_reply().expect("even func is a reply").fields();

    assert_eq!(fields.context(), request.context());
    assert_eq!((fields.stream(), fields.func()), (1, 2));
    assert_eq!(fields.device(), 0, "reply does not copy the device");
}

#[test]
fn test_copy_produces_new_conversation() {
    let mut builder = DataMessage::builder();
    builder
        .device(2)
        .unwrap()
        .stream(2)
        .unwrap()
        .func(41)
        .unwrap()
        .items(vec![DataItem::ascii("PP-SELECT")]);
    let original = builder.build();

    let copies: Vec<DataMessage> = (0..10).map(|_| original.copy()).collect();

    let contexts: HashSet<u32> = copies.iter().map(DataMessage::context).collect();
    assert_eq!(contexts.len(), 10);
    assert!(!contexts.contains(&original.context()));
    assert!(copies.iter().all(|c| c.items() == original.items()));
}

#[test]
fn test_mixed_item_input_keeps_only_items() {
    let entries: Vec<Box<dyn Any + Send>> = vec![
        Box::new(DataItem::u2(vec![1])),
        Box::new("ignored"),
        Box::new(DataItem::u2(vec![2])),
        Box::new(Some(3_u8)),
    ];
    let mut builder = DataMessage::builder();

    builder.func(2).unwrap().items(entries);

    assert_eq!(
        builder.build().items(),
        &[DataItem::u2(vec![1]), DataItem::u2(vec![2])]
    );
}

#[test]
fn test_messages_dispatch_through_trait_objects() {
    // Arrange
    let mut builder = DataMessage::builder();
    builder.device(10).unwrap().func(1).unwrap().context(5).unwrap();
    let msg = builder.build();

    // Act
    let as_trait: &dyn Message = &msg;

    // Assert
    assert_eq!(as_trait.kind(), MessageKind::DataMessage);
    assert_eq!(as_trait.device(), 10);
    assert_eq!(as_trait.context(), 5);
    assert!(msg.equals(as_trait));
}

#[test]
fn test_construction_errors_from_builder_slices() {
    let none: [DataMessageBuilder; 0] = [];
    let two = [DataMessageBuilder::new(), DataMessageBuilder::new()];

    assert_eq!(
        DataMessage::try_from(&none[..]).unwrap_err(),
        MessageError::MissingBuilder
    );
    assert_eq!(
        DataMessage::try_from(&two[..]).unwrap_err(),
        MessageError::TooManyArguments { count: 2 }
    );
}

#[test]
fn test_defaults_seed_a_connection() {
    init_tracing();

    // Arrange
    let defaults = MessageDefaults::from_toml_str(
        "[builder]\ndevice = 3\ndescription = \"cvd-02\"\n\n[context]\nstart = 7000\n",
    )
    .expect("valid defaults");
    let contexts = Arc::new(defaults.context_counter().expect("counter"));
    let sent = Arc::new(AtomicUsize::new(0));

    // Act
    let messages: Vec<DataMessage> = ["S1F1", "S2F13", "S5F3"]
        .iter()
        .map(|header| {
            let mut builder = defaults.builder(Arc::clone(&contexts)).expect("builder");
            builder.stream_function(header).expect("header");
            sent.fetch_add(1, Ordering::Relaxed);
            builder.build()
        })
        .collect();

    // Assert
    let contexts: Vec<u32> = messages.iter().map(DataMessage::context).collect();
    assert_eq!(contexts, vec![7000, 7001, 7002]);
    assert!(messages.iter().all(|m| m.device() == 3 && m.description() == "cvd-02"));
    assert_eq!(sent.load(Ordering::Relaxed), 3);
}
