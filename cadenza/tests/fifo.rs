mod common;

use cadenza::{Channel, Deadline, Error, RuntimeBuilder, task};

use proptest::collection::vec;
use proptest::prelude::*;

/// Pushes `values` through a channel of `capacity` from a producer task and
/// collects what the consumer sees until the channel breaks.
fn pump(values: Vec<u32>, capacity: usize) -> Vec<u32> {
    common::init_tracing();

    let rt = RuntimeBuilder::new().build();

    rt.block_on(async move {
        let ch = Channel::new(capacity).unwrap();
        let tx = ch.duplicate();

        let producer = task::spawn(async move {
            for value in values {
                tx.send(value, Deadline::Never).await.unwrap();
            }
            tx.done().unwrap();
        })
        .unwrap();

        let mut received = Vec::new();
        loop {
            match ch.recv(Deadline::Never).await {
                Ok(value) => received.push(value),
                Err(Error::BrokenChannel) => break,
                Err(other) => panic!("unexpected receive failure: {other}"),
            }
        }

        producer.join().await.unwrap();
        received
    })
    .unwrap()
}

proptest! {
    #[test]
    fn items_arrive_in_send_order(
        values in vec(any::<u32>(), 0..64),
        capacity in 0usize..8,
    ) {
        prop_assert_eq!(pump(values.clone(), capacity), values);
    }

    #[test]
    fn buffer_never_exceeds_capacity(
        count in 0usize..32,
        capacity in 1usize..8,
    ) {
        common::init_tracing();

        let rt = RuntimeBuilder::new().build();

        let (accepted, len) = rt
            .block_on(async move {
                let ch = Channel::new(capacity).unwrap();
                let accepted = (0..count).filter(|&i| ch.try_send(i).is_ok()).count();
                (accepted, ch.len())
            })
            .unwrap();

        prop_assert_eq!(accepted, count.min(capacity));
        prop_assert_eq!(len, accepted);
    }
}
