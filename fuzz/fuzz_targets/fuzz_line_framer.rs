//! Fuzz target: `ByteQueue::ingest` + `codec::next_command`
//!
//! Splits arbitrary bytes into inbound messages, pushes them through the
//! bounded queue under both overflow policies and drains every frame.
//! The framer must never panic, never exceed capacity and always leave
//! the queue empty once drained.
//!
//! cargo fuzz run fuzz_line_framer

#![no_main]

use libfuzzer_sys::fuzz_target;
use servolink::config::OverflowPolicy;
use servolink::link::codec::next_command;
use servolink::link::queue::{ByteQueue, DEFAULT_CAPACITY};

fuzz_target!(|data: &[u8]| {
    for policy in [OverflowPolicy::RejectNew, OverflowPolicy::EvictOldest] {
        let mut queue: ByteQueue<DEFAULT_CAPACITY> = ByteQueue::new(policy);

        // First byte picks the message length so both tiny and oversized
        // messages get exercised.
        let (&split, rest) = match data.split_first() {
            Some(v) => v,
            None => return,
        };
        let chunk = usize::from(split).max(1) * 2;

        for message in rest.chunks(chunk) {
            let _ = queue.ingest(message);
            assert!(queue.size() <= queue.capacity());
        }

        let mut frames = 0usize;
        while next_command(&mut queue).is_some() {
            frames += 1;
            assert!(frames <= DEFAULT_CAPACITY, "framer failed to make progress");
        }
        assert!(queue.is_empty(), "ingest left an unterminated tail");
    }
});
