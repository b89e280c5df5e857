//! Fuzz target: `ReportEndpoint::set_report`
//!
//! Splits the input into SET_REPORT payloads of arbitrary length and feeds
//! them to the endpoint.  Accepted payloads must come back out of the
//! inbound queue unchanged, and the queue must never exceed its capacity.
//!
//! cargo fuzz run fuzz_report_endpoint

#![no_main]

use libfuzzer_sys::fuzz_target;
use livolo_bridge::adapters::report_endpoint::ReportEndpoint;
use livolo_bridge::protocol::record::CommandRecord;
use livolo_bridge::queue::{CommandQueues, QUEUE_CAP};

fuzz_target!(|data: &[u8]| {
    let queues = CommandQueues::new();
    let endpoint = ReportEndpoint::new(&queues);
    let mut accepted = Vec::new();

    // First byte of each chunk is its length.
    let mut rest = data;
    while let Some((&len, tail)) = rest.split_first() {
        let take = usize::from(len % 12).min(tail.len());
        let (chunk, next) = tail.split_at(take);
        if endpoint.set_report(chunk) {
            accepted.push(CommandRecord::from_bytes(chunk).expect("accepted reports parse"));
        }
        assert!(queues.inbound.len() < QUEUE_CAP);
        rest = next;
    }

    for expected in accepted {
        assert_eq!(queues.inbound.read(), Some(expected));
    }
    assert!(queues.inbound.is_empty());
});
