//! Fuzz target: `decode_frame`
//!
//! Interprets the input as little-endian pulse widths and decodes them with
//! both the legacy and the hardware timing.  Any frame that decodes must
//! re-encode to a terminator-carrying word that decodes the same way.
//!
//! cargo fuzz run fuzz_pulse_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use livolo_bridge::config::TimingConfig;
use livolo_bridge::protocol::encoder::{SwitchCode, decode, encode};
use livolo_bridge::protocol::pulse::{PulseWidths, decode_frame};

fuzz_target!(|data: &[u8]| {
    let widths: Vec<u32> = data
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    let timing = TimingConfig::default();
    let Ok(ocr) = timing.ocr() else { return };
    let nominals = [
        PulseWidths::from_micros(500, 100, 300),
        PulseWidths::from_ticks(ocr, timing.tick_ns()),
    ];

    for nominal in &nominals {
        if let Ok((remote, key)) = decode_frame(&widths, nominal) {
            assert!(key <= 0x7F);
            // Zero ids and keys decode fine but cannot be sent.
            if let Ok(code) = SwitchCode::new(remote, key) {
                assert_eq!(decode(encode(code)), Some((remote, key)));
            }
        }
    }
});
