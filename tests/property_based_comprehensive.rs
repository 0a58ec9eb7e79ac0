//! Comprehensive property-based tests for pre-commit hook
//!
//! This test suite covers the core invariants of rastro using property-based
//! testing with proptest. Designed to run fast as a pre-commit quality gate.
//!
//! Core invariants tested:
//! 1. Backtrace line parsing never panics and never loses the raw text
//! 2. Well-formed lines round-trip their structured fields
//! 3. Sanitization respects self-frame skipping and the depth cap
//! 4. Retain-count arithmetic matches the notification history
//! 5. The notification pipeline survives arbitrary event sequences

use proptest::prelude::*;
use rastro::engine::TrackerEngine;
use rastro::event::{LifecycleEvent, ObjectId};
use rastro::frame::StackFrame;
use rastro::method::LifecycleMethod;
use rastro::sanitizer::{self, CallStackSanitizer};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_frame_parse_never_panics(line in ".*") {
        // Property: parsing is total; the raw text is always preserved
        let frame = StackFrame::parse(&line);
        prop_assert_eq!(frame.raw, line);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_well_formed_lines_round_trip(
        ordinal in 0u32..1000,
        library in "[A-Za-z][A-Za-z0-9]{0,12}",
        address in 1u64..0xFFFF_FFFF,
        symbol in "[a-z_][a-z0-9_]{0,20}",
        offset in 0u32..100_000,
    ) {
        let line = format!("{ordinal}   {library}   0x{address:08x} {symbol} + {offset}");
        let frame = StackFrame::parse(&line);
        prop_assert_eq!(frame.ordinal, ordinal);
        prop_assert_eq!(frame.library, library);
        prop_assert_eq!(frame.address, address);
        prop_assert_eq!(frame.selector_name.as_deref(), Some(symbol.as_str()));
        prop_assert_eq!(frame.offset, offset);
        prop_assert_eq!(frame.object_class, None);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_sanitizer_respects_self_frames_and_depth(
        stack_len in 0usize..32,
        self_frames in 0usize..6,
        depth in 1usize..16,
    ) {
        let raw: Vec<String> = (0..stack_len)
            .map(|i| format!("{i}   app   0x{:08x} frame_{i} + 0", 0x1000 + i))
            .collect();

        let mut sanitizer = CallStackSanitizer::new();
        sanitizer.set_self_frame_count(self_frames);
        sanitizer.set_max_depth(depth);
        let frames = sanitizer.sanitize(&raw);

        // Output length is the survivor count, capped at the depth.
        prop_assert_eq!(frames.len(), stack_len.saturating_sub(self_frames).min(depth));

        // None of the dropped leading frames appear in the output.
        for frame in &frames {
            prop_assert!((frame.ordinal as usize) >= self_frames);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_retain_count_matches_notification_history(
        methods in prop::collection::vec(0u8..3, 0..50),
    ) {
        let mut engine = TrackerEngine::new();
        engine.monitor_class("Widget");
        engine.set_enabled(true);
        let total = methods.len();
        let make = |method| LifecycleEvent::new(ObjectId(1), "Widget", method, Vec::new());
        engine.notify(&make(LifecycleMethod::Create)).unwrap();

        // Reference model: clamp-at-zero retain count, free-running
        // deferred-release count.
        let mut retain = 1i32;
        let mut deferred = 0i32;
        for choice in methods {
            let method = match choice {
                0 => {
                    retain += 1;
                    LifecycleMethod::Retain
                }
                1 => {
                    if retain > 0 {
                        retain -= 1;
                    }
                    LifecycleMethod::Release
                }
                _ => {
                    deferred += 1;
                    LifecycleMethod::DeferredRelease
                }
            };
            engine.notify(&make(method)).unwrap();

            let tracker = engine.tracker_for(ObjectId(1)).unwrap();
            prop_assert_eq!(tracker.retain_count, retain);
            prop_assert_eq!(tracker.deferred_release_count, deferred);
            prop_assert_eq!(tracker.effective_retain_count(), retain - deferred);
        }

        // The monitor recorded the create plus every later operation.
        let monitors = engine.alive_monitors();
        prop_assert_eq!(monitors[0].operations.len(), total + 1);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_pipeline_survives_arbitrary_event_sequences(
        events in prop::collection::vec((0u64..4, 0u8..6), 0..60),
    ) {
        let mut engine = TrackerEngine::new();
        engine.monitor_class("Widget");
        engine.set_enabled(true);

        for (id, kind) in events {
            let method = match kind {
                0 => LifecycleMethod::Create,
                1 => LifecycleMethod::StealthCreate,
                2 => LifecycleMethod::Retain,
                3 => LifecycleMethod::Release,
                4 => LifecycleMethod::DeferredRelease,
                _ => LifecycleMethod::Destroy,
            };
            // Duplicate creates are provider faults and may error;
            // nothing here may panic.
            let _ = engine.notify(&LifecycleEvent::new(
                ObjectId(id),
                "Widget",
                method,
                vec![format!("0   app   0x{id:08x} touch + 0")],
            ));
        }

        // Every alive monitor is consistent with its own history.
        for monitor in engine.alive_monitors() {
            let last = monitor.operations.last().unwrap();
            prop_assert_eq!(last.retain_count, monitor.tracker.retain_count);
            prop_assert_eq!(
                last.deferred_release_count,
                monitor.tracker.deferred_release_count
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_condensed_rendering_is_single_line(
        symbols in prop::collection::vec("[a-z_]{1,12}", 0..10),
    ) {
        let frames: Vec<StackFrame> = symbols
            .iter()
            .enumerate()
            .map(|(i, sym)| StackFrame::parse(&format!("{i}   app   0x00001000 {sym} + 0")))
            .collect();
        let condensed = sanitizer::condensed(&frames);
        prop_assert!(!condensed.contains('\n'));
        prop_assert_eq!(condensed.split(',').filter(|s| !s.is_empty()).count(), symbols.len());
    }
}
