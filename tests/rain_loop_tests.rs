//! Frame loop functional tests
//!
//! Drive the complete effect (rain field, raster buffer, compositor) with
//! the recording mock backend. These tests run headlessly and are fast.

mod common;

use common::{FixedClock, RainTestHarness};
use glyphfall_renderer::mock::GpuCall;

// === Sizing and resize tests ===

#[test]
fn test_initial_columns_and_targets() {
    let harness = RainTestHarness::new(320, 240);

    assert_eq!(harness.column_count(), 20);
    assert_eq!(harness.target_sizes(), [(320, 240), (320, 240)]);
}

#[test]
fn test_resize_rebuilds_columns_and_targets() {
    let mut harness = RainTestHarness::new(320, 240);
    harness.run_frames(3);

    harness.surface.resize(640, 480);
    harness.run_frames(1);

    assert_eq!(harness.column_count(), 40);
    assert_eq!(harness.target_sizes(), [(640, 480), (640, 480)]);
    assert_eq!(harness.backend().last_allocation(), Some((640, 480)));
}

#[test]
fn test_stale_targets_are_never_drawn_after_resize() {
    let mut harness = RainTestHarness::new(320, 240);
    harness.run_frames(2);
    harness.surface.resize(200, 100);
    harness.run_frames(2);

    let calls = &harness.backend().calls;
    let resize_at = calls
        .iter()
        .position(|c| matches!(c, GpuCall::ResizeSurface { .. }))
        .expect("resize should reach the surface");

    for call in &calls[resize_at..] {
        match call {
            GpuCall::Upload { target, .. } => assert!(*target >= 2),
            GpuCall::Draw { source, .. } => assert!(*source >= 2),
            _ => {}
        }
    }
}

#[test]
fn test_odd_widths_round_columns_up() {
    let mut harness = RainTestHarness::new(320, 240);

    harness.surface.resize(337, 240);
    harness.run_frames(1);

    assert_eq!(harness.column_count(), 22);
}

#[test]
fn test_minimized_surface_renders_nothing() {
    let mut harness = RainTestHarness::new(320, 240);
    harness.surface.resize(0, 0);

    let rendered = harness.run_frames(5);

    assert_eq!(rendered, 0);
    assert_eq!(harness.backend().present_count(), 0);
    assert_eq!(harness.column_count(), 20);
}

// === Compositing tests ===

#[test]
fn test_one_present_per_frame() {
    let mut harness = RainTestHarness::new(160, 120);

    let rendered = harness.run_frames(30);

    assert_eq!(rendered, 30);
    assert_eq!(harness.backend().present_count(), 30);
    assert_eq!(harness.backend().allocation_count(), 2);
}

#[test]
fn test_feedback_pass_alternates_targets() {
    let mut harness = RainTestHarness::new(64, 64);
    harness.run_frames(6);

    let feedback: Vec<(usize, usize)> = harness
        .backend()
        .calls
        .iter()
        .filter_map(|c| match c {
            GpuCall::Draw {
                source,
                destination: Some(dest),
                ..
            } => Some((*source, *dest)),
            _ => None,
        })
        .collect();

    assert_eq!(feedback, vec![(0, 1), (1, 0), (0, 1), (1, 0), (0, 1), (1, 0)]);
}

#[test]
fn test_time_uniform_follows_clock() {
    let mut harness = RainTestHarness::new(64, 64);
    harness.clock = FixedClock::with_step(250.0);

    harness.run_frames(4);

    assert_eq!(harness.backend().surface_times(), vec![0.25, 0.5, 0.75, 1.0]);
}

// === Raster persistence tests ===

#[test]
fn test_rain_accumulates_in_buffer() {
    let mut harness = RainTestHarness::new(320, 240);
    assert_eq!(harness.lit_pixels(), 0);

    // Columns start up to one screen above the top edge
    harness.run_frames(600);

    assert!(harness.lit_pixels() > 0);
}
