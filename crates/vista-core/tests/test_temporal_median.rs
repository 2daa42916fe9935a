mod common;

use std::sync::Arc;

use vista_core::background::{
    run_to_completion, BackgroundRemoval, OutputMode, TemporalMedian, TemporalMedianConfig,
};
use vista_core::error::VistaError;

use common::{constant_stack, indexed_stack, textured_stack};

// ---------------------------------------------------------------------------
// Stepping
// ---------------------------------------------------------------------------

#[test]
fn test_steps_advance_one_frame_at_a_time() {
    let stack = Arc::new(indexed_stack(8, 2, 2));
    let mut tm = TemporalMedian::new(stack, TemporalMedianConfig::default()).unwrap();
    assert_eq!(tm.current_index(), None);
    assert_eq!(tm.total_frames(), 8);

    for expected in 0..8 {
        let (index, frame) = tm.step().unwrap();
        assert_eq!(index, expected);
        assert_eq!(frame.dim(), (2, 2));
        assert_eq!(tm.current_index(), Some(expected));
    }
}

#[test]
fn test_step_past_end_is_out_of_range() {
    let stack = Arc::new(indexed_stack(3, 2, 2));
    let mut tm = TemporalMedian::new(stack, TemporalMedianConfig::new(1, 0)).unwrap();
    for _ in 0..3 {
        tm.step().unwrap();
    }
    let err = tm.step().unwrap_err();
    assert!(matches!(
        err,
        VistaError::FrameIndexOutOfRange { index: 3, total: 3 }
    ));
    // Cursor does not move on the failed call
    assert_eq!(tm.current_index(), Some(2));
}

#[test]
fn test_empty_stack_step_is_out_of_range() {
    let stack = Arc::new(indexed_stack(0, 2, 2));
    let mut tm = TemporalMedian::new(stack, TemporalMedianConfig::default()).unwrap();
    assert!(matches!(
        tm.step(),
        Err(VistaError::FrameIndexOutOfRange { index: 0, total: 0 })
    ));
}

// ---------------------------------------------------------------------------
// Background values
// ---------------------------------------------------------------------------

#[test]
fn test_background_is_median_of_window() {
    let stack = Arc::new(indexed_stack(20, 3, 3));
    let mut tm = TemporalMedian::new(stack, TemporalMedianConfig::new(5, 2)).unwrap();

    let outputs: Vec<f32> = (0..20).map(|_| tm.step().unwrap().1[[1, 1]]).collect();

    // frame 0: window {3..7} -> 5
    assert_eq!(outputs[0], 5.0);
    // frame 1: window {4..8} -> 6
    assert_eq!(outputs[1], 6.0);
    // frame 10: {3..7} U {13..17} -> (7 + 13) / 2
    assert_eq!(outputs[10], 10.0);
    // frame 15: {8..12} U {18, 19} -> 11
    assert_eq!(outputs[15], 11.0);
    // frame 19: {12..16} -> 14
    assert_eq!(outputs[19], 14.0);
}

#[test]
fn test_target_frame_never_contributes() {
    // A bright transient in frame 5 must not leak into its own background
    let mut values = vec![1.0f32; 11];
    values[5] = 100.0;
    let stack = Arc::new(constant_stack(&values, 2, 2));
    let mut tm = TemporalMedian::new(stack, TemporalMedianConfig::new(2, 0)).unwrap();
    for _ in 0..5 {
        tm.step().unwrap();
    }
    let (index, frame) = tm.step().unwrap();
    assert_eq!(index, 5);
    assert!(frame.iter().all(|&v| v == 1.0));
}

#[test]
fn test_empty_window_passes_frame_through() {
    let stack = Arc::new(indexed_stack(3, 2, 2));
    let mut tm = TemporalMedian::new(Arc::clone(&stack), TemporalMedianConfig::new(5, 2)).unwrap();
    for i in 0..3 {
        assert!(tm.window_for(i).is_empty());
        let (index, frame) = tm.step().unwrap();
        assert_eq!(frame, stack.frame(index).unwrap());
    }
}

#[test]
fn test_subtract_mode_removes_background() {
    let stack = Arc::new(indexed_stack(20, 2, 2));
    let config = TemporalMedianConfig {
        output: OutputMode::Subtract,
        ..TemporalMedianConfig::new(5, 2)
    };
    let mut tm = TemporalMedian::new(stack, config).unwrap();
    let (_, first) = tm.step().unwrap();
    // 0 - median{3..7}
    assert!(first.iter().all(|&v| v == -5.0));
    for _ in 1..10 {
        tm.step().unwrap();
    }
    let (index, frame) = tm.step().unwrap();
    assert_eq!(index, 10);
    assert!(frame.iter().all(|&v| v == 0.0));
}

#[test]
fn test_subtract_mode_empty_window_passes_through() {
    let stack = Arc::new(constant_stack(&[0.25, 0.5], 2, 2));
    let config = TemporalMedianConfig {
        output: OutputMode::Subtract,
        ..TemporalMedianConfig::new(1, 1)
    };
    let mut tm = TemporalMedian::new(stack, config).unwrap();
    let (_, frame) = tm.step().unwrap();
    assert!(frame.iter().all(|&v| v == 0.25));
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn test_config_is_kept_as_given() {
    let config = TemporalMedianConfig {
        output: OutputMode::Subtract,
        ..TemporalMedianConfig::new(3, 1)
    };
    let tm = TemporalMedian::new(Arc::new(indexed_stack(6, 2, 2)), config.clone()).unwrap();
    assert_eq!(tm.config(), &config);
    assert_eq!(
        tm.description(),
        "Processed with Temporal Median (background=3, offset=1)"
    );
}

#[test]
fn test_zero_background_frames_rejected() {
    let stack = Arc::new(indexed_stack(5, 2, 2));
    let result = TemporalMedian::new(stack, TemporalMedianConfig::new(0, 2));
    assert!(matches!(result, Err(VistaError::Validation(_))));
}

// ---------------------------------------------------------------------------
// Batch mode
// ---------------------------------------------------------------------------

#[test]
fn test_batch_output_preserves_shape_and_metadata() {
    let stack = Arc::new(textured_stack(12, 5, 7));
    let mut tm = TemporalMedian::new(Arc::clone(&stack), TemporalMedianConfig::default()).unwrap();
    let output = run_to_completion(&mut tm, &stack).unwrap();

    assert_eq!(output.name(), "textured Temporal Median");
    assert_eq!(output.len(), stack.len());
    assert_eq!(output.frame_shape(), stack.frame_shape());
    assert_eq!(output.frame_numbers(), stack.frame_numbers());
    assert_eq!(output.timestamps(), stack.timestamps());
    assert_eq!(
        output.description(),
        "Processed with Temporal Median (background=5, offset=2)"
    );
}

#[test]
fn test_batch_runs_are_bitwise_identical() {
    let stack = Arc::new(textured_stack(15, 6, 6));
    let run = || {
        let mut tm =
            TemporalMedian::new(Arc::clone(&stack), TemporalMedianConfig::new(3, 1)).unwrap();
        run_to_completion(&mut tm, &stack).unwrap()
    };
    let a = run();
    let b = run();
    let bits_a: Vec<u32> = a.images().iter().map(|v| v.to_bits()).collect();
    let bits_b: Vec<u32> = b.images().iter().map(|v| v.to_bits()).collect();
    assert_eq!(bits_a, bits_b);
}

#[test]
fn test_batch_leaves_source_untouched() {
    let stack = Arc::new(textured_stack(10, 4, 4));
    let before = stack.images().clone();
    let mut tm = TemporalMedian::new(Arc::clone(&stack), TemporalMedianConfig::default()).unwrap();
    let _ = run_to_completion(&mut tm, &stack).unwrap();
    assert_eq!(stack.images(), &before);
}

#[test]
fn test_batch_rejects_mismatched_source() {
    let stack = Arc::new(indexed_stack(10, 2, 2));
    let other = indexed_stack(4, 2, 2);
    let mut tm = TemporalMedian::new(stack, TemporalMedianConfig::default()).unwrap();
    assert!(run_to_completion(&mut tm, &other).is_err());
}
