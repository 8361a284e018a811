//! Animation Source Tests
//!
//! Tests for:
//! - KeyframeTrack linear/step/cubic interpolation
//! - Interpolatable trait implementations (f32, Vec3, Quat)
//! - KeyframeCursor O(1) optimization and binary search fallback
//! - KeyframeTrack construction checks
//! - AnimationClip duration auto-computation and bone binding

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Quat, Vec3};

use gpuskin::animation::binder::Binder;
use gpuskin::animation::binding::TargetPath;
use gpuskin::animation::clip::{AnimationClip, Track, TrackData};
use gpuskin::animation::tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
use gpuskin::animation::values::Interpolatable;
use gpuskin::skeleton::{Skeleton, SourceBone};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn track<T: Interpolatable>(times: Vec<f32>, values: Vec<T>, mode: InterpolationMode) -> KeyframeTrack<T> {
    KeyframeTrack::new(times, values, mode).expect("valid keyframe track")
}

// ============================================================================
// KeyframeTrack: Linear Interpolation (f32)
// ============================================================================

#[test]
fn track_linear_f32_midpoint() {
    let track = track(
        vec![0.0, 1.0],
        vec![0.0_f32, 10.0],
        InterpolationMode::Linear,
    );

    let mut cursor = KeyframeCursor::default();
    let val = track.sample_with_cursor(0.5, &mut cursor);
    assert!(approx(val, 5.0), "Expected 5.0, got {val}");
}

#[test]
fn track_linear_f32_exact_keyframe() {
    let track = track(
        vec![0.0, 1.0, 2.0],
        vec![0.0_f32, 10.0, 20.0],
        InterpolationMode::Linear,
    );

    let mut cursor = KeyframeCursor::default();
    assert!(approx(track.sample_with_cursor(0.0, &mut cursor), 0.0));
    assert!(approx(track.sample_with_cursor(1.0, &mut cursor), 10.0));
    assert!(approx(track.sample_with_cursor(2.0, &mut cursor), 20.0));
}

#[test]
fn track_linear_f32_clamp_beyond_range() {
    let track = track(
        vec![0.0, 1.0],
        vec![0.0_f32, 10.0],
        InterpolationMode::Linear,
    );

    // Sampling beyond the last keyframe should clamp to last value
    let mut cursor = KeyframeCursor::default();
    let val = track.sample_with_cursor(5.0, &mut cursor);
    assert!(approx(val, 10.0), "Expected 10.0, got {val}");
}

#[test]
fn track_linear_f32_before_first() {
    let track = track(
        vec![1.0, 2.0],
        vec![10.0_f32, 20.0],
        InterpolationMode::Linear,
    );

    // Before first keyframe: should clamp to first value
    let mut cursor = KeyframeCursor::default();
    let val = track.sample_with_cursor(0.5, &mut cursor);
    assert!(approx(val, 10.0), "Expected 10.0, got {val}");
}

// ============================================================================
// KeyframeTrack: Step Interpolation
// ============================================================================

#[test]
fn track_step_holds_value() {
    let track = track(
        vec![0.0, 1.0, 2.0],
        vec![0.0_f32, 100.0, 200.0],
        InterpolationMode::Step,
    );

    // Step should hold the current keyframe value
    let mut cursor = KeyframeCursor::default();
    assert!(approx(track.sample_with_cursor(0.0, &mut cursor), 0.0));
    assert!(approx(track.sample_with_cursor(0.5, &mut cursor), 0.0));
    assert!(approx(track.sample_with_cursor(0.99, &mut cursor), 0.0));
    assert!(approx(track.sample_with_cursor(1.0, &mut cursor), 100.0));
    assert!(approx(track.sample_with_cursor(1.5, &mut cursor), 100.0));
}

// ============================================================================
// KeyframeTrack: Linear Interpolation (Vec3)
// ============================================================================

#[test]
fn track_linear_vec3() {
    let track = track(
        vec![0.0, 1.0],
        vec![Vec3::ZERO, Vec3::new(10.0, 20.0, 30.0)],
        InterpolationMode::Linear,
    );

    let mut cursor = KeyframeCursor::default();
    let val = track.sample_with_cursor(0.5, &mut cursor);
    assert!(approx(val.x, 5.0));
    assert!(approx(val.y, 10.0));
    assert!(approx(val.z, 15.0));
}

// ============================================================================
// KeyframeTrack: Linear Interpolation (Quat - slerp)
// ============================================================================

#[test]
fn track_linear_quat_slerp() {
    let q0 = Quat::IDENTITY;
    let q1 = Quat::from_rotation_y(PI);

    let track = track(vec![0.0, 1.0], vec![q0, q1], InterpolationMode::Linear);

    // At t=0.5, should be halfway rotation
    let mut cursor = KeyframeCursor::default();
    let val = track.sample_with_cursor(0.5, &mut cursor);
    let expected = q0.slerp(q1, 0.5);
    let angle = val.angle_between(expected);
    assert!(angle < 0.01, "Quaternion slerp mismatch: angle={angle}");
}

// ============================================================================
// KeyframeTrack: Cubic Spline Interpolation
// ============================================================================

#[test]
fn track_cubic_f32_endpoints() {
    // CubicSpline: values = [in_tangent0, value0, out_tangent0, in_tangent1, value1, out_tangent1]
    let track = track(
        vec![0.0, 1.0],
        vec![
            0.0_f32, 0.0, 1.0, // frame 0: in_tangent=0, value=0, out_tangent=1
            1.0, 10.0, 0.0, // frame 1: in_tangent=1, value=10, out_tangent=0
        ],
        InterpolationMode::CubicSpline,
    );

    // At exact keyframes, should return exact value
    let mut cursor = KeyframeCursor::default();
    let v0 = track.sample_with_cursor(0.0, &mut cursor);
    assert!(approx(v0, 0.0), "got {}", v0);
    let v1 = track.sample_with_cursor(1.0, &mut cursor);
    assert!(approx(v1, 10.0), "got {}", v1);
}

#[test]
fn track_cubic_f32_smooth_midpoint() {
    let track = track(
        vec![0.0, 1.0],
        vec![
            0.0_f32, 0.0, 0.0, // frame 0: zero tangents, value=0
            0.0, 10.0, 0.0, // frame 1: zero tangents, value=10
        ],
        InterpolationMode::CubicSpline,
    );

    // With zero tangents, Hermite interpolation midpoint should be approximately 5.0
    let mut cursor = KeyframeCursor::default();
    let val = track.sample_with_cursor(0.5, &mut cursor);
    assert!(
        (val - 5.0).abs() < 1.0,
        "Cubic midpoint expected ~5.0, got {val}"
    );
}

// ============================================================================
// KeyframeTrack::sample() (stateless, no cursor)
// ============================================================================

#[test]
fn sample_linear_f32_midpoint() {
    let track = track(
        vec![0.0, 1.0],
        vec![0.0_f32, 10.0],
        InterpolationMode::Linear,
    );
    assert!(approx(track.sample(0.5), 5.0), "got {}", track.sample(0.5));
}

#[test]
fn sample_linear_f32_exact_keyframes() {
    let track = track(
        vec![0.0, 1.0, 2.0],
        vec![0.0_f32, 10.0, 20.0],
        InterpolationMode::Linear,
    );
    assert!(
        approx(track.sample(0.0), 0.0),
        "t=0: got {}",
        track.sample(0.0)
    );
    assert!(
        approx(track.sample(1.0), 10.0),
        "t=1: got {}",
        track.sample(1.0)
    );
    assert!(
        approx(track.sample(2.0), 20.0),
        "t=2: got {}",
        track.sample(2.0)
    );
}

#[test]
fn sample_linear_f32_clamp_beyond() {
    let track = track(
        vec![0.0, 1.0],
        vec![0.0_f32, 10.0],
        InterpolationMode::Linear,
    );
    assert!(approx(track.sample(5.0), 10.0));
}

#[test]
fn sample_linear_f32_before_first() {
    let track = track(
        vec![1.0, 2.0],
        vec![10.0_f32, 20.0],
        InterpolationMode::Linear,
    );
    // Before first keyframe, t is clamped to 0 inside sample_at_frame
    assert!(approx(track.sample(0.0), 10.0), "got {}", track.sample(0.0));
}

#[test]
fn sample_step_holds_value() {
    let track = track(
        vec![0.0, 1.0, 2.0],
        vec![0.0_f32, 100.0, 200.0],
        InterpolationMode::Step,
    );
    assert!(approx(track.sample(0.0), 0.0));
    assert!(approx(track.sample(0.5), 0.0));
    assert!(approx(track.sample(1.0), 100.0));
    assert!(approx(track.sample(1.5), 100.0));
    assert!(approx(track.sample(2.0), 200.0));
}

#[test]
fn sample_linear_vec3() {
    let track = track(
        vec![0.0, 1.0],
        vec![Vec3::ZERO, Vec3::new(10.0, 20.0, 30.0)],
        InterpolationMode::Linear,
    );
    let val = track.sample(0.5);
    assert!(approx(val.x, 5.0));
    assert!(approx(val.y, 10.0));
    assert!(approx(val.z, 15.0));
}

#[test]
fn sample_cubic_f32_endpoints() {
    let track = track(
        vec![0.0, 1.0],
        vec![
            0.0_f32, 0.0, 1.0, // frame 0: in_tangent=0, value=0, out_tangent=1
            1.0, 10.0, 0.0, // frame 1: in_tangent=1, value=10, out_tangent=0
        ],
        InterpolationMode::CubicSpline,
    );
    assert!(
        approx(track.sample(0.0), 0.0),
        "t=0: got {}",
        track.sample(0.0)
    );
    assert!(
        approx(track.sample(1.0), 10.0),
        "t=1: got {}",
        track.sample(1.0)
    );
}

#[test]
fn sample_matches_cursor_across_all_times() {
    // Verify sample() and sample_with_cursor() produce identical results
    let track = track(
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
        vec![0.0_f32, 10.0, 5.0, 20.0, 15.0],
        InterpolationMode::Linear,
    );
    for i in 0..=40 {
        let t = i as f32 * 0.1;
        let mut cursor = KeyframeCursor::default();
        let val_cursor = track.sample_with_cursor(t, &mut cursor);
        let val_sample = track.sample(t);
        assert!(
            approx(val_sample, val_cursor),
            "t={t}: sample()={val_sample} != sample_with_cursor()={val_cursor}"
        );
    }
}

// ============================================================================
// KeyframeCursor: O(1) Sequential Access
// ============================================================================

#[test]
fn cursor_sequential_forward() {
    let track = track(
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
        vec![0.0_f32, 10.0, 20.0, 30.0, 40.0],
        InterpolationMode::Linear,
    );

    let mut cursor = KeyframeCursor::default();

    // Sequential forward sampling should use O(1) cursor optimization
    for i in 0..=20 {
        let t = i as f32 * 0.2;
        let val = track.sample_with_cursor(t, &mut cursor);
        let expected = t * 10.0;
        assert!(
            approx(val, expected),
            "t={t}: expected {expected}, got {val}"
        );
    }
}

#[test]
fn cursor_forward_then_jump_back() {
    let track = track(
        vec![0.0, 1.0, 2.0, 3.0],
        vec![0.0_f32, 10.0, 20.0, 30.0],
        InterpolationMode::Linear,
    );

    let mut cursor = KeyframeCursor::default();

    // Move forward to t=2.5
    let val = track.sample_with_cursor(2.5, &mut cursor);
    assert!(approx(val, 25.0));

    // Jump back to t=0.5 (large jump → binary search fallback)
    let val = track.sample_with_cursor(0.5, &mut cursor);
    assert!(approx(val, 5.0));
}

#[test]
fn cursor_single_keyframe() {
    let track = track(vec![0.0], vec![42.0_f32], InterpolationMode::Linear);

    let mut cursor = KeyframeCursor::default();
    let val = track.sample_with_cursor(5.0, &mut cursor);
    assert!(approx(val, 42.0));
}

#[test]
fn cursor_two_keyframes() {
    let track = track(
        vec![0.0, 2.0],
        vec![0.0_f32, 100.0],
        InterpolationMode::Linear,
    );

    let mut cursor = KeyframeCursor::default();
    assert!(approx(track.sample_with_cursor(0.0, &mut cursor), 0.0));
    assert!(approx(track.sample_with_cursor(1.0, &mut cursor), 50.0));
    assert!(approx(track.sample_with_cursor(2.0, &mut cursor), 100.0));
}

// ============================================================================
// Interpolatable Implementations
// ============================================================================

#[test]
fn interpolatable_f32_linear() {
    let result = f32::interpolate_linear(0.0, 10.0, 0.25);
    assert!(approx(result, 2.5));
}

#[test]
fn interpolatable_vec3_linear() {
    let a = Vec3::new(0.0, 0.0, 0.0);
    let b = Vec3::new(10.0, 20.0, 30.0);
    let result = Vec3::interpolate_linear(a, b, 0.5);
    assert!(approx(result.x, 5.0));
    assert!(approx(result.y, 10.0));
    assert!(approx(result.z, 15.0));
}

#[test]
fn interpolatable_quat_linear_is_slerp() {
    let a = Quat::IDENTITY;
    let b = Quat::from_rotation_y(FRAC_PI_2);
    let result = Quat::interpolate_linear(a, b, 0.5);

    let expected = a.slerp(b, 0.5);
    let angle = result.angle_between(expected);
    assert!(angle < 1e-4, "Slerp mismatch: angle={angle}");
}

// ============================================================================
// KeyframeTrack Construction
// ============================================================================

#[test]
fn track_rejects_empty_keys() {
    let result = KeyframeTrack::<f32>::new(vec![], vec![], InterpolationMode::Linear);
    assert!(result.is_err(), "A track without keys must be rejected");
}

#[test]
fn track_rejects_value_count_mismatch() {
    let result = KeyframeTrack::new(vec![0.0, 1.0], vec![0.0_f32], InterpolationMode::Linear);
    assert!(result.is_err());
}

#[test]
fn track_cubic_requires_three_values_per_key() {
    let result = KeyframeTrack::new(vec![0.0, 1.0], vec![0.0_f32, 1.0], InterpolationMode::CubicSpline);
    assert!(result.is_err(), "CubicSpline needs in/value/out per key");

    let ok = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 0.0, 0.0, 0.0, 1.0, 0.0],
        InterpolationMode::CubicSpline,
    );
    assert!(ok.is_ok());
}

#[test]
fn track_end_time_is_last_key() {
    let t = track(vec![0.0, 0.5, 2.25], vec![0.0_f32, 1.0, 2.0], InterpolationMode::Step);
    assert!(approx(t.end_time(), 2.25));
    assert_eq!(t.interpolation(), InterpolationMode::Step);
    assert_eq!(t.times().len(), 3);
}

// ============================================================================
// AnimationClip Auto-Duration
// ============================================================================

#[test]
fn clip_auto_duration() {
    let clip = AnimationClip::new(
        "test",
        30,
        vec![
            Track::translation(
                "a",
                track(vec![0.0, 1.5], vec![Vec3::ZERO, Vec3::X], InterpolationMode::Linear),
            ),
            Track::rotation(
                "b",
                track(
                    vec![0.0, 3.0],
                    vec![Quat::IDENTITY, Quat::from_rotation_y(1.0)],
                    InterpolationMode::Linear,
                ),
            ),
        ],
    );

    assert!(
        approx(clip.duration, 3.0),
        "Duration should be max of all tracks (3.0), got {}",
        clip.duration
    );
    assert_eq!(clip.frame_rate, 30);
    assert!(!clip.looping, "Clips default to non-looping");
}

#[test]
fn clip_empty_tracks_zero_duration() {
    let clip = AnimationClip::new("empty", 30, vec![]);
    assert!(approx(clip.duration, 0.0));
}

#[test]
fn clip_looping_builder() {
    let clip = AnimationClip::new("walk", 24, vec![]).looping(true);
    assert!(clip.looping);
}

#[test]
fn track_constructors_set_target() {
    let t = Track::scale("hip", track(vec![0.0], vec![Vec3::ONE], InterpolationMode::Linear));
    assert_eq!(t.meta.bone_name, "hip");
    assert_eq!(t.meta.target, TargetPath::Scale);
    assert!(matches!(t.data, TrackData::Vector3(_)));
}

// ============================================================================
// Binder
// ============================================================================

fn two_bone_skeleton() -> Skeleton {
    Skeleton::collect(&SourceBone::new("root", None).with_child(SourceBone::new("arm", None)))
}

#[test]
fn binder_resolves_bones_by_name() {
    let skeleton = two_bone_skeleton();
    let clip = AnimationClip::new(
        "wave",
        30,
        vec![
            Track::rotation(
                "arm",
                track(vec![0.0, 1.0], vec![Quat::IDENTITY, Quat::from_rotation_z(1.0)], InterpolationMode::Linear),
            ),
            Track::translation(
                "root",
                track(vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::Z], InterpolationMode::Linear),
            ),
        ],
    );

    let bindings = Binder::bind(&skeleton, &clip);
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].track_index, 0);
    assert_eq!(bindings[0].bone_index, 1);
    assert_eq!(bindings[0].target, TargetPath::Rotation);
    assert_eq!(bindings[1].bone_index, 0);
    assert_eq!(bindings[1].target, TargetPath::Translation);
}

#[test]
fn binder_skips_unknown_bones() {
    let skeleton = two_bone_skeleton();
    let clip = AnimationClip::new(
        "tail",
        30,
        vec![Track::translation(
            "tail",
            track(vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::X], InterpolationMode::Linear),
        )],
    );

    assert!(Binder::bind(&skeleton, &clip).is_empty());
}
