use super::*;

const ALL: [TransitionType; 6] = [
    TransitionType::None,
    TransitionType::HardCut,
    TransitionType::Fade,
    TransitionType::Slide,
    TransitionType::Zoom,
    TransitionType::MotionBlur,
];

#[test]
fn outgoing_at_zero_is_untouched() {
    for kind in ALL {
        assert_eq!(
            blend(kind, 0.0, Role::Outgoing, 1080),
            CompositeParams::IDENTITY,
            "{kind:?}"
        );
    }
}

#[test]
fn incoming_at_one_is_untouched() {
    for kind in ALL {
        assert_eq!(
            blend(kind, 1.0, Role::Incoming, 1080),
            CompositeParams::IDENTITY,
            "{kind:?}"
        );
    }
}

#[test]
fn other_side_is_invisible_at_the_ends() {
    for kind in [
        TransitionType::None,
        TransitionType::HardCut,
        TransitionType::Fade,
        TransitionType::Zoom,
        TransitionType::MotionBlur,
    ] {
        assert!(!blend(kind, 0.0, Role::Incoming, 1080).is_visible(), "{kind:?}");
        assert!(!blend(kind, 1.0, Role::Outgoing, 1080).is_visible(), "{kind:?}");
    }
    // Slides move frames off-screen instead of fading them.
    assert_eq!(blend(TransitionType::Slide, 0.0, Role::Incoming, 1080).x_offset_px, 1080.0);
    assert_eq!(blend(TransitionType::Slide, 1.0, Role::Outgoing, 1080).x_offset_px, -1080.0);
}

#[test]
fn fade_crossfades_opacity() {
    let out = blend(TransitionType::Fade, 0.25, Role::Outgoing, 1080);
    let inc = blend(TransitionType::Fade, 0.25, Role::Incoming, 1080);
    assert_eq!(out.opacity, 0.75);
    assert_eq!(inc.opacity, 0.25);
    assert_eq!((out.scale, inc.scale), (1.0, 1.0));
    assert_eq!((out.x_offset_px, inc.x_offset_px), (0.0, 0.0));
}

#[test]
fn slide_offsets_track_frame_width() {
    let out = blend(TransitionType::Slide, 0.5, Role::Outgoing, 1000);
    let inc = blend(TransitionType::Slide, 0.5, Role::Incoming, 1000);
    assert_eq!(out.x_offset_px, -500.0);
    assert_eq!(inc.x_offset_px, 500.0);
    assert_eq!((out.opacity, inc.opacity), (1.0, 1.0));
}

#[test]
fn zoom_scales_both_sides() {
    let out = blend(TransitionType::Zoom, 0.5, Role::Outgoing, 1080);
    let inc = blend(TransitionType::Zoom, 0.5, Role::Incoming, 1080);
    assert_eq!(out.scale, 1.25);
    assert_eq!(inc.scale, 1.25);
    assert_eq!(out.opacity, 0.5);
    assert_eq!(out.blur_px, 0.0);
    assert_eq!(blend(TransitionType::Zoom, 0.0, Role::Incoming, 1080).scale, 1.5);
}

#[test]
fn motion_blur_peaks_mid_window() {
    assert_eq!(motion_blur_px(0.0), 0.0);
    assert_eq!(motion_blur_px(1.0), 0.0);
    assert!((motion_blur_px(0.5) - 20.0).abs() < 1e-4);
    for p in [0.1f32, 0.3, 0.45, 0.55, 0.7, 0.9] {
        assert!(motion_blur_px(p) < motion_blur_px(0.5));
        assert!(motion_blur_px(p) > 0.0);
    }
    let out = blend(TransitionType::MotionBlur, 0.5, Role::Outgoing, 1080);
    let inc = blend(TransitionType::MotionBlur, 0.5, Role::Incoming, 1080);
    assert_eq!(out.blur_px, inc.blur_px);
}

#[test]
fn hard_cut_switches_wholesale() {
    let out = blend(TransitionType::HardCut, 0.99, Role::Outgoing, 1080);
    let inc = blend(TransitionType::HardCut, 0.99, Role::Incoming, 1080);
    assert_eq!(out, CompositeParams::IDENTITY);
    assert!(!inc.is_visible());
}

#[test]
fn progress_is_clamped() {
    assert_eq!(
        blend(TransitionType::Fade, 3.0, Role::Incoming, 1080),
        CompositeParams::IDENTITY
    );
    assert_eq!(
        blend(TransitionType::Fade, f32::NAN, Role::Outgoing, 1080),
        CompositeParams::IDENTITY
    );
}

#[test]
fn window_sweep_is_inclusive() {
    assert_eq!(window_progress(0, 15), 0.0);
    assert_eq!(window_progress(14, 15), 1.0);
    assert!((window_progress(7, 15) - 0.5).abs() < 1e-6);
    assert_eq!(window_progress(0, 1), 1.0);
}
