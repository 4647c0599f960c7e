use super::*;
use crate::assets::handle::ImageHandle;
use crate::scene::timeline::{SceneInput, TimelineInputs, TimelineModel, TransitionType};

fn timeline(transition: TransitionType, scenes: usize) -> Timeline {
    TimelineModel::new(TimelineInputs {
        title: "Plan".to_owned(),
        scenes: (0..scenes)
            .map(|_| SceneInput {
                image: ImageHandle::new(vec![0u8; 4]),
                alternates: Vec::new(),
                view: Default::default(),
            })
            .collect(),
        transition,
        ..TimelineInputs::default()
    })
    .unwrap()
    .snapshot()
}

fn fps30() -> Fps {
    Fps::integer(30).unwrap()
}

#[test]
fn total_is_independent_of_transition_type() {
    for kind in [
        TransitionType::None,
        TransitionType::HardCut,
        TransitionType::Fade,
        TransitionType::Slide,
        TransitionType::Zoom,
        TransitionType::MotionBlur,
    ] {
        let plan = FramePlan::new(&timeline(kind, 4), fps30()).unwrap();
        assert_eq!(plan.total_frames(), 240, "{kind:?}");
        assert_eq!(plan.frames_per_scene, 60);
    }
}

#[test]
fn fade_blends_the_last_fifteen_frames_of_each_scene() {
    let plan = FramePlan::new(&timeline(TransitionType::Fade, 3), fps30()).unwrap();
    assert_eq!(plan.frames_per_transition, 15);

    assert_eq!(plan.frame_at(FrameIndex(44)).unwrap().next, None);
    let first = plan.frame_at(FrameIndex(45)).unwrap();
    assert_eq!((first.scene, first.next, first.progress), (0, Some(1), 0.0));
    let last = plan.frame_at(FrameIndex(59)).unwrap();
    assert_eq!((last.scene, last.next, last.progress), (0, Some(1), 1.0));
    let second = plan.frame_at(FrameIndex(60)).unwrap();
    assert_eq!((second.scene, second.next), (1, None));
}

#[test]
fn last_scene_never_blends() {
    let plan = FramePlan::new(&timeline(TransitionType::Zoom, 2), fps30()).unwrap();
    assert!(plan.blends_after(0));
    assert!(!plan.blends_after(1));
    assert_eq!(plan.static_frames(1), 60);
    assert_eq!(plan.frame_at(FrameIndex(119)).unwrap().next, None);
    assert_eq!(plan.frame_at(FrameIndex(120)), None);
}

#[test]
fn instant_types_have_no_blended_frames() {
    let plan = FramePlan::new(&timeline(TransitionType::HardCut, 3), fps30()).unwrap();
    assert_eq!(plan.frames_per_transition, 0);
    assert!((0..plan.total_frames()).all(|i| plan.frame_at(FrameIndex(i)).unwrap().next.is_none()));
    assert_eq!(plan.frame_at(FrameIndex(60)).unwrap().scene, 1);
}

#[test]
fn percent_floors() {
    let plan = FramePlan::new(&timeline(TransitionType::Fade, 3), fps30()).unwrap();
    assert_eq!(plan.percent_after(0), 0);
    assert_eq!(plan.percent_after(1), 0);
    assert_eq!(plan.percent_after(2), 1);
    assert_eq!(plan.percent_after(179), 99);
    assert_eq!(plan.percent_after(180), 100);
    assert_eq!(plan.percent_after(500), 100);
}

#[test]
fn rejects_a_cadence_below_one_frame_per_scene() {
    let t = timeline(TransitionType::Fade, 1);
    assert!(FramePlan::new(&t, Fps::new(1, 3).unwrap()).is_err());
}
