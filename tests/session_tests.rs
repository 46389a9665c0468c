//! External tests for the session aggregate: capacity and geometry
//! invariants under arbitrary interaction sequences, plus the scripted
//! scenarios a viewer walks through.

use multistream_watch::arrange::{resize_frame, Corner};
use multistream_watch::checkout::Plan;
use multistream_watch::entitlement::{Tier, FREE_SLOT_CAP, MAX_SLOTS};
use multistream_watch::layout::{ClampPolicy, Frame, LayoutMode, Point, CANVAS_LIMIT, SLOT_MIN_SIZE};
use multistream_watch::platform::Platform;
use multistream_watch::{Action, DashboardSession, SessionOptions};
use proptest::prelude::*;

fn session() -> DashboardSession {
    DashboardSession::new(SessionOptions {
        onboarding_completed: true,
        ..SessionOptions::default()
    })
}

fn premium() -> DashboardSession {
    let mut s = session();
    s.checkout_succeeded(Plan::Monthly);
    s
}

fn platform() -> impl Strategy<Value = Platform> {
    prop_oneof![
        Just(Platform::Twitch),
        Just(Platform::Kick),
        Just(Platform::Youtube)
    ]
}

fn corner() -> impl Strategy<Value = Corner> {
    prop_oneof![
        Just(Corner::Nw),
        Just(Corner::Ne),
        Just(Corner::Sw),
        Just(Corner::Se)
    ]
}

fn coord() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -3000.0..3000.0f64,
        1 => -1e300..1e300f64,
        1 => prop_oneof![Just(f64::MAX), Just(f64::MIN), Just(1e308), Just(-1e308)],
    ]
}

fn point() -> impl Strategy<Value = Point> {
    (coord(), coord()).prop_map(|(x, y)| Point::new(x, y))
}

fn add_action() -> impl Strategy<Value = Action> {
    ("[a-z]{1,8}", platform()).prop_map(|(channel, platform)| Action::AddSlot { channel, platform })
}

/// Any interaction except starting a trial or paying.
fn free_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        add_action(),
        (0usize..8).prop_map(|index| Action::RemoveSlot { index }),
        (0usize..8, "[a-z]{1,8}", platform()).prop_map(|(index, channel, platform)| {
            Action::AssignToSlot {
                index,
                channel,
                platform,
            }
        }),
        (0usize..8).prop_map(|index| Action::SelectSlot { index }),
        ("[a-z]{1,8}", platform())
            .prop_map(|(channel, platform)| Action::AssignStreamer { channel, platform }),
        ("[a-c]", platform()).prop_map(|(channel, platform)| Action::OpenChat { channel, platform }),
        (0usize..4).prop_map(|index| Action::CloseChat { index }),
        Just(Action::RestoreDefaults),
        Just(Action::CycleLayout),
        (0usize..8, point()).prop_map(|(index, pointer)| Action::DragSlot { index, pointer }),
        (0usize..8, corner(), point()).prop_map(|(index, corner, pointer)| Action::ResizeSlot {
            index,
            corner,
            pointer
        }),
        (0usize..4, point()).prop_map(|(index, pointer)| Action::DragChat { index, pointer }),
        (0usize..4, corner(), point()).prop_map(|(index, corner, pointer)| Action::ResizeChat {
            index,
            corner,
            pointer
        }),
        point().prop_map(|pointer| Action::PointerMove { pointer }),
        Just(Action::PointerUp),
    ]
}

fn any_action() -> impl Strategy<Value = Action> {
    prop_oneof![9 => free_action(), 1 => Just(Action::StartTrial)]
}

proptest! {
    #[test]
    fn test_free_add_sequence_never_exceeds_two(adds in prop::collection::vec(add_action(), 0..20)) {
        let mut s = session();
        for a in adds {
            s.apply(a);
            prop_assert!(s.slots().len() <= FREE_SLOT_CAP);
        }
    }

    #[test]
    fn test_premium_add_sequence_never_exceeds_six(adds in prop::collection::vec(add_action(), 0..20)) {
        let mut s = premium();
        s.apply(Action::RemoveSlot { index: 0 });
        for a in adds {
            s.apply(a);
            prop_assert!(s.slots().len() <= MAX_SLOTS);
        }
    }

    #[test]
    fn test_free_session_stays_within_cap(actions in prop::collection::vec(free_action(), 0..60)) {
        let mut s = session();
        for a in actions {
            s.apply(a);
            prop_assert!(s.slots().len() <= FREE_SLOT_CAP);
            prop_assert!(s.chats().is_empty());
            prop_assert_eq!(s.entitlement().tier(), Tier::Free);
        }
    }

    #[test]
    fn test_invariants_under_arbitrary_interaction(
        actions in prop::collection::vec(any_action(), 0..80),
        ticks in prop::collection::vec(0u32..400, 0..80),
    ) {
        let mut s = DashboardSession::new(SessionOptions {
            trial_secs: 300,
            onboarding_completed: true,
            ..SessionOptions::default()
        });
        for (i, a) in actions.into_iter().enumerate() {
            s.apply(a);
            for _ in 0..ticks.get(i).copied().unwrap_or(0) {
                s.tick();
            }
            prop_assert!(s.slots().len() <= MAX_SLOTS);
            for slot in s.slots().slots() {
                let f = slot.frame;
                prop_assert!(f.size.width >= SLOT_MIN_SIZE.width);
                prop_assert!(f.size.height >= SLOT_MIN_SIZE.height);
                for v in [f.origin.x, f.origin.y, f.size.width, f.size.height] {
                    prop_assert!(v.is_finite() && v.abs() <= CANVAS_LIMIT);
                }
            }
            let chats = s.chats().windows();
            for (j, w) in chats.iter().enumerate() {
                prop_assert!(w.size.width >= 300.0 && w.size.height >= 300.0);
                for v in [w.position.x, w.position.y, w.size.width, w.size.height] {
                    prop_assert!(v.is_finite() && v.abs() <= CANVAS_LIMIT);
                }
                prop_assert!(!chats[j + 1..]
                    .iter()
                    .any(|o| o.channel == w.channel && o.platform == w.platform));
            }
        }
    }

    #[test]
    fn test_add_after_any_freeform_resize_fills_to_six(c in corner(), to in point()) {
        let mut s = premium();
        s.apply(Action::SetLayout { mode: LayoutMode::Freeform });
        s.apply(Action::ResizeSlot { index: 0, corner: c, pointer: Point::new(600.0, 400.0) });
        s.apply(Action::PointerMove { pointer: to });
        s.apply(Action::PointerUp);
        s.apply(Action::RemoveSlot { index: 5 });
        s.apply(Action::RemoveSlot { index: 4 });
        for name in ["one", "two", "three"] {
            s.apply(Action::AddSlot { channel: name.into(), platform: Platform::Kick });
        }
        prop_assert_eq!(s.slots().len(), MAX_SLOTS);
        prop_assert!(serde_json::to_string(&s.view("h")).is_ok());
    }

    #[test]
    fn test_open_chat_twice_yields_one_window(channel in "[a-z0-9_]{1,12}", p in platform()) {
        let mut s = premium();
        s.apply(Action::OpenChat { channel: channel.clone(), platform: p });
        s.apply(Action::OpenChat { channel: channel.clone(), platform: p });
        let matching = s
            .chats()
            .windows()
            .iter()
            .filter(|w| w.channel == channel && w.platform == p)
            .count();
        prop_assert_eq!(matching, 1);
    }

    #[test]
    fn test_se_resize_never_below_minimum(dx in -100_000.0..0.0f64, dy in -100_000.0..0.0f64) {
        let start = Frame::new(0.0, 0.0, 600.0, 400.0);
        for policy in [ClampPolicy::ShiftByRawDelta, ClampPolicy::AnchorOppositeEdge] {
            let f = resize_frame(start, Corner::Se, Point::new(dx, dy), SLOT_MIN_SIZE, policy);
            prop_assert!(f.size.width >= 300.0);
            prop_assert!(f.size.height >= 200.0);
        }
    }
}

#[test]
fn test_trial_then_expiry_then_upgrade_walkthrough() {
    let mut s = DashboardSession::new(SessionOptions {
        trial_secs: 5,
        onboarding_completed: true,
        ..SessionOptions::default()
    });
    s.apply(Action::StartTrial);
    assert_eq!(s.slots().len(), 4);
    s.apply(Action::AddSlot {
        channel: "ninja".into(),
        platform: Platform::Twitch,
    });
    assert_eq!(s.slots().len(), 5);

    for _ in 0..5 {
        s.tick();
    }
    assert_eq!(s.entitlement().tier(), Tier::Free);
    assert_eq!(s.slots().len(), 5);
    let view = s.view("localhost");
    assert!(view.trial_ended);
    assert_eq!(view.slots.iter().filter(|v| v.frozen).count(), 3);

    s.checkout_succeeded(Plan::Quarterly);
    assert_eq!(s.slots().len(), MAX_SLOTS);
    assert!(s.view("localhost").slots.iter().all(|v| !v.frozen));
}

#[test]
fn test_freeform_arrangement_walkthrough() {
    let mut s = premium();
    s.apply(Action::SetLayout {
        mode: LayoutMode::Freeform,
    });
    s.apply(Action::ResizeSlot {
        index: 1,
        corner: Corner::Nw,
        pointer: Point::new(620.0, 0.0),
    });
    s.apply(Action::PointerMove {
        pointer: Point::new(670.0, 20.0),
    });
    s.apply(Action::PointerUp);
    assert_eq!(s.slots().slots()[1].frame, Frame::new(670.0, 20.0, 550.0, 380.0));

    s.apply(Action::CycleLayout);
    assert_eq!(s.layout(), LayoutMode::Grid);
    // Geometry survives the trip through grid mode.
    s.apply(Action::CycleLayout);
    assert_eq!(s.slots().slots()[1].frame, Frame::new(670.0, 20.0, 550.0, 380.0));
}

#[test]
fn test_anchor_policy_from_options() {
    let mut s = DashboardSession::new(SessionOptions {
        clamp_policy: ClampPolicy::AnchorOppositeEdge,
        onboarding_completed: true,
        ..SessionOptions::default()
    });
    s.checkout_succeeded(Plan::Monthly);
    s.apply(Action::OpenChat {
        channel: "xqc".into(),
        platform: Platform::Twitch,
    });
    s.apply(Action::ResizeChat {
        index: 0,
        corner: Corner::Nw,
        pointer: Point::new(100.0, 100.0),
    });
    s.apply(Action::PointerMove {
        pointer: Point::new(900.0, 900.0),
    });
    let w = &s.chats().windows()[0];
    // right edge 500, bottom edge 600 stay fixed
    assert_eq!(w.position, Point::new(200.0, 300.0));
    assert_eq!((w.size.width, w.size.height), (300.0, 300.0));
}
