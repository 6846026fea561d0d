use std::time::Duration;

use anyhow::Result;
use glam::{Vec2, Vec3};
use lexroom_engine::narration::NarrationCall;
use lexroom_engine::overlay::OverlayEvent;
use lexroom_engine::picking::nearest_hit;
use lexroom_engine::{
    ActorId, CountingRenderer, DialogueScript, EngineConfig, InputEvent, KeyCommand, Posture,
    RecordingBackend, RecordingOverlay, RoomController, SceneLayout,
};

const FRAME: Duration = Duration::from_millis(16);

type Room = RoomController<RecordingBackend, RecordingOverlay>;

fn room() -> (Room, RecordingBackend, RecordingOverlay) {
    let backend = RecordingBackend::new();
    let overlay = RecordingOverlay::new();
    let room = RoomController::new(
        EngineConfig::default(),
        &SceneLayout::investigation_room(),
        DialogueScript::default(),
        backend.clone(),
        overlay.clone(),
    );
    (room, backend, overlay)
}

fn run_frames(room: &mut Room, renderer: &mut CountingRenderer, frames: u32) {
    for _ in 0..frames {
        room.frame(FRAME, renderer).unwrap();
    }
}

fn pixel_for(room: &Room, world: Vec3) -> Vec2 {
    let (width, height) = room.viewport();
    let ndc = room.camera().view_projection().project_point3(world);
    Vec2::new(
        (ndc.x + 1.0) * 0.5 * width as f32,
        (1.0 - ndc.y) * 0.5 * height as f32,
    )
}

#[test]
fn wheel_zoom_never_leaves_bounds() {
    let (mut room, _, _) = room();
    let mut renderer = CountingRenderer::default();
    for _ in 0..20 {
        room.handle_input(InputEvent::Wheel { delta_y: 50.0 });
        room.frame(FRAME, &mut renderer).unwrap();
        assert!(room.camera().distance() <= 20.0);
    }
    assert!((room.camera().distance() - 18.0).abs() < 1e-4);

    for _ in 0..10 {
        room.handle_input(InputEvent::Wheel { delta_y: 50.0 });
        room.frame(FRAME, &mut renderer).unwrap();
        assert!(room.camera().distance() <= 20.0);
    }
    assert_eq!(room.camera().distance(), 20.0);

    for _ in 0..40 {
        room.handle_input(InputEvent::Wheel { delta_y: -75.0 });
        room.handle_input(InputEvent::Key(KeyCommand::ZoomIn));
        room.frame(FRAME, &mut renderer).unwrap();
        assert!(room.camera().distance() >= 5.0);
    }
    assert_eq!(room.camera().distance(), 5.0);
}

#[test]
fn full_script_plays_in_order_and_completes() {
    let (mut room, backend, overlay) = room();
    let mut renderer = CountingRenderer::default();
    let script = DialogueScript::default();
    let settle = Duration::from_millis(EngineConfig::default().narration.settle_ms);

    assert!(room.start_narration_sequence());
    // a second start while playing is ignored
    assert!(!room.start_narration_sequence());

    let mut frames = 0;
    while room.narration().is_active() {
        room.frame(FRAME, &mut renderer).unwrap();
        let talking = ActorId::ALL
            .iter()
            .filter(|id| room.animation().is_talking(**id))
            .count();
        assert!(talking <= 1, "both actors talking at {:?}", room.now());
        frames += 1;
        assert!(frames < 10_000, "narration never completed");
    }

    assert!(!room.animation().is_talking(ActorId::Lawyer));
    assert!(!room.animation().is_talking(ActorId::Client));

    let expected: Vec<String> = script.entries().iter().map(|e| e.text.clone()).collect();
    assert_eq!(backend.spoken(), expected);

    let starts = room.narration().entry_start_times();
    assert_eq!(starts.len(), script.len());
    for (index, pair) in starts.windows(2).enumerate() {
        let gap = pair[1] - pair[0];
        assert!(gap >= script.entries()[index].duration() + settle);
    }

    let last = overlay.last_dialogue().expect("no dialogue shown");
    assert_eq!(last.text, expected[expected.len() - 1]);
    assert_eq!(overlay.last_status().as_deref(), Some("Meeting completed"));
}

#[test]
fn every_frame_draws_exactly_once() {
    let (mut room, _, _) = room();
    let mut renderer = CountingRenderer::default();
    room.start_narration_sequence();
    room.show_all_inspectables();
    run_frames(&mut room, &mut renderer, 240);
    assert_eq!(renderer.draws, 240);
    assert_eq!(renderer.last_frame, Some(240));
    assert_eq!(renderer.last_mesh_count, room.scene().graph.meshes().count());
}

#[test]
fn lights_toggled_twice_return_to_baseline() {
    let (mut room, _, overlay) = room();
    let mut renderer = CountingRenderer::default();

    room.handle_input(InputEvent::Key(KeyCommand::ToggleLights));
    room.frame(FRAME, &mut renderer).unwrap();
    assert_eq!(renderer.last_light_total, 0.0);
    assert_eq!(overlay.last_status().as_deref(), Some("Lights Off"));

    room.toggle_lights();
    room.frame(FRAME, &mut renderer).unwrap();
    for (light, intensity) in room.lighting().lights() {
        assert_eq!(intensity, light.baseline, "{}", light.name);
    }
    assert_eq!(overlay.last_status().as_deref(), Some("Lights On"));
}

#[test]
fn desk_lamp_flickers_only_during_narration() {
    let (mut room, _, _) = room();
    let mut renderer = CountingRenderer::default();
    room.start_narration_sequence();
    let mut varied = false;
    for _ in 0..30 {
        room.frame(FRAME, &mut renderer).unwrap();
        let lamp = room.lighting().intensity("desk_lamp").unwrap();
        assert!(lamp <= 2.5 + 1e-5);
        varied |= (lamp - 2.5).abs() > 1e-3;
    }
    assert!(varied);
}

#[test]
fn floor_click_changes_nothing() {
    let (mut room, _, overlay) = room();
    let mut renderer = CountingRenderer::default();
    room.frame(FRAME, &mut renderer).unwrap();

    let pixel = pixel_for(&room, Vec3::new(2.5, 0.0, 4.5));
    let ray = room.ray_at(pixel.x, pixel.y).unwrap();
    let hit = nearest_hit(&room.scene().graph, &ray).unwrap();
    let name = &room.scene().graph.node(hit.node).unwrap().name;
    assert!(name.starts_with("floor"), "hit {name}");

    let events_before = overlay.events().len();
    room.handle_input(InputEvent::Click {
        x: pixel.x,
        y: pixel.y,
    });
    room.frame(FRAME, &mut renderer).unwrap();

    assert!(!room.camera().is_focused());
    assert_eq!(overlay.events().len(), events_before);
}

#[test]
fn document_click_focuses_and_releases() {
    // orbit a quarter turn so the camera looks across the table from the side
    let mut config = EngineConfig::default();
    config.camera.button_rotate_step = std::f32::consts::FRAC_PI_2;
    let overlay = RecordingOverlay::new();
    let mut room = RoomController::new(
        config,
        &SceneLayout::investigation_room(),
        DialogueScript::default(),
        RecordingBackend::new(),
        overlay.clone(),
    );
    let mut renderer = CountingRenderer::default();
    room.rotate_right();
    run_frames(&mut room, &mut renderer, 400);
    assert!((room.camera().eye() - Vec3::new(8.0, 2.5, 0.0)).length() < 1e-3);

    let contract = room.scene().documents[3];
    let position = room.scene().graph.world_position(contract).unwrap();
    let pixel = pixel_for(&room, position);
    assert_eq!(room.pick_at(pixel.x, pixel.y), Some(contract));
    assert!(room.camera().is_focused());
    assert_eq!(
        overlay.last_status().as_deref(),
        Some("Viewing: LEGAL CONTRACT")
    );

    // five second hold, then the panel closes and orbit resumes
    run_frames(&mut room, &mut renderer, 320);
    assert!(!room.camera().is_focused());
    assert_eq!(overlay.events().last(), Some(&OverlayEvent::HideInspection));
}

#[test]
fn pointer_moved_during_focus_still_counts_after_release() {
    let (mut room, _, _) = room();
    let mut renderer = CountingRenderer::default();
    assert!(room.focus_inspectable(room.scene().documents[0]));

    room.handle_input(InputEvent::PointerMoved { dx: 1.0, dy: 0.0 });
    run_frames(&mut room, &mut renderer, 320);
    assert!(!room.camera().is_focused());

    room.handle_input(InputEvent::PointerMoved { dx: -1.0, dy: 0.0 });
    room.frame(FRAME, &mut renderer).unwrap();
    assert_eq!(room.camera().pointer_influence(), Vec2::ZERO);
}

#[test]
fn tour_visits_inspectables_on_interval() {
    let (mut room, _, _) = room();
    let mut renderer = CountingRenderer::default();
    let order: Vec<_> = room
        .scene()
        .graph
        .inspectables()
        .map(|(id, _)| id)
        .collect();

    assert_eq!(room.show_all_inspectables(), order.len());
    room.frame(FRAME, &mut renderer).unwrap();
    assert_eq!(room.focus_target().map(|(id, _)| id), Some(order[0]));

    // just past the two second mark
    run_frames(&mut room, &mut renderer, 125);
    assert_eq!(room.focus_target().map(|(id, _)| id), Some(order[1]));
    assert_eq!(room.pending_tour(), order.len() - 2);
}

#[test]
fn posture_toggle_leaves_talking_alone() {
    let (mut room, _, _) = room();
    let mut renderer = CountingRenderer::default();
    room.start_narration_sequence();
    room.frame(FRAME, &mut renderer).unwrap();
    assert!(room.animation().is_talking(ActorId::Lawyer));

    assert_eq!(room.toggle_actor_posture(ActorId::Lawyer), Some(Posture::Standing));
    assert!(room.animation().is_talking(ActorId::Lawyer));

    // height eases towards standing rather than snapping
    room.frame(FRAME, &mut renderer).unwrap();
    let height = room.animation().actor(ActorId::Lawyer).unwrap().height;
    assert!(height > 0.0 && height < 0.6, "{height}");

    room.toggle_actor_posture(ActorId::Lawyer);
    assert_eq!(room.animation().posture(ActorId::Lawyer), Some(Posture::Sitting));
}

#[test]
fn teardown_stops_backend_and_timers() -> Result<()> {
    let (mut room, backend, _) = room();
    let mut renderer = CountingRenderer::default();
    room.start_narration_sequence();
    run_frames(&mut room, &mut renderer, 10);

    let (returned, _) = room.teardown();
    assert_eq!(backend.calls().last(), Some(&NarrationCall::Stop));
    assert_eq!(returned.spoken().len(), 1);
    Ok(())
}
