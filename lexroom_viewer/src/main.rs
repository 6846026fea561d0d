mod cli;
mod headless;
mod input;
mod render;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use lexroom_engine::{InputEvent, NarrationBackend, RoomController, SceneLayout, SharedHud};
use pollster::FutureExt;
use wgpu::SurfaceError;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    window::WindowBuilder,
};

use cli::Args;
use input::{PointerTracker, ViewerAction, action_for_key, wheel_event};
use render::RoomRenderer;

type Room = RoomController<Box<dyn NarrationBackend>, SharedHud>;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    let config = args.engine_config()?;
    let script = args.dialogue_script()?;

    if args.headless {
        println!("Headless mode requested; simulating {} frames.", args.frames);
        return headless::run(&args, config, script);
    }

    match args.font_path() {
        Some(path) => {
            if let Err(err) = render::install_font(&path) {
                log::warn!("HUD font unavailable: {err:#}");
            }
        }
        None => log::warn!("no HUD font found; pass --font to enable on-screen text"),
    }

    let hud = SharedHud::new();
    let room = RoomController::new(
        config,
        &SceneLayout::investigation_room(),
        script,
        args.narration_backend(),
        hud.clone(),
    );
    print_banner(&room);

    let event_loop = EventLoop::new().context("creating winit event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Investigation Room")
            .with_inner_size(PhysicalSize::new(1280, 720))
            .build(&event_loop)
            .context("creating viewer window")?,
    );

    let mut renderer = RoomRenderer::new(window, hud).block_on()?;
    let mut room = Some(room);
    if let Some(room) = room.as_mut() {
        let size = renderer.size();
        room.resize(size.width, size.height);
        if args.autoplay {
            room.start_narration_sequence();
        }
    }

    let mut pointer = PointerTracker::default();
    let mut last_frame = Instant::now();

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            if let Event::LoopExiting = event {
                if let Some(room) = room.take() {
                    room.teardown();
                }
                return;
            }
            let Some(active) = room.as_mut() else {
                return;
            };

            match event {
                Event::WindowEvent { window_id, event } if window_id == renderer.window().id() => {
                    match event {
                        WindowEvent::CloseRequested => target.exit(),
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    logical_key,
                                    state: ElementState::Pressed,
                                    ..
                                },
                            ..
                        } => {
                            if let Some(action) = action_for_key(&logical_key) {
                                dispatch(active, action, target);
                            }
                        }
                        WindowEvent::CursorMoved { position, .. } => {
                            if let Some(event) = pointer.moved(position, renderer.size()) {
                                active.handle_input(event);
                            }
                        }
                        WindowEvent::MouseWheel { delta, .. } => {
                            active.handle_input(wheel_event(delta));
                        }
                        WindowEvent::MouseInput {
                            state: ElementState::Pressed,
                            button: MouseButton::Left,
                            ..
                        } => {
                            if let Some(click) = pointer.click() {
                                active.handle_input(click);
                            }
                        }
                        WindowEvent::Resized(new_size) => {
                            renderer.resize(new_size);
                            active.handle_input(InputEvent::Resized {
                                width: new_size.width,
                                height: new_size.height,
                            });
                        }
                        WindowEvent::RedrawRequested => {
                            let now = Instant::now();
                            let dt = now.duration_since(last_frame);
                            last_frame = now;
                            match active.frame(dt, &mut renderer) {
                                Ok(()) => {}
                                Err(SurfaceError::Lost) => renderer.resize(renderer.size()),
                                Err(SurfaceError::OutOfMemory) => target.exit(),
                                Err(err) => log::warn!("render error: {err:?}"),
                            }
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => renderer.window().request_redraw(),
                _ => {}
            }
        })
        .context("running viewer application")?;
    Ok(())
}

fn dispatch(room: &mut Room, action: ViewerAction, target: &EventLoopWindowTarget<()>) {
    match action {
        ViewerAction::Room(event) => room.handle_input(event),
        ViewerAction::StartNarration => {
            if !room.start_narration_sequence() {
                log::debug!("consultation already playing");
            }
        }
        ViewerAction::TogglePosture(actor) => {
            room.toggle_actor_posture(actor);
        }
        ViewerAction::ShowAllInspectables => {
            room.show_all_inspectables();
        }
        ViewerAction::ResetCamera => room.reset_camera(),
        ViewerAction::CloseInspection => room.close_inspection(),
        ViewerAction::Exit => target.exit(),
    }
}

fn print_banner(room: &Room) {
    let scene = room.scene();
    println!(
        "Investigation room: {} nodes, {} inspectable items, {} lights",
        scene.graph.len(),
        scene.graph.inspectables().len(),
        scene.lights.len()
    );
    for (_, metadata) in scene.graph.inspectables() {
        println!("  - {} ({})", metadata.label(), metadata.kind.as_str());
    }
    println!("\nControls:");
    for line in input::KEY_HELP {
        println!("  {line}");
    }
    println!();
}
