// Window, event loop and per-frame glue between input, loader and renderer

use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec2;
use tokio::runtime::Handle;
use winit::{
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey, PhysicalKey},
    window::{Window, WindowBuilder},
};

use crate::config::Config;
use crate::error::AppError;
use crate::loader::ModelLoader;
use crate::renderer::Renderer;
use crate::room::{Room, RoomKey};

/// Max pointer travel between the two clicks of a double click, in pixels.
const DOUBLE_CLICK_SLOP: f32 = 4.0;

/// Which mouse button is currently steering the orbit controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrbitDrag {
    Rotate,
    Pan,
}

pub struct App {
    window: Arc<Window>,
    renderer: Renderer,
    room: Room,
    loader: ModelLoader,
    cursor: Vec2,
    shift_held: bool,
    orbit_drag: Option<OrbitDrag>,
    last_click: Option<(Instant, Vec2)>,
    double_click_window: Duration,
    last_frame: Instant,
}

impl App {
    pub async fn new(event_loop: &EventLoop<()>, config: Config, runtime: Handle) -> Result<Self, AppError> {
        // Create window with Arc for shared ownership
        let window = Arc::new(
            WindowBuilder::new()
                .with_title("Room Decor")
                .build(event_loop)?,
        );
        let size = window.inner_size();

        let renderer = Renderer::new(window.clone(), config.asset_root.clone()).await?;
        let double_click_window = Duration::from_millis(config.double_click_ms);
        let room = Room::new(config, Vec2::new(size.width.max(1) as f32, size.height.max(1) as f32));

        Ok(Self {
            window,
            renderer,
            room,
            loader: ModelLoader::new(runtime),
            cursor: Vec2::ZERO,
            shift_held: false,
            orbit_drag: None,
            last_click: None,
            double_click_window,
            last_frame: Instant::now(),
        })
    }

    pub fn run(mut self, event_loop: EventLoop<()>) -> Result<(), AppError> {
        event_loop.run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { window_id, event } if window_id == self.window.id() => match event {
                    WindowEvent::CloseRequested => target.exit(),
                    WindowEvent::Resized(size) => {
                        self.renderer.resize(size.width, size.height);
                        if size.width > 0 && size.height > 0 {
                            self.room.resize(size.width as f32, size.height as f32);
                        }
                    }
                    WindowEvent::RedrawRequested => self.update_and_render(),
                    WindowEvent::KeyboardInput { event, .. } => self.handle_keyboard_input(event),
                    WindowEvent::ModifiersChanged(modifiers) => {
                        self.shift_held = modifiers.state().shift_key();
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        let pointer = Vec2::new(position.x as f32, position.y as f32);
                        self.handle_cursor_moved(pointer);
                    }
                    WindowEvent::MouseInput { state, button, .. } => self.handle_mouse_input(state, button),
                    WindowEvent::MouseWheel { delta, .. } => {
                        let amount = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
                        };
                        self.room.controls_mut().zoom(amount);
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    self.window.request_redraw();
                }
                _ => {}
            }
        })?;
        Ok(())
    }

    fn handle_cursor_moved(&mut self, pointer: Vec2) {
        let delta = pointer - self.cursor;
        self.cursor = pointer;

        if self.room.pointer_move(pointer, self.shift_held) {
            return;
        }
        match self.orbit_drag {
            Some(OrbitDrag::Rotate) => self.room.controls_mut().rotate_by_pixels(delta),
            Some(OrbitDrag::Pan) => {
                let camera = *self.room.camera();
                self.room.controls_mut().pan_by_pixels(delta, &camera);
            }
            None => {}
        }
    }

    fn handle_mouse_input(&mut self, state: ElementState, button: MouseButton) {
        match (button, state) {
            (MouseButton::Left, ElementState::Pressed) => {
                if self.is_double_click() {
                    self.last_click = None;
                    self.room.double_click(self.cursor);
                    return;
                }
                self.last_click = Some((Instant::now(), self.cursor));
                self.room.pointer_down(self.cursor);
                if !self.room.interaction().is_dragging() {
                    self.orbit_drag = Some(OrbitDrag::Rotate);
                }
            }
            (MouseButton::Left, ElementState::Released) => {
                self.orbit_drag = None;
                self.room.pointer_up();
            }
            (MouseButton::Right, ElementState::Pressed) => self.orbit_drag = Some(OrbitDrag::Pan),
            (MouseButton::Right, ElementState::Released) => self.orbit_drag = None,
            _ => {}
        }
    }

    fn is_double_click(&self) -> bool {
        self.last_click.is_some_and(|(at, pos)| {
            at.elapsed() <= self.double_click_window && pos.distance(self.cursor) <= DOUBLE_CLICK_SLOP
        })
    }

    fn handle_keyboard_input(&mut self, event: KeyEvent) {
        let is_pressed = event.state == ElementState::Pressed;
        if let PhysicalKey::Code(keycode) = event.physical_key {
            self.room.keys_mut().handle_key(keycode, is_pressed);
        }
        if !is_pressed || event.repeat {
            return;
        }

        let key = match &event.logical_key {
            Key::Named(NamedKey::Escape) => Some(RoomKey::Escape),
            Key::Named(NamedKey::Delete | NamedKey::Backspace) => Some(RoomKey::Delete),
            Key::Character(text) => match text.to_lowercase().as_str() {
                "i" => Some(RoomKey::ToggleInventory),
                "q" => Some(RoomKey::RotateLeft),
                "e" => Some(RoomKey::RotateRight),
                other => other
                    .parse::<usize>()
                    .ok()
                    .filter(|digit| (1..=9).contains(digit))
                    .map(RoomKey::Digit),
            },
            _ => None,
        };
        if let Some(key) = key {
            self.room.key_pressed(key);
        }
    }

    fn update_and_render(&mut self) {
        let now = Instant::now();
        // Clamp so a stalled frame does not teleport the camera.
        let dt = now.duration_since(self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        while let Some(completion) = self.loader.try_next() {
            self.room.apply_completion(completion);
        }
        for request in self.room.take_load_requests() {
            self.loader.request(request);
        }

        self.room.tick(dt);
        self.renderer.render(self.room.scene(), self.room.camera());
    }
}
