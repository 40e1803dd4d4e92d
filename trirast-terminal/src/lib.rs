/// Command-line front end and terminal preview for the trirast rasterizer
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use trirast_core::{Camera, Scene, Transform, Vector};

pub mod assemble;
pub mod cli;
pub mod commands;
pub mod demo;
pub mod preview;

pub use preview::TerminalCanvas;

/// Radians per arrow-key press
const ORBIT_STEP: f32 = 0.1;
/// Keeps the camera off the poles, where `up` would be parallel to the view
const MAX_PITCH: f32 = 1.5;

/// Camera position on a sphere around its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    target: Vector,
    radius: f32,
    yaw: f32,
    pitch: f32,
}

impl Orbit {
    pub fn from_camera(camera: &Camera) -> Self {
        let offset = camera.position() - camera.target();
        let radius = offset.norm();
        Self {
            target: camera.target(),
            radius,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / radius).clamp(-1.0, 1.0).asin().clamp(-MAX_PITCH, MAX_PITCH),
        }
    }

    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        self.yaw += yaw;
        self.pitch = (self.pitch + pitch).clamp(-MAX_PITCH, MAX_PITCH);
    }

    pub fn position(&self) -> Vector {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + Vector::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.radius
    }

    /// `camera` moved to this orbit position, keeping its lens settings.
    pub fn apply(&self, camera: &Camera) -> Result<Camera, trirast_core::RenderError> {
        Camera::new(
            self.position(),
            self.target,
            camera.up(),
            camera.fov(),
            camera.near_plane(),
            camera.far_plane(),
        )
    }
}

/// Plays a scene's animation in the terminal
pub struct TerminalPreview {
    scene: Scene,
    transform: Transform,
    orbit: Orbit,
    canvas: TerminalCanvas,
    frame_time: Duration,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalPreview {
    pub fn new(scene: Scene, transform: Transform, target_fps: u32) -> io::Result<Self> {
        let (columns, rows) = terminal::size()?;
        let orbit = Orbit::from_camera(scene.camera());

        Ok(Self {
            scene,
            transform,
            orbit,
            // Top row is the status line
            canvas: TerminalCanvas::new(columns as usize, rows.saturating_sub(1) as usize),
            frame_time: Duration::from_millis(1000 / target_fps.max(1) as u64),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            self.update();
            self.render()?;

            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_time {
                std::thread::sleep(self.frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                match code {
                    KeyCode::Char('q') | KeyCode::Esc => self.running = false,
                    KeyCode::Left => self.orbit_camera(-ORBIT_STEP, 0.0),
                    KeyCode::Right => self.orbit_camera(ORBIT_STEP, 0.0),
                    KeyCode::Up => self.orbit_camera(0.0, ORBIT_STEP),
                    KeyCode::Down => self.orbit_camera(0.0, -ORBIT_STEP),
                    _ => {}
                }
            }
            Event::Resize(columns, rows) => {
                self.canvas =
                    TerminalCanvas::new(columns as usize, rows.saturating_sub(1) as usize);
            }
            _ => {}
        }
    }

    fn orbit_camera(&mut self, yaw: f32, pitch: f32) {
        let mut orbit = self.orbit;
        orbit.rotate(yaw, pitch);
        match orbit.apply(self.scene.camera()) {
            Ok(camera) => {
                self.orbit = orbit;
                self.scene.set_camera(camera);
            }
            Err(e) => log::warn!("ignoring camera move: {e}"),
        }
    }

    fn update(&mut self) {
        let transform = &self.transform;
        self.scene.transform_triangles(|t| transform.apply(t));
    }

    fn compose(&self) -> Option<trirast_core::Framebuffer> {
        let (width, height) = self.canvas.frame_size();
        #[cfg(feature = "parallel")]
        let frame = self.scene.compose_frame_parallel(width, height);
        #[cfg(not(feature = "parallel"))]
        let frame = self.scene.compose_frame(width, height);
        // A zero-sized terminal has nothing to draw
        frame.ok()
    }

    fn render(&mut self) -> io::Result<()> {
        let mut stdout = stdout();

        if let Some(frame) = self.compose() {
            queue!(stdout, cursor::MoveTo(0, 1))?;
            self.canvas.draw(&frame, &mut stdout)?;
        }

        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "trirast | {} triangles | FPS: {:.1} | Arrows=Orbit Q=Quit",
                self.scene.len(),
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
