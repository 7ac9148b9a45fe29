/// Terminal viewer: drives a render session from terminal mouse and key events
use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use gable_core::{
    Axis, ManualScheduler, ProjectionStrategy, RenderSession, SvgDocument, ViewerConfig, Viewport,
};
use log::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{stdout, Write};
use std::time::{Duration, Instant};

pub mod frame;
pub mod logging;
pub mod renderer;

pub use frame::TickScheduler;
pub use renderer::CellRenderer;

/// One wheel notch, in zoom units.
pub const WHEEL_STEP: f64 = 120.0;

/// Keyboard turn per key press (radians).
const KEY_TURN: f64 = 0.1;

const TARGET_FPS: u32 = 30;

const HELP: &str = "Drag/A/D=Rotate Wheel/+/-=Zoom M=Projection Q=Quit";

/// Matrix strategy used when toggled on without explicit planes.
pub fn default_matrix_strategy(config: &ViewerConfig) -> ProjectionStrategy {
    ProjectionStrategy::MatrixPerspective {
        near: 1.0,
        far: config.building.max_dimension() * config.zoom_max_factor * 10.0,
    }
}

/// Render a single frame to an SVG document.
pub fn render_svg_snapshot(config: &ViewerConfig, seed: u64, viewport: Viewport) -> Result<String> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut session = RenderSession::new(config, ManualScheduler::new(), &mut rng)
        .context("failed to build the render session")?;

    let mut doc = SvgDocument::new(viewport);
    session.attach(&mut doc);
    session.on_load(viewport);
    let report = session.frame(&mut doc)?;
    if let Some(report) = report {
        info!(
            "snapshot painted {} points ({} skipped)",
            report.stats.projected, report.stats.skipped
        );
    }
    Ok(doc.render())
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    session: RenderSession<TickScheduler>,
    renderer: CellRenderer,
    matrix_strategy: ProjectionStrategy,
    running: bool,
    last_fps_at: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(config: &ViewerConfig, seed: u64) -> Result<Self> {
        let (columns, rows) = terminal::size()?;
        let renderer = CellRenderer::new(columns as usize, rows as usize);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let session = RenderSession::new(config, TickScheduler::with_fps(TARGET_FPS), &mut rng)
            .context("failed to build the render session")?;

        let matrix_strategy = match config.projection {
            ProjectionStrategy::SimplePinhole => default_matrix_strategy(config),
            strategy => strategy,
        };

        Ok(Self {
            session,
            renderer,
            matrix_strategy,
            running: true,
            last_fps_at: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn viewport(&self) -> Viewport {
        let (width, height) = self.renderer.pixel_size();
        Viewport::new(width as f64, height as f64)
    }

    fn main_loop(&mut self) -> Result<()> {
        self.session.attach(&mut self.renderer);
        self.session.on_load(self.viewport());

        while self.running {
            let now = Instant::now();
            let wait = self
                .session
                .scheduler()
                .time_until_due(now)
                .unwrap_or(Duration::from_millis(250));

            if event::poll(wait)? {
                self.handle_event(event::read()?);
                // Drain whatever else arrived so a burst of drags costs one frame.
                while event::poll(Duration::from_millis(0))? {
                    self.handle_event(event::read()?);
                }
            }

            if self.session.scheduler_mut().take_due(Instant::now()) {
                self.render()?;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(columns, rows) => {
                self.renderer.resize(columns as usize, rows as usize);
                self.session.on_resize(self.viewport());
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, KeyEvent { code, kind, .. }: KeyEvent) {
        if kind == KeyEventKind::Release {
            return;
        }
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('a') | KeyCode::Left => self.session.rotate_by(Axis::Y, -KEY_TURN),
            KeyCode::Char('d') | KeyCode::Right => self.session.rotate_by(Axis::Y, KEY_TURN),
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => {
                self.session.on_wheel(WHEEL_STEP)
            }
            KeyCode::Char('-') | KeyCode::Down => self.session.on_wheel(-WHEEL_STEP),
            KeyCode::Char('m') => {
                let next = match self.session.strategy() {
                    ProjectionStrategy::SimplePinhole => self.matrix_strategy,
                    ProjectionStrategy::MatrixPerspective { .. } => {
                        ProjectionStrategy::SimplePinhole
                    }
                };
                if let Err(err) = self.session.set_strategy(next) {
                    warn!("projection not switched: {err}");
                }
            }
            _ => {}
        }
    }

    /// Mouse rows map to the top pixel of each half-block cell.
    fn handle_mouse(&mut self, MouseEvent { kind, column, row, .. }: MouseEvent) {
        let (x, y) = (column as f64, row as f64 * 2.0);
        match kind {
            MouseEventKind::Down(MouseButton::Left) => self.session.on_pointer_down(x, y),
            MouseEventKind::Drag(MouseButton::Left) => self.session.on_pointer_move(x, y),
            MouseEventKind::Up(MouseButton::Left) => self.session.on_pointer_up(),
            MouseEventKind::ScrollUp => self.session.on_wheel(WHEEL_STEP),
            MouseEventKind::ScrollDown => self.session.on_wheel(-WHEEL_STEP),
            _ => {}
        }
    }

    fn render(&mut self) -> Result<()> {
        match self.session.frame(&mut self.renderer) {
            Ok(Some(_)) => self.renderer.rasterize(),
            Ok(None) => return Ok(()),
            Err(err) => {
                warn!("frame skipped: {err}");
                return Ok(());
            }
        }

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        self.frame_count += 1;
        let now = Instant::now();
        if (now - self.last_fps_at).as_secs() >= 1 {
            self.fps = self.frame_count as f32 / (now - self.last_fps_at).as_secs_f32();
            self.frame_count = 0;
            self.last_fps_at = now;
        }

        // Draw UI overlay
        let mode = match self.session.strategy() {
            ProjectionStrategy::SimplePinhole => "pinhole",
            ProjectionStrategy::MatrixPerspective { .. } => "matrix",
        };
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Gable | FPS: {:.1} | zoom {:.0} | {} | {}",
                self.fps,
                self.session.zoom().value,
                mode,
                HELP
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_contains_every_polygon() {
        let svg =
            render_svg_snapshot(&ViewerConfig::default(), 1, Viewport::new(320.0, 240.0)).unwrap();
        assert_eq!(svg.matches("<polygon").count(), 7);
        assert!(svg.contains(r#"width="320""#));
    }

    #[test]
    fn test_default_matrix_strategy_is_valid() {
        let config = ViewerConfig {
            projection: default_matrix_strategy(&ViewerConfig::default()),
            ..ViewerConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
