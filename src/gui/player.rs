use std::{
    io::stdout,
    sync::{mpsc, Arc},
    time::Duration,
};

use crate::{
    animation_point::{Color, Point, Shape},
    animation_source::AnimationSource,
    config::PlaybackConfig,
    gui::error::GuiError,
    renderer::{AnimationRenderer, DrawSurface, Mark, SystemClock, Viewport},
    trigger::ScheduledTrigger,
};

use crossterm::{
    event::{self, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use log::info;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    style::Color as TermColor,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Circle, Context, Line as CanvasLine, Rectangle},
        Block, Borders,
    },
    Terminal,
};

/// How a terminal playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Display ticks handled
    pub ticks: u64,
    /// `true` if the animation ran to the end, `false` if a key stopped it
    pub finished: bool,
}

/// A [DrawSurface] that collects one frame's worth of drawing and paints it
/// onto a braille [Canvas].
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    area: Rect,
    viewport: Viewport,
    lines: Vec<Vec<Point>>,
    marks: Vec<Mark>,
}

impl Default for CanvasSurface {
    fn default() -> Self {
        CanvasSurface {
            area: Rect::default(),
            viewport: Viewport::fit(None, 1.0, 1.0),
            lines: Vec::new(),
            marks: Vec::new(),
        }
    }
}

impl DrawSurface for CanvasSurface {
    /// Braille cells are 2 dots wide and 4 tall, which keeps the dots about
    /// square on a typical terminal font.
    fn dimensions(&self) -> (f64, f64) {
        let cols = self.area.width.saturating_sub(2).max(1);
        let rows = self.area.height.saturating_sub(2).max(1);
        (f64::from(cols) * 2.0, f64::from(rows) * 4.0)
    }

    fn set_projection(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn clear(&mut self) {
        self.lines.clear();
        self.marks.clear();
    }

    fn draw_polyline(&mut self, points: &[Point]) {
        self.lines.push(points.to_vec());
    }

    fn draw_mark(&mut self, mark: &Mark) {
        self.marks.push(*mark);
    }
}

impl CanvasSurface {
    /// Records the terminal area. Returns `true` if it changed, in which case
    /// the projection needs recomputing.
    pub fn resize(&mut self, area: Rect) -> bool {
        let changed = self.area != area;
        self.area = area;
        changed
    }

    /// The canvas widget for the current frame.
    pub fn canvas<'a>(&'a self, title: &'a str) -> Canvas<'a, impl Fn(&mut Context) + 'a> {
        Canvas::default()
            .block(Block::default().title(title).borders(Borders::ALL))
            .marker(Marker::Braille)
            .x_bounds([self.viewport.left, self.viewport.right])
            .y_bounds([self.viewport.bottom, self.viewport.top])
            .paint(move |ctx| self.paint(ctx))
    }

    fn paint(&self, ctx: &mut Context) {
        for line in &self.lines {
            for pair in line.windows(2) {
                ctx.draw(&segment(pair[0], pair[1], TermColor::Gray));
            }
        }

        for mark in &self.marks {
            let color = term_color(mark.color);
            let Point { x, y } = mark.center;
            let r = mark.radius;

            match mark.shape {
                Shape::Dot => ctx.draw(&Circle {
                    x,
                    y,
                    radius: r,
                    color,
                }),
                Shape::Square => ctx.draw(&Rectangle {
                    x: x - r,
                    y: y - r,
                    width: 2.0 * r,
                    height: 2.0 * r,
                    color,
                }),
                Shape::Cross => {
                    ctx.draw(&segment(Point::new(x - r, y), Point::new(x + r, y), color));
                    ctx.draw(&segment(Point::new(x, y - r), Point::new(x, y + r), color));
                }
                Shape::Diamond => {
                    let corners = [
                        Point::new(x, y + r),
                        Point::new(x + r, y),
                        Point::new(x, y - r),
                        Point::new(x - r, y),
                    ];
                    for (i, &from) in corners.iter().enumerate() {
                        ctx.draw(&segment(from, corners[(i + 1) % corners.len()], color));
                    }
                }
            }
        }
    }
}

fn segment(from: Point, to: Point, color: TermColor) -> CanvasLine {
    CanvasLine {
        x1: from.x,
        y1: from.y,
        x2: to.x,
        y2: to.y,
        color,
    }
}

/// Maps a 0.0-1.0 colour onto 8-bit RGB.
fn term_color(color: Color) -> TermColor {
    let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    TermColor::Rgb(channel(color.r), channel(color.g), channel(color.b))
}

/// Plays `source` in the terminal until it finishes or a key is pressed.
pub fn play(
    source: Arc<dyn AnimationSource + Send + Sync>,
    config: &PlaybackConfig,
) -> Result<PlaybackReport, GuiError> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let res = run_player(&mut terminal, source, config);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_player<B: Backend>(
    terminal: &mut Terminal<B>,
    source: Arc<dyn AnimationSource + Send + Sync>,
    config: &PlaybackConfig,
) -> Result<PlaybackReport, GuiError> {
    let title = format!(
        " {} : press any key to stop ",
        source.animation_sequence().source_name()
    );

    let (done_tx, done_rx) = mpsc::channel();
    let mut renderer = AnimationRenderer::new(SystemClock);
    renderer.add_listener(done_tx);
    renderer.set_source(source);

    let mut surface = CanvasSurface::default();
    let (tick_tx, tick_rx) = mpsc::channel();
    let period = Duration::from_millis(config.refresh_period_ms.max(1));
    let mut trigger = ScheduledTrigger::start(period, tick_tx);
    renderer.start_now();
    info!("Playback started, refreshing every {:?}", period);

    let mut report = PlaybackReport {
        ticks: 0,
        finished: false,
    };

    loop {
        tick_rx.recv()?;
        report.ticks += 1;

        if surface.resize(terminal.size()?) {
            renderer.reshape(&mut surface);
        }
        renderer.display(&mut surface);
        terminal.draw(|frame| {
            let area = frame.size();
            frame.render_widget(surface.canvas(&title), area);
        })?;

        if done_rx.try_recv().is_ok() {
            report.finished = true;
            break;
        }
        if event::poll(Duration::ZERO)? {
            if let event::Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    break;
                }
            }
        }
    }

    trigger.stop();
    info!("Playback stopped after {} ticks", report.ticks);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, buffer::Buffer};

    fn render(surface: &CanvasSurface) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(40, 20)).unwrap();
        terminal
            .draw(|frame| frame.render_widget(surface.canvas("test"), frame.size()))
            .unwrap();
        terminal.backend().buffer().clone()
    }

    #[test]
    fn dimensions_follow_area() {
        let mut surface = CanvasSurface::default();
        assert_eq!(surface.dimensions(), (2.0, 4.0));
        assert!(surface.resize(Rect::new(0, 0, 40, 20)));
        assert!(!surface.resize(Rect::new(0, 0, 40, 20)));
        assert_eq!(surface.dimensions(), (76.0, 72.0));
    }

    #[test]
    fn marks_show_up_and_clear() {
        let mut surface = CanvasSurface::default();
        surface.resize(Rect::new(0, 0, 40, 20));
        surface.set_projection(Viewport::fit(None, 76.0, 72.0));
        let blank = render(&surface);

        for shape in Shape::ALL {
            surface.draw_mark(&Mark {
                shape,
                center: Point::new(2.5, 2.5),
                radius: 1.0,
                color: Color::new(1.0, 1.0, 1.0),
            });
            assert_ne!(render(&surface), blank, "{} not drawn", shape);
            surface.clear();
        }

        surface.draw_polyline(&[Point::new(0.5, 0.5), Point::new(4.5, 4.5)]);
        assert_ne!(render(&surface), blank);
        surface.clear();
        assert_eq!(render(&surface), blank);
    }

    #[test]
    fn colors_map_to_rgb() {
        assert_eq!(
            term_color(Color::new(1.0, 0.5, 2.0)),
            TermColor::Rgb(255, 128, 255)
        );
        assert_eq!(term_color(Color::new(-1.0, 0.0, 0.0)), TermColor::Rgb(0, 0, 0));
    }
}
