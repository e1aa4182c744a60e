//! Drives an [AnimationSource] from a display callback.
//!
//! The renderer itself draws nothing. On every tick it works out how long
//! the animation has been running, asks the sequence for the frame at that
//! time, and turns the frame into [Mark]s and connecting lines for a
//! [DrawSurface]. When the animation has run its course it tells its
//! listeners, once, over their channels.

use crate::animation_frame::AnimationFrame;
use crate::animation_point::{Color, Point, Shape};
use crate::animation_sequence::Extents;
use crate::animation_source::AnimationSource;

use log::{info, warn};
use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        mpsc::Sender,
        Arc,
    },
    time::{SystemTime, UNIX_EPOCH},
};

/// Width and height of the view used when a sequence has no extents.
const DEFAULT_VIEW_SPAN: f64 = 5.0;

/// A source of "now", in milliseconds.
pub trait Clock {
    #[allow(missing_docs)]
    fn now_millis(&self) -> i64;
}

/// Wall-clock time since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as i64)
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    #[allow(missing_docs)]
    pub fn set(&self, millis: i64) {
        self.0.store(millis, Ordering::SeqCst);
    }

    #[allow(missing_docs)]
    pub fn advance(&self, millis: i64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// The region of animation space mapped onto the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl Viewport {
    /// An orthographic view of `extents` for a surface of the given size.
    ///
    /// The view is centred on the extents and widened along whichever axis is
    /// longer on screen, so the animation keeps its proportions. With no
    /// extents a 5x5 box at (2.5, 2.5) is used.
    pub fn fit(extents: Option<Extents>, width: f64, height: f64) -> Self {
        let height = if height <= 0.0 { 1.0 } else { height };

        let (mut view_width, mut view_height, center) = match extents {
            Some(e) => (e.width, e.height, e.center()),
            None => (
                DEFAULT_VIEW_SPAN,
                DEFAULT_VIEW_SPAN,
                Point::new(DEFAULT_VIEW_SPAN * 0.5, DEFAULT_VIEW_SPAN * 0.5),
            ),
        };

        let aspect = width / height;
        if aspect < 1.0 {
            view_height /= aspect;
        } else {
            view_width *= aspect;
        }

        // offsets from the centre
        view_width *= 0.5;
        view_height *= 0.5;

        Viewport {
            left: center.x - view_width,
            right: center.x + view_width,
            bottom: center.y - view_height,
            top: center.y + view_height,
        }
    }
}

/// One joint, ready to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mark {
    pub shape: Shape,
    pub center: Point,
    /// `disk_radius` scaled by the joint's size
    pub radius: f64,
    /// `color * luminance / 255`, where 1.0 is full intensity. Not clamped:
    /// bright joints can exceed 1.0 and the surface clamps them.
    pub color: Color,
}

/// The drawing collaborator. Coordinates are in animation space; the
/// surface maps them through the last [Viewport] it was given.
pub trait DrawSurface {
    /// Size of the drawable area, in whatever units the surface uses.
    fn dimensions(&self) -> (f64, f64);
    #[allow(missing_docs)]
    fn set_projection(&mut self, viewport: Viewport);
    #[allow(missing_docs)]
    fn clear(&mut self);
    /// A connected line through `points`, in order.
    fn draw_polyline(&mut self, points: &[Point]);
    #[allow(missing_docs)]
    fn draw_mark(&mut self, mark: &Mark);
}

/// Sent to listeners when playback of the current source finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationEvent {
    /// The animation ran past its last frame.
    Done,
}

/// Builds the marks for the first `num_points` located joints of `frame`.
///
/// Colour is the joint's colour times its luminance over 255, falling back
/// to white when the joint has no colour. Per-point luminance wins over
/// frame luminance, and a missing luminance counts as 1.0.
pub fn frame_marks(frame: &AnimationFrame, num_points: usize, disk_radius: f32) -> Vec<Mark> {
    frame
        .joint_locations()
        .iter()
        .take(num_points)
        .filter_map(|dot| {
            let center = dot.location()?;
            let luminance = dot.luminance().or(frame.luminance()).unwrap_or(1.0);
            let color = dot
                .color()
                .map_or(Color::new(1.0, 1.0, 1.0), |c| c.scaled(luminance / 255.0));

            Some(Mark {
                shape: dot.shape(),
                center,
                radius: f64::from(disk_radius) * dot.size().unwrap_or(1.0),
                color,
            })
        })
        .collect()
}

/// The located joints among the first `num_points`, for the connecting line.
pub fn connecting_line(frame: &AnimationFrame, num_points: usize) -> Vec<Point> {
    frame
        .joint_locations()
        .iter()
        .take(num_points)
        .filter_map(|dot| dot.location())
        .collect()
}

/// Plays one [AnimationSource] at a time against a [Clock].
pub struct AnimationRenderer {
    source: Option<Arc<dyn AnimationSource + Send + Sync>>,
    clock: Box<dyn Clock + Send>,
    start_time: i64,
    animated_once: bool,
    extents_dirty: bool,
    listeners: Vec<Sender<AnimationEvent>>,
}

impl AnimationRenderer {
    /// A renderer with no source that reads time from `clock`.
    pub fn new(clock: impl Clock + Send + 'static) -> Self {
        AnimationRenderer {
            source: None,
            clock: Box::new(clock),
            start_time: 0,
            animated_once: true,
            extents_dirty: true,
            listeners: Vec::new(),
        }
    }

    /// Sets the source to play. Playback doesn't begin until
    /// [set_start_time](Self::set_start_time) is called.
    pub fn set_source(&mut self, source: Arc<dyn AnimationSource + Send + Sync>) {
        self.extents_dirty |= match &self.source {
            Some(old) => Arc::as_ptr(old) as *const () != Arc::as_ptr(&source) as *const (),
            None => true,
        };
        self.source = Some(source);
    }

    /// The source being played, if any.
    pub fn source(&self) -> Option<&Arc<dyn AnimationSource + Send + Sync>> {
        self.source.as_ref()
    }

    #[allow(missing_docs)]
    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Restarts playback, treating `start_time` as the moment of frame 0.
    pub fn set_start_time(&mut self, start_time: i64) {
        self.start_time = start_time;
        self.animated_once = false;
    }

    /// Restarts playback from the clock's current time.
    pub fn start_now(&mut self) -> i64 {
        let now = self.clock.now_millis();
        self.set_start_time(now);
        now
    }

    /// Whether the current run has finished (or never started).
    pub fn is_finished(&self) -> bool {
        self.animated_once
    }

    /// Registers a channel to be told when playback finishes.
    pub fn add_listener(&mut self, listener: Sender<AnimationEvent>) {
        self.listeners.push(listener);
    }

    /// Recomputes the projection from the source's extents and the surface
    /// size. Call when the surface is resized.
    pub fn reshape(&mut self, surface: &mut impl DrawSurface) {
        let extents = self
            .source
            .as_ref()
            .and_then(|s| s.animation_sequence().extents());
        let (width, height) = surface.dimensions();
        surface.set_projection(Viewport::fit(extents, width, height));
        self.extents_dirty = false;
    }

    /// One display tick. Returns the frame drawn, if there was one.
    pub fn display(&mut self, surface: &mut impl DrawSurface) -> Option<AnimationFrame> {
        if self.extents_dirty {
            self.reshape(surface);
        }

        surface.clear();

        if self.animated_once {
            return None;
        }
        let source = Arc::clone(self.source.as_ref()?);
        let sequence = source.animation_sequence();

        let current_time = self.clock.now_millis().saturating_sub(self.start_time);
        if current_time > sequence.total_animation_time() {
            self.animated_once = true;
        }

        let frame = sequence.frame_at_time(current_time);
        if let Some(frame) = &frame {
            if source.is_connected() {
                surface.draw_polyline(&connecting_line(frame, source.num_points()));
            }
            for mark in frame_marks(frame, source.num_points(), source.disk_radius()) {
                surface.draw_mark(&mark);
            }
        }

        if self.animated_once {
            info!("{} : animation done.", sequence.source_name());
            self.notify(AnimationEvent::Done);
        }

        frame
    }

    fn notify(&mut self, event: AnimationEvent) {
        self.listeners.retain(|listener| match listener.send(event.clone()) {
            Ok(()) => true,
            Err(error) => {
                warn!("Dropping animation listener : {}.", error);
                false
            }
        });
    }
}
