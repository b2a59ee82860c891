//! Decorative roaming avatar.
//!
//! A small sprite wanders the primary screen on its own 50 ms loop,
//! independent of monitoring. This module only computes positions and
//! streams them as [`AvatarFrame`]s; drawing the sprite is left to
//! whatever window layer consumes the channel.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use rand::Rng;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Width and height of the sprite window, in pixels.
pub const SPRITE_SIZE: f64 = 100.0;

/// Interval between movement steps.
pub const STEP_INTERVAL: Duration = Duration::from_millis(50);

/// Pixels travelled per step.
pub const SPEED: f64 = 2.0;

/// Distance at which the current target counts as reached.
pub const ARRIVAL_RADIUS: f64 = 10.0;

const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Screen area the avatar may roam, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Largest x for the sprite's top-left corner.
    pub fn max_x(&self) -> f64 {
        (self.width - SPRITE_SIZE).max(0.0)
    }

    /// Largest y for the sprite's top-left corner.
    pub fn max_y(&self) -> f64 {
        (self.height - SPRITE_SIZE).max(0.0)
    }

    fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        (random_upto(rng, self.max_x()), random_upto(rng, self.max_y()))
    }

    fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (x.clamp(0.0, self.max_x()), y.clamp(0.0, self.max_y()))
    }
}

fn random_upto<R: Rng + ?Sized>(rng: &mut R, max: f64) -> f64 {
    if max > 0.0 {
        rng.gen_range(0.0..max)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Left,
    Right,
}

/// Sprite placement for one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AvatarFrame {
    pub x: f64,
    pub y: f64,
    pub facing: Facing,
}

impl AvatarFrame {
    /// Position rounded to whole pixels.
    pub fn pixel(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

/// Seek-steering movement toward random targets.
#[derive(Debug, Clone)]
pub struct Roamer {
    bounds: Bounds,
    x: f64,
    y: f64,
    target: (f64, f64),
    facing: Facing,
}

impl Roamer {
    /// Place the avatar and its first target at random points.
    pub fn new<R: Rng + ?Sized>(bounds: Bounds, rng: &mut R) -> Self {
        let (x, y) = bounds.random_point(rng);
        let target = bounds.random_point(rng);
        Self {
            bounds,
            x,
            y,
            target,
            facing: Facing::Right,
        }
    }

    /// Start at a fixed position with a fixed target.
    pub fn at(bounds: Bounds, position: (f64, f64), target: (f64, f64)) -> Self {
        let (x, y) = bounds.clamp(position.0, position.1);
        Self {
            bounds,
            x,
            y,
            target,
            facing: Facing::Right,
        }
    }

    pub fn frame(&self) -> AvatarFrame {
        AvatarFrame {
            x: self.x,
            y: self.y,
            facing: self.facing,
        }
    }

    pub fn target(&self) -> (f64, f64) {
        self.target
    }

    /// Advance one step.
    ///
    /// Returns the new frame, or `None` when the target was reached and a
    /// new one picked instead of moving.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<AvatarFrame> {
        let dx = self.target.0 - self.x;
        let dy = self.target.1 - self.y;
        let distance = dx.hypot(dy);

        if distance < ARRIVAL_RADIUS {
            self.target = self.bounds.random_point(rng);
            return None;
        }

        let vx = dx / distance * SPEED;
        let vy = dy / distance * SPEED;
        (self.x, self.y) = self.bounds.clamp(self.x + vx, self.y + vy);

        if vx > 0.0 {
            self.facing = Facing::Right;
        } else if vx < 0.0 {
            self.facing = Facing::Left;
        }

        Some(self.frame())
    }
}

/// Owns the avatar loop thread.
pub struct RoamingAvatar {
    bounds: Bounds,
    marker: Option<String>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
    sender: Sender<AvatarFrame>,
    receiver: Receiver<AvatarFrame>,
}

impl RoamingAvatar {
    pub fn new(bounds: Bounds) -> Self {
        let (sender, receiver) = bounded(FRAME_CHANNEL_CAPACITY);
        Self {
            bounds,
            marker: None,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
            sender,
            receiver,
        }
    }

    /// Start roaming with `marker` as the sprite. A no-op while enabled.
    pub fn enable(&mut self, marker: &str) -> bool {
        if self.running.load(Ordering::SeqCst) {
            return false;
        }

        self.running.store(true, Ordering::SeqCst);
        self.marker = Some(marker.to_string());

        let running = self.running.clone();
        let sender = self.sender.clone();
        let bounds = self.bounds;

        self.thread_handle = Some(thread::spawn(move || {
            roam(bounds, sender, running);
        }));

        info!(marker, "avatar enabled");
        true
    }

    /// Stop roaming and join the loop thread.
    pub fn disable(&mut self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }

        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                warn!("avatar thread panicked");
            }
        }
        self.marker = None;

        info!("avatar disabled");
        true
    }

    pub fn is_enabled(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    /// Position stream, one frame per movement step.
    pub fn frames(&self) -> &Receiver<AvatarFrame> {
        &self.receiver
    }
}

impl Drop for RoamingAvatar {
    fn drop(&mut self) {
        self.disable();
    }
}

fn roam(bounds: Bounds, sender: Sender<AvatarFrame>, running: Arc<AtomicBool>) {
    let mut rng = rand::thread_rng();
    let mut roamer = Roamer::new(bounds, &mut rng);
    let _ = sender.try_send(roamer.frame());

    while running.load(Ordering::SeqCst) {
        thread::sleep(STEP_INTERVAL);

        if let Some(frame) = roamer.step(&mut rng) {
            match sender.try_send(frame) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => break,
            }
        }
    }

    debug!("avatar loop exited");
}
