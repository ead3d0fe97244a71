use std::time::Duration;

use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, info};

use crate::{enums::Plane, view_state::Views, viewer::InputEvent};

pub const DEFAULT_PERIOD: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CineState {
    #[default]
    Stopped,
    Running,
}

/// Frame sequencer driving all three slice indices from one shared counter.
///
/// Each start bumps the generation; ticks carrying an older generation are
/// dropped, so a cancelled timer can never move the views.
#[derive(Debug)]
pub struct CinePlayer {
    state: CineState,
    period: Duration,
    frame_cursor: usize,
    max_extent: usize,
    generation: u64,
}

impl Default for CinePlayer {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}

impl CinePlayer {
    pub fn new(period: Duration) -> Self {
        Self {
            state: CineState::Stopped,
            period,
            frame_cursor: 0,
            max_extent: 0,
            generation: 0,
        }
    }

    pub fn state(&self) -> CineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == CineState::Running
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn frame_cursor(&self) -> usize {
        self.frame_cursor
    }

    pub fn max_extent(&self) -> usize {
        self.max_extent
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Begin playback from the furthest of the current slice indices.
    ///
    /// Returns the generation that ticks for this run must carry.
    pub fn start(&mut self, views: &Views) -> u64 {
        self.max_extent = views.iter().map(|view| view.dimension()).max().unwrap_or(0);
        self.frame_cursor = views.iter().map(|view| view.slice_index()).max().unwrap_or(0);
        self.generation += 1;
        self.state = CineState::Running;
        info!(
            frame = self.frame_cursor,
            max_extent = self.max_extent,
            generation = self.generation,
            "cine started"
        );
        self.generation
    }

    pub fn stop(&mut self) {
        if self.is_running() {
            info!(frame = self.frame_cursor, "cine stopped");
        }
        self.state = CineState::Stopped;
    }

    /// Start when stopped, stop when running.
    pub fn toggle(&mut self, views: &Views) -> CineState {
        match self.state {
            CineState::Stopped => {
                self.start(views);
            }
            CineState::Running => self.stop(),
        }
        self.state
    }

    /// Advance one frame and move every plane that is long enough to reach it.
    ///
    /// Returns the new frame, or `None` when stopped or `generation` is stale.
    pub fn tick(&mut self, generation: u64, views: &mut Views) -> Option<usize> {
        if !self.is_running() || generation != self.generation || self.max_extent == 0 {
            return None;
        }
        self.frame_cursor = (self.frame_cursor + 1) % self.max_extent;
        for plane in Plane::ALL {
            if views[plane].dimension() > self.frame_cursor {
                views[plane].set_slice_index(self.frame_cursor);
            }
        }
        debug!(frame = self.frame_cursor, "cine tick");
        Some(self.frame_cursor)
    }
}

/// Repeating timer posting [`InputEvent::CineTick`] onto the control channel.
///
/// The first tick fires one period after spawning. Dropping the timer aborts
/// the task.
#[derive(Debug)]
pub struct CineTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

impl CineTimer {
    pub fn spawn(period: Duration, generation: u64, events: UnboundedSender<InputEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if events.send(InputEvent::CineTick { generation }).is_err() {
                    break;
                }
            }
        });
        Self { generation, handle }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for CineTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
