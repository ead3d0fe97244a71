use tokio::sync::mpsc::{
    self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender, error::SendError,
};
use tracing::{debug, warn};

use crate::{
    cine::CineTimer,
    viewer::{InputEvent, MprViewer},
};

/// Cloneable sender for feeding events into a running [`EventLoop`].
#[derive(Debug, Clone)]
pub struct ViewerHandle {
    events: UnboundedSender<InputEvent>,
}

impl ViewerHandle {
    pub fn send(&self, event: InputEvent) -> Result<(), SendError<InputEvent>> {
        self.events.send(event)
    }
}

/// Control loop that owns the viewer. All state changes, cine ticks
/// included, run here one event at a time.
pub struct EventLoop {
    viewer: MprViewer,
    events: UnboundedReceiver<InputEvent>,
    sender: WeakUnboundedSender<InputEvent>,
    timer: Option<CineTimer>,
}

impl EventLoop {
    pub fn new(viewer: MprViewer) -> (ViewerHandle, Self) {
        let (sender, events) = mpsc::unbounded_channel();
        let event_loop = Self {
            viewer,
            events,
            sender: sender.downgrade(),
            timer: None,
        };
        (ViewerHandle { events: sender }, event_loop)
    }

    pub fn viewer(&self) -> &MprViewer {
        &self.viewer
    }

    /// Process events until [`InputEvent::Shutdown`] arrives or the channel
    /// closes, then hand the viewer back. A running cine timer keeps the
    /// channel open after the last [`ViewerHandle`] is dropped.
    ///
    /// Must run inside a tokio runtime; the timer is a spawned task.
    pub async fn run(mut self) -> MprViewer {
        while let Some(event) = self.events.recv().await {
            if matches!(event, InputEvent::Shutdown) {
                debug!("event loop shutting down");
                break;
            }
            if let Err(err) = self.viewer.handle(event) {
                warn!(%err, "event rejected");
            }
            self.sync_timer();
        }
        self.timer = None;
        self.viewer.stop_cine();
        self.viewer
    }

    // Keep exactly one timer for the running generation, none when stopped.
    fn sync_timer(&mut self) {
        let cine = self.viewer.cine();
        if !cine.is_running() {
            self.timer = None;
            return;
        }
        let generation = cine.generation();
        if self.timer.as_ref().map(CineTimer::generation) == Some(generation) {
            return;
        }
        let period = cine.period();
        match self.sender.upgrade() {
            Some(sender) => self.timer = Some(CineTimer::spawn(period, generation, sender)),
            None => {
                self.timer = None;
                self.viewer.stop_cine();
            }
        }
    }
}
