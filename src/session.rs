//! Playback session state machine
//!
//! Owns the transient player state (power, selection, category cursor,
//! volume) and drives a `MediaSink` through channel changes. Sink
//! completions are asynchronous; every load carries a monotonic request
//! token and only the event matching the latest token may mutate state,
//! so a stale completion can never overwrite a newer selection.

use std::collections::VecDeque;

use log::{debug, info};

use crate::catalog::{ChannelCatalog, IngestOutcome};
use crate::m3u_parser::IdSource;
use crate::models::Channel;
use crate::storage::PersistenceGateway;

/// Commands the session issues to the video-rendering collaborator.
/// Loads are fire-and-forget; completion arrives later as a `SinkEvent`
/// carrying the same token.
pub trait MediaSink {
    fn load(&mut self, url: &str, token: u64);
    fn play(&mut self);
    fn stop(&mut self);
    fn set_volume(&mut self, volume: u8);
    fn set_muted(&mut self, muted: bool);
}

/// Asynchronous completions reported back by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    Loading { token: u64 },
    Ready { token: u64 },
    Ended { token: u64 },
    Error { token: u64 },
}

impl SinkEvent {
    fn token(&self) -> u64 {
        match *self {
            SinkEvent::Loading { token }
            | SinkEvent::Ready { token }
            | SinkEvent::Ended { token }
            | SinkEvent::Error { token } => token,
        }
    }
}

/// What to do when the active channel fails to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Mark the channel dead and hop to the next one.
    #[default]
    AutoAdvance,
    /// Mark the channel dead and wait for manual navigation.
    Manual,
}

pub struct PlaybackSession<S: MediaSink> {
    catalog: ChannelCatalog,
    sink: S,
    policy: ErrorPolicy,

    power: bool,
    current: Option<usize>,
    selected_generation: u64,
    category_cursor: usize,
    volume: u8,
    muted: bool,
    fullscreen: bool,
    loading: bool,

    next_token: u64,
    active: Option<u64>,
    notices: VecDeque<String>,
}

impl<S: MediaSink> PlaybackSession<S> {
    pub fn new(catalog: ChannelCatalog, sink: S) -> Self {
        let generation = catalog.generation();
        Self {
            catalog,
            sink,
            policy: ErrorPolicy::default(),
            power: false,
            current: None,
            selected_generation: generation,
            category_cursor: 0,
            volume: 80,
            muted: false,
            fullscreen: false,
            loading: false,
            next_token: 0,
            active: None,
            notices: VecDeque::new(),
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn catalog(&self) -> &ChannelCatalog {
        &self.catalog
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn power(&self) -> bool {
        self.power
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Index of the selected channel, `None` when nothing is selected or
    /// the selection predates the current catalog generation.
    pub fn current_index(&self) -> Option<usize> {
        if self.selected_generation == self.catalog.generation() {
            self.current
        } else {
            None
        }
    }

    pub fn current_channel(&self) -> Option<&Channel> {
        self.current_index().and_then(|idx| self.catalog.get(idx))
    }

    pub fn current_category(&self) -> &str {
        self.catalog
            .categories()
            .get(self.category_cursor)
            .map(String::as_str)
            .unwrap_or("All")
    }

    /// The grid view: current category, dead channels excluded.
    pub fn filtered_channels(&self) -> Vec<&Channel> {
        self.catalog.filtered_by(self.current_category())
    }

    /// User-visible notices queued since the last drain (the toast feed).
    pub fn take_notices(&mut self) -> Vec<String> {
        self.notices.drain(..).collect()
    }

    fn notify(&mut self, msg: String) {
        self.notices.push_back(msg);
    }

    /// Drop a selection that refers to a replaced catalog generation.
    fn reconcile(&mut self) {
        if self.selected_generation != self.catalog.generation() {
            self.current = None;
            self.loading = false;
            self.active = None;
            self.category_cursor = 0;
            self.selected_generation = self.catalog.generation();
        }
    }

    /// Rebuild the catalog from playlist text (with snapshot/demo
    /// fallback) and invalidate any stale selection.
    pub fn load_playlist(
        &mut self,
        text: &str,
        store: &mut dyn PersistenceGateway,
        ids: &mut dyn IdSource,
    ) -> IngestOutcome {
        let outcome = self.catalog.ingest(text, store, ids);
        self.reconcile();
        outcome
    }

    pub fn toggle_power(&mut self) {
        if !self.power {
            self.power = true;
            self.notify("System Starting...".to_string());
            if !self.catalog.is_empty() {
                self.select_channel(0);
            }
        } else {
            self.power = false;
            self.notify("Powering Off".to_string());
            // Cancel interest in any in-flight load
            self.active = None;
            self.loading = false;
            self.sink.stop();
        }
    }

    /// Select and start loading a channel. Out-of-range indices are a
    /// silent no-op (presentation-layer mistakes, not user input).
    /// Powers on first if needed.
    pub fn select_channel(&mut self, idx: usize) {
        self.reconcile();
        let url = match self.catalog.get(idx) {
            Some(ch) => ch.url.clone(),
            None => {
                debug!("select_channel({}) out of range, ignored", idx);
                return;
            }
        };
        if !self.power {
            self.power = true;
        }
        self.current = Some(idx);
        self.selected_generation = self.catalog.generation();
        self.loading = true;
        self.next_token += 1;
        self.active = Some(self.next_token);
        info!("Tuning channel {} -> {}", idx, url);
        self.sink.load(&url, self.next_token);
        self.sink.play();
    }

    /// Hop ±1 through the **full unfiltered** catalog with wrap-around.
    /// Category filtering and the dead set are deliberately ignored here;
    /// cycling always walks the physical list.
    pub fn change_channel(&mut self, direction: i32) {
        self.reconcile();
        let len = self.catalog.len() as i64;
        if len == 0 {
            return;
        }
        let cur = self.current.map(|i| i as i64).unwrap_or(-1);
        let next = (cur + direction as i64).rem_euclid(len) as usize;
        self.select_channel(next);
    }

    /// Advance the category cursor; playback is untouched, only the grid
    /// view changes.
    pub fn cycle_category(&mut self, direction: i32) {
        self.reconcile();
        let len = self.catalog.categories().len() as i64;
        let next = (self.category_cursor as i64 + direction as i64).rem_euclid(len) as usize;
        self.category_cursor = next;
        let label = self.current_category().to_string();
        self.notify(format!("Category: {}", label));
    }

    /// Clamp to [0, 100]. Any manual volume change audibly un-mutes.
    pub fn adjust_volume(&mut self, delta: i16) {
        let volume = (self.volume as i32 + delta as i32).clamp(0, 100) as u8;
        self.volume = volume;
        self.muted = false;
        self.sink.set_muted(false);
        self.sink.set_volume(volume);
        self.notify(format!("Volume {}%", volume));
    }

    /// Independent of the numeric volume value.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.sink.set_muted(muted);
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
    }

    /// Feed one asynchronous sink completion back into the session.
    /// Events whose token is not the latest in-flight request are stale
    /// and ignored wholesale.
    pub fn handle_sink_event(&mut self, event: SinkEvent) {
        if self.active != Some(event.token()) {
            debug!("Ignoring stale sink event {:?}", event);
            return;
        }
        match event {
            SinkEvent::Loading { .. } => {
                self.loading = true;
            }
            SinkEvent::Ready { .. } => {
                self.loading = false;
            }
            SinkEvent::Ended { .. } => {
                self.change_channel(1);
            }
            SinkEvent::Error { .. } => {
                self.loading = false;
                self.active = None;
                if let Some(id) = self.current_channel().map(|ch| ch.id.clone()) {
                    self.catalog.mark_dead(&id);
                }
                self.notify("Channel Load Error".to_string());
                if self.policy == ErrorPolicy::AutoAdvance {
                    self.change_channel(1);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
