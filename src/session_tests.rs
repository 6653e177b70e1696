//! Tests for the playback session state machine

use super::*;
use crate::catalog::ChannelCatalog;

/// Records every sink command so tests can assert the exact sequence.
#[derive(Debug, Default)]
struct RecordingSink {
    ops: Vec<SinkOp>,
}

#[derive(Debug, Clone, PartialEq)]
enum SinkOp {
    Load(String, u64),
    Play,
    Stop,
    Volume(u8),
    Muted(bool),
}

impl MediaSink for RecordingSink {
    fn load(&mut self, url: &str, token: u64) {
        self.ops.push(SinkOp::Load(url.to_string(), token));
    }
    fn play(&mut self) {
        self.ops.push(SinkOp::Play);
    }
    fn stop(&mut self) {
        self.ops.push(SinkOp::Stop);
    }
    fn set_volume(&mut self, volume: u8) {
        self.ops.push(SinkOp::Volume(volume));
    }
    fn set_muted(&mut self, muted: bool) {
        self.ops.push(SinkOp::Muted(muted));
    }
}

impl RecordingSink {
    fn last_load(&self) -> Option<(&str, u64)> {
        self.ops.iter().rev().find_map(|op| match op {
            SinkOp::Load(url, token) => Some((url.as_str(), *token)),
            _ => None,
        })
    }
}

fn channel(id: &str, name: &str, category: &str) -> Channel {
    Channel {
        id: id.to_string(),
        name: name.to_string(),
        url: format!("http://example.com/{}.m3u8", id),
        logo: None,
        category: Some(category.to_string()),
    }
}

fn session_with(channels: Vec<Channel>) -> PlaybackSession<RecordingSink> {
    let mut catalog = ChannelCatalog::new();
    catalog.replace(channels);
    PlaybackSession::new(catalog, RecordingSink::default())
}

fn three_channel_session() -> PlaybackSession<RecordingSink> {
    session_with(vec![
        channel("1", "Alpha", "News"),
        channel("2", "Beta", "News"),
        channel("3", "Gamma", "Sports"),
    ])
}

#[test]
fn test_power_on_selects_first_channel() {
    let mut session = three_channel_session();
    assert!(!session.power());

    session.toggle_power();
    assert!(session.power());
    assert_eq!(session.current_index(), Some(0));
    assert!(session.loading());
    assert_eq!(
        session.sink.last_load().map(|(url, _)| url.to_string()),
        Some("http://example.com/1.m3u8".to_string())
    );
}

#[test]
fn test_power_on_with_empty_catalog_selects_nothing() {
    let mut session = session_with(Vec::new());
    session.toggle_power();
    assert!(session.power());
    assert_eq!(session.current_index(), None);
    assert!(session.sink.ops.is_empty());
}

#[test]
fn test_power_off_stops_sink_and_keeps_index() {
    let mut session = three_channel_session();
    session.select_channel(1);
    session.toggle_power();

    assert!(!session.power());
    assert_eq!(session.sink.ops.last(), Some(&SinkOp::Stop));
    // Index survives in memory but playback needs explicit re-selection
    assert_eq!(session.current_index(), Some(1));
    assert!(!session.loading());
}

#[test]
fn test_select_while_off_powers_on_then_loads() {
    let mut session = three_channel_session();
    session.select_channel(2);

    assert!(session.power());
    assert_eq!(session.current_index(), Some(2));
    let (url, _) = session.sink.last_load().unwrap();
    assert_eq!(url, "http://example.com/3.m3u8");
    assert_eq!(session.sink.ops.last(), Some(&SinkOp::Play));
}

#[test]
fn test_select_out_of_range_is_noop() {
    let mut session = three_channel_session();
    session.select_channel(3);
    assert!(!session.power());
    assert_eq!(session.current_index(), None);
    assert!(session.sink.ops.is_empty());
}

#[test]
fn test_change_channel_wraps_both_directions() {
    let mut session = three_channel_session();
    session.select_channel(2);
    session.change_channel(1);
    assert_eq!(session.current_index(), Some(0));

    session.change_channel(-1);
    assert_eq!(session.current_index(), Some(2));
}

#[test]
fn test_change_channel_from_unselected() {
    let mut session = three_channel_session();
    session.change_channel(1);
    assert_eq!(session.current_index(), Some(0));

    let mut session = three_channel_session();
    session.change_channel(-1);
    assert_eq!(session.current_index(), Some(1));
}

#[test]
fn test_change_channel_walks_full_catalog_not_filtered_view() {
    let mut session = three_channel_session();
    // Narrow the grid to Sports and kill Beta; cycling must ignore both
    session.cycle_category(1);
    session.cycle_category(1);
    assert_eq!(session.current_category(), "Sports");

    session.select_channel(0);
    let token = session.sink.last_load().unwrap().1;
    session.handle_sink_event(SinkEvent::Error { token });
    assert!(session.catalog().is_dead("1"));

    // AutoAdvance landed on 1; +1 again must reach the dead-free index 2
    assert_eq!(session.current_index(), Some(1));
    session.change_channel(1);
    assert_eq!(session.current_index(), Some(2));
    session.change_channel(1);
    // Wraps back over the dead channel 0 as well
    assert_eq!(session.current_index(), Some(0));
}

#[test]
fn test_change_channel_on_empty_catalog_is_noop() {
    let mut session = session_with(Vec::new());
    session.change_channel(1);
    assert_eq!(session.current_index(), None);
    assert!(session.sink.ops.is_empty());
}

#[test]
fn test_cycle_category_wraps_and_leaves_playback_alone() {
    let mut session = three_channel_session();
    session.select_channel(0);
    let loads_before = session.sink.ops.len();

    assert_eq!(session.current_category(), "All");
    session.cycle_category(-1);
    assert_eq!(session.current_category(), "Sports");
    session.cycle_category(1);
    session.cycle_category(1);
    assert_eq!(session.current_category(), "News");

    assert_eq!(session.current_index(), Some(0));
    assert_eq!(session.sink.ops.len(), loads_before);
}

#[test]
fn test_adjust_volume_clamps_and_unmutes() {
    let mut session = three_channel_session();
    session.set_muted(true);
    assert!(session.muted());

    session.adjust_volume(10);
    assert_eq!(session.volume(), 90);
    assert!(!session.muted());

    session.adjust_volume(100);
    assert_eq!(session.volume(), 100);
    session.adjust_volume(-250);
    assert_eq!(session.volume(), 0);

    let notices = session.take_notices();
    assert!(notices.iter().any(|n| n == "Volume 90%"));
}

#[test]
fn test_adjust_volume_extreme_deltas() {
    let mut session = three_channel_session();
    session.adjust_volume(i16::MAX);
    assert_eq!(session.volume(), 100);
    session.adjust_volume(i16::MIN);
    assert_eq!(session.volume(), 0);
}

#[test]
fn test_session_over_default_catalog_stays_controllable() {
    let mut session = PlaybackSession::new(ChannelCatalog::default(), RecordingSink::default());
    assert_eq!(session.current_category(), "All");
    session.cycle_category(1);
    assert_eq!(session.current_category(), "All");
    session.toggle_power();
    assert!(session.power());
}

#[test]
fn test_set_muted_does_not_touch_volume() {
    let mut session = three_channel_session();
    session.set_muted(true);
    assert_eq!(session.volume(), 80);
    session.set_muted(false);
    assert_eq!(session.volume(), 80);
}

#[test]
fn test_error_marks_channel_dead_and_filters_it_out() {
    let mut session = three_channel_session();
    session.select_channel(0);
    let token = session.sink.last_load().unwrap().1;

    session.handle_sink_event(SinkEvent::Error { token });
    assert!(session.catalog().is_dead("1"));

    // Gone from the grid immediately, and stays gone across category cycles
    assert!(!session.filtered_channels().iter().any(|c| c.id == "1"));
    session.cycle_category(1);
    assert!(!session.filtered_channels().iter().any(|c| c.id == "1"));
    session.cycle_category(1);
    assert!(!session.filtered_channels().iter().any(|c| c.id == "1"));

    assert!(session.take_notices().iter().any(|n| n == "Channel Load Error"));
}

#[test]
fn test_error_auto_advances_by_default() {
    let mut session = three_channel_session();
    session.select_channel(0);
    let token = session.sink.last_load().unwrap().1;

    session.handle_sink_event(SinkEvent::Error { token });
    assert_eq!(session.current_index(), Some(1));
    assert!(session.loading());
}

#[test]
fn test_manual_policy_stays_on_dead_channel() {
    let mut catalog = ChannelCatalog::new();
    catalog.replace(vec![
        channel("1", "Alpha", "News"),
        channel("2", "Beta", "News"),
    ]);
    let mut session = PlaybackSession::new(catalog, RecordingSink::default())
        .with_policy(ErrorPolicy::Manual);

    session.select_channel(0);
    let token = session.sink.last_load().unwrap().1;
    session.handle_sink_event(SinkEvent::Error { token });

    assert!(session.catalog().is_dead("1"));
    // Still nominally selected, just absent from filtered views
    assert_eq!(session.current_index(), Some(0));
    assert!(!session.loading());
}

#[test]
fn test_stale_completion_cannot_overwrite_newer_selection() {
    let mut session = three_channel_session();
    session.select_channel(0);
    let stale = session.sink.last_load().unwrap().1;
    session.select_channel(1);

    // Late error from the superseded load: no dead mark, no advance
    session.handle_sink_event(SinkEvent::Error { token: stale });
    assert!(!session.catalog().is_dead("1"));
    assert_eq!(session.current_index(), Some(1));
    assert!(session.loading());

    // Late ready from the superseded load must not clear loading either
    session.handle_sink_event(SinkEvent::Ready { token: stale });
    assert!(session.loading());

    let current = session.sink.last_load().unwrap().1;
    session.handle_sink_event(SinkEvent::Ready { token: current });
    assert!(!session.loading());
}

#[test]
fn test_power_off_cancels_inflight_interest() {
    let mut session = three_channel_session();
    session.select_channel(0);
    let token = session.sink.last_load().unwrap().1;

    session.toggle_power();
    session.handle_sink_event(SinkEvent::Error { token });
    assert!(!session.catalog().is_dead("1"));
}

#[test]
fn test_ended_advances_to_next_channel() {
    let mut session = three_channel_session();
    session.select_channel(2);
    let token = session.sink.last_load().unwrap().1;

    session.handle_sink_event(SinkEvent::Ended { token });
    assert_eq!(session.current_index(), Some(0));
}

#[test]
fn test_catalog_replacement_invalidates_selection() {
    let mut session = three_channel_session();
    session.select_channel(1);
    assert_eq!(session.current_index(), Some(1));

    let mut store = crate::storage::MemoryStore::default();
    let mut ids = crate::m3u_parser::SequentialIds::default();
    let playlist = "#EXTINF:-1,Fresh One\nhttp://example.com/fresh.m3u8\n";
    session.load_playlist(playlist, &mut store, &mut ids);

    assert_eq!(session.current_index(), None);
    assert_eq!(session.current_channel(), None);
    assert_eq!(session.current_category(), "All");
}

#[test]
fn test_notices_drain_in_order() {
    let mut session = three_channel_session();
    session.toggle_power();
    session.adjust_volume(5);

    let notices = session.take_notices();
    assert_eq!(notices[0], "System Starting...");
    assert!(notices.iter().any(|n| n == "Volume 85%"));
    assert!(session.take_notices().is_empty());
}
