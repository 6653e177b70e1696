//! Pocket IPTV - remote-style live TV player core
//!
//! Console shell over the playback session: loads a playlist (URL or
//! local file, falling back to the persisted catalog and then to the
//! demo channels), then maps stdin commands onto the remote buttons.

use std::io::{self, BufRead, Write};

use log::info;

mod catalog;
mod config;
mod fetch;
mod m3u_parser;
mod models;
mod session;
mod storage;

use config::OverlaySettings;
use m3u_parser::SequentialIds;
use session::{MediaSink, PlaybackSession, SinkEvent};
use storage::FileStore;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Sink that logs the commands a real video surface would receive. The
/// shell immediately feeds a Ready completion back after each load to
/// stand in for the asynchronous "can play" callback.
#[derive(Default)]
struct ConsoleSink {
    last_token: Option<u64>,
}

impl MediaSink for ConsoleSink {
    fn load(&mut self, url: &str, token: u64) {
        self.last_token = Some(token);
        info!("sink: load {}", url);
    }
    fn play(&mut self) {
        info!("sink: play");
    }
    fn stop(&mut self) {
        info!("sink: stop");
    }
    fn set_volume(&mut self, volume: u8) {
        info!("sink: volume {}", volume);
    }
    fn set_muted(&mut self, muted: bool) {
        info!("sink: muted {}", muted);
    }
}

fn print_status(session: &PlaybackSession<ConsoleSink>) {
    let now_playing = match session.current_channel() {
        Some(ch) if session.power() => ch.name.clone(),
        _ => "Power off - Select Channel".to_string(),
    };
    println!(
        "[{}] {} | vol {}{} | category {}",
        if session.power() { "ON" } else { "OFF" },
        now_playing,
        session.volume(),
        if session.muted() { " (muted)" } else { "" },
        session.current_category(),
    );
}

fn print_grid(session: &PlaybackSession<ConsoleSink>) {
    println!("-- {} Channels --", session.current_category());
    for ch in session.filtered_channels() {
        let idx = session.catalog().index_of(&ch.id).unwrap_or(0);
        let marker = if session.current_index() == Some(idx) { ">" } else { " " };
        println!("{} {:3}  {:24} {}", marker, idx + 1, ch.name, ch.category_or_default());
    }
}

/// Drain queued notices and the simulated sink completion after each
/// command, the way the UI event loop would between renders.
fn pump(session: &mut PlaybackSession<ConsoleSink>) {
    if let Some(token) = session.sink_mut().last_token.take() {
        session.handle_sink_event(SinkEvent::Ready { token });
    }
    for notice in session.take_notices() {
        println!("* {}", notice);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let source = std::env::args().nth(1).unwrap_or_else(|| "tv.m3u".to_string());

    let mut store = FileStore::load();
    let overlay = OverlaySettings::load(&store);
    if overlay.watermark.visible {
        info!("Watermark: {} at {}%/{}%", overlay.watermark.url, overlay.watermark.top, overlay.watermark.left);
    }

    let text = match fetch::fetch_playlist(&[source.clone()], USER_AGENT) {
        Ok(text) => text,
        Err(e) => {
            info!("{}; continuing with persisted catalog", e);
            String::new()
        }
    };

    let mut ids = SequentialIds::default();
    let mut session = PlaybackSession::new(catalog::ChannelCatalog::new(), ConsoleSink::default());
    let outcome = session.load_playlist(&text, &mut store, &mut ids);
    info!("Catalog ready ({:?}, {} channels)", outcome, session.catalog().len());

    println!("Commands: p=power  +/-=channel  u/d=volume  m=mute  c/C=category  l=list  f=rotate  s <q>=search  q=quit");
    print_status(&session);

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();

        match input {
            "q" => break,
            "p" => session.toggle_power(),
            "+" => session.change_channel(1),
            "-" => session.change_channel(-1),
            "u" => session.adjust_volume(10),
            "d" => session.adjust_volume(-10),
            "m" => {
                let muted = !session.muted();
                session.set_muted(muted);
            }
            "c" => session.cycle_category(1),
            "C" => session.cycle_category(-1),
            "f" => session.toggle_fullscreen(),
            "l" => print_grid(&session),
            "" => {}
            _ => {
                if let Some(query) = input.strip_prefix("s ") {
                    match session.catalog().find(query) {
                        Some(idx) => session.select_channel(idx),
                        None => println!("* Not Found"),
                    }
                } else if let Ok(num) = input.parse::<usize>() {
                    if num >= 1 {
                        session.select_channel(num - 1);
                    }
                } else {
                    println!("* Unknown command: {}", input);
                }
            }
        }

        pump(&mut session);
        print_status(&session);
    }

    info!("Goodbye");
}
