//! Connect to a live editor, print every event the session surfaces, and
//! let the session write a CTF archive to disk whenever the editor sends
//! `SAVE_TRACKS`. Requires the `client` feature (the default).

use crocket::session::EventMask;
use crocket::{Mode, Registry, Session};
use std::path::PathBuf;
use std::time::Duration;

fn main() {
    let registry = Registry::new(["test", "test2", "a:test2"]).unwrap();
    let save_path = PathBuf::from("tracks.ctf");
    let mut session = Session::init(registry.clone(), Some(save_path), None, 60.0);

    match session.mode() {
        Mode::Client => println!("connected to the editor"),
        Mode::Player => println!("no editor found, falling back to player mode"),
    }

    let mut time = 0.0f64;
    loop {
        let events = session.update(&mut time);

        if events.contains(EventMask::CONNECT) {
            println!("(re)connected, tracks synced");
        }
        if events.contains(EventMask::DISCONNECT) {
            println!("editor disconnected, will keep retrying");
        }
        if events.contains(EventMask::SEEK) {
            println!("editor moved playback to t={time:.3}");
        }
        if events.contains(EventMask::STOP) {
            println!("editor paused");
        }
        if events.contains(EventMask::PLAY) {
            println!("editor resumed");
        }
        if events.contains(EventMask::SAVE) {
            println!("tracks saved to tracks.ctf");
        }
        if events.contains(EventMask::ACTION) {
            println!("action fired: {:?}", session.pending_action());
        }

        if events.contains(EventMask::PLAYING) {
            time += 1.0 / 60.0;
        }

        for (id, name) in registry.iter() {
            println!("{name}: {:?}", session.get_value(id, time));
        }

        std::thread::sleep(Duration::from_millis(16));
    }
}
