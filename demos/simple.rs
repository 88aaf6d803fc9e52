//! A minimal host loop: declare two tracks, build a session, and sample
//! them once per simulated frame. Works with or without the `client`
//! feature — without it, `Session::init` always settles into `Player`
//! mode and these values read whatever was loaded from a CTF file (none,
//! here, so they stay at their keyframe default of 0.0).

use crocket::{Mode, Registry, Session};
use std::time::Duration;

fn main() {
    let registry = Registry::new(["test", "test2", "a:test2"]).unwrap();
    let mut session = Session::init(registry.clone(), None, None, 60.0);

    println!("starting in {:?} mode", session.mode());

    let mut time = 0.0f64;
    loop {
        let events = session.update(&mut time);

        if matches!(session.mode(), Mode::Client) {
            if events.contains(crocket::EventMask::CONNECT) {
                println!("connected, tracks synced");
            }
            if events.contains(crocket::EventMask::DISCONNECT) {
                println!("lost the editor connection");
            }
        }

        for (id, name) in registry.iter() {
            let value = session.get_value(id, time);
            println!("{name}: {value:?} (time: {time:.3})");
        }

        time += 1.0 / 30.0;
        std::thread::sleep(Duration::from_millis(32));
    }
}
