//! Load a previously saved CTF archive and play it back standalone, with
//! no editor connection. Works even with `--no-default-features`, since
//! CTF decoding and the track engine are always compiled.

use crocket::{Registry, Session};
use std::time::Duration;

fn main() {
    let registry = Registry::new(["test", "test2", "a:test2"]).unwrap();
    let data = std::fs::read("tracks.ctf").expect("run examples/edit.rs first to create tracks.ctf");

    let mut session = Session::init(registry.clone(), None, Some(&data), 60.0);
    println!("loaded tracks.ctf, playing back in {:?} mode", session.mode());

    let mut time = 0.0f64;
    loop {
        session.update(&mut time);

        for (id, name) in registry.iter() {
            println!("{name}: {:?} (time: {time:.3})", session.get_value(id, time));
        }

        time += 1.0 / 30.0;
        std::thread::sleep(Duration::from_millis(32));
    }
}
