//! Thin CLI wrapper: load a map and fire one trace between two points.
//!
//! This is pure glue over the library's query surface — no tracing logic
//! lives here.
use main_error::MainError;
use std::env;
use vbsp_trace::{BspMap, TraceResult, Vector};

fn parse_point(arg: &str) -> Option<Vector> {
    let mut parts = arg.split(',');
    let x: f32 = parts.next()?.parse().ok()?;
    let y: f32 = parts.next()?.parse().ok()?;
    let z: f32 = parts.next()?.parse().ok()?;
    Some(Vector::new(x, y, z))
}

fn main() -> Result<(), MainError> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let directory = args.next().unwrap_or_else(|| ".".to_string());
    let map_name = args
        .next()
        .expect("usage: trace <directory> <map_name> <x,y,z> <x,y,z>");
    let from = args
        .next()
        .as_deref()
        .and_then(parse_point)
        .expect("origin must be formatted as x,y,z");
    let to = args
        .next()
        .as_deref()
        .and_then(parse_point)
        .expect("destination must be formatted as x,y,z");

    let map = BspMap::new();
    if !map.load_map(&directory, &map_name) {
        eprintln!(
            "failed to load {map_name}: {}",
            map.last_error().unwrap_or_default()
        );
        std::process::exit(1);
    }

    let mut result = TraceResult::default();
    map.trace_ray(from, to, &mut result);

    if result.fraction >= 1.0 {
        println!("unobstructed: reached {:?}", result.end_pos);
    } else {
        println!(
            "blocked at fraction {:.4}, position {:?}, plane {:?}, contents {:?}",
            result.fraction, result.end_pos, result.plane, result.contents
        );
    }

    Ok(())
}
