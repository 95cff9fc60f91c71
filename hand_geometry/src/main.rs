//! Interactive probe: type four points, see the ordered quadrilateral and the
//! controls both mapping modes would produce.

use hand_geometry::{build_shape, MappingMode, Point};
use std::io::{self, BufRead, Write};

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║          Hand Shape → Audio Control Probe            ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  Coordinates are normalized: x, y in 0–1, y grows downward.");
    println!();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    while let Some(quad) = read_quad(&mut input) {
        let shape = build_shape(quad);

        println!();
        println!("  ┌─ Ordered shape ─");
        for (i, p) in shape.points.iter().enumerate() {
            println!("  │  [{}] ({:.3}, {:.3})   side → next: {:.4}", i, p.x, p.y, shape.sides[i]);
        }
        println!("  │  Average side : {:.4}", shape.average_side());
        println!("  │  Area         : {:.5}", shape.area);
        let bb = shape.bounding_box();
        println!("  │  Bounding box : {:.3} × {:.3}", bb.width(), bb.height());
        println!("  │");

        for mode in [MappingMode::AverageSide, MappingMode::bounding_box()] {
            let raw = mode.raw(&shape);
            let c   = raw.clamp();
            println!(
                "  │  {:<13}: pitch {:+3} st (raw {:+.0})   speed {:.2}x (raw {:.3})",
                mode.name(), c.pitch_semitones, raw.pitch, c.playback_rate, raw.playback_rate,
            );
        }
        println!("  └─");
        println!();
    }
    println!("\nGoodbye!\n");
}

/// Prompt for four points.  `None` on `q`, on an empty first point, or when
/// the input ends.
fn read_quad<R: BufRead>(input: &mut R) -> Option<[Point; 4]> {
    let mut points = Vec::with_capacity(4);
    while points.len() < 4 {
        let line = read_line(input, &format!("  Point {} as \"x y\" (q to quit): ", points.len() + 1))?;
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") || line.is_empty() && points.is_empty() {
            return None;
        }
        match parse_point(line) {
            Some(p) => points.push(p),
            None    => println!("  ⚠  Expected two numbers, e.g. 0.4 0.25"),
        }
    }
    Some([points[0], points[1], points[2], points[3]])
}

fn parse_point(line: &str) -> Option<Point> {
    let mut it = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse::<f64>);
    let x = it.next()?.ok()?;
    let y = it.next()?.ok()?;
    match it.next() {
        None         => Some(Point::new(x, y)),
        Some(Ok(z))  => Some(Point::with_depth(x, y, z)),
        Some(Err(_)) => None,
    }
}

fn read_line<R: BufRead>(input: &mut R, prompt: &str) -> Option<String> {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_)          => Some(buf),
    }
}
