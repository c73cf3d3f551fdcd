//! Waypoint layouts around a search center.

use warden_core::{DeterministicRng, Vec3};

use crate::{SearchPattern, SearchPatternConfig};

/// `count` points evenly spaced on a circle, starting along +X.
pub fn circular(center: Vec3, radius: f32, count: u32) -> Vec<Vec3> {
    if count == 0 {
        return Vec::new();
    }
    let step = 360.0 / count as f32;
    (0..count)
        .map(|i| center + Vec3::from_yaw_degrees(step * i as f32) * radius)
        .collect()
}

/// `size x size` lattice spanning the square of half-width `radius`, column by column.
pub fn grid(center: Vec3, radius: f32, size: u32) -> Vec<Vec3> {
    if size < 2 {
        return vec![center];
    }
    let spacing = radius * 2.0 / (size - 1) as f32;
    let mut points = Vec::with_capacity((size * size) as usize);
    for x in 0..size {
        for y in 0..size {
            points.push(
                center
                    + Vec3::new(
                        -radius + spacing * x as f32,
                        -radius + spacing * y as f32,
                        0.0,
                    ),
            );
        }
    }
    points
}

/// Archimedean spiral from the center out to `radius` over `turns` revolutions.
pub fn spiral(center: Vec3, radius: f32, count: u32, turns: u32) -> Vec<Vec3> {
    if count == 0 {
        return Vec::new();
    }
    let step = 360.0 * turns as f32 / count as f32;
    let last = count.saturating_sub(1).max(1) as f32;
    (0..count)
        .map(|i| {
            let r = radius * (i as f32 / last);
            center + Vec3::from_yaw_degrees(step * i as f32) * r
        })
        .collect()
}

/// Boustrophedon sweep: `lines` rows across the square, alternating direction.
pub fn linear(center: Vec3, radius: f32, count: u32, lines: u32) -> Vec<Vec3> {
    if lines < 2 {
        return vec![center];
    }
    let line_spacing = radius * 2.0 / (lines - 1) as f32;
    let per_line = (count / lines).max(2);
    let x_spacing = radius * 2.0 / (per_line - 1) as f32;

    let mut points = Vec::with_capacity((lines * per_line) as usize);
    for line in 0..lines {
        let y = -radius + line_spacing * line as f32;
        for i in 0..per_line {
            let x = if line % 2 == 0 {
                -radius + x_spacing * i as f32
            } else {
                radius - x_spacing * i as f32
            };
            points.push(center + Vec3::new(x, y, 0.0));
        }
    }
    points
}

/// Random points in the ring between 30% and 100% of `radius`.
pub fn random(
    center: Vec3,
    radius: f32,
    count: u32,
    rng: &mut dyn DeterministicRng,
) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            let angle = rng.next_f32_range(0.0, 360.0);
            let r = rng.next_f32_range(radius * 0.3, radius);
            center + Vec3::from_yaw_degrees(angle) * r
        })
        .collect()
}

/// Layout selected by `config`, before navigation snapping.
pub fn generate(
    config: &SearchPatternConfig,
    center: Vec3,
    rng: &mut dyn DeterministicRng,
) -> Vec<Vec3> {
    let radius = config.search_radius;
    match config.pattern {
        SearchPattern::Circular => circular(center, radius, config.point_count),
        SearchPattern::Grid => grid(center, radius, config.grid_size),
        SearchPattern::Spiral => spiral(center, radius, config.point_count, config.spiral_turns),
        SearchPattern::Linear => linear(center, radius, config.point_count, config.linear_lines),
        SearchPattern::Random => random(center, radius, config.point_count, rng),
        SearchPattern::Custom => config.custom_points.iter().map(|&p| center + p).collect(),
    }
}
