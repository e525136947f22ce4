//! Renders a terrain heightmap driven by a gradient-noise control function.
//!
//! Run with `cargo run --release --example terrain`; writes `terrain.png`.

use dendrite_field::{BranchingField, FieldConfig, PerlinControl};
use dendrite_geom::Rect;
use glam::Vec2;

fn main() -> Result<(), dendrite_render::RenderError> {
    const WIDTH: u32 = 512;
    const HEIGHT: u32 = 512;

    let noise_rect = Rect::new(Vec2::ZERO, Vec2::splat(4.0));
    let control = PerlinControl::new(0).with_domain(Rect::new(Vec2::ZERO, Vec2::splat(0.5)));
    let config = FieldConfig {
        seed: 0,
        eps: 0.15,
        noise_rect,
        ..FieldConfig::default()
    };
    let field = BranchingField::new(control, config);

    let values = dendrite_render::sample_rect(|x, y| field.evaluate(x, y), noise_rect, WIDTH, HEIGHT);
    let image = dendrite_render::to_gray16(&values, WIDTH, HEIGHT);
    dendrite_render::write_png("terrain.png", &image)
}
