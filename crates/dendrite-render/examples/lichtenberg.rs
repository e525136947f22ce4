//! Renders a Lichtenberg figure: a branching discharge converging on the
//! attachment point at the origin, with the segment overlay lit.
//!
//! Run with `cargo run --release --example lichtenberg`; writes
//! `lichtenberg.png`.

use dendrite_field::{BranchingField, FieldConfig, LichtenbergControl};
use dendrite_geom::Rect;
use glam::Vec2;

fn main() -> Result<(), dendrite_render::RenderError> {
    const WIDTH: u32 = 512;
    const HEIGHT: u32 = 512;

    let noise_rect = Rect::new(Vec2::splat(-2.0), Vec2::splat(2.0));
    let control = LichtenbergControl::new(Vec2::ZERO, 1.0)
        .with_domain(Rect::new(Vec2::splat(-1.0), Vec2::splat(1.0)));
    let config = FieldConfig {
        seed: 0,
        eps: 0.1,
        display_segments: true,
        noise_rect,
        ..FieldConfig::default()
    };
    let field = BranchingField::new(control, config);

    let values = dendrite_render::sample_rect(|x, y| field.evaluate(x, y), noise_rect, WIDTH, HEIGHT);
    let image = dendrite_render::to_gray16(&values, WIDTH, HEIGHT);
    dendrite_render::write_png("lichtenberg.png", &image)
}
