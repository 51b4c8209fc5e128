use crate::angle::Angles;
use crate::geometry::Point;
use crate::key::KeyLabel;
use crate::layer::{LayerStack, RenderError, RenderSource};
use cairo::Context;
use palette::Srgba;

/// Positive angles turn clockwise on a y-down surface. Every drawing path goes
/// through [`compose`], so this is the only place the sign is applied.
pub const ROTATION_SIGN: f64 = 1.0;

/// Wheel diameter relative to the side of the square it is drawn in.
pub const WHEEL_RATIO: f64 = 0.90;

pub const LABEL_FONT_FACE: &str = "Sans";
pub const LABEL_FONT_RATIO: f64 = 0.04;
pub const LONG_LABEL_FONT_RATIO: f64 = 0.035;
/// Baseline offset below center, in line heights.
pub const LABEL_BASELINE_SHIFT: f64 = 0.35;

/// Draws the layers back to front, each rotated about `center` and fitted to a
/// `diameter` square.
pub fn compose<S: RenderSource>(
    cr: &Context,
    layers: &LayerStack<S>,
    angles: Angles,
    center: Point,
    diameter: f64,
) -> Result<(), RenderError> {
    for (slot, layer) in layers.iter() {
        let angle = slot.angle(angles) as f64;

        cr.save()?;
        cr.translate(center.x, center.y);
        cr.rotate(ROTATION_SIGN * angle.to_radians());
        cr.translate(-diameter / 2.0, -diameter / 2.0);
        let drawn = layer.render(cr, diameter);
        cr.restore()?;
        drawn?;
    }
    Ok(())
}

pub fn label_font_size(label: &KeyLabel, canvas_side: f64) -> f64 {
    let ratio = if label.has_long_mode() {
        LONG_LABEL_FONT_RATIO
    } else {
        LABEL_FONT_RATIO
    };
    canvas_side * ratio
}

/// Centers `label` on the wheel, sized relative to the canvas it is drawn on.
pub fn draw_label(
    cr: &Context,
    label: &KeyLabel,
    center: Point,
    canvas_side: f64,
    color: Srgba<f64>,
) -> Result<(), cairo::Error> {
    if label.is_empty() {
        return Ok(());
    }

    cr.save()?;
    cr.select_font_face(
        LABEL_FONT_FACE,
        cairo::FontSlant::Normal,
        cairo::FontWeight::Normal,
    );
    cr.set_font_size(label_font_size(label, canvas_side));

    let line_height = cr.font_extents()?.height();
    let ext = cr.text_extents(label)?;

    let (r, g, b, a) = color.into_components();
    cr.set_source_rgba(r, g, b, a);
    cr.move_to(
        center.x - ext.x_advance() / 2.0,
        center.y + line_height * LABEL_BASELINE_SHIFT,
    );
    cr.show_text(label)?;
    cr.restore()
}
