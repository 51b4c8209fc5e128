use super::model::{DialGeometry, DialState};
use crate::gui::theme::ThemeColors;
use cairo::Context;
use fifths::{RenderError, compose, draw_label};

pub fn draw(
    cr: &Context,
    state: &DialState,
    geometry: &DialGeometry,
    colors: &ThemeColors,
) -> Result<(), RenderError> {
    let (r, g, b, a) = colors.background.into_components();
    cr.set_source_rgba(r, g, b, a);
    cr.paint()?;

    if geometry.diameter < 1.0 {
        return Ok(());
    }

    compose(
        cr,
        &state.layers,
        state.controller.angles(),
        geometry.center,
        geometry.diameter,
    )?;
    draw_label(
        cr,
        state.controller.label(),
        geometry.center,
        geometry.canvas_side,
        state.accent,
    )?;
    Ok(())
}
