use crate::angle::Angles;
use crate::config::LayerPaths;
use cairo::Context;
use gdk_pixbuf::Pixbuf;
use gdk_pixbuf::{gio, glib};
use gdk4::prelude::*;
use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;
use strum::{Display as StrumDisplay, EnumIter, IntoEnumIterator};
use thiserror::Error;

const BUILTIN_KEYS: &[u8] = include_bytes!("../assets/keys.svg");
const BUILTIN_MODES: &[u8] = include_bytes!("../assets/modes.svg");
const BUILTIN_FRAME: &[u8] = include_bytes!("../assets/frame.svg");

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to load layer: {0}")]
    Load(#[from] glib::Error),
    #[error("Cairo error: {0}")]
    Cairo(#[from] cairo::Error),
}

/// Something that can paint itself into the square `[0, side]²` of the current frame.
pub trait RenderSource {
    fn render(&self, cr: &Context, side: f64) -> Result<(), RenderError>;
}

/// The three wheel layers, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum LayerSlot {
    Keys,
    Modes,
    Frame,
}

impl LayerSlot {
    pub fn angle(self, angles: Angles) -> i32 {
        match self {
            Self::Keys => angles.outer,
            Self::Modes => angles.inner,
            Self::Frame => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerStack<S> {
    pub keys: S,
    pub modes: S,
    pub frame: S,
}

impl<S> LayerStack<S> {
    pub fn new(keys: S, modes: S, frame: S) -> Self {
        Self { keys, modes, frame }
    }

    pub fn get(&self, slot: LayerSlot) -> &S {
        match slot {
            LayerSlot::Keys => &self.keys,
            LayerSlot::Modes => &self.modes,
            LayerSlot::Frame => &self.frame,
        }
    }

    /// Layers in drawing order.
    pub fn iter(&self) -> impl Iterator<Item = (LayerSlot, &S)> {
        LayerSlot::iter().map(move |slot| (slot, self.get(slot)))
    }

    pub fn map<T>(&self, f: impl Fn(&S) -> T) -> LayerStack<T> {
        LayerStack::new(f(&self.keys), f(&self.modes), f(&self.frame))
    }
}

/// Raw SVG document bytes, cheap to clone and safe to hand to another thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgMarkup(Arc<[u8]>);

impl SvgMarkup {
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        Ok(Self(fs_err::read(path)?.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for SvgMarkup {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }
}

impl From<String> for SvgMarkup {
    fn from(text: String) -> Self {
        Self(text.into_bytes().into())
    }
}

pub type LayerSources = LayerStack<SvgMarkup>;

impl LayerSources {
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_KEYS.into(),
            BUILTIN_MODES.into(),
            BUILTIN_FRAME.into(),
        )
    }

    /// Loads configured layer files, using the built-in layer for any slot left unset.
    pub fn from_paths(paths: &LayerPaths) -> std::io::Result<Self> {
        let load = |path: &Option<std::path::PathBuf>, fallback: &[u8]| match path {
            Some(p) => SvgMarkup::from_file(p),
            None => Ok(SvgMarkup::from(fallback)),
        };
        Ok(Self::new(
            load(&paths.keys, BUILTIN_KEYS)?,
            load(&paths.modes, BUILTIN_MODES)?,
            load(&paths.frame, BUILTIN_FRAME)?,
        ))
    }

    pub fn instantiate(&self) -> LayerStack<SvgLayer> {
        self.map(|markup| SvgLayer::new(markup.clone()))
    }
}

/// SVG layer rasterized through the gdk-pixbuf loaders.
///
/// The last rasterization is kept so repeated redraws at the same size skip
/// the SVG decode.
pub struct SvgLayer {
    markup: SvgMarkup,
    cache: RefCell<Option<(i32, Pixbuf)>>,
}

impl SvgLayer {
    pub fn new(markup: SvgMarkup) -> Self {
        Self {
            markup,
            cache: RefCell::new(None),
        }
    }

    pub fn markup(&self) -> &SvgMarkup {
        &self.markup
    }

    /// Pixel size of the cached rasterization, if any.
    pub fn cached_size(&self) -> Option<i32> {
        self.cache.borrow().as_ref().map(|(size, _)| *size)
    }

    fn rasterize(&self, px: i32) -> Result<Pixbuf, glib::Error> {
        if let Some((size, pixbuf)) = self.cache.borrow().as_ref()
            && *size == px
        {
            return Ok(pixbuf.clone());
        }

        let bytes = glib::Bytes::from(self.markup.as_bytes());
        let stream = gio::MemoryInputStream::from_bytes(&bytes);
        let pixbuf = Pixbuf::from_stream_at_scale(&stream, px, px, true, gio::Cancellable::NONE)?;
        log::debug!("Rasterized layer at {}px", px);

        *self.cache.borrow_mut() = Some((px, pixbuf.clone()));
        Ok(pixbuf)
    }
}

impl RenderSource for SvgLayer {
    fn render(&self, cr: &Context, side: f64) -> Result<(), RenderError> {
        let px = side.round().max(1.0) as i32;
        let pixbuf = self.rasterize(px)?;

        // scale-to-fit keeps the aspect ratio, so center whatever came back
        let scale = side / px as f64;
        let (w, h) = (
            pixbuf.width() as f64 * scale,
            pixbuf.height() as f64 * scale,
        );

        cr.save()?;
        cr.translate((side - w) / 2.0, (side - h) / 2.0);
        cr.scale(scale, scale);
        cr.set_source_pixbuf(&pixbuf, 0.0, 0.0);
        cr.paint()?;
        cr.restore()?;
        Ok(())
    }
}
