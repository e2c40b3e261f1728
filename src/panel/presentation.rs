use crate::engine::{RenderOptions, Vec2};

/// Pointer state shared across surface swaps. The panel owns one tracker
/// and re-routes it whenever the presentation backend changes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointerTracker {
    pub position: Vec2,
    /// Kind of the surface currently receiving pointer input.
    pub surface: Option<String>,
}

/// A drawing surface the sandbox renders into.
///
/// The widget toolkit and the renderer itself live outside this crate;
/// the panel only needs to discard cached drawable state on clear and to
/// rebuild surfaces of a requested kind from shared [`RenderOptions`].
pub trait Presentation {
    /// Backend identifier, e.g. `"canvas"` or `"webgl"`.
    fn kind(&self) -> &str;

    /// Discard any cached drawable state.
    fn clear(&mut self);

    /// Route pointer input to this surface.
    fn attach_pointer(&mut self, pointer: &mut PointerTracker);
}

/// Builds a surface of the requested kind from the shared options.
pub type PresentationFactory = Box<dyn Fn(&str, &RenderOptions) -> Box<dyn Presentation>>;

/// A surface that draws nowhere. Useful headless, and as the simplest
/// possible [`Presentation`] implementation.
#[derive(Debug, Clone)]
pub struct OffscreenSurface {
    kind: String,
    pub cleared: u32,
}

impl OffscreenSurface {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            cleared: 0,
        }
    }
}

impl Presentation for OffscreenSurface {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn clear(&mut self) {
        self.cleared += 1;
    }

    fn attach_pointer(&mut self, pointer: &mut PointerTracker) {
        pointer.surface = Some(self.kind.clone());
    }
}
