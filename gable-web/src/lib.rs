/// Gable Web - browser viewer drawing the building into an inline SVG element
///
/// The host page owns the event listeners and `requestAnimationFrame`: it
/// forwards pointer and wheel events to [`WebViewer`], asks `needs_frame()`
/// after each one, and calls `frame()` from the animation callback.
use std::collections::HashMap;

use gable_core::svg::{format_points, SVG_NS};
use gable_core::{
    ManualScheduler, Point2, Polygon, PolygonStyle, RenderSession, RenderSurface, ViewerConfig,
    Viewport,
};
use log::{debug, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Window};

/// Parse a computed CSS length such as `"800px"`.
fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

/// Polygon handles living under one `<svg>` element.
struct DomSurface {
    document: Document,
    svg: Element,
    handles: HashMap<String, Element>,
}

impl DomSurface {
    fn new(document: Document, svg: Element) -> Self {
        Self {
            document,
            svg,
            handles: HashMap::new(),
        }
    }

    fn try_attach(&mut self, polygon: &Polygon) -> Result<(), JsValue> {
        let element = self.document.create_element_ns(Some(SVG_NS), "polygon")?;
        element.set_attribute("id", polygon.id())?;
        element.set_attribute("style", &PolygonStyle::from_polygon(polygon).css())?;
        self.svg.append_child(&element)?;
        self.handles.insert(polygon.id().to_string(), element);
        Ok(())
    }
}

impl RenderSurface for DomSurface {
    fn attach(&mut self, polygon: &Polygon) {
        if let Err(err) = self.try_attach(polygon) {
            warn!("could not create polygon {}: {:?}", polygon.id(), err);
        }
    }

    /// Re-appending an existing child moves it to the end, so walking the
    /// order back to front restacks the whole element.
    fn set_draw_order(&mut self, ids: &[String]) {
        for id in ids {
            if let Some(element) = self.handles.get(id) {
                if let Err(err) = self.svg.append_child(element) {
                    warn!("could not restack {id}: {err:?}");
                }
            }
        }
    }

    fn update_points(&mut self, id: &str, points: &[Option<Point2>]) {
        let Some(element) = self.handles.get(id) else {
            return;
        };
        let visible: Vec<Point2> = points.iter().flatten().copied().collect();
        if let Err(err) = element.set_attribute("points", &format_points(&visible)) {
            warn!("could not update {id}: {err:?}");
        }
    }
}

#[wasm_bindgen]
pub struct WebViewer {
    window: Window,
    session: RenderSession<ManualScheduler>,
    surface: DomSurface,
}

#[wasm_bindgen]
impl WebViewer {
    /// Create a viewer inside the `<svg>` matched by `selector`.
    ///
    /// `config_json` uses the same format as the terminal viewer's config
    /// file; `seed` fixes the face colors.
    #[wasm_bindgen(constructor)]
    pub fn new(
        selector: &str,
        config_json: Option<String>,
        seed: f64,
    ) -> Result<WebViewer, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
        let svg = document
            .query_selector(selector)?
            .ok_or_else(|| JsValue::from_str(&format!("no element matches {selector}")))?;

        let config = match config_json {
            Some(json) => ViewerConfig::from_json_str(&json)
                .map_err(|err| JsValue::from_str(&err.to_string()))?,
            None => ViewerConfig::default(),
        };

        let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
        let session = RenderSession::new(&config, ManualScheduler::new(), &mut rng)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;

        let mut surface = DomSurface::new(document, svg);
        session.attach(&mut surface);

        Ok(WebViewer {
            window,
            session,
            surface,
        })
    }

    /// Measure the SVG element and schedule the first frame.
    pub fn load(&mut self) {
        let viewport = self.measure();
        self.session.set_drag_reference_width(self.page_width());
        self.session.on_load(viewport);
    }

    /// Re-measure after the window changed size.
    pub fn resize(&mut self) {
        let viewport = self.measure();
        self.session.set_drag_reference_width(self.page_width());
        self.session.on_resize(viewport);
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.session.on_pointer_down(x, y);
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.session.on_pointer_move(x, y);
    }

    pub fn pointer_up(&mut self) {
        self.session.on_pointer_up();
    }

    /// `delta_y` in the browser's wheel units; positive zooms in.
    pub fn wheel(&mut self, delta_y: f64) {
        self.session.on_wheel(delta_y);
    }

    /// True once per pending repaint: the host should then request an
    /// animation frame and call [`WebViewer::frame`] from it.
    pub fn needs_frame(&mut self) -> bool {
        self.session.scheduler_mut().take_due()
    }

    /// Paint into the DOM. Returns false when no repaint was pending.
    pub fn frame(&mut self) -> Result<bool, JsValue> {
        let report = self
            .session
            .frame(&mut self.surface)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        Ok(report.is_some())
    }

    fn measure(&self) -> Viewport {
        let computed = self
            .window
            .get_computed_style(&self.surface.svg)
            .ok()
            .flatten();
        let length = |name: &str| {
            computed
                .as_ref()
                .and_then(|style| style.get_property_value(name).ok())
                .and_then(|value| parse_px(&value))
        };
        match (length("width"), length("height")) {
            (Some(width), Some(height)) => Viewport::new(width, height),
            _ => {
                debug!("svg size unavailable, keeping {:?}", self.session.viewport());
                *self.session.viewport()
            }
        }
    }

    fn page_width(&self) -> Option<f64> {
        self.window.inner_width().ok().and_then(|w| w.as_f64()).filter(|w| *w > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_px() {
        assert_eq!(parse_px("800px"), Some(800.0));
        assert_eq!(parse_px(" 612.5px "), Some(612.5));
        assert_eq!(parse_px("300"), Some(300.0));
        assert_eq!(parse_px("auto"), None);
        assert_eq!(parse_px("0px"), None);
    }
}
