//! Content stream rasterizer built on tiny-skia.

use image::{RgbImage, imageops};
use lopdf::content::Operation;
use lopdf::{Object, ObjectId};
use tiny_skia::{
    Color, FillRule, FilterQuality, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};
use tracing::{debug, trace, warn};

use super::PageRenderer;
use crate::error::{ExportError, Result};
use crate::pdf::{FormXObject, ImageXObject, Page, PageRect, Resources, XObject, numbers};

/// Greeked glyph advance, as a fraction of the font size.
const GLYPH_ADVANCE: f32 = 0.5;

/// Height of a greeked text bar, as a fraction of the font size.
const GLYPH_HEIGHT: f32 = 0.5;

/// Renders pages by interpreting their content streams.
///
/// Paths, colors, images and Form XObjects are drawn. Glyphs are greeked as
/// solid bars, and clipping is ignored.
#[derive(Debug, Clone)]
pub struct SkiaRenderer {
    max_form_depth: usize,
}

impl SkiaRenderer {
    /// Create a renderer with default settings.
    pub fn new() -> Self {
        Self { max_form_depth: 32 }
    }

    /// Limit how deep nested Form XObjects are followed.
    pub fn with_max_form_depth(mut self, depth: usize) -> Self {
        self.max_form_depth = depth;
        self
    }
}

impl Default for SkiaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRenderer for SkiaRenderer {
    fn render_page(&self, page: &Page<'_>, dpi: u32) -> Result<RgbImage> {
        let bbox = page.crop_box();
        let (width, height) = pixel_size(&bbox, dpi);
        debug!("Rendering page {} at {} dpi: {}x{} px", page.number(), dpi, width, height);

        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            ExportError::Render(format!(
                "cannot allocate {}x{} pixmap for page {}",
                width,
                height,
                page.number()
            ))
        })?;
        pixmap.fill(Color::WHITE);

        let scale = dpi as f32 / 72.0;
        let device = Transform::from_row(
            scale,
            0.0,
            0.0,
            -scale,
            -bbox.llx * scale,
            bbox.ury * scale,
        );

        let operations = page.content()?;
        let mut canvas = Canvas::new(&mut pixmap, device, self.max_form_depth);
        canvas.run(&operations, page.resources());

        let image = to_rgb_image(&pixmap);
        Ok(match page.rotation() {
            90 => imageops::rotate90(&image),
            180 => imageops::rotate180(&image),
            270 => imageops::rotate270(&image),
            _ => image,
        })
    }
}

/// Output size in pixels for a box rendered at `dpi`.
pub(crate) fn pixel_size(bbox: &PageRect, dpi: u32) -> (u32, u32) {
    let px = |points: f32| ((points as f64 * dpi as f64) / 72.0).floor().max(1.0) as u32;
    (px(bbox.width()), px(bbox.height()))
}

fn to_rgb_image(pixmap: &Pixmap) -> RgbImage {
    let mut image = RgbImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        dst.0 = [color.red(), color.green(), color.blue()];
    }
    image
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Transform,
    fill: Color,
    stroke: Color,
    line_width: f32,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    render_mode: i64,
    rise: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Transform::identity(),
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            render_mode: 0,
            rise: 0.0,
        }
    }
}

struct Canvas<'p> {
    pixmap: &'p mut Pixmap,
    device: Transform,
    states: Vec<GraphicsState>,
    path: PathBuilder,
    current: (f32, f32),
    text_matrix: Transform,
    line_matrix: Transform,
    active_forms: Vec<ObjectId>,
    max_form_depth: usize,
}

impl<'p> Canvas<'p> {
    fn new(pixmap: &'p mut Pixmap, device: Transform, max_form_depth: usize) -> Self {
        Self {
            pixmap,
            device,
            states: vec![GraphicsState::default()],
            path: PathBuilder::new(),
            current: (0.0, 0.0),
            text_matrix: Transform::identity(),
            line_matrix: Transform::identity(),
            active_forms: Vec::new(),
            max_form_depth,
        }
    }

    fn state(&self) -> &GraphicsState {
        // The bottom state is never popped.
        &self.states[self.states.len() - 1]
    }

    fn state_mut(&mut self) -> &mut GraphicsState {
        let last = self.states.len() - 1;
        &mut self.states[last]
    }

    fn user_to_device(&self) -> Transform {
        self.device.pre_concat(self.state().ctm)
    }

    fn run(&mut self, operations: &[Operation], resources: Resources<'_>) {
        for op in operations {
            self.apply(op, &resources);
        }
    }

    fn apply(&mut self, op: &Operation, resources: &Resources<'_>) {
        let n = numbers(&op.operands);

        match op.operator.as_str() {
            // Graphics state
            "q" => {
                let top = self.state().clone();
                self.states.push(top);
            }
            "Q" => {
                if self.states.len() > 1 {
                    self.states.pop();
                }
            }
            "cm" => {
                if let Some(m) = matrix(&n) {
                    let state = self.state_mut();
                    state.ctm = state.ctm.pre_concat(m);
                }
            }
            "w" => {
                if let Some(&width) = n.first() {
                    self.state_mut().line_width = width;
                }
            }

            // Path construction
            "m" => {
                if let [x, y] = n[..] {
                    self.path.move_to(x, y);
                    self.current = (x, y);
                }
            }
            "l" => {
                if let [x, y] = n[..] {
                    self.path.line_to(x, y);
                    self.current = (x, y);
                }
            }
            "c" => {
                if let [x1, y1, x2, y2, x3, y3] = n[..] {
                    self.path.cubic_to(x1, y1, x2, y2, x3, y3);
                    self.current = (x3, y3);
                }
            }
            "v" => {
                if let [x2, y2, x3, y3] = n[..] {
                    let (x1, y1) = self.current;
                    self.path.cubic_to(x1, y1, x2, y2, x3, y3);
                    self.current = (x3, y3);
                }
            }
            "y" => {
                if let [x1, y1, x3, y3] = n[..] {
                    self.path.cubic_to(x1, y1, x3, y3, x3, y3);
                    self.current = (x3, y3);
                }
            }
            "h" => self.path.close(),
            "re" => {
                if let [x, y, w, h] = n[..] {
                    self.path.move_to(x, y);
                    self.path.line_to(x + w, y);
                    self.path.line_to(x + w, y + h);
                    self.path.line_to(x, y + h);
                    self.path.close();
                    self.current = (x, y);
                }
            }

            // Path painting
            "f" | "F" => self.paint(Some(FillRule::Winding), false),
            "f*" => self.paint(Some(FillRule::EvenOdd), false),
            "S" => self.paint(None, true),
            "s" => {
                self.path.close();
                self.paint(None, true);
            }
            "B" => self.paint(Some(FillRule::Winding), true),
            "B*" => self.paint(Some(FillRule::EvenOdd), true),
            "b" => {
                self.path.close();
                self.paint(Some(FillRule::Winding), true);
            }
            "b*" => {
                self.path.close();
                self.paint(Some(FillRule::EvenOdd), true);
            }
            "n" => self.paint(None, false),
            "W" | "W*" => {}

            // Color
            "g" | "rg" | "k" | "sc" | "scn" => {
                if let Some(color) = device_color(&n) {
                    self.state_mut().fill = color;
                }
            }
            "G" | "RG" | "K" | "SC" | "SCN" => {
                if let Some(color) = device_color(&n) {
                    self.state_mut().stroke = color;
                }
            }

            // Text
            "BT" => {
                self.text_matrix = Transform::identity();
                self.line_matrix = Transform::identity();
            }
            "ET" => {}
            "Tf" => {
                if let Some(&size) = n.first() {
                    self.state_mut().font_size = size;
                }
            }
            "Tc" => {
                if let Some(&v) = n.first() {
                    self.state_mut().char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(&v) = n.first() {
                    self.state_mut().word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(&v) = n.first() {
                    self.state_mut().horizontal_scale = v / 100.0;
                }
            }
            "TL" => {
                if let Some(&v) = n.first() {
                    self.state_mut().leading = v;
                }
            }
            "Ts" => {
                if let Some(&v) = n.first() {
                    self.state_mut().rise = v;
                }
            }
            "Tr" => {
                if let Some(&mode) = n.first() {
                    self.state_mut().render_mode = mode as i64;
                }
            }
            "Td" => {
                if let [tx, ty] = n[..] {
                    self.next_line(tx, ty);
                }
            }
            "TD" => {
                if let [tx, ty] = n[..] {
                    self.state_mut().leading = -ty;
                    self.next_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix(&n) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => {
                let leading = self.state().leading;
                self.next_line(0.0, -leading);
            }
            "Tj" => self.show_operands(&op.operands),
            "'" => {
                let leading = self.state().leading;
                self.next_line(0.0, -leading);
                self.show_operands(&op.operands);
            }
            "\"" => {
                if let [aw, ac, ..] = n[..] {
                    let state = self.state_mut();
                    state.word_spacing = aw;
                    state.char_spacing = ac;
                }
                let leading = self.state().leading;
                self.next_line(0.0, -leading);
                self.show_operands(&op.operands);
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show_text(bytes),
                            other => {
                                if let Some(adjust) = crate::pdf::number(other) {
                                    let state = self.state();
                                    let tx = -adjust / 1000.0
                                        * state.font_size
                                        * state.horizontal_scale;
                                    self.text_matrix =
                                        self.text_matrix.pre_concat(Transform::from_translate(tx, 0.0));
                                }
                            }
                        }
                    }
                }
            }

            // XObjects
            "Do" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    match resources.xobject(name) {
                        Some(XObject::Image(image)) => self.draw_image(&image),
                        Some(XObject::Form(form)) => self.draw_form(&form, resources),
                        None => trace!("Unknown XObject {}", String::from_utf8_lossy(name)),
                    }
                }
            }

            other => trace!("Ignoring operator {}", other),
        }
    }

    /// Fill and/or stroke the current path, then start a new one.
    fn paint(&mut self, fill: Option<FillRule>, stroke: bool) {
        let builder = std::mem::replace(&mut self.path, PathBuilder::new());
        let Some(path) = builder.finish() else {
            return;
        };
        let transform = self.user_to_device();

        if let Some(rule) = fill {
            let paint = solid(self.state().fill);
            self.pixmap.fill_path(&path, &paint, rule, transform, None);
        }
        if stroke {
            let paint = solid(self.state().stroke);
            let stroke = Stroke {
                width: self.state().line_width,
                ..Stroke::default()
            };
            self.pixmap.stroke_path(&path, &paint, &stroke, transform, None);
        }
    }

    fn next_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = self.line_matrix.pre_concat(Transform::from_translate(tx, ty));
        self.text_matrix = self.line_matrix;
    }

    fn show_operands(&mut self, operands: &[Object]) {
        if let Some(Object::String(bytes, _)) = operands.last() {
            self.show_text(bytes);
        }
    }

    /// Draw greeked bars for each word and advance the text matrix.
    fn show_text(&mut self, bytes: &[u8]) {
        let state = self.state().clone();
        let glyph = GLYPH_ADVANCE * state.font_size;
        let visible = state.render_mode != 3 && state.font_size > 0.0;

        let mut x = 0.0f32;
        let mut word_start: Option<f32> = None;
        let mut bars = PathBuilder::new();

        for &byte in bytes {
            let is_space = byte == b' ';
            if is_space {
                if let Some(start) = word_start.take() {
                    push_bar(&mut bars, start, x, state.rise, state.font_size);
                }
            } else if word_start.is_none() {
                word_start = Some(x);
            }

            let mut advance = glyph + state.char_spacing;
            if is_space {
                advance += state.word_spacing;
            }
            x += advance * state.horizontal_scale;
        }
        if let Some(start) = word_start {
            push_bar(&mut bars, start, x, state.rise, state.font_size);
        }

        if visible {
            if let Some(path) = bars.finish() {
                let transform = self.user_to_device().pre_concat(self.text_matrix);
                self.pixmap
                    .fill_path(&path, &solid(state.fill), FillRule::Winding, transform, None);
            }
        }

        self.text_matrix = self.text_matrix.pre_concat(Transform::from_translate(x, 0.0));
    }

    /// Map the image's unit square through the CTM.
    fn draw_image(&mut self, image: &ImageXObject<'_>) {
        let decoded = match image.decode() {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Skipping image {:?}: {}", image.id(), e);
                return;
            }
        };

        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let Some(size) = IntSize::from_wh(width, height) else {
            return;
        };

        let mut data = rgba.into_raw();
        for px in data.chunks_exact_mut(4) {
            let alpha = px[3] as u16;
            for channel in &mut px[..3] {
                *channel = (*channel as u16 * alpha / 255) as u8;
            }
        }
        let Some(source) = Pixmap::from_vec(data, size) else {
            return;
        };

        let image_space = Transform::from_row(
            1.0 / width as f32,
            0.0,
            0.0,
            -1.0 / height as f32,
            0.0,
            1.0,
        );
        let transform = self.user_to_device().pre_concat(image_space);
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
    }

    fn draw_form(&mut self, form: &FormXObject<'_>, parent: &Resources<'_>) {
        if self.active_forms.len() >= self.max_form_depth {
            warn!("Form XObject nesting deeper than {}, skipping", self.max_form_depth);
            return;
        }
        if let Some(id) = form.id() {
            if self.active_forms.contains(&id) {
                warn!("Form XObject {:?} draws itself, skipping", id);
                return;
            }
        }

        let operations = match form.content() {
            Ok(operations) => operations,
            Err(e) => {
                warn!("Skipping form {:?}: {}", form.id(), e);
                return;
            }
        };

        let mut state = self.state().clone();
        state.ctm = state.ctm.pre_concat(matrix(&form.matrix()).unwrap_or_default());
        self.states.push(state);
        // Text and path state do not leak out of a form
        let saved = (self.text_matrix, self.line_matrix, self.current);
        let depth = self.states.len();
        self.active_forms.push(form.id().unwrap_or((0, 0)));

        let resources = form.own_resources().unwrap_or(*parent);
        self.run(&operations, resources);

        self.active_forms.pop();
        self.states.truncate(depth - 1);
        self.path = PathBuilder::new();
        (self.text_matrix, self.line_matrix, self.current) = saved;
    }
}

fn push_bar(bars: &mut PathBuilder, x0: f32, x1: f32, rise: f32, font_size: f32) {
    let y0 = rise;
    let y1 = rise + GLYPH_HEIGHT * font_size;
    bars.move_to(x0, y0);
    bars.line_to(x1, y0);
    bars.line_to(x1, y1);
    bars.line_to(x0, y1);
    bars.close();
}

fn matrix(n: &[f32]) -> Option<Transform> {
    match *n {
        [a, b, c, d, e, f] => Some(Transform::from_row(a, b, c, d, e, f)),
        _ => None,
    }
}

/// Interpret color operands by component count: gray, RGB or CMYK.
fn device_color(n: &[f32]) -> Option<Color> {
    let channel = |v: f32| v.clamp(0.0, 1.0);
    match *n {
        [gray] => Color::from_rgba(channel(gray), channel(gray), channel(gray), 1.0),
        [r, g, b] => Color::from_rgba(channel(r), channel(g), channel(b), 1.0),
        [c, m, y, k] => {
            let k = 1.0 - channel(k);
            Color::from_rgba(
                (1.0 - channel(c)) * k,
                (1.0 - channel(m)) * k,
                (1.0 - channel(y)) * k,
                1.0,
            )
        }
        _ => None,
    }
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}
