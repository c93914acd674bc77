//! Card drawing on a plotters bitmap.
//!
//! Text is set in the bundled DejaVu Sans, so titles keep their case and
//! script. The layout follows fixed coordinates on the 1200×630 canvas.

use std::sync::OnceLock;

use image::RgbImage;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontDesc, FontFamily, FontStyle, RGBAColor, TextStyle};

use super::{wrap_with, CardContent, HEIGHT, PROMPT_LABEL, WIDTH};
use crate::error::{CoreError, Result};

const FAMILY: &str = "nest-sans";
static SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
static SANS_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");
static FONTS_READY: OnceLock<bool> = OnceLock::new();

const BG_FROM: RGBColor = RGBColor(0x0b, 0x12, 0x10);
const BG_TO: RGBColor = RGBColor(0x0f, 0x1a, 0x16);
const MINT: RGBColor = RGBColor(122, 224, 168);
const SKY: RGBColor = RGBColor(134, 184, 255);
const INK: RGBColor = RGBColor(233, 242, 236);

const CONTENT_X: i32 = 360;
const CONTENT_W: i32 = 770;

type Area<DB> = DrawingArea<DB, Shift>;
type Drawn<DB> = std::result::Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

#[derive(Debug, Clone, Copy)]
struct Rect {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    r: i32,
}

const fn rect(x: i32, y: i32, w: i32, h: i32, r: i32) -> Rect {
    Rect { x, y, w, h, r }
}

/// Draw the card into an RGB image.
pub fn render(content: &CardContent) -> Result<RgbImage> {
    load_fonts()?;
    let mut buf = vec![0u8; WIDTH as usize * HEIGHT as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (WIDTH, HEIGHT)).into_drawing_area();
        paint(&root, content).map_err(render_error)?;
        root.present().map_err(render_error)?;
    }
    RgbImage::from_raw(WIDTH, HEIGHT, buf)
        .ok_or_else(|| CoreError::Render("card buffer does not match the canvas".into()))
}

fn render_error(e: impl std::fmt::Display) -> CoreError {
    CoreError::Render(e.to_string())
}

fn load_fonts() -> Result<()> {
    let ready = *FONTS_READY.get_or_init(|| {
        let regular = register_font(FAMILY, FontStyle::Normal, SANS);
        let bold = register_font(FAMILY, FontStyle::Bold, SANS_BOLD);
        regular.is_ok() && bold.is_ok()
    });
    if ready {
        Ok(())
    } else {
        Err(CoreError::Render("bundled card font could not be loaded".into()))
    }
}

fn font(size: f64, style: FontStyle, colour: RGBAColor) -> TextStyle<'static> {
    FontDesc::new(FontFamily::Name(FAMILY), size, style).color(&colour)
}

fn paint<DB: DrawingBackend>(root: &Area<DB>, content: &CardContent) -> Drawn<DB> {
    background(root)?;

    let frame = rect(44, 44, WIDTH as i32 - 88, HEIGHT as i32 - 88, 28);
    fill_round_rect(root, frame, WHITE.mix(0.04))?;
    stroke_round_rect(root, frame, INK.mix(0.12), 2)?;

    sloth(root, 110, 170)?;

    let title = font(52.0, FontStyle::Bold, INK.mix(0.92));
    let lines = wrap_with(&content.title, 2, fits(root, &title, CONTENT_W));
    for (i, line) in lines.iter().enumerate() {
        root.draw_text(line, &title, (CONTENT_X, 100 + i as i32 * 62))?;
    }

    if !content.meta.is_empty() {
        let meta = font(26.0, FontStyle::Normal, INK.mix(0.70));
        if let Some(line) = wrap_with(&content.meta, 1, fits(root, &meta, CONTENT_W)).first() {
            root.draw_text(line, &meta, (CONTENT_X, 232))?;
        }
    }

    chips(root, &content.chips, CONTENT_X, 280)?;

    if let Some(prompt) = &content.prompt {
        let panel = rect(CONTENT_X, 380, CONTENT_W, 150, 22);
        fill_round_rect(root, panel, MINT.mix(0.16))?;
        stroke_round_rect(root, panel, MINT.mix(0.26), 2)?;
        let label = font(18.0, FontStyle::Bold, INK.mix(0.90));
        root.draw_text(PROMPT_LABEL, &label, (CONTENT_X + 26, 396))?;
        let body = font(24.0, FontStyle::Normal, INK.mix(0.82));
        let lines = wrap_with(prompt, 3, fits(root, &body, CONTENT_W - 52));
        for (i, line) in lines.iter().enumerate() {
            root.draw_text(line, &body, (CONTENT_X + 26, 426 + i as i32 * 32))?;
        }
    }

    let footer_y = HEIGHT as i32 - 90;
    let footer = font(20.0, FontStyle::Normal, INK.mix(0.55));
    root.draw_text(&content.footer, &footer, (78, footer_y))?;
    if let Some(link) = &content.link {
        let small = font(16.0, FontStyle::Normal, INK.mix(0.35));
        if let Some(line) = wrap_with(link, 1, fits(root, &small, WIDTH as i32 - 160)).first() {
            root.draw_text(line, &small, (78, footer_y + 28))?;
        }
    }
    Ok(())
}

/// Width check for the wrapper, measured with the real glyphs.
fn fits<'a, DB: DrawingBackend>(
    root: &'a Area<DB>,
    style: &'a TextStyle<'static>,
    max_width: i32,
) -> impl Fn(&str) -> bool + 'a {
    move |text: &str| {
        root.estimate_text_size(text, style)
            .map(|(w, _)| i64::from(w) <= i64::from(max_width))
            .unwrap_or(true)
    }
}

fn lerp(a: RGBColor, b: RGBColor, t: f64) -> RGBColor {
    let mix = |x: u8, y: u8| (f64::from(x) + (f64::from(y) - f64::from(x)) * t).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

fn background<DB: DrawingBackend>(root: &Area<DB>) -> Drawn<DB> {
    const BAND: i32 = 6;
    let (w, h) = (WIDTH as i32, HEIGHT as i32);
    for x in (0..w).step_by(BAND as usize) {
        let colour = lerp(BG_FROM, BG_TO, f64::from(x) / f64::from(w));
        root.draw(&Rectangle::new([(x, 0), (x + BAND, h)], colour.filled()))?;
    }
    glow(root, (220, 140), 520, MINT, 0.25)?;
    glow(root, (980, 120), 520, SKY, 0.20)
}

/// Stacked translucent discs, reaching `peak` opacity at the centre.
fn glow<DB: DrawingBackend>(
    root: &Area<DB>,
    centre: (i32, i32),
    radius: i32,
    colour: RGBColor,
    peak: f64,
) -> Drawn<DB> {
    const RINGS: i32 = 16;
    let step = 1.0 - (1.0 - peak).powf(1.0 / f64::from(RINGS));
    for i in 0..RINGS {
        let r = radius * (RINGS - i) / RINGS;
        root.draw(&Circle::new(centre, r, colour.mix(step).filled()))?;
    }
    Ok(())
}

fn round_rect_outline(b: Rect) -> Vec<(i32, i32)> {
    const STEPS: i32 = 8;
    let r = f64::from(b.r.min(b.w / 2).min(b.h / 2));
    let (x0, y0) = (f64::from(b.x) + r, f64::from(b.y) + r);
    let (x1, y1) = (f64::from(b.x + b.w) - r, f64::from(b.y + b.h) - r);
    let corners = [(x1, y0, -90.0), (x1, y1, 0.0), (x0, y1, 90.0), (x0, y0, 180.0)];

    let mut points = Vec::with_capacity(corners.len() * (STEPS as usize + 1));
    for (cx, cy, start) in corners {
        for i in 0..=STEPS {
            let a: f64 = (start + 90.0 * f64::from(i) / f64::from(STEPS)).to_radians();
            points.push(((cx + r * a.cos()).round() as i32, (cy + r * a.sin()).round() as i32));
        }
    }
    points
}

fn ellipse_outline(cx: i32, cy: i32, rx: i32, ry: i32) -> Vec<(i32, i32)> {
    const STEPS: i32 = 48;
    (0..STEPS)
        .map(|i| {
            let a = std::f64::consts::TAU * f64::from(i) / f64::from(STEPS);
            (
                cx + (f64::from(rx) * a.cos()).round() as i32,
                cy + (f64::from(ry) * a.sin()).round() as i32,
            )
        })
        .collect()
}

fn fill_round_rect<DB: DrawingBackend>(root: &Area<DB>, b: Rect, colour: RGBAColor) -> Drawn<DB> {
    root.draw(&Polygon::new(round_rect_outline(b), colour.filled()))
}

fn stroke_round_rect<DB: DrawingBackend>(
    root: &Area<DB>,
    b: Rect,
    colour: RGBAColor,
    width: u32,
) -> Drawn<DB> {
    let mut outline = round_rect_outline(b);
    if let Some(&first) = outline.first() {
        outline.push(first);
    }
    root.draw(&PathElement::new(outline, colour.stroke_width(width)))
}

fn fill_ellipse<DB: DrawingBackend>(
    root: &Area<DB>,
    centre: (i32, i32),
    radii: (i32, i32),
    colour: RGBAColor,
) -> Drawn<DB> {
    let outline = ellipse_outline(centre.0, centre.1, radii.0, radii.1);
    root.draw(&Polygon::new(outline, colour.filled()))
}

fn chips<DB: DrawingBackend>(root: &Area<DB>, chips: &[String], x: i32, y: i32) -> Drawn<DB> {
    const PAD_X: i32 = 14;
    const H: i32 = 34;
    const GAP: i32 = 10;
    let style = font(20.0, FontStyle::Normal, INK.mix(0.80));

    let (mut cx, mut cy) = (x, y);
    for chip in chips {
        let (tw, th) = root.estimate_text_size(chip, &style)?;
        let w = tw as i32 + PAD_X * 2;
        if cx + w > x + CONTENT_W && cx > x {
            cx = x;
            cy += H + GAP;
        }
        let pill = rect(cx, cy, w, H, H / 2);
        fill_round_rect(root, pill, WHITE.mix(0.06))?;
        stroke_round_rect(root, pill, INK.mix(0.12), 1)?;
        root.draw_text(chip, &style, (cx + PAD_X, cy + (H - th as i32) / 2))?;
        cx += w + GAP;
    }
    Ok(())
}

/// A sleepy sloth on a branch, holding a book. Origin is the body's anchor.
fn sloth<DB: DrawingBackend>(root: &Area<DB>, x: i32, y: i32) -> Drawn<DB> {
    fill_round_rect(root, rect(x - 60, y + 90, 250, 26, 13), WHITE.mix(0.10))?;
    fill_ellipse(root, (x + 70, y + 55), (120, 86), MINT.mix(0.22))?;
    fill_ellipse(root, (x + 85, y + 40), (62, 54), WHITE.mix(0.12))?;
    fill_ellipse(root, (x + 65, y + 38), (7, 9), BLACK.mix(0.55))?;
    fill_ellipse(root, (x + 105, y + 38), (7, 9), BLACK.mix(0.55))?;

    let smile: Vec<(i32, i32)> = (0..=20)
        .map(|i| {
            let t = std::f64::consts::PI * (0.15 + 0.7 * f64::from(i) / 20.0);
            (x + 85 + (16.0 * t.cos()).round() as i32, y + 55 + (16.0 * t.sin()).round() as i32)
        })
        .collect();
    root.draw(&PathElement::new(smile, BLACK.mix(0.45).stroke_width(3)))?;

    fill_round_rect(root, rect(x - 25, y + 70, 90, 60, 12), SKY.mix(0.22))?;
    root.draw(&Rectangle::new([(x + 20, y + 76), (x + 21, y + 124)], INK.mix(0.22).filled()))
}
