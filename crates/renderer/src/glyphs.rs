//! Built-in single-stroke font.
//!
//! Used when no TrueType font is configured or loadable. Glyphs are
//! polylines in a unit box (x right, y down from cap height to baseline)
//! and are stroked, so halos come from a wider stroke underneath.

type Stroke = &'static [(f32, f32)];

/// Glyph advance as a fraction of the font size.
pub const ADVANCE: f32 = 0.72;
/// Glyph box width as a fraction of the font size.
pub const GLYPH_WIDTH: f32 = 0.55;
/// Cap height as a fraction of the font size.
pub const CAP_HEIGHT: f32 = 0.72;

const O_RING: Stroke = &[
    (0.2, 0.0),
    (0.8, 0.0),
    (1.0, 0.2),
    (1.0, 0.8),
    (0.8, 1.0),
    (0.2, 1.0),
    (0.0, 0.8),
    (0.0, 0.2),
    (0.2, 0.0),
];
const P_BOWL: Stroke = &[
    (0.0, 1.0),
    (0.0, 0.0),
    (0.8, 0.0),
    (1.0, 0.15),
    (1.0, 0.4),
    (0.8, 0.55),
    (0.0, 0.55),
];

/// Strokes for `ch`. Lowercase letters share the uppercase shapes.
pub fn strokes(ch: char) -> &'static [Stroke] {
    match ch.to_ascii_uppercase() {
        'A' => &[&[(0.0, 1.0), (0.5, 0.0), (1.0, 1.0)], &[(0.2, 0.6), (0.8, 0.6)]],
        'B' => &[
            &[(0.0, 1.0), (0.0, 0.0), (0.7, 0.0), (0.9, 0.1), (0.9, 0.4), (0.7, 0.5), (0.0, 0.5)],
            &[(0.7, 0.5), (1.0, 0.6), (1.0, 0.9), (0.8, 1.0), (0.0, 1.0)],
        ],
        'C' => &[&[
            (1.0, 0.1),
            (0.8, 0.0),
            (0.2, 0.0),
            (0.0, 0.2),
            (0.0, 0.8),
            (0.2, 1.0),
            (0.8, 1.0),
            (1.0, 0.9),
        ]],
        'D' => &[&[(0.0, 0.0), (0.0, 1.0), (0.7, 1.0), (1.0, 0.7), (1.0, 0.3), (0.7, 0.0), (0.0, 0.0)]],
        'E' => &[&[(1.0, 0.0), (0.0, 0.0), (0.0, 1.0), (1.0, 1.0)], &[(0.0, 0.5), (0.7, 0.5)]],
        'F' => &[&[(1.0, 0.0), (0.0, 0.0), (0.0, 1.0)], &[(0.0, 0.5), (0.7, 0.5)]],
        'G' => &[&[
            (1.0, 0.1),
            (0.8, 0.0),
            (0.2, 0.0),
            (0.0, 0.2),
            (0.0, 0.8),
            (0.2, 1.0),
            (0.8, 1.0),
            (1.0, 0.8),
            (1.0, 0.55),
            (0.55, 0.55),
        ]],
        'H' => &[&[(0.0, 0.0), (0.0, 1.0)], &[(1.0, 0.0), (1.0, 1.0)], &[(0.0, 0.5), (1.0, 0.5)]],
        'I' => &[&[(0.5, 0.0), (0.5, 1.0)], &[(0.2, 0.0), (0.8, 0.0)], &[(0.2, 1.0), (0.8, 1.0)]],
        'J' => &[&[(1.0, 0.0), (1.0, 0.8), (0.8, 1.0), (0.2, 1.0), (0.0, 0.8)]],
        'K' => &[&[(0.0, 0.0), (0.0, 1.0)], &[(1.0, 0.0), (0.0, 0.6)], &[(0.3, 0.4), (1.0, 1.0)]],
        'L' => &[&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]],
        'M' => &[&[(0.0, 1.0), (0.0, 0.0), (0.5, 0.6), (1.0, 0.0), (1.0, 1.0)]],
        'N' => &[&[(0.0, 1.0), (0.0, 0.0), (1.0, 1.0), (1.0, 0.0)]],
        'O' | '0' => &[O_RING],
        'P' => &[P_BOWL],
        'Q' => &[O_RING, &[(0.6, 0.7), (1.0, 1.05)]],
        'R' => &[P_BOWL, &[(0.5, 0.55), (1.0, 1.0)]],
        'S' => &[&[
            (1.0, 0.1),
            (0.8, 0.0),
            (0.2, 0.0),
            (0.0, 0.15),
            (0.0, 0.35),
            (0.2, 0.5),
            (0.8, 0.5),
            (1.0, 0.65),
            (1.0, 0.85),
            (0.8, 1.0),
            (0.2, 1.0),
            (0.0, 0.9),
        ]],
        'T' => &[&[(0.0, 0.0), (1.0, 0.0)], &[(0.5, 0.0), (0.5, 1.0)]],
        'U' => &[&[(0.0, 0.0), (0.0, 0.8), (0.2, 1.0), (0.8, 1.0), (1.0, 0.8), (1.0, 0.0)]],
        'V' => &[&[(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)]],
        'W' => &[&[(0.0, 0.0), (0.25, 1.0), (0.5, 0.4), (0.75, 1.0), (1.0, 0.0)]],
        'X' => &[&[(0.0, 0.0), (1.0, 1.0)], &[(1.0, 0.0), (0.0, 1.0)]],
        'Y' => &[&[(0.0, 0.0), (0.5, 0.5), (1.0, 0.0)], &[(0.5, 0.5), (0.5, 1.0)]],
        'Z' => &[&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]],
        '1' => &[&[(0.2, 0.2), (0.5, 0.0), (0.5, 1.0)], &[(0.2, 1.0), (0.8, 1.0)]],
        '2' => &[&[(0.0, 0.2), (0.2, 0.0), (0.8, 0.0), (1.0, 0.2), (1.0, 0.4), (0.0, 1.0), (1.0, 1.0)]],
        '3' => &[
            &[(0.0, 0.1), (0.2, 0.0), (0.8, 0.0), (1.0, 0.15), (1.0, 0.35), (0.8, 0.5), (0.3, 0.5)],
            &[(0.8, 0.5), (1.0, 0.65), (1.0, 0.85), (0.8, 1.0), (0.2, 1.0), (0.0, 0.9)],
        ],
        '4' => &[&[(0.7, 1.0), (0.7, 0.0), (0.0, 0.7), (1.0, 0.7)]],
        '5' => &[&[
            (1.0, 0.0),
            (0.0, 0.0),
            (0.0, 0.45),
            (0.8, 0.45),
            (1.0, 0.6),
            (1.0, 0.85),
            (0.8, 1.0),
            (0.2, 1.0),
            (0.0, 0.9),
        ]],
        '6' => &[&[
            (0.9, 0.0),
            (0.3, 0.0),
            (0.0, 0.3),
            (0.0, 0.8),
            (0.2, 1.0),
            (0.8, 1.0),
            (1.0, 0.8),
            (1.0, 0.65),
            (0.8, 0.5),
            (0.0, 0.5),
        ]],
        '7' => &[&[(0.0, 0.0), (1.0, 0.0), (0.4, 1.0)]],
        '8' => &[
            &[(0.2, 0.0), (0.8, 0.0), (1.0, 0.15), (1.0, 0.35), (0.8, 0.5), (0.2, 0.5), (0.0, 0.35), (0.0, 0.15), (0.2, 0.0)],
            &[(0.2, 0.5), (0.0, 0.65), (0.0, 0.85), (0.2, 1.0), (0.8, 1.0), (1.0, 0.85), (1.0, 0.65), (0.8, 0.5)],
        ],
        '9' => &[&[
            (1.0, 0.5),
            (0.2, 0.5),
            (0.0, 0.35),
            (0.0, 0.15),
            (0.2, 0.0),
            (0.8, 0.0),
            (1.0, 0.2),
            (1.0, 0.7),
            (0.7, 1.0),
            (0.1, 1.0),
        ]],
        ':' => &[&[(0.5, 0.25), (0.5, 0.3)], &[(0.5, 0.75), (0.5, 0.8)]],
        '/' => &[&[(0.9, 0.0), (0.1, 1.0)]],
        '.' => &[&[(0.5, 0.92), (0.5, 1.0)]],
        ',' => &[&[(0.55, 0.9), (0.4, 1.1)]],
        '-' => &[&[(0.15, 0.5), (0.85, 0.5)]],
        '+' => &[&[(0.15, 0.5), (0.85, 0.5)], &[(0.5, 0.2), (0.5, 0.8)]],
        '(' => &[&[(0.7, 0.0), (0.4, 0.3), (0.4, 0.7), (0.7, 1.0)]],
        ')' => &[&[(0.3, 0.0), (0.6, 0.3), (0.6, 0.7), (0.3, 1.0)]],
        _ => &[],
    }
}

/// Advance width of `text` in pixels at `size_px`.
pub fn text_width(text: &str, size_px: f32) -> f32 {
    let n = text.chars().count();
    if n == 0 {
        return 0.0;
    }
    (n as f32 - 1.0) * ADVANCE * size_px + GLYPH_WIDTH * size_px
}

/// Polylines of `text` laid out with the cap-height top at `top` and the
/// first glyph's left edge at `left`.
pub fn layout(text: &str, left: f32, top: f32, size_px: f32) -> Vec<Vec<(f32, f32)>> {
    let w = GLYPH_WIDTH * size_px;
    let h = CAP_HEIGHT * size_px;
    let mut lines = Vec::new();
    for (i, ch) in text.chars().enumerate() {
        let x0 = left + i as f32 * ADVANCE * size_px;
        for stroke in strokes(ch) {
            lines.push(stroke.iter().map(|&(gx, gy)| (x0 + gx * w, top + gy * h)).collect());
        }
    }
    lines
}
