/// Anchor colours from dark blue (low) to yellow (high), viridis-like.
const ANCHORS: [[f64; 3]; 5] = [
    [68.0, 1.0, 84.0],
    [59.0, 82.0, 139.0],
    [33.0, 145.0, 140.0],
    [94.0, 201.0, 98.0],
    [253.0, 231.0, 37.0],
];

/// Map `t` in `[0, 1]` to an RGB colour. Values outside are clamped, NaN is
/// drawn as the lowest colour.
///
/// # Example
/// ```
/// use aaa_display::colormap::colormap;
/// assert_eq!(colormap(0.0), [68, 1, 84]);
/// assert_eq!(colormap(1.0), [253, 231, 37]);
/// ```
#[must_use]
pub fn colormap(t: f64) -> [u8; 3] {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let pos = t * (ANCHORS.len() - 1) as f64;
    let i = (pos.floor() as usize).min(ANCHORS.len() - 2);
    let f = pos - i as f64;
    let (a, b) = (ANCHORS[i], ANCHORS[i + 1]);
    [0, 1, 2].map(|c| (a[c] + (b[c] - a[c]) * f).round() as u8)
}
