/// The orchestrating state machine: locates the bull's-eye, builds and
/// refines the perspective transform, decodes the mode message, and
/// resamples the rectified matrix. This is the core of the detection
/// pipeline; every other module in `detector` feeds it.
use super::connected_components::ComponentFinder;
use super::quadrilateral::find_quadrilateral;
use super::reed_solomon::ReedSolomonDecoder;
use crate::models::{AztecDetectorResult, AztecError, BitMatrix, Point, PointI, Quadrilateral};
use crate::utils::geometry::PerspectiveTransform;

/// Canonical module pixel size in the resampled space.
const MODULE_SIZE: f32 = 6.0;

/// The 4x4 permutation mapping the default N/E/S/W ideal-corner indexing to
/// the rotated indexing under each of the four possible orientations.
const ROT: [[usize; 4]; 4] = [[0, 1, 3, 2], [1, 2, 0, 3], [2, 3, 1, 0], [3, 0, 2, 1]];

/// Mutable state threaded through the pipeline stages. Populated
/// left-to-right; any stage failure surfaces as `AztecError::NotFound`
/// without partial results reaching the caller.
struct DetectorState {
    white_square_label: u32,
    compact: bool,
    num_layers: usize,
    num_data_words: usize,
    matrix_size: usize,
    num_reference_lines: usize,
    top_line_index: usize,
    inverse_transform: PerspectiveTransform,
}

/// Run the full detection and rectification pipeline over a binarized
/// image.
pub fn detect(matrix: &BitMatrix) -> Result<AztecDetectorResult, AztecError> {
    let finder = ComponentFinder::label(matrix);

    let (white_square_label, quad, compact) =
        find_bullseye(&finder).ok_or(AztecError::NotFound)?;

    let inverse_transform = compute_initial_transform(compact, &quad).ok_or(AztecError::NotFound)?;

    let mode = decode_mode_message(matrix, &inverse_transform, compact).ok_or(AztecError::NotFound)?;

    let mut state = DetectorState {
        white_square_label,
        compact,
        num_layers: mode.num_layers,
        num_data_words: mode.num_data_words,
        matrix_size: mode.matrix_size,
        num_reference_lines: mode.num_reference_lines,
        top_line_index: mode.top_line_index,
        inverse_transform,
    };

    if !state.compact {
        optimize_transform(matrix, &mut state).ok_or(AztecError::NotFound)?;
    }

    let (normalized, points) = normalize_matrix(matrix, &state).ok_or(AztecError::NotFound)?;

    Ok(AztecDetectorResult {
        matrix: normalized,
        points,
        compact: state.compact,
        num_data_words: state.num_data_words,
        num_layers: state.num_layers,
    })
}

/// 4.3.1 — enumerate black components ascending by pixel count, looking for
/// one whose cardinal rays exhibit the bull's-eye's ring topology.
fn find_bullseye(finder: &ComponentFinder) -> Option<(u32, Quadrilateral, bool)> {
    for candidate in finder.black_components_by_size() {
        let env = candidate.envelope;
        let cx = (env.min_x() + env.max_x()) / 2;
        let cy = (env.min_y() + env.max_y()) / 2;

        let east = trace_ray(finder, cx, cy, 1, 0);
        let west = trace_ray(finder, cx, cy, -1, 0);
        let south = trace_ray(finder, cx, cy, 0, 1);
        let north = trace_ray(finder, cx, cy, 0, -1);

        let k1 = common_prefix_len(&east, &west);
        if k1 < 4 {
            continue;
        }

        let mut k = k1.min(6);
        if !pairwise_distinct(&east[..k]) {
            continue;
        }

        k = k.min(common_prefix_len(&east, &south));
        if k < 4 {
            continue;
        }

        k = k.min(common_prefix_len(&east, &north));
        if k < 4 {
            continue;
        }

        let compact = k < 6;
        let offset = if compact { 2 } else { 4 };
        if offset >= east.len() {
            continue;
        }
        let white_square_label = east[offset];

        let Some(white_square) = finder.component(white_square_label) else {
            continue;
        };
        let Some(quad) = find_quadrilateral(finder, white_square_label, &white_square.envelope)
        else {
            continue;
        };

        return Some((white_square_label, quad, compact));
    }
    None
}

/// Walk from `(cx, cy)` in direction `(dx, dy)` to the image boundary,
/// recording the sequence of distinct labels encountered (consecutive
/// repeats of the same label collapse to one entry).
fn trace_ray(finder: &ComponentFinder, cx: i32, cy: i32, dx: i32, dy: i32) -> Vec<u32> {
    let mut labels = Vec::new();
    let mut x = cx;
    let mut y = cy;
    let mut last: Option<u32> = None;

    loop {
        if x < 0 || y < 0 || x as usize >= finder.width() || y as usize >= finder.height() {
            break;
        }
        let label = finder.label_at(x, y);
        if last != Some(label) {
            labels.push(label);
            last = Some(label);
        }
        x += dx;
        y += dy;
    }

    labels
}

fn common_prefix_len(a: &[u32], b: &[u32]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

fn pairwise_distinct(labels: &[u32]) -> bool {
    for i in 0..labels.len() {
        for j in (i + 1)..labels.len() {
            if labels[i] == labels[j] {
                return false;
            }
        }
    }
    true
}

/// 4.3.2 — map the four ideal square corners to the four pixel corners of
/// the outer white finder square, producing the canonical-to-image inverse
/// transform.
fn compute_initial_transform(compact: bool, quad: &Quadrilateral) -> Option<PerspectiveTransform> {
    let s = if compact { 7.0 * MODULE_SIZE / 2.0 } else { 11.0 * MODULE_SIZE / 2.0 };

    let ideal = [
        Point::new(-s, -s),
        Point::new(s, -s),
        Point::new(-s, s),
        Point::new(s, s),
    ];
    let pixel = [
        to_point(quad.nw),
        to_point(quad.ne),
        to_point(quad.sw),
        to_point(quad.se),
    ];

    PerspectiveTransform::from_points(&ideal, &pixel)
}

fn to_point(p: PointI) -> Point {
    Point::new(p.x as f32, p.y as f32)
}

struct ModeMessage {
    num_layers: usize,
    num_data_words: usize,
    matrix_size: usize,
    num_reference_lines: usize,
    top_line_index: usize,
}

/// 4.3.3 — sample the four sides around the bull's-eye, locate the
/// orientation marker, extract and RS-correct the parameter word, and
/// derive layer/data-word/matrix-size counts.
fn decode_mode_message(
    matrix: &BitMatrix,
    inverse_transform: &PerspectiveTransform,
    compact: bool,
) -> Option<ModeMessage> {
    let r = if compact { 5 } else { 7 };
    let two_r = 2 * r;
    let rm = r as f32 * MODULE_SIZE;

    // NW->NE, NE->SE, SE->SW, SW->NW
    let starts = [
        Point::new(-rm, -rm),
        Point::new(rm, -rm),
        Point::new(rm, rm),
        Point::new(-rm, rm),
    ];
    let dirs = [
        Point::new(1.0, 0.0),
        Point::new(0.0, 1.0),
        Point::new(-1.0, 0.0),
        Point::new(0.0, -1.0),
    ];

    let mut sides: Vec<Vec<bool>> = Vec::with_capacity(4);
    for side in 0..4 {
        let mut samples = Vec::with_capacity(two_r);
        for t in 0..two_r {
            let cx = starts[side].x + dirs[side].x * MODULE_SIZE * t as f32;
            let cy = starts[side].y + dirs[side].y * MODULE_SIZE * t as f32;
            let img = inverse_transform.transform(&Point::new(cx, cy));
            let p = img.round_half_even();
            if p.x < 0 || p.y < 0 || p.x as usize >= matrix.width() || p.y as usize >= matrix.height()
            {
                return None;
            }
            samples.push(matrix.get(p.x as usize, p.y as usize));
        }
        sides.push(samples);
    }

    // Orientation: the side whose top-2/bottom-1 bits equal 0b111.
    let mut found_index = None;
    for (i, s) in sides.iter().enumerate() {
        let bits = (((s[0] as u8) * 2 + s[1] as u8) << 1) | (s[two_r - 1] as u8);
        if bits == 7 {
            found_index = Some(i);
            break;
        }
    }
    let found_index = found_index?;
    let top_line_index = (found_index + 3) % 4;

    // Parameter extraction, starting at topLineIndex.
    let mut payload: Vec<bool> = Vec::new();
    for offset in 0..4 {
        let side_index = (top_line_index + offset) % 4;
        let s = &sides[side_index];
        let mut bits: Vec<bool> = s[2..two_r - 1].to_vec();
        if !compact {
            bits.remove(bits.len() / 2);
        }
        payload.extend(bits);
    }

    let num_codewords = if compact { 7 } else { 10 };
    let num_data = if compact { 2 } else { 4 };
    let num_ecc = num_codewords - num_data;
    debug_assert_eq!(payload.len(), num_codewords * 4);

    let mut codewords: Vec<u8> = Vec::with_capacity(num_codewords);
    for chunk in payload.chunks(4) {
        let mut v = 0u8;
        for &bit in chunk {
            v = (v << 1) | (bit as u8);
        }
        codewords.push(v);
    }

    let decoder = ReedSolomonDecoder::new(num_ecc);
    if decoder.decode(&mut codewords).is_err() {
        if cfg!(debug_assertions) && crate::debug::debug_enabled() {
            eprintln!("aztec: mode message RS correction failed");
        }
        return None;
    }

    let mut data: u32 = 0;
    for &cw in &codewords[..num_data] {
        data = (data << 4) | cw as u32;
    }

    let (num_layers, num_data_words, matrix_size, num_reference_lines) = if compact {
        let num_layers = (data >> 6) as usize + 1;
        let num_data_words = (data & 0x3F) as usize + 1;
        let matrix_size = 11 + 4 * num_layers;
        (num_layers, num_data_words, matrix_size, 0)
    } else {
        let num_layers = (data >> 11) as usize + 1;
        let num_data_words = (data & 0x7FF) as usize + 1;
        let base_matrix_size = 14 + 4 * num_layers;
        let num_reference_lines = (base_matrix_size / 2 - 1) / 15;
        let matrix_size = base_matrix_size + 1 + 2 * num_reference_lines;
        (num_layers, num_data_words, matrix_size, num_reference_lines)
    };

    Some(ModeMessage {
        num_layers,
        num_data_words,
        matrix_size,
        num_reference_lines,
        top_line_index,
    })
}

/// 4.3.4 — refine the transform using reference lines at increasing
/// distances from center (full codes only).
fn optimize_transform(matrix: &BitMatrix, state: &mut DetectorState) -> Option<()> {
    for ring in 1..=state.num_reference_lines {
        let d = 16 * ring;

        let n_point = find_reference_point(matrix, state, 0, -1, d)?;
        let e_point = find_reference_point(matrix, state, 1, 0, d)?;
        let s_point = find_reference_point(matrix, state, 0, 1, d)?;
        let w_point = find_reference_point(matrix, state, -1, 0, d)?;

        let measured_img = [
            state.inverse_transform.transform(&n_point),
            state.inverse_transform.transform(&e_point),
            state.inverse_transform.transform(&s_point),
            state.inverse_transform.transform(&w_point),
        ];

        let q = d as f32 * MODULE_SIZE;
        let ideal_default = [
            Point::new(0.0, -q),
            Point::new(q, 0.0),
            Point::new(0.0, q),
            Point::new(-q, 0.0),
        ];
        let rot = ROT[state.top_line_index];
        let ideal = [
            ideal_default[rot[0]],
            ideal_default[rot[1]],
            ideal_default[rot[2]],
            ideal_default[rot[3]],
        ];

        state.inverse_transform =
            PerspectiveTransform::from_points(&ideal, &measured_img)?;
        state.top_line_index = 0;
    }
    Some(())
}

/// One cardinal direction's reference-line search: find the module center
/// at ring distance `d`, then refine it perpendicular to the ray.
fn find_reference_point(
    matrix: &BitMatrix,
    state: &DetectorState,
    vx: i32,
    vy: i32,
    d: usize,
) -> Option<Point> {
    let transform = &state.inverse_transform;
    let max_t = state.matrix_size * (MODULE_SIZE as usize / 2 + 1);
    let mut changes: Vec<usize> = Vec::new();
    let mut last: Option<bool> = None;

    for t in 0..=max_t {
        let cx = (t as i32 * vx) as f32;
        let cy = (t as i32 * vy) as f32;
        let img = transform.transform(&Point::new(cx, cy));
        let p = img.round_half_even();
        let bit = sample_bit(matrix, p);
        if let Some(prev) = last {
            if prev != bit {
                changes.push(t);
            }
        }
        last = Some(bit);
    }

    if changes.len() < d + 1 {
        return None;
    }

    let t1 = changes[d - 1] as f32;
    let t2 = changes[d] as f32;
    let t_star = (t1 + t2) / 2.0;
    let p = Point::new(t_star * vx as f32, t_star * vy as f32);

    // Perpendicular direction v_perp = (-vy, vx)
    let (pvx, pvy) = (-vy, vx);
    let u1 = walk_to_white(matrix, transform, &p, pvx, pvy);
    let u2 = walk_to_white(matrix, transform, &p, -pvx, -pvy);
    let u_avg = (u1 + u2) / 2.0;

    Some(Point::new(
        p.x + u_avg * pvx as f32,
        p.y + u_avg * pvy as f32,
    ))
}

fn sample_bit(matrix: &BitMatrix, p: PointI) -> bool {
    if p.x < 0 || p.y < 0 || p.x as usize >= matrix.width() || p.y as usize >= matrix.height() {
        return false;
    }
    matrix.get(p.x as usize, p.y as usize)
}

/// Walk perpendicular to the ray from `start` until the sampled pixel turns
/// white, returning the signed offset (in canonical units) at which it did.
fn walk_to_white(
    matrix: &BitMatrix,
    transform: &PerspectiveTransform,
    start: &Point,
    dx: i32,
    dy: i32,
) -> f32 {
    let mut u = 0i32;
    loop {
        let cx = start.x + u as f32 * dx as f32;
        let cy = start.y + u as f32 * dy as f32;
        let img = transform.transform(&Point::new(cx, cy));
        let p = img.round_half_even();
        if !sample_bit(matrix, p) {
            return u as f32;
        }
        u += 1;
        if u.unsigned_abs() as usize > matrix.width() + matrix.height() {
            return u as f32;
        }
    }
}

/// 4.3.5 — resample the rectified matrix and compute the four outer
/// image-space corner points.
fn normalize_matrix(
    matrix: &BitMatrix,
    state: &DetectorState,
) -> Option<(BitMatrix, [Point; 4])> {
    let cell_width = 1usize;
    let border_width = 0usize;
    let side = state.matrix_size * cell_width + 2 * border_width;
    let mut out = BitMatrix::new(side, side);

    let half = (state.matrix_size / 2) as i32;
    for j in -half..=half {
        for i in -half..=half {
            let cx = MODULE_SIZE * i as f32;
            let cy = MODULE_SIZE * j as f32;
            let img = state.inverse_transform.transform(&Point::new(cx, cy));
            let p = img.round_half_even();
            if p.x < 0 || p.y < 0 || p.x as usize >= matrix.width() || p.y as usize >= matrix.height()
            {
                continue;
            }
            if !matrix.get(p.x as usize, p.y as usize) {
                continue;
            }
            let ox = border_width + (i + half) as usize * cell_width;
            let oy = border_width + (j + half) as usize * cell_width;
            for dy in 0..cell_width {
                for dx in 0..cell_width {
                    out.set(ox + dx, oy + dy, true);
                }
            }
        }
    }

    let half_extent = 0.5 * MODULE_SIZE * state.matrix_size as f32;
    let nw = state.inverse_transform.transform(&Point::new(-half_extent, -half_extent));
    let ne = state.inverse_transform.transform(&Point::new(half_extent, -half_extent));
    let sw = state.inverse_transform.transform(&Point::new(-half_extent, half_extent));
    let se = state.inverse_transform.transform(&Point::new(half_extent, half_extent));

    Some((out, [nw, ne, sw, se]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_bullseye_like_structure_returns_not_found() {
        let matrix = BitMatrix::new(20, 20);
        let finder = ComponentFinder::label(&matrix);
        assert!(find_bullseye(&finder).is_none());
    }

    #[test]
    fn common_prefix_len_stops_at_first_difference() {
        assert_eq!(common_prefix_len(&[1, 2, 3], &[1, 2, 4]), 2);
        assert_eq!(common_prefix_len(&[1, 2], &[1, 2, 3]), 2);
        assert_eq!(common_prefix_len(&[], &[1]), 0);
    }

    #[test]
    fn pairwise_distinct_detects_repeats() {
        assert!(pairwise_distinct(&[1, 2, 3]));
        assert!(!pairwise_distinct(&[1, 2, 1]));
    }

    #[test]
    fn compact_initial_transform_maps_ideal_corners_to_pixel_corners() {
        let quad = Quadrilateral::new(
            PointI::new(100, 100),
            PointI::new(200, 100),
            PointI::new(100, 200),
            PointI::new(200, 200),
        );
        let t = compute_initial_transform(true, &quad).unwrap();
        let s = 7.0 * MODULE_SIZE / 2.0;
        let p = t.transform(&Point::new(-s, -s));
        assert!((p.x - 100.0).abs() < 1.0);
        assert!((p.y - 100.0).abs() < 1.0);
    }

    #[test]
    fn detect_on_blank_image_fails() {
        let matrix = BitMatrix::new(50, 50);
        assert!(matches!(detect(&matrix), Err(AztecError::NotFound)));
    }
}
