/// Diagonal-sweep corner finder: given a labeled ring-shaped component,
/// locates its four extreme NW/NE/SW/SE pixels.
use super::connected_components::ComponentFinder;
use crate::models::{Envelope, PointI, Quadrilateral};

/// Sweep the four diagonals of `env` to find the extreme corners of `label`.
/// Returns `None` if a sweep runs the full envelope without finding the
/// label, which indicates a malformed (non-ring) component.
pub fn find_quadrilateral(
    finder: &ComponentFinder,
    label: u32,
    env: &Envelope,
) -> Option<Quadrilateral> {
    let d = env.width().max(env.height());
    let min_x = env.min_x();
    let min_y = env.min_y();

    let nw = sweep(finder, label, env, j_range_up(min_y, d), min_x, 1, -1)?;
    let ne = sweep(finder, label, env, j_range_up(min_y, d), min_x + d, -1, -1)?;
    let sw = sweep(finder, label, env, j_range_down(min_y, d), min_x, 1, 1)?;
    let se = sweep(finder, label, env, j_range_down(min_y, d), min_x + d, -1, 1)?;

    Some(Quadrilateral::new(nw, ne, sw, se))
}

fn j_range_up(min_y: i32, d: i32) -> Vec<i32> {
    (min_y..=min_y + d).collect()
}

fn j_range_down(min_y: i32, d: i32) -> Vec<i32> {
    (min_y..=min_y + d).rev().collect()
}

fn sweep(
    finder: &ComponentFinder,
    label: u32,
    env: &Envelope,
    j_range: Vec<i32>,
    start_x: i32,
    dx: i32,
    dy: i32,
) -> Option<PointI> {
    for j in j_range {
        let mut x = start_x;
        let mut y = j;
        while env.contains(x, y) {
            if finder.label_at(x, y) == label {
                return Some(PointI::new(x, y));
            }
            x += dx;
            y += dy;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BitMatrix;

    /// Draw a hollow square ring of `label`-colored pixels and verify the
    /// sweep recovers its four corners.
    #[test]
    fn finds_corners_of_a_square_ring() {
        let mut matrix = BitMatrix::new(12, 12);
        for x in 2..10 {
            matrix.set(x, 2, true);
            matrix.set(x, 9, true);
        }
        for y in 2..10 {
            matrix.set(2, y, true);
            matrix.set(9, y, true);
        }

        let finder = ComponentFinder::label(&matrix);
        let label = finder.label_at(2, 2);
        let comp = finder.component(label).unwrap();
        let q = find_quadrilateral(&finder, label, &comp.envelope).unwrap();

        assert_eq!(q.nw, PointI::new(2, 2));
        assert_eq!(q.ne, PointI::new(9, 2));
        assert_eq!(q.sw, PointI::new(2, 9));
        assert_eq!(q.se, PointI::new(9, 9));
    }

    #[test]
    fn missing_label_in_envelope_returns_none() {
        let matrix = BitMatrix::new(5, 5);
        let finder = ComponentFinder::label(&matrix);
        let bogus_env = Envelope::from_quadrilateral(&Quadrilateral::new(
            PointI::new(0, 0),
            PointI::new(4, 0),
            PointI::new(0, 4),
            PointI::new(4, 4),
        ));
        assert!(find_quadrilateral(&finder, 999, &bogus_env).is_none());
    }
}
