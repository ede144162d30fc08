/// Two-pass union-find connected-component labeling over a bicolor bit
/// matrix. Produces a dense root-label grid and per-label metadata (color,
/// pixel count, bounding envelope), the input the bull's-eye search walks.
use crate::models::{BitMatrix, Envelope};
use std::collections::HashMap;

/// Metadata recorded for one maximal 4-connected same-color region.
#[derive(Debug, Clone, Copy)]
pub struct ConnectedComponent {
    pub label: u32,
    pub num_pixels: u32,
    pub envelope: Envelope,
    pub black: bool,
}

/// Owns the label grid and component table produced by [`ComponentFinder::label`].
pub struct ComponentFinder {
    width: usize,
    height: usize,
    labels: Vec<u32>,
    components: HashMap<u32, ConnectedComponent>,
}

impl ComponentFinder {
    /// Run the two-pass labeler over `matrix`.
    pub fn label(matrix: &BitMatrix) -> Self {
        let width = matrix.width();
        let height = matrix.height();
        let mut labels = vec![0u32; width * height];
        let mut parent: Vec<u32> = Vec::new();
        let mut next_label = 1u32;

        // Pass 1: provisional labels, symmetric 4-neighbor set. Forward
        // neighbors haven't been visited yet so still carry label 0 and are
        // filtered out below, which is equivalent in effect to inspecting
        // only the already-visited neighbor set.
        for y in 0..height {
            for x in 0..width {
                let c = matrix.get(x, y);
                let mut neighbor_labels: Vec<u32> = Vec::with_capacity(4);

                let candidates = [
                    (x.wrapping_sub(1), y, x > 0),
                    (x + 1, y, x + 1 < width),
                    (x, y.wrapping_sub(1), y > 0),
                    (x, y + 1, y + 1 < height),
                ];
                for (nx, ny, in_bounds) in candidates {
                    if in_bounds && matrix.get(nx, ny) == c {
                        let l = labels[ny * width + nx];
                        if l != 0 {
                            neighbor_labels.push(l);
                        }
                    }
                }

                let idx = y * width + x;
                if neighbor_labels.is_empty() {
                    labels[idx] = next_label;
                    parent.push(0);
                    next_label += 1;
                } else {
                    let m = *neighbor_labels.iter().min().unwrap();
                    labels[idx] = m;
                    for l in neighbor_labels {
                        if l != m {
                            let root_l = find_root(&mut parent, l);
                            let root_m = find_root(&mut parent, m);
                            if root_l != root_m {
                                parent[(root_l - 1) as usize] = root_m;
                            }
                        }
                    }
                }
            }
        }

        // Pass 2: resolve every provisional label to its root, accumulate
        // component metadata.
        let mut components: HashMap<u32, ConnectedComponent> = HashMap::new();
        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                let root = find_root(&mut parent, labels[idx]);
                labels[idx] = root;

                let black = matrix.get(x, y);
                let entry = components.entry(root).or_insert(ConnectedComponent {
                    label: root,
                    num_pixels: 0,
                    envelope: Envelope::empty(),
                    black,
                });
                entry.num_pixels += 1;
                entry.envelope.expand(x as i32, y as i32);
            }
        }

        Self {
            width,
            height,
            labels,
            components,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Root label at `(x, y)`, or `0` if out of bounds.
    pub fn label_at(&self, x: i32, y: i32) -> u32 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return 0;
        }
        self.labels[y as usize * self.width + x as usize]
    }

    pub fn component(&self, label: u32) -> Option<&ConnectedComponent> {
        self.components.get(&label)
    }

    /// Black components in ascending pixel-count order, the iteration order
    /// the bull's-eye search requires.
    pub fn black_components_by_size(&self) -> Vec<&ConnectedComponent> {
        let mut v: Vec<&ConnectedComponent> =
            self.components.values().filter(|c| c.black).collect();
        v.sort_by_key(|c| c.num_pixels);
        v
    }
}

fn find_root(parent: &mut [u32], label: u32) -> u32 {
    let idx = (label - 1) as usize;
    if parent[idx] == 0 {
        return label;
    }
    let root = find_root(parent, parent[idx]);
    parent[idx] = root;
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_white_is_one_component() {
        let matrix = BitMatrix::new(4, 3);
        let finder = ComponentFinder::label(&matrix);
        let labels: std::collections::HashSet<u32> =
            (0..3).flat_map(|y| (0..4).map(move |x| (x, y))).map(|(x, y)| finder.label_at(x, y)).collect();
        assert_eq!(labels.len(), 1);
        let label = *labels.iter().next().unwrap();
        let comp = finder.component(label).unwrap();
        assert!(!comp.black);
        assert_eq!(comp.num_pixels, 12);
    }

    #[test]
    fn single_black_pixel_amid_white_makes_two_components() {
        let mut matrix = BitMatrix::new(5, 5);
        matrix.set(2, 2, true);
        let finder = ComponentFinder::label(&matrix);
        let mut labels = std::collections::HashSet::new();
        for y in 0..5 {
            for x in 0..5 {
                labels.insert(finder.label_at(x, y));
            }
        }
        assert_eq!(labels.len(), 2);
        let black_label = finder.label_at(2, 2);
        let comp = finder.component(black_label).unwrap();
        assert!(comp.black);
        assert_eq!(comp.num_pixels, 1);
    }

    #[test]
    fn sum_of_pixel_counts_equals_area() {
        let mut matrix = BitMatrix::new(10, 10);
        for y in 0..10 {
            for x in 0..10 {
                if (x + y) % 3 == 0 {
                    matrix.set(x, y, true);
                }
            }
        }
        let finder = ComponentFinder::label(&matrix);
        let total: u32 = finder.components.values().map(|c| c.num_pixels).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn envelope_contains_every_pixel_of_its_label() {
        let mut matrix = BitMatrix::new(6, 6);
        for x in 1..4 {
            matrix.set(x, 2, true);
        }
        let finder = ComponentFinder::label(&matrix);
        for y in 0..6 {
            for x in 0..6 {
                let label = finder.label_at(x as i32, y as i32);
                let comp = finder.component(label).unwrap();
                assert!(comp.envelope.contains(x as i32, y as i32));
            }
        }
    }
}
