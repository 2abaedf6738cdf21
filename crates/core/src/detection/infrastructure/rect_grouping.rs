use crate::shared::region::Region;

/// Relative tolerance for two raw hits to count as the same object.
pub const GROUP_EPS: f64 = 0.2;

/// Clusters raw cascade hits and averages each cluster.
///
/// Clusters backed by `min_neighbors` hits or fewer are dropped, as are
/// clusters sitting inside a stronger one. A `min_neighbors` of zero keeps
/// the raw hits untouched.
pub fn group_rectangles(rects: &[Region], min_neighbors: usize, eps: f64) -> Vec<Region> {
    if min_neighbors == 0 || rects.is_empty() {
        return rects.to_vec();
    }

    let (labels, n_classes) = partition(rects, eps);

    let mut sums = vec![[0i64; 4]; n_classes];
    let mut counts = vec![0usize; n_classes];
    for (r, &label) in rects.iter().zip(&labels) {
        let s = &mut sums[label];
        s[0] += r.x as i64;
        s[1] += r.y as i64;
        s[2] += r.width as i64;
        s[3] += r.height as i64;
        counts[label] += 1;
    }

    let averaged: Vec<Region> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &n)| {
            let avg = |v: i64| (v as f64 / n as f64).round() as i32;
            Region::new(avg(s[0]), avg(s[1]), avg(s[2]), avg(s[3]))
        })
        .collect();

    let mut grouped = Vec::new();
    for (i, r1) in averaged.iter().enumerate() {
        let n1 = counts[i];
        if n1 <= min_neighbors {
            continue;
        }
        let swallowed = averaged.iter().enumerate().any(|(j, r2)| {
            let n2 = counts[j];
            j != i
                && n2 > min_neighbors
                && is_nested(r1, r2, eps)
                && (n2 > n1.max(3) || n1 < 3)
        });
        if !swallowed {
            grouped.push(*r1);
        }
    }
    grouped
}

fn similar(a: &Region, b: &Region, eps: f64) -> bool {
    let delta = eps * (a.width.min(b.width) + a.height.min(b.height)) as f64 * 0.5;
    (a.x - b.x).abs() as f64 <= delta
        && (a.y - b.y).abs() as f64 <= delta
        && (a.right() - b.right()).abs() as f64 <= delta
        && (a.bottom() - b.bottom()).abs() as f64 <= delta
}

/// True when `inner` lies within `outer` grown by `eps` of its size.
fn is_nested(inner: &Region, outer: &Region, eps: f64) -> bool {
    let dx = (outer.width as f64 * eps).round() as i32;
    let dy = (outer.height as f64 * eps).round() as i32;
    inner.x >= outer.x - dx
        && inner.y >= outer.y - dy
        && inner.right() <= outer.right() + dx
        && inner.bottom() <= outer.bottom() + dy
}

/// Labels every rectangle with its equivalence class under `similar`.
/// Classes are numbered in order of first appearance.
fn partition(rects: &[Region], eps: f64) -> (Vec<usize>, usize) {
    let mut sets = DisjointSet::new(rects.len());
    for i in 0..rects.len() {
        for j in i + 1..rects.len() {
            if similar(&rects[i], &rects[j], eps) {
                sets.union(i, j);
            }
        }
    }

    let mut class_of_root = vec![usize::MAX; rects.len()];
    let mut n_classes = 0;
    let labels = (0..rects.len())
        .map(|i| {
            let root = sets.find(i);
            if class_of_root[root] == usize::MAX {
                class_of_root[root] = n_classes;
                n_classes += 1;
            }
            class_of_root[root]
        })
        .collect();
    (labels, n_classes)
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}
