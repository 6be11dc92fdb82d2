//! Neighbour consensus over raw candidate windows.
//!
//! A cascade fires several times around a real face (at neighbouring
//! positions and window sizes) and only occasionally on clutter. Clustering
//! the hits and demanding a minimum cluster size separates the two.

use crate::detector::DetectedFace;

/// Relative tolerance used when deciding whether two windows hit the same
/// object.
pub const GROUP_EPS: f64 = 0.2;

/// Clusters candidate windows and keeps the clusters with more than
/// `min_neighbors` members, each reduced to its mean rectangle.
///
/// With `min_neighbors == 0` the candidates are returned as they are.
pub fn group_rectangles(
    candidates: &[DetectedFace],
    min_neighbors: u32,
    eps: f64,
) -> Vec<DetectedFace> {
    if min_neighbors == 0 || candidates.is_empty() {
        return candidates.to_vec();
    }

    let labels = partition(candidates, eps);
    let class_count = labels.iter().copied().max().map_or(0, |max| max + 1);

    let mut sums = vec![[0i64; 4]; class_count];
    let mut counts = vec![0u32; class_count];
    for (face, &label) in candidates.iter().zip(&labels) {
        let sum = &mut sums[label];
        sum[0] += i64::from(face.x);
        sum[1] += i64::from(face.y);
        sum[2] += i64::from(face.width);
        sum[3] += i64::from(face.height);
        counts[label] += 1;
    }

    let clusters: Vec<(DetectedFace, u32)> = sums
        .iter()
        .zip(&counts)
        .filter(|&(_, &count)| count > min_neighbors)
        .map(|(sum, &count)| {
            let mean = |v: i64| (v as f64 / f64::from(count)).round() as i32;
            let face = DetectedFace {
                x: mean(sum[0]),
                y: mean(sum[1]),
                width: mean(sum[2]),
                height: mean(sum[3]),
            };
            (face, count)
        })
        .collect();

    clusters
        .iter()
        .enumerate()
        .filter(|&(i, &(inner, inner_count))| {
            !clusters.iter().enumerate().any(|(j, &(outer, outer_count))| {
                i != j
                    && (outer_count > inner_count.max(3) || inner_count < 3)
                    && contains(&outer, &inner, eps)
            })
        })
        .map(|(_, &(face, _))| face)
        .collect()
}

fn similar(a: &DetectedFace, b: &DetectedFace, eps: f64) -> bool {
    let delta = eps * f64::from(a.width.min(b.width) + a.height.min(b.height)) * 0.5;
    let close = |p: i32, q: i32| f64::from((p - q).abs()) <= delta;

    close(a.x, b.x) && close(a.y, b.y) && close(a.right(), b.right()) && close(a.bottom(), b.bottom())
}

/// Whether `inner` lies inside `outer` give or take `eps` of the outer size.
fn contains(outer: &DetectedFace, inner: &DetectedFace, eps: f64) -> bool {
    let dx = (f64::from(outer.width) * eps).round() as i32;
    let dy = (f64::from(outer.height) * eps).round() as i32;

    inner.x >= outer.x - dx
        && inner.y >= outer.y - dy
        && inner.right() <= outer.right() + dx
        && inner.bottom() <= outer.bottom() + dy
}

/// Labels each candidate with the index of its equivalence class under the
/// transitive closure of [`similar`]. Labels are dense, starting at 0.
fn partition(candidates: &[DetectedFace], eps: f64) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..candidates.len()).collect();

    fn find(parent: &mut [usize], mut node: usize) -> usize {
        while parent[node] != node {
            parent[node] = parent[parent[node]];
            node = parent[node];
        }
        node
    }

    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            if similar(&candidates[i], &candidates[j], eps) {
                let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                if a != b {
                    parent[b] = a;
                }
            }
        }
    }

    let mut dense = vec![usize::MAX; candidates.len()];
    let mut next = 0;
    (0..candidates.len())
        .map(|i| {
            let root = find(&mut parent, i);
            if dense[root] == usize::MAX {
                dense[root] = next;
                next += 1;
            }
            dense[root]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn face(x: i32, y: i32, width: i32, height: i32) -> DetectedFace {
        DetectedFace { x, y, width, height }
    }

    fn jittered(around: DetectedFace, count: usize) -> Vec<DetectedFace> {
        (0..count as i32)
            .map(|k| face(around.x + k % 3 - 1, around.y + k % 2, around.width + k % 3, around.height + k % 3))
            .collect()
    }

    #[test]
    fn test_zero_neighbors_returns_candidates_unchanged() {
        let candidates = vec![face(0, 0, 10, 10), face(1, 1, 10, 10), face(50, 50, 20, 20)];
        assert_eq!(group_rectangles(&candidates, 0, GROUP_EPS), candidates);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_rectangles(&[], 4, GROUP_EPS).is_empty());
    }

    #[rstest]
    #[case(4, 5, 1)]
    #[case(4, 4, 0)]
    #[case(1, 2, 1)]
    #[case(6, 5, 0)]
    fn test_cluster_needs_more_than_min_neighbors(
        #[case] min_neighbors: u32,
        #[case] hits: usize,
        #[case] expected: usize,
    ) {
        let candidates = jittered(face(100, 100, 60, 60), hits);
        assert_eq!(group_rectangles(&candidates, min_neighbors, GROUP_EPS).len(), expected);
    }

    #[test]
    fn test_cluster_is_reduced_to_mean_rectangle() {
        let candidates = vec![
            face(98, 100, 60, 60),
            face(100, 100, 60, 60),
            face(102, 100, 60, 60),
            face(100, 98, 62, 62),
            face(100, 102, 58, 58),
        ];
        let grouped = group_rectangles(&candidates, 4, GROUP_EPS);
        assert_eq!(grouped, vec![face(100, 100, 60, 60)]);
    }

    #[test]
    fn test_isolated_hit_is_rejected() {
        let mut candidates = jittered(face(100, 100, 60, 60), 6);
        candidates.push(face(300, 20, 30, 30));
        let grouped = group_rectangles(&candidates, 2, GROUP_EPS);
        assert_eq!(grouped.len(), 1);
        assert!(grouped[0].x < 110);
    }

    #[test]
    fn test_separate_faces_stay_separate() {
        let mut candidates = jittered(face(20, 20, 40, 40), 5);
        candidates.extend(jittered(face(200, 40, 50, 50), 5));
        let grouped = group_rectangles(&candidates, 3, GROUP_EPS);
        assert_eq!(grouped.len(), 2);
    }

    #[test]
    fn test_weak_cluster_inside_strong_one_is_dropped() {
        let mut candidates = jittered(face(100, 100, 100, 100), 12);
        candidates.extend(jittered(face(130, 130, 30, 30), 4));
        let grouped = group_rectangles(&candidates, 2, GROUP_EPS);
        assert_eq!(grouped.len(), 1);
        assert!(grouped[0].width >= 100);
    }

    #[test]
    fn test_similarity_is_transitive_through_chains() {
        // Neighbouring hits drift by less than the tolerance each step.
        let candidates: Vec<_> = (0..6).map(|k| face(100 + 5 * k, 100, 50, 50)).collect();
        let grouped = group_rectangles(&candidates, 5, GROUP_EPS);
        assert_eq!(grouped.len(), 1);
    }
}
