use crate::geometry::Coordinate;
use std::collections::VecDeque;

enum Splice {
    Append { reverse: bool },
    Prepend { reverse: bool },
}

/// Stitches an unordered collection of coordinate fragments into the
/// minimal collection of maximal chains by endpoint matching.
///
/// A chain is seeded from the first unconsumed fragment, then grown by
/// scanning the pool for any fragment whose first or last coordinate
/// equals the chain's head or tail; the fragment is spliced on (reversed
/// when needed) with the shared coordinate deduplicated. A full scan
/// with no match finishes the chain. A finished chain whose endpoints
/// coincide is a candidate ring; otherwise it is an open polyline.
///
/// Tie-break when several fragments match the same endpoint: stable
/// input order. The pool is consumed front-to-back and the first
/// matching fragment wins; at a given fragment the probe order is
/// tail-to-first, tail-to-last, head-to-last, head-to-first.
pub fn merge_segments(fragments: Vec<Vec<Coordinate>>) -> Vec<Vec<Coordinate>> {
    let mut pool: VecDeque<Vec<Coordinate>> =
        fragments.into_iter().filter(|f| !f.is_empty()).collect();
    let mut merged: Vec<Vec<Coordinate>> = Vec::new();

    while let Some(seed) = pool.pop_front() {
        let mut chain: VecDeque<Coordinate> = seed.into();

        loop {
            let (Some(&head), Some(&tail)) = (chain.front(), chain.back()) else {
                break;
            };

            // A closed ring cannot grow further.
            if chain.len() > 1 && head == tail {
                break;
            }

            let Some((index, splice)) = find_splice(&pool, head, tail) else {
                break;
            };

            let Some(mut fragment) = pool.remove(index) else {
                break;
            };

            match splice {
                Splice::Append { reverse } => {
                    if reverse {
                        fragment.reverse();
                    }
                    // Drop the shared coordinate before extending.
                    chain.pop_back();
                    chain.extend(fragment);
                }
                Splice::Prepend { reverse } => {
                    if reverse {
                        fragment.reverse();
                    }
                    fragment.pop();
                    for coordinate in fragment.into_iter().rev() {
                        chain.push_front(coordinate);
                    }
                }
            }
        }

        merged.push(chain.into_iter().collect());
    }

    merged
}

fn find_splice(
    pool: &VecDeque<Vec<Coordinate>>,
    head: Coordinate,
    tail: Coordinate,
) -> Option<(usize, Splice)> {
    for (index, fragment) in pool.iter().enumerate() {
        let first = fragment[0];
        let last = fragment[fragment.len() - 1];

        let splice = if tail == first {
            Splice::Append { reverse: false }
        } else if tail == last {
            Splice::Append { reverse: true }
        } else if head == last {
            Splice::Prepend { reverse: false }
        } else if head == first {
            Splice::Prepend { reverse: true }
        } else {
            continue;
        };

        return Some((index, splice));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon)
    }

    #[test]
    fn test_single_fragment_passes_through() {
        let fragment = vec![c(0.0, 0.0), c(0.0, 1.0)];
        assert_eq!(merge_segments(vec![fragment.clone()]), vec![fragment]);
    }

    #[test]
    fn test_shared_endpoint_merges_without_duplication() {
        let a = vec![c(0.0, 0.0), c(0.0, 1.0), c(0.0, 2.0)];
        let b = vec![c(0.0, 2.0), c(0.0, 3.0), c(0.0, 4.0)];

        let merged = merge_segments(vec![a, b]);

        assert_eq!(
            merged,
            vec![vec![
                c(0.0, 0.0),
                c(0.0, 1.0),
                c(0.0, 2.0),
                c(0.0, 3.0),
                c(0.0, 4.0),
            ]]
        );
    }

    #[test]
    fn test_reversed_fragment_is_flipped_before_merging() {
        let a = vec![c(0.0, 0.0), c(0.0, 1.0)];
        let b = vec![c(0.0, 2.0), c(0.0, 1.0)];

        let merged = merge_segments(vec![a, b]);

        assert_eq!(merged, vec![vec![c(0.0, 0.0), c(0.0, 1.0), c(0.0, 2.0)]]);
    }

    #[test]
    fn test_fragments_with_shared_endpoints_close_into_a_ring() {
        // A -> B -> C and A -> D -> C: together they bound one loop.
        let a = vec![c(0.0, 0.0), c(1.0, 0.0), c(1.0, 1.0)];
        let b = vec![c(0.0, 0.0), c(0.0, 1.0), c(1.0, 1.0)];

        let merged = merge_segments(vec![a, b]);

        assert_eq!(merged.len(), 1);
        let ring = &merged[0];
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());

        let mut interior = ring.clone();
        interior.pop();
        for coordinate in &interior {
            assert_eq!(interior.iter().filter(|c| *c == coordinate).count(), 1);
        }
    }

    #[test]
    fn test_disjoint_fragments_stay_separate() {
        let a = vec![c(0.0, 0.0), c(0.0, 1.0)];
        let b = vec![c(5.0, 5.0), c(5.0, 6.0)];

        let merged = merge_segments(vec![a.clone(), b.clone()]);

        assert_eq!(merged, vec![a, b]);
    }

    #[test]
    fn test_growth_at_the_chain_head() {
        let a = vec![c(0.0, 1.0), c(0.0, 2.0)];
        let b = vec![c(0.0, 0.0), c(0.0, 1.0)];

        let merged = merge_segments(vec![a, b]);

        assert_eq!(merged, vec![vec![c(0.0, 0.0), c(0.0, 1.0), c(0.0, 2.0)]]);
    }

    #[test]
    fn test_empty_fragments_are_ignored() {
        let a = vec![c(0.0, 0.0), c(0.0, 1.0)];

        let merged = merge_segments(vec![Vec::new(), a.clone(), Vec::new()]);

        assert_eq!(merged, vec![a]);
    }

    #[test]
    fn test_closed_seed_does_not_absorb_neighbors() {
        let ring = vec![
            c(0.0, 0.0),
            c(0.0, 1.0),
            c(1.0, 1.0),
            c(1.0, 0.0),
            c(0.0, 0.0),
        ];
        let tail = vec![c(0.0, 0.0), c(0.0, -1.0)];

        let merged = merge_segments(vec![ring.clone(), tail.clone()]);

        assert_eq!(merged, vec![ring, tail]);
    }

    #[test]
    fn test_tie_break_prefers_pool_order() {
        let seed = vec![c(0.0, 0.0), c(0.0, 1.0)];
        let first_candidate = vec![c(0.0, 1.0), c(1.0, 1.0)];
        let second_candidate = vec![c(0.0, 1.0), c(-1.0, 1.0)];

        let merged = merge_segments(vec![seed, first_candidate, second_candidate]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0][..3], [c(0.0, 0.0), c(0.0, 1.0), c(1.0, 1.0)]);
    }
}
