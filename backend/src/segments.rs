use crate::models::{ColorTag, Coordinate, RouteSegment};

pub const DEFAULT_MAX_SEGMENTS: usize = 20;

/// Splits a path into at most `max_segments` contiguous chunks.
///
/// Chunk boundaries fall every `len / count` points; the final segment always
/// ends on the last point. Paths shorter than two points yield nothing.
pub fn segment(path: &[Coordinate], max_segments: usize, color_tag: ColorTag) -> Vec<RouteSegment> {
    let len = path.len();
    if len < 2 || max_segments == 0 {
        return Vec::new();
    }

    let count = max_segments.min(len - 1);
    let chunk = len / count;

    (0..count)
        .filter_map(|i| {
            let start_idx = i * chunk;
            let end_idx = if i + 1 == count {
                len - 1
            } else {
                (i + 1) * chunk
            };
            match (path.get(start_idx), path.get(end_idx)) {
                (Some(start), Some(end)) => Some(RouteSegment {
                    start: *start,
                    end: *end,
                    color_tag,
                }),
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> Vec<Coordinate> {
        (0..n)
            .map(|i| Coordinate::new(i as f64 * 0.001, 0.0))
            .collect()
    }

    #[test]
    fn hundred_points_give_twenty_segments() {
        let path = line(100);
        let segments = segment(&path, 20, ColorTag::Primary);
        assert_eq!(segments.len(), 20);
        assert_eq!(segments[0].start, path[0]);
        assert_eq!(segments[0].end, path[5]);
        assert_eq!(segments[19].start, path[95]);
        assert_eq!(segments[19].end, path[99]);
    }

    #[test]
    fn three_points_give_two_segments() {
        let path = line(3);
        let segments = segment(&path, 20, ColorTag::Fallback);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start, path[0]);
        assert_eq!(segments[0].end, path[1]);
        assert_eq!(segments[1].start, path[1]);
        assert_eq!(segments[1].end, path[2]);
        assert!(segments.iter().all(|s| s.color_tag == ColorTag::Fallback));
    }

    #[test]
    fn degenerate_inputs_give_nothing() {
        assert!(segment(&line(1), 20, ColorTag::Primary).is_empty());
        assert!(segment(&[], 20, ColorTag::Primary).is_empty());
        assert!(segment(&line(10), 0, ColorTag::Primary).is_empty());
    }

    #[test]
    fn straight_line_fallback_has_twenty_segments() {
        let path = line(21);
        let segments = segment(&path, DEFAULT_MAX_SEGMENTS, ColorTag::Fallback);
        assert_eq!(segments.len(), 20);
        for (i, seg) in segments.iter().enumerate() {
            assert_eq!(seg.start, path[i]);
            assert_eq!(seg.end, path[i + 1]);
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_segments_are_contiguous(len in 2usize..500, max in 1usize..40) {
                let path = line(len);
                let segments = segment(&path, max, ColorTag::Primary);
                prop_assert_eq!(segments.len(), max.min(len - 1));
                prop_assert_eq!(segments[0].start, path[0]);
                prop_assert_eq!(segments.last().unwrap().end, path[len - 1]);
                for pair in segments.windows(2) {
                    prop_assert_eq!(pair[0].end, pair[1].start);
                }
            }

            #[test]
            fn prop_segmentation_is_deterministic(len in 0usize..200, max in 0usize..30) {
                let path = line(len);
                prop_assert_eq!(
                    segment(&path, max, ColorTag::Primary),
                    segment(&path, max, ColorTag::Primary)
                );
            }
        }
    }
}
