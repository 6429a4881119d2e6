use crate::decoder::DecodedFrame;
use crate::shared::config::OverlayBounds;
use crate::shared::error::OverlayError;

/// Stamps every (row, col) in `points` with `color`. Pixels not listed are
/// left alone. Returns how many pixels were written.
pub fn draw_polygon(
    frame: &mut DecodedFrame,
    points: &[(i64, i64)],
    color: [u8; 3],
    bounds: OverlayBounds,
) -> Result<usize, OverlayError> {
    if bounds == OverlayBounds::Reject {
        if let Some(&(row, col)) = points.iter().find(|&&p| locate(frame, p).is_none()) {
            return Err(OverlayError::OutOfBounds {
                row,
                col,
                rows: frame.rows,
                cols: frame.cols,
            });
        }
    }

    let mut written = 0;
    for &point in points {
        if let Some((row, col)) = locate(frame, point) {
            frame.set_pixel(row, col, color);
            written += 1;
        }
    }
    Ok(written)
}

fn locate(frame: &DecodedFrame, (row, col): (i64, i64)) -> Option<(usize, usize)> {
    let row = usize::try_from(row).ok().filter(|r| *r < frame.rows)?;
    let col = usize::try_from(col).ok().filter(|c| *c < frame.cols)?;
    Some((row, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(rows: usize, cols: usize) -> DecodedFrame {
        let data = (0..rows * cols * 3).map(|i| (i % 251) as u8).collect();
        DecodedFrame::new(rows, cols, data)
    }

    #[test]
    fn only_listed_pixels_change() {
        let original = gradient(4, 5);
        let mut frame = original.clone();
        let points = [(0, 0), (1, 4), (3, 2)];
        let color = [1, 2, 3];

        let written = draw_polygon(&mut frame, &points, color, OverlayBounds::Reject).unwrap();
        assert_eq!(written, 3);

        for r in 0..4 {
            for c in 0..5 {
                if points.contains(&(r as i64, c as i64)) {
                    assert_eq!(frame.pixel(r, c), color);
                } else {
                    assert_eq!(frame.pixel(r, c), original.pixel(r, c));
                }
            }
        }
    }

    #[test]
    fn out_of_range_point_is_rejected_without_drawing() {
        let original = gradient(2, 2);
        let mut frame = original.clone();
        let err = draw_polygon(&mut frame, &[(0, 0), (2, 0)], [9, 9, 9], OverlayBounds::Reject)
            .unwrap_err();
        assert!(matches!(err, OverlayError::OutOfBounds { row: 2, col: 0, .. }));
        assert_eq!(frame, original);
    }

    #[test]
    fn clip_skips_out_of_range_points() {
        let mut frame = gradient(2, 2);
        let written = draw_polygon(
            &mut frame,
            &[(-1, 0), (1, 1), (0, 7)],
            [9, 9, 9],
            OverlayBounds::Clip,
        )
        .unwrap();
        assert_eq!(written, 1);
        assert_eq!(frame.pixel(1, 1), [9, 9, 9]);
    }
}
