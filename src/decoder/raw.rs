use super::frame_data::{DecodedFrame, FrameRow};
use crate::shared::config::MonoAxisOrder;
use crate::shared::error::DecodeError;

/// Turns a stored sensor buffer into a 3-channel BGR grid.
///
/// `bgra8` rows are laid out (height, width, 4) and lose their alpha channel.
/// Any other encoding is a single 8-bit channel copied into all three
/// channels; with [`MonoAxisOrder::Legacy`] that channel is read as
/// (width, height), i.e. the grid has `width` rows.
///
/// Samples are single bytes, so `is_bigendian` never changes the result.
pub fn decode_frame(row: &FrameRow, mono_order: MonoAxisOrder) -> Result<DecodedFrame, DecodeError> {
    let (width, height) = dimensions(row)?;

    if row.is_color() {
        let (rows, cols) = (height, width);
        let pixels = check_len(row, rows, cols, 4)?;
        let mut data = Vec::with_capacity(pixels * DecodedFrame::CHANNELS);
        for bgra in row.data.chunks_exact(4) {
            data.extend_from_slice(&bgra[..3]);
        }
        Ok(DecodedFrame::new(rows, cols, data))
    } else {
        let (rows, cols) = match mono_order {
            MonoAxisOrder::Legacy => (width, height),
            MonoAxisOrder::RowMajor => (height, width),
        };
        let pixels = check_len(row, rows, cols, 1)?;
        let mut data = Vec::with_capacity(pixels * DecodedFrame::CHANNELS);
        for &value in &row.data {
            data.extend_from_slice(&[value; 3]);
        }
        Ok(DecodedFrame::new(rows, cols, data))
    }
}

fn dimensions(row: &FrameRow) -> Result<(usize, usize), DecodeError> {
    let invalid = || DecodeError::Dimensions {
        image_count: row.image_count,
        width: row.width,
        height: row.height,
    };
    let width = usize::try_from(row.width).map_err(|_| invalid())?;
    let height = usize::try_from(row.height).map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

/// Returns the pixel count when the buffer holds exactly rows x cols x channels bytes.
fn check_len(row: &FrameRow, rows: usize, cols: usize, channels: usize) -> Result<usize, DecodeError> {
    let sizes = rows
        .checked_mul(cols)
        .and_then(|pixels| pixels.checked_mul(channels).map(|bytes| (pixels, bytes)));
    let Some((pixels, expected)) = sizes else {
        return Err(DecodeError::Dimensions {
            image_count: row.image_count,
            width: row.width,
            height: row.height,
        });
    };
    if row.data.len() != expected {
        return Err(DecodeError::BufferLength {
            image_count: row.image_count,
            rows,
            cols,
            channels,
            expected,
            actual: row.data.len(),
        });
    }
    Ok(pixels)
}
