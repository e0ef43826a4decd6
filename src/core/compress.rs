use crate::utils::error::Result;

pub const MIN_QUALITY: u8 = 40;
pub const MAX_QUALITY: u8 = 95;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed {
    pub quality: u8,
    pub bytes: Vec<u8>,
}

/// Binary search over quality 40..=95 for the highest quality whose output
/// fits in `max_bytes`. Falls back to the quality-40 encoding when nothing fits.
pub fn compress_to_budget<F>(max_bytes: u64, mut encode: F) -> Result<Compressed>
where
    F: FnMut(u8) -> Result<Vec<u8>>,
{
    let mut low = MIN_QUALITY;
    let mut high = MAX_QUALITY;
    let mut best: Option<Compressed> = None;
    let mut lowest_tried: Option<Compressed> = None;

    while low <= high {
        let quality = low + (high - low) / 2;
        let bytes = encode(quality)?;
        tracing::debug!("quality {} -> {} bytes", quality, bytes.len());

        if bytes.len() as u64 <= max_bytes {
            best = Some(Compressed { quality, bytes });
            low = quality + 1;
        } else {
            if lowest_tried.as_ref().map_or(true, |c| quality < c.quality) {
                lowest_tried = Some(Compressed { quality, bytes });
            }
            if quality == MIN_QUALITY {
                break;
            }
            high = quality - 1;
        }
    }

    match best.or(lowest_tried) {
        Some(found) => Ok(found),
        None => {
            let bytes = encode(MIN_QUALITY)?;
            Ok(Compressed {
                quality: MIN_QUALITY,
                bytes,
            })
        }
    }
}
