use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use almondbread_core::PointResult;

use crate::buffer::{PixelBuffer, BYTES_PER_PIXEL};
use crate::error::RenderError;
use crate::gradient::{BuiltinScheme, GradientScheme};
use crate::histogram::Palette;
use crate::progress::{CancelToken, Progress, PROGRESS_INTERVAL};
use crate::smooth::smooth_ratio;
use crate::value_grid::ValueGrid;

/// What the coloring pass needs besides the value grid.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub max_iterations: u32,
    pub scheme: GradientScheme,
}

impl RenderSettings {
    pub fn new(max_iterations: u32, scheme: GradientScheme) -> Self {
        Self {
            max_iterations,
            scheme,
        }
    }

    pub fn builtin(max_iterations: u32, scheme: BuiltinScheme) -> Self {
        Self::new(max_iterations, scheme.scheme())
    }
}

/// Color a single point: smooth ratio → gradient → RGBA8.
#[inline]
pub fn colorize_point(
    result: &PointResult,
    settings: &RenderSettings,
    palette: &Palette,
) -> [u8; 4] {
    let ratio = smooth_ratio(result, settings.max_iterations, palette);
    settings.scheme.color_for(ratio).to_rgba8()
}

/// Turn a completed value grid into an RGBA8 pixel buffer.
///
/// The histogram palette is built once from the whole grid, so a partially
/// computed grid is refused with [`RenderError::IncompleteGrid`]. Pixels are
/// colored in parallel chunks of [`PROGRESS_INTERVAL`]; progress and
/// cancellation behave as in [`compute`](crate::compute).
pub fn render<P>(
    grid: &ValueGrid,
    settings: &RenderSettings,
    on_progress: P,
    cancel: &CancelToken,
) -> crate::Result<PixelBuffer>
where
    P: FnMut(usize) + Send,
{
    if !grid.is_complete() {
        return Err(RenderError::IncompleteGrid {
            filled: grid.filled(),
            expected: grid.cell_count(),
        });
    }

    let start = Instant::now();
    let guard = cancel.guard();
    let palette = Palette::build(grid, settings.max_iterations);
    debug!(
        cells = grid.cell_count(),
        max_iterations = settings.max_iterations,
        "Starting render"
    );

    let progress = Progress::new(on_progress);
    let mut pixels = vec![0u8; PixelBuffer::byte_len(grid.width, grid.height)];
    pixels
        .par_chunks_mut(PROGRESS_INTERVAL * BYTES_PER_PIXEL)
        .zip(grid.data.par_chunks(PROGRESS_INTERVAL))
        .for_each(|(out, cells)| {
            if guard.should_stop() {
                return;
            }
            for (pixel, result) in out.chunks_exact_mut(BYTES_PER_PIXEL).zip(cells) {
                pixel.copy_from_slice(&colorize_point(result, settings, &palette));
            }
            progress.advance(cells.len());
        });

    if guard.tripped() {
        info!(
            elapsed_ms = start.elapsed().as_millis(),
            "Render cancelled"
        );
        return Err(RenderError::Cancelled);
    }

    progress.finish();
    info!(elapsed_ms = start.elapsed().as_millis(), "Render complete");
    PixelBuffer::from_bytes(grid.width, grid.height, pixels)
}
