use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use almondbread_core::{evaluate, GridSettings, PointResult};

use crate::error::RenderError;
use crate::progress::{CancelToken, Progress, PROGRESS_INTERVAL};
use crate::value_grid::ValueGrid;

/// Compute the escape-time value grid for `settings`.
///
/// When `resume` holds a prefix computed for the same dimensions and budget,
/// those cells are kept and only the remainder is evaluated; a prefix that
/// does not match is discarded and the calculation starts from empty. The
/// caller's prefix is never modified.
///
/// Cells are evaluated in chunks of [`PROGRESS_INTERVAL`] across the Rayon
/// pool. `on_progress` receives the running number of newly computed cells
/// after each chunk, and once more with the exact total on success.
/// Cancellation via `cancel` is observed at chunk boundaries and yields
/// [`RenderError::Cancelled`].
pub fn compute<P>(
    settings: &GridSettings,
    resume: Option<&ValueGrid>,
    on_progress: P,
    cancel: &CancelToken,
) -> crate::Result<ValueGrid>
where
    P: FnMut(usize) + Send,
{
    settings.validate()?;
    let start = Instant::now();
    let guard = cancel.guard();
    let cells = settings.cell_count();

    let mut grid = ValueGrid::empty(settings);
    if let Some(prefix) = resume {
        match prefix.check_matches(settings) {
            Ok(()) => grid.data.extend_from_slice(&prefix.data),
            Err(e) => warn!("Ignoring resume prefix: {e}"),
        }
    }
    let resumed = grid.filled();
    debug!(
        cells,
        resumed,
        width = settings.width,
        height = settings.height,
        max_iterations = settings.max_iterations,
        "Starting calculation"
    );

    grid.data.resize(cells, PointResult::default());
    let progress = Progress::new(on_progress);

    grid.data[resumed..]
        .par_chunks_mut(PROGRESS_INTERVAL)
        .enumerate()
        .for_each(|(chunk_index, chunk)| {
            if guard.should_stop() {
                return;
            }
            let base = resumed + chunk_index * PROGRESS_INTERVAL;
            for (offset, cell) in chunk.iter_mut().enumerate() {
                let (x0, y0) = settings.index_to_point(base + offset);
                *cell = evaluate(x0, y0, settings.max_iterations);
            }
            progress.advance(chunk.len());
        });

    if guard.tripped() {
        info!(
            elapsed_ms = start.elapsed().as_millis(),
            "Calculation cancelled"
        );
        return Err(RenderError::Cancelled);
    }

    let computed = progress.finish();
    info!(
        elapsed_ms = start.elapsed().as_millis(),
        computed, resumed, "Calculation complete"
    );
    Ok(grid)
}
