use crate::entity::{descending_order, Entity, EntityId};
use crate::layout::apportion::largest_remainder;
use crate::layout::GridConfig;

/// Grid size in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GridDims {
    pub cols: u32,
    pub rows: u32,
}

impl GridDims {
    pub fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }

    /// Exact cell count; `cols * rows` can exceed `u32`.
    pub fn cells(self) -> u64 {
        self.cols as u64 * self.rows as u64
    }

    /// Cell count when it is addressable with `u32` cell indices.
    pub fn checked_cells(self) -> Option<u32> {
        self.cols.checked_mul(self.rows)
    }
}

/// A contiguous block of cells owned by one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRun {
    pub entity: EntityId,
    pub start_cell: u32,
    pub cell_count: u32,
}

impl CellRun {
    pub fn end_cell(&self) -> u32 {
        self.start_cell + self.cell_count
    }
}

/// Non-fatal conditions worth surfacing to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GridWarning {
    #[error("grid of {cells} cells cannot represent {entities} entities; {starved} get no cells")]
    CapacityBelowEntityCount {
        cells: u32,
        entities: usize,
        starved: usize,
    },

    #[error("grid of {cols}x{rows} overflows u32 cell indices; nothing apportioned")]
    CellCountOverflow { cols: u32, rows: u32 },
}

/// Result of a discrete apportionment pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Apportionment {
    pub dims: GridDims,
    /// Owning entity index for each cell, row-major
    pub cell_owner: Vec<u32>,
    /// One run per entity with a nonzero share, in magnitude-descending order
    pub runs: Vec<CellRun>,
    /// Final cell share per entity, indexed like the input slice
    pub shares: Vec<u32>,
    pub warnings: Vec<GridWarning>,
}

impl Apportionment {
    pub fn owner_of(&self, cell: u32) -> Option<EntityId> {
        self.cell_owner.get(cell as usize).map(|&o| EntityId(o))
    }

    pub fn run_for(&self, entity: EntityId) -> Option<&CellRun> {
        self.runs.iter().find(|r| r.entity == entity)
    }

    /// (column, row) of a cell index.
    pub fn cell_coords(&self, cell: u32) -> (u32, u32) {
        let cols = self.dims.cols.max(1);
        (cell % cols, cell / cols)
    }

    /// Owner buffer as raw bytes (e.g. for a texture upload).
    pub fn owner_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cell_owner)
    }
}

/// Derive grid dimensions for a viewport, honouring the cell cap.
///
/// Starts from one cell per `min_cell_px`; when that exceeds `max_cells`
/// both axes shrink by `sqrt(cap / cells)` and are floored, then re-clamped
/// to the configured minimums.
pub fn grid_dimensions(viewport_w: f64, viewport_h: f64, config: &GridConfig) -> GridDims {
    let cell = config.min_cell_px.max(1e-6);
    let to_count = |px: f64| {
        if px.is_finite() && px > 0.0 {
            (px / cell).floor().min(u32::MAX as f64) as u32
        } else {
            0
        }
    };
    let mut cols = to_count(viewport_w).max(config.min_cols);
    let mut rows = to_count(viewport_h).max(config.min_rows);

    let cells = cols as u64 * rows as u64;
    if cells > config.max_cells as u64 {
        let scale = (config.max_cells as f64 / cells as f64).sqrt();
        cols = ((cols as f64 * scale).floor() as u32).max(config.min_cols);
        rows = ((rows as f64 * scale).floor() as u32).max(config.min_rows);
        tracing::debug!(
            "Grid capped: {} cells -> {}x{} ({} cells)",
            cells,
            cols,
            rows,
            cols as u64 * rows as u64
        );
    }

    // Re-clamping to the minimums can push one axis back over the cap; trade it off
    // against the other axis.
    let cap = config.max_cells;
    rows = rows.min((cap / cols.max(1)).max(config.min_rows));
    cols = cols.min((cap / rows.max(1)).max(config.min_cols));

    GridDims { cols, rows }
}

/// Split a `cols`×`rows` grid among `entities` in proportion to magnitude.
///
/// Shares come from [`largest_remainder`] over the magnitude-descending order
/// (equal split when every magnitude is zero) and always sum to exactly
/// `cols * rows`. Runs are laid out contiguously in the same order, so every
/// cell has exactly one owner. Empty input or an empty grid yields an empty result.
/// A grid whose cell count overflows `u32` is refused with
/// [`GridWarning::CellCountOverflow`].
pub fn apportion(entities: &[Entity], dims: GridDims) -> Apportionment {
    let mut result = Apportionment {
        dims,
        shares: vec![0; entities.len()],
        ..Default::default()
    };

    let Some(total) = dims.checked_cells() else {
        let warning = GridWarning::CellCountOverflow {
            cols: dims.cols,
            rows: dims.rows,
        };
        tracing::warn!("Apportion: {}", warning);
        result.warnings.push(warning);
        return result;
    };
    if entities.is_empty() || total == 0 {
        if total == 0 && !entities.is_empty() {
            tracing::warn!("Apportion: empty grid {}x{}", dims.cols, dims.rows);
        }
        return result;
    }

    let order = descending_order(entities);
    let weights: Vec<f64> = order.iter().map(|id| entities[id.index()].weight()).collect();
    let ordered_shares = largest_remainder(&weights, total);

    result.cell_owner = Vec::with_capacity(total as usize);
    result.runs = Vec::with_capacity(order.len().min(total as usize));
    for (&id, &share) in order.iter().zip(&ordered_shares) {
        result.shares[id.index()] = share;
        if share == 0 {
            continue;
        }
        result.runs.push(CellRun {
            entity: id,
            start_cell: result.cell_owner.len() as u32,
            cell_count: share,
        });
        result
            .cell_owner
            .extend(std::iter::repeat(id.0).take(share as usize));
    }

    // Shares sum exactly, but never leave a cell unowned.
    let missing = total as usize - result.cell_owner.len().min(total as usize);
    if missing > 0 {
        if let Some(last) = result.runs.last_mut() {
            tracing::warn!("Apportion: {} trailing cells handed to the last run", missing);
            last.cell_count += missing as u32;
            result.shares[last.entity.index()] += missing as u32;
            result
                .cell_owner
                .extend(std::iter::repeat(last.entity.0).take(missing));
        }
    }

    let starved = result.shares.iter().filter(|&&s| s == 0).count();
    if (total as usize) < entities.len() {
        let warning = GridWarning::CapacityBelowEntityCount {
            cells: total,
            entities: entities.len(),
            starved,
        };
        tracing::warn!("{}", warning);
        result.warnings.push(warning);
    }

    tracing::info!(
        "Apportioned {} cells ({}x{}) across {} entities, {} runs",
        total,
        dims.cols,
        dims.rows,
        entities.len(),
        result.runs.len()
    );

    result
}
