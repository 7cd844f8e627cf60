pub mod apportion;
pub mod columns;
pub mod grid;

pub use apportion::largest_remainder;
pub use columns::{pack, PackedColumn, Packing, Placement};
pub use grid::{apportion, grid_dimensions, Apportionment, CellRun, GridDims, GridWarning};

/// Invalid layout configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be within {range}, got {value}")]
    OutOfRange {
        field: &'static str,
        range: &'static str,
        value: f64,
    },

    #[error("min_aspect_ratio ({min}) exceeds max_aspect_ratio ({max})")]
    AspectBounds { min: f64, max: f64 },

    #[error("minimum grid {cols}x{rows} exceeds the cell cap {max_cells}")]
    GridMinimumOverCap {
        cols: u32,
        rows: u32,
        max_cells: u32,
    },
}

fn check(
    field: &'static str,
    range: &'static str,
    value: f64,
    ok: bool,
) -> Result<(), ConfigError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, range, value })
    }
}

/// Configuration for the column packer.
///
/// Fractions are relative to the container so the same config works for
/// pixels and for percentage units.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnConfig {
    /// Shrink factor applied to every ideal area, leaves visual gutters (0, 1]
    pub area_scale: f64,
    /// Area floor as a fraction of W×H, must be positive. Keeps the long tail
    /// visible at the cost of strict proportionality.
    pub min_area_fraction: f64,
    /// Minimum block width as a fraction of W
    pub min_width_fraction: f64,
    /// Minimum block height as a fraction of H
    pub min_height_fraction: f64,
    /// Upper bound on width / height
    pub max_aspect_ratio: f64,
    /// Lower bound on width / height
    pub min_aspect_ratio: f64,
    /// Relative width band for matching an existing column (0.2 = ±20%)
    pub width_tolerance: f64,
    /// Vertical gap between stacked blocks, fraction of H
    pub item_gap_fraction: f64,
    /// Horizontal gap between columns, fraction of W
    pub column_gap_fraction: f64,
}

impl ColumnConfig {
    /// Squarish treemap blocks.
    pub fn treemap() -> Self {
        Self {
            area_scale: 0.9,
            min_area_fraction: 0.0004,
            min_width_fraction: 0.02,
            min_height_fraction: 0.02,
            max_aspect_ratio: 2.0,
            min_aspect_ratio: 0.5,
            width_tolerance: 0.2,
            item_gap_fraction: 0.002,
            column_gap_fraction: 0.0,
        }
    }

    /// Pixel-map variant: blocks are never wider than tall.
    pub fn portrait() -> Self {
        Self {
            area_scale: 0.85,
            min_area_fraction: 0.0006,
            min_width_fraction: 0.015,
            min_height_fraction: 0.03,
            max_aspect_ratio: 0.8,
            min_aspect_ratio: 0.35,
            width_tolerance: 0.2,
            item_gap_fraction: 0.003,
            column_gap_fraction: 0.002,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check(
            "area_scale",
            "(0, 1]",
            self.area_scale,
            self.area_scale > 0.0 && self.area_scale <= 1.0,
        )?;
        check(
            "min_area_fraction",
            "(0, 1]",
            self.min_area_fraction,
            self.min_area_fraction > 0.0 && self.min_area_fraction <= 1.0,
        )?;
        check(
            "min_width_fraction",
            "[0, 1]",
            self.min_width_fraction,
            (0.0..=1.0).contains(&self.min_width_fraction),
        )?;
        check(
            "min_height_fraction",
            "[0, 1]",
            self.min_height_fraction,
            (0.0..=1.0).contains(&self.min_height_fraction),
        )?;
        check("max_aspect_ratio", "(0, inf)", self.max_aspect_ratio, self.max_aspect_ratio > 0.0)?;
        check("min_aspect_ratio", "(0, inf)", self.min_aspect_ratio, self.min_aspect_ratio > 0.0)?;
        if self.min_aspect_ratio > self.max_aspect_ratio {
            return Err(ConfigError::AspectBounds {
                min: self.min_aspect_ratio,
                max: self.max_aspect_ratio,
            });
        }
        check("width_tolerance", "[0, inf)", self.width_tolerance, self.width_tolerance >= 0.0)?;
        check(
            "item_gap_fraction",
            "[0, 0.5)",
            self.item_gap_fraction,
            (0.0..0.5).contains(&self.item_gap_fraction),
        )?;
        check(
            "column_gap_fraction",
            "[0, 0.5)",
            self.column_gap_fraction,
            (0.0..0.5).contains(&self.column_gap_fraction),
        )?;
        Ok(())
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self::treemap()
    }
}

/// Configuration for the discrete cell grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Smallest on-screen cell edge (px)
    pub min_cell_px: f64,
    /// Hard cap on cols × rows (render cost)
    pub max_cells: u32,
    pub min_cols: u32,
    pub min_rows: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min_cell_px: 12.0,
            max_cells: 4000,
            min_cols: 10,
            min_rows: 10,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("min_cell_px", "(0, inf)", self.min_cell_px, self.min_cell_px > 0.0)?;
        check("max_cells", "[1, inf)", self.max_cells as f64, self.max_cells >= 1)?;
        check("min_cols", "[1, inf)", self.min_cols as f64, self.min_cols >= 1)?;
        check("min_rows", "[1, inf)", self.min_rows as f64, self.min_rows >= 1)?;
        if self.min_cols as u64 * self.min_rows as u64 > self.max_cells as u64 {
            return Err(ConfigError::GridMinimumOverCap {
                cols: self.min_cols,
                rows: self.min_rows,
                max_cells: self.max_cells,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert_eq!(ColumnConfig::treemap().validate(), Ok(()));
        assert_eq!(ColumnConfig::portrait().validate(), Ok(()));
        assert_eq!(GridConfig::default().validate(), Ok(()));
        assert!(ColumnConfig::portrait().max_aspect_ratio < 1.0);
    }

    #[test]
    fn rejects_inverted_aspect_bounds() {
        let cfg = ColumnConfig {
            min_aspect_ratio: 3.0,
            ..ColumnConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::AspectBounds { min: 3.0, max: 2.0 })
        );
    }

    #[test]
    fn rejects_zero_area_scale() {
        let cfg = ColumnConfig {
            area_scale: 0.0,
            ..ColumnConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.to_string(), "area_scale must be within (0, 1], got 0");
    }

    #[test]
    fn rejects_zero_area_floor() {
        let cfg = ColumnConfig {
            min_area_fraction: 0.0,
            ..ColumnConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange {
                field: "min_area_fraction",
                ..
            })
        ));
    }

    #[test]
    fn rejects_grid_minimum_over_cap() {
        let cfg = GridConfig {
            max_cells: 50,
            ..GridConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::GridMinimumOverCap { .. })
        ));
    }
}
