use crate::entity::{self, Entity, RejectReason, Sanitized};
use crate::layout::{
    self, Apportionment, ColumnConfig, ConfigError, GridConfig, GridDims, Packing,
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct ColumnKey {
    fingerprint: u64,
    width: f64,
    height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GridKey {
    fingerprint: u64,
    dims: GridDims,
}

/// Caller-side state around the layout engines: sanitized entities, the
/// current viewport and the last layouts, recomputed only when their key
/// (entity fingerprint + dimensions) changes.
pub struct MapSession {
    entities: Vec<Entity>,
    fingerprint: u64,
    column_config: ColumnConfig,
    grid_config: GridConfig,
    pub viewport_width: f64,
    pub viewport_height: f64,

    columns: Option<(ColumnKey, Packing)>,
    grid: Option<(GridKey, Apportionment)>,
    /// Number of layout passes actually run (cache misses)
    pub passes: u64,
}

impl MapSession {
    pub fn new(
        raw: Vec<Entity>,
        column_config: ColumnConfig,
        grid_config: GridConfig,
    ) -> Result<Self, ConfigError> {
        column_config.validate()?;
        grid_config.validate()?;
        let Sanitized { entities, .. } = entity::sanitize(raw);
        let fingerprint = entity::fingerprint(&entities);
        Ok(Self {
            entities,
            fingerprint,
            column_config,
            grid_config,
            viewport_width: 800.0,
            viewport_height: 600.0,
            columns: None,
            grid: None,
            passes: 0,
        })
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn column_config(&self) -> &ColumnConfig {
        &self.column_config
    }

    pub fn grid_config(&self) -> &GridConfig {
        &self.grid_config
    }

    /// Swap the packer config. Invalid configs are refused and the current one
    /// stays; a valid one drops the cached column layout.
    pub fn set_column_config(&mut self, config: ColumnConfig) -> Result<(), ConfigError> {
        config.validate()?;
        tracing::debug!("Column config replaced, dropping cached packing");
        self.column_config = config;
        self.columns = None;
        Ok(())
    }

    /// Swap the grid config. The cached grid is keyed on the dimensions the
    /// config yields, so it is recomputed only if those change.
    pub fn set_grid_config(&mut self, config: GridConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.grid_config = config;
        Ok(())
    }

    /// Replace the entity list. Returns what the boundary rejected.
    pub fn set_entities(&mut self, raw: Vec<Entity>) -> Vec<(Entity, RejectReason)> {
        let Sanitized { entities, rejected } = entity::sanitize(raw);
        self.entities = entities;
        self.fingerprint = entity::fingerprint(&self.entities);
        rejected
    }

    /// Returns true if the viewport actually changed.
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        if width == self.viewport_width && height == self.viewport_height {
            return false;
        }
        tracing::debug!("Viewport resized to {:.0}x{:.0}", width, height);
        self.viewport_width = width;
        self.viewport_height = height;
        true
    }

    pub fn grid_dims(&self) -> GridDims {
        layout::grid_dimensions(self.viewport_width, self.viewport_height, &self.grid_config)
    }

    fn column_key(&self) -> ColumnKey {
        ColumnKey {
            fingerprint: self.fingerprint,
            width: self.viewport_width,
            height: self.viewport_height,
        }
    }

    fn grid_key(&self) -> GridKey {
        GridKey {
            fingerprint: self.fingerprint,
            dims: self.grid_dims(),
        }
    }

    /// Column layout for the current viewport, in viewport units.
    /// Use [`Packing::to_percent`] for percentage output.
    pub fn column_layout(&mut self) -> &Packing {
        let key = self.column_key();
        if self.columns.as_ref().map(|(k, _)| *k) != Some(key) {
            self.columns = None;
        }
        let entities = &self.entities;
        let config = &self.column_config;
        let passes = &mut self.passes;
        let (_, packing) = self.columns.get_or_insert_with(|| {
            *passes += 1;
            (key, layout::pack(entities, key.width, key.height, config))
        });
        packing
    }

    /// Grid layout for the current viewport.
    pub fn grid_layout(&mut self) -> &Apportionment {
        let key = self.grid_key();
        if self.grid.as_ref().map(|(k, _)| *k) != Some(key) {
            self.grid = None;
        }
        let entities = &self.entities;
        let passes = &mut self.passes;
        let (_, grid) = self.grid.get_or_insert_with(|| {
            *passes += 1;
            (key, layout::apportion(entities, key.dims))
        });
        grid
    }

    /// Bring both views up to date. The two passes share nothing, so stale
    /// ones run side by side.
    pub fn refresh(&mut self) {
        let column_key = self.column_key();
        let grid_key = self.grid_key();
        let columns_stale = self.columns.as_ref().map(|(k, _)| *k) != Some(column_key);
        let grid_stale = self.grid.as_ref().map(|(k, _)| *k) != Some(grid_key);

        let entities = &self.entities;
        let column_config = &self.column_config;
        let (packing, grid) = rayon::join(
            || {
                columns_stale.then(|| {
                    layout::pack(entities, column_key.width, column_key.height, column_config)
                })
            },
            || grid_stale.then(|| layout::apportion(entities, grid_key.dims)),
        );

        if let Some(packing) = packing {
            self.passes += 1;
            self.columns = Some((column_key, packing));
        }
        if let Some(grid) = grid {
            self.passes += 1;
            self.grid = Some((grid_key, grid));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> MapSession {
        let raw = vec![
            Entity::new("Alpha", 500.0),
            Entity::new("Beta", 300.0),
            Entity::new("Beta", 300.0),
            Entity::new("Broken", -1.0),
            Entity::new("Gamma", 0.0),
        ];
        MapSession::new(raw, ColumnConfig::default(), GridConfig::default()).unwrap()
    }

    #[test]
    fn new_sanitizes_input() {
        let s = session();
        let names: Vec<&str> = s.entities().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn rejects_invalid_config() {
        let bad = ColumnConfig {
            area_scale: 2.0,
            ..ColumnConfig::default()
        };
        assert!(MapSession::new(vec![], bad, GridConfig::default()).is_err());
    }

    #[test]
    fn layouts_are_memoized() {
        let mut s = session();
        assert_eq!(s.column_layout().placements.len(), 3);
        s.column_layout();
        assert_eq!(s.passes, 1);

        s.grid_layout();
        s.grid_layout();
        assert_eq!(s.passes, 2);
    }

    #[test]
    fn resize_invalidates_both_views() {
        let mut s = session();
        s.refresh();
        assert_eq!(s.passes, 2);

        assert!(s.resize(1600.0, 900.0));
        assert!(!s.resize(1600.0, 900.0));
        s.refresh();
        assert_eq!(s.passes, 4);
        let dims = s.grid_dims();
        assert_eq!(s.grid_layout().dims, dims);
        assert_eq!(s.column_layout().width, 1600.0);
        assert_eq!(s.passes, 4);
    }

    #[test]
    fn small_resize_keeps_the_grid() {
        let mut s = session();
        s.refresh();
        // 800x600 and 803x603 both floor to 66x50 cells
        s.resize(803.0, 603.0);
        s.refresh();
        assert_eq!(s.passes, 3);
    }

    #[test]
    fn new_entities_invalidate_both() {
        let mut s = session();
        s.refresh();
        let rejected =
            s.set_entities(vec![Entity::new("Delta", 1.0), Entity::new("Nan", f64::NAN)]);
        assert_eq!(rejected.len(), 1);
        s.refresh();
        assert_eq!(s.passes, 4);
        assert_eq!(s.grid_layout().runs.len(), 1);
    }

    #[test]
    fn config_changes_are_validated_and_repack() {
        let mut s = session();
        s.refresh();
        assert_eq!(s.passes, 2);

        s.set_column_config(ColumnConfig::portrait()).unwrap();
        let expected = layout::pack(s.entities(), 800.0, 600.0, &ColumnConfig::portrait());
        assert_eq!(s.column_layout(), &expected);
        assert_eq!(s.passes, 3);

        let inverted = ColumnConfig {
            min_aspect_ratio: 3.0,
            ..ColumnConfig::portrait()
        };
        assert!(s.set_column_config(inverted).is_err());
        assert_eq!(s.column_config(), &ColumnConfig::portrait());
        s.column_layout();
        assert_eq!(s.passes, 3);

        let coarse = GridConfig {
            min_cell_px: 20.0,
            ..GridConfig::default()
        };
        s.set_grid_config(coarse).unwrap();
        assert_eq!(s.grid_dims(), GridDims::new(40, 30));
        s.refresh();
        assert_eq!(s.passes, 4);

        let no_cells = GridConfig {
            max_cells: 0,
            ..GridConfig::default()
        };
        assert!(s.set_grid_config(no_cells).is_err());
        assert_eq!(s.grid_config().min_cell_px, 20.0);
    }
}
