use crate::layout::{Apportionment, CellRun, Placement};

/// How much text a block can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LabelTier {
    None,
    /// Name only
    Short,
    /// Name, magnitude and share
    Full,
}

/// Label density settings handed to the renderer.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Only the first N columns get full labels
    pub full_label_columns: u32,
    /// Minimum block area for any label, as a fraction of the container
    pub min_label_area_fraction: f64,
    /// Minimum block width / height for any label, in the units the blocks
    /// are given in (percent for scene blocks)
    pub min_label_width: f64,
    pub min_label_height: f64,
    /// Runs with fewer cells get no label
    pub grid_label_min_cells: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            full_label_columns: 3,
            min_label_area_fraction: 0.003,
            min_label_width: 4.0,
            min_label_height: 2.0,
            grid_label_min_cells: 24,
        }
    }
}

/// Label tier for a column-layout block in a `w`×`h` container.
pub fn column_label_tier(p: &Placement, w: f64, h: f64, config: &RenderConfig) -> LabelTier {
    let fits = p.area() >= w * h * config.min_label_area_fraction
        && p.width >= config.min_label_width
        && p.height >= config.min_label_height;
    match (fits, p.column < config.full_label_columns) {
        (false, _) => LabelTier::None,
        (true, true) => LabelTier::Full,
        (true, false) => LabelTier::Short,
    }
}

/// Runs large enough to carry a single label, anchored at their start cell.
pub fn grid_label_anchors<'a>(
    apportionment: &'a Apportionment,
    config: &RenderConfig,
) -> impl Iterator<Item = &'a CellRun> + 'a {
    let min_cells = config.grid_label_min_cells;
    apportionment
        .runs
        .iter()
        .filter(move |r| r.cell_count >= min_cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityId};
    use crate::layout::{apportion, GridDims};

    fn placement(column: u32, width: f64, height: f64) -> Placement {
        Placement {
            entity: EntityId(0),
            x: 0.0,
            y: 0.0,
            width,
            height,
            column,
            target_area: width * height,
            clipped: false,
        }
    }

    #[test]
    fn tiers_by_column_and_size() {
        let cfg = RenderConfig::default();
        let tier = |p: Placement| column_label_tier(&p, 100.0, 100.0, &cfg);
        assert_eq!(tier(placement(0, 30.0, 30.0)), LabelTier::Full);
        assert_eq!(tier(placement(5, 30.0, 30.0)), LabelTier::Short);
        assert_eq!(tier(placement(0, 3.0, 30.0)), LabelTier::None);
        assert_eq!(tier(placement(0, 5.0, 5.0)), LabelTier::None);
    }

    #[test]
    fn only_large_runs_get_anchors() {
        let entities = vec![Entity::new("big", 90.0), Entity::new("small", 10.0)];
        let a = apportion(&entities, GridDims::new(10, 10));
        let anchors: Vec<_> = grid_label_anchors(&a, &RenderConfig::default()).collect();
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].entity, EntityId(0));
        assert_eq!(anchors[0].start_cell, 0);
    }
}
