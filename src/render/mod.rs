pub mod colors;
pub mod labels;

use bytemuck::{Pod, Zeroable};
use compact_str::CompactString;

use crate::entity::{Entity, EntityId};
use crate::layout::{Apportionment, Packing};
use colors::{placement_color, text_color, AppColor, ColorSettings};
use labels::{column_label_tier, grid_label_anchors, LabelTier, RenderConfig};

/// Per-block GPU instance: rect in percent of the container, linear RGBA.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RectInstance {
    pub rect: [f32; 4],
    pub color: [f32; 4],
}

/// One drawable block of the column layout, in percent units.
#[derive(Debug, Clone)]
pub struct BlockItem {
    pub entity: EntityId,
    pub name: CompactString,
    pub link: CompactString,
    pub logo: Option<CompactString>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: AppColor,
    pub text: AppColor,
    pub label: LabelTier,
    /// Share of the total magnitude (0..1)
    pub share: f64,
}

/// A label anchored at a run's first cell.
#[derive(Debug, Clone)]
pub struct GridLabel {
    pub entity: EntityId,
    pub name: CompactString,
    pub col: u32,
    pub row: u32,
    pub cells: u32,
}

/// Render-ready grid: one RGBA8 colour per cell plus sparse labels.
#[derive(Debug, Clone, Default)]
pub struct GridScene {
    pub cols: u32,
    pub rows: u32,
    pub cell_colors: Vec<[u8; 4]>,
    pub labels: Vec<GridLabel>,
}

impl GridScene {
    pub fn pixel_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cell_colors)
    }
}

/// Turn a column packing into percent-unit blocks with colours and label tiers.
pub fn build_column_scene(
    entities: &[Entity],
    packing: &Packing,
    settings: &ColorSettings,
    config: &RenderConfig,
) -> Vec<BlockItem> {
    let total = crate::entity::total_weight(entities);
    let count = packing.placements.len();
    packing
        .placements
        .iter()
        .enumerate()
        .map(|(rank, p)| {
            let entity = &entities[p.entity.index()];
            let fill = placement_color(rank, &entity.name, count, settings);
            let pct = p.to_percent(packing.width, packing.height);
            BlockItem {
                entity: p.entity,
                name: entity.name.clone(),
                link: entity.link.clone(),
                logo: entity.logo.clone(),
                x: pct.x,
                y: pct.y,
                width: pct.width,
                height: pct.height,
                fill,
                text: text_color(fill),
                label: column_label_tier(&pct, 100.0, 100.0, config),
                share: if total > 0.0 { entity.weight() / total } else { 0.0 },
            }
        })
        .collect()
}

/// GPU instances for a block list.
pub fn block_instances(blocks: &[BlockItem]) -> Vec<RectInstance> {
    blocks
        .iter()
        .map(|b| RectInstance {
            rect: [b.x as f32, b.y as f32, b.width as f32, b.height as f32],
            color: [b.fill.r, b.fill.g, b.fill.b, b.fill.a],
        })
        .collect()
}

/// Colour every cell by its owner's rank and anchor labels on large runs.
pub fn build_grid_scene(
    entities: &[Entity],
    apportionment: &Apportionment,
    settings: &ColorSettings,
    config: &RenderConfig,
) -> GridScene {
    let count = apportionment.runs.len();
    let mut palette: Vec<[u8; 4]> = vec![[0, 0, 0, 0]; entities.len()];
    for (rank, run) in apportionment.runs.iter().enumerate() {
        let name = &entities[run.entity.index()].name;
        palette[run.entity.index()] = placement_color(rank, name, count, settings).to_rgba8();
    }

    let cell_colors = apportionment
        .cell_owner
        .iter()
        .map(|&owner| palette[owner as usize])
        .collect();

    let labels = grid_label_anchors(apportionment, config)
        .map(|run| {
            let (col, row) = apportionment.cell_coords(run.start_cell);
            GridLabel {
                entity: run.entity,
                name: entities[run.entity.index()].name.clone(),
                col,
                row,
                cells: run.cell_count,
            }
        })
        .collect();

    GridScene {
        cols: apportionment.dims.cols,
        rows: apportionment.dims.rows,
        cell_colors,
        labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{apportion, pack, ColumnConfig, GridDims};

    fn sample() -> Vec<Entity> {
        vec![
            Entity::new("Alpha", 600.0).with_link("https://alpha.example"),
            Entity::new("Beta", 300.0).with_logo("https://beta.example/logo.png"),
            Entity::new("Gamma", 100.0),
        ]
    }

    #[test]
    fn column_scene_carries_entity_metadata() {
        let entities = sample();
        let packing = pack(&entities, 1200.0, 800.0, &ColumnConfig::default());
        let blocks = build_column_scene(
            &entities,
            &packing,
            &ColorSettings::default(),
            &RenderConfig::default(),
        );
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].name, "Alpha");
        assert_eq!(blocks[0].link, "https://alpha.example");
        assert!((blocks[0].share - 0.6).abs() < 1e-12);
        assert_eq!(blocks[0].label, LabelTier::Full);
        assert!(blocks.iter().all(|b| b.x + b.width <= 100.0 + 1e-9));

        let instances = block_instances(&blocks);
        assert_eq!(bytemuck::cast_slice::<_, u8>(&instances).len(), 3 * 32);
    }

    #[test]
    fn grid_scene_colors_every_cell() {
        let entities = sample();
        let a = apportion(&entities, GridDims::new(10, 10));
        let scene = build_grid_scene(
            &entities,
            &a,
            &ColorSettings::default(),
            &RenderConfig::default(),
        );
        assert_eq!(scene.cell_colors.len(), 100);
        assert!(scene.cell_colors.iter().all(|c| c[3] == 255));
        assert_eq!(scene.pixel_bytes().len(), 400);
        // Alpha 60 cells, Beta 30, Gamma 10 (below the label threshold)
        let named: Vec<&str> = scene.labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(named, vec!["Alpha", "Beta"]);
        assert_eq!((scene.labels[1].col, scene.labels[1].row), (0, 6));
    }
}
