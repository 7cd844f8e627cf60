use crate::entity::{descending_order, total_weight, Entity, EntityId};
use crate::layout::ColumnConfig;

/// Relative slack on the vertical room check, absorbs accumulated float error.
const ROOM_EPSILON: f64 = 1e-9;
/// Passes tried before squeezed blocks are accepted.
const MAX_PASSES: u32 = 16;
/// Area factor applied on each repeated pass.
const SHRINK_STEP: f64 = 0.85;
/// Upcoming blocks considered when sizing a new column.
const LOOKAHEAD: usize = 32;

/// A positioned block in the column layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub entity: EntityId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Index of the column the block sits in (left to right)
    pub column: u32,
    /// Area the block was sized for, after scaling, the minimum floor and the
    /// pass shrink
    pub target_area: f64,
    /// Block was squeezed into leftover room smaller than its shape
    pub clipped: bool,
}

impl Placement {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Same placement expressed as percentages (0–100) of a `w`×`h` container.
    pub fn to_percent(&self, w: f64, h: f64) -> Placement {
        let sx = 100.0 / w;
        let sy = 100.0 / h;
        Placement {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
            target_area: self.target_area * sx * sy,
            ..*self
        }
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// A vertical column: fixed x and width, with a cursor for the next block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackedColumn {
    pub x: f64,
    pub width: f64,
    pub cursor_y: f64,
    pub items: u32,
}

/// Result of a column packing pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Packing {
    /// One placement per input entity, in placement (magnitude-descending) order
    pub placements: Vec<Placement>,
    pub columns: Vec<PackedColumn>,
    pub width: f64,
    pub height: f64,
    /// Area factor of the pass that was kept; below 1 when the container was
    /// too crowded at full scale
    pub shrink: f64,
}

impl Packing {
    fn empty(width: f64, height: f64) -> Self {
        Self {
            placements: Vec::new(),
            columns: Vec::new(),
            width,
            height,
            shrink: 1.0,
        }
    }

    /// Placements rescaled to percentages of the container.
    pub fn to_percent(&self) -> Vec<Placement> {
        self.placements
            .iter()
            .map(|p| p.to_percent(self.width, self.height))
            .collect()
    }

    /// Fraction of the container covered by blocks.
    pub fn coverage(&self) -> f64 {
        let container = self.width * self.height;
        if container <= 0.0 {
            return 0.0;
        }
        self.placements.iter().map(Placement::area).sum::<f64>() / container
    }

    pub fn clipped_count(&self) -> usize {
        self.placements.iter().filter(|p| p.clipped).count()
    }

    /// Topmost placement containing the point, if any.
    pub fn hit_test(&self, px: f64, py: f64) -> Option<&Placement> {
        self.placements.iter().find(|p| p.contains(px, py))
    }
}

/// Shape limits resolved against a concrete container.
struct Shape {
    container_w: f64,
    container_h: f64,
    min_w: f64,
    min_h: f64,
    max_ar: f64,
    min_ar: f64,
}

impl Shape {
    /// `shrink` scales areas; the minimum sides follow its square root.
    fn new(w: f64, h: f64, config: &ColumnConfig, shrink: f64) -> Self {
        let side_shrink = shrink.sqrt();
        Self {
            container_w: w,
            container_h: h,
            min_w: config.min_width_fraction * w * side_shrink,
            min_h: config.min_height_fraction * h * side_shrink,
            max_ar: config.max_aspect_ratio,
            min_ar: config.min_aspect_ratio,
        }
    }

    /// Widest block that can still satisfy the aspect bound inside the container.
    fn max_width(&self) -> f64 {
        self.container_w.min(self.container_h * self.max_ar)
    }

    /// Ideal width for a block of `area`: square, clamped to the minimum sizes,
    /// then reshaped (area-preserving) into the aspect band.
    fn ideal_width(&self, area: f64) -> f64 {
        let side = area.max(0.0).sqrt();
        let mut w = side.max(self.min_w);
        let mut h = side.max(self.min_h);
        let a = w * h;
        if w > h * self.max_ar {
            h = (a / self.max_ar).sqrt();
            w = h * self.max_ar;
        } else if w < h * self.min_ar {
            w = (a * self.min_ar).sqrt();
        }
        w.min(self.max_width())
    }

    /// Height for a block of `area` in a slot of `width`, kept inside the
    /// aspect band. The aspect bound wins over the height floor.
    fn fit_height(&self, area: f64, width: f64) -> f64 {
        let lo = width / self.max_ar;
        let hi = width / self.min_ar;
        (area / width)
            .max(self.min_h)
            .max(lo)
            .min(hi)
            .min(self.container_h)
    }

    /// How far a `ratio` (w/h) sits outside the aspect band; <= 1 inside.
    fn band_excess(&self, ratio: f64) -> f64 {
        (ratio / self.max_ar).max(self.min_ar / ratio)
    }

    /// Width for a new column opened for `targets[0]`.
    ///
    /// Squarify-style: the leading run of `targets` (largest first) is stacked
    /// at the width that makes it fill the column height, and the run whose
    /// worst block is closest to the aspect band wins.
    fn column_width(&self, targets: &[f64], gap: f64) -> f64 {
        let mut best: Option<(f64, f64)> = None;
        let mut sum = 0.0;
        for (k, &area) in targets.iter().take(LOOKAHEAD).enumerate() {
            sum += area;
            let height = self.container_h - k as f64 * gap;
            if height <= 0.0 {
                break;
            }
            let width = sum / height;
            if !(width > 0.0) {
                continue;
            }
            let score = targets[..=k]
                .iter()
                .map(|&a| self.band_excess(width * width / a))
                .fold(0.0, f64::max);
            match best {
                Some((s, _)) if score >= s => {
                    if k > 2 {
                        break;
                    }
                }
                _ => best = Some((score, width)),
            }
        }
        best.map_or(0.0, |(_, width)| width)
            .max(self.min_w)
            .min(self.max_width())
    }

    /// In-band block for `area` squeezed into a leftover slot `room` tall and
    /// at most `width` wide.
    fn squeeze(&self, area: f64, width: f64, room: f64) -> (f64, f64) {
        let w = (area / room)
            .min(room * self.max_ar)
            .max(room * self.min_ar)
            .min(width);
        (w, room.min(w / self.min_ar))
    }
}

fn slot_top(col: &PackedColumn, gap: f64) -> f64 {
    if col.items > 0 {
        col.cursor_y + gap
    } else {
        col.cursor_y
    }
}

/// Pack `entities` into a `w`×`h` container as left-to-right columns.
///
/// Greedy: entities are visited largest first, each goes into the first column
/// (creation order) whose width is within tolerance of its ideal width, else
/// the first column with room, else a new column. Once the right edge is
/// reached a block may sit narrower than its column in leftover room, and as a
/// last resort is squeezed into the roomiest column.
///
/// A pass that squeezes anything is rerun with every area shrunk by 15%, up to
/// 16 passes, so crowded containers lose scale rather than blocks. The kept
/// factor is [`Packing::shrink`]. Identical inputs always produce identical
/// geometry.
pub fn pack(entities: &[Entity], w: f64, h: f64, config: &ColumnConfig) -> Packing {
    if entities.is_empty() {
        return Packing::empty(w, h);
    }
    if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
        tracing::warn!("Column pack: invalid container {}x{}, nothing placed", w, h);
        return Packing::empty(w, h);
    }

    let order = descending_order(entities);
    let total = match total_weight(entities) {
        t if t > 0.0 => t,
        _ => 1.0,
    };

    let mut shrink = 1.0;
    let mut pass = 1;
    let packing = loop {
        let packing = pack_pass(entities, &order, total, w, h, config, shrink);
        let squeezed = packing.clipped_count();
        if squeezed == 0 || pass == MAX_PASSES {
            break packing;
        }
        tracing::debug!(
            "Column pack pass {}: {} blocks squeezed at shrink {:.3}, repacking",
            pass,
            squeezed,
            shrink
        );
        shrink *= SHRINK_STEP;
        pass += 1;
    };

    let clipped = packing.clipped_count();
    if clipped > 0 {
        tracing::warn!(
            "Column pack: {} of {} blocks squeezed after {} passes",
            clipped,
            packing.placements.len(),
            pass
        );
    }
    tracing::info!(
        "Packed {} entities into {} columns in {:.0}x{:.0} (coverage {:.1}%, shrink {:.3})",
        packing.placements.len(),
        packing.columns.len(),
        w,
        h,
        packing.coverage() * 100.0,
        packing.shrink
    );

    packing
}

/// One greedy pass with every area (and floor) scaled by `shrink`.
fn pack_pass(
    entities: &[Entity],
    order: &[EntityId],
    total: f64,
    w: f64,
    h: f64,
    config: &ColumnConfig,
    shrink: f64,
) -> Packing {
    let container = w * h;
    let min_area = config.min_area_fraction * container * shrink;
    let gap = config.item_gap_fraction * h;
    let column_gap = config.column_gap_fraction * w;
    let room_limit = h * (1.0 + ROOM_EPSILON);
    let shape = Shape::new(w, h, config, shrink);

    let targets: Vec<f64> = order
        .iter()
        .map(|id| {
            let share = entities[id.index()].weight() / total;
            (share * container * config.area_scale * shrink).max(min_area)
        })
        .collect();

    let mut packing = Packing {
        placements: Vec::with_capacity(order.len()),
        shrink,
        ..Packing::empty(w, h)
    };
    let columns = &mut packing.columns;

    for (rank, (&id, &target_area)) in order.iter().zip(&targets).enumerate() {
        let ideal_w = shape.ideal_width(target_area);
        let fits = |col: &PackedColumn, width: f64| {
            slot_top(col, gap) + shape.fit_height(target_area, width) <= room_limit
        };

        let matched = columns
            .iter()
            .position(|c| {
                (c.width - ideal_w).abs() <= config.width_tolerance * ideal_w && fits(c, c.width)
            })
            .or_else(|| columns.iter().position(|c| fits(c, c.width)));

        let next_x = columns
            .last()
            .map(|c| c.x + c.width + column_gap)
            .unwrap_or(0.0);
        let available = w - next_x;
        let can_open = columns.is_empty() || (available > 0.0 && available >= shape.min_w);

        let (index, width, height, clipped) = if let Some(i) = matched {
            let width = columns[i].width;
            (i, width, shape.fit_height(target_area, width), false)
        } else if can_open {
            let width = shape
                .column_width(&targets[rank..], gap)
                .min(available.max(0.0));
            tracing::debug!(
                "Column {} opened at x={:.2} width={:.2} for '{}'",
                columns.len(),
                next_x,
                width,
                entities[id.index()].name
            );
            columns.push(PackedColumn {
                x: next_x,
                width,
                cursor_y: 0.0,
                items: 0,
            });
            (columns.len() - 1, width, shape.fit_height(target_area, width), false)
        } else if let Some(i) = columns
            .iter()
            .position(|c| fits(c, ideal_w.min(c.width)))
        {
            // Narrower than the column, in the room left under its last block
            let width = ideal_w.min(columns[i].width);
            (i, width, shape.fit_height(target_area, width), false)
        } else {
            let roomiest = columns
                .iter()
                .enumerate()
                .map(|(i, c)| (i, h - slot_top(c, gap)))
                .filter(|&(_, room)| room > 0.0)
                .fold(None, |best: Option<(usize, f64)>, (i, room)| match best {
                    Some((_, r)) if r >= room => best,
                    _ => Some((i, room)),
                });
            match roomiest {
                Some((i, room)) => {
                    let (width, height) = shape.squeeze(target_area, columns[i].width, room);
                    (i, width, height, true)
                }
                None => (columns.len() - 1, 0.0, 0.0, true),
            }
        };

        let col = &mut columns[index];
        let y = slot_top(col, gap).min(h);
        let height = height.min(h - y).max(0.0);
        col.cursor_y = y + height;
        col.items += 1;

        packing.placements.push(Placement {
            entity: id,
            x: col.x,
            y,
            width,
            height,
            column: index as u32,
            target_area,
            clipped,
        });
    }

    packing
}
