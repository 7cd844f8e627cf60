/// Diagnostic tool: synthetic entities → column packing + grid apportionment
use revmap_rs::entity::Entity;
use revmap_rs::layout::{self, ColumnConfig, GridConfig};
use revmap_rs::render::colors::ColorSettings;
use revmap_rs::render::labels::{LabelTier, RenderConfig};
use revmap_rs::render::{build_column_scene, build_grid_scene};

fn parse_arg<T: std::str::FromStr>(index: usize, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::args().nth(index) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("argument {} ('{}'): {}", index, raw, e)),
        None => Ok(default),
    }
}

/// Format a monetary magnitude for console output.
fn format_magnitude(value: f64) -> String {
    const K: f64 = 1e3;
    const M: f64 = 1e6;
    const B: f64 = 1e9;
    const T: f64 = 1e12;

    if value >= T {
        format!("${:.2}T", value / T)
    } else if value >= B {
        format!("${:.2}B", value / B)
    } else if value >= M {
        format!("${:.2}M", value / M)
    } else if value >= K {
        format!("${:.1}K", value / K)
    } else {
        format!("${:.0}", value)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("revmap_rs=info".parse()?),
        )
        .init();

    let count: usize = parse_arg(1, 500)?;
    let exponent: f64 = parse_arg(2, 1.2)?;
    let width: f64 = parse_arg(3, 1920.0)?;
    let height: f64 = parse_arg(4, 1080.0)?;

    println!("=== DIAGNOSTIC: Entities → Layout Pipeline ===");
    println!(
        "{} entities, power-law exponent {}, viewport {}x{}",
        count, exponent, width, height
    );

    // Power-law magnitudes with a zero-revenue tail
    let entities: Vec<Entity> = (0..count)
        .map(|i| {
            let magnitude = if i + 5 >= count && count > 10 {
                0.0
            } else {
                4e11 / ((i + 1) as f64).powf(exponent)
            };
            Entity::new(&format!("Company {:03}", i), magnitude)
                .with_link(&format!("https://example.com/company/{}", i))
        })
        .collect();
    let sanitized = revmap_rs::entity::sanitize(entities);
    let entities = sanitized.entities;
    println!(
        "\n[1] Sanitized: {} kept, {} rejected",
        entities.len(),
        sanitized.rejected.len()
    );

    println!("\n[2] Top 5 by magnitude:");
    let order = revmap_rs::entity::descending_order(&entities);
    for (i, id) in order.iter().take(5).enumerate() {
        let e = &entities[id.index()];
        println!("    [{}] '{}' - {}", i, e.name, format_magnitude(e.magnitude));
    }

    let colors = ColorSettings::default();
    let render = RenderConfig::default();

    // Continuous packer
    let presets = [
        ("treemap", ColumnConfig::treemap()),
        ("portrait", ColumnConfig::portrait()),
    ];
    for (label, config) in presets {
        config.validate()?;
        let start = std::time::Instant::now();
        let packing = layout::pack(&entities, width, height, &config);
        let elapsed = start.elapsed();

        println!(
            "\n[3] Column pack ({}) in {:.2}ms",
            label,
            elapsed.as_secs_f64() * 1e3
        );
        println!("    Columns:   {}", packing.columns.len());
        println!("    Coverage:  {:.1}%", packing.coverage() * 100.0);
        println!("    Shrink:    {:.3}", packing.shrink);
        println!("    Clipped:   {}", packing.clipped_count());

        let mut violations = 0;
        let mut empty = 0;
        let mut narrowed = 0;
        let mut worst_ratio = 0.0f64;
        for p in &packing.placements {
            if p.area() > 0.0 {
                worst_ratio = worst_ratio.max(p.width / p.height);
            } else {
                empty += 1;
            }
            if p.width < packing.columns[p.column as usize].width {
                narrowed += 1;
            }
            let outside = p.x < 0.0
                || p.y < 0.0
                || p.x + p.width > width + 1e-6
                || p.y + p.height > height + 1e-6;
            if outside || p.width > p.height * config.max_aspect_ratio + 1e-6 {
                violations += 1;
            }
        }
        println!(
            "    Worst w/h: {:.3} (max {})",
            worst_ratio, config.max_aspect_ratio
        );
        println!("    Narrowed:  {}", narrowed);
        println!("    Empty:     {}", empty);
        println!("    Violations: {}", violations);

        let blocks = build_column_scene(&entities, &packing, &colors, &render);
        let full = blocks.iter().filter(|b| b.label == LabelTier::Full).count();
        let short = blocks.iter().filter(|b| b.label == LabelTier::Short).count();
        println!("    Labels:    {} full, {} short", full, short);
    }

    // Discrete apportioner
    let grid_config = GridConfig::default();
    grid_config.validate()?;
    let dims = layout::grid_dimensions(width, height, &grid_config);
    let start = std::time::Instant::now();
    let grid = layout::apportion(&entities, dims);
    let elapsed = start.elapsed();

    println!(
        "\n[4] Grid apportion {}x{} ({} cells) in {:.2}ms",
        dims.cols,
        dims.rows,
        dims.cells(),
        elapsed.as_secs_f64() * 1e3
    );
    println!("    Runs:      {}", grid.runs.len());
    println!(
        "    Sum:       {} (expected {})",
        grid.shares.iter().map(|&s| s as u64).sum::<u64>(),
        dims.cells()
    );
    println!(
        "    Unowned:   {}",
        dims.cells().saturating_sub(grid.cell_owner.len() as u64)
    );
    for warning in &grid.warnings {
        println!("    Warning:   {}", warning);
    }

    let scene = build_grid_scene(&entities, &grid, &colors, &render);
    println!(
        "    Labels:    {} (runs ≥ {} cells)",
        scene.labels.len(),
        render.grid_label_min_cells
    );
    for label in scene.labels.iter().take(5) {
        println!(
            "      '{}' at ({}, {}) - {} cells",
            label.name, label.col, label.row, label.cells
        );
    }

    Ok(())
}
