//! Export command - Write the policy map of a learned table

use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    analysis::{PolicyMap, PolicyMetric},
    app::App,
};

#[derive(Parser, Debug)]
#[command(about = "Export a policy map as CSV")]
pub struct ExportArgs {
    /// Q-value table (CSV)
    pub table: PathBuf,

    /// Output file path
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Quantity to tabulate: q_flap, q_noop, v or pi
    #[arg(long, short = 'm', default_value = "pi")]
    pub metric: PolicyMetric,

    /// Write one row per cell with every metric instead of a pivot table
    #[arg(long, default_value_t = false)]
    pub cells: bool,
}

pub fn execute(args: ExportArgs) -> Result<()> {
    let table = App::new()
        .load_table(&args.table)
        .with_context(|| format!("Failed to load q-values from {}", args.table.display()))?;
    let map = PolicyMap::from_table(&table);

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let writer = BufWriter::new(file);
    if args.cells {
        map.write_cells(writer)?;
    } else {
        map.write_grid(args.metric, writer)?;
    }

    let what = if args.cells {
        "Policy cells".to_string()
    } else {
        format!("Policy map ({})", args.metric)
    };
    println!(
        "✓ {what} for {} keys in {} cells exported to: {}",
        table.size(),
        map.len(),
        args.output.display()
    );
    Ok(())
}
