use anyhow::Result;
use clap::Parser;
use gol_harness::{Catalog, CellFormat, PlacedPrimitive};
use std::io::{stdout, BufWriter, Write};

/// Prints the absolute cells of one catalog primitive, one per line.
#[derive(Parser)]
#[command(name = "gen_primitive")]
struct Args {
    /// blinker, beacon, glider, lightweight_spaceship, exploder or bowling.
    name: String,
    #[arg(allow_negative_numbers = true)]
    x: i64,
    #[arg(allow_negative_numbers = true)]
    y: i64,
    /// Counter-clockwise quarter turns.
    #[arg(default_value_t = 0)]
    rotations: u32,
    #[arg(long, value_enum, default_value_t = CellFormat::Bare)]
    format: CellFormat,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let catalog = Catalog::builtin();
    let placed = PlacedPrimitive {
        name: &args.name,
        pattern: catalog.get(&args.name)?,
        rotations: args.rotations,
        x: args.x,
        y: args.y,
    };

    let mut out = BufWriter::new(stdout().lock());
    for cell in placed.cells()? {
        args.format.write_cell(&mut out, cell)?;
    }
    out.flush()?;
    Ok(())
}
