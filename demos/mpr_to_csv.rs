//! Convert an `.mpr` file to CSV with flags expanded into their own columns.
//!
//! Usage: cargo run --example mpr_to_csv -- input.mpr output.csv

use galvani_rs::{FLAGS_FIELD, MprFile, Result};
use log::info;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        eprintln!("usage: mpr_to_csv <input.mpr> <output.csv>");
        std::process::exit(2);
    };

    let mpr = MprFile::open(&input)?;
    let data = mpr.data();

    let flag_names: Vec<&str> = data.flags().names().collect();
    let field_names: Vec<&str> = data
        .layout()
        .names()
        .filter(|name| *name != FLAGS_FIELD)
        .collect();

    let mut writer = csv::Writer::from_path(&output)?;
    writer.write_record(flag_names.iter().chain(&field_names))?;
    for record in data.rows() {
        let row = flag_names
            .iter()
            .chain(&field_names)
            .map(|name| record.get(name).map(|v| v.to_string()).unwrap_or_default());
        writer.write_record(row)?;
    }
    writer.flush()?;

    info!("wrote {} rows from {} to {}", data.len(), input, output);
    Ok(())
}
