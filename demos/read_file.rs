use galvani_rs::{MprFile, Result};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 1) Parse the file; side files next to it are picked up when present
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "experiment.mpr".to_string());
    let mpr = MprFile::open(&path)?;
    println!();

    // 2) Walk the modules
    println!("Modules:");
    for module in mpr.modules() {
        println!(
            "  {:<10} {:<25} version {} length {} at offset {}",
            module.short_name(),
            module.long_name(),
            module.version(),
            module.length(),
            module.data_offset
        );
    }
    println!();

    // 3) Record layout
    println!(
        "Data module version {} ({:?}), {} points",
        mpr.version(),
        mpr.data_layout(),
        mpr.point_count()
    );
    println!("Columns:");
    for field in mpr.layout().fields() {
        println!(
            "    {:<24} {:<10} offset {}",
            field.name, field.scalar_type, field.offset
        );
    }
    for (name, spec) in mpr.flags().iter() {
        println!("    {:<24} flag mask {:#04x}", name, spec.mask);
    }
    println!();

    // 4) Dates
    match mpr.start_date() {
        Some(date) => println!("Start date : {}", date),
        None => println!("Start date : <none>"),
    }
    match mpr.end_date() {
        Some(date) => println!("End date   : {}", date),
        None => println!("End date   : <none>"),
    }
    match mpr.timestamp() {
        Some(ts) => println!("Acquisition: {}", ts),
        None => println!("Acquisition: <none>"),
    }
    if let Some(loops) = mpr.loop_index() {
        println!("Loops      : {} starting at {:?}", loops.len(), loops);
    }
    println!();

    // 5) First rows
    for record in mpr.data().rows().take(5) {
        let row: Vec<String> = record
            .values()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        println!("  [{}] {}", record.index(), row.join(" "));
    }

    Ok(())
}
