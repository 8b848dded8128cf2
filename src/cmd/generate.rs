use anyhow::Context;
use hospital_data_gen::{hospital_schema, Generator, GeneratorConfig, RenderConfig, Renderer};
use hospital_etl::compression;
use hospital_etl::runner::config::{LOAD_DATA_FILE, RDBMS_SCHEMA_FILE};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

pub struct GenerateArgs {
    pub seed: Option<u64>,
    pub encounters: usize,
    pub batch_size: Option<usize>,
    pub output_dir: PathBuf,
    pub gzip: bool,
    pub no_schema: bool,
}

pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    if args.batch_size == Some(0) {
        anyhow::bail!("--batch-size must be at least 1");
    }

    let mut config = GeneratorConfig::default().with_encounters(args.encounters);
    config.seed = args.seed;

    let start_time = Instant::now();
    let mut generator = Generator::new(config).context("invalid generator configuration")?;
    let seed = generator.seed();
    let bundle = generator.generate();

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            args.output_dir.display()
        )
    })?;

    let load_name = if args.gzip {
        format!("{}.gz", LOAD_DATA_FILE)
    } else {
        LOAD_DATA_FILE.to_string()
    };
    let load_path = args.output_dir.join(load_name);

    let mut render_config = RenderConfig::new();
    render_config.batch_size = args.batch_size;

    let stats = {
        let mut writer = compression::create_writer(&load_path, args.gzip)
            .with_context(|| format!("failed to create {}", load_path.display()))?;
        let stats = Renderer::new(render_config)
            .render(&bundle, &mut writer)
            .with_context(|| format!("failed to write {}", load_path.display()))?;
        writer
            .finish()
            .with_context(|| format!("failed to finish {}", load_path.display()))?;
        stats
    };

    println!("Seed: {} (pass --seed {} to reproduce)", seed, seed);
    println!();
    println!("{:<24} {:>10}", "Table", "Rows");
    println!("{}", "─".repeat(35));
    for table in bundle.tables() {
        println!("{:<24} {:>10}", table.table_name, table.rows.len());
    }
    println!("{}", "─".repeat(35));
    println!("{:<24} {:>10}", "TOTAL", stats.rows);
    println!();
    println!(
        "✓ Wrote {} INSERT statements to {}",
        stats.statements,
        load_path.display()
    );

    if !args.no_schema {
        let schema_path = args.output_dir.join(RDBMS_SCHEMA_FILE);
        fs::write(&schema_path, hospital_schema().render_ddl())
            .with_context(|| format!("failed to write {}", schema_path.display()))?;
        println!("✓ Wrote operational schema to {}", schema_path.display());
    }

    println!("  Time: {:.3?}", start_time.elapsed());
    Ok(())
}
