use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

const EXAMPLE_TRIP: &str = r#"<heading>Day 1</heading>
<p>Morning coffee at <mark>Café de Flore</mark>, then the <mark>Louvre</mark>.</p>
<ul><li>Lunch in the <mark>Tuileries</mark></li><li>Sunset at the <mark>Eiffel Tower</mark></li></ul>
"#;

const EXAMPLE_GAZETTEER: &str = r#"{
  "café de flore": [48.8541, 2.3326],
  "louvre": [48.8606, 2.3376],
  "tuileries": [48.8634, 2.3275],
  "eiffel tower": [48.8584, 2.2945]
}
"#;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Number of distinct place colors
    #[arg(short, long)]
    pub palette_size: Option<u8>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Waypoint project...".bright_blue().bold());

    let trip_file = PathBuf::from(cwd).join("trip.wp");
    if !trip_file.exists() {
        fs::write(&trip_file, EXAMPLE_TRIP)?;
        println!("  {} Created trip.wp", "✓".green());
    }

    let gazetteer_file = PathBuf::from(cwd).join("places.json");
    if !gazetteer_file.exists() {
        fs::write(&gazetteer_file, EXAMPLE_GAZETTEER)?;
        println!("  {} Created places.json", "✓".green());
    }

    let mut config = Config {
        gazetteer: Some("places.json".to_string()),
        ..Config::default()
    };
    if let Some(palette_size) = args.palette_size {
        config.palette_size = palette_size;
    }

    // Write config file
    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: waypoint stream trip.wp --outline");
    println!("  2. Run: waypoint edit trip.wp --from n1 --to n2 --content '<p>Rest day</p>'");

    Ok(())
}
