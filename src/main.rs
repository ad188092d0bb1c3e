use anyhow::Context;
use clap::{Parser, Subcommand};
use fiducial_align::config::{load_config_or_default, RankingStrategy};
use fiducial_align::logging::{init_logging, LoggingConfig};
use fiducial_align::utils::load_image;
use fiducial_align::visualization::{print_candidates, print_composite_summary};
use fiducial_align::{CompareError, FiducialComparator};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "fidalign")]
#[command(about = "Align artwork onto a template using an L-shaped fiducial and write an overlay")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML or JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Overlay artwork on a template and save the composite
    Compare {
        /// Template page raster
        #[arg(short, long)]
        template: PathBuf,

        /// Artwork page raster
        #[arg(short, long)]
        artwork: PathBuf,

        /// Output image (format from extension)
        #[arg(short, long, default_value = "overlay_result.png")]
        output: PathBuf,

        /// Artwork opacity in [0, 1]; defaults to the configured value
        #[arg(long)]
        opacity: Option<f32>,

        /// Candidate ranking: first_match, largest_area or nearest_corner
        #[arg(long)]
        ranking: Option<String>,

        /// Write the provenance report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List fiducial candidates found in one image
    Detect {
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_config_or_default(cli.config.as_deref());
    let logging = match cli.verbose {
        0 => config.logging.clone(),
        1 => LoggingConfig { level: "info".to_string(), ..config.logging.clone() },
        2 => LoggingConfig { level: "debug".to_string(), ..config.logging.clone() },
        _ => LoggingConfig { level: "trace".to_string(), ..config.logging.clone() },
    };
    let _log_guard = init_logging(&logging)?;

    match cli.command {
        Commands::Compare { template, artwork, output, opacity, ranking, report } => {
            let mut comparison = config.comparison;
            if let Some(name) = ranking {
                comparison.selection.ranking = parse_ranking(&name)?;
            }
            let opacity = opacity.unwrap_or(comparison.alignment.opacity);

            let template_img = load_image(&template).with_context(|| format!("loading {}", template.display()))?;
            let artwork_img = load_image(&artwork).with_context(|| format!("loading {}", artwork.display()))?;
            println!(
                "Template: {}x{}, Artwork: {}x{}",
                template_img.width(),
                template_img.height(),
                artwork_img.width(),
                artwork_img.height()
            );

            let comparator = FiducialComparator::new(comparison)?;
            let result = match comparator.compare(&template_img, &artwork_img, opacity) {
                Ok(result) => result,
                Err(e @ CompareError::NotFound { .. }) => {
                    println!("No L-shapes found in one or both images ({e}).");
                    return Ok(ExitCode::from(2));
                }
                Err(e) => return Err(e.into()),
            };

            print_composite_summary(&result);
            result.save(&output).with_context(|| format!("writing {}", output.display()))?;
            println!("Overlay image saved to {}", output.display());

            if let Some(report_path) = report {
                let json = serde_json::to_string_pretty(&result.report())?;
                std::fs::write(&report_path, json)?;
                println!("Report saved to {}", report_path.display());
            }
        }
        Commands::Detect { input } => {
            let image = load_image(&input).with_context(|| format!("loading {}", input.display()))?;
            let comparator = FiducialComparator::new(config.comparison)?;
            let candidates = comparator.detect(&image);
            print_candidates(&input.display().to_string(), &candidates);
            println!("{}", serde_json::to_string_pretty(&candidates)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn parse_ranking(name: &str) -> anyhow::Result<RankingStrategy> {
    match name {
        "first_match" | "first" => Ok(RankingStrategy::FirstMatch),
        "largest_area" | "largest" => Ok(RankingStrategy::LargestArea),
        "nearest_corner" | "corner" => Ok(RankingStrategy::NearestCorner),
        _ => Err(anyhow::anyhow!("Unknown ranking strategy: {}", name)),
    }
}
