use clap::{Parser, Subcommand};
use fifths::config::{self, Config};
use fifths::export::suggested_file_name;
use fifths::server::{self, coerce_angles};
use fifths::{Angles, ExportFormat, ExportJob, Exporter, LayerSources, resolve_key};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fifths", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Print the key shown for a pair of ring angles
    Key {
        /// Outer (key) ring angle in degrees
        #[arg(allow_hyphen_values = true)]
        outer: i32,
        /// Inner (mode) ring angle in degrees
        #[arg(allow_hyphen_values = true)]
        inner: i32,
    },
    /// Render the wheel to a PNG or PDF file
    Export {
        /// Outer and inner angle, comma-joined (e.g. "30,-30")
        #[arg(short, long, default_value = "0,0", allow_hyphen_values = true)]
        angles: Angles,
        /// Output format; inferred from the output path when omitted
        #[arg(short, long)]
        format: Option<String>,
        /// Output path; defaults to the key name in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve the HTTP export endpoint
    Serve {
        /// Address to listen on (overrides the config file)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Write the default config file and print its path
    InitConfig,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Key { outer, inner } => {
            let angles = coerce_angles(Angles::new(outer, inner));
            println!("{}", resolve_key(angles.outer, angles.inner));
            Ok(())
        }
        Commands::Export {
            angles,
            format,
            output,
        } => export(&config::load_or_default(), angles, format, output),
        Commands::Serve { bind } => {
            let mut config = config::load_or_default();
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            let exporter = Exporter::new(config.label.color.to_srgba());
            server::serve(&config.server, exporter)?;
            Ok(())
        }
        Commands::InitConfig => {
            let path = config::write_default_config()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn export(
    config: &Config,
    angles: Angles,
    format: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let format = match (&format, &output) {
        (Some(name), _) => ExportFormat::from_name(name)?,
        (None, Some(path)) => ExportFormat::from_path(path)?,
        (None, None) => ExportFormat::Png,
    };

    let angles = coerce_angles(angles);
    let label = resolve_key(angles.outer, angles.inner);
    let path = output.unwrap_or_else(|| PathBuf::from(suggested_file_name(&label, format)));

    let job = ExportJob {
        sources: LayerSources::from_paths(&config.layers)?,
        angles,
        label,
        format,
    };
    let bytes = job.run(&Exporter::new(config.label.color.to_srgba()))?;
    fs_err::write(&path, bytes)?;

    println!("{}", path.display());
    Ok(())
}
