use clap::{Parser, Subcommand};
use colored::Colorize;
use xcode_product_name::commands;

#[derive(Parser)]
#[command(name = "xcode-product-name")]
#[command(about = "Rewrite PRODUCT_NAME in the Xcode project generated by an iOS build", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the post-build hook for a finished build
    PostBuild {
        /// Build output directory (contains the generated .xcodeproj)
        output_path: String,
        /// Platform the build was made for (ios, android, macos, ...)
        #[arg(long, default_value = "ios")]
        platform: String,
        /// ASCII-safe product name (overrides product-name.toml)
        #[arg(long)]
        name: Option<String>,
        /// Path to config file (default: ./product-name.toml if present)
        #[arg(long)]
        config: Option<String>,
    },
    /// Show PRODUCT_NAME for every target of an Xcode project
    /// Accepts a project.pbxproj, an .xcodeproj, or a build output directory
    Show {
        /// Path to inspect (defaults to current directory)
        #[arg(default_value = ".")]
        target: String,
        /// Path to config file (default: ./product-name.toml if present)
        #[arg(long)]
        config: Option<String>,
    },
    /// Create a product-name.toml in the current directory
    Init {
        /// Product name to pre-fill
        #[arg(long)]
        name: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::PostBuild { output_path, platform, name, config } => {
            commands::post_build::execute(&platform, &output_path, name.as_deref(), config.as_deref())
        }
        Commands::Show { target, config } => {
            commands::show::execute(&target, config.as_deref())
        }
        Commands::Init { name } => {
            commands::init::execute(".", name.as_deref())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
