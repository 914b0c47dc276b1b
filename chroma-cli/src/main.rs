use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chroma::constants::DESIRED_SIZE;
use chroma::harvest::{HarvestConfig, Harvester, resolve_api_key};
use chroma::{Config, DatasetAssembler, ModelFitter, ModelStore, SegmentationStore, Slic, Svr};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chroma")]
#[command(version, about = "Learn grayscale photo colorization from superpixel texture", long_about = None)]
struct Cli {
    /// JSON configuration file (fields not listed keep their defaults)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level or filter directive (RUST_LOG takes precedence)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Directory for log files
    #[arg(long, global = true, value_name = "DIR", default_value = "logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download tagged photos from Flickr
    Harvest {
        /// Flickr API key (defaults to $FLICKR_API_KEY)
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = "data/flickr")]
        out: PathBuf,

        /// Comma-separated tags, all required
        #[arg(long, default_value = "yellowstone,landscape")]
        tags: String,

        /// Maximum number of result pages
        #[arg(long, value_name = "N", default_value = "5")]
        max_pages: u32,

        /// Results per page
        #[arg(long, value_name = "N", default_value = "100")]
        per_page: u32,
    },

    /// Resize every image under a directory to the canonical size, in place
    Resize {
        #[arg(value_name = "DIR", default_value = "data")]
        dir: PathBuf,

        /// Target width
        #[arg(long, default_value_t = DESIRED_SIZE.0)]
        width: u32,

        /// Target height
        #[arg(long, default_value_t = DESIRED_SIZE.1)]
        height: u32,
    },

    /// Write grayscale copies of a few images for testing
    Grayscale {
        #[arg(long, value_name = "DIR", default_value = "data/flickr")]
        src: PathBuf,

        #[arg(long, value_name = "DIR", default_value = "data/test")]
        dst: PathBuf,

        /// Maximum number of images
        #[arg(short = 'n', long, default_value = "5")]
        limit: usize,
    },

    /// Segment every image under a directory, filling the segmentation cache
    Segment {
        #[arg(value_name = "DIR", default_value = "data/flickr/")]
        dir: PathBuf,

        /// Target segment count (overrides the config)
        #[arg(long, value_name = "N")]
        segments: Option<usize>,
    },

    /// Assemble the dataset and fit U/V regressors
    Train {
        /// Fit the full C/epsilon grid instead of the single default setting
        #[arg(short, long)]
        all: bool,

        /// Training data root directory
        #[arg(short, long, value_name = "DIR", default_value = "data/flickr/")]
        training_dir: PathBuf,

        /// Base file name of the single-setting models
        #[arg(short, long, value_name = "FILE", default_value = "svr.model")]
        file: String,

        /// Output directory for model files
        #[arg(long, value_name = "DIR", default_value = "models")]
        models_dir: PathBuf,

        /// In grid mode, skip settings whose model files already exist
        #[arg(long)]
        resume: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    common::setup_logging(&cli.log_level, &cli.log_dir)?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Harvest {
            api_key,
            out,
            tags,
            max_pages,
            per_page,
        } => {
            let mut harvest = HarvestConfig::new(resolve_api_key(api_key)?, out);
            harvest.tags = tags;
            harvest.max_pages = max_pages;
            harvest.per_page = per_page;
            Harvester::new(harvest)?.run()?;
        }
        Commands::Resize { dir, width, height } => {
            let summary = chroma::prepare::resize_tree(&dir, &config.image_extensions, (width, height));
            if summary.failed > 0 {
                tracing::warn!(failed = summary.failed, "Some images could not be resized");
            }
        }
        Commands::Grayscale { src, dst, limit } => {
            chroma::prepare::make_grayscale_set(&src, &dst, &config.image_extensions, limit)?;
        }
        Commands::Segment { dir, segments } => {
            let n_segments = segments.unwrap_or(config.n_segments);
            let store = SegmentationStore::new(
                Slic::new(config.segmentation.clone()),
                n_segments,
                config.cache_dir.clone(),
            );
            store.segment_all(&dir, &config.image_extensions)?;
        }
        Commands::Train {
            all,
            training_dir,
            file,
            models_dir,
            resume,
        } => train(&config, &training_dir, &models_dir, &file, all, resume)?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    tracing::debug!(?config, "Configuration");
    Ok(config)
}

fn train(config: &Config, training_dir: &Path, models_dir: &Path, file: &str, all: bool, resume: bool) -> Result<()> {
    if !training_dir.is_dir() {
        bail!("Training directory {} does not exist", training_dir.display());
    }

    let assembler = DatasetAssembler::new(config, Slic::new(config.segmentation.clone()))?;
    let dataset = assembler.assemble(training_dir)?;
    tracing::info!(rows = dataset.len(), features = dataset.feature_len(), "Dataset ready");

    let mut store = ModelStore::create(models_dir)?.with_resume(resume);
    let fitter = ModelFitter::new(Svr);

    if all {
        let summary = fitter
            .fit_grid(&dataset, &config.hyper_grid(), &mut store)
            .context("Grid fitting failed")?;
        tracing::info!(fitted = summary.fitted, skipped = summary.skipped, "Grid finished");
    } else {
        let pair = fitter
            .fit_pair(&dataset, config.svr_params())
            .context("Model fitting failed")?;
        store.save_single(file, &pair)?;
        tracing::info!(dir = %models_dir.display(), file, "Models saved");
    }

    Ok(())
}
