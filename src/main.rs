use anyhow::Result;
use clap::Parser;
use mapheat::image_cache::FileFetcher;
use mapheat::parser::load_points;
use mapheat::{DataPoint, DataSet, DrawMode, ImageCache, LayerConfig, RenderConfig, Renderer};
use plotters::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Clone, Debug, Parser)]
#[command(version)]
pub struct Args {
    #[clap(help = "point file: \"lng lat [count [text]]\" per line, or yaml")]
    pub input: Option<String>,

    #[clap(short = 'c', long, help = "render configuration (yaml)")]
    pub config: Option<String>,

    #[clap(short = 'o', long, help = "output filename", default_value = "out.png")]
    pub output: String,

    #[clap(short = 'W', long, help = "image width in pixels, overrides the config")]
    pub width: Option<u32>,

    #[clap(short = 'H', long, help = "image height in pixels, overrides the config")]
    pub height: Option<u32>,

    #[clap(short = 'd', long, help = "draw a single layer of this kind instead of the configured layers")]
    pub draw: Option<DrawMode>,

    #[clap(short = 'r', long, help = "add this many random points around the view center")]
    pub random: Option<usize>,

    #[clap(short = 's', long, help = "seed for --random", default_value = "0")]
    pub seed: u64,
}

fn random_points(n: usize, seed: u64) -> Vec<DataPoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            // tokyo-ish
            let lng = 139.7 + rng.random_range(-0.3..0.3);
            let lat = 35.7 + rng.random_range(-0.2..0.2);
            DataPoint::point(lng, lat).with_count(rng.random_range(0.0..100.0f64).round())
        })
        .collect()
}

fn load_config(args: &Args) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(draw) = args.draw {
        config.layers = vec![LayerConfig::new(draw)];
    }
    Ok(config)
}

fn load_data(args: &Args) -> Result<DataSet> {
    let mut data = match &args.input {
        Some(path) => load_points(path)?,
        None => DataSet::default(),
    };
    if let Some(n) = args.random {
        data.extend(random_points(n, args.seed));
    }
    Ok(data)
}

/// Loads every icon the layers refer to before the frame is drawn.
fn load_icons(config: &RenderConfig, data: &DataSet) -> ImageCache {
    let mut cache = ImageCache::new();
    let mut fetcher = FileFetcher::new();
    for layer in config.layers.iter().filter(|l| l.draw == DrawMode::Icon) {
        mapheat::draw::request_missing(data, layer.icon.as_deref(), &mut cache, &mut fetcher);
    }
    let loaded = fetcher.load_files(&mut cache);
    log::debug!("loaded {loaded} icons");
    cache
}

fn print_args(args: &[String]) {
    let args = args
        .iter()
        .map(|x| if x.contains(' ') { format!("\"{x}\"") } else { x.to_string() })
        .collect::<Vec<_>>();
    let args = args.join(" ");
    log::info!("args: {args}");
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();
    print_args(&std::env::args().collect::<Vec<_>>());

    let config = load_config(&args)?;
    let data = load_data(&args)?;
    if data.is_empty() {
        log::warn!("no input points; the image will only hold the background");
    }
    let images = load_icons(&config, &data);

    let root = BitMapBackend::new(&args.output, (config.width, config.height)).into_drawing_area();
    Renderer::new().render(&root, &config, &data, &images)?;
    log::info!("wrote {}", &args.output);
    Ok(())
}
