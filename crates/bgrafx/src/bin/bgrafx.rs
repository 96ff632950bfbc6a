use std::{path::PathBuf, time::Instant};

use argh::FromArgs;
use bgrafx::{
    image::BYTES_PER_PIXEL,
    imgproc::{
        params::{Parameter, ParameterSet},
        STATUS_OK,
    },
    registry::{self, FilterKind},
};

/// Runs one filter over a raw BGRA image file
#[derive(Debug, FromArgs)]
struct Args {
    /// filter name, e.g. "Gaussian Blur" or GaussianBlur
    #[argh(positional)]
    filter: Option<String>,

    /// raw BGRA input file, `stride * height` bytes
    #[argh(option, short = 'i')]
    input: Option<PathBuf>,

    /// raw BGRA output file
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// image width in pixels
    #[argh(option, short = 'W', default = "0")]
    width: usize,

    /// image height in pixels
    #[argh(option, short = 'H', default = "0")]
    height: usize,

    /// row stride in bytes, defaults to width * 4
    #[argh(option, short = 's')]
    stride: Option<usize>,

    /// filter parameter as key=value, may be repeated
    #[argh(option, short = 'p', from_str_fn(to_parameter))]
    param: Vec<Parameter>,

    /// JSON file holding a list of {"key", "value"} parameters
    #[argh(option)]
    params: Option<PathBuf>,

    /// list the available filters and exit
    #[argh(switch, short = 'l')]
    list: bool,
}

fn to_parameter(value: &str) -> Result<Parameter, String> {
    value.parse().map_err(|e| format!("{e}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = argh::from_env();

    if args.list {
        for kind in FilterKind::ALL {
            println!("{:<28} {}", kind.display_name(), kind.export_name());
        }
        return Ok(());
    }

    let (Some(filter), Some(input), Some(output)) = (args.filter, args.input, args.output) else {
        return Err("a filter name, --input and --output are required, see --help".into());
    };
    let kind: FilterKind = filter.parse()?;

    // command line parameters come first so they win the lookup
    let mut params: ParameterSet = args.param.into_iter().collect();
    if let Some(path) = args.params {
        params.extend(registry::read_parameters(path)?.iter().cloned());
    }

    let stride = args.stride.unwrap_or(args.width * BYTES_PER_PIXEL);
    let src = std::fs::read(&input)?;
    // start from the input so that row padding is carried over
    let mut dst = src.clone();

    log::info!(
        "running {kind} on {}x{} (stride {stride}) with {} parameter(s)",
        args.width,
        args.height,
        params.len()
    );

    let start = Instant::now();
    let status = registry::run(
        kind,
        &src,
        &mut dst,
        stride,
        args.width,
        args.height,
        &params,
    );
    let seconds = (start.elapsed().as_secs_f64() * 1e4).round() / 1e4;

    if status != STATUS_OK {
        return Err(format!("{kind} failed with status {status}").into());
    }
    log::info!("{kind} took {seconds} s");

    std::fs::write(&output, &dst)?;
    log::info!("wrote {}", output.display());

    Ok(())
}
