use std::{path::PathBuf, time::Instant};

use anyhow::{bail, Context, Result};
use clap::{App, Arg};
use log::{debug, LevelFilter};
use propstore_core::{
    containers::{PropertyContainer, PropertyObject},
    layout::{Bonds, ContainerKind, PropertyKey, Particles},
};
use propstore_io::persist::load_container_from_path;
use rayon::prelude::*;

struct Args {
    pub input_file: PathBuf,
    pub kind: String,
    pub verbose: bool,
    pub metadata_only: bool,
}

fn get_args() -> Result<Args> {
    let matches = App::new("propstore info")
        .version("0.1")
        .about("Prints the property table of a propstore container file")
        .arg(
            Arg::with_name("INPUT")
                .short("i")
                .long("input")
                .takes_value(true)
                .value_name("FILE")
                .help("Input container file")
                .required(true),
        )
        .arg(
            Arg::with_name("KIND")
                .short("k")
                .long("kind")
                .takes_value(true)
                .possible_values(&["particles", "bonds"])
                .default_value("particles")
                .help("Kind of elements stored in the container file"),
        )
        .arg(
            Arg::with_name("VERBOSE")
                .short("v")
                .long("verbose")
                .help("Print debug output"),
        )
        .arg(
            Arg::with_name("METADATA_ONLY")
                .long("metadata-only")
                .help("Only print the layout of each property, skipping the minimum and maximum values"),
        )
        .get_matches();

    let input_file = PathBuf::from(matches.value_of("INPUT").context("Missing input file")?);
    let kind = matches.value_of("KIND").unwrap_or("particles").to_owned();

    Ok(Args {
        input_file,
        kind,
        verbose: matches.is_present("VERBOSE"),
        metadata_only: matches.is_present("METADATA_ONLY"),
    })
}

fn init_logging(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

/// Minimum and maximum of every component of `property`, or `None` for empty properties
fn component_ranges(property: &PropertyObject) -> Vec<Option<(f64, f64)>> {
    let storage = property.storage();
    (0..storage.component_count())
        .map(|component| {
            let mut range: Option<(f64, f64)> = None;
            storage.for_each_component(component, |_, value: f64| {
                range = Some(match range {
                    None => (value, value),
                    Some((min, max)) => (min.min(value), max.max(value)),
                });
            });
            range
        })
        .collect()
}

fn print_properties<K: ContainerKind>(container: &PropertyContainer<K>, metadata_only: bool) {
    println!(
        "{}: {} {}, {} properties",
        container.title(),
        container.element_count(),
        K::ELEMENT_DESCRIPTION,
        container.properties().len()
    );

    let ranges = if metadata_only {
        vec![]
    } else {
        let t_start = Instant::now();
        let ranges = container
            .properties()
            .par_iter()
            .map(component_ranges)
            .collect::<Vec<_>>();
        debug!(
            "Computed value ranges in {:.3}s",
            t_start.elapsed().as_secs_f64()
        );
        ranges
    };

    let properties = container.properties().iter().zip(container.keys());
    for (index, (property, key)) in properties.enumerate() {
        let semantic = match key {
            PropertyKey::Standard(_) => "standard",
            PropertyKey::UserDefined(_) => "user",
        };
        println!(
            "\t{:<24} {:<8} {:<6} components: {}  stride: {}",
            property.name(),
            semantic,
            property.data_type(),
            property.component_count(),
            property.storage().stride()
        );
        if let Some(property_ranges) = ranges.get(index) {
            for (component, range) in property_ranges.iter().enumerate() {
                if let Some((min, max)) = range {
                    println!(
                        "\t\t{:<30} {}  {}",
                        property.name_with_component(component),
                        min,
                        max
                    );
                }
            }
        }
    }
}

fn analyze_file<K: ContainerKind>(args: &Args) -> Result<()> {
    let container = load_container_from_path::<K, _>(&args.input_file).with_context(|| {
        format!(
            "Could not read {} container from {}",
            K::DISPLAY_NAME,
            args.input_file.display()
        )
    })?;
    container.verify_integrity()?;
    print_properties(&container, args.metadata_only);
    Ok(())
}

fn main() -> Result<()> {
    let args = get_args()?;
    init_logging(args.verbose);
    println!("propstore info report for {}", args.input_file.display());

    match args.kind.as_str() {
        "particles" => analyze_file::<Particles>(&args),
        "bonds" => analyze_file::<Bonds>(&args),
        other => bail!("Unknown container kind '{}'", other),
    }
}
