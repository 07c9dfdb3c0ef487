#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ABS source files; standard input is read when none is given
    files: Vec<String>,

    /// Product to derive
    #[arg(long)]
    product: Option<String>,

    /// Stop after product derivation
    #[arg(long)]
    no_typecheck: bool,

    /// Do not merge the bundled standard library
    #[arg(long)]
    no_stdlib: bool,

    /// Enable location-type inference
    #[arg(long)]
    loctypes: bool,

    /// Default location type: Near, Far or Somewhere
    #[arg(long, value_name = "LOCTYPE", requires = "loctypes")]
    locdefault: Option<abs::abs_impl::location_types::LocationType>,

    /// Location typing precision: BASIC, METHOD_LOCAL_FAR_LOCATIONS,
    /// CLASS_LOCAL_FAR_LOCATIONS or GLOBAL_FAR_LOCATIONS
    #[arg(long, value_name = "SCOPE", requires = "loctypes")]
    locscope: Option<abs::abs_impl::location_types::Precision>,

    /// Report location-type statistics
    #[arg(long, requires = "loctypes")]
    loctypestats: bool,

    /// Print the final program tree as JSON
    #[arg(long)]
    dump: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("abs needs to be installed with the cli feature (`cargo install --force abs -F cli`)");
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    use abs::abs_impl::location_types::LocationTypeOptions;
    use abs::{compile, CompilerOptions, SourceFile};
    use std::io::Read;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let args = Args::parse();

    let default_filter = if args.verbose { "abs=debug,abs_impl=debug,abs_grammar=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let sources = if args.files.is_empty() {
        let mut stdin = String::new();
        std::io::stdin().lock().read_to_string(&mut stdin)?;
        vec![SourceFile::anonymous(stdin)]
    } else {
        args.files
            .iter()
            .map(|path| -> Result<SourceFile> {
                Ok(SourceFile::new(path.as_str(), std::fs::read_to_string(path)?))
            })
            .collect::<Result<Vec<_>>>()?
    };

    let location_types = args.loctypes.then(|| {
        let defaults = LocationTypeOptions::default();
        LocationTypeOptions {
            default: args.locdefault.unwrap_or(defaults.default),
            precision: args.locscope.unwrap_or(defaults.precision),
            statistics: args.loctypestats,
        }
    });
    let options = CompilerOptions {
        product: args.product,
        typecheck: !args.no_typecheck,
        stdlib: !args.no_stdlib,
        location_types,
    };

    let compilation = compile(&sources, &options)?;
    for diagnostic in compilation.diagnostics.iter() {
        eprintln!("{}", diagnostic);
    }
    if args.dump {
        if let Some(model) = &compilation.model {
            println!("{}", serde_json::to_string_pretty(model)?);
        }
    }

    let errors = compilation.diagnostics.error_count();
    if errors > 0 {
        eprintln!("{} error(s)", errors);
        std::process::exit(1);
    }
    Ok(())
}
