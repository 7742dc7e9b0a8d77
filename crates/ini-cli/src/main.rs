use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ini_core::{
    Container, NormalizationOptions, Normalizer, ParseOptions, SerializationOptions, Serializer,
    SortOrder,
};

/// ini - parse, canonicalize and check INI files
#[derive(Parser)]
#[command(name = "ini", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    options: OptionArgs,

    /// Log pipeline details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and print its model
    Parse {
        /// Path to .ini file
        file: PathBuf,
        /// Skip normalization and show the file as read
        #[arg(long)]
        raw: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical form of a file
    Normalize {
        /// Path to .ini file
        file: PathBuf,
    },

    /// Exit non-zero unless a file is already in canonical form
    Check {
        /// Path to .ini file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute SHA-256 of the canonical form
    Hash {
        /// Path to .ini file
        file: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct OptionArgs {
    /// JSON file with "parse", "normalize" and "serialize" option objects
    #[arg(long = "options", global = true, value_name = "FILE")]
    options_file: Option<PathBuf>,

    /// Keep names as written and compare them case-sensitively
    #[arg(long, global = true)]
    case_sensitive: bool,

    /// Let the last duplicated property win
    #[arg(long, global = true)]
    replace_duplicates: bool,

    /// Merge sections sharing a name
    #[arg(long, global = true)]
    merge_sections: bool,

    /// Resolve duplicates silently instead of failing
    #[arg(long, global = true)]
    ignore_errors: bool,

    #[arg(long, global = true)]
    include_empty_comments: bool,

    #[arg(long, global = true)]
    include_empty_sections: bool,

    #[arg(long, global = true)]
    include_empty_properties: bool,

    /// Order properties and sections by name: none, ascending, descending
    #[arg(long, global = true, value_name = "ORDER")]
    sort: Option<SortOrder>,

    #[arg(long, global = true, value_name = "CHAR")]
    comment_indicator: Option<char>,

    #[arg(long, global = true, value_name = "CHAR")]
    delimiter: Option<char>,

    /// Skip lines that are not comments, sections or properties
    #[arg(long, global = true)]
    lenient: bool,

    #[arg(long, global = true)]
    empty_line_before_section: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OptionsFile {
    parse: ParseOptions,
    normalize: NormalizationOptions,
    serialize: SerializationOptions,
}

/// Everything a command needs, built once from the options file and flags
struct Pipeline {
    parse: ParseOptions,
    normalize: NormalizationOptions,
    serialize: SerializationOptions,
}

impl Pipeline {
    fn from_args(args: &OptionArgs) -> Result<Self, String> {
        let base = match &args.options_file {
            Some(path) => {
                let text = read_file(path)?;
                serde_json::from_str::<OptionsFile>(&text)
                    .map_err(|e| format!("invalid options file {}: {}", path.display(), e))?
            }
            None => OptionsFile::default(),
        };

        let mut parse = base.parse;
        let mut normalize = base.normalize;
        let mut serialize = base.serialize;

        normalize.case_sensitive |= args.case_sensitive;
        normalize.replace_on_duplicate_properties |= args.replace_duplicates;
        normalize.merge_on_duplicate_sections |= args.merge_sections;
        normalize.throw_exceptions &= !args.ignore_errors;
        normalize.include_empty_comments |= args.include_empty_comments;
        normalize.include_empty_sections |= args.include_empty_sections;
        normalize.include_empty_properties |= args.include_empty_properties;
        serialize.include_empty_sections |= args.include_empty_sections;
        serialize.include_empty_properties |= args.include_empty_properties;
        serialize.empty_line_before_section |= args.empty_line_before_section;
        parse.fail_on_invalid_lines &= !args.lenient;

        if let Some(order) = args.sort {
            normalize.sort_order = order;
        }
        if let Some(c) = args.comment_indicator {
            parse.comment_indicator = c;
            serialize.comment_indicator = c;
        }
        if let Some(c) = args.delimiter {
            parse.property_delimiter = c;
            normalize.property_delimiter = c;
            serialize.property_delimiter = c;
        }

        Ok(Pipeline {
            parse,
            normalize,
            serialize,
        })
    }

    fn parser(&self, normalize: bool) -> ini_core::Parser {
        let options = ParseOptions {
            normalize_after_parse: normalize,
            ..self.parse.clone()
        };
        ini_core::Parser::new(options, Normalizer::new(self.normalize.clone()))
    }

    fn serializer(&self) -> Serializer {
        Serializer::new(self.serialize.clone(), Normalizer::new(self.normalize.clone()))
    }

    fn canonical(&self, text: &str) -> ini_core::Result<(Container, String)> {
        let container = self.parser(true).parse_str(text)?;
        let rendered = self.serializer().serialize(&container)?;
        Ok((container, rendered))
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let pipeline = match Pipeline::from_args(&cli.options) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{} {}", "error:".red().bold(), msg);
            process::exit(2);
        }
    };

    let exit_code = match cli.command {
        Commands::Parse { file, raw, json } => cmd_parse(&pipeline, &file, raw, json),
        Commands::Normalize { file } => cmd_normalize(&pipeline, &file),
        Commands::Check { file, json } => cmd_check(&pipeline, &file, json),
        Commands::Hash { file } => cmd_hash(&pipeline, &file),
        Commands::Version => {
            println!("ini {} (ini-core {})", env!("CARGO_PKG_VERSION"), ini_core::VERSION);
            0
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// ── Commands ──────────────────────────────────────────────

fn cmd_parse(pipeline: &Pipeline, file: &Path, raw: bool, json: bool) -> i32 {
    let text = match read_file(file) {
        Ok(t) => t,
        Err(msg) => return report_io(&msg),
    };
    let container = match pipeline.parser(!raw).parse_str(&text) {
        Ok(c) => c,
        Err(e) => return report_ini(file, &e),
    };

    if json {
        match serde_json::to_string_pretty(&container) {
            Ok(out) => println!("{}", out),
            Err(e) => return report_io(&format!("cannot encode JSON: {}", e)),
        }
        return 0;
    }

    println!(
        "{} global comments, {} global properties, {} sections",
        container.global_comments.len(),
        container.global_properties.len(),
        container.sections.len()
    );
    for property in &container.global_properties {
        println!("  {} = {:?}", property.name().cyan(), property.value().unwrap_or(""));
    }
    for section in &container.sections {
        println!("[{}]", section.name().bold());
        for property in &section.properties {
            println!("  {} = {:?}", property.name().cyan(), property.value().unwrap_or(""));
        }
    }
    0
}

fn cmd_normalize(pipeline: &Pipeline, file: &Path) -> i32 {
    let text = match read_file(file) {
        Ok(t) => t,
        Err(msg) => return report_io(&msg),
    };
    match pipeline.canonical(&text) {
        Ok((_, rendered)) => {
            print!("{}", rendered);
            0
        }
        Err(e) => report_ini(file, &e),
    }
}

fn cmd_check(pipeline: &Pipeline, file: &Path, json: bool) -> i32 {
    let text = match read_file(file) {
        Ok(t) => t,
        Err(msg) => return report_io(&msg),
    };

    let outcome = pipeline.canonical(&text);
    let (canonical, error) = match &outcome {
        Ok((_, rendered)) => (same_lines(&text, rendered), None),
        Err(e) => (false, Some(e.to_string())),
    };
    debug!(file = %file.display(), canonical, "checked file");

    if json {
        let report = serde_json::json!({
            "file": file.display().to_string(),
            "canonical": canonical,
            "error": error,
        });
        println!("{}", report);
    } else if let Some(msg) = &error {
        eprintln!("{} {}: {}", "error:".red().bold(), file.display(), msg);
    } else if canonical {
        println!("{} {} is canonical", "✓".green(), file.display());
    } else {
        eprintln!("{} {} is not canonical", "✗".red(), file.display());
    }

    if canonical {
        0
    } else {
        1
    }
}

fn cmd_hash(pipeline: &Pipeline, file: &Path) -> i32 {
    let text = match read_file(file) {
        Ok(t) => t,
        Err(msg) => return report_io(&msg),
    };
    let hash = pipeline
        .parser(true)
        .parse_str(&text)
        .and_then(|container| pipeline.serializer().hash(&container));
    match hash {
        Ok(h) => {
            println!("{}", h);
            0
        }
        Err(e) => report_ini(file, &e),
    }
}

// ── Helpers ───────────────────────────────────────────────

fn read_file(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))
}

/// Compare ignoring line-ending style
fn same_lines(a: &str, b: &str) -> bool {
    a.lines().eq(b.lines())
}

fn report_io(msg: &str) -> i32 {
    eprintln!("{} {}", "error:".red().bold(), msg);
    2
}

fn report_ini(file: &Path, err: &ini_core::Error) -> i32 {
    eprintln!("{} {}: {}", "error:".red().bold(), file.display(), err);
    1
}
