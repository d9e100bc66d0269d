use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use protoc_gen_delphi::error::Result;
use protoc_gen_delphi::plugin::{self, GeneratedUnit, GenerationStats, Options};
use protoc_gen_delphi::schema;

/// Generate Delphi units from Protocol Buffer schemas.
///
/// Without a subcommand this runs as a protoc plugin: it reads a
/// CodeGeneratorRequest on stdin and writes the CodeGeneratorResponse to
/// stdout. Invoke it through `protoc --delphi_out=<DIR>`.
#[derive(Parser)]
#[command(name = "protoc-gen-delphi", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate units from a FileDescriptorSet without going through protoc.
    Generate {
        #[command(flatten)]
        input: InputArgs,

        /// Output directory for generated units.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Suppress non-error output.
        #[arg(long, short)]
        quiet: bool,
    },

    /// Print the generated AST as JSON.
    DumpAst {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(clap::Args)]
struct InputArgs {
    /// Binary FileDescriptorSet, as written by
    /// `protoc --include_imports --descriptor_set_out=<FILE>`.
    #[arg(long)]
    descriptor_set: PathBuf,

    /// Comma-separated .proto file names to generate. Defaults to every file
    /// in the set.
    ///
    /// Example: --files shapes/point.proto,shapes/line.proto
    #[arg(long, value_delimiter = ',')]
    files: Vec<String>,

    /// Namespace of the Delphi runtime units.
    #[arg(long, env = "PROTOC_GEN_DELPHI_RUNTIME_NAMESPACE")]
    runtime_namespace: Option<String>,
}

impl InputArgs {
    fn generate(&self) -> Result<Vec<GeneratedUnit>> {
        let proto_files = schema::load_descriptor_set(&self.descriptor_set)?;
        let files: Vec<String> = if self.files.is_empty() {
            proto_files.iter().map(|f| f.name().to_string()).collect()
        } else {
            self.files.iter().map(|f| f.trim().to_string()).collect()
        };
        let options = Options::with_runtime_namespace(self.runtime_namespace.as_deref());
        plugin::generate(&proto_files, &files, &options)
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");

        // Print cause chain.
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }

        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        None => plugin::run_plugin(std::io::stdin().lock(), std::io::stdout().lock())?,

        Some(Commands::Generate {
            input,
            output_dir,
            quiet,
        }) => {
            if !quiet {
                eprintln!("Loading descriptors from {}", input.descriptor_set.display());
            }
            let units = input.generate()?;
            plugin::write_units(&output_dir, &units)?;

            if !quiet {
                let stats = GenerationStats::collect(&units);
                for unit in &units {
                    eprintln!("  {}", unit.path);
                }
                eprintln!(
                    "Generated {} units ({} classes, {} enums) in {}",
                    stats.units,
                    stats.classes,
                    stats.enums,
                    output_dir.display()
                );
            }
        }

        Some(Commands::DumpAst { input }) => {
            let units = input.generate()?;
            let asts: Vec<_> = units.iter().map(|generated| &generated.unit).collect();
            println!("{}", serde_json::to_string_pretty(&asts)?);
        }
    }

    Ok(())
}
