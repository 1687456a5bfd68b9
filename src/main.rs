use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use strip_meta::bulk::{self, BulkError};
use strip_meta::imaging::{ImageCodec, available_codecs, probe_codec};
use strip_meta::library::Library;
use strip_meta::notice::Notice;
use strip_meta::upload::{self, UploadedFile};
use strip_meta::{config, inspect, output};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "strip-meta")]
#[command(about = "Strip privacy-sensitive metadata from uploaded images")]
#[command(long_about = "\
Strip privacy-sensitive metadata from uploaded images

Removes EXIF, XMP, IPTC and comment blocks (camera serials, GPS coordinates,
timestamps) from image files in place, optionally keeping the ICC color
profile and the orientation tag so images still render correctly.

Media library layout (library.json):

  {
    \"attachments\": [
      {
        \"id\": 42,
        \"path\": \"uploads/2024/05/IMG_0042.jpg\",
        \"mime_type\": \"image/jpeg\",
        \"metadata\": {
          \"file\": \"2024/05/IMG_0042-scaled.jpg\",
          \"sizes\": { \"thumbnail\": { \"file\": \"IMG_0042-150x150.jpg\" } }
        }
      }
    ]
  }

Every rendition is looked up next to the attachment's path. Relative paths
are resolved against the directory containing library.json.

Run 'strip-meta gen-config' to generate a documented strip-meta.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Settings file (created with defaults on first use)
    #[arg(long, default_value = "strip-meta.toml", global = true)]
    config: PathBuf,

    /// Media library file
    #[arg(long, default_value = "library.json", global = true)]
    library: PathBuf,

    /// How to render notices
    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Html,
}

#[derive(Subcommand)]
enum Command {
    /// Run the upload hook on a single file
    Upload {
        file: PathBuf,
        /// MIME type of the upload (inferred from the extension if omitted)
        #[arg(long)]
        mime: Option<String>,
    },
    /// Strip every rendition of the given library attachments
    Bulk {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// List every on-disk rendition of a library attachment
    Resolve { id: u64 },
    /// Show the EXIF data left in an image
    Inspect { file: PathBuf },
    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Show which image codec is active
    Info,
    /// Print a stock strip-meta.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the current settings
    Show,
    /// Change one setting
    Set { key: String, value: String },
    /// Delete the settings file
    Reset,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    if available_codecs().is_empty() {
        emit(&Notice::codec_missing(), cli.format);
    }

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Settings(SettingsCommand::Reset) => {
            config::remove(&cli.config)?;
            println!("Removed {}", cli.config.display());
        }
        Command::Settings(SettingsCommand::Show) => {
            let settings = config::load_or_init(&cli.config)?;
            output::print_lines(&output::format_settings(&settings, &cli.config));
        }
        Command::Settings(SettingsCommand::Set { key, value }) => {
            let mut settings = config::load_or_init(&cli.config)?;
            settings.set(&key, &value)?;
            config::save(&cli.config, &settings)?;
            output::print_lines(&output::format_settings(&settings, &cli.config));
        }
        Command::Info => {
            let settings = config::load_or_init(&cli.config)?;
            println!("strip-meta {}", version_string());
            println!("Compiled codecs: {}", available_codecs().join(", "));
            if let Some(codec) = probe_codec(settings.codec) {
                emit(&Notice::codec_active(codec.name(), codec.library()), cli.format);
            }
        }
        Command::Upload { file, mime } => {
            let settings = config::load_or_init(&cli.config)?;
            let codec = probe_codec(settings.codec);
            let uploaded = match mime {
                Some(mime) => UploadedFile::new(file, mime),
                None => UploadedFile::from_path(file),
            };
            let outcome = upload::handle_upload(&uploaded, &settings, codec.as_deref());
            output::print_lines(&output::format_upload_outcome(&uploaded.path, &outcome));
        }
        Command::Resolve { id } => {
            let settings = config::load_or_init(&cli.config)?;
            if !settings.strip_active.is_enabled() {
                emit(&Notice::stripping_disabled(), cli.format);
            }
            let library = Library::load(&cli.library)?;
            let attachment = library
                .get(id)
                .ok_or_else(|| format!("no attachment with id {id} in {}", cli.library.display()))?;
            let paths = attachment.rendition_paths();
            output::print_lines(&output::format_renditions(
                id,
                &attachment.path,
                &paths,
                |p| p.exists(),
            ));
        }
        Command::Bulk { ids } => {
            let settings = config::load_or_init(&cli.config)?;
            if !settings.strip_active.is_enabled() {
                emit(&Notice::stripping_disabled(), cli.format);
            }
            let Some(codec) = probe_codec(settings.codec) else {
                return Ok(());
            };
            let library = Library::load(&cli.library)?;
            run_bulk(&ids, &library, &settings, codec.as_ref(), cli.format)?;
        }
        Command::Inspect { file } => {
            config::load_or_init(&cli.config)?;
            inspect_file(&file, cli.format)?;
        }
    }

    Ok(())
}

fn run_bulk(
    ids: &[u64],
    library: &Library,
    settings: &config::Settings,
    codec: &dyn ImageCodec,
    format: Format,
) -> Result<(), BulkError> {
    match bulk::bulk_strip(ids, library, settings, codec) {
        Ok(outcome) => {
            output::print_lines(&output::format_bulk_outcome(&outcome));
            if outcome.images > 0 {
                emit(&Notice::bulk_processed(outcome.images), format);
            }
            Ok(())
        }
        Err(err) => {
            emit(&Notice::bulk_missing_paths(), format);
            Err(err)
        }
    }
}

/// A read error is returned, not logged; `main` reports it once.
fn inspect_file(path: &Path, format: Format) -> Result<(), inspect::InspectError> {
    let fields = inspect::read_exif(path)?;
    if fields.is_empty() {
        println!("No EXIF data in {}", path.display());
    } else {
        emit(&Notice::exif_details(&fields), format);
    }
    Ok(())
}

fn emit(notice: &Notice, format: Format) {
    match format {
        Format::Text => println!("{}", notice.render_text()),
        Format::Html => println!("{}", notice.render_html().into_string()),
    }
}

/// Log to stderr so stdout stays clean for rendered output.
///
/// `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
