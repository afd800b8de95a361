use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Deserialize;

use photo_report::{
    DOCX_MIME, Error, LayoutKind, PhotoDraft, PhotoList, ReportContext, capture_date,
    describe_structure, generate_report, output_file_name, parse_date,
};

const DEFAULT_HEADER: &str = "臺南市政府警察局新化分局蒐證照片";

#[derive(Parser)]
#[command(name = "photo-report", version, about = "Assemble Word photo-inventory reports from a DOCX table template")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a report: one template table per photo batch
    Generate(GenerateArgs),
    /// Print the template's tables and the text of their cells
    Inspect {
        template: PathBuf,
    },
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// DOCX template containing the placeholder table
    #[arg(short, long)]
    template: PathBuf,

    /// vertical or side-by-side; detected from the template name when omitted
    #[arg(short, long)]
    layout: Option<LayoutKind>,

    /// JSON manifest with report fields and per-photo entries
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    #[arg(long)]
    subject: Option<String>,
    #[arg(long)]
    maker: Option<String>,
    /// Report date, YYYY-MM-DD
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Page header text; pass an empty string for no header
    #[arg(long)]
    header: Option<String>,

    /// Take each photo's date from its EXIF capture time when not given
    #[arg(long)]
    exif_dates: bool,

    /// Output path; defaults to {subject}_{date}.docx
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Photos appended after any listed in the manifest
    photos: Vec<PathBuf>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Manifest {
    subject: String,
    maker: String,
    date: String,
    location: String,
    description: String,
    header_text: Option<String>,
    photos: Vec<ManifestPhoto>,
}

#[derive(Deserialize)]
struct ManifestPhoto {
    path: PathBuf,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    location: String,
    #[serde(default)]
    description: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Inspect { template } => {
            println!("{}", describe_structure(&template));
            ExitCode::SUCCESS
        }
        Command::Generate(args) => match run_generate(args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

fn read_manifest(path: &Path) -> Result<Manifest, Error> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| Error::Generation(format!("manifest {}: {e}", path.display())))
}

fn run_generate(args: GenerateArgs) -> Result<(), Error> {
    let manifest = match &args.manifest {
        Some(path) => read_manifest(path)?,
        None => Manifest::default(),
    };
    let manifest_dir = args
        .manifest
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let context = ReportContext {
        header_text: args
            .header
            .or(manifest.header_text)
            .unwrap_or_else(|| DEFAULT_HEADER.to_string()),
        subject: args.subject.unwrap_or(manifest.subject),
        location: args.location.unwrap_or(manifest.location),
        maker: args.maker.unwrap_or(manifest.maker),
        date: args.date.unwrap_or(manifest.date),
        description: args.description.unwrap_or(manifest.description),
    };
    if !context.date.is_empty() && parse_date(&context.date).is_none() {
        return Err(Error::Generation(format!(
            "report date '{}' is not YYYY-MM-DD",
            context.date
        )));
    }

    let mut list = PhotoList::new();
    let mut drafts = HashMap::new();
    let listed = manifest
        .photos
        .into_iter()
        .map(|p| {
            let path = manifest_dir.join(&p.path);
            let draft = PhotoDraft {
                date: p.date.as_deref().and_then(parse_date),
                time: p.time,
                location: p.location,
                description: p.description,
            };
            (path, draft)
        })
        .chain(args.photos.into_iter().map(|p| (p, PhotoDraft::default())));

    for (path, mut draft) in listed {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let data = std::fs::read(&path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        if args.exif_dates && draft.date.is_none() {
            draft.date = capture_date(&data).as_deref().and_then(parse_date);
        }
        if !list.add(&name, data) {
            log::warn!("Skipping duplicate photo name '{name}'");
            continue;
        }
        drafts.insert(name, draft);
    }
    if list.is_empty() {
        return Err(Error::EmptyReport);
    }

    let layout = args.layout.unwrap_or_else(|| {
        let name = args
            .template
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        LayoutKind::detect(&name)
    });
    log::info!("Layout: {layout:?}");

    let records = list.build_records(&context, &drafts)?;
    let bytes = generate_report(&context, &records, &args.template, &layout.style())?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(output_file_name(&context)));
    std::fs::write(&output, &bytes)?;
    println!(
        "Wrote {} ({} photos, {} bytes, {DOCX_MIME})",
        output.display(),
        records.len(),
        bytes.len()
    );
    Ok(())
}
