//! bookbind CLI - book layout and bundling tool

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use bookbind::{
    export, export_pdf, export_text, paginate_with, BookMetadata, ExportOptions, ExportRequest,
    LayoutOptions, MetadataFormat, Plan,
};

#[derive(Parser)]
#[command(name = "bookbind")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Lay out books as PDF and bundle them for download", long_about = None)]
struct Cli {
    /// Input body file ("-" or omitted for stdin)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Book title
    #[arg(short, long)]
    title: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Bundle plain text, PDF and metadata into a zip archive
    Pack {
        #[command(flatten)]
        book: BookArgs,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Cover image to include (PNG or JPEG)
        #[arg(long, value_name = "IMAGE")]
        cover: Option<PathBuf>,

        /// Write the metadata record as JSON
        #[arg(long)]
        json_metadata: bool,

        /// Product tag prefixed to the archive name
        #[arg(long, env = "BOOKBIND_PRODUCT_TAG")]
        tag: Option<String>,
    },

    /// Lay out the book and write it as PDF
    Pdf {
        #[command(flatten)]
        book: BookArgs,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Leave page content streams uncompressed
        #[arg(long)]
        uncompressed: bool,
    },

    /// Write the plain-text copy of the book
    Text {
        #[command(flatten)]
        book: BookArgs,

        /// Output directory (stdout if not specified)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Show layout statistics
    Layout {
        #[command(flatten)]
        book: BookArgs,

        /// Print the laid-out document as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct BookArgs {
    /// Input body file ("-" or omitted for stdin)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Book title
    #[arg(short, long)]
    title: Option<String>,

    /// Author name
    #[arg(short, long)]
    author: Option<String>,

    /// Content language
    #[arg(long, default_value = "English")]
    language: String,

    /// Plan the book was generated under
    #[arg(long, value_enum, default_value = "free")]
    plan: PlanArg,

    /// Layout options as JSON
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Page size
    #[arg(long, value_enum)]
    page: Option<PageSize>,

    /// Page margin in points
    #[arg(long)]
    margin: Option<f32>,

    /// Date stamp for file names (YYYY-MM-DD, default today)
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PlanArg {
    /// Free plan
    Free,
    /// Pro plan
    Pro,
    /// Creator plan
    Creator,
}

impl From<PlanArg> for Plan {
    fn from(plan: PlanArg) -> Self {
        match plan {
            PlanArg::Free => Plan::Free,
            PlanArg::Pro => Plan::Pro,
            PlanArg::Creator => Plan::Creator,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PageSize {
    /// ISO A4 (595 x 842 pt)
    A4,
    /// US Letter (612 x 792 pt)
    Letter,
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Pack {
            book,
            output,
            cover,
            json_metadata,
            tag,
        }) => cmd_pack(&book, output.as_deref(), cover.as_deref(), json_metadata, tag),
        Some(Commands::Pdf {
            book,
            output,
            uncompressed,
        }) => cmd_pdf(&book, output.as_deref(), uncompressed),
        Some(Commands::Text { book, output }) => cmd_text(&book, output.as_deref()),
        Some(Commands::Layout { book, json }) => cmd_layout(&book, json),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: pack if input is provided
            if let Some(input) = cli.input {
                let book = BookArgs::for_input(input, cli.title);
                cmd_pack(&book, cli.output.as_deref(), None, false, None)
            } else {
                println!("{}", "Usage: bookbind <FILE> [OUTPUT]".yellow());
                println!("       bookbind --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

impl BookArgs {
    fn for_input(input: PathBuf, title: Option<String>) -> Self {
        Self {
            input: Some(input),
            title,
            author: None,
            language: "English".to_string(),
            plan: PlanArg::Free,
            config: None,
            page: None,
            margin: None,
            date: None,
        }
    }

    /// Read the body and build the export request.
    fn request(&self) -> CliResult<ExportRequest> {
        let body = read_body(self.input.as_deref())?;
        let title = self.title.clone().unwrap_or_default();

        let mut request = ExportRequest::new(title, body);
        let mut metadata: BookMetadata = request
            .metadata
            .clone()
            .with_language(self.language.clone())
            .with_plan(self.plan.into());
        if let Some(ref author) = self.author {
            metadata = metadata.with_author(author.clone());
        }
        request = request.with_metadata(metadata);
        Ok(request)
    }

    /// Layout options from the config file and flags.
    fn layout_options(&self) -> CliResult<LayoutOptions> {
        let mut options = match self.config {
            Some(ref path) => LayoutOptions::from_json(&fs::read_to_string(path)?)?,
            None => LayoutOptions::default(),
        };
        match self.page {
            Some(PageSize::A4) => options = options.a4(),
            Some(PageSize::Letter) => options = options.letter(),
            None => {}
        }
        if let Some(margin) = self.margin {
            options = options.with_margin(margin);
        }
        Ok(options)
    }

    fn export_options(&self) -> CliResult<ExportOptions> {
        let mut options = ExportOptions::new().with_layout(self.layout_options()?);
        if let Some(date) = self.date {
            options = options.with_date(date);
        }
        Ok(options)
    }
}

fn read_body(input: Option<&Path>) -> CliResult<String> {
    match input {
        Some(path) if path != Path::new("-") => Ok(fs::read_to_string(path)?),
        _ => {
            let mut body = String::new();
            io::stdin().read_to_string(&mut body)?;
            Ok(body)
        }
    }
}

fn output_dir(output: Option<&Path>) -> CliResult<PathBuf> {
    let dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn cmd_pack(
    book: &BookArgs,
    output: Option<&Path>,
    cover: Option<&Path>,
    json_metadata: bool,
    tag: Option<String>,
) -> CliResult<()> {
    let output_dir = output_dir(output)?;

    let pb = ProgressBar::new(3);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Reading book...");
    let mut request = book.request()?;
    if let Some(path) = cover {
        request = request.with_cover(fs::read(path)?);
    }
    let mut options = book.export_options()?;
    if json_metadata {
        options = options.with_metadata_format(MetadataFormat::Json);
    }
    if let Some(tag) = tag {
        options = options.with_product_tag(tag);
    }
    pb.inc(1);

    pb.set_message("Building archive...");
    let bundle = export(&request, &options)?;
    pb.inc(1);

    pb.set_message("Writing archive...");
    let names: Vec<String> = bundle.archive.names().iter().map(|s| s.to_string()).collect();
    let failures = bundle.failures().to_vec();
    let path = bundle.into_artifact().write_to_dir(&output_dir)?;
    pb.inc(1);

    pb.finish_with_message("Done!");

    println!("\n{} {}", "Saved to".green().bold(), path.display());
    for (i, name) in names.iter().enumerate() {
        let branch = if i + 1 == names.len() { "└─" } else { "├─" };
        println!("  {} {}", branch.dimmed(), name);
    }

    if !failures.is_empty() {
        println!();
        for failure in &failures {
            println!(
                "{} {}: {}",
                "Skipped".yellow().bold(),
                failure.name,
                failure.message
            );
        }
    }

    Ok(())
}

fn cmd_pdf(book: &BookArgs, output: Option<&Path>, uncompressed: bool) -> CliResult<()> {
    let request = book.request()?;
    let mut options = book.export_options()?;
    if uncompressed {
        options.pdf = options.pdf.with_compression(false);
    }

    let artifact = export_pdf(&request, &options)?;
    let path = artifact.write_to_dir(output_dir(output)?)?;
    println!("{} {}", "Saved to".green(), path.display());

    Ok(())
}

fn cmd_text(book: &BookArgs, output: Option<&Path>) -> CliResult<()> {
    let request = book.request()?;
    let options = book.export_options()?;
    let artifact = export_text(&request, &options)?;

    if let Some(dir) = output {
        let path = artifact.write_to_dir(output_dir(Some(dir))?)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", String::from_utf8_lossy(&artifact.bytes));
    }

    Ok(())
}

fn cmd_layout(book: &BookArgs, json: bool) -> CliResult<()> {
    let request = book.request()?;
    let options = book.layout_options()?;
    let doc = paginate_with(&request.title, &request.body, options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    let stats = doc.stats();
    let geometry = doc.geometry;

    println!("{}", "Layout".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Title".bold(), doc.title);
    println!(
        "{}: {} x {} pt, margin {} pt",
        "Page".bold(),
        geometry.width,
        geometry.height,
        geometry.margin
    );
    println!("{}: {}", "Pages".bold(), stats.page_count);

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Runs".bold(), stats.run_count);
    println!("{}: {}", "Title lines".bold(), stats.title_lines);
    println!("{}: {}", "Header runs".bold(), stats.header_runs);
    println!("{}: {}", "Paragraph lines".bold(), stats.paragraph_lines);
    println!("{}: {}", "Chapters".bold(), request.metadata.chapter_count);

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "bookbind".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Book layout and bundling tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/bookbind".dimmed());
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_for(path: PathBuf) -> BookArgs {
        let mut book = BookArgs::for_input(path, Some("Roman History".to_string()));
        book.date = NaiveDate::from_ymd_opt(2024, 1, 2);
        book
    }

    #[test]
    fn test_cli_parses_pack() {
        let cli = Cli::try_parse_from([
            "bookbind", "pack", "book.txt", "--title", "T", "--plan", "pro", "--page", "letter",
            "--date", "2024-01-02",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Pack { book, .. }) => {
                assert_eq!(book.title.as_deref(), Some("T"));
                assert!(book.plan == PlanArg::Pro);
                assert!(book.page == Some(PageSize::Letter));
                assert_eq!(book.date, NaiveDate::from_ymd_opt(2024, 1, 2));
            }
            _ => panic!("expected pack"),
        }
    }

    #[test]
    fn test_pack_writes_archive() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("body.txt");
        fs::write(&input, "# Intro\nRome was not built in a day.").unwrap();

        let out = dir.path().join("out");
        cmd_pack(&book_for(input), Some(&out), None, false, None).unwrap();
        assert!(out
            .join("BookMind.ai_roman_history_2024-01-02.zip")
            .exists());
    }

    #[test]
    fn test_pdf_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("body.txt");
        fs::write(&input, "Hello.").unwrap();

        cmd_pdf(&book_for(input), Some(dir.path()), true).unwrap();
        let bytes = fs::read(dir.path().join("roman_history_2024-01-02.pdf")).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_layout_options_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("layout.json");
        fs::write(&config, r#"{"geometry": {"margin": 30.0}}"#).unwrap();

        let mut book = book_for(dir.path().join("unused.txt"));
        book.config = Some(config);
        book.page = Some(PageSize::Letter);

        let options = book.layout_options().unwrap();
        assert_eq!(options.geometry.width, 612.0);
        assert_eq!(options.geometry.margin, 30.0);
    }
}
