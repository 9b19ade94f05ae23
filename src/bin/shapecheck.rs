use clap::Parser;
use octofhir_shapecheck::{
    CacheConfig, CachedSchemaProvider, FileSystemSchemaProvider, NoVersionTable,
    ShapeCheckConfig, StaticVersionTable, StructuralWalker, VersionCompatibilityTable, summarize,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Clone)]
#[command(name = "shapecheck")]
#[command(about = "Structural pre-check of a bundle document against schema trees")]
struct Args {
    #[arg(help = "Bundle document to check")]
    document: PathBuf,

    #[arg(short, long, help = "Directory holding <TypeName>.json schema files")]
    schemas: PathBuf,

    #[arg(long, help = "Version tag declared by the document", default_value = "R4")]
    version_tag: String,

    #[arg(long, help = "JSON file with version compatibility entries")]
    versions: Option<PathBuf>,

    #[arg(short, long, help = "JSON configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Verbose output")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let config = match &args.config {
        Some(path) => ShapeCheckConfig::from_file(path)?,
        None => ShapeCheckConfig::default(),
    };

    let versions: Arc<dyn VersionCompatibilityTable> = match &args.versions {
        Some(path) => Arc::new(StaticVersionTable::from_file(path)?),
        None => Arc::new(NoVersionTable),
    };

    let provider = Arc::new(CachedSchemaProvider::new(
        Arc::new(FileSystemSchemaProvider::new(&args.schemas)),
        CacheConfig::default(),
    ));

    let raw_text = tokio::fs::read_to_string(&args.document).await?;
    let walker = StructuralWalker::new(provider, versions, config);
    let findings = walker.validate(&raw_text, &args.version_tag).await;

    let summary = summarize(&findings);
    tracing::info!(
        "{}: {} findings ({} errors, {} warnings, {} information)",
        args.document.display(),
        summary.total(),
        summary.errors,
        summary.warnings,
        summary.information
    );

    println!("{}", serde_json::to_string_pretty(&findings)?);
    Ok(())
}
