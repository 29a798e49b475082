use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use rollcall_core::{Embedding, Gallery, Matcher, Subject, DEFAULT_MATCH_THRESHOLD};

#[derive(Parser)]
#[command(name = "rollcall", about = "Rollcall face-attendance CLI")]
struct Cli {
    /// Gallery JSON file
    #[arg(short, long, global = true, default_value = "gallery.json")]
    gallery: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a subject from a file of embedding vectors
    Enroll {
        /// Subject identifier
        #[arg(short, long)]
        id: String,
        /// Display name
        #[arg(short, long)]
        name: String,
        /// JSON file holding an array of embedding vectors
        embeddings: PathBuf,
    },
    /// Match probe embeddings against the gallery
    Match {
        /// Distance threshold for a positive match
        #[arg(short, long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
        threshold: f32,
        /// JSON file holding an array of probe vectors
        probes: PathBuf,
    },
    /// List enrolled subjects
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Enroll {
            id,
            name,
            embeddings,
        } => {
            let gallery = load_gallery(&cli.gallery)?;
            let vectors = read_vectors(&embeddings)?;
            let stored = gallery.enroll(&id, &name, vectors)?;
            save_gallery(&cli.gallery, &gallery)?;
            println!("enrolled {id} with {stored} embedding(s)");
        }
        Commands::Match { threshold, probes } => {
            let gallery = load_gallery(&cli.gallery)?;
            let probes = read_vectors(&probes)?;
            let matches = Matcher::new().find_all_matches(&gallery, &probes, threshold)?;
            println!("{}", serde_json::to_string_pretty(&matches)?);
        }
        Commands::List => {
            let gallery = load_gallery(&cli.gallery)?;
            for subject in gallery.subjects() {
                println!("{}\t{}", subject.id, subject.display_name);
            }
        }
    }

    Ok(())
}

/// Load a gallery file, or start empty when the file does not exist yet.
/// Re-enrolling each subject keeps file order and revalidates the data.
fn load_gallery(path: &Path) -> Result<Gallery> {
    let gallery = Gallery::new();
    if !path.exists() {
        return Ok(gallery);
    }
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let subjects: Vec<Subject> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    for subject in subjects {
        gallery.enroll(&subject.id, &subject.display_name, subject.embeddings)?;
    }
    Ok(gallery)
}

fn save_gallery(path: &Path, gallery: &Gallery) -> Result<()> {
    let json = serde_json::to_string_pretty(&gallery.snapshot())?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Read an array of embedding vectors from a JSON file.
fn read_vectors(path: &Path) -> Result<Vec<Embedding>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let vectors: Vec<Vec<f32>> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok(vectors.into_iter().map(Embedding::new).collect())
}
