use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use jobdash_client::{AtomicFileWriter, Dashboard, PipelineRequest, ProgressSink, RunOutcome};
use jobdash_core::{JobPosting, PipelineRun, Profile, SourceDocument};

use super::Commands;

/// Prints each pipeline transition on its own line.
struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn emit(&self, run: &PipelineRun) {
        match (run.failed_at(), run.error()) {
            (Some(stage), Some(err)) => println!(
                "[{:>3}%] failed while {}: {}",
                run.progress_percent(),
                stage.label(),
                err
            ),
            _ => println!(
                "[{:>3}%] {}",
                run.progress_percent(),
                run.stage().label()
            ),
        }
    }
}

pub(crate) async fn execute(dashboard: &Dashboard, command: Commands) -> Result<()> {
    match command {
        Commands::Profiles => {
            let profiles = dashboard.load_profiles().await?;
            let current = dashboard.current_profile();
            print_profiles(&profiles, current.as_deref());
        }
        Commands::AddProfile { name } => {
            let profile = dashboard.create_profile(&name).await?;
            println!("created profile {} ({})", profile.id, profile.display_name);
        }
        Commands::Select { id, none } => {
            let id = if none { None } else { id };
            match id.filter(|id| !id.trim().is_empty()) {
                Some(id) => {
                    let profile = dashboard.get_profile(&id).await?;
                    dashboard.select(Some(profile.id.clone()));
                    println!("active profile: {} ({})", profile.id, profile.display_name);
                }
                None => {
                    dashboard.select(None);
                    println!("no active profile");
                }
            }
        }
        Commands::Documents => {
            let documents = dashboard.load_documents().await?;
            print_documents(&documents);
        }
        Commands::Upload { path } => {
            let (bytes, file_name) = read_upload(&path)?;
            let document = dashboard.upload_document(bytes, &file_name).await?;
            println!("uploaded {} as document {}", document.original_name, document.id);
        }
        Commands::Remove { doc_id } => {
            dashboard.remove_document(doc_id).await?;
            println!("removed document {doc_id}");
        }
        Commands::Download { doc_id, out } => {
            let document = dashboard.download_document(doc_id).await?;
            let writer = AtomicFileWriter::new(out);
            let path = writer
                .write(&document.file_name, &document.bytes)
                .with_context(|| format!("saving {}", document.file_name))?;
            println!("saved {} ({} bytes)", path.display(), document.bytes.len());
        }
        Commands::Content { doc_id } => {
            let content = dashboard.document_content(doc_id).await?;
            println!("# {} ({})", content.original_name, content.id);
            println!("{}", content.content);
        }
        Commands::Postings { .. } => {
            let postings = dashboard.load_postings().await?;
            print_postings(&postings);
        }
        Commands::Search { keyword } => {
            dashboard.search_postings(keyword.as_deref()).await?;
            let postings = dashboard.load_postings().await?;
            print_postings(&postings);
        }
        Commands::Run { keyword, analyze } => {
            let request = PipelineRequest { keyword, analyze };
            match dashboard.run_pipeline(request, &ConsoleProgress).await? {
                RunOutcome::Current(output) => {
                    println!("resume: {}", output.artifact.download_path);
                    if let Some(analysis) = output.analysis {
                        println!("fit analysis: {analysis:#}");
                    }
                }
                RunOutcome::Superseded { profile_id } => {
                    println!("run for {profile_id} finished after the selection changed; output discarded");
                }
            }
        }
        Commands::Logout => {
            dashboard.logout();
            println!("logged out");
        }
    }
    Ok(())
}

fn read_upload(path: &Path) -> Result<(Vec<u8>, String)> {
    let Some(file_name) = path.file_name().map(|name| name.to_string_lossy().into_owned()) else {
        bail!("{} does not name a file", path.display());
    };
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok((bytes, file_name))
}

fn print_profiles(profiles: &[Profile], current: Option<&str>) {
    if profiles.is_empty() {
        println!("no profiles");
        return;
    }
    for profile in profiles {
        let marker = if current == Some(profile.id.as_str()) {
            '*'
        } else {
            ' '
        };
        println!(
            "{marker} {:<38} {:<24} {}",
            profile.id,
            profile.display_name,
            profile.created_at.as_deref().unwrap_or("-")
        );
    }
}

fn print_documents(documents: &[SourceDocument]) {
    if documents.is_empty() {
        println!("no source documents");
        return;
    }
    for document in documents {
        println!("{:>6}  {}", document.id, document.original_name);
    }
}

fn print_postings(postings: &[JobPosting]) {
    if postings.is_empty() {
        println!("no job postings");
        return;
    }
    for posting in postings {
        println!(
            "{:>6}  {:<40} {:<24} {}",
            posting.id,
            posting.title,
            posting.company.as_deref().unwrap_or("-"),
            posting.location.as_deref().unwrap_or("-")
        );
        if let Some(url) = &posting.source_url {
            println!("        {url}");
        }
    }
}
