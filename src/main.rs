use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use lesson_planner::config::Config;
use lesson_planner::export::{self, EXPORT_FILE_NAME};
use lesson_planner::extract;
use lesson_planner::instrumentation::RunLogger;
use lesson_planner::llm::{GeminiGenerator, DEFAULT_DURATION};
use lesson_planner::orchestrator::{Confirm, Orchestrator};
use lesson_planner::store::{JsonFileSlot, LessonPlan, PlanStore};

#[derive(Parser)]
#[command(name = "lesson-planner", about = "Generate lesson plans from a sample lesson-plan document")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new lesson plan from a sample document
    Generate {
        /// Sample document (.pdf, .docx or .txt)
        #[arg(short, long)]
        file: PathBuf,
        /// Subject, e.g. "Ngữ Văn"
        #[arg(long)]
        subject: Option<String>,
        /// Grade, e.g. "Lớp 10"
        #[arg(long)]
        grade: Option<String>,
        /// Lesson title or topic
        #[arg(long)]
        topic: Option<String>,
        #[arg(long, default_value = DEFAULT_DURATION)]
        duration: String,
        /// Override the media type guessed from the file extension
        #[arg(long)]
        media_type: Option<String>,
    },
    /// Print the text extracted from a sample document
    Extract {
        file: PathBuf,
        #[arg(long)]
        media_type: Option<String>,
    },
    /// List saved lesson plans
    List,
    /// Print a lesson plan (the latest one by default)
    Show {
        id: Option<String>,
        /// Strip bold markers, as for copying
        #[arg(long)]
        plain: bool,
    },
    /// Rename a lesson plan
    Rename { id: String, name: String },
    /// Delete a lesson plan
    Delete {
        id: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete all saved lesson plans
    Clear {
        #[arg(short, long)]
        yes: bool,
    },
    /// Export a lesson plan (the latest one by default) to a Word document
    Export {
        id: Option<String>,
        #[arg(short, long, default_value = EXPORT_FILE_NAME)]
        out: PathBuf,
    },
}

/// Asks on the terminal unless `--yes` was given.
struct TerminalConfirm {
    assume_yes: bool,
}

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{} [y/N] ", prompt);
        std::io::stderr().flush().ok();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "c" | "có")
    }
}

type App = Orchestrator<GeminiGenerator, JsonFileSlot>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    let generator = GeminiGenerator::new(
        config.api_key.as_deref(),
        &config.api_base_url,
        config.model.clone(),
    );
    let store = PlanStore::load(JsonFileSlot::new(&config.store_path));
    let mut app = Orchestrator::new(generator, store);

    match cli.command {
        Commands::Generate {
            file,
            subject,
            grade,
            topic,
            duration,
            media_type,
        } => {
            match RunLogger::new(&config.log_dir) {
                Ok(logger) => app = app.with_run_logger(logger),
                Err(e) => warn!(error = %e, "generation log disabled"),
            }

            upload(&mut app, &file, media_type).await?;

            let form = app.form_mut();
            form.subject = subject.unwrap_or_default();
            form.grade = grade.unwrap_or_default();
            form.topic = topic.unwrap_or_default();
            form.duration = duration;

            let plan = app.generate().await?;
            println!("\n{}\n", plan.content);
            eprintln!("Đã lưu giáo án \"{}\" ({})", plan.name, plan.id);
        }
        Commands::Extract { file, media_type } => {
            let uploaded = upload(&mut app, &file, media_type).await?;
            println!("{}", uploaded);
        }
        Commands::List => {
            if app.plans().is_empty() {
                println!("Chưa có giáo án nào.");
            }
            for (i, plan) in app.plans().iter().enumerate() {
                println!(
                    "{:>3}. {}  {}  ({} ký tự)",
                    i + 1,
                    plan.id,
                    plan.name,
                    plan.content.chars().count()
                );
            }
        }
        Commands::Show { id, plain } => {
            let plan = resolve_plan(&mut app, id.as_deref())?;
            if plain {
                println!("{}", export::plain_text(&plan.content));
            } else {
                println!("{}", plan.content);
            }
        }
        Commands::Rename { id, name } => {
            if app.rename_plan(&id, &name) {
                eprintln!("Đã đổi tên giáo án {}", id);
            } else if name.trim().is_empty() {
                bail!("Tên giáo án không được để trống");
            } else {
                bail!("Không tìm thấy giáo án: {}", id);
            }
        }
        Commands::Delete { id, yes } => {
            if !app.plans().iter().any(|p| p.id == id) {
                bail!("Không tìm thấy giáo án: {}", id);
            }
            if app.delete_plan(&id, &TerminalConfirm { assume_yes: yes }) {
                eprintln!("Đã xóa giáo án {}", id);
            }
        }
        Commands::Clear { yes } => {
            if app.clear_plans(&TerminalConfirm { assume_yes: yes }) {
                eprintln!("Đã xóa tất cả giáo án");
            }
        }
        Commands::Export { id, out } => {
            let plan = resolve_plan(&mut app, id.as_deref())?;
            export::write_docx(&plan.content, &out)?;
            eprintln!("Đã xuất \"{}\" ra {}", plan.name, out.display());
        }
    }

    Ok(())
}

async fn upload(app: &mut App, path: &Path, media_type: Option<String>) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .context(format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let declared =
        media_type.unwrap_or_else(|| extract::declared_type_for(path).to_string());

    let uploaded = app.upload(&name, &declared, bytes).await?;
    Ok(uploaded.extracted_text.clone())
}

/// The given plan, or the most recently created one.
fn resolve_plan(app: &mut App, id: Option<&str>) -> Result<LessonPlan> {
    match id {
        Some(id) => {
            app.select_plan(id);
            app.selected_plan()
                .cloned()
                .context(format!("Không tìm thấy giáo án: {}", id))
        }
        None => app
            .plans()
            .last()
            .cloned()
            .context("Chưa có giáo án nào."),
    }
}
