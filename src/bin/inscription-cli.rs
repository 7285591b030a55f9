#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use inscription::{
    io,
    model::StudentId,
    storage::{JsonStorage, Storage},
    timetable::TextSchedule,
    BatchReport, Engine, MAX_CAPACITY,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI minimaliste de gestion des inscriptions (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON d'état du roster
    #[arg(long, global = true, default_value = "roster.json")]
    roster: String,

    /// Ré-export CSV des inscriptions après chaque lot traité
    #[arg(long, global = true)]
    out_csv: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Importer le catalogue (turmas + aulas) depuis un CSV
    ImportCatalog {
        #[arg(long)]
        csv: String,
    },

    /// Importer les inscriptions initiales depuis un CSV
    ImportEnrollments {
        #[arg(long)]
        csv: String,
    },

    /// Demander l'inscription d'un étudiant à une turma
    Enroll {
        #[arg(long)]
        student: u32,
        #[arg(long)]
        course: String,
        #[arg(long)]
        section: String,
    },

    /// Demander le retrait d'un étudiant d'une UC
    Withdraw {
        #[arg(long)]
        student: u32,
        #[arg(long)]
        course: String,
    },

    /// Demander un changement de turma au sein d'une UC
    ChangeClass {
        #[arg(long)]
        student: u32,
        #[arg(long)]
        course: String,
        #[arg(long)]
        section: String,
    },

    /// Demander un changement d'UC
    ChangeCourse {
        #[arg(long)]
        student: u32,
        #[arg(long)]
        from_course: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        section: String,
    },

    /// Soumettre un lot de demandes depuis un CSV
    /// (header `Kind,StudentCode,UcCode,ClassCode,FromUc`)
    Batch {
        #[arg(long)]
        csv: String,
        /// Après traitement, défaire la dernière demande acceptée.
        /// L'historique d'undo ne survit pas à l'invocation.
        #[arg(long)]
        undo_last: bool,
    },

    /// Afficher l'horaire hebdomadaire d'un étudiant
    Show {
        #[arg(long)]
        student: u32,
    },

    /// Lister les effectifs des turmas d'une UC
    Sections {
        #[arg(long)]
        course: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.roster)?;
    let mut engine = Engine::with_roster(storage.load_or_default()?);

    let code = match cli.cmd {
        Commands::ImportCatalog { csv } => {
            let lessons = io::import_catalog_csv(csv)?;
            engine.roster_mut().load_catalog(lessons);
            storage.save(engine.roster())?;
            0
        }
        Commands::ImportEnrollments { csv } => {
            let rows = io::import_enrollments_csv(csv)?;
            engine.roster_mut().load_enrollments(rows)?;
            storage.save(engine.roster())?;
            0
        }
        Commands::Enroll {
            student,
            course,
            section,
        } => {
            engine.submit_enroll(StudentId::new(student), &course, &section)?;
            run_batch(&mut engine, &storage, cli.out_csv.as_deref())?
        }
        Commands::Withdraw { student, course } => {
            engine.submit_withdraw(StudentId::new(student), &course)?;
            run_batch(&mut engine, &storage, cli.out_csv.as_deref())?
        }
        Commands::ChangeClass {
            student,
            course,
            section,
        } => {
            engine.submit_change_class(StudentId::new(student), &course, &section)?;
            run_batch(&mut engine, &storage, cli.out_csv.as_deref())?
        }
        Commands::ChangeCourse {
            student,
            from_course,
            course,
            section,
        } => {
            engine.submit_change_course(StudentId::new(student), &from_course, &course, &section)?;
            run_batch(&mut engine, &storage, cli.out_csv.as_deref())?
        }
        Commands::Batch { csv, undo_last } => {
            submit_batch_csv(&mut engine, &csv)?;
            let code = run_batch(&mut engine, &storage, cli.out_csv.as_deref())?;
            if undo_last {
                match engine.undo_last()? {
                    Some(entry) => {
                        println!(
                            "undone | {:?} | {} -> {}",
                            entry.request.kind, entry.request.student, entry.request.target
                        );
                        storage.save(engine.roster())?;
                        if let Some(path) = cli.out_csv.as_deref() {
                            io::export_enrollments_csv(path, engine.roster())?;
                        }
                    }
                    None => println!("Rien à défaire."),
                }
            }
            code
        }
        Commands::Show { student } => {
            let schedule = inscription::prepare_schedule(
                engine.roster(),
                StudentId::new(student),
                &TextSchedule,
            )?;
            print!("{}", schedule.content);
            0
        }
        Commands::Sections { course } => {
            let sizes = engine.roster().section_sizes(&course);
            if sizes.is_empty() {
                bail!("unknown course: {course}");
            }
            for (key, n) in sizes {
                println!("{key} | {n}/{MAX_CAPACITY}");
            }
            0
        }
    };

    std::process::exit(code);
}

/// Traite le lot courant, persiste, et rend le code de sortie :
/// 2 si au moins une demande a été rejetée.
fn run_batch(engine: &mut Engine, storage: &JsonStorage, out_csv: Option<&str>) -> Result<i32> {
    let report = engine.process_all()?;
    print_report(&report);
    storage.save(engine.roster())?;
    if let Some(path) = out_csv {
        io::export_enrollments_csv(path, engine.roster())
            .with_context(|| format!("exporting enrollments to {path}"))?;
    }
    // Code 2 = traité avec rejets
    Ok(if report.rejected.is_empty() { 0 } else { 2 })
}

fn print_report(report: &BatchReport) {
    for entry in &report.accepted {
        println!(
            "accepted | {:?} | {} -> {}",
            entry.request.kind, entry.request.student, entry.request.target
        );
    }
    for rejection in &report.rejected {
        eprintln!(
            "rejected | {:?} | {} -> {} | {}",
            rejection.request.kind,
            rejection.request.student,
            rejection.request.target,
            rejection.reason.as_str()
        );
    }
}

/// Lot de demandes : `Kind,StudentCode,UcCode,ClassCode,FromUc`.
/// Les refus de soumission sont signalés et n'empêchent pas le reste du lot.
fn submit_batch_csv(engine: &mut Engine, path: &str) -> Result<()> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    for rec in rdr.records() {
        let rec = rec?;
        let kind = rec.get(0).context("missing Kind")?.trim();
        let code: u32 = rec
            .get(1)
            .context("missing StudentCode")?
            .trim()
            .parse()
            .context("invalid StudentCode")?;
        let student = StudentId::new(code);
        let course = rec.get(2).context("missing UcCode")?.trim();
        let section = rec.get(3).map(str::trim).unwrap_or("");
        let from_course = rec.get(4).map(str::trim).unwrap_or("");

        let outcome = match kind {
            "enroll" => engine.submit_enroll(student, course, section),
            "withdraw" => engine.submit_withdraw(student, course),
            "change-class" => engine.submit_change_class(student, course, section),
            "change-course" => {
                engine.submit_change_course(student, from_course, course, section)
            }
            other => bail!("unknown request kind: {other}"),
        };
        if let Err(err) = outcome {
            eprintln!("refused at submission | {kind} | {student} | {err}");
        }
    }
    Ok(())
}
