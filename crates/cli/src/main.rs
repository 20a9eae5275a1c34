use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use fisio_advisory::{
    Advisor, AdvisoryConfig, AssistantRole, JointAngles, OllamaClient, PatientSnapshot,
};
use fisio_core::config::{
    app_version_from_env_value, credential_iterations_from_env_value, data_dir_from_env_value,
};
use fisio_core::dosage::dosage_volume_ml;
use fisio_core::records::{Appointment, AppointmentType, ClinicalNote, NoteType, Patient, Vitals};
use fisio_core::{
    ClinicianDirectory, CoreConfig, DocumentStore, Environment, EnvironmentSelector, FileStore,
    NonEmptyText, PainLevel, PatientPatch, Registration, SaveOutcome, Session,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fisio")]
#[command(about = "Fisio clinical records CLI")]
struct Cli {
    /// Data directory (overrides FISIO_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum NoteKind {
    Evolution,
    WorkPlan,
    General,
}

impl From<NoteKind> for NoteType {
    fn from(kind: NoteKind) -> Self {
        match kind {
            NoteKind::Evolution => NoteType::Evolution,
            NoteKind::WorkPlan => NoteType::WorkPlan,
            NoteKind::General => NoteType::General,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum VisitKind {
    Treatment,
    Review,
    Assessment,
    HomeVisit,
}

impl From<VisitKind> for AppointmentType {
    fn from(kind: VisitKind) -> Self {
        match kind {
            VisitKind::Treatment => AppointmentType::Treatment,
            VisitKind::Review => AppointmentType::Review,
            VisitKind::Assessment => AppointmentType::Assessment,
            VisitKind::HomeVisit => AppointmentType::HomeVisit,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Audience {
    Clinician,
    Patient,
}

impl From<Audience> for AssistantRole {
    fn from(audience: Audience) -> Self {
        match audience {
            Audience::Clinician => AssistantRole::Clinician,
            Audience::Patient => AssistantRole::Patient,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Records(RecordCommand),
    /// Register a clinician account
    Register {
        #[arg(long)]
        name: String,
        /// Professional registration number or national id
        #[arg(long)]
        professional_id: String,
        #[arg(long)]
        specialty: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: String,
    },
    /// Check clinician credentials
    Login {
        professional_id: String,
        password: String,
    },
    /// Show the recovery question for an account
    Question { professional_id: String },
    /// Reset a password using the security answer
    ResetPassword {
        professional_id: String,
        answer: String,
        new_password: String,
    },
    /// Show the demo dataset (nothing is saved)
    Demo,
    /// Ask the global assistant
    Ask {
        message: String,
        #[arg(long = "as", value_enum, default_value = "clinician")]
        audience: Audience,
    },
    /// Posture feedback for an exercise from joint angles in degrees
    Posture {
        /// Exercise being performed
        exercise: String,
        #[arg(long)]
        shoulder: f64,
        #[arg(long)]
        elbow: f64,
        #[arg(long)]
        hip: f64,
        #[arg(long)]
        knee: f64,
    },
    /// Weight-based dose volume in ml
    Dose {
        /// Weight in kg
        weight: f64,
        /// Dose in mg/kg
        dose: f64,
        /// Concentration in mg/ml
        concentration: f64,
    },
}

/// Commands that run against the Real session.
#[derive(Subcommand)]
enum RecordCommand {
    /// List all patients
    List,
    /// Show one patient as JSON
    Show {
        /// Patient id
        id: String,
    },
    /// Create a patient
    Create {
        /// Full name
        name: String,
        /// Explicit id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        condition: Option<String>,
        #[arg(long)]
        diagnosis: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Weight in kg
        #[arg(long)]
        weight: Option<f64>,
        /// Height in cm
        #[arg(long)]
        height: Option<f64>,
    },
    /// Apply a JSON patch, e.g. '{"diagnosis":"...","progress":60}'
    Update {
        /// Patient id
        id: String,
        /// camelCase JSON object with the fields to replace
        patch: String,
    },
    /// Add a clinical note
    Note {
        /// Patient id
        patient_id: String,
        /// Note text
        content: String,
        #[arg(long, value_enum, default_value = "general")]
        kind: NoteKind,
        /// Pain level 1-10
        #[arg(long, default_value_t = 5)]
        pain: i64,
        #[arg(long, default_value = "Fisio")]
        author: String,
        /// Weight in kg measured this session (evolution notes)
        #[arg(long)]
        weight: Option<f64>,
        /// Height in cm measured this session (evolution notes)
        #[arg(long)]
        height: Option<f64>,
        #[arg(long)]
        heart_rate: Option<u32>,
        #[arg(long)]
        blood_pressure: Option<String>,
    },
    /// List the exercise catalog
    Catalog,
    /// Replace a patient's plan with catalog exercises
    Assign {
        /// Patient id
        patient_id: String,
        /// Catalog exercise ids
        #[arg(required = true)]
        exercise_ids: Vec<String>,
    },
    /// Delete a patient and their appointments
    Delete {
        /// Patient id
        id: String,
    },
    /// Book an appointment
    Book {
        /// Patient id
        patient_id: String,
        /// Date (YYYY-MM-DD)
        date: String,
        /// Time (HH:MM)
        time: String,
        #[arg(long, value_enum, default_value = "treatment")]
        kind: VisitKind,
    },
    /// List appointments
    Appointments {
        /// Only this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Only this patient id
        #[arg(long)]
        patient: Option<String>,
    },
    /// Write every collection to disk now
    Save,
    /// Export a full backup
    Export {
        /// Output file (defaults to fisio_backup_<date>.json)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import a backup, replacing current patients
    Import {
        /// Backup file
        file: PathBuf,
        /// Confirm the replacement
        #[arg(long)]
        yes: bool,
    },
    /// Ask the assistant a question on behalf of a patient
    Advise {
        /// Patient id
        patient_id: String,
        question: String,
    },
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("fisio=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("No command given. Run `fisio --help` for usage.");
        return Ok(());
    };

    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| data_dir_from_env_value(env_value("FISIO_DATA_DIR")));
    let cfg = Arc::new(CoreConfig::new(
        data_dir,
        app_version_from_env_value(env_value("FISIO_APP_VERSION")),
        credential_iterations_from_env_value(env_value("FISIO_CREDENTIAL_ITERATIONS"))?,
    )?);
    let store: Arc<dyn DocumentStore> =
        Arc::new(FileStore::from_config(&cfg).context("opening data directory")?);
    let selector = EnvironmentSelector::new(cfg, store);

    match command {
        Commands::Register {
            name,
            professional_id,
            specialty,
            password,
            question,
            answer,
        } => {
            let registration = Registration {
                name: NonEmptyText::new(name)?,
                professional_id: NonEmptyText::new(professional_id)?,
                specialty: NonEmptyText::new(specialty)?,
                password: NonEmptyText::new(password)?,
                security_question: NonEmptyText::new(question)?,
                security_answer: NonEmptyText::new(answer)?,
            };
            let profile = selector.clinicians().register(registration)?;
            println!("Registered {} ({})", profile.name, profile.professional_id);
        }
        Commands::Login {
            professional_id,
            password,
        } => {
            let profile = selector.clinicians().login(&professional_id, &password)?;
            println!("Welcome, {} ({})", profile.name, profile.specialty);
        }
        Commands::Question { professional_id } => {
            println!("{}", selector.clinicians().security_question(&professional_id)?);
        }
        Commands::ResetPassword {
            professional_id,
            answer,
            new_password,
        } => {
            reset_password(&selector.clinicians(), &professional_id, &answer, new_password)?;
            println!("Password updated for {}", professional_id);
        }
        Commands::Dose {
            weight,
            dose,
            concentration,
        } => match dosage_volume_ml(weight, dose, concentration) {
            Some(ml) => println!("{:.2} ml ({:.2} mg total)", ml, weight * dose),
            None => bail!("weight and dose must be non-negative and concentration positive"),
        },
        Commands::Demo => {
            let session = selector.select(Environment::Demo);
            print_patients(&session);
            for appointment in session.appointments() {
                print_appointment(appointment);
            }
        }
        Commands::Ask { message, audience } => {
            let advisor = advisor()?;
            println!("{}", advisor.ask_global(&message, audience.into()));
        }
        Commands::Posture {
            exercise,
            shoulder,
            elbow,
            hip,
            knee,
        } => {
            let angles = JointAngles {
                shoulder,
                elbow,
                hip,
                knee,
            };
            println!("{}", advisor()?.posture_feedback(&angles, &exercise));
        }
        Commands::Records(command) => {
            let mut session = selector.select(Environment::Real);
            for warning in session.hydration_warnings() {
                eprintln!("Warning: {}", warning);
            }
            run_session_command(&mut session, command)?;
        }
    }

    Ok(())
}

fn reset_password(
    clinicians: &ClinicianDirectory,
    professional_id: &str,
    answer: &str,
    new_password: String,
) -> anyhow::Result<()> {
    let new_password = NonEmptyText::new(new_password).context("new password is required")?;
    clinicians.reset_password(professional_id, answer, new_password)?;
    Ok(())
}

fn run_session_command(session: &mut Session, command: RecordCommand) -> anyhow::Result<()> {
    match command {
        RecordCommand::List => print_patients(session),
        RecordCommand::Show { id } => {
            let patient = session.patient(&id)?;
            println!("{}", serde_json::to_string_pretty(patient)?);
        }
        RecordCommand::Create {
            name,
            id,
            age,
            condition,
            diagnosis,
            phone,
            email,
            weight,
            height,
        } => {
            let name = NonEmptyText::new(name)?;
            let mut patient = match id {
                Some(id) => Patient::with_id(id, name),
                None => Patient::new(name),
            };
            patient.age = age.unwrap_or_default();
            patient.condition = condition.unwrap_or_default();
            patient.diagnosis = diagnosis.unwrap_or_default();
            patient.phone = phone.unwrap_or_default();
            patient.email = email.unwrap_or_default();
            patient.admission_date = chrono::Local::now().format("%Y-%m-%d").to_string();
            patient.vital_signs =
                Vitals::with_body(weight.unwrap_or_default(), height.unwrap_or_default());

            let applied = session.add_patient(patient)?;
            println!("Created patient {} ({})", applied.value.name, applied.value.id);
            report_save(&applied.save);
        }
        RecordCommand::Update { id, patch } => {
            let patch: PatientPatch =
                serde_json::from_str(&patch).context("patch must be a JSON object")?;
            if patch.is_empty() {
                bail!("patch contains no known fields");
            }
            let applied = session.update_patient(&id, patch)?;
            println!("Updated patient {}", applied.value.id);
            report_save(&applied.save);
        }
        RecordCommand::Note {
            patient_id,
            content,
            kind,
            pain,
            author,
            weight,
            height,
            heart_rate,
            blood_pressure,
        } => {
            let note_type = NoteType::from(kind);
            let mut note = ClinicalNote::new(note_type, content, author, PainLevel::new(pain));
            if note_type == NoteType::Evolution {
                let mut vitals = session.patient(&patient_id)?.vital_signs.clone();
                if let Some(weight) = weight {
                    vitals.weight = weight;
                }
                if let Some(height) = height {
                    vitals.height = height;
                }
                if let Some(heart_rate) = heart_rate {
                    vitals.heart_rate = heart_rate;
                }
                if let Some(blood_pressure) = blood_pressure {
                    vitals.blood_pressure = blood_pressure;
                }
                note = note.with_vitals(vitals);
            }

            let applied = session.add_note(&patient_id, note)?;
            println!(
                "Note added to {} ({} notes, BMI {:.2})",
                applied.value.name,
                applied.value.notes.len(),
                applied.value.vital_signs.bmi
            );
            report_save(&applied.save);
        }
        RecordCommand::Catalog => {
            for exercise in session.catalog().exercises() {
                println!(
                    "{:>3}  {:<28} {:<12} {}",
                    exercise.id,
                    exercise.title,
                    format!("{:?}", exercise.category),
                    exercise.reps
                );
            }
        }
        RecordCommand::Assign {
            patient_id,
            exercise_ids,
        } => {
            let ids: Vec<&str> = exercise_ids.iter().map(String::as_str).collect();
            let applied = session.assign_from_catalog(&patient_id, &ids)?;
            println!(
                "{} now has {} assigned exercises",
                applied.value.name,
                applied.value.assigned_exercises.len()
            );
            report_save(&applied.save);
        }
        RecordCommand::Delete { id } => {
            let applied = session.remove_patient(&id)?;
            println!(
                "Deleted patient {} and {} appointments",
                applied.value.patient.id, applied.value.appointments_removed
            );
            report_save(&applied.save);
        }
        RecordCommand::Book {
            patient_id,
            date,
            time,
            kind,
        } => {
            let patient = session.patient(&patient_id)?;
            let appointment = Appointment::for_patient(patient, date, time, kind.into());
            let applied = session.add_appointment(appointment)?;
            print_appointment(&applied.value);
            report_save(&applied.save);
        }
        RecordCommand::Appointments { date, patient } => {
            let matching = session.appointments().iter().filter(|a| {
                date.as_deref().map_or(true, |d| a.date == d)
                    && patient.as_deref().map_or(true, |p| a.patient_id == p)
            });
            let mut any = false;
            for appointment in matching {
                any = true;
                print_appointment(appointment);
            }
            if !any {
                println!("No appointments found.");
            }
        }
        RecordCommand::Save => {
            let outcome = session.force_save();
            if let SaveOutcome::Failed { key, error } = &outcome {
                bail!("save failed for {key}: {error}");
            }
            report_save(&outcome);
        }
        RecordCommand::Export { out } => {
            let export = session.export();
            let path = out.unwrap_or_else(|| PathBuf::from(export.file_name()));
            std::fs::write(&path, export.to_json_pretty()?)
                .with_context(|| format!("writing {}", path.display()))?;
            println!(
                "Exported {} patients and {} appointments to {}",
                export.patients.len(),
                export.appointments.len(),
                path.display()
            );
        }
        RecordCommand::Import { file, yes } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let pending = session.stage_import(&raw)?;
            let appointments = pending
                .appointment_count()
                .map_or_else(|| "no appointments".to_string(), |n| format!("{n} appointments"));
            println!(
                "Backup holds {} patients and {} (version {})",
                pending.patient_count(),
                appointments,
                pending.version().unwrap_or("unknown")
            );
            if !yes {
                println!(
                    "This replaces the current {} patients. Re-run with --yes to confirm.",
                    session.patients().len()
                );
                return Ok(());
            }
            let outcome = session.confirm_import(pending);
            println!("Import applied.");
            report_save(&outcome);
        }
        RecordCommand::Advise {
            patient_id,
            question,
        } => {
            let snapshot = PatientSnapshot::from(session.patient(&patient_id)?);
            let advisor = advisor()?;
            println!("{}", advisor.spawn(question, snapshot).wait());
        }
    }
    Ok(())
}

fn advisor() -> anyhow::Result<Advisor> {
    let cfg = AdvisoryConfig::from_env_values(
        env_value("FISIO_LLM_URL"),
        env_value("FISIO_LLM_MODEL"),
        env_value("FISIO_LLM_TIMEOUT_SECS"),
    )?;
    let client = OllamaClient::new(&cfg)?;
    Ok(Advisor::new(Arc::new(client)))
}

fn print_patients(session: &Session) {
    if session.patients().is_empty() {
        println!("No patients found.");
        return;
    }
    for patient in session.patients() {
        println!(
            "ID: {}, Name: {}, Condition: {}, Progress: {}, BMI: {:.2}, Last session: {}",
            patient.id,
            patient.name,
            patient.condition,
            patient.progress,
            patient.vital_signs.bmi,
            patient.last_session
        );
    }
}

fn print_appointment(appointment: &Appointment) {
    println!(
        "{} {} {:?} {} ({})",
        appointment.date,
        appointment.time,
        appointment.appointment_type,
        appointment.patient_name,
        appointment.patient_id
    );
}

fn report_save(outcome: &SaveOutcome) {
    match outcome {
        SaveOutcome::Saved { at } => {
            println!("Saved at {}", at.with_timezone(&chrono::Local).format("%H:%M:%S"));
        }
        SaveOutcome::Skipped => {}
        SaveOutcome::Failed { key, error } => {
            eprintln!("Warning: changes kept in memory only ({key}): {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_evolution_note() {
        let cli = Cli::try_parse_from([
            "fisio", "note", "a1", "Mejoría", "--kind", "evolution", "--weight", "58", "--pain",
            "3",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Records(RecordCommand::Note {
                patient_id,
                kind,
                weight,
                pain,
                ..
            })) => {
                assert_eq!(patient_id, "a1");
                assert!(matches!(kind, NoteKind::Evolution));
                assert_eq!(weight, Some(58.0));
                assert_eq!(pain, 3);
            }
            _ => panic!("expected note command"),
        }
    }

    #[test]
    fn test_import_requires_explicit_confirmation_flag() {
        let cli = Cli::try_parse_from(["fisio", "import", "backup.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Records(RecordCommand::Import { yes: false, .. }))
        ));
    }

    #[test]
    fn test_account_commands_do_not_open_a_session() {
        let cli = Cli::try_parse_from(["fisio", "question", "COL-123"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Question { .. })));

        let cli = Cli::try_parse_from(["fisio", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Records(RecordCommand::List))
        ));
    }

    #[test]
    fn test_parses_posture_angles() {
        let cli = Cli::try_parse_from([
            "fisio", "posture", "Sentadilla", "--shoulder", "90", "--elbow", "170", "--hip",
            "95", "--knee", "88",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Posture { knee, .. }) if knee == 88.0
        ));
    }
}
