mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use client::config::{ConfigError, ConsoleConfig};
use client::net::error::ApiError;
use client::net::types::{KycKind, RegisterRequest};
use client::pages::ViewError;
use client::pages::doctor_add::{DoctorAddPage, DoctorForm};
use client::pages::doctors::{DoctorChanges, DoctorListPage, DoctorProfilePage};
use client::pages::kyc::{KycDetailPage, KycListPage};
use client::pages::login::{LoginForm, LoginPage};
use client::pages::reports::Report;
use client::pages::user_add::{UserAddPage, UserForm};
use client::pages::users::{UserChanges, UserListPage, UserProfilePage};
use client::pages::Rendered;
use client::pages::wizard::{Wizard, WizardForm};
use client::state::approval::Decision;
use client::state::list::{ListError, ListQuery, SortDirection};
use client::state::storage::StorageError;
use client::{ApiClient, FileStorage, Session, Storage};
use serde_json::Value;
use tracing::Level;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{}", .0.display_message())]
    Api(#[from] ApiError),
    #[error("{0}")]
    View(#[from] ViewError),
    #[error("{0}")]
    List(#[from] ListError),
    #[error("session storage: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("not logged in; run `petadmin login` (would redirect to {login})")]
    NotLoggedIn { login: String },
    #[error("step {step} is incomplete: {errors}")]
    Form { step: String, errors: String },
    #[error("{0}")]
    Page(String),
}

#[derive(Parser, Debug)]
#[command(name = "petadmin", about = "Pet-services marketplace admin console")]
struct Cli {
    #[arg(long, global = true, env = "PETADMIN_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, global = true, env = "PETADMIN_STORAGE_PATH")]
    storage: Option<PathBuf>,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Log to stderr; repeat for more detail.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        return_to: Option<String>,
    },
    Logout,
    Whoami,
    Register(RegisterArgs),
    Doctors(DoctorsCommand),
    Kyc(KycCommand),
    Users(UsersCommand),
    Reports,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    password: String,
}

#[derive(Args, Debug, Clone)]
struct ListArgs {
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    sort: Option<String>,
    #[arg(long, default_value_t = false)]
    desc: bool,
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[arg(long)]
    page_size: Option<usize>,
}

impl ListArgs {
    fn query(&self, config: &ConsoleConfig) -> ListQuery {
        ListQuery {
            search: self.search.clone().unwrap_or_default(),
            status: self.status.clone(),
            sort: self.sort.clone(),
            direction: if self.desc { SortDirection::Desc } else { SortDirection::Asc },
            page: self.page,
            page_size: self.page_size.unwrap_or(config.page_size),
        }
    }
}

#[derive(Args, Debug)]
struct DoctorsCommand {
    #[command(subcommand)]
    command: DoctorsSubcommand,
}

#[derive(Subcommand, Debug)]
enum DoctorsSubcommand {
    List(ListArgs),
    Show {
        doctor_id: String,
    },
    Approve {
        doctor_id: String,
    },
    Reject {
        doctor_id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    Add(DoctorAddArgs),
    /// Edit profile fields. Only the flags given are sent; an empty value
    /// clears an optional field.
    Update(DoctorUpdateArgs),
}

#[derive(Args, Debug)]
struct DoctorUpdateArgs {
    doctor_id: String,
    #[arg(long)]
    license_number: Option<String>,
    #[arg(long, help = "YYYY-MM-DD")]
    license_expiry: Option<String>,
    #[arg(long)]
    qualification: Option<String>,
    #[arg(long)]
    specialization: Option<String>,
    #[arg(long)]
    experience_years: Option<String>,
    #[arg(long)]
    consultation_fee: Option<String>,
    #[arg(long)]
    clinic_name: Option<String>,
    #[arg(long)]
    clinic_address: Option<String>,
}

#[derive(Args, Debug)]
struct DoctorAddArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    license_number: String,
    #[arg(long, help = "YYYY-MM-DD")]
    license_expiry: String,
    #[arg(long)]
    specialization: String,
    #[arg(long, default_value = "")]
    qualification: String,
    #[arg(long, default_value = "")]
    experience_years: String,
    #[arg(long)]
    consultation_fee: String,
    #[arg(long)]
    clinic_name: String,
    #[arg(long, default_value = "")]
    clinic_address: String,
}

#[derive(Args, Debug)]
struct KycCommand {
    #[command(subcommand)]
    command: KycSubcommand,
}

#[derive(Subcommand, Debug)]
enum KycSubcommand {
    /// Known kinds: metavet-groomer, metavet-walker, metavet-behaviourist,
    /// groomer-client, walker-client, behaviourist-client.
    List {
        kind: KycKind,
        #[command(flatten)]
        filters: ListArgs,
    },
    Show {
        kind: KycKind,
        kyc_id: String,
    },
    Approve {
        kind: KycKind,
        kyc_id: String,
    },
    Reject {
        kind: KycKind,
        kyc_id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Save one uploaded document of a submission.
    Document {
        kind: KycKind,
        kyc_id: String,
        doc_type: String,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List(ListArgs),
    Show {
        user_id: String,
    },
    Enable {
        user_id: String,
    },
    Disable {
        user_id: String,
    },
    Add(UserAddArgs),
    /// Edit account fields. Only the flags given are sent; an empty phone
    /// clears it.
    Update(UserUpdateArgs),
}

#[derive(Args, Debug)]
struct UserUpdateArgs {
    user_id: String,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    role: Option<String>,
}

#[derive(Args, Debug)]
struct UserAddArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "CLIENT")]
    role: String,
    #[arg(long)]
    password: String,
    #[arg(long, default_value_t = false)]
    disabled: bool,
}

struct Console {
    config: ConsoleConfig,
    session: Session,
    json: bool,
}

impl Console {
    fn open(cli: &Cli) -> Result<Self, CliError> {
        let mut config = ConsoleConfig::from_env()?;
        if let Some(base_url) = &cli.base_url {
            config.api_base_url = base_url.trim_end_matches('/').to_owned();
        }
        if let Some(path) = &cli.storage {
            config.storage_path.clone_from(path);
        }
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(config.storage_path.clone()));
        let api = ApiClient::new(&config, storage)?;
        let mut session = Session::new(api, &config);
        session.bootstrap();
        Ok(Self { config, session, json: cli.json })
    }

    fn api(&self) -> &ApiClient {
        self.session.api()
    }

    /// Refuse guarded commands while anonymous, like the console's route guard.
    fn require_login(&self, route: &str) -> Result<(), CliError> {
        match self.session.guard(&self.config.route(route)) {
            Some(redirect) => Err(CliError::NotLoggedIn { login: redirect.to }),
            None => Ok(()),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!(error = ?error, "command failed");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(level).with_target(false).init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut console = Console::open(&cli)?;
    match cli.command {
        Command::Login { email, password, return_to } => run_login(&mut console, email, password, return_to).await,
        Command::Logout => {
            let redirect = console.session.logout()?;
            println!("logged out; next: {}", redirect.to);
            Ok(())
        }
        Command::Whoami => run_whoami(&console),
        Command::Register(args) => run_register(&mut console, args).await,
        Command::Doctors(doctors) => run_doctors(&console, doctors.command).await,
        Command::Kyc(kyc) => run_kyc(&console, kyc.command).await,
        Command::Users(users) => run_users(&console, users.command).await,
        Command::Reports => {
            console.require_login("reports")?;
            let report = Report::load(console.api()).await;
            if console.json {
                return print_json(&serde_json::to_value(&report)?);
            }
            print!("{}", render::report(&report));
            Ok(())
        }
    }
}

async fn run_login(
    console: &mut Console,
    email: String,
    password: String,
    return_to: Option<String>,
) -> Result<(), CliError> {
    let mut page = LoginPage::new(return_to.as_deref());
    page.form = LoginForm { email, password };
    let redirect = page.submit(&mut console.session).await?;
    let name = console.session.user().map(client::net::types::User::display_name).unwrap_or_default();
    println!("logged in as {name}; next: {}", redirect.to);
    Ok(())
}

fn run_whoami(console: &Console) -> Result<(), CliError> {
    console.require_login("dashboard")?;
    let Some(user) = console.session.user() else {
        return Err(CliError::NotLoggedIn { login: console.config.route("login") });
    };
    if console.json {
        return print_json(&serde_json::to_value(user)?);
    }
    print!("{}", render::user_detail(user));
    Ok(())
}

async fn run_register(console: &mut Console, args: RegisterArgs) -> Result<(), CliError> {
    let request = RegisterRequest {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        phone: args.phone,
        password: args.password,
    };
    let redirect = console.session.register(&request).await?;
    println!("registered; next: {}", redirect.to);
    Ok(())
}

async fn run_doctors(console: &Console, command: DoctorsSubcommand) -> Result<(), CliError> {
    console.require_login("doctors")?;
    let api = console.api();
    match command {
        DoctorsSubcommand::List(filters) => {
            let mut page = DoctorListPage::default();
            page.list.query = filters.query(&console.config);
            page.load(api).await;
            match page.list.render()? {
                Rendered::Ready(view) if console.json => print_json(&serde_json::to_value(&view.rows)?),
                Rendered::Ready(view) => {
                    print!("{}", render::doctor_table(&view));
                    println!("{}", render::page_footer(&view));
                    Ok(())
                }
                other => Err(not_ready(other)),
            }
        }
        DoctorsSubcommand::Show { doctor_id } => {
            let mut page = DoctorProfilePage::new(Some(&doctor_id));
            page.load(api).await;
            match page.detail.render() {
                Rendered::Ready(doctor) if console.json => print_json(&serde_json::to_value(doctor)?),
                Rendered::Ready(doctor) => {
                    print!("{}", render::doctor_detail(doctor));
                    Ok(())
                }
                other => Err(not_ready(other)),
            }
        }
        DoctorsSubcommand::Approve { doctor_id } => review_doctor(api, &doctor_id, Decision::Approve, None).await,
        DoctorsSubcommand::Reject { doctor_id, reason } => {
            review_doctor(api, &doctor_id, Decision::Reject, reason).await
        }
        DoctorsSubcommand::Add(args) => {
            let mut page = DoctorAddPage::new(DoctorForm {
                first_name: args.first_name,
                last_name: args.last_name,
                email: args.email,
                phone: args.phone,
                password: args.password,
                license_number: args.license_number,
                license_expiry: args.license_expiry,
                qualification: args.qualification,
                specialization: args.specialization,
                experience_years: args.experience_years,
                consultation_fee: args.consultation_fee,
                clinic_name: args.clinic_name,
                clinic_address: args.clinic_address,
            });
            let result = page.submit(api).await;
            let created = wizard_result(&page, result)?;
            print_created(console, "doctor", &created, "doctorId")
        }
        DoctorsSubcommand::Update(args) => {
            let changes = DoctorChanges {
                license_number: args.license_number,
                license_expiry: args.license_expiry,
                qualification: args.qualification,
                specialization: args.specialization,
                experience_years: args.experience_years,
                consultation_fee: args.consultation_fee,
                clinic_name: args.clinic_name,
                clinic_address: args.clinic_address,
            };
            let mut page = DoctorProfilePage::new(Some(&args.doctor_id));
            page.load(api).await;
            if let Some(error) = &page.detail.load_error {
                return Err(CliError::Page(error.clone()));
            }
            page.update(api, &changes).await?;
            match page.detail.render() {
                Rendered::Ready(doctor) if console.json => print_json(&serde_json::to_value(doctor)?),
                Rendered::Ready(doctor) => {
                    print!("{}", render::doctor_detail(doctor));
                    Ok(())
                }
                other => Err(not_ready(other)),
            }
        }
    }
}

async fn review_doctor(
    api: &ApiClient,
    doctor_id: &str,
    decision: Decision,
    reason: Option<String>,
) -> Result<(), CliError> {
    let mut page = DoctorProfilePage::new(Some(doctor_id));
    page.load(api).await;
    if let Some(error) = &page.detail.load_error {
        return Err(CliError::Page(error.clone()));
    }
    let status = page.decide(api, decision, reason).await?;
    println!("doctor {doctor_id} is now {status}");
    Ok(())
}

async fn run_kyc(console: &Console, command: KycSubcommand) -> Result<(), CliError> {
    console.require_login("kyc")?;
    let api = console.api();
    match command {
        KycSubcommand::List { kind, filters } => {
            let mut page = KycListPage::new(kind);
            page.list.query = filters.query(&console.config);
            page.load(api).await;
            match page.list.render()? {
                Rendered::Ready(view) if console.json => print_json(&serde_json::to_value(&view.rows)?),
                Rendered::Ready(view) => {
                    println!("{}", kind.label());
                    print!("{}", render::kyc_table(&view));
                    println!("{}", render::page_footer(&view));
                    Ok(())
                }
                other => Err(not_ready(other)),
            }
        }
        KycSubcommand::Show { kind, kyc_id } => {
            let mut page = KycDetailPage::new(kind, Some(&kyc_id));
            page.load(api).await;
            match page.detail.render() {
                Rendered::Ready(record) if console.json => print_json(&serde_json::to_value(record)?),
                Rendered::Ready(record) => {
                    print!("{}", render::kyc_detail(record, &page.extra_fields()));
                    Ok(())
                }
                other => Err(not_ready(other)),
            }
        }
        KycSubcommand::Approve { kind, kyc_id } => review_kyc(api, kind, &kyc_id, Decision::Approve, None).await,
        KycSubcommand::Reject { kind, kyc_id, reason } => {
            review_kyc(api, kind, &kyc_id, Decision::Reject, reason).await
        }
        KycSubcommand::Document { kind, kyc_id, doc_type, out } => {
            let mut page = KycDetailPage::new(kind, Some(&kyc_id));
            page.load(api).await;
            if let Some(error) = &page.detail.load_error {
                return Err(CliError::Page(error.clone()));
            }
            let document = page.download_document(api, &doc_type).await?;
            std::fs::write(&out, &document.bytes).map_err(|source| CliError::Write { path: out.clone(), source })?;
            let content_type = document.content_type.as_deref().unwrap_or("unknown type");
            println!("saved {} bytes ({content_type}) to {}", document.bytes.len(), out.display());
            Ok(())
        }
    }
}

async fn review_kyc(
    api: &ApiClient,
    kind: KycKind,
    kyc_id: &str,
    decision: Decision,
    reason: Option<String>,
) -> Result<(), CliError> {
    let mut page = KycDetailPage::new(kind, Some(kyc_id));
    page.load(api).await;
    if let Some(error) = &page.detail.load_error {
        return Err(CliError::Page(error.clone()));
    }
    let status = page.decide(api, decision, reason).await?;
    println!("{} submission {kyc_id} is now {status}", kind.label());
    Ok(())
}

async fn run_users(console: &Console, command: UsersSubcommand) -> Result<(), CliError> {
    console.require_login("users")?;
    let api = console.api();
    match command {
        UsersSubcommand::List(filters) => {
            let mut page = UserListPage::default();
            page.list.query = filters.query(&console.config);
            page.load(api).await;
            match page.list.render()? {
                Rendered::Ready(view) if console.json => print_json(&serde_json::to_value(&view.rows)?),
                Rendered::Ready(view) => {
                    print!("{}", render::user_table(&view));
                    println!("{}", render::page_footer(&view));
                    Ok(())
                }
                other => Err(not_ready(other)),
            }
        }
        UsersSubcommand::Show { user_id } => {
            let mut page = UserProfilePage::new(Some(&user_id));
            page.load(api).await;
            match page.detail.render() {
                Rendered::Ready(user) if console.json => print_json(&serde_json::to_value(user)?),
                Rendered::Ready(user) => {
                    print!("{}", render::user_detail(user));
                    Ok(())
                }
                other => Err(not_ready(other)),
            }
        }
        UsersSubcommand::Enable { user_id } => set_enabled(api, &user_id, true).await,
        UsersSubcommand::Disable { user_id } => set_enabled(api, &user_id, false).await,
        UsersSubcommand::Add(args) => {
            let mut page = UserAddPage::new(UserForm {
                first_name: args.first_name,
                last_name: args.last_name,
                email: args.email,
                phone: args.phone,
                role: args.role,
                password: args.password,
                enabled: !args.disabled,
            });
            let result = page.submit(api).await;
            let created = wizard_result(&page, result)?;
            print_created(console, "user", &created, "id")
        }
        UsersSubcommand::Update(args) => {
            let changes = UserChanges {
                first_name: args.first_name,
                last_name: args.last_name,
                email: args.email,
                phone: args.phone,
                role: args.role,
            };
            let mut page = UserProfilePage::new(Some(&args.user_id));
            page.load(api).await;
            if let Some(error) = &page.detail.load_error {
                return Err(CliError::Page(error.clone()));
            }
            page.update(api, &changes).await?;
            match page.detail.render() {
                Rendered::Ready(user) if console.json => print_json(&serde_json::to_value(user)?),
                Rendered::Ready(user) => {
                    print!("{}", render::user_detail(user));
                    Ok(())
                }
                other => Err(not_ready(other)),
            }
        }
    }
}

async fn set_enabled(api: &ApiClient, user_id: &str, enabled: bool) -> Result<(), CliError> {
    let mut page = UserProfilePage::new(Some(user_id));
    page.load(api).await;
    if let Some(error) = &page.detail.load_error {
        return Err(CliError::Page(error.clone()));
    }
    let now = page.set_enabled(api, enabled).await?;
    println!("user {user_id} is now {}", if now { "enabled" } else { "disabled" });
    Ok(())
}

/// Name the step that failed validation instead of a bare field list.
fn wizard_result<F: WizardForm>(page: &Wizard<F>, result: Result<Value, ViewError>) -> Result<Value, CliError> {
    match result {
        Err(ViewError::Invalid(errors)) => {
            let (position, steps) = page.position();
            Err(CliError::Form { step: format!("{position}/{steps} ({:?})", page.step()), errors: errors.to_string() })
        }
        other => Ok(other?),
    }
}

fn print_created(console: &Console, noun: &str, created: &Value, id_key: &str) -> Result<(), CliError> {
    if console.json {
        return print_json(created);
    }
    match created.get(id_key) {
        Some(Value::String(id)) => println!("created {noun} {id}"),
        Some(id) if !id.is_null() => println!("created {noun} {id}"),
        _ => println!("created {noun}"),
    }
    Ok(())
}

fn not_ready<T>(rendered: Rendered<T>) -> CliError {
    match rendered {
        Rendered::Error(message) => CliError::Page(message),
        Rendered::Loading | Rendered::Ready(_) => CliError::Page("nothing to show".to_owned()),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
