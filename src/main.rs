use std::collections::BTreeSet;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use log::debug;
use serde::Serialize;

use indhive::AppState;
use indhive::commands::{auth_commands, project_commands, user_commands};
use indhive::config::{RuntimeConfig, StorageMode};
use indhive::error::{AppError, AppResult, SerializableError};
use indhive::models::{Collaborator, Project, ProjectRequest, User, UserRequest};

#[derive(Parser)]
#[command(name = "indhive", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the Indhive API
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Where the session credential is kept: keyring, file or memory
    #[arg(long, global = true, value_name = "MODE")]
    storage: Option<StorageMode>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session credential
    Login {
        email: String,
        #[command(flatten)]
        password: PasswordArg,
        /// Remember the email for the next sign-in
        #[arg(long)]
        remember: bool,
    },
    /// Create a new account
    Register {
        username: String,
        email: String,
        #[command(flatten)]
        password: PasswordArg,
    },
    /// Sign out and clear the stored credential
    Logout,
    /// Show the stored session without contacting the server
    Status,
    /// Show the signed-in account and what it may do
    Whoami,
    /// Exchange the credential for a new one
    Refresh {
        /// Only refresh when the credential expires within this many seconds
        #[arg(long, value_name = "SECS")]
        min_ttl: Option<i64>,
    },
    /// Request the creator role for the signed-in account
    BecomeCreator,
    /// Change the signed-in account's password
    Password {
        #[command(flatten)]
        password: PasswordArg,
    },
    /// Update the signed-in account's username and email
    Profile { username: String, email: String },
    /// Send a password recovery email
    Recover { email: String },
    /// Set a new password with a recovery token
    ResetPassword {
        token: String,
        #[command(flatten)]
        password: PasswordArg,
    },
    /// Project dashboard
    #[command(subcommand)]
    Projects(ProjectCommand),
    /// User administration
    #[command(subcommand)]
    Users(UserCommand),
}

#[derive(Args)]
struct PasswordArg {
    /// Password; read from INDHIVE_PASSWORD when omitted
    #[arg(long, env = "INDHIVE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl PasswordArg {
    fn require(&self) -> AppResult<&str> {
        self.password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                AppError::InvalidArgument(
                    "A password is required (--password or INDHIVE_PASSWORD)".to_string(),
                )
            })
    }
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// List projects, optionally filtered by title
    List {
        #[arg(long)]
        filter: Option<String>,
    },
    Show { id: i64 },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Collaborator user ids
        #[arg(long, value_delimiter = ',')]
        collaborators: Vec<i64>,
    },
    /// Edit a project; omitted fields keep their current value
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_delimiter = ',')]
        collaborators: Option<Vec<i64>>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum UserCommand {
    List {
        #[arg(long)]
        filter: Option<String>,
    },
    Create {
        username: String,
        email: String,
        #[command(flatten)]
        password: PasswordArg,
        /// Comma separated roles, e.g. ROLE_USER,ROLE_CREATOR
        #[arg(long)]
        roles: Option<String>,
    },
    Edit {
        id: i64,
        username: String,
        email: String,
        #[arg(long)]
        roles: Option<String>,
    },
    Delete { id: i64 },
    /// Suggest collaborators matching a name or email
    Search {
        query: String,
        /// User ids already picked
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<i64>,
        #[arg(long, default_value = "5")]
        limit: usize,
    },
    /// Projects a user owns or collaborates on
    Projects { id: i64 },
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce(&T) -> String) -> AppResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", human(value));
    }
    Ok(())
}

fn project_line(project: &Project) -> String {
    let owner = project.owner_username.as_deref().unwrap_or("-");
    format!("#{:<5} {} (owner: {owner})", project.id, project.title)
}

fn user_line(user: &User) -> String {
    let roles = indhive::auth::permissions::display_roles(user.roles.as_ref());
    format!("#{:<5} {:<20} {:<30} {roles}", user.id, user.username, user.email)
}

fn lines<T>(items: &[T], line: fn(&T) -> String, empty: &str) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items.iter().map(line).collect::<Vec<_>>().join("\n")
}

async fn run_projects(state: &AppState, json: bool, command: ProjectCommand) -> AppResult<()> {
    match command {
        ProjectCommand::List { filter } => {
            let projects = project_commands::list_projects(state, filter.as_deref()).await?;
            emit(json, &projects, |p| lines(p, project_line, "No projects"))
        }
        ProjectCommand::Show { id } => {
            let view = project_commands::show_project(state, id).await?;
            emit(json, &view, |v| {
                let collaborators = v
                    .project
                    .collaborators
                    .iter()
                    .map(Collaborator::display_name)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "{}\n{}\ncollaborators: {collaborators}\nactions: {:?}",
                    project_line(&v.project),
                    v.project.description.as_deref().unwrap_or(""),
                    v.actions
                )
            })
        }
        ProjectCommand::Create {
            title,
            description,
            collaborators,
        } => {
            let request = ProjectRequest {
                title,
                description,
                collaborator_ids: collaborators.into_iter().collect(),
            };
            let project = project_commands::create_project(state, &request).await?;
            emit(json, &project, project_line)
        }
        ProjectCommand::Edit {
            id,
            title,
            description,
            collaborators,
        } => {
            let current = project_commands::show_project(state, id).await?.project;
            let request = ProjectRequest {
                title: title.unwrap_or(current.title),
                description: description.or(current.description).unwrap_or_default(),
                collaborator_ids: collaborators.map_or_else(
                    || {
                        current
                            .collaborators
                            .iter()
                            .filter_map(|c| match c {
                                Collaborator::User(user) => Some(user.id),
                                Collaborator::Name(_) => None,
                            })
                            .collect()
                    },
                    |ids| ids.into_iter().collect(),
                ),
            };
            let project = project_commands::edit_project(state, id, &request).await?;
            emit(json, &project, project_line)
        }
        ProjectCommand::Delete { id } => {
            let remaining = project_commands::delete_project(state, id).await?;
            emit(json, &remaining, |p| {
                format!("Deleted project {id}\n{}", lines(p, project_line, "No projects left"))
            })
        }
    }
}

async fn run_users(state: &AppState, json: bool, command: UserCommand) -> AppResult<()> {
    match command {
        UserCommand::List { filter } => {
            let users = user_commands::list_users(state, filter.as_deref()).await?;
            emit(json, &users, |u| lines(u, user_line, "No users"))
        }
        UserCommand::Create {
            username,
            email,
            password,
            roles,
        } => {
            let request = UserRequest {
                username,
                email,
                password: Some(password.require()?.to_string()),
                roles,
            };
            let user = user_commands::create_user(state, &request).await?;
            emit(json, &user, user_line)
        }
        UserCommand::Edit {
            id,
            username,
            email,
            roles,
        } => {
            let request = UserRequest {
                username,
                email,
                password: None,
                roles,
            };
            let user = user_commands::edit_user(state, id, &request).await?;
            emit(json, &user, user_line)
        }
        UserCommand::Delete { id } => {
            let remaining = user_commands::delete_user(state, id).await?;
            emit(json, &remaining, |u| {
                format!("Deleted user {id}\n{}", lines(u, user_line, "No users left"))
            })
        }
        UserCommand::Search {
            query,
            exclude,
            limit,
        } => {
            let selected: BTreeSet<i64> = exclude.into_iter().collect();
            let found = user_commands::search_users(state, &query, &selected, limit)
                .await?
                .unwrap_or_default();
            emit(json, &found, |u| lines(u, user_line, "No matching users"))
        }
        UserCommand::Projects { id } => {
            let projects = user_commands::user_projects(state, id).await?;
            emit(json, &projects, |p| {
                format!(
                    "Owned:\n{}\nCollaborating:\n{}",
                    lines(&p.owned_projects, project_line, "  none"),
                    lines(&p.collaborated_projects, project_line, "  none")
                )
            })
        }
    }
}

async fn run(state: &AppState, json: bool, command: Command) -> AppResult<()> {
    match command {
        Command::Login {
            email,
            password,
            remember,
        } => {
            let summary = auth_commands::login(state, &email, password.require()?, remember).await?;
            emit(json, &summary, |s| {
                format!("Signed in as {}", s.subject.as_deref().unwrap_or(&email))
            })
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let user = auth_commands::register(state, &username, &email, password.require()?).await?;
            emit(json, &user, |u| format!("Registered {} ({})", u.username, u.email))
        }
        Command::Logout => {
            auth_commands::logout(state).await?;
            emit(json, &serde_json::json!({ "signedOut": true }), |_| {
                "Signed out".to_string()
            })
        }
        Command::Status => {
            let summary = auth_commands::session_status(state);
            emit(json, &summary, |s| {
                let mut out = format!("Session: {}", s.status);
                if let Some(subject) = &s.subject {
                    out.push_str(&format!("\nSubject: {subject}"));
                }
                if let Some(expires_at) = s.expires_at {
                    out.push_str(&format!("\nExpires: {expires_at}"));
                }
                if !s.roles.is_empty() {
                    out.push_str(&format!("\nRoles: {}", s.roles));
                }
                out
            })
        }
        Command::Whoami => {
            let profile = auth_commands::whoami(state).await?;
            emit(json, &profile, |p| {
                format!("{}\nactions: {:?}", user_line(&p.user), p.actions)
            })
        }
        Command::Refresh { min_ttl } => {
            let summary = auth_commands::refresh(state, min_ttl).await?;
            emit(json, &summary, |s| match s.expires_at {
                Some(expires_at) => format!("Session valid until {expires_at}"),
                None => format!("Session: {}", s.status),
            })
        }
        Command::BecomeCreator => {
            let elevation = auth_commands::become_creator(state).await?;
            emit(json, &elevation, |_| "Creator role granted".to_string())
        }
        Command::Password { password } => {
            auth_commands::change_password(state, password.require()?).await?;
            emit(json, &serde_json::json!({ "passwordChanged": true }), |_| {
                "Password changed".to_string()
            })
        }
        Command::Profile { username, email } => {
            let summary = auth_commands::update_profile(state, &username, &email).await?;
            emit(json, &summary, |_| format!("Profile updated for {username}"))
        }
        Command::Recover { email } => {
            auth_commands::recover_password(state, &email).await?;
            emit(json, &serde_json::json!({ "sent": true }), |_| {
                format!("Recovery instructions sent to {email}")
            })
        }
        Command::ResetPassword { token, password } => {
            auth_commands::reset_password(state, &token, password.require()?).await?;
            emit(json, &serde_json::json!({ "reset": true }), |_| {
                "Password reset".to_string()
            })
        }
        Command::Projects(command) => run_projects(state, json, command).await,
        Command::Users(command) => run_users(state, json, command).await,
    }
}

fn report(json: bool, err: &AppError) {
    debug!("Command failed: {err:?}");
    let serializable = SerializableError::from(err);
    if json {
        match serde_json::to_string_pretty(&serializable) {
            Ok(body) => eprintln!("{body}"),
            Err(_) => eprintln!("{err}"),
        }
    } else {
        eprintln!("error: {}", serializable.message);
        if let Some(details) = serializable.details {
            eprintln!("{details}");
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    // RUST_LOG=debug for request-level logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(Some(env_logger::fmt::TimestampPrecision::Millis))
        .format_module_path(true)
        .format_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = RuntimeConfig::from_env().for_single_command();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(storage) = cli.storage {
        config.storage_mode = storage;
    }
    debug!("Using {} storage against {}", config.storage_mode, config.api_url);

    let outcome = match config.validate().and_then(|()| AppState::new(config)) {
        Ok(state) => run(&state, cli.json, cli.command).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(cli.json, &err);
            if err.requires_login() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
