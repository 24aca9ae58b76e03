use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use donezo_sync::filter::counts;
use donezo_sync::{
    config::normalize_api_url, AuthClient, Config, FilterMode, HttpGateway, Session, Todo,
    TodoStore,
};

#[derive(Debug, Parser)]
#[command(name = "donezo-sync", about = "Manage a remote todo list")]
struct Cli {
    /// Backend base URL, overrides DONEZO_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token, overrides DONEZO_TOKEN.
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and print the bearer token.
    Login { email: String, password: String },
    /// Create an account, log in and print the bearer token.
    Register {
        name: String,
        email: String,
        password: String,
    },
    #[command(flatten)]
    Todo(TodoCommand),
}

#[derive(Debug, Subcommand)]
enum TodoCommand {
    /// Show todos.
    List {
        #[arg(long, default_value = "all")]
        filter: FilterMode,
    },
    Add {
        title: String,
        #[arg(default_value = "")]
        description: String,
    },
    /// Mark a todo as completed.
    Done { id: String },
    /// Mark a todo as active again.
    Undo { id: String },
    Edit {
        id: String,
        title: String,
        #[arg(default_value = "")]
        description: String,
    },
    Rm { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = &cli.api_url {
        config.api_url = normalize_api_url(url)?;
    }
    if cli.token.is_some() {
        config.token = cli.token.clone();
    }
    info!(api_url = %config.api_url, "Using backend");

    let auth = AuthClient::new(config.api_url.clone());
    let command = match cli.command {
        Command::Login { email, password } => {
            println!("{}", auth.login(&email, &password).await?);
            return Ok(());
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            println!("{}", auth.register(&name, &email, &password).await?);
            return Ok(());
        }
        Command::Todo(command) => command,
    };

    let session = Session::new();
    match (&config.token, &config.email, &config.password) {
        (Some(token), _, _) => session.sign_in(token.clone()),
        (None, Some(email), Some(password)) => auth
            .sign_in(&session, email, password)
            .await
            .context("logging in")?,
        _ => bail!("set DONEZO_TOKEN or DONEZO_EMAIL and DONEZO_PASSWORD"),
    }

    let gateway = Arc::new(HttpGateway::new(config.api_url.clone()));
    let store = TodoStore::new(gateway, session);
    store.initialize().await?;

    match command {
        TodoCommand::List { filter } => store.set_filter(filter),
        TodoCommand::Add { title, description } => {
            let todo = store.add(&title, &description).await?;
            println!("added {}", todo.id);
        }
        TodoCommand::Done { id } => report(store.toggle(&id, true).await?, &id)?,
        TodoCommand::Undo { id } => report(store.toggle(&id, false).await?, &id)?,
        TodoCommand::Edit {
            id,
            title,
            description,
        } => report(store.edit(&id, &title, &description).await?, &id)?,
        TodoCommand::Rm { id } => {
            if !store.remove(&id).await? {
                bail!("no todo with id {id}");
            }
        }
    }

    render(&store.visible());
    let (active, completed) = counts(&store.todos());
    println!("{active} active, {completed} completed");
    Ok(())
}

fn report(updated: Option<Todo>, id: &str) -> anyhow::Result<()> {
    if updated.is_none() {
        bail!("no todo with id {id}");
    }
    Ok(())
}

fn render(todos: &[Todo]) {
    for todo in todos {
        let mark = if todo.completed { "x" } else { " " };
        match todo.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => println!("[{mark}] {} {} - {description}", todo.id, todo.title),
            None => println!("[{mark}] {} {}", todo.id, todo.title),
        }
    }
}
