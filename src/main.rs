//! A thin interactive front-end over the sync core: it owns no
//! reconciliation logic, only CRUD on the local store plus start/stop of
//! the authenticator and the background sync job. Stands in for a TUI.

mod config;
mod logging;

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use item::{Card, Item, ItemBody, Note, Password};
use remote::{Authenticator, HttpItemClient, InMemoryRemoteStore, RemoteItemClient, SharedToken};
use store::{LocalItem, LocalStore, UpdateItem};
use sync_engine::{JobSupervisor, PeriodicDriver, Reconciler};
use tokio_util::sync::CancellationToken;

use config::Config;

#[derive(Parser)]
#[command(name = "vault", no_binary_name = true)]
enum Command {
    Register { login: String, password: String },
    Login { login: String, password: String },
    Logout,
    AddPassword { resource: String, user_name: String, password: String },
    AddCard { number: String, expires: String, holder: String },
    AddNote { name: String, body: String },
    List,
    Delete { id: String },
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },
    Quit,
}

#[derive(Subcommand)]
enum SyncAction {
    Start,
    Stop,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    logging::init_logging(&config);

    let token = SharedToken::new();
    if config.demo {
        tracing::info!("running against the bundled in-process remote store");
        run(InMemoryRemoteStore::new(token.clone()), token, config).await
    } else {
        let base_url = format!("http://{}", config.address);
        run(HttpItemClient::new(base_url, token.clone()), token, config).await
    }
}

async fn run<C: RemoteItemClient + 'static>(
    client: C,
    token: SharedToken,
    config: Config,
) -> anyhow::Result<()> {
    let client = Arc::new(client);
    let authenticator = Authenticator::new(Arc::clone(&client), token);
    let local = Arc::new(LocalStore::new());
    let request_timeout = Duration::from_secs(config.request_timeout);

    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&local),
        Arc::clone(&client),
        request_timeout,
    ));
    let driver = PeriodicDriver::new(reconciler, Duration::from_secs(config.sync_interval));
    let supervisor = JobSupervisor::new(driver);
    let session = CancellationToken::new();

    repl(local, authenticator, supervisor, session.clone(), request_timeout).await;
    session.cancel();
    Ok(())
}

/// Reads lines on a dedicated OS thread (`BufRead::lines` has no async
/// equivalent on stdin) and races them against ctrl-c, so an interrupt
/// always wins even while a line is mid-read.
fn spawn_stdin_reader() -> tokio::sync::mpsc::Receiver<String> {
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) if tx.blocking_send(line).is_ok() => {}
                _ => break,
            }
        }
    });
    rx
}

async fn repl<C: RemoteItemClient + 'static>(
    local: Arc<LocalStore>,
    authenticator: Authenticator<C>,
    supervisor: JobSupervisor<C>,
    session: CancellationToken,
    request_timeout: Duration,
) {
    let mut lines = spawn_stdin_reader();

    print!("> ");
    io::stdout().flush().ok();

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                tracing::info!("received ctrl-c, shutting down");
                break;
            }
            line = lines.recv() => match line {
                Some(line) => line,
                None => break,
            },
        };

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            print!("> ");
            io::stdout().flush().ok();
            continue;
        }

        match Command::try_parse_from(tokens) {
            Ok(Command::Quit) => break,
            Ok(command) => {
                if let Err(e) = dispatch(command, &local, &authenticator, &supervisor, &session, request_timeout).await {
                    eprintln!("error: {e}");
                }
            }
            Err(e) => eprintln!("{e}"),
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    supervisor.stop().await;
}

async fn dispatch<C: RemoteItemClient + 'static>(
    command: Command,
    local: &Arc<LocalStore>,
    authenticator: &Authenticator<C>,
    supervisor: &JobSupervisor<C>,
    session: &CancellationToken,
    request_timeout: Duration,
) -> anyhow::Result<()> {
    match command {
        Command::Register { login, password } => {
            authenticator.register(&login, &password, request_timeout).await?;
            println!("registered {login}");
        }
        Command::Login { login, password } => {
            authenticator.login(&login, &password, request_timeout).await?;
            println!("logged in as {login}");
        }
        Command::Logout => {
            supervisor.stop().await;
            authenticator.logout();
            local.clear();
            println!("logged out");
        }
        Command::AddPassword { resource, user_name, password } => {
            let body = Item::new(
                ItemBody::Password(Password { resource, user_name, password }),
                Default::default(),
            );
            let id = local.create_item(LocalItem::new(body, Utc::now()));
            println!("{id}");
        }
        Command::AddCard { number, expires, holder } => {
            let body = Item::new(ItemBody::Card(Card { number, expires, holder }), Default::default());
            let id = local.create_item(LocalItem::new(body, Utc::now()));
            println!("{id}");
        }
        Command::AddNote { name, body } => {
            let item = Item::new(ItemBody::Note(Note { name, body }), Default::default());
            let id = local.create_item(LocalItem::new(item, Utc::now()));
            println!("{id}");
        }
        Command::List => {
            for row in local.list_items() {
                println!(
                    "{}\t{}\t{}{}",
                    row.id,
                    row.body.display_name(),
                    if row.remote_id == 0 { "local-only" } else { "synced" },
                    if row.delete_mark { "\tpending-delete" } else { "" }
                );
            }
        }
        Command::Delete { id } => {
            local.update_item(UpdateItem::new(id).delete_mark(true).update_time(Utc::now()))?;
            println!("marked for deletion");
        }
        Command::Sync { action } => match action {
            SyncAction::Start => {
                supervisor.start(session);
                println!("sync started");
            }
            SyncAction::Stop => {
                supervisor.stop().await;
                println!("sync stopped");
            }
        },
        Command::Quit => unreachable!("handled by the caller"),
    }
    Ok(())
}
