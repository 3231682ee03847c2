use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use menu_recognition::{load_settings, GeminiClient, MenuRecognitionClient};
use order_session::{
    CaptureOptions, Confirmation, ImageCapture, OrderSession, RecognitionOutcome, SessionError,
    EMPTY_RECOGNITION_MESSAGE,
};
use shared::domain::SessionState;
use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;
mod views;

use commands::{is_yes, parse_command, Command, HELP};

#[derive(Parser, Debug)]
#[command(name = "menu-lens", about = "Photograph a Japanese menu, translate it, and order")]
struct Cli {
    /// Overrides the configured model.
    #[arg(long)]
    model: Option<String>,
    /// Language dishes are translated into.
    #[arg(long)]
    target_language: Option<String>,
    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Interactive ordering session, optionally starting with some photos.
    Order { photos: Vec<PathBuf> },
    /// Recognize photos once and print the dishes as JSON.
    Recognize {
        #[arg(required = true)]
        photos: Vec<PathBuf>,
    },
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings()?;
    if let Some(model) = cli.model {
        settings.model = model;
    }
    if let Some(target_language) = cli.target_language {
        settings.target_language = target_language;
    }
    let capture_options = CaptureOptions {
        max_edge: settings.max_image_edge,
    };
    let client = GeminiClient::new(settings).context("failed to build recognition client")?;

    match cli.command {
        Mode::Recognize { photos } => recognize_once(&client, capture_options, &photos).await,
        Mode::Order { photos } => run_order(&client, capture_options, &photos).await,
    }
}

async fn recognize_once(
    client: &GeminiClient,
    options: CaptureOptions,
    photos: &[PathBuf],
) -> Result<()> {
    client.check_ready()?;
    let mut capture = ImageCapture::new(options);
    for photo in photos {
        capture.add_file(photo)?;
    }
    let dishes = client.recognize(&capture.payloads()).await?;
    if dishes.is_empty() {
        bail!(EMPTY_RECOGNITION_MESSAGE);
    }
    println!("{}", serde_json::to_string_pretty(&dishes)?);
    Ok(())
}

async fn run_order(
    client: &GeminiClient,
    options: CaptureOptions,
    photos: &[PathBuf],
) -> Result<()> {
    if let Err(err) = client.check_ready() {
        warn!(error = %err, "recognition is not configured; photos can be collected but not submitted");
        eprintln!("⚠ {err}");
    }

    let mut session = OrderSession::new(options);
    for photo in photos {
        if let Err(err) = session.add_image_file(photo) {
            eprint!("{}", views::render_session_error(&err));
        }
    }

    let mut input = BufReader::new(stdin()).lines();
    println!("{HELP}\n");
    print!("{}", views::render(&session));

    loop {
        let Some(line) = prompt(&mut input, "> ").await? else {
            break;
        };
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("! {err}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(err) = apply(&mut session, client, command, &mut input).await {
            match err.downcast_ref::<SessionError>() {
                Some(rejected) => print!("{}", views::render_session_error(rejected)),
                None => println!("! {err:#}"),
            }
            continue;
        }
        print!("{}", views::render(&session));
    }
    Ok(())
}

async fn apply(
    session: &mut OrderSession,
    client: &GeminiClient,
    command: Command,
    input: &mut Input,
) -> Result<()> {
    match command {
        Command::AddPhoto(path) => {
            session.add_image_file(&path)?;
        }
        Command::RemovePhoto(image_id) => {
            session.remove_image(image_id)?;
        }
        Command::ListPhotos | Command::Show => {}
        Command::Submit => {
            if session.state() == SessionState::Capturing && !session.images().is_empty() {
                print!("{}", views::render_processing(session.images().len()));
            }
            if let RecognitionOutcome::Recognized { dishes } = session.submit_images(client).await? {
                println!("Recognized {dishes} dish(es).");
            }
        }
        Command::Increase { dish_id, by } => {
            session.update_quantity(dish_id, by)?;
        }
        Command::Decrease { dish_id, by } => {
            session.update_quantity(dish_id, -by)?;
        }
        Command::Checkout => session.checkout()?,
        Command::Back => {
            let confirmation = if session.state() == SessionState::Browsing {
                confirm(input, "Go back and scan again? Your current selection will be cleared.")
                    .await?
            } else {
                Confirmation::Declined
            };
            session.go_back(confirmation)?;
        }
        Command::Reset => {
            let confirmation = match session.state() {
                SessionState::Browsing | SessionState::ReviewingOrder => {
                    confirm(input, "Start a new order?").await?
                }
                _ => Confirmation::Declined,
            };
            session.start_over(confirmation)?;
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

async fn confirm(input: &mut Input, question: &str) -> Result<Confirmation> {
    let answer = prompt(input, &format!("{question} [y/N] ")).await?;
    Ok(match answer {
        Some(answer) if is_yes(&answer) => Confirmation::Confirmed,
        _ => Confirmation::Declined,
    })
}

async fn prompt(input: &mut Input, text: &str) -> Result<Option<String>> {
    use std::io::Write as _;

    print!("{text}");
    std::io::stdout().flush().context("failed to flush stdout")?;
    input.next_line().await.context("failed to read stdin")
}
