//! HerbalDoc - command-line front end for doctors.
//!
//! Sign in, view the profile, and review patient consultation requests
//! against the HerbalDoc API.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use herbaldoc_core::models::{LoginForm, SignupForm};
use herbaldoc_core::utils::{format_optional, truncate_string};
use herbaldoc_core::{ApiClient, ApiError, Config};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "\
Usage: herbaldoc <command>

Commands:
  login [email]   Sign in and store the session
  signup          Create a doctor account
  profile         Show the signed-in doctor
  requests        List patient consultation requests
  logout          Forget the stored session
  status          Show whether a session is stored";

/// Column width for patient names in the request list
const NAME_WIDTH: usize = 24;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let mut config = Config::load()?;
    let session = config.open_session()?;
    let client = ApiClient::with_session(&config.api_base_url, session)?;
    info!(command = %command, base_url = %client.base_url(), "herbaldoc starting");

    let result = match command.as_str() {
        "login" => login(&client, &mut config, args.get(1).cloned()).await,
        "signup" => signup(&client).await,
        "profile" => profile(&client).await,
        "requests" => requests(&client).await,
        "logout" => {
            if client.logout() {
                println!("Logged out.");
            } else {
                eprintln!("Could not clear the stored session.");
            }
            Ok(())
        }
        "status" => {
            if client.session().is_authenticated() {
                println!("Signed in.");
            } else {
                println!("Not signed in.");
            }
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
    Ok(())
}

/// Print a classified error the way the app would alert it
fn report(error: &ApiError) {
    eprintln!("Error: {}", error);
    if error.is_unauthorized() {
        eprintln!("Session expired. Please log in again with `herbaldoc login`.");
    }
}

fn prompt(label: &str) -> Result<String, ApiError> {
    print!("{}: ", label);
    io::stdout()
        .flush()
        .map_err(|e| ApiError::Unknown(e.to_string()))?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| ApiError::Unknown(e.to_string()))?;
    Ok(line.trim().to_string())
}

fn prompt_password() -> Result<String, ApiError> {
    rpassword::prompt_password("Password: ").map_err(|e| ApiError::Unknown(e.to_string()))
}

async fn login(client: &ApiClient, config: &mut Config, email: Option<String>) -> Result<(), ApiError> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email")?,
    };
    let password = prompt_password()?;

    let auth = client.login(&LoginForm::new(email.clone(), password)).await?;

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "Failed to save config");
    }

    println!("{}", auth.message.as_deref().unwrap_or("Logged in."));
    Ok(())
}

async fn signup(client: &ApiClient) -> Result<(), ApiError> {
    let form = SignupForm {
        name: prompt("Name")?,
        phone_number: prompt("Phone number")?,
        email: prompt("Email")?,
        nmr_number: prompt("NMR number")?,
        password: prompt_password()?,
        specialization: prompt("Specialization")?,
        about_me: prompt("About me (optional)")?,
    };

    let auth = client.signup(&form).await?;
    println!("{}", auth.message.as_deref().unwrap_or("Account created."));
    Ok(())
}

async fn profile(client: &ApiClient) -> Result<(), ApiError> {
    let doctor = client.load_profile().await?;
    println!("HELLO, DR. {}", doctor.first_name().unwrap_or("").to_uppercase());
    println!();
    println!("{}", doctor.summary());
    Ok(())
}

async fn requests(client: &ApiClient) -> Result<(), ApiError> {
    let requests = client.patient_requests().await?;
    if requests.is_empty() {
        println!("No patient requests.");
        return Ok(());
    }

    for request in &requests {
        println!(
            "{:<6} {:<width$} {:<10} {:<12} {}",
            request.priority().to_string(),
            truncate_string(&format_optional(request.patient_name.as_deref(), "-"), NAME_WIDTH),
            format_optional(request.status.as_deref(), "-"),
            request.requested_at_display(),
            format_optional(request.patient_phone_number.as_deref(), ""),
            width = NAME_WIDTH,
        );
    }
    Ok(())
}
