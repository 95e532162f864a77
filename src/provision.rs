//! Interactive credential provisioning.
//!
//! Library-side implementation of the `store` / `verify` / `clear` flows a
//! CLI frontend exposes. These are the only places in the system allowed to
//! prompt on the terminal; the dispatcher itself never does, which is why a
//! second-factor challenge during normal dispatch degrades to an error
//! instead of blocking on input.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::auth::{credentials::SERVICE_NAME, Credential, SecretStore, SecretStoreError};
use crate::backend::{CalendarBackend, MailBackend, ReminderBackend};
use crate::dispatch::Dispatcher;
use crate::session::{SessionError, SessionManager};

/// Prompt for the Apple ID and app-specific password and store them.
pub fn store_credentials(store: &dyn SecretStore) -> Result<()> {
    println!("iCloud Bridge - store credentials");
    println!("Enter your Apple ID and an app-specific password.");
    println!("Generate an app-specific password at https://appleid.apple.com");
    println!("(Account > Sign-In and Security > App-Specific Passwords)\n");

    print!("Apple ID (email): ");
    io::stdout().flush().context("failed to flush stdout")?;
    let mut identity = String::new();
    io::stdin()
        .lock()
        .read_line(&mut identity)
        .context("failed to read Apple ID")?;
    let identity = identity.trim();
    if identity.is_empty() {
        bail!("Apple ID cannot be empty");
    }

    let secret = rpassword::prompt_password_stdout("App-specific password: ")
        .context("failed to read password")?;
    let secret = secret.trim();
    if secret.is_empty() {
        bail!("password cannot be empty");
    }

    store
        .set(&Credential {
            identity: identity.to_string(),
            secret: secret.to_string(),
        })
        .context("failed to write credential to the secret store")?;

    info!(identity, "credential stored");
    println!("\nCredentials stored in the OS keychain under service '{SERVICE_NAME}'.");
    println!("Run the verify command to test them.");
    Ok(())
}

/// Remove the stored credential. Reports, rather than fails, when nothing
/// was stored.
pub fn clear_credentials(store: &dyn SecretStore) -> Result<()> {
    match store.delete() {
        Ok(()) => {
            println!("Credentials removed from the OS keychain.");
            Ok(())
        }
        Err(SecretStoreError::NotFound) => {
            println!("No credentials were stored.");
            Ok(())
        }
        Err(err) => Err(err).context("failed to delete credential"),
    }
}

/// Verify the stored credential against every backend and print a
/// per-backend report. Second-factor challenges are resolved here,
/// interactively - the only place in the system that may do so.
///
/// Returns whether every backend checked out.
pub async fn verify_credentials<C, M, R>(dispatcher: &Dispatcher<C, M, R>) -> Result<bool>
where
    C: CalendarBackend,
    M: MailBackend,
    R: ReminderBackend,
{
    println!("Testing stored credentials...\n");

    // Resolve pending 2FA challenges up front so the report below reflects
    // the final state.
    resolve_second_factor(dispatcher.calendar()).await?;
    resolve_second_factor(dispatcher.mail()).await?;

    let report = dispatcher.verify().await;
    for check in &report.checks {
        let mark = if check.ok { "ok" } else { "FAILED" };
        println!("  {:<10} {:<6} {}", check.backend, mark, check.detail);
    }

    println!();
    if report.all_ok() {
        println!("All checks passed - credentials are valid.");
    } else {
        println!("One or more checks failed. Verify your Apple ID and app-specific password.");
        println!("Generate an app-specific password at https://appleid.apple.com");
    }
    Ok(report.all_ok())
}

/// Run the connect path once; if the backend answers with a 2FA challenge,
/// prompt for the code and resume. Other failures are left for the report.
async fn resolve_second_factor<B>(manager: &SessionManager<B>) -> Result<()>
where
    B: crate::backend::Authenticate,
{
    let challenge = match manager.ensure_session().await {
        Err(SessionError::SecondFactor(challenge)) => challenge,
        _ => return Ok(()),
    };

    println!("{} requires a second factor.", manager.kind());
    println!("  {}", challenge.prompt);
    print!("Code ({} digits): ", challenge.expected_length);
    io::stdout().flush().context("failed to flush stdout")?;

    let mut code = String::new();
    io::stdin()
        .lock()
        .read_line(&mut code)
        .context("failed to read second-factor code")?;
    let code = code.trim();
    if code.is_empty() {
        bail!("second-factor code cannot be empty");
    }

    match manager.submit_second_factor(code).await {
        Ok(_) => {
            println!("Second factor accepted; this device is now trusted by the backend.");
            Ok(())
        }
        // Leave the failure to the printed report.
        Err(err) => {
            println!("Second factor not accepted: {err}");
            Ok(())
        }
    }
}
