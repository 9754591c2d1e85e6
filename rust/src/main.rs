//! `pwfile-auth USERNAME` reads a password on stdin and exits 0 when both the
//! username and the password check out. Diagnostics go to stderr only.

use std::io;
use std::process::ExitCode;

use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use log::{error, info};
use pwfile_auth::{CredentialVerifier, SystemIdentity, VerificationResult, VerifierConfig};

#[derive(Parser, Debug)]
#[command(
    name = "pwfile-auth",
    version,
    about = "Check a username and a stdin password against the hash in $RSTUDIO_PASSWORD_FILE"
)]
struct Cli {
    #[arg(
        value_name = "USERNAME",
        value_parser = NonEmptyStringValueParser::new(),
        help = "User name being asserted; must be the invoking user"
    )]
    username: String,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = match VerifierConfig::from_env(cli.username) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::from(err.exit_code());
        }
    };

    let verifier = CredentialVerifier::new(config, SystemIdentity);
    let result = verifier.verify(&mut io::stdin().lock());
    match &result {
        VerificationResult::Authorized => info!("authorized {}", verifier.config().username),
        VerificationResult::Denied => info!("denied {}", verifier.config().username),
        VerificationResult::ConfigurationError(err) => error!("{err}"),
    }
    ExitCode::from(result.exit_code())
}
