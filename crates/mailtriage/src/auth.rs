// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mailtriage auth` command implementation.
//!
//! Installed-app OAuth flow: print the consent URL, read back the code (or
//! the whole redirected URL) from stdin, exchange it and store the token.

use std::path::Path;

use mailtriage_config::TriageConfig;
use mailtriage_core::TriageError;
use mailtriage_gmail::auth::{ClientSecrets, authorization_url, exchange_code, extract_code, new_state};
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run_auth(config: &TriageConfig) -> Result<(), TriageError> {
    let secrets = ClientSecrets::load(Path::new(&config.gmail.credentials_path)).await?;
    let state = new_state();
    let url = authorization_url(&secrets, &state)?;

    println!("Open this URL in a browser and grant access:\n\n  {url}\n");
    println!("Then paste the authorization code, or the full URL you were redirected to:");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .map_err(|e| TriageError::Auth(format!("failed to read authorization code: {e}")))?;
    let code = extract_code(&line, &state)?;

    let http = reqwest::Client::new();
    let user = exchange_code(&http, &secrets, &code).await?;
    let token_path = Path::new(&config.gmail.token_path);
    user.save(token_path).await?;

    println!("Token saved to {}", token_path.display());
    Ok(())
}
