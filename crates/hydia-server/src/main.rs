// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Hydia vault server binary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hydia_server::{generation_policy, init_tracing, version, AppState};
use hydia_server_config::{load_config, load_config_with_file, ServerConfig};
use hydia_server_vault::{encode_key, generate, generate_key, GenerationPolicy};

/// Hydia - multi-tenant password vault server.
#[derive(Parser, Debug)]
#[command(name = "hydia-server", about = "Hydia password vault server", version)]
struct Cli {
	/// Path to a TOML config file (defaults to /etc/hydia/server.toml)
	#[arg(long, short, global = true, env = "HYDIA_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Validate configuration, open the database and run until Ctrl-C
	Serve,
	/// Print generated passwords
	Generate(GenerateArgs),
	/// Print a fresh base64 encryption key
	Keygen,
	/// Show version and build information
	Version,
}

#[derive(Args, Debug)]
struct GenerateArgs {
	/// Password length (defaults to generator.length)
	#[arg(long, short)]
	length: Option<usize>,

	#[arg(long)]
	no_uppercase: bool,

	#[arg(long)]
	no_lowercase: bool,

	#[arg(long)]
	no_numbers: bool,

	#[arg(long)]
	no_symbols: bool,

	/// Drop look-alike characters (il1Lo0O)
	#[arg(long)]
	exclude_similar: bool,

	/// Number of passwords to print
	#[arg(long, short = 'n', default_value_t = 1)]
	count: usize,
}

impl GenerateArgs {
	fn apply(&self, mut policy: GenerationPolicy) -> GenerationPolicy {
		if let Some(length) = self.length {
			policy.length = length;
		}
		policy.include_uppercase &= !self.no_uppercase;
		policy.include_lowercase &= !self.no_lowercase;
		policy.include_numbers &= !self.no_numbers;
		policy.include_symbols &= !self.no_symbols;
		policy.exclude_similar |= self.exclude_similar;
		policy
	}
}

fn load(cli: &Cli) -> Result<ServerConfig> {
	let config = match &cli.config {
		Some(path) => load_config_with_file(path)
			.with_context(|| format!("failed to load config from {}", path.display()))?,
		None => load_config().context("failed to load config")?,
	};
	Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	match cli.command.as_ref().unwrap_or(&Command::Serve) {
		Command::Version => {
			println!("{}", version::format_version_info());
			Ok(())
		}
		Command::Keygen => {
			println!("{}", encode_key(&generate_key()).expose());
			Ok(())
		}
		Command::Generate(args) => {
			let config = load(&cli)?;
			let policy = args.apply(generation_policy(&config.generator));
			for _ in 0..args.count {
				println!("{}", generate(&policy)?);
			}
			Ok(())
		}
		Command::Serve => serve(load(&cli)?).await,
	}
}

async fn serve(config: ServerConfig) -> Result<()> {
	init_tracing(&config.logging);

	tracing::info!(database = %config.database.url, "starting hydia-server");

	let state = AppState::build(&config)
		.await
		.context("failed to start hydia-server")?;

	tokio::signal::ctrl_c()
		.await
		.context("failed to listen for shutdown signal")?;
	tracing::info!("Received shutdown signal");

	state.pool.close().await;
	tracing::info!("Server shutdown complete");
	Ok(())
}
