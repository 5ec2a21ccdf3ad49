//! CLI surface for the proxy binary: one positional config-file
//! argument, SIGINT/SIGTERM-driven termination, `tracing` initialization,
//! and the wiring from `proxy-config` through `proxy-transport` into
//! `proxy-core`'s `Dispatcher`.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use proxy_config::{ProxyConfig, TransportSpec};
use proxy_core::{Dispatcher, Router, Transport};
use proxy_transport::{ProcessTransport, StdioTransport, TcpTransport};
use tracing_subscriber::EnvFilter;

/// Multiplexes N downstream language servers behind one LSP connection.
#[derive(Parser, Debug)]
#[command(name = "lsp-proxy", version, about)]
struct Args {
	/// Path to the proxy's TOML config file.
	config: std::path::PathBuf,

	/// Override the default `info` log level (e.g. `debug`, `warn`).
	#[arg(long)]
	log_level: Option<String>,
}

fn init_tracing(log_level: Option<&str>) {
	let filter = log_level.map(EnvFilter::new).unwrap_or_else(|| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> ExitCode {
	let args = Args::parse();
	init_tracing(args.log_level.as_deref());

	match run(args).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			tracing::error!(error = %err, "lsp-proxy exiting");
			ExitCode::FAILURE
		}
	}
}

async fn run(args: Args) -> anyhow::Result<()> {
	let config = ProxyConfig::load(&args.config).with_context(|| format!("loading config file {}", args.config.display()))?;

	let router = Router::new(config.servers.iter().map(|s| s.config.clone()).collect())
		.context("constructing router from configured servers")?;

	let mut client_transport: Box<dyn Transport> = Box::new(StdioTransport::new());
	let (client_source, client_sink) = client_transport.connect().await.context("connecting client stdio transport")?;

	let mut server_transports: Vec<Box<dyn Transport>> = Vec::with_capacity(config.servers.len());
	let mut server_halves = Vec::with_capacity(config.servers.len());
	for spec in &config.servers {
		let mut transport: Box<dyn Transport> = match &spec.transport {
			TransportSpec::Process { command, args } => Box::new(ProcessTransport::new(command.clone(), args.clone(), spec.config.display_name.clone())),
			TransportSpec::Tcp { host, port } => Box::new(TcpTransport::new(host.clone(), *port, spec.config.display_name.clone())),
		};
		let halves = transport
			.connect()
			.await
			.with_context(|| format!("connecting to downstream server {:?}", spec.config.display_name))?;
		server_transports.push(transport);
		server_halves.push(halves);
	}

	let mut dispatcher = Dispatcher::new(router, client_transport, client_source, client_sink, server_transports, server_halves);

	tokio::select! {
		result = dispatcher.run() => result.context("dispatcher loop exited with an error"),
		() = wait_for_termination_signal() => {
			tracing::info!("received termination signal, shutting down");
			dispatcher.terminate_all().await;
			Ok(())
		}
	}
}

/// SIGINT/SIGTERM trigger termination. Whichever branch of the
/// `tokio::select!` in `run` wins, `Dispatcher::drop` happens at the end of
/// that scope; a clean exit from the dispatcher loop itself (all servers
/// disconnected) is the more common path and this branch only short-circuits
/// it on an operator-initiated signal.
#[cfg(unix)]
async fn wait_for_termination_signal() {
	use tokio::signal::unix::{signal, SignalKind};

	let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
	let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
	tokio::select! {
		_ = sigint.recv() => {}
		_ = sigterm.recv() => {}
	}
}

#[cfg(not(unix))]
async fn wait_for_termination_signal() {
	let _ = tokio::signal::ctrl_c().await;
}
