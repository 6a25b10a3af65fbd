//! `gems` — GEMS 1.4 command-line client and demo device server.

mod device;
mod render;

use anyhow::Context;
use clap::{Parser, Subcommand};
use device::DemoDevice;
use gems_client::{ClientError, GemsClient, Psm};
use gems_protocol::{ConnectionType, DisconnectReason, Message};
use gems_server::{AsciiServer, XmlServer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// GEMS 1.4 client and demo server.
#[derive(Parser)]
#[command(name = "gems")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ground Equipment Monitoring and control System (GEMS) tooling", long_about = None)]
struct Cli {
    /// Platform Specific Module: ascii or xml
    #[arg(long, global = true, default_value = "ascii", env = "GEMS_PSM")]
    psm: String,

    /// Server address as host:port
    #[arg(long, global = true, default_value = "127.0.0.1:33400", env = "GEMS_ADDR")]
    addr: String,

    /// Connect using TLS
    #[arg(long, global = true)]
    tls: bool,

    /// Allow self-signed certificates when connecting using TLS
    #[arg(long, global = true)]
    insecure: bool,

    /// GEMS authentication token
    #[arg(long, global = true, default_value = "")]
    token: String,

    /// Name of the target device
    #[arg(long, global = true, default_value = "")]
    target: String,

    /// Username for GEMS authentication
    #[arg(long, global = true, default_value = "")]
    user: String,

    /// Password for GEMS authentication
    #[arg(long, global = true, default_value = "")]
    pass: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the demo device server
    Serve {
        /// Require this token on incoming connections; empty disables the
        /// check
        #[arg(long, default_value = "")]
        auth_token: String,
    },
    /// Send a PingMessage
    Ping,
    /// Request parameters; no names requests the full configuration
    GetConfig { names: Vec<String> },
    /// Write parameters given in GEMS-ASCII form, e.g. 'Rate:int=200'
    SetConfig {
        #[arg(required = true)]
        parameters: Vec<String>,
    },
    /// List the named configurations stored on the device
    GetConfigList,
    /// Replace the live configuration with a stored one
    LoadConfig { name: String },
    /// Store the live configuration under a name
    SaveConfig { name: String },
    /// Invoke a named directive with optional GEMS-ASCII arguments
    Directive { name: String, args: Vec<String> },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let psm = Psm::parse(&cli.psm).context("invalid --psm value")?;

    if let Command::Serve { auth_token } = &cli.command {
        let auth_token = auth_token.clone();
        return serve(psm, &cli.addr, &auth_token).await;
    }
    run_client(psm, cli).await
}

async fn serve(psm: Psm, addr: &str, auth_token: &str) -> anyhow::Result<()> {
    let handler = DemoDevice::new().into_handler();
    let auth_token = (!auth_token.is_empty()).then(|| auth_token.to_string());

    match psm {
        Psm::Ascii => {
            let server = AsciiServer::bind(addr, handler, auth_token)
                .await
                .context("failed to start listener")?;
            info!(addr = %server.local_addr()?, "server listening");
            server.run().await?;
        }
        Psm::Xml => {
            let server =
                XmlServer::bind(addr, handler, auth_token).context("failed to start listener")?;
            info!(addr = %server.local_addr(), "server listening");
            server.run().await?;
        }
    }
    Ok(())
}

async fn run_client(psm: Psm, cli: Cli) -> anyhow::Result<()> {
    let mut client = GemsClient::new(psm);

    let token = session_token(&cli);
    let connected = if cli.tls {
        client
            .connect_tls(
                &cli.addr,
                ConnectionType::ControlAndStatus,
                &token,
                &cli.target,
                cli.insecure,
            )
            .await
    } else {
        client
            .connect(
                &cli.addr,
                ConnectionType::ControlAndStatus,
                &token,
                &cli.target,
            )
            .await
    };
    connected.context("failed to connect to server")?;
    info!(addr = %client.server_addr(), "connected");

    let outcome = match &cli.command {
        Command::Ping => client.ping().await,
        Command::GetConfig { names } => client.get_config(names.clone()).await,
        Command::SetConfig { parameters } => client.set_config(parameters).await,
        Command::GetConfigList => client.get_config_list().await,
        Command::LoadConfig { name } => client.load_config(name).await,
        Command::SaveConfig { name } => client.save_config(name).await,
        Command::Directive { name, args } => client.directive(name, args).await,
        Command::Serve { .. } => unreachable!("serve is dispatched in main"),
    };

    let status = report(outcome);
    if let Err(e) = client.disconnect(DisconnectReason::NormalTermination).await {
        warn!(error = %e, "disconnect failed");
    }
    status
}

/// Print the response (or the response attached to a failure). A response
/// with a non-success result still reaches the console before the command
/// exits nonzero.
fn report(outcome: Result<Message, ClientError>) -> anyhow::Result<()> {
    match outcome {
        Ok(resp) => {
            tracing::debug!("{}", render::render_message(&resp));
            println!("{}", render::render_response(&resp));
            Ok(())
        }
        Err(e) => {
            if let Some(resp) = e.response() {
                tracing::debug!("{}", render::render_message(resp));
                println!("{}", render::render_response(resp));
            }
            Err(e.into())
        }
    }
}

/// Derive the session token: explicit `--token` wins, otherwise `--user` and
/// `--pass` combine into the `up:<user>:<pass>` form.
fn session_token(cli: &Cli) -> String {
    let user = cli.user.trim();
    let pass = cli.pass.trim();
    let unusable = |s: &str| s.is_empty() || s.eq_ignore_ascii_case("none");
    if !unusable(user) && !unusable(pass) {
        return format!("up:{user}:{pass}");
    }
    cli.token.clone()
}
