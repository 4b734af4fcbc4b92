use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use gustdb_common::{DEFAULT_DUMP_FILE, DEFAULT_HOST, DEFAULT_PORT, MAX_CONNECTIONS};
use gustdb_server::{ServerConfig, run};
use gustdb_storage::Store;

#[derive(Parser, Debug)]
#[command(name = "gustdb-server", about = "GustDB, in-memory key-value store")]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, short, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Arquivo de dump carregado no startup e gravado no SAVE/shutdown
    #[arg(long, short, value_name = "FILE", default_value = DEFAULT_DUMP_FILE)]
    dump_file: PathBuf,
    #[arg(long, default_value_t = MAX_CONNECTIONS)]
    max_connections: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gustdb_server=info,gustdb_storage=info".into()),
        )
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let store = Store::new();

    match store.load_from_file(&args.dump_file).await {
        Ok(count) => info!("{count} chaves restauradas de {:?}", args.dump_file),
        Err(e) if e.is_not_found() => {
            info!("arquivo de dump não encontrado, iniciando sem dados");
        }
        Err(e) => warn!("falha ao carregar {:?}: {e}", args.dump_file),
    }

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            error!("porta {} já está em uso", args.port);
            return Err(e).context(format!("falha ao escutar em {addr}"));
        }
        Err(e) => return Err(e).context(format!("falha ao escutar em {addr}")),
    };
    info!("GustDB escutando em {addr}");

    let config = ServerConfig {
        dump_file: args.dump_file.clone(),
        max_connections: args.max_connections,
    };
    run(listener, store.clone(), config, shutdown_signal()).await;

    info!("salvando dados em {:?}", args.dump_file);
    if let Err(e) = store.save_to_file(&args.dump_file).await {
        error!("falha ao salvar dump: {e}");
    }

    Ok(())
}

/// Completa no Ctrl-C ou, em unix, no SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("falha ao instalar handler de Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("falha ao instalar handler de SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal recebido");
}
