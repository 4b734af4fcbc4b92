use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{Semaphore, broadcast};
use tracing::{error, info};

use gustdb_storage::Store;

use crate::{Connection, handle_connection};

/// Parâmetros do loop de aceitação.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Destino do comando SAVE.
    pub dump_file: PathBuf,
    pub max_connections: usize,
}

/// Aceita conexões até `shutdown` completar. Cada conexão roda em sua própria
/// task e recebe o sinal de shutdown via broadcast.
pub async fn run(
    listener: TcpListener,
    store: Store,
    config: ServerConfig,
    shutdown: impl Future<Output = ()>,
) {
    let semaphore = Arc::new(Semaphore::new(config.max_connections));
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let dump_file: Arc<PathBuf> = Arc::new(config.dump_file);
    tokio::pin!(shutdown);

    loop {
        let permit = tokio::select! {
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(p) => p,
                Err(_) => break,
            },
            _ = &mut shutdown => break,
        };

        let (socket, addr) = tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok(v) => v,
                    Err(e) => {
                        error!("erro ao aceitar conexão: {e}");
                        continue;
                    }
                }
            }
            _ = &mut shutdown => break,
        };

        info!("nova conexão: {addr}");
        let store = store.clone();
        let dump_file = dump_file.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();

        tokio::spawn(async move {
            let conn = Connection::new(socket);
            if let Err(e) = handle_connection(conn, store, &dump_file, &mut shutdown_rx).await {
                error!("erro na conexão {addr}: {e}");
            }
            info!("conexão encerrada: {addr}");
            drop(permit);
        });
    }

    info!("parando de aceitar conexões");
    drop(shutdown_tx);
}
