use std::path::Path;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use gustdb_common::{CommandError, ConnectionError};
use gustdb_protocol::{Command, Reply};
use gustdb_storage::{Scalar, Store};

use crate::Connection;

/// Loop principal de tratamento de uma conexão.
pub async fn handle_connection(
    mut conn: Connection,
    store: Store,
    dump_file: &Path,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<(), ConnectionError> {
    loop {
        let line = tokio::select! {
            result = conn.read_line() => result?,
            _ = shutdown.recv() => {
                return Ok(());
            }
        };

        let line = match line {
            Some(l) => l,
            None => return Ok(()), // EOF
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = match Command::from_line(&line) {
            Ok(cmd) => {
                debug!("comando recebido: {}", cmd.name());
                execute_command(cmd, &store, dump_file).await
            }
            Err(e) => Reply::error(e),
        };

        conn.write_reply(&response).await?;
    }
}

/// Executa um comando e retorna a resposta.
pub async fn execute_command(cmd: Command, store: &Store, dump_file: &Path) -> Reply {
    match cmd {
        Command::Ping => Reply::Simple("PONG".into()),
        Command::Get(key) => match store.get(&key) {
            Some(value) => Reply::Bulk(value.to_string()),
            None => Reply::Null,
        },
        Command::Set { key, value } => {
            store.set(key, Scalar::Str(value));
            Reply::ok()
        }
        Command::Incr(key) => match store.incr(&key) {
            Ok(n) => Reply::Integer(n),
            Err(e) => Reply::error(e),
        },
        Command::Del(keys) => {
            for key in &keys {
                store.delete(key);
            }
            Reply::ok()
        }
        Command::MGet(keys) => Reply::Array(
            store
                .mget(&keys)
                .into_iter()
                .map(|v| match v {
                    Some(value) => Reply::Bulk(value.to_string()),
                    None => Reply::Null,
                })
                .collect(),
        ),
        Command::MSet(pairs) => {
            store.mset(
                pairs
                    .into_iter()
                    .map(|(key, value)| (key, Scalar::Str(value)))
                    .collect(),
            );
            Reply::ok()
        }
        Command::Flush => {
            store.flush();
            Reply::ok()
        }
        Command::Expire { key, seconds } => {
            let ttl = Duration::from_secs(seconds.max(0) as u64);
            if store.expire(&key, ttl) {
                Reply::Integer(1)
            } else {
                Reply::Integer(0)
            }
        }
        Command::Ttl(key) => Reply::Integer(store.ttl(&key).as_seconds()),
        Command::Save => match store.save_to_file(dump_file).await {
            Ok(_) => Reply::ok(),
            Err(e) => {
                warn!("SAVE falhou: {e}");
                Reply::error(e)
            }
        },
        Command::DbSize => Reply::Integer(store.len() as i64),
        Command::Unknown(name) => Reply::error(CommandError::Unknown(name)),
    }
}
