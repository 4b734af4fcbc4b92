use std::sync::Weak;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;

use crate::store::Shared;

/// Timer de expiração de uma chave.
///
/// O `id` identifica qual agendamento é o atual para a chave: um timer que
/// já acordou mas foi substituído encontra outro id na tabela e não faz nada.
/// Descartar o `Timer` aborta a task.
pub(crate) struct Timer {
    id: u64,
    handle: JoinHandle<()>,
}

impl Timer {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Agenda a remoção de `key` após `delay`.
pub(crate) fn schedule(shared: Weak<Shared>, key: String, id: u64, delay: Duration) -> Timer {
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Some(shared) = shared.upgrade() {
            shared.fire_timer(&key, id);
        }
    });
    Timer { id, handle }
}

/// Resultado de uma consulta de TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Chave inexistente ou já expirada.
    Missing,
    /// Chave sem expiração.
    Persistent,
    Remaining(Duration),
}

impl Ttl {
    pub(crate) fn from_expiration(expires_at: Option<SystemTime>, now: SystemTime) -> Ttl {
        match expires_at {
            None => Ttl::Persistent,
            Some(at) => match at.duration_since(now) {
                Ok(left) => Ttl::Remaining(left),
                Err(_) => Ttl::Missing,
            },
        }
    }

    /// Código numérico no estilo Redis: -2, -1 ou segundos restantes.
    pub fn as_seconds(&self) -> i64 {
        match self {
            Ttl::Missing => -2,
            Ttl::Persistent => -1,
            Ttl::Remaining(left) => left.as_secs() as i64,
        }
    }
}
