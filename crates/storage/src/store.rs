use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;
use tracing::debug;

use gustdb_common::StorageError;

use crate::entry::{Entry, KeyInfo, Scalar};
use crate::expire::{Timer, Ttl, schedule};

/// Mapa de chaves + tabela de timers, protegidos pelo mesmo lock.
#[derive(Default)]
pub(crate) struct State {
    pub entries: HashMap<String, Entry>,
    timers: HashMap<String, Timer>,
    next_timer_id: u64,
}

/// Estado compartilhado entre todas as conexões e timers.
pub(crate) struct Shared {
    pub state: RwLock<State>,
    /// Serializa SAVE/LOAD entre si.
    pub persist_lock: tokio::sync::Mutex<()>,
}

impl Shared {
    /// Callback de um timer que disparou. Só remove a chave se o timer
    /// ainda for o agendamento atual dela.
    pub fn fire_timer(&self, key: &str, id: u64) {
        let mut state = self.state.write();
        if state.timers.get(key).is_some_and(|t| t.id() == id) {
            state.timers.remove(key);
            state.entries.remove(key);
            debug!("key expirada removida: {key}");
        }
    }
}

/// Handle para o store in-memory.
///
/// Clonar é barato; todos os clones compartilham o mesmo estado. Criar timers
/// exige um runtime Tokio ativo.
#[derive(Clone)]
pub struct Store {
    pub(crate) shared: Arc<Shared>,
}

impl Store {
    pub fn new() -> Self {
        Store {
            shared: Arc::new(Shared {
                state: RwLock::new(State::default()),
                persist_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    // --- Leitura ---

    pub fn get(&self, key: &str) -> Option<Scalar> {
        let state = self.shared.state.read();
        live_entry(&state, key, SystemTime::now()).map(|e| e.value.clone())
    }

    pub fn mget(&self, keys: &[String]) -> Vec<Option<Scalar>> {
        let state = self.shared.state.read();
        let now = SystemTime::now();
        keys.iter()
            .map(|key| live_entry(&state, key, now).map(|e| e.value.clone()))
            .collect()
    }

    /// Valor e expiração absoluta de uma chave viva.
    pub fn key_info(&self, key: &str) -> Option<KeyInfo> {
        let state = self.shared.state.read();
        live_entry(&state, key, SystemTime::now()).map(|e| KeyInfo {
            value: e.value.clone(),
            expires_at: e.expires_at,
        })
    }

    pub fn ttl(&self, key: &str) -> Ttl {
        let state = self.shared.state.read();
        let now = SystemTime::now();
        match state.entries.get(key) {
            Some(entry) => Ttl::from_expiration(entry.expires_at, now),
            None => Ttl::Missing,
        }
    }

    /// Número de chaves vivas.
    pub fn len(&self) -> usize {
        let state = self.shared.state.read();
        let now = SystemTime::now();
        state
            .entries
            .values()
            .filter(|e| !e.is_expired_at(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // --- Escrita ---

    /// Upsert incondicional; remove qualquer TTL anterior.
    pub fn set(&self, key: String, value: Scalar) {
        let mut state = self.shared.state.write();
        self.put(&mut state, key, value, None);
    }

    /// Upsert com TTL. `ttl` zero equivale a [`Store::set`].
    pub fn set_with_ttl(&self, key: String, value: Scalar, ttl: Duration) {
        let ttl = (!ttl.is_zero()).then_some(ttl);
        let mut state = self.shared.state.write();
        self.put(&mut state, key, value, ttl);
    }

    pub fn mset(&self, pairs: Vec<(String, Scalar)>) {
        let mut state = self.shared.state.write();
        for (key, value) in pairs {
            self.put(&mut state, key, value, None);
        }
    }

    /// Remove a chave e seu timer. Retorna se havia algo para remover.
    pub fn delete(&self, key: &str) -> bool {
        let mut state = self.shared.state.write();
        state.timers.remove(key);
        state.entries.remove(key).is_some()
    }

    pub fn incr(&self, key: &str) -> Result<i64, StorageError> {
        let mut state = self.shared.state.write();
        let now = SystemTime::now();

        if let Some(entry) = state.entries.get_mut(key)
            && !entry.is_expired_at(now)
        {
            let n = entry.value.as_integer().ok_or(StorageError::NotAnInteger)?;
            let new_val = n.checked_add(1).ok_or(StorageError::NotAnInteger)?;
            entry.value = Scalar::Int(new_val);
            return Ok(new_val);
        }

        self.put(&mut state, key.to_string(), Scalar::Int(1), None);
        Ok(1)
    }

    /// Define/substitui o TTL de uma chave existente sem alterar o valor.
    /// Retorna `false` se a chave não existe. TTL zero remove a chave.
    pub fn expire(&self, key: &str, ttl: Duration) -> bool {
        let mut state = self.shared.state.write();
        let now = SystemTime::now();

        let Some(entry) = state.entries.get_mut(key) else {
            return false;
        };
        if entry.is_expired_at(now) {
            return false;
        }

        if ttl.is_zero() {
            state.timers.remove(key);
            state.entries.remove(key);
            return true;
        }

        match now.checked_add(ttl) {
            Some(at) => {
                entry.expires_at = Some(at);
                self.arm_timer(&mut state, key.to_string(), ttl);
            }
            // Fora do alcance do relógio: na prática nunca expira
            None => {
                entry.expires_at = None;
                state.timers.remove(key);
            }
        }
        true
    }

    /// Limpa todas as chaves e cancela todos os timers pendentes.
    pub fn flush(&self) {
        let mut state = self.shared.state.write();
        let keys = state.entries.len();
        state.entries.clear();
        state.timers.clear();
        debug!("flush: {keys} chaves removidas");
    }

    // --- Snapshot ---

    /// Cópia das entradas vivas, para o snapshot.
    pub(crate) fn live_entries(&self) -> Vec<(String, Entry)> {
        let state = self.shared.state.read();
        let now = SystemTime::now();
        state
            .entries
            .iter()
            .filter(|(_, e)| !e.is_expired_at(now))
            .map(|(k, e)| (k.clone(), e.clone()))
            .collect()
    }

    /// Instala entradas vindas de um snapshot. Entradas com expiração no
    /// passado são ignoradas. Retorna quantas foram instaladas.
    pub(crate) fn restore<I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = (String, Scalar, Option<SystemTime>)>,
    {
        let mut state = self.shared.state.write();
        let now = SystemTime::now();
        let mut count = 0;

        for (key, value, expires_at) in records {
            let ttl = match expires_at {
                None => None,
                Some(at) => match at.duration_since(now) {
                    Ok(left) if !left.is_zero() => Some(left),
                    _ => {
                        debug!("snapshot: key já expirada ignorada: {key}");
                        continue;
                    }
                },
            };
            self.put(&mut state, key, value, ttl);
            count += 1;
        }

        count
    }

    // --- Internos (chamados com o write lock) ---

    fn put(&self, state: &mut State, key: String, value: Scalar, ttl: Option<Duration>) {
        let expires_at = ttl.and_then(|ttl| SystemTime::now().checked_add(ttl));
        match (ttl, expires_at) {
            (Some(ttl), Some(_)) => self.arm_timer(state, key.clone(), ttl),
            _ => {
                state.timers.remove(&key);
            }
        }
        state.entries.insert(key, Entry::new(value, expires_at));
    }

    /// Substitui o timer da chave; o anterior é abortado ao ser descartado.
    fn arm_timer(&self, state: &mut State, key: String, ttl: Duration) {
        state.next_timer_id += 1;
        let id = state.next_timer_id;
        let timer = schedule(Arc::downgrade(&self.shared), key.clone(), id, ttl);
        state.timers.insert(key, timer);
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

fn live_entry<'a>(state: &'a State, key: &str, now: SystemTime) -> Option<&'a Entry> {
    state.entries.get(key).filter(|e| !e.is_expired_at(now))
}
