use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use gustdb_common::SnapshotError;

use crate::entry::Scalar;
use crate::Store;

/// Registro de uma chave no arquivo de dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    value: Scalar,
    /// Instante absoluto de expiração em nanossegundos desde a epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiration: Option<i64>,
}

/// Documento completo: chave → registro.
type Document = BTreeMap<String, Record>;

impl Store {
    /// Grava todas as chaves vivas em `path`.
    ///
    /// O conteúdo vai primeiro para um arquivo temporário no mesmo diretório,
    /// que depois é renomeado sobre o destino. Retorna quantas chaves foram
    /// gravadas.
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<usize, SnapshotError> {
        let path = path.as_ref();
        let _guard = self.shared.persist_lock.lock().await;

        let doc: Document = self
            .live_entries()
            .into_iter()
            .map(|(key, entry)| {
                let record = Record {
                    value: entry.value,
                    expiration: entry.expires_at.map(to_unix_nanos),
                };
                (key, record)
            })
            .collect();

        let data = serde_json::to_vec_pretty(&doc).map_err(SnapshotError::Encode)?;
        write_atomic(path, &data).await?;

        info!("snapshot gravado: {} chaves em {:?}", doc.len(), path);
        Ok(doc.len())
    }

    /// Carrega um dump gravado por [`Store::save_to_file`].
    ///
    /// Registros já expirados são descartados; os demais recebem um timer
    /// novo com o tempo restante. Retorna quantas chaves foram instaladas.
    pub async fn load_from_file(&self, path: impl AsRef<Path>) -> Result<usize, SnapshotError> {
        let path = path.as_ref();
        let _guard = self.shared.persist_lock.lock().await;

        let data = fs::read(path).await?;
        let doc: Document = serde_json::from_slice(&data).map_err(SnapshotError::Decode)?;
        let total = doc.len();

        let loaded = self.restore(
            doc.into_iter()
                .map(|(key, record)| (key, record.value, record.expiration.map(from_unix_nanos))),
        );

        if loaded < total {
            debug!("snapshot: {} chaves expiradas descartadas", total - loaded);
        }
        info!("snapshot carregado: {loaded} chaves de {:?}", path);
        Ok(loaded)
    }
}

async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), SnapshotError> {
    let tmp = temp_path(path);

    let result = async {
        let mut file = File::create(&tmp).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, path).await
    }
    .await;

    if let Err(e) = result {
        if let Err(cleanup) = fs::remove_file(&tmp).await {
            warn!("falha ao remover temporário {:?}: {cleanup}", tmp);
        }
        return Err(e.into());
    }
    Ok(())
}

/// `dir/.name.tmp`, no mesmo diretório do destino para o rename ser atômico.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dump".into());
    path.with_file_name(format!(".{name}.tmp"))
}

fn to_unix_nanos(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_nanos()).unwrap_or(i64::MAX),
        Err(_) => 0,
    }
}

/// Valores negativos viram a própria epoch, isto é, já expirados.
fn from_unix_nanos(nanos: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_nanos(nanos.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn save_flush_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("redis.dump");

        let store = Store::new();
        store.set("k".into(), "v".into());
        store.set("n".into(), Scalar::Int(5));
        assert_eq!(store.save_to_file(&path).await.unwrap(), 2);

        store.flush();
        assert_eq!(store.get("k"), None);

        assert_eq!(store.load_from_file(&path).await.unwrap(), 2);
        assert_eq!(store.get("k"), Some(Scalar::from("v")));
        assert_eq!(store.get("n"), Some(Scalar::Int(5)));
    }

    #[tokio::test]
    async fn roundtrip_with_ttl_before_expiry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("redis.dump");

        let store = Store::new();
        store.set_with_ttl("k".into(), "v".into(), Duration::from_secs(30));
        store.save_to_file(&path).await.unwrap();
        store.flush();

        assert_eq!(store.load_from_file(&path).await.unwrap(), 1);
        assert_eq!(store.get("k"), Some(Scalar::from("v")));
        match store.ttl("k") {
            crate::Ttl::Remaining(left) => assert!(left <= Duration::from_secs(30)),
            other => panic!("expected remaining ttl, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn roundtrip_with_ttl_after_expiry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("redis.dump");

        let store = Store::new();
        store.set_with_ttl("k".into(), "v".into(), Duration::from_millis(50));
        store.set("keep".into(), "x".into());
        store.save_to_file(&path).await.unwrap();
        store.flush();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.load_from_file(&path).await.unwrap(), 1);
        assert_eq!(store.get("k"), None);
        assert_eq!(store.get("keep"), Some(Scalar::from("x")));
    }

    #[tokio::test]
    async fn loaded_ttl_fires_timer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("redis.dump");

        let store = Store::new();
        store.set_with_ttl("k".into(), "v".into(), Duration::from_millis(80));
        store.save_to_file(&path).await.unwrap();

        let restored = Store::new();
        restored.load_from_file(&path).await.unwrap();
        assert_eq!(restored.get("k"), Some(Scalar::from("v")));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(restored.shared.state.read().entries.is_empty());
    }

    #[tokio::test]
    async fn save_skips_expired_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("redis.dump");

        let store = Store::new();
        store.set("live".into(), "1".into());
        // Entrada expirada ainda presente fisicamente (timer atrasado)
        store.shared.state.write().entries.insert(
            "dead".into(),
            crate::entry::Entry::new(
                "2".into(),
                Some(SystemTime::now() - Duration::from_secs(1)),
            ),
        );

        assert_eq!(store.save_to_file(&path).await.unwrap(), 1);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("live"));
        assert!(!raw.contains("dead"));
    }

    #[tokio::test]
    async fn document_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("redis.dump");

        let store = Store::new();
        store.set("plain".into(), "v".into());
        store.set_with_ttl("timed".into(), Scalar::Int(7), Duration::from_secs(60));
        store.save_to_file(&path).await.unwrap();

        let raw = std::fs::read(&path).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["plain"]["value"], "v");
        assert!(json["plain"].get("expiration").is_none());
        assert_eq!(json["timed"]["value"], 7);
        let expiration = json["timed"]["expiration"].as_i64().unwrap();
        assert!(expiration > to_unix_nanos(SystemTime::now()));
    }

    #[tokio::test]
    async fn load_skips_past_expiration() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("redis.dump");
        std::fs::write(
            &path,
            r#"{"old": {"value": "x", "expiration": 1000}, "new": {"value": "y"}}"#,
        )
        .unwrap();

        let store = Store::new();
        assert_eq!(store.load_from_file(&path).await.unwrap(), 1);
        assert_eq!(store.get("old"), None);
        assert_eq!(store.get("new"), Some(Scalar::from("y")));
    }

    #[tokio::test]
    async fn load_overwrites_existing_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("redis.dump");
        std::fs::write(&path, r#"{"k": {"value": "from-dump"}}"#).unwrap();

        let store = Store::new();
        store.set_with_ttl("k".into(), "live".into(), Duration::from_millis(50));
        store.set("other".into(), "stays".into());
        store.load_from_file(&path).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.get("k"), Some(Scalar::from("from-dump")));
        assert_eq!(store.get("other"), Some(Scalar::from("stays")));
    }

    #[tokio::test]
    async fn load_missing_file() {
        let dir = tempdir().unwrap();
        let store = Store::new();
        let err = store
            .load_from_file(dir.path().join("nope.dump"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn load_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("redis.dump");
        std::fs::write(&path, b"{not json").unwrap();

        let store = Store::new();
        let err = store.load_from_file(&path).await.unwrap_err();
        assert!(matches!(err, SnapshotError::Decode(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("redis.dump");

        let store = Store::new();
        store.set("k".into(), "v".into());
        store.save_to_file(&path).await.unwrap();
        store.save_to_file(&path).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["redis.dump".to_string()]);
    }

    #[tokio::test]
    async fn save_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("redis.dump");

        let store = Store::new();
        store.set("k".into(), "v".into());
        assert!(matches!(
            store.save_to_file(&path).await,
            Err(SnapshotError::Io(_))
        ));
    }

    #[test]
    fn unix_nanos_conversion() {
        let t = UNIX_EPOCH + Duration::from_nanos(1_700_000_000_123_456_789);
        assert_eq!(to_unix_nanos(t), 1_700_000_000_123_456_789);
        assert_eq!(from_unix_nanos(1_700_000_000_123_456_789), t);
        assert_eq!(from_unix_nanos(-5), UNIX_EPOCH);
    }
}
