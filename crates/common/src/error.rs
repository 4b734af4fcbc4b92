/// Erros de enquadramento do protocolo de linhas.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("linha excede tamanho máximo ({0} bytes)")]
    LineTooLong(usize),
    #[error("encoding inválido: {0}")]
    InvalidEncoding(String),
}

/// Erros de armazenamento/engine de dados.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("value is not an integer")]
    NotAnInteger,
}

/// Erros de snapshot (SAVE / carga no startup).
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot malformado: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("falha ao serializar snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

impl SnapshotError {
    /// Indica se o arquivo de dump simplesmente não existe.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SnapshotError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Erros de conexão TCP.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Erros de parsing/validação de comandos.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command")]
    Unknown(String),
    #[error("Syntax: {0}")]
    WrongArity(&'static str),
    #[error("{0}")]
    InvalidArgument(String),
}

/// Erro top-level do GustDB.
#[derive(Debug, thiserror::Error)]
pub enum GustError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Result type alias.
pub type GustResult<T> = Result<T, GustError>;

// Conversão implícita de io::Error → GustError (via ConnectionError)
impl From<std::io::Error> for GustError {
    fn from(e: std::io::Error) -> Self {
        GustError::Connection(ConnectionError::Io(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::LineTooLong(16);
        assert_eq!(err.to_string(), "linha excede tamanho máximo (16 bytes)");
    }

    #[test]
    fn connection_error_from_protocol() {
        let err: ConnectionError = ProtocolError::LineTooLong(1).into();
        assert!(matches!(
            err,
            ConnectionError::Protocol(ProtocolError::LineTooLong(1))
        ));
    }

    #[test]
    fn storage_error_display() {
        let err = StorageError::NotAnInteger;
        assert_eq!(err.to_string(), "value is not an integer");
    }

    #[test]
    fn command_error_display() {
        let err = CommandError::WrongArity("GET key");
        assert_eq!(err.to_string(), "Syntax: GET key");

        let err = CommandError::Unknown("FOO".into());
        assert_eq!(err.to_string(), "Unknown command");
    }

    #[test]
    fn gust_error_from_storage() {
        let err: GustError = StorageError::NotAnInteger.into();
        assert!(matches!(err, GustError::Storage(StorageError::NotAnInteger)));
    }

    #[test]
    fn gust_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken");
        let err: GustError = io_err.into();
        assert!(matches!(
            err,
            GustError::Connection(ConnectionError::Io(_))
        ));
    }

    #[test]
    fn snapshot_not_found() {
        let err: SnapshotError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(err.is_not_found());

        let err: SnapshotError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(!err.is_not_found());
    }
}
