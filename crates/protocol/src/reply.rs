use std::fmt;

use bytes::{BufMut, BytesMut};

/// Resposta de uma linha enviada ao cliente.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(String),
    Null,
    /// Elementos separados por espaço (MGET).
    Array(Vec<Reply>),
}

impl Reply {
    pub fn ok() -> Reply {
        Reply::Simple("OK".into())
    }

    pub fn error(msg: impl fmt::Display) -> Reply {
        Reply::Error(msg.to_string())
    }

    /// Encoda a resposta como uma linha terminada em `\n`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put(self.to_string().as_bytes());
        dst.put_u8(b'\n');
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Simple(s) | Reply::Bulk(s) => f.write_str(s),
            Reply::Error(msg) => write!(f, "ERROR: {msg}"),
            Reply::Integer(n) => write!(f, "{n}"),
            Reply::Null => f.write_str("NULL"),
            Reply::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}
