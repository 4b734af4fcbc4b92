use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

use gustdb_common::{ConnectionError, INITIAL_BUFFER_CAPACITY, ProtocolError};
use gustdb_protocol::{Reply, decode_line};

/// Wrapper sobre TcpStream com buffer para leitura de linhas e escrita de respostas.
pub struct Connection {
    stream: BufWriter<TcpStream>,
    buffer: BytesMut,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream: BufWriter::new(stream),
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Lê uma linha completa do stream. Retorna None no EOF.
    ///
    /// Bytes pendentes sem `\n` no EOF são entregues como a última linha.
    pub async fn read_line(&mut self) -> Result<Option<String>, ConnectionError> {
        loop {
            if let Some(line) = decode_line(&mut self.buffer)? {
                return Ok(Some(line));
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let rest = self.buffer.split();
                let line = String::from_utf8(rest.to_vec())
                    .map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))?;
                return Ok(Some(line));
            }
        }
    }

    /// Escreve uma resposta no stream.
    pub async fn write_reply(&mut self, reply: &Reply) -> Result<(), ConnectionError> {
        let mut buf = BytesMut::new();
        reply.encode(&mut buf);
        self.stream.write_all(&buf).await?;
        self.stream.flush().await?;
        Ok(())
    }
}
