use bytes::BytesMut;
use gustdb_common::{MAX_LINE_LENGTH, ProtocolError};

/// Extrai uma linha completa (terminada em `\n`, com `\r` opcional) do buffer.
/// Retorna `Ok(None)` se ainda não há uma linha completa disponível.
pub fn decode_line(src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
    let Some(pos) = src.iter().position(|b| *b == b'\n') else {
        if src.len() > MAX_LINE_LENGTH {
            return Err(ProtocolError::LineTooLong(src.len()));
        }
        return Ok(None);
    };

    if pos > MAX_LINE_LENGTH {
        return Err(ProtocolError::LineTooLong(pos));
    }

    let raw = src.split_to(pos + 1);
    let line = &raw[..pos];
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    String::from_utf8(line.to_vec())
        .map(Some)
        .map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_complete_lines() {
        let mut buf = BytesMut::from(&b"SET a 1\r\nGET a\n"[..]);
        assert_eq!(decode_line(&mut buf).unwrap().as_deref(), Some("SET a 1"));
        assert_eq!(decode_line(&mut buf).unwrap().as_deref(), Some("GET a"));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_incomplete_line() {
        let mut buf = BytesMut::from(&b"GET a"[..]);
        assert_eq!(decode_line(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"GET a");
    }

    #[test]
    fn decode_empty_line() {
        let mut buf = BytesMut::from(&b"\r\n"[..]);
        assert_eq!(decode_line(&mut buf).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn decode_invalid_utf8() {
        let mut buf = BytesMut::from(&b"GET \xff\n"[..]);
        assert!(matches!(
            decode_line(&mut buf),
            Err(ProtocolError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn decode_line_too_long() {
        let mut buf = BytesMut::from(vec![b'x'; MAX_LINE_LENGTH + 1].as_slice());
        assert!(matches!(
            decode_line(&mut buf),
            Err(ProtocolError::LineTooLong(_))
        ));
    }
}
