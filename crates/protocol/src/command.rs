use gustdb_common::CommandError;

use crate::Parse;

/// Enum com todos os comandos suportados.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping,
    Get(String),
    Set { key: String, value: String },
    Incr(String),
    Del(Vec<String>),
    MGet(Vec<String>),
    MSet(Vec<(String, String)>),
    Flush,
    /// TTL em segundos inteiros; valores negativos expiram imediatamente.
    Expire { key: String, seconds: i64 },
    Ttl(String),
    Save,
    DbSize,
    Unknown(String),
}

impl Command {
    /// Faz o parse de uma linha de texto em um Command.
    pub fn from_line(line: &str) -> Result<Command, CommandError> {
        let mut parse = Parse::new(line)?;
        let cmd_name = parse.next_string()?.to_uppercase();

        let cmd = match cmd_name.as_str() {
            "PING" => {
                parse.set_usage("PING");
                parse.finish()?;
                Command::Ping
            }
            "GET" => {
                parse.set_usage("GET key");
                let key = parse.next_string()?;
                parse.finish()?;
                Command::Get(key)
            }
            "SET" => {
                parse.set_usage("SET key value");
                let key = parse.next_string()?;
                let value = parse.next_string()?;
                parse.finish()?;
                Command::Set { key, value }
            }
            "INCR" => {
                parse.set_usage("INCR key");
                let key = parse.next_string()?;
                parse.finish()?;
                Command::Incr(key)
            }
            "DEL" => {
                if !parse.has_remaining() {
                    return Err(CommandError::WrongArity("DEL key [key ...]"));
                }
                Command::Del(parse.rest())
            }
            "MGET" => {
                if !parse.has_remaining() {
                    return Err(CommandError::WrongArity("MGET key [key ...]"));
                }
                Command::MGet(parse.rest())
            }
            "MSET" => {
                let remaining = parse.remaining();
                if remaining == 0 || remaining % 2 != 0 {
                    return Err(CommandError::WrongArity("MSET key value [key value ...]"));
                }
                let mut pairs = Vec::with_capacity(remaining / 2);
                let mut args = parse.rest().into_iter();
                while let (Some(key), Some(value)) = (args.next(), args.next()) {
                    pairs.push((key, value));
                }
                Command::MSet(pairs)
            }
            "FLUSH" => {
                parse.set_usage("FLUSH");
                parse.finish()?;
                Command::Flush
            }
            "EXPIRE" => {
                parse.set_usage("EXPIRE key seconds");
                let key = parse.next_string()?;
                let seconds = parse
                    .next_int()
                    .map_err(|e| match e {
                        CommandError::InvalidArgument(_) => {
                            CommandError::InvalidArgument("Invalid TTL".into())
                        }
                        other => other,
                    })?;
                parse.finish()?;
                Command::Expire { key, seconds }
            }
            "TTL" => {
                parse.set_usage("TTL key");
                let key = parse.next_string()?;
                parse.finish()?;
                Command::Ttl(key)
            }
            "SAVE" => {
                parse.set_usage("SAVE");
                parse.finish()?;
                Command::Save
            }
            "DBSIZE" => {
                parse.set_usage("DBSIZE");
                parse.finish()?;
                Command::DbSize
            }
            _ => Command::Unknown(cmd_name),
        };

        Ok(cmd)
    }

    /// Nome canônico do comando (para logs).
    pub fn name(&self) -> &str {
        match self {
            Command::Ping => "PING",
            Command::Get(_) => "GET",
            Command::Set { .. } => "SET",
            Command::Incr(_) => "INCR",
            Command::Del(_) => "DEL",
            Command::MGet(_) => "MGET",
            Command::MSet(_) => "MSET",
            Command::Flush => "FLUSH",
            Command::Expire { .. } => "EXPIRE",
            Command::Ttl(_) => "TTL",
            Command::Save => "SAVE",
            Command::DbSize => "DBSIZE",
            Command::Unknown(name) => name,
        }
    }
}
