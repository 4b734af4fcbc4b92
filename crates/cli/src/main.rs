use std::io::{self, Write};

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use gustdb_common::{DEFAULT_HOST, DEFAULT_PORT};

#[derive(Parser, Debug)]
#[command(name = "gustdb-cli", about = "GustDB CLI client")]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, short, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Comando para executar diretamente (modo não interativo)
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

struct Session {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let stream = TcpStream::connect(&addr).await?;
    let (read, writer) = stream.into_split();
    let mut session = Session {
        reader: BufReader::new(read),
        writer,
    };

    // Modo comando único (via argumentos)
    if !args.command.is_empty() {
        let response = execute_request(&mut session, &args.command.join(" ")).await?;
        println!("{}", format_reply(&response));
        return Ok(());
    }

    println!("Conectado a {addr}");

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("gustdb> ");
        io::stdout().flush()?;

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break; // EOF
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        match execute_request(&mut session, line).await {
            Ok(response) => println!("{}", format_reply(&response)),
            Err(e) => {
                println!("(error) {e}");
                break;
            }
        }
    }

    Ok(())
}

/// Envia uma linha de comando e lê a linha de resposta.
async fn execute_request(session: &mut Session, line: &str) -> anyhow::Result<String> {
    session.writer.write_all(line.as_bytes()).await?;
    session.writer.write_all(b"\n").await?;
    session.writer.flush().await?;

    let mut response = String::new();
    if session.reader.read_line(&mut response).await? == 0 {
        return Err(anyhow::anyhow!("servidor fechou a conexão"));
    }
    Ok(response.trim_end_matches(['\r', '\n']).to_string())
}

/// Formata uma resposta para exibição humana.
fn format_reply(response: &str) -> String {
    if let Some(msg) = response.strip_prefix("ERROR: ") {
        return format!("(error) {msg}");
    }
    match response {
        "NULL" => "(nil)".to_string(),
        other if other.parse::<i64>().is_ok() => format!("(integer) {other}"),
        other => format!("\"{other}\""),
    }
}
