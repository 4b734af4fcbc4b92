use gustdb_common::CommandError;

/// Cursor sobre os tokens de uma linha de comando.
///
/// Os erros de aridade carregam a string de uso configurada via
/// [`Parse::set_usage`], que vira a resposta `ERROR: Syntax: ...`.
pub struct Parse {
    parts: Vec<String>,
    pos: usize,
    usage: &'static str,
}

impl Parse {
    /// Quebra a linha em tokens separados por whitespace.
    pub fn new(line: &str) -> Result<Parse, CommandError> {
        let parts: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if parts.is_empty() {
            return Err(CommandError::InvalidArgument("linha vazia".into()));
        }
        Ok(Parse {
            parts,
            pos: 0,
            usage: "",
        })
    }

    /// Define a string de uso reportada nos erros de aridade.
    pub fn set_usage(&mut self, usage: &'static str) {
        self.usage = usage;
    }

    /// Retorna o próximo token.
    pub fn next_string(&mut self) -> Result<String, CommandError> {
        if self.pos >= self.parts.len() {
            return Err(CommandError::WrongArity(self.usage));
        }
        let part = std::mem::take(&mut self.parts[self.pos]);
        self.pos += 1;
        Ok(part)
    }

    /// Retorna o próximo token como i64.
    pub fn next_int(&mut self) -> Result<i64, CommandError> {
        let s = self.next_string()?;
        s.parse::<i64>()
            .map_err(|_| CommandError::InvalidArgument(format!("'{s}' is not an integer")))
    }

    /// Consome todos os tokens restantes.
    pub fn rest(&mut self) -> Vec<String> {
        let rest = self.parts.split_off(self.pos);
        self.pos = self.parts.len();
        rest
    }

    /// Verifica se todos os argumentos foram consumidos.
    pub fn finish(&self) -> Result<(), CommandError> {
        if self.pos < self.parts.len() {
            Err(CommandError::WrongArity(self.usage))
        } else {
            Ok(())
        }
    }

    /// Verifica se ainda há argumentos restantes.
    pub fn has_remaining(&self) -> bool {
        self.pos < self.parts.len()
    }

    /// Retorna o número de argumentos restantes.
    pub fn remaining(&self) -> usize {
        self.parts.len() - self.pos
    }
}
