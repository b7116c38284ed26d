pub mod header_ops;
pub mod inspection;

/// Argumentos posicionales y `--flags` de una línea de comando, en orden
pub struct CommandArgs<'a> {
    pub positional: Vec<&'a str>,
    pub flags: Vec<&'a str>,
}

impl<'a> CommandArgs<'a> {
    /// Separa `args[2..]` (todo lo que sigue al nombre del comando).
    /// Después de `--` todo es posicional, p.ej. una cabecera que empieza con `--`.
    pub fn parse(args: &'a [String]) -> Self {
        let mut positional = Vec::new();
        let mut flags = Vec::new();
        let mut only_positional = false;
        for arg in args.iter().skip(2) {
            if only_positional {
                positional.push(arg.as_str());
            } else if arg == "--" {
                only_positional = true;
            } else if arg.starts_with("--") {
                flags.push(arg.as_str());
            } else {
                positional.push(arg.as_str());
            }
        }
        Self { positional, flags }
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| *f == flag)
    }

    /// Primer flag que el comando no reconoce
    pub fn unknown_flag(&self, allowed: &[&str]) -> Option<&'a str> {
        self.flags.iter().copied().find(|f| !allowed.contains(f))
    }
}
