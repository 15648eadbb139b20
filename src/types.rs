/// What happens to output still buffered in the pipes of a run that is
/// terminated because a newer trigger (or shutdown) superseded it.
///
/// - `Flush`: keep forwarding while the process shuts down and drain what it
///   wrote before it died, then start the next run.
/// - `Discard`: stop forwarding as soon as termination starts; anything not
///   yet read is lost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TerminatedOutput {
    #[default]
    Flush,
    Discard,
}

impl TerminatedOutput {
    /// Name as written in the config file and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            TerminatedOutput::Flush => "flush",
            TerminatedOutput::Discard => "discard",
        }
    }
}

/// Which pipe of the child a chunk of output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}
