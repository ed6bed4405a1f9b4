use std::fmt;

/// Where an operation was started from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestSource {
    /// HTTP endpoint
    API,

    /// `create-admin` and other CLI commands
    CLI,
}

impl fmt::Display for RequestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestSource::API => "api",
            RequestSource::CLI => "cli",
        };
        f.write_str(name)
    }
}
