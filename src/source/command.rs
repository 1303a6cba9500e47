//! Obtain the raw report text of a management endpoint.

use source::Error;
use std::process;

/// Produces the raw text an endpoint reports.
pub trait Fetch: Send + Sync {
    /// The report of `endpoint`.
    fn fetch(&self, endpoint: &str) -> Result<String, Error>;
}

impl<F> Fetch for F
where
    F: Fn(&str) -> Result<String, Error> + Send + Sync,
{
    fn fetch(&self, endpoint: &str) -> Result<String, Error> {
        self(endpoint)
    }
}

/// Runs an external program and captures what it prints.
///
/// Every argument may contain the placeholders `{host}`, `{username}` and
/// `{password}`, substituted before the program is started.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandFetch {
    argv: Vec<String>,
    username: String,
    password: String,
}

impl CommandFetch {
    /// Create a fetcher for the given program and arguments.
    pub fn new(argv: Vec<String>, username: String, password: String) -> CommandFetch {
        CommandFetch {
            argv: argv,
            username: username,
            password: password,
        }
    }

    /// The arguments for `endpoint`, placeholders substituted.
    pub fn render(&self, endpoint: &str) -> Vec<String> {
        self.argv
            .iter()
            .map(|arg| {
                arg.replace("{host}", endpoint)
                    .replace("{username}", &self.username)
                    .replace("{password}", &self.password)
            })
            .collect()
    }
}

impl Fetch for CommandFetch {
    fn fetch(&self, endpoint: &str) -> Result<String, Error> {
        let argv = self.render(endpoint);
        let (program, args) = match argv.split_first() {
            Some(split) => split,
            None => {
                return Err(Error::EndpointUnavailable {
                    endpoint: endpoint.to_string(),
                    reason: "no command configured".to_string(),
                })
            }
        };
        debug!("running {} for {}", program, endpoint);
        let output = process::Command::new(program).args(args).output()?;
        if !output.status.success() {
            return Err(Error::EndpointUnavailable {
                endpoint: endpoint.to_string(),
                reason: format!(
                    "{} exited with {}: {}",
                    program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
