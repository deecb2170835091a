//! Command-line arguments: `<endpoint> <username>@<namespace> <password> [driverID]`.

use crate::config::RideConfig;

pub const USAGE: &str = "Usage: taxi-call <endpoint> <username>@<namespace> <password> [driverID]";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CliError {
    #[error("expected 3 or 4 arguments, got {0}")]
    ArgumentCount(usize),
    #[error("login must look like <username>@<namespace>, got {0:?}")]
    MalformedLogin(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub endpoint: String,
    pub username: String,
    pub namespace: String,
    pub password: String,
    pub driver_id: Option<String>,
}

/// Parses the arguments after the program name.
pub fn parse_args(args: &[String]) -> Result<CliArgs, CliError> {
    if !(3..=4).contains(&args.len()) {
        return Err(CliError::ArgumentCount(args.len()));
    }
    let (username, namespace) = args[1]
        .split_once('@')
        .filter(|(user, namespace)| !user.is_empty() && !namespace.is_empty() && !namespace.contains('@'))
        .ok_or_else(|| CliError::MalformedLogin(args[1].clone()))?;

    Ok(CliArgs {
        endpoint: args[0].clone(),
        username: username.to_string(),
        namespace: namespace.to_string(),
        password: args[2].clone(),
        driver_id: args.get(3).cloned(),
    })
}

impl CliArgs {
    /// Overrides the connection settings (and the driver, if given) in `config`.
    pub fn apply(self, config: &mut RideConfig) {
        config.endpoint = self.endpoint;
        config.username = self.username;
        config.namespace = self.namespace;
        config.password = self.password;
        if let Some(driver_id) = self.driver_id {
            config.driver_id = driver_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parses_login_and_optional_driver() {
        let parsed = parse_args(&args(&["tcp://h:55555", "rider@vpn", "pw", "D7"])).unwrap();
        assert_eq!(parsed.username, "rider");
        assert_eq!(parsed.namespace, "vpn");
        assert_eq!(parsed.driver_id.as_deref(), Some("D7"));

        let mut config = RideConfig::default();
        parsed.apply(&mut config);
        assert_eq!(config.endpoint, "tcp://h:55555");
        assert_eq!(config.driver_id, "D7");

        let parsed = parse_args(&args(&["tcp://h", "rider@vpn", "pw"])).unwrap();
        assert_eq!(parsed.driver_id, None);
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert_eq!(parse_args(&args(&["tcp://h", "rider@vpn"])), Err(CliError::ArgumentCount(2)));
        assert_eq!(
            parse_args(&args(&["a", "b@c", "d", "e", "f"])),
            Err(CliError::ArgumentCount(5))
        );
        for login in ["rider", "@vpn", "rider@", "a@b@c"] {
            assert_eq!(
                parse_args(&args(&["tcp://h", login, "pw"])),
                Err(CliError::MalformedLogin(login.to_string()))
            );
        }
    }
}
