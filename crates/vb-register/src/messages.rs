//! Chat lines shown to players. Colour codes use the legacy `§` format.

use crate::client::RegistrationResult;

pub const PLAYER_ONLY_MESSAGE: &str = "This command can only be run by a player.";

const PREFIX_OK: &str = "§a[VB]";
const PREFIX_ERR: &str = "§c[VB]";

pub fn render(result: &RegistrationResult) -> Vec<String> {
    match result {
        RegistrationResult::Success { link } => vec![
            format!("{PREFIX_OK} Registration link: §e{link}"),
            format!("{PREFIX_OK} §7Open it in your browser to complete registration."),
        ],
        RegistrationResult::Failure {
            message,
            internal: true,
        } => vec![format!("{PREFIX_ERR} {message}")],
        RegistrationResult::Failure { message, .. } => {
            vec![format!("{PREFIX_ERR} Registration failed: {message}")]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_has_link_and_hint() {
        let lines = render(&RegistrationResult::Success {
            link: "https://bank.test/r/1".into(),
        });
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "§a[VB] Registration link: §ehttps://bank.test/r/1");
        assert!(lines[1].contains("browser"));
    }

    #[test]
    fn failure_is_one_line() {
        let lines = render(&RegistrationResult::Failure {
            message: "bad nickname".into(),
            internal: false,
        });
        assert_eq!(lines, vec!["§c[VB] Registration failed: bad nickname".to_string()]);
    }

    #[test]
    fn internal_error_has_no_failure_prefix() {
        let lines = render(&RegistrationResult::internal_error());
        assert_eq!(
            lines,
            vec!["§c[VB] An internal error occurred while trying to register.".to_string()]
        );
    }
}
