//! Tool-call detection in model output.

use parley_types::tool::{TOOL_CALL_PREFIX, ToolCommand};

/// Extract the first `TOOL_CALL:<name>[:<parameters>]` request from `text`.
///
/// The marker may start anywhere on a line; the command runs to the end of
/// that line. Everything after the second `:` is the parameter string, so
/// parameters may themselves contain colons.
pub fn parse_tool_command(text: &str) -> ToolCommand {
    let Some(start) = text.find(TOOL_CALL_PREFIX) else {
        return ToolCommand::NotACommand;
    };
    let line = text[start..].lines().next().unwrap_or_default().trim_end();
    let body = &line[TOOL_CALL_PREFIX.len()..];

    let (name, arguments) = match body.split_once(':') {
        Some((name, rest)) => (name, Some(rest.to_string())),
        None => (body, None),
    };

    ToolCommand::Call {
        name: name.trim().to_string(),
        arguments,
        raw: line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, arguments: Option<&str>, raw: &str) -> ToolCommand {
        ToolCommand::Call {
            name: name.into(),
            arguments: arguments.map(Into::into),
            raw: raw.into(),
        }
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_tool_command("Hello there!"), ToolCommand::NotACommand);
        assert_eq!(parse_tool_command(""), ToolCommand::NotACommand);
    }

    #[test]
    fn name_and_parameters() {
        assert_eq!(
            parse_tool_command("TOOL_CALL:searchDatabase:red shoes"),
            call("searchDatabase", Some("red shoes"), "TOOL_CALL:searchDatabase:red shoes")
        );
    }

    #[test]
    fn parameters_keep_extra_colons() {
        assert_eq!(
            parse_tool_command("TOOL_CALL:fetch:https://example.com:8080/x"),
            call(
                "fetch",
                Some("https://example.com:8080/x"),
                "TOOL_CALL:fetch:https://example.com:8080/x"
            )
        );
    }

    #[test]
    fn missing_parameters() {
        assert_eq!(
            parse_tool_command("TOOL_CALL:currentTime"),
            call("currentTime", None, "TOOL_CALL:currentTime")
        );
        assert_eq!(
            parse_tool_command("TOOL_CALL:currentTime:"),
            call("currentTime", Some(""), "TOOL_CALL:currentTime:")
        );
    }

    #[test]
    fn command_embedded_in_prose() {
        let text = "Let me check.\nSure: TOOL_CALL:wordCount:a b c\r\nOne moment.";
        assert_eq!(
            parse_tool_command(text),
            call("wordCount", Some("a b c"), "TOOL_CALL:wordCount:a b c")
        );
    }

    #[test]
    fn only_first_command_is_used() {
        let text = "TOOL_CALL:first:1\nTOOL_CALL:second:2";
        assert!(matches!(
            parse_tool_command(text),
            ToolCommand::Call { name, .. } if name == "first"
        ));
    }
}
