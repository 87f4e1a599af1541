use cashcast_client::ClientError;

pub fn render_error(error: &ClientError) -> String {
    let headline = if error.is_internal() {
        "The ledger could not complete this command."
    } else {
        "The command was rejected."
    };
    let mut lines = vec![
        headline.to_string(),
        String::new(),
        format!("  Error:    {}", error.code),
        format!("  Details:  {}", error.message),
        String::new(),
        "What to do next:".to_string(),
    ];

    if error.recovery_steps.is_empty() {
        lines.push("  1. Retry the command.".to_string());
    } else {
        for (index, step) in error.recovery_steps.iter().enumerate() {
            lines.push(format!("  {}. {step}", index + 1));
        }
    }

    lines.join("\n")
}
