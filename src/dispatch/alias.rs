//! Alias expansion and response templates.

use crate::config::AliasTable;
use crate::gateway::ChannelId;

/// Values available to alias expansions and custom command responses.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    /// Replaces `$input`.
    pub input: &'a str,
    /// Replaces `$user`.
    pub user: &'a str,
    /// Replaces `$channel`.
    pub channel: ChannelId,
}

/// Substitutes template variables in `template`.
#[must_use]
pub fn expand_template(template: &str, vars: &TemplateVars<'_>) -> String {
    template
        .replace("$input", vars.input)
        .replace("$user", vars.user)
        .replace("$channel", &vars.channel.to_string())
}

/// Expands the first alias whose trigger `command` starts with.
///
/// Triggers are checked in table order. The text after the trigger fills
/// `$input` when the expansion uses it and is appended otherwise.
#[must_use]
pub fn resolve_alias(table: &AliasTable, command: &str, vars: &TemplateVars<'_>) -> Option<String> {
    let alias = table
        .iter()
        .find(|a| !a.trigger.is_empty() && command.starts_with(a.trigger.as_str()))?;
    let rest = &command[alias.trigger.len()..];

    if alias.expansion.contains("$input") {
        let vars = TemplateVars {
            input: rest.trim(),
            ..*vars
        };
        Some(expand_template(&alias.expansion, &vars))
    } else {
        let mut expanded = expand_template(&alias.expansion, vars);
        expanded.push_str(rest);
        Some(expanded)
    }
}
