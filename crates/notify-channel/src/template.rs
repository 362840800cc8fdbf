//! `{{name}}` placeholder templates for text channels.

use std::collections::HashMap;

/// Template used when a type has none, or when a template's variables
/// cannot all be supplied.
pub const DEFAULT_TEMPLATE: &str = "{{message}}";

/// Look up a named SMS template. Unknown names get [`DEFAULT_TEMPLATE`].
pub fn sms_template(name: &str) -> &'static str {
    match name.to_ascii_lowercase().as_str() {
        "holiday" => {
            "Dear Parent, {{school_name}} will be closed on {{date}} for {{reason}}. \
             Classes will resume on {{resume_date}}. Thank you."
        }
        "circular" => {
            "Dear Parent, {{title}}: {{message}}. For more details, please check the school app. \
             - {{school_name}}"
        }
        "emergency" => "URGENT: {{message}}. Please take necessary action. - {{school_name}}",
        "fee_reminder" => {
            "Dear Parent, fee payment of {{amount}} for {{student_name}} is due on {{due_date}}. \
             Please pay online or contact school office."
        }
        "exam_schedule" => {
            "Dear Parent, {{exam_name}} for {{student_name}} is scheduled on {{date}} at {{time}}. \
             Please ensure your child is prepared."
        }
        _ => DEFAULT_TEMPLATE,
    }
}

/// Replace every `{{key}}` present in `vars`. Unknown placeholders are left as-is.
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match vars.get(key.trim()) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Placeholder names referenced by a template.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else { break };
        names.push(after[..end].trim());
        rest = &after[end + 2..];
    }
    names
}

/// Render `template`, or `None` if it references a variable not in `vars`.
pub fn render_complete(template: &str, vars: &HashMap<String, String>) -> Option<String> {
    placeholders(template)
        .iter()
        .all(|name| vars.contains_key(*name))
        .then(|| render(template, vars))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_circular() {
        let text = render(
            sms_template("circular"),
            &vars(&[
                ("title", "PTA Meeting"),
                ("message", "Saturday at 10am"),
                ("school_name", "Greenfield"),
            ]),
        );
        assert_eq!(
            text,
            "Dear Parent, PTA Meeting: Saturday at 10am. For more details, please check the school app. - Greenfield"
        );
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        assert_eq!(render("Hi {{name}} {{x}}", &vars(&[("name", "A")])), "Hi A {{x}}");
        assert_eq!(render("broken {{tail", &vars(&[])), "broken {{tail");
    }

    #[test]
    fn test_render_complete_requires_every_variable() {
        let v = vars(&[("message", "Closed"), ("school_name", "Greenfield")]);
        assert!(render_complete(sms_template("holiday"), &v).is_none());
        assert_eq!(
            render_complete(sms_template("emergency"), &v).as_deref(),
            Some("URGENT: Closed. Please take necessary action. - Greenfield")
        );
    }

    #[test]
    fn test_unknown_template_is_default() {
        assert_eq!(sms_template("sports_event"), DEFAULT_TEMPLATE);
        assert_eq!(sms_template("HOLIDAY"), sms_template("holiday"));
    }
}
