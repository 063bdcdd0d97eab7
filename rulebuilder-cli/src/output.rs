use colored::*;
use rulebuilder_rules::Rule;

pub fn print_validation(path: &str, errors: &[String]) {
    if errors.is_empty() {
        println!("{} {}", "✔ Rule is valid:".green().bold(), path.bold());
        return;
    }

    println!(
        "{} {} ({} problem{})",
        "✘ Rule is incomplete:".red().bold(),
        path.bold(),
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    );
    for error in errors {
        println!("  - {}", error);
    }
}

pub fn print_preview(rule: &Rule, preview: &str) {
    println!("{} {}", "IF".cyan().bold(), rule.conditions);
    println!("{}", "THEN".cyan().bold());
    if rule.actions.is_empty() {
        println!("  (no actions)");
    }
    for action in &rule.actions {
        let placeholders = action.placeholders();
        if placeholders.is_empty() {
            println!("  {} [{}]", action.kind, action.severity);
        } else {
            println!(
                "  {} [{}] placeholders: {}",
                action.kind,
                action.severity,
                placeholders.join(", ")
            );
        }
    }
    println!();
    println!("{}", preview);
}
